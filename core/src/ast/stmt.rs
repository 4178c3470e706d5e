//! Statement nodes and the per-method statement arena.
//!
//! Statements refer to each other by [`StmtId`]. The lexically enclosing
//! statement of each node is an index into the same arena, computed once by
//! [`StmtArena::finish`]; it is used for lookups only (finding the loop a
//! `break` leaves, or the guarded statements a `return` must unwind) and never
//! owns anything.

use core::cell::Cell;

use bumpalo::Bump;
use smallvec::SmallVec;

use super::decl::LocalId;
use super::expr::Expr;
use crate::error::{DefectKind, InternalError, Pass};
use crate::syntax::Token;
use crate::{Vec, format};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StmtId(u32);

impl StmtId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One `catch (ClassName param) { ... }` clause.
#[derive(Debug, Clone, Copy)]
pub struct Catch<'a> {
    pub class_name: &'a str,
    pub param: LocalId,
    pub body: StmtId,
}

#[derive(Debug, Clone, Copy)]
pub enum StmtKind<'a> {
    Expr(&'a Expr<'a>),
    LocalDecl {
        local: LocalId,
        init: Option<&'a Expr<'a>>,
    },
    Block {
        stmts: &'a [StmtId],
        /// The closing brace.
        close: &'a Token<'a>,
    },
    If {
        cond: &'a Expr<'a>,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
    },
    While {
        cond: &'a Expr<'a>,
        body: StmtId,
    },
    DoWhile {
        body: StmtId,
        cond: &'a Expr<'a>,
    },
    For {
        init: &'a [StmtId],
        cond: Option<&'a Expr<'a>>,
        update: &'a [&'a Expr<'a>],
        body: StmtId,
    },
    /// `name: body`, a named break target (and continue target for loops).
    Labeled {
        name: &'a str,
        body: StmtId,
    },
    Switch {
        selector: &'a Expr<'a>,
        /// Statements of the switch block, `Case`/`Default` markers included.
        body: &'a [StmtId],
    },
    /// `case value:`, a jump target inside a switch block.
    Case {
        value: &'a Expr<'a>,
    },
    /// `default:`, a jump target inside a switch block.
    Default,
    Break {
        label: Option<&'a str>,
    },
    Continue {
        label: Option<&'a str>,
    },
    Return {
        value: Option<&'a Expr<'a>>,
    },
    Throw {
        value: &'a Expr<'a>,
    },
    /// Guarded when `finally` is present.
    Try {
        body: StmtId,
        catches: &'a [Catch<'a>],
        finally: Option<StmtId>,
    },
    /// Always guarded: the monitor is released on every exit.
    Synchronized {
        lock: &'a Expr<'a>,
        body: StmtId,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct Stmt<'a> {
    pub kind: StmtKind<'a>,
    pub start: &'a Token<'a>,
}

impl<'a> Stmt<'a> {
    /// Short name of the node kind, for diagnostics and tracing.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            StmtKind::Expr(_) => "expression",
            StmtKind::LocalDecl { .. } => "local declaration",
            StmtKind::Block { .. } => "block",
            StmtKind::If { .. } => "if",
            StmtKind::While { .. } => "while",
            StmtKind::DoWhile { .. } => "do",
            StmtKind::For { .. } => "for",
            StmtKind::Labeled { .. } => "labeled",
            StmtKind::Switch { .. } => "switch",
            StmtKind::Case { .. } => "case",
            StmtKind::Default => "default",
            StmtKind::Break { .. } => "break",
            StmtKind::Continue { .. } => "continue",
            StmtKind::Return { .. } => "return",
            StmtKind::Throw { .. } => "throw",
            StmtKind::Try { .. } => "try",
            StmtKind::Synchronized { .. } => "synchronized",
        }
    }

    pub fn is_loop(&self) -> bool {
        matches!(
            self.kind,
            StmtKind::While { .. } | StmtKind::DoWhile { .. } | StmtKind::For { .. }
        )
    }

    /// Whether leaving this statement's protected region must run cleanup.
    pub fn is_guarded(&self) -> bool {
        match self.kind {
            StmtKind::Try { finally, .. } => finally.is_some(),
            StmtKind::Synchronized { .. } => true,
            _ => false,
        }
    }

    /// Direct child statements, in source order.
    pub fn children(&self) -> SmallVec<[StmtId; 4]> {
        let mut out = SmallVec::new();
        match self.kind {
            StmtKind::Block { stmts, .. } => out.extend_from_slice(stmts),
            StmtKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                out.push(then_branch);
                out.extend(else_branch);
            }
            StmtKind::While { body, .. }
            | StmtKind::DoWhile { body, .. }
            | StmtKind::Labeled { body, .. }
            | StmtKind::Synchronized { body, .. } => out.push(body),
            StmtKind::For { init, body, .. } => {
                out.extend_from_slice(init);
                out.push(body);
            }
            StmtKind::Switch { body, .. } => out.extend_from_slice(body),
            StmtKind::Try {
                body,
                catches,
                finally,
            } => {
                out.push(body);
                out.extend(catches.iter().map(|c| c.body));
                out.extend(finally);
            }
            StmtKind::Expr(_)
            | StmtKind::LocalDecl { .. }
            | StmtKind::Case { .. }
            | StmtKind::Default
            | StmtKind::Break { .. }
            | StmtKind::Continue { .. }
            | StmtKind::Return { .. }
            | StmtKind::Throw { .. } => {}
        }
        out
    }
}

/// Collects the statements of one method body while it is being built.
pub struct StmtArena<'a> {
    arena: &'a Bump,
    nodes: Vec<Stmt<'a>>,
}

impl<'a> StmtArena<'a> {
    pub fn new(arena: &'a Bump) -> Self {
        Self {
            arena,
            nodes: Vec::new(),
        }
    }

    pub fn alloc(&mut self, start: &'a Token<'a>, kind: StmtKind<'a>) -> StmtId {
        let id = StmtId(self.nodes.len() as u32);
        self.nodes.push(Stmt { kind, start });
        id
    }

    /// Copy a list of ids into the arena, for `Block`/`Switch`/`For` bodies.
    pub fn list(&self, ids: &[StmtId]) -> &'a [StmtId] {
        self.arena.alloc_slice_copy(ids)
    }

    pub fn catches(&self, catches: &[Catch<'a>]) -> &'a [Catch<'a>] {
        self.arena.alloc_slice_copy(catches)
    }

    pub fn exprs(&self, exprs: &[&'a Expr<'a>]) -> &'a [&'a Expr<'a>] {
        self.arena.alloc_slice_copy(exprs)
    }

    pub fn block(
        &mut self,
        open: &'a Token<'a>,
        stmts: &[StmtId],
        close: &'a Token<'a>,
    ) -> StmtId {
        let stmts = self.list(stmts);
        self.alloc(open, StmtKind::Block { stmts, close })
    }

    /// Seal the arena: compute every node's enclosing statement.
    ///
    /// Fails if a node is claimed by two parents or if `root` has one.
    pub fn finish(self, root: StmtId) -> Result<MethodBody<'a>, InternalError> {
        let mut outer: Vec<Option<StmtId>> = crate::vec![None; self.nodes.len()];
        for (index, stmt) in self.nodes.iter().enumerate() {
            let parent = StmtId(index as u32);
            for child in stmt.children() {
                let slot = outer.get_mut(child.index()).ok_or_else(|| {
                    malformed(stmt, format!("child #{} does not exist", child.0))
                })?;
                if slot.is_some() {
                    return Err(malformed(
                        stmt,
                        format!("statement #{} has two parents", child.0),
                    ));
                }
                *slot = Some(parent);
            }
        }
        match outer.get(root.index()) {
            Some(None) => {}
            Some(Some(_)) | None => {
                return Err(InternalError::new(
                    Pass::Build,
                    DefectKind::MalformedTree(format!("#{} is not a root statement", root.0)),
                ));
            }
        }
        let completes = (0..self.nodes.len()).map(|_| Cell::new(None)).collect();
        Ok(MethodBody {
            nodes: self.nodes,
            outer,
            root,
            completes,
        })
    }
}

fn malformed(stmt: &Stmt<'_>, message: crate::String) -> InternalError {
    InternalError::at(Pass::Build, DefectKind::MalformedTree(message), stmt.start.pos)
}

/// A sealed statement tree with parent links.
pub struct MethodBody<'a> {
    nodes: Vec<Stmt<'a>>,
    outer: Vec<Option<StmtId>>,
    root: StmtId,
    /// Whether each statement can complete normally, filled in by the
    /// resolver.
    completes: Vec<Cell<Option<bool>>>,
}

impl<'a> MethodBody<'a> {
    pub fn root(&self) -> StmtId {
        self.root
    }

    pub fn get(&self, id: StmtId) -> &Stmt<'a> {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` can complete normally, once the body has been resolved.
    pub fn completes(&self, id: StmtId) -> Option<bool> {
        self.completes[id.index()].get()
    }

    pub(crate) fn set_completes(&self, id: StmtId, completes: bool) {
        self.completes[id.index()].set(Some(completes));
    }

    /// The lexically enclosing statement.
    pub fn outer(&self, id: StmtId) -> Option<StmtId> {
        self.outer[id.index()]
    }

    /// Enclosing statements, innermost first, starting with `id`'s parent.
    pub fn ancestors(&self, id: StmtId) -> impl Iterator<Item = StmtId> + '_ {
        core::iter::successors(self.outer(id), move |&s| self.outer(s))
    }

    /// The statement a `break` at `from` leaves.
    ///
    /// Unlabeled: the innermost loop or switch. Labeled: the innermost
    /// labeled statement with that name.
    pub fn break_target(&self, from: StmtId, label: Option<&str>) -> Option<StmtId> {
        self.ancestors(from).find(|&s| {
            let stmt = self.get(s);
            match label {
                None => stmt.is_loop() || matches!(stmt.kind, StmtKind::Switch { .. }),
                Some(name) => matches!(stmt.kind, StmtKind::Labeled { name: n, .. } if n == name),
            }
        })
    }

    /// The loop a `continue` at `from` resumes.
    ///
    /// A labeled `continue` names a labeled statement whose body must be a
    /// loop; the loop itself is returned.
    pub fn continue_target(&self, from: StmtId, label: Option<&str>) -> Option<StmtId> {
        match label {
            None => self.ancestors(from).find(|&s| self.get(s).is_loop()),
            Some(_) => {
                let labeled = self.break_target(from, label)?;
                match self.get(labeled).kind {
                    StmtKind::Labeled { body, .. } if self.get(body).is_loop() => Some(body),
                    _ => None,
                }
            }
        }
    }

    /// Guarded statements whose protected region control leaves when going
    /// from `from` to `to` (`None` = out of the method), innermost first.
    ///
    /// A `finally` body is not part of its own statement's protected region,
    /// so jumping out of it does not run the same cleanup again.
    pub fn guarded_between(&self, from: StmtId, to: Option<StmtId>) -> SmallVec<[StmtId; 4]> {
        let mut out = SmallVec::new();
        let mut child = from;
        while let Some(parent) = self.outer(child) {
            if Some(parent) == to {
                break;
            }
            let stmt = self.get(parent);
            let in_cleanup =
                matches!(stmt.kind, StmtKind::Try { finally: Some(f), .. } if f == child);
            if stmt.is_guarded() && !in_cleanup {
                out.push(parent);
            }
            child = parent;
        }
        out
    }

    /// The `Switch` a `Case`/`Default` marker belongs to.
    pub fn enclosing_switch(&self, id: StmtId) -> Option<StmtId> {
        self.outer(id)
            .filter(|&s| matches!(self.get(s).kind, StmtKind::Switch { .. }))
    }
}
