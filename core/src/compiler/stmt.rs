//! Statement lowering, including the unwind protocol of guarded statements.
//!
//! A guarded statement (`try` with `finally`, `synchronized`) compiles its
//! cleanup once, as a local subroutine entered through its unwind label.
//! Every way out of the protected region calls it with `Jsr` before
//! transferring control: normal completion, `break`, `continue`, `return`,
//! and a catch-all handler that rethrows. Exits that already called the
//! cleanup are cut out of the catch-all handler's range.

use super::code::Label;
use super::generator::Generator;
use super::instruction::{Instruction, ValueKind};
use crate::ast::{Catch, Expr, StmtId, StmtKind};
use crate::error::{DefectKind, InternalError, Pass};
use crate::types::DataType;
use crate::Vec;

impl<'g, 'a> Generator<'g, 'a> {
    /// Generate one statement. Returns whether control can reach the code
    /// after it.
    ///
    /// Statements that control can never reach are not generated.
    pub(super) fn gen_stmt(&mut self, id: StmtId) -> Result<bool, InternalError> {
        let stmt = *self.body.get(id);
        if !self.code.is_reachable() {
            tracing::trace!(stmt = id.index(), kind = stmt.kind_name(), "Skipping dead statement");
            return Ok(false);
        }
        if !matches!(stmt.kind, StmtKind::Block { .. }) {
            self.mark_line(stmt.start.pos.line);
        }
        match stmt.kind {
            StmtKind::Expr(expr) => self.gen_discard(expr)?,
            StmtKind::LocalDecl { local, init } => {
                if let Some(init) = init {
                    let ty = self.method.local(local).map(|l| l.ty).ok_or_else(|| {
                        InternalError::at(
                            Pass::Generate,
                            DefectKind::UnknownLocal(local.0),
                            stmt.start.pos,
                        )
                    })?;
                    let kind = self.kind_of(init, ty)?;
                    self.gen_value(init, ty)?;
                    self.code.emit(Instruction::Store(kind, local.slot()));
                }
            }
            StmtKind::Block { stmts, .. } => {
                for &s in stmts {
                    self.gen_stmt(s)?;
                }
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => self.gen_if(cond, then_branch, else_branch)?,
            StmtKind::While { cond, body } => {
                if is_constant_false(cond)? {
                    tracing::trace!(stmt = id.index(), "Dropping loop with false condition");
                } else {
                    let top = self.continue_label(id);
                    let exit = self.break_label(id);
                    self.code.bind(top)?;
                    self.gen_cond(cond, exit, false)?;
                    self.gen_stmt(body)?;
                    if self.code.is_reachable() {
                        self.code.emit(Instruction::Goto(top));
                    }
                    self.code.bind(exit)?;
                }
            }
            StmtKind::DoWhile { body, cond } => {
                let top = self.code.new_label();
                let next = self.continue_label(id);
                let exit = self.break_label(id);
                self.code.bind(top)?;
                self.gen_stmt(body)?;
                self.code.bind(next)?;
                self.gen_cond(cond, top, true)?;
                self.code.bind(exit)?;
            }
            StmtKind::For {
                init,
                cond,
                update,
                body,
            } => self.gen_for(id, init, cond, update, body)?,
            StmtKind::Labeled { body, .. } => {
                self.gen_stmt(body)?;
                self.bind_break(id)?;
            }
            StmtKind::Switch { selector, body } => self.gen_switch(id, selector, body)?,
            StmtKind::Case { .. } | StmtKind::Default => return Err(self.missing_target(id)),
            StmtKind::Break { label } => {
                let target = self
                    .body
                    .break_target(id, label)
                    .ok_or_else(|| self.missing_target(id))?;
                let label = self.break_label(target);
                self.jump(id, target, label);
            }
            StmtKind::Continue { label } => {
                let target = self
                    .body
                    .continue_target(id, label)
                    .ok_or_else(|| self.missing_target(id))?;
                let label = self.continue_label(target);
                self.jump(id, target, label);
            }
            StmtKind::Return { value } => self.gen_return(id, value)?,
            StmtKind::Throw { value } => {
                self.gen_expr(value)?;
                self.code.emit(Instruction::Throw);
            }
            StmtKind::Try {
                body,
                catches,
                finally,
            } => self.gen_try(id, body, catches, finally)?,
            StmtKind::Synchronized { lock, body } => self.gen_synchronized(id, lock, body)?,
        }

        let depth = self.code.stack_depth();
        if self.code.is_reachable() && depth != 0 {
            return Err(InternalError::at(
                Pass::Generate,
                DefectKind::StackImbalance { depth },
                stmt.start.pos,
            ));
        }
        Ok(self.code.is_reachable())
    }

    fn gen_if(
        &mut self,
        cond: &'a Expr<'a>,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
    ) -> Result<(), InternalError> {
        if cond.is_constant() {
            // Only the branch that can run is generated.
            if cond.value(Pass::Generate)?.as_bool() == Some(true) {
                self.gen_stmt(then_branch)?;
            } else if let Some(else_branch) = else_branch {
                self.gen_stmt(else_branch)?;
            }
            return Ok(());
        }
        let otherwise = self.code.new_label();
        self.gen_cond(cond, otherwise, false)?;
        self.gen_stmt(then_branch)?;
        match else_branch {
            Some(else_branch) => {
                let done = self.code.new_label();
                if self.code.is_reachable() {
                    self.code.emit(Instruction::Goto(done));
                }
                self.code.bind(otherwise)?;
                self.gen_stmt(else_branch)?;
                self.code.bind(done)
            }
            None => self.code.bind(otherwise),
        }
    }

    fn gen_for(
        &mut self,
        id: StmtId,
        init: &'a [StmtId],
        cond: Option<&'a Expr<'a>>,
        update: &'a [&'a Expr<'a>],
        body: StmtId,
    ) -> Result<(), InternalError> {
        for &s in init {
            self.gen_stmt(s)?;
        }
        if let Some(cond) = cond {
            if is_constant_false(cond)? {
                tracing::trace!(stmt = id.index(), "Dropping loop with false condition");
                return Ok(());
            }
        }
        let top = self.code.new_label();
        let next = self.continue_label(id);
        let exit = self.break_label(id);
        self.code.bind(top)?;
        if let Some(cond) = cond {
            self.gen_cond(cond, exit, false)?;
        }
        self.gen_stmt(body)?;
        self.code.bind(next)?;
        if self.code.is_reachable() {
            for &expr in update {
                self.gen_discard(expr)?;
            }
            self.code.emit(Instruction::Goto(top));
        }
        self.code.bind(exit)
    }

    fn gen_switch(
        &mut self,
        id: StmtId,
        selector: &'a Expr<'a>,
        body: &'a [StmtId],
    ) -> Result<(), InternalError> {
        self.gen_value(selector, DataType::Int)?;

        let exit = self.break_label(id);
        let mut default = None;
        let mut cases: Vec<(i32, Label)> = Vec::new();
        for &s in body {
            match self.body.get(s).kind {
                StmtKind::Case { value } => {
                    let key = value
                        .value(Pass::Generate)?
                        .as_int()
                        .ok_or_else(|| self.missing_target(s))?;
                    let label = self.code.new_label();
                    self.case_labels.insert(s, label);
                    cases.push((key, label));
                }
                StmtKind::Default => {
                    let label = self.code.new_label();
                    self.case_labels.insert(s, label);
                    default = Some(label);
                }
                _ => {}
            }
        }
        cases.sort_unstable_by_key(|&(key, _)| key);
        self.code.emit(Instruction::LookupSwitch {
            default: default.unwrap_or(exit),
            cases,
        });

        for &s in body {
            match self.case_labels.get(&s) {
                Some(&label) => self.code.bind(label)?,
                None => {
                    self.gen_stmt(s)?;
                }
            }
        }
        self.code.bind(exit)
    }

    /// `break`/`continue`: run the cleanups between `from` and `target`, then
    /// jump.
    fn jump(&mut self, from: StmtId, target: StmtId, label: Label) {
        let pending = self.unwind(from, Some(target));
        if self.code.is_reachable() {
            self.code.emit(Instruction::Goto(label));
        }
        self.close_gaps(pending);
    }

    fn gen_return(&mut self, id: StmtId, value: Option<&'a Expr<'a>>) -> Result<(), InternalError> {
        let guarded = !self.body.guarded_between(id, None).is_empty();
        let kind = match value {
            Some(value) => {
                let ty = self.method.return_type;
                self.gen_value(value, ty)?;
                Some(self.kind_of(value, ty)?)
            }
            None => None,
        };
        if !guarded {
            self.code.emit(Instruction::Return(kind));
            return Ok(());
        }
        // The value is parked in a slot while the cleanups run.
        let slot = match kind {
            Some(kind) => {
                let slot = self.return_slot();
                self.code.emit(Instruction::Store(kind, slot));
                Some((kind, slot))
            }
            None => None,
        };
        let pending = self.unwind(id, None);
        if self.code.is_reachable() {
            if let Some((kind, slot)) = slot {
                self.code.emit(Instruction::Load(kind, slot));
            }
            self.code.emit(Instruction::Return(kind));
        }
        self.close_gaps(pending);
        Ok(())
    }

    fn gen_try(
        &mut self,
        id: StmtId,
        body: StmtId,
        catches: &'a [Catch<'a>],
        finally: Option<StmtId>,
    ) -> Result<(), InternalError> {
        if let Some(finally) = finally {
            if self.body.completes(finally) == Some(false) {
                self.mark_abrupt_cleanup(id);
            }
        }
        let done = self.code.new_label();
        let start = self.code.pc();
        self.gen_stmt(body)?;
        let end = self.code.pc();
        self.leave_region(id, finally.is_some(), done);

        for catch in catches {
            let handler = self.code.enter_handler();
            self.code
                .add_handler(start, end, handler, Some(catch.class_name));
            self.code
                .emit(Instruction::Store(ValueKind::Ref, catch.param.slot()));
            self.gen_stmt(catch.body)?;
            self.leave_region(id, finally.is_some(), done);
        }

        if let Some(finally) = finally {
            let region_end = self.code.pc();
            self.catch_all(id, start, region_end);
            let ret = self.enter_unwind(id)?;
            self.gen_stmt(finally)?;
            if self.code.is_reachable() {
                self.code.emit(Instruction::Ret(ret));
            }
        }
        self.code.bind(done)
    }

    fn gen_synchronized(
        &mut self,
        id: StmtId,
        lock: &'a Expr<'a>,
        body: StmtId,
    ) -> Result<(), InternalError> {
        let done = self.code.new_label();
        let lock_slot = self.code.new_local();
        self.gen_expr(lock)?;
        self.code.emit(Instruction::Dup);
        self.code.emit(Instruction::Store(ValueKind::Ref, lock_slot));
        self.code.emit(Instruction::MonitorEnter);

        let start = self.code.pc();
        self.gen_stmt(body)?;
        self.leave_region(id, true, done);

        let region_end = self.code.pc();
        self.catch_all(id, start, region_end);
        let ret = self.enter_unwind(id)?;
        self.code.emit(Instruction::Load(ValueKind::Ref, lock_slot));
        self.code.emit(Instruction::MonitorExit);
        self.code.emit(Instruction::Ret(ret));
        self.code.bind(done)
    }

    /// Normal completion of a protected region or catch clause.
    fn leave_region(&mut self, id: StmtId, guarded: bool, done: Label) {
        if !self.code.is_reachable() {
            return;
        }
        if guarded {
            self.normal_exit(id, done);
        } else {
            self.code.emit(Instruction::Goto(done));
        }
    }
}

fn is_constant_false(cond: &Expr<'_>) -> Result<bool, InternalError> {
    Ok(cond.is_constant() && cond.value(Pass::Generate)?.as_bool() == Some(false))
}
