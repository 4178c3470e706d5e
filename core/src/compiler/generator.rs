//! Lowering of a resolved method body into instructions.

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use super::code::{Code, CodeAttribute, Label};
use super::instruction::{Instruction, ValueKind};
use crate::ast::{Expr, MethodBody, MethodDecl, StmtId, StmtKind};
use crate::error::{DefectKind, InternalError, Pass};
use crate::types::DataType;
use crate::Vec;

/// Code generator for one method body.
///
/// Walks the statement tree depth-first and appends to a [`CodeAttribute`].
/// Every label it creates belongs to one statement: break and continue
/// targets, switch markers, and the unwind label of each guarded statement.
pub struct Generator<'g, 'a> {
    pub(super) method: &'g MethodDecl<'a>,
    pub(super) body: &'g MethodBody<'a>,
    pub(super) code: CodeAttribute,
    line_numbers: bool,

    /// Label bound right after a break target.
    break_labels: HashMap<StmtId, Label>,
    /// Label a `continue` of a loop jumps to.
    continue_labels: HashMap<StmtId, Label>,
    /// Labels of `case`/`default` markers.
    pub(super) case_labels: HashMap<StmtId, Label>,
    /// Entry point of each guarded statement's cleanup sequence.
    unwind_labels: HashMap<StmtId, Label>,
    /// Instruction ranges of exit sequences that already run a guarded
    /// statement's cleanup, excluded from its catch-all handler.
    gaps: HashMap<StmtId, Vec<(usize, usize)>>,
    /// Guarded statements whose cleanup never returns to its caller.
    abrupt_cleanups: HashSet<StmtId>,
    /// Slot holding a return value while cleanups run.
    return_slot: Option<u16>,
}

impl<'g, 'a> Generator<'g, 'a> {
    /// # Arguments
    /// * `method` - The method being compiled, with its local table
    /// * `body` - The resolved statement tree
    /// * `line_numbers` - Whether to record a line-number table
    pub fn new(method: &'g MethodDecl<'a>, body: &'g MethodBody<'a>, line_numbers: bool) -> Self {
        Self {
            method,
            body,
            code: CodeAttribute::new(method.locals.len() as u16, line_numbers),
            line_numbers,
            break_labels: HashMap::new(),
            continue_labels: HashMap::new(),
            case_labels: HashMap::new(),
            unwind_labels: HashMap::new(),
            gaps: HashMap::new(),
            abrupt_cleanups: HashSet::new(),
            return_slot: None,
        }
    }

    /// Generate and finalize the whole method.
    ///
    /// A void method that can fall off its end gets an implicit `return`;
    /// for any other method that is a defect the resolver should have
    /// reported as a missing return.
    pub fn generate(mut self) -> Result<Code, InternalError> {
        tracing::debug!(method = self.method.name, "Generating code");
        let root = self.body.root();
        let reachable = self.gen_stmt(root)?;
        if reachable {
            if self.method.return_type != DataType::Void {
                return Err(InternalError::new(Pass::Generate, DefectKind::FallOffNonVoid));
            }
            self.code.emit(Instruction::Return(None));
        }
        let code = self.code.finalize()?;
        tracing::debug!(
            method = self.method.name,
            instructions = code.instructions.len(),
            max_stack = code.max_stack,
            max_locals = code.max_locals,
            "Finalized method"
        );
        Ok(code)
    }

    /// The label assigned to a jump-target statement, if one was created:
    /// the end of a labeled statement, or the entry of a `case`/`default`.
    pub fn target_label(&self, id: StmtId) -> Option<Label> {
        match self.body.get(id).kind {
            StmtKind::Case { .. } | StmtKind::Default => self.case_labels.get(&id).copied(),
            _ => self.break_labels.get(&id).copied(),
        }
    }

    /// The unwind label of a guarded statement, if any exit needed it.
    pub fn unwind_label(&self, id: StmtId) -> Option<Label> {
        self.unwind_labels.get(&id).copied()
    }

    // === Helpers ===

    pub(super) fn mark_line(&mut self, line: u32) {
        if self.line_numbers {
            self.code.mark_line(line);
        }
    }

    pub(super) fn resolved(&self, expr: &Expr<'a>) -> Result<DataType, InternalError> {
        match expr.resolved_type() {
            Some(ty) if !ty.is_error() => Ok(ty),
            _ => Err(self.unresolved(expr)),
        }
    }

    /// Machine kind of a value-producing type.
    pub(super) fn kind_of(&self, expr: &Expr<'a>, ty: DataType) -> Result<ValueKind, InternalError> {
        ValueKind::of(ty).ok_or_else(|| self.unresolved(expr))
    }

    pub(super) fn unresolved(&self, expr: &Expr<'a>) -> InternalError {
        InternalError::at(
            Pass::Generate,
            DefectKind::UnresolvedType(expr.kind_name()),
            expr.start().pos,
        )
    }

    pub(super) fn break_label(&mut self, target: StmtId) -> Label {
        let code = &mut self.code;
        *self.break_labels.entry(target).or_insert_with(|| code.new_label())
    }

    pub(super) fn continue_label(&mut self, target: StmtId) -> Label {
        let code = &mut self.code;
        *self
            .continue_labels
            .entry(target)
            .or_insert_with(|| code.new_label())
    }

    /// Bind the break label of `id` if any `break` referenced it.
    pub(super) fn bind_break(&mut self, id: StmtId) -> Result<(), InternalError> {
        match self.break_labels.get(&id) {
            Some(&label) => self.code.bind(label),
            None => Ok(()),
        }
    }

    pub(super) fn return_slot(&mut self) -> u16 {
        match self.return_slot {
            Some(slot) => slot,
            None => {
                let slot = self.code.new_local();
                self.return_slot = Some(slot);
                slot
            }
        }
    }

    pub(super) fn missing_target(&self, id: StmtId) -> InternalError {
        let stmt = self.body.get(id);
        InternalError::at(
            Pass::Generate,
            DefectKind::MissingTarget(stmt.kind_name()),
            stmt.start.pos,
        )
    }

    // === Unwinding ===

    /// The single unwind label of guarded statement `id`, created on first use.
    fn unwind_label_for(&mut self, id: StmtId) -> Label {
        let code = &mut self.code;
        *self
            .unwind_labels
            .entry(id)
            .or_insert_with(|| code.new_label())
    }

    /// Record that the cleanup of `id` cannot complete, so no code follows
    /// a call to it.
    pub(super) fn mark_abrupt_cleanup(&mut self, id: StmtId) {
        self.abrupt_cleanups.insert(id);
    }

    /// Call the cleanup of `id`. Leaves the position unreachable when that
    /// cleanup never returns.
    fn call_cleanup(&mut self, id: StmtId) {
        let label = self.unwind_label_for(id);
        if self.abrupt_cleanups.contains(&id) {
            self.code.emit_final_jsr(label);
        } else {
            self.code.emit(Instruction::Jsr(label));
        }
    }

    /// Call the cleanup of every guarded statement control leaves when
    /// going from `from` to `to` (`None` = out of the method), innermost
    /// first. Stops at the first cleanup that never returns.
    ///
    /// Returns the open gap of each statement unwound; pass it to
    /// [`Generator::close_gaps`] once the final transfer is emitted.
    pub(super) fn unwind(&mut self, from: StmtId, to: Option<StmtId>) -> PendingGaps {
        let chain = self.body.guarded_between(from, to);
        let mut pending = PendingGaps::new();
        for guarded in chain {
            tracing::trace!(from = from.index(), guarded = guarded.index(), "Unwinding");
            pending.push((guarded, self.code.pc()));
            self.call_cleanup(guarded);
            if !self.code.is_reachable() {
                break;
            }
        }
        pending
    }

    pub(super) fn close_gaps(&mut self, pending: PendingGaps) {
        let end = self.code.pc();
        for (guarded, start) in pending {
            self.gaps.entry(guarded).or_default().push((start, end));
        }
    }

    /// Run the cleanup of `id` on normal completion of its region, then
    /// continue at `resume`.
    pub(super) fn normal_exit(&mut self, id: StmtId, resume: Label) {
        let start = self.code.pc();
        self.call_cleanup(id);
        if self.code.is_reachable() {
            self.code.emit(Instruction::Goto(resume));
        }
        self.gaps
            .entry(id)
            .or_default()
            .push((start, self.code.pc()));
    }

    /// Emit the catch-all handler of guarded statement `id` over
    /// `start..end` (minus the exits that already ran the cleanup): save
    /// the exception, run the cleanup, rethrow.
    pub(super) fn catch_all(&mut self, id: StmtId, start: usize, end: usize) {
        let handler = self.code.enter_handler();
        let slot = self.code.new_local();
        self.code.emit(Instruction::Store(ValueKind::Ref, slot));
        self.call_cleanup(id);
        if self.code.is_reachable() {
            self.code.emit(Instruction::Load(ValueKind::Ref, slot));
            self.code.emit(Instruction::Throw);
        }

        let mut gaps = self.gaps.remove(&id).unwrap_or_default();
        gaps.sort_unstable();
        let mut from = start;
        for (gap_start, gap_end) in gaps {
            if gap_start >= end {
                break;
            }
            self.code.add_handler(from, gap_start.max(from), handler, None);
            from = from.max(gap_end);
        }
        self.code.add_handler(from, end.max(from), handler, None);
    }

    /// Start the cleanup subroutine of `id`: bind its unwind label and save
    /// the return address. Returns the slot to `ret` through.
    pub(super) fn enter_unwind(&mut self, id: StmtId) -> Result<u16, InternalError> {
        let label = self.unwind_label_for(id);
        self.code.bind(label)?;
        let slot = self.code.new_local();
        self.code.emit(Instruction::Store(ValueKind::Ref, slot));
        Ok(slot)
    }
}

pub(super) type PendingGaps = SmallVec<[(StmtId, usize); 4]>;
