//! The per-method instruction buffer and its finalized form.

use core::fmt;

use super::instruction::Instruction;
use crate::error::{DefectKind, InternalError, Pass};
use crate::{String, ToString, Vec};

/// A symbolic branch target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Binding of a label. A bound label never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelState {
    Unbound,
    Bound(usize),
}

#[derive(Debug, Clone, Copy)]
struct LabelInfo {
    state: LabelState,
    /// Stack depth on entry, recorded by the first branch to the label.
    depth: Option<i32>,
    referenced: bool,
}

/// One exception table entry: instructions in `start..end` transfer to
/// `handler` when an exception of `catch_type` (any, if `None`) is thrown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handler {
    pub start: usize,
    pub end: usize,
    pub handler: usize,
    pub catch_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineNumber {
    pub pc: usize,
    pub line: u32,
}

/// Append-only instruction buffer for one method body.
///
/// Tracks the operand stack depth as instructions are emitted, the maximum
/// depth reached and whether the current position is reachable. Labels are
/// bound write-once; [`CodeAttribute::finalize`] resolves them to offsets.
pub struct CodeAttribute {
    instructions: Vec<Instruction<Label>>,
    labels: Vec<LabelInfo>,
    handlers: Vec<Handler>,
    line_numbers: Option<Vec<LineNumber>>,
    depth: i32,
    max_stack: i32,
    max_locals: u16,
    reachable: bool,
}

impl CodeAttribute {
    /// # Arguments
    /// * `locals` - Slots taken by declared locals; temporaries come after
    /// * `line_numbers` - Whether to record a line-number table
    pub fn new(locals: u16, line_numbers: bool) -> Self {
        Self {
            instructions: Vec::new(),
            labels: Vec::new(),
            handlers: Vec::new(),
            line_numbers: line_numbers.then(Vec::new),
            depth: 0,
            max_stack: 0,
            max_locals: locals,
            reachable: true,
        }
    }

    // === Labels ===

    pub fn new_label(&mut self) -> Label {
        let label = Label(self.labels.len() as u32);
        self.labels.push(LabelInfo {
            state: LabelState::Unbound,
            depth: None,
            referenced: false,
        });
        label
    }

    pub fn label_state(&self, label: Label) -> LabelState {
        self.labels[label.0 as usize].state
    }

    pub fn is_referenced(&self, label: Label) -> bool {
        self.labels[label.0 as usize].referenced
    }

    /// Bind `label` to the next instruction.
    ///
    /// Binding after an unconditional transfer makes the position reachable
    /// again only if something branches here, and restores the stack depth
    /// recorded by that branch.
    pub fn bind(&mut self, label: Label) -> Result<(), InternalError> {
        let pc = self.pc();
        let info = &mut self.labels[label.0 as usize];
        if let LabelState::Bound(_) = info.state {
            return Err(InternalError::new(
                Pass::Generate,
                DefectKind::LabelAlreadyBound(label),
            ));
        }
        info.state = LabelState::Bound(pc);
        if !self.reachable {
            self.reachable = info.referenced;
            if let Some(depth) = info.depth {
                self.depth = depth;
            }
        } else if info.depth.is_none() {
            info.depth = Some(self.depth);
        }
        tracing::trace!(%label, pc, depth = self.depth, "Bound label");
        Ok(())
    }

    /// Start an exception handler at the next instruction. The thrown
    /// exception is the only value on the stack. Returns the handler's pc.
    pub fn enter_handler(&mut self) -> usize {
        self.reachable = true;
        self.depth = 1;
        self.max_stack = self.max_stack.max(1);
        self.pc()
    }

    pub fn add_handler(&mut self, start: usize, end: usize, handler: usize, catch_type: Option<&str>) {
        self.handlers.push(Handler {
            start,
            end,
            handler,
            catch_type: catch_type.map(|c| c.to_string()),
        });
    }

    // === Emission ===

    /// Offset of the next instruction.
    pub fn pc(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable
    }

    pub fn stack_depth(&self) -> i32 {
        self.depth
    }

    pub fn emit(&mut self, instruction: Instruction<Label>) {
        self.depth += instruction.stack_effect();
        debug_assert!(self.depth >= 0, "stack underflow at {:?}", instruction);
        self.max_stack = self.max_stack.max(self.depth);

        let entry_depth = match instruction {
            Instruction::Jsr(_) => self.depth + 1,
            _ => self.depth,
        };
        self.max_stack = self.max_stack.max(entry_depth);
        for target in instruction.targets() {
            let info = &mut self.labels[target.0 as usize];
            info.referenced = true;
            info.depth.get_or_insert(entry_depth);
        }
        if instruction.is_unconditional() {
            self.reachable = false;
        }
        self.instructions.push(instruction);
    }

    /// Call a subroutine that never returns; the next position is
    /// unreachable.
    pub fn emit_final_jsr(&mut self, label: Label) {
        self.emit(Instruction::Jsr(label));
        self.reachable = false;
    }

    /// Allocate a fresh local slot past every slot used so far.
    pub fn new_local(&mut self) -> u16 {
        let slot = self.max_locals;
        self.max_locals += 1;
        slot
    }

    /// Record that code for `line` starts at the next instruction.
    pub fn mark_line(&mut self, line: u32) {
        let pc = self.pc();
        if let Some(lines) = &mut self.line_numbers {
            match lines.last_mut() {
                Some(last) if last.line == line => {}
                Some(last) if last.pc == pc => last.line = line,
                _ => lines.push(LineNumber { pc, line }),
            }
        }
    }

    /// Resolve every label into its offset.
    ///
    /// Fails with UnboundLabel if a referenced label was never bound.
    /// Handler ranges that cover no instruction are dropped.
    pub fn finalize(self) -> Result<Code, InternalError> {
        let labels = self.labels;
        let resolve = |label: Label| match labels[label.0 as usize].state {
            LabelState::Bound(pc) => Ok(pc),
            LabelState::Unbound => Err(InternalError::new(
                Pass::Finalize,
                DefectKind::UnboundLabel(label),
            )),
        };
        let instructions = self
            .instructions
            .into_iter()
            .map(|i| i.map_targets(resolve))
            .collect::<Result<Vec<_>, _>>()?;
        let handlers = self
            .handlers
            .into_iter()
            .filter(|h| h.start < h.end)
            .collect();
        let code = Code {
            instructions,
            handlers,
            line_numbers: self.line_numbers.unwrap_or_default(),
            max_stack: self.max_stack as u16,
            max_locals: self.max_locals,
        };
        tracing::trace!("Finalized code:\n{}", code);
        Ok(code)
    }
}

/// A finalized method body: every branch target is an instruction offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    pub instructions: Vec<Instruction<usize>>,
    pub handlers: Vec<Handler>,
    pub line_numbers: Vec<LineNumber>,
    pub max_stack: u16,
    pub max_locals: u16,
}

impl Code {
    /// Offsets of every instruction that branches to `target`.
    pub fn branches_to(&self, target: usize) -> Vec<usize> {
        self.instructions
            .iter()
            .enumerate()
            .filter(|(_, i)| i.targets().iter().any(|&&t| t == target))
            .map(|(pc, _)| pc)
            .collect()
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "max_stack={} max_locals={}",
            self.max_stack, self.max_locals
        )?;
        for (pc, instruction) in self.instructions.iter().enumerate() {
            writeln!(f, "{:4}: {}", pc, instruction)?;
        }
        if !self.handlers.is_empty() {
            writeln!(f, "handlers:")?;
            for h in &self.handlers {
                writeln!(
                    f,
                    "  {}..{} -> {} {}",
                    h.start,
                    h.end,
                    h.handler,
                    h.catch_type.as_deref().unwrap_or("any")
                )?;
            }
        }
        Ok(())
    }
}
