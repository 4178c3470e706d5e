//! Internal compiler defects.
//!
//! These are not user diagnostics: each one means the compiler itself is
//! wrong (a builder produced an inconsistent span, a code path read a constant
//! that was never folded, an exit path of a guarded statement was dropped and
//! left a label unbound). They abort compilation of the unit with the pass and
//! node that tripped them, and are propagated with `?` rather than recovered.

use core::fmt;

use thiserror::Error;

use crate::String;
use crate::compiler::Label;
use crate::syntax::Pos;

/// The pipeline stage that detected a defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Build,
    Resolve,
    Generate,
    Finalize,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Pass::Build => "ast construction",
            Pass::Resolve => "resolution",
            Pass::Generate => "code generation",
            Pass::Finalize => "finalization",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefectKind {
    #[error("malformed token span: {0}")]
    SpanError(String),

    #[error("malformed statement tree: {0}")]
    MalformedTree(String),

    #[error("label {0} referenced but never bound")]
    UnboundLabel(Label),

    #[error("label {0} bound twice")]
    LabelAlreadyBound(Label),

    #[error("value() called on non-constant {0} expression")]
    IllegalConstantAccess(&'static str),

    #[error("{0} expression reached code generation without a resolved type")]
    UnresolvedType(&'static str),

    #[error("operand stack holds {depth} value(s) at a statement boundary")]
    StackImbalance { depth: i32 },

    #[error("local #{0} is not declared by the method")]
    UnknownLocal(u16),

    #[error("control reaches the end of non-void method")]
    FallOffNonVoid,

    #[error("{0} outside of any enclosing target")]
    MissingTarget(&'static str),
}

/// A defect in the compiler, with the context it was detected in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("internal compiler error during {pass}{}: {kind}", at_suffix(.pos))]
pub struct InternalError {
    pub pass: Pass,
    pub kind: DefectKind,
    /// Position of the offending node, when one is known.
    pub pos: Option<Pos>,
}

fn at_suffix(pos: &Option<Pos>) -> String {
    match pos {
        Some(p) => crate::format!(" at {}", p),
        None => String::new(),
    }
}

impl InternalError {
    pub fn new(pass: Pass, kind: DefectKind) -> Self {
        Self {
            pass,
            kind,
            pos: None,
        }
    }

    pub fn at(pass: Pass, kind: DefectKind, pos: Pos) -> Self {
        Self {
            pass,
            kind,
            pos: Some(pos),
        }
    }
}
