//! Code generation for the stack machine.
//!
//! [`Generator`] lowers a resolved method body into a [`CodeAttribute`],
//! which tracks stack depth and label bindings while instructions are
//! appended. [`CodeAttribute::finalize`] then resolves every label into an
//! instruction offset and yields the immutable [`Code`].

pub mod code;
mod expr;
pub mod generator;
pub mod instruction;
mod stmt;

pub use code::{Code, CodeAttribute, Handler, Label, LabelState, LineNumber};
pub use generator::Generator;
pub use instruction::{Cond, Instruction, NanBias, Narrow, NumOp, ValueKind};

use crate::ast::{MethodBody, MethodDecl};
use crate::error::InternalError;

/// Generate the code of a method whose body already passed resolution
/// without diagnostics.
pub fn generate<'a>(
    method: &MethodDecl<'a>,
    body: &MethodBody<'a>,
    line_numbers: bool,
) -> Result<Code, InternalError> {
    Generator::new(method, body, line_numbers).generate()
}

#[cfg(test)]
mod expr_test;
