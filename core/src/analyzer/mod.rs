//! Type resolution and constant folding.
//!
//! The resolver walks a method body bottom-up, memoizing each expression's
//! type on the node and folding expressions whose operands are all constant.
//! User errors are recorded in a [`DiagnosticSink`] and never abort the pass;
//! only compiler defects do.

mod const_fold;
mod resolver;


pub use resolver::Resolver;
pub(crate) use resolver::is_constant_true;

use crate::ast::{MethodBody, MethodDecl};
use crate::diagnostics::DiagnosticSink;
use crate::error::InternalError;

/// Resolve every expression and statement of `body`.
///
/// # Arguments
/// * `method` - The method being compiled, with its local table
/// * `body` - The sealed statement tree
/// * `sink` - Receives user diagnostics
/// * `fold_constants` - Whether composite expressions are folded
pub fn analyze<'a>(
    method: &MethodDecl<'a>,
    body: &MethodBody<'a>,
    sink: &mut dyn DiagnosticSink,
    fold_constants: bool,
) -> Result<(), InternalError> {
    tracing::debug!(method = method.name, statements = body.len(), "Resolving method");
    Resolver::new(method, body, sink, fold_constants).resolve_method()
}
