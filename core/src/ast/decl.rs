//! Declarations handed over by the external name resolver.
//!
//! By the time the compiler core sees a method, every identifier has been
//! resolved: variable references point into the method's local table and
//! calls point at a [`MethodRef`] from the declared-type catalog.

use crate::syntax::Token;
use crate::types::DataType;

/// Index into [`MethodDecl::locals`]. Doubles as the local's slot number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(pub u16);

impl LocalId {
    pub fn slot(self) -> u16 {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LocalVar<'a> {
    pub name: &'a str,
    pub ty: DataType,
}

/// A resolved method signature used at a call site.
#[derive(Debug, Clone, Copy)]
pub struct MethodRef<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub params: &'a [DataType],
    pub ret: DataType,
}

/// The method being compiled.
#[derive(Debug, Clone, Copy)]
pub struct MethodDecl<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub return_type: DataType,
    /// The first `param_count` locals are the parameters.
    pub param_count: u16,
    /// Every local the method declares, parameters first.
    pub locals: &'a [LocalVar<'a>],
    /// Token naming the method, used to anchor method-level diagnostics.
    pub name_token: &'a Token<'a>,
}

impl<'a> MethodDecl<'a> {
    pub fn local(&self, id: LocalId) -> Option<&LocalVar<'a>> {
        self.locals.get(id.0 as usize)
    }
}
