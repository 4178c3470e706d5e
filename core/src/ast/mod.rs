//! The expression/statement tree of one method body.

pub mod builder;
pub mod constant;
pub mod decl;
pub mod expr;
pub mod stmt;

pub use builder::AstBuilder;
pub use constant::Constant;
pub use decl::{LocalId, LocalVar, MethodDecl, MethodRef};
pub use expr::{
    ArithOp, BinaryOp, BitwiseOp, CompareOp, EqualityOp, Expr, ExprKind, LogicalOp, ShiftOp,
    UnaryOp,
};
pub use stmt::{Catch, MethodBody, Stmt, StmtArena, StmtId, StmtKind};
