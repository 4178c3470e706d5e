//! Expression nodes.
//!
//! Expressions are allocated in a `bumpalo::Bump` and referenced as
//! `&'a Expr<'a>`. The tree itself is immutable; the only state written after
//! construction is the memoized resolved type and folded constant, each
//! written at most once by the resolve pass.

use core::cell::{Cell, OnceCell};
use core::fmt;

use super::constant::Constant;
use super::decl::{LocalId, MethodRef};
use crate::error::{DefectKind, InternalError, Pass};
use crate::syntax::{Token, TokenSpan};
use crate::types::DataType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `+x`
    Plus,
    /// `!x`
    Not,
    /// `~x`
    BitNot,
    /// `++x`
    PreInc,
    /// `--x`
    PreDec,
    /// `x++`
    PostInc,
    /// `x--`
    PostDec,
}

impl UnaryOp {
    /// Increment and decrement, in either position.
    pub fn is_update(self) -> bool {
        matches!(
            self,
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec
        )
    }

    /// Whether the operator token comes after the operand.
    pub fn is_postfix(self) -> bool {
        matches!(self, UnaryOp::PostInc | UnaryOp::PostDec)
    }

    /// `+1` for increments, `-1` for decrements, `0` otherwise.
    pub fn delta(self) -> i32 {
        match self {
            UnaryOp::PreInc | UnaryOp::PostInc => 1,
            UnaryOp::PreDec | UnaryOp::PostDec => -1,
            _ => 0,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::PreInc | UnaryOp::PostInc => "++",
            UnaryOp::PreDec | UnaryOp::PostDec => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShiftOp {
    Shl,
    Shr,
    Ushr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EqualityOp {
    Eq,
    Ne,
}

/// `&`, `|`, `^`: both operands are always evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitwiseOp {
    And,
    Or,
    Xor,
}

/// `&&`, `||`: the right operand is skipped when the left decides the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

/// Binary operators, grouped by family so each family is matched
/// exhaustively where its typing or lowering rule lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Arith(ArithOp),
    Shift(ShiftOp),
    Compare(CompareOp),
    Equality(EqualityOp),
    Bitwise(BitwiseOp),
    Logical(LogicalOp),
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Arith(ArithOp::Add) => "+",
            BinaryOp::Arith(ArithOp::Sub) => "-",
            BinaryOp::Arith(ArithOp::Mul) => "*",
            BinaryOp::Arith(ArithOp::Div) => "/",
            BinaryOp::Arith(ArithOp::Rem) => "%",
            BinaryOp::Shift(ShiftOp::Shl) => "<<",
            BinaryOp::Shift(ShiftOp::Shr) => ">>",
            BinaryOp::Shift(ShiftOp::Ushr) => ">>>",
            BinaryOp::Compare(CompareOp::Lt) => "<",
            BinaryOp::Compare(CompareOp::Le) => "<=",
            BinaryOp::Compare(CompareOp::Gt) => ">",
            BinaryOp::Compare(CompareOp::Ge) => ">=",
            BinaryOp::Equality(EqualityOp::Eq) => "==",
            BinaryOp::Equality(EqualityOp::Ne) => "!=",
            BinaryOp::Bitwise(BitwiseOp::And) => "&",
            BinaryOp::Bitwise(BitwiseOp::Or) => "|",
            BinaryOp::Bitwise(BitwiseOp::Xor) => "^",
            BinaryOp::Logical(LogicalOp::And) => "&&",
            BinaryOp::Logical(LogicalOp::Or) => "||",
        }
    }
}

#[derive(Debug)]
pub enum ExprKind<'a> {
    /// A literal, possibly minus-prefixed. Always constant.
    Literal(Constant<'a>),

    /// A reference to a local variable or parameter.
    Local(LocalId),

    /// `target = value`, where `target` must be a local.
    Assign {
        target: &'a Expr<'a>,
        op_token: &'a Token<'a>,
        value: &'a Expr<'a>,
    },

    Unary {
        op: UnaryOp,
        op_token: &'a Token<'a>,
        operand: &'a Expr<'a>,
    },

    Binary {
        op: BinaryOp,
        op_token: &'a Token<'a>,
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
    },

    /// A call to a method resolved by the declared-type catalog.
    Invoke {
        method: &'a MethodRef<'a>,
        args: &'a [&'a Expr<'a>],
    },
}

pub struct Expr<'a> {
    pub kind: ExprKind<'a>,
    span: TokenSpan<'a>,
    resolved: Cell<Option<DataType>>,
    folded: OnceCell<Constant<'a>>,
}

impl<'a> Expr<'a> {
    pub(crate) fn new(kind: ExprKind<'a>, span: TokenSpan<'a>) -> Self {
        Self {
            kind,
            span,
            resolved: Cell::new(None),
            folded: OnceCell::new(),
        }
    }

    pub fn span(&self) -> TokenSpan<'a> {
        self.span
    }

    pub fn start(&self) -> &'a Token<'a> {
        self.span.start
    }

    pub fn end(&self) -> &'a Token<'a> {
        self.span.end
    }

    /// Short name of the node kind, for diagnostics and tracing.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ExprKind::Literal(_) => "literal",
            ExprKind::Local(_) => "local",
            ExprKind::Assign { .. } => "assignment",
            ExprKind::Unary { op, .. } if op.is_update() => "increment",
            ExprKind::Unary { .. } => "unary",
            ExprKind::Binary {
                op: BinaryOp::Bitwise(_),
                ..
            } => "bitwise",
            ExprKind::Binary {
                op: BinaryOp::Logical(_),
                ..
            } => "logical",
            ExprKind::Binary { .. } => "binary",
            ExprKind::Invoke { .. } => "invoke",
        }
    }

    /// Whether the expression has a compile-time value.
    ///
    /// Literals are constant from construction; other nodes become constant
    /// only if the resolve pass folded them. Increments never are.
    pub fn is_constant(&self) -> bool {
        match &self.kind {
            ExprKind::Literal(_) => true,
            ExprKind::Unary { op, .. } if op.is_update() => false,
            _ => self.folded.get().is_some(),
        }
    }

    /// The compile-time value. Asking a non-constant node is a compiler bug,
    /// reported against the asking `pass`.
    pub fn value(&self, pass: Pass) -> Result<Constant<'a>, InternalError> {
        match &self.kind {
            ExprKind::Literal(c) => Ok(*c),
            _ => self.folded.get().copied().ok_or_else(|| {
                InternalError::at(
                    pass,
                    DefectKind::IllegalConstantAccess(self.kind_name()),
                    self.start().pos,
                )
            }),
        }
    }

    /// The memoized result of type resolution, if it already ran.
    pub fn resolved_type(&self) -> Option<DataType> {
        self.resolved.get()
    }

    pub(crate) fn set_resolved_type(&self, ty: DataType) {
        debug_assert!(
            self.resolved.get().is_none_or(|old| old == ty),
            "type of {} expression resolved twice with different results",
            self.kind_name()
        );
        self.resolved.set(Some(ty));
    }

    pub(crate) fn set_folded(&self, value: Constant<'a>) {
        debug_assert!(
            !matches!(self.kind, ExprKind::Unary { op, .. } if op.is_update()),
            "increments are never constant"
        );
        // A second fold of the same node yields the same value; keep the first.
        let _ = self.folded.set(value);
    }

    /// The local this expression names, if it is a plain variable reference.
    pub fn as_local(&self) -> Option<LocalId> {
        match self.kind {
            ExprKind::Local(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Debug for Expr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expr")
            .field("kind", &self.kind)
            .field("start", &self.span.start.pos)
            .field("end", &self.span.end.pos)
            .field("resolved", &self.resolved.get())
            .field("folded", &self.folded.get())
            .finish()
    }
}
