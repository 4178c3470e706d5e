//! Construction of expression nodes.
//!
//! The external parser builds expressions through [`AstBuilder`], which owns
//! the span rules: prefix operators start at their operator token, postfix
//! increments end at theirs, and composite nodes must contain their children
//! in source order. A violation is a defect in the parser and is reported as
//! a `SpanError`.

use bumpalo::Bump;

use super::constant::Constant;
use super::decl::{LocalId, MethodRef};
use super::expr::{BinaryOp, Expr, ExprKind, UnaryOp};
use crate::error::{DefectKind, InternalError, Pass};
use crate::format;
use crate::syntax::{Token, TokenKind, TokenSpan, span::check_children};

#[derive(Clone, Copy)]
pub struct AstBuilder<'a> {
    arena: &'a Bump,
}

impl<'a> AstBuilder<'a> {
    pub fn new(arena: &'a Bump) -> Self {
        Self { arena }
    }

    pub fn arena(&self) -> &'a Bump {
        self.arena
    }

    fn alloc(&self, kind: ExprKind<'a>, span: TokenSpan<'a>) -> &'a Expr<'a> {
        self.arena.alloc(Expr::new(kind, span))
    }

    /// A single-token literal. The token must carry a parsed value.
    pub fn literal(&self, token: &'a Token<'a>) -> Result<&'a Expr<'a>, InternalError> {
        let value = literal_value(token)?;
        Ok(self.alloc(ExprKind::Literal(value), TokenSpan::single(token)))
    }

    /// `-` followed by a numeric literal, folded into one literal node.
    ///
    /// Negation wraps, so `-2147483648` comes out as `i32::MIN`.
    pub fn negative_literal(
        &self,
        minus: &'a Token<'a>,
        token: &'a Token<'a>,
    ) -> Result<&'a Expr<'a>, InternalError> {
        if !is_minus(minus) {
            return Err(span_error(
                minus,
                format!("negative literal prefixed by {}", minus),
            ));
        }
        let span = TokenSpan::new(minus, token)?;
        let value = match literal_value(token)? {
            Constant::Int(i) => Constant::Int(i.wrapping_neg()),
            Constant::Long(l) => Constant::Long(l.wrapping_neg()),
            Constant::Float(f) => Constant::Float(-f),
            Constant::Double(d) => Constant::Double(-d),
            other => {
                return Err(span_error(
                    token,
                    format!("'-' applied to non-numeric literal {}", other),
                ));
            }
        };
        Ok(self.alloc(ExprKind::Literal(value), span))
    }

    pub fn local(&self, id: LocalId, name: &'a Token<'a>) -> &'a Expr<'a> {
        self.alloc(ExprKind::Local(id), TokenSpan::single(name))
    }

    /// A unary expression. Postfix `++`/`--` span from the operand's start to
    /// the operator; every other form spans from the operator to the
    /// operand's end.
    pub fn unary(
        &self,
        op: UnaryOp,
        op_token: &'a Token<'a>,
        operand: &'a Expr<'a>,
    ) -> Result<&'a Expr<'a>, InternalError> {
        let op_span = TokenSpan::single(op_token);
        let span = if op.is_postfix() {
            let span = TokenSpan::new(operand.start(), op_token)?;
            check_children(&span, &[operand.span(), op_span])?;
            span
        } else {
            let span = TokenSpan::new(op_token, operand.end())?;
            check_children(&span, &[op_span, operand.span()])?;
            span
        };
        Ok(self.alloc(
            ExprKind::Unary {
                op,
                op_token,
                operand,
            },
            span,
        ))
    }

    pub fn binary(
        &self,
        op: BinaryOp,
        left: &'a Expr<'a>,
        op_token: &'a Token<'a>,
        right: &'a Expr<'a>,
    ) -> Result<&'a Expr<'a>, InternalError> {
        let span = TokenSpan::new(left.start(), right.end())?;
        check_children(
            &span,
            &[left.span(), TokenSpan::single(op_token), right.span()],
        )?;
        Ok(self.alloc(
            ExprKind::Binary {
                op,
                op_token,
                left,
                right,
            },
            span,
        ))
    }

    pub fn assign(
        &self,
        target: &'a Expr<'a>,
        op_token: &'a Token<'a>,
        value: &'a Expr<'a>,
    ) -> Result<&'a Expr<'a>, InternalError> {
        let span = TokenSpan::new(target.start(), value.end())?;
        check_children(
            &span,
            &[target.span(), TokenSpan::single(op_token), value.span()],
        )?;
        Ok(self.alloc(
            ExprKind::Assign {
                target,
                op_token,
                value,
            },
            span,
        ))
    }

    /// `name(args...)`, spanning from the method name to the closing paren.
    pub fn invoke(
        &self,
        method: &'a MethodRef<'a>,
        name: &'a Token<'a>,
        args: &[&'a Expr<'a>],
        close: &'a Token<'a>,
    ) -> Result<&'a Expr<'a>, InternalError> {
        let span = TokenSpan::new(name, close)?;
        let mut children = crate::Vec::with_capacity(args.len() + 2);
        children.push(TokenSpan::single(name));
        children.extend(args.iter().map(|a| a.span()));
        children.push(TokenSpan::single(close));
        check_children(&span, &children)?;
        let args = self.arena.alloc_slice_copy(args);
        Ok(self.alloc(ExprKind::Invoke { method, args }, span))
    }
}

fn literal_value<'a>(token: &'a Token<'a>) -> Result<Constant<'a>, InternalError> {
    match token.literal {
        Some(value) if token.kind.is_literal() => Ok(Constant::from_literal(value)),
        _ => Err(span_error(
            token,
            format!("literal node built from non-literal token {}", token),
        )),
    }
}

fn span_error(token: &Token<'_>, message: crate::String) -> InternalError {
    InternalError::at(Pass::Build, DefectKind::SpanError(message), token.pos)
}

fn is_minus(token: &Token<'_>) -> bool {
    token.kind == TokenKind::Operator && token.lexeme == "-"
}
