//! Constant folding.
//!
//! Called by the resolver right after a node's type is known. A node folds
//! only when every operand is already constant; the result is produced in
//! the node's resolved type so later passes can treat it as a literal.

use crate::ast::{
    ArithOp, BinaryOp, BitwiseOp, CompareOp, Constant, EqualityOp, Expr, ExprKind, LogicalOp,
    ShiftOp, UnaryOp,
};
use crate::error::{InternalError, Pass};
use crate::types::DataType;

/// Compute the folded value of `expr`, or `None` if it does not fold.
///
/// `ty` is the node's resolved type. Integral division by a constant zero
/// does not fold; the division is left for the runtime to raise.
pub fn fold<'a>(expr: &Expr<'a>, ty: DataType) -> Result<Option<Constant<'a>>, InternalError> {
    match &expr.kind {
        ExprKind::Unary { op, operand, .. } if !op.is_update() && operand.is_constant() => {
            Ok(fold_unary(*op, operand.value(Pass::Resolve)?, ty))
        }
        ExprKind::Binary {
            op, left, right, ..
        } if left.is_constant() && right.is_constant() => {
            let (l, r) = (left.value(Pass::Resolve)?, right.value(Pass::Resolve)?);
            Ok(fold_binary(*op, l, r, ty))
        }
        _ => Ok(None),
    }
}

fn fold_unary<'a>(op: UnaryOp, value: Constant<'a>, ty: DataType) -> Option<Constant<'a>> {
    let value = match op {
        UnaryOp::Not => return value.as_bool().map(|b| Constant::Boolean(!b)),
        _ => value.convert(ty)?,
    };
    match (op, value) {
        (UnaryOp::Plus, v) => Some(v),
        (UnaryOp::Neg, Constant::Int(i)) => Some(Constant::Int(i.wrapping_neg())),
        (UnaryOp::Neg, Constant::Long(l)) => Some(Constant::Long(l.wrapping_neg())),
        (UnaryOp::Neg, Constant::Float(f)) => Some(Constant::Float(-f)),
        (UnaryOp::Neg, Constant::Double(d)) => Some(Constant::Double(-d)),
        (UnaryOp::BitNot, Constant::Int(i)) => Some(Constant::Int(!i)),
        (UnaryOp::BitNot, Constant::Long(l)) => Some(Constant::Long(!l)),
        _ => None,
    }
}

fn fold_binary<'a>(
    op: BinaryOp,
    left: Constant<'a>,
    right: Constant<'a>,
    ty: DataType,
) -> Option<Constant<'a>> {
    match op {
        BinaryOp::Arith(op) => arith(op, left.convert(ty)?, right.convert(ty)?),
        BinaryOp::Shift(op) => shift(op, left.convert(ty)?, right),
        BinaryOp::Compare(op) => {
            let common = DataType::binary_promotion(left.data_type(), right.data_type())?;
            compare(op, left.convert(common)?, right.convert(common)?).map(Constant::Boolean)
        }
        BinaryOp::Equality(op) => {
            let eq = equals(left, right)?;
            Some(Constant::Boolean(match op {
                EqualityOp::Eq => eq,
                EqualityOp::Ne => !eq,
            }))
        }
        BinaryOp::Bitwise(op) => bitwise(
            op,
            bitwise_operand(left, ty)?,
            bitwise_operand(right, ty)?,
        ),
        BinaryOp::Logical(op) => {
            let (l, r) = (left.as_bool()?, right.as_bool()?);
            Some(Constant::Boolean(match op {
                LogicalOp::And => l && r,
                LogicalOp::Or => l || r,
            }))
        }
    }
}

fn arith<'a>(op: ArithOp, left: Constant<'a>, right: Constant<'a>) -> Option<Constant<'a>> {
    let c = match (left, right) {
        (Constant::Int(l), Constant::Int(r)) => Constant::Int(match op {
            ArithOp::Add => l.wrapping_add(r),
            ArithOp::Sub => l.wrapping_sub(r),
            ArithOp::Mul => l.wrapping_mul(r),
            ArithOp::Div if r == 0 => return None,
            ArithOp::Div => l.wrapping_div(r),
            ArithOp::Rem if r == 0 => return None,
            ArithOp::Rem => l.wrapping_rem(r),
        }),
        (Constant::Long(l), Constant::Long(r)) => Constant::Long(match op {
            ArithOp::Add => l.wrapping_add(r),
            ArithOp::Sub => l.wrapping_sub(r),
            ArithOp::Mul => l.wrapping_mul(r),
            ArithOp::Div if r == 0 => return None,
            ArithOp::Div => l.wrapping_div(r),
            ArithOp::Rem if r == 0 => return None,
            ArithOp::Rem => l.wrapping_rem(r),
        }),
        (Constant::Float(l), Constant::Float(r)) => Constant::Float(match op {
            ArithOp::Add => l + r,
            ArithOp::Sub => l - r,
            ArithOp::Mul => l * r,
            ArithOp::Div => l / r,
            ArithOp::Rem => l % r,
        }),
        (Constant::Double(l), Constant::Double(r)) => Constant::Double(match op {
            ArithOp::Add => l + r,
            ArithOp::Sub => l - r,
            ArithOp::Mul => l * r,
            ArithOp::Div => l / r,
            ArithOp::Rem => l % r,
        }),
        _ => return None,
    };
    Some(c)
}

/// Shift counts are masked to the width of the promoted left operand.
fn shift<'a>(op: ShiftOp, left: Constant<'a>, count: Constant<'a>) -> Option<Constant<'a>> {
    let count = match count {
        Constant::Long(l) => l as u32,
        other => other.as_int()? as u32,
    };
    match left {
        Constant::Int(l) => {
            let n = count & 0x1f;
            Some(Constant::Int(match op {
                ShiftOp::Shl => l.wrapping_shl(n),
                ShiftOp::Shr => l.wrapping_shr(n),
                ShiftOp::Ushr => ((l as u32) >> n) as i32,
            }))
        }
        Constant::Long(l) => {
            let n = count & 0x3f;
            Some(Constant::Long(match op {
                ShiftOp::Shl => l.wrapping_shl(n),
                ShiftOp::Shr => l.wrapping_shr(n),
                ShiftOp::Ushr => ((l as u64) >> n) as i64,
            }))
        }
        _ => None,
    }
}

fn compare(op: CompareOp, left: Constant<'_>, right: Constant<'_>) -> Option<bool> {
    let ordering = match (left, right) {
        (Constant::Int(l), Constant::Int(r)) => l.partial_cmp(&r),
        (Constant::Long(l), Constant::Long(r)) => l.partial_cmp(&r),
        (Constant::Float(l), Constant::Float(r)) => l.partial_cmp(&r),
        (Constant::Double(l), Constant::Double(r)) => l.partial_cmp(&r),
        _ => return None,
    };
    // Any comparison involving NaN is false.
    let Some(ordering) = ordering else {
        return Some(false);
    };
    Some(match op {
        CompareOp::Lt => ordering.is_lt(),
        CompareOp::Le => ordering.is_le(),
        CompareOp::Gt => ordering.is_gt(),
        CompareOp::Ge => ordering.is_ge(),
    })
}

/// `==` on constants. String constants compare by content, as identical
/// literals share one instance at runtime.
fn equals(left: Constant<'_>, right: Constant<'_>) -> Option<bool> {
    match (left, right) {
        (Constant::Boolean(l), Constant::Boolean(r)) => Some(l == r),
        (Constant::Str(l), Constant::Str(r)) => Some(l == r),
        (Constant::Null, Constant::Null) => Some(true),
        (Constant::Null, Constant::Str(_)) | (Constant::Str(_), Constant::Null) => Some(false),
        (l, r) => {
            let common = DataType::binary_promotion(l.data_type(), r.data_type())?;
            // Float payloads compare with IEEE `==`, so NaN is unequal to itself.
            Some(l.convert(common)? == r.convert(common)?)
        }
    }
}

fn bitwise<'a>(op: BitwiseOp, left: Constant<'a>, right: Constant<'a>) -> Option<Constant<'a>> {
    let c = match (left, right) {
        (Constant::Boolean(l), Constant::Boolean(r)) => Constant::Boolean(match op {
            BitwiseOp::And => l & r,
            BitwiseOp::Or => l | r,
            BitwiseOp::Xor => l ^ r,
        }),
        (Constant::Int(l), Constant::Int(r)) => Constant::Int(match op {
            BitwiseOp::And => l & r,
            BitwiseOp::Or => l | r,
            BitwiseOp::Xor => l ^ r,
        }),
        (Constant::Long(l), Constant::Long(r)) => Constant::Long(match op {
            BitwiseOp::And => l & r,
            BitwiseOp::Or => l | r,
            BitwiseOp::Xor => l ^ r,
        }),
        _ => return None,
    };
    Some(c)
}

/// Booleans pass through unchanged; numbers convert to `ty`.
fn bitwise_operand(value: Constant<'_>, ty: DataType) -> Option<Constant<'_>> {
    match value {
        Constant::Boolean(_) => Some(value),
        other => other.convert(ty),
    }
}
