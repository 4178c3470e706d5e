//! Expression lowering: values, conversions and conditional branches.

use super::code::Label;
use super::generator::Generator;
use super::instruction::{Cond, Instruction, NanBias, Narrow, NumOp, ValueKind};
use crate::ast::{
    ArithOp, BinaryOp, BitwiseOp, CompareOp, Constant, EqualityOp, Expr, ExprKind, LogicalOp,
    ShiftOp, UnaryOp,
};
use crate::error::{InternalError, Pass};
use crate::types::DataType;
use crate::ToString;

impl<'g, 'a> Generator<'g, 'a> {
    /// Push the value of `expr`. A call to a void method pushes nothing.
    pub(super) fn gen_expr(&mut self, expr: &'a Expr<'a>) -> Result<(), InternalError> {
        let ty = self.resolved(expr)?;
        if expr.is_constant() {
            self.push_constant(expr.value(Pass::Generate)?);
            return Ok(());
        }
        match &expr.kind {
            ExprKind::Literal(value) => self.push_constant(*value),
            ExprKind::Local(id) => {
                let kind = self.kind_of(expr, ty)?;
                self.code.emit(Instruction::Load(kind, id.slot()));
            }
            ExprKind::Assign { target, value, .. } => {
                let slot = match target.as_local() {
                    Some(id) => id.slot(),
                    None => return Err(self.unresolved(expr)),
                };
                let kind = self.kind_of(expr, ty)?;
                self.gen_value(value, ty)?;
                self.code.emit(Instruction::Dup);
                self.code.emit(Instruction::Store(kind, slot));
            }
            ExprKind::Unary { op, operand, .. } => self.gen_unary(expr, *op, operand, ty)?,
            ExprKind::Binary {
                op, left, right, ..
            } => self.gen_binary(expr, *op, left, right, ty)?,
            ExprKind::Invoke { method, args } => {
                for (&arg, &param) in args.iter().zip(method.params.iter()) {
                    self.gen_value(arg, param)?;
                }
                self.code.emit(Instruction::Invoke {
                    owner: method.owner.to_string(),
                    name: method.name.to_string(),
                    argc: args.len() as u16,
                    returns: method.ret != DataType::Void,
                });
            }
        }
        Ok(())
    }

    /// Push the value of `expr` converted to `to`.
    ///
    /// Numeric constants are pushed already converted.
    pub(super) fn gen_value(&mut self, expr: &'a Expr<'a>, to: DataType) -> Result<(), InternalError> {
        if expr.is_constant() {
            if let Some(value) = expr.value(Pass::Generate)?.convert(to) {
                self.push_constant(value);
                return Ok(());
            }
        }
        self.gen_expr(expr)?;
        let from = self.resolved(expr)?;
        self.coerce(from, to);
        Ok(())
    }

    /// Evaluate an expression for its side effects only.
    pub(super) fn gen_discard(&mut self, expr: &'a Expr<'a>) -> Result<(), InternalError> {
        self.gen_expr(expr)?;
        if self.resolved(expr)? != DataType::Void {
            self.code.emit(Instruction::Pop);
        }
        Ok(())
    }

    fn push_constant(&mut self, value: Constant<'a>) {
        let instruction = match value {
            Constant::Boolean(b) => Instruction::PushInt(b as i32),
            Constant::Char(c) => Instruction::PushInt(c as i32),
            Constant::Int(i) => Instruction::PushInt(i),
            Constant::Long(l) => Instruction::PushLong(l),
            Constant::Float(f) => Instruction::PushFloat(f),
            Constant::Double(d) => Instruction::PushDouble(d),
            Constant::Str(s) => Instruction::PushString(s.to_string()),
            Constant::Null => Instruction::PushNull,
        };
        self.code.emit(instruction);
    }

    /// Convert the value on top of the stack between machine kinds.
    fn coerce(&mut self, from: DataType, to: DataType) {
        if let (Some(from), Some(to)) = (ValueKind::of(from), ValueKind::of(to)) {
            if from != to && from != ValueKind::Ref && to != ValueKind::Ref {
                self.code.emit(Instruction::Convert(from, to));
            }
        }
    }

    fn push_delta(&mut self, kind: ValueKind, delta: i32) {
        self.code.emit(match kind {
            ValueKind::Long => Instruction::PushLong(delta as i64),
            ValueKind::Float => Instruction::PushFloat(delta as f32),
            ValueKind::Double => Instruction::PushDouble(delta as f64),
            ValueKind::Int | ValueKind::Ref => Instruction::PushInt(delta),
        });
    }

    fn gen_unary(
        &mut self,
        expr: &'a Expr<'a>,
        op: UnaryOp,
        operand: &'a Expr<'a>,
        ty: DataType,
    ) -> Result<(), InternalError> {
        let kind = self.kind_of(expr, ty)?;
        match op {
            UnaryOp::Plus => self.gen_value(operand, ty)?,
            UnaryOp::Neg => {
                self.gen_value(operand, ty)?;
                self.code.emit(Instruction::Neg(kind));
            }
            UnaryOp::BitNot => {
                self.gen_value(operand, ty)?;
                self.push_delta(kind, -1);
                self.code.emit(Instruction::Arith(kind, NumOp::Xor));
            }
            UnaryOp::Not => self.gen_bool(expr)?,
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
                let slot = match operand.as_local() {
                    Some(id) => id.slot(),
                    None => return Err(self.unresolved(expr)),
                };
                self.code.emit(Instruction::Load(kind, slot));
                if op.is_postfix() {
                    self.code.emit(Instruction::Dup);
                }
                self.push_delta(kind, op.delta());
                self.code.emit(Instruction::Arith(kind, NumOp::Add));
                if let Some(narrow) = Narrow::of(ty) {
                    self.code.emit(Instruction::Narrow(narrow));
                }
                self.code.emit(Instruction::Store(kind, slot));
                if !op.is_postfix() {
                    self.code.emit(Instruction::Load(kind, slot));
                }
            }
        }
        Ok(())
    }

    fn gen_binary(
        &mut self,
        expr: &'a Expr<'a>,
        op: BinaryOp,
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
        ty: DataType,
    ) -> Result<(), InternalError> {
        let num_op = match op {
            BinaryOp::Compare(_) | BinaryOp::Equality(_) | BinaryOp::Logical(_) => {
                return self.gen_bool(expr);
            }
            BinaryOp::Arith(ArithOp::Add) => NumOp::Add,
            BinaryOp::Arith(ArithOp::Sub) => NumOp::Sub,
            BinaryOp::Arith(ArithOp::Mul) => NumOp::Mul,
            BinaryOp::Arith(ArithOp::Div) => NumOp::Div,
            BinaryOp::Arith(ArithOp::Rem) => NumOp::Rem,
            BinaryOp::Shift(ShiftOp::Shl) => NumOp::Shl,
            BinaryOp::Shift(ShiftOp::Shr) => NumOp::Shr,
            BinaryOp::Shift(ShiftOp::Ushr) => NumOp::Ushr,
            BinaryOp::Bitwise(BitwiseOp::And) => NumOp::And,
            BinaryOp::Bitwise(BitwiseOp::Or) => NumOp::Or,
            BinaryOp::Bitwise(BitwiseOp::Xor) => NumOp::Xor,
        };
        let kind = self.kind_of(expr, ty)?;
        self.gen_value(left, ty)?;
        // The shift count is always an int, whatever the shifted type.
        let right_ty = match op {
            BinaryOp::Shift(_) => DataType::Int,
            _ => ty,
        };
        self.gen_value(right, right_ty)?;
        self.code.emit(Instruction::Arith(kind, num_op));
        Ok(())
    }

    /// Materialize a boolean-valued expression as `0` or `1`.
    fn gen_bool(&mut self, expr: &'a Expr<'a>) -> Result<(), InternalError> {
        let when_false = self.code.new_label();
        let done = self.code.new_label();
        self.gen_cond(expr, when_false, false)?;
        if self.code.is_reachable() {
            self.code.emit(Instruction::PushInt(1));
            self.code.emit(Instruction::Goto(done));
        }
        self.code.bind(when_false)?;
        if self.code.is_reachable() {
            self.code.emit(Instruction::PushInt(0));
        }
        self.code.bind(done)
    }

    /// Branch to `target` if `cond` evaluates to `jump_if`, otherwise fall
    /// through. Leaves the stack as it found it.
    ///
    /// Constant conditions emit either an unconditional jump or nothing, and
    /// the right operand of `&&`/`||` is not generated at all once the left
    /// operand decides the outcome.
    pub(super) fn gen_cond(
        &mut self,
        cond: &'a Expr<'a>,
        target: Label,
        jump_if: bool,
    ) -> Result<(), InternalError> {
        if !self.code.is_reachable() {
            return Ok(());
        }
        if cond.is_constant() {
            if cond.value(Pass::Generate)?.as_bool() == Some(jump_if) {
                self.code.emit(Instruction::Goto(target));
            }
            return Ok(());
        }
        match &cond.kind {
            ExprKind::Unary {
                op: UnaryOp::Not,
                operand,
                ..
            } => self.gen_cond(operand, target, !jump_if),
            ExprKind::Binary {
                op: BinaryOp::Logical(op),
                left,
                right,
                ..
            } => {
                // `a && b` jumps when false as soon as either side is false;
                // `a || b` jumps when true as soon as either side is true.
                let either_side = (*op == LogicalOp::And) != jump_if;
                if either_side {
                    self.gen_cond(left, target, jump_if)?;
                    self.gen_cond(right, target, jump_if)
                } else {
                    let skip = self.code.new_label();
                    self.gen_cond(left, skip, !jump_if)?;
                    self.gen_cond(right, target, jump_if)?;
                    self.code.bind(skip)
                }
            }
            ExprKind::Binary {
                op: BinaryOp::Compare(op),
                left,
                right,
                ..
            } => {
                let (cond, bias) = match op {
                    CompareOp::Lt => (Cond::Lt, NanBias::Greater),
                    CompareOp::Le => (Cond::Le, NanBias::Greater),
                    CompareOp::Gt => (Cond::Gt, NanBias::Less),
                    CompareOp::Ge => (Cond::Ge, NanBias::Less),
                };
                self.gen_compare(cond, bias, left, right, target, jump_if)
            }
            ExprKind::Binary {
                op: BinaryOp::Equality(op),
                left,
                right,
                ..
            } => {
                let cond = match op {
                    EqualityOp::Eq => Cond::Eq,
                    EqualityOp::Ne => Cond::Ne,
                };
                self.gen_compare(cond, NanBias::Less, left, right, target, jump_if)
            }
            _ => {
                self.gen_expr(cond)?;
                let test = if jump_if { Cond::Ne } else { Cond::Eq };
                self.code.emit(Instruction::If(test, target));
                Ok(())
            }
        }
    }

    /// Compare two operands and branch. Floating-point compares use `bias`
    /// so that a NaN operand makes the original condition false.
    fn gen_compare(
        &mut self,
        cond: Cond,
        bias: NanBias,
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
        target: Label,
        jump_if: bool,
    ) -> Result<(), InternalError> {
        let cond = if jump_if { cond } else { cond.negate() };
        let l = self.resolved(left)?;
        let r = self.resolved(right)?;
        let operand_ty = DataType::binary_promotion(l, r).unwrap_or(l);
        self.gen_value(left, operand_ty)?;
        self.gen_value(right, operand_ty)?;
        match self.kind_of(left, operand_ty)? {
            ValueKind::Int => self.code.emit(Instruction::IfCmp(cond, target)),
            ValueKind::Ref => self.code.emit(Instruction::IfRefCmp(cond, target)),
            kind => {
                self.code.emit(Instruction::Compare(kind, bias));
                self.code.emit(Instruction::If(cond, target));
            }
        }
        Ok(())
    }
}
