//! Type resolution for one method body.

use core::fmt;

use hashbrown::HashSet;

use super::const_fold;
use crate::ast::{
    BinaryOp, Expr, ExprKind, LocalId, MethodBody, MethodDecl, StmtId, StmtKind,
    UnaryOp,
};
use crate::diagnostics::{DiagnosticCode, DiagnosticSink, Severity};
use crate::error::{DefectKind, InternalError, Pass};
use crate::format;
use crate::syntax::Token;
use crate::types::DataType;

/// Resolves the type of every expression in a method body, folds constant
/// expressions and checks statement-level rules.
///
/// Expressions resolve bottom-up and the result is memoized on the node, so
/// resolving the same node twice returns the cached type without recording
/// diagnostics again.
pub struct Resolver<'r, 'a> {
    method: &'r MethodDecl<'a>,
    body: &'r MethodBody<'a>,
    sink: &'r mut dyn DiagnosticSink,
    fold_constants: bool,
    /// Statements that some `break` leaves.
    broken: HashSet<StmtId>,
}

impl<'r, 'a> Resolver<'r, 'a> {
    pub fn new(
        method: &'r MethodDecl<'a>,
        body: &'r MethodBody<'a>,
        sink: &'r mut dyn DiagnosticSink,
        fold_constants: bool,
    ) -> Self {
        Self {
            method,
            body,
            sink,
            fold_constants,
            broken: HashSet::new(),
        }
    }

    /// Resolve the whole method body.
    ///
    /// Reports MissingReturn when a non-void body can complete normally.
    pub fn resolve_method(&mut self) -> Result<(), InternalError> {
        let root = self.body.root();
        let completes = self.resolve_stmt(root)?;
        if completes && self.method.return_type != DataType::Void {
            let at = match self.body.get(root).kind {
                StmtKind::Block { close, .. } => close,
                _ => self.method.name_token,
            };
            self.report(DiagnosticCode::MissingReturn, at, &[]);
        }
        Ok(())
    }

    fn report(&mut self, code: DiagnosticCode, at: &Token<'_>, params: &[&dyn fmt::Display]) {
        self.sink.record(Severity::Error, code, at, params);
    }

    fn bad_operands(&mut self, op_token: &Token<'_>, types: &dyn fmt::Display) -> DataType {
        self.report(
            DiagnosticCode::BadOperandType,
            op_token,
            &[&op_token.lexeme, types],
        );
        DataType::Error
    }

    fn local_type(&self, id: LocalId, expr: &Expr<'a>) -> Result<DataType, InternalError> {
        self.method.local(id).map(|l| l.ty).ok_or_else(|| {
            InternalError::at(
                Pass::Resolve,
                DefectKind::UnknownLocal(id.0),
                expr.start().pos,
            )
        })
    }

    // === Expressions ===

    /// Resolve (and possibly fold) an expression. Memoized.
    pub fn resolve_expr(&mut self, expr: &'a Expr<'a>) -> Result<DataType, InternalError> {
        if let Some(ty) = expr.resolved_type() {
            return Ok(ty);
        }
        let ty = match &expr.kind {
            ExprKind::Literal(value) => {
                // The literal token is the last token of the span, after any minus.
                let token = expr.end();
                if let Some(err) = token.escape_error {
                    self.report(DiagnosticCode::MalformedEscape, token, &[&err]);
                }
                value.data_type()
            }
            ExprKind::Local(id) => self.local_type(*id, expr)?,
            ExprKind::Assign {
                target,
                op_token,
                value,
            } => self.resolve_assign(target, op_token, value)?,
            ExprKind::Unary {
                op,
                op_token,
                operand,
            } => self.resolve_unary(*op, op_token, operand)?,
            ExprKind::Binary {
                op,
                op_token,
                left,
                right,
            } => self.resolve_binary(*op, op_token, left, right)?,
            ExprKind::Invoke { method, args } => {
                if args.len() != method.params.len() {
                    self.report(
                        DiagnosticCode::ArgumentMismatch,
                        expr.start(),
                        &[&method.name, &method.params.len(), &args.len()],
                    );
                }
                for (&arg, &param) in args.iter().zip(method.params.iter()) {
                    self.check_assignable(param, arg)?;
                }
                // Extra arguments are still resolved so their own errors surface.
                for &arg in args.iter().skip(method.params.len()) {
                    self.resolve_expr(arg)?;
                }
                method.ret
            }
        };
        expr.set_resolved_type(ty);
        if self.fold_constants && !ty.is_error() {
            if let Some(value) = const_fold::fold(expr, ty)? {
                tracing::trace!(kind = expr.kind_name(), %value, "Folded constant");
                expr.set_folded(value);
            }
        }
        Ok(ty)
    }

    fn resolve_assign(
        &mut self,
        target: &'a Expr<'a>,
        op_token: &Token<'_>,
        value: &'a Expr<'a>,
    ) -> Result<DataType, InternalError> {
        let target_ty = self.resolve_expr(target)?;
        if target.as_local().is_none() {
            self.resolve_expr(value)?;
            self.report(DiagnosticCode::NotAVariable, op_token, &[&"assignment"]);
            return Ok(DataType::Error);
        }
        self.check_assignable(target_ty, value)?;
        Ok(target_ty)
    }

    fn resolve_unary(
        &mut self,
        op: UnaryOp,
        op_token: &Token<'_>,
        operand: &'a Expr<'a>,
    ) -> Result<DataType, InternalError> {
        let ty = self.resolve_expr(operand)?;
        if op.is_update() && operand.as_local().is_none() {
            let what = format!("'{}'", op.symbol());
            self.report(DiagnosticCode::NotAVariable, op_token, &[&what]);
            return Ok(DataType::Error);
        }
        if ty.is_error() {
            return Ok(DataType::Error);
        }
        let result = match op {
            UnaryOp::Neg | UnaryOp::Plus if ty.is_numeric() => ty.unary_promotion(),
            UnaryOp::BitNot if ty.is_integral() => ty.unary_promotion(),
            UnaryOp::Not if ty == DataType::Boolean => DataType::Boolean,
            // An increment stores back into the variable, so keeps its type.
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec
                if ty.is_numeric() =>
            {
                ty
            }
            _ => return Ok(self.bad_operands(op_token, &ty)),
        };
        Ok(result)
    }

    fn resolve_binary(
        &mut self,
        op: BinaryOp,
        op_token: &Token<'_>,
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
    ) -> Result<DataType, InternalError> {
        let l = self.resolve_expr(left)?;
        let r = self.resolve_expr(right)?;
        if l.is_error() || r.is_error() {
            return Ok(DataType::Error);
        }
        let result = match op {
            BinaryOp::Arith(_) => DataType::binary_promotion(l, r),
            BinaryOp::Shift(_) => {
                (l.is_integral() && r.is_integral()).then(|| l.unary_promotion())
            }
            BinaryOp::Compare(_) => DataType::binary_promotion(l, r).map(|_| DataType::Boolean),
            BinaryOp::Equality(_) => {
                let comparable = (l.is_numeric() && r.is_numeric())
                    || (l == DataType::Boolean && r == DataType::Boolean)
                    || (l.is_reference() && r.is_reference());
                comparable.then_some(DataType::Boolean)
            }
            BinaryOp::Bitwise(_) => {
                if l == DataType::Boolean && r == DataType::Boolean {
                    Some(DataType::Boolean)
                } else {
                    DataType::integral_promotion(l, r)
                }
            }
            BinaryOp::Logical(_) => {
                (l == DataType::Boolean && r == DataType::Boolean).then_some(DataType::Boolean)
            }
        };
        match result {
            Some(ty) => Ok(ty),
            None => Ok(self.bad_operands(op_token, &format!("{}, {}", l, r))),
        }
    }

    /// Check that `value` may be stored into a `dest` slot.
    ///
    /// Besides plain assignability, an `int`-like constant that fits a
    /// `byte`, `short` or `char` destination narrows implicitly.
    fn check_assignable(&mut self, dest: DataType, value: &'a Expr<'a>) -> Result<(), InternalError> {
        let ty = self.resolve_expr(value)?;
        if dest.is_assignable_from(ty) {
            return Ok(());
        }
        let narrows = matches!(ty, DataType::Int | DataType::Short | DataType::Char | DataType::Byte)
            && value.is_constant()
            && value
                .value(Pass::Resolve)?
                .as_int()
                .is_some_and(|v| dest.fits_constant(v));
        if !narrows {
            self.report(DiagnosticCode::IncompatibleTypes, value.start(), &[&ty, &dest]);
        }
        Ok(())
    }

    fn check_condition(&mut self, cond: &'a Expr<'a>) -> Result<(), InternalError> {
        let ty = self.resolve_expr(cond)?;
        if ty != DataType::Boolean && !ty.is_error() {
            self.report(
                DiagnosticCode::IncompatibleTypes,
                cond.start(),
                &[&ty, &DataType::Boolean],
            );
        }
        Ok(())
    }

    fn check_reference(&mut self, operand: &'a Expr<'a>, keyword: &Token<'_>) -> Result<(), InternalError> {
        let ty = self.resolve_expr(operand)?;
        if !ty.is_reference() && !ty.is_error() {
            self.bad_operands(keyword, &ty);
        }
        Ok(())
    }

    // === Statements ===

    /// Resolve a statement. Returns whether it can complete normally.
    pub fn resolve_stmt(&mut self, id: StmtId) -> Result<bool, InternalError> {
        let stmt = *self.body.get(id);
        let completes = match stmt.kind {
            StmtKind::Expr(expr) => {
                self.resolve_expr(expr)?;
                true
            }
            StmtKind::LocalDecl { local, init } => {
                if let Some(init) = init {
                    let ty = self.method.local(local).map(|l| l.ty).ok_or_else(|| {
                        InternalError::at(
                            Pass::Resolve,
                            DefectKind::UnknownLocal(local.0),
                            stmt.start.pos,
                        )
                    })?;
                    self.check_assignable(ty, init)?;
                }
                true
            }
            StmtKind::Block { stmts, .. } => self.resolve_sequence(stmts)?,
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.check_condition(cond)?;
                let then_completes = self.resolve_stmt(then_branch)?;
                match else_branch {
                    Some(e) => self.resolve_stmt(e)? || then_completes,
                    None => true,
                }
            }
            StmtKind::While { cond, body } => {
                self.check_condition(cond)?;
                self.resolve_stmt(body)?;
                !is_constant_true(cond)? || self.broken.contains(&id)
            }
            StmtKind::DoWhile { body, cond } => {
                self.resolve_stmt(body)?;
                self.check_condition(cond)?;
                !is_constant_true(cond)? || self.broken.contains(&id)
            }
            StmtKind::For {
                init,
                cond,
                update,
                body,
            } => {
                self.resolve_sequence(init)?;
                if let Some(cond) = cond {
                    self.check_condition(cond)?;
                }
                for &expr in update {
                    self.resolve_expr(expr)?;
                }
                self.resolve_stmt(body)?;
                let infinite = match cond {
                    Some(cond) => is_constant_true(cond)?,
                    None => true,
                };
                !infinite || self.broken.contains(&id)
            }
            StmtKind::Labeled { body, .. } => {
                self.resolve_stmt(body)? || self.broken.contains(&id)
            }
            StmtKind::Switch { selector, body } => self.resolve_switch(id, selector, body)?,
            StmtKind::Case { .. } | StmtKind::Default => {
                return Err(InternalError::at(
                    Pass::Resolve,
                    DefectKind::MissingTarget(stmt.kind_name()),
                    stmt.start.pos,
                ));
            }
            StmtKind::Break { label } => {
                match self.body.break_target(id, label) {
                    Some(target) => {
                        self.broken.insert(target);
                    }
                    None => {
                        let what = match label {
                            Some(name) => format!("statement labeled '{}'", name),
                            None => "loop or switch".into(),
                        };
                        self.report(DiagnosticCode::UndefinedTarget, stmt.start, &[&"break", &what]);
                    }
                }
                false
            }
            StmtKind::Continue { label } => {
                if self.body.continue_target(id, label).is_none() {
                    let what = match label {
                        Some(name) => format!("loop labeled '{}'", name),
                        None => "loop".into(),
                    };
                    self.report(DiagnosticCode::UndefinedTarget, stmt.start, &[&"continue", &what]);
                }
                false
            }
            StmtKind::Return { value } => {
                let ret = self.method.return_type;
                match value {
                    Some(value) if ret == DataType::Void => {
                        let ty = self.resolve_expr(value)?;
                        if !ty.is_error() {
                            self.report(
                                DiagnosticCode::IncompatibleTypes,
                                value.start(),
                                &[&ty, &DataType::Void],
                            );
                        }
                    }
                    Some(value) => self.check_assignable(ret, value)?,
                    None if ret != DataType::Void => {
                        self.report(
                            DiagnosticCode::IncompatibleTypes,
                            stmt.start,
                            &[&DataType::Void, &ret],
                        );
                    }
                    None => {}
                }
                false
            }
            StmtKind::Throw { value } => {
                self.check_reference(value, stmt.start)?;
                false
            }
            StmtKind::Try {
                body,
                catches,
                finally,
            } => {
                let mut completes = self.resolve_stmt(body)?;
                for catch in catches {
                    completes |= self.resolve_stmt(catch.body)?;
                }
                // A finally that cannot complete swallows every exit.
                match finally {
                    Some(finally) => self.resolve_stmt(finally)? && completes,
                    None => completes,
                }
            }
            StmtKind::Synchronized { lock, body } => {
                self.check_reference(lock, stmt.start)?;
                self.resolve_stmt(body)?
            }
        };
        self.body.set_completes(id, completes);
        Ok(completes)
    }

    /// Resolve statements in order; completes if the last reachable one does.
    fn resolve_sequence(&mut self, stmts: &[StmtId]) -> Result<bool, InternalError> {
        let mut completes = true;
        for &s in stmts {
            completes = self.resolve_stmt(s)? && completes;
        }
        Ok(completes)
    }

    fn resolve_switch(
        &mut self,
        id: StmtId,
        selector: &'a Expr<'a>,
        body: &[StmtId],
    ) -> Result<bool, InternalError> {
        let selector_ty = self.resolve_expr(selector)?;
        let selector_ok = matches!(
            selector_ty,
            DataType::Int | DataType::Char | DataType::Short | DataType::Byte | DataType::Error
        );
        if !selector_ok {
            self.report(
                DiagnosticCode::IncompatibleTypes,
                selector.start(),
                &[&selector_ty, &DataType::Int],
            );
        }

        let mut seen = HashSet::new();
        let mut has_default = false;
        let mut completes = true;
        for &s in body {
            let stmt = *self.body.get(s);
            match stmt.kind {
                StmtKind::Case { value } => {
                    completes = true;
                    let ty = self.resolve_expr(value)?;
                    if ty.is_error() {
                        continue;
                    }
                    if !value.is_constant() {
                        self.report(DiagnosticCode::CaseNotConstant, value.start(), &[]);
                        continue;
                    }
                    if selector_ok {
                        self.check_assignable(selector_ty, value)?;
                    }
                    if let Some(v) = value.value(Pass::Resolve)?.as_int() {
                        if !seen.insert(v) {
                            self.report(DiagnosticCode::DuplicateCase, value.start(), &[&v]);
                        }
                    }
                }
                StmtKind::Default => {
                    completes = true;
                    has_default = true;
                }
                _ => completes = self.resolve_stmt(s)? && completes,
            }
        }
        Ok(completes || !has_default || self.broken.contains(&id))
    }
}

/// Whether `cond` is the constant `true`.
pub(crate) fn is_constant_true(cond: &Expr<'_>) -> Result<bool, InternalError> {
    Ok(cond.is_constant() && cond.value(Pass::Resolve)?.as_bool() == Some(true))
}
