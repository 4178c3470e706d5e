//! Tests for expression lowering.

use bumpalo::Bump;
use pretty_assertions::assert_eq;

use crate::analyzer;
use crate::ast::{
    ArithOp, AstBuilder, BinaryOp, CompareOp, EqualityOp, Expr, LocalId, LogicalOp, MethodDecl,
    ShiftOp, StmtArena, StmtId, StmtKind, UnaryOp,
};
use crate::compiler::{self, Code, Cond, Instruction, NanBias, Narrow, NumOp, ValueKind};
use crate::diagnostics::Diagnostics;
use crate::error::{DefectKind, Pass};
use crate::test_utils::{MethodFixture, Tokens};
use crate::types::DataType;

type I = Instruction<usize>;

/// Resolve and generate a void method made of the given expression
/// statements.
fn compile_exprs<'a>(
    arena: &'a Bump,
    t: &Tokens<'a>,
    method: &MethodDecl<'a>,
    exprs: &[&'a Expr<'a>],
    fold_constants: bool,
) -> Code {
    let mut stmts = StmtArena::new(arena);
    let ids: Vec<StmtId> = exprs
        .iter()
        .map(|&e| stmts.alloc(e.start(), StmtKind::Expr(e)))
        .collect();
    let root = stmts.block(t.sep("{"), &ids, t.sep("}"));
    let body = stmts.finish(root).unwrap();

    let mut sink = Diagnostics::new();
    analyzer::analyze(method, &body, &mut sink, fold_constants).unwrap();
    let messages: Vec<String> = sink.iter().map(|d| d.to_string()).collect();
    assert_eq!(messages, Vec::<String>::new());

    compiler::generate(method, &body, false).unwrap()
}

#[test]
fn test_post_increment_statement() {
    let arena = Bump::new();
    let t = Tokens::new(&arena);
    let b = AstBuilder::new(&arena);
    let mut m = MethodFixture::new(&arena);
    let i = m.local("i", DataType::Int);

    // `i++;`
    let var = b.local(i, t.ident("i"));
    let inc = b.unary(UnaryOp::PostInc, t.op("++"), var).unwrap();

    let code = compile_exprs(&arena, &t, &m.decl(DataType::Void, 1), &[inc], true);
    assert_eq!(
        code.instructions,
        vec![
            I::Load(ValueKind::Int, 0),
            I::Dup,
            I::PushInt(1),
            I::Arith(ValueKind::Int, NumOp::Add),
            I::Store(ValueKind::Int, 0),
            I::Pop,
            I::Return(None),
        ]
    );
    assert_eq!(code.max_stack, 3);
}

#[test]
fn test_pre_decrement_narrows_byte() {
    let arena = Bump::new();
    let t = Tokens::new(&arena);
    let b = AstBuilder::new(&arena);
    let mut m = MethodFixture::new(&arena);
    let x = m.local("x", DataType::Byte);

    // `--x;`
    let minus_minus = t.op("--");
    let dec = b
        .unary(UnaryOp::PreDec, minus_minus, b.local(x, t.ident("x")))
        .unwrap();

    let code = compile_exprs(&arena, &t, &m.decl(DataType::Void, 1), &[dec], true);
    assert_eq!(
        code.instructions,
        vec![
            I::Load(ValueKind::Int, 0),
            I::PushInt(-1),
            I::Arith(ValueKind::Int, NumOp::Add),
            I::Narrow(Narrow::Byte),
            I::Store(ValueKind::Int, 0),
            I::Load(ValueKind::Int, 0),
            I::Pop,
            I::Return(None),
        ]
    );
}

#[test]
fn test_long_post_increment_value_is_old_value() {
    let arena = Bump::new();
    let t = Tokens::new(&arena);
    let b = AstBuilder::new(&arena);
    let mut m = MethodFixture::new(&arena);
    let x = m.local("x", DataType::Long);
    let y = m.local("y", DataType::Long);

    // `y = x++;`
    let target = b.local(y, t.ident("y"));
    let eq = t.op("=");
    let var = b.local(x, t.ident("x"));
    let inc = b.unary(UnaryOp::PostInc, t.op("++"), var).unwrap();
    let assign = b.assign(target, eq, inc).unwrap();

    let code = compile_exprs(&arena, &t, &m.decl(DataType::Void, 2), &[assign], true);
    assert_eq!(
        code.instructions,
        vec![
            I::Load(ValueKind::Long, 0),
            I::Dup,
            I::PushLong(1),
            I::Arith(ValueKind::Long, NumOp::Add),
            I::Store(ValueKind::Long, 0),
            I::Dup,
            I::Store(ValueKind::Long, 1),
            I::Pop,
            I::Return(None),
        ]
    );
}

/// `flag = <left> <op> f()`, where `f` is a boolean method.
fn short_circuit_method(left: bool, op: LogicalOp) -> Code {
    let arena = Bump::new();
    let t = Tokens::new(&arena);
    let b = AstBuilder::new(&arena);
    let mut m = MethodFixture::new(&arena);
    let flag = m.local("flag", DataType::Boolean);
    let f = m.method_ref("f", &[], DataType::Boolean);

    let target = b.local(flag, t.ident("flag"));
    let eq = t.op("=");
    let lhs = b.literal(t.boolean(left)).unwrap();
    let op_token = t.op(if op == LogicalOp::And { "&&" } else { "||" });
    let name = t.ident("f");
    t.sep("(");
    let call = b.invoke(f, name, &[], t.sep(")")).unwrap();
    let logical = b
        .binary(BinaryOp::Logical(op), lhs, op_token, call)
        .unwrap();
    let assign = b.assign(target, eq, logical).unwrap();

    compile_exprs(&arena, &t, &m.decl(DataType::Void, 1), &[assign], true)
}

#[test]
fn test_false_and_skips_right_operand() {
    let code = short_circuit_method(false, LogicalOp::And);
    assert_eq!(
        code.instructions,
        vec![
            I::Goto(1),
            I::PushInt(0),
            I::Dup,
            I::Store(ValueKind::Int, 0),
            I::Pop,
            I::Return(None),
        ]
    );
}

#[test]
fn test_true_or_skips_right_operand() {
    let code = short_circuit_method(true, LogicalOp::Or);
    assert_eq!(
        code.instructions,
        vec![
            I::Goto(1),
            I::PushInt(1),
            I::Goto(3),
            I::Dup,
            I::Store(ValueKind::Int, 0),
            I::Pop,
            I::Return(None),
        ]
    );
}

#[test]
fn test_true_and_evaluates_right_operand_only() {
    let code = short_circuit_method(true, LogicalOp::And);
    let owner = "Test".to_string();
    assert_eq!(
        code.instructions,
        vec![
            I::Invoke {
                owner,
                name: "f".to_string(),
                argc: 0,
                returns: true,
            },
            I::If(Cond::Eq, 4),
            I::PushInt(1),
            I::Goto(5),
            I::PushInt(0),
            I::Dup,
            I::Store(ValueKind::Int, 0),
            I::Pop,
            I::Return(None),
        ]
    );
}

fn int_add<'a>(t: &Tokens<'a>, b: &AstBuilder<'a>, x: LocalId) -> &'a Expr<'a> {
    // `x = 2 + 3`
    let target = b.local(x, t.ident("x"));
    let eq = t.op("=");
    let two = b.literal(t.int(2)).unwrap();
    let plus = t.op("+");
    let three = b.literal(t.int(3)).unwrap();
    let sum = b
        .binary(BinaryOp::Arith(ArithOp::Add), two, plus, three)
        .unwrap();
    b.assign(target, eq, sum).unwrap()
}

#[test]
fn test_constant_expression_is_pushed_folded() {
    let arena = Bump::new();
    let t = Tokens::new(&arena);
    let b = AstBuilder::new(&arena);
    let mut m = MethodFixture::new(&arena);
    let x = m.local("x", DataType::Int);
    let assign = int_add(&t, &b, x);

    let code = compile_exprs(&arena, &t, &m.decl(DataType::Void, 1), &[assign], true);
    assert_eq!(code.instructions[0], I::PushInt(5));
    assert_eq!(code.instructions.len(), 5);
}

#[test]
fn test_folding_disabled_emits_arithmetic() {
    let arena = Bump::new();
    let t = Tokens::new(&arena);
    let b = AstBuilder::new(&arena);
    let mut m = MethodFixture::new(&arena);
    let x = m.local("x", DataType::Int);
    let assign = int_add(&t, &b, x);

    let code = compile_exprs(&arena, &t, &m.decl(DataType::Void, 1), &[assign], false);
    assert_eq!(
        &code.instructions[..3],
        &[
            I::PushInt(2),
            I::PushInt(3),
            I::Arith(ValueKind::Int, NumOp::Add),
        ]
    );
}

#[test]
fn test_int_comparison_branches_on_negated_condition() {
    let arena = Bump::new();
    let t = Tokens::new(&arena);
    let b = AstBuilder::new(&arena);
    let mut m = MethodFixture::new(&arena);
    let a = m.local("a", DataType::Int);
    let c = m.local("c", DataType::Int);
    let flag = m.local("flag", DataType::Boolean);

    // `flag = a < c`
    let target = b.local(flag, t.ident("flag"));
    let eq = t.op("=");
    let lhs = b.local(a, t.ident("a"));
    let lt = t.op("<");
    let rhs = b.local(c, t.ident("c"));
    let cmp = b
        .binary(BinaryOp::Compare(CompareOp::Lt), lhs, lt, rhs)
        .unwrap();
    let assign = b.assign(target, eq, cmp).unwrap();

    let code = compile_exprs(&arena, &t, &m.decl(DataType::Void, 3), &[assign], true);
    assert_eq!(
        code.instructions,
        vec![
            I::Load(ValueKind::Int, 0),
            I::Load(ValueKind::Int, 1),
            I::IfCmp(Cond::Ge, 5),
            I::PushInt(1),
            I::Goto(6),
            I::PushInt(0),
            I::Dup,
            I::Store(ValueKind::Int, 2),
            I::Pop,
            I::Return(None),
        ]
    );
    assert_eq!(code.max_stack, 2);
}

#[test]
fn test_double_less_than_treats_nan_as_false() {
    let arena = Bump::new();
    let t = Tokens::new(&arena);
    let b = AstBuilder::new(&arena);
    let mut m = MethodFixture::new(&arena);
    let d = m.local("d", DataType::Double);
    let e = m.local("e", DataType::Double);
    let flag = m.local("flag", DataType::Boolean);

    // `flag = d < e`
    let target = b.local(flag, t.ident("flag"));
    let eq = t.op("=");
    let lhs = b.local(d, t.ident("d"));
    let lt = t.op("<");
    let rhs = b.local(e, t.ident("e"));
    let cmp = b
        .binary(BinaryOp::Compare(CompareOp::Lt), lhs, lt, rhs)
        .unwrap();
    let assign = b.assign(target, eq, cmp).unwrap();

    let code = compile_exprs(&arena, &t, &m.decl(DataType::Void, 3), &[assign], true);
    // `dcmpg` pushes 1 for NaN, so the jump past the `true` branch is taken.
    assert_eq!(
        &code.instructions[..4],
        &[
            I::Load(ValueKind::Double, 0),
            I::Load(ValueKind::Double, 1),
            I::Compare(ValueKind::Double, NanBias::Greater),
            I::If(Cond::Ge, 6),
        ]
    );
}

#[test]
fn test_reference_equality_with_null() {
    let arena = Bump::new();
    let t = Tokens::new(&arena);
    let b = AstBuilder::new(&arena);
    let mut m = MethodFixture::new(&arena);
    let s = m.local("s", DataType::String);
    let flag = m.local("flag", DataType::Boolean);

    // `flag = s == null`
    let target = b.local(flag, t.ident("flag"));
    let eq = t.op("=");
    let lhs = b.local(s, t.ident("s"));
    let eq_eq = t.op("==");
    let null = b.literal(t.null()).unwrap();
    let cmp = b
        .binary(BinaryOp::Equality(EqualityOp::Eq), lhs, eq_eq, null)
        .unwrap();
    let assign = b.assign(target, eq, cmp).unwrap();

    let code = compile_exprs(&arena, &t, &m.decl(DataType::Void, 2), &[assign], true);
    assert_eq!(
        &code.instructions[..3],
        &[
            I::Load(ValueKind::Ref, 0),
            I::PushNull,
            I::IfRefCmp(Cond::Ne, 5),
        ]
    );
}

#[test]
fn test_mixed_arithmetic_widens_int_operand() {
    let arena = Bump::new();
    let t = Tokens::new(&arena);
    let b = AstBuilder::new(&arena);
    let mut m = MethodFixture::new(&arena);
    let i = m.local("i", DataType::Int);
    let l = m.local("l", DataType::Long);

    // `l = i + 1L`
    let target = b.local(l, t.ident("l"));
    let eq = t.op("=");
    let lhs = b.local(i, t.ident("i"));
    let plus = t.op("+");
    let one = b.literal(t.long(1)).unwrap();
    let sum = b
        .binary(BinaryOp::Arith(ArithOp::Add), lhs, plus, one)
        .unwrap();
    let assign = b.assign(target, eq, sum).unwrap();

    let code = compile_exprs(&arena, &t, &m.decl(DataType::Void, 2), &[assign], true);
    assert_eq!(
        &code.instructions[..4],
        &[
            I::Load(ValueKind::Int, 0),
            I::Convert(ValueKind::Int, ValueKind::Long),
            I::PushLong(1),
            I::Arith(ValueKind::Long, NumOp::Add),
        ]
    );
}

#[test]
fn test_shift_count_converted_to_int() {
    let arena = Bump::new();
    let t = Tokens::new(&arena);
    let b = AstBuilder::new(&arena);
    let mut m = MethodFixture::new(&arena);
    let i = m.local("i", DataType::Int);
    let n = m.local("n", DataType::Long);

    // `i = i << n`
    let target = b.local(i, t.ident("i"));
    let eq = t.op("=");
    let lhs = b.local(i, t.ident("i"));
    let shl = t.op("<<");
    let rhs = b.local(n, t.ident("n"));
    let shift = b
        .binary(BinaryOp::Shift(ShiftOp::Shl), lhs, shl, rhs)
        .unwrap();
    let assign = b.assign(target, eq, shift).unwrap();

    let code = compile_exprs(&arena, &t, &m.decl(DataType::Void, 2), &[assign], true);
    assert_eq!(
        &code.instructions[..4],
        &[
            I::Load(ValueKind::Int, 0),
            I::Load(ValueKind::Long, 1),
            I::Convert(ValueKind::Long, ValueKind::Int),
            I::Arith(ValueKind::Int, NumOp::Shl),
        ]
    );
}

#[test]
fn test_bitwise_not_is_xor_with_minus_one() {
    let arena = Bump::new();
    let t = Tokens::new(&arena);
    let b = AstBuilder::new(&arena);
    let mut m = MethodFixture::new(&arena);
    let x = m.local("x", DataType::Long);

    // `x = ~x`
    let target = b.local(x, t.ident("x"));
    let eq = t.op("=");
    let tilde = t.op("~");
    let not = b
        .unary(UnaryOp::BitNot, tilde, b.local(x, t.ident("x")))
        .unwrap();
    let assign = b.assign(target, eq, not).unwrap();

    let code = compile_exprs(&arena, &t, &m.decl(DataType::Void, 1), &[assign], true);
    assert_eq!(
        &code.instructions[..3],
        &[
            I::Load(ValueKind::Long, 0),
            I::PushLong(-1),
            I::Arith(ValueKind::Long, NumOp::Xor),
        ]
    );
}

#[test]
fn test_void_call_converts_arguments_and_is_not_popped() {
    let arena = Bump::new();
    let t = Tokens::new(&arena);
    let b = AstBuilder::new(&arena);
    let mut m = MethodFixture::new(&arena);
    let i = m.local("i", DataType::Int);
    let g = m.method_ref("g", &[DataType::Double], DataType::Void);

    // `g(i);`
    let name = t.ident("g");
    t.sep("(");
    let arg = b.local(i, t.ident("i"));
    let call = b.invoke(g, name, &[arg], t.sep(")")).unwrap();

    let code = compile_exprs(&arena, &t, &m.decl(DataType::Void, 1), &[call], true);
    assert_eq!(
        code.instructions,
        vec![
            I::Load(ValueKind::Int, 0),
            I::Convert(ValueKind::Int, ValueKind::Double),
            I::Invoke {
                owner: "Test".to_string(),
                name: "g".to_string(),
                argc: 1,
                returns: false,
            },
            I::Return(None),
        ]
    );
}

#[test]
fn test_max_stack_of_nested_arithmetic() {
    let arena = Bump::new();
    let t = Tokens::new(&arena);
    let b = AstBuilder::new(&arena);
    let mut m = MethodFixture::new(&arena);
    let x = m.local("x", DataType::Int);
    let y = m.local("y", DataType::Int);
    let z = m.local("z", DataType::Int);

    // `x = x + y * z`
    let target = b.local(x, t.ident("x"));
    let eq = t.op("=");
    let lhs = b.local(x, t.ident("x"));
    let plus = t.op("+");
    let y_ref = b.local(y, t.ident("y"));
    let star = t.op("*");
    let z_ref = b.local(z, t.ident("z"));
    let product = b
        .binary(BinaryOp::Arith(ArithOp::Mul), y_ref, star, z_ref)
        .unwrap();
    let sum = b
        .binary(BinaryOp::Arith(ArithOp::Add), lhs, plus, product)
        .unwrap();
    let assign = b.assign(target, eq, sum).unwrap();

    let code = compile_exprs(&arena, &t, &m.decl(DataType::Void, 3), &[assign], true);
    assert_eq!(code.max_stack, 3);
    assert_eq!(code.max_locals, 3);
}

#[test]
fn test_unresolved_expression_is_a_defect() {
    let arena = Bump::new();
    let t = Tokens::new(&arena);
    let b = AstBuilder::new(&arena);
    let mut m = MethodFixture::new(&arena);
    let x = m.local("x", DataType::Int);
    let assign = int_add(&t, &b, x);

    let mut stmts = StmtArena::new(&arena);
    let stmt = stmts.alloc(assign.start(), StmtKind::Expr(assign));
    let root = stmts.block(t.sep("{"), &[stmt], t.sep("}"));
    let body = stmts.finish(root).unwrap();

    // Skips resolution entirely.
    let err = compiler::generate(&m.decl(DataType::Void, 1), &body, false).unwrap_err();
    assert_eq!(err.pass, Pass::Generate);
    assert_eq!(err.kind, DefectKind::UnresolvedType("assignment"));
}
