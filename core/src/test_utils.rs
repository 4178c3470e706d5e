//! Helpers shared by the unit tests.

use core::cell::Cell;

use bumpalo::Bump;

use crate::ast::{
    AstBuilder, BinaryOp, CompareOp, Expr, LocalId, LocalVar, MethodBody, MethodDecl, MethodRef,
    StmtArena, StmtId, StmtKind, UnaryOp,
};
use crate::syntax::{LiteralValue, Pos, Token, TokenKind};
use crate::types::DataType;

/// Initialize tracing subscriber for tests with DEBUG level
/// Call this at the start of tests where you want to see logging output
///
/// # Example
/// ```ignore
/// #[test]
/// fn test_try_finally_layout() {
///     test_utils::init_test_logging();
///     // ... your test code
/// }
/// ```
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    // Try to initialize, ignore error if already initialized
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Hands out tokens at increasing source positions, one space apart.
///
/// Tests create tokens in the order they would appear in the source, which
/// is what the span checks expect. Every token sits on line 1 unless
/// [`Tokens::newline`] is called.
pub struct Tokens<'a> {
    arena: &'a Bump,
    offset: Cell<usize>,
    line: Cell<u32>,
    line_start: Cell<usize>,
}

impl<'a> Tokens<'a> {
    pub fn new(arena: &'a Bump) -> Self {
        Self {
            arena,
            offset: Cell::new(0),
            line: Cell::new(1),
            line_start: Cell::new(0),
        }
    }

    fn next_pos(&self, len: usize) -> Pos {
        let offset = self.offset.get();
        self.offset.set(offset + len + 1);
        Pos::new(
            offset,
            self.line.get(),
            (offset - self.line_start.get()) as u32 + 1,
        )
    }

    pub fn newline(&self) {
        self.line.set(self.line.get() + 1);
        self.line_start.set(self.offset.get());
    }

    pub fn token(&self, kind: TokenKind, lexeme: &'a str) -> &'a Token<'a> {
        let pos = self.next_pos(lexeme.len());
        self.arena.alloc(Token::new(kind, lexeme, pos))
    }

    fn literal(&self, kind: TokenKind, value: LiteralValue<'a>) -> &'a Token<'a> {
        let lexeme: &'a str = self.arena.alloc_str(&crate::format!("{:?}", value));
        let pos = self.next_pos(lexeme.len());
        self.arena.alloc(Token::literal(kind, lexeme, value, pos))
    }

    pub fn ident(&self, name: &'a str) -> &'a Token<'a> {
        self.token(TokenKind::Identifier, name)
    }

    pub fn op(&self, symbol: &'a str) -> &'a Token<'a> {
        self.token(TokenKind::Operator, symbol)
    }

    pub fn kw(&self, word: &'a str) -> &'a Token<'a> {
        self.token(TokenKind::Keyword, word)
    }

    pub fn sep(&self, symbol: &'a str) -> &'a Token<'a> {
        self.token(TokenKind::Separator, symbol)
    }

    pub fn int(&self, value: i32) -> &'a Token<'a> {
        self.literal(TokenKind::IntLiteral, LiteralValue::Int(value))
    }

    pub fn long(&self, value: i64) -> &'a Token<'a> {
        self.literal(TokenKind::LongLiteral, LiteralValue::Long(value))
    }

    pub fn float(&self, value: f32) -> &'a Token<'a> {
        self.literal(TokenKind::FloatLiteral, LiteralValue::Float(value))
    }

    pub fn double(&self, value: f64) -> &'a Token<'a> {
        self.literal(TokenKind::DoubleLiteral, LiteralValue::Double(value))
    }

    pub fn boolean(&self, value: bool) -> &'a Token<'a> {
        self.literal(TokenKind::BooleanLiteral, LiteralValue::Boolean(value))
    }

    pub fn char(&self, value: char) -> &'a Token<'a> {
        self.literal(TokenKind::CharLiteral, LiteralValue::Char(value as u16))
    }

    pub fn null(&self) -> &'a Token<'a> {
        self.literal(TokenKind::NullLiteral, LiteralValue::Null)
    }

    /// A string literal; `quoted` includes the quotes and is escape-decoded.
    pub fn string(&self, quoted: &'a str) -> &'a Token<'a> {
        let pos = self.next_pos(quoted.len());
        self.arena
            .alloc(Token::string_literal(self.arena, quoted, pos))
    }
}

/// Builds the method declaration (and its local table) for a test.
pub struct MethodFixture<'a> {
    arena: &'a Bump,
    locals: crate::Vec<LocalVar<'a>>,
}

impl<'a> MethodFixture<'a> {
    pub fn new(arena: &'a Bump) -> Self {
        Self {
            arena,
            locals: crate::Vec::new(),
        }
    }

    pub fn local(&mut self, name: &'a str, ty: DataType) -> LocalId {
        let id = LocalId(self.locals.len() as u16);
        self.locals.push(LocalVar { name, ty });
        id
    }

    pub fn method_ref(
        &self,
        name: &'a str,
        params: &[DataType],
        ret: DataType,
    ) -> &'a MethodRef<'a> {
        self.arena.alloc(MethodRef {
            owner: "Test",
            name,
            params: self.arena.alloc_slice_copy(params),
            ret,
        })
    }

    pub fn decl(&self, return_type: DataType, param_count: u16) -> MethodDecl<'a> {
        let name_token = self.arena.alloc(Token::new(
            TokenKind::Identifier,
            "test",
            Pos::new(0, 1, 1),
        ));
        MethodDecl {
            owner: "Test",
            name: "test",
            return_type,
            param_count,
            locals: self.arena.alloc_slice_copy(&self.locals),
            name_token,
        }
    }
}

/// Builds a whole method body: tokens, expressions, statements and the
/// method declaration.
///
/// Helpers create their tokens in source order, so an expression helper
/// must be called only after everything to its left has been built.
pub struct BodyFixture<'a> {
    pub t: Tokens<'a>,
    pub b: AstBuilder<'a>,
    pub stmts: StmtArena<'a>,
    pub m: MethodFixture<'a>,
}

impl<'a> BodyFixture<'a> {
    pub fn new(arena: &'a Bump) -> Self {
        Self {
            t: Tokens::new(arena),
            b: AstBuilder::new(arena),
            stmts: StmtArena::new(arena),
            m: MethodFixture::new(arena),
        }
    }

    pub fn local(&mut self, name: &'a str, ty: DataType) -> LocalId {
        self.m.local(name, ty)
    }

    pub fn var(&self, id: LocalId, name: &'a str) -> &'a Expr<'a> {
        self.b.local(id, self.t.ident(name))
    }

    pub fn int(&self, value: i32) -> &'a Expr<'a> {
        self.b.literal(self.t.int(value)).unwrap()
    }

    /// `name < value`
    pub fn less_than(&self, id: LocalId, name: &'a str, value: i32) -> &'a Expr<'a> {
        let lhs = self.var(id, name);
        let lt = self.t.op("<");
        let rhs = self.int(value);
        self.b
            .binary(BinaryOp::Compare(CompareOp::Lt), lhs, lt, rhs)
            .unwrap()
    }

    /// `name++`
    pub fn post_inc(&self, id: LocalId, name: &'a str) -> &'a Expr<'a> {
        let var = self.var(id, name);
        self.b
            .unary(UnaryOp::PostInc, self.t.op("++"), var)
            .unwrap()
    }

    pub fn expr(&mut self, expr: &'a Expr<'a>) -> StmtId {
        self.stmts.alloc(expr.start(), StmtKind::Expr(expr))
    }

    /// `name = value;`
    pub fn assign(&mut self, id: LocalId, name: &'a str, value: i32) -> StmtId {
        let target = self.var(id, name);
        let eq = self.t.op("=");
        let value = self.int(value);
        let assign = self.b.assign(target, eq, value).unwrap();
        self.expr(assign)
    }

    pub fn stmt(&mut self, keyword: &'a str, kind: StmtKind<'a>) -> StmtId {
        let token = self.t.kw(keyword);
        self.stmts.alloc(token, kind)
    }

    pub fn block(&mut self, stmts: &[StmtId]) -> StmtId {
        let open = self.t.sep("{");
        let close = self.t.sep("}");
        self.stmts.block(open, stmts, close)
    }

    pub fn if_then(&mut self, cond: &'a Expr<'a>, then_branch: StmtId) -> StmtId {
        self.stmt(
            "if",
            StmtKind::If {
                cond,
                then_branch,
                else_branch: None,
            },
        )
    }

    pub fn finish(self, root: StmtId, return_type: DataType) -> (MethodDecl<'a>, MethodBody<'a>) {
        let body = self.stmts.finish(root).unwrap();
        (self.m.decl(return_type, 0), body)
    }
}
