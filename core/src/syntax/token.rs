//! Tokens produced by the scanner.
//!
//! Tokens are immutable once produced. AST nodes hold `&'a Token<'a>`
//! references to the tokens that start and end them, so the same token may be
//! shared by several nodes (for example `i` in `i++` is both the start of the
//! variable reference and the start of the increment).

use core::fmt;

use bumpalo::Bump;

use super::escape::{EscapeError, decode_escapes};

/// A single position in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    /// Byte offset from the start of the input (0-based).
    pub offset: usize,
    /// Line number (1-based).
    pub line: u32,
    /// Column number (1-based, in bytes).
    pub column: u32,
}

impl Pos {
    pub const fn new(offset: usize, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Keyword,
    /// `+`, `++`, `&&`, `>>>=`, ...
    Operator,
    /// `(`, `)`, `{`, `}`, `;`, `,`, ...
    Separator,
    IntLiteral,
    LongLiteral,
    FloatLiteral,
    DoubleLiteral,
    CharLiteral,
    StringLiteral,
    /// `true` / `false`.
    BooleanLiteral,
    NullLiteral,
}

impl TokenKind {
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::IntLiteral
                | TokenKind::LongLiteral
                | TokenKind::FloatLiteral
                | TokenKind::DoubleLiteral
                | TokenKind::CharLiteral
                | TokenKind::StringLiteral
                | TokenKind::BooleanLiteral
                | TokenKind::NullLiteral
        )
    }
}

/// The parsed value of a literal token.
///
/// An int literal of `2147483648` can only legally appear after a unary
/// minus; the scanner stores it wrapped (as `i32::MIN`) and negation wraps
/// back to the same value. Same for `9223372036854775808L`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralValue<'a> {
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(u16),
    Str(&'a str),
    Null,
}

/// An immutable lexical unit.
#[derive(Debug, Clone, Copy)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// The exact source text of the token.
    pub lexeme: &'a str,
    /// Parsed value, for literal tokens only.
    pub literal: Option<LiteralValue<'a>>,
    /// Set by the scanner when a character or string literal contained a
    /// malformed escape. `literal` then holds the recovered (raw) value.
    pub escape_error: Option<EscapeError>,
    pub pos: Pos,
}

impl<'a> Token<'a> {
    /// A token without a literal value (identifier, operator, keyword, ...).
    pub const fn new(kind: TokenKind, lexeme: &'a str, pos: Pos) -> Self {
        Self {
            kind,
            lexeme,
            literal: None,
            escape_error: None,
            pos,
        }
    }

    /// A literal token whose value the scanner already parsed.
    pub const fn literal(
        kind: TokenKind,
        lexeme: &'a str,
        value: LiteralValue<'a>,
        pos: Pos,
    ) -> Self {
        Self {
            kind,
            lexeme,
            literal: Some(value),
            escape_error: None,
            pos,
        }
    }

    /// A string literal token; `lexeme` includes the surrounding quotes.
    ///
    /// Runs the escape decode step. On failure the token keeps the raw body
    /// as its value and records the [`EscapeError`].
    pub fn string_literal(arena: &'a Bump, lexeme: &'a str, pos: Pos) -> Self {
        let body = lexeme
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(lexeme);
        let (value, escape_error) = match decode_escapes(body) {
            Ok(decoded) => (&*arena.alloc_str(&decoded), None),
            Err(e) => (body, Some(e)),
        };
        Self {
            kind: TokenKind::StringLiteral,
            lexeme,
            literal: Some(LiteralValue::Str(value)),
            escape_error,
            pos,
        }
    }

    /// Byte offset just past the end of the token.
    pub fn end_offset(&self) -> usize {
        self.pos.offset + self.lexeme.len()
    }

    /// Whether `self` and `other` are the same token (not just equal text).
    pub fn is(&self, other: &Token<'_>) -> bool {
        core::ptr::eq(
            self as *const Token<'_> as *const u8,
            other as *const Token<'_> as *const u8,
        )
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' at {}", self.lexeme, self.pos)
    }
}
