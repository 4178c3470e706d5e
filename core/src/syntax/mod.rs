//! Lexical input consumed by the compiler core.
//!
//! The scanner itself lives outside this crate; this module only defines the
//! token shape it hands over and the escape decode step it uses.

pub mod escape;
pub mod span;
pub mod token;

pub use escape::{EscapeError, EscapeErrorKind, decode_escapes};
pub use span::TokenSpan;
pub use token::{LiteralValue, Pos, Token, TokenKind};
