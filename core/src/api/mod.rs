//! Public API for the kava compiler core.
//!
//! A caller that already holds a resolved declaration table and a sealed
//! statement tree compiles it in one call:
//!
//! ```
//! use kava_core::api::{CompileOptions, Compiler};
//! use kava_core::ast::{LocalVar, MethodDecl, StmtArena, StmtKind};
//! use kava_core::syntax::{Pos, Token, TokenKind};
//! use kava_core::types::DataType;
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! let open = arena.alloc(Token::new(TokenKind::Separator, "{", Pos::new(0, 1, 1)));
//! let close = arena.alloc(Token::new(TokenKind::Separator, "}", Pos::new(2, 1, 3)));
//! let mut stmts = StmtArena::new(&arena);
//! let root = stmts.block(open, &[], close);
//! let body = stmts.finish(root).unwrap();
//!
//! let name_token = arena.alloc(Token::new(TokenKind::Identifier, "run", Pos::new(0, 1, 1)));
//! let locals: &[LocalVar] = &[];
//! let method = MethodDecl {
//!     owner: "Main",
//!     name: "run",
//!     return_type: DataType::Void,
//!     param_count: 0,
//!     locals,
//!     name_token,
//! };
//!
//! let compiler = Compiler::new(CompileOptions::default());
//! let code = compiler.compile(Default::default(), &method, &body).unwrap();
//! assert_eq!(code.instructions.len(), 1);
//! ```

pub mod compiler;
pub mod error;
pub mod options;

pub use compiler::{Compiler, compile_method};
pub use error::Error;
pub use options::{CompileOptions, CompileOptionsOverride};
