//! Kava - the back half of a compiler for a Java-like language
//!
//! # Overview
//!
//! Kava takes a method body that a front end has already parsed and
//! name-resolved, and turns it into stack-machine code:
//!
//! 1. **Resolution** assigns every expression a type, folds constants and
//!    records user errors as [`Diagnostic`]s.
//! 2. **Generation** lowers the statement tree into instructions, routing
//!    every exit of a `try`/`finally` or `synchronized` block through a
//!    single cleanup subroutine.
//! 3. **Finalization** resolves labels into offsets and yields [`Code`].
//!
//! # Quick Start
//!
//! ```
//! use kava::{Compiler, DataType, LocalVar, MethodDecl, Pos, StmtArena, Token, TokenKind};
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
//! let code = Compiler::default()
//!     .compile(Default::default(), &method, &body)
//!     .unwrap();
//! assert_eq!(code.to_string(), "max_stack=0 max_locals=0\n   0: return\n");
//! ```

// Error rendering utilities
pub mod error_renderer;
pub use error_renderer::{CharSet, RenderConfig, render_error, render_error_to};

// Re-export public API from kava_core
pub use kava_core::api::{
    CompileOptions, CompileOptionsOverride, Compiler, Error, compile_method,
};
pub use kava_core::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Diagnostics, Severity};
pub use kava_core::error::InternalError;

// Re-export the tree and its building blocks
pub use kava_core::ast::{
    self, AstBuilder, Constant, Expr, LocalId, LocalVar, MethodBody, MethodDecl, MethodRef,
    StmtArena, StmtId, StmtKind,
};
pub use kava_core::compiler::{Code, Handler, Instruction, LineNumber};
pub use kava_core::syntax::{Pos, Token, TokenKind};
pub use kava_core::types::DataType;
