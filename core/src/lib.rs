#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]
#![deny(unsafe_code)]

// This works on std and no_std and is harmless.
extern crate alloc;

// Exports some symbols publicly so that downstream crates can share them.
#[doc(hidden)]
pub mod shim {
    pub use alloc::{boxed::Box, fmt, format, string::String, string::ToString, vec, vec::Vec};
}

// Re-export (crate only) for convenience so other modules don't need alloc:: prefix
#[allow(unused_imports)]
pub(crate) use shim::*;

pub mod analyzer;
pub mod api;
pub mod ast;
pub mod compiler;
pub mod diagnostics;
pub mod error;
pub mod syntax;
pub mod types;

/// Test utilities for enabling logging and building token streams in tests
#[cfg(test)]
pub mod test_utils;
