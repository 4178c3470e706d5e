//! Public error type for the compiler API.
//!
//! User mistakes arrive as diagnostics; compiler defects keep their
//! [`InternalError`] so callers can tell the two apart.

use core::fmt;

use crate::diagnostics::{Diagnostic, Severity};
use crate::error::InternalError;
use crate::{String, Vec};

/// Public error type for all compilations.
#[derive(Debug)]
pub enum Error {
    /// The method has errors the user must fix.
    ///
    /// Holds every diagnostic the resolve pass recorded, in source order.
    Compilation { diagnostics: Vec<Diagnostic> },

    /// A defect in the compiler or in the tree handed to it.
    Internal(InternalError),

    /// The generated code exceeds a configured limit.
    ResourceExceeded(String),
}

impl Error {
    /// Diagnostics of a failed compilation; empty for other errors.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Error::Compilation { diagnostics } => diagnostics,
            _ => &[],
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Compilation { diagnostics } => {
                let error_count = diagnostics
                    .iter()
                    .filter(|d| d.severity == Severity::Error)
                    .count();
                write!(f, "Compilation failed with {} error(s)", error_count)
            }
            Error::Internal(err) => write!(f, "Internal compiler error: {}", err),
            Error::ResourceExceeded(msg) => write!(f, "Resource limit exceeded: {}", msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        Error::Internal(err)
    }
}
