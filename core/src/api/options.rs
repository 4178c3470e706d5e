//! Compilation options.

/// Options that control a single compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Fold composite constant expressions during resolution.
    ///
    /// Literals are constant either way.
    pub fold_constants: bool,

    /// Emit a line-number table alongside the instructions.
    pub line_numbers: bool,

    /// Largest number of local slots a method may use, temporaries included.
    pub max_locals: u16,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            fold_constants: true,
            line_numbers: true,
            max_locals: u16::MAX,
        }
    }
}

impl CompileOptions {
    /// Apply every field the override sets.
    pub fn override_with(&mut self, other: &CompileOptionsOverride) {
        if let Some(fold_constants) = other.fold_constants {
            self.fold_constants = fold_constants;
        }
        if let Some(line_numbers) = other.line_numbers {
            self.line_numbers = line_numbers;
        }
        if let Some(max_locals) = other.max_locals {
            self.max_locals = max_locals;
        }
    }
}

/// Partial [`CompileOptions`]; unset fields keep the compiler's defaults.
///
/// ```
/// use kava_core::api::{CompileOptions, CompileOptionsOverride};
///
/// let mut options = CompileOptions::default();
/// options.override_with(&CompileOptionsOverride {
///     line_numbers: Some(false),
///     ..Default::default()
/// });
/// assert!(!options.line_numbers);
/// assert!(options.fold_constants);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptionsOverride {
    pub fold_constants: Option<bool>,
    pub line_numbers: Option<bool>,
    pub max_locals: Option<u16>,
}
