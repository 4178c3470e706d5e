//! The compilation entry point.

use super::{CompileOptions, CompileOptionsOverride, Error};
use crate::ast::{MethodBody, MethodDecl};
use crate::compiler::{self, Code};
use crate::diagnostics::Diagnostics;
use crate::{analyzer, format};

/// Compiles method bodies with a fixed set of default options.
///
/// The compiler holds no per-method state; one instance may compile any
/// number of methods.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Access the default compile options.
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile one method, overriding the defaults where `options_override`
    /// sets a field.
    pub fn compile<'a>(
        &self,
        options_override: CompileOptionsOverride,
        method: &MethodDecl<'a>,
        body: &MethodBody<'a>,
    ) -> Result<Code, Error> {
        let mut options = self.options.clone();
        options.override_with(&options_override);
        compile_method(method, body, &options)
    }
}

/// Resolve and generate a method.
///
/// Code is generated only when resolution recorded no errors.
pub fn compile_method<'a>(
    method: &MethodDecl<'a>,
    body: &MethodBody<'a>,
    options: &CompileOptions,
) -> Result<Code, Error> {
    let mut diagnostics = Diagnostics::new();
    analyzer::analyze(method, body, &mut diagnostics, options.fold_constants)?;
    if diagnostics.has_errors() {
        tracing::debug!(
            method = method.name,
            errors = diagnostics.len(),
            "Resolution failed"
        );
        return Err(Error::Compilation {
            diagnostics: diagnostics.into_vec(),
        });
    }

    let code = compiler::generate(method, body, options.line_numbers)?;
    if code.max_locals > options.max_locals {
        return Err(Error::ResourceExceeded(format!(
            "method {} uses {} local slots, limit is {}",
            method.name, code.max_locals, options.max_locals
        )));
    }
    Ok(code)
}
