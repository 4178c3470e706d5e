//! User-facing diagnostics.
//!
//! Diagnostics are recorded, never raised: the resolve pass reports through a
//! [`DiagnosticSink`] and keeps going with an `Error` placeholder type so a
//! single run surfaces as many problems as possible.

use core::fmt;

use crate::syntax::{Pos, Token};
use crate::{String, ToString, Vec};

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Error - compilation cannot succeed.
    Error,
    /// Warning - suspicious code that might be wrong.
    Warning,
    /// Info - informational message.
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Stable diagnostic codes. Message templates use `{0}`, `{1}`, ... for
/// the parameters passed to [`DiagnosticSink::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// Operator applied to operand types it does not support.
    BadOperandType,
    /// Invalid escape sequence in a character or string literal.
    MalformedEscape,
    /// Value not assignable to its destination.
    IncompatibleTypes,
    /// Increment, decrement or assignment of something that is not a variable.
    NotAVariable,
    /// Non-void method whose body can complete normally.
    MissingReturn,
    /// `break`/`continue` without a matching target.
    UndefinedTarget,
    /// Case label is not a compile-time constant.
    CaseNotConstant,
    /// Two case labels with the same value.
    DuplicateCase,
    /// Wrong number of arguments to a method.
    ArgumentMismatch,
}

impl DiagnosticCode {
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticCode::BadOperandType => "E0001",
            DiagnosticCode::MalformedEscape => "E0002",
            DiagnosticCode::IncompatibleTypes => "E0003",
            DiagnosticCode::NotAVariable => "E0004",
            DiagnosticCode::MissingReturn => "E0005",
            DiagnosticCode::UndefinedTarget => "E0006",
            DiagnosticCode::CaseNotConstant => "E0007",
            DiagnosticCode::DuplicateCase => "E0008",
            DiagnosticCode::ArgumentMismatch => "E0009",
        }
    }

    fn template(self) -> &'static str {
        match self {
            DiagnosticCode::BadOperandType => "bad operand types for '{0}': {1}",
            DiagnosticCode::MalformedEscape => "malformed escape sequence: {0}",
            DiagnosticCode::IncompatibleTypes => "incompatible types: {0} cannot be converted to {1}",
            DiagnosticCode::NotAVariable => "{0} requires a variable",
            DiagnosticCode::MissingReturn => "missing return statement",
            DiagnosticCode::UndefinedTarget => "{0} has no enclosing {1}",
            DiagnosticCode::CaseNotConstant => "constant expression required",
            DiagnosticCode::DuplicateCase => "duplicate case label {0}",
            DiagnosticCode::ArgumentMismatch => "{0} expects {1} argument(s), found {2}",
        }
    }

    /// Expand the message template with `params`. Missing parameters are
    /// left as their placeholder.
    pub fn format(self, params: &[&dyn fmt::Display]) -> String {
        let template = self.template();
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after.find('}');
            let index = close.and_then(|c| after[..c].parse::<usize>().ok());
            match (close, index.and_then(|i| params.get(i))) {
                (Some(c), Some(param)) => {
                    out.push_str(&param.to_string());
                    rest = &after[c + 1..];
                }
                _ => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A diagnostic message (error, warning, or info) with source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    /// Primary diagnostic message.
    pub message: String,
    /// Position of the offending token.
    pub pos: Pos,
    /// Length in bytes of the offending token.
    pub len: usize,
}

impl Diagnostic {
    pub fn byte_range(&self) -> core::ops::Range<usize> {
        self.pos.offset..self.pos.offset + self.len
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}[{}] at {}: {}",
            self.severity, self.code, self.pos, self.message
        )
    }
}

/// Where the resolve pass reports problems. Recording never fails.
pub trait DiagnosticSink {
    fn record(
        &mut self,
        severity: Severity,
        code: DiagnosticCode,
        token: &Token<'_>,
        params: &[&dyn fmt::Display],
    );
}

/// The default sink: collects diagnostics in order.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl DiagnosticSink for Diagnostics {
    fn record(
        &mut self,
        severity: Severity,
        code: DiagnosticCode,
        token: &Token<'_>,
        params: &[&dyn fmt::Display],
    ) {
        tracing::debug!(code = code.code(), pos = %token.pos, "Diagnostic recorded");
        self.items.push(Diagnostic {
            severity,
            code,
            message: code.format(params),
            pos: token.pos,
            len: token.lexeme.len(),
        });
    }
}
