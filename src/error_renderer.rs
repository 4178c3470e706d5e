//! Terminal rendering of compilation errors using ariadne.
//!
//! Diagnostics carry byte offsets into the compilation unit's source text;
//! the caller passes that text in since the core never owns it.

use crate::{Diagnostic, Error, Severity};
use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use std::io::Write;

/// Character set for rendering error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharSet {
    /// Use Unicode characters for rich visual output.
    #[default]
    Unicode,
    /// Use ASCII-only characters for compatibility.
    Ascii,
}

/// Configuration for error rendering.
#[derive(Debug, Clone)]
pub struct RenderConfig<'a> {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
    /// The filename to display in error messages.
    /// Defaults to "<unknown>" if not provided.
    pub filename: Option<&'a str>,
    /// The character set to use for rendering.
    pub charset: CharSet,
}

impl Default for RenderConfig<'_> {
    fn default() -> Self {
        RenderConfig::default()
    }
}

impl RenderConfig<'_> {
    const fn default() -> Self {
        Self {
            color: true,
            filename: None,
            charset: CharSet::Unicode,
        }
    }
}

/// Render an error to stderr using the default config.
pub fn render_error(error: &Error, source: &str) {
    render_error_to(error, source, &mut std::io::stderr(), &RenderConfig::default()).ok();
}

/// Render an error to a writer with the given configuration.
///
/// # Example
/// ```
/// use kava::{Diagnostic, DiagnosticCode, Error, Pos, RenderConfig, Severity, render_error_to};
///
/// let error = Error::Compilation {
///     diagnostics: vec![Diagnostic {
///         severity: Severity::Error,
///         code: DiagnosticCode::MissingReturn,
///         message: "missing return statement".to_string(),
///         pos: Pos::new(0, 1, 1),
///         len: 1,
///     }],
/// };
/// let mut buf = Vec::new();
/// let config = RenderConfig { color: false, ..Default::default() };
/// render_error_to(&error, "}", &mut buf, &config).unwrap();
/// assert!(String::from_utf8_lossy(&buf).contains("missing return statement"));
/// ```
pub fn render_error_to(
    error: &Error,
    source: &str,
    writer: &mut dyn Write,
    config: &RenderConfig,
) -> std::io::Result<()> {
    let filename = config.filename.unwrap_or("<unknown>");

    match error {
        Error::Compilation { diagnostics } => {
            render_diagnostics(source, diagnostics, writer, config, filename)
        }
        Error::Internal(err) => writeln!(writer, "{}", err),
        Error::ResourceExceeded(msg) => {
            writeln!(writer, "Resource limit exceeded: {}", msg)
        }
    }
}

fn render_diagnostics(
    source: &str,
    diagnostics: &[Diagnostic],
    writer: &mut dyn Write,
    config: &RenderConfig,
    filename: &str,
) -> std::io::Result<()> {
    for diag in diagnostics {
        let mut colors = ColorGenerator::new();
        colors.next(); // Skip the first color.

        let kind = match diag.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
            Severity::Info => ReportKind::Advice,
        };

        let ariadne_charset = match config.charset {
            CharSet::Unicode => ariadne::CharSet::Unicode,
            CharSet::Ascii => ariadne::CharSet::Ascii,
        };
        let ariadne_config = ariadne::Config::default()
            .with_color(config.color)
            .with_char_set(ariadne_charset)
            .with_index_type(ariadne::IndexType::Byte);

        let span = diag.byte_range();
        let color = colors.next();
        let report = Report::build(kind, (filename, span.clone()))
            .with_message(&diag.message)
            .with_code(diag.code.code())
            .with_config(ariadne_config)
            .with_label(
                Label::new((filename, span))
                    .with_message(&diag.message)
                    .with_color(color),
            );

        report
            .finish()
            .write((filename, Source::from(source)), &mut *writer)?;
    }

    Ok(())
}
