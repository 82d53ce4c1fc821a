//! Engine error types

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Main engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Template error in '{}'", .0.template)]
    Template(#[from] TemplateError),

    #[error("operation cancelled")]
    Cancelled,
}

/// Template-specific error with source information
#[derive(Error, Debug, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(cpack::template::render))]
pub struct TemplateError {
    /// Name of the offending template
    pub template: String,

    /// Error message from the template engine
    pub message: String,

    /// Template source code
    #[source_code]
    pub src: NamedSource<String>,

    /// Error location in source
    #[label("error occurred here")]
    pub span: Option<SourceSpan>,
}

impl TemplateError {
    /// Build a template error from a MiniJinja error, attaching the
    /// offending template's name and source.
    pub fn from_minijinja(err: minijinja::Error, template: &str, source: &str) -> Self {
        let span = err.line().and_then(|line| calculate_span(source, line));

        Self {
            template: template.to_string(),
            message: format!("{}: {:#}", template, err),
            src: NamedSource::new(template, source.to_string()),
            span,
        }
    }
}

/// Compute the span covering a 1-based line number in `source`.
fn calculate_span(source: &str, line: usize) -> Option<SourceSpan> {
    let mut offset = 0usize;
    for (idx, text) in source.lines().enumerate() {
        if idx + 1 == line {
            return Some(SourceSpan::new(offset.into(), text.len()));
        }
        offset += text.len() + 1;
    }
    None
}

pub type Result<T> = std::result::Result<T, EngineError>;
