//! The compile-error surface.
//!
//! Every failure the driver reports is a [`Diagnostic`]: a category, a
//! severity, a message, and the 1-based line/column plus source snippet
//! of the offending range. Warnings are the same records at
//! [`Severity::Warning`].

use std::fmt;

use thiserror::Error;
use voxl_ast::{ParseError, Span};
use voxl_codegen::{CodegenError, ErrorKind, Warning, WarningKind};
use voxl_engine::JitError;

/// Category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Malformed source.
    Parse,
    /// Invalid conversion or use of a name.
    Type,
    /// Invalid operator/operand combination.
    BinaryOperation,
    /// No matching overload.
    FunctionLookup,
    /// Overload tie.
    AmbiguousOverload,
    /// Attribute conflicts or unsupported attribute substrate.
    UnknownAttribute,
    /// Verification or code-generation failure in the backend.
    Jit,
    /// Compiler bug.
    Internal,
}

impl DiagnosticKind {
    /// Human-readable category name.
    pub fn name(self) -> &'static str {
        match self {
            DiagnosticKind::Parse => "parse error",
            DiagnosticKind::Type => "type error",
            DiagnosticKind::BinaryOperation => "binary operation error",
            DiagnosticKind::FunctionLookup => "function lookup error",
            DiagnosticKind::AmbiguousOverload => "ambiguous overload",
            DiagnosticKind::UnknownAttribute => "unknown attribute",
            DiagnosticKind::Jit => "jit error",
            DiagnosticKind::Internal => "internal error",
        }
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Non-fatal; promoted by `warn_as_error`.
    Warning,
    /// Compilation failed.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// One structured compiler message.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{severity}: {}: {message}\n  --> {line}:{column}\n   | {snippet}", .kind.name())]
pub struct Diagnostic {
    /// Category.
    pub kind: DiagnosticKind,
    /// Severity.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// 1-based source line.
    pub line: u32,
    /// 1-based source column.
    pub column: u32,
    /// The full text of the offending source line.
    pub snippet: String,
}

/// The failure payload of a compile: errors plus any warnings gathered
/// before the failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    /// Fatal diagnostics, in detection order. Never empty on failure.
    pub errors: Vec<Diagnostic>,
    /// Non-fatal diagnostics gathered before the failure.
    pub warnings: Vec<Diagnostic>,
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.errors.iter().chain(&self.warnings).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

/// 1-based line, column, and line text of a byte offset.
fn locate(source: &str, offset: usize) -> (u32, u32, String) {
    let offset = offset.min(source.len());
    let mut line = 1u32;
    let mut line_start = 0usize;
    for (i, b) in source.bytes().enumerate().take(offset) {
        if b == b'\n' {
            line += 1;
            line_start = i + 1;
        }
    }
    let column = (offset - line_start) as u32 + 1;
    let snippet = source[line_start..]
        .lines()
        .next()
        .unwrap_or("")
        .to_string();
    (line, column, snippet)
}

/// Build a diagnostic from a span into the source.
pub(crate) fn at_span(
    kind: DiagnosticKind,
    severity: Severity,
    message: String,
    span: Span,
    source: &str,
) -> Diagnostic {
    let (line, column, snippet) = locate(source, span.start as usize);
    Diagnostic {
        kind,
        severity,
        message,
        line,
        column,
        snippet,
    }
}

pub(crate) fn from_parse(error: ParseError, source: &str) -> Diagnostic {
    at_span(
        DiagnosticKind::Parse,
        Severity::Error,
        error.message.clone(),
        error.span,
        source,
    )
}

pub(crate) fn from_codegen(error: CodegenError, source: &str) -> Diagnostic {
    let kind = match error.kind {
        ErrorKind::Type => DiagnosticKind::Type,
        ErrorKind::BinaryOperation => DiagnosticKind::BinaryOperation,
        ErrorKind::FunctionLookup => DiagnosticKind::FunctionLookup,
        ErrorKind::AmbiguousOverload => DiagnosticKind::AmbiguousOverload,
        ErrorKind::UnknownAttribute => DiagnosticKind::UnknownAttribute,
        ErrorKind::Internal => DiagnosticKind::Internal,
    };
    at_span(kind, Severity::Error, error.message.clone(), error.span, source)
}

pub(crate) fn from_warning(warning: &Warning, source: &str) -> Diagnostic {
    let kind = match warning.kind {
        WarningKind::BitwiseFloatCast => DiagnosticKind::BinaryOperation,
        WarningKind::Narrowing | WarningKind::DeadCode | WarningKind::UnusedLocal => {
            DiagnosticKind::Type
        }
    };
    at_span(
        kind,
        Severity::Warning,
        warning.message.clone(),
        warning.span,
        source,
    )
}

pub(crate) fn from_jit(error: JitError) -> Diagnostic {
    Diagnostic {
        kind: DiagnosticKind::Jit,
        severity: Severity::Error,
        message: error.to_string(),
        line: 0,
        column: 0,
        snippet: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_finds_lines_and_columns() {
        let source = "first line\nsecond line\nthird";
        let (line, column, snippet) = locate(source, source.find("second").unwrap());
        assert_eq!((line, column), (2, 1));
        assert_eq!(snippet, "second line");
        let (line, column, _) = locate(source, source.find("line\nthird").unwrap());
        assert_eq!((line, column), (2, 8));
    }

    #[test]
    fn display_includes_location() {
        let d = Diagnostic {
            kind: DiagnosticKind::Type,
            severity: Severity::Error,
            message: "cannot assign string to float".to_string(),
            line: 3,
            column: 7,
            snippet: "@a = \"x\";".to_string(),
        };
        let text = d.to_string();
        assert!(text.contains("error: type error"));
        assert!(text.contains("3:7"));
        assert!(text.contains("@a = \"x\";"));
    }
}
