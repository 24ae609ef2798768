//! Codegen-phase errors and warnings.
//!
//! Errors carry the category the compile-error surface reports plus the
//! offending source span; the driver turns them into diagnostics with
//! line/column information.

use thiserror::Error;
use voxl_ast::Span;

/// Category of a compilation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid conversion, undeclared identifier, non-scalar where a
    /// scalar is required.
    Type,
    /// Invalid operator/operand combination (e.g. `&&` on vectors).
    BinaryOperation,
    /// No matching overload for a call site.
    FunctionLookup,
    /// Two overloads tie completely.
    AmbiguousOverload,
    /// Attribute conflicts or unsupported attribute types.
    UnknownAttribute,
    /// Inconsistent compiler state; always a bug.
    Internal,
}

impl ErrorKind {
    /// Human-readable category name.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Type => "type error",
            ErrorKind::BinaryOperation => "binary operation error",
            ErrorKind::FunctionLookup => "function lookup error",
            ErrorKind::AmbiguousOverload => "ambiguous overload",
            ErrorKind::UnknownAttribute => "unknown attribute",
            ErrorKind::Internal => "internal error",
        }
    }
}

/// A codegen-phase error with its source location.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}: {message}", kind.name())]
pub struct CodegenError {
    /// Error category.
    pub kind: ErrorKind,
    /// Offending source range.
    pub span: Span,
    /// Human-readable description.
    pub message: String,
}

impl CodegenError {
    /// Construct an error.
    pub fn new(kind: ErrorKind, span: Span, message: impl Into<String>) -> CodegenError {
        CodegenError {
            kind,
            span,
            message: message.into(),
        }
    }
}

/// Non-fatal diagnostic categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Assignment or initialisation loses precision.
    Narrowing,
    /// Bitwise operator on floating point operands; both sides cast to
    /// `long` implicitly.
    BitwiseFloatCast,
    /// Statement can never execute.
    DeadCode,
    /// Local declared but never read.
    UnusedLocal,
}

/// A non-fatal diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    /// Warning category.
    pub kind: WarningKind,
    /// Source range.
    pub span: Span,
    /// Human-readable description.
    pub message: String,
}

impl Warning {
    /// Construct a warning.
    pub fn new(kind: WarningKind, span: Span, message: impl Into<String>) -> Warning {
        Warning {
            kind,
            span,
            message: message.into(),
        }
    }
}
