//! Type and operation errors.

use thiserror::Error;

/// Errors raised by type utilities and conversions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// A scalar was required but an array or string was supplied.
    #[error("type {0} is not a scalar type")]
    NotScalar(String),

    /// No conversion exists between the two types.
    #[error("cannot convert {from} to {to}")]
    InvalidConversion {
        /// Source type name.
        from: String,
        /// Target type name.
        to: String,
    },

    /// Array pack received elements of mismatched types.
    #[error("cannot pack mismatched element types {0} and {1}")]
    MismatchedElements(String, String),
}

/// Errors raised when selecting or evaluating a binary operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpError {
    /// Logical and bitwise operators are not defined on floating point
    /// operands at this level; the compiler inserts coercions first.
    #[error("cannot perform {op} on floating point operands")]
    FloatOperand {
        /// Operator spelling.
        op: &'static str,
    },

    /// Operand types did not match; callers must promote first.
    #[error("mismatched operand types {lhs} and {rhs} for {op}")]
    Mismatched {
        /// Left operand type name.
        lhs: String,
        /// Right operand type name.
        rhs: String,
        /// Operator spelling.
        op: &'static str,
    },

    /// Integer division or remainder with a zero divisor.
    #[error("integer division by zero")]
    DivideByZero,

    /// The operator is not defined for the operand type.
    #[error("operator {op} is not defined for {ty}")]
    Unsupported {
        /// Operator spelling.
        op: &'static str,
        /// Operand type name.
        ty: String,
    },
}
