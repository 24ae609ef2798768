//! Engine errors.

use thiserror::Error;
use voxl_codegen::VerifyError;

/// Failure while adding a module to the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JitError {
    /// Structural verification failed.
    #[error("module verification failed: {0}")]
    Verify(#[from] VerifyError),

    /// An external declaration did not resolve to a native symbol.
    #[error("unresolved external symbol '{symbol}'")]
    UnresolvedSymbol {
        /// The missing symbol name.
        symbol: String,
    },

    /// The requested entry function does not exist in the module.
    #[error("no function named '{name}' in module")]
    UnknownFunction {
        /// The missing function name.
        name: String,
    },
}

/// Failure during kernel execution.
///
/// Well-typed kernels only trap on integer division by zero; every other
/// variant indicates a compiler bug surfacing at run time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecError {
    /// Integer `/` or `%` with a zero divisor.
    #[error("integer division by zero")]
    DivideByZero,

    /// Inconsistent IR reached the interpreter.
    #[error("invalid kernel state: {message}")]
    Invalid {
        /// Details.
        message: String,
    },
}

impl ExecError {
    pub(crate) fn invalid(message: impl Into<String>) -> ExecError {
        ExecError::Invalid {
            message: message.into(),
        }
    }
}
