//! Runtime errors.

use thiserror::Error;
use voxl_engine::{ExecError, JitError};

/// Failure while binding or executing a kernel against grids.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// An attribute cannot be materialised: the target grid exists with
    /// a different value type than the kernel requires.
    #[error("attribute '{name}': grid has type {found}, kernel expects {expected}")]
    Attribute {
        /// Attribute name.
        name: String,
        /// Type the kernel was compiled against.
        expected: String,
        /// Type found on the grid.
        found: String,
    },

    /// A kernel invocation trapped.
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// The module is missing its entry point; always a compiler bug.
    #[error(transparent)]
    Jit(#[from] JitError),
}
