//! Type system and value model for the Voxl kernel language.
//!
//! This crate is the foundation layer shared by every other Voxl crate:
//!
//! - [`types`] - The set of representable kernel types and their precedence
//! - [`value`] - Runtime scalar/array/string values
//! - [`conversion`] - Implicit arithmetic conversion, array packing and casting
//! - [`ops`] - Binary and unary operator semantics
//! - [`error`] - Type and operation error types
//!
//! # Type model
//!
//! Kernel values are scalars (`bool`, `i8`, `i16`, `i32`, `i64`, `f32`,
//! `f64`), fixed-length arrays of scalars (vectors of length 3 and 4, and
//! 4x4 matrices), and strings. Mixed-type arithmetic promotes operands to
//! the highest-precedence operand type; the total precedence order is
//!
//! ```text
//! bool < i8 < i16 < i32 < i64 < f32 < f64
//! ```
//!
//! Conversion semantics follow C: narrowing is permitted (with a warning at
//! the compiler layer), float to integer truncates, and boolean coercion of
//! floats uses ordered comparison so NaN coerces to false.

pub mod conversion;
pub mod error;
pub mod ops;
pub mod types;
pub mod value;

pub use conversion::{
    arithmetic_cast, array_cast, array_pack, array_pack_cast, array_unpack, bool_coerce,
    precedence, scalar_precedence,
};
pub use error::{OpError, TypeError};
pub use ops::{binary_op, unary_op, BinaryOp, OpKind, UnaryOp};
pub use types::{AxType, ScalarType};
pub use value::{ArrayValue, Scalar, Value};
