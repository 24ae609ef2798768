//! Kernel type definitions.
//!
//! [`ScalarType`] enumerates the scalar types a kernel can operate on and
//! defines the total precedence order used for implicit promotion.
//! [`AxType`] is the full type of an expression: a scalar, a fixed-length
//! array of scalars, or a string.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar kernel types, ordered by promotion precedence.
///
/// The derived `Ord` follows the declaration order, which is the implicit
/// arithmetic conversion order: `bool < i8 < i16 < i32 < i64 < f32 < f64`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ScalarType {
    /// Boolean, stored as a single bit conceptually.
    Bool,
    /// 8-bit signed integer. No literal form; reached via casts.
    I8,
    /// 16-bit signed integer (`short`).
    I16,
    /// 32-bit signed integer (`int`).
    I32,
    /// 64-bit signed integer (`long`).
    I64,
    /// 32-bit float (`float`).
    F32,
    /// 64-bit float (`double`).
    F64,
}

impl ScalarType {
    /// True for `f32` and `f64`.
    pub fn is_float(self) -> bool {
        matches!(self, ScalarType::F32 | ScalarType::F64)
    }

    /// True for the signed integer types. `bool` is not an integer.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ScalarType::I8 | ScalarType::I16 | ScalarType::I32 | ScalarType::I64
        )
    }

    /// Source-level spelling of the type.
    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::I8 => "i8",
            ScalarType::I16 => "short",
            ScalarType::I32 => "int",
            ScalarType::I64 => "long",
            ScalarType::F32 => "float",
            ScalarType::F64 => "double",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The resolved type of a kernel expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxType {
    /// A single scalar.
    Scalar(ScalarType),
    /// A fixed-length array of scalars. Vectors have length 3 or 4;
    /// matrices are stored flat with length 16.
    Array {
        /// Element scalar type.
        elem: ScalarType,
        /// Element count (3, 4 or 16).
        len: u8,
    },
    /// Length-prefixed immutable string.
    Str,
}

impl AxType {
    /// `vec3i`
    pub const VEC3I: AxType = AxType::Array {
        elem: ScalarType::I32,
        len: 3,
    };
    /// `vec3f`
    pub const VEC3F: AxType = AxType::Array {
        elem: ScalarType::F32,
        len: 3,
    };
    /// `vec3d`
    pub const VEC3D: AxType = AxType::Array {
        elem: ScalarType::F64,
        len: 3,
    };
    /// `mat4f`, stored flat in row-major order.
    pub const MAT4F: AxType = AxType::Array {
        elem: ScalarType::F32,
        len: 16,
    };

    /// Construct a vector type of the given length.
    pub fn vec(elem: ScalarType, len: u8) -> AxType {
        AxType::Array { elem, len }
    }

    /// The scalar type, if this is a scalar.
    pub fn scalar(self) -> Option<ScalarType> {
        match self {
            AxType::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// The element type, for both scalars and arrays.
    pub fn element(self) -> Option<ScalarType> {
        match self {
            AxType::Scalar(s) => Some(s),
            AxType::Array { elem, .. } => Some(elem),
            AxType::Str => None,
        }
    }

    /// True if this type participates in arithmetic.
    pub fn is_numeric(self) -> bool {
        !matches!(self, AxType::Str)
    }
}

impl fmt::Display for AxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxType::Scalar(s) => f.write_str(s.name()),
            AxType::Array { elem, len: 16 } => write!(f, "mat4{}", elem_suffix(*elem)),
            AxType::Array { elem, len } => write!(f, "vec{}{}", len, elem_suffix(*elem)),
            AxType::Str => f.write_str("string"),
        }
    }
}

fn elem_suffix(elem: ScalarType) -> &'static str {
    match elem {
        ScalarType::Bool => "b",
        ScalarType::I8 => "c",
        ScalarType::I16 => "s",
        ScalarType::I32 => "i",
        ScalarType::I64 => "l",
        ScalarType::F32 => "f",
        ScalarType::F64 => "d",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_order_matches_declaration() {
        assert!(ScalarType::Bool < ScalarType::I8);
        assert!(ScalarType::I8 < ScalarType::I16);
        assert!(ScalarType::I16 < ScalarType::I32);
        assert!(ScalarType::I32 < ScalarType::I64);
        assert!(ScalarType::I64 < ScalarType::F32);
        assert!(ScalarType::F32 < ScalarType::F64);
    }

    #[test]
    fn display_names() {
        assert_eq!(AxType::Scalar(ScalarType::F32).to_string(), "float");
        assert_eq!(AxType::VEC3F.to_string(), "vec3f");
        assert_eq!(AxType::VEC3D.to_string(), "vec3d");
        assert_eq!(AxType::MAT4F.to_string(), "mat4f");
        assert_eq!(AxType::Str.to_string(), "string");
    }

    #[test]
    fn classification() {
        assert!(ScalarType::F32.is_float());
        assert!(!ScalarType::F32.is_integer());
        assert!(ScalarType::I64.is_integer());
        assert!(!ScalarType::Bool.is_integer());
        assert!(AxType::VEC3F.is_numeric());
        assert!(!AxType::Str.is_numeric());
    }
}
