//! Runtime values.
//!
//! [`Scalar`] is a typed scalar; [`ArrayValue`] a fixed-length array of
//! scalars sharing one element type; [`Value`] the union of everything a
//! kernel can hold.

use serde::{Deserialize, Serialize};

use crate::types::{AxType, ScalarType};

/// A typed scalar value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    /// Boolean value.
    Bool(bool),
    /// 8-bit signed integer.
    I8(i8),
    /// 16-bit signed integer.
    I16(i16),
    /// 32-bit signed integer.
    I32(i32),
    /// 64-bit signed integer.
    I64(i64),
    /// 32-bit float.
    F32(f32),
    /// 64-bit float.
    F64(f64),
}

impl Scalar {
    /// The type of this scalar.
    pub fn ty(self) -> ScalarType {
        match self {
            Scalar::Bool(_) => ScalarType::Bool,
            Scalar::I8(_) => ScalarType::I8,
            Scalar::I16(_) => ScalarType::I16,
            Scalar::I32(_) => ScalarType::I32,
            Scalar::I64(_) => ScalarType::I64,
            Scalar::F32(_) => ScalarType::F32,
            Scalar::F64(_) => ScalarType::F64,
        }
    }

    /// The zero value of a scalar type.
    pub fn zero(ty: ScalarType) -> Scalar {
        match ty {
            ScalarType::Bool => Scalar::Bool(false),
            ScalarType::I8 => Scalar::I8(0),
            ScalarType::I16 => Scalar::I16(0),
            ScalarType::I32 => Scalar::I32(0),
            ScalarType::I64 => Scalar::I64(0),
            ScalarType::F32 => Scalar::F32(0.0),
            ScalarType::F64 => Scalar::F64(0.0),
        }
    }

    /// Widening read as `f64`.
    pub fn as_f64(self) -> f64 {
        match self {
            Scalar::Bool(v) => v as u8 as f64,
            Scalar::I8(v) => v as f64,
            Scalar::I16(v) => v as f64,
            Scalar::I32(v) => v as f64,
            Scalar::I64(v) => v as f64,
            Scalar::F32(v) => v as f64,
            Scalar::F64(v) => v,
        }
    }

    /// Widening read as `i64`. Floats truncate.
    pub fn as_i64(self) -> i64 {
        match self {
            Scalar::Bool(v) => v as i64,
            Scalar::I8(v) => v as i64,
            Scalar::I16(v) => v as i64,
            Scalar::I32(v) => v as i64,
            Scalar::I64(v) => v,
            Scalar::F32(v) => v as i64,
            Scalar::F64(v) => v as i64,
        }
    }
}

/// A fixed-length array value. All elements share one scalar type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    elem: ScalarType,
    data: Vec<Scalar>,
}

impl ArrayValue {
    /// Build from elements that already share `elem` as their type.
    pub fn new(elem: ScalarType, data: Vec<Scalar>) -> ArrayValue {
        debug_assert!(data.iter().all(|s| s.ty() == elem));
        ArrayValue { elem, data }
    }

    /// An array with every element set to `value`.
    pub fn splat(value: Scalar, len: usize) -> ArrayValue {
        ArrayValue {
            elem: value.ty(),
            data: vec![value; len],
        }
    }

    /// The zero array of the given element type and length.
    pub fn zero(elem: ScalarType, len: usize) -> ArrayValue {
        ArrayValue::splat(Scalar::zero(elem), len)
    }

    /// Element scalar type.
    pub fn elem(&self) -> ScalarType {
        self.elem
    }

    /// Element count.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the array holds no elements. Never the case for kernel values.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> Scalar {
        self.data[index]
    }

    /// Overwrite the element at `index`. The value's type must match.
    pub fn set(&mut self, index: usize, value: Scalar) {
        debug_assert_eq!(value.ty(), self.elem);
        self.data[index] = value;
    }

    /// Borrow the elements.
    pub fn elements(&self) -> &[Scalar] {
        &self.data
    }

    /// The kernel type of this array.
    pub fn ty(&self) -> AxType {
        AxType::Array {
            elem: self.elem,
            len: self.data.len() as u8,
        }
    }
}

/// Any value a kernel expression can produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Scalar value.
    Scalar(Scalar),
    /// Fixed-length array value.
    Array(ArrayValue),
    /// Immutable string value.
    Str(String),
}

impl Value {
    /// The type of this value.
    pub fn ty(&self) -> AxType {
        match self {
            Value::Scalar(s) => AxType::Scalar(s.ty()),
            Value::Array(a) => a.ty(),
            Value::Str(_) => AxType::Str,
        }
    }

    /// The zero/default value of a kernel type.
    pub fn zero(ty: AxType) -> Value {
        match ty {
            AxType::Scalar(s) => Value::Scalar(Scalar::zero(s)),
            AxType::Array { elem, len } => Value::Array(ArrayValue::zero(elem, len as usize)),
            AxType::Str => Value::Str(String::new()),
        }
    }

    /// The scalar inside, if any.
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Value::Scalar(s) => Some(*s),
            _ => None,
        }
    }

    /// The array inside, if any.
    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// The string inside, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Value {
        Value::Scalar(s)
    }
}

impl From<ArrayValue> for Value {
    fn from(a: ArrayValue) -> Value {
        Value::Array(a)
    }
}
