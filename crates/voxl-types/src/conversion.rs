//! Implicit arithmetic conversion and array packing.
//!
//! These are the value-level counterparts of the conversion instructions
//! the code generator emits: precedence selection for mixed-type binary
//! operations, C-style scalar casts, boolean coercion, and fixed-length
//! array construction/destructuring.
//!
//! Narrowing conversions are permitted here without any diagnostics; the
//! compiler layer decides when a narrowing warrants a warning.

use crate::error::TypeError;
use crate::types::{AxType, ScalarType};
use crate::value::{ArrayValue, Scalar};

/// Highest-precedence type of two scalar types.
///
/// The order is total (`bool < i8 < i16 < i32 < i64 < f32 < f64`), so the
/// result is always one of the two inputs and the function is symmetric.
pub fn scalar_precedence(a: ScalarType, b: ScalarType) -> ScalarType {
    a.max(b)
}

/// Highest-precedence type of two kernel types, both of which must be
/// scalar.
///
/// # Errors
///
/// Returns [`TypeError::NotScalar`] if either input is an array or string.
pub fn precedence(a: AxType, b: AxType) -> Result<ScalarType, TypeError> {
    let sa = a.scalar().ok_or_else(|| TypeError::NotScalar(a.to_string()))?;
    let sb = b.scalar().ok_or_else(|| TypeError::NotScalar(b.to_string()))?;
    Ok(scalar_precedence(sa, sb))
}

/// C-style boolean coercion of a scalar.
///
/// Floats compare `!= 0.0` with ordered semantics, so NaN coerces to
/// false. Integers compare `!= 0`.
pub fn bool_coerce(value: Scalar) -> bool {
    match value {
        Scalar::Bool(v) => v,
        Scalar::I8(v) => v != 0,
        Scalar::I16(v) => v != 0,
        Scalar::I32(v) => v != 0,
        Scalar::I64(v) => v != 0,
        Scalar::F32(v) => !v.is_nan() && v != 0.0,
        Scalar::F64(v) => !v.is_nan() && v != 0.0,
    }
}

/// Convert a scalar to a target scalar type with C semantics.
///
/// Float to integer truncates toward zero; integer to integer truncates
/// bits; anything to bool goes through [`bool_coerce`]. If the value is
/// already of the target type it is returned unchanged.
pub fn arithmetic_cast(value: Scalar, target: ScalarType) -> Scalar {
    if value.ty() == target {
        return value;
    }
    match target {
        ScalarType::Bool => Scalar::Bool(bool_coerce(value)),
        ScalarType::I8 => Scalar::I8(value.as_i64() as i8),
        ScalarType::I16 => Scalar::I16(value.as_i64() as i16),
        ScalarType::I32 => Scalar::I32(value.as_i64() as i32),
        ScalarType::I64 => Scalar::I64(value.as_i64()),
        ScalarType::F32 => Scalar::F32(value.as_f64() as f32),
        ScalarType::F64 => Scalar::F64(value.as_f64()),
    }
}

/// Cast every element of an array to a target element type.
///
/// If the source element type already matches, the array is returned
/// unchanged.
pub fn array_cast(array: ArrayValue, target: ScalarType) -> ArrayValue {
    if array.elem() == target {
        return array;
    }
    let data = array
        .elements()
        .iter()
        .map(|&s| arithmetic_cast(s, target))
        .collect();
    ArrayValue::new(target, data)
}

/// Pack scalars of one shared type into an array.
///
/// # Errors
///
/// Returns [`TypeError::MismatchedElements`] if the elements do not all
/// share one scalar type. Use [`array_pack_cast`] to promote first.
pub fn array_pack(values: Vec<Scalar>) -> Result<ArrayValue, TypeError> {
    let elem = values[0].ty();
    for v in &values[1..] {
        if v.ty() != elem {
            return Err(TypeError::MismatchedElements(
                elem.to_string(),
                v.ty().to_string(),
            ));
        }
    }
    Ok(ArrayValue::new(elem, values))
}

/// Pack scalars into an array, first promoting every element to the
/// highest-precedence type present.
pub fn array_pack_cast(values: Vec<Scalar>) -> ArrayValue {
    let mut elem = ScalarType::Bool;
    for v in &values {
        elem = scalar_precedence(elem, v.ty());
    }
    let data = values
        .into_iter()
        .map(|s| arithmetic_cast(s, elem))
        .collect();
    ArrayValue::new(elem, data)
}

/// Destructure an array into its elements.
pub fn array_unpack(array: &ArrayValue) -> &[Scalar] {
    array.elements()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_is_symmetric_and_total() {
        let all = [
            ScalarType::Bool,
            ScalarType::I8,
            ScalarType::I16,
            ScalarType::I32,
            ScalarType::I64,
            ScalarType::F32,
            ScalarType::F64,
        ];
        for &a in &all {
            for &b in &all {
                let p = scalar_precedence(a, b);
                assert_eq!(p, scalar_precedence(b, a));
                assert!(p == a || p == b);
            }
        }
    }

    #[test]
    fn precedence_rejects_arrays() {
        let err = precedence(AxType::VEC3F, AxType::Scalar(ScalarType::F32));
        assert!(matches!(err, Err(TypeError::NotScalar(_))));
    }

    #[test]
    fn mixed_int_float_promotes_to_float() {
        assert_eq!(
            scalar_precedence(ScalarType::I64, ScalarType::F32),
            ScalarType::F32
        );
        assert_eq!(
            scalar_precedence(ScalarType::I32, ScalarType::F64),
            ScalarType::F64
        );
    }

    #[test]
    fn float_to_int_truncates() {
        assert_eq!(
            arithmetic_cast(Scalar::F64(6.9), ScalarType::I32),
            Scalar::I32(6)
        );
        assert_eq!(
            arithmetic_cast(Scalar::F64(-2.7), ScalarType::I32),
            Scalar::I32(-2)
        );
    }

    #[test]
    fn int_to_int_truncates_bits() {
        assert_eq!(
            arithmetic_cast(Scalar::I64(0x1_0000_0001), ScalarType::I32),
            Scalar::I32(1)
        );
    }

    #[test]
    fn bool_coercion_ordered() {
        assert!(!bool_coerce(Scalar::F64(f64::NAN)));
        assert!(!bool_coerce(Scalar::F64(0.0)));
        assert!(bool_coerce(Scalar::F64(-3.0)));
        assert!(bool_coerce(Scalar::I32(-1)));
        assert!(!bool_coerce(Scalar::I32(0)));
    }

    #[test]
    fn bool_widens_through_float() {
        assert_eq!(
            arithmetic_cast(Scalar::Bool(true), ScalarType::F64),
            Scalar::F64(1.0)
        );
    }

    #[test]
    fn pack_unpack_round_trips_bitwise() {
        let packed = array_pack(vec![
            Scalar::F32(1.5),
            Scalar::F32(-0.0),
            Scalar::F32(3.25),
        ])
        .unwrap();
        let unpacked = array_unpack(&packed);
        assert_eq!(
            unpacked,
            &[Scalar::F32(1.5), Scalar::F32(-0.0), Scalar::F32(3.25)]
        );
        assert!(unpacked[1].as_f64().is_sign_negative());
    }

    #[test]
    fn pack_rejects_mixed_elements() {
        let err = array_pack(vec![Scalar::F32(1.0), Scalar::I32(2)]);
        assert!(matches!(err, Err(TypeError::MismatchedElements(..))));
    }

    #[test]
    fn pack_cast_promotes_to_highest() {
        let packed = array_pack_cast(vec![
            Scalar::I32(1),
            Scalar::F32(2.0),
            Scalar::Bool(true),
        ]);
        assert_eq!(packed.elem(), ScalarType::F32);
        assert_eq!(packed.get(0), Scalar::F32(1.0));
        assert_eq!(packed.get(2), Scalar::F32(1.0));
    }

    #[test]
    fn array_cast_identity_returns_unchanged() {
        let a = ArrayValue::new(ScalarType::F32, vec![Scalar::F32(1.0); 3]);
        let b = array_cast(a.clone(), ScalarType::F32);
        assert_eq!(a, b);
        let c = array_cast(a, ScalarType::F64);
        assert_eq!(c.elem(), ScalarType::F64);
        assert_eq!(c.get(0), Scalar::F64(1.0));
    }
}
