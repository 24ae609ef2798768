//! Built-in function catalogue.
//!
//! Each submodule registers one family of builtins. Implementations here
//! are the inline flavour: pure functions over already type-checked
//! arguments. The engine guarantees argument types match the selected
//! signature, so extraction failures are programming errors and panic.

pub mod externals;
pub mod math;
pub mod matrix;
pub mod rng;
pub mod vector;

use voxl_types::{ArrayValue, Scalar, ScalarType, Value};

pub(crate) fn scalar_arg(args: &[Value], index: usize) -> Scalar {
    match &args[index] {
        Value::Scalar(s) => *s,
        other => panic!("builtin expected scalar argument, got {other:?}"),
    }
}

pub(crate) fn f64_arg(args: &[Value], index: usize) -> f64 {
    scalar_arg(args, index).as_f64()
}

pub(crate) fn f32_arg(args: &[Value], index: usize) -> f32 {
    match scalar_arg(args, index) {
        Scalar::F32(v) => v,
        other => other.as_f64() as f32,
    }
}

pub(crate) fn i32_arg(args: &[Value], index: usize) -> i32 {
    scalar_arg(args, index).as_i64() as i32
}

pub(crate) fn i64_arg(args: &[Value], index: usize) -> i64 {
    scalar_arg(args, index).as_i64()
}

pub(crate) fn array_arg<'a>(args: &'a [Value], index: usize) -> &'a ArrayValue {
    match &args[index] {
        Value::Array(a) => a,
        other => panic!("builtin expected array argument, got {other:?}"),
    }
}

pub(crate) fn vec3_f32(args: &[Value], index: usize) -> [f32; 3] {
    let a = array_arg(args, index);
    [elem_f32(a, 0), elem_f32(a, 1), elem_f32(a, 2)]
}

pub(crate) fn vec3_f64(args: &[Value], index: usize) -> [f64; 3] {
    let a = array_arg(args, index);
    [a.get(0).as_f64(), a.get(1).as_f64(), a.get(2).as_f64()]
}

pub(crate) fn mat4_f32(args: &[Value], index: usize) -> [f32; 16] {
    let a = array_arg(args, index);
    let mut out = [0.0f32; 16];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = elem_f32(a, i);
    }
    out
}

fn elem_f32(a: &ArrayValue, index: usize) -> f32 {
    match a.get(index) {
        Scalar::F32(v) => v,
        other => other.as_f64() as f32,
    }
}

pub(crate) fn vec3f_value(v: [f32; 3]) -> Value {
    Value::Array(ArrayValue::new(
        ScalarType::F32,
        v.iter().map(|&x| Scalar::F32(x)).collect(),
    ))
}

pub(crate) fn vec3d_value(v: [f64; 3]) -> Value {
    Value::Array(ArrayValue::new(
        ScalarType::F64,
        v.iter().map(|&x| Scalar::F64(x)).collect(),
    ))
}

pub(crate) fn mat4f_value(v: [f32; 16]) -> Value {
    Value::Array(ArrayValue::new(
        ScalarType::F32,
        v.iter().map(|&x| Scalar::F32(x)).collect(),
    ))
}
