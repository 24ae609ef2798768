//! Vector builtins.

use voxl_types::{AxType, Scalar, Value};

use super::{vec3_f32, vec3_f64, vec3d_value, vec3f_value};
use crate::registry::FunctionRegistry;
use crate::signature::{FunctionGroup, FunctionSignature};

const F32: AxType = AxType::Scalar(voxl_types::ScalarType::F32);
const F64: AxType = AxType::Scalar(voxl_types::ScalarType::F64);

fn dot3_f32(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn dot3_f64(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Register the vector groups.
pub fn register(registry: &mut FunctionRegistry) {
    registry.insert(FunctionGroup::new(
        "length",
        vec![
            FunctionSignature::inline(F32, vec![AxType::VEC3F], |args: &[Value]| {
                let v = vec3_f32(args, 0);
                Scalar::F32(dot3_f32(v, v).sqrt()).into()
            }),
            FunctionSignature::inline(F64, vec![AxType::VEC3D], |args: &[Value]| {
                let v = vec3_f64(args, 0);
                Scalar::F64(dot3_f64(v, v).sqrt()).into()
            }),
        ],
    ));

    registry.insert(FunctionGroup::new(
        "lengthsq",
        vec![
            FunctionSignature::inline(F32, vec![AxType::VEC3F], |args: &[Value]| {
                let v = vec3_f32(args, 0);
                Scalar::F32(dot3_f32(v, v)).into()
            }),
            FunctionSignature::inline(F64, vec![AxType::VEC3D], |args: &[Value]| {
                let v = vec3_f64(args, 0);
                Scalar::F64(dot3_f64(v, v)).into()
            }),
        ],
    ));

    registry.insert(FunctionGroup::new(
        "normalize",
        vec![
            FunctionSignature::inline(AxType::VEC3F, vec![AxType::VEC3F], |args: &[Value]| {
                let v = vec3_f32(args, 0);
                let mag = dot3_f32(v, v).sqrt();
                if mag > 0.0 {
                    vec3f_value([v[0] / mag, v[1] / mag, v[2] / mag])
                } else {
                    vec3f_value([0.0; 3])
                }
            }),
            FunctionSignature::inline(AxType::VEC3D, vec![AxType::VEC3D], |args: &[Value]| {
                let v = vec3_f64(args, 0);
                let mag = dot3_f64(v, v).sqrt();
                if mag > 0.0 {
                    vec3d_value([v[0] / mag, v[1] / mag, v[2] / mag])
                } else {
                    vec3d_value([0.0; 3])
                }
            }),
        ],
    ));

    registry.insert(FunctionGroup::new(
        "dot",
        vec![
            FunctionSignature::inline(F32, vec![AxType::VEC3F, AxType::VEC3F], |args: &[Value]| {
                Scalar::F32(dot3_f32(vec3_f32(args, 0), vec3_f32(args, 1))).into()
            }),
            FunctionSignature::inline(F64, vec![AxType::VEC3D, AxType::VEC3D], |args: &[Value]| {
                Scalar::F64(dot3_f64(vec3_f64(args, 0), vec3_f64(args, 1))).into()
            }),
        ],
    ));

    registry.insert(FunctionGroup::new(
        "cross",
        vec![
            FunctionSignature::inline(
                AxType::VEC3F,
                vec![AxType::VEC3F, AxType::VEC3F],
                |args: &[Value]| {
                    let (a, b) = (vec3_f32(args, 0), vec3_f32(args, 1));
                    vec3f_value([
                        a[1] * b[2] - a[2] * b[1],
                        a[2] * b[0] - a[0] * b[2],
                        a[0] * b[1] - a[1] * b[0],
                    ])
                },
            ),
            FunctionSignature::inline(
                AxType::VEC3D,
                vec![AxType::VEC3D, AxType::VEC3D],
                |args: &[Value]| {
                    let (a, b) = (vec3_f64(args, 0), vec3_f64(args, 1));
                    vec3d_value([
                        a[1] * b[2] - a[2] * b[1],
                        a[2] * b[0] - a[0] * b[2],
                        a[0] * b[1] - a[1] * b[0],
                    ])
                },
            ),
        ],
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::FnImpl;

    fn eval(name: &str, args: &[Value]) -> Value {
        let mut registry = FunctionRegistry::empty();
        register(&mut registry);
        let arg_types: Vec<AxType> = args.iter().map(|a| a.ty()).collect();
        let (_, sig) = registry.select(name, &arg_types).unwrap();
        match sig.implementation {
            FnImpl::Inline(f) => f(args),
            FnImpl::External(_) => panic!("vector builtins are inline"),
        }
    }

    #[test]
    fn length_345() {
        let v = vec3f_value([3.0, 4.0, 0.0]);
        assert_eq!(eval("length", &[v]), Scalar::F32(5.0).into());
    }

    #[test]
    fn normalize_unit() {
        let v = vec3f_value([2.0, 0.0, 0.0]);
        assert_eq!(eval("normalize", &[v]), vec3f_value([1.0, 0.0, 0.0]));
    }

    #[test]
    fn normalize_zero_is_zero() {
        let v = vec3d_value([0.0; 3]);
        assert_eq!(eval("normalize", &[v]), vec3d_value([0.0; 3]));
    }

    #[test]
    fn cross_basis() {
        let i = vec3f_value([1.0, 0.0, 0.0]);
        let j = vec3f_value([0.0, 1.0, 0.0]);
        assert_eq!(eval("cross", &[i, j]), vec3f_value([0.0, 0.0, 1.0]));
    }

    #[test]
    fn dot_perpendicular() {
        let i = vec3d_value([1.0, 0.0, 0.0]);
        let j = vec3d_value([0.0, 1.0, 0.0]);
        assert_eq!(eval("dot", &[i, j]), Scalar::F64(0.0).into());
    }
}
