//! Matrix builtins. Matrices are 4x4 `float`, stored flat row-major.

use voxl_types::{AxType, Value};

use super::{mat4_f32, mat4f_value, vec3_f32, vec3f_value};
use crate::registry::FunctionRegistry;
use crate::signature::{FunctionGroup, FunctionSignature};

fn identity() -> [f32; 16] {
    let mut m = [0.0f32; 16];
    m[0] = 1.0;
    m[5] = 1.0;
    m[10] = 1.0;
    m[15] = 1.0;
    m
}

fn multiply(a: [f32; 16], b: [f32; 16]) -> [f32; 16] {
    let mut out = [0.0f32; 16];
    for row in 0..4 {
        for col in 0..4 {
            let mut sum = 0.0;
            for k in 0..4 {
                sum += a[row * 4 + k] * b[k * 4 + col];
            }
            out[row * 4 + col] = sum;
        }
    }
    out
}

// Row-vector convention: [x y z 1] * M, translation in the last row.
fn transform_point(v: [f32; 3], m: [f32; 16]) -> [f32; 3] {
    let mut out = [0.0f32; 3];
    for (col, slot) in out.iter_mut().enumerate() {
        *slot = v[0] * m[col] + v[1] * m[4 + col] + v[2] * m[8 + col] + m[12 + col];
    }
    out
}

/// Register the matrix groups.
pub fn register(registry: &mut FunctionRegistry) {
    registry.insert(FunctionGroup::new(
        "identity4",
        vec![FunctionSignature::inline(AxType::MAT4F, vec![], |_args: &[Value]| {
            mat4f_value(identity())
        })],
    ));

    registry.insert(FunctionGroup::new(
        "mmult",
        vec![FunctionSignature::inline(
            AxType::MAT4F,
            vec![AxType::MAT4F, AxType::MAT4F],
            |args: &[Value]| mat4f_value(multiply(mat4_f32(args, 0), mat4_f32(args, 1))),
        )],
    ));

    registry.insert(FunctionGroup::new(
        "transpose",
        vec![FunctionSignature::inline(
            AxType::MAT4F,
            vec![AxType::MAT4F],
            |args: &[Value]| {
                let m = mat4_f32(args, 0);
                let mut out = [0.0f32; 16];
                for row in 0..4 {
                    for col in 0..4 {
                        out[col * 4 + row] = m[row * 4 + col];
                    }
                }
                mat4f_value(out)
            },
        )],
    ));

    registry.insert(FunctionGroup::new(
        "transform",
        vec![FunctionSignature::inline(
            AxType::VEC3F,
            vec![AxType::VEC3F, AxType::MAT4F],
            |args: &[Value]| vec3f_value(transform_point(vec3_f32(args, 0), mat4_f32(args, 1))),
        )],
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
            FnImpl::External(_) => panic!("matrix builtins are inline"),
        }
    }

    #[test]
    fn identity_times_identity() {
        let i = eval("identity4", &[]);
        assert_eq!(eval("mmult", &[i.clone(), i.clone()]), i);
    }

    #[test]
    fn transform_by_identity_is_noop() {
        let i = eval("identity4", &[]);
        let v = vec3f_value([1.0, 2.0, 3.0]);
        assert_eq!(eval("transform", &[v.clone(), i]), v);
    }

    #[test]
    fn transform_applies_translation() {
        let mut m = identity();
        m[12] = 10.0;
        m[13] = 20.0;
        m[14] = 30.0;
        let v = vec3f_value([1.0, 2.0, 3.0]);
        assert_eq!(
            eval("transform", &[v, mat4f_value(m)]),
            vec3f_value([11.0, 22.0, 33.0])
        );
    }

    #[test]
    fn transpose_involution() {
        let mut m = identity();
        m[1] = 5.0;
        let t = eval("transpose", &[mat4f_value(m)]);
        assert_eq!(eval("transpose", &[t]), mat4f_value(m));
    }
}
