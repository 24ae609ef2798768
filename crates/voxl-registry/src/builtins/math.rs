//! Elementary math builtins.

use voxl_types::{AxType, Scalar, ScalarType, Value};

use super::{f32_arg, f64_arg, i32_arg, i64_arg};
use crate::registry::FunctionRegistry;
use crate::signature::{FunctionGroup, FunctionSignature};

const I32: AxType = AxType::Scalar(ScalarType::I32);
const I64: AxType = AxType::Scalar(ScalarType::I64);
const F32: AxType = AxType::Scalar(ScalarType::F32);
const F64: AxType = AxType::Scalar(ScalarType::F64);

macro_rules! unary_float {
    ($registry:ident, $name:literal, $method:ident) => {
        $registry.insert(FunctionGroup::new(
            $name,
            vec![
                FunctionSignature::inline(F32, vec![F32], |args: &[Value]| {
                    Scalar::F32(f32_arg(args, 0).$method()).into()
                }),
                FunctionSignature::inline(F64, vec![F64], |args: &[Value]| {
                    Scalar::F64(f64_arg(args, 0).$method()).into()
                }),
            ],
        ));
    };
}

macro_rules! binary_numeric {
    ($registry:ident, $name:literal, $f:ident) => {
        $registry.insert(FunctionGroup::new(
            $name,
            vec![
                FunctionSignature::inline(I32, vec![I32, I32], |args: &[Value]| {
                    Scalar::I32($f(i32_arg(args, 0), i32_arg(args, 1))).into()
                }),
                FunctionSignature::inline(I64, vec![I64, I64], |args: &[Value]| {
                    Scalar::I64($f(i64_arg(args, 0), i64_arg(args, 1))).into()
                }),
                FunctionSignature::inline(F32, vec![F32, F32], |args: &[Value]| {
                    Scalar::F32($f(f32_arg(args, 0), f32_arg(args, 1))).into()
                }),
                FunctionSignature::inline(F64, vec![F64, F64], |args: &[Value]| {
                    Scalar::F64($f(f64_arg(args, 0), f64_arg(args, 1))).into()
                }),
            ],
        ));
    };
}

fn min2<T: PartialOrd>(a: T, b: T) -> T {
    if b < a {
        b
    } else {
        a
    }
}

fn max2<T: PartialOrd>(a: T, b: T) -> T {
    if b > a {
        b
    } else {
        a
    }
}

fn clamp3<T: PartialOrd + Copy>(v: T, lo: T, hi: T) -> T {
    min2(max2(v, lo), hi)
}

fn fit5(v: f64, omin: f64, omax: f64, nmin: f64, nmax: f64) -> f64 {
    if omax == omin {
        return nmin;
    }
    nmin + (v - omin) / (omax - omin) * (nmax - nmin)
}

/// Register the elementary math groups.
pub fn register(registry: &mut FunctionRegistry) {
    registry.insert(FunctionGroup::new(
        "abs",
        vec![
            FunctionSignature::inline(I32, vec![I32], |args: &[Value]| {
                Scalar::I32(i32_arg(args, 0).wrapping_abs()).into()
            }),
            FunctionSignature::inline(I64, vec![I64], |args: &[Value]| {
                Scalar::I64(i64_arg(args, 0).wrapping_abs()).into()
            }),
            FunctionSignature::inline(F32, vec![F32], |args: &[Value]| {
                Scalar::F32(f32_arg(args, 0).abs()).into()
            }),
            FunctionSignature::inline(F64, vec![F64], |args: &[Value]| {
                Scalar::F64(f64_arg(args, 0).abs()).into()
            }),
        ],
    ));

    unary_float!(registry, "floor", floor);
    unary_float!(registry, "ceil", ceil);
    unary_float!(registry, "round", round);
    unary_float!(registry, "sqrt", sqrt);
    unary_float!(registry, "sin", sin);
    unary_float!(registry, "cos", cos);
    unary_float!(registry, "tan", tan);
    unary_float!(registry, "exp", exp);
    unary_float!(registry, "log", ln);

    registry.insert(FunctionGroup::new(
        "pow",
        vec![
            FunctionSignature::inline(F32, vec![F32, F32], |args: &[Value]| {
                Scalar::F32(f32_arg(args, 0).powf(f32_arg(args, 1))).into()
            }),
            FunctionSignature::inline(F64, vec![F64, F64], |args: &[Value]| {
                Scalar::F64(f64_arg(args, 0).powf(f64_arg(args, 1))).into()
            }),
            FunctionSignature::inline(F64, vec![F64, I32], |args: &[Value]| {
                Scalar::F64(f64_arg(args, 0).powi(i32_arg(args, 1))).into()
            }),
        ],
    ));

    binary_numeric!(registry, "min", min2);
    binary_numeric!(registry, "max", max2);

    registry.insert(FunctionGroup::new(
        "clamp",
        vec![
            FunctionSignature::inline(I32, vec![I32, I32, I32], |args: &[Value]| {
                Scalar::I32(clamp3(i32_arg(args, 0), i32_arg(args, 1), i32_arg(args, 2))).into()
            }),
            FunctionSignature::inline(F32, vec![F32, F32, F32], |args: &[Value]| {
                Scalar::F32(clamp3(f32_arg(args, 0), f32_arg(args, 1), f32_arg(args, 2))).into()
            }),
            FunctionSignature::inline(F64, vec![F64, F64, F64], |args: &[Value]| {
                Scalar::F64(clamp3(f64_arg(args, 0), f64_arg(args, 1), f64_arg(args, 2))).into()
            }),
        ],
    ));

    registry.insert(FunctionGroup::new(
        "fit",
        vec![
            FunctionSignature::inline(F32, vec![F32; 5], |args: &[Value]| {
                Scalar::F32(fit5(
                    f64_arg(args, 0),
                    f64_arg(args, 1),
                    f64_arg(args, 2),
                    f64_arg(args, 3),
                    f64_arg(args, 4),
                ) as f32)
                .into()
            }),
            FunctionSignature::inline(F64, vec![F64; 5], |args: &[Value]| {
                Scalar::F64(fit5(
                    f64_arg(args, 0),
                    f64_arg(args, 1),
                    f64_arg(args, 2),
                    f64_arg(args, 3),
                    f64_arg(args, 4),
                ))
                .into()
            }),
        ],
    ));

    registry.insert(FunctionGroup::new(
        "lerp",
        vec![
            FunctionSignature::inline(F32, vec![F32, F32, F32], |args: &[Value]| {
                let (a, b, t) = (f32_arg(args, 0), f32_arg(args, 1), f32_arg(args, 2));
                Scalar::F32(a + (b - a) * t).into()
            }),
            FunctionSignature::inline(F64, vec![F64, F64, F64], |args: &[Value]| {
                let (a, b, t) = (f64_arg(args, 0), f64_arg(args, 1), f64_arg(args, 2));
                Scalar::F64(a + (b - a) * t).into()
            }),
        ],
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::FnImpl;

    fn eval(name: &str, args: &[Value]) -> Value {
        let registry = {
            let mut r = FunctionRegistry::empty();
            register(&mut r);
            r
        };
        let arg_types: Vec<AxType> = args.iter().map(|a| a.ty()).collect();
        let (_, sig) = registry.select(name, &arg_types).unwrap();
        match sig.implementation {
            FnImpl::Inline(f) => f(args),
            FnImpl::External(_) => panic!("math builtins are inline"),
        }
    }

    #[test]
    fn abs_overloads() {
        assert_eq!(eval("abs", &[Scalar::I32(-5).into()]), Scalar::I32(5).into());
        assert_eq!(
            eval("abs", &[Scalar::F64(-2.5).into()]),
            Scalar::F64(2.5).into()
        );
    }

    #[test]
    fn sqrt_selects_float_width() {
        assert_eq!(
            eval("sqrt", &[Scalar::F32(16.0).into()]),
            Scalar::F32(4.0).into()
        );
        assert_eq!(
            eval("sqrt", &[Scalar::F64(16.0).into()]),
            Scalar::F64(4.0).into()
        );
    }

    #[test]
    fn min_max_integer() {
        assert_eq!(
            eval("min", &[Scalar::I32(3).into(), Scalar::I32(1).into()]),
            Scalar::I32(1).into()
        );
        assert_eq!(
            eval("max", &[Scalar::I64(3).into(), Scalar::I64(9).into()]),
            Scalar::I64(9).into()
        );
    }

    #[test]
    fn clamp_bounds() {
        assert_eq!(
            eval(
                "clamp",
                &[
                    Scalar::F64(15.0).into(),
                    Scalar::F64(0.0).into(),
                    Scalar::F64(10.0).into()
                ]
            ),
            Scalar::F64(10.0).into()
        );
    }

    #[test]
    fn fit_remaps_range() {
        assert_eq!(
            eval(
                "fit",
                &[
                    Scalar::F64(5.0).into(),
                    Scalar::F64(0.0).into(),
                    Scalar::F64(10.0).into(),
                    Scalar::F64(0.0).into(),
                    Scalar::F64(1.0).into()
                ]
            ),
            Scalar::F64(0.5).into()
        );
    }

    #[test]
    fn lerp_midpoint() {
        assert_eq!(
            eval(
                "lerp",
                &[
                    Scalar::F32(0.0).into(),
                    Scalar::F32(4.0).into(),
                    Scalar::F32(0.5).into()
                ]
            ),
            Scalar::F32(2.0).into()
        );
    }

    #[test]
    fn pow_integer_exponent() {
        assert_eq!(
            eval("pow", &[Scalar::F64(2.0).into(), Scalar::I32(10).into()]),
            Scalar::F64(1024.0).into()
        );
    }
}
