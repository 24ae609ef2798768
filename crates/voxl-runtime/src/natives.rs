//! Native implementations of the external helpers.
//!
//! [`resolver`] is the symbol lookup callback handed to the engine when
//! an executable links its module. Every symbol the registry (or the
//! point generator) can declare resolves here; implementations dispatch
//! through the [`KernelContext`] the executable supplies per element.

use voxl_engine::{KernelContext, NativeFn};
use voxl_registry::symbols;
use voxl_types::{arithmetic_cast, array_cast, ArrayValue, Scalar, ScalarType, Value};

/// Resolve an external symbol to its native implementation.
pub fn resolver(symbol: &str) -> Option<NativeFn> {
    if symbol.starts_with(symbols::POINT_ATTR_LOAD) {
        return Some(point_attr_load);
    }
    if symbol.starts_with(symbols::POINT_ATTR_STORE) {
        return Some(point_attr_store);
    }
    match symbol {
        symbols::COORD => Some(coord),
        symbols::COORD_X => Some(coord_x),
        symbols::COORD_Y => Some(coord_y),
        symbols::COORD_Z => Some(coord_z),
        symbols::VOXEL_WS => Some(voxel_ws),
        symbols::INDEX_TO_WORLD => Some(index_to_world),
        symbols::WORLD_TO_INDEX => Some(world_to_index),
        symbols::IN_GROUP => Some(in_group),
        symbols::ADD_TO_GROUP => Some(add_to_group),
        symbols::REMOVE_FROM_GROUP => Some(remove_from_group),
        symbols::LOOKUP_F => Some(lookup_f),
        symbols::LOOKUP_I => Some(lookup_i),
        symbols::LOOKUP_VEC => Some(lookup_vec),
        symbols::RAND => Some(rand),
        _ => None,
    }
}

fn vec3i_value(v: [i32; 3]) -> Value {
    Value::Array(ArrayValue::new(
        ScalarType::I32,
        v.iter().map(|&x| Scalar::I32(x)).collect(),
    ))
}

fn vec3d_value(v: [f64; 3]) -> Value {
    Value::Array(ArrayValue::new(
        ScalarType::F64,
        v.iter().map(|&x| Scalar::F64(x)).collect(),
    ))
}

fn vec3_f64(value: &Value) -> [f64; 3] {
    match value.as_array() {
        Some(a) if a.len() == 3 => [a.get(0).as_f64(), a.get(1).as_f64(), a.get(2).as_f64()],
        _ => [0.0; 3],
    }
}

fn str_arg<'a>(args: &'a [Value], index: usize) -> &'a str {
    args[index].as_str().unwrap_or("")
}

fn coord(ctx: &mut dyn KernelContext, _args: &[Value]) -> Option<Value> {
    Some(vec3i_value(ctx.coord()))
}

fn coord_x(ctx: &mut dyn KernelContext, _args: &[Value]) -> Option<Value> {
    Some(Value::Scalar(Scalar::I32(ctx.coord()[0])))
}

fn coord_y(ctx: &mut dyn KernelContext, _args: &[Value]) -> Option<Value> {
    Some(Value::Scalar(Scalar::I32(ctx.coord()[1])))
}

fn coord_z(ctx: &mut dyn KernelContext, _args: &[Value]) -> Option<Value> {
    Some(Value::Scalar(Scalar::I32(ctx.coord()[2])))
}

fn voxel_ws(ctx: &mut dyn KernelContext, _args: &[Value]) -> Option<Value> {
    let c = ctx.coord();
    let world = ctx.index_to_world([c[0] as f64, c[1] as f64, c[2] as f64]);
    Some(vec3d_value(world))
}

fn index_to_world(ctx: &mut dyn KernelContext, args: &[Value]) -> Option<Value> {
    Some(vec3d_value(ctx.index_to_world(vec3_f64(&args[0]))))
}

fn world_to_index(ctx: &mut dyn KernelContext, args: &[Value]) -> Option<Value> {
    Some(vec3i_value(ctx.world_to_index(vec3_f64(&args[0]))))
}

fn in_group(ctx: &mut dyn KernelContext, args: &[Value]) -> Option<Value> {
    Some(Value::Scalar(Scalar::Bool(ctx.in_group(str_arg(args, 0)))))
}

fn add_to_group(ctx: &mut dyn KernelContext, args: &[Value]) -> Option<Value> {
    ctx.add_to_group(str_arg(args, 0));
    None
}

fn remove_from_group(ctx: &mut dyn KernelContext, args: &[Value]) -> Option<Value> {
    ctx.remove_from_group(str_arg(args, 0));
    None
}

// Custom-data lookups return the zero of their type when the entry is
// missing or of the wrong shape.
fn lookup_scalar(ctx: &mut dyn KernelContext, args: &[Value], ty: ScalarType) -> Value {
    match ctx.custom(str_arg(args, 0)) {
        Some(Value::Scalar(s)) => Value::Scalar(arithmetic_cast(s, ty)),
        _ => Value::Scalar(Scalar::zero(ty)),
    }
}

fn lookup_f(ctx: &mut dyn KernelContext, args: &[Value]) -> Option<Value> {
    Some(lookup_scalar(ctx, args, ScalarType::F32))
}

fn lookup_i(ctx: &mut dyn KernelContext, args: &[Value]) -> Option<Value> {
    Some(lookup_scalar(ctx, args, ScalarType::I32))
}

fn lookup_vec(ctx: &mut dyn KernelContext, args: &[Value]) -> Option<Value> {
    match ctx.custom(str_arg(args, 0)) {
        Some(Value::Array(a)) if a.len() == 3 => {
            Some(Value::Array(array_cast(a, ScalarType::F32)))
        }
        _ => Some(Value::Array(ArrayValue::zero(ScalarType::F32, 3))),
    }
}

fn rand(ctx: &mut dyn KernelContext, _args: &[Value]) -> Option<Value> {
    Some(Value::Scalar(Scalar::F64(ctx.next_rand())))
}

fn point_attr_load(ctx: &mut dyn KernelContext, args: &[Value]) -> Option<Value> {
    let index = args[0].as_scalar().map(|s| s.as_i64()).unwrap_or(0) as usize;
    Some(ctx.attr_load(index))
}

fn point_attr_store(ctx: &mut dyn KernelContext, args: &[Value]) -> Option<Value> {
    let index = args[0].as_scalar().map(|s| s.as_i64()).unwrap_or(0) as usize;
    ctx.attr_store(index, args[1].clone());
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_every_registry_symbol() {
        for symbol in [
            symbols::COORD,
            symbols::COORD_X,
            symbols::COORD_Y,
            symbols::COORD_Z,
            symbols::VOXEL_WS,
            symbols::INDEX_TO_WORLD,
            symbols::WORLD_TO_INDEX,
            symbols::IN_GROUP,
            symbols::ADD_TO_GROUP,
            symbols::REMOVE_FROM_GROUP,
            symbols::LOOKUP_F,
            symbols::LOOKUP_I,
            symbols::LOOKUP_VEC,
            symbols::RAND,
        ] {
            assert!(resolver(symbol).is_some(), "unresolved {symbol}");
        }
    }

    #[test]
    fn resolves_typed_point_helpers() {
        assert!(resolver("vx.point.attr.load.float").is_some());
        assert!(resolver("vx.point.attr.store.vec3f").is_some());
        assert!(resolver("vx.no.such").is_none());
    }
}
