//! Externally-linked runtime helpers.
//!
//! These builtins cannot be expressed as pure functions: they consult the
//! kernel context (voxel coordinate, grid transform, point group
//! membership, custom data). The registry only declares their signatures
//! and symbol names; the native implementations are registered by the
//! executable layer and resolved when the module is added to the engine.

use voxl_types::{AxType, ScalarType};

use crate::registry::FunctionRegistry;
use crate::signature::{FunctionGroup, FunctionSignature};

/// Symbol names shared between the registry, the code generator and the
/// runtime's native helper table.
pub mod symbols {
    /// Voxel coordinate as `vec3i`.
    pub const COORD: &str = "vx.coord";
    /// Voxel coordinate components.
    pub const COORD_X: &str = "vx.coord.x";
    /// See [`COORD_X`].
    pub const COORD_Y: &str = "vx.coord.y";
    /// See [`COORD_X`].
    pub const COORD_Z: &str = "vx.coord.z";
    /// World-space position of the current voxel centre.
    pub const VOXEL_WS: &str = "vx.coord.ws";
    /// Index-space to world-space conversion.
    pub const INDEX_TO_WORLD: &str = "vx.xform.index_to_world";
    /// World-space to index-space conversion.
    pub const WORLD_TO_INDEX: &str = "vx.xform.world_to_index";
    /// Point group membership test.
    pub const IN_GROUP: &str = "vx.group.in";
    /// Add the current point to a group.
    pub const ADD_TO_GROUP: &str = "vx.group.add";
    /// Remove the current point from a group.
    pub const REMOVE_FROM_GROUP: &str = "vx.group.remove";
    /// Custom-data accessors.
    pub const LOOKUP_F: &str = "vx.custom.f32";
    /// See [`LOOKUP_F`].
    pub const LOOKUP_I: &str = "vx.custom.i32";
    /// See [`LOOKUP_F`].
    pub const LOOKUP_VEC: &str = "vx.custom.vec3f";
    /// Element-seeded uniform random.
    pub const RAND: &str = "vx.rand";
    /// Prefix for typed point attribute loads emitted by the point
    /// generator; the attribute type name is appended.
    pub const POINT_ATTR_LOAD: &str = "vx.point.attr.load";
    /// Prefix for typed point attribute stores.
    pub const POINT_ATTR_STORE: &str = "vx.point.attr.store";
}

const I32: AxType = AxType::Scalar(ScalarType::I32);
const F32: AxType = AxType::Scalar(ScalarType::F32);
const BOOL: AxType = AxType::Scalar(ScalarType::Bool);

/// Register the external helper groups.
pub fn register(registry: &mut FunctionRegistry) {
    registry.insert(FunctionGroup::new(
        "getcoord",
        vec![FunctionSignature::external(Some(AxType::VEC3I), vec![], symbols::COORD).readonly()],
    ));
    registry.insert(FunctionGroup::new(
        "getcoordx",
        vec![FunctionSignature::external(Some(I32), vec![], symbols::COORD_X).readonly()],
    ));
    registry.insert(FunctionGroup::new(
        "getcoordy",
        vec![FunctionSignature::external(Some(I32), vec![], symbols::COORD_Y).readonly()],
    ));
    registry.insert(FunctionGroup::new(
        "getcoordz",
        vec![FunctionSignature::external(Some(I32), vec![], symbols::COORD_Z).readonly()],
    ));
    registry.insert(FunctionGroup::new(
        "getvoxelpws",
        vec![FunctionSignature::external(Some(AxType::VEC3D), vec![], symbols::VOXEL_WS)
            .readonly()],
    ));
    registry.insert(FunctionGroup::new(
        "indextoworld",
        vec![FunctionSignature::external(
            Some(AxType::VEC3D),
            vec![AxType::VEC3D],
            symbols::INDEX_TO_WORLD,
        )
        .readonly()],
    ));
    registry.insert(FunctionGroup::new(
        "worldtoindex",
        vec![FunctionSignature::external(
            Some(AxType::VEC3I),
            vec![AxType::VEC3D],
            symbols::WORLD_TO_INDEX,
        )
        .readonly()],
    ));

    registry.insert(FunctionGroup::new(
        "ingroup",
        vec![FunctionSignature::external(Some(BOOL), vec![AxType::Str], symbols::IN_GROUP)
            .readonly()],
    ));
    registry.insert(FunctionGroup::new(
        "addtogroup",
        vec![FunctionSignature::external(None, vec![AxType::Str], symbols::ADD_TO_GROUP)],
    ));
    registry.insert(FunctionGroup::new(
        "removefromgroup",
        vec![FunctionSignature::external(
            None,
            vec![AxType::Str],
            symbols::REMOVE_FROM_GROUP,
        )],
    ));

    registry.insert(FunctionGroup::new(
        "lookupf",
        vec![FunctionSignature::external(Some(F32), vec![AxType::Str], symbols::LOOKUP_F)
            .readonly()],
    ));
    registry.insert(FunctionGroup::new(
        "lookupi",
        vec![FunctionSignature::external(Some(I32), vec![AxType::Str], symbols::LOOKUP_I)
            .readonly()],
    ));
    registry.insert(FunctionGroup::new(
        "lookupvec",
        vec![FunctionSignature::external(
            Some(AxType::VEC3F),
            vec![AxType::Str],
            symbols::LOOKUP_VEC,
        )
        .readonly()],
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn externals_declare_symbols() {
        let mut registry = FunctionRegistry::empty();
        register(&mut registry);
        let (_, sig) = registry.select("ingroup", &[AxType::Str]).unwrap();
        assert_eq!(sig.symbol(), Some(symbols::IN_GROUP));
        assert_eq!(sig.ret, Some(BOOL));
        let (_, sig) = registry.select("addtogroup", &[AxType::Str]).unwrap();
        assert_eq!(sig.ret, None);
    }

    #[test]
    fn coordinate_helpers_are_zero_arity() {
        let mut registry = FunctionRegistry::empty();
        register(&mut registry);
        assert!(registry.select("getcoordx", &[]).is_ok());
        assert!(registry.select("getcoordx", &[I32]).is_err());
    }
}
