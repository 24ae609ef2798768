//! Point compute generator.
//!
//! Wraps the shared lowerer in the point-kernel entry function. The
//! executable invokes the kernel once per point with the point index,
//! the leaf-local data pointer, the attribute and group handle tables,
//! and the custom-data blob. Unlike the volume target, attribute
//! references lower to calls through typed external helpers whose native
//! implementations index the grid's own attribute storage; group
//! membership goes through the `ingroup`/`addtogroup`/`removefromgroup`
//! externals.

use voxl_ast::Tree;
use voxl_registry::{symbols, FunctionRegistry};
use voxl_types::AxType;

use crate::attrs::AttributeRegistry;
use crate::error::CodegenError;
use crate::generator::{ComputeGenerator, Target};
use crate::ir::{AbiParam, AbiType, Module};
use crate::typing::Resolution;

/// Name of the point kernel entry function.
pub const POINT_ENTRY: &str = "voxl.point.kernel";

/// Symbol of the typed attribute load helper for one attribute type.
pub fn attr_load_symbol(ty: AxType) -> String {
    format!("{}.{ty}", symbols::POINT_ATTR_LOAD)
}

/// Symbol of the typed attribute store helper for one attribute type.
pub fn attr_store_symbol(ty: AxType) -> String {
    format!("{}.{ty}", symbols::POINT_ATTR_STORE)
}

/// Generates point kernels.
pub struct PointGenerator;

impl PointGenerator {
    /// Lower a type-resolved tree into a point kernel module.
    pub fn generate(
        tree: &Tree,
        attrs: &AttributeRegistry,
        registry: &FunctionRegistry,
        resolution: &Resolution,
    ) -> Result<Module, CodegenError> {
        let generator = ComputeGenerator::new(
            Target::Point,
            POINT_ENTRY,
            abi_params(),
            attrs,
            registry,
            resolution,
        );
        generator.generate(tree)
    }
}

fn abi_params() -> Vec<AbiParam> {
    vec![
        AbiParam {
            name: "point_index",
            ty: AbiType::U64,
        },
        AbiParam {
            name: "leaf_data",
            ty: AbiType::Ptr,
        },
        AbiParam {
            name: "attribute_handles",
            ty: AbiType::PtrArray,
        },
        AbiParam {
            name: "group_handles",
            ty: AbiType::PtrArray,
        },
        AbiParam {
            name: "custom_data",
            ty: AbiType::Ptr,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{verify, Instr};
    use crate::typing::{resolve_types, TypingOptions};
    use voxl_ast::parse;

    fn generate(src: &str) -> Module {
        let tree = parse(src).unwrap();
        let attrs = AttributeRegistry::scan(&tree).unwrap();
        let registry = FunctionRegistry::with_builtins();
        let resolution =
            resolve_types(&tree, &attrs, &registry, &TypingOptions::default()).unwrap();
        PointGenerator::generate(&tree, &attrs, &registry, &resolution).unwrap()
    }

    #[test]
    fn attribute_access_goes_through_externals() {
        let module = generate("v@P += {0.0f, 1.0f, 0.0f};");
        let load = attr_load_symbol(AxType::VEC3F);
        let store = attr_store_symbol(AxType::VEC3F);
        assert!(module.externals.iter().any(|e| e.symbol == load));
        assert!(module.externals.iter().any(|e| e.symbol == store));
        let function = module.function(POINT_ENTRY).unwrap();
        assert!(!function
            .blocks
            .iter()
            .flat_map(|b| b.instrs.iter())
            .any(|i| matches!(i, Instr::LoadAttr { .. } | Instr::StoreAttr { .. })));
    }

    #[test]
    fn group_membership_uses_the_group_externals() {
        let module = generate("if (ingroup(\"hot\")) addtogroup(\"cold\");");
        assert!(module
            .externals
            .iter()
            .any(|e| e.symbol == symbols::IN_GROUP));
        assert!(module
            .externals
            .iter()
            .any(|e| e.symbol == symbols::ADD_TO_GROUP));
        verify(&module, &FunctionRegistry::with_builtins()).unwrap();
    }

    #[test]
    fn entry_function_shape() {
        let module = generate("@a = 1.0f;");
        let function = module.function(POINT_ENTRY).unwrap();
        assert_eq!(function.params.len(), 5);
        assert_eq!(function.params[0].name, "point_index");
        verify(&module, &FunctionRegistry::with_builtins()).unwrap();
    }

    #[test]
    fn typed_helpers_are_per_type() {
        let module = generate("i@id = 1; @w = 2.0f;");
        assert!(module
            .externals
            .iter()
            .any(|e| e.symbol == attr_store_symbol(AxType::Scalar(voxl_types::ScalarType::I32))));
        assert!(module
            .externals
            .iter()
            .any(|e| e.symbol == attr_store_symbol(AxType::Scalar(voxl_types::ScalarType::F32))));
    }
}
