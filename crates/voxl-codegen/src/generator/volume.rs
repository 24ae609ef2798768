//! Volume compute generator.
//!
//! Wraps the shared lowerer in the voxel-kernel entry function. The
//! executable invokes the kernel once per active voxel with the voxel
//! coordinate, the grid transform, a pointer table with one entry per
//! registered attribute, the leaf's active mask, and the custom-data
//! blob. Attribute references lower to direct loads/stores against the
//! pre-fetched per-leaf buffers.

use voxl_ast::Tree;
use voxl_registry::FunctionRegistry;

use crate::attrs::AttributeRegistry;
use crate::error::CodegenError;
use crate::generator::{ComputeGenerator, Target};
use crate::ir::{AbiParam, AbiType, Module};
use crate::typing::Resolution;

/// Name of the volume kernel entry function.
pub const VOLUME_ENTRY: &str = "voxl.volume.kernel";

/// Generates voxel kernels.
pub struct VolumeGenerator;

impl VolumeGenerator {
    /// Lower a type-resolved tree into a volume kernel module.
    pub fn generate(
        tree: &Tree,
        attrs: &AttributeRegistry,
        registry: &FunctionRegistry,
        resolution: &Resolution,
    ) -> Result<Module, CodegenError> {
        let generator = ComputeGenerator::new(
            Target::Volume,
            VOLUME_ENTRY,
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
            name: "coord",
            ty: AbiType::Vec3I,
        },
        AbiParam {
            name: "transform",
            ty: AbiType::Ptr,
        },
        AbiParam {
            name: "attributes",
            ty: AbiType::PtrArray,
        },
        AbiParam {
            name: "active_mask",
            ty: AbiType::Ptr,
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
        VolumeGenerator::generate(&tree, &attrs, &registry, &resolution).unwrap()
    }

    fn all_instrs(module: &Module) -> Vec<&Instr> {
        module.functions[0]
            .blocks
            .iter()
            .flat_map(|b| b.instrs.iter())
            .collect()
    }

    #[test]
    fn attribute_access_is_direct() {
        let module = generate("@density = @density + 1.0f;");
        let instrs = all_instrs(&module);
        assert!(instrs.iter().any(|i| matches!(i, Instr::LoadAttr { .. })));
        assert!(instrs.iter().any(|i| matches!(i, Instr::StoreAttr { .. })));
        assert!(module.externals.is_empty());
    }

    #[test]
    fn entry_function_shape() {
        let module = generate("@a = 1.0f;");
        let function = module.function(VOLUME_ENTRY).unwrap();
        assert_eq!(function.params.len(), 5);
        assert_eq!(function.params[0].name, "coord");
        verify(&module, &FunctionRegistry::with_builtins()).unwrap();
    }

    #[test]
    fn control_flow_verifies() {
        let module = generate(
            "int n = 0; for (int i = 0; i < 8; ++i) { if (@a > 0.5f) continue; n += 1; } i@out = n;",
        );
        verify(&module, &FunctionRegistry::with_builtins()).unwrap();
    }

    #[test]
    fn coordinate_helpers_become_externals() {
        let module = generate("i@x = getcoordx();");
        assert!(module
            .externals
            .iter()
            .any(|e| e.symbol == voxl_registry::symbols::COORD_X));
    }

    #[test]
    fn string_attributes_are_rejected() {
        let tree = parse("s@name;").unwrap();
        let attrs = AttributeRegistry::scan(&tree).unwrap();
        let registry = FunctionRegistry::with_builtins();
        let resolution =
            resolve_types(&tree, &attrs, &registry, &TypingOptions::default()).unwrap();
        let err = VolumeGenerator::generate(&tree, &attrs, &registry, &resolution).unwrap_err();
        assert!(err.message.contains("string attribute"));
    }
}
