//! The function registry.
//!
//! Built once at startup and shared read-only behind an `Arc` for the
//! lifetime of the process. Iteration order is declaration order.

use indexmap::IndexMap;

use crate::builtins;
use crate::overload::{self, OverloadError};
use crate::signature::{FunctionGroup, FunctionSignature};
use voxl_types::AxType;

/// Catalogue of built-in function groups, keyed by name.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    groups: IndexMap<&'static str, FunctionGroup>,
}

impl FunctionRegistry {
    /// An empty registry. Mostly useful in tests.
    pub fn empty() -> FunctionRegistry {
        FunctionRegistry::default()
    }

    /// The full built-in catalogue.
    pub fn with_builtins() -> FunctionRegistry {
        let mut registry = FunctionRegistry::empty();
        builtins::math::register(&mut registry);
        builtins::vector::register(&mut registry);
        builtins::matrix::register(&mut registry);
        builtins::rng::register(&mut registry);
        builtins::externals::register(&mut registry);
        registry
    }

    /// Add a group. Replaces any previous group of the same name.
    pub fn insert(&mut self, group: FunctionGroup) {
        self.groups.insert(group.name, group);
    }

    /// Look up a group by name.
    pub fn get(&self, name: &str) -> Option<&FunctionGroup> {
        self.groups.get(name)
    }

    /// True if `name` is a known built-in.
    pub fn is_known(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// All group names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.groups.keys().copied()
    }

    /// Resolve a call site: overload selection over the named group.
    ///
    /// # Errors
    ///
    /// [`OverloadError::NotFound`] if the name is unknown or no overload
    /// is viable; [`OverloadError::Ambiguous`] on a complete tie.
    pub fn select(
        &self,
        name: &str,
        args: &[AxType],
    ) -> Result<(usize, &FunctionSignature), OverloadError> {
        let group = self.get(name).ok_or_else(|| OverloadError::NotFound {
            name: name.to_string(),
            args: args
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })?;
        overload::select(group, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxl_types::ScalarType;

    #[test]
    fn builtins_are_registered() {
        let registry = FunctionRegistry::with_builtins();
        for name in [
            "abs", "sqrt", "sin", "cos", "pow", "min", "max", "clamp", "fit", "lerp",
            "length", "normalize", "dot", "cross", "identity4", "mmult", "transpose",
            "transform", "rand", "ingroup", "addtogroup", "removefromgroup", "getcoord",
            "getcoordx", "getvoxelpws", "indextoworld", "worldtoindex", "lookupf",
            "lookupi", "lookupvec",
        ] {
            assert!(registry.is_known(name), "missing builtin {name}");
        }
    }

    #[test]
    fn unknown_function_is_a_lookup_error(){
        let registry = FunctionRegistry::with_builtins();
        assert!(registry
            .select("nosuchfn", &[AxType::Scalar(ScalarType::F32)])
            .is_err());
    }

    #[test]
    fn names_iterate_in_declaration_order() {
        let registry = FunctionRegistry::with_builtins();
        let names: Vec<_> = registry.names().collect();
        let abs = names.iter().position(|&n| n == "abs").unwrap();
        let ingroup = names.iter().position(|&n| n == "ingroup").unwrap();
        assert!(abs < ingroup);
    }
}
