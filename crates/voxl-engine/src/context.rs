//! Kernel execution context.
//!
//! The [`KernelContext`] trait is how a running kernel reaches the data
//! the entry-function ABI describes: the current element (voxel
//! coordinate or point index), the grid transform, the attribute
//! bindings, group membership, and the custom-data blob. The executable
//! layer provides one implementation per target; external helpers and
//! the attribute instructions dispatch through it.

use voxl_types::Value;

/// Per-element execution context supplied by the executable.
pub trait KernelContext {
    /// Current voxel coordinate. Point contexts report the origin of the
    /// owning leaf.
    fn coord(&self) -> [i32; 3];

    /// A stable identifier of the current element, used to seed the
    /// seedless `rand()`.
    fn element_id(&self) -> u64;

    /// Load the current element's value of the attribute at `index` in
    /// the registry's registration order.
    fn attr_load(&mut self, index: usize) -> Value;

    /// Store the current element's value of the attribute at `index`.
    fn attr_store(&mut self, index: usize, value: Value);

    /// Index-space to world-space transform.
    fn index_to_world(&self, index: [f64; 3]) -> [f64; 3];

    /// World-space to index-space transform, rounded to the nearest
    /// voxel.
    fn world_to_index(&self, world: [f64; 3]) -> [i32; 3];

    /// Custom-data lookup by name.
    fn custom(&self, name: &str) -> Option<Value>;

    /// Next value of the element's deterministic random stream, uniform
    /// in `[0, 1)`. The default is stable per element; executables
    /// override it with an advancing per-element stream.
    fn next_rand(&mut self) -> f64 {
        voxl_registry::uniform_01(voxl_registry::splitmix_mix(self.element_id()))
    }

    /// Point-only: group membership of the current point. Volume
    /// contexts report false.
    fn in_group(&self, _name: &str) -> bool {
        false
    }

    /// Point-only: add the current point to a group, creating it in the
    /// leaf-local pending set if needed. No-op on volume contexts.
    fn add_to_group(&mut self, _name: &str) {}

    /// Point-only: remove the current point from a group. No-op on
    /// volume contexts.
    fn remove_from_group(&mut self, _name: &str) {}
}

/// Native implementation of an external helper.
///
/// Resolved by symbol name when a module is added to the engine; invoked
/// with the per-element context and the already-evaluated arguments.
/// Returns `None` only for void helpers.
pub type NativeFn = fn(&mut dyn KernelContext, &[Value]) -> Option<Value>;

/// Host-supplied symbol lookup callback.
pub type SymbolResolver<'a> = dyn Fn(&str) -> Option<NativeFn> + 'a;
