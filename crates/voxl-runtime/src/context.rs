//! Per-element kernel contexts for the two targets.

use indexmap::IndexMap;
use voxl_engine::KernelContext;
use voxl_registry::{splitmix_mix, uniform_01};
use voxl_types::Value;

use crate::points::PointLeaf;
use crate::transform::Transform;
use crate::volume::VolumeLeaf;
use crate::CustomData;

const GOLDEN: u64 = 0x9E37_79B9_7F4A_7C15;

/// Advancing per-element random stream (SplitMix64).
pub(crate) struct RandStream {
    state: u64,
}

impl RandStream {
    pub(crate) fn new(seed: u64) -> RandStream {
        RandStream {
            state: splitmix_mix(seed),
        }
    }

    fn next(&mut self) -> f64 {
        self.state = self.state.wrapping_add(GOLDEN);
        uniform_01(splitmix_mix(self.state))
    }
}

/// Stable element id of a voxel coordinate.
pub(crate) fn coord_id(coord: [i32; 3]) -> u64 {
    let mut id = splitmix_mix(coord[0] as u32 as u64);
    id = splitmix_mix(id ^ coord[1] as u32 as u64);
    splitmix_mix(id ^ coord[2] as u32 as u64)
}

/// Context of one voxel invocation. Holds the per-leaf buffer bundle
/// (one leaf per attribute, registration order) and the current offset.
pub(crate) struct VolumeContext<'a, 'b> {
    pub coord: [i32; 3],
    pub offset: usize,
    pub transform: &'a Transform,
    pub attrs: &'a mut [&'b mut VolumeLeaf],
    pub custom: &'a CustomData,
    pub rng: RandStream,
}

impl KernelContext for VolumeContext<'_, '_> {
    fn coord(&self) -> [i32; 3] {
        self.coord
    }

    fn element_id(&self) -> u64 {
        coord_id(self.coord)
    }

    fn attr_load(&mut self, index: usize) -> Value {
        self.attrs[index].value(self.offset).clone()
    }

    fn attr_store(&mut self, index: usize, value: Value) {
        self.attrs[index].set_value(self.offset, value);
    }

    fn index_to_world(&self, index: [f64; 3]) -> [f64; 3] {
        self.transform.index_to_world(index)
    }

    fn world_to_index(&self, world: [f64; 3]) -> [i32; 3] {
        self.transform.world_to_index(world)
    }

    fn custom(&self, name: &str) -> Option<Value> {
        self.custom.get(name).cloned()
    }

    fn next_rand(&mut self) -> f64 {
        self.rng.next()
    }
}

/// Context of one point invocation. Attribute indices map through
/// `attr_slots` into the leaf's attribute table; group creation goes to
/// the leaf-local `pending` set, merged after the parallel pass.
pub(crate) struct PointContext<'a> {
    pub point: usize,
    pub element_id: u64,
    pub leaf: &'a mut PointLeaf,
    pub attr_slots: &'a [usize],
    pub pending: &'a mut IndexMap<String, Vec<u64>>,
    pub transform: &'a Transform,
    pub custom: &'a CustomData,
    pub rng: RandStream,
}

impl PointContext<'_> {
    fn pending_bit(&self, name: &str) -> bool {
        match self.pending.get(name) {
            Some(bits) => bits[self.point >> 6] & (1u64 << (self.point & 63)) != 0,
            None => false,
        }
    }
}

impl KernelContext for PointContext<'_> {
    fn coord(&self) -> [i32; 3] {
        self.leaf.origin
    }

    fn element_id(&self) -> u64 {
        self.element_id
    }

    fn attr_load(&mut self, index: usize) -> Value {
        self.leaf.value(self.attr_slots[index], self.point).clone()
    }

    fn attr_store(&mut self, index: usize, value: Value) {
        self.leaf.set_value(self.attr_slots[index], self.point, value);
    }

    fn index_to_world(&self, index: [f64; 3]) -> [f64; 3] {
        self.transform.index_to_world(index)
    }

    fn world_to_index(&self, world: [f64; 3]) -> [i32; 3] {
        self.transform.world_to_index(world)
    }

    fn custom(&self, name: &str) -> Option<Value> {
        self.custom.get(name).cloned()
    }

    fn next_rand(&mut self) -> f64 {
        self.rng.next()
    }

    fn in_group(&self, name: &str) -> bool {
        self.leaf.in_group(name, self.point) || self.pending_bit(name)
    }

    fn add_to_group(&mut self, name: &str) {
        if self.leaf.has_group(name) {
            self.leaf.set_group(name, self.point, true);
        } else {
            let words = crate::points::bitset_words(self.leaf.count());
            let bits = self
                .pending
                .entry(name.to_string())
                .or_insert_with(|| vec![0; words]);
            bits[self.point >> 6] |= 1u64 << (self.point & 63);
        }
    }

    fn remove_from_group(&mut self, name: &str) {
        self.leaf.set_group(name, self.point, false);
        if let Some(bits) = self.pending.get_mut(name) {
            bits[self.point >> 6] &= !(1u64 << (self.point & 63));
        }
    }
}
