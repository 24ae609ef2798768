//! Point-data grids.
//!
//! A [`PointGrid`] stores points bucketed into leaves. Each leaf holds
//! typed per-point attribute arrays and per-group membership bitsets; a
//! grid-level descriptor fixes the attribute and group sets shared by
//! every leaf. New groups created inside a kernel pass are accumulated
//! per leaf and merged into the descriptor after the parallel pass.

use indexmap::{IndexMap, IndexSet};
use voxl_types::{AxType, Value};

use crate::transform::Transform;
use crate::volume::LeafOrigin;

/// Grid-level attribute and group layout.
#[derive(Debug, Clone, Default)]
pub struct Descriptor {
    attributes: IndexMap<String, AxType>,
    groups: IndexSet<String>,
}

impl Descriptor {
    /// Registered attributes in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = (&String, &AxType)> {
        self.attributes.iter()
    }

    /// Type of an attribute.
    pub fn attribute_type(&self, name: &str) -> Option<AxType> {
        self.attributes.get(name).copied()
    }

    /// Declaration index of an attribute.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.attributes.get_index_of(name)
    }

    /// Registered group names.
    pub fn groups(&self) -> impl Iterator<Item = &String> {
        self.groups.iter()
    }

    /// True if the group exists.
    pub fn has_group(&self, name: &str) -> bool {
        self.groups.contains(name)
    }
}

/// One leaf of points.
#[derive(Debug, Clone)]
pub struct PointLeaf {
    /// Index-space origin of the leaf's bucket.
    pub origin: LeafOrigin,
    count: usize,
    attributes: IndexMap<String, Vec<Value>>,
    groups: IndexMap<String, Vec<u64>>,
}

impl PointLeaf {
    /// Number of points in the leaf.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Per-point values of an attribute.
    pub fn attribute(&self, name: &str) -> Option<&[Value]> {
        self.attributes.get(name).map(|v| v.as_slice())
    }

    /// One point's value of an attribute by attribute index.
    pub fn value(&self, attr: usize, point: usize) -> &Value {
        &self.attributes[attr][point]
    }

    /// Overwrite one point's value of an attribute by attribute index.
    pub fn set_value(&mut self, attr: usize, point: usize, value: Value) {
        self.attributes[attr][point] = value;
    }

    /// True if the leaf carries a bitset for the group.
    pub fn has_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Membership of a point in a group.
    pub fn in_group(&self, name: &str, point: usize) -> bool {
        match self.groups.get(name) {
            Some(bits) => bits[point >> 6] & (1u64 << (point & 63)) != 0,
            None => false,
        }
    }

    /// Set or clear a point's membership in an existing group.
    pub fn set_group(&mut self, name: &str, point: usize, member: bool) {
        if let Some(bits) = self.groups.get_mut(name) {
            if member {
                bits[point >> 6] |= 1u64 << (point & 63);
            } else {
                bits[point >> 6] &= !(1u64 << (point & 63));
            }
        }
    }

    /// Merge a pending membership bitset into a group, creating it if
    /// missing.
    pub fn merge_group(&mut self, name: &str, bits: &[u64]) {
        let words = bitset_words(self.count);
        let entry = self
            .groups
            .entry(name.to_string())
            .or_insert_with(|| vec![0; words]);
        for (word, b) in entry.iter_mut().zip(bits) {
            *word |= b;
        }
    }
}

/// Words needed for a bitset over `count` points.
pub fn bitset_words(count: usize) -> usize {
    count.div_ceil(64)
}

/// A grid of points with typed per-point attributes.
#[derive(Debug, Clone)]
pub struct PointGrid {
    /// Index-to-world transform.
    pub transform: Transform,
    descriptor: Descriptor,
    leaves: Vec<PointLeaf>,
}

impl PointGrid {
    /// An empty grid. The position attribute `P` is registered up front.
    pub fn new(transform: Transform) -> PointGrid {
        let mut descriptor = Descriptor::default();
        descriptor.attributes.insert("P".to_string(), AxType::VEC3F);
        PointGrid {
            transform,
            descriptor,
            leaves: Vec::new(),
        }
    }

    /// The grid-level layout.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Append a leaf holding the given point positions.
    pub fn add_leaf(&mut self, origin: LeafOrigin, positions: Vec<Value>) {
        let count = positions.len();
        let mut attributes = IndexMap::new();
        for (name, ty) in &self.descriptor.attributes {
            let values = if name == "P" {
                debug_assert!(positions.iter().all(|p| p.ty() == AxType::VEC3F));
                positions.clone()
            } else {
                vec![Value::zero(*ty); count]
            };
            attributes.insert(name.clone(), values);
        }
        let groups = self
            .descriptor
            .groups
            .iter()
            .map(|name| (name.clone(), vec![0u64; bitset_words(count)]))
            .collect();
        self.leaves.push(PointLeaf {
            origin,
            count,
            attributes,
            groups,
        });
    }

    /// Register an attribute, zero-filling it on every leaf. Returns the
    /// existing type when already present.
    pub fn ensure_attribute(&mut self, name: &str, ty: AxType) -> AxType {
        if let Some(existing) = self.descriptor.attributes.get(name) {
            return *existing;
        }
        self.descriptor.attributes.insert(name.to_string(), ty);
        for leaf in &mut self.leaves {
            leaf.attributes
                .insert(name.to_string(), vec![Value::zero(ty); leaf.count]);
        }
        ty
    }

    /// Register a group, empty on every leaf.
    pub fn ensure_group(&mut self, name: &str) {
        if self.descriptor.groups.insert(name.to_string()) {
            for leaf in &mut self.leaves {
                leaf.groups
                    .insert(name.to_string(), vec![0u64; bitset_words(leaf.count)]);
            }
        }
    }

    /// Total point count.
    pub fn total_points(&self) -> usize {
        self.leaves.iter().map(PointLeaf::count).sum()
    }

    /// Leaves in insertion order.
    pub fn leaves(&self) -> &[PointLeaf] {
        &self.leaves
    }

    /// Leaves, mutably.
    pub fn leaves_mut(&mut self) -> &mut [PointLeaf] {
        &mut self.leaves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxl_types::{ArrayValue, Scalar, ScalarType};

    fn pos(x: f32, y: f32, z: f32) -> Value {
        Value::Array(ArrayValue::new(
            ScalarType::F32,
            vec![Scalar::F32(x), Scalar::F32(y), Scalar::F32(z)],
        ))
    }

    #[test]
    fn leaves_carry_positions() {
        let mut grid = PointGrid::new(Transform::default());
        grid.add_leaf([0, 0, 0], vec![pos(0.0, 0.0, 0.0), pos(1.0, 0.0, 0.0)]);
        assert_eq!(grid.total_points(), 2);
        let leaf = &grid.leaves()[0];
        assert_eq!(leaf.attribute("P").unwrap().len(), 2);
    }

    #[test]
    fn new_attributes_backfill_existing_leaves() {
        let mut grid = PointGrid::new(Transform::default());
        grid.add_leaf([0, 0, 0], vec![pos(0.0, 0.0, 0.0)]);
        grid.ensure_attribute("mass", AxType::Scalar(ScalarType::F32));
        let leaf = &grid.leaves()[0];
        assert_eq!(
            leaf.attribute("mass").unwrap()[0],
            Value::Scalar(Scalar::F32(0.0))
        );
    }

    #[test]
    fn groups_track_membership() {
        let mut grid = PointGrid::new(Transform::default());
        grid.add_leaf([0, 0, 0], vec![pos(0.0, 0.0, 0.0), pos(1.0, 0.0, 0.0)]);
        grid.ensure_group("hot");
        let leaf = &mut grid.leaves_mut()[0];
        leaf.set_group("hot", 1, true);
        assert!(!leaf.in_group("hot", 0));
        assert!(leaf.in_group("hot", 1));
        leaf.set_group("hot", 1, false);
        assert!(!leaf.in_group("hot", 1));
    }

    #[test]
    fn merge_creates_pending_groups() {
        let mut grid = PointGrid::new(Transform::default());
        grid.add_leaf([0, 0, 0], vec![pos(0.0, 0.0, 0.0)]);
        let leaf = &mut grid.leaves_mut()[0];
        leaf.merge_group("fresh", &[1]);
        assert!(leaf.in_group("fresh", 0));
    }
}
