//! Sparse volume grids.
//!
//! A [`VolumeGrid`] is one named, typed value channel over a sparse
//! index space: an 8x8x8 leaf per occupied region, each leaf carrying a
//! 512-bit active mask and one value per voxel. Leaves are the unit of
//! parallelism during execution.

use indexmap::IndexMap;
use voxl_types::{AxType, Value};

use crate::transform::Transform;

/// Voxels per leaf edge.
pub const LEAF_DIM: i32 = 8;
/// Voxels per leaf.
pub const LEAF_VOXELS: usize = 512;

/// Index-space origin of a leaf, aligned to [`LEAF_DIM`].
pub type LeafOrigin = [i32; 3];

/// The leaf containing a coordinate.
pub fn leaf_origin(coord: [i32; 3]) -> LeafOrigin {
    [coord[0] & !7, coord[1] & !7, coord[2] & !7]
}

/// Linear offset of a coordinate within its leaf.
pub fn leaf_offset(coord: [i32; 3]) -> usize {
    let x = (coord[0] & 7) as usize;
    let y = (coord[1] & 7) as usize;
    let z = (coord[2] & 7) as usize;
    (x << 6) | (y << 3) | z
}

/// Coordinate of a leaf-local offset.
pub fn offset_coord(origin: LeafOrigin, offset: usize) -> [i32; 3] {
    [
        origin[0] + ((offset >> 6) & 7) as i32,
        origin[1] + ((offset >> 3) & 7) as i32,
        origin[2] + (offset & 7) as i32,
    ]
}

/// One leaf: a 512-bit value mask plus voxel values.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeLeaf {
    mask: [u64; 8],
    values: Vec<Value>,
}

impl VolumeLeaf {
    fn new(fill: &Value) -> VolumeLeaf {
        VolumeLeaf {
            mask: [0; 8],
            values: vec![fill.clone(); LEAF_VOXELS],
        }
    }

    /// The active mask words.
    pub fn mask(&self) -> &[u64; 8] {
        &self.mask
    }

    /// True if the voxel at `offset` is active.
    pub fn is_active(&self, offset: usize) -> bool {
        self.mask[offset >> 6] & (1u64 << (offset & 63)) != 0
    }

    /// Mark the voxel at `offset` active.
    pub fn set_active(&mut self, offset: usize) {
        self.mask[offset >> 6] |= 1u64 << (offset & 63);
    }

    /// Union another mask into this leaf's mask.
    pub fn union_mask(&mut self, other: &[u64; 8]) {
        for (word, o) in self.mask.iter_mut().zip(other) {
            *word |= o;
        }
    }

    /// Value at `offset`, active or not.
    pub fn value(&self, offset: usize) -> &Value {
        &self.values[offset]
    }

    /// Overwrite the value at `offset` and mark it active.
    pub fn set_value(&mut self, offset: usize, value: Value) {
        self.values[offset] = value;
        self.set_active(offset);
    }

    /// Number of active voxels.
    pub fn active_count(&self) -> usize {
        self.mask.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Iterate active offsets in ascending order.
    pub fn active_offsets(&self) -> impl Iterator<Item = usize> + '_ {
        (0..LEAF_VOXELS).filter(|&offset| self.is_active(offset))
    }
}

/// A named, typed sparse value channel.
#[derive(Debug, Clone)]
pub struct VolumeGrid {
    /// Grid (attribute) name.
    pub name: String,
    /// Value type of every voxel.
    pub ty: AxType,
    /// Index-to-world transform.
    pub transform: Transform,
    background: Value,
    leaves: IndexMap<LeafOrigin, VolumeLeaf>,
}

impl VolumeGrid {
    /// An empty grid with the zero background of its type.
    pub fn new(name: impl Into<String>, ty: AxType, transform: Transform) -> VolumeGrid {
        VolumeGrid {
            name: name.into(),
            ty,
            transform,
            background: Value::zero(ty),
            leaves: IndexMap::new(),
        }
    }

    /// The inactive-voxel value.
    pub fn background(&self) -> &Value {
        &self.background
    }

    /// Activate a voxel and set its value.
    pub fn set_voxel(&mut self, coord: [i32; 3], value: Value) {
        debug_assert_eq!(value.ty(), self.ty, "voxel value type matches the grid");
        let origin = leaf_origin(coord);
        let offset = leaf_offset(coord);
        let background = self.background.clone();
        let leaf = self
            .leaves
            .entry(origin)
            .or_insert_with(|| VolumeLeaf::new(&background));
        leaf.set_value(offset, value);
    }

    /// Value of an active voxel.
    pub fn voxel(&self, coord: [i32; 3]) -> Option<&Value> {
        let leaf = self.leaves.get(&leaf_origin(coord))?;
        let offset = leaf_offset(coord);
        leaf.is_active(offset).then(|| leaf.value(offset))
    }

    /// True if the voxel is active.
    pub fn is_active(&self, coord: [i32; 3]) -> bool {
        self.voxel(coord).is_some()
    }

    /// Total active voxels.
    pub fn active_count(&self) -> usize {
        self.leaves.values().map(VolumeLeaf::active_count).sum()
    }

    /// Make sure a leaf exists at `origin`, filled with background.
    pub fn ensure_leaf(&mut self, origin: LeafOrigin) -> &mut VolumeLeaf {
        let background = self.background.clone();
        self.leaves
            .entry(origin)
            .or_insert_with(|| VolumeLeaf::new(&background))
    }

    /// Leaf at `origin`, if present.
    pub fn leaf(&self, origin: LeafOrigin) -> Option<&VolumeLeaf> {
        self.leaves.get(&origin)
    }

    /// Iterate leaves in insertion order.
    pub fn leaves(&self) -> impl Iterator<Item = (&LeafOrigin, &VolumeLeaf)> {
        self.leaves.iter()
    }

    /// Iterate leaves mutably.
    pub fn leaves_mut(&mut self) -> impl Iterator<Item = (&LeafOrigin, &mut VolumeLeaf)> {
        self.leaves.iter_mut()
    }

    /// Iterate active voxels as `(coord, value)`.
    pub fn iter_active(&self) -> impl Iterator<Item = ([i32; 3], &Value)> {
        self.leaves.iter().flat_map(|(origin, leaf)| {
            leaf.active_offsets()
                .map(move |offset| (offset_coord(*origin, offset), leaf.value(offset)))
        })
    }
}
