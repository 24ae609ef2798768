//! Kernel executables.
//!
//! An executable binds a linked module to its attribute registry and
//! custom data, and owns the per-leaf parallel execution pass. The
//! executable holds grid *metadata* only; grids are passed in at
//! execute time.
//!
//! # Parallelism
//!
//! Leaves are the unit of parallelism: each rayon task processes one
//! leaf to completion, with exclusive mutable access to that leaf's
//! storage across every bound grid. There is no cross-leaf sharing
//! inside a pass. Point kernels accumulate leaf-local data (newly
//! created groups) into per-task structures that are merged serially
//! after the parallel pass.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::debug;

use voxl_codegen::{AttributeRegistry, POINT_ENTRY, VOLUME_ENTRY};
use voxl_engine::LinkedModule;
use voxl_types::Value;

use crate::context::{coord_id, PointContext, RandStream, VolumeContext};
use crate::error::RuntimeError;
use crate::points::PointGrid;
use crate::volume::{offset_coord, LeafOrigin, VolumeGrid, VolumeLeaf, LEAF_VOXELS};

/// Opaque key/value blob exposed to kernels through the `lookup*`
/// externals.
pub type CustomData = IndexMap<String, Value>;

fn mask_offsets(mask: [u64; 8]) -> impl Iterator<Item = usize> {
    (0..LEAF_VOXELS).filter(move |&offset| mask[offset >> 6] & (1u64 << (offset & 63)) != 0)
}

/// A compiled voxel kernel bound to its attribute registry.
#[derive(Debug)]
pub struct VolumeExecutable {
    linked: Arc<LinkedModule>,
    attrs: AttributeRegistry,
    custom: CustomData,
}

impl VolumeExecutable {
    /// Wrap a linked module and its registries.
    pub fn new(
        linked: Arc<LinkedModule>,
        attrs: AttributeRegistry,
        custom: CustomData,
    ) -> VolumeExecutable {
        VolumeExecutable {
            linked,
            attrs,
            custom,
        }
    }

    /// The attributes the kernel references.
    pub fn attributes(&self) -> &AttributeRegistry {
        &self.attrs
    }

    /// Run the kernel over every active voxel of the dominant topology.
    ///
    /// Missing attribute grids are created with the registered type and
    /// zero background. The dominant topology is the union of the
    /// read-attribute grids' value masks (all attribute grids when the
    /// kernel only writes); other bound grids have matching leaves
    /// materialised before the parallel pass.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::Attribute`] when an existing grid's type differs
    /// from the registered one; [`RuntimeError::Exec`] when a kernel
    /// invocation traps.
    pub fn execute(&self, grids: &mut Vec<VolumeGrid>) -> Result<(), RuntimeError> {
        if self.attrs.is_empty() {
            return Ok(());
        }
        let default_transform = grids
            .first()
            .map(|g| g.transform)
            .unwrap_or_default();

        // Bind or create one grid per registered attribute.
        let mut grid_indices = Vec::with_capacity(self.attrs.len());
        for entry in self.attrs.iter() {
            match grids.iter().position(|g| g.name == entry.name) {
                Some(index) => {
                    if grids[index].ty != entry.ty {
                        return Err(RuntimeError::Attribute {
                            name: entry.name.clone(),
                            expected: entry.ty.to_string(),
                            found: grids[index].ty.to_string(),
                        });
                    }
                    grid_indices.push(index);
                }
                None => {
                    grids.push(VolumeGrid::new(&entry.name, entry.ty, default_transform));
                    grid_indices.push(grids.len() - 1);
                }
            }
        }

        // Dominant topology.
        let read_attrs: Vec<usize> = {
            let reads: Vec<usize> = self
                .attrs
                .iter()
                .enumerate()
                .filter(|(_, e)| !matches!(e.access, voxl_codegen::Access::Write))
                .map(|(i, _)| i)
                .collect();
            if reads.is_empty() {
                (0..self.attrs.len()).collect()
            } else {
                reads
            }
        };
        let mut topology: IndexMap<LeafOrigin, [u64; 8]> = IndexMap::new();
        for &ai in &read_attrs {
            for (origin, leaf) in grids[grid_indices[ai]].leaves() {
                let mask = topology.entry(*origin).or_insert([0; 8]);
                for (word, other) in mask.iter_mut().zip(leaf.mask()) {
                    *word |= other;
                }
            }
        }
        if topology.is_empty() {
            return Ok(());
        }
        let transform = grids[grid_indices[read_attrs[0]]].transform;

        // Materialise matching leaves on every bound grid.
        for &gi in &grid_indices {
            for origin in topology.keys() {
                grids[gi].ensure_leaf(*origin);
            }
        }

        // One mutable leaf reference per (leaf, attribute).
        let mut maps: Vec<Option<HashMap<LeafOrigin, &mut VolumeLeaf>>> =
            (0..self.attrs.len()).map(|_| None).collect();
        for (gi, grid) in grids.iter_mut().enumerate() {
            if let Some(ai) = grid_indices.iter().position(|&x| x == gi) {
                maps[ai] = Some(grid.leaves_mut().map(|(o, l)| (*o, l)).collect());
            }
        }
        let mut maps: Vec<HashMap<LeafOrigin, &mut VolumeLeaf>> = maps
            .into_iter()
            .map(|m| m.expect("every attribute grid was bound"))
            .collect();

        struct LeafTask<'g> {
            origin: LeafOrigin,
            mask: [u64; 8],
            leaves: Vec<&'g mut VolumeLeaf>,
        }
        let tasks: Vec<LeafTask<'_>> = topology
            .iter()
            .map(|(origin, mask)| LeafTask {
                origin: *origin,
                mask: *mask,
                leaves: maps
                    .iter_mut()
                    .map(|m| m.remove(origin).expect("leaf was materialised"))
                    .collect(),
            })
            .collect();

        debug!(leaves = tasks.len(), attrs = self.attrs.len(), "volume pass");
        tasks.into_par_iter().try_for_each(|mut task| {
            let kernel = self
                .linked
                .kernel(VOLUME_ENTRY)
                .map_err(RuntimeError::Jit)?;
            let mut state = kernel.state();
            for offset in mask_offsets(task.mask) {
                let coord = offset_coord(task.origin, offset);
                let mut ctx = VolumeContext {
                    coord,
                    offset,
                    transform: &transform,
                    attrs: task.leaves.as_mut_slice(),
                    custom: &self.custom,
                    rng: RandStream::new(coord_id(coord)),
                };
                kernel
                    .invoke(&mut state, &mut ctx)
                    .map_err(RuntimeError::Exec)?;
            }
            Ok(())
        })
    }
}

/// A compiled point kernel bound to its attribute registry.
#[derive(Debug)]
pub struct PointExecutable {
    linked: Arc<LinkedModule>,
    attrs: AttributeRegistry,
    custom: CustomData,
}

impl PointExecutable {
    /// Wrap a linked module and its registries.
    pub fn new(
        linked: Arc<LinkedModule>,
        attrs: AttributeRegistry,
        custom: CustomData,
    ) -> PointExecutable {
        PointExecutable {
            linked,
            attrs,
            custom,
        }
    }

    /// The attributes the kernel references.
    pub fn attributes(&self) -> &AttributeRegistry {
        &self.attrs
    }

    /// Run the kernel once per point of every leaf, in parallel across
    /// leaves. Missing attributes are created on the grid first; groups
    /// created inside the pass are merged into the grid afterwards.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::Attribute`] when an existing attribute's type
    /// differs from the registered one; [`RuntimeError::Exec`] when a
    /// kernel invocation traps.
    pub fn execute(&self, grid: &mut PointGrid) -> Result<(), RuntimeError> {
        // Bind or create attributes.
        for entry in self.attrs.iter() {
            match grid.descriptor().attribute_type(&entry.name) {
                Some(ty) if ty == entry.ty => {}
                Some(ty) => {
                    return Err(RuntimeError::Attribute {
                        name: entry.name.clone(),
                        expected: entry.ty.to_string(),
                        found: ty.to_string(),
                    })
                }
                None => {
                    grid.ensure_attribute(&entry.name, entry.ty);
                }
            }
        }
        let attr_slots: Vec<usize> = self
            .attrs
            .iter()
            .map(|entry| {
                grid.descriptor()
                    .index_of(&entry.name)
                    .expect("attribute was bound above")
            })
            .collect();

        // Stable global point ids across leaves.
        let mut bases = Vec::with_capacity(grid.leaves().len());
        let mut base = 0u64;
        for leaf in grid.leaves() {
            bases.push(base);
            base += leaf.count() as u64;
        }

        let transform = grid.transform;
        let custom = &self.custom;
        let linked = &self.linked;
        let attr_slots = &attr_slots;

        debug!(
            leaves = grid.leaves().len(),
            points = grid.total_points(),
            "point pass"
        );
        let pendings: Vec<IndexMap<String, Vec<u64>>> = grid
            .leaves_mut()
            .par_iter_mut()
            .enumerate()
            .map(|(leaf_index, leaf)| {
                let kernel = linked.kernel(POINT_ENTRY).map_err(RuntimeError::Jit)?;
                let mut state = kernel.state();
                let mut pending = IndexMap::new();
                for point in 0..leaf.count() {
                    let element_id = bases[leaf_index] + point as u64;
                    let mut ctx = PointContext {
                        point,
                        element_id,
                        leaf: &mut *leaf,
                        attr_slots,
                        pending: &mut pending,
                        transform: &transform,
                        custom,
                        rng: RandStream::new(element_id),
                    };
                    kernel
                        .invoke(&mut state, &mut ctx)
                        .map_err(RuntimeError::Exec)?;
                }
                Ok(pending)
            })
            .collect::<Result<_, RuntimeError>>()?;

        // Serial merge of leaf-local data.
        for (leaf_index, pending) in pendings.into_iter().enumerate() {
            for (name, bits) in pending {
                grid.ensure_group(&name);
                grid.leaves_mut()[leaf_index].merge_group(&name, &bits);
            }
        }
        Ok(())
    }
}
