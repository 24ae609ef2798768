//! Sparse grids and kernel executables for Voxl.
//!
//! This crate is the back half of the system: the grid substrate kernels
//! run against, the native implementations of every external helper, and
//! the executables that walk leaves in parallel and invoke the compiled
//! kernel per voxel or per point.
//!
//! - [`volume`] - sparse voxel grids (8x8x8 leaves, 512-bit value masks)
//! - [`points`] - point grids with typed per-point attributes and groups
//! - [`transform`] - index/world transforms
//! - [`natives`] - native helper table and symbol resolver
//! - [`executable`] - [`VolumeExecutable`] / [`PointExecutable`]
//! - [`compare`] - tolerance-based grid diffing for tests

pub mod compare;
mod context;
pub mod error;
pub mod executable;
pub mod natives;
pub mod points;
pub mod transform;
pub mod volume;

pub use compare::{compare_volumes, CompareReport};
pub use error::RuntimeError;
pub use executable::{CustomData, PointExecutable, VolumeExecutable};
pub use points::{Descriptor, PointGrid, PointLeaf};
pub use transform::Transform;
pub use volume::{
    leaf_offset, leaf_origin, offset_coord, LeafOrigin, VolumeGrid, VolumeLeaf, LEAF_DIM,
    LEAF_VOXELS,
};
