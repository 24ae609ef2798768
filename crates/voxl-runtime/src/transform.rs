//! Grid transforms.
//!
//! A linear index-to-world map: uniform voxel size plus a world-space
//! translation. This is the subset of transform behaviour the coordinate
//! builtins need.

/// Uniform linear transform between index space and world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// World-space edge length of one voxel.
    pub voxel_size: f64,
    /// World-space offset of index-space origin.
    pub translate: [f64; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            voxel_size: 1.0,
            translate: [0.0; 3],
        }
    }
}

impl Transform {
    /// A transform with the given voxel size and no translation.
    pub fn with_voxel_size(voxel_size: f64) -> Transform {
        Transform {
            voxel_size,
            ..Transform::default()
        }
    }

    /// Map an index-space position to world space.
    pub fn index_to_world(&self, index: [f64; 3]) -> [f64; 3] {
        [
            index[0] * self.voxel_size + self.translate[0],
            index[1] * self.voxel_size + self.translate[1],
            index[2] * self.voxel_size + self.translate[2],
        ]
    }

    /// Map a world-space position to the nearest voxel coordinate.
    pub fn world_to_index(&self, world: [f64; 3]) -> [i32; 3] {
        [
            ((world[0] - self.translate[0]) / self.voxel_size).round() as i32,
            ((world[1] - self.translate[1]) / self.voxel_size).round() as i32,
            ((world[2] - self.translate[2]) / self.voxel_size).round() as i32,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_voxel_centres() {
        let xform = Transform {
            voxel_size: 0.5,
            translate: [10.0, 0.0, -2.0],
        };
        let world = xform.index_to_world([4.0, 0.0, 8.0]);
        assert_eq!(world, [12.0, 0.0, 2.0]);
        assert_eq!(xform.world_to_index(world), [4, 0, 8]);
    }

    #[test]
    fn default_is_identity_scale() {
        let xform = Transform::default();
        assert_eq!(xform.index_to_world([1.0, 2.0, 3.0]), [1.0, 2.0, 3.0]);
    }
}
