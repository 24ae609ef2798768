//! Grid comparison helper.
//!
//! Tolerance-based diffing of volume grids, used by integration tests to
//! assert kernel results: topology first (the active sets must agree),
//! then values voxel by voxel.

use voxl_types::Value;

use crate::volume::VolumeGrid;

/// Result of comparing two grids.
#[derive(Debug, Clone, Default)]
pub struct CompareReport {
    /// Active sets agree.
    pub topology_matches: bool,
    /// All mutually-active voxel values agree within tolerance.
    pub values_match: bool,
    /// Human-readable mismatch descriptions, capped at a handful.
    pub failures: Vec<String>,
}

impl CompareReport {
    /// True when topology and values both match.
    pub fn matches(&self) -> bool {
        self.topology_matches && self.values_match
    }
}

const MAX_FAILURES: usize = 8;

/// Compare two volume grids with an absolute per-component tolerance.
pub fn compare_volumes(a: &VolumeGrid, b: &VolumeGrid, tolerance: f64) -> CompareReport {
    let mut report = CompareReport {
        topology_matches: true,
        values_match: true,
        failures: Vec::new(),
    };

    if a.ty != b.ty {
        report.values_match = false;
        report
            .failures
            .push(format!("value types differ: {} vs {}", a.ty, b.ty));
        return report;
    }

    for (coord, value) in a.iter_active() {
        match b.voxel(coord) {
            None => {
                report.topology_matches = false;
                if report.failures.len() < MAX_FAILURES {
                    report
                        .failures
                        .push(format!("voxel {coord:?} active only in the first grid"));
                }
            }
            Some(other) => {
                if !values_close(value, other, tolerance) {
                    report.values_match = false;
                    if report.failures.len() < MAX_FAILURES {
                        report.failures.push(format!(
                            "voxel {coord:?}: {value:?} vs {other:?} (tolerance {tolerance})"
                        ));
                    }
                }
            }
        }
    }
    for (coord, _) in b.iter_active() {
        if !a.is_active(coord) {
            report.topology_matches = false;
            if report.failures.len() < MAX_FAILURES {
                report
                    .failures
                    .push(format!("voxel {coord:?} active only in the second grid"));
            }
        }
    }
    report
}

fn values_close(a: &Value, b: &Value, tolerance: f64) -> bool {
    match (a, b) {
        (Value::Scalar(a), Value::Scalar(b)) => (a.as_f64() - b.as_f64()).abs() <= tolerance,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len()
                && a.elements()
                    .iter()
                    .zip(b.elements())
                    .all(|(x, y)| (x.as_f64() - y.as_f64()).abs() <= tolerance)
        }
        (Value::Str(a), Value::Str(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Transform;
    use voxl_types::{AxType, Scalar, ScalarType};

    fn grid_with(values: &[([i32; 3], f32)]) -> VolumeGrid {
        let mut grid = VolumeGrid::new(
            "density",
            AxType::Scalar(ScalarType::F32),
            Transform::default(),
        );
        for (coord, v) in values {
            grid.set_voxel(*coord, Value::Scalar(Scalar::F32(*v)));
        }
        grid
    }

    #[test]
    fn identical_grids_match() {
        let a = grid_with(&[([0, 0, 0], 1.0), ([1, 0, 0], 2.0)]);
        let report = compare_volumes(&a, &a.clone(), 0.0);
        assert!(report.matches(), "{:?}", report.failures);
    }

    #[test]
    fn topology_mismatch_detected() {
        let a = grid_with(&[([0, 0, 0], 1.0)]);
        let b = grid_with(&[([0, 0, 0], 1.0), ([1, 0, 0], 1.0)]);
        let report = compare_volumes(&a, &b, 0.0);
        assert!(!report.topology_matches);
    }

    #[test]
    fn tolerance_allows_small_differences() {
        let a = grid_with(&[([0, 0, 0], 1.0)]);
        let b = grid_with(&[([0, 0, 0], 1.0 + 1e-7)]);
        assert!(compare_volumes(&a, &b, 1e-6).matches());
        assert!(!compare_volumes(&a, &b, 1e-9).matches());
    }
}
