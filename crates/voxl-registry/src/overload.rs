//! Overload selection.
//!
//! Selection is a pure scoring function over the call-site argument types
//! and the group's signature list:
//!
//! 1. Filter to matching arity.
//! 2. Score each remaining signature with a per-argument cost vector:
//!    0 for an exact match; for an upward conversion the precedence
//!    distance (so the nearest overload wins - promoting `int` to `float`
//!    is cheaper than to `double`); narrowing and float-to-int cost a
//!    fixed penalty plus distance. Impossible conversions (strings,
//!    scalar/array mismatches, length mismatches) reject the signature.
//! 3. Pick the lexicographically smallest cost vector, tie-broken by the
//!    smallest cost sum, then by declaration order. Indistinguishable
//!    duplicates are an ambiguity error.

use thiserror::Error;
use voxl_types::AxType;

use crate::signature::{FunctionGroup, FunctionSignature};

/// Penalty added to narrowing (including float-to-int) conversions.
const NARROWING_PENALTY: u16 = 10;

/// Overload selection failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverloadError {
    /// No signature accepts the call-site argument types.
    #[error("no matching overload of '{name}' for argument types ({args})")]
    NotFound {
        /// Function name.
        name: String,
        /// Comma-separated argument type names.
        args: String,
    },

    /// Two or more signatures tie completely.
    #[error("ambiguous call to '{name}' for argument types ({args})")]
    Ambiguous {
        /// Function name.
        name: String,
        /// Comma-separated argument type names.
        args: String,
    },
}

/// Cost of implicitly converting `from` to `to`, or `None` if no implicit
/// conversion exists.
pub fn conversion_cost(from: AxType, to: AxType) -> Option<u16> {
    if from == to {
        return Some(0);
    }
    match (from, to) {
        (AxType::Scalar(a), AxType::Scalar(b)) => Some(scalar_cost(a, b)),
        (AxType::Array { elem: ea, len: la }, AxType::Array { elem: eb, len: lb }) => {
            if la != lb {
                None
            } else {
                Some(scalar_cost(ea, eb))
            }
        }
        _ => None,
    }
}

fn scalar_cost(from: voxl_types::ScalarType, to: voxl_types::ScalarType) -> u16 {
    let from_rank = from as u16;
    let to_rank = to as u16;
    if to_rank >= from_rank {
        to_rank - from_rank
    } else {
        NARROWING_PENALTY + (from_rank - to_rank)
    }
}

fn cost_vector(signature: &FunctionSignature, args: &[AxType]) -> Option<Vec<u16>> {
    args.iter()
        .zip(&signature.params)
        .map(|(&arg, &param)| conversion_cost(arg, param))
        .collect()
}

/// Select the best overload for the argument types.
///
/// Returns the index of the chosen signature within the group together
/// with the signature itself.
///
/// # Errors
///
/// [`OverloadError::NotFound`] if no signature is viable,
/// [`OverloadError::Ambiguous`] if two viable signatures with identical
/// parameter lists tie.
pub fn select<'a>(
    group: &'a FunctionGroup,
    args: &[AxType],
) -> Result<(usize, &'a FunctionSignature), OverloadError> {
    let mut best: Option<(usize, Vec<u16>, u32)> = None;
    let mut ambiguous = false;

    for (index, signature) in group.signatures.iter().enumerate() {
        if signature.arity() != args.len() {
            continue;
        }
        let Some(costs) = cost_vector(signature, args) else {
            continue;
        };
        let sum: u32 = costs.iter().map(|&c| c as u32).sum();
        match &best {
            None => {
                best = Some((index, costs, sum));
                ambiguous = false;
            }
            Some((best_index, best_costs, best_sum)) => {
                let order = costs
                    .iter()
                    .cmp(best_costs.iter())
                    .then(sum.cmp(best_sum));
                if order == std::cmp::Ordering::Less {
                    best = Some((index, costs, sum));
                    ambiguous = false;
                } else if order == std::cmp::Ordering::Equal {
                    // Declaration order breaks the tie unless the
                    // signatures are indistinguishable.
                    if group.signatures[*best_index].params == signature.params {
                        ambiguous = true;
                    }
                }
            }
        }
    }

    let arg_names = || {
        args.iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    match best {
        Some((index, _, _)) if !ambiguous => Ok((index, &group.signatures[index])),
        Some(_) => Err(OverloadError::Ambiguous {
            name: group.name.to_string(),
            args: arg_names(),
        }),
        None => Err(OverloadError::NotFound {
            name: group.name.to_string(),
            args: arg_names(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxl_types::{ScalarType, Value};

    const F32: AxType = AxType::Scalar(ScalarType::F32);
    const F64: AxType = AxType::Scalar(ScalarType::F64);
    const I32: AxType = AxType::Scalar(ScalarType::I32);
    const I64: AxType = AxType::Scalar(ScalarType::I64);

    fn nil(_: &[Value]) -> Value {
        Value::Scalar(voxl_types::Scalar::F64(0.0))
    }

    fn group(params: Vec<Vec<AxType>>) -> FunctionGroup {
        FunctionGroup::new(
            "foo",
            params
                .into_iter()
                .map(|p| FunctionSignature::inline(F64, p, nil))
                .collect(),
        )
    }

    #[test]
    fn exact_match_wins() {
        let g = group(vec![vec![F32], vec![F64], vec![I32]]);
        assert_eq!(select(&g, &[I32]).unwrap().0, 2);
        assert_eq!(select(&g, &[F64]).unwrap().0, 1);
    }

    #[test]
    fn nearest_promotion_wins() {
        // Scenario: foo(1, 2) with {(float,int), (double,int)} picks float.
        let g = group(vec![vec![F32, I32], vec![F64, I32]]);
        assert_eq!(select(&g, &[I32, I32]).unwrap().0, 0);
    }

    #[test]
    fn promotion_beats_narrowing() {
        let g = group(vec![vec![I32], vec![F64]]);
        // f32 arg: narrowing to i32 vs promotion to f64.
        assert_eq!(select(&g, &[F32]).unwrap().0, 1);
    }

    #[test]
    fn arity_filters() {
        let g = group(vec![vec![F32], vec![F32, F32]]);
        assert_eq!(select(&g, &[F32, F32]).unwrap().0, 1);
        assert!(matches!(
            select(&g, &[F32, F32, F32]),
            Err(OverloadError::NotFound { .. })
        ));
    }

    #[test]
    fn arrays_require_matching_length() {
        let g = group(vec![vec![AxType::VEC3F]]);
        assert!(select(&g, &[AxType::vec(ScalarType::F32, 4)]).is_err());
        assert_eq!(select(&g, &[AxType::VEC3D]).unwrap().0, 0);
    }

    #[test]
    fn strings_only_match_exactly() {
        let g = group(vec![vec![AxType::Str]]);
        assert_eq!(select(&g, &[AxType::Str]).unwrap().0, 0);
        assert!(select(&g, &[F32]).is_err());
    }

    #[test]
    fn duplicate_signatures_are_ambiguous() {
        let g = group(vec![vec![F32], vec![F32]]);
        assert!(matches!(
            select(&g, &[F32]),
            Err(OverloadError::Ambiguous { .. })
        ));
    }

    #[test]
    fn selection_is_deterministic() {
        let g = group(vec![vec![I64, F32], vec![F32, F32], vec![F64, F64]]);
        let first = select(&g, &[I32, I32]).unwrap().0;
        for _ in 0..10 {
            assert_eq!(select(&g, &[I32, I32]).unwrap().0, first);
        }
    }
}
