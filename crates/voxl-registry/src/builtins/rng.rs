//! Deterministic random builtins.
//!
//! `rand(seed)` is a pure SplitMix64 hash of the seed bits, so a given
//! seed always produces the same value. The seedless `rand()` is an
//! external: the runtime derives its seed from the current element
//! (voxel coordinate or point index), keeping kernels deterministic per
//! element.

use voxl_types::{AxType, Scalar, Value};

use super::f64_arg;
use crate::registry::FunctionRegistry;
use crate::signature::{FunctionGroup, FunctionSignature};

const F64: AxType = AxType::Scalar(voxl_types::ScalarType::F64);

/// SplitMix64 finaliser.
pub fn splitmix_mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Map a hash to a uniform `f64` in `[0, 1)`.
pub fn uniform_01(hash: u64) -> f64 {
    (hash >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// Seeded uniform random in `[0, 1)`.
pub fn rand_seeded(seed: f64) -> f64 {
    uniform_01(splitmix_mix(seed.to_bits()))
}

/// Register the random groups.
pub fn register(registry: &mut FunctionRegistry) {
    registry.insert(FunctionGroup::new(
        "rand",
        vec![
            FunctionSignature::external(Some(F64), vec![], super::externals::symbols::RAND)
                .readonly(),
            FunctionSignature::inline(F64, vec![F64], |args: &[Value]| {
                Scalar::F64(rand_seeded(f64_arg(args, 0))).into()
            }),
        ],
    ));
}
