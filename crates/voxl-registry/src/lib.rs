//! Built-in function registry and overload resolution for Voxl.
//!
//! The registry is the catalogue of every function a kernel can call.
//! Each [`FunctionGroup`] is a name plus one or more typed
//! [`FunctionSignature`]s; call sites resolve to a single signature
//! through [`overload::select`], a pure scoring function over the
//! argument types (so resolution is deterministic by construction).
//!
//! Signatures are either *inline* - pure Rust implementations evaluated
//! directly by the engine - or *external* - named symbols resolved
//! against the host's native helper table when a module is added to the
//! engine. The split mirrors the two ways builtins reach generated code:
//! small pure functions live in the module, context-dependent helpers
//! cross the call boundary.
//!
//! The registry is built once ([`FunctionRegistry::with_builtins`]) and
//! shared read-only behind an `Arc` thereafter.

pub mod builtins;
pub mod overload;
pub mod registry;
pub mod signature;

pub use builtins::externals::symbols;
pub use builtins::rng::{rand_seeded, splitmix_mix, uniform_01};
pub use overload::{conversion_cost, select, OverloadError};
pub use registry::FunctionRegistry;
pub use signature::{FnImpl, FunctionGroup, FunctionSignature, InlineFn};
