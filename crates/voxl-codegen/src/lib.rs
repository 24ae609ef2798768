//! IR and compute generators for the Voxl kernel language.
//!
//! This crate owns the middle of the pipeline: the attribute-scanning
//! pre-pass, type resolution, the IR itself, the two target-specific
//! compute generators, and the optimisation passes.
//!
//! ```text
//! Tree ──scan──> AttributeRegistry
//!      ──resolve_types──> Resolution (types, selections, warnings)
//!      ──VolumeGenerator / PointGenerator──> Module
//!      ──optimize──> Module
//! ```
//!
//! - [`attrs`] - attribute registry, frozen before codegen
//! - [`typing`] - type resolution and warnings
//! - [`symbols`] - block-scoped symbol table
//! - [`ir`] - module/function/block/instruction definitions, verification
//! - [`generator`] - shared lowerer plus volume/point entry generation
//! - [`opt`] - constant folding and dead-code elimination

pub mod attrs;
pub mod error;
pub mod generator;
pub mod ir;
pub mod opt;
pub mod symbols;
pub mod typing;

pub use attrs::{Access, AttributeEntry, AttributeRegistry};
pub use error::{CodegenError, ErrorKind, Warning, WarningKind};
pub use generator::point::{attr_load_symbol, attr_store_symbol, PointGenerator, POINT_ENTRY};
pub use generator::volume::{VolumeGenerator, VOLUME_ENTRY};
pub use ir::{
    verify, AbiParam, AbiType, Block, BlockId, ExternalDecl, Function, Instr, Module, Reg,
    SlotId, SlotInfo, Terminator, VerifyError,
};
pub use opt::{optimize, OptLevel};
pub use symbols::{Symbol, SymbolTable};
pub use typing::{resolve_types, Resolution, TypingOptions};
