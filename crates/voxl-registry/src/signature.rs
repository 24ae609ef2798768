//! Function signatures and implementations.
//!
//! A [`FunctionSignature`] is one overload of a built-in: its return type,
//! parameter types, attributes, and implementation. Implementations come
//! in two flavours:
//!
//! - [`FnImpl::Inline`] - a pure Rust function evaluated directly by the
//!   execution engine, the analogue of a function defined inline in IR.
//! - [`FnImpl::External`] - a named symbol resolved at module-add time
//!   through the host-supplied symbol resolver. Externals may consult the
//!   kernel context (voxel coordinate, group membership, custom data).

use voxl_types::{AxType, Value};

/// Pure implementation: arguments in, value out, no context access.
pub type InlineFn = fn(&[Value]) -> Value;

/// How a signature is realised at execution time.
#[derive(Clone, Copy)]
pub enum FnImpl {
    /// Evaluated in-process by the engine; must be pure.
    Inline(InlineFn),
    /// Declared in the module and resolved by symbol name when the module
    /// is added to the engine.
    External(&'static str),
}

impl std::fmt::Debug for FnImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FnImpl::Inline(_) => f.write_str("Inline"),
            FnImpl::External(symbol) => write!(f, "External({symbol})"),
        }
    }
}

/// One overload of a built-in function.
#[derive(Debug, Clone)]
pub struct FunctionSignature {
    /// Return type; `None` for void functions.
    pub ret: Option<AxType>,
    /// Parameter types in declaration order.
    pub params: Vec<AxType>,
    /// True if the function reads nothing but its arguments. Readonly
    /// inline functions with constant arguments are folded by the
    /// optimiser.
    pub readonly: bool,
    /// Hint that the body is small enough to always inline.
    pub always_inline: bool,
    /// The implementation.
    pub implementation: FnImpl,
}

impl FunctionSignature {
    /// A pure inline signature. Inline builtins are readonly by
    /// construction.
    pub fn inline(ret: AxType, params: Vec<AxType>, f: InlineFn) -> FunctionSignature {
        FunctionSignature {
            ret: Some(ret),
            params,
            readonly: true,
            always_inline: true,
            implementation: FnImpl::Inline(f),
        }
    }

    /// An externally-linked signature.
    pub fn external(
        ret: Option<AxType>,
        params: Vec<AxType>,
        symbol: &'static str,
    ) -> FunctionSignature {
        FunctionSignature {
            ret,
            params,
            readonly: false,
            always_inline: false,
            implementation: FnImpl::External(symbol),
        }
    }

    /// Mark an external as readonly (safe to reorder, not safe to fold
    /// since it may read per-element context).
    pub fn readonly(mut self) -> FunctionSignature {
        self.readonly = true;
        self
    }

    /// Arity of this overload.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Whether the parameter at `index` is passed by pointer. Arrays and
    /// strings are; scalars are passed by value.
    pub fn param_by_pointer(&self, index: usize) -> bool {
        matches!(self.params[index], AxType::Array { .. } | AxType::Str)
    }

    /// The external symbol name, if this is an external.
    pub fn symbol(&self) -> Option<&'static str> {
        match self.implementation {
            FnImpl::External(symbol) => Some(symbol),
            FnImpl::Inline(_) => None,
        }
    }
}

/// A named set of overloads.
#[derive(Debug, Clone)]
pub struct FunctionGroup {
    /// Source-level function name.
    pub name: &'static str,
    /// Overloads in declaration order. Never empty.
    pub signatures: Vec<FunctionSignature>,
}

impl FunctionGroup {
    /// Build a group from its overloads.
    pub fn new(name: &'static str, signatures: Vec<FunctionSignature>) -> FunctionGroup {
        debug_assert!(!signatures.is_empty());
        FunctionGroup { name, signatures }
    }
}
