//! Module linking.
//!
//! The engine is the boundary the compiler hands finished IR across. Its
//! surface is deliberately small: [`Engine::add_module`] verifies a
//! module and resolves its external declarations through the
//! host-supplied symbol callback, and [`LinkedModule::kernel`] looks up
//! an entry point in the linked result. Linked modules are immutable and
//! shared by every worker during execution.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use voxl_codegen::{verify, Instr, Module};
use voxl_registry::{FnImpl, FunctionRegistry, InlineFn};

use crate::context::{NativeFn, SymbolResolver};
use crate::error::JitError;
use crate::exec::Kernel;

/// The execution engine: verification plus linking.
pub struct Engine {
    registry: Arc<FunctionRegistry>,
}

impl Engine {
    /// Create an engine over a shared function registry.
    pub fn new(registry: Arc<FunctionRegistry>) -> Engine {
        Engine { registry }
    }

    /// The registry the engine links inline calls against.
    pub fn registry(&self) -> &Arc<FunctionRegistry> {
        &self.registry
    }

    /// Verify a module and resolve every external declaration.
    ///
    /// # Errors
    ///
    /// [`JitError::Verify`] on malformed IR, [`JitError::UnresolvedSymbol`]
    /// when the resolver does not know a declared symbol.
    pub fn add_module(
        &self,
        module: Module,
        resolver: &SymbolResolver<'_>,
    ) -> Result<LinkedModule, JitError> {
        verify(&module, &self.registry)?;

        let mut externals = Vec::with_capacity(module.externals.len());
        for decl in &module.externals {
            let native = resolver(&decl.symbol).ok_or_else(|| JitError::UnresolvedSymbol {
                symbol: decl.symbol.clone(),
            })?;
            externals.push(native);
        }

        // Pre-resolve inline callees so execution never searches the
        // registry.
        let mut inline: HashMap<(String, u16), InlineFn> = HashMap::new();
        for function in &module.functions {
            for block in &function.blocks {
                for instr in &block.instrs {
                    if let Instr::CallInline { name, sig, .. } = instr {
                        let group = self
                            .registry
                            .get(name)
                            .expect("verification checked inline callees");
                        match group.signatures[*sig as usize].implementation {
                            FnImpl::Inline(f) => {
                                inline.insert((name.clone(), *sig), f);
                            }
                            FnImpl::External(symbol) => {
                                return Err(JitError::UnresolvedSymbol {
                                    symbol: symbol.to_string(),
                                })
                            }
                        }
                    }
                }
            }
        }

        debug!(
            externals = externals.len(),
            inline = inline.len(),
            "module linked"
        );
        Ok(LinkedModule {
            module,
            externals,
            inline,
        })
    }
}

/// A verified module with every symbol resolved.
#[derive(Debug)]
pub struct LinkedModule {
    pub(crate) module: Module,
    pub(crate) externals: Vec<NativeFn>,
    pub(crate) inline: HashMap<(String, u16), InlineFn>,
}

impl LinkedModule {
    /// Look up an entry function, the `resolve` half of the engine
    /// surface.
    ///
    /// # Errors
    ///
    /// [`JitError::UnknownFunction`] when the module defines no function
    /// of that name.
    pub fn kernel(&self, name: &str) -> Result<Kernel<'_>, JitError> {
        let function = self
            .module
            .function(name)
            .ok_or_else(|| JitError::UnknownFunction {
                name: name.to_string(),
            })?;
        Ok(Kernel {
            linked: self,
            function,
        })
    }
}
