//! The intermediate representation.
//!
//! A [`Module`] holds one entry function per kernel plus declarations of
//! every external helper the kernel calls. Functions are basic-block
//! graphs over an infinite virtual register file; mutable storage (locals
//! and logical-operator temporaries) lives in indexed stack slots that
//! the engine zero-initialises on every kernel invocation.
//!
//! The IR is plain data: serialisable, with no behaviour of its own. The
//! engine interprets it; [`verify`] checks structural well-formedness
//! before a module is accepted.

use serde::Serialize;
use thiserror::Error;
use voxl_types::{AxType, BinaryOp, UnaryOp, Value};

/// Virtual register index, unique within a function.
pub type Reg = u32;

/// Basic block index within a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BlockId(pub u32);

/// Stack slot index within a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SlotId(pub u32);

/// A compiled IR module: entry function plus external declarations.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Module {
    /// Functions defined by the module. Kernels have exactly one.
    pub functions: Vec<Function>,
    /// External helpers the module calls, resolved at link time.
    pub externals: Vec<ExternalDecl>,
}

impl Module {
    /// Look up a function by name.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Declare an external, reusing an existing declaration with the same
    /// symbol. Returns its index.
    pub fn declare_external(&mut self, decl: ExternalDecl) -> u32 {
        if let Some(pos) = self.externals.iter().position(|e| e.symbol == decl.symbol) {
            return pos as u32;
        }
        self.externals.push(decl);
        (self.externals.len() - 1) as u32
    }
}

/// Declaration of an externally-linked helper function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExternalDecl {
    /// Symbol name looked up through the host resolver.
    pub symbol: String,
    /// Parameter types.
    pub params: Vec<AxType>,
    /// Return type; `None` for void.
    pub ret: Option<AxType>,
}

/// C-level type of an entry-function ABI parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AbiType {
    /// `const int32[3]`
    Vec3I,
    /// `uint64_t`
    U64,
    /// Opaque pointer.
    Ptr,
    /// Pointer table (`void**`).
    PtrArray,
}

/// One entry-function ABI parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbiParam {
    /// Parameter name, for printing and verification.
    pub name: &'static str,
    /// C-level type.
    pub ty: AbiType,
}

/// A function: ABI signature, stack slots, and a basic-block graph.
#[derive(Debug, Clone, Serialize)]
pub struct Function {
    /// Function name (e.g. `voxl.volume.kernel`).
    pub name: String,
    /// Entry ABI parameters, in call order.
    pub params: Vec<AbiParam>,
    /// Stack slots, zero-initialised per invocation.
    pub slots: Vec<SlotInfo>,
    /// Basic blocks. Entry is block 0.
    pub blocks: Vec<Block>,
    /// The unique epilogue block every `return` jumps to.
    pub epilogue: BlockId,
    /// Number of virtual registers used.
    pub reg_count: u32,
}

/// Metadata for one stack slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotInfo {
    /// Source name, or a generated name for compiler temporaries.
    pub name: String,
    /// Stored type; determines the zero value.
    pub ty: AxType,
}

/// A basic block: straight-line instructions plus one terminator.
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    /// Instructions in execution order.
    pub instrs: Vec<Instr>,
    /// Block terminator.
    pub term: Terminator,
}

/// Block terminators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Terminator {
    /// Unconditional jump.
    Jump(BlockId),
    /// Conditional branch on a boolean register.
    Branch {
        /// Condition register; must hold a bool.
        cond: Reg,
        /// Target when true.
        then_block: BlockId,
        /// Target when false.
        else_block: BlockId,
    },
    /// Leave the function. Only the epilogue carries this.
    Return,
}

/// IR instructions.
#[derive(Debug, Clone, Serialize)]
pub enum Instr {
    /// Materialise a constant.
    Const {
        /// Destination register.
        dst: Reg,
        /// The constant value.
        value: Value,
    },
    /// Load a stack slot.
    LoadSlot {
        /// Destination register.
        dst: Reg,
        /// Source slot.
        slot: SlotId,
    },
    /// Store to a stack slot.
    StoreSlot {
        /// Destination slot.
        slot: SlotId,
        /// Source register.
        src: Reg,
    },
    /// Load the current element's value of an attribute (volume target:
    /// direct access through the pre-fetched leaf buffers).
    LoadAttr {
        /// Destination register.
        dst: Reg,
        /// Index into the attribute registry.
        attr: u16,
    },
    /// Store the current element's value of an attribute.
    StoreAttr {
        /// Index into the attribute registry.
        attr: u16,
        /// Source register.
        src: Reg,
    },
    /// Arithmetic conversion (scalar) or elementwise array cast.
    Cast {
        /// Destination register.
        dst: Reg,
        /// Source register.
        src: Reg,
        /// Target type.
        ty: AxType,
    },
    /// Unary operation on a scalar.
    Unary {
        /// Destination register.
        dst: Reg,
        /// Operator.
        op: UnaryOp,
        /// Operand register.
        src: Reg,
    },
    /// Binary operation on two scalars of matching type.
    Binary {
        /// Destination register.
        dst: Reg,
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Reg,
        /// Right operand.
        rhs: Reg,
    },
    /// Pack scalar registers of one shared type into an array.
    Pack {
        /// Destination register.
        dst: Reg,
        /// Element registers.
        elems: Vec<Reg>,
    },
    /// Extract an element of an array register.
    Extract {
        /// Destination register.
        dst: Reg,
        /// Array operand.
        src: Reg,
        /// Literal element index.
        index: u8,
    },
    /// Functional element update: `dst` is `src` with `elems[index]`
    /// replaced.
    Insert {
        /// Destination register.
        dst: Reg,
        /// Array operand.
        src: Reg,
        /// Literal element index.
        index: u8,
        /// Replacement element register.
        elem: Reg,
    },
    /// Call an inline builtin from the function registry.
    CallInline {
        /// Destination register; `None` for void.
        dst: Option<Reg>,
        /// Registry group name.
        name: String,
        /// Signature index within the group.
        sig: u16,
        /// Argument registers, already converted to the parameter types.
        args: Vec<Reg>,
    },
    /// Call an external helper through the link table.
    CallExternal {
        /// Destination register; `None` for void.
        dst: Option<Reg>,
        /// Index into [`Module::externals`].
        ext: u32,
        /// Argument registers, already converted to the parameter types.
        args: Vec<Reg>,
    },
}

/// Structural verification failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerifyError {
    /// A terminator or instruction references a block out of range.
    #[error("block reference out of range in function '{function}'")]
    BadBlock {
        /// Function name.
        function: String,
    },
    /// An instruction references a register `>= reg_count`.
    #[error("register out of range in function '{function}'")]
    BadReg {
        /// Function name.
        function: String,
    },
    /// An instruction references a slot out of range.
    #[error("slot out of range in function '{function}'")]
    BadSlot {
        /// Function name.
        function: String,
    },
    /// A call references a missing external or mismatched arity.
    #[error("invalid call in function '{function}': {message}")]
    BadCall {
        /// Function name.
        function: String,
        /// Details.
        message: String,
    },
    /// The epilogue is missing or does not return.
    #[error("function '{function}' has a malformed epilogue")]
    BadEpilogue {
        /// Function name.
        function: String,
    },
}

/// Verify structural well-formedness of a module.
///
/// Checks block/register/slot ranges, call arities against the external
/// table and the registry, and the epilogue invariant. Type soundness is
/// the generator's responsibility; the engine additionally bounds-checks
/// attribute indices against the registry it is bound to.
pub fn verify(
    module: &Module,
    registry: &voxl_registry::FunctionRegistry,
) -> Result<(), VerifyError> {
    for function in &module.functions {
        let bad_block = || VerifyError::BadBlock {
            function: function.name.clone(),
        };
        let bad_reg = || VerifyError::BadReg {
            function: function.name.clone(),
        };
        let check_reg = |r: Reg| {
            if r < function.reg_count {
                Ok(())
            } else {
                Err(bad_reg())
            }
        };
        let check_block = |b: BlockId| {
            if (b.0 as usize) < function.blocks.len() {
                Ok(())
            } else {
                Err(bad_block())
            }
        };

        check_block(function.epilogue)?;
        if !matches!(
            function.blocks[function.epilogue.0 as usize].term,
            Terminator::Return
        ) {
            return Err(VerifyError::BadEpilogue {
                function: function.name.clone(),
            });
        }

        for block in &function.blocks {
            for instr in &block.instrs {
                match instr {
                    Instr::Const { dst, .. } => check_reg(*dst)?,
                    Instr::LoadSlot { dst, slot } | Instr::StoreSlot { slot, src: dst } => {
                        check_reg(*dst)?;
                        if slot.0 as usize >= function.slots.len() {
                            return Err(VerifyError::BadSlot {
                                function: function.name.clone(),
                            });
                        }
                    }
                    Instr::LoadAttr { dst, .. } | Instr::StoreAttr { src: dst, .. } => {
                        check_reg(*dst)?
                    }
                    Instr::Cast { dst, src, .. } | Instr::Unary { dst, src, .. } => {
                        check_reg(*dst)?;
                        check_reg(*src)?;
                    }
                    Instr::Binary { dst, lhs, rhs, .. } => {
                        check_reg(*dst)?;
                        check_reg(*lhs)?;
                        check_reg(*rhs)?;
                    }
                    Instr::Pack { dst, elems } => {
                        check_reg(*dst)?;
                        if elems.is_empty() {
                            return Err(VerifyError::BadCall {
                                function: function.name.clone(),
                                message: "empty pack".to_string(),
                            });
                        }
                        for e in elems {
                            check_reg(*e)?;
                        }
                    }
                    Instr::Extract { dst, src, .. } => {
                        check_reg(*dst)?;
                        check_reg(*src)?;
                    }
                    Instr::Insert { dst, src, elem, .. } => {
                        check_reg(*dst)?;
                        check_reg(*src)?;
                        check_reg(*elem)?;
                    }
                    Instr::CallInline {
                        dst, name, sig, args, ..
                    } => {
                        if let Some(dst) = dst {
                            check_reg(*dst)?;
                        }
                        for a in args {
                            check_reg(*a)?;
                        }
                        let group = registry.get(name).ok_or_else(|| VerifyError::BadCall {
                            function: function.name.clone(),
                            message: format!("unknown builtin '{name}'"),
                        })?;
                        let signature = group.signatures.get(*sig as usize).ok_or_else(|| {
                            VerifyError::BadCall {
                                function: function.name.clone(),
                                message: format!("signature index {sig} out of range for '{name}'"),
                            }
                        })?;
                        if signature.arity() != args.len() {
                            return Err(VerifyError::BadCall {
                                function: function.name.clone(),
                                message: format!("arity mismatch calling '{name}'"),
                            });
                        }
                    }
                    Instr::CallExternal { dst, ext, args } => {
                        if let Some(dst) = dst {
                            check_reg(*dst)?;
                        }
                        for a in args {
                            check_reg(*a)?;
                        }
                        let decl = module.externals.get(*ext as usize).ok_or_else(|| {
                            VerifyError::BadCall {
                                function: function.name.clone(),
                                message: format!("external index {ext} out of range"),
                            }
                        })?;
                        if decl.params.len() != args.len() {
                            return Err(VerifyError::BadCall {
                                function: function.name.clone(),
                                message: format!("arity mismatch calling '{}'", decl.symbol),
                            });
                        }
                    }
                }
            }
            match block.term {
                Terminator::Jump(target) => check_block(target)?,
                Terminator::Branch {
                    cond,
                    then_block,
                    else_block,
                } => {
                    check_reg(cond)?;
                    check_block(then_block)?;
                    check_block(else_block)?;
                }
                Terminator::Return => {}
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxl_registry::FunctionRegistry;
    use voxl_types::{Scalar, ScalarType};

    fn single_block_function(instrs: Vec<Instr>, reg_count: u32) -> Module {
        Module {
            functions: vec![Function {
                name: "test".to_string(),
                params: vec![],
                slots: vec![],
                blocks: vec![Block {
                    instrs,
                    term: Terminator::Return,
                }],
                epilogue: BlockId(0),
                reg_count,
            }],
            externals: vec![],
        }
    }

    #[test]
    fn valid_module_verifies() {
        let module = single_block_function(
            vec![Instr::Const {
                dst: 0,
                value: Value::Scalar(Scalar::F32(1.0)),
            }],
            1,
        );
        assert!(verify(&module, &FunctionRegistry::empty()).is_ok());
    }

    #[test]
    fn out_of_range_register_fails() {
        let module = single_block_function(
            vec![Instr::Const {
                dst: 5,
                value: Value::Scalar(Scalar::F32(1.0)),
            }],
            1,
        );
        assert!(matches!(
            verify(&module, &FunctionRegistry::empty()),
            Err(VerifyError::BadReg { .. })
        ));
    }

    #[test]
    fn missing_builtin_fails() {
        let module = single_block_function(
            vec![Instr::CallInline {
                dst: Some(0),
                name: "nosuch".to_string(),
                sig: 0,
                args: vec![],
            }],
            1,
        );
        assert!(matches!(
            verify(&module, &FunctionRegistry::empty()),
            Err(VerifyError::BadCall { .. })
        ));
    }

    #[test]
    fn external_arity_checked() {
        let mut module = single_block_function(
            vec![Instr::CallExternal {
                dst: None,
                ext: 0,
                args: vec![],
            }],
            1,
        );
        module.externals.push(ExternalDecl {
            symbol: "vx.test".to_string(),
            params: vec![AxType::Scalar(ScalarType::I32)],
            ret: None,
        });
        assert!(matches!(
            verify(&module, &FunctionRegistry::empty()),
            Err(VerifyError::BadCall { .. })
        ));
    }

    #[test]
    fn external_dedup_by_symbol() {
        let mut module = Module::default();
        let a = module.declare_external(ExternalDecl {
            symbol: "vx.a".to_string(),
            params: vec![],
            ret: None,
        });
        let b = module.declare_external(ExternalDecl {
            symbol: "vx.a".to_string(),
            params: vec![],
            ret: None,
        });
        assert_eq!(a, b);
        assert_eq!(module.externals.len(), 1);
    }
}
