//! The kernel interpreter.
//!
//! Executes one entry function against a [`KernelContext`]. Workers
//! allocate a [`KernelState`] once per leaf and reuse it across element
//! invocations; stack slots are re-zeroed on every invocation so each
//! element sees fresh locals.

use voxl_codegen::{Function, Instr, Terminator};
use voxl_types::{
    arithmetic_cast, array_cast, array_pack, binary_op, bool_coerce, unary_op, AxType, OpError,
    Scalar, Value,
};

use crate::context::KernelContext;
use crate::engine::LinkedModule;
use crate::error::ExecError;

/// A callable entry function of a linked module.
pub struct Kernel<'m> {
    pub(crate) linked: &'m LinkedModule,
    pub(crate) function: &'m Function,
}

/// Reusable register and slot storage for one worker.
pub struct KernelState {
    regs: Vec<Value>,
    slots: Vec<Value>,
}

impl<'m> Kernel<'m> {
    /// Allocate execution state sized for this kernel.
    pub fn state(&self) -> KernelState {
        KernelState {
            regs: vec![Value::Scalar(Scalar::Bool(false)); self.function.reg_count as usize],
            slots: self
                .function
                .slots
                .iter()
                .map(|s| Value::zero(s.ty))
                .collect(),
        }
    }

    /// Run the kernel once against the given element context.
    ///
    /// # Errors
    ///
    /// [`ExecError::DivideByZero`] when an integer division or remainder
    /// meets a zero divisor; [`ExecError::Invalid`] only on malformed IR.
    pub fn invoke(
        &self,
        state: &mut KernelState,
        ctx: &mut dyn KernelContext,
    ) -> Result<(), ExecError> {
        // Fresh locals per invocation.
        for (slot, info) in state.slots.iter_mut().zip(&self.function.slots) {
            *slot = Value::zero(info.ty);
        }

        let mut block = 0usize;
        loop {
            let current = &self.function.blocks[block];
            for instr in &current.instrs {
                self.step(instr, state, ctx)?;
            }
            match current.term {
                Terminator::Jump(target) => block = target.0 as usize,
                Terminator::Branch {
                    cond,
                    then_block,
                    else_block,
                } => {
                    let taken = match &state.regs[cond as usize] {
                        Value::Scalar(s) => bool_coerce(*s),
                        other => {
                            return Err(ExecError::invalid(format!(
                                "branch on non-scalar {other:?}"
                            )))
                        }
                    };
                    block = if taken {
                        then_block.0 as usize
                    } else {
                        else_block.0 as usize
                    };
                }
                Terminator::Return => return Ok(()),
            }
        }
    }

    fn step(
        &self,
        instr: &Instr,
        state: &mut KernelState,
        ctx: &mut dyn KernelContext,
    ) -> Result<(), ExecError> {
        match instr {
            Instr::Const { dst, value } => {
                state.regs[*dst as usize] = value.clone();
            }
            Instr::LoadSlot { dst, slot } => {
                state.regs[*dst as usize] = state.slots[slot.0 as usize].clone();
            }
            Instr::StoreSlot { slot, src } => {
                state.slots[slot.0 as usize] = state.regs[*src as usize].clone();
            }
            Instr::LoadAttr { dst, attr } => {
                state.regs[*dst as usize] = ctx.attr_load(*attr as usize);
            }
            Instr::StoreAttr { attr, src } => {
                ctx.attr_store(*attr as usize, state.regs[*src as usize].clone());
            }
            Instr::Cast { dst, src, ty } => {
                let value = cast(state.regs[*src as usize].clone(), *ty)?;
                state.regs[*dst as usize] = value;
            }
            Instr::Unary { dst, op, src } => {
                let operand = scalar_of(&state.regs[*src as usize])?;
                let result = unary_op(operand, *op).map_err(op_error)?;
                state.regs[*dst as usize] = Value::Scalar(result);
            }
            Instr::Binary { dst, op, lhs, rhs } => {
                let a = scalar_of(&state.regs[*lhs as usize])?;
                let b = scalar_of(&state.regs[*rhs as usize])?;
                let result = binary_op(a, b, *op).map_err(op_error)?;
                state.regs[*dst as usize] = Value::Scalar(result);
            }
            Instr::Pack { dst, elems } => {
                let mut scalars = Vec::with_capacity(elems.len());
                for e in elems {
                    scalars.push(scalar_of(&state.regs[*e as usize])?);
                }
                let array = array_pack(scalars)
                    .map_err(|e| ExecError::invalid(format!("bad pack: {e}")))?;
                state.regs[*dst as usize] = Value::Array(array);
            }
            Instr::Extract { dst, src, index } => {
                let array = array_of(&state.regs[*src as usize])?;
                state.regs[*dst as usize] = Value::Scalar(array.get(*index as usize));
            }
            Instr::Insert {
                dst,
                src,
                index,
                elem,
            } => {
                let mut array = array_of(&state.regs[*src as usize])?.clone();
                let value = scalar_of(&state.regs[*elem as usize])?;
                array.set(*index as usize, value);
                state.regs[*dst as usize] = Value::Array(array);
            }
            Instr::CallInline {
                dst,
                name,
                sig,
                args,
            } => {
                let f = self
                    .linked
                    .inline
                    .get(&(name.clone(), *sig))
                    .ok_or_else(|| ExecError::invalid(format!("unlinked builtin '{name}'")))?;
                let values: Vec<Value> = args
                    .iter()
                    .map(|r| state.regs[*r as usize].clone())
                    .collect();
                let result = f(&values);
                if let Some(dst) = dst {
                    state.regs[*dst as usize] = result;
                }
            }
            Instr::CallExternal { dst, ext, args } => {
                let native = self.linked.externals[*ext as usize];
                let values: Vec<Value> = args
                    .iter()
                    .map(|r| state.regs[*r as usize].clone())
                    .collect();
                let result = native(ctx, &values);
                match (dst, result) {
                    (Some(dst), Some(value)) => state.regs[*dst as usize] = value,
                    (None, _) => {}
                    (Some(_), None) => {
                        let symbol = &self.linked.module.externals[*ext as usize].symbol;
                        return Err(ExecError::invalid(format!(
                            "external '{symbol}' returned no value"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

fn cast(value: Value, ty: AxType) -> Result<Value, ExecError> {
    match (value, ty) {
        (Value::Scalar(s), AxType::Scalar(t)) => Ok(Value::Scalar(arithmetic_cast(s, t))),
        (Value::Array(a), AxType::Array { elem, len }) if a.len() == len as usize => {
            Ok(Value::Array(array_cast(a, elem)))
        }
        (value, ty) => Err(ExecError::invalid(format!(
            "cannot cast {:?} to {ty}",
            value.ty()
        ))),
    }
}

fn scalar_of(value: &Value) -> Result<Scalar, ExecError> {
    value
        .as_scalar()
        .ok_or_else(|| ExecError::invalid(format!("expected scalar, found {}", value.ty())))
}

fn array_of(value: &Value) -> Result<&voxl_types::ArrayValue, ExecError> {
    value
        .as_array()
        .ok_or_else(|| ExecError::invalid(format!("expected array, found {}", value.ty())))
}

fn op_error(e: OpError) -> ExecError {
    match e {
        OpError::DivideByZero => ExecError::DivideByZero,
        other => ExecError::invalid(other.to_string()),
    }
}
