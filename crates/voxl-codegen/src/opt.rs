//! Optimisation passes over the IR.
//!
//! Two passes, applied per the requested level: constant folding
//! (including calls to readonly inline builtins with constant
//! arguments, the analogue of inlining small builtins) and dead-code
//! elimination of pure instructions whose results are never used.
//!
//! Folding never folds an operation that would trap (integer division
//! by zero stays in the instruction stream and traps at run time).

use std::collections::{HashMap, HashSet};

use tracing::debug;

use voxl_registry::{FnImpl, FunctionRegistry};
use voxl_types::{arithmetic_cast, array_cast, array_pack, binary_op, unary_op, AxType, Value};

use crate::ir::{Instr, Module, Reg, Terminator};

/// Requested optimisation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum OptLevel {
    /// No optimisation.
    None,
    /// Dead-code elimination only.
    O1,
    /// Constant folding and dead-code elimination.
    #[default]
    O2,
    /// Same passes as O2.
    O3,
}

/// Apply the passes selected by `level`.
pub fn optimize(module: &mut Module, registry: &FunctionRegistry, level: OptLevel) {
    if level == OptLevel::None {
        return;
    }
    if level >= OptLevel::O2 {
        constant_fold(module, registry);
    }
    eliminate_dead_code(module);
}

/// Fold instructions with constant operands into `Const`.
pub fn constant_fold(module: &mut Module, registry: &FunctionRegistry) {
    for function in &mut module.functions {
        let mut known: HashMap<Reg, Value> = HashMap::new();
        let mut folded = 0usize;
        for block in &mut function.blocks {
            for instr in &mut block.instrs {
                let replacement = match instr {
                    Instr::Const { dst, value } => {
                        known.insert(*dst, value.clone());
                        None
                    }
                    Instr::Cast { dst, src, ty } => known.get(src).and_then(|v| {
                        let value = cast_value(v.clone(), *ty)?;
                        Some((*dst, value))
                    }),
                    Instr::Unary { dst, op, src } => known.get(src).and_then(|v| {
                        let scalar = v.as_scalar()?;
                        let value = unary_op(scalar, *op).ok()?;
                        Some((*dst, Value::Scalar(value)))
                    }),
                    Instr::Binary { dst, op, lhs, rhs } => {
                        match (known.get(lhs), known.get(rhs)) {
                            (Some(a), Some(b)) => {
                                let (a, b) = (a.as_scalar(), b.as_scalar());
                                match (a, b) {
                                    (Some(a), Some(b)) => binary_op(a, b, *op)
                                        .ok()
                                        .map(|v| (*dst, Value::Scalar(v))),
                                    _ => None,
                                }
                            }
                            _ => None,
                        }
                    }
                    Instr::Extract { dst, src, index } => known.get(src).and_then(|v| {
                        let array = v.as_array()?;
                        Some((*dst, Value::Scalar(array.get(*index as usize))))
                    }),
                    Instr::Pack { dst, elems } => {
                        let values: Option<Vec<_>> = elems
                            .iter()
                            .map(|r| known.get(r).and_then(|v| v.as_scalar()))
                            .collect();
                        values.and_then(|v| {
                            array_pack(v).ok().map(|a| (*dst, Value::Array(a)))
                        })
                    }
                    Instr::CallInline {
                        dst: Some(dst),
                        name,
                        sig,
                        args,
                    } => {
                        let signature = registry
                            .get(name)
                            .and_then(|g| g.signatures.get(*sig as usize));
                        match signature {
                            Some(signature)
                                if signature.readonly && signature.always_inline =>
                            {
                                let values: Option<Vec<Value>> =
                                    args.iter().map(|r| known.get(r).cloned()).collect();
                                match (values, signature.implementation) {
                                    (Some(values), FnImpl::Inline(f)) => {
                                        Some((*dst, f(&values)))
                                    }
                                    _ => None,
                                }
                            }
                            _ => None,
                        }
                    }
                    _ => None,
                };
                if let Some((dst, value)) = replacement {
                    known.insert(dst, value.clone());
                    *instr = Instr::Const { dst, value };
                    folded += 1;
                }
            }
        }
        if folded > 0 {
            debug!(function = %function.name, folded, "constant folding");
        }
    }
}

fn cast_value(value: Value, ty: AxType) -> Option<Value> {
    match (value, ty) {
        (Value::Scalar(s), AxType::Scalar(t)) => Some(Value::Scalar(arithmetic_cast(s, t))),
        (Value::Array(a), AxType::Array { elem, len }) if a.len() == len as usize => {
            Some(Value::Array(array_cast(a, elem)))
        }
        _ => None,
    }
}

/// Remove pure instructions whose results are never used.
pub fn eliminate_dead_code(module: &mut Module) {
    for function in &mut module.functions {
        let mut live: HashSet<Reg> = HashSet::new();
        for block in &function.blocks {
            if let Terminator::Branch { cond, .. } = block.term {
                live.insert(cond);
            }
        }

        // Propagate liveness to fixpoint: side-effecting instructions
        // root their operands; pure instructions only keep operands
        // alive if their own result is live.
        loop {
            let mut changed = false;
            for block in &function.blocks {
                for instr in &block.instrs {
                    let mut mark = |r: Reg, live: &mut HashSet<Reg>| {
                        if live.insert(r) {
                            changed = true;
                        }
                    };
                    match instr {
                        Instr::StoreSlot { src, .. } | Instr::StoreAttr { src, .. } => {
                            mark(*src, &mut live)
                        }
                        Instr::CallExternal { args, .. } => {
                            for a in args {
                                mark(*a, &mut live);
                            }
                        }
                        Instr::Cast { dst, src, .. } | Instr::Unary { dst, src, .. } => {
                            if live.contains(dst) {
                                mark(*src, &mut live);
                            }
                        }
                        Instr::Binary { dst, lhs, rhs, .. } => {
                            if live.contains(dst) {
                                mark(*lhs, &mut live);
                                mark(*rhs, &mut live);
                            }
                        }
                        Instr::Pack { dst, elems } => {
                            if live.contains(dst) {
                                for e in elems {
                                    mark(*e, &mut live);
                                }
                            }
                        }
                        Instr::Extract { dst, src, .. } => {
                            if live.contains(dst) {
                                mark(*src, &mut live);
                            }
                        }
                        Instr::Insert {
                            dst, src, elem, ..
                        } => {
                            if live.contains(dst) {
                                mark(*src, &mut live);
                                mark(*elem, &mut live);
                            }
                        }
                        Instr::CallInline { dst, args, .. } => {
                            if dst.map(|d| live.contains(&d)).unwrap_or(false) {
                                for a in args {
                                    mark(*a, &mut live);
                                }
                            }
                        }
                        Instr::Const { .. } | Instr::LoadSlot { .. } | Instr::LoadAttr { .. } => {}
                    }
                }
            }
            if !changed {
                break;
            }
        }

        let mut removed = 0usize;
        for block in &mut function.blocks {
            block.instrs.retain(|instr| {
                let keep = match instr {
                    Instr::Const { dst, .. }
                    | Instr::LoadSlot { dst, .. }
                    | Instr::LoadAttr { dst, .. }
                    | Instr::Cast { dst, .. }
                    | Instr::Unary { dst, .. }
                    | Instr::Binary { dst, .. }
                    | Instr::Pack { dst, .. }
                    | Instr::Extract { dst, .. }
                    | Instr::Insert { dst, .. } => live.contains(dst),
                    Instr::CallInline { dst, .. } => {
                        dst.map(|d| live.contains(&d)).unwrap_or(true)
                    }
                    Instr::StoreSlot { .. }
                    | Instr::StoreAttr { .. }
                    | Instr::CallExternal { .. } => true,
                };
                if !keep {
                    removed += 1;
                }
                keep
            });
        }
        if removed > 0 {
            debug!(function = %function.name, removed, "dead-code elimination");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::AttributeRegistry;
    use crate::generator::volume::VolumeGenerator;
    use crate::typing::{resolve_types, TypingOptions};
    use voxl_ast::parse;

    fn generate(src: &str) -> Module {
        let tree = parse(src).unwrap();
        let attrs = AttributeRegistry::scan(&tree).unwrap();
        let registry = FunctionRegistry::with_builtins();
        let resolution =
            resolve_types(&tree, &attrs, &registry, &TypingOptions::default()).unwrap();
        VolumeGenerator::generate(&tree, &attrs, &registry, &resolution).unwrap()
    }

    fn count_instrs(module: &Module, pred: impl Fn(&Instr) -> bool) -> usize {
        module.functions[0]
            .blocks
            .iter()
            .flat_map(|b| b.instrs.iter())
            .filter(|i| pred(i))
            .count()
    }

    #[test]
    fn folds_constant_arithmetic() {
        let mut module = generate("@a = 1.0f + 2.0f;");
        let registry = FunctionRegistry::with_builtins();
        optimize(&mut module, &registry, OptLevel::O2);
        assert_eq!(count_instrs(&module, |i| matches!(i, Instr::Binary { .. })), 0);
    }

    #[test]
    fn folds_readonly_inline_calls() {
        let mut module = generate("@a = abs(-3.0f);");
        let registry = FunctionRegistry::with_builtins();
        optimize(&mut module, &registry, OptLevel::O2);
        assert_eq!(
            count_instrs(&module, |i| matches!(i, Instr::CallInline { .. })),
            0
        );
    }

    #[test]
    fn keeps_trapping_division() {
        let mut module = generate("i@a = 1 / 0;");
        let registry = FunctionRegistry::with_builtins();
        optimize(&mut module, &registry, OptLevel::O2);
        assert_eq!(count_instrs(&module, |i| matches!(i, Instr::Binary { .. })), 1);
    }

    #[test]
    fn removes_unused_loads() {
        let mut module = generate("@a; @b = 1.0f;");
        let registry = FunctionRegistry::with_builtins();
        optimize(&mut module, &registry, OptLevel::O1);
        assert_eq!(
            count_instrs(&module, |i| matches!(i, Instr::LoadAttr { .. })),
            0
        );
        // The store to @b survives.
        assert_eq!(
            count_instrs(&module, |i| matches!(i, Instr::StoreAttr { .. })),
            1
        );
    }

    #[test]
    fn external_calls_are_never_removed() {
        let mut module = generate("getcoordx();");
        let registry = FunctionRegistry::with_builtins();
        optimize(&mut module, &registry, OptLevel::O3);
        assert_eq!(
            count_instrs(&module, |i| matches!(i, Instr::CallExternal { .. })),
            1
        );
    }

    #[test]
    fn level_none_is_identity() {
        let mut module = generate("@a = 1.0f + 2.0f;");
        let before = count_instrs(&module, |_| true);
        let registry = FunctionRegistry::with_builtins();
        optimize(&mut module, &registry, OptLevel::None);
        assert_eq!(count_instrs(&module, |_| true), before);
    }
}
