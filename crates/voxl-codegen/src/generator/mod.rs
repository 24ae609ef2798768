//! Compute generators: lowering the typed AST to IR.
//!
//! [`ComputeGenerator`] owns everything both execution targets share -
//! declarations, expressions, assignments, control flow, short-circuit
//! logic, calls. The two targets differ only in their entry-function ABI
//! and in how an `@attribute` reference lowers: the volume generator
//! emits direct [`Instr::LoadAttr`]/[`Instr::StoreAttr`] against the
//! pre-fetched leaf buffers, the point generator routes loads and stores
//! through typed external helpers. See [`volume`] and [`point`].
//!
//! Lowering conventions:
//!
//! - Every value lives in a fresh virtual register; mutable storage
//!   (locals, logical-operator temporaries) lives in stack slots the
//!   engine zero-initialises per invocation.
//! - Compound assignment evaluates the target place once.
//! - Vector and matrix arithmetic lowers to elementwise scalar
//!   operations with scalar operands broadcast.
//! - `&&` / `||` branch around the right-hand side.
//! - `return` jumps to the function's unique epilogue block.

pub mod point;
pub mod volume;

use tracing::debug;

use voxl_ast::{Expr, ExprKind, Literal, LoopKind, Span, Stmt, StmtKind, Tree};
use voxl_registry::{FnImpl, FunctionRegistry};
use voxl_types::{AxType, BinaryOp, Scalar, ScalarType, UnaryOp, Value};

use crate::attrs::AttributeRegistry;
use crate::error::{CodegenError, ErrorKind};
use crate::ir::{
    AbiParam, Block, BlockId, ExternalDecl, Function, Instr, Module, Reg, SlotId, SlotInfo,
    Terminator,
};
use crate::symbols::{Symbol, SymbolTable};
use crate::typing::{binary_typing, Resolution};

/// Which kernel flavour is being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    /// Per-voxel kernel with direct attribute buffer access.
    Volume,
    /// Per-point kernel with handle-based attribute access.
    Point,
}

struct BlockDraft {
    instrs: Vec<Instr>,
    term: Option<Terminator>,
}

struct LoopTargets {
    continue_to: BlockId,
    break_to: BlockId,
}

/// An addressable storage location, resolved once per assignment.
enum Place {
    Slot { slot: SlotId, ty: AxType },
    Attr { index: u16, ty: AxType },
    Element { base: Box<Place>, index: u8, elem: ScalarType },
}

impl Place {
    fn ty(&self) -> AxType {
        match self {
            Place::Slot { ty, .. } | Place::Attr { ty, .. } => *ty,
            Place::Element { elem, .. } => AxType::Scalar(*elem),
        }
    }
}

pub(crate) struct ComputeGenerator<'a> {
    attrs: &'a AttributeRegistry,
    registry: &'a FunctionRegistry,
    resolution: &'a Resolution,
    target: Target,
    module: Module,
    name: String,
    params: Vec<AbiParam>,
    blocks: Vec<BlockDraft>,
    current: BlockId,
    slots: Vec<SlotInfo>,
    next_reg: Reg,
    epilogue: BlockId,
    symbols: SymbolTable,
    loops: Vec<LoopTargets>,
}

impl<'a> ComputeGenerator<'a> {
    pub(crate) fn new(
        target: Target,
        name: &str,
        params: Vec<AbiParam>,
        attrs: &'a AttributeRegistry,
        registry: &'a FunctionRegistry,
        resolution: &'a Resolution,
    ) -> Self {
        let entry = BlockDraft {
            instrs: Vec::new(),
            term: None,
        };
        let epilogue = BlockDraft {
            instrs: Vec::new(),
            term: Some(Terminator::Return),
        };
        ComputeGenerator {
            attrs,
            registry,
            resolution,
            target,
            module: Module::default(),
            name: name.to_string(),
            params,
            blocks: vec![entry, epilogue],
            current: BlockId(0),
            slots: Vec::new(),
            next_reg: 0,
            epilogue: BlockId(1),
            symbols: SymbolTable::new(),
            loops: Vec::new(),
        }
    }

    /// Lower the whole tree and assemble the module.
    pub(crate) fn generate(mut self, tree: &Tree) -> Result<Module, CodegenError> {
        for stmt in &tree.stmts {
            self.stmt(stmt)?;
        }
        self.terminate(Terminator::Jump(self.epilogue));

        let blocks = self
            .blocks
            .into_iter()
            .map(|draft| Block {
                instrs: draft.instrs,
                // Unterminated drafts are unreachable continuations left
                // behind by break/continue/return; route them out.
                term: draft.term.unwrap_or(Terminator::Jump(self.epilogue)),
            })
            .collect();
        let function = Function {
            name: self.name,
            params: self.params,
            slots: self.slots,
            blocks,
            epilogue: self.epilogue,
            reg_count: self.next_reg,
        };
        debug!(
            blocks = function.blocks.len(),
            slots = function.slots.len(),
            regs = function.reg_count,
            externals = self.module.externals.len(),
            "kernel lowering complete"
        );
        self.module.functions.push(function);
        Ok(self.module)
    }

    // === Builder primitives ===

    fn reg(&mut self) -> Reg {
        let r = self.next_reg;
        self.next_reg += 1;
        r
    }

    fn emit(&mut self, instr: Instr) {
        self.blocks[self.current.0 as usize].instrs.push(instr);
    }

    fn start_block(&mut self) -> BlockId {
        self.blocks.push(BlockDraft {
            instrs: Vec::new(),
            term: None,
        });
        BlockId((self.blocks.len() - 1) as u32)
    }

    fn switch_to(&mut self, block: BlockId) {
        self.current = block;
    }

    /// Set the current block's terminator if it does not have one yet.
    fn terminate(&mut self, term: Terminator) {
        let draft = &mut self.blocks[self.current.0 as usize];
        if draft.term.is_none() {
            draft.term = Some(term);
        }
    }

    fn add_slot(&mut self, name: &str, ty: AxType) -> SlotId {
        self.slots.push(SlotInfo {
            name: name.to_string(),
            ty,
        });
        SlotId((self.slots.len() - 1) as u32)
    }

    fn temp_slot(&mut self, ty: AxType) -> SlotId {
        let name = format!("$t{}", self.slots.len());
        self.add_slot(&name, ty)
    }

    fn const_value(&mut self, value: Value) -> Reg {
        let dst = self.reg();
        self.emit(Instr::Const { dst, value });
        dst
    }

    /// Convert a register between types; no-op when equal.
    fn convert(&mut self, src: Reg, from: AxType, to: AxType) -> Reg {
        if from == to {
            return src;
        }
        let dst = self.reg();
        self.emit(Instr::Cast { dst, src, ty: to });
        dst
    }

    fn coerce_bool(&mut self, src: Reg, from: AxType) -> Reg {
        self.convert(src, from, AxType::Scalar(ScalarType::Bool))
    }

    fn ty_of(&self, expr: &Expr) -> AxType {
        self.resolution.expect_type(expr.id)
    }

    // === Statements ===

    fn stmt(&mut self, stmt: &Stmt) -> Result<(), CodegenError> {
        match &stmt.kind {
            StmtKind::Block(stmts) => {
                self.symbols.push();
                for s in stmts {
                    self.stmt(s)?;
                }
                self.symbols.pop();
                Ok(())
            }
            StmtKind::Declare { ty, name, init } => {
                let slot = self.add_slot(name, *ty);
                // Slots are zeroed per invocation; only explicit
                // initialisers need a store.
                if let Some(init) = init {
                    let init_ty = self.ty_of(init);
                    let value = self.expr(init)?;
                    let value = self.convert(value, init_ty, *ty);
                    self.emit(Instr::StoreSlot { slot, src: value });
                }
                if !self.symbols.declare(name, Symbol { ty: *ty, slot }) {
                    return Err(CodegenError::new(
                        ErrorKind::Internal,
                        stmt.span,
                        format!("redeclaration of '{name}' survived type resolution"),
                    ));
                }
                Ok(())
            }
            StmtKind::Assign { target, op, value } => {
                let place = self.place(target)?;
                let value_ty = self.ty_of(value);
                let value_reg = self.expr(value)?;
                let result = match op.binary() {
                    Some(binary) => {
                        let current = self.load_place(&place);
                        let bt = binary_typing(binary, place.ty(), value_ty)
                            .map_err(|(kind, message)| {
                                CodegenError::new(kind, stmt.span, message)
                            })?;
                        let result =
                            self.binary_values(binary, current, place.ty(), value_reg, value_ty);
                        self.convert(result, bt.result, place.ty())
                    }
                    None => self.convert(value_reg, value_ty, place.ty()),
                };
                self.store_place(&place, result);
                Ok(())
            }
            StmtKind::Expr(expr) => {
                self.expr_maybe_void(expr)?;
                Ok(())
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond_ty = self.ty_of(cond);
                let cond_reg = self.expr(cond)?;
                let cond_reg = self.coerce_bool(cond_reg, cond_ty);
                let then_block = self.start_block();
                let merge = self.start_block();
                let else_block = if else_branch.is_some() {
                    self.start_block()
                } else {
                    merge
                };
                self.terminate(Terminator::Branch {
                    cond: cond_reg,
                    then_block,
                    else_block,
                });
                self.switch_to(then_block);
                self.stmt(then_branch)?;
                self.terminate(Terminator::Jump(merge));
                if let Some(else_branch) = else_branch {
                    self.switch_to(else_block);
                    self.stmt(else_branch)?;
                    self.terminate(Terminator::Jump(merge));
                }
                self.switch_to(merge);
                Ok(())
            }
            StmtKind::Loop {
                kind,
                init,
                cond,
                step,
                body,
            } => self.lower_loop(*kind, init.as_deref(), cond.as_ref(), step.as_deref(), body),
            StmtKind::Break => {
                let Some(targets) = self.loops.last() else {
                    return Err(CodegenError::new(
                        ErrorKind::Internal,
                        stmt.span,
                        "'break' outside a loop survived type resolution",
                    ));
                };
                let target = targets.break_to;
                self.terminate(Terminator::Jump(target));
                let dead = self.start_block();
                self.switch_to(dead);
                Ok(())
            }
            StmtKind::Continue => {
                let Some(targets) = self.loops.last() else {
                    return Err(CodegenError::new(
                        ErrorKind::Internal,
                        stmt.span,
                        "'continue' outside a loop survived type resolution",
                    ));
                };
                let target = targets.continue_to;
                self.terminate(Terminator::Jump(target));
                let dead = self.start_block();
                self.switch_to(dead);
                Ok(())
            }
            StmtKind::Return => {
                self.terminate(Terminator::Jump(self.epilogue));
                let dead = self.start_block();
                self.switch_to(dead);
                Ok(())
            }
        }
    }

    fn lower_loop(
        &mut self,
        kind: LoopKind,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        step: Option<&Stmt>,
        body: &Stmt,
    ) -> Result<(), CodegenError> {
        self.symbols.push();
        if let Some(init) = init {
            self.stmt(init)?;
        }

        match kind {
            LoopKind::While | LoopKind::For => {
                let cond_block = self.start_block();
                let body_block = self.start_block();
                let exit = self.start_block();
                // `for` steps through a dedicated block so `continue`
                // still runs the step.
                let step_block = if kind == LoopKind::For && step.is_some() {
                    self.start_block()
                } else {
                    cond_block
                };
                self.terminate(Terminator::Jump(cond_block));

                self.switch_to(cond_block);
                match cond {
                    Some(cond) => {
                        let ty = self.ty_of(cond);
                        let reg = self.expr(cond)?;
                        let reg = self.coerce_bool(reg, ty);
                        self.terminate(Terminator::Branch {
                            cond: reg,
                            then_block: body_block,
                            else_block: exit,
                        });
                    }
                    None => self.terminate(Terminator::Jump(body_block)),
                }

                self.loops.push(LoopTargets {
                    continue_to: step_block,
                    break_to: exit,
                });
                self.switch_to(body_block);
                self.stmt(body)?;
                self.terminate(Terminator::Jump(step_block));
                self.loops.pop();

                if let Some(step) = step {
                    if step_block != cond_block {
                        self.switch_to(step_block);
                        self.stmt(step)?;
                        self.terminate(Terminator::Jump(cond_block));
                    }
                }
                self.switch_to(exit);
            }
            LoopKind::DoWhile => {
                let body_block = self.start_block();
                let cond_block = self.start_block();
                let exit = self.start_block();
                self.terminate(Terminator::Jump(body_block));

                self.loops.push(LoopTargets {
                    continue_to: cond_block,
                    break_to: exit,
                });
                self.switch_to(body_block);
                self.stmt(body)?;
                self.terminate(Terminator::Jump(cond_block));
                self.loops.pop();

                self.switch_to(cond_block);
                let cond = cond.expect("do-while has a condition");
                let ty = self.ty_of(cond);
                let reg = self.expr(cond)?;
                let reg = self.coerce_bool(reg, ty);
                self.terminate(Terminator::Branch {
                    cond: reg,
                    then_block: body_block,
                    else_block: exit,
                });
                self.switch_to(exit);
            }
        }
        self.symbols.pop();
        Ok(())
    }

    // === Places ===

    fn attr_index(&self, name: &str, span: Span) -> Result<(u16, AxType), CodegenError> {
        let index = self.attrs.index_of(name).ok_or_else(|| {
            CodegenError::new(
                ErrorKind::Internal,
                span,
                format!("attribute '@{name}' missing from the registry"),
            )
        })?;
        let entry = self.attrs.entry(index).expect("index came from the registry");
        if entry.ty == AxType::Str {
            // String attributes parse and type-resolve but the kernel ABI
            // does not carry them.
            return Err(CodegenError::new(
                ErrorKind::Type,
                span,
                format!("string attribute '@{name}' is not supported in kernels"),
            ));
        }
        Ok((index as u16, entry.ty))
    }

    fn place(&mut self, expr: &Expr) -> Result<Place, CodegenError> {
        match &expr.kind {
            ExprKind::Local(name) => {
                let symbol = self.symbols.lookup(name).ok_or_else(|| {
                    CodegenError::new(
                        ErrorKind::Internal,
                        expr.span,
                        format!("undeclared local '{name}' survived type resolution"),
                    )
                })?;
                Ok(Place::Slot {
                    slot: symbol.slot,
                    ty: symbol.ty,
                })
            }
            ExprKind::Attribute { name, .. } => {
                let (index, ty) = self.attr_index(name, expr.span)?;
                Ok(Place::Attr { index, ty })
            }
            ExprKind::Index { expr: inner, index } => {
                let base = self.place(inner)?;
                let elem = match base.ty() {
                    AxType::Array { elem, .. } => elem,
                    other => {
                        return Err(CodegenError::new(
                            ErrorKind::Internal,
                            expr.span,
                            format!("indexing non-array {other} survived type resolution"),
                        ))
                    }
                };
                Ok(Place::Element {
                    base: Box::new(base),
                    index: *index,
                    elem,
                })
            }
            _ => Err(CodegenError::new(
                ErrorKind::Internal,
                expr.span,
                "non-lvalue assignment target survived parsing",
            )),
        }
    }

    fn load_place(&mut self, place: &Place) -> Reg {
        match place {
            Place::Slot { slot, .. } => {
                let dst = self.reg();
                self.emit(Instr::LoadSlot { dst, slot: *slot });
                dst
            }
            Place::Attr { index, ty } => self.attr_load(*index, *ty),
            Place::Element { base, index, .. } => {
                let array = self.load_place(base);
                let dst = self.reg();
                self.emit(Instr::Extract {
                    dst,
                    src: array,
                    index: *index,
                });
                dst
            }
        }
    }

    fn store_place(&mut self, place: &Place, value: Reg) {
        match place {
            Place::Slot { slot, .. } => self.emit(Instr::StoreSlot {
                slot: *slot,
                src: value,
            }),
            Place::Attr { index, ty } => self.attr_store(*index, *ty, value),
            Place::Element { base, index, .. } => {
                let array = self.load_place(base);
                let dst = self.reg();
                self.emit(Instr::Insert {
                    dst,
                    src: array,
                    index: *index,
                    elem: value,
                });
                self.store_place(base, dst);
            }
        }
    }

    fn attr_load(&mut self, index: u16, ty: AxType) -> Reg {
        match self.target {
            Target::Volume => {
                let dst = self.reg();
                self.emit(Instr::LoadAttr { dst, attr: index });
                dst
            }
            Target::Point => {
                let ext = self.module.declare_external(ExternalDecl {
                    symbol: point::attr_load_symbol(ty),
                    params: vec![AxType::Scalar(ScalarType::I32)],
                    ret: Some(ty),
                });
                let index_reg = self.const_value(Value::Scalar(Scalar::I32(index as i32)));
                let dst = self.reg();
                self.emit(Instr::CallExternal {
                    dst: Some(dst),
                    ext,
                    args: vec![index_reg],
                });
                dst
            }
        }
    }

    fn attr_store(&mut self, index: u16, ty: AxType, value: Reg) {
        match self.target {
            Target::Volume => self.emit(Instr::StoreAttr {
                attr: index,
                src: value,
            }),
            Target::Point => {
                let ext = self.module.declare_external(ExternalDecl {
                    symbol: point::attr_store_symbol(ty),
                    params: vec![AxType::Scalar(ScalarType::I32), ty],
                    ret: None,
                });
                let index_reg = self.const_value(Value::Scalar(Scalar::I32(index as i32)));
                self.emit(Instr::CallExternal {
                    dst: None,
                    ext,
                    args: vec![index_reg, value],
                });
            }
        }
    }

    // === Expressions ===

    fn expr(&mut self, expr: &Expr) -> Result<Reg, CodegenError> {
        match self.expr_maybe_void(expr)? {
            Some(reg) => Ok(reg),
            None => Err(CodegenError::new(
                ErrorKind::Internal,
                expr.span,
                "void call in value position survived type resolution",
            )),
        }
    }

    fn expr_maybe_void(&mut self, expr: &Expr) -> Result<Option<Reg>, CodegenError> {
        let reg = match &expr.kind {
            ExprKind::Literal(lit) => self.const_value(literal_value(lit)),
            ExprKind::Local(_) | ExprKind::Attribute { .. } => {
                let place = self.place(expr)?;
                self.load_place(&place)
            }
            ExprKind::Cast { ty, expr: inner } => {
                let from = self.ty_of(inner);
                let reg = self.expr(inner)?;
                self.convert(reg, from, *ty)
            }
            ExprKind::Unary { op, expr: inner } => {
                let ty = self.ty_of(inner);
                let reg = self.expr(inner)?;
                self.unary_values(*op, reg, ty)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                if matches!(op, BinaryOp::And | BinaryOp::Or) {
                    self.short_circuit(*op, lhs, rhs)?
                } else {
                    let lt = self.ty_of(lhs);
                    let rt = self.ty_of(rhs);
                    let lr = self.expr(lhs)?;
                    let rr = self.expr(rhs)?;
                    self.binary_values(*op, lr, lt, rr, rt)
                }
            }
            ExprKind::Crement {
                target,
                post,
                decrement,
            } => {
                let place = self.place(target)?;
                let ty = place.ty();
                let old = self.load_place(&place);
                let one = self.const_value(one_of(ty));
                let op = if *decrement {
                    BinaryOp::Sub
                } else {
                    BinaryOp::Add
                };
                let new = self.reg();
                self.emit(Instr::Binary {
                    dst: new,
                    op,
                    lhs: old,
                    rhs: one,
                });
                self.store_place(&place, new);
                if *post {
                    old
                } else {
                    new
                }
            }
            ExprKind::Call { name, args } => return self.call(expr, name, args),
            ExprKind::Pack(elems) => {
                let AxType::Array { elem, .. } = self.ty_of(expr) else {
                    unreachable!("pack resolves to an array type");
                };
                let mut regs = Vec::with_capacity(elems.len());
                for e in elems {
                    let ty = self.ty_of(e);
                    let reg = self.expr(e)?;
                    regs.push(self.convert(reg, ty, AxType::Scalar(elem)));
                }
                let dst = self.reg();
                self.emit(Instr::Pack { dst, elems: regs });
                dst
            }
            ExprKind::Index { expr: inner, index } => {
                let reg = self.expr(inner)?;
                let dst = self.reg();
                self.emit(Instr::Extract {
                    dst,
                    src: reg,
                    index: *index,
                });
                dst
            }
        };
        Ok(Some(reg))
    }

    fn call(
        &mut self,
        expr: &Expr,
        name: &str,
        args: &[Expr],
    ) -> Result<Option<Reg>, CodegenError> {
        let sig_index = self.resolution.selection(expr.id).ok_or_else(|| {
            CodegenError::new(
                ErrorKind::Internal,
                expr.span,
                format!("call to '{name}' has no overload selection"),
            )
        })?;
        let group = self.registry.get(name).ok_or_else(|| {
            CodegenError::new(
                ErrorKind::Internal,
                expr.span,
                format!("builtin '{name}' missing from the registry"),
            )
        })?;
        let signature = &group.signatures[sig_index as usize];

        let mut arg_regs = Vec::with_capacity(args.len());
        for (arg, &param) in args.iter().zip(&signature.params) {
            let ty = self.ty_of(arg);
            let reg = self.expr(arg)?;
            arg_regs.push(self.convert(reg, ty, param));
        }

        let dst = signature.ret.map(|_| self.reg());
        match signature.implementation {
            FnImpl::Inline(_) => self.emit(Instr::CallInline {
                dst,
                name: name.to_string(),
                sig: sig_index,
                args: arg_regs,
            }),
            FnImpl::External(symbol) => {
                let ext = self.module.declare_external(ExternalDecl {
                    symbol: symbol.to_string(),
                    params: signature.params.clone(),
                    ret: signature.ret,
                });
                self.emit(Instr::CallExternal {
                    dst,
                    ext,
                    args: arg_regs,
                });
            }
        }
        Ok(dst)
    }

    fn short_circuit(
        &mut self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<Reg, CodegenError> {
        let slot = self.temp_slot(AxType::Scalar(ScalarType::Bool));
        let lt = self.ty_of(lhs);
        let lr = self.expr(lhs)?;
        let lb = self.coerce_bool(lr, lt);
        self.emit(Instr::StoreSlot { slot, src: lb });

        let rhs_block = self.start_block();
        let merge = self.start_block();
        let term = match op {
            BinaryOp::And => Terminator::Branch {
                cond: lb,
                then_block: rhs_block,
                else_block: merge,
            },
            BinaryOp::Or => Terminator::Branch {
                cond: lb,
                then_block: merge,
                else_block: rhs_block,
            },
            _ => unreachable!("short-circuit lowering only handles && and ||"),
        };
        self.terminate(term);

        self.switch_to(rhs_block);
        let rt = self.ty_of(rhs);
        let rr = self.expr(rhs)?;
        let rb = self.coerce_bool(rr, rt);
        self.emit(Instr::StoreSlot { slot, src: rb });
        self.terminate(Terminator::Jump(merge));

        self.switch_to(merge);
        let dst = self.reg();
        self.emit(Instr::LoadSlot { dst, slot });
        Ok(dst)
    }

    fn unary_values(&mut self, op: UnaryOp, reg: Reg, ty: AxType) -> Reg {
        match ty {
            AxType::Array { len, .. } => {
                // Elementwise negation; `!`/`~` on arrays are rejected by
                // type resolution.
                let mut elems = Vec::with_capacity(len as usize);
                for index in 0..len {
                    let e = self.reg();
                    self.emit(Instr::Extract {
                        dst: e,
                        src: reg,
                        index,
                    });
                    let out = self.reg();
                    self.emit(Instr::Unary {
                        dst: out,
                        op,
                        src: e,
                    });
                    elems.push(out);
                }
                let dst = self.reg();
                self.emit(Instr::Pack { dst, elems });
                dst
            }
            _ => {
                let dst = self.reg();
                self.emit(Instr::Unary { dst, op, src: reg });
                dst
            }
        }
    }

    /// Lower a non-logical binary operation over two already-lowered
    /// operands, promoting and broadcasting as needed.
    fn binary_values(&mut self, op: BinaryOp, lr: Reg, lt: AxType, rr: Reg, rt: AxType) -> Reg {
        let bt = binary_typing(op, lt, rt)
            .expect("operand combination was validated during type resolution");
        match bt.operand {
            AxType::Scalar(_) => {
                let a = self.convert(lr, lt, bt.operand);
                let b = self.convert(rr, rt, bt.operand);
                let dst = self.reg();
                self.emit(Instr::Binary {
                    dst,
                    op,
                    lhs: a,
                    rhs: b,
                });
                dst
            }
            AxType::Array { elem, len } => {
                let lhs_elems = self.spread(lr, lt, elem, len);
                let rhs_elems = self.spread(rr, rt, elem, len);
                let mut results = Vec::with_capacity(len as usize);
                for (a, b) in lhs_elems.into_iter().zip(rhs_elems) {
                    let dst = self.reg();
                    self.emit(Instr::Binary {
                        dst,
                        op,
                        lhs: a,
                        rhs: b,
                    });
                    results.push(dst);
                }
                match op {
                    // Array equality folds elementwise results to one bool.
                    BinaryOp::Eq => self.fold_bool(results, BinaryOp::BitAnd),
                    BinaryOp::Ne => self.fold_bool(results, BinaryOp::BitOr),
                    _ => {
                        let dst = self.reg();
                        self.emit(Instr::Pack {
                            dst,
                            elems: results,
                        });
                        dst
                    }
                }
            }
            AxType::Str => unreachable!("strings have no binary operators"),
        }
    }

    /// Produce `len` element registers of type `elem` from a scalar
    /// (broadcast) or array (extract + convert) operand.
    fn spread(&mut self, reg: Reg, ty: AxType, elem: ScalarType, len: u8) -> Vec<Reg> {
        match ty {
            AxType::Scalar(_) => {
                let converted = self.convert(reg, ty, AxType::Scalar(elem));
                vec![converted; len as usize]
            }
            AxType::Array {
                elem: source_elem, ..
            } => (0..len)
                .map(|index| {
                    let e = self.reg();
                    self.emit(Instr::Extract {
                        dst: e,
                        src: reg,
                        index,
                    });
                    self.convert(e, AxType::Scalar(source_elem), AxType::Scalar(elem))
                })
                .collect(),
            AxType::Str => unreachable!("strings have no binary operators"),
        }
    }

    fn fold_bool(&mut self, regs: Vec<Reg>, op: BinaryOp) -> Reg {
        let mut acc = regs[0];
        for &r in &regs[1..] {
            let dst = self.reg();
            self.emit(Instr::Binary {
                dst,
                op,
                lhs: acc,
                rhs: r,
            });
            acc = dst;
        }
        acc
    }
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Bool(v) => Value::Scalar(Scalar::Bool(*v)),
        Literal::I32(v) => Value::Scalar(Scalar::I32(*v)),
        Literal::I64(v) => Value::Scalar(Scalar::I64(*v)),
        Literal::F32(v) => Value::Scalar(Scalar::F32(*v)),
        Literal::F64(v) => Value::Scalar(Scalar::F64(*v)),
        Literal::Str(v) => Value::Str(v.clone()),
    }
}

fn one_of(ty: AxType) -> Value {
    match ty {
        AxType::Scalar(ScalarType::I8) => Value::Scalar(Scalar::I8(1)),
        AxType::Scalar(ScalarType::I16) => Value::Scalar(Scalar::I16(1)),
        AxType::Scalar(ScalarType::I32) => Value::Scalar(Scalar::I32(1)),
        AxType::Scalar(ScalarType::I64) => Value::Scalar(Scalar::I64(1)),
        AxType::Scalar(ScalarType::F32) => Value::Scalar(Scalar::F32(1.0)),
        AxType::Scalar(ScalarType::F64) => Value::Scalar(Scalar::F64(1.0)),
        other => unreachable!("crement on {other} rejected during type resolution"),
    }
}
