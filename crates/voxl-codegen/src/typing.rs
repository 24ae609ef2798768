//! Type resolution.
//!
//! A single pass that annotates every value-producing expression with its
//! resolved type, selects an overload for every call site, and collects
//! warnings (narrowing, implicit bitwise float casts, dead code, unused
//! locals). Annotations live in a [`Resolution`] side table keyed by node
//! id; the pass is a pure function of its inputs, so resolving the same
//! tree twice yields identical annotations.

use indexmap::IndexMap;
use tracing::debug;

use voxl_ast::{Expr, ExprKind, NodeId, Span, Stmt, StmtKind, Tree};
use voxl_registry::{FunctionRegistry, OverloadError};
use voxl_types::{AxType, BinaryOp, OpKind, ScalarType, UnaryOp};

use crate::attrs::AttributeRegistry;
use crate::error::{CodegenError, ErrorKind, Warning, WarningKind};

/// Options that change typing behaviour.
#[derive(Debug, Clone)]
pub struct TypingOptions {
    /// Permit assigning a float-typed value to an integer lvalue with a
    /// truncating conversion and a narrowing warning. When false the
    /// same program is a type error.
    pub allow_implicit_float_to_int: bool,
}

impl Default for TypingOptions {
    fn default() -> Self {
        TypingOptions {
            allow_implicit_float_to_int: true,
        }
    }
}

/// The annotations produced by type resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    types: Vec<Option<AxType>>,
    selections: Vec<Option<u16>>,
    /// Warnings in emission order.
    pub warnings: Vec<Warning>,
}

impl Resolution {
    /// The resolved type of an expression node, if it produces a value.
    pub fn type_of(&self, id: NodeId) -> Option<AxType> {
        self.types[id as usize]
    }

    /// The resolved type of a value expression.
    ///
    /// # Panics
    ///
    /// Panics if the node was not annotated; after a successful pass
    /// every value expression is.
    pub fn expect_type(&self, id: NodeId) -> AxType {
        self.types[id as usize].expect("expression was annotated during type resolution")
    }

    /// The selected overload index for a call node.
    pub fn selection(&self, id: NodeId) -> Option<u16> {
        self.selections[id as usize]
    }
}

/// The promoted typing of one binary operation.
pub(crate) struct BinaryTyping {
    /// Type both operands are converted to (elementwise for arrays).
    pub operand: AxType,
    /// Result type of the operation.
    pub result: AxType,
    /// True when a bitwise operator met a floating operand and both
    /// sides implicitly cast to `long`.
    pub float_bitwise: bool,
}

/// Compute operand/result types of a binary operation, or an error
/// category and message.
pub(crate) fn binary_typing(
    op: BinaryOp,
    lt: AxType,
    rt: AxType,
) -> Result<BinaryTyping, (ErrorKind, String)> {
    let invalid = |kind: ErrorKind| {
        (
            kind,
            format!("invalid operands {lt} and {rt} for binary '{}'", op.symbol()),
        )
    };
    if lt == AxType::Str || rt == AxType::Str {
        return Err(invalid(ErrorKind::Type));
    }

    match op.kind() {
        OpKind::Logical => match (lt, rt) {
            (AxType::Scalar(_), AxType::Scalar(_)) => Ok(BinaryTyping {
                operand: AxType::Scalar(ScalarType::Bool),
                result: AxType::Scalar(ScalarType::Bool),
                float_bitwise: false,
            }),
            _ => Err(invalid(ErrorKind::BinaryOperation)),
        },
        OpKind::Comparison => match (lt, rt) {
            (AxType::Scalar(a), AxType::Scalar(b)) => Ok(BinaryTyping {
                operand: AxType::Scalar(a.max(b)),
                result: AxType::Scalar(ScalarType::Bool),
                float_bitwise: false,
            }),
            (AxType::Array { elem: ea, len: la }, AxType::Array { elem: eb, len: lb })
                if la == lb && matches!(op, BinaryOp::Eq | BinaryOp::Ne) =>
            {
                Ok(BinaryTyping {
                    operand: AxType::Array {
                        elem: ea.max(eb),
                        len: la,
                    },
                    result: AxType::Scalar(ScalarType::Bool),
                    float_bitwise: false,
                })
            }
            _ => Err(invalid(ErrorKind::BinaryOperation)),
        },
        OpKind::Arithmetic => match (lt, rt) {
            (AxType::Scalar(a), AxType::Scalar(b)) => {
                let p = AxType::Scalar(a.max(b));
                Ok(BinaryTyping {
                    operand: p,
                    result: p,
                    float_bitwise: false,
                })
            }
            (AxType::Array { elem: ea, len: la }, AxType::Array { elem: eb, len: lb }) => {
                if la != lb {
                    return Err(invalid(ErrorKind::Type));
                }
                let p = AxType::Array {
                    elem: ea.max(eb),
                    len: la,
                };
                Ok(BinaryTyping {
                    operand: p,
                    result: p,
                    float_bitwise: false,
                })
            }
            (AxType::Array { elem, len }, AxType::Scalar(s))
            | (AxType::Scalar(s), AxType::Array { elem, len }) => {
                let p = AxType::Array {
                    elem: elem.max(s),
                    len,
                };
                Ok(BinaryTyping {
                    operand: p,
                    result: p,
                    float_bitwise: false,
                })
            }
            _ => Err(invalid(ErrorKind::Type)),
        },
        OpKind::Bitwise => match (lt, rt) {
            (AxType::Scalar(a), AxType::Scalar(b)) => {
                if a.is_float() || b.is_float() {
                    Ok(BinaryTyping {
                        operand: AxType::Scalar(ScalarType::I64),
                        result: AxType::Scalar(ScalarType::I64),
                        float_bitwise: true,
                    })
                } else {
                    let p = AxType::Scalar(a.max(b));
                    Ok(BinaryTyping {
                        operand: p,
                        result: p,
                        float_bitwise: false,
                    })
                }
            }
            _ => Err(invalid(ErrorKind::BinaryOperation)),
        },
    }
}

/// True if an explicit cast from `from` to `to` is representable.
pub(crate) fn cast_valid(from: AxType, to: AxType) -> bool {
    match (from, to) {
        (AxType::Scalar(_), AxType::Scalar(_)) => true,
        (AxType::Array { len: la, .. }, AxType::Array { len: lb, .. }) => la == lb,
        (AxType::Str, AxType::Str) => true,
        _ => false,
    }
}

struct Local {
    ty: AxType,
    span: Span,
    read: bool,
}

/// Resolve the types of a tree.
///
/// # Errors
///
/// The first type, overload, or binary-operation error encountered.
pub fn resolve_types(
    tree: &Tree,
    attrs: &AttributeRegistry,
    registry: &FunctionRegistry,
    options: &TypingOptions,
) -> Result<Resolution, CodegenError> {
    let mut typing = Typing {
        attrs,
        registry,
        options,
        resolution: Resolution {
            types: vec![None; tree.node_count as usize],
            selections: vec![None; tree.node_count as usize],
            warnings: Vec::new(),
        },
        scopes: vec![IndexMap::new()],
        loop_depth: 0,
    };
    typing.stmt_list(&tree.stmts)?;
    typing.close_scope();
    debug!(
        warnings = typing.resolution.warnings.len(),
        "type resolution complete"
    );
    Ok(typing.resolution)
}

struct Typing<'a> {
    attrs: &'a AttributeRegistry,
    registry: &'a FunctionRegistry,
    options: &'a TypingOptions,
    resolution: Resolution,
    scopes: Vec<IndexMap<String, Local>>,
    loop_depth: u32,
}

impl<'a> Typing<'a> {
    fn error(&self, kind: ErrorKind, span: Span, message: impl Into<String>) -> CodegenError {
        CodegenError::new(kind, span, message)
    }

    fn warn(&mut self, kind: WarningKind, span: Span, message: impl Into<String>) {
        self.resolution.warnings.push(Warning::new(kind, span, message));
    }

    fn open_scope(&mut self) {
        self.scopes.push(IndexMap::new());
    }

    fn close_scope(&mut self) {
        let scope = self.scopes.pop().expect("typing scope underflow");
        for (name, local) in scope {
            if !local.read {
                self.warn(
                    WarningKind::UnusedLocal,
                    local.span,
                    format!("local '{name}' is never read"),
                );
            }
        }
    }

    fn declare_local(&mut self, name: &str, ty: AxType, span: Span) -> Result<(), CodegenError> {
        let scope = self.scopes.last_mut().expect("typing has a scope");
        if scope.contains_key(name) {
            return Err(self.error(
                ErrorKind::Type,
                span,
                format!("redeclaration of local '{name}'"),
            ));
        }
        scope.insert(
            name.to_string(),
            Local {
                ty,
                span,
                read: false,
            },
        );
        Ok(())
    }

    fn lookup_local(&mut self, name: &str, mark_read: bool) -> Option<AxType> {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(local) = scope.get_mut(name) {
                if mark_read {
                    local.read = true;
                }
                return Some(local.ty);
            }
        }
        None
    }

    fn stmt_list(&mut self, stmts: &[Stmt]) -> Result<(), CodegenError> {
        let mut warned_dead = false;
        let mut terminated = false;
        for stmt in stmts {
            if terminated && !warned_dead {
                self.warn(WarningKind::DeadCode, stmt.span, "statement is unreachable");
                warned_dead = true;
            }
            self.stmt(stmt)?;
            if matches!(
                stmt.kind,
                StmtKind::Break | StmtKind::Continue | StmtKind::Return
            ) {
                terminated = true;
            }
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<(), CodegenError> {
        match &stmt.kind {
            StmtKind::Block(stmts) => {
                self.open_scope();
                self.stmt_list(stmts)?;
                self.close_scope();
                Ok(())
            }
            StmtKind::Declare { ty, name, init } => {
                if let Some(init) = init {
                    let init_ty = self.expr(init)?;
                    self.check_assign(*ty, init_ty, init.span)?;
                }
                self.declare_local(name, *ty, stmt.span)
            }
            StmtKind::Assign { target, op, value } => {
                let target_ty = self.place(target)?;
                let value_ty = self.expr(value)?;
                let effective = match op.binary() {
                    Some(binary) => {
                        let typing = binary_typing(binary, target_ty, value_ty)
                            .map_err(|(kind, message)| self.error(kind, stmt.span, message))?;
                        typing.result
                    }
                    None => value_ty,
                };
                self.check_assign(target_ty, effective, value.span)
            }
            StmtKind::Expr(expr) => {
                self.expr_or_void(expr, true)?;
                Ok(())
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.condition(cond)?;
                self.stmt(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.stmt(else_branch)?;
                }
                Ok(())
            }
            StmtKind::Loop {
                init,
                cond,
                step,
                body,
                ..
            } => {
                // The init declaration scopes to the loop.
                self.open_scope();
                if let Some(init) = init {
                    self.stmt(init)?;
                }
                if let Some(cond) = cond {
                    self.condition(cond)?;
                }
                if let Some(step) = step {
                    self.stmt(step)?;
                }
                self.loop_depth += 1;
                let result = self.stmt(body);
                self.loop_depth -= 1;
                self.close_scope();
                result
            }
            StmtKind::Break | StmtKind::Continue => {
                if self.loop_depth == 0 {
                    let keyword = if matches!(stmt.kind, StmtKind::Break) {
                        "break"
                    } else {
                        "continue"
                    };
                    return Err(self.error(
                        ErrorKind::Type,
                        stmt.span,
                        format!("'{keyword}' outside of a loop"),
                    ));
                }
                Ok(())
            }
            StmtKind::Return => Ok(()),
        }
    }

    fn condition(&mut self, cond: &Expr) -> Result<(), CodegenError> {
        let ty = self.expr(cond)?;
        match ty {
            AxType::Scalar(_) => Ok(()),
            other => Err(self.error(
                ErrorKind::Type,
                cond.span,
                format!("condition must be scalar, found {other}"),
            )),
        }
    }

    /// Type an lvalue without marking locals as read.
    fn place(&mut self, expr: &Expr) -> Result<AxType, CodegenError> {
        let ty = match &expr.kind {
            ExprKind::Local(name) => self.lookup_local(name, false).ok_or_else(|| {
                self.error(
                    ErrorKind::Type,
                    expr.span,
                    format!("use of undeclared local '{name}'"),
                )
            })?,
            ExprKind::Attribute { name, .. } => self.attribute_type(name, expr.span)?,
            ExprKind::Index { expr: inner, index } => {
                let inner_ty = self.place(inner)?;
                self.index_type(inner_ty, *index, expr.span)?
            }
            _ => {
                return Err(self.error(
                    ErrorKind::Type,
                    expr.span,
                    "expression is not assignable",
                ))
            }
        };
        self.resolution.types[expr.id as usize] = Some(ty);
        Ok(ty)
    }

    fn attribute_type(&self, name: &str, span: Span) -> Result<AxType, CodegenError> {
        let entry = self.attrs.get(name).ok_or_else(|| {
            self.error(
                ErrorKind::Internal,
                span,
                format!("attribute '@{name}' missing from the registry"),
            )
        })?;
        Ok(entry.ty)
    }

    fn index_type(&self, ty: AxType, index: u8, span: Span) -> Result<AxType, CodegenError> {
        match ty {
            AxType::Array { elem, len } => {
                if index >= len {
                    Err(self.error(
                        ErrorKind::Type,
                        span,
                        format!("index {index} out of bounds for {ty}"),
                    ))
                } else {
                    Ok(AxType::Scalar(elem))
                }
            }
            other => Err(self.error(
                ErrorKind::Type,
                span,
                format!("cannot index non-array type {other}"),
            )),
        }
    }

    fn expr(&mut self, expr: &Expr) -> Result<AxType, CodegenError> {
        match self.expr_or_void(expr, false)? {
            Some(ty) => Ok(ty),
            None => unreachable!("void calls rejected when a value is required"),
        }
    }

    fn expr_or_void(
        &mut self,
        expr: &Expr,
        allow_void: bool,
    ) -> Result<Option<AxType>, CodegenError> {
        let ty = match &expr.kind {
            ExprKind::Literal(lit) => lit.ty(),
            ExprKind::Local(name) => {
                let Some(ty) = self.lookup_local(name, true) else {
                    return Err(self.error(
                        ErrorKind::Type,
                        expr.span,
                        format!("use of undeclared local '{name}'"),
                    ));
                };
                ty
            }
            ExprKind::Attribute { name, .. } => self.attribute_type(name, expr.span)?,
            ExprKind::Cast { ty, expr: inner } => {
                let from = self.expr(inner)?;
                if !cast_valid(from, *ty) {
                    return Err(self.error(
                        ErrorKind::Type,
                        expr.span,
                        format!("cannot cast {from} to {ty}"),
                    ));
                }
                *ty
            }
            ExprKind::Unary { op, expr: inner } => {
                let inner_ty = self.expr(inner)?;
                self.unary_type(*op, inner_ty, expr.span)?
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lt = self.expr(lhs)?;
                let rt = self.expr(rhs)?;
                let typing = binary_typing(*op, lt, rt)
                    .map_err(|(kind, message)| self.error(kind, expr.span, message))?;
                if typing.float_bitwise {
                    self.warn(
                        WarningKind::BitwiseFloatCast,
                        expr.span,
                        "implicit cast from float to int",
                    );
                }
                typing.result
            }
            ExprKind::Crement { target, .. } => {
                let ty = self.place(target)?;
                match ty {
                    AxType::Scalar(s) if s != ScalarType::Bool => ty,
                    other => {
                        return Err(self.error(
                            ErrorKind::Type,
                            expr.span,
                            format!("cannot increment or decrement {other}"),
                        ))
                    }
                }
            }
            ExprKind::Call { name, args } => {
                let mut arg_types = Vec::with_capacity(args.len());
                for arg in args {
                    arg_types.push(self.expr(arg)?);
                }
                let (index, signature) =
                    self.registry.select(name, &arg_types).map_err(|e| {
                        let kind = match e {
                            OverloadError::NotFound { .. } => ErrorKind::FunctionLookup,
                            OverloadError::Ambiguous { .. } => ErrorKind::AmbiguousOverload,
                        };
                        self.error(kind, expr.span, e.to_string())
                    })?;
                self.resolution.selections[expr.id as usize] = Some(index as u16);
                match signature.ret {
                    Some(ty) => ty,
                    None => {
                        if !allow_void {
                            return Err(self.error(
                                ErrorKind::Type,
                                expr.span,
                                format!("'{name}' returns no value"),
                            ));
                        }
                        return Ok(None);
                    }
                }
            }
            ExprKind::Pack(elems) => {
                let mut common = ScalarType::Bool;
                for elem in elems {
                    match self.expr(elem)? {
                        AxType::Scalar(s) => common = common.max(s),
                        other => {
                            return Err(self.error(
                                ErrorKind::Type,
                                elem.span,
                                format!("vector pack elements must be scalar, found {other}"),
                            ))
                        }
                    }
                }
                AxType::Array {
                    elem: common,
                    len: elems.len() as u8,
                }
            }
            ExprKind::Index { expr: inner, index } => {
                let inner_ty = self.expr(inner)?;
                self.index_type(inner_ty, *index, expr.span)?
            }
        };
        self.resolution.types[expr.id as usize] = Some(ty);
        Ok(Some(ty))
    }

    fn unary_type(&self, op: UnaryOp, ty: AxType, span: Span) -> Result<AxType, CodegenError> {
        match op {
            UnaryOp::Neg => match ty {
                AxType::Scalar(_) | AxType::Array { .. } => Ok(ty),
                AxType::Str => Err(self.error(ErrorKind::Type, span, "cannot negate a string")),
            },
            UnaryOp::Not => match ty {
                AxType::Scalar(_) => Ok(AxType::Scalar(ScalarType::Bool)),
                other => Err(self.error(
                    ErrorKind::Type,
                    span,
                    format!("'!' requires a scalar operand, found {other}"),
                )),
            },
            UnaryOp::BitNot => match ty {
                AxType::Scalar(s) if !s.is_float() => Ok(ty),
                other => Err(self.error(
                    ErrorKind::Type,
                    span,
                    format!("'~' requires an integer operand, found {other}"),
                )),
            },
        }
    }

    fn check_assign(
        &mut self,
        target: AxType,
        value: AxType,
        span: Span,
    ) -> Result<(), CodegenError> {
        if target == value {
            return Ok(());
        }
        let mismatch = || {
            CodegenError::new(
                ErrorKind::Type,
                span,
                format!("cannot assign {value} to {target}"),
            )
        };
        match (target, value) {
            (AxType::Scalar(t), AxType::Scalar(v)) => self.check_scalar_assign(t, v, span),
            (AxType::Array { elem: te, len: tl }, AxType::Array { elem: ve, len: vl }) => {
                if tl != vl {
                    return Err(mismatch());
                }
                self.check_scalar_assign(te, ve, span)
            }
            _ => Err(mismatch()),
        }
    }

    fn check_scalar_assign(
        &mut self,
        target: ScalarType,
        value: ScalarType,
        span: Span,
    ) -> Result<(), CodegenError> {
        if value.is_float() && target.is_integer() {
            if !self.options.allow_implicit_float_to_int {
                return Err(self.error(
                    ErrorKind::Type,
                    span,
                    format!("implicit conversion from {value} to {target} requires a cast"),
                ));
            }
            self.warn(
                WarningKind::Narrowing,
                span,
                format!("implicit truncation from {value} to {target}"),
            );
        } else if value > target && target != ScalarType::Bool {
            self.warn(
                WarningKind::Narrowing,
                span,
                format!("narrowing conversion from {value} to {target}"),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxl_ast::parse;

    fn resolve(src: &str) -> Result<(voxl_ast::Tree, Resolution), CodegenError> {
        let tree = parse(src).unwrap();
        let attrs = AttributeRegistry::scan(&tree)?;
        let registry = FunctionRegistry::with_builtins();
        let resolution = resolve_types(&tree, &attrs, &registry, &TypingOptions::default())?;
        Ok((tree, resolution))
    }

    fn find_binary(tree: &voxl_ast::Tree) -> NodeId {
        // First top-level statement is `... = <binary>` or an expression.
        fn from_expr(e: &Expr) -> Option<NodeId> {
            match &e.kind {
                ExprKind::Binary { .. } => Some(e.id),
                ExprKind::Cast { expr, .. } | ExprKind::Unary { expr, .. } => from_expr(expr),
                _ => None,
            }
        }
        for stmt in &tree.stmts {
            let found = match &stmt.kind {
                StmtKind::Assign { value, .. } => from_expr(value),
                StmtKind::Expr(e) => from_expr(e),
                StmtKind::Declare { init: Some(e), .. } => from_expr(e),
                _ => None,
            };
            if let Some(id) = found {
                return id;
            }
        }
        panic!("no binary expression found");
    }

    #[test]
    fn mixed_attribute_addition_promotes_to_float() {
        // @a: float, @b: long -> result float.
        let (tree, resolution) = resolve("f@out = @a + l@b;").unwrap();
        let id = find_binary(&tree);
        assert_eq!(resolution.type_of(id), Some(AxType::Scalar(ScalarType::F32)));
    }

    #[test]
    fn resolution_is_idempotent() {
        let tree = parse("int x = 1; @a = @a + float(x); if (@a > 2.0f) x++;").unwrap();
        let attrs = AttributeRegistry::scan(&tree).unwrap();
        let registry = FunctionRegistry::with_builtins();
        let options = TypingOptions::default();
        let a = resolve_types(&tree, &attrs, &registry, &options).unwrap();
        let b = resolve_types(&tree, &attrs, &registry, &options).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn narrowing_assignment_warns_once() {
        let (_, resolution) = resolve("i@a = i@a * 2; i@a = i@a + 0.5;").unwrap();
        let narrowing: Vec<_> = resolution
            .warnings
            .iter()
            .filter(|w| w.kind == WarningKind::Narrowing)
            .collect();
        assert_eq!(narrowing.len(), 1);
    }

    #[test]
    fn float_to_int_rejected_when_disallowed() {
        let tree = parse("i@a = 1.5;").unwrap();
        let attrs = AttributeRegistry::scan(&tree).unwrap();
        let registry = FunctionRegistry::with_builtins();
        let options = TypingOptions {
            allow_implicit_float_to_int: false,
        };
        let err = resolve_types(&tree, &attrs, &registry, &options).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn bitwise_on_float_warns_and_types_long() {
        let (tree, resolution) = resolve("l@m = l@m | @f;").unwrap();
        let id = find_binary(&tree);
        assert_eq!(resolution.type_of(id), Some(AxType::Scalar(ScalarType::I64)));
        assert!(resolution
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::BitwiseFloatCast));
    }

    #[test]
    fn logical_on_vectors_is_a_binary_operation_error() {
        let tree = parse("bool b = v@P && v@P;").unwrap();
        let attrs = AttributeRegistry::scan(&tree).unwrap();
        let registry = FunctionRegistry::with_builtins();
        let err = resolve_types(&tree, &attrs, &registry, &TypingOptions::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BinaryOperation);
    }

    #[test]
    fn comparisons_type_bool() {
        let (tree, resolution) = resolve("bool b = @a > 5.0f;").unwrap();
        let id = find_binary(&tree);
        assert_eq!(
            resolution.type_of(id),
            Some(AxType::Scalar(ScalarType::Bool))
        );
    }

    #[test]
    fn vector_scalar_broadcast() {
        let (tree, resolution) = resolve("v@P = v@P * 2.0f;").unwrap();
        let id = find_binary(&tree);
        assert_eq!(resolution.type_of(id), Some(AxType::VEC3F));
    }

    #[test]
    fn undeclared_local_is_a_type_error() {
        let tree = parse("@a = x;").unwrap();
        let attrs = AttributeRegistry::scan(&tree).unwrap();
        let registry = FunctionRegistry::with_builtins();
        let err = resolve_types(&tree, &attrs, &registry, &TypingOptions::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
        assert!(err.message.contains("undeclared"));
    }

    #[test]
    fn unknown_function_is_a_lookup_error() {
        let tree = parse("@a = widget(1);").unwrap();
        let attrs = AttributeRegistry::scan(&tree).unwrap();
        let registry = FunctionRegistry::with_builtins();
        let err = resolve_types(&tree, &attrs, &registry, &TypingOptions::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::FunctionLookup);
    }

    #[test]
    fn call_selection_recorded() {
        let (tree, resolution) = resolve("@a = abs(@a);").unwrap();
        // Find the call node.
        fn find_call(e: &Expr) -> Option<NodeId> {
            match &e.kind {
                ExprKind::Call { .. } => Some(e.id),
                _ => None,
            }
        }
        let mut call = None;
        for stmt in &tree.stmts {
            if let StmtKind::Assign { value, .. } = &stmt.kind {
                call = find_call(value);
            }
        }
        let call = call.unwrap();
        // abs overloads: (int, long, float, double); @a is float -> index 2.
        assert_eq!(resolution.selection(call), Some(2));
    }

    #[test]
    fn void_call_rejected_as_value() {
        let tree = parse("@a = addtogroup(\"g\");").unwrap();
        let attrs = AttributeRegistry::scan(&tree).unwrap();
        let registry = FunctionRegistry::with_builtins();
        let err = resolve_types(&tree, &attrs, &registry, &TypingOptions::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn void_call_fine_as_statement() {
        assert!(resolve("addtogroup(\"g\");").is_ok());
    }

    #[test]
    fn index_bounds_checked() {
        let tree = parse("float x = v@P[3];").unwrap();
        let attrs = AttributeRegistry::scan(&tree).unwrap();
        let registry = FunctionRegistry::with_builtins();
        let err = resolve_types(&tree, &attrs, &registry, &TypingOptions::default()).unwrap_err();
        assert!(err.message.contains("out of bounds"));
    }

    #[test]
    fn break_outside_loop_rejected() {
        let tree = parse("break;").unwrap();
        let attrs = AttributeRegistry::scan(&tree).unwrap();
        let registry = FunctionRegistry::with_builtins();
        assert!(resolve_types(&tree, &attrs, &registry, &TypingOptions::default()).is_err());
    }

    #[test]
    fn dead_code_and_unused_local_warn() {
        let (_, resolution) =
            resolve("int unused = 1; while (@a > 0.0f) { break; @a = 0.0f; }").unwrap();
        assert!(resolution
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::DeadCode));
        assert!(resolution
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::UnusedLocal));
    }

    #[test]
    fn crement_preserves_type() {
        let (tree, resolution) = resolve("i@n = 0; i@n++;").unwrap();
        let mut crement = None;
        for stmt in &tree.stmts {
            if let StmtKind::Expr(e) = &stmt.kind {
                if matches!(e.kind, ExprKind::Crement { .. }) {
                    crement = Some(e.id);
                }
            }
        }
        assert_eq!(
            resolution.type_of(crement.unwrap()),
            Some(AxType::Scalar(ScalarType::I32))
        );
    }
}
