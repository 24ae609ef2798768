//! Attribute registry and the attribute-scanning pre-pass.
//!
//! Before code generation, the tree is scanned for every `@name`
//! reference. The scan fixes each attribute's type (a bare `@name`
//! defaults to `float`; explicit prefixes must agree across the kernel)
//! and its access pattern, and the resulting registry is frozen: codegen
//! emits attribute indices into it, and the executable materialises
//! missing attributes from it before running.

use indexmap::IndexMap;

use voxl_ast::{AssignOp, Expr, ExprKind, Span, Stmt, StmtKind, Tree};
use voxl_types::{AxType, ScalarType};

use crate::error::{CodegenError, ErrorKind};

/// How a kernel touches an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Only loaded.
    Read,
    /// Only stored.
    Write,
    /// Both.
    ReadWrite,
}

impl Access {
    fn merge(self, other: Access) -> Access {
        if self == other {
            self
        } else {
            Access::ReadWrite
        }
    }

    /// True if the kernel stores to the attribute.
    pub fn writes(self) -> bool {
        matches!(self, Access::Write | Access::ReadWrite)
    }
}

/// One registered attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeEntry {
    /// Attribute name.
    pub name: String,
    /// Resolved type.
    pub ty: AxType,
    /// Access pattern.
    pub access: Access,
}

/// The frozen per-compilation attribute set, in first-reference order.
#[derive(Debug, Clone, Default)]
pub struct AttributeRegistry {
    entries: IndexMap<String, AttributeEntry>,
}

impl AttributeRegistry {
    /// Scan a tree and build the registry.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::UnknownAttribute`] when two references to one
    /// attribute disagree on its type.
    pub fn scan(tree: &Tree) -> Result<AttributeRegistry, CodegenError> {
        let mut registry = AttributeRegistry::default();
        for stmt in &tree.stmts {
            registry.scan_stmt(stmt)?;
        }
        Ok(registry)
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the kernel references no attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of an attribute in registration order.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.get_index_of(name)
    }

    /// Entry by name.
    pub fn get(&self, name: &str) -> Option<&AttributeEntry> {
        self.entries.get(name)
    }

    /// Entry by registration index.
    pub fn entry(&self, index: usize) -> Option<&AttributeEntry> {
        self.entries.get_index(index).map(|(_, e)| e)
    }

    /// Iterate entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &AttributeEntry> {
        self.entries.values()
    }

    fn record(
        &mut self,
        name: &str,
        ty: AxType,
        access: Access,
        span: Span,
    ) -> Result<(), CodegenError> {
        match self.entries.get_mut(name) {
            Some(entry) => {
                if entry.ty != ty {
                    return Err(CodegenError::new(
                        ErrorKind::UnknownAttribute,
                        span,
                        format!(
                            "attribute '@{name}' referenced as both {} and {ty}",
                            entry.ty
                        ),
                    ));
                }
                entry.access = entry.access.merge(access);
            }
            None => {
                self.entries.insert(
                    name.to_string(),
                    AttributeEntry {
                        name: name.to_string(),
                        ty,
                        access,
                    },
                );
            }
        }
        Ok(())
    }

    /// Record an lvalue expression with the given access. Element stores
    /// read the containing array and write it back.
    fn record_place(&mut self, expr: &Expr, access: Access) -> Result<(), CodegenError> {
        match &expr.kind {
            ExprKind::Attribute { name, ty } => {
                self.record(name, attribute_type(*ty), access, expr.span)
            }
            ExprKind::Index { expr, .. } => self.record_place(expr, Access::ReadWrite),
            _ => Ok(()),
        }
    }

    fn scan_stmt(&mut self, stmt: &Stmt) -> Result<(), CodegenError> {
        match &stmt.kind {
            StmtKind::Block(stmts) => {
                for s in stmts {
                    self.scan_stmt(s)?;
                }
            }
            StmtKind::Declare { init, .. } => {
                if let Some(init) = init {
                    self.scan_expr(init)?;
                }
            }
            StmtKind::Assign { target, op, value } => {
                let access = if *op == AssignOp::Assign
                    && matches!(target.kind, ExprKind::Attribute { .. })
                {
                    Access::Write
                } else {
                    Access::ReadWrite
                };
                self.record_place(target, access)?;
                self.scan_expr(value)?;
            }
            StmtKind::Expr(expr) => self.scan_expr(expr)?,
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.scan_expr(cond)?;
                self.scan_stmt(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.scan_stmt(else_branch)?;
                }
            }
            StmtKind::Loop {
                init,
                cond,
                step,
                body,
                ..
            } => {
                if let Some(init) = init {
                    self.scan_stmt(init)?;
                }
                if let Some(cond) = cond {
                    self.scan_expr(cond)?;
                }
                if let Some(step) = step {
                    self.scan_stmt(step)?;
                }
                self.scan_stmt(body)?;
            }
            StmtKind::Break | StmtKind::Continue | StmtKind::Return => {}
        }
        Ok(())
    }

    fn scan_expr(&mut self, expr: &Expr) -> Result<(), CodegenError> {
        match &expr.kind {
            ExprKind::Attribute { name, ty } => {
                self.record(name, attribute_type(*ty), Access::Read, expr.span)
            }
            ExprKind::Crement { target, .. } => self.record_place(target, Access::ReadWrite),
            ExprKind::Literal(_) | ExprKind::Local(_) => Ok(()),
            ExprKind::Cast { expr, .. }
            | ExprKind::Unary { expr, .. }
            | ExprKind::Index { expr, .. } => self.scan_expr(expr),
            ExprKind::Binary { lhs, rhs, .. } => {
                self.scan_expr(lhs)?;
                self.scan_expr(rhs)
            }
            ExprKind::Call { args, .. } => {
                for arg in args {
                    self.scan_expr(arg)?;
                }
                Ok(())
            }
            ExprKind::Pack(elems) => {
                for e in elems {
                    self.scan_expr(e)?;
                }
                Ok(())
            }
        }
    }
}

fn attribute_type(ty: Option<AxType>) -> AxType {
    // A bare @name is a float attribute.
    ty.unwrap_or(AxType::Scalar(ScalarType::F32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxl_ast::parse;

    fn scan(src: &str) -> AttributeRegistry {
        AttributeRegistry::scan(&parse(src).unwrap()).unwrap()
    }

    #[test]
    fn bare_attribute_defaults_to_float() {
        let registry = scan("@density = @density * 2.0f;");
        let entry = registry.get("density").unwrap();
        assert_eq!(entry.ty, AxType::Scalar(ScalarType::F32));
        assert_eq!(entry.access, Access::ReadWrite);
    }

    #[test]
    fn pure_write_is_write_only() {
        let registry = scan("i@count = 0;");
        assert_eq!(registry.get("count").unwrap().access, Access::Write);
    }

    #[test]
    fn separate_reads_and_writes_stay_separate() {
        let registry = scan("i@count = 0; if (@density > 5.0f) i@count = 1;");
        assert_eq!(registry.get("count").unwrap().access, Access::Write);
        assert_eq!(registry.get("density").unwrap().access, Access::Read);
        // Registration order is first-reference order.
        assert_eq!(registry.index_of("count"), Some(0));
        assert_eq!(registry.index_of("density"), Some(1));
    }

    #[test]
    fn matching_prefix_and_bare_agree() {
        let registry = scan("f@x = @x + 1.0f;");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("x").unwrap().access, Access::ReadWrite);
    }

    #[test]
    fn conflicting_types_error() {
        let tree = parse("i@x = 0; @x = 1.0f;").unwrap();
        let err = AttributeRegistry::scan(&tree).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownAttribute);
    }

    #[test]
    fn element_store_is_read_write() {
        let registry = scan("v@P[0] = 1.0f;");
        assert_eq!(registry.get("P").unwrap().access, Access::ReadWrite);
    }

    #[test]
    fn crement_is_read_write() {
        let registry = scan("i@n++;");
        assert_eq!(registry.get("n").unwrap().access, Access::ReadWrite);
    }

    #[test]
    fn compound_assign_reads() {
        let registry = scan("v@P += {0.0f, 1.0f, 0.0f};");
        assert_eq!(registry.get("P").unwrap().access, Access::ReadWrite);
        assert_eq!(registry.get("P").unwrap().ty, AxType::VEC3F);
    }
}
