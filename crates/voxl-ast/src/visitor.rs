//! AST visitor.
//!
//! A single trait with one hook per node variant; all hooks have default
//! implementations, so visitors only override the variants they care
//! about. Each `visit_*` hook is called BEFORE recursing into children;
//! returning `false` skips the children of that node. The free functions
//! [`walk_stmt`] and [`walk_expr`] own the recursion.

use crate::ast::{AssignOp, Expr, ExprKind, Literal, LoopKind, Stmt, StmtKind, Tree};
use voxl_types::{AxType, BinaryOp, UnaryOp};

/// Visitor over statements and expressions.
pub trait Visitor {
    /// Visit a block. Children: the contained statements.
    fn visit_block(&mut self, _stmts: &[Stmt]) -> bool {
        true
    }

    /// Visit a local declaration. Children: the initialiser, if any.
    fn visit_declare(&mut self, _ty: AxType, _name: &str) -> bool {
        true
    }

    /// Visit an assignment. Children: target, value.
    fn visit_assign(&mut self, _op: AssignOp) -> bool {
        true
    }

    /// Visit an `if`. Children: condition, branches.
    fn visit_if(&mut self) -> bool {
        true
    }

    /// Visit a loop. Children: init, condition, step, body.
    fn visit_loop(&mut self, _kind: LoopKind) -> bool {
        true
    }

    /// Visit `break`.
    fn visit_break(&mut self) {}

    /// Visit `continue`.
    fn visit_continue(&mut self) {}

    /// Visit `return`.
    fn visit_return(&mut self) {}

    /// Visit a literal.
    fn visit_literal(&mut self, _value: &Literal) {}

    /// Visit a local variable reference.
    fn visit_local(&mut self, _name: &str) {}

    /// Visit an attribute reference.
    fn visit_attribute(&mut self, _name: &str, _ty: Option<AxType>) {}

    /// Visit a cast. Children: the operand.
    fn visit_cast(&mut self, _ty: AxType) -> bool {
        true
    }

    /// Visit a unary operation. Children: the operand.
    fn visit_unary(&mut self, _op: UnaryOp) -> bool {
        true
    }

    /// Visit a binary operation. Children: lhs, rhs.
    fn visit_binary(&mut self, _op: BinaryOp) -> bool {
        true
    }

    /// Visit a crement. Children: the target.
    fn visit_crement(&mut self, _post: bool, _decrement: bool) -> bool {
        true
    }

    /// Visit a function call. Children: the arguments.
    fn visit_call(&mut self, _name: &str) -> bool {
        true
    }

    /// Visit a vector pack. Children: the elements.
    fn visit_pack(&mut self, _len: usize) -> bool {
        true
    }

    /// Visit an element access. Children: the array operand.
    fn visit_index(&mut self, _index: u8) -> bool {
        true
    }
}

/// Walk every statement of a tree in source order.
pub fn walk_tree<V: Visitor>(visitor: &mut V, tree: &Tree) {
    for stmt in &tree.stmts {
        walk_stmt(visitor, stmt);
    }
}

/// Recurse into a statement.
pub fn walk_stmt<V: Visitor>(visitor: &mut V, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Block(stmts) => {
            if visitor.visit_block(stmts) {
                for s in stmts {
                    walk_stmt(visitor, s);
                }
            }
        }
        StmtKind::Declare { ty, name, init } => {
            if visitor.visit_declare(*ty, name) {
                if let Some(init) = init {
                    walk_expr(visitor, init);
                }
            }
        }
        StmtKind::Assign { target, op, value } => {
            if visitor.visit_assign(*op) {
                walk_expr(visitor, target);
                walk_expr(visitor, value);
            }
        }
        StmtKind::Expr(expr) => walk_expr(visitor, expr),
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            if visitor.visit_if() {
                walk_expr(visitor, cond);
                walk_stmt(visitor, then_branch);
                if let Some(else_branch) = else_branch {
                    walk_stmt(visitor, else_branch);
                }
            }
        }
        StmtKind::Loop {
            kind,
            init,
            cond,
            step,
            body,
        } => {
            if visitor.visit_loop(*kind) {
                if let Some(init) = init {
                    walk_stmt(visitor, init);
                }
                if let Some(cond) = cond {
                    walk_expr(visitor, cond);
                }
                if let Some(step) = step {
                    walk_stmt(visitor, step);
                }
                walk_stmt(visitor, body);
            }
        }
        StmtKind::Break => visitor.visit_break(),
        StmtKind::Continue => visitor.visit_continue(),
        StmtKind::Return => visitor.visit_return(),
    }
}

/// Recurse into an expression.
pub fn walk_expr<V: Visitor>(visitor: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::Literal(value) => visitor.visit_literal(value),
        ExprKind::Local(name) => visitor.visit_local(name),
        ExprKind::Attribute { name, ty } => visitor.visit_attribute(name, *ty),
        ExprKind::Cast { ty, expr } => {
            if visitor.visit_cast(*ty) {
                walk_expr(visitor, expr);
            }
        }
        ExprKind::Unary { op, expr } => {
            if visitor.visit_unary(*op) {
                walk_expr(visitor, expr);
            }
        }
        ExprKind::Binary { op, lhs, rhs } => {
            if visitor.visit_binary(*op) {
                walk_expr(visitor, lhs);
                walk_expr(visitor, rhs);
            }
        }
        ExprKind::Crement {
            target,
            post,
            decrement,
        } => {
            if visitor.visit_crement(*post, *decrement) {
                walk_expr(visitor, target);
            }
        }
        ExprKind::Call { name, args } => {
            if visitor.visit_call(name) {
                for arg in args {
                    walk_expr(visitor, arg);
                }
            }
        }
        ExprKind::Pack(elems) => {
            if visitor.visit_pack(elems.len()) {
                for e in elems {
                    walk_expr(visitor, e);
                }
            }
        }
        ExprKind::Index { expr, index } => {
            if visitor.visit_index(*index) {
                walk_expr(visitor, expr);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[derive(Default)]
    struct Counter {
        attributes: Vec<String>,
        calls: Vec<String>,
        literals: usize,
    }

    impl Visitor for Counter {
        fn visit_attribute(&mut self, name: &str, _ty: Option<AxType>) {
            self.attributes.push(name.to_string());
        }
        fn visit_call(&mut self, name: &str) -> bool {
            self.calls.push(name.to_string());
            true
        }
        fn visit_literal(&mut self, _value: &Literal) {
            self.literals += 1;
        }
    }

    #[test]
    fn walks_every_node() {
        let tree = parse("@a = abs(@b) + 1.0f; if (@a > 2.0f) @a = 0.0f;").unwrap();
        let mut counter = Counter::default();
        walk_tree(&mut counter, &tree);
        assert_eq!(counter.attributes, vec!["a", "b", "a", "a"]);
        assert_eq!(counter.calls, vec!["abs"]);
        assert_eq!(counter.literals, 3);
    }

    #[test]
    fn returning_false_skips_children() {
        struct SkipCalls {
            locals: usize,
        }
        impl Visitor for SkipCalls {
            fn visit_call(&mut self, _name: &str) -> bool {
                false
            }
            fn visit_local(&mut self, _name: &str) {
                self.locals += 1;
            }
        }
        let tree = parse("int x; int y = abs(x);").unwrap();
        let mut v = SkipCalls { locals: 0 };
        walk_tree(&mut v, &tree);
        assert_eq!(v.locals, 0);
    }
}
