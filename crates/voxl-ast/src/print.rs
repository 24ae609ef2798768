//! Canonical AST dump.
//!
//! Emits one parenthesised s-expression per top-level statement. The dump
//! is stable across parses of the same source and is what parser and
//! type-resolution tests assert against.

use std::fmt::Write;

use crate::ast::{AssignOp, Expr, ExprKind, Literal, LoopKind, Stmt, StmtKind, Tree};

/// Dump a whole tree, one top-level statement per line.
pub fn dump(tree: &Tree) -> String {
    let mut out = String::new();
    for stmt in &tree.stmts {
        write_stmt(&mut out, stmt);
        out.push('\n');
    }
    out
}

fn assign_symbol(op: AssignOp) -> &'static str {
    match op {
        AssignOp::Assign => "=",
        AssignOp::AddAssign => "+=",
        AssignOp::SubAssign => "-=",
        AssignOp::MulAssign => "*=",
        AssignOp::DivAssign => "/=",
    }
}

fn write_stmt(out: &mut String, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Block(stmts) => {
            out.push_str("(block");
            for s in stmts {
                out.push(' ');
                write_stmt(out, s);
            }
            out.push(')');
        }
        StmtKind::Declare { ty, name, init } => {
            let _ = write!(out, "(decl {ty} {name}");
            if let Some(init) = init {
                out.push(' ');
                write_expr(out, init);
            }
            out.push(')');
        }
        StmtKind::Assign { target, op, value } => {
            let _ = write!(out, "(assign {} ", assign_symbol(*op));
            write_expr(out, target);
            out.push(' ');
            write_expr(out, value);
            out.push(')');
        }
        StmtKind::Expr(expr) => write_expr(out, expr),
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            out.push_str("(if ");
            write_expr(out, cond);
            out.push(' ');
            write_stmt(out, then_branch);
            if let Some(else_branch) = else_branch {
                out.push(' ');
                write_stmt(out, else_branch);
            }
            out.push(')');
        }
        StmtKind::Loop {
            kind,
            init,
            cond,
            step,
            body,
        } => match kind {
            LoopKind::While => {
                out.push_str("(while ");
                write_expr(out, cond.as_ref().expect("while has a condition"));
                out.push(' ');
                write_stmt(out, body);
                out.push(')');
            }
            LoopKind::DoWhile => {
                out.push_str("(do-while ");
                write_stmt(out, body);
                out.push(' ');
                write_expr(out, cond.as_ref().expect("do-while has a condition"));
                out.push(')');
            }
            LoopKind::For => {
                out.push_str("(for ");
                match init {
                    Some(init) => write_stmt(out, init),
                    None => out.push('_'),
                }
                out.push(' ');
                match cond {
                    Some(cond) => write_expr(out, cond),
                    None => out.push('_'),
                }
                out.push(' ');
                match step {
                    Some(step) => write_stmt(out, step),
                    None => out.push('_'),
                }
                out.push(' ');
                write_stmt(out, body);
                out.push(')');
            }
        },
        StmtKind::Break => out.push_str("(break)"),
        StmtKind::Continue => out.push_str("(continue)"),
        StmtKind::Return => out.push_str("(return)"),
    }
}

fn write_expr(out: &mut String, expr: &Expr) {
    match &expr.kind {
        ExprKind::Literal(lit) => {
            let _ = match lit {
                Literal::Bool(v) => write!(out, "(lit {v})"),
                Literal::I32(v) => write!(out, "(lit {v})"),
                Literal::I64(v) => write!(out, "(lit {v}l)"),
                Literal::F32(v) => write!(out, "(lit {v:?}f)"),
                Literal::F64(v) => write!(out, "(lit {v:?})"),
                Literal::Str(v) => write!(out, "(lit {v:?})"),
            };
        }
        ExprKind::Local(name) => {
            let _ = write!(out, "(local {name})");
        }
        ExprKind::Attribute { name, ty } => {
            let _ = match ty {
                Some(ty) => write!(out, "(attr {ty} {name})"),
                None => write!(out, "(attr auto {name})"),
            };
        }
        ExprKind::Cast { ty, expr } => {
            let _ = write!(out, "(cast {ty} ");
            write_expr(out, expr);
            out.push(')');
        }
        ExprKind::Unary { op, expr } => {
            let _ = write!(out, "(unary {} ", op.symbol());
            write_expr(out, expr);
            out.push(')');
        }
        ExprKind::Binary { op, lhs, rhs } => {
            let _ = write!(out, "(binary {} ", op.symbol());
            write_expr(out, lhs);
            out.push(' ');
            write_expr(out, rhs);
            out.push(')');
        }
        ExprKind::Crement {
            target,
            post,
            decrement,
        } => {
            let when = if *post { "post" } else { "pre" };
            let op = if *decrement { "--" } else { "++" };
            let _ = write!(out, "({when}{op} ");
            write_expr(out, target);
            out.push(')');
        }
        ExprKind::Call { name, args } => {
            let _ = write!(out, "(call {name}");
            for arg in args {
                out.push(' ');
                write_expr(out, arg);
            }
            out.push(')');
        }
        ExprKind::Pack(elems) => {
            out.push_str("(pack");
            for e in elems {
                out.push(' ');
                write_expr(out, e);
            }
            out.push(')');
        }
        ExprKind::Index { expr, index } => {
            let _ = write!(out, "(index {index} ");
            write_expr(out, expr);
            out.push(')');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn dump_is_stable_across_parses() {
        let src = "int n = 0; while (n < 3) { n += 1; } @out = float(n);";
        let a = dump(&parse(src).unwrap());
        let b = dump(&parse(src).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn dump_spells_literals_with_suffixes() {
        assert_eq!(
            dump(&parse("@a = 1.0f + 2.0;").unwrap()),
            "(assign = (attr auto a) (binary + (lit 1.0f) (lit 2.0)))\n"
        );
        assert_eq!(dump(&parse("long n = 3l;").unwrap()), "(decl long n (lit 3l))\n");
    }
}
