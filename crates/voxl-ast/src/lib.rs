//! AST, lexer and parser for the Voxl kernel language.
//!
//! Source text enters through [`parse`] and leaves as a [`Tree`]: a
//! statement list whose nodes carry dense [`NodeId`]s and byte-range
//! spans. Later passes (attribute scanning, type resolution, code
//! generation) consume the tree through the [`visitor::Visitor`] trait or
//! by direct matching; annotations live in side tables keyed by node id,
//! never in the tree itself.
//!
//! - [`token`] - logos lexer
//! - [`ast`] - node definitions
//! - [`parser`] - recursive-descent / Pratt parser
//! - [`visitor`] - generic pre-order walker
//! - [`print`] - canonical parenthesised dump used by tests

pub mod ast;
pub mod parser;
pub mod print;
pub mod stream;
pub mod token;
pub mod visitor;

pub use ast::{
    AssignOp, Expr, ExprKind, Literal, LoopKind, NodeId, Span, Stmt, StmtKind, Tree,
};
pub use parser::{parse, ParseError};
pub use print::dump;
pub use visitor::{walk_expr, walk_stmt, walk_tree, Visitor};
