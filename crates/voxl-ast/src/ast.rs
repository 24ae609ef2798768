//! AST node definitions.
//!
//! The tree produced by the parser. Every expression and statement node
//! carries a [`NodeId`] (dense, assigned in parse order) and a byte-range
//! [`Span`]. The type-resolution pass annotates expressions through a side
//! table keyed by `NodeId`, leaving the tree itself immutable after parse.

use serde::{Deserialize, Serialize};
use voxl_types::{AxType, BinaryOp, UnaryOp};

/// Dense node identifier assigned by the parser.
pub type NodeId = u32;

/// Byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Inclusive start byte offset.
    pub start: u32,
    /// Exclusive end byte offset.
    pub end: u32,
}

impl Span {
    /// Construct a span from byte offsets.
    pub fn new(start: usize, end: usize) -> Span {
        Span {
            start: start as u32,
            end: end as u32,
        }
    }

    /// The union of two spans.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A parsed kernel: the top-level statement list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Top-level statements in source order.
    pub stmts: Vec<Stmt>,
    /// Total number of nodes allocated; side tables size to this.
    pub node_count: u32,
}

/// A statement node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    /// Node identifier.
    pub id: NodeId,
    /// Source range.
    pub span: Span,
    /// Statement payload.
    pub kind: StmtKind,
}

/// Statement variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    /// Braced statement list; opens a local scope.
    Block(Vec<Stmt>),
    /// Local declaration: `float x = 1.0f;`. A missing initialiser
    /// defaults to zero of the declared type.
    Declare {
        /// Declared type.
        ty: AxType,
        /// Local name.
        name: String,
        /// Optional initialiser.
        init: Option<Expr>,
    },
    /// Assignment: `target op value;`.
    Assign {
        /// Lvalue expression (local, attribute, or element of one).
        target: Expr,
        /// `=`, `+=`, `-=`, `*=` or `/=`.
        op: AssignOp,
        /// Right-hand side.
        value: Expr,
    },
    /// Bare expression statement.
    Expr(Expr),
    /// `if` / `else`.
    If {
        /// Condition, boolean-coerced.
        cond: Expr,
        /// Taken branch.
        then_branch: Box<Stmt>,
        /// Optional else branch.
        else_branch: Option<Box<Stmt>>,
    },
    /// `while`, `do`/`while` or `for`.
    Loop {
        /// Loop flavour.
        kind: LoopKind,
        /// `for` initialiser, run once in the loop's scope.
        init: Option<Box<Stmt>>,
        /// Condition; `None` only for a `for` with an empty condition.
        cond: Option<Expr>,
        /// `for` step, run after each iteration.
        step: Option<Box<Stmt>>,
        /// Loop body.
        body: Box<Stmt>,
    },
    /// `break;`
    Break,
    /// `continue;`
    Continue,
    /// `return;`
    Return,
}

/// Loop flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopKind {
    /// Test before each iteration.
    While,
    /// Test after each iteration.
    DoWhile,
    /// Init / test / step.
    For,
}

/// Assignment operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `+=`
    AddAssign,
    /// `-=`
    SubAssign,
    /// `*=`
    MulAssign,
    /// `/=`
    DivAssign,
}

impl AssignOp {
    /// The underlying binary operator for compound assignments.
    pub fn binary(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::AddAssign => Some(BinaryOp::Add),
            AssignOp::SubAssign => Some(BinaryOp::Sub),
            AssignOp::MulAssign => Some(BinaryOp::Mul),
            AssignOp::DivAssign => Some(BinaryOp::Div),
        }
    }
}

/// An expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    /// Node identifier.
    pub id: NodeId,
    /// Source range.
    pub span: Span,
    /// Expression payload.
    pub kind: ExprKind,
}

/// Expression variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// Literal value.
    Literal(Literal),
    /// Local variable reference.
    Local(String),
    /// Attribute reference. `ty` is `None` for a bare `@name`, which
    /// defaults to `float`.
    Attribute {
        /// Attribute name.
        name: String,
        /// Explicit type tag from the prefix token, if any.
        ty: Option<AxType>,
    },
    /// Function-style cast: `int(x)`.
    Cast {
        /// Target type.
        ty: AxType,
        /// Operand.
        expr: Box<Expr>,
    },
    /// Unary operation.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        expr: Box<Expr>,
    },
    /// Binary operation.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// Pre/post increment or decrement of an lvalue.
    Crement {
        /// Target lvalue.
        target: Box<Expr>,
        /// True for `x++` / `x--`, false for the prefix forms.
        post: bool,
        /// True for decrement.
        decrement: bool,
    },
    /// Built-in function call.
    Call {
        /// Function name.
        name: String,
        /// Arguments in source order.
        args: Vec<Expr>,
    },
    /// Vector pack: `{x, y, z}` or `{x, y, z, w}`.
    Pack(Vec<Expr>),
    /// Element access with a literal index: `v[1]`. Bounds are checked
    /// during type resolution.
    Index {
        /// Array-typed operand.
        expr: Box<Expr>,
        /// Literal element index.
        index: u8,
    },
}

/// Literal values with their lexical type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// `true` / `false`
    Bool(bool),
    /// `1`
    I32(i32),
    /// `1l`
    I64(i64),
    /// `1.0f`
    F32(f32),
    /// `1.0`
    F64(f64),
    /// `"text"`
    Str(String),
}

impl Literal {
    /// The lexical type of the literal.
    pub fn ty(&self) -> AxType {
        use voxl_types::ScalarType;
        match self {
            Literal::Bool(_) => AxType::Scalar(ScalarType::Bool),
            Literal::I32(_) => AxType::Scalar(ScalarType::I32),
            Literal::I64(_) => AxType::Scalar(ScalarType::I64),
            Literal::F32(_) => AxType::Scalar(ScalarType::F32),
            Literal::F64(_) => AxType::Scalar(ScalarType::F64),
            Literal::Str(_) => AxType::Str,
        }
    }
}

impl Expr {
    /// True if this expression can appear on the left of an assignment:
    /// a local, an attribute, or a literal-indexed element of one.
    pub fn is_lvalue(&self) -> bool {
        match &self.kind {
            ExprKind::Local(_) | ExprKind::Attribute { .. } => true,
            ExprKind::Index { expr, .. } => expr.is_lvalue(),
            _ => false,
        }
    }
}
