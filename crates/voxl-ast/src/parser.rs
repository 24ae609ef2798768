//! Recursive-descent parser for Voxl kernel source.
//!
//! Statements are parsed by dispatch on the leading token; expressions use
//! Pratt parsing (precedence climbing) with C operator precedence. The
//! parser assigns every node a dense [`NodeId`] in creation order so later
//! passes can annotate the tree through side tables.

use logos::Logos;
use thiserror::Error;
use voxl_types::{AxType, BinaryOp, ScalarType, UnaryOp};

use crate::ast::{
    AssignOp, Expr, ExprKind, Literal, LoopKind, NodeId, Span, Stmt, StmtKind, Tree,
};
use crate::stream::TokenStream;
use crate::token::Token;

/// Syntax error with the offending source range.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ParseError {
    /// Human-readable description.
    pub message: String,
    /// Offending byte range.
    pub span: Span,
}

impl ParseError {
    /// Construct from a message and span.
    pub fn new(message: impl Into<String>, span: Span) -> ParseError {
        ParseError {
            message: message.into(),
            span,
        }
    }

    /// "expected X, found Y" helper.
    pub fn expected(expected: Token, found: Option<Token>, span: Span) -> ParseError {
        let message = match found {
            Some(found) => format!("expected {expected}, found {found}"),
            None => format!("expected {expected}, found end of input"),
        };
        ParseError::new(message, span)
    }
}

/// Parse kernel source into a [`Tree`].
///
/// # Errors
///
/// Returns the first [`ParseError`] encountered; the parser does not
/// attempt recovery.
pub fn parse(source: &str) -> Result<Tree, ParseError> {
    let mut tokens = Vec::new();
    for (result, range) in Token::lexer(source).spanned() {
        let span = Span::new(range.start, range.end);
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => return Err(ParseError::new("unrecognised character", span)),
        }
    }
    Parser {
        stream: TokenStream::new(tokens, source.len()),
        next_id: 0,
    }
    .parse_tree()
}

fn type_keyword(token: &Token) -> Option<AxType> {
    match token {
        Token::KwBool => Some(AxType::Scalar(ScalarType::Bool)),
        Token::KwShort => Some(AxType::Scalar(ScalarType::I16)),
        Token::KwInt => Some(AxType::Scalar(ScalarType::I32)),
        Token::KwLong => Some(AxType::Scalar(ScalarType::I64)),
        Token::KwFloat => Some(AxType::Scalar(ScalarType::F32)),
        Token::KwDouble => Some(AxType::Scalar(ScalarType::F64)),
        Token::KwString => Some(AxType::Str),
        Token::KwVec3i => Some(AxType::VEC3I),
        Token::KwVec3f => Some(AxType::VEC3F),
        Token::KwVec3d => Some(AxType::VEC3D),
        Token::KwVec4i => Some(AxType::vec(ScalarType::I32, 4)),
        Token::KwVec4f => Some(AxType::vec(ScalarType::F32, 4)),
        Token::KwVec4d => Some(AxType::vec(ScalarType::F64, 4)),
        Token::KwMat4f => Some(AxType::MAT4F),
        _ => None,
    }
}

fn attribute_tag(token: &Token) -> Option<Option<AxType>> {
    match token {
        Token::At => Some(None),
        Token::FloatAt => Some(Some(AxType::Scalar(ScalarType::F32))),
        Token::DoubleAt => Some(Some(AxType::Scalar(ScalarType::F64))),
        Token::IntAt => Some(Some(AxType::Scalar(ScalarType::I32))),
        Token::LongAt => Some(Some(AxType::Scalar(ScalarType::I64))),
        Token::VecAt => Some(Some(AxType::VEC3F)),
        Token::StringAt => Some(Some(AxType::Str)),
        Token::Mat4At => Some(Some(AxType::MAT4F)),
        _ => None,
    }
}

fn assign_op(token: &Token) -> Option<AssignOp> {
    match token {
        Token::Equals => Some(AssignOp::Assign),
        Token::PlusEquals => Some(AssignOp::AddAssign),
        Token::MinusEquals => Some(AssignOp::SubAssign),
        Token::StarEquals => Some(AssignOp::MulAssign),
        Token::SlashEquals => Some(AssignOp::DivAssign),
        _ => None,
    }
}

fn binary_bp(token: &Token) -> Option<(BinaryOp, u8)> {
    match token {
        Token::OrOr => Some((BinaryOp::Or, 1)),
        Token::AndAnd => Some((BinaryOp::And, 2)),
        Token::Pipe => Some((BinaryOp::BitOr, 3)),
        Token::Caret => Some((BinaryOp::BitXor, 4)),
        Token::Amp => Some((BinaryOp::BitAnd, 5)),
        Token::EqualsEquals => Some((BinaryOp::Eq, 6)),
        Token::NotEquals => Some((BinaryOp::Ne, 6)),
        Token::Less => Some((BinaryOp::Lt, 7)),
        Token::LessEquals => Some((BinaryOp::Le, 7)),
        Token::More => Some((BinaryOp::Gt, 7)),
        Token::MoreEquals => Some((BinaryOp::Ge, 7)),
        Token::ShiftLeft => Some((BinaryOp::Shl, 8)),
        Token::ShiftRight => Some((BinaryOp::Shr, 8)),
        Token::Plus => Some((BinaryOp::Add, 9)),
        Token::Minus => Some((BinaryOp::Sub, 9)),
        Token::Star => Some((BinaryOp::Mul, 10)),
        Token::Slash => Some((BinaryOp::Div, 10)),
        Token::Percent => Some((BinaryOp::Mod, 10)),
        _ => None,
    }
}

struct Parser {
    stream: TokenStream,
    next_id: NodeId,
}

impl Parser {
    fn id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn span_from(&self, start: Span) -> Span {
        Span {
            start: start.start,
            end: self.stream.prev_end(),
        }
    }

    fn parse_tree(mut self) -> Result<Tree, ParseError> {
        let mut stmts = Vec::new();
        while !self.stream.at_end() {
            stmts.push(self.parse_stmt()?);
        }
        Ok(Tree {
            stmts,
            node_count: self.next_id,
        })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.stream.current_span();
        match self.stream.peek() {
            Some(Token::LBrace) => self.parse_block(),
            Some(t)
                if type_keyword(t).is_some()
                    && matches!(self.stream.peek_nth(1), Some(Token::Ident(_))) =>
            {
                self.parse_declare()
            }
            Some(Token::KwIf) => self.parse_if(),
            Some(Token::KwWhile) => self.parse_while(),
            Some(Token::KwDo) => self.parse_do_while(),
            Some(Token::KwFor) => self.parse_for(),
            Some(Token::KwBreak) => self.parse_keyword(StmtKind::Break),
            Some(Token::KwContinue) => self.parse_keyword(StmtKind::Continue),
            Some(Token::KwReturn) => self.parse_keyword(StmtKind::Return),
            Some(_) => {
                let stmt = self.parse_simple()?;
                self.stream.expect(Token::Semicolon)?;
                Ok(stmt)
            }
            None => Err(ParseError::new("unexpected end of input", start)),
        }
    }

    fn parse_keyword(&mut self, kind: StmtKind) -> Result<Stmt, ParseError> {
        let start = self.stream.current_span();
        self.stream.advance();
        self.stream.expect(Token::Semicolon)?;
        Ok(Stmt {
            id: self.id(),
            span: self.span_from(start),
            kind,
        })
    }

    fn parse_block(&mut self) -> Result<Stmt, ParseError> {
        let start = self.stream.current_span();
        self.stream.expect(Token::LBrace)?;
        let mut stmts = Vec::new();
        while !self.stream.check(&Token::RBrace) {
            if self.stream.at_end() {
                return Err(ParseError::new(
                    "unterminated block",
                    self.stream.current_span(),
                ));
            }
            stmts.push(self.parse_stmt()?);
        }
        self.stream.expect(Token::RBrace)?;
        Ok(Stmt {
            id: self.id(),
            span: self.span_from(start),
            kind: StmtKind::Block(stmts),
        })
    }

    fn parse_declare(&mut self) -> Result<Stmt, ParseError> {
        let start = self.stream.current_span();
        let keyword = self.stream.advance().expect("declaration keyword was peeked");
        let ty = type_keyword(&keyword).expect("token is a type keyword");
        let name = self.expect_ident()?;
        let init = if self.stream.eat(&Token::Equals) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.stream.expect(Token::Semicolon)?;
        Ok(Stmt {
            id: self.id(),
            span: self.span_from(start),
            kind: StmtKind::Declare { ty, name, init },
        })
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let start = self.stream.current_span();
        self.stream.advance();
        self.stream.expect(Token::LParen)?;
        let cond = self.parse_expr()?;
        self.stream.expect(Token::RParen)?;
        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.stream.eat(&Token::KwElse) {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };
        Ok(Stmt {
            id: self.id(),
            span: self.span_from(start),
            kind: StmtKind::If {
                cond,
                then_branch,
                else_branch,
            },
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let start = self.stream.current_span();
        self.stream.advance();
        self.stream.expect(Token::LParen)?;
        let cond = self.parse_expr()?;
        self.stream.expect(Token::RParen)?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt {
            id: self.id(),
            span: self.span_from(start),
            kind: StmtKind::Loop {
                kind: LoopKind::While,
                init: None,
                cond: Some(cond),
                step: None,
                body,
            },
        })
    }

    fn parse_do_while(&mut self) -> Result<Stmt, ParseError> {
        let start = self.stream.current_span();
        self.stream.advance();
        let body = Box::new(self.parse_stmt()?);
        self.stream.expect(Token::KwWhile)?;
        self.stream.expect(Token::LParen)?;
        let cond = self.parse_expr()?;
        self.stream.expect(Token::RParen)?;
        self.stream.expect(Token::Semicolon)?;
        Ok(Stmt {
            id: self.id(),
            span: self.span_from(start),
            kind: StmtKind::Loop {
                kind: LoopKind::DoWhile,
                init: None,
                cond: Some(cond),
                step: None,
                body,
            },
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let start = self.stream.current_span();
        self.stream.advance();
        self.stream.expect(Token::LParen)?;

        let init = if self.stream.eat(&Token::Semicolon) {
            None
        } else if self
            .stream
            .peek()
            .map(|t| type_keyword(t).is_some())
            .unwrap_or(false)
        {
            // parse_declare consumes the trailing semicolon
            Some(Box::new(self.parse_declare()?))
        } else {
            let stmt = self.parse_simple()?;
            self.stream.expect(Token::Semicolon)?;
            Some(Box::new(stmt))
        };

        let cond = if self.stream.check(&Token::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.stream.expect(Token::Semicolon)?;

        let step = if self.stream.check(&Token::RParen) {
            None
        } else {
            Some(Box::new(self.parse_simple()?))
        };
        self.stream.expect(Token::RParen)?;

        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt {
            id: self.id(),
            span: self.span_from(start),
            kind: StmtKind::Loop {
                kind: LoopKind::For,
                init,
                cond,
                step,
                body,
            },
        })
    }

    /// An assignment or bare expression, without the trailing semicolon.
    fn parse_simple(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.parse_expr()?;
        if let Some(op) = self.stream.peek().and_then(assign_op) {
            if !expr.is_lvalue() {
                return Err(ParseError::new("invalid assignment target", expr.span));
            }
            self.stream.advance();
            let value = self.parse_expr()?;
            let span = expr.span.to(value.span);
            Ok(Stmt {
                id: self.id(),
                span,
                kind: StmtKind::Assign {
                    target: expr,
                    op,
                    value,
                },
            })
        } else {
            Ok(Stmt {
                id: self.id(),
                span: expr.span,
                kind: StmtKind::Expr(expr),
            })
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(0)
    }

    fn parse_binary(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        while let Some((op, bp)) = self.stream.peek().and_then(binary_bp) {
            if bp < min_bp {
                break;
            }
            self.stream.advance();
            let rhs = self.parse_binary(bp + 1)?;
            let span = lhs.span.to(rhs.span);
            lhs = Expr {
                id: self.id(),
                span,
                kind: ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let start = self.stream.current_span();
        let op = match self.stream.peek() {
            Some(Token::Minus) => Some(UnaryOp::Neg),
            Some(Token::Bang) => Some(UnaryOp::Not),
            Some(Token::Tilde) => Some(UnaryOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            self.stream.advance();
            let operand = self.parse_unary()?;
            let span = start.to(operand.span);
            return Ok(Expr {
                id: self.id(),
                span,
                kind: ExprKind::Unary {
                    op,
                    expr: Box::new(operand),
                },
            });
        }
        if self.stream.check(&Token::PlusPlus) || self.stream.check(&Token::MinusMinus) {
            let decrement = self.stream.check(&Token::MinusMinus);
            self.stream.advance();
            let target = self.parse_unary()?;
            if !target.is_lvalue() {
                return Err(ParseError::new("invalid crement target", target.span));
            }
            let span = start.to(target.span);
            return Ok(Expr {
                id: self.id(),
                span,
                kind: ExprKind::Crement {
                    target: Box::new(target),
                    post: false,
                    decrement,
                },
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.stream.eat(&Token::LBracket) {
                let span = self.stream.current_span();
                let index = match self.stream.advance() {
                    Some(Token::LitI32(v)) if (0..=255).contains(&v) => v as u8,
                    _ => {
                        return Err(ParseError::new(
                            "array index must be an integer literal",
                            span,
                        ))
                    }
                };
                self.stream.expect(Token::RBracket)?;
                let span = Span {
                    start: expr.span.start,
                    end: self.stream.prev_end(),
                };
                expr = Expr {
                    id: self.id(),
                    span,
                    kind: ExprKind::Index {
                        expr: Box::new(expr),
                        index,
                    },
                };
            } else if self.stream.check(&Token::PlusPlus)
                || self.stream.check(&Token::MinusMinus)
            {
                let decrement = self.stream.check(&Token::MinusMinus);
                if !expr.is_lvalue() {
                    return Err(ParseError::new("invalid crement target", expr.span));
                }
                self.stream.advance();
                let span = Span {
                    start: expr.span.start,
                    end: self.stream.prev_end(),
                };
                expr = Expr {
                    id: self.id(),
                    span,
                    kind: ExprKind::Crement {
                        target: Box::new(expr),
                        post: true,
                        decrement,
                    },
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.stream.current_span();
        let Some(token) = self.stream.peek().cloned() else {
            return Err(ParseError::new("expected expression", start));
        };

        if let Some(lit) = literal_of(&token) {
            self.stream.advance();
            return Ok(Expr {
                id: self.id(),
                span: start,
                kind: ExprKind::Literal(lit),
            });
        }
        if let Some(tag) = attribute_tag(&token) {
            self.stream.advance();
            let name = self.expect_ident()?;
            return Ok(Expr {
                id: self.id(),
                span: self.span_from(start),
                kind: ExprKind::Attribute { name, ty: tag },
            });
        }
        if let Some(ty) = type_keyword(&token) {
            self.stream.advance();
            self.stream.expect(Token::LParen)?;
            let inner = self.parse_expr()?;
            self.stream.expect(Token::RParen)?;
            return Ok(Expr {
                id: self.id(),
                span: self.span_from(start),
                kind: ExprKind::Cast {
                    ty,
                    expr: Box::new(inner),
                },
            });
        }

        match token {
            Token::Ident(name) => {
                self.stream.advance();
                if self.stream.eat(&Token::LParen) {
                    let mut args = Vec::new();
                    if !self.stream.check(&Token::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            if !self.stream.eat(&Token::Comma) {
                                break;
                            }
                        }
                    }
                    self.stream.expect(Token::RParen)?;
                    Ok(Expr {
                        id: self.id(),
                        span: self.span_from(start),
                        kind: ExprKind::Call { name, args },
                    })
                } else {
                    Ok(Expr {
                        id: self.id(),
                        span: start,
                        kind: ExprKind::Local(name),
                    })
                }
            }
            Token::LParen => {
                self.stream.advance();
                let inner = self.parse_expr()?;
                self.stream.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::LBrace => {
                self.stream.advance();
                let mut elems = vec![self.parse_expr()?];
                while self.stream.eat(&Token::Comma) {
                    elems.push(self.parse_expr()?);
                }
                self.stream.expect(Token::RBrace)?;
                if elems.len() != 3 && elems.len() != 4 {
                    return Err(ParseError::new(
                        format!("vector pack expects 3 or 4 elements, found {}", elems.len()),
                        self.span_from(start),
                    ));
                }
                Ok(Expr {
                    id: self.id(),
                    span: self.span_from(start),
                    kind: ExprKind::Pack(elems),
                })
            }
            other => Err(ParseError::new(
                format!("expected expression, found {other}"),
                start,
            )),
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        let span = self.stream.current_span();
        match self.stream.advance() {
            Some(Token::Ident(name)) => Ok(name),
            Some(other) => Err(ParseError::new(
                format!("expected identifier, found {other}"),
                span,
            )),
            None => Err(ParseError::new(
                "expected identifier, found end of input",
                span,
            )),
        }
    }
}

fn literal_of(token: &Token) -> Option<Literal> {
    match token {
        Token::LitI32(v) => Some(Literal::I32(*v)),
        Token::LitI64(v) => Some(Literal::I64(*v)),
        Token::LitF32(v) => Some(Literal::F32(*v)),
        Token::LitF64(v) => Some(Literal::F64(*v)),
        Token::LitStr(s) => Some(Literal::Str(s.clone())),
        Token::KwTrue => Some(Literal::Bool(true)),
        Token::KwFalse => Some(Literal::Bool(false)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::print::dump;

    fn dump_of(src: &str) -> String {
        dump(&parse(src).unwrap())
    }

    #[test]
    fn parses_attribute_assignment() {
        assert_eq!(
            dump_of("@density = @density * 2.0f;"),
            "(assign = (attr auto density) (binary * (attr auto density) (lit 2.0f)))\n"
        );
    }

    #[test]
    fn parses_typed_attributes() {
        assert_eq!(dump_of("i@a;"), "(attr int a)\n");
        assert_eq!(dump_of("v@P;"), "(attr vec3f P)\n");
        assert_eq!(dump_of("mat4@m;"), "(attr mat4f m)\n");
    }

    #[test]
    fn precedence_mul_binds_tighter_than_add() {
        assert_eq!(
            dump_of("int x = 1 + 2 * 3;"),
            "(decl int x (binary + (lit 1) (binary * (lit 2) (lit 3))))\n"
        );
    }

    #[test]
    fn precedence_comparison_over_logical() {
        assert_eq!(
            dump_of("bool b = 1 < 2 && 3 < 4;"),
            "(decl bool b (binary && (binary < (lit 1) (lit 2)) (binary < (lit 3) (lit 4))))\n"
        );
    }

    #[test]
    fn parses_compound_assignment() {
        assert_eq!(
            dump_of("v@P += {0.0f, 1.0f, 0.0f};"),
            "(assign += (attr vec3f P) (pack (lit 0.0f) (lit 1.0f) (lit 0.0f)))\n"
        );
    }

    #[test]
    fn parses_cast_and_index() {
        assert_eq!(
            dump_of("float x = float(v@P[1]);"),
            "(decl float x (cast float (index 1 (attr vec3f P))))\n"
        );
    }

    #[test]
    fn parses_control_flow() {
        assert_eq!(
            dump_of("if (@a > 1.0f) @a = 0.0f; else @a += 1.0f;"),
            "(if (binary > (attr auto a) (lit 1.0f)) (assign = (attr auto a) (lit 0.0f)) (assign += (attr auto a) (lit 1.0f)))\n"
        );
    }

    #[test]
    fn parses_for_loop_with_crement() {
        assert_eq!(
            dump_of("for (int i = 0; i < 10; ++i) @a += 1.0f;"),
            "(for (decl int i (lit 0)) (binary < (local i) (lit 10)) (pre++ (local i)) (assign += (attr auto a) (lit 1.0f)))\n"
        );
    }

    #[test]
    fn parses_do_while_and_blocks() {
        assert_eq!(
            dump_of("do { @a += 1.0f; break; } while (@a < 4.0f);"),
            "(do-while (block (assign += (attr auto a) (lit 1.0f)) (break)) (binary < (attr auto a) (lit 4.0f)))\n"
        );
    }

    #[test]
    fn rejects_bad_pack_arity() {
        assert!(parse("v@P = {1.0f, 2.0f};").is_err());
    }

    #[test]
    fn rejects_rvalue_assignment() {
        assert!(parse("1 = 2;").is_err());
        assert!(parse("++3;").is_err());
    }

    #[test]
    fn rejects_non_literal_index() {
        assert!(parse("int i; float x = v@P[i];").is_err());
    }

    #[test]
    fn node_ids_are_dense() {
        let tree = parse("@a = @a + 1.0f;").unwrap();
        // target, lhs, rhs literal, binary, assign
        assert_eq!(tree.node_count, 5);
    }

    #[test]
    fn reports_missing_semicolon() {
        let err = parse("@a = 1.0f").unwrap_err();
        assert!(err.message.contains("';'"), "{}", err.message);
    }
}
