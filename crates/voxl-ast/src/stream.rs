//! Token stream for the hand-written parser.

use crate::ast::Span;
use crate::parser::ParseError;
use crate::token::Token;

/// Token stream with lookahead and span tracking.
pub struct TokenStream {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    end: u32,
}

impl TokenStream {
    /// Wrap a lexed token list. `source_len` bounds the end-of-input span.
    pub fn new(tokens: Vec<(Token, Span)>, source_len: usize) -> TokenStream {
        TokenStream {
            tokens,
            pos: 0,
            end: source_len as u32,
        }
    }

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    /// Peek at the nth token ahead without consuming.
    pub fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|(t, _)| t)
    }

    /// Advance past the current token and return it.
    pub fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// True if the current token matches `expected` (by discriminant).
    pub fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    /// Consume the current token if it matches `expected`.
    pub fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume a specific token or fail.
    pub fn expect(&mut self, expected: Token) -> Result<Span, ParseError> {
        if self.check(&expected) {
            let span = self.current_span();
            self.pos += 1;
            Ok(span)
        } else {
            Err(ParseError::expected(
                expected,
                self.peek().cloned(),
                self.current_span(),
            ))
        }
    }

    /// True once every token has been consumed.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Span of the current token, or a zero-width span at end of input.
    pub fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some((_, span)) => *span,
            None => Span {
                start: self.end,
                end: self.end,
            },
        }
    }

    /// End offset of the most recently consumed token.
    pub fn prev_end(&self) -> u32 {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].1.end
        }
    }
}
