//! Logos-based lexer for Voxl kernel source.

use logos::Logos;
use std::fmt;

fn strip_suffix_f32(s: &str) -> Option<f32> {
    s[..s.len() - 1].parse().ok()
}

fn strip_suffix_i64(s: &str) -> Option<i64> {
    s[..s.len() - 1].parse().ok()
}

fn unescape(raw: &str) -> Option<String> {
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                '\\' => out.push('\\'),
                '"' => out.push('"'),
                other => out.push(other),
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// A single lexical token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*[^/])*\*/")]
pub enum Token {
    // --- Type keywords ---
    #[token("bool")]
    KwBool,
    #[token("short")]
    KwShort,
    #[token("int")]
    KwInt,
    #[token("long")]
    KwLong,
    #[token("float")]
    KwFloat,
    #[token("double")]
    KwDouble,
    #[token("string")]
    KwString,
    #[token("vec3i")]
    KwVec3i,
    #[token("vec3f")]
    KwVec3f,
    #[token("vec3d")]
    KwVec3d,
    #[token("vec4i")]
    KwVec4i,
    #[token("vec4f")]
    KwVec4f,
    #[token("vec4d")]
    KwVec4d,
    #[token("mat4f")]
    KwMat4f,

    // --- Control keywords ---
    #[token("if")]
    KwIf,
    #[token("else")]
    KwElse,
    #[token("while")]
    KwWhile,
    #[token("do")]
    KwDo,
    #[token("for")]
    KwFor,
    #[token("break")]
    KwBreak,
    #[token("continue")]
    KwContinue,
    #[token("return")]
    KwReturn,
    #[token("true")]
    KwTrue,
    #[token("false")]
    KwFalse,

    // --- Attribute prefixes ---
    #[token("f@")]
    FloatAt,
    #[token("d@")]
    DoubleAt,
    #[token("i@")]
    IntAt,
    #[token("l@")]
    LongAt,
    #[token("v@")]
    VecAt,
    #[token("s@")]
    StringAt,
    #[token("mat4@")]
    Mat4At,
    #[token("@")]
    At,

    // --- Literals ---
    #[regex(r"(?:[0-9]+\.[0-9]*|\.[0-9]+|[0-9]+)(?:[eE][+-]?[0-9]+)?f", |lex| strip_suffix_f32(lex.slice()))]
    LitF32(f32),
    #[regex(r"[0-9]+\.[0-9]*(?:[eE][+-]?[0-9]+)?|\.[0-9]+(?:[eE][+-]?[0-9]+)?|[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    LitF64(f64),
    #[regex(r"[0-9]+l", |lex| strip_suffix_i64(lex.slice()))]
    LitI64(i64),
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok().map(|v| v as i32))]
    LitI32(i32),
    #[regex(r#""(?:[^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    LitStr(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    // --- Operators ---
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("+=")]
    PlusEquals,
    #[token("-=")]
    MinusEquals,
    #[token("*=")]
    StarEquals,
    #[token("/=")]
    SlashEquals,
    #[token("==")]
    EqualsEquals,
    #[token("!=")]
    NotEquals,
    #[token("<=")]
    LessEquals,
    #[token(">=")]
    MoreEquals,
    #[token("<<")]
    ShiftLeft,
    #[token(">>")]
    ShiftRight,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("<")]
    Less,
    #[token(">")]
    More,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("!")]
    Bang,
    #[token("=")]
    Equals,

    // --- Punctuation ---
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "identifier '{name}'"),
            Token::LitF32(v) => write!(f, "float literal {v}"),
            Token::LitF64(v) => write!(f, "double literal {v}"),
            Token::LitI32(v) => write!(f, "int literal {v}"),
            Token::LitI64(v) => write!(f, "long literal {v}"),
            Token::LitStr(s) => write!(f, "string literal \"{s}\""),
            other => write!(f, "'{}'", spelling(other)),
        }
    }
}

fn spelling(token: &Token) -> &'static str {
    match token {
        Token::KwBool => "bool",
        Token::KwShort => "short",
        Token::KwInt => "int",
        Token::KwLong => "long",
        Token::KwFloat => "float",
        Token::KwDouble => "double",
        Token::KwString => "string",
        Token::KwVec3i => "vec3i",
        Token::KwVec3f => "vec3f",
        Token::KwVec3d => "vec3d",
        Token::KwVec4i => "vec4i",
        Token::KwVec4f => "vec4f",
        Token::KwVec4d => "vec4d",
        Token::KwMat4f => "mat4f",
        Token::KwIf => "if",
        Token::KwElse => "else",
        Token::KwWhile => "while",
        Token::KwDo => "do",
        Token::KwFor => "for",
        Token::KwBreak => "break",
        Token::KwContinue => "continue",
        Token::KwReturn => "return",
        Token::KwTrue => "true",
        Token::KwFalse => "false",
        Token::FloatAt => "f@",
        Token::DoubleAt => "d@",
        Token::IntAt => "i@",
        Token::LongAt => "l@",
        Token::VecAt => "v@",
        Token::StringAt => "s@",
        Token::Mat4At => "mat4@",
        Token::At => "@",
        Token::PlusPlus => "++",
        Token::MinusMinus => "--",
        Token::PlusEquals => "+=",
        Token::MinusEquals => "-=",
        Token::StarEquals => "*=",
        Token::SlashEquals => "/=",
        Token::EqualsEquals => "==",
        Token::NotEquals => "!=",
        Token::LessEquals => "<=",
        Token::MoreEquals => ">=",
        Token::ShiftLeft => "<<",
        Token::ShiftRight => ">>",
        Token::AndAnd => "&&",
        Token::OrOr => "||",
        Token::Plus => "+",
        Token::Minus => "-",
        Token::Star => "*",
        Token::Slash => "/",
        Token::Percent => "%",
        Token::Less => "<",
        Token::More => ">",
        Token::Amp => "&",
        Token::Pipe => "|",
        Token::Caret => "^",
        Token::Tilde => "~",
        Token::Bang => "!",
        Token::Equals => "=",
        Token::LParen => "(",
        Token::RParen => ")",
        Token::LBrace => "{",
        Token::RBrace => "}",
        Token::LBracket => "[",
        Token::RBracket => "]",
        Token::Comma => ",",
        Token::Semicolon => ";",
        _ => "<literal>",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logos::Logos;

    fn lex(src: &str) -> Vec<Token> {
        Token::lexer(src).map(|t| t.unwrap()).collect()
    }

    #[test]
    fn lexes_numeric_literals() {
        assert_eq!(lex("1"), vec![Token::LitI32(1)]);
        assert_eq!(lex("1l"), vec![Token::LitI64(1)]);
        assert_eq!(lex("1.5"), vec![Token::LitF64(1.5)]);
        assert_eq!(lex("1.5f"), vec![Token::LitF32(1.5)]);
        assert_eq!(lex("2f"), vec![Token::LitF32(2.0)]);
        assert_eq!(lex(".25"), vec![Token::LitF64(0.25)]);
        assert_eq!(lex("1e3"), vec![Token::LitF64(1000.0)]);
    }

    #[test]
    fn lexes_attribute_prefixes() {
        assert_eq!(
            lex("@density f@a i@b v@P s@name mat4@xform"),
            vec![
                Token::At,
                Token::Ident("density".into()),
                Token::FloatAt,
                Token::Ident("a".into()),
                Token::IntAt,
                Token::Ident("b".into()),
                Token::VecAt,
                Token::Ident("P".into()),
                Token::StringAt,
                Token::Ident("name".into()),
                Token::Mat4At,
                Token::Ident("xform".into()),
            ]
        );
    }

    #[test]
    fn keywords_beat_identifiers() {
        assert_eq!(lex("if"), vec![Token::KwIf]);
        assert_eq!(lex("iffy"), vec![Token::Ident("iffy".into())]);
    }

    #[test]
    fn skips_comments() {
        assert_eq!(
            lex("1 // line\n/* block */ 2"),
            vec![Token::LitI32(1), Token::LitI32(2)]
        );
    }

    #[test]
    fn lexes_compound_operators() {
        assert_eq!(
            lex("+= << && ++"),
            vec![
                Token::PlusEquals,
                Token::ShiftLeft,
                Token::AndAnd,
                Token::PlusPlus
            ]
        );
    }

    #[test]
    fn lexes_string_escapes() {
        assert_eq!(lex(r#""a\nb""#), vec![Token::LitStr("a\nb".into())]);
    }
}
