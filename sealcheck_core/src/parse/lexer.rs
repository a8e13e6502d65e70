/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::ast::FileId;
use crate::statics::{AnalysisContext, Error};
use std::fmt;
use std::fmt::Formatter;
use std::str::FromStr;
use strum::IntoDiscriminant;
use strum_macros::{EnumDiscriminants, EnumString, IntoStaticStr};

#[derive(Clone)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) span: Span,
}

impl Token {
    pub(crate) fn tag(&self) -> TokenTag {
        self.kind.discriminant()
    }
}

#[derive(Clone, PartialEq, EnumDiscriminants, EnumString)]
#[strum_discriminants(name(TokenTag))]
#[strum_discriminants(derive(IntoStaticStr))]
#[strum(serialize_all = "lowercase")]
pub(crate) enum TokenKind {
    /// `=`
    Eq,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `!`
    Bang,
    // `+`
    Plus,
    // `-`
    Minus,
    // `*`
    Star,
    // `/`
    Slash,
    // `%`
    Percent,
    // `&&`
    AndAnd,
    // `||`
    OrOr,

    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `;`
    Semicolon,
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
    /// `{`
    OpenBrace,
    /// `}`
    CloseBrace,

    /* Keywords */
    Using,
    Namespace,
    Interface,
    Class,
    Struct,
    Abstract,
    Sealed,
    Public,
    Private,
    Protected,
    Internal,
    Static,
    New,
    As,
    Var,
    Void,
    Int,
    Float,
    Bool,
    String,
    Switch,
    Case,
    Default,
    Break,
    Return,
    Throw,
    If,
    Else,
    True,
    False,
    Null,

    IntLit(std::string::String),
    StringLit(std::string::String),
    Ident(std::string::String),
    Wildcard,

    Eof,
}

impl TokenKind {
    fn keyword_from_str(s: &str) -> Option<Self> {
        let ret = TokenKind::from_str(s).ok();
        if let Some(kind) = &ret
            && kind.is_keyword()
        {
            return ret;
        }
        None
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Using
                | TokenKind::Namespace
                | TokenKind::Interface
                | TokenKind::Class
                | TokenKind::Struct
                | TokenKind::Abstract
                | TokenKind::Sealed
                | TokenKind::Public
                | TokenKind::Private
                | TokenKind::Protected
                | TokenKind::Internal
                | TokenKind::Static
                | TokenKind::New
                | TokenKind::As
                | TokenKind::Var
                | TokenKind::Void
                | TokenKind::Int
                | TokenKind::Float
                | TokenKind::Bool
                | TokenKind::String
                | TokenKind::Switch
                | TokenKind::Case
                | TokenKind::Default
                | TokenKind::Break
                | TokenKind::Return
                | TokenKind::Throw
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
        )
    }
}

#[derive(Debug, Copy, Clone)]
pub(crate) struct Span {
    pub(crate) lo: usize,
    pub(crate) hi: usize,
}

struct Lexer {
    chars: Vec<char>,
    index: usize,

    tokens: Vec<Token>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            index: 0,
            tokens: vec![],
        }
    }

    fn done(&self) -> bool {
        self.index >= self.chars.len()
    }

    fn current_char(&self) -> char {
        self.chars[self.index]
    }

    fn peek_char(&self, dist: usize) -> Option<char> {
        self.chars.get(self.index + dist).cloned()
    }

    /// Emit a token spanning from `lo` to the current index.
    fn emit_from(&mut self, kind: TokenKind, lo: usize) {
        let span = Span {
            lo,
            hi: self.index,
        };
        self.tokens.push(Token { kind, span });
    }

    /// Emit a token of `len` chars starting at the current index, advancing past it.
    fn emit(&mut self, kind: TokenKind, len: usize) {
        let span = Span {
            lo: self.index,
            hi: self.index + len,
        };
        self.tokens.push(Token { kind, span });
        self.index += len;
    }

    fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }
}

pub(crate) fn tokenize_file(ctx: &mut AnalysisContext, file_id: FileId) -> Vec<Token> {
    let file_data = ctx.file_db.get(file_id).unwrap();
    let mut lexer = Lexer::new(&file_data.source);

    while !lexer.done() {
        if start_of_ident(lexer.current_char()) {
            let lo = lexer.index;
            let mut ident = String::from(lexer.current_char());
            lexer.index += 1;

            while !lexer.done() && middle_of_ident(lexer.current_char()) {
                ident.push(lexer.current_char());
                lexer.index += 1;
            }

            // identifiers can start with '_', so the discard token is handled here
            if ident == "_" {
                lexer.emit_from(TokenKind::Wildcard, lo);
                continue;
            }

            if let Some(kw) = TokenKind::keyword_from_str(&ident) {
                lexer.emit_from(kw, lo);
            } else {
                lexer.emit_from(TokenKind::Ident(ident), lo);
            }
            continue;
        }
        if lexer.current_char().is_ascii_digit() {
            let lo = lexer.index;
            let mut num = String::new();
            while !lexer.done() && lexer.current_char().is_ascii_digit() {
                num.push(lexer.current_char());
                lexer.index += 1;
            }
            lexer.emit_from(TokenKind::IntLit(num), lo);
            continue;
        }
        match lexer.current_char() {
            '(' => lexer.emit(TokenKind::OpenParen, 1),
            ')' => lexer.emit(TokenKind::CloseParen, 1),
            '{' => lexer.emit(TokenKind::OpenBrace, 1),
            '}' => lexer.emit(TokenKind::CloseBrace, 1),
            ':' => lexer.emit(TokenKind::Colon, 1),
            ';' => lexer.emit(TokenKind::Semicolon, 1),
            ',' => lexer.emit(TokenKind::Comma, 1),
            '.' => lexer.emit(TokenKind::Dot, 1),
            '+' => lexer.emit(TokenKind::Plus, 1),
            '-' => lexer.emit(TokenKind::Minus, 1),
            '*' => lexer.emit(TokenKind::Star, 1),
            '%' => lexer.emit(TokenKind::Percent, 1),
            '=' => {
                if let Some('=') = lexer.peek_char(1) {
                    lexer.emit(TokenKind::EqEq, 2)
                } else {
                    lexer.emit(TokenKind::Eq, 1)
                }
            }
            '<' => {
                if let Some('=') = lexer.peek_char(1) {
                    lexer.emit(TokenKind::Le, 2)
                } else {
                    lexer.emit(TokenKind::Lt, 1)
                }
            }
            '>' => {
                if let Some('=') = lexer.peek_char(1) {
                    lexer.emit(TokenKind::Ge, 2)
                } else {
                    lexer.emit(TokenKind::Gt, 1)
                }
            }
            '!' => {
                if let Some('=') = lexer.peek_char(1) {
                    lexer.emit(TokenKind::NotEq, 2)
                } else {
                    lexer.emit(TokenKind::Bang, 1)
                }
            }
            '&' => {
                if let Some('&') = lexer.peek_char(1) {
                    lexer.emit(TokenKind::AndAnd, 2)
                } else {
                    ctx.errors
                        .push(Error::UnrecognizedToken(file_id, lexer.index));
                    lexer.index += 1;
                }
            }
            '|' => {
                if let Some('|') = lexer.peek_char(1) {
                    lexer.emit(TokenKind::OrOr, 2)
                } else {
                    ctx.errors
                        .push(Error::UnrecognizedToken(file_id, lexer.index));
                    lexer.index += 1;
                }
            }
            '"' => {
                let lo = lexer.index;
                let mut s = String::new();
                lexer.index += 1;
                loop {
                    match lexer.peek_char(0) {
                        None | Some('"') => break,
                        Some('\\') => {
                            match lexer.peek_char(1) {
                                Some('n') => s.push('\n'),
                                Some('t') => s.push('\t'),
                                Some('"') => s.push('"'),
                                Some('\\') => s.push('\\'),
                                _ => {
                                    ctx.errors.push(Error::UnrecognizedEscapeSequence(
                                        file_id,
                                        Span {
                                            lo: lexer.index,
                                            hi: lexer.index + 2,
                                        },
                                    ));
                                }
                            }
                            lexer.index += 2;
                        }
                        Some(c) => {
                            s.push(c);
                            lexer.index += 1;
                        }
                    }
                }
                // consume closing quote if present
                if let Some('"') = lexer.peek_char(0) {
                    lexer.index += 1;
                }
                lexer.emit_from(TokenKind::StringLit(s), lo);
            }
            '/' => {
                if let Some('/') = lexer.peek_char(1) {
                    // single-line comment
                    while !lexer.done() && lexer.current_char() != '\n' {
                        lexer.index += 1;
                    }
                } else if let Some('*') = lexer.peek_char(1) {
                    // multi-line comment
                    lexer.index += 2;
                    while !lexer.done() {
                        if lexer.current_char() == '*' && lexer.peek_char(1) == Some('/') {
                            lexer.index += 2;
                            break;
                        }
                        lexer.index += 1;
                    }
                } else {
                    lexer.emit(TokenKind::Slash, 1);
                }
            }
            ' ' | '\t' | '\r' | '\n' => {
                lexer.index += 1;
            }
            _ => {
                ctx.errors
                    .push(Error::UnrecognizedToken(file_id, lexer.index));
                lexer.index += 1;
            }
        }
    }

    let end = lexer.index;
    lexer.emit_from(TokenKind::Eof, end);

    lexer.into_tokens()
}

fn start_of_ident(c: char) -> bool {
    matches!(c, '_' | 'a'..='z' | 'A'..='Z')
}

fn middle_of_ident(c: char) -> bool {
    matches!(c, '_' | '0'..='9' | 'a'..='z' | 'A'..='Z')
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenKind::IntLit(s) => write!(f, "{}", s),
            TokenKind::StringLit(s) => write!(f, "\"{}\"", s),
            TokenKind::Ident(s) => write!(f, "{}", s),
            _ => write!(f, "{}", self.kind.discriminant()),
        }
    }
}

impl TokenTag {
    fn as_str(&self) -> &str {
        match &self {
            TokenTag::Eq => "=",
            TokenTag::EqEq => "==",
            TokenTag::NotEq => "!=",
            TokenTag::Lt => "<",
            TokenTag::Le => "<=",
            TokenTag::Gt => ">",
            TokenTag::Ge => ">=",
            TokenTag::Bang => "!",
            TokenTag::Plus => "+",
            TokenTag::Minus => "-",
            TokenTag::Star => "*",
            TokenTag::Slash => "/",
            TokenTag::Percent => "%",
            TokenTag::AndAnd => "&&",
            TokenTag::OrOr => "||",
            TokenTag::Dot => ".",
            TokenTag::Comma => ",",
            TokenTag::Colon => ":",
            TokenTag::Semicolon => ";",
            TokenTag::OpenParen => "(",
            TokenTag::CloseParen => ")",
            TokenTag::OpenBrace => "{",
            TokenTag::CloseBrace => "}",
            TokenTag::Wildcard => "_",
            _ => self.into(), // use strum IntoStaticStr
        }
    }
}

impl fmt::Display for TokenTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockFileProvider;
    use crate::ast::FileData;

    fn tokenize(source: &str) -> (Vec<Token>, Vec<Error>) {
        let mut ctx = AnalysisContext::new(MockFileProvider::single_file(source));
        let file_id = ctx
            .file_db
            .add(FileData::new("main.cs".into(), source.into()));
        let tokens = tokenize_file(&mut ctx, file_id);
        (tokens, ctx.errors)
    }

    #[test]
    fn keywords_and_idents() {
        let (tokens, errors) = tokenize("switch case default Foo _");
        assert!(errors.is_empty());
        let tags: Vec<_> = tokens.iter().map(|t| t.tag()).collect();
        assert_eq!(
            tags,
            vec![
                TokenTag::Switch,
                TokenTag::Case,
                TokenTag::Default,
                TokenTag::Ident,
                TokenTag::Wildcard,
                TokenTag::Eof,
            ]
        );
    }

    #[test]
    fn punctuation_spans() {
        let (tokens, errors) = tokenize("a.b");
        assert!(errors.is_empty());
        assert_eq!(tokens[1].span.lo, 1);
        assert_eq!(tokens[1].span.hi, 2);
    }

    #[test]
    fn comments_are_skipped() {
        let (tokens, errors) = tokenize("a // comment\n/* block */ b");
        assert!(errors.is_empty());
        let idents: Vec<_> = tokens
            .iter()
            .filter_map(|t| match &t.kind {
                TokenKind::Ident(s) => Some(s.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(idents, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn unknown_character_is_collected_not_fatal() {
        let (tokens, errors) = tokenize("a @ b");
        assert_eq!(errors.len(), 1);
        assert_eq!(tokens.len(), 3); // a, b, eof
    }
}
