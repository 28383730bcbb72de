//! Lexical analysis
//!
//! The lexer is pull based: tokens are only scanned when the compiler asks for the next one.
//! Comments and whitespace are skipped between tokens. Exactly one token can be handed back
//! with [`Lexer::push_back`], which is all the lookahead the grammar needs.

use std::str::FromStr;

use thiserror::Error;

use crate::core::{Keyword, Token, TokenKind, MAX_INT_LITERAL, SYMBOLS};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("line {line}: unrecognized token `{text}`")]
    Unrecognized { line: usize, text: String },

    #[error("line {line}: unterminated string constant")]
    UnterminatedString { line: usize },

    #[error("line {line}: unterminated block comment")]
    UnterminatedComment { line: usize },

    #[error("line {line}: integer constant {text} is out of range (0..=32767)")]
    IntegerOutOfRange { line: usize, text: String },

    #[error("line {line}: character {c:?} in string constant has a code above 32767")]
    CharacterOutOfRange { line: usize, c: char },

    #[error("cannot rewind further")]
    CannotRewind,
}

pub type LexResult<T> = Result<T, LexError>;

#[derive(Debug)]
pub struct Lexer<'src> {
    src: &'src str,
    /// byte offset of the next unscanned character
    pos: usize,
    line: usize,
    /// the token most recently returned by `next_token`, if it may still be pushed back
    last: Option<Token>,
    pushed_back: Option<Token>,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        Lexer {
            src,
            pos: 0,
            line: 1,
            last: None,
            pushed_back: None,
        }
    }

    /// Returns the next token, or `None` once the input is exhausted.
    pub fn next_token(&mut self) -> LexResult<Option<Token>> {
        if let Some(tok) = self.pushed_back.take() {
            self.last = Some(tok.clone());
            return Ok(Some(tok));
        }
        let tok = self.scan()?;
        self.last = tok.clone();
        Ok(tok)
    }

    /// Un-consumes the token returned by the last call to `next_token`.
    ///
    /// There is a single slot: a second call without a `next_token` in between fails.
    pub fn push_back(&mut self) -> LexResult<()> {
        let tok = self.last.take().ok_or(LexError::CannotRewind)?;
        self.pushed_back = Some(tok);
        Ok(())
    }

    fn rest(&self) -> &'src str {
        &self.src[self.pos..]
    }

    fn advance_by(&mut self, n_bytes: usize) {
        let end = self.pos + n_bytes;
        self.line += self.src[self.pos..end].matches('\n').count();
        self.pos = end;
    }

    /// everything after an unterminated comment or string is unusable
    fn abandon(&mut self) {
        self.advance_by(self.src.len() - self.pos);
    }

    fn skip_trivia(&mut self) -> LexResult<()> {
        loop {
            let rest = self.rest();
            if rest.starts_with("//") {
                let len = rest.find('\n').map_or(rest.len(), |i| i + 1);
                self.advance_by(len);
            } else if let Some(body) = rest.strip_prefix("/*") {
                let Some(end) = body.find("*/") else {
                    let line = self.line;
                    self.abandon();
                    return Err(LexError::UnterminatedComment { line });
                };
                self.advance_by(2 + end + 2);
            } else if let Some(c) = rest.chars().next().filter(|c| c.is_whitespace()) {
                self.advance_by(c.len_utf8());
            } else {
                return Ok(());
            }
        }
    }

    fn scan(&mut self) -> LexResult<Option<Token>> {
        self.skip_trivia()?;
        let line = self.line;
        let Some(c) = self.rest().chars().next() else {
            return Ok(None);
        };

        if SYMBOLS.contains(&c) {
            self.advance_by(c.len_utf8());
            return Ok(Some(Token::new(TokenKind::Symbol(c), c, line)));
        }

        if c == '"' {
            let body = &self.rest()[1..];
            return match body.find(|c: char| c == '"' || c == '\n') {
                Some(i) if body[i..].starts_with('"') => {
                    let text = &body[..i];
                    self.advance_by(i + 2);
                    // every character becomes a `push constant`
                    match text.chars().find(|&c| u32::from(c) > u32::from(MAX_INT_LITERAL)) {
                        Some(c) => Err(LexError::CharacterOutOfRange { line, c }),
                        None => Ok(Some(Token::new(TokenKind::StringLiteral, text, line))),
                    }
                }
                _ => {
                    self.abandon();
                    Err(LexError::UnterminatedString { line })
                }
            };
        }

        let len = self
            .rest()
            .find(|c: char| c.is_whitespace() || c == '"' || SYMBOLS.contains(&c))
            .unwrap_or(self.rest().len());
        let text = &self.rest()[..len];
        self.advance_by(len);
        classify(text, line).map(Some)
    }
}

fn classify(text: &str, line: usize) -> LexResult<Token> {
    if let Ok(kw) = Keyword::from_str(text) {
        return Ok(Token::new(TokenKind::Keyword(kw), text, line));
    }

    if text.bytes().all(|b| b.is_ascii_digit()) {
        return match text.parse::<u16>() {
            Ok(value) if value <= MAX_INT_LITERAL => {
                Ok(Token::new(TokenKind::IntegerLiteral(value), text, line))
            }
            _ => Err(LexError::IntegerOutOfRange {
                line,
                text: text.into(),
            }),
        };
    }

    if is_identifier(text) {
        return Ok(Token::new(TokenKind::Identifier, text, line));
    }

    Err(LexError::Unrecognized {
        line,
        text: text.into(),
    })
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Yields tokens until the input is exhausted or the first error.
impl<'src> Iterator for Lexer<'src> {
    type Item = LexResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}
