//! Token types produced by the [`Lexer`](crate::lexer::Lexer)

use strum_macros::{Display, EnumString, IntoStaticStr};

/// Largest value an integer literal may have
pub const MAX_INT_LITERAL: u16 = 32767;

/// The single character symbols of the language. Every one of them is a token on its own.
pub const SYMBOLS: &[char] = &[
    '{', '}', '(', ')', '[', ']', '.', ',', ';', '+', '-', '*', '/', '&', '|', '<', '>', '=', '~',
];

/// Reserved words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    Class,
    Constructor,
    Function,
    Method,
    Field,
    Static,
    Var,
    Int,
    Char,
    Boolean,
    Void,
    True,
    False,
    Null,
    This,
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}

/// Classification of a token. The payload carries the already validated value where
/// the compiler needs more than the raw text.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum TokenKind {
    #[strum(serialize = "keyword")]
    Keyword(Keyword),
    #[strum(serialize = "symbol")]
    Symbol(char),
    #[strum(serialize = "integer constant")]
    IntegerLiteral(u16),
    #[strum(serialize = "string constant")]
    StringLiteral,
    #[strum(serialize = "identifier")]
    Identifier,
}

/// A classified span of source text.
///
/// For string literals `text` holds the inner text without the quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// 1-based line the token starts on
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            line,
        }
    }

    pub fn keyword(&self) -> Option<Keyword> {
        match self.kind {
            TokenKind::Keyword(kw) => Some(kw),
            _ => None,
        }
    }

    pub fn is_keyword(&self, kw: Keyword) -> bool {
        self.keyword() == Some(kw)
    }

    pub fn is_symbol(&self, c: char) -> bool {
        self.kind == TokenKind::Symbol(c)
    }

    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    /// how the token is shown in diagnostics
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::StringLiteral => format!("{} \"{}\"", self.kind, self.text),
            _ => format!("{} `{}`", self.kind, self.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn keywords_parse_from_lowercase_text() {
        assert_eq!(Keyword::from_str("constructor").unwrap(), Keyword::Constructor);
        assert_eq!(Keyword::from_str("while").unwrap(), Keyword::While);
        assert!(Keyword::from_str("While").is_err());
        assert!(Keyword::from_str("main").is_err());
    }

    #[test]
    fn describe_names_kind_and_text() {
        let tok = Token::new(TokenKind::Symbol(';'), ";", 3);
        assert_eq!(tok.describe(), "symbol `;`");
        let tok = Token::new(TokenKind::StringLiteral, "hi there", 1);
        assert_eq!(tok.describe(), "string constant \"hi there\"");
    }
}
