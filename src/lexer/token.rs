//! Token definitions for the call-site scanner.
//!
//! The scanner only needs enough of BASIC's lexical structure to find
//! intrinsic calls and count their arguments, so keywords are not
//! distinguished from identifiers: `PRINT`, `Len` and `myVar` all lex as
//! [`TokenKind::Identifier`]. Comments and string literals are real tokens
//! so that names inside them are never mistaken for calls.

use logos::Logos;
use std::fmt;

/// A token with its location in the source code.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// Byte offset range of the token in the source
    pub span: std::ops::Range<usize>,
    /// The original text of the token
    pub text: String,
}

impl Token {
    /// Create a new token with the given kind, span, and text.
    pub fn new(kind: TokenKind, span: std::ops::Range<usize>, text: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            text: text.into(),
        }
    }
}

/// Token types recognized by the scanner.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r]+")] // Skip horizontal whitespace (but not newlines!)
pub enum TokenKind {
    // ==================== Punctuation ====================

    /// ( left parenthesis
    #[token("(")]
    LeftParen,

    /// ) right parenthesis
    #[token(")")]
    RightParen,

    /// , comma - argument separator inside parentheses
    #[token(",")]
    Comma,

    /// ; semicolon - PRINT separator
    #[token(";")]
    Semicolon,

    /// : colon - statement separator
    #[token(":")]
    Colon,

    /// . dot - member access
    #[token(".")]
    Dot,

    /// Any other operator character.
    #[regex(r"[-+*/\\^=<>#&@!%$]")]
    Operator,

    // ==================== Literals ====================

    /// Integer literal (decimal)
    #[regex(r"[0-9]+", priority = 2)]
    IntegerLiteral,

    /// `&H`, `&O` and `&B` literals
    #[regex(r"&[Hh][0-9A-Fa-f]+|&[Oo][0-7]+|&[Bb][01]+")]
    RadixLiteral,

    /// Floating point literal
    /// Examples: 1.5, .5, 1.5E10, 1.5D-3
    #[regex(r"[0-9]*\.[0-9]+([EeDd][+-]?[0-9]+)?|[0-9]+[EeDd][+-]?[0-9]+")]
    FloatLiteral,

    /// String literal, everything between double quotes
    #[regex(r#""[^"\n]*""#)]
    StringLiteral,

    // ==================== Identifiers ====================

    /// Identifier or keyword. May end with a type suffix ($, %, &, !, #).
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*[$%&!#]?")]
    Identifier,

    // ==================== Special Tokens ====================

    /// Comment - starts with '
    #[regex(r"'[^\n]*")]
    Comment,

    /// REM comment
    /// Must be followed by space or end of line to distinguish from identifiers like REMOVE
    #[regex(r"(?i:REM)([ \t][^\n]*)?")]
    RemComment,

    /// Newline - ends a statement
    #[regex(r"\n")]
    Newline,

    /// Line continuation (underscore at end of line)
    #[regex(r"_[ \t]*\r?\n")]
    LineContinuation,
}

impl TokenKind {
    /// Returns true for tokens that carry no code.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            TokenKind::Comment | TokenKind::RemComment | TokenKind::LineContinuation
        )
    }

    /// Returns true for tokens that end a statement.
    pub fn ends_statement(&self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Colon)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",
            TokenKind::Operator => "operator",
            TokenKind::IntegerLiteral => "integer",
            TokenKind::RadixLiteral => "radix literal",
            TokenKind::FloatLiteral => "float",
            TokenKind::StringLiteral => "string",
            TokenKind::Identifier => "identifier",
            TokenKind::Comment | TokenKind::RemComment => "comment",
            TokenKind::Newline => "newline",
            TokenKind::LineContinuation => "line continuation",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> Vec<TokenKind> {
        TokenKind::lexer(source).filter_map(|r| r.ok()).collect()
    }

    #[test]
    fn test_keywords_are_identifiers() {
        assert_eq!(
            lex_all("PRINT len"),
            vec![TokenKind::Identifier, TokenKind::Identifier]
        );
    }

    #[test]
    fn test_type_suffixes() {
        let mut lexer = TokenKind::lexer("Left$ count% total# big&");
        while let Some(Ok(kind)) = lexer.next() {
            assert_eq!(kind, TokenKind::Identifier, "{}", lexer.slice());
        }
    }

    #[test]
    fn test_radix_literals() {
        assert_eq!(
            lex_all("&HFF &O17 &B1010"),
            vec![
                TokenKind::RadixLiteral,
                TokenKind::RadixLiteral,
                TokenKind::RadixLiteral
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            lex_all("42 3.14 1E10"),
            vec![
                TokenKind::IntegerLiteral,
                TokenKind::FloatLiteral,
                TokenKind::FloatLiteral
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(lex_all("' Len(x)"), vec![TokenKind::Comment]);
        assert_eq!(lex_all("REM Len(x)"), vec![TokenKind::RemComment]);
        assert_eq!(lex_all("REMOVE"), vec![TokenKind::Identifier]);
    }

    #[test]
    fn test_string_hides_names() {
        assert_eq!(
            lex_all(r#"PRINT "Len(x)""#),
            vec![TokenKind::Identifier, TokenKind::StringLiteral]
        );
    }

    #[test]
    fn test_line_continuation() {
        assert_eq!(
            lex_all("a, _\n b"),
            vec![
                TokenKind::Identifier,
                TokenKind::Comma,
                TokenKind::LineContinuation,
                TokenKind::Identifier
            ]
        );
    }
}
