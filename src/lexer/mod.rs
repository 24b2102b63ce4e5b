//! Lexical scanning of BASIC source for intrinsic call sites.
//!
//! This module converts BASIC source code into a stream of [`Token`]s and
//! finds the intrinsic calls in it. It handles:
//!
//! - Comments (both `'` and `REM` styles), which never yield call sites
//! - String literals, whose contents are opaque
//! - Number formats (decimal, float, `&H`, `&O`, `&B`)
//! - Line continuations (underscore at end of line)
//! - Type-suffixed names such as `Left$`
//!
//! ## Example
//!
//! ```
//! use qblower::lexer::scan_call_sites;
//! use qblower::lowering::LoweringRegistry;
//!
//! let registry = LoweringRegistry::standard();
//! let sites = scan_call_sites("x = Mid$(a$, 2, 3)", &registry);
//!
//! assert_eq!(sites.len(), 1);
//! assert_eq!(sites[0].name, "Mid$");
//! assert_eq!(sites[0].arg_count, Some(3));
//! ```

mod token;

pub use token::{Token, TokenKind};

use logos::Logos;

use crate::compat::CallSiteRef;
use crate::lowering::LoweringRegistry;
use crate::span::Span;

/// The lexer for BASIC source code.
///
/// Wraps a `logos` lexer and provides an iterator interface that yields
/// [`Token`]s with their source positions.
///
/// ## Example
///
/// ```
/// use qblower::lexer::{Lexer, TokenKind};
///
/// let tokens: Vec<_> = Lexer::new("PRINT 42").collect();
///
/// assert_eq!(tokens.len(), 2);
/// assert_eq!(tokens[0].kind, TokenKind::Identifier);
/// assert_eq!(tokens[1].kind, TokenKind::IntegerLiteral);
/// assert_eq!(tokens[1].text, "42");
/// ```
pub struct Lexer<'source> {
    /// The underlying logos lexer
    inner: logos::Lexer<'source, TokenKind>,
}

impl<'source> Lexer<'source> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
        }
    }

    /// Get the next token, if any.
    ///
    /// Returns `None` when the end of input is reached. Unrecognized
    /// characters are skipped.
    pub fn next_token(&mut self) -> Option<Token> {
        loop {
            let kind = self.inner.next()?;

            match kind {
                Ok(kind) => {
                    let span = self.inner.span();
                    let text = self.inner.slice().to_string();
                    return Some(Token::new(kind, span, text));
                }
                Err(()) => {
                    log::trace!("skipping unrecognized input at {:?}", self.inner.span());
                    continue;
                }
            }
        }
    }

    /// Collect all remaining tokens into a vector.
    ///
    /// This consumes the lexer.
    pub fn collect_tokens(self) -> Vec<Token> {
        self.collect()
    }
}

/// Implement Iterator so the lexer can be used with for loops and iterator adapters.
impl<'source> Iterator for Lexer<'source> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Convenience function to lex source code directly.
///
/// # Example
///
/// ```
/// use qblower::lexer::{lex, TokenKind};
///
/// let tokens = lex("PRINT 42");
/// assert_eq!(tokens[1].kind, TokenKind::IntegerLiteral);
/// ```
pub fn lex(source: &str) -> Vec<Token> {
    Lexer::new(source).collect_tokens()
}

/// Finds every intrinsic call in `source`, in source order.
///
/// A name followed by `(` is a function-form call: its argument count is
/// the number of top-level commas plus one (zero for `()`), and its span
/// runs through the closing parenthesis. Any other occurrence is a
/// statement-form call such as `Cls` or `Print x; y` and carries no
/// argument count, since `;` and `,` separate print items there. A
/// function-form call left open at the end of the line is treated the
/// same way.
///
/// Names after `.` are member accesses and are skipped, as are names the
/// registry does not know.
pub fn scan_call_sites(source: &str, registry: &LoweringRegistry) -> Vec<CallSiteRef> {
    let tokens: Vec<Token> = lex(source)
        .into_iter()
        .filter(|t| !t.kind.is_trivia())
        .collect();

    let mut sites = Vec::new();
    for (index, token) in tokens.iter().enumerate() {
        if token.kind != TokenKind::Identifier || !registry.is_intrinsic(&token.text) {
            continue;
        }
        if index > 0 && tokens[index - 1].kind == TokenKind::Dot {
            continue;
        }

        let name_span = Span::from(token.span.clone());
        let site = match tokens.get(index + 1) {
            Some(next) if next.kind == TokenKind::LeftParen => {
                match count_arguments(&tokens[index + 1..]) {
                    Some((count, close)) => CallSiteRef {
                        name: token.text.clone(),
                        span: name_span.merge(&close),
                        arg_count: Some(count),
                    },
                    None => CallSiteRef::statement(&token.text, name_span),
                }
            }
            _ => CallSiteRef::statement(&token.text, name_span),
        };
        sites.push(site);
    }

    log::debug!("scanned {} intrinsic call sites", sites.len());
    sites
}

/// Counts the arguments of a parenthesized list starting at `tokens[0]`,
/// which must be `(`. Returns the count and the span of the matching `)`,
/// or `None` if the list is not closed before the statement ends.
fn count_arguments(tokens: &[Token]) -> Option<(usize, Span)> {
    let mut depth = 0usize;
    let mut commas = 0usize;
    let mut empty = true;

    for token in tokens {
        match token.kind {
            TokenKind::LeftParen => {
                if depth > 0 {
                    empty = false;
                }
                depth += 1;
            }
            TokenKind::RightParen => {
                depth -= 1;
                if depth == 0 {
                    let count = if empty { 0 } else { commas + 1 };
                    return Some((count, Span::from(token.span.clone())));
                }
            }
            TokenKind::Comma if depth == 1 => {
                empty = false;
                commas += 1;
            }
            kind if kind.ends_statement() => return None,
            _ => empty = false,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> Vec<CallSiteRef> {
        scan_call_sites(source, &LoweringRegistry::standard())
    }

    #[test]
    fn test_lexer_iterator() {
        let tokens: Vec<_> = Lexer::new("PRINT 42").collect();
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_token_spans() {
        let tokens = lex("PRINT 42");

        assert_eq!(tokens[0].span, 0..5);
        assert_eq!(tokens[0].text, "PRINT");

        assert_eq!(tokens[1].span, 6..8);
        assert_eq!(tokens[1].text, "42");
    }

    #[test]
    fn test_multiline() {
        let kinds: Vec<_> = lex("x = 1\ny = 2").iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::Operator,
                TokenKind::IntegerLiteral,
                TokenKind::Newline,
                TokenKind::Identifier,
                TokenKind::Operator,
                TokenKind::IntegerLiteral,
            ]
        );
    }

    #[test]
    fn test_function_form_counts_top_level_commas() {
        let sites = scan("y = Mid(s, Len(t), 2)");
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].name, "Mid");
        assert_eq!(sites[0].arg_count, Some(3));
        assert_eq!(sites[0].span, Span::new(4, 21));
        assert_eq!(sites[1].name, "Len");
        assert_eq!(sites[1].arg_count, Some(1));
    }

    #[test]
    fn test_empty_parens() {
        let sites = scan("t = Now()");
        assert_eq!(sites[0].arg_count, Some(0));
    }

    #[test]
    fn test_statement_form_has_no_count() {
        let sites = scan("Cls\nPrint a; b, c");
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].arg_count, None);
        assert_eq!(sites[1].name, "Print");
        assert_eq!(sites[1].arg_count, None);
    }

    #[test]
    fn test_comments_strings_and_members_are_skipped() {
        let sites = scan("' Len(x)\nREM Shell(\"x\")\nPrint \"Sqr(4)\"\nobj.Len(1)");
        let names: Vec<_> = sites.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Print"]);
    }

    #[test]
    fn test_user_names_are_skipped() {
        assert!(scan("x = MyFunc(1, 2)").is_empty());
    }

    #[test]
    fn test_continuation_inside_arguments() {
        let sites = scan("x = InStr(a$, _\n  b$)");
        assert_eq!(sites[0].arg_count, Some(2));
    }

    #[test]
    fn test_unclosed_call_is_statement_form() {
        let sites = scan("x = Len(a\ny = 1");
        assert_eq!(sites[0].arg_count, None);
        assert_eq!(sites[0].span, Span::new(4, 7));
    }

    #[test]
    fn test_colon_closes_unclosed_call() {
        let sites = scan("x = Left$(a$, 2 : Cls");
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].arg_count, None);
        assert_eq!(sites[1].name, "Cls");
    }
}
