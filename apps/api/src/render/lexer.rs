//! Splits template source into literal text and marker tokens.
//!
//! Recognised markers:
//! - `{{ … }}` expression / block tags, `{{{ … }}}` raw expressions
//! - `{{! … }}` and `{{!-- … --}}` comments
//! - `{% … %}` statement tags
//! - `{# … #}` comments
//!
//! An opener without its closer is kept as literal text and scanning resumes
//! right after it.

use crate::render::diagnostic::{Diagnostic, DiagnosticKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `{{ … }}`
    Mustache,
    /// `{{{ … }}}`
    Triple,
    /// `{% … %}`
    Statement,
    /// `{{! … }}`, `{{!-- … --}}`, `{# … #}`
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind<'a> {
    Text(&'a str),
    Tag {
        delimiter: Delimiter,
        /// Trimmed content between the delimiters.
        inner: &'a str,
        /// The whole marker as written, used for literal passthrough.
        raw: &'a str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    /// Byte offset of the token in the template source.
    pub offset: usize,
}

pub fn tokenize(source: &str) -> (Vec<Token<'_>>, Vec<Diagnostic>) {
    let mut tokens = Vec::new();
    let mut diagnostics = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while let Some(found) = source[pos..].find('{') {
        let start = pos + found;
        let rest = &source[start..];

        let Some((open_len, close, delimiter)) = classify_opener(rest) else {
            pos = start + 1;
            continue;
        };

        match rest[open_len..].find(close) {
            Some(inner_len) => {
                let end = start + open_len + inner_len + close.len();
                if text_start < start {
                    tokens.push(Token {
                        kind: TokenKind::Text(&source[text_start..start]),
                        offset: text_start,
                    });
                }
                tokens.push(Token {
                    kind: TokenKind::Tag {
                        delimiter,
                        inner: source[start + open_len..start + open_len + inner_len].trim(),
                        raw: &source[start..end],
                    },
                    offset: start,
                });
                pos = end;
                text_start = end;
            }
            None => {
                // `{#` shows up in CSS and scripts often enough that an
                // unclosed one is just text, not a malformed marker.
                if delimiter != Delimiter::Comment || rest.starts_with("{{") {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::UnterminatedTag,
                        &rest[..open_len],
                        start,
                    ));
                }
                pos = start + open_len;
            }
        }
    }

    if text_start < source.len() {
        tokens.push(Token {
            kind: TokenKind::Text(&source[text_start..]),
            offset: text_start,
        });
    }

    (tokens, diagnostics)
}

/// Returns `(opener length, closer, delimiter)` when `rest` starts with a marker opener.
fn classify_opener(rest: &str) -> Option<(usize, &'static str, Delimiter)> {
    if rest.starts_with("{{!--") {
        Some((5, "--}}", Delimiter::Comment))
    } else if rest.starts_with("{{!") {
        Some((3, "}}", Delimiter::Comment))
    } else if rest.starts_with("{{{") {
        Some((3, "}}}", Delimiter::Triple))
    } else if rest.starts_with("{{") {
        Some((2, "}}", Delimiter::Mustache))
    } else if rest.starts_with("{%") {
        Some((2, "%}", Delimiter::Statement))
    } else if rest.starts_with("{#") {
        Some((2, "#}", Delimiter::Comment))
    } else {
        None
    }
}
