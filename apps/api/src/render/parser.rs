//! Recursive-descent parser from marker tokens to an immutable node tree.
//!
//! Blocks are matched by kind on an explicit stack of open blocks. When a
//! block never closes, its opening marker is kept as literal text and its body
//! is spliced into the enclosing node list, so a malformed template still
//! renders everything it can.

use crate::render::diagnostic::{Diagnostic, DiagnosticKind};
use crate::render::helpers;
use crate::render::lexer::{Delimiter, Token, TokenKind};

// ────────────────────────────────────────────────────────────────────────────
// Tree
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Output {
        expr: Expr,
        escape: bool,
    },
    Section {
        list: Path,
        /// Name bound to each item (`for exp in …`, `each … as |exp|`).
        alias: Option<String>,
        body: Vec<Node>,
        /// Rendered instead of the body when the list is empty.
        otherwise: Vec<Node>,
    },
    Conditional {
        condition: Expr,
        negate: bool,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Path(Path),
    Literal(String),
    Helper { name: String, args: Vec<Arg> },
    /// Unknown helper; renders empty and is always falsy.
    Missing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Path(Path),
    Str(String),
    Int(i64),
}

/// A dotted lookup such as `name`, `exp.start_date`, `this.title` or `../full_name`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path {
    /// Number of `../` prefixes: scopes to skip before the lookup.
    pub up: usize,
    /// `this` / `.`: resolve against the current item only.
    pub anchored: bool,
    pub segments: Vec<String>,
    pub slice: Option<Slice>,
}

/// Character slices borrowed from the `[:N]`, `[N:]`, `[-N:]` placeholder forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slice {
    Head(usize),
    From(usize),
    Tail(usize),
}

impl Slice {
    pub fn apply(self, text: &str) -> String {
        match self {
            Slice::Head(n) => text.chars().take(n).collect(),
            Slice::From(n) => text.chars().skip(n).collect(),
            Slice::Tail(n) => {
                let len = text.chars().count();
                text.chars().skip(len.saturating_sub(n)).collect()
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Directives: tokens classified by what they do
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Each,
    If,
    Unless,
}

#[derive(Debug, Clone)]
enum Header {
    Each { list: Path, alias: Option<String> },
    Cond { condition: Expr, negate: bool },
}

#[derive(Debug, Clone)]
enum Directive<'a> {
    Text(&'a str),
    Output { expr: Expr, escape: bool },
    Open { kind: BlockKind, header: Header },
    Else,
    Close(BlockKind),
    Skip,
}

#[derive(Debug, Clone)]
struct Item<'a> {
    directive: Directive<'a>,
    raw: &'a str,
    offset: usize,
}

fn classify<'a>(token: &Token<'a>, diagnostics: &mut Vec<Diagnostic>) -> Item<'a> {
    let (delimiter, inner, raw) = match token.kind {
        TokenKind::Text(text) => {
            return Item {
                directive: Directive::Text(text),
                raw: text,
                offset: token.offset,
            }
        }
        TokenKind::Tag {
            delimiter,
            inner,
            raw,
        } => (delimiter, inner, raw),
    };

    let unsupported = |diagnostics: &mut Vec<Diagnostic>| {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::UnsupportedTag,
            raw,
            token.offset,
        ));
        Directive::Text(raw)
    };

    let directive = match delimiter {
        Delimiter::Comment => Directive::Skip,
        Delimiter::Triple => Directive::Output {
            expr: parse_expr(inner, raw, token.offset, diagnostics),
            escape: false,
        },
        Delimiter::Mustache => {
            if let Some(block) = inner.strip_prefix('#') {
                let (keyword, rest) = split_keyword(block);
                match keyword {
                    "each" => each_header(rest, false)
                        .map(|header| Directive::Open {
                            kind: BlockKind::Each,
                            header,
                        })
                        .unwrap_or_else(|| unsupported(diagnostics)),
                    "if" | "unless" => Directive::Open {
                        kind: if keyword == "if" {
                            BlockKind::If
                        } else {
                            BlockKind::Unless
                        },
                        header: Header::Cond {
                            condition: parse_expr(rest, raw, token.offset, diagnostics),
                            negate: keyword == "unless",
                        },
                    },
                    _ => unsupported(diagnostics),
                }
            } else if let Some(close) = inner.strip_prefix('/') {
                match close.trim() {
                    "each" => Directive::Close(BlockKind::Each),
                    "if" => Directive::Close(BlockKind::If),
                    "unless" => Directive::Close(BlockKind::Unless),
                    _ => unsupported(diagnostics),
                }
            } else if inner == "else" {
                Directive::Else
            } else {
                Directive::Output {
                    expr: parse_expr(inner, raw, token.offset, diagnostics),
                    escape: true,
                }
            }
        }
        Delimiter::Statement => {
            let (keyword, rest) = split_keyword(inner);
            match keyword {
                "for" => each_header(rest, true)
                    .map(|header| Directive::Open {
                        kind: BlockKind::Each,
                        header,
                    })
                    .unwrap_or_else(|| unsupported(diagnostics)),
                "endfor" => Directive::Close(BlockKind::Each),
                "if" => {
                    let (negate, condition) = match split_keyword(rest) {
                        ("not", cond) => (true, cond),
                        _ => (false, rest),
                    };
                    Directive::Open {
                        kind: BlockKind::If,
                        header: Header::Cond {
                            condition: parse_expr(condition, raw, token.offset, diagnostics),
                            negate,
                        },
                    }
                }
                "endif" => Directive::Close(BlockKind::If),
                "else" => Directive::Else,
                _ => unsupported(diagnostics),
            }
        }
    };

    Item {
        directive,
        raw,
        offset: token.offset,
    }
}

fn split_keyword(s: &str) -> (&str, &str) {
    let s = s.trim();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim()),
        None => (s, ""),
    }
}

/// Parses `list`, `list as |item|` (mustache) or `item in list` (statement).
fn each_header(rest: &str, statement: bool) -> Option<Header> {
    let words: Vec<&str> = rest.split_whitespace().collect();
    if statement {
        match words.as_slice() {
            [item, "in", list] => Some(Header::Each {
                list: parse_path(list),
                alias: Some(item.to_string()),
            }),
            _ => None,
        }
    } else {
        match words.as_slice() {
            [list] => Some(Header::Each {
                list: parse_path(list),
                alias: None,
            }),
            [list, "as", alias] => {
                let alias = alias.trim_matches('|');
                (!alias.is_empty()).then(|| Header::Each {
                    list: parse_path(list),
                    alias: Some(alias.to_string()),
                })
            }
            _ => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Expressions
// ────────────────────────────────────────────────────────────────────────────

fn parse_expr(src: &str, raw: &str, offset: usize, diagnostics: &mut Vec<Diagnostic>) -> Expr {
    let mut src = src.trim();
    while let Some(inner) = src.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        src = inner.trim();
    }

    let words = split_words(src);
    match words.as_slice() {
        [] => Expr::Missing,
        [single] => match unquote(single) {
            Some(literal) => Expr::Literal(literal.to_string()),
            None => Expr::Path(parse_path(single)),
        },
        [name, args @ ..] => {
            if helpers::is_known(name) {
                Expr::Helper {
                    name: name.to_string(),
                    args: args.iter().map(|a| parse_arg(a)).collect(),
                }
            } else {
                diagnostics.push(Diagnostic::new(DiagnosticKind::UnknownHelper, raw, offset));
                Expr::Missing
            }
        }
    }
}

fn parse_arg(word: &str) -> Arg {
    if let Some(literal) = unquote(word) {
        Arg::Str(literal.to_string())
    } else if let Ok(n) = word.parse::<i64>() {
        Arg::Int(n)
    } else {
        Arg::Path(parse_path(word))
    }
}

fn unquote(word: &str) -> Option<&str> {
    let first = word.chars().next()?;
    if (first == '"' || first == '\'') && word.len() >= 2 && word.ends_with(first) {
        Some(&word[1..word.len() - 1])
    } else {
        None
    }
}

/// Splits on whitespace, keeping quoted strings together.
fn split_words(src: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;
    let mut quote: Option<char> = None;

    for (i, c) in src.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                start.get_or_insert(i);
            }
            None if c.is_whitespace() => {
                if let Some(s) = start.take() {
                    words.push(&src[s..i]);
                }
            }
            None => {
                start.get_or_insert(i);
            }
        }
    }
    if let Some(s) = start {
        words.push(&src[s..]);
    }
    words
}

pub fn parse_path(word: &str) -> Path {
    let (body, slice) = split_slice(word);

    let mut rest = body;
    let mut up = 0;
    while let Some(r) = rest.strip_prefix("../") {
        up += 1;
        rest = r;
    }

    let mut segments: Vec<String> = rest
        .split('.')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let anchored = rest == "." || segments.first().is_some_and(|s| s == "this");
    if anchored && !segments.is_empty() {
        segments.remove(0);
    }

    Path {
        up,
        anchored,
        segments,
        slice,
    }
}

fn split_slice(word: &str) -> (&str, Option<Slice>) {
    let Some(open) = word.strip_suffix(']').and_then(|w| w.rfind('[')) else {
        return (word, None);
    };
    let spec = &word[open + 1..word.len() - 1];

    let slice = if let Some(n) = spec.strip_prefix(':') {
        n.parse().ok().map(Slice::Head)
    } else if let Some(n) = spec.strip_prefix('-').and_then(|s| s.strip_suffix(':')) {
        n.parse().ok().map(Slice::Tail)
    } else if let Some(n) = spec.strip_suffix(':') {
        n.parse().ok().map(Slice::From)
    } else {
        None
    };

    match slice {
        Some(slice) => (&word[..open], Some(slice)),
        None => (word, None),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Block structure
// ────────────────────────────────────────────────────────────────────────────

enum Stop<'a> {
    Eof,
    /// The innermost open block's close marker was consumed.
    Close,
    /// An `else` for the innermost open block was consumed.
    Else(&'a str),
    /// A close marker for an outer block was found and left unconsumed.
    Unwind,
}

/// Open blocks allowed before further openers are kept as literal text.
/// Bounds recursion in both the parser and the renderer.
pub const MAX_DEPTH: usize = 64;

struct Parser<'a> {
    items: Vec<Item<'a>>,
    pos: usize,
    open: Vec<BlockKind>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    fn parse_body(&mut self, in_else: bool) -> (Vec<Node>, Stop<'a>) {
        let mut nodes = Vec::new();
        // Blocks opened past MAX_DEPTH, kept as literal text along with their markers.
        let mut flattened: Vec<BlockKind> = Vec::new();

        while let Some(item) = self.items.get(self.pos).cloned() {
            self.pos += 1;
            match item.directive {
                Directive::Text(text) => push_text(&mut nodes, text),
                Directive::Skip => {}
                Directive::Output { expr, escape } => nodes.push(Node::Output { expr, escape }),
                Directive::Open { kind, .. } if self.open.len() >= MAX_DEPTH => {
                    if flattened.is_empty() {
                        self.diagnostics.push(Diagnostic::new(
                            DiagnosticKind::NestingTooDeep,
                            item.raw,
                            item.offset,
                        ));
                    }
                    flattened.push(kind);
                    push_text(&mut nodes, item.raw);
                }
                Directive::Open { kind, header } => {
                    self.parse_block(kind, header, item.raw, item.offset, &mut nodes);
                }
                Directive::Else if !flattened.is_empty() => push_text(&mut nodes, item.raw),
                Directive::Close(kind) if flattened.last() == Some(&kind) => {
                    flattened.pop();
                    push_text(&mut nodes, item.raw);
                }
                Directive::Else => {
                    if !in_else && !self.open.is_empty() {
                        return (nodes, Stop::Else(item.raw));
                    }
                    self.diagnostics.push(Diagnostic::new(
                        DiagnosticKind::StrayElse,
                        item.raw,
                        item.offset,
                    ));
                    push_text(&mut nodes, item.raw);
                }
                Directive::Close(kind) => {
                    if self.open.last() == Some(&kind) {
                        return (nodes, Stop::Close);
                    }
                    if self.open.contains(&kind) {
                        self.pos -= 1;
                        return (nodes, Stop::Unwind);
                    }
                    self.diagnostics.push(Diagnostic::new(
                        DiagnosticKind::UnmatchedClose,
                        item.raw,
                        item.offset,
                    ));
                    push_text(&mut nodes, item.raw);
                }
            }
        }

        (nodes, Stop::Eof)
    }

    fn parse_block(
        &mut self,
        kind: BlockKind,
        header: Header,
        raw: &'a str,
        offset: usize,
        nodes: &mut Vec<Node>,
    ) {
        self.open.push(kind);
        let (body, mut stop) = self.parse_body(false);
        let mut else_raw = None;
        let mut otherwise = Vec::new();
        if let Stop::Else(raw) = stop {
            else_raw = Some(raw);
            let (rest, after) = self.parse_body(true);
            otherwise = rest;
            stop = after;
        }
        self.open.pop();

        if let Stop::Close = stop {
            nodes.push(match header {
                Header::Each { list, alias } => Node::Section {
                    list,
                    alias,
                    body,
                    otherwise,
                },
                Header::Cond { condition, negate } => Node::Conditional {
                    condition,
                    negate,
                    then: body,
                    otherwise,
                },
            });
            return;
        }

        self.diagnostics.push(Diagnostic::new(
            DiagnosticKind::UnterminatedBlock,
            raw,
            offset,
        ));
        push_text(nodes, raw);
        splice(nodes, body);
        if let Some(else_raw) = else_raw {
            push_text(nodes, else_raw);
            splice(nodes, otherwise);
        }
    }
}

fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if let Some(Node::Text(last)) = nodes.last_mut() {
        last.push_str(text);
    } else {
        nodes.push(Node::Text(text.to_string()));
    }
}

fn splice(nodes: &mut Vec<Node>, more: Vec<Node>) {
    for node in more {
        match node {
            Node::Text(text) => push_text(nodes, &text),
            other => nodes.push(other),
        }
    }
}

/// Parses classified tokens into a node tree, collecting diagnostics for
/// anything that had to be passed through literally.
pub fn parse(tokens: &[Token<'_>], diagnostics: &mut Vec<Diagnostic>) -> Vec<Node> {
    let items = tokens.iter().map(|t| classify(t, diagnostics)).collect();
    let mut parser = Parser {
        items,
        pos: 0,
        open: Vec::new(),
        diagnostics: Vec::new(),
    };
    let (nodes, _) = parser.parse_body(false);
    diagnostics.extend(parser.diagnostics);
    diagnostics.sort_by_key(|d| d.offset);
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::lexer::tokenize;

    fn parse_str(source: &str) -> (Vec<Node>, Vec<Diagnostic>) {
        let (tokens, mut diagnostics) = tokenize(source);
        let nodes = parse(&tokens, &mut diagnostics);
        (nodes, diagnostics)
    }

    #[test]
    fn test_parse_path_forms() {
        let p = parse_path("exp.start_date[:4]");
        assert_eq!(p.segments, vec!["exp", "start_date"]);
        assert_eq!(p.slice, Some(Slice::Head(4)));
        assert!(!p.anchored);

        let p = parse_path("this.name");
        assert!(p.anchored);
        assert_eq!(p.segments, vec!["name"]);

        let p = parse_path("this");
        assert!(p.anchored);
        assert!(p.segments.is_empty());

        let p = parse_path("../full_name");
        assert_eq!(p.up, 1);
        assert_eq!(p.segments, vec!["full_name"]);

        assert_eq!(parse_path("name[4:]").slice, Some(Slice::From(4)));
        assert_eq!(parse_path("year[-4:]").slice, Some(Slice::Tail(4)));
    }

    #[test]
    fn test_bad_slice_keeps_whole_word() {
        let p = parse_path("items[x]");
        assert_eq!(p.slice, None);
        assert_eq!(p.segments, vec!["items[x]"]);
    }

    #[test]
    fn test_slice_apply_counts_chars() {
        assert_eq!(Slice::Head(3).apply("Été 2020"), "Été");
        assert_eq!(Slice::From(4).apply("John Doe"), " Doe");
        assert_eq!(Slice::Tail(4).apply("2020-01-15"), "1-15");
        assert_eq!(Slice::Tail(10).apply("ab"), "ab");
    }

    #[test]
    fn test_split_words_keeps_quotes() {
        assert_eq!(
            split_words(r#"first "a b" 4"#),
            vec!["first", "\"a b\"", "4"]
        );
    }

    #[test]
    fn test_section_with_else() {
        let (nodes, diagnostics) = parse_str("{{#each xs}}a{{else}}b{{/each}}");
        assert!(diagnostics.is_empty());
        assert_eq!(nodes.len(), 1);
        let Node::Section { body, otherwise, .. } = &nodes[0] else {
            panic!("expected section");
        };
        assert_eq!(body, &vec![Node::Text("a".into())]);
        assert_eq!(otherwise, &vec![Node::Text("b".into())]);
    }

    #[test]
    fn test_django_for_binds_alias() {
        let (nodes, _) = parse_str("{% for s in skills_data %}{{s.name}}{% endfor %}");
        let Node::Section { alias, list, .. } = &nodes[0] else {
            panic!("expected section");
        };
        assert_eq!(alias.as_deref(), Some("s"));
        assert_eq!(list.segments, vec!["skills_data"]);
    }

    #[test]
    fn test_django_if_not() {
        let (nodes, _) = parse_str("{% if not x %}y{% endif %}");
        assert!(matches!(nodes[0], Node::Conditional { negate: true, .. }));
    }

    #[test]
    fn test_unterminated_block_is_literal() {
        let (nodes, diagnostics) = parse_str("a{{#if x}}b{{name}}");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnterminatedBlock);
        assert_eq!(nodes[0], Node::Text("a{{#if x}}b".into()));
        assert!(matches!(nodes[1], Node::Output { .. }));
    }

    #[test]
    fn test_unmatched_close_is_literal() {
        let (nodes, diagnostics) = parse_str("a{{/each}}b");
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnmatchedClose);
        assert_eq!(nodes, vec![Node::Text("a{{/each}}b".into())]);
    }

    #[test]
    fn test_inner_unterminated_block_unwinds_to_outer_close() {
        let (nodes, diagnostics) = parse_str("{{#if a}}{{#each b}}x{{/if}}");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnterminatedBlock);
        assert_eq!(diagnostics[0].marker, "{{#each b}}");
        let Node::Conditional { then, .. } = &nodes[0] else {
            panic!("expected conditional");
        };
        assert_eq!(then, &vec![Node::Text("{{#each b}}x".into())]);
    }

    #[test]
    fn test_stray_else() {
        let (nodes, diagnostics) = parse_str("a{{else}}b");
        assert_eq!(diagnostics[0].kind, DiagnosticKind::StrayElse);
        assert_eq!(nodes, vec![Node::Text("a{{else}}b".into())]);
    }

    #[test]
    fn test_unknown_helper_reported() {
        let (nodes, diagnostics) = parse_str("{{shout name}}");
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnknownHelper);
        assert_eq!(
            nodes,
            vec![Node::Output {
                expr: Expr::Missing,
                escape: true
            }]
        );
    }

    #[test]
    fn test_parenthesised_helper_condition() {
        let (nodes, diagnostics) = parse_str("{{#if (hasItems skills_data)}}x{{/if}}");
        assert!(diagnostics.is_empty());
        let Node::Conditional { condition, .. } = &nodes[0] else {
            panic!("expected conditional");
        };
        assert!(matches!(condition, Expr::Helper { name, .. } if name == "hasItems"));
    }

    #[test]
    fn test_deep_unterminated_openers_are_flattened() {
        let source = "{{#if a}}".repeat(50_000);
        let (nodes, diagnostics) = parse_str(&source);
        let too_deep: Vec<_> = diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::NestingTooDeep)
            .collect();
        assert_eq!(too_deep.len(), 1);
        assert_eq!(too_deep[0].offset, MAX_DEPTH * "{{#if a}}".len());
        assert_eq!(
            diagnostics
                .iter()
                .filter(|d| d.kind == DiagnosticKind::UnterminatedBlock)
                .count(),
            MAX_DEPTH
        );
        assert_eq!(nodes, vec![Node::Text(source)]);
    }

    #[test]
    fn test_deep_well_formed_nesting_is_capped() {
        let source = format!("{}x{}", "{{#if a}}".repeat(50_000), "{{/if}}".repeat(50_000));
        let (nodes, diagnostics) = parse_str(&source);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::NestingTooDeep);

        let mut depth = 0;
        let mut level = &nodes;
        while let [Node::Conditional { then, .. }] = level.as_slice() {
            depth += 1;
            level = then;
        }
        assert_eq!(depth, MAX_DEPTH);
        let Node::Text(inner) = &level[0] else {
            panic!("expected flattened text");
        };
        let flattened = 50_000 - MAX_DEPTH;
        assert_eq!(
            *inner,
            format!("{}x{}", "{{#if a}}".repeat(flattened), "{{/if}}".repeat(flattened))
        );
    }

    #[test]
    fn test_else_inside_flattened_block_stays_literal() {
        let source = format!(
            "{}{{{{#each xs}}}}a{{{{else}}}}b{{{{/each}}}}{}",
            "{{#if a}}".repeat(MAX_DEPTH),
            "{{/if}}".repeat(MAX_DEPTH)
        );
        let (nodes, diagnostics) = parse_str(&source);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::NestingTooDeep);
        let mut level = &nodes;
        while let [Node::Conditional { then, .. }] = level.as_slice() {
            level = then;
        }
        assert_eq!(level, &vec![Node::Text("{{#each xs}}a{{else}}b{{/each}}".into())]);
    }

    #[test]
    fn test_comments_dropped() {
        let (nodes, _) = parse_str("a{{! note }}b{# other #}c");
        assert_eq!(nodes, vec![Node::Text("abc".into())]);
    }
}
