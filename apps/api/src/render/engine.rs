//! Depth-first evaluation of a parsed template against a `RenderContext`.
//!
//! Sections push a scope frame per item; lookups walk frames innermost-first,
//! so item fields shadow outer fields of the same name. Nothing here can fail:
//! absent paths render empty and are falsy.

use std::borrow::Cow;

use crate::render::helpers::{self, ArgValue, HelperOutput};
use crate::render::parser::{Arg, Expr, Node, Path};
use crate::render::value::{RenderContext, Value};

#[derive(Debug, Clone, Copy)]
enum Frame<'a> {
    Root(&'a RenderContext),
    Item {
        value: &'a Value,
        alias: Option<&'a str>,
        index: usize,
        len: usize,
    },
}

struct Scope<'a> {
    frames: Vec<Frame<'a>>,
}

impl<'a> Scope<'a> {
    fn new(root: &'a RenderContext) -> Self {
        Self {
            frames: vec![Frame::Root(root)],
        }
    }

    fn resolve(&self, path: &Path) -> Option<Cow<'a, Value>> {
        let visible = self.frames.len().checked_sub(path.up)?;
        let frames = &self.frames[..visible];
        let current = *frames.last()?;

        let Some((first, rest)) = path.segments.split_first() else {
            return match (path.anchored, current) {
                (true, Frame::Item { value, .. }) => Some(Cow::Borrowed(value)),
                _ => None,
            };
        };

        if let Some(meta) = first.strip_prefix('@') {
            let Frame::Item { index, len, .. } = current else {
                return None;
            };
            let value = match meta {
                "index" => Value::Str(index.to_string()),
                "first" => Value::Bool(index == 0),
                "last" => Value::Bool(index + 1 == len),
                _ => return None,
            };
            return rest.is_empty().then_some(Cow::Owned(value));
        }

        let head = if path.anchored {
            lookup_in_frame(current, first, true)?
        } else {
            frames
                .iter()
                .rev()
                .find_map(|frame| lookup_in_frame(*frame, first, false))?
        };

        rest.iter()
            .try_fold(head, |value, segment| child(value, segment))
            .map(Cow::Borrowed)
    }
}

fn lookup_in_frame<'a>(frame: Frame<'a>, name: &str, anchored: bool) -> Option<&'a Value> {
    match frame {
        Frame::Root(ctx) => ctx.get(name),
        Frame::Item { value, alias, .. } => {
            if !anchored && alias == Some(name) {
                return Some(value);
            }
            match value {
                Value::Map(map) => map.get(name),
                _ => None,
            }
        }
    }
}

fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Map(map) => map.get(segment),
        Value::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

pub fn render_nodes(nodes: &[Node], root: &RenderContext) -> String {
    let mut out = String::new();
    let mut scope = Scope::new(root);
    render_into(nodes, &mut scope, &mut out);
    out
}

fn render_into<'a>(nodes: &'a [Node], scope: &mut Scope<'a>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Output { expr, escape } => write_output(expr, *escape, scope, out),
            Node::Conditional {
                condition,
                negate,
                then,
                otherwise,
            } => {
                let branch = if eval_truthy(condition, scope) != *negate {
                    then
                } else {
                    otherwise
                };
                render_into(branch, scope, out);
            }
            Node::Section {
                list,
                alias,
                body,
                otherwise,
            } => {
                let resolved = scope.resolve(list);
                let items: &'a [Value] = match resolved {
                    Some(Cow::Borrowed(Value::List(items))) if !items.is_empty() => items,
                    _ => {
                        render_into(otherwise, scope, out);
                        continue;
                    }
                };
                let len = items.len();
                for (index, value) in items.iter().enumerate() {
                    scope.frames.push(Frame::Item {
                        value,
                        alias: alias.as_deref(),
                        index,
                        len,
                    });
                    render_into(body, scope, out);
                    scope.frames.pop();
                }
            }
        }
    }
}

fn write_output(expr: &Expr, escape: bool, scope: &Scope<'_>, out: &mut String) {
    let (text, trusted) = match expr {
        Expr::Path(path) => (path_text(path, scope), false),
        Expr::Literal(literal) => (literal.clone(), true),
        Expr::Helper { name, args } => match call_helper(name, args, scope) {
            HelperOutput::Text(text) => (text, false),
            HelperOutput::Html(html) => (html, true),
            HelperOutput::Flag(flag) => (flag.to_string(), true),
        },
        Expr::Missing => return,
    };

    if escape && !trusted {
        out.push_str(&helpers::escape_html(&text));
    } else {
        out.push_str(&text);
    }
}

fn path_text(path: &Path, scope: &Scope<'_>) -> String {
    let text = scope.resolve(path).map(|v| v.to_text()).unwrap_or_default();
    match path.slice {
        Some(slice) => slice.apply(&text),
        None => text,
    }
}

fn eval_truthy(expr: &Expr, scope: &Scope<'_>) -> bool {
    match expr {
        Expr::Path(path) if path.slice.is_some() => !path_text(path, scope).is_empty(),
        Expr::Path(path) => scope.resolve(path).is_some_and(|v| v.is_truthy()),
        Expr::Literal(literal) => !literal.is_empty(),
        Expr::Helper { name, args } => call_helper(name, args, scope).is_truthy(),
        Expr::Missing => false,
    }
}

fn call_helper(name: &str, args: &[Arg], scope: &Scope<'_>) -> HelperOutput {
    let values: Vec<ArgValue<'_>> = args
        .iter()
        .map(|arg| match arg {
            Arg::Str(s) => ArgValue::Text(Cow::Borrowed(s.as_str())),
            Arg::Int(n) => ArgValue::Int(*n),
            Arg::Path(path) if path.slice.is_some() => {
                ArgValue::Text(Cow::Owned(path_text(path, scope)))
            }
            Arg::Path(path) => match scope.resolve(path) {
                Some(Cow::Borrowed(value)) => ArgValue::Ctx(Some(value)),
                Some(Cow::Owned(value)) => ArgValue::Text(Cow::Owned(value.to_text())),
                None => ArgValue::Ctx(None),
            },
        })
        .collect();
    helpers::call(name, &values)
}
