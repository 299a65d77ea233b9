//! Built-in helpers callable as `{{name arg …}}` or `(name arg …)` in conditions.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::render::value::Value;

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").expect("valid year regex"));

const KNOWN_HELPERS: &[&str] = &[
    "year",
    "first",
    "last",
    "substr",
    "nl2br",
    "preserveWhitespace",
    "percentage",
    "hasItems",
    "translate_work_mode",
];

pub fn is_known(name: &str) -> bool {
    KNOWN_HELPERS.contains(&name)
}

/// A resolved helper argument.
#[derive(Debug, Clone)]
pub enum ArgValue<'v> {
    /// A context lookup; `None` when the path is absent.
    Ctx(Option<&'v Value>),
    Text(Cow<'v, str>),
    Int(i64),
}

impl ArgValue<'_> {
    fn text(&self) -> Cow<'_, str> {
        match self {
            ArgValue::Ctx(Some(Value::Str(s))) => Cow::Borrowed(s.as_str()),
            ArgValue::Ctx(Some(v)) => Cow::Owned(v.to_text()),
            ArgValue::Ctx(None) => Cow::Borrowed(""),
            ArgValue::Text(s) => Cow::Borrowed(&**s),
            ArgValue::Int(n) => Cow::Owned(n.to_string()),
        }
    }

    fn number(&self) -> Option<f64> {
        match self {
            ArgValue::Int(n) => Some(*n as f64),
            other => other.text().trim().parse().ok(),
        }
    }

    fn count(&self) -> Option<usize> {
        self.number()
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| n as usize)
    }

    fn is_truthy(&self) -> bool {
        match self {
            ArgValue::Ctx(v) => v.is_some_and(Value::is_truthy),
            ArgValue::Text(s) => !s.is_empty(),
            ArgValue::Int(n) => *n != 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HelperOutput {
    /// Plain text; escaped by `{{…}}`.
    Text(String),
    /// Markup the helper built from escaped input; never escaped again.
    Html(String),
    Flag(bool),
}

impl HelperOutput {
    pub fn is_truthy(&self) -> bool {
        match self {
            HelperOutput::Text(s) | HelperOutput::Html(s) => !s.is_empty(),
            HelperOutput::Flag(b) => *b,
        }
    }
}

/// HTML-escapes a CV-derived value so it is displayed as literal text.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    html_escape::encode_quoted_attribute(text)
}

pub fn call(name: &str, args: &[ArgValue<'_>]) -> HelperOutput {
    let arg = |i: usize| args.get(i).cloned().unwrap_or(ArgValue::Ctx(None));

    match name {
        "year" => {
            let date = arg(0);
            let date = date.text();
            let year = YEAR_RE
                .find(&date)
                .map(|m| m.as_str())
                .unwrap_or(&*date);
            HelperOutput::Text(year.to_string())
        }
        "first" => {
            let n = arg(1).count().unwrap_or(0);
            HelperOutput::Text(arg(0).text().chars().take(n).collect())
        }
        "last" => {
            let n = arg(1).count().unwrap_or(0);
            let text = arg(0).text().into_owned();
            let len = text.chars().count();
            HelperOutput::Text(text.chars().skip(len.saturating_sub(n)).collect())
        }
        "substr" => {
            let start = arg(1).count().unwrap_or(0);
            let text = arg(0).text().into_owned();
            let rest = text.chars().skip(start);
            HelperOutput::Text(match arg(2).count() {
                Some(len) if args.len() > 2 => rest.take(len).collect(),
                _ => rest.collect(),
            })
        }
        "nl2br" => {
            let text = arg(0).text().into_owned();
            if text.is_empty() {
                return HelperOutput::Text(String::new());
            }
            let escaped = escape_html(&text).replace("\r\n", "\n").replace('\n', "<br>");
            HelperOutput::Html(escaped)
        }
        "preserveWhitespace" => {
            let text = arg(0).text().into_owned();
            if text.is_empty() {
                return HelperOutput::Text(String::new());
            }
            HelperOutput::Html(format!(
                r#"<span style="white-space: pre-wrap;">{}</span>"#,
                escape_html(&text)
            ))
        }
        "percentage" => {
            let max = if args.len() > 1 { arg(1).number() } else { Some(5.0) };
            match (arg(0).number(), max) {
                (Some(level), Some(max)) if max != 0.0 => {
                    HelperOutput::Text(format_number(level / max * 100.0))
                }
                _ => HelperOutput::Text(String::new()),
            }
        }
        "hasItems" => HelperOutput::Flag(match arg(0) {
            ArgValue::Ctx(Some(Value::List(items))) => !items.is_empty(),
            other => other.is_truthy() && !matches!(other, ArgValue::Ctx(Some(Value::Str(_)))),
        }),
        "translate_work_mode" => {
            let mode = arg(0).text().into_owned();
            HelperOutput::Text(translate_work_mode(&mode).to_string())
        }
        _ => HelperOutput::Text(String::new()),
    }
}

/// Renders a number without a trailing `.0`, rounded to two decimals.
/// Non-finite values render empty.
pub fn format_number(n: f64) -> String {
    let rounded = (n * 100.0).round() / 100.0;
    if !rounded.is_finite() {
        String::new()
    } else if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        let s = format!("{rounded:.2}");
        s.trim_end_matches('0').to_string()
    }
}

fn translate_work_mode(mode: &str) -> &str {
    match mode {
        "remote" => "Télétravail",
        "onsite" => "Sur site",
        "hybrid" => "Hybride",
        other => other,
    }
}
