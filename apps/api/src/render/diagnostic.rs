use serde::Serialize;

/// What kind of non-fatal problem the renderer ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// `{{`, `{{{` or `{%` with no closing delimiter.
    UnterminatedTag,
    /// A section or conditional opened but never closed.
    UnterminatedBlock,
    /// A close marker with no matching open block.
    UnmatchedClose,
    /// An `else` outside of a block, or a second `else` in the same block.
    StrayElse,
    /// A helper call naming a helper that does not exist.
    UnknownHelper,
    /// A block or statement tag the renderer does not understand.
    UnsupportedTag,
    /// A block opened deeper than the nesting limit.
    NestingTooDeep,
}

/// A malformed marker or unknown helper found while rendering.
/// The affected marker was passed through as literal text (or rendered empty).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub marker: String,
    /// Byte offset of the marker in the template source.
    pub offset: usize,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, marker: &str, offset: usize) -> Self {
        Self {
            kind,
            marker: marker.to_string(),
            offset,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let what = match self.kind {
            DiagnosticKind::UnterminatedTag => "unterminated tag",
            DiagnosticKind::UnterminatedBlock => "unterminated block",
            DiagnosticKind::UnmatchedClose => "close marker without open block",
            DiagnosticKind::StrayElse => "stray else",
            DiagnosticKind::UnknownHelper => "unknown helper",
            DiagnosticKind::UnsupportedTag => "unsupported tag",
            DiagnosticKind::NestingTooDeep => "block nested too deeply",
        };
        write!(f, "{what} `{}` at byte {}", self.marker, self.offset)
    }
}
