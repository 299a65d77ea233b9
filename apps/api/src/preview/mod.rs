//! Preview composition: resolve the template, build the context, render.
//!
//! A preview never fails outright. Malformed markers yield `degraded`; a
//! template or CV that cannot be used yields `error` with the fallback HTML,
//! so the host always has something to display.

pub mod handlers;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::cv::{context_from_json, ContextError};
use crate::render::{render_with_diagnostics, Diagnostic, RenderOutput};
use crate::templates::{TemplateSource, TemplateSourceError};

pub const FALLBACK_HTML: &str = r#"<div style="text-align: center; padding: 40px; color: red;">Erreur lors du rendu du template</div>"#;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Template unavailable: {0}")]
    Template(#[from] TemplateSourceError),

    #[error("Invalid CV data: {0}")]
    Context(#[from] ContextError),

    #[error("Request carries neither template_id nor template_html")]
    NoTemplate,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviewRequest {
    /// Stored template to render. Ignored when `template_html` is given.
    #[serde(default, deserialize_with = "optional_id")]
    pub template_id: Option<String>,
    /// Inline template markup, e.g. unsaved edits.
    #[serde(default)]
    pub template_html: Option<String>,
    /// Overrides the stored stylesheet.
    #[serde(default)]
    pub template_css: Option<String>,
    #[serde(default)]
    pub cv: serde_json::Value,
}

impl PreviewRequest {
    pub fn has_template(&self) -> bool {
        self.template_html.is_some() || self.template_id.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewStatus {
    Ok,
    Degraded,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewResponse {
    pub status: PreviewStatus,
    pub html: String,
    pub css: String,
    /// Self-contained page embedding `css` and `html`.
    pub document: String,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PreviewResponse {
    fn rendered(output: RenderOutput, css: String) -> Self {
        let status = if output.is_degraded() {
            PreviewStatus::Degraded
        } else {
            PreviewStatus::Ok
        };
        Self {
            status,
            document: compose_document(&output.html, &css),
            html: output.html,
            css,
            diagnostics: output.diagnostics,
            error: None,
        }
    }

    fn failed(err: &PreviewError) -> Self {
        Self {
            status: PreviewStatus::Error,
            html: FALLBACK_HTML.to_string(),
            css: String::new(),
            document: compose_document(FALLBACK_HTML, ""),
            diagnostics: Vec::new(),
            error: Some(err.to_string()),
        }
    }
}

pub async fn compose(source: &dyn TemplateSource, req: PreviewRequest) -> PreviewResponse {
    match try_compose(source, req).await {
        Ok(response) => response,
        Err(e) => {
            error!("Preview rendering failed: {e}");
            PreviewResponse::failed(&e)
        }
    }
}

async fn try_compose(
    source: &dyn TemplateSource,
    req: PreviewRequest,
) -> Result<PreviewResponse, PreviewError> {
    let (template, css) = match (req.template_html, req.template_id) {
        (Some(html), _) => (html, req.template_css.unwrap_or_default()),
        (None, Some(id)) => {
            let asset = source.fetch(&id).await?;
            (asset.html, req.template_css.unwrap_or(asset.css))
        }
        (None, None) => return Err(PreviewError::NoTemplate),
    };

    let ctx = context_from_json(req.cv)?;
    let output = render_with_diagnostics(&template, &ctx);

    if output.is_degraded() {
        warn!(
            "Template rendered degraded with {} diagnostic(s); first: {}",
            output.diagnostics.len(),
            output.diagnostics[0]
        );
    } else {
        debug!("Rendered preview ({} bytes)", output.html.len());
    }

    Ok(PreviewResponse::rendered(output, css))
}

/// Wraps rendered markup in a printable standalone page.
pub fn compose_document(html: &str, css: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>CV</title>
<style>
{css}
</style>
</head>
<body>
<div id="cv-content">{html}</div>
</body>
</html>
"#
    )
}

/// Template ids arrive as strings or as the backend's integer primary keys.
fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
