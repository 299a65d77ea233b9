use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::templates::{validate_id, TemplateAsset, TemplateSource, TemplateSourceError};

/// Fetches templates from `GET <base>/api/templates/<id>/`.
#[derive(Clone)]
pub struct RemoteTemplateSource {
    client: Client,
    base_url: String,
}

/// Wire payload; the service may answer in snake_case or camelCase.
#[derive(Debug, Deserialize)]
struct TemplatePayload {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "template_html", alias = "templateHtml")]
    html: serde_json::Value,
    #[serde(default, rename = "template_css", alias = "templateCss")]
    css: serde_json::Value,
    #[serde(default, rename = "is_premium", alias = "isPremium")]
    is_premium: Option<bool>,
}

impl RemoteTemplateSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TemplateSourceError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn template_url(&self, id: &str) -> String {
        format!("{}/api/templates/{id}/", self.base_url)
    }
}

#[async_trait]
impl TemplateSource for RemoteTemplateSource {
    async fn fetch(&self, id: &str) -> Result<TemplateAsset, TemplateSourceError> {
        validate_id(id)?;

        let url = self.template_url(id);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TemplateSourceError::NotFound(id.to_string()));
        }
        if !status.is_success() {
            warn!("Template service returned {status} for {url}");
            return Err(TemplateSourceError::Status {
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value = response.json().await?;
        let asset = parse_payload(id, body)?;
        debug!("Fetched template '{id}' from {url}");
        Ok(asset)
    }

    fn describe(&self) -> String {
        format!("remote {}", self.base_url)
    }
}

/// A payload whose html is not a string is unusable; a missing or non-string
/// css is treated as empty.
pub fn parse_payload(id: &str, body: serde_json::Value) -> Result<TemplateAsset, TemplateSourceError> {
    let payload: TemplatePayload = serde_json::from_value(body)?;

    let serde_json::Value::String(html) = payload.html else {
        return Err(TemplateSourceError::MissingHtml);
    };
    let css = match payload.css {
        serde_json::Value::String(css) => css,
        _ => String::new(),
    };

    Ok(TemplateAsset {
        id: id.to_string(),
        name: payload.name.unwrap_or_else(|| id.to_string()),
        html,
        css,
        is_premium: payload.is_premium.unwrap_or(false),
    })
}
