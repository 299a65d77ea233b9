//! Template sources: resolve a template id to its HTML fragment and stylesheet.
//!
//! `DirectoryTemplateSource` reads `<dir>/<id>.html` (+ optional `.css`);
//! `RemoteTemplateSource` asks the template service over HTTP. Handlers only
//! see the `TemplateSource` trait object held in `AppState`.

pub mod directory;
pub mod remote;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use directory::DirectoryTemplateSource;
pub use remote::RemoteTemplateSource;

#[derive(Debug, Error)]
pub enum TemplateSourceError {
    #[error("Invalid template id '{0}'")]
    InvalidId(String),

    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to read template: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Template service returned status {status}")]
    Status { status: u16 },

    #[error("Template payload has no string html field")]
    MissingHtml,

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A template ready to render: HTML with placeholder markers plus its CSS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateAsset {
    pub id: String,
    pub name: String,
    pub html: String,
    #[serde(default)]
    pub css: String,
    #[serde(default)]
    pub is_premium: bool,
}

#[async_trait]
pub trait TemplateSource: Send + Sync {
    async fn fetch(&self, id: &str) -> Result<TemplateAsset, TemplateSourceError>;

    /// Short label for logs.
    fn describe(&self) -> String;
}

/// Ids are used as file stems and URL segments, so only `[A-Za-z0-9_-]` is allowed.
pub fn validate_id(id: &str) -> Result<(), TemplateSourceError> {
    let valid = !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(TemplateSourceError::InvalidId(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("modern-2").is_ok());
        assert!(validate_id("42").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("../etc/passwd").is_err());
        assert!(validate_id("a/b").is_err());
        assert!(validate_id("a.html").is_err());
    }
}
