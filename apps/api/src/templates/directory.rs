use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::templates::{validate_id, TemplateAsset, TemplateSource, TemplateSourceError};

/// Serves `<root>/<id>.html` with an optional `<root>/<id>.css` beside it.
#[derive(Debug, Clone)]
pub struct DirectoryTemplateSource {
    root: PathBuf,
}

impl DirectoryTemplateSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl TemplateSource for DirectoryTemplateSource {
    async fn fetch(&self, id: &str) -> Result<TemplateAsset, TemplateSourceError> {
        validate_id(id)?;

        let html_path = self.root.join(format!("{id}.html"));
        let html = match tokio::fs::read_to_string(&html_path).await {
            Ok(html) => html,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(TemplateSourceError::NotFound(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let css = match tokio::fs::read_to_string(self.root.join(format!("{id}.css"))).await {
            Ok(css) => css,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(
            "Loaded template '{id}' from {} ({} bytes html, {} bytes css)",
            html_path.display(),
            html.len(),
            css.len()
        );

        Ok(TemplateAsset {
            id: id.to_string(),
            name: id.to_string(),
            html,
            css,
            is_premium: false,
        })
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_html_and_css() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("classic.html"), "<h1>{{full_name}}</h1>").unwrap();
        std::fs::write(dir.path().join("classic.css"), "h1 { color: navy; }").unwrap();

        let source = DirectoryTemplateSource::new(dir.path());
        let asset = source.fetch("classic").await.unwrap();
        assert_eq!(asset.id, "classic");
        assert_eq!(asset.html, "<h1>{{full_name}}</h1>");
        assert_eq!(asset.css, "h1 { color: navy; }");
    }

    #[tokio::test]
    async fn test_css_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("plain.html"), "<p></p>").unwrap();

        let asset = DirectoryTemplateSource::new(dir.path())
            .fetch("plain")
            .await
            .unwrap();
        assert_eq!(asset.css, "");
    }

    #[tokio::test]
    async fn test_missing_template_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = DirectoryTemplateSource::new(dir.path())
            .fetch("nope")
            .await
            .unwrap_err();
        assert!(matches!(err, TemplateSourceError::NotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let err = DirectoryTemplateSource::new(dir.path())
            .fetch("../secret")
            .await
            .unwrap_err();
        assert!(matches!(err, TemplateSourceError::InvalidId(_)));
    }
}
