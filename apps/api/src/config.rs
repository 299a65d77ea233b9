use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Where templates are loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateBackend {
    Directory(PathBuf),
    Remote { base_url: String },
}

/// Application configuration loaded from environment variables.
/// Startup fails if no template backend is configured.
#[derive(Debug, Clone)]
pub struct Config {
    pub templates: TemplateBackend,
    pub template_fetch_timeout: Duration,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so parsing can be tested without
    /// touching the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let templates = match (var("TEMPLATE_DIR"), var("TEMPLATE_API_URL")) {
            (Some(dir), _) => TemplateBackend::Directory(PathBuf::from(dir)),
            (None, Some(base_url)) => TemplateBackend::Remote { base_url },
            (None, None) => bail!(
                "Required environment variable 'TEMPLATE_DIR' or 'TEMPLATE_API_URL' is not set"
            ),
        };

        Ok(Config {
            templates,
            template_fetch_timeout: Duration::from_secs(
                parse_or(var("TEMPLATE_FETCH_TIMEOUT_SECS"), DEFAULT_FETCH_TIMEOUT_SECS)
                    .context("TEMPLATE_FETCH_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            max_upload_bytes: parse_or(var("MAX_UPLOAD_BYTES"), DEFAULT_MAX_UPLOAD_BYTES)
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            port: parse_or(var("PORT"), DEFAULT_PORT).context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => Ok(raw.trim().parse::<T>()?),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_directory_backend() {
        let cfg = config(&[("TEMPLATE_DIR", "./templates")]).unwrap();
        assert_eq!(cfg.templates, TemplateBackend::Directory(PathBuf::from("./templates")));
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.rust_log, "info");
        assert_eq!(cfg.template_fetch_timeout, Duration::from_secs(10));
        assert_eq!(cfg.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_directory_wins_over_remote() {
        let cfg = config(&[
            ("TEMPLATE_DIR", "/srv/templates"),
            ("TEMPLATE_API_URL", "http://backend:8000"),
        ])
        .unwrap();
        assert!(matches!(cfg.templates, TemplateBackend::Directory(_)));
    }

    #[test]
    fn test_remote_backend_and_overrides() {
        let cfg = config(&[
            ("TEMPLATE_API_URL", "http://backend:8000"),
            ("PORT", "9000"),
            ("TEMPLATE_FETCH_TIMEOUT_SECS", "3"),
            ("MAX_UPLOAD_BYTES", "1024"),
        ])
        .unwrap();
        assert_eq!(
            cfg.templates,
            TemplateBackend::Remote {
                base_url: "http://backend:8000".to_string()
            }
        );
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.template_fetch_timeout, Duration::from_secs(3));
        assert_eq!(cfg.max_upload_bytes, 1024);
    }

    #[test]
    fn test_missing_backend_is_an_error() {
        let err = config(&[("PORT", "8080")]).unwrap_err();
        assert!(err.to_string().contains("TEMPLATE_DIR"));
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        assert!(config(&[("TEMPLATE_DIR", "t"), ("PORT", "http")]).is_err());
    }
}
