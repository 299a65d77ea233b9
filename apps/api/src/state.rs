use std::sync::Arc;

use crate::config::Config;
use crate::templates::TemplateSource;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Directory- or HTTP-backed, chosen from `Config::templates` at startup.
    pub templates: Arc<dyn TemplateSource>,
}
