mod config;
mod cv;
mod errors;
mod import;
mod preview;
mod render;
mod routes;
mod state;
mod templates;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, TemplateBackend};
use crate::routes::build_router;
use crate::state::AppState;
use crate::templates::{DirectoryTemplateSource, RemoteTemplateSource, TemplateSource};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on a missing template backend)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV preview API v{}", env!("CARGO_PKG_VERSION"));

    let templates = build_template_source(&config)?;
    info!("Template source: {}", templates.describe());

    let state = AppState {
        config: config.clone(),
        templates,
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_template_source(config: &Config) -> Result<Arc<dyn TemplateSource>> {
    let source: Arc<dyn TemplateSource> = match &config.templates {
        TemplateBackend::Directory(dir) => Arc::new(DirectoryTemplateSource::new(dir.clone())),
        TemplateBackend::Remote { base_url } => Arc::new(RemoteTemplateSource::new(
            base_url,
            config.template_fetch_timeout,
        )?),
    };
    Ok(source)
}
