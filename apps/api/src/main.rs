use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dossier::analysis::ExtractionPipeline;
use dossier::config::Config;
use dossier::normalizer::Normalizer;
use dossier::routes::build_router;
use dossier::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Malformed values fail here; a missing API key does not.
    let config = Config::from_env()?;

    // Library spans live under `dossier`, the binary under `dossier_api`.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "dossier={level},dossier_api={level},tower_http={level}",
                level = &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Dossier API v{}", env!("CARGO_PKG_VERSION"));

    let pipeline = ExtractionPipeline::from_config(&config)?;
    info!(
        model = %pipeline.settings().model,
        fallback = ?pipeline.settings().fallback_model,
        schema = ?pipeline.settings().schema_variant,
        configured = pipeline.is_configured(),
        "Extraction pipeline initialized"
    );

    let state = AppState {
        normalizer: Arc::new(Normalizer::default()),
        pipeline: Arc::new(pipeline),
        max_upload_bytes: config.max_upload_bytes,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
