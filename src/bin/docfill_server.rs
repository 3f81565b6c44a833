//! HTTP server for the placeholder fill engine.

use std::sync::Arc;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use docfill::api;
use docfill::config::EngineConfig;
use docfill::engine::FillEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docfill=info,tower_http=debug".into()),
        )
        .init();

    dotenvy::dotenv().ok();

    let config = EngineConfig::from_env()?;
    if config.oracle_api_key.is_none() {
        info!("no oracle API key configured; field detection is disabled");
    }

    let engine = Arc::new(FillEngine::new(config));

    let app = api::router(engine).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
    );

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8000);
    let addr = format!("0.0.0.0:{}", port);
    info!("starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
