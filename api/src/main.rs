//! Atelier API server binary.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use atelier_api::{build_router, ApiConfig, ApiState};
use atelier_critique::OpenAiVision;
use atelier_store::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ApiConfig::parse();

    let mut model = OpenAiVision::new(config.model_api_key.clone());
    if let Some(base_url) = &config.model_base_url {
        model = model.with_base_url(base_url.clone());
    }
    model = model.with_model(config.model_name.clone());

    let bind = config.bind.clone();
    let state = ApiState::new(Arc::new(Database::new()), Arc::new(model), config);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(%bind, "atelier api listening");
    axum::serve(listener, router).await?;
    Ok(())
}
