use std::sync::Arc;

use anyhow::Context;

use crease_api::app::{self, services::ScorerServices};
use crease_infra::ScorerSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    crease_observability::init();

    let settings = ScorerSettings::from_env();
    let services = Arc::new(ScorerServices::from_settings(&settings)?);
    let app = app::build_app(services.clone());

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let unsaved = services.writer.flush();
    if unsaved.is_empty() {
        tracing::info!("all snapshots saved; shutting down");
    } else {
        tracing::error!(unsaved = unsaved.len(), "shutting down with unsaved snapshots");
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
