mod api;
mod middleware;
mod spa;

use std::sync::Arc;

use hirelane_db::DbContext;
use hirelane_gateway::HttpCrmGateway;
use hirelane_store::{KvStore, MemoryStore, SqliteStore};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = hirelane_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let gateway = HttpCrmGateway::new(
        &config.crm_base_url,
        config.crm_api_token.clone(),
        config.crm_request_timeout_secs,
    )?;

    // A broken store path degrades to the in-memory cache; table resolution
    // then re-queries metadata on every restart.
    let store: Arc<dyn KvStore> = match SqliteStore::open(&config.store_path).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!(path = %config.store_path.display(), error = %e,
                "could not open the persistent store; falling back to in-memory");
            Arc::new(MemoryStore::new())
        }
    };

    let ctx = Arc::new(DbContext::new(Arc::new(gateway), store));
    let app = build_app(AppState {
        ctx,
        static_dir: config.static_dir.clone(),
    });

    tracing::info!(addr = %config.bind_addr, "starting server");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
