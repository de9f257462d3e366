//! Quiz server binary entrypoint wiring REST, WebSocket, SSE, and the question store.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quizor_back::{
    config::AppConfig,
    dao::question_store::QuestionStore,
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load().context("loading configuration")?;
    info!(port = config.port, database = %config.store.database, "configuration loaded");

    // Failing to reach the store at startup is the only fatal runtime error.
    let store = connect_store(&config).await?;
    let port = config.port;
    let app_state = AppState::new(config, store);

    tokio::spawn(storage_supervisor::run(app_state.clone()));
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

#[cfg(feature = "mongo-store")]
async fn connect_store(config: &AppConfig) -> anyhow::Result<Arc<dyn QuestionStore>> {
    use quizor_back::dao::question_store::mongodb::{MongoConfig, MongoQuestionStore};

    let mongo_config = MongoConfig::from_uri(&config.store.uri, Some(&config.store.database))
        .await
        .context("parsing MongoDB connection string")?;
    let store = MongoQuestionStore::connect(mongo_config)
        .await
        .context("connecting to MongoDB")?;
    info!(database = %config.store.database, "connected to MongoDB");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "mongo-store"))]
async fn connect_store(_config: &AppConfig) -> anyhow::Result<Arc<dyn QuestionStore>> {
    use quizor_back::dao::question_store::memory::MemoryQuestionStore;

    tracing::warn!("built without `mongo-store`; questions are kept in memory only");
    Ok(Arc::new(MemoryQuestionStore::new()))
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
