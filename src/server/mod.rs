//! HTTP surface
//!
//! - `handlers`: request handlers for the comparison API
//! - `error`: mapping of comparison failures to HTTP responses

pub mod error;
pub mod handlers;

use crate::config::ServerConfig;
use anyhow::Context;
use axum::Router;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        AppState {
            config: Arc::new(config),
        }
    }

    pub fn repository_path(&self) -> &Path {
        &self.config.repository_path
    }
}

pub fn router(config: ServerConfig) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/compare-versions", post(handlers::compare_versions))
        .route("/compare-versions/", post(handlers::compare_versions))
        .route("/refs", get(handlers::list_refs))
        .layer(middleware::from_fn(log_request))
        .with_state(AppState::new(config))
}

pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("unable to bind {}", config.bind_address))?;

    log::info!(
        "serving {} on http://{}",
        config.repository_path.display(),
        listener.local_addr()?
    );

    axum::serve(listener, router(config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("unable to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    log::info!("shutting down");
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;
    log::info!("{method} {path} {}", response.status().as_u16());

    response
}
