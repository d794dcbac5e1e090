//! HTTP Server configuration and startup.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use wallet_types::MarketRepository;

use super::auth::auth_middleware;
use super::handlers::{self, AppState};
use crate::MarketService;

/// HTTP Server for the wallet marketplace API.
pub struct HttpServer<R: MarketRepository> {
    state: Arc<AppState<R>>,
}

impl<R: MarketRepository> HttpServer<R> {
    /// Creates a new HTTP server with the given service.
    pub fn new(service: MarketService<R>) -> Self {
        Self {
            state: Arc::new(AppState { service }),
        }
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        // Build HTTP metrics layer (uses globally set MeterProvider)
        let metrics = axum_otel_metrics::HttpMetricsLayerBuilder::new().build();

        Router::new()
            .route("/health", get(handlers::health))
            .route("/api/users", post(handlers::register_user::<R>))
            .route("/api/users/me", get(handlers::current_user::<R>))
            .route(
                "/api/users/{id}/transactions",
                get(handlers::list_user_transactions::<R>),
            )
            .route("/api/keys", post(handlers::create_api_key::<R>))
            .route("/api/keys/{id}", delete(handlers::revoke_api_key::<R>))
            .route(
                "/api/merchants",
                post(handlers::create_merchant::<R>).get(handlers::list_merchants::<R>),
            )
            .route(
                "/api/merchants/{id}",
                get(handlers::get_merchant::<R>)
                    .put(handlers::update_merchant::<R>)
                    .delete(handlers::delete_merchant::<R>),
            )
            .route(
                "/api/merchants/{id}/items",
                post(handlers::create_item::<R>),
            )
            .route("/api/items", get(handlers::list_items::<R>))
            .route(
                "/api/items/{id}",
                get(handlers::get_item::<R>)
                    .put(handlers::update_item::<R>)
                    .delete(handlers::delete_item::<R>),
            )
            .route(
                "/api/wallets",
                post(handlers::create_wallet::<R>).get(handlers::list_wallets::<R>),
            )
            .route(
                "/api/wallets/{id}",
                get(handlers::get_wallet::<R>)
                    .put(handlers::update_wallet::<R>)
                    .delete(handlers::delete_wallet::<R>),
            )
            .route(
                "/api/transactions/{id}",
                get(handlers::get_transaction::<R>).delete(handlers::delete_transaction::<R>),
            )
            .route(
                "/api/transactions/{buyer_wallet_id}/{vendor_wallet_id}/{item_id}",
                post(handlers::purchase::<R>),
            )
            .layer(metrics)
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                auth_middleware::<R>,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
