//! # planx-server: HTTP Service for Plan Lowering
//!
//! This binary exposes the lowering pipeline as a network service. The planner
//! process posts a logical plan together with the descriptors of the tables it
//! references and receives the serialized physical plan to ship to workers.
//!
//! ## Architecture
//!
//! ```text
//! Planner
//!   |
//!   | HTTP POST /lower (JSON logical plan + catalog)
//!   v
//! planx-server (this binary)
//!   |
//!   +-> Lowerer (converter rules, bottom-up)
//!   +-> Distribution propagator (exchange insertion)
//!   +-> Plan serializer (catalog ids, wire payloads)
//!   |
//!   | HTTP response (protobuf PlanFragment)
//!   v
//! Workers
//! ```
//!
//! ## Endpoints
//!
//! - `GET  /health`      - Health check
//! - `GET  /rules`       - List registered converter rules
//! - `POST /lower`       - Lower a plan, respond with the protobuf `PlanFragment`
//! - `POST /lower/json`  - Lower a plan, respond with a JSON description
//!
//! ## Configuration
//!
//! The server listens on `0.0.0.0:3000` unless `PLANX_LISTEN_ADDR` says otherwise.
//! Logging is controlled by the `RUST_LOG` environment variable (defaults to
//! `planx=debug`).

mod routes;
mod state;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("planx=debug".parse()?))
        .init();

    let config = state::ServerConfig::from_env();
    let listen_addr = config.listen_addr.clone();
    let state = Arc::new(state::AppState::new(config)?);
    tracing::info!("Loaded {} converter rules", state.rule_registry.len());

    let app = Router::new()
        .route("/health", get(routes::health))
        .route("/rules", get(routes::list_rules))
        .route("/lower", post(routes::lower_proto))
        .route("/lower/json", post(routes::lower_json))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!("planx-server listening on http://{}", listen_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
