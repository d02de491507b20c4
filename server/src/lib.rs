//! HTTP service for managing todo items.
//!
//! # Overview
//! `routes` maps the REST surface onto a `TodoStore`; `payload` shapes and
//! validates the JSON going in and out; `store` holds the in-memory and
//! PostgreSQL backends. The binary in `main.rs` wires these together from
//! `Config`.

pub mod config;
pub mod error;
pub mod model;
pub mod payload;
pub mod routes;
pub mod store;
pub mod telemetry;

use std::future::Future;

use axum::http::{HeaderValue, Method};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use config::{Config, CorsOrigins};
pub use model::{NewTodo, Patch, Todo, TodoPatch};
pub use store::{MemoryStore, PgStore, SharedStore, StoreError, TodoStore};

/// The bare router, without CORS or request tracing.
pub fn app(store: SharedStore) -> Router {
    routes::router(store)
}

/// The router as served in production: CORS per `origins` and a trace span
/// per request.
pub fn app_with_layers(store: SharedStore, origins: &CorsOrigins) -> Router {
    app(store)
        .layer(cors_layer(origins))
        .layer(TraceLayer::new_for_http())
}

pub fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let allow_origin = match origins {
        CorsOrigins::Any => AllowOrigin::from(Any),
        CorsOrigins::List(list) if list.iter().any(|origin| origin == "*") => AllowOrigin::from(Any),
        CorsOrigins::List(list) => AllowOrigin::list(list.iter().filter_map(|origin| {
            origin
                .parse::<HeaderValue>()
                .inspect_err(|_| warn!(%origin, "ignoring invalid CORS origin"))
                .ok()
        })),
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

pub async fn run<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
