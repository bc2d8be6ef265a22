//! pusherable-server - demo REST server for pusherable.
//!
//! Hosts a `Task` model behind detail, update and delete views that publish
//! Pusher notifications through the pusherable lifecycle hooks.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pusherable_core::PusherSettings;
//! use pusherable_server::{create_server, AppState};
//!
//! #[tokio::main]
//! async fn main() {
//!     let state = AppState::new(Arc::new(PusherSettings::from_env()));
//!     let app = create_server(state);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod error;
pub mod middleware;
pub mod model;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use model::{Task, TaskForm};
pub use state::AppState;

use axum::{middleware as axum_middleware, Router};
use tower_http::trace::TraceLayer;

/// Create the server with all routes and middleware.
pub fn create_server(state: AppState) -> Router {
    routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}
