//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod routes;

pub use routes::router;

use sqlx::PgPool;

use crate::auth::AuthService;

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub auth: AuthService,
}
