//! # Portfolio API
//!
//! REST backend for a personal portfolio site: a contact form and a list of
//! projects, stored in MongoDB and hardened for exposure on the open web.
//!
//! - **Security**: CSRF tokens, per-client rate limiting on the contact form,
//!   NoSQL-operator stripping and HTML escaping of JSON bodies, helmet-style
//!   response headers, body size limits
//! - **Resilience**: Fixed-interval reconnect loop, per-operation timeouts
//! - **Observability**: Request IDs, structured logging, Prometheus metrics,
//!   health and readiness endpoints
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Middleware (Request ID → Trace → Headers → Sanitize →      │
//! │              CORS → Rate Limit → Body Limit → CSRF)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Handlers (csrf, contact, projects, health)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Validation → Database (timeouts, connection state)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  MongoDB (or the in-memory store for development)           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use portfolio_api::{AppState, Config, Database, build_router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let db = Database::connect(&config).await?;
//!
//!     let state = AppState::new(db, config);
//!     let app = build_router(state)?;
//!
//!     // Serve with into_make_service_with_connect_info::<SocketAddr>()...
//!     Ok(())
//! }
//! ```
//!
//! ## Local Development
//!
//! Run without MongoDB:
//! ```bash
//! MONGODB_URI=memory:// cargo run
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod utils;
pub mod validation;

// Re-exports for convenience
pub use config::Config;
pub use db::Database;
pub use error::{AppError, AppResult};
pub use routes::build_router;
pub use state::AppState;
