//! Shared application state for Axum handlers and middleware.
//!
//! # Structured Concurrency
//!
//! The background store health check is tracked by a
//! `tokio_util::task::TaskTracker` and stopped through a `CancellationToken`.
//! Call `shutdown()` after the HTTP server has drained.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::db::Database;
use crate::middleware::{CsrfProtection, TrustedProxyConfig};

/// Shared application state.
///
/// Cloned for every request; all fields are cheap handles.
///
/// ```rust,ignore
/// let state = AppState::new(db, config);
/// // ... serve ...
/// state.shutdown().await;
/// ```
#[derive(Clone)]
pub struct AppState {
    /// Document store handle
    pub db: Database,
    /// CSRF token issuing and verification
    pub csrf: Arc<CsrfProtection>,
    /// Reverse proxies allowed to set forwarding headers
    pub trusted_proxies: Arc<TrustedProxyConfig>,
    /// Timestamp when the application started
    pub started_at: Instant,
    /// Application configuration
    pub config: Arc<Config>,
    task_tracker: TaskTracker,
    cancellation_token: CancellationToken,
}

impl AppState {
    /// Build the state and start the background health check.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(db: Database, config: Config) -> Self {
        let state = Self {
            db,
            csrf: Arc::new(CsrfProtection::from_config(&config)),
            trusted_proxies: Arc::new(TrustedProxyConfig::new(&config.trusted_proxies)),
            started_at: Instant::now(),
            config: Arc::new(config),
            task_tracker: TaskTracker::new(),
            cancellation_token: CancellationToken::new(),
        };

        state.spawn_health_check_task(state.config.health_check_interval);

        state
    }

    /// Periodically ping the store so `/health` reflects outages even when
    /// no requests arrive. Transitions are logged by `Database` itself.
    fn spawn_health_check_task(&self, every: Duration) {
        if every.is_zero() {
            debug!("Background health check disabled");
            return;
        }

        let db = self.db.clone();
        let cancel = self.cancellation_token.clone();

        self.task_tracker.spawn(async move {
            let mut ticker = interval(every);
            ticker.tick().await; // Skip first immediate tick

            loop {
                tokio::select! {
                    biased;

                    _ = cancel.cancelled() => {
                        debug!("Health check task received cancellation signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        match db.ping().await {
                            Ok(()) => trace!("Health check: document store OK"),
                            Err(e) => warn!(error = %e, "Health check: document store ping failed"),
                        }
                    }
                }
            }

            debug!("Health check task shutting down");
        });
    }

    /// Stop background tasks and wait for them to finish.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown of background tasks");

        self.cancellation_token.cancel();
        self.task_tracker.close();
        self.task_tracker.wait().await;

        info!("All background tasks have completed");
    }

    /// Get the application uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_stops_health_check() {
        let config = Config {
            health_check_interval: Duration::from_millis(10),
            ..Config::default()
        };
        let state = AppState::new(Database::in_memory(config.operation_timeout), config);

        tokio::time::sleep(Duration::from_millis(30)).await;
        tokio::time::timeout(Duration::from_secs(1), state.shutdown())
            .await
            .unwrap();

        assert!(state.db.is_connected());
    }

    #[tokio::test]
    async fn test_state_uses_configured_cookie_name() {
        let config = Config {
            csrf_cookie_name: "portfolio_csrf".to_string(),
            ..Config::default()
        };
        let state = AppState::new(Database::in_memory(config.operation_timeout), config);

        assert_eq!(state.csrf.cookie_name(), "portfolio_csrf");
        assert_eq!(state.uptime_seconds(), 0);
        state.shutdown().await;
    }
}
