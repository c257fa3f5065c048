//! Persistence layer for contact submissions and projects.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Database                             │
//! │  ┌─────────────────┐  ┌──────────────────────────────────┐  │
//! │  │ Connection      │  │ Operations (timeout-bounded)     │  │
//! │  │ - connect()     │  │ - insert_contact                 │  │
//! │  │   fixed-delay   │  │ - insert_project                 │  │
//! │  │   retry loop    │  │ - list_projects                  │  │
//! │  │ - ping()        │  │                                  │  │
//! │  └─────────────────┘  └──────────────────────────────────┘  │
//! ├─────────────────────────────────────────────────────────────┤
//! │       Backend::Mongo (MongoStore) | Backend::Memory         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Connection Resilience
//!
//! The initial connection is retried at a fixed interval
//! (`DB_RECONNECT_INTERVAL_SECS`, 5 seconds by default) until it succeeds or
//! `DB_MAX_CONNECT_ATTEMPTS` is exhausted. After that the MongoDB driver
//! re-establishes pooled connections on its own; this layer only tracks the
//! last known reachability for `/health` and `/ready`.

mod connection;
mod memory;
mod mongo;
mod records;

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::models::{NewContact, NewProject};

pub use connection::ConnectionState;
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use records::{CONTACTS_COLLECTION, ContactRecord, PROJECTS_COLLECTION, ProjectRecord};

#[derive(Clone, Debug)]
enum Backend {
    Mongo(MongoStore),
    Memory(MemoryStore),
}

/// Clonable handle to the document store.
#[derive(Clone, Debug)]
pub struct Database {
    backend: Backend,
    state: Arc<ConnectionState>,
    operation_timeout: Duration,
}

impl Database {
    /// Connect to the store named by `config.mongodb_uri`.
    ///
    /// `memory://` URIs resolve immediately to the in-process store. Anything
    /// else goes through the fixed-interval retry loop.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConnectionFailed` once `max_connect_attempts`
    /// attempts have failed. With `max_connect_attempts == 0` this only
    /// returns on success.
    #[instrument(skip(config), fields(uri = %config.redacted_mongodb_uri(), database = %config.database_name))]
    pub async fn connect(config: &Config) -> AppResult<Self> {
        if config.uses_memory_store() {
            warn!("Using in-memory document store; data will not survive a restart");
            return Ok(Self::in_memory(config.operation_timeout));
        }

        let state = Arc::new(ConnectionState::new());
        let max_attempts = config.max_connect_attempts;

        loop {
            let attempt = state.increment_attempts();
            metrics::record_db_connect_attempt();

            match MongoStore::connect(
                &config.mongodb_uri,
                &config.database_name,
                config.operation_timeout,
            )
            .await
            {
                Ok(store) => {
                    state.set_connected(true);
                    metrics::set_db_connection_status(true);
                    info!(attempt, "Connected to MongoDB");
                    return Ok(Self {
                        backend: Backend::Mongo(store),
                        state,
                        operation_timeout: config.operation_timeout,
                    });
                }
                Err(e) if max_attempts > 0 && attempt >= max_attempts => {
                    error!(attempt, error = %e, "Giving up on MongoDB connection");
                    return Err(AppError::ConnectionFailed(format!(
                        "Failed to connect after {attempt} attempts: {e}"
                    )));
                }
                Err(e) => {
                    warn!(
                        attempt,
                        retry_in_secs = config.reconnect_interval.as_secs_f64(),
                        error = %e,
                        "MongoDB connection failed, retrying"
                    );
                    sleep(config.reconnect_interval).await;
                }
            }
        }
    }

    /// A handle backed by a fresh in-process store.
    pub fn in_memory(operation_timeout: Duration) -> Self {
        let state = Arc::new(ConnectionState::new());
        state.set_connected(true);

        Self {
            backend: Backend::Memory(MemoryStore::new()),
            state,
            operation_timeout,
        }
    }

    /// The in-process store, if this handle uses one.
    pub fn memory_store(&self) -> Option<&MemoryStore> {
        match &self.backend {
            Backend::Memory(store) => Some(store),
            Backend::Mongo(_) => None,
        }
    }

    /// Last known reachability (see [`Database::ping`] for a live check).
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Live round trip to the store. Updates the connection state and logs
    /// transitions.
    pub async fn ping(&self) -> AppResult<()> {
        self.run("ping", async {
            match &self.backend {
                Backend::Mongo(store) => store.ping().await,
                Backend::Memory(_) => Ok(()),
            }
        })
        .await
    }

    /// Persist a validated contact submission.
    pub async fn insert_contact(&self, contact: NewContact) -> AppResult<ContactRecord> {
        let record = ContactRecord::new(contact);
        self.run("insert_contact", async {
            match &self.backend {
                Backend::Mongo(store) => store.insert_contact(&record).await,
                Backend::Memory(store) => store.insert_contact(&record).await,
            }
        })
        .await?;
        Ok(record)
    }

    /// Persist a validated project.
    pub async fn insert_project(&self, project: NewProject) -> AppResult<ProjectRecord> {
        let record = ProjectRecord::new(project);
        self.run("insert_project", async {
            match &self.backend {
                Backend::Mongo(store) => store.insert_project(&record).await,
                Backend::Memory(store) => store.insert_project(&record).await,
            }
        })
        .await?;
        Ok(record)
    }

    /// All projects, newest first.
    pub async fn list_projects(&self) -> AppResult<Vec<ProjectRecord>> {
        self.run("list_projects", async {
            match &self.backend {
                Backend::Mongo(store) => store.list_projects().await,
                Backend::Memory(store) => store.list_projects().await,
            }
        })
        .await
    }

    /// Bound an operation by the configured timeout, record its duration,
    /// and fold the outcome into the connection state.
    async fn run<T, F>(&self, operation: &'static str, fut: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        let started = Instant::now();
        let result = match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::OperationTimeout(format!(
                "{operation} exceeded {:?}",
                self.operation_timeout
            ))),
        };
        metrics::record_db_operation_duration(operation, started.elapsed().as_secs_f64());

        let connected = result.is_ok();
        let was_connected = self.state.set_connected(connected);
        if was_connected != connected {
            metrics::set_db_connection_status(connected);
            if connected {
                info!(operation, "Document store reachable again");
            } else {
                warn!(operation, "Document store unreachable");
            }
        }

        result
    }
}
