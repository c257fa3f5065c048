//! MongoDB backend.

use std::time::Duration;

use futures::TryStreamExt;
use mongodb::bson::{Document, doc};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use tracing::debug;

use super::records::{CONTACTS_COLLECTION, ContactRecord, PROJECTS_COLLECTION, ProjectRecord};
use crate::error::{AppError, AppResult};

/// Application name reported to the server (visible in `currentOp` and logs).
const APP_NAME: &str = "portfolio-api";

/// Handle to the MongoDB database holding the portfolio collections.
///
/// Cheap to clone: the driver's `Client` is a pooled, reference-counted handle.
#[derive(Clone, Debug)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    /// Create a client for `uri` and verify the server answers a `ping`.
    ///
    /// Server selection is bounded by `timeout` so an unreachable host fails
    /// the attempt instead of hanging the connect loop.
    pub async fn connect(uri: &str, database_name: &str, timeout: Duration) -> AppResult<Self> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| AppError::ConnectionFailed(e.to_string()))?;
        options.app_name = Some(APP_NAME.to_string());
        options.server_selection_timeout = Some(timeout);
        options.connect_timeout = Some(timeout);

        let client =
            Client::with_options(options).map_err(|e| AppError::ConnectionFailed(e.to_string()))?;

        let store = Self {
            database: client.database(database_name),
        };
        store
            .ping()
            .await
            .map_err(|e| AppError::ConnectionFailed(e.to_string()))?;

        debug!(database = database_name, "MongoDB ping succeeded");
        Ok(store)
    }

    fn contacts(&self) -> Collection<ContactRecord> {
        self.database.collection(CONTACTS_COLLECTION)
    }

    fn projects(&self) -> Collection<ProjectRecord> {
        self.database.collection(PROJECTS_COLLECTION)
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn insert_contact(&self, record: &ContactRecord) -> AppResult<()> {
        self.contacts()
            .insert_one(record)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn insert_project(&self, record: &ProjectRecord) -> AppResult<()> {
        self.projects()
            .insert_one(record)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All projects, newest first. Documents that cannot be decoded are
    /// logged and left out.
    pub async fn list_projects(&self) -> AppResult<Vec<ProjectRecord>> {
        let mut cursor = self
            .database
            .collection::<Document>(PROJECTS_COLLECTION)
            .find(doc! {})
            .sort(doc! { "createdAt": -1 })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut projects = Vec::new();
        while let Some(document) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            projects.extend(ProjectRecord::from_stored(document));
        }

        Ok(projects)
    }
}
