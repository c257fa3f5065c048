//! In-process backend for development (`MONGODB_URI=memory://`) and tests.
//!
//! Data lives for the lifetime of the process only.

use std::sync::Arc;

use tokio::sync::RwLock;

use super::records::{ContactRecord, ProjectRecord};
use crate::error::AppResult;

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    contacts: Arc<RwLock<Vec<ContactRecord>>>,
    projects: Arc<RwLock<Vec<ProjectRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_contact(&self, record: &ContactRecord) -> AppResult<()> {
        self.contacts.write().await.push(record.clone());
        Ok(())
    }

    pub async fn insert_project(&self, record: &ProjectRecord) -> AppResult<()> {
        self.projects.write().await.push(record.clone());
        Ok(())
    }

    /// All projects, newest first. Projects created within the same
    /// millisecond come back in reverse insertion order.
    pub async fn list_projects(&self) -> AppResult<Vec<ProjectRecord>> {
        let mut projects: Vec<ProjectRecord> =
            self.projects.read().await.iter().rev().cloned().collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    /// Snapshot of stored contacts.
    pub async fn contacts(&self) -> Vec<ContactRecord> {
        self.contacts.read().await.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::NewProject;
    use mongodb::bson::DateTime;

    fn project(title: &str, created_at_millis: i64) -> ProjectRecord {
        let mut record = ProjectRecord::new(NewProject {
            title: title.to_string(),
            description: "d".to_string(),
            technologies: vec![],
            image_url: None,
            project_url: None,
        });
        record.created_at = DateTime::from_millis(created_at_millis);
        record
    }

    #[tokio::test]
    async fn test_list_projects_newest_first() {
        let store = MemoryStore::new();
        store.insert_project(&project("old", 1_000)).await.unwrap();
        store.insert_project(&project("new", 3_000)).await.unwrap();
        store.insert_project(&project("mid", 2_000)).await.unwrap();

        let titles: Vec<_> = store
            .list_projects()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn test_list_projects_ties_latest_insert_first() {
        let store = MemoryStore::new();
        store.insert_project(&project("first", 5_000)).await.unwrap();
        store.insert_project(&project("second", 5_000)).await.unwrap();

        let projects = store.list_projects().await.unwrap();
        assert_eq!(projects[0].title, "second");
        assert_eq!(projects[1].title, "first");
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let store = MemoryStore::new();
        let clone = store.clone();
        clone.insert_project(&project("shared", 1)).await.unwrap();

        assert_eq!(store.list_projects().await.unwrap().len(), 1);
    }
}
