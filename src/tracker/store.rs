//! Record-store capability passed to the API handlers.
//!
//! Handlers only ever see an `Arc<dyn IssueStore>`. The SQLite document
//! store (`db::DbHandle`) backs the server; [`MemoryStore`] backs tests and
//! `serve --memory`.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::models::{Issue, IssueId, NewIssue};
use crate::errors::TrackerError;

#[async_trait]
pub trait IssueStore: Send + Sync {
    /// Every persisted issue, in insertion order.
    async fn list(&self) -> Result<Vec<Issue>>;

    /// Persist `issue` and return the identifier the store generated for it.
    async fn insert(&self, issue: NewIssue) -> Result<IssueId>;

    async fn find(&self, id: &IssueId) -> Result<Option<Issue>>;

    /// Insert, then re-read the stored document so callers observe the
    /// canonical representation. A failed re-read after a successful insert
    /// is still an error; the record stays persisted.
    async fn insert_and_fetch(&self, issue: NewIssue) -> Result<Issue, TrackerError> {
        let id = self.insert(issue).await.map_err(TrackerError::Store)?;
        self.find(&id)
            .await
            .map_err(TrackerError::Store)?
            .ok_or_else(|| TrackerError::IssueMissingAfterInsert { id: id.to_string() })
    }
}

pub type SharedStore = Arc<dyn IssueStore>;

/// Volatile store holding issues in a vector. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    issues: RwLock<Vec<Issue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IssueStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Issue>> {
        Ok(self.issues.read().await.clone())
    }

    async fn insert(&self, issue: NewIssue) -> Result<IssueId> {
        let id = IssueId::generate();
        self.issues
            .write()
            .await
            .push(Issue::from_new(id.clone(), issue));
        Ok(id)
    }

    async fn find(&self, id: &IssueId) -> Result<Option<Issue>> {
        Ok(self.issues.read().await.iter().find(|i| &i.id == id).cloned())
    }
}
