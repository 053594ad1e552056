//! Per-user access to the `projects` and `tasks` collections.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{Project, ProjectId, Session, Task};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to fetch {collection}: {reason}")]
    Fetch {
        collection: &'static str,
        reason: String,
    },

    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),

    #[error("corrupt {table} row: {detail}")]
    Corrupt { table: &'static str, detail: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub(crate) fn fetch(collection: &'static str, reason: impl ToString) -> Self {
        Self::Fetch {
            collection,
            reason: reason.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ProjectNotFound(_))
    }
}

/// Data-access contract the projects page is written against.
///
/// Every call is scoped to the session's user. Mutations return nothing; the
/// caller re-fetches to observe their effect.
#[async_trait]
pub trait DataAccess: Send + Sync {
    async fn list_projects(&self, session: &Session) -> StoreResult<Vec<Project>>;

    async fn list_tasks(&self, session: &Session) -> StoreResult<Vec<Task>>;

    async fn create_project(
        &self,
        session: &Session,
        name: &str,
        description: &str,
    ) -> StoreResult<()>;

    async fn edit_project(
        &self,
        session: &Session,
        id: ProjectId,
        name: &str,
        description: &str,
    ) -> StoreResult<()>;

    /// Deleting a project that does not exist is not an error.
    async fn delete_project(&self, session: &Session, id: ProjectId) -> StoreResult<()>;
}
