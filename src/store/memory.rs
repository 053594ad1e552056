use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DataAccess, StoreError, StoreResult};
use crate::types::{Project, ProjectId, Session, Task, now_iso};

/// In-memory store keyed by owner uid. Used by tests and `--ephemeral` runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    projects: RwLock<HashMap<String, Vec<Project>>>,
    tasks: RwLock<HashMap<String, Vec<Task>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    mutation_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent list call fail with [`StoreError::Fetch`].
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent mutation fail without touching the data.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of create/edit/delete calls received, failed ones included.
    pub fn mutation_calls(&self) -> usize {
        self.mutation_calls.load(Ordering::SeqCst)
    }

    pub async fn add_task(&self, session: &Session, title: &str, project: &str) -> Task {
        let task = Task {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            project: project.to_string(),
            completed: false,
            created_at: now_iso(),
        };
        self.tasks
            .write()
            .await
            .entry(session.uid.clone())
            .or_default()
            .push(task.clone());
        task
    }

    fn check_read(&self, collection: &'static str) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::fetch(collection, "store unavailable"));
        }
        Ok(())
    }

    fn check_write(&self) -> StoreResult<()> {
        self.mutation_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DataAccess for MemoryStore {
    async fn list_projects(&self, session: &Session) -> StoreResult<Vec<Project>> {
        self.check_read("projects")?;
        Ok(self
            .projects
            .read()
            .await
            .get(&session.uid)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_tasks(&self, session: &Session) -> StoreResult<Vec<Task>> {
        self.check_read("tasks")?;
        Ok(self
            .tasks
            .read()
            .await
            .get(&session.uid)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_project(
        &self,
        session: &Session,
        name: &str,
        description: &str,
    ) -> StoreResult<()> {
        self.check_write()?;
        let now = now_iso();
        self.projects
            .write()
            .await
            .entry(session.uid.clone())
            .or_default()
            .push(Project {
                id: Uuid::new_v4(),
                name: name.to_string(),
                description: description.to_string(),
                created_at: now.clone(),
                updated_at: now,
            });
        Ok(())
    }

    async fn edit_project(
        &self,
        session: &Session,
        id: ProjectId,
        name: &str,
        description: &str,
    ) -> StoreResult<()> {
        self.check_write()?;
        let mut projects = self.projects.write().await;
        let project = projects
            .get_mut(&session.uid)
            .and_then(|owned| owned.iter_mut().find(|project| project.id == id))
            .ok_or(StoreError::ProjectNotFound(id))?;
        project.name = name.to_string();
        project.description = description.to_string();
        project.updated_at = now_iso();
        Ok(())
    }

    async fn delete_project(&self, session: &Session, id: ProjectId) -> StoreResult<()> {
        self.check_write()?;
        if let Some(owned) = self.projects.write().await.get_mut(&session.uid) {
            owned.retain(|project| project.id != id);
        }
        Ok(())
    }
}
