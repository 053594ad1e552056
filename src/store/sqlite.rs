use std::{fs, path::Path, str::FromStr};

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    Row,
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
};
use tracing::debug;
use uuid::Uuid;

use super::{DataAccess, StoreError, StoreResult};
use crate::types::{Project, ProjectId, Session, Task, now_iso};

const MIGRATIONS: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS projects (
        id TEXT PRIMARY KEY,
        owner TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
     )",
    "CREATE INDEX IF NOT EXISTS idx_projects_owner ON projects(owner, created_at)",
    "CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY,
        owner TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        project TEXT NOT NULL DEFAULT '',
        completed INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
     )",
    "CREATE INDEX IF NOT EXISTS idx_tasks_owner ON tasks(owner, created_at)",
];

/// SQLite-backed store. Every row carries the owning user's uid.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!(
                    "failed to create parent directories for {}",
                    path_ref.display()
                )
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path_ref)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open sqlite db at {}", path_ref.display()))?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// A private database that lives as long as this store.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .context("invalid in-memory sqlite url")?;
        // One pinned connection: every new connection would get a fresh empty db.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("failed to open in-memory sqlite db")?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<()> {
        for statement in MIGRATIONS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("failed to run sqlite migration")?;
        }
        Ok(())
    }

    pub async fn get_project(&self, session: &Session, id: ProjectId) -> StoreResult<Project> {
        let row = sqlx::query(
            "SELECT id, name, description, created_at, updated_at
             FROM projects WHERE id = ?1 AND owner = ?2",
        )
        .bind(id.to_string())
        .bind(&session.uid)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => map_project_row(&row),
            None => Err(StoreError::ProjectNotFound(id)),
        }
    }

    /// Tasks are owned by another part of the product; this exists to seed them.
    pub async fn add_task(
        &self,
        session: &Session,
        title: &str,
        description: &str,
        project: &str,
    ) -> StoreResult<Task> {
        let task = Task {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: description.to_string(),
            project: project.to_string(),
            completed: false,
            created_at: now_iso(),
        };

        sqlx::query(
            "INSERT INTO tasks (id, owner, title, description, project, completed, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(task.id.to_string())
        .bind(&session.uid)
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.project)
        .bind(task.completed)
        .bind(&task.created_at)
        .execute(&self.pool)
        .await?;

        Ok(task)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl DataAccess for SqliteStore {
    async fn list_projects(&self, session: &Session) -> StoreResult<Vec<Project>> {
        let rows = sqlx::query(
            "SELECT id, name, description, created_at, updated_at
             FROM projects WHERE owner = ?1 ORDER BY created_at ASC, rowid ASC",
        )
        .bind(&session.uid)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| StoreError::fetch("projects", err))?;

        rows.iter().map(map_project_row).collect()
    }

    async fn list_tasks(&self, session: &Session) -> StoreResult<Vec<Task>> {
        let rows = sqlx::query(
            "SELECT id, title, description, project, completed, created_at
             FROM tasks WHERE owner = ?1 ORDER BY created_at ASC, rowid ASC",
        )
        .bind(&session.uid)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| StoreError::fetch("tasks", err))?;

        rows.iter().map(map_task_row).collect()
    }

    async fn create_project(
        &self,
        session: &Session,
        name: &str,
        description: &str,
    ) -> StoreResult<()> {
        let id = Uuid::new_v4();
        let now = now_iso();
        sqlx::query(
            "INSERT INTO projects (id, owner, name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(id.to_string())
        .bind(&session.uid)
        .bind(name)
        .bind(description)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!(%id, owner = %session.uid, "project inserted");
        Ok(())
    }

    async fn edit_project(
        &self,
        session: &Session,
        id: ProjectId,
        name: &str,
        description: &str,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE projects SET name = ?1, description = ?2, updated_at = ?3
             WHERE id = ?4 AND owner = ?5",
        )
        .bind(name)
        .bind(description)
        .bind(now_iso())
        .bind(id.to_string())
        .bind(&session.uid)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ProjectNotFound(id));
        }
        Ok(())
    }

    async fn delete_project(&self, session: &Session, id: ProjectId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?1 AND owner = ?2")
            .bind(id.to_string())
            .bind(&session.uid)
            .execute(&self.pool)
            .await?;

        debug!(%id, removed = result.rows_affected(), "project delete");
        Ok(())
    }
}

fn map_project_row(row: &SqliteRow) -> StoreResult<Project> {
    Ok(Project {
        id: parse_uuid_column(row, "projects")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_task_row(row: &SqliteRow) -> StoreResult<Task> {
    Ok(Task {
        id: parse_uuid_column(row, "tasks")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        project: row.try_get("project")?,
        completed: row.try_get("completed")?,
        created_at: row.try_get("created_at")?,
    })
}

fn parse_uuid_column(row: &SqliteRow, table: &'static str) -> StoreResult<Uuid> {
    let raw: String = row.try_get("id")?;
    Uuid::parse_str(&raw).map_err(|err| StoreError::Corrupt {
        table,
        detail: format!("invalid id `{raw}`: {err}"),
    })
}
