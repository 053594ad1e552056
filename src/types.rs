use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ProjectId = Uuid;
pub type TaskId = Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A work item owned by the same user as the projects it is listed under.
///
/// `project` carries the *name* of the project, not its id, so a task follows
/// whichever project currently has that exact name.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub project: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: String,
}

impl Task {
    pub fn belongs_to(&self, project: &Project) -> bool {
        self.project == project.name
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub struct Session {
    pub uid: String,
    pub email: Option<String>,
}

impl Session {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn display_name(&self) -> &str {
        self.email.as_deref().unwrap_or(self.uid.as_str())
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(name: &str) -> Project {
        Project {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            created_at: now_iso(),
            updated_at: now_iso(),
        }
    }

    fn task(project: &str) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "write docs".to_string(),
            description: String::new(),
            project: project.to_string(),
            completed: false,
            created_at: now_iso(),
        }
    }

    #[test]
    fn test_task_join_is_exact_name_match() {
        let alpha = project("Alpha");
        assert!(task("Alpha").belongs_to(&alpha));
        assert!(!task("alpha").belongs_to(&alpha));
        assert!(!task("Alpha ").belongs_to(&alpha));
        assert!(!task("").belongs_to(&alpha));
    }

    #[test]
    fn test_session_display_name_prefers_email() {
        let session = Session::new("u-1");
        assert_eq!(session.display_name(), "u-1");
        let session = session.with_email("ada@example.com");
        assert_eq!(session.display_name(), "ada@example.com");
    }

    #[test]
    fn test_task_deserializes_without_optional_fields() {
        let raw = r#"{
            "id": "6f1c1d8e-2b9e-4d7e-9a55-3a1f0c5e8b11",
            "title": "ship it",
            "project": "Alpha",
            "created_at": "2026-01-01T00:00:00.000Z"
        }"#;
        let parsed: Task = serde_json::from_str(raw).expect("task should parse");
        assert_eq!(parsed.project, "Alpha");
        assert!(!parsed.completed);
        assert!(parsed.description.is_empty());
    }
}
