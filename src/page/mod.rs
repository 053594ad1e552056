//! Headless model of the projects page.
//!
//! [`ProjectsPage`] owns the view state and talks to a [`DataAccess`]
//! implementation. Every mutation is followed by a full reload; nothing is
//! patched locally. Fetch failures are logged and shown as an empty page,
//! mutation failures are handed back to the caller after the reload.

pub mod state;

use std::sync::Arc;

use tracing::{debug, info, warn};

pub use self::state::{DraftField, PagePhase, PanelView, ProjectDraft};

use crate::store::{DataAccess, StoreError, StoreResult};
use crate::types::{Project, ProjectId, Session, Task};

pub struct ProjectsPage {
    store: Arc<dyn DataAccess>,
    session: Option<Session>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
    phase: PagePhase,
    add_panel_open: bool,
    draft: ProjectDraft,
    expanded: Option<ProjectId>,
    editing: Option<ProjectId>,
}

impl ProjectsPage {
    pub fn new(store: Arc<dyn DataAccess>) -> Self {
        Self {
            store,
            session: None,
            projects: Vec::new(),
            tasks: Vec::new(),
            phase: PagePhase::Idle,
            add_panel_open: false,
            draft: ProjectDraft::default(),
            expanded: None,
            editing: None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn phase(&self) -> PagePhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == PagePhase::Loading
    }

    pub fn is_add_panel_open(&self) -> bool {
        self.add_panel_open
    }

    pub fn draft(&self) -> &ProjectDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ProjectDraft {
        &mut self.draft
    }

    pub fn expanded(&self) -> Option<ProjectId> {
        self.expanded
    }

    pub fn editing(&self) -> Option<ProjectId> {
        self.editing
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == id)
    }

    pub fn tasks_for<'a>(&'a self, project: &Project) -> Vec<&'a Task> {
        self.tasks
            .iter()
            .filter(|task| task.belongs_to(project))
            .collect()
    }

    pub fn panels(&self) -> Vec<PanelView<'_>> {
        self.projects
            .iter()
            .map(|project| PanelView {
                project,
                tasks: self.tasks_for(project),
                expanded: self.expanded == Some(project.id),
                editing: self.editing == Some(project.id),
            })
            .collect()
    }

    /// Applies an auth-state change: load for a session, clear on sign-out.
    pub async fn handle_auth_change(&mut self, session: Option<Session>) {
        if self.apply_auth_change(session) {
            self.finish_load().await;
        }
    }

    /// Records an auth-state change without fetching.
    ///
    /// Returns `true` when a session arrived and the page is now `Loading`;
    /// the caller completes the fetch with [`Self::finish_load`].
    pub fn apply_auth_change(&mut self, session: Option<Session>) -> bool {
        match session {
            Some(session) => {
                info!(uid = %session.uid, "loading projects for session");
                self.session = Some(session);
                self.begin_load()
            }
            None => {
                if let Some(previous) = self.session.take() {
                    info!(uid = %previous.uid, "session ended; clearing projects");
                }
                self.projects.clear();
                self.tasks.clear();
                self.expanded = None;
                self.editing = None;
                self.phase = PagePhase::Idle;
                false
            }
        }
    }

    /// Re-fetches projects and tasks for the current session.
    ///
    /// Without a session this does nothing.
    pub async fn reload(&mut self) {
        if self.begin_load() {
            self.finish_load().await;
        }
    }

    /// Enters `Loading` if there is a session to load for.
    pub fn begin_load(&mut self) -> bool {
        if self.session.is_none() {
            debug!("load skipped: no session");
            return false;
        }
        self.phase = PagePhase::Loading;
        true
    }

    /// Fetches both collections and leaves the page `Loaded`.
    ///
    /// A sign-out that landed after [`Self::begin_load`] wins: nothing is fetched.
    pub async fn finish_load(&mut self) {
        let Some(session) = self.session.clone() else {
            return;
        };

        let fetched = tokio::try_join!(
            self.store.list_projects(&session),
            self.store.list_tasks(&session)
        );

        match fetched {
            Ok((projects, tasks)) => {
                debug!(
                    projects = projects.len(),
                    tasks = tasks.len(),
                    "projects page loaded"
                );
                self.projects = projects;
                self.tasks = tasks;
            }
            Err(err) => {
                warn!(uid = %session.uid, "failed to load projects: {err}");
                self.projects.clear();
                self.tasks.clear();
            }
        }

        self.phase = PagePhase::Loaded;
        self.forget_missing_projects();
    }

    pub fn toggle_add_panel(&mut self) {
        self.add_panel_open = !self.add_panel_open;
    }

    pub async fn create_project(&mut self) -> StoreResult<()> {
        let result = match self.session.as_ref() {
            Some(session) => {
                self.store
                    .create_project(session, &self.draft.name, &self.draft.description)
                    .await
            }
            None => Ok(()),
        };

        self.add_panel_open = false;
        self.draft.clear();
        self.reload().await;
        result
    }

    /// Expands `id`, or collapses it if it is already the expanded panel.
    pub fn toggle_expanded(&mut self, id: ProjectId) {
        self.expanded = if self.expanded == Some(id) {
            None
        } else {
            Some(id)
        };
    }

    /// Puts one project into edit mode. Returns `false` for an unknown id.
    pub fn begin_edit(&mut self, id: ProjectId) -> bool {
        if self.project(id).is_none() {
            return false;
        }
        self.editing = Some(id);
        self.draft.clear();
        true
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.draft.clear();
    }

    /// Saves the project in edit mode. Empty draft fields keep the stored value.
    pub async fn save_edit(&mut self) -> StoreResult<()> {
        let Some(id) = self.editing.take() else {
            return Ok(());
        };

        let result = match (self.session.as_ref(), self.project(id)) {
            (Some(session), Some(project)) => {
                let (name, description) = self.draft.resolve_against(project);
                self.store
                    .edit_project(session, id, name, description)
                    .await
            }
            (None, _) => Ok(()),
            (Some(_), None) => Err(StoreError::ProjectNotFound(id)),
        };

        self.draft.clear();
        self.reload().await;
        result
    }

    pub async fn delete_project(&mut self, id: ProjectId) -> StoreResult<()> {
        let result = match self.session.as_ref() {
            Some(session) => self.store.delete_project(session, id).await,
            None => Ok(()),
        };

        self.reload().await;
        result
    }

    fn forget_missing_projects(&mut self) {
        if let Some(id) = self.expanded
            && self.project(id).is_none()
        {
            self.expanded = None;
        }
        if let Some(id) = self.editing
            && self.project(id).is_none()
        {
            self.editing = None;
            self.draft.clear();
        }
    }
}
