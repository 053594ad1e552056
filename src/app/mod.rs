pub mod keys;
pub mod messages;
pub mod update;

use std::sync::Arc;

use tracing::{error, info};

pub use self::messages::Message;

use crate::auth::{AuthProvider, AuthSubscription, LocalAuth};
use crate::page::{DraftField, ProjectsPage};
use crate::settings::Settings;
use crate::store::StoreResult;
use crate::theme::Theme;
use crate::types::{Project, ProjectId, Session};

/// Which part of the page receives typed keys.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum InputMode {
    #[default]
    Browse,
    Create(DraftField),
    Edit(DraftField),
}

impl InputMode {
    pub fn field(self) -> Option<DraftField> {
        match self {
            InputMode::Browse => None,
            InputMode::Create(field) | InputMode::Edit(field) => Some(field),
        }
    }
}

pub struct App {
    pub page: ProjectsPage,
    pub theme: Theme,
    pub mode: InputMode,
    pub cursor: usize,
    pub footer_notice: Option<String>,
    pub notice_is_error: bool,
    settings: Settings,
    persist_settings: bool,
    auth: Arc<LocalAuth>,
    subscription: AuthSubscription,
    pending_load: bool,
    sign_in_as: Option<Session>,
    should_quit: bool,
}

impl App {
    pub fn new(
        page: ProjectsPage,
        auth: Arc<LocalAuth>,
        settings: Settings,
        sign_in_as: Option<Session>,
    ) -> Self {
        let subscription = auth.subscribe();
        Self {
            page,
            theme: Theme::from_preset(settings.theme_preset()),
            mode: InputMode::Browse,
            cursor: 0,
            footer_notice: None,
            notice_is_error: false,
            settings,
            persist_settings: false,
            auth,
            subscription,
            pending_load: false,
            sign_in_as,
            should_quit: false,
        }
    }

    /// Write theme changes back to the settings file.
    pub fn with_settings_persistence(mut self, enabled: bool) -> Self {
        self.persist_settings = enabled;
        self
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn signed_in(&self) -> bool {
        self.page.session().is_some()
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.page.projects().get(self.cursor)
    }

    fn selected_project_id(&self) -> Option<ProjectId> {
        self.selected_project().map(|project| project.id)
    }

    /// Applies pending auth changes to the page and runs any fetch they start.
    pub async fn sync_auth(&mut self) -> bool {
        let changed = self.poll_auth();
        self.finish_pending_load().await;
        changed
    }

    /// Applies pending auth changes without fetching. A sign-in leaves the
    /// page Loading with a pending load for [`App::finish_pending_load`].
    pub fn poll_auth(&mut self) -> bool {
        let mut changed = false;
        while let Some(session) = self.subscription.try_next() {
            changed = true;
            self.pending_load = self.page.apply_auth_change(session);
        }
        if changed {
            self.settle();
        }
        changed
    }

    /// True while the page shows Loading and the fetch has not run yet.
    pub fn has_pending_load(&self) -> bool {
        self.pending_load
    }

    pub async fn finish_pending_load(&mut self) {
        if !std::mem::take(&mut self.pending_load) {
            return;
        }
        self.page.finish_load().await;
        self.settle();
    }

    fn begin_reload(&mut self) {
        if self.page.begin_load() {
            self.pending_load = true;
        }
    }

    /// Brings cursor and mode back in line with the page after a reload.
    fn settle(&mut self) {
        let count = self.page.projects().len();
        self.cursor = self.cursor.min(count.saturating_sub(1));

        if !self.signed_in() {
            self.close_forms();
            return;
        }

        match self.mode {
            InputMode::Create(_) if !self.page.is_add_panel_open() => {
                self.mode = InputMode::Browse;
            }
            InputMode::Edit(_) if self.page.editing().is_none() => {
                self.mode = InputMode::Browse;
            }
            _ => {}
        }
    }

    /// Hides the create form and drops any draft. Used when the session ends.
    fn close_forms(&mut self) {
        if self.page.is_add_panel_open() {
            self.page.toggle_add_panel();
        }
        if self.page.editing().is_some() {
            self.page.cancel_edit();
        }
        if self.mode != InputMode::Browse {
            self.page.draft_mut().clear();
            self.mode = InputMode::Browse;
        }
    }

    fn notify(&mut self, text: impl Into<String>) {
        self.footer_notice = Some(text.into());
        self.notice_is_error = false;
    }

    fn notify_error(&mut self, text: impl Into<String>) {
        self.footer_notice = Some(text.into());
        self.notice_is_error = true;
    }

    fn toggle_session(&mut self) {
        if self.auth.current().is_some() {
            self.auth.sign_out();
            self.notify("signed out");
            return;
        }

        match self.sign_in_as.clone() {
            Some(session) => {
                self.notify(format!("signed in as {}", session.display_name()));
                self.auth.sign_in(session);
            }
            None => {
                self.notify_error("no user configured; pass --user or set `user` in settings");
            }
        }
    }

    fn cycle_theme(&mut self) {
        let preset = self.theme.preset.next();
        self.theme = Theme::from_preset(preset);
        self.settings.theme = preset.as_str().to_string();
        self.notify(format!("theme: {}", preset.as_str()));

        if self.persist_settings
            && let Err(err) = self.settings.save()
        {
            error!("failed to save settings: {err:#}");
            self.notify_error(format!("theme not saved: {err}"));
        }
    }

    fn report(&mut self, done: &str, failed: &str, result: StoreResult<()>) {
        match result {
            Ok(()) => {
                info!("{done}");
                self.notify(done);
            }
            Err(err) => {
                error!("{failed}: {err}");
                self.notify_error(format!("{failed}: {err}"));
            }
        }
    }
}
