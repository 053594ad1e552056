use anyhow::Result;
use tracing::debug;

use crate::app::{App, InputMode, Message};
use crate::page::DraftField;

impl App {
    pub async fn update(&mut self, message: Message) -> Result<()> {
        let message = match message {
            Message::Key(key) => match self.message_for_key(key) {
                Some(message) => message,
                None => return Ok(()),
            },
            other => other,
        };

        match message {
            Message::Key(_) => {}
            Message::Tick => {
                self.poll_auth();
            }
            Message::Resize(..) => {}
            Message::CursorUp => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            Message::CursorDown => {
                let max_index = self.page.projects().len().saturating_sub(1);
                self.cursor = (self.cursor + 1).min(max_index);
            }
            Message::ToggleExpand => {
                if let Some(id) = self.selected_project_id() {
                    self.page.toggle_expanded(id);
                }
            }
            Message::ToggleAddPanel => {
                if !self.require_session() {
                    return Ok(());
                }
                self.page.toggle_add_panel();
                self.mode = if self.page.is_add_panel_open() {
                    InputMode::Create(DraftField::Name)
                } else {
                    InputMode::Browse
                };
            }
            Message::BeginEdit => {
                if !self.require_session() {
                    return Ok(());
                }
                if let Some(id) = self.selected_project_id()
                    && self.page.begin_edit(id)
                {
                    self.mode = InputMode::Edit(DraftField::Name);
                }
            }
            Message::NextField => {
                self.mode = match self.mode {
                    InputMode::Browse => InputMode::Browse,
                    InputMode::Create(field) => InputMode::Create(field.toggle()),
                    InputMode::Edit(field) => InputMode::Edit(field.toggle()),
                };
            }
            Message::InputChar(ch) => {
                if let Some(field) = self.mode.field() {
                    self.page.draft_mut().field_mut(field).push(ch);
                }
            }
            Message::Backspace => {
                if let Some(field) = self.mode.field() {
                    self.page.draft_mut().field_mut(field).pop();
                }
            }
            Message::SubmitForm if self.mode != InputMode::Browse && !self.require_session() => {
                self.close_forms();
            }
            Message::SubmitForm => match self.mode {
                InputMode::Browse => {}
                InputMode::Create(_) => {
                    self.mode = InputMode::Browse;
                    let result = self.page.create_project().await;
                    self.report("project created", "failed to create project", result);
                    self.settle();
                }
                InputMode::Edit(_) => {
                    self.mode = InputMode::Browse;
                    let result = self.page.save_edit().await;
                    self.report("project saved", "failed to save project", result);
                    self.settle();
                }
            },
            Message::CancelForm => {
                match self.mode {
                    InputMode::Browse => {}
                    InputMode::Create(_) => {
                        if self.page.is_add_panel_open() {
                            self.page.toggle_add_panel();
                        }
                        self.page.draft_mut().clear();
                    }
                    InputMode::Edit(_) => self.page.cancel_edit(),
                }
                self.mode = InputMode::Browse;
            }
            Message::DeleteSelected => {
                if !self.require_session() {
                    return Ok(());
                }
                if let Some(id) = self.selected_project_id() {
                    let result = self.page.delete_project(id).await;
                    self.report("project deleted", "failed to delete project", result);
                    self.settle();
                }
            }
            Message::Reload => {
                debug!("manual reload requested");
                self.begin_reload();
            }
            Message::ToggleSession => {
                self.toggle_session();
                self.poll_auth();
            }
            Message::CycleTheme => self.cycle_theme(),
            Message::Quit => self.should_quit = true,
        }

        Ok(())
    }

    fn require_session(&mut self) -> bool {
        if self.signed_in() {
            return true;
        }
        self.notify_error("sign in first (press L)");
        false
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use super::*;
    use crate::auth::LocalAuth;
    use crate::page::ProjectsPage;
    use crate::settings::Settings;
    use crate::store::{DataAccess, MemoryStore};
    use crate::types::Session;

    fn ada() -> Session {
        Session::new("ada")
    }

    async fn app_with(initial: Option<Session>) -> (App, Arc<MemoryStore>, Arc<LocalAuth>) {
        let store = Arc::new(MemoryStore::new());
        let auth = Arc::new(LocalAuth::new(initial));
        let page = ProjectsPage::new(store.clone());
        let mut app = App::new(page, auth.clone(), Settings::default(), Some(ada()));
        app.sync_auth().await;
        (app, store, auth)
    }

    fn key(code: KeyCode) -> Message {
        Message::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    /// Runs one message plus any fetch it started, like one pass of the main loop.
    async fn step(app: &mut App, message: Message) {
        app.update(message).await.expect("update");
        app.finish_pending_load().await;
    }

    async fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.update(key(KeyCode::Char(ch))).await.expect("type");
        }
    }

    #[tokio::test]
    async fn test_create_project_through_keys() {
        let (mut app, store, _auth) = app_with(Some(ada())).await;

        app.update(key(KeyCode::Char('a'))).await.expect("open");
        assert_eq!(app.mode, InputMode::Create(DraftField::Name));
        type_text(&mut app, "Garden").await;
        app.update(key(KeyCode::Tab)).await.expect("tab");
        type_text(&mut app, "veg beds").await;
        app.update(key(KeyCode::Enter)).await.expect("submit");

        assert_eq!(app.mode, InputMode::Browse);
        assert!(!app.page.is_add_panel_open());
        assert_eq!(app.page.projects().len(), 1);
        assert_eq!(app.page.projects()[0].name, "Garden");
        assert_eq!(app.page.projects()[0].description, "veg beds");
        assert_eq!(app.footer_notice.as_deref(), Some("project created"));
        assert!(!app.notice_is_error);
        assert_eq!(store.mutation_calls(), 1);
    }

    #[tokio::test]
    async fn test_escape_discards_create_draft() {
        let (mut app, store, _auth) = app_with(Some(ada())).await;

        app.update(key(KeyCode::Char('a'))).await.expect("open");
        type_text(&mut app, "half").await;
        app.update(key(KeyCode::Esc)).await.expect("cancel");

        assert_eq!(app.mode, InputMode::Browse);
        assert!(!app.page.is_add_panel_open());
        assert!(app.page.draft().name.is_empty());
        assert_eq!(store.mutation_calls(), 0);
    }

    #[tokio::test]
    async fn test_edit_keeps_blank_fields() {
        let (mut app, store, _auth) = app_with(Some(ada())).await;
        store
            .create_project(&ada(), "Alpha", "first")
            .await
            .expect("seed");
        step(&mut app, Message::Reload).await;

        app.update(key(KeyCode::Char('e'))).await.expect("edit");
        assert_eq!(app.mode, InputMode::Edit(DraftField::Name));
        type_text(&mut app, "Beta").await;
        app.update(key(KeyCode::Enter)).await.expect("save");

        let project = &app.page.projects()[0];
        assert_eq!(project.name, "Beta");
        assert_eq!(project.description, "first");
        assert_eq!(app.page.editing(), None);
        assert_eq!(app.mode, InputMode::Browse);
    }

    #[tokio::test]
    async fn test_delete_moves_cursor_back_in_range() {
        let (mut app, store, _auth) = app_with(Some(ada())).await;
        for name in ["One", "Two"] {
            store.create_project(&ada(), name, "").await.expect("seed");
        }
        step(&mut app, Message::Reload).await;

        app.update(key(KeyCode::Char('j'))).await.expect("down");
        assert_eq!(app.selected_project().map(|p| p.name.as_str()), Some("Two"));
        app.update(key(KeyCode::Char('d'))).await.expect("delete");

        assert_eq!(app.page.projects().len(), 1);
        assert_eq!(app.cursor, 0);
        assert_eq!(app.selected_project().map(|p| p.name.as_str()), Some("One"));
    }

    #[tokio::test]
    async fn test_failed_write_is_reported_in_footer() {
        let (mut app, store, _auth) = app_with(Some(ada())).await;
        store.set_fail_writes(true);

        app.update(Message::ToggleAddPanel).await.expect("open");
        type_text(&mut app, "Nope").await;
        app.update(Message::SubmitForm).await.expect("submit");

        let notice = app.footer_notice.clone().unwrap_or_default();
        assert!(notice.starts_with("failed to create project"), "{notice}");
        assert!(app.notice_is_error);
        assert!(app.page.projects().is_empty());
        assert!(!app.page.is_add_panel_open());
    }

    #[tokio::test]
    async fn test_enter_toggles_expansion_of_selected_project() {
        let (mut app, store, _auth) = app_with(Some(ada())).await;
        store.create_project(&ada(), "Alpha", "").await.expect("seed");
        step(&mut app, Message::Reload).await;
        let id = app.page.projects()[0].id;

        app.update(key(KeyCode::Enter)).await.expect("expand");
        assert_eq!(app.page.expanded(), Some(id));
        app.update(key(KeyCode::Char(' '))).await.expect("collapse");
        assert_eq!(app.page.expanded(), None);
    }

    #[tokio::test]
    async fn test_sign_out_and_back_in() {
        let (mut app, store, auth) = app_with(Some(ada())).await;
        store.create_project(&ada(), "Alpha", "").await.expect("seed");
        step(&mut app, Message::Reload).await;

        app.update(key(KeyCode::Char('L'))).await.expect("sign out");
        assert!(!app.signed_in());
        assert!(auth.current().is_none());
        assert!(app.page.projects().is_empty());

        step(&mut app, key(KeyCode::Char('L'))).await;
        assert!(app.signed_in());
        assert_eq!(app.page.projects().len(), 1);
    }

    #[tokio::test]
    async fn test_mutations_need_a_session() {
        let (mut app, store, _auth) = app_with(None).await;

        app.update(key(KeyCode::Char('a'))).await.expect("add");
        assert_eq!(app.mode, InputMode::Browse);
        assert!(!app.page.is_add_panel_open());
        assert_eq!(app.footer_notice.as_deref(), Some("sign in first (press L)"));
        assert_eq!(store.mutation_calls(), 0);
    }

    #[tokio::test]
    async fn test_tick_applies_external_auth_change() {
        let (mut app, _store, auth) = app_with(None).await;
        assert!(!app.signed_in());

        auth.sign_in(Session::new("grace"));
        app.update(Message::Tick).await.expect("tick");

        assert_eq!(app.page.session().map(|s| s.uid.as_str()), Some("grace"));
        assert!(app.page.is_loading());
        assert!(app.has_pending_load());

        app.finish_pending_load().await;
        assert!(!app.page.is_loading());
        assert!(!app.has_pending_load());
    }

    #[tokio::test]
    async fn test_reload_stays_loading_until_fetch_runs() {
        let (mut app, store, _auth) = app_with(Some(ada())).await;
        store.create_project(&ada(), "Alpha", "").await.expect("seed");

        app.update(Message::Reload).await.expect("reload");
        assert!(app.page.is_loading());
        assert!(app.page.projects().is_empty());

        app.finish_pending_load().await;
        assert!(!app.page.is_loading());
        assert_eq!(app.page.projects().len(), 1);
    }

    #[tokio::test]
    async fn test_reload_while_signed_out_does_nothing() {
        let (mut app, _store, _auth) = app_with(None).await;

        app.update(Message::Reload).await.expect("reload");

        assert!(!app.page.is_loading());
        assert!(!app.has_pending_load());
    }

    #[tokio::test]
    async fn test_sign_out_elsewhere_closes_open_create_form() {
        let (mut app, store, auth) = app_with(Some(ada())).await;

        app.update(key(KeyCode::Char('a'))).await.expect("open");
        type_text(&mut app, "X").await;
        auth.sign_out();
        app.update(Message::Tick).await.expect("tick");

        assert_eq!(app.mode, InputMode::Browse);
        assert!(!app.page.is_add_panel_open());
        assert!(app.page.draft().name.is_empty());

        app.update(Message::SubmitForm).await.expect("submit");
        assert_eq!(store.mutation_calls(), 0);
        assert_ne!(app.footer_notice.as_deref(), Some("project created"));
        assert!(app.page.projects().is_empty());
    }

    #[tokio::test]
    async fn test_submit_without_session_is_refused() {
        let (mut app, store, auth) = app_with(Some(ada())).await;

        app.update(key(KeyCode::Char('a'))).await.expect("open");
        type_text(&mut app, "X").await;
        // The page drops its session before any settle pass runs.
        auth.sign_out();
        app.page.apply_auth_change(None);
        app.update(Message::SubmitForm).await.expect("submit");

        assert_eq!(store.mutation_calls(), 0);
        assert_eq!(app.footer_notice.as_deref(), Some("sign in first (press L)"));
        assert!(app.notice_is_error);
        assert_eq!(app.mode, InputMode::Browse);
        assert!(!app.page.is_add_panel_open());
    }

    #[tokio::test]
    async fn test_sign_out_elsewhere_ends_an_edit() {
        let (mut app, store, auth) = app_with(Some(ada())).await;
        store.create_project(&ada(), "Alpha", "").await.expect("seed");
        step(&mut app, Message::Reload).await;

        app.update(key(KeyCode::Char('e'))).await.expect("edit");
        type_text(&mut app, "Beta").await;
        auth.sign_out();
        app.update(Message::Tick).await.expect("tick");

        assert_eq!(app.mode, InputMode::Browse);
        assert_eq!(app.page.editing(), None);
        assert!(app.page.draft().name.is_empty());
        assert_eq!(store.mutation_calls(), 1);
    }

    #[tokio::test]
    async fn test_form_keys_do_not_trigger_browse_actions() {
        let (mut app, _store, _auth) = app_with(Some(ada())).await;

        app.update(key(KeyCode::Char('a'))).await.expect("open");
        app.update(key(KeyCode::Char('q'))).await.expect("type q");

        assert!(!app.should_quit());
        assert_eq!(app.page.draft().name, "q");

        app.update(key(KeyCode::Backspace)).await.expect("erase");
        assert!(app.page.draft().name.is_empty());
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_from_any_mode() {
        let (mut app, _store, _auth) = app_with(Some(ada())).await;
        app.update(key(KeyCode::Char('a'))).await.expect("open");

        app.update(Message::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )))
        .await
        .expect("quit");

        assert!(app.should_quit());
    }

    #[tokio::test]
    async fn test_cycle_theme_without_persistence() {
        let (mut app, _store, _auth) = app_with(None).await;
        let before = app.theme.preset;

        app.update(key(KeyCode::Char('t'))).await.expect("theme");

        assert_eq!(app.theme.preset, before.next());
        assert_eq!(app.settings.theme, before.next().as_str());
    }
}
