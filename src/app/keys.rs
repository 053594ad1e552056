use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, InputMode, Message};

impl App {
    /// Translates a raw key into a message for the current input mode.
    pub fn message_for_key(&self, key: KeyEvent) -> Option<Message> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Message::Quit);
        }

        match self.mode {
            InputMode::Browse => browse_message(key),
            InputMode::Create(_) | InputMode::Edit(_) => form_message(key),
        }
    }
}

fn browse_message(key: KeyEvent) -> Option<Message> {
    if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return None;
    }

    let message = match key.code {
        KeyCode::Char('q') => Message::Quit,
        KeyCode::Up | KeyCode::Char('k') => Message::CursorUp,
        KeyCode::Down | KeyCode::Char('j') => Message::CursorDown,
        KeyCode::Enter | KeyCode::Char(' ') => Message::ToggleExpand,
        KeyCode::Char('a') => Message::ToggleAddPanel,
        KeyCode::Char('e') => Message::BeginEdit,
        KeyCode::Char('d') | KeyCode::Delete => Message::DeleteSelected,
        KeyCode::Char('r') => Message::Reload,
        KeyCode::Char('L') => Message::ToggleSession,
        KeyCode::Char('t') => Message::CycleTheme,
        _ => return None,
    };
    Some(message)
}

fn form_message(key: KeyEvent) -> Option<Message> {
    let message = match key.code {
        KeyCode::Esc => Message::CancelForm,
        KeyCode::Enter => Message::SubmitForm,
        KeyCode::Tab | KeyCode::BackTab => Message::NextField,
        KeyCode::Backspace => Message::Backspace,
        KeyCode::Char(ch) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            Message::InputChar(ch)
        }
        _ => return None,
    };
    Some(message)
}
