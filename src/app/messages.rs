use crossterm::event::KeyEvent;

/// Everything the TUI can ask the application to do.
///
/// Raw keys arrive as [`Message::Key`] and are translated into one of the
/// semantic variants according to the current input mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Key(KeyEvent),
    Tick,
    Resize(u16, u16),
    CursorUp,
    CursorDown,
    ToggleExpand,
    ToggleAddPanel,
    BeginEdit,
    NextField,
    InputChar(char),
    Backspace,
    SubmitForm,
    CancelForm,
    DeleteSelected,
    Reload,
    ToggleSession,
    CycleTheme,
    Quit,
}
