use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{
    KeyCode as CrosstermKeyCode, KeyEvent as CrosstermKeyEvent,
    KeyModifiers as CrosstermKeyModifiers,
};
use tuirealm::{
    Application, AttrValue, Attribute, Component, Event, EventListenerCfg, Frame, MockComponent,
    NoUserEvent, Props, State,
    command::{Cmd, CmdResult},
    event::{Key as RealmKey, KeyEvent as RealmKeyEvent, KeyModifiers as RealmKeyModifiers},
    ratatui::layout::Rect,
};

use crate::app::Message;

pub type BoardApplication = Application<RootId, Message, NoUserEvent>;

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum RootId {
    Root,
}

/// Builds the event loop. Drawing happens outside the realm, so the mounted
/// component only turns terminal events into [`Message`]s.
pub fn init_application(tick_interval: Duration) -> Result<BoardApplication> {
    let mut application: BoardApplication = Application::init(
        EventListenerCfg::default()
            .crossterm_input_listener(Duration::from_millis(20), 3)
            .poll_timeout(Duration::from_millis(10))
            .tick_interval(tick_interval),
    );

    application
        .mount(RootId::Root, Box::new(InputComponent::default()), Vec::new())
        .context("failed to mount tui-realm input component")?;

    application
        .active(&RootId::Root)
        .context("failed to activate tui-realm input component")?;

    Ok(application)
}

#[derive(Default)]
struct InputComponent {
    props: Props,
}

impl MockComponent for InputComponent {
    fn view(&mut self, _frame: &mut Frame, _area: Rect) {}

    fn query(&self, attr: Attribute) -> Option<AttrValue> {
        self.props.get(attr)
    }

    fn attr(&mut self, attr: Attribute, value: AttrValue) {
        self.props.set(attr, value);
    }

    fn state(&self) -> State {
        State::None
    }

    fn perform(&mut self, _cmd: Cmd) -> CmdResult {
        CmdResult::None
    }
}

impl Component<Message, NoUserEvent> for InputComponent {
    fn on(&mut self, ev: Event<NoUserEvent>) -> Option<Message> {
        match ev {
            Event::Keyboard(key) => Some(Message::Key(convert_key_event(key))),
            Event::WindowResize(width, height) => Some(Message::Resize(width, height)),
            Event::Tick => Some(Message::Tick),
            _ => None,
        }
    }
}

fn convert_key_event(key: RealmKeyEvent) -> CrosstermKeyEvent {
    CrosstermKeyEvent::new(
        convert_key_code(key.code),
        convert_key_modifiers(key.modifiers),
    )
}

fn convert_key_code(key: RealmKey) -> CrosstermKeyCode {
    match key {
        RealmKey::Backspace => CrosstermKeyCode::Backspace,
        RealmKey::Enter => CrosstermKeyCode::Enter,
        RealmKey::Up => CrosstermKeyCode::Up,
        RealmKey::Down => CrosstermKeyCode::Down,
        RealmKey::Tab => CrosstermKeyCode::Tab,
        RealmKey::BackTab => CrosstermKeyCode::BackTab,
        RealmKey::Delete => CrosstermKeyCode::Delete,
        RealmKey::Char(ch) => CrosstermKeyCode::Char(ch),
        RealmKey::Esc => CrosstermKeyCode::Esc,
        _ => CrosstermKeyCode::Null,
    }
}

fn convert_key_modifiers(modifiers: RealmKeyModifiers) -> CrosstermKeyModifiers {
    [
        (RealmKeyModifiers::SHIFT, CrosstermKeyModifiers::SHIFT),
        (RealmKeyModifiers::CONTROL, CrosstermKeyModifiers::CONTROL),
        (RealmKeyModifiers::ALT, CrosstermKeyModifiers::ALT),
    ]
    .into_iter()
    .filter(|(realm, _)| modifiers.contains(*realm))
    .fold(CrosstermKeyModifiers::empty(), |acc, (_, crossterm)| {
        acc | crossterm
    })
}
