use tuirealm::ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::{App, InputMode};
use crate::page::{DraftField, PagePhase, PanelView, ProjectDraft};
use crate::theme::Theme;

const CREATE_FORM_HEIGHT: u16 = 4;
const BROWSE_HINTS: &str =
    "j/k: move  Enter: expand  a: add  e: edit  d: delete  r: reload  L: sign in/out  t: theme  q: quit";
const FORM_HINTS: &str = "Tab: next field  Enter: save  Esc: cancel";

pub fn render(frame: &mut Frame<'_>, app: &App) {
    let form_height = if app.page.is_add_panel_open() {
        CREATE_FORM_HEIGHT
    } else {
        0
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(form_height),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], app);
    if app.page.is_add_panel_open() {
        render_create_form(frame, chunks[1], app);
    }
    render_projects(frame, chunks[2], app);
    render_footer(frame, chunks[3], app);
}

fn render_header(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let theme = &app.theme;
    let title = Paragraph::new(Line::from(Span::styled(
        " Projects ",
        Style::default()
            .fg(theme.base.header)
            .add_modifier(Modifier::BOLD),
    )));

    let who = match app.page.session() {
        Some(session) => format!(
            " {} - {} projects ",
            session.display_name(),
            app.page.projects().len()
        ),
        None => " signed out ".to_string(),
    };
    let status = Paragraph::new(Line::from(Span::styled(
        who,
        Style::default().fg(theme.base.text_muted),
    )))
    .alignment(Alignment::Right);

    frame.render_widget(title, area);
    frame.render_widget(status, area);
}

fn render_create_form(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let theme = &app.theme;
    let focused = match app.mode {
        InputMode::Create(field) => Some(field),
        _ => None,
    };
    let draft = app.page.draft();

    let lines = vec![
        field_line(theme, DraftField::Name, &draft.name, "project name", focused),
        field_line(
            theme,
            DraftField::Description,
            &draft.description,
            "what is it about?",
            focused,
        ),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.interactive.focus))
        .title(" New project ");
    let form = Paragraph::new(lines)
        .block(block)
        .style(Style::default().bg(theme.panel.input_bg));
    frame.render_widget(form, area);
}

fn render_projects(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let theme = &app.theme;
    let block = Block::default()
        .borders(Borders::LEFT | Borders::RIGHT)
        .border_style(Style::default().fg(theme.interactive.border));

    let (lines, selected_line) = project_lines(app);
    let visible = area.height as usize;
    let offset = selected_line
        .map(|line| line.saturating_sub(visible.saturating_sub(1)))
        .unwrap_or(0);

    // Unwrapped, so one logical line is one row and the offset stays exact.
    let body = Paragraph::new(lines)
        .block(block)
        .scroll((u16::try_from(offset).unwrap_or(u16::MAX), 0));
    frame.render_widget(body, area);
}

/// Builds the body lines and the index of the selected panel's first line.
fn project_lines(app: &App) -> (Vec<Line<'static>>, Option<usize>) {
    let theme = &app.theme;
    let muted = Style::default().fg(theme.base.text_muted);

    if app.page.session().is_none() {
        return (
            vec![Line::from(Span::styled(
                "Sign in to see your projects (press L)",
                muted,
            ))],
            None,
        );
    }

    if app.page.phase() == PagePhase::Loading {
        return (
            vec![Line::from(Span::styled("Loading projects...", muted))],
            None,
        );
    }

    let panels = app.page.panels();
    if panels.is_empty() {
        let lines = if app.page.is_add_panel_open() {
            Vec::new()
        } else {
            vec![Line::from(Span::styled("No projects found", muted))]
        };
        return (lines, None);
    }

    let focused_edit_field = match app.mode {
        InputMode::Edit(field) => Some(field),
        _ => None,
    };

    let mut lines = Vec::new();
    let mut selected_line = None;
    for (index, panel) in panels.iter().enumerate() {
        let selected = index == app.cursor;
        if selected {
            selected_line = Some(lines.len());
        }
        push_panel(
            &mut lines,
            theme,
            panel,
            selected,
            focused_edit_field,
            app.page.draft(),
        );
    }

    (lines, selected_line)
}

fn push_panel(
    lines: &mut Vec<Line<'static>>,
    theme: &Theme,
    panel: &PanelView<'_>,
    selected: bool,
    focused_edit_field: Option<DraftField>,
    draft: &ProjectDraft,
) {
    let marker = if panel.expanded { "▾" } else { "▸" };
    let mut title_style = Style::default()
        .fg(theme.panel_border(selected))
        .add_modifier(Modifier::BOLD);
    if selected {
        title_style = title_style.bg(theme.interactive.selected_bg);
    }
    lines.push(Line::from(vec![
        Span::styled(format!("{marker} "), Style::default().fg(theme.base.accent)),
        Span::styled(panel.project.name.clone(), title_style),
    ]));

    if panel.editing {
        lines.push(field_line(
            theme,
            DraftField::Name,
            &draft.name,
            &panel.project.name,
            focused_edit_field,
        ));
        lines.push(field_line(
            theme,
            DraftField::Description,
            &draft.description,
            &panel.project.description,
            focused_edit_field,
        ));
    } else if !panel.project.description.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("  {}", panel.project.description),
            Style::default().fg(theme.base.text),
        )));
    }

    if panel.expanded {
        if panel.tasks.is_empty() {
            lines.push(Line::from(Span::styled(
                "    No tasks",
                Style::default().fg(theme.base.text_muted),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "  Project Tasks",
                Style::default()
                    .fg(theme.base.header)
                    .add_modifier(Modifier::UNDERLINED),
            )));
            for task in &panel.tasks {
                let check = if task.completed { "[x]" } else { "[ ]" };
                lines.push(Line::from(Span::styled(
                    format!("    {check} {}", task.title),
                    Style::default().fg(theme.task_color(task.completed)),
                )));
            }
        }
    }

    lines.push(Line::default());
}

/// One labelled form input. An empty value shows `placeholder` dimmed.
fn field_line(
    theme: &Theme,
    field: DraftField,
    value: &str,
    placeholder: &str,
    focused: Option<DraftField>,
) -> Line<'static> {
    let is_focused = focused == Some(field);
    let prefix = if is_focused { "› " } else { "  " };
    let label_style = if is_focused {
        Style::default()
            .fg(theme.interactive.focus)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.panel.hint)
    };

    let mut spans = vec![
        Span::styled(prefix, label_style),
        Span::styled(format!("{}: ", field.label()), label_style),
    ];
    if value.is_empty() {
        spans.push(Span::styled(
            placeholder.to_string(),
            Style::default().fg(theme.base.text_muted),
        ));
    } else {
        spans.push(Span::styled(
            value.to_string(),
            Style::default().fg(theme.base.text),
        ));
    }
    if is_focused {
        spans.push(Span::styled("▏", Style::default().fg(theme.interactive.focus)));
    }
    Line::from(spans)
}

fn render_footer(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let theme = &app.theme;
    let text = match (&app.footer_notice, app.mode) {
        (Some(notice), _) => notice.as_str(),
        (None, InputMode::Browse) => BROWSE_HINTS,
        (None, _) => FORM_HINTS,
    };
    let color = if app.footer_notice.is_some() && app.notice_is_error {
        theme.base.danger
    } else {
        theme.panel.hint
    };
    let footer = Paragraph::new(Line::from(Span::styled(
        format!(" {text} "),
        Style::default().fg(color),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(footer, area);
}
