use std::path::Path;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::core::app::{ChatApp, NoticeKind, ViewState};
use crate::core::message::{Message, Role};
use crate::ui::state::{Focus, UiState};

const SIDEBAR_WIDTH: u16 = 30;

pub fn ui(f: &mut Frame, app: &ChatApp, ui: &mut UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
        .split(rows[0]);

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(columns[1]);

    render_sidebar(f, app, ui, columns[0]);
    render_body(f, app, ui, main[0]);
    render_composer(f, app, ui, main[1]);
    render_status(f, app, rows[1]);
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn render_sidebar(f: &mut Frame, app: &ChatApp, ui: &UiState, area: Rect) {
    let active_id = app.conversations.active_id();
    let items: Vec<ListItem> = app
        .conversations
        .conversations()
        .iter()
        .map(|conversation| {
            let style = if Some(conversation.id.as_str()) == active_id {
                Style::default().add_modifier(Modifier::BOLD).fg(Color::Yellow)
            } else {
                Style::default()
            };
            let title = if conversation.title.trim().is_empty() {
                "(untitled)"
            } else {
                conversation.title.as_str()
            };
            let mut spans = Vec::new();
            if conversation.rag_mode {
                spans.push(Span::styled("RAG ", Style::default().fg(Color::Green)));
            }
            spans.push(Span::styled(title.to_string(), style));
            ListItem::new(Line::from(spans))
        })
        .collect();

    let focused = ui.focus == Focus::Sidebar;
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focus_style(focused))
                .title("Conversations"),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if focused && !app.conversations.conversations().is_empty() {
        state.select(Some(ui.sidebar_index));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn render_body(f: &mut Frame, app: &ChatApp, ui: &mut UiState, area: Rect) {
    let title = match app.models.selected() {
        Some(choice) => format!("chatterm • {} ({})", choice.model, choice.provider),
        None => format!("chatterm • {}", app.models.active_model()),
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    let lines = match app.view() {
        ViewState::Loading => vec![Line::from(Span::styled(
            "Checking session…",
            Style::default().fg(Color::DarkGray),
        ))],
        ViewState::Landing => landing_lines(app),
        ViewState::Transcript => transcript_lines(app.conversations.transcript(), app.exchange.is_sending()),
    };

    let inner = block.inner(area);
    let total = wrapped_height(&lines, inner.width);
    ui.max_scroll = total.saturating_sub(inner.height);
    let offset = if ui.auto_scroll {
        ui.max_scroll
    } else {
        ui.scroll_offset.min(ui.max_scroll)
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    f.render_widget(paragraph, area);
}

fn landing_lines(app: &ChatApp) -> Vec<Line<'static>> {
    let name = app
        .session
        .user()
        .map(|user| user.name.clone())
        .unwrap_or_default();
    let mut lines = vec![
        Line::from(Span::styled(
            format!("Hello, {name}!"),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("What can I help you with today?"),
        Line::from(""),
    ];

    let active = app.models.active_model();
    if app.models.catalog().is_empty() {
        lines.push(Line::from(format!("Model: {active}")));
    } else {
        lines.push(Line::from("Models (/model <name> to switch):"));
        for choice in app.models.catalog() {
            let selected = choice.model == active;
            let marker = if selected { "● " } else { "  " };
            let style = if selected {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::Gray)
            };
            lines.push(Line::from(Span::styled(
                format!("{marker}{} ({})", choice.model, choice.provider),
                style,
            )));
        }
    }
    lines
}

fn transcript_lines(messages: &[Message], sending: bool) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for message in messages {
        let color = match message.role {
            Role::User => Color::Cyan,
            Role::Assistant => Color::White,
        };
        lines.push(Line::from(Span::styled(
            format!("{}:", message.role.label()),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        if let Some(image_path) = message.image_path.as_deref() {
            let name = Path::new(image_path)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| image_path.to_string());
            lines.push(Line::from(Span::styled(
                format!("[image: {name}]"),
                Style::default().fg(Color::Magenta),
            )));
        }
        for content_line in message.content.lines() {
            lines.push(Line::from(Span::styled(
                content_line.to_string(),
                Style::default().fg(color),
            )));
        }
        lines.push(Line::from(""));
    }
    if sending {
        lines.push(Line::from(Span::styled(
            "Assistant is typing…",
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines
}

/// Rows `lines` occupy when wrapped to `width` columns.
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    if width == 0 {
        return 0;
    }
    let width = width as usize;
    let rows: usize = lines
        .iter()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

fn pulse_symbol(ui: &UiState) -> &'static str {
    let elapsed = ui.pulse_start.elapsed().as_millis() as f32 / 1000.0;
    let phase = (elapsed * 2.0) % 2.0;
    let intensity = if phase < 1.0 { phase } else { 2.0 - phase };
    if intensity < 0.33 {
        "○"
    } else if intensity < 0.66 {
        "◐"
    } else {
        "●"
    }
}

fn render_composer(f: &mut Frame, app: &ChatApp, ui: &UiState, area: Rect) {
    let mut title = vec![Span::raw("Message")];
    if let Some(attachment) = app.composer.attachment() {
        title.push(Span::raw(" "));
        title.push(Span::styled(
            format!("[{}: {}]", attachment.kind.label(), attachment.file_name),
            Style::default().fg(Color::Magenta),
        ));
    }
    if app.composer.rag_enabled() {
        title.push(Span::raw(" "));
        title.push(Span::styled(
            "[RAG]",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ));
    }
    if app.exchange.is_sending() {
        title.push(Span::raw(" "));
        title.push(Span::styled(
            format!("{} waiting for reply", pulse_symbol(ui)),
            Style::default().fg(Color::Yellow),
        ));
    }

    let focused = ui.focus == Focus::Composer;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_style(focused))
        .title(Line::from(title));
    let inner = block.inner(area);

    let cursor = ui.cursor_column();
    let visible = (inner.width as usize).saturating_sub(1);
    let horizontal = cursor.saturating_sub(visible);
    let paragraph = Paragraph::new(ui.input().to_string())
        .block(block)
        .scroll((0, u16::try_from(horizontal).unwrap_or(u16::MAX)));
    f.render_widget(paragraph, area);

    if focused {
        let column = u16::try_from(cursor - horizontal).unwrap_or(0);
        f.set_cursor_position((inner.x + column, inner.y));
    }
}

fn render_status(f: &mut Frame, app: &ChatApp, area: Rect) {
    let line = match app.notice() {
        Some(notice) => {
            let style = match notice.kind {
                NoticeKind::Error => Style::default().fg(Color::Red),
                NoticeKind::Info => Style::default().fg(Color::Green),
            };
            Line::from(Span::styled(notice.text.clone(), style))
        }
        None => {
            let who = app
                .session
                .user()
                .map(|user| user.email.clone())
                .unwrap_or_else(|| "not logged in".to_string());
            Line::from(vec![
                Span::styled(who, Style::default().fg(Color::Gray)),
                Span::styled(
                    "  Tab: conversations  /help: commands  Ctrl+C: quit",
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        }
    };
    f.render_widget(Paragraph::new(line), area);
}
