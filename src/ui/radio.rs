// ui/radio.rs

use super::{
    MIN_HEIGHT, MIN_WIDTH,
    constants::{
        BRIEFING, KEYS_BUSY, KEYS_CAPTURING, KEYS_CONFIRM, KEYS_EDITING, KEYS_IDLE, KEYS_LANDED,
        TITLE,
    },
    spinner::spinner_frame,
};
use crate::app::{App, InputMode};
use crate::game::Outcome;
use crate::message::{Message, Role};
use crate::turn::TurnState;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::*,
};

pub fn draw(f: &mut Frame, app: &App) {
    let size = f.area();

    if size.width < MIN_WIDTH || size.height < MIN_HEIGHT {
        let warning = Paragraph::new("Terminal too small. Please resize.")
            .style(Style::default().fg(Color::Red))
            .alignment(Alignment::Center);
        f.render_widget(warning, size);
        return;
    }

    // The title only fits on tall terminals.
    let title_height = if size.height >= MIN_HEIGHT + 8 { 6 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(title_height),
            Constraint::Length(2),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(size);

    if title_height > 0 {
        render_title(f, chunks[0]);
    }
    render_briefing(f, chunks[1]);

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(32), Constraint::Percentage(68)])
        .split(chunks[2]);
    render_frequencies(f, app, main[0]);
    render_conversation(f, app, main[1]);
    render_input(f, app, chunks[3]);
    render_status(f, app, chunks[4]);
}

fn render_title(f: &mut Frame, area: Rect) {
    let title = Paragraph::new(TITLE)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Green));
    f.render_widget(title, area);
}

fn render_briefing(f: &mut Frame, area: Rect) {
    let briefing = Paragraph::new(BRIEFING)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(briefing, area);
}

// The radio dial. Planets are only revealed once the player has landed.
fn render_frequencies(f: &mut Frame, app: &App, area: Rect) {
    let controller = app.controller();
    let current = controller.current_index();
    let landed = app.session().landing();

    let items: Vec<ListItem> = controller
        .registry()
        .iter()
        .enumerate()
        .map(|(i, persona)| {
            let selected = i == current;
            let marker = if selected { "▶ " } else { "  " };
            let style = if selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            let mut lines = vec![Line::from(vec![
                Span::styled(marker, style),
                Span::styled(persona.display_name.clone(), style),
                Span::styled(
                    format!(" · {}", persona.description),
                    Style::default().fg(Color::DarkGray),
                ),
            ])];
            if landed.is_some() {
                let verdict = if persona.is_truthful { " ✓" } else { "" };
                lines.push(Line::from(vec![
                    Span::raw("    "),
                    Span::styled("██ ", Style::default().fg(persona.planet_hue())),
                    Span::raw(format!("{}{}", persona.planet_name, verdict)),
                ]));
            }
            ListItem::new(lines)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Frequencies ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Green)),
    );
    f.render_widget(list, area);
}

fn render_conversation(f: &mut Frame, app: &App, area: Rect) {
    let controller = app.controller();
    let persona = controller.current_persona();
    let block = Block::default()
        .title(format!(" {} ", persona.display_name))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Green));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let width = inner.width.saturating_sub(1).max(1) as usize;
    let mut lines: Vec<Line> = Vec::new();
    for message in controller.messages() {
        lines.extend(message_lines(message, width));
        lines.push(Line::raw(""));
    }
    if let Some(landing) = app.session().landing() {
        let (text, color) = match landing.outcome {
            Outcome::Survived => (format!("Landed on {}. You survived.", landing.planet_name), Color::Green),
            Outcome::Lost => (format!("Landed on {}. You did not survive.", landing.planet_name), Color::Red),
        };
        lines.push(Line::styled(text, Style::default().fg(color).add_modifier(Modifier::BOLD)));
    }

    // Keep the latest lines in view.
    let height = inner.height.saturating_sub(1) as usize;
    let skip = lines.len().saturating_sub(height);
    let visible: Vec<Line> = lines.into_iter().skip(skip).collect();
    f.render_widget(Paragraph::new(visible), inner);

    if controller.state() == TurnState::AwaitingReply && inner.height > 0 {
        let spinner_area = Rect::new(inner.x, inner.bottom() - 1, inner.width, 1);
        let spinner = Paragraph::new(spinner_frame(app.spinner(), &persona.display_name))
            .style(Style::default().fg(Color::Green))
            .alignment(Alignment::Center);
        f.render_widget(spinner, spinner_area);
    }
}

fn message_lines(message: &Message, width: usize) -> Vec<Line<'static>> {
    let (label, color) = match message.role {
        Role::User => ("You", Color::Cyan),
        Role::Assistant => ("Radio", Color::Green),
    };
    let text = format!("{label}: {}", message.content);
    textwrap::wrap(&text, width)
        .into_iter()
        .map(|line| Line::styled(line.into_owned(), Style::default().fg(color)))
        .collect()
}

fn render_input(f: &mut Frame, app: &App, area: Rect) {
    let (title, text, style) = match app.input_mode() {
        InputMode::Editing => (
            " Message ",
            format!("{}█", app.input()),
            Style::default().fg(Color::Yellow),
        ),
        InputMode::ConfirmLanding => (
            " Landing ",
            format!(
                "Land on the planet described by {}?",
                app.controller().current_persona().display_name
            ),
            Style::default().fg(Color::Red),
        ),
        InputMode::Normal => (" Radio ", state_label(app), Style::default().fg(Color::White)),
    };
    let input = Paragraph::new(text).style(style).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    f.render_widget(input, area);
}

fn state_label(app: &App) -> String {
    if app.session().is_over() {
        return "Transmission over.".to_string();
    }
    match app.controller().state() {
        TurnState::Idle if !app.controller().is_voice_available() => {
            "Ready. Voice input unavailable, type your questions.".to_string()
        }
        TurnState::Idle => "Ready.".to_string(),
        TurnState::Capturing => "● Listening...".to_string(),
        TurnState::AwaitingReply => "Waiting for an answer...".to_string(),
        TurnState::Speaking => "♪ Receiving...".to_string(),
    }
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let hints = match app.input_mode() {
        InputMode::Editing => KEYS_EDITING,
        InputMode::ConfirmLanding => KEYS_CONFIRM,
        InputMode::Normal if app.session().is_over() => KEYS_LANDED,
        InputMode::Normal => match app.controller().state() {
            TurnState::Idle => KEYS_IDLE,
            TurnState::Capturing => KEYS_CAPTURING,
            TurnState::AwaitingReply | TurnState::Speaking => KEYS_BUSY,
        },
    };

    let mut spans = Vec::new();
    if let Some(notice) = app.notice() {
        spans.push(Span::styled(format!("{notice}  "), Style::default().fg(Color::Yellow)));
    }
    spans.push(Span::styled(hints, Style::default().fg(Color::DarkGray)));
    if app.debug_mode() {
        spans.push(Span::styled(
            format!(
                "  [{:?} / {:?}]",
                app.controller().state(),
                app.controller().capture_state()
            ),
            Style::default().fg(Color::Magenta),
        ));
    }

    let status = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
    f.render_widget(status, area);
}
