//! Frame layout and chrome for mentor.
//!
//! This module is pure layout arithmetic plus the two chrome rows — no mutable
//! application state lives here. It is called inside `terminal.draw()` on every
//! render so every frame gets a fresh layout that automatically reflects the
//! current terminal size.

use ratatui::{
    layout::{Constraint, Layout, Margin, Rect},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
    Frame,
};

use crate::app::{AppState, Mode};
use crate::theme::Theme;

/// Returns `[header, content, status_bar]` `Rect`s for the current frame.
///
/// The header and status bar are one row each; the content area fills the
/// remaining height. Valid only for the current draw closure — never store
/// these across frames.
pub fn compute_layout(frame: &Frame) -> [Rect; 3] {
    frame.area().layout(&Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ]))
}

/// Returns the inner `Rect` of a panel after removing the 1-cell border on
/// each side.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Returns a centred overlay `Rect` covering the given percentages of the
/// frame.
pub fn centered_overlay(frame: &Frame, width_pct: u16, height_pct: u16) -> Rect {
    frame
        .area()
        .centered(Constraint::Percentage(width_pct), Constraint::Percentage(height_pct))
}

/// Builds a bordered `Block` for a panel or overlay.
///
/// `BorderType::Thick` marks the active surface; `MergeStrategy::Fuzzy` keeps
/// junctions correct when thick and plain borders meet.
pub fn panel_block<'a>(title: &'a str, is_active: bool, theme: &'a Theme) -> Block<'a> {
    let border_style = if is_active {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_active { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
        .merge_borders(MergeStrategy::Fuzzy)
}

/// Renders the 1-row header: title, assigned level, and the XP badge.
pub fn render_header(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let mut spans = vec![Span::styled(
        " MentorAI ",
        Style::default().fg(theme.header_title).add_modifier(Modifier::BOLD),
    )];
    if let Some(level) = state.level {
        spans.push(Span::styled(
            format!(" {} ", level.wire_label()),
            Style::default().fg(theme.header_level),
        ));
    }
    spans.push(Span::styled(
        format!(" {} XP ", state.score),
        Style::default().fg(theme.header_score).add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Renders the 1-row status bar at the bottom of the terminal.
///
/// Always shows a mode indicator (`NORMAL` or `INSERT`) plus a short hint for
/// the active surface. Overlay modes display `NORMAL` — the overlay is a
/// transient visual layer, not an input-mode change.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let (mode_text, mode_fg) = match state.mode {
        Mode::Insert(_) => (" INSERT ", theme.status_mode_insert),
        _ => (" NORMAL ", theme.status_mode_normal),
    };

    let hint = match state.mode {
        Mode::Insert(_) => "Enter enviar · Esc salir",
        Mode::ChatOverlay => "i escribir · j/k desplazar · Esc cerrar",
        Mode::HistoryOverlay => "Tab pestaña · Enter recuperar · Esc cerrar",
        Mode::KnowledgeOverlay => "i añadir · d eliminar · Esc cerrar",
        Mode::HelpOverlay => "j/k desplazar · Esc cerrar",
        Mode::Normal => "a chat · r historial · f archivos · ? ayuda · q salir",
    };

    let line = Line::from(vec![
        Span::styled(mode_text, Style::default().fg(mode_fg).add_modifier(Modifier::BOLD)),
        Span::raw(" "),
        Span::raw(hint),
    ]);

    frame.render_widget(
        Paragraph::new(line)
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}

/// Renders the error banner at the top of the content area.
pub fn render_error_banner(frame: &mut Frame, area: Rect, message: &str, theme: &Theme) {
    let line = Line::from(vec![
        Span::styled("● ", Style::default().fg(theme.error)),
        Span::styled(message.to_owned(), Style::default().fg(theme.error)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Renders the loading overlay for the current step's in-flight fetch.
pub fn render_loading(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "MentorAI Trabajando...",
            Style::default().fg(theme.step_accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            state.step.loading_message(),
            Style::default().fg(theme.hint),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines).centered(),
        area.centered(Constraint::Percentage(80), Constraint::Length(4)),
    );
}
