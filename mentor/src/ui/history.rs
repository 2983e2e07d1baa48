//! History recall overlay renderer.
//!
//! Tabbed COURSE / QA list of past topic submissions and chat questions,
//! newest first. Selecting an entry pre-fills the matching input buffer.

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, List, ListItem, Paragraph},
    Frame,
};

use mentor_core::types::HistorySource;

use crate::app::AppState;
use crate::theme::Theme;

use super::layout::{centered_overlay, inner_rect, panel_block};

pub fn render_overlay(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    if frame.area().width < 40 {
        return;
    }
    let overlay = centered_overlay(frame, 70, 70);
    frame.render_widget(Clear, overlay);

    let block = panel_block(" Historial ", true, theme);
    let inner = inner_rect(overlay);
    frame.render_widget(block, overlay);

    let [tabs_area, list_area] = inner.layout(&ratatui::layout::Layout::vertical([
        ratatui::layout::Constraint::Length(2),
        ratatui::layout::Constraint::Fill(1),
    ]));

    let tab_span = |label: &str, source: HistorySource| {
        if state.history_tab == source {
            Span::styled(
                format!(" {label} "),
                Style::default().fg(theme.step_accent).add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            )
        } else {
            Span::styled(format!(" {label} "), Style::default().fg(theme.hint))
        }
    };
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            tab_span("CURSOS", HistorySource::Course),
            Span::raw("  "),
            tab_span("Q&A", HistorySource::Qa),
        ])),
        tabs_area,
    );

    let entries = state.history_entries();
    let items: Vec<ListItem> = if entries.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "Sin entradas todavía.",
            Style::default().fg(theme.hint),
        )))]
    } else {
        entries
            .iter()
            .map(|entry| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        entry.timestamp.format("%Y-%m-%d %H:%M  ").to_string(),
                        Style::default().fg(theme.hint),
                    ),
                    Span::styled(entry.text.clone(), Style::default().fg(theme.step_text)),
                ]))
            })
            .collect()
    };

    let list = List::new(items)
        .highlight_style(Style::default().fg(theme.step_accent).add_modifier(Modifier::BOLD))
        .highlight_symbol("› ");
    frame.render_stateful_widget(list, list_area, &mut state.history_list);
}
