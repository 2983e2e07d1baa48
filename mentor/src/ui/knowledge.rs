//! Knowledge-base overlay renderer.
//!
//! Lists the attached PDF documents, the add-by-path prompt, and the inline
//! rejection/confirmation notice.

use ratatui::{
    layout::{Constraint, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, List, ListItem, Paragraph},
    Frame,
};

use crate::app::{AppState, InsertTarget, Mode};
use crate::theme::Theme;

use super::layout::{centered_overlay, inner_rect, panel_block};

pub fn render_overlay(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    if frame.area().width < 40 {
        return;
    }
    let overlay = centered_overlay(frame, 70, 60);
    frame.render_widget(Clear, overlay);

    let block = panel_block(" Base de Conocimiento (PDF) ", true, theme);
    let inner = inner_rect(overlay);
    frame.render_widget(block, overlay);

    let [list_area, prompt_area, notice_area] = inner.layout(&Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(2),
        Constraint::Length(1),
    ]));

    let items: Vec<ListItem> = if state.knowledge.files.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "Sin documentos adjuntos. Los PDF se envían como contexto de generación.",
            Style::default().fg(theme.hint),
        )))]
    } else {
        state
            .knowledge
            .files
            .iter()
            .map(|file| {
                ListItem::new(Line::from(vec![
                    Span::styled("📄 ", Style::default().fg(theme.resource)),
                    Span::styled(file.name.clone(), Style::default().fg(theme.step_text)),
                ]))
            })
            .collect()
    };
    let list = List::new(items)
        .highlight_style(Style::default().fg(theme.step_accent).add_modifier(Modifier::BOLD))
        .highlight_symbol("› ");
    frame.render_stateful_widget(list, list_area, &mut state.knowledge.list);

    let inserting = state.mode == Mode::Insert(InsertTarget::KnowledgePath);
    let cursor = if inserting { "▏" } else { "" };
    let prompt = if state.knowledge.input.is_empty() && !inserting {
        Line::from(Span::styled(
            "i para añadir una ruta de PDF…",
            Style::default().fg(theme.hint),
        ))
    } else {
        Line::from(vec![
            Span::styled("Ruta: ", Style::default().fg(theme.step_accent)),
            Span::styled(state.knowledge.input.clone(), Style::default().fg(theme.step_text)),
            Span::styled(cursor, Style::default().fg(theme.step_accent)),
        ])
    };
    frame.render_widget(Paragraph::new(prompt), prompt_area);

    if let Some(notice) = &state.knowledge.notice {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                notice.clone(),
                Style::default().fg(theme.error),
            ))),
            notice_area,
        );
    }
}
