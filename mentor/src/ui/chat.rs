//! Q&A chat overlay renderer.
//!
//! A centred modal with the conversation transcript, a typing indicator while
//! a reply is pending, and the input line at the bottom.

use ratatui::{
    layout::{Constraint, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph, Wrap},
    Frame,
};

use mentor_core::types::ChatRole;

use crate::app::{AppState, InsertTarget, Mode};
use crate::theme::Theme;

use super::layout::{centered_overlay, inner_rect, panel_block};

pub fn render_overlay(frame: &mut Frame, state: &AppState, theme: &Theme) {
    if frame.area().width < 40 {
        return;
    }
    let overlay = centered_overlay(frame, 80, 80);
    frame.render_widget(Clear, overlay);

    let block = panel_block(" Q&A — MentorAI ", true, theme);
    let inner = inner_rect(overlay);
    frame.render_widget(block, overlay);

    let [transcript_area, input_area] =
        inner.layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(2)]));

    let mut lines: Vec<Line> = Vec::new();
    if state.chat.messages.is_empty() {
        lines.push(Line::from(Span::styled(
            "Haz una pregunta técnica sobre Fabric, Power BI, Azure o DevOps.",
            Style::default().fg(theme.hint),
        )));
    }
    for message in &state.chat.messages {
        let (speaker, color) = match message.role {
            ChatRole::User => ("Tú", theme.chat_user),
            ChatRole::Assistant => ("MentorAI", theme.chat_assistant),
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("{speaker} "),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                message.timestamp.format("%H:%M").to_string(),
                Style::default().fg(theme.hint),
            ),
        ]));
        for text_line in message.text.lines() {
            lines.push(Line::from(Span::styled(
                format!("  {text_line}"),
                Style::default().fg(theme.step_text),
            )));
        }
        lines.push(Line::from(""));
    }
    if state.chat.waiting {
        lines.push(Line::from(Span::styled(
            "MentorAI está escribiendo...",
            Style::default().fg(theme.chat_assistant).add_modifier(Modifier::ITALIC),
        )));
    }

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((state.chat.scroll, 0)),
        transcript_area,
    );

    let inserting = state.mode == Mode::Insert(InsertTarget::Chat);
    let cursor = if inserting { "▏" } else { "" };
    let prompt = if state.chat.input.is_empty() && !inserting {
        Line::from(Span::styled("i para escribir tu pregunta…", Style::default().fg(theme.hint)))
    } else {
        Line::from(vec![
            Span::styled("❯ ", Style::default().fg(theme.step_accent)),
            Span::styled(state.chat.input.clone(), Style::default().fg(theme.step_text)),
            Span::styled(cursor, Style::default().fg(theme.step_accent)),
        ])
    };
    frame.render_widget(Paragraph::new(prompt), input_area);
}
