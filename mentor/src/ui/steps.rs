//! Renderers for the topic-input, pillar, and variation steps.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
    Frame,
};

use crate::app::{AppState, InsertTarget, Mode};
use crate::theme::Theme;

use super::layout::{inner_rect, panel_block};

/// Suggested starting topics shown under the input box.
const SUGGESTIONS: [&str; 3] = [
    "Fabric Git Integration",
    "Power BI Deployment Pipelines",
    "Synapse Data Engineering",
];

pub fn render_input_topic(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let block = panel_block(" Microsoft Fabric Mastery ", true, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let inserting = state.mode == Mode::Insert(InsertTarget::Topic);
    let cursor = if inserting { "▏" } else { "" };
    let input_line = if state.topic_input.is_empty() && !inserting {
        Line::from(Span::styled(
            "Introduce tu tema (ej: Implementación de Medallion Architecture)",
            Style::default().fg(theme.hint),
        ))
    } else {
        Line::from(vec![
            Span::styled(state.topic_input.clone(), Style::default().fg(theme.step_text)),
            Span::styled(cursor, Style::default().fg(theme.step_accent)),
        ])
    };

    let mut lines = vec![
        Line::from(Span::styled(
            "¿Qué desafío técnico quieres resolver hoy?",
            Style::default().fg(theme.step_text).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("  Tema:", Style::default().fg(theme.step_accent))),
        input_line,
        Line::from(""),
        Line::from(Span::styled("Sugerencias:", Style::default().fg(theme.hint))),
    ];
    for suggestion in SUGGESTIONS {
        lines.push(Line::from(Span::styled(
            format!("  · {suggestion}"),
            Style::default().fg(theme.hint),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "i para escribir · Enter para generar pilares · r recupera un tema del historial",
        Style::default().fg(theme.hint),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
}

pub fn render_pillars(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let subtitle = format!("Selecciona un área de enfoque para: {}", state.topic);
    render_selection_list(
        frame,
        area,
        " Pilares Estratégicos ",
        &subtitle,
        &state.pillars,
        &mut state.pillar_list,
        theme,
    );
}

pub fn render_variations(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let subtitle = format!(
        "Profundiza en un escenario específico de: {}",
        state.selected_pillar.as_deref().unwrap_or_default()
    );
    render_selection_list(
        frame,
        area,
        " Variaciones de Lección ",
        &subtitle,
        &state.variations,
        &mut state.variation_list,
        theme,
    );
}

/// Shared renderer for the two ten-item selection steps.
fn render_selection_list(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    subtitle: &str,
    items: &[String],
    list_state: &mut ratatui::widgets::ListState,
    theme: &Theme,
) {
    let block = panel_block(title, true, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let [subtitle_area, list_area] = inner.layout(&ratatui::layout::Layout::vertical([
        ratatui::layout::Constraint::Length(2),
        ratatui::layout::Constraint::Fill(1),
    ]));

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            subtitle.to_owned(),
            Style::default().fg(theme.hint),
        ))),
        subtitle_area,
    );

    let list_items: Vec<ListItem> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:>2}  ", i + 1), Style::default().fg(theme.hint)),
                Span::styled(item.clone(), Style::default().fg(theme.step_text)),
            ]))
        })
        .collect();

    let list = List::new(list_items)
        .highlight_style(
            Style::default().fg(theme.step_accent).add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("› ");
    frame.render_stateful_widget(list, list_area, list_state);
}
