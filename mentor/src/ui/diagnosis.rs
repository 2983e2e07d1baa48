//! Renderer for the level-diagnosis step.
//!
//! Shows the three questions with their options, the cursor, and — once the
//! user has entered review — correct/incorrect marks next to every option.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::app::AppState;
use crate::theme::Theme;

use super::layout::{inner_rect, panel_block};

pub fn render(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let block = panel_block(" Diagnóstico de Nivel ", true, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    if state.diagnosis.questions.is_empty() {
        let hint = if state.error.is_some() {
            "Pulsa Enter para reintentar el diagnóstico."
        } else {
            "Esperando preguntas de diagnóstico..."
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(hint, Style::default().fg(theme.hint)))),
            inner,
        );
        return;
    }

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(
            "Para personalizar tus cursos, responde estas 3 preguntas sobre el ecosistema.",
            Style::default().fg(theme.hint),
        )),
        Line::from(""),
    ];

    for (qi, question) in state.diagnosis.questions.iter().enumerate() {
        let focused = qi == state.diagnosis.cursor;
        let marker = if focused { "› " } else { "  " };
        let q_style = if focused {
            Style::default().fg(theme.step_accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.step_text)
        };
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(theme.step_accent)),
            Span::styled(format!("{}. {}", qi + 1, question.question), q_style),
        ]));

        let chosen = state.diagnosis.answers[qi];
        for (oi, option) in question.options.iter().enumerate() {
            let is_chosen = chosen == Some(oi);
            let (mark, style) = if state.diagnosis.in_review {
                if oi == question.correct_answer {
                    ("✓", Style::default().fg(theme.quiz_correct))
                } else if is_chosen {
                    ("✗", Style::default().fg(theme.quiz_incorrect))
                } else {
                    (" ", Style::default().fg(theme.hint))
                }
            } else if is_chosen {
                ("●", Style::default().fg(theme.quiz_selected))
            } else {
                ("○", Style::default().fg(theme.step_text))
            };
            lines.push(Line::from(vec![
                Span::raw("    "),
                Span::styled(format!("{mark} "), style),
                Span::styled(format!("{}. {option}", oi + 1), style),
            ]));
        }
        lines.push(Line::from(""));
    }

    let footer = if state.diagnosis.in_review {
        "Revisión: Enter para continuar con la evaluación de nivel."
    } else if state.diagnosis.all_answered() {
        "Enter para enviar tus respuestas."
    } else {
        "j/k cambia de pregunta · 1-9 elige una opción."
    };
    lines.push(Line::from(Span::styled(footer, Style::default().fg(theme.hint))));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
