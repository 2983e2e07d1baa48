//! Renderer for the course view: the lexed block sequence, the embedded quiz
//! widgets, and the glossary tooltip.
//!
//! The whole course is rebuilt as a `Vec<Line>` each frame from the lexed
//! blocks plus the quiz states, then drawn as one scrollable `Paragraph`.
//! Rebuilding per frame keeps quiz/shake/selection rendering trivially in sync
//! with state at 30 FPS without any caching invalidation logic.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{AppState, CourseViewState};
use crate::course::lexer::{CourseBlock, Inline, QuizItem, GLOSSARY_FALLBACK};
use crate::course::quiz::{QuizPhase, QuizState};
use crate::theme::Theme;

use super::layout::{inner_rect, panel_block};

/// Width in cells of the textual progress bar.
const PROGRESS_BAR_WIDTH: usize = 24;

pub fn render(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let inner = inner_rect(area);
    state.course_viewport_height = inner.height;

    let Some(course) = state.course.as_mut() else { return };

    let title = format!(" {} ", course.title);
    let block = panel_block(&title, true, theme);
    frame.render_widget(block, area);

    let mut lines: Vec<Line<'static>> = Vec::new();
    if let Some(level) = &course.doc.level {
        lines.push(Line::from(Span::styled(
            format!("Nivel: {level}"),
            Style::default().fg(theme.header_level),
        )));
        lines.push(Line::from(""));
    }

    let mut quiz_flat = 0usize;
    for block in &course.doc.blocks {
        match block {
            CourseBlock::Heading { level, text } => {
                let style = if *level <= 2 {
                    Style::default().fg(theme.heading).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(theme.subheading).add_modifier(Modifier::BOLD)
                };
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(text.clone(), style)));
            }
            CourseBlock::Paragraph(inlines) => {
                lines.push(render_inlines(inlines, theme));
            }
            CourseBlock::Bullet(inlines) => {
                let mut spans = vec![Span::styled("  • ", Style::default().fg(theme.step_accent))];
                spans.extend(render_inlines(inlines, theme).spans);
                lines.push(Line::from(spans));
            }
            CourseBlock::Quote(text) => {
                lines.push(Line::from(Span::styled(
                    format!("┃ {text}"),
                    Style::default().fg(theme.quote).add_modifier(Modifier::ITALIC),
                )));
            }
            CourseBlock::Code { language, body } => {
                lines.push(Line::from(Span::styled(
                    format!("── {language} "),
                    Style::default().fg(theme.hint),
                )));
                for code_line in body.lines() {
                    lines.push(Line::from(Span::styled(
                        format!("  {code_line}"),
                        Style::default().fg(theme.code),
                    )));
                }
            }
            CourseBlock::Progress { percent } => {
                lines.push(render_progress(*percent, theme));
            }
            CourseBlock::Diagram { description } => {
                lines.push(Line::from(vec![
                    Span::styled("◇ Diagrama: ", Style::default().fg(theme.diagram)),
                    Span::styled(
                        description.clone(),
                        Style::default().fg(theme.diagram).add_modifier(Modifier::ITALIC),
                    ),
                ]));
            }
            CourseBlock::Resource { kind, title } => {
                lines.push(Line::from(vec![
                    Span::styled(format!("▪ {kind}: "), Style::default().fg(theme.resource)),
                    Span::styled(title.clone(), Style::default().fg(theme.step_text)),
                ]));
            }
            CourseBlock::Quiz(items) => {
                for item in items {
                    let quiz_state = &course.quizzes[quiz_flat];
                    let active = quiz_flat == course.active_quiz;
                    render_quiz(&mut lines, item, quiz_state, active, theme);
                    quiz_flat += 1;
                }
            }
        }
    }

    // Clamp after layout so a jump-to-end (scroll = MAX) lands on the last
    // page instead of a blank screen.
    let max_scroll = (lines.len() as u16).saturating_sub(inner.height);
    course.scroll = course.scroll.min(max_scroll);

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((course.scroll, 0));
    frame.render_widget(paragraph, inner);

    if course.glossary_cursor.is_some() {
        render_glossary_tooltip(frame, course, theme);
    }
}

/// Converts one inline run into a styled line.
fn render_inlines(inlines: &[Inline], theme: &Theme) -> Line<'static> {
    let spans: Vec<Span<'static>> = inlines
        .iter()
        .map(|inline| match inline {
            Inline::Text(text) => {
                Span::styled(text.clone(), Style::default().fg(theme.step_text))
            }
            Inline::Glossary { term, .. } => Span::styled(
                format!("⟦{term}⟧"),
                Style::default().fg(theme.glossary).add_modifier(Modifier::UNDERLINED),
            ),
        })
        .collect();
    Line::from(spans)
}

/// Renders a progress checkpoint as a completion marker plus a bar.
fn render_progress(percent: u8, theme: &Theme) -> Line<'static> {
    let filled = (percent as usize * PROGRESS_BAR_WIDTH) / 100;
    let empty = PROGRESS_BAR_WIDTH - filled;
    Line::from(vec![
        Span::styled("✔ Bloque completado  ", Style::default().fg(theme.progress_filled)),
        Span::styled("█".repeat(filled), Style::default().fg(theme.progress_filled)),
        Span::styled("░".repeat(empty), Style::default().fg(theme.progress_empty)),
        Span::styled(format!(" {percent}%"), Style::default().fg(theme.step_text)),
    ])
}

/// Renders one quiz question with its options and, after submit, the
/// explanation panel.
fn render_quiz(
    lines: &mut Vec<Line<'static>>,
    item: &QuizItem,
    quiz: &QuizState,
    active: bool,
    theme: &Theme,
) {
    let marker = if active { "› " } else { "  " };
    let q_style = if active {
        Style::default().fg(theme.step_accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.step_text).add_modifier(Modifier::BOLD)
    };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(marker, Style::default().fg(theme.step_accent)),
        Span::styled(format!("❓ {}", item.question), q_style),
    ]));

    let shaking = quiz.shake_ticks > 0;
    for (oi, option) in item.options.iter().enumerate() {
        let (mark, mut style) = match quiz.phase {
            QuizPhase::Submitted { selected } => {
                if oi == item.correct_answer {
                    ("✓", Style::default().fg(theme.quiz_correct))
                } else if oi == selected {
                    ("✗", Style::default().fg(theme.quiz_incorrect))
                } else {
                    (" ", Style::default().fg(theme.hint))
                }
            }
            QuizPhase::Selected(selected) if oi == selected => {
                ("●", Style::default().fg(theme.quiz_selected))
            }
            _ => ("○", Style::default().fg(theme.step_text)),
        };
        // Wrong answers flash bold+reversed while the shake decays.
        if shaking && matches!(quiz.phase, QuizPhase::Submitted { selected } if oi == selected) {
            style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
        }
        lines.push(Line::from(vec![
            Span::raw("    "),
            Span::styled(format!("{mark} "), style),
            Span::styled(format!("{}. {option}", oi + 1), style),
        ]));
    }

    if quiz.is_submitted() {
        lines.push(Line::from(vec![
            Span::raw("    "),
            Span::styled("💡 ", Style::default().fg(theme.quiz_explanation)),
            Span::styled(
                item.explanation.clone(),
                Style::default().fg(theme.quiz_explanation).add_modifier(Modifier::ITALIC),
            ),
        ]));
    }
}

/// Renders the glossary tooltip as a small centred modal.
fn render_glossary_tooltip(frame: &mut Frame, course: &CourseViewState, theme: &Theme) {
    let Some(idx) = course.glossary_cursor else { return };
    let Some(entry) = course.doc.glossary.get(idx) else { return };

    let overlay = frame
        .area()
        .centered(Constraint::Percentage(50), Constraint::Length(5));
    frame.render_widget(Clear, overlay);

    let title = format!(" ⟦{}⟧ ({}/{}) ", entry.term, idx + 1, course.doc.glossary.len());
    let block = panel_block(&title, true, theme);
    let definition = entry.definition.as_deref().unwrap_or(GLOSSARY_FALLBACK).to_owned();
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            definition,
            Style::default().fg(theme.step_text),
        )))
        .wrap(Wrap { trim: false })
        .block(block),
        overlay,
    );
}
