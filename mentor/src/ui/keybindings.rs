//! Keyboard and mouse dispatch.
//!
//! Translates crossterm events into [`AppState`] mutations. The active
//! [`Mode`] selects the binding set; Normal mode additionally dispatches on
//! the current [`FlowStep`]. Returns [`KeyAction::Quit`] only for the keys
//! that end the session — the event loop breaks on it.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};

use crate::app::{AppState, FlowStep, InsertTarget, Mode};

/// Rows moved per mouse wheel notch.
const WHEEL_SCROLL: u16 = 3;

/// What the event loop should do after a key was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
}

pub fn handle_key(state: &mut AppState, key: KeyEvent) -> KeyAction {
    // Release/repeat events arrive on some terminals; act on presses only.
    if key.kind != KeyEventKind::Press {
        return KeyAction::Continue;
    }

    match state.mode {
        Mode::Normal => handle_normal(state, key),
        Mode::Insert(target) => {
            handle_insert(state, target, key);
            KeyAction::Continue
        }
        Mode::ChatOverlay => {
            handle_chat_overlay(state, key);
            KeyAction::Continue
        }
        Mode::HistoryOverlay => {
            handle_history_overlay(state, key);
            KeyAction::Continue
        }
        Mode::KnowledgeOverlay => {
            handle_knowledge_overlay(state, key);
            KeyAction::Continue
        }
        Mode::HelpOverlay => {
            handle_help_overlay(state, key);
            KeyAction::Continue
        }
    }
}

fn handle_normal(state: &mut AppState, key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Char('q') => return KeyAction::Quit,
        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
        }
        KeyCode::Char('a') => state.mode = Mode::ChatOverlay,
        KeyCode::Char('r') => {
            state.history_list.select(Some(0));
            state.mode = Mode::HistoryOverlay;
        }
        KeyCode::Char('f') => state.mode = Mode::KnowledgeOverlay,
        KeyCode::Char('h') => state.go_back(),
        _ => handle_step_key(state, key),
    }
    KeyAction::Continue
}

/// Normal-mode keys that depend on the current flow step.
fn handle_step_key(state: &mut AppState, key: KeyEvent) {
    match state.step {
        FlowStep::Diagnosis => match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                let last = state.diagnosis.questions.len().saturating_sub(1);
                if state.diagnosis.cursor < last {
                    state.diagnosis.cursor += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                state.diagnosis.cursor = state.diagnosis.cursor.saturating_sub(1);
            }
            KeyCode::Char(c @ '1'..='9') => {
                state.answer_diagnosis(c as usize - '1' as usize);
            }
            KeyCode::Enter => {
                // With no questions on screen, Enter retries the failed fetch.
                if state.diagnosis.questions.is_empty() {
                    if state.error.is_some() {
                        state.request_diagnosis();
                    }
                } else {
                    state.submit_diagnosis();
                }
            }
            _ => {}
        },
        FlowStep::InputTopic => match key.code {
            KeyCode::Char('i') => state.mode = Mode::Insert(InsertTarget::Topic),
            KeyCode::Enter => state.submit_topic(),
            _ => {}
        },
        FlowStep::SelectPillar => match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                move_selection(&mut state.pillar_list, state.pillars.len(), 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                move_selection(&mut state.pillar_list, state.pillars.len(), -1);
            }
            KeyCode::Enter | KeyCode::Char('l') => state.select_pillar(),
            _ => {}
        },
        FlowStep::SelectVariation => match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                move_selection(&mut state.variation_list, state.variations.len(), 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                move_selection(&mut state.variation_list, state.variations.len(), -1);
            }
            KeyCode::Enter | KeyCode::Char('l') => state.select_variation(),
            _ => {}
        },
        FlowStep::CourseView => handle_course_key(state, key),
    }
}

fn handle_course_key(state: &mut AppState, key: KeyEvent) {
    let Some(course) = state.course.as_mut() else { return };
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            course.scroll = course.scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            course.scroll = course.scroll.saturating_sub(1);
        }
        KeyCode::PageDown => {
            course.scroll = course.scroll.saturating_add(state.course_viewport_height);
        }
        KeyCode::PageUp => {
            course.scroll = course.scroll.saturating_sub(state.course_viewport_height);
        }
        KeyCode::Char('g') => course.scroll = 0,
        // Clamped to the real end during the next render.
        KeyCode::Char('G') => course.scroll = u16::MAX,
        KeyCode::Tab => course.next_quiz(),
        KeyCode::Char(c @ '1'..='9') => {
            course.select_option(c as usize - '1' as usize);
        }
        KeyCode::Enter => {
            if course.submit_active().is_some() {
                state.bell_pending = true;
            }
        }
        KeyCode::Char('t') => course.cycle_glossary(),
        KeyCode::Esc => course.glossary_cursor = None,
        _ => {}
    }
}

fn handle_insert(state: &mut AppState, target: InsertTarget, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            // Esc returns to the surface that owns the buffer.
            state.mode = match target {
                InsertTarget::Topic => Mode::Normal,
                InsertTarget::Chat => Mode::ChatOverlay,
                InsertTarget::KnowledgePath => Mode::KnowledgeOverlay,
            };
        }
        KeyCode::Enter => match target {
            InsertTarget::Topic => {
                state.mode = Mode::Normal;
                state.submit_topic();
            }
            // Stays in Insert so a follow-up question can be typed straight
            // away.
            InsertTarget::Chat => state.send_chat(),
            InsertTarget::KnowledgePath => state.add_knowledge_file(),
        },
        KeyCode::Char(c) => insert_buffer(state, target).push(c),
        KeyCode::Backspace => {
            insert_buffer(state, target).pop();
        }
        _ => {}
    }
}

fn insert_buffer(state: &mut AppState, target: InsertTarget) -> &mut String {
    match target {
        InsertTarget::Topic => &mut state.topic_input,
        InsertTarget::Chat => &mut state.chat.input,
        InsertTarget::KnowledgePath => &mut state.knowledge.input,
    }
}

fn handle_chat_overlay(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('i') => state.mode = Mode::Insert(InsertTarget::Chat),
        KeyCode::Char('j') | KeyCode::Down => {
            state.chat.scroll = state.chat.scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.chat.scroll = state.chat.scroll.saturating_sub(1);
        }
        KeyCode::Esc | KeyCode::Char('a') => state.mode = Mode::Normal,
        _ => {}
    }
}

fn handle_history_overlay(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Tab => {
            state.history_tab = match state.history_tab {
                mentor_core::types::HistorySource::Course => mentor_core::types::HistorySource::Qa,
                mentor_core::types::HistorySource::Qa => mentor_core::types::HistorySource::Course,
            };
            state.history_list.select(Some(0));
        }
        KeyCode::Char('j') | KeyCode::Down => {
            let len = state.history_entries().len();
            move_selection(&mut state.history_list, len, 1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            let len = state.history_entries().len();
            move_selection(&mut state.history_list, len, -1);
        }
        // recall_history_entry sets the follow-up mode itself.
        KeyCode::Enter => state.recall_history_entry(),
        KeyCode::Esc | KeyCode::Char('r') => state.mode = Mode::Normal,
        _ => {}
    }
}

fn handle_knowledge_overlay(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('i') => state.mode = Mode::Insert(InsertTarget::KnowledgePath),
        KeyCode::Char('j') | KeyCode::Down => {
            let len = state.knowledge.files.len();
            move_selection(&mut state.knowledge.list, len, 1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            let len = state.knowledge.files.len();
            move_selection(&mut state.knowledge.list, len, -1);
        }
        KeyCode::Char('d') => state.remove_knowledge_file(),
        KeyCode::Esc | KeyCode::Char('f') => state.mode = Mode::Normal,
        _ => {}
    }
}

fn handle_help_overlay(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            state.help_scroll = state.help_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.help_scroll = state.help_scroll.saturating_sub(1);
        }
        KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Esc => state.mode = Mode::Normal,
        _ => {}
    }
}

/// Moves a `ListState` selection by `delta`, clamped to `[0, len)`.
fn move_selection(list: &mut ratatui::widgets::ListState, len: usize, delta: i32) {
    if len == 0 {
        return;
    }
    let current = list.selected().unwrap_or(0) as i32;
    let next = (current + delta).clamp(0, len as i32 - 1) as usize;
    list.select(Some(next));
}

pub fn handle_mouse(state: &mut AppState, mouse: MouseEvent) {
    let delta = match mouse.kind {
        MouseEventKind::ScrollDown => WHEEL_SCROLL as i32,
        MouseEventKind::ScrollUp => -(WHEEL_SCROLL as i32),
        _ => return,
    };
    let scroll = match state.mode {
        Mode::HelpOverlay => &mut state.help_scroll,
        Mode::ChatOverlay | Mode::Insert(InsertTarget::Chat) => &mut state.chat.scroll,
        Mode::Normal if state.step == FlowStep::CourseView => {
            match state.course.as_mut() {
                Some(course) => &mut course.scroll,
                None => return,
            }
        }
        _ => return,
    };
    *scroll = if delta > 0 {
        scroll.saturating_add(delta as u16)
    } else {
        scroll.saturating_sub(delta.unsigned_abs() as u16)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn press(state: &mut AppState, code: KeyCode) -> KeyAction {
        handle_key(state, key(code))
    }

    #[test]
    fn q_quits_in_normal_but_types_in_insert() {
        let mut state = AppState::default();
        state.step = FlowStep::InputTopic;
        assert_eq!(press(&mut state, KeyCode::Char('q')), KeyAction::Quit);

        press(&mut state, KeyCode::Char('i'));
        assert_eq!(state.mode, Mode::Insert(InsertTarget::Topic));
        assert_eq!(press(&mut state, KeyCode::Char('q')), KeyAction::Continue);
        assert_eq!(state.topic_input, "q");
    }

    #[test]
    fn escape_returns_to_the_owning_surface() {
        let mut state = AppState::default();
        press(&mut state, KeyCode::Char('a'));
        assert_eq!(state.mode, Mode::ChatOverlay);
        press(&mut state, KeyCode::Char('i'));
        assert_eq!(state.mode, Mode::Insert(InsertTarget::Chat));
        press(&mut state, KeyCode::Esc);
        assert_eq!(state.mode, Mode::ChatOverlay);
        press(&mut state, KeyCode::Esc);
        assert_eq!(state.mode, Mode::Normal);
    }

    #[test]
    fn backspace_edits_the_insert_buffer() {
        let mut state = AppState::default();
        state.mode = Mode::Insert(InsertTarget::Chat);
        for c in "hola".chars() {
            press(&mut state, KeyCode::Char(c));
        }
        press(&mut state, KeyCode::Backspace);
        assert_eq!(state.chat.input, "hol");
    }

    #[test]
    fn diagnosis_digit_keys_answer_the_cursor_question() {
        let mut state = AppState::default();
        state.diagnosis.questions = vec![mentor_core::types::DiagnosisQuestion {
            id: 1,
            question: "p".into(),
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_answer: 2,
        }];
        state.diagnosis.answers = vec![None];

        press(&mut state, KeyCode::Char('3'));
        assert_eq!(state.diagnosis.answers[0], Some(2));
        // Out of range for a 3-option question.
        press(&mut state, KeyCode::Char('9'));
        assert_eq!(state.diagnosis.answers[0], Some(2));
    }

    #[test]
    fn quiz_submit_rings_the_bell() {
        let mut state = AppState::default();
        state.step = FlowStep::CourseView;
        state.course = Some(crate::app::CourseViewState::new(
            "t".into(),
            "```quiz\n[{\"question\": \"q\", \"options\": [\"a\", \"b\"], \
             \"correctAnswer\": 0, \"explanation\": \"e\"}]\n```",
        ));

        press(&mut state, KeyCode::Char('2'));
        press(&mut state, KeyCode::Enter);
        assert!(state.bell_pending);
        let course = state.course.as_ref().unwrap();
        assert!(course.quizzes[0].is_submitted());
    }

    #[test]
    fn history_tab_switches_and_resets_the_selection() {
        let mut state = AppState::default();
        press(&mut state, KeyCode::Char('r'));
        assert_eq!(state.mode, Mode::HistoryOverlay);
        assert_eq!(state.history_list.selected(), Some(0));

        press(&mut state, KeyCode::Tab);
        assert_eq!(state.history_tab, mentor_core::types::HistorySource::Qa);
        assert_eq!(state.history_list.selected(), Some(0));
    }

    #[test]
    fn list_selection_clamps_at_both_ends() {
        let mut list = ratatui::widgets::ListState::default();
        list.select(Some(0));
        move_selection(&mut list, 3, -1);
        assert_eq!(list.selected(), Some(0));
        move_selection(&mut list, 3, 1);
        assert_eq!(list.selected(), Some(1));
        move_selection(&mut list, 3, 1);
        move_selection(&mut list, 3, 1);
        assert_eq!(list.selected(), Some(2), "clamped at the last entry");
    }

    #[test]
    fn help_overlay_toggles_with_question_mark() {
        let mut state = AppState::default();
        press(&mut state, KeyCode::Char('?'));
        assert_eq!(state.mode, Mode::HelpOverlay);
        press(&mut state, KeyCode::Char('j'));
        assert_eq!(state.help_scroll, 1);
        press(&mut state, KeyCode::Char('?'));
        assert_eq!(state.mode, Mode::Normal);
    }
}
