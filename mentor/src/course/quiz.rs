//! Per-question state machine for the embedded course quizzes.
//!
//! Each question advances `Unanswered → Selected → Submitted` and never moves
//! backwards: re-selection is free until submit, submit without a selection is
//! a no-op, and after submit the selection locks so the explanation stays tied
//! to what was actually answered.

use crate::course::lexer::QuizItem;

/// Where a single question is in its answer lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Unanswered,
    /// An option is highlighted but not yet committed.
    Selected(usize),
    /// Committed; `selected` is locked for the explanation display.
    Submitted { selected: usize },
}

/// Runtime state for one quiz question.
///
/// The immutable question definition stays in the lexed document; this holds
/// only what the user has done to it.
#[derive(Debug, Clone)]
pub struct QuizState {
    pub phase: QuizPhase,
    /// Remaining logic ticks of the wrong-answer shake highlight.
    /// Set on a wrong submit and decremented once per 250 ms tick.
    pub shake_ticks: u8,
}

/// Shake duration in logic ticks (2 × 250 ms ≈ 500 ms).
const SHAKE_TICKS: u8 = 2;

impl Default for QuizState {
    fn default() -> Self {
        Self { phase: QuizPhase::Unanswered, shake_ticks: 0 }
    }
}

impl QuizState {
    /// Moves the highlighted option, ignoring out-of-range indices and any
    /// input after submit.
    pub fn select(&mut self, index: usize, item: &QuizItem) {
        if index >= item.options.len() {
            return;
        }
        match self.phase {
            QuizPhase::Unanswered | QuizPhase::Selected(_) => {
                self.phase = QuizPhase::Selected(index);
            }
            QuizPhase::Submitted { .. } => {}
        }
    }

    /// Commits the current selection.
    ///
    /// Returns `Some(correct)` when a submit actually happened, `None` when
    /// there was nothing to submit (no selection, or already submitted). A
    /// wrong answer starts the shake highlight.
    pub fn submit(&mut self, item: &QuizItem) -> Option<bool> {
        let QuizPhase::Selected(selected) = self.phase else {
            return None;
        };
        self.phase = QuizPhase::Submitted { selected };
        let correct = selected == item.correct_answer;
        if !correct {
            self.shake_ticks = SHAKE_TICKS;
        }
        Some(correct)
    }

    /// Decays the shake highlight; called once per logic tick.
    pub fn tick(&mut self) {
        self.shake_ticks = self.shake_ticks.saturating_sub(1);
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.phase, QuizPhase::Submitted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> QuizItem {
        serde_json::from_str(
            r#"{"question": "q", "options": ["a", "b", "c"], "correctAnswer": 1, "explanation": "e"}"#,
        )
        .unwrap()
    }

    #[test]
    fn submit_without_selection_is_a_noop() {
        let mut state = QuizState::default();
        assert_eq!(state.submit(&item()), None);
        assert_eq!(state.phase, QuizPhase::Unanswered);
    }

    #[test]
    fn reselection_is_free_until_submit() {
        let item = item();
        let mut state = QuizState::default();
        state.select(0, &item);
        state.select(2, &item);
        assert_eq!(state.phase, QuizPhase::Selected(2));
    }

    #[test]
    fn selection_locks_after_submit() {
        let item = item();
        let mut state = QuizState::default();
        state.select(1, &item);
        assert_eq!(state.submit(&item), Some(true));
        state.select(0, &item);
        assert_eq!(state.phase, QuizPhase::Submitted { selected: 1 });
        // A second submit is also a no-op.
        assert_eq!(state.submit(&item), None);
    }

    #[test]
    fn wrong_submit_starts_shake_that_decays() {
        let item = item();
        let mut state = QuizState::default();
        state.select(0, &item);
        assert_eq!(state.submit(&item), Some(false));
        assert!(state.shake_ticks > 0);
        state.tick();
        state.tick();
        assert_eq!(state.shake_ticks, 0);
        state.tick();
        assert_eq!(state.shake_ticks, 0);
    }

    #[test]
    fn out_of_range_selection_is_ignored() {
        let item = item();
        let mut state = QuizState::default();
        state.select(7, &item);
        assert_eq!(state.phase, QuizPhase::Unanswered);
    }
}
