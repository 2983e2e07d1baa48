//! UI rendering module for mentor.
//!
//! This is the module root for `ui/`. It re-exports `render()` as the single
//! entry point called by the event loop's `terminal.draw()` closure.
//!
//! Layout arithmetic and chrome live in `layout.rs`. Each flow step and each
//! overlay has its own renderer module; `keybindings.rs` is the input-side
//! counterpart that mutates the state these modules draw.

mod layout;
pub mod chat;
pub mod course_view;
pub mod diagnosis;
pub mod help;
pub mod history;
pub mod keybindings;
pub mod knowledge;
pub mod steps;

use ratatui::Frame;

use crate::app::{AppState, FlowStep, Mode};
use crate::theme::Theme;
use layout::{compute_layout, render_error_banner, render_header, render_loading,
    render_status_bar};

/// Renders one complete frame: header, current step (or loading overlay),
/// status bar, and any active overlay on top.
///
/// Called exactly once per `AppEvent::Render` inside `terminal.draw()`. This
/// is the only location where `terminal.draw()` is called in the application —
/// never call it from anywhere else.
pub fn render(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    let [header, mut content, status_bar] = compute_layout(frame);

    render_header(frame, header, state, theme);

    // Error banner claims the first content row when present.
    if let Some(message) = state.error.clone() {
        if content.height > 1 {
            let banner = ratatui::layout::Rect { height: 1, ..content };
            render_error_banner(frame, banner, &message, theme);
            content.y += 1;
            content.height -= 1;
        }
    }

    if state.loading {
        render_loading(frame, content, state, theme);
    } else {
        match state.step {
            FlowStep::Diagnosis => diagnosis::render(frame, content, state, theme),
            FlowStep::InputTopic => steps::render_input_topic(frame, content, state, theme),
            FlowStep::SelectPillar => steps::render_pillars(frame, content, state, theme),
            FlowStep::SelectVariation => steps::render_variations(frame, content, state, theme),
            FlowStep::CourseView => course_view::render(frame, content, state, theme),
        }
    }

    render_status_bar(frame, status_bar, state, theme);

    // Overlays render after the base frame so they sit on top. Insert mode
    // keeps its owning overlay visible.
    match state.mode {
        Mode::ChatOverlay | Mode::Insert(crate::app::InsertTarget::Chat) => {
            chat::render_overlay(frame, state, theme);
        }
        Mode::HistoryOverlay => history::render_overlay(frame, state, theme),
        Mode::KnowledgeOverlay | Mode::Insert(crate::app::InsertTarget::KnowledgePath) => {
            knowledge::render_overlay(frame, state, theme);
        }
        Mode::HelpOverlay => help::render_overlay(frame, state, theme),
        _ => {}
    }
}
