//! Color theme system for mentor.
//!
//! A `Theme` holds named `ratatui::style::Color` fields covering every UI surface
//! mentor renders. Two built-in themes are provided:
//!
//! - `dark` — uses ANSI 16 colors (`Color::Reset`, `Color::DarkGray`, etc.) so it
//!   works on any terminal including 256-color SSH sessions with no truecolor support.
//! - `catppuccin_mocha` — Catppuccin Mocha palette in RGB; requires truecolor.

use ratatui::style::Color;

/// All color values used across mentor's UI surfaces.
///
/// Every field is a `ratatui::style::Color`. Callers use `theme.field` directly
/// inside `Style::default().fg(theme.border_active)`.
#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    /// Border color for the currently focused panel or active overlay.
    pub border_active: Color,
    /// Border color for unfocused panels.
    pub border_inactive: Color,

    // Header
    /// Application title in the header row.
    pub header_title: Color,
    /// Level badge in the header row.
    pub header_level: Color,
    /// XP score badge in the header row.
    pub header_score: Color,

    // Flow steps
    /// Accent for step titles and the selected list row.
    pub step_accent: Color,
    /// Body text in step views.
    pub step_text: Color,
    /// Dimmed hint text (placeholders, suggestions, shortcuts).
    pub hint: Color,
    /// Error banner foreground.
    pub error: Color,

    // Course view
    /// H1/H2 heading lines.
    pub heading: Color,
    /// H3+ heading lines.
    pub subheading: Color,
    /// Fenced code block body.
    pub code: Color,
    /// Blockquote lines.
    pub quote: Color,
    /// Filled portion of a progress bar.
    pub progress_filled: Color,
    /// Empty portion of a progress bar.
    pub progress_empty: Color,
    /// Diagram placeholder lines.
    pub diagram: Color,
    /// Simulated resource citation lines.
    pub resource: Color,
    /// Inline glossary terms.
    pub glossary: Color,

    // Quiz
    /// The option currently under the cursor (before submit).
    pub quiz_selected: Color,
    /// The correct option after submit.
    pub quiz_correct: Color,
    /// A wrong chosen option after submit (also the shake highlight).
    pub quiz_incorrect: Color,
    /// Explanation panel after submit.
    pub quiz_explanation: Color,

    // Chat
    /// User-authored chat messages.
    pub chat_user: Color,
    /// Assistant-authored chat messages.
    pub chat_assistant: Color,

    // Status bar
    /// Status bar background.
    pub status_bar_bg: Color,
    /// Status bar foreground (general text).
    pub status_bar_fg: Color,
    /// Mode indicator color when in NORMAL mode.
    pub status_mode_normal: Color,
    /// Mode indicator color when in INSERT mode.
    pub status_mode_insert: Color,

    // General
    /// Application background (used for clearing areas).
    pub background: Color,
}

impl Theme {
    /// Returns the built-in dark theme using ANSI 16 colors.
    ///
    /// Works on all terminals: 16-color, 256-color, and truecolor. Suitable
    /// as the default when no config is present or color capability is unknown.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            header_title: Color::Cyan,
            header_level: Color::Yellow,
            header_score: Color::Green,

            step_accent: Color::Cyan,
            step_text: Color::Reset,
            hint: Color::DarkGray,
            error: Color::Red,

            heading: Color::Cyan,
            subheading: Color::Blue,
            code: Color::Green,
            quote: Color::DarkGray,
            progress_filled: Color::Green,
            progress_empty: Color::DarkGray,
            diagram: Color::Magenta,
            resource: Color::Yellow,
            glossary: Color::Cyan,

            quiz_selected: Color::Cyan,
            quiz_correct: Color::Green,
            quiz_incorrect: Color::Red,
            quiz_explanation: Color::Yellow,

            chat_user: Color::Cyan,
            chat_assistant: Color::Green,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_insert: Color::Green,

            background: Color::Reset,
        }
    }

    /// Returns the Catppuccin Mocha theme using RGB truecolor values.
    ///
    /// Requires a truecolor terminal. Falls back gracefully in ratatui — colors
    /// degrade to the nearest ANSI 256-color approximation on non-truecolor terms,
    /// but visual fidelity is reduced. Use `dark()` on SSH or 256-color terminals.
    ///
    /// Palette source: <https://github.com/catppuccin/catppuccin> Mocha variant.
    pub fn catppuccin_mocha() -> Self {
        // Catppuccin Mocha palette (selected subset)
        let green = Color::Rgb(166, 227, 161);    // #a6e3a1
        let red = Color::Rgb(243, 139, 168);      // #f38ba8
        let yellow = Color::Rgb(249, 226, 175);   // #f9e2af
        let blue = Color::Rgb(137, 180, 250);     // #89b4fa
        let teal = Color::Rgb(148, 226, 213);     // #94e2d5
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let mauve = Color::Rgb(203, 166, 247);    // #cba6f7
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface1 = Color::Rgb(69, 71, 90);    // #45475a
        let base = Color::Rgb(30, 30, 46);        // #1e1e2e
        let text = Color::Rgb(205, 214, 244);     // #cdd6f4
        let peach = Color::Rgb(250, 179, 135);    // #fab387

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            header_title: lavender,
            header_level: peach,
            header_score: green,

            step_accent: blue,
            step_text: text,
            hint: overlay1,
            error: red,

            heading: lavender,
            subheading: blue,
            code: green,
            quote: overlay1,
            progress_filled: green,
            progress_empty: surface1,
            diagram: mauve,
            resource: yellow,
            glossary: teal,

            quiz_selected: blue,
            quiz_correct: green,
            quiz_incorrect: red,
            quiz_explanation: yellow,

            chat_user: blue,
            chat_assistant: green,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_insert: green,

            background: base,
        }
    }

    /// Resolves a theme name string to the corresponding built-in theme.
    ///
    /// Unknown names fall back to `dark()` so a typo in config never prevents
    /// startup. The fallback is logged (not a hard error).
    ///
    /// # Arguments
    ///
    /// * `name` — theme name from config, e.g. `"dark"` or `"catppuccin-mocha"`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!(theme = %other, "unknown theme, falling back to 'dark'");
                Self::dark()
            }
        }
    }
}
