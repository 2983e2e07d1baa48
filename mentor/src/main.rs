//! mentor — AI tutoring TUI for the Microsoft data stack.
//!
//! Entry point for the `mentor` binary. Wires together the terminal lifecycle
//! (`tui`), unified event bus (`event`), the generation worker (`gen`), the
//! persistence worker (`store` + `mentor-core`), and the renderer (`ui`).
//!
//! # Startup sequence (order matters)
//!
//! 1. Load config from XDG — read-only, safe before terminal init.
//! 2. Build the `GenClient` — a missing API key must print a readable message
//!    and exit *before* the alternate screen swallows stderr.
//! 3. `install_panic_hook()` — installed first so it is the innermost hook.
//!    Restores the terminal before the panic message prints.
//! 4. `register_sigterm()` — returns `Arc<AtomicBool>` polled in the event loop.
//! 5. Open the WAL-mode store and load history/score so the first frame is
//!    already complete — there is no separate "loading profile" state.
//! 6. `init_tui()` — enters alternate screen and enables raw mode.
//! 7. Spawn the event task and both workers, then request the diagnosis.
//!
//! # Safety
//!
//! `restore_tui()` is called after the event loop exits (normal quit, 'q' key,
//! SIGTERM, or `None` channel close). The `?` operator is only used before
//! `init_tui()` or inside the Render arm — draw errors propagate out of the
//! loop and reach `restore_tui()` after `break`. The panic hook covers
//! unexpected panics.

mod app;
mod course;
mod event;
mod gen;
mod store;
mod theme;
mod tui;
mod ui;

use std::io::Write;
use std::sync::atomic::Ordering;

use tokio::sync::mpsc;

use crate::ui::keybindings::{self, KeyAction};

/// Data directory next to the working directory: the store and the log file.
const DATA_DIR: &str = ".mentor";

/// Settings read from the config file, all optional.
struct Config {
    theme: String,
    api_key: Option<String>,
    model: Option<String>,
}

/// Returns the path to the mentor config file.
///
/// Prefers `$XDG_CONFIG_HOME/mentor/config.toml`; falls back to
/// `~/.config/mentor/config.toml` when the env var is absent.
fn config_path() -> std::path::PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(std::path::PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| std::path::PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| std::path::PathBuf::from(".config"));
    base.join("mentor").join("config.toml")
}

/// Loads `~/.config/mentor/config.toml`.
///
/// Missing file or keys fall back to defaults; a parse error is printed to
/// stderr and treated as an absent file. Never panics — config errors are
/// soft failures.
fn load_config() -> Config {
    let defaults = Config {
        theme: "catppuccin-mocha".to_owned(),
        api_key: None,
        model: None,
    };
    let path = config_path();
    let raw = match std::fs::read_to_string(&path) {
        Ok(s) => s,
        Err(_) => return defaults,
    };
    let table: toml::Table = match toml::from_str(&raw) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("mentor: config parse error in {path:?}: {e}");
            return defaults;
        }
    };
    let get = |key: &str| table.get(key).and_then(|v| v.as_str()).map(str::to_owned);
    Config {
        theme: get("theme").unwrap_or(defaults.theme),
        api_key: get("api_key"),
        model: get("model"),
    }
}

/// Initialises the tracing subscriber writing to `.mentor/mentor.log`.
///
/// The TUI owns stderr, so diagnostics go to a file. ANSI is off — the log is
/// meant for `tail -f` and bug reports, not a terminal pager.
fn init_logging() -> std::io::Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(format!("{DATA_DIR}/mentor.log"))?;
    tracing_subscriber::fmt()
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Step 0: config and logging — read-only / file-only, safe before the
    // terminal is touched.
    let config = load_config();
    let theme = theme::Theme::from_name(&config.theme);
    std::fs::create_dir_all(DATA_DIR)?;
    init_logging()?;

    // Step 1: the generation client. Built before init_tui() so a missing key
    // prints a readable message instead of vanishing into the alternate screen.
    let api_key = std::env::var("GEMINI_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty())
        .or(config.api_key)
        .unwrap_or_default();
    let model = config
        .model
        .unwrap_or_else(|| gen::client::DEFAULT_MODEL.to_owned());
    let client = match gen::client::GenClient::new(api_key, model) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("mentor: {e}");
            eprintln!("Set GEMINI_API_KEY or add api_key to {:?}.", config_path());
            std::process::exit(1);
        }
    };

    // Step 2: panic hook installed first — innermost hook restores the terminal.
    tui::install_panic_hook();

    // Step 3: SIGTERM flag — polled in the 50ms heartbeat arm below.
    let term_flag = tui::register_sigterm();

    // Step 4: open the store and load the persisted profile before the first
    // frame.
    let to_io = |e: tokio_rusqlite::Error| std::io::Error::other(e);
    let conn = mentor_core::db::open_store(&format!("{DATA_DIR}/mentor.db"))
        .await
        .map_err(to_io)?;
    let history = mentor_core::db::load_history(&conn).await.map_err(to_io)?;
    let score = mentor_core::db::load_score(&conn).await.map_err(to_io)?;

    // Step 5: enter alternate screen and raw mode.
    let mut terminal = tui::init_tui()?;

    // Step 6: event channel plus the two worker tasks.
    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let mut rx = handler.rx;

    let (gen_tx, gen_rx) = mpsc::unbounded_channel();
    gen::worker::spawn_gen_worker(client, gen_rx, handler.tx.clone());

    let (db_tx, db_rx) = mpsc::unbounded_channel();
    store::spawn_db_worker(conn, db_rx, handler.tx.clone());

    let mut state = app::AppState {
        history,
        score,
        gen_tx: Some(gen_tx),
        db_tx: Some(db_tx),
        ..app::AppState::default()
    };

    // Step 7: kick off the diagnosis fetch — the first frame shows its
    // loading overlay.
    state.request_diagnosis();

    // Event loop — exits only via `break`, never via `?` (except the Render
    // arm, whose draw errors break out and still reach restore_tui()).
    'event_loop: loop {
        tokio::select! {
            // Heartbeat: guarantees SIGTERM is checked at least every 50ms,
            // even when no crossterm/tick/render events arrive.
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(event::AppEvent::Render) => {
                        // Exactly one draw() call per Render event — never
                        // elsewhere.
                        terminal.draw(|frame| ui::render(frame, &mut state, &theme))?;
                        if state.bell_pending {
                            state.bell_pending = false;
                            let mut err = std::io::stderr();
                            let _ = err.write_all(b"\x07");
                            let _ = err.flush();
                        }
                    }
                    Some(event::AppEvent::Key(key)) => {
                        if keybindings::handle_key(&mut state, key) == KeyAction::Quit {
                            break 'event_loop;
                        }
                    }
                    Some(event::AppEvent::Mouse(mouse)) => {
                        keybindings::handle_mouse(&mut state, mouse);
                    }
                    Some(event::AppEvent::Tick) => state.tick(),
                    Some(event::AppEvent::GenResult(payload)) => {
                        state.apply_gen_result(*payload);
                    }
                    Some(event::AppEvent::Resize(_, _)) => {
                        // Handled automatically on the next Render:
                        // frame.area() returns the new size.
                    }
                    Some(event::AppEvent::DbResult) => {
                        // Fire-and-forget writes; failures were already logged
                        // by the worker.
                    }
                    Some(event::AppEvent::Quit) | None => break 'event_loop,
                    Some(_) => {}
                }
                // Check SIGTERM after every event too, not just on the
                // heartbeat, so quit latency is at most one event cycle.
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
        }
    }

    // Restore the terminal at the single exit point of the loop. Covers
    // normal quit, 'q', SIGTERM, and channel close; the panic hook handles
    // the panic path.
    tui::restore_tui()?;
    Ok(())
}
