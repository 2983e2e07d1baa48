//! Background task that owns the key-value store connection.
//!
//! Writes are fire-and-forget from the UI's perspective: `DbRequest` in,
//! `AppEvent::DbResult` out once the write has landed. Failures are logged and
//! never surface — persistence is best-effort and must not interrupt a lesson.

use mentor_core::db;
use mentor_core::types::HistoryLog;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_rusqlite::Connection;

use crate::event::AppEvent;

/// A write-through persistence request.
#[derive(Debug)]
pub enum DbRequest {
    /// Replace the stored history with this full snapshot (newest first).
    SaveHistory(Vec<HistoryLog>),
    /// Replace the stored score counter.
    SaveScore(i64),
}

/// Spawns the persistence worker task.
///
/// Loops over incoming `DbRequest` messages until the channel is closed.
pub fn spawn_db_worker(
    conn: Connection,
    mut rx: UnboundedReceiver<DbRequest>,
    event_tx: UnboundedSender<AppEvent>,
) {
    tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            let outcome = match request {
                DbRequest::SaveHistory(logs) => db::save_history(&conn, &logs).await,
                DbRequest::SaveScore(score) => db::save_score(&conn, score).await,
            };
            if let Err(e) = outcome {
                tracing::warn!(error = %e, "persistence write failed");
            }
            let _ = event_tx.send(AppEvent::DbResult);
        }
    });
}
