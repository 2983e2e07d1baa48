use std::time::Duration;

use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::schema::{KEY_HISTORY, KEY_SCORE};
use crate::types::HistoryLog;

/// Opens (or creates) the key-value store at `path`, configures WAL mode,
/// and applies schema migrations via the `schema_version` table.
///
/// This function is the single entry point for all store connections.
/// It sets `busy_timeout` via the `Connection` method (not a PRAGMA string) to
/// ensure the setting takes effect regardless of pragma caching.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the file cannot be opened, WAL
/// configuration fails, or schema DDL fails.
pub async fn open_store(path: &str) -> Result<Connection, tokio_rusqlite::Error> {
    let conn = Connection::open(path).await?;

    // Step 1: WAL pragmas — connection-level settings re-applied on every open.
    conn.call(|db| {
        db.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;",
        )?;
        db.busy_timeout(Duration::from_secs(5))?;
        Ok(())
    })
    .await?;

    // Step 2: Checkpoint any leftover WAL from a previous run.
    conn.call(|db| {
        db.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    })
    .await?;

    // Step 3: Apply schema migrations via the schema_version versioning system.
    conn.call(|db| {
        crate::schema::migrate(db)?;
        Ok(())
    })
    .await?;

    Ok(conn)
}

/// Reads the raw string value stored under `key`, if any.
async fn get_value(conn: &Connection, key: &'static str) -> Result<Option<String>, tokio_rusqlite::Error> {
    conn.call(move |db| {
        let value: Option<String> = db
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                rusqlite::params![key],
                |r| r.get(0),
            )
            .optional()?;
        Ok(value)
    })
    .await
}

/// Upserts `value` under `key` inside a `BEGIN IMMEDIATE` transaction.
async fn put_value(
    conn: &Connection,
    key: &'static str,
    value: String,
) -> Result<(), tokio_rusqlite::Error> {
    conn.call(move |db| {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, &value],
        )?;
        tx.commit()?;
        Ok(())
    })
    .await
}

/// Loads the history log from the store.
///
/// A missing entry yields an empty list. A present-but-malformed JSON value is
/// logged and also yields an empty list — storage is best-effort and a corrupt
/// entry must never prevent startup.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` only for database-level failures, not for
/// malformed content.
pub async fn load_history(conn: &Connection) -> Result<Vec<HistoryLog>, tokio_rusqlite::Error> {
    let raw = get_value(conn, KEY_HISTORY).await?;
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    match serde_json::from_str(&raw) {
        Ok(logs) => Ok(logs),
        Err(e) => {
            tracing::warn!(error = %e, "stored history is not valid JSON, starting empty");
            Ok(Vec::new())
        }
    }
}

/// Writes the full history log to the store as a JSON array.
///
/// Called after every mutation (write-through, no batching).
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if serialization or the upsert fails.
pub async fn save_history(
    conn: &Connection,
    logs: &[HistoryLog],
) -> Result<(), tokio_rusqlite::Error> {
    let json = serde_json::to_string(logs)
        .map_err(|e| {
            tokio_rusqlite::Error::Error(rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        })?;
    put_value(conn, KEY_HISTORY, json).await
}

/// Loads the score counter, defaulting to zero.
///
/// A missing or malformed stored value (anything that does not parse as a
/// base-10 integer) is logged and treated as zero.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` only for database-level failures.
pub async fn load_score(conn: &Connection) -> Result<i64, tokio_rusqlite::Error> {
    let raw = get_value(conn, KEY_SCORE).await?;
    let Some(raw) = raw else {
        return Ok(0);
    };
    match raw.trim().parse::<i64>() {
        Ok(score) if score >= 0 => Ok(score),
        _ => {
            tracing::warn!(value = %raw, "stored score is not a non-negative integer, resetting to 0");
            Ok(0)
        }
    }
}

/// Writes the score counter as a base-10 string.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the upsert fails.
pub async fn save_score(conn: &Connection, score: i64) -> Result<(), tokio_rusqlite::Error> {
    put_value(conn, KEY_SCORE, score.to_string()).await
}
