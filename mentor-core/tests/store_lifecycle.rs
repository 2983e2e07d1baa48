//! Integration test for the key-value store lifecycle.
//!
//! Exercises: open_store, migrate, history load/save with the immediate-repeat
//! guard, score load/save, and recovery from malformed stored values.

use mentor_core::db;
use mentor_core::types::{push_history, HistorySource};

fn temp_store_path() -> String {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.keep().join("test.db");
    path.to_string_lossy().to_string()
}

#[tokio::test]
async fn full_store_lifecycle() {
    let path = temp_store_path();
    let conn = db::open_store(&path).await.unwrap();

    // Verify schema_version = 1
    let version: i64 = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row(
                "SELECT MAX(version) FROM schema_version",
                [],
                |r| r.get(0),
            )?)
        })
        .await
        .unwrap();
    assert_eq!(version, 1, "schema_version should be 1");

    // Verify WAL mode
    let journal: String = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(
                db.query_row("PRAGMA journal_mode", [], |r| r.get(0))?,
            )
        })
        .await
        .unwrap();
    assert_eq!(journal, "wal", "journal_mode should be wal");

    // Fresh store: empty history, zero score.
    assert!(db::load_history(&conn).await.unwrap().is_empty());
    assert_eq!(db::load_score(&conn).await.unwrap(), 0);

    // Write some history through the guard and persist it.
    let mut logs = Vec::new();
    assert!(push_history(&mut logs, "medallion architecture", HistorySource::Course));
    assert!(push_history(&mut logs, "what is DAX?", HistorySource::Qa));
    assert!(
        !push_history(&mut logs, "what is DAX?", HistorySource::Qa),
        "immediate repeat must be rejected"
    );
    db::save_history(&conn, &logs).await.unwrap();

    // Score is monotonically incremented and written through each time.
    let mut score = db::load_score(&conn).await.unwrap();
    for _ in 0..3 {
        score += 10;
        db::save_score(&conn, score).await.unwrap();
    }
    assert_eq!(score, 30);

    // Simulate reload: a second connection sees the persisted state.
    let conn2 = db::open_store(&path).await.unwrap();
    let reloaded = db::load_history(&conn2).await.unwrap();
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded[0].text, "what is DAX?", "newest first");
    assert_eq!(reloaded[0].source, HistorySource::Qa);
    assert_eq!(db::load_score(&conn2).await.unwrap(), 30);
}

#[tokio::test]
async fn malformed_stored_values_degrade_to_defaults() {
    let path = temp_store_path();
    let conn = db::open_store(&path).await.unwrap();

    // Corrupt both entries directly.
    conn.call(|db| {
        db.execute_batch(
            "INSERT INTO kv_store (key, value) VALUES ('history', 'not json');
             INSERT INTO kv_store (key, value) VALUES ('score', 'forty two');",
        )?;
        Ok::<_, rusqlite::Error>(())
    })
    .await
    .unwrap();

    // Both loads recover silently with empty/zero defaults.
    assert!(db::load_history(&conn).await.unwrap().is_empty());
    assert_eq!(db::load_score(&conn).await.unwrap(), 0);
}

#[tokio::test]
async fn negative_stored_score_resets_to_zero() {
    let path = temp_store_path();
    let conn = db::open_store(&path).await.unwrap();

    db::save_score(&conn, 50).await.unwrap();
    conn.call(|db| {
        db.execute("UPDATE kv_store SET value = '-5' WHERE key = 'score'", [])?;
        Ok::<_, rusqlite::Error>(())
    })
    .await
    .unwrap();

    assert_eq!(db::load_score(&conn).await.unwrap(), 0);
}

#[tokio::test]
async fn save_history_overwrites_previous_value() {
    let path = temp_store_path();
    let conn = db::open_store(&path).await.unwrap();

    let mut logs = Vec::new();
    push_history(&mut logs, "first", HistorySource::Course);
    db::save_history(&conn, &logs).await.unwrap();
    push_history(&mut logs, "second", HistorySource::Course);
    db::save_history(&conn, &logs).await.unwrap();

    let reloaded = db::load_history(&conn).await.unwrap();
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded[0].text, "second");
    assert_eq!(reloaded[1].text, "first");
}
