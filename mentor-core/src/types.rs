use std::fmt;
use std::path::Path;

use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The three proficiency levels a learner can be assigned.
///
/// Wire labels are the Spanish strings the generation service is
/// schema-constrained to (`Principiante` / `Intermedio` / `Avanzado`);
/// the enum itself is the neutral form used everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl UserLevel {
    /// Returns the label used on the wire and inside course metadata tags.
    pub fn wire_label(self) -> &'static str {
        match self {
            UserLevel::Beginner => "Principiante",
            UserLevel::Intermediate => "Intermedio",
            UserLevel::Advanced => "Avanzado",
        }
    }

    /// Parses a wire label back into a level. Accepts both the Spanish wire
    /// labels and the English names, case-insensitively.
    pub fn from_wire_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "principiante" | "beginner" => Some(UserLevel::Beginner),
            "intermedio" | "intermediate" => Some(UserLevel::Intermediate),
            "avanzado" | "advanced" => Some(UserLevel::Advanced),
            _ => None,
        }
    }
}

impl fmt::Display for UserLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UserLevel::Beginner => "Beginner",
            UserLevel::Intermediate => "Intermediate",
            UserLevel::Advanced => "Advanced",
        };
        f.write_str(name)
    }
}

/// One multiple-choice question from the level diagnosis.
///
/// Immutable once fetched. `correct_answer` is an index into `options`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisQuestion {
    pub id: u32,
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: usize,
}

/// A question paired with the option text the user chose, as sent to the
/// level-evaluation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    pub question: String,
    pub answer: String,
}

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message in the Q&A chat. Messages are append-only within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String, // UUID v4 text
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Which feature produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HistorySource {
    Course,
    Qa,
}

/// A persisted record of a past topic submission or chat question.
///
/// Stored newest-first as a JSON array under the `history` key (see `db`).
/// `timestamp` serializes as an ISO-8601 string via chrono.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryLog {
    pub id: String, // UUID v4 text
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub source: HistorySource,
}

impl HistoryLog {
    pub fn new(text: impl Into<String>, source: HistorySource) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            timestamp: Utc::now(),
            source,
        }
    }
}

/// Prepends a new entry to `logs` unless the current newest entry already has
/// the same text and source (spam guard against immediate repetition — not a
/// general dedup).
///
/// Returns `true` when the entry was inserted.
pub fn push_history(logs: &mut Vec<HistoryLog>, text: &str, source: HistorySource) -> bool {
    if let Some(newest) = logs.first() {
        if newest.source == source && newest.text == text {
            return false;
        }
    }
    logs.insert(0, HistoryLog::new(text, source));
    true
}

/// Error raised when a file cannot be attached to the knowledge base.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeFileError {
    #[error("only PDF files are supported")]
    UnsupportedType,
    #[error("could not read file: {0}")]
    Io(#[from] std::io::Error),
}

/// A user-supplied reference document attached as generation context.
///
/// Held in memory for the session only; the payload is base64 so it can be
/// placed directly into an `inlineData` request part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeFile {
    pub name: String,
    pub mime_type: String,
    pub data: String, // base64
}

impl KnowledgeFile {
    /// Reads `path` and builds an attachment from it.
    ///
    /// Only PDF files are accepted; anything else is rejected before any
    /// bytes are read, leaving caller state untouched.
    pub fn from_path(path: &Path) -> Result<Self, KnowledgeFileError> {
        let is_pdf = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if !is_pdf {
            return Err(KnowledgeFileError::UnsupportedType);
        }
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_owned());
        Ok(Self {
            name,
            mime_type: "application/pdf".to_owned(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        })
    }
}

/// A generated course: the chosen variation as title plus the raw markdown
/// body following the course tag grammar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseContent {
    pub title: String,
    pub markdown: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_guard_rejects_immediate_repeat() {
        let mut logs = Vec::new();
        assert!(push_history(&mut logs, "fabric pipelines", HistorySource::Course));
        assert!(!push_history(&mut logs, "fabric pipelines", HistorySource::Course));
        assert_eq!(logs.len(), 1);
    }

    #[test]
    fn history_guard_allows_same_text_from_other_source() {
        let mut logs = Vec::new();
        assert!(push_history(&mut logs, "what is a lakehouse?", HistorySource::Course));
        assert!(push_history(&mut logs, "what is a lakehouse?", HistorySource::Qa));
        assert_eq!(logs.len(), 2);
        // Newest first.
        assert_eq!(logs[0].source, HistorySource::Qa);
    }

    #[test]
    fn history_guard_allows_repeat_after_interleaving() {
        let mut logs = Vec::new();
        assert!(push_history(&mut logs, "a", HistorySource::Course));
        assert!(push_history(&mut logs, "b", HistorySource::Course));
        assert!(push_history(&mut logs, "a", HistorySource::Course));
        assert_eq!(logs.len(), 3);
    }

    #[test]
    fn level_wire_labels_round_trip() {
        for level in [UserLevel::Beginner, UserLevel::Intermediate, UserLevel::Advanced] {
            assert_eq!(UserLevel::from_wire_label(level.wire_label()), Some(level));
        }
        assert_eq!(UserLevel::from_wire_label("  avanzado "), Some(UserLevel::Advanced));
        assert_eq!(UserLevel::from_wire_label("expert"), None);
    }

    #[test]
    fn history_source_serializes_uppercase() {
        let log = HistoryLog::new("t", HistorySource::Qa);
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["source"], "QA");
        // Timestamp must be an ISO-8601 string, not a number.
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn non_pdf_attachment_is_rejected_without_reading() {
        let err = KnowledgeFile::from_path(Path::new("/nonexistent/notes.txt")).unwrap_err();
        assert!(matches!(err, KnowledgeFileError::UnsupportedType));
    }
}
