//! Request and result types exchanged between the UI and the generation worker.
//!
//! The worker owns the HTTP client; all communication is via channels:
//! `GenRequest` in, `AppEvent::GenResult` out.

use mentor_core::types::{
    AnsweredQuestion, ChatMessage, CourseContent, DiagnosisQuestion, KnowledgeFile, UserLevel,
};

/// A single generation request, carrying everything the worker needs so it
/// never has to reach back into UI state.
///
/// `generation` is the flow generation counter at send time — the result is
/// stamped with the same value so the receiver can discard responses that
/// arrive after the flow has moved on.
#[derive(Debug)]
pub struct GenRequest {
    pub generation: u64,
    pub kind: GenRequestKind,
    /// Snapshot of the attached knowledge files at send time.
    pub files: Vec<KnowledgeFile>,
}

/// The six operations the generation client supports.
#[derive(Debug)]
pub enum GenRequestKind {
    DiagnosisQuestions,
    EvaluateLevel { answers: Vec<AnsweredQuestion> },
    Pillars { topic: String, level: UserLevel },
    Variations { pillar: String, level: UserLevel },
    Course { variation: String, level: UserLevel },
    ChatReply { message: String, history: Vec<ChatMessage> },
}

impl GenRequestKind {
    /// The context a result for this request will be tagged with.
    pub fn context(&self) -> RequestContext {
        match self {
            GenRequestKind::DiagnosisQuestions => RequestContext::Diagnosis,
            GenRequestKind::EvaluateLevel { .. } => RequestContext::Level,
            GenRequestKind::Pillars { .. } => RequestContext::Pillars,
            GenRequestKind::Variations { .. } => RequestContext::Variations,
            GenRequestKind::Course { .. } => RequestContext::Course,
            GenRequestKind::ChatReply { .. } => RequestContext::Chat,
        }
    }
}

/// Which flow action a result belongs to. Drives dispatch in
/// `AppState::apply_gen_result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestContext {
    Diagnosis,
    Level,
    Pillars,
    Variations,
    Course,
    Chat,
}

/// What a successful generation call produced.
#[derive(Debug)]
pub enum GenOutcome {
    Questions(Vec<DiagnosisQuestion>),
    Level(UserLevel),
    Pillars(Vec<String>),
    Variations(Vec<String>),
    Course(CourseContent),
    ChatReply(String),
}

/// The payload sent back to the main loop as `AppEvent::GenResult`.
///
/// Boxed at the event-enum level to keep `AppEvent` small.
#[derive(Debug)]
pub struct GenResultPayload {
    /// The generation counter value the originating request carried.
    pub generation: u64,
    pub context: RequestContext,
    pub result: Result<GenOutcome, GenError>,
}

/// Errors from the generation client.
///
/// All calls are single-attempt; retry is a user action. `EvaluateLevel` never
/// surfaces any of these — it degrades to `Beginner` inside the client.
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("service returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("service returned an empty response")]
    EmptyResponse,
    #[error("unexpected response shape: {0}")]
    Schema(String),
    #[error("no API key configured (set GEMINI_API_KEY or api_key in config.toml)")]
    MissingApiKey,
}
