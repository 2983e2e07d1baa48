//! Central application state for mentor.
//!
//! This module owns all mutable state: the flow step machine, the current
//! input mode, diagnosis/chat/history/knowledge sub-state, and the channels
//! into the generation and persistence workers. No ratatui rendering logic
//! lives here — `app.rs` is pure state that is read by the render module and
//! mutated by the keybinding dispatcher and by arriving worker results.
//!
//! # Stale-response guard
//!
//! Every flow transition (forward or backward) bumps `generation`. Each
//! `GenRequest` carries the counter value at send time, and
//! [`AppState::apply_gen_result`] discards any flow result whose stamp no
//! longer matches — a pillar list that arrives after the user backed out is
//! silently dropped. Chat replies bypass the guard: the conversation is
//! orthogonal to the flow and a late answer is still wanted.

use ratatui::widgets::ListState;
use tokio::sync::mpsc::UnboundedSender;

use mentor_core::types::{
    push_history, AnsweredQuestion, ChatMessage, ChatRole, DiagnosisQuestion, HistoryLog,
    HistorySource, KnowledgeFile, UserLevel,
};

use crate::course::lexer::{self, CourseBlock, QuizItem};
use crate::course::quiz::QuizState;
use crate::gen::types::{
    GenOutcome, GenRequest, GenRequestKind, GenResultPayload, RequestContext,
};
use crate::store::DbRequest;

/// Apologetic reply appended when a chat request fails.
const CHAT_APOLOGY: &str =
    "Lo siento, ha ocurrido un problema al procesar tu pregunta. Inténtalo de nuevo en un momento.";

/// Points awarded for each answered chat question.
const CHAT_REPLY_POINTS: i64 = 10;

/// The five steps of the lesson flow, in order.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FlowStep {
    #[default]
    Diagnosis,
    InputTopic,
    SelectPillar,
    SelectVariation,
    CourseView,
}

impl FlowStep {
    /// The message shown in the loading overlay while this step's fetch runs.
    pub fn loading_message(self) -> &'static str {
        match self {
            FlowStep::Diagnosis => "Analizando perfil y generando diagnóstico...",
            FlowStep::InputTopic => "Analizando arquitectura y generando pilares estratégicos...",
            FlowStep::SelectPillar => "Diseñando variaciones de lección específicas...",
            FlowStep::SelectVariation | FlowStep::CourseView => {
                "Consultando bases de conocimiento (sin salir a internet), \
                 estructurando curso y generando evaluaciones..."
            }
        }
    }
}

/// Which text buffer Insert mode is editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertTarget {
    Topic,
    Chat,
    KnowledgePath,
}

/// Input mode controlling which keybinding set is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Vim-style navigation mode (default).
    #[default]
    Normal,
    /// Text entry into one of the input buffers.
    Insert(InsertTarget),
    /// Full-screen help overlay.
    HelpOverlay,
    /// Q&A chat overlay.
    ChatOverlay,
    /// History recall overlay.
    HistoryOverlay,
    /// Knowledge-base overlay.
    KnowledgeOverlay,
}

/// State of the level diagnosis step.
#[derive(Debug, Default)]
pub struct DiagnosisState {
    pub questions: Vec<DiagnosisQuestion>,
    /// Chosen option index per question, parallel to `questions`.
    pub answers: Vec<Option<usize>>,
    /// Index of the question currently under the cursor.
    pub cursor: usize,
    /// After the first submit: answers locked, correct/incorrect shown.
    pub in_review: bool,
}

impl DiagnosisState {
    pub fn all_answered(&self) -> bool {
        !self.questions.is_empty() && self.answers.iter().all(Option::is_some)
    }
}

/// State of the Q&A chat overlay.
#[derive(Debug, Default)]
pub struct ChatState {
    pub messages: Vec<ChatMessage>,
    pub input: String,
    /// True while a reply is pending (drives the typing indicator).
    pub waiting: bool,
    pub scroll: u16,
}

/// State of the knowledge-base overlay.
#[derive(Debug, Default)]
pub struct KnowledgeState {
    pub files: Vec<KnowledgeFile>,
    pub list: ListState,
    /// Path being typed in the add-file prompt.
    pub input: String,
    /// Inline rejection/confirmation message.
    pub notice: Option<String>,
}

/// The lexed course plus all interaction state layered on top of it.
#[derive(Debug)]
pub struct CourseViewState {
    pub title: String,
    pub doc: lexer::CourseDocument,
    /// One state per quiz question, flattened across all quiz blocks.
    pub quizzes: Vec<QuizState>,
    /// `(block index, item index)` for each entry of `quizzes`.
    quiz_index: Vec<(usize, usize)>,
    /// Which flattened quiz question currently receives 1–5/Enter.
    pub active_quiz: usize,
    pub scroll: u16,
    /// Index into `doc.glossary` of the term whose tooltip is open.
    pub glossary_cursor: Option<usize>,
}

impl CourseViewState {
    pub fn new(title: String, markdown: &str) -> Self {
        let doc = lexer::lex(markdown);
        let mut quiz_index = Vec::new();
        for (b, block) in doc.blocks.iter().enumerate() {
            if let CourseBlock::Quiz(items) = block {
                for i in 0..items.len() {
                    quiz_index.push((b, i));
                }
            }
        }
        let quizzes = vec![QuizState::default(); quiz_index.len()];
        Self {
            title,
            doc,
            quizzes,
            quiz_index,
            active_quiz: 0,
            scroll: 0,
            glossary_cursor: None,
        }
    }

    /// The question definition behind flattened quiz slot `idx`.
    pub fn quiz_item(&self, idx: usize) -> Option<&QuizItem> {
        let &(b, i) = self.quiz_index.get(idx)?;
        match &self.doc.blocks[b] {
            CourseBlock::Quiz(items) => items.get(i),
            _ => None,
        }
    }

    /// Moves the active-quiz cursor forward, wrapping around.
    pub fn next_quiz(&mut self) {
        if !self.quizzes.is_empty() {
            self.active_quiz = (self.active_quiz + 1) % self.quizzes.len();
        }
    }

    /// Highlights an option on the active question.
    pub fn select_option(&mut self, option: usize) {
        let Some(item) = self.quiz_item(self.active_quiz).cloned() else { return };
        self.quizzes[self.active_quiz].select(option, &item);
    }

    /// Submits the active question. Returns `Some(correct)` when a submit
    /// happened (caller rings the terminal bell either way).
    pub fn submit_active(&mut self) -> Option<bool> {
        let item = self.quiz_item(self.active_quiz).cloned()?;
        self.quizzes[self.active_quiz].submit(&item)
    }

    /// Advances the glossary tooltip to the next term (opens it if closed),
    /// wrapping past the last term back to closed.
    pub fn cycle_glossary(&mut self) {
        if self.doc.glossary.is_empty() {
            return;
        }
        self.glossary_cursor = match self.glossary_cursor {
            None => Some(0),
            Some(i) if i + 1 < self.doc.glossary.len() => Some(i + 1),
            Some(_) => None,
        };
    }
}

/// All mutable application state, mutated by keybindings and worker results,
/// read by the render pass.
pub struct AppState {
    pub mode: Mode,
    pub step: FlowStep,
    pub level: Option<UserLevel>,

    /// Topic input buffer (Insert mode target on the topic step).
    pub topic_input: String,
    /// The committed topic the pillars were generated from.
    pub topic: String,

    pub pillars: Vec<String>,
    pub selected_pillar: Option<String>,
    pub pillar_list: ListState,

    pub variations: Vec<String>,
    pub selected_variation: Option<String>,
    pub variation_list: ListState,

    pub course: Option<CourseViewState>,

    /// True while a flow fetch is in flight; triggering keys are ignored.
    pub loading: bool,
    /// Human-readable error banner; cleared on any transition.
    pub error: Option<String>,

    pub diagnosis: DiagnosisState,
    pub chat: ChatState,

    /// Persisted request history, newest first.
    pub history: Vec<HistoryLog>,
    pub history_tab: HistorySource,
    pub history_list: ListState,

    pub knowledge: KnowledgeState,

    /// XP counter; write-through persisted on every increment.
    pub score: i64,

    /// Flow generation counter (see module docs).
    pub generation: u64,

    /// Set when the terminal bell should ring on the next render.
    pub bell_pending: bool,
    pub help_scroll: u16,
    /// Inner height of the course panel, cached after each render.
    pub course_viewport_height: u16,

    pub gen_tx: Option<UnboundedSender<GenRequest>>,
    pub db_tx: Option<UnboundedSender<DbRequest>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            step: FlowStep::default(),
            level: None,
            topic_input: String::new(),
            topic: String::new(),
            pillars: Vec::new(),
            selected_pillar: None,
            pillar_list: ListState::default(),
            variations: Vec::new(),
            selected_variation: None,
            variation_list: ListState::default(),
            course: None,
            loading: false,
            error: None,
            diagnosis: DiagnosisState::default(),
            chat: ChatState::default(),
            history: Vec::new(),
            history_tab: HistorySource::Course,
            history_list: ListState::default(),
            knowledge: KnowledgeState::default(),
            score: 0,
            generation: 0,
            bell_pending: false,
            help_scroll: 0,
            course_viewport_height: 0,
            gen_tx: None,
            db_tx: None,
        }
    }
}

impl AppState {
    // -----------------------------------------------------------------------
    // Worker plumbing
    // -----------------------------------------------------------------------

    /// Sends a flow request: bumps the generation counter, snapshots the
    /// knowledge files, and raises the loading overlay.
    fn send_flow_request(&mut self, kind: GenRequestKind) {
        self.generation += 1;
        self.loading = true;
        self.error = None;
        if let Some(ref tx) = self.gen_tx {
            let _ = tx.send(GenRequest {
                generation: self.generation,
                kind,
                files: self.knowledge.files.clone(),
            });
        }
    }

    fn persist_history(&self) {
        if let Some(ref tx) = self.db_tx {
            let _ = tx.send(DbRequest::SaveHistory(self.history.clone()));
        }
    }

    fn persist_score(&self) {
        if let Some(ref tx) = self.db_tx {
            let _ = tx.send(DbRequest::SaveScore(self.score));
        }
    }

    /// The level used in prompts before evaluation has completed.
    fn effective_level(&self) -> UserLevel {
        self.level.unwrap_or(UserLevel::Beginner)
    }

    // -----------------------------------------------------------------------
    // Diagnosis step
    // -----------------------------------------------------------------------

    /// Requests the initial diagnosis question set (called once at startup,
    /// and again on manual retry after an error).
    pub fn request_diagnosis(&mut self) {
        if self.loading {
            return;
        }
        self.send_flow_request(GenRequestKind::DiagnosisQuestions);
    }

    /// Records an answer for the question under the cursor. Ignored during
    /// review — answers are locked once revealed.
    pub fn answer_diagnosis(&mut self, option: usize) {
        if self.diagnosis.in_review {
            return;
        }
        let cursor = self.diagnosis.cursor;
        let Some(question) = self.diagnosis.questions.get(cursor) else { return };
        if option < question.options.len() {
            self.diagnosis.answers[cursor] = Some(option);
        }
    }

    /// Two-phase diagnosis submit.
    ///
    /// Blocked until every question is answered. The first submit enters the
    /// review sub-state (correct/incorrect revealed, step unchanged); the
    /// second issues the async level evaluation.
    pub fn submit_diagnosis(&mut self) {
        if self.loading || !self.diagnosis.all_answered() {
            return;
        }
        if !self.diagnosis.in_review {
            self.diagnosis.in_review = true;
            return;
        }
        let answers: Vec<AnsweredQuestion> = self
            .diagnosis
            .questions
            .iter()
            .zip(&self.diagnosis.answers)
            .map(|(q, a)| AnsweredQuestion {
                question: q.question.clone(),
                answer: q.options[a.unwrap_or(0)].clone(),
            })
            .collect();
        self.send_flow_request(GenRequestKind::EvaluateLevel { answers });
    }

    // -----------------------------------------------------------------------
    // Topic / pillar / variation steps
    // -----------------------------------------------------------------------

    /// Commits the topic input: records it to history and fetches pillars.
    /// Empty (after trimming) input is ignored.
    pub fn submit_topic(&mut self) {
        if self.loading {
            return;
        }
        let topic = self.topic_input.trim().to_owned();
        if topic.is_empty() {
            return;
        }
        self.topic = topic.clone();
        if push_history(&mut self.history, &topic, HistorySource::Course) {
            self.persist_history();
        }
        let level = self.effective_level();
        self.send_flow_request(GenRequestKind::Pillars { topic, level });
    }

    /// Commits the highlighted pillar and fetches its variations.
    pub fn select_pillar(&mut self) {
        if self.loading {
            return;
        }
        let Some(idx) = self.pillar_list.selected() else { return };
        let Some(pillar) = self.pillars.get(idx).cloned() else { return };
        self.selected_pillar = Some(pillar.clone());
        let level = self.effective_level();
        self.send_flow_request(GenRequestKind::Variations { pillar, level });
    }

    /// Commits the highlighted variation and fetches the course.
    pub fn select_variation(&mut self) {
        if self.loading {
            return;
        }
        let Some(idx) = self.variation_list.selected() else { return };
        let Some(variation) = self.variations.get(idx).cloned() else { return };
        self.selected_variation = Some(variation.clone());
        let level = self.effective_level();
        self.send_flow_request(GenRequestKind::Course { variation, level });
    }

    /// Returns exactly one step, clearing the data generated at the step
    /// being left. Also cancels any in-flight fetch (the generation bump
    /// makes its eventual result stale).
    pub fn go_back(&mut self) {
        match self.step {
            FlowStep::Diagnosis | FlowStep::InputTopic => return,
            FlowStep::SelectPillar => {
                self.pillars.clear();
                self.selected_pillar = None;
                self.pillar_list = ListState::default();
                self.step = FlowStep::InputTopic;
            }
            FlowStep::SelectVariation => {
                self.variations.clear();
                self.selected_variation = None;
                self.variation_list = ListState::default();
                self.step = FlowStep::SelectPillar;
            }
            FlowStep::CourseView => {
                self.course = None;
                self.step = FlowStep::SelectVariation;
            }
        }
        self.generation += 1;
        self.loading = false;
        self.error = None;
    }

    // -----------------------------------------------------------------------
    // Chat
    // -----------------------------------------------------------------------

    /// Sends the chat input as a question. The history snapshot excludes the
    /// new message (it travels separately as the current question).
    pub fn send_chat(&mut self) {
        if self.chat.waiting {
            return;
        }
        let message = self.chat.input.trim().to_owned();
        if message.is_empty() {
            return;
        }
        let context = self.chat.messages.clone();
        self.chat.messages.push(ChatMessage::new(ChatRole::User, message.clone()));
        self.chat.input.clear();
        self.chat.waiting = true;
        if push_history(&mut self.history, &message, HistorySource::Qa) {
            self.persist_history();
        }
        // Chat does not bump the generation counter: it is orthogonal to the
        // flow, and bumping would invalidate an in-flight flow fetch.
        if let Some(ref tx) = self.gen_tx {
            let _ = tx.send(GenRequest {
                generation: self.generation,
                kind: GenRequestKind::ChatReply { message, history: context },
                files: self.knowledge.files.clone(),
            });
        }
    }

    // -----------------------------------------------------------------------
    // Knowledge base
    // -----------------------------------------------------------------------

    /// Attaches the file at the typed path. Non-PDF paths are rejected with
    /// an inline notice and no state change.
    pub fn add_knowledge_file(&mut self) {
        let path = self.knowledge.input.trim().to_owned();
        if path.is_empty() {
            return;
        }
        match KnowledgeFile::from_path(std::path::Path::new(&path)) {
            Ok(file) => {
                self.knowledge.notice = Some(format!("Añadido: {}", file.name));
                self.knowledge.files.push(file);
                self.knowledge.input.clear();
            }
            Err(e) => {
                self.knowledge.notice = Some(e.to_string());
            }
        }
    }

    /// Removes the highlighted knowledge file.
    pub fn remove_knowledge_file(&mut self) {
        if let Some(idx) = self.knowledge.list.selected() {
            if idx < self.knowledge.files.len() {
                let removed = self.knowledge.files.remove(idx);
                self.knowledge.notice = Some(format!("Eliminado: {}", removed.name));
            }
        }
    }

    // -----------------------------------------------------------------------
    // History recall
    // -----------------------------------------------------------------------

    /// History entries for the active tab, newest first.
    pub fn history_entries(&self) -> Vec<&HistoryLog> {
        self.history.iter().filter(|h| h.source == self.history_tab).collect()
    }

    /// Recalls the highlighted history entry into the matching input buffer
    /// and jumps there.
    pub fn recall_history_entry(&mut self) {
        let Some(idx) = self.history_list.selected() else { return };
        let Some(entry) = self.history_entries().get(idx).copied() else { return };
        let text = entry.text.clone();
        match entry.source {
            HistorySource::Course => {
                self.topic_input = text;
                self.mode = if self.step == FlowStep::InputTopic {
                    Mode::Insert(InsertTarget::Topic)
                } else {
                    Mode::Normal
                };
            }
            HistorySource::Qa => {
                self.chat.input = text;
                self.mode = Mode::Insert(InsertTarget::Chat);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Worker results and ticks
    // -----------------------------------------------------------------------

    /// Applies a generation result to the state machine.
    ///
    /// Flow results are gated on the generation counter; chat results bypass
    /// it (see module docs). Errors raise the banner, except chat (apologetic
    /// assistant message) and level evaluation (infallible by contract).
    pub fn apply_gen_result(&mut self, payload: GenResultPayload) {
        if payload.context == RequestContext::Chat {
            self.apply_chat_result(payload.result.map(|o| match o {
                GenOutcome::ChatReply(text) => text,
                other => {
                    tracing::warn!(?other, "mismatched chat outcome");
                    String::new()
                }
            }));
            return;
        }

        if payload.generation != self.generation {
            tracing::debug!(
                stamped = payload.generation,
                current = self.generation,
                context = ?payload.context,
                "discarding stale generation result"
            );
            return;
        }

        self.loading = false;
        let outcome = match payload.result {
            Ok(outcome) => outcome,
            Err(e) => {
                self.error = Some(e.to_string());
                return;
            }
        };

        match outcome {
            GenOutcome::Questions(questions) => {
                self.diagnosis.answers = vec![None; questions.len()];
                self.diagnosis.questions = questions;
                self.diagnosis.cursor = 0;
                self.diagnosis.in_review = false;
            }
            GenOutcome::Level(level) => {
                self.level = Some(level);
                self.step = FlowStep::InputTopic;
                self.generation += 1;
            }
            GenOutcome::Pillars(pillars) => {
                self.pillars = pillars;
                self.pillar_list.select(Some(0));
                self.step = FlowStep::SelectPillar;
                self.generation += 1;
            }
            GenOutcome::Variations(variations) => {
                self.variations = variations;
                self.variation_list.select(Some(0));
                self.step = FlowStep::SelectVariation;
                self.generation += 1;
            }
            GenOutcome::Course(content) => {
                self.course = Some(CourseViewState::new(content.title, &content.markdown));
                self.step = FlowStep::CourseView;
                self.generation += 1;
            }
            GenOutcome::ChatReply(_) => {
                tracing::warn!("chat outcome arrived with a flow context, ignoring");
            }
        }
    }

    /// Appends the chat reply (or the apology) and awards the reply bonus.
    fn apply_chat_result(&mut self, result: Result<String, crate::gen::types::GenError>) {
        self.chat.waiting = false;
        match result {
            Ok(text) if !text.is_empty() => {
                self.chat.messages.push(ChatMessage::new(ChatRole::Assistant, text));
                self.score += CHAT_REPLY_POINTS;
                self.persist_score();
            }
            _ => {
                self.chat
                    .messages
                    .push(ChatMessage::new(ChatRole::Assistant, CHAT_APOLOGY));
            }
        }
    }

    /// Logic tick (4 Hz): decays quiz shake highlights.
    pub fn tick(&mut self) {
        if let Some(ref mut course) = self.course {
            for quiz in &mut course.quizzes {
                quiz.tick();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gen::types::GenError;
    use tokio::sync::mpsc;

    fn wired_state() -> (AppState, mpsc::UnboundedReceiver<GenRequest>) {
        let (gen_tx, gen_rx) = mpsc::unbounded_channel();
        let mut state = AppState::default();
        state.gen_tx = Some(gen_tx);
        (state, gen_rx)
    }

    fn sample_questions() -> Vec<DiagnosisQuestion> {
        (1..=3)
            .map(|id| DiagnosisQuestion {
                id,
                question: format!("pregunta {id}"),
                options: vec!["a".into(), "b".into(), "c".into()],
                correct_answer: 0,
            })
            .collect()
    }

    fn load_questions(state: &mut AppState) {
        state.apply_gen_result(GenResultPayload {
            generation: state.generation,
            context: RequestContext::Diagnosis,
            result: Ok(GenOutcome::Questions(sample_questions())),
        });
    }

    #[test]
    fn diagnosis_submit_blocked_until_all_answered() {
        let (mut state, mut gen_rx) = wired_state();
        load_questions(&mut state);

        state.answer_diagnosis(0);
        state.submit_diagnosis();
        assert!(!state.diagnosis.in_review, "partial answers must not submit");

        for cursor in 0..3 {
            state.diagnosis.cursor = cursor;
            state.answer_diagnosis(1);
        }
        state.submit_diagnosis();
        assert!(state.diagnosis.in_review, "first full submit enters review");
        assert_eq!(state.step, FlowStep::Diagnosis, "review does not change step");
        assert!(gen_rx.try_recv().is_err(), "review must not issue a request");

        state.submit_diagnosis();
        let request = gen_rx.try_recv().expect("second submit evaluates the level");
        assert!(matches!(request.kind, GenRequestKind::EvaluateLevel { .. }));
        assert!(state.loading);
    }

    #[test]
    fn answers_lock_during_review() {
        let (mut state, _gen_rx) = wired_state();
        load_questions(&mut state);
        for cursor in 0..3 {
            state.diagnosis.cursor = cursor;
            state.answer_diagnosis(2);
        }
        state.submit_diagnosis();
        state.diagnosis.cursor = 0;
        state.answer_diagnosis(0);
        assert_eq!(state.diagnosis.answers[0], Some(2));
    }

    #[test]
    fn topic_submit_trims_and_records_history() {
        let (mut state, mut gen_rx) = wired_state();
        state.step = FlowStep::InputTopic;

        state.topic_input = "   ".into();
        state.submit_topic();
        assert!(gen_rx.try_recv().is_err(), "blank topic is ignored");

        state.topic_input = "  Medallion Architecture  ".into();
        state.submit_topic();
        assert_eq!(state.topic, "Medallion Architecture");
        assert_eq!(state.history[0].text, "Medallion Architecture");
        assert_eq!(state.history[0].source, HistorySource::Course);
        let request = gen_rx.try_recv().unwrap();
        assert!(matches!(request.kind, GenRequestKind::Pillars { .. }));
    }

    #[test]
    fn going_back_clears_the_abandoned_step() {
        let (mut state, _gen_rx) = wired_state();
        state.step = FlowStep::SelectVariation;
        state.pillars = vec!["p".into(); 10];
        state.selected_pillar = Some("p".into());
        state.variations = vec!["v".into(); 10];

        state.go_back();
        assert_eq!(state.step, FlowStep::SelectPillar);
        assert!(state.variations.is_empty());
        assert!(!state.pillars.is_empty(), "upstream data survives");

        state.go_back();
        assert_eq!(state.step, FlowStep::InputTopic);
        assert!(state.pillars.is_empty());
        assert_eq!(state.selected_pillar, None);

        // First two steps have no back target.
        state.go_back();
        assert_eq!(state.step, FlowStep::InputTopic);
    }

    #[test]
    fn back_from_course_drops_only_the_course() {
        let (mut state, _gen_rx) = wired_state();
        state.step = FlowStep::CourseView;
        state.variations = vec!["v".into(); 10];
        state.course = Some(CourseViewState::new("t".into(), "## Bloque"));

        state.go_back();
        assert_eq!(state.step, FlowStep::SelectVariation);
        assert!(state.course.is_none());
        assert_eq!(state.variations.len(), 10);
    }

    #[test]
    fn stale_flow_results_are_discarded() {
        let (mut state, mut gen_rx) = wired_state();
        state.step = FlowStep::InputTopic;
        state.topic_input = "pipelines".into();
        state.submit_topic();
        let stamped = gen_rx.try_recv().unwrap().generation;

        // The user backs out before the response lands.
        state.step = FlowStep::SelectPillar;
        state.go_back();

        state.apply_gen_result(GenResultPayload {
            generation: stamped,
            context: RequestContext::Pillars,
            result: Ok(GenOutcome::Pillars(vec!["late".into(); 10])),
        });
        assert!(state.pillars.is_empty(), "stale pillars must not land");
        assert_eq!(state.step, FlowStep::InputTopic);
    }

    #[test]
    fn matching_results_advance_the_flow() {
        let (mut state, mut gen_rx) = wired_state();
        state.step = FlowStep::InputTopic;
        state.topic_input = "lakehouse".into();
        state.submit_topic();
        let stamped = gen_rx.try_recv().unwrap().generation;

        let pillars: Vec<String> = (0..10).map(|i| format!("pilar {i}")).collect();
        state.apply_gen_result(GenResultPayload {
            generation: stamped,
            context: RequestContext::Pillars,
            result: Ok(GenOutcome::Pillars(pillars)),
        });
        assert_eq!(state.step, FlowStep::SelectPillar);
        assert_eq!(state.pillars.len(), 10);
        assert!(!state.loading);
        assert_eq!(state.pillar_list.selected(), Some(0));
    }

    #[test]
    fn flow_errors_raise_the_banner_without_advancing() {
        let (mut state, mut gen_rx) = wired_state();
        state.step = FlowStep::InputTopic;
        state.topic_input = "dax".into();
        state.submit_topic();
        let stamped = gen_rx.try_recv().unwrap().generation;

        state.apply_gen_result(GenResultPayload {
            generation: stamped,
            context: RequestContext::Pillars,
            result: Err(GenError::EmptyResponse),
        });
        assert_eq!(state.step, FlowStep::InputTopic);
        assert!(state.error.is_some());
        assert!(!state.loading);
    }

    #[test]
    fn chat_reply_awards_points_and_bypasses_generation_guard() {
        let (mut state, mut gen_rx) = wired_state();
        state.chat.input = "¿qué es un dataflow?".into();
        state.send_chat();
        assert!(state.chat.waiting);
        assert_eq!(state.history[0].source, HistorySource::Qa);
        let request = gen_rx.try_recv().unwrap();

        // The flow moves on before the reply arrives.
        state.generation += 5;

        state.apply_gen_result(GenResultPayload {
            generation: request.generation,
            context: RequestContext::Chat,
            result: Ok(GenOutcome::ChatReply("Un dataflow es...".into())),
        });
        assert!(!state.chat.waiting);
        assert_eq!(state.chat.messages.len(), 2);
        assert_eq!(state.chat.messages[1].role, ChatRole::Assistant);
        assert_eq!(state.score, 10);
    }

    #[test]
    fn failed_chat_reply_appends_apology_without_points() {
        let (mut state, _gen_rx) = wired_state();
        state.chat.input = "hola".into();
        state.send_chat();

        state.apply_gen_result(GenResultPayload {
            generation: state.generation,
            context: RequestContext::Chat,
            result: Err(GenError::EmptyResponse),
        });
        assert!(!state.chat.waiting);
        assert_eq!(state.chat.messages.len(), 2);
        assert_eq!(state.chat.messages[1].text, CHAT_APOLOGY);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn triggering_keys_are_ignored_while_loading() {
        let (mut state, mut gen_rx) = wired_state();
        state.step = FlowStep::InputTopic;
        state.topic_input = "fabric".into();
        state.submit_topic();
        assert!(gen_rx.try_recv().is_ok());

        state.topic_input = "otra cosa".into();
        state.submit_topic();
        assert!(gen_rx.try_recv().is_err(), "second submit while loading is ignored");
    }

    #[test]
    fn non_pdf_knowledge_path_is_rejected_without_state_change() {
        let (mut state, _gen_rx) = wired_state();
        state.knowledge.input = "/tmp/notas.txt".into();
        state.add_knowledge_file();
        assert!(state.knowledge.files.is_empty());
        assert!(state.knowledge.notice.is_some());
        assert_eq!(state.knowledge.input, "/tmp/notas.txt", "input preserved for correction");
    }

    #[test]
    fn course_view_flattens_quiz_questions() {
        let markdown = "\
## Bloque
```quiz
[{\"question\": \"q1\", \"options\": [\"a\", \"b\"], \"correctAnswer\": 0, \"explanation\": \"e\"},
 {\"question\": \"q2\", \"options\": [\"a\", \"b\"], \"correctAnswer\": 1, \"explanation\": \"e\"}]
```";
        let mut view = CourseViewState::new("t".into(), markdown);
        assert_eq!(view.quizzes.len(), 2);
        view.select_option(1);
        assert_eq!(view.submit_active(), Some(false));
        view.next_quiz();
        view.select_option(1);
        assert_eq!(view.submit_active(), Some(true));
    }

    #[test]
    fn glossary_cursor_cycles_and_closes() {
        let mut view =
            CourseViewState::new("t".into(), "Un [[Lakehouse|def]] y un [[Warehouse]].");
        assert_eq!(view.glossary_cursor, None);
        view.cycle_glossary();
        assert_eq!(view.glossary_cursor, Some(0));
        view.cycle_glossary();
        assert_eq!(view.glossary_cursor, Some(1));
        view.cycle_glossary();
        assert_eq!(view.glossary_cursor, None);
    }
}
