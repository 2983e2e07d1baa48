//! Background tokio task that owns the generation client for its lifetime.
//!
//! All communication is via channels: `GenRequest` in, `AppEvent::GenResult`
//! out. Requests are handled strictly sequentially — the flow only ever has
//! one fetch in flight, and the chat waits for its reply, so there is nothing
//! to gain from concurrency here and ordering stays trivial to reason about.

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::event::AppEvent;
use crate::gen::client::GenClient;
use crate::gen::types::{GenOutcome, GenRequest, GenRequestKind, GenResultPayload};

/// Spawns the generation worker task.
///
/// The task loops over incoming `GenRequest` messages until the channel is
/// closed (sender dropped). Results are sent back via `event_tx` as
/// `AppEvent::GenResult`, stamped with the request's generation counter.
pub fn spawn_gen_worker(
    client: GenClient,
    mut rx: UnboundedReceiver<GenRequest>,
    event_tx: UnboundedSender<AppEvent>,
) {
    tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            let payload = handle_request(&client, request).await;
            let _ = event_tx.send(AppEvent::GenResult(Box::new(payload)));
        }
    });
}

/// Dispatches one request to the matching client call.
async fn handle_request(client: &GenClient, request: GenRequest) -> GenResultPayload {
    let GenRequest { generation, kind, files } = request;
    let context = kind.context();

    let result = match kind {
        GenRequestKind::DiagnosisQuestions => {
            client.diagnosis_questions(&files).await.map(GenOutcome::Questions)
        }
        GenRequestKind::EvaluateLevel { answers } => {
            // Infallible by contract: degrades to Beginner inside the client.
            Ok(GenOutcome::Level(client.evaluate_level(&answers, &files).await))
        }
        GenRequestKind::Pillars { topic, level } => {
            client.pillars(&topic, level, &files).await.map(GenOutcome::Pillars)
        }
        GenRequestKind::Variations { pillar, level } => {
            client.variations(&pillar, level, &files).await.map(GenOutcome::Variations)
        }
        GenRequestKind::Course { variation, level } => {
            client.course(&variation, level, &files).await.map(GenOutcome::Course)
        }
        GenRequestKind::ChatReply { message, history } => {
            client.chat_reply(&message, &history, &files).await.map(GenOutcome::ChatReply)
        }
    };

    if let Err(ref e) = result {
        tracing::warn!(?context, error = %e, "generation request failed");
    }

    GenResultPayload { generation, context, result }
}
