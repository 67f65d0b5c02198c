//! Top-level per-message coordination and dialogue control.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use parley_core::priority::{assign_sla, classify};
use parley_core::types::Turn;
use parley_guard::{GuardDecision, GuardRailPipeline};
use parley_retrieval::{OfferStore, RetrievalAdapter};

use crate::composer::AnswerComposer;
use crate::session::SessionStore;

/// Blank separator frame emitted for session control events.
pub const SESSION_SEPARATOR: &str = "";

/// Lexical cues that the user is wrapping up the conversation.
const CLOSING_PHRASES: &[&str] = &[
    "bye",
    "goodbye",
    "thank you",
    "thanks",
    "that's all",
    "thats all",
    "that is all",
    "no more questions",
    "see you",
    "good night",
];

/// Session control events carried in a structured payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlEvent {
    /// Re-arm idle nudging; emits a blank separator.
    Clear,
    /// Conversation over: suppress idle nudging. The transcript survives.
    End,
}

/// One inbound payload, parsed leniently.
///
/// Payloads may be structured as `{message, offer_id?, event?}`. Anything
/// that fails to parse as that shape — malformed JSON, a bare string, an
/// object with neither `message` nor `event` — is treated as a bare
/// message, never rejected outright.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundPayload {
    pub message: String,
    pub offer_id: Option<u64>,
    pub event: Option<ControlEvent>,
}

impl InboundPayload {
    pub fn parse(raw: &str) -> Self {
        #[derive(Deserialize)]
        struct RawPayload {
            #[serde(default)]
            message: Option<String>,
            #[serde(default)]
            offer_id: Option<u64>,
            #[serde(default)]
            event: Option<ControlEvent>,
        }

        if let Ok(parsed) = serde_json::from_str::<RawPayload>(raw) {
            if parsed.message.is_some() || parsed.event.is_some() {
                return Self {
                    message: parsed.message.unwrap_or_default(),
                    offer_id: parsed.offer_id,
                    event: parsed.event,
                };
            }
        }

        Self {
            message: raw.to_string(),
            offer_id: None,
            event: None,
        }
    }
}

/// What the transport should do with the connection's nudge eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NudgeDirective {
    Enable,
    Disable,
    Keep,
}

/// Streamed reply plus the nudge-eligibility outcome.
pub struct SessionReply {
    pub chunks: mpsc::Receiver<String>,
    pub nudge: NudgeDirective,
}

/// Coordinates guard rails, retrieval, composition, and session state for
/// every inbound payload.
pub struct SessionOrchestrator {
    guard: GuardRailPipeline,
    retrieval: RetrievalAdapter,
    composer: AnswerComposer,
    sessions: Arc<SessionStore>,
    offers: Arc<dyn OfferStore>,
}

impl SessionOrchestrator {
    pub fn new(
        guard: GuardRailPipeline,
        retrieval: RetrievalAdapter,
        composer: AnswerComposer,
        sessions: Arc<SessionStore>,
        offers: Arc<dyn OfferStore>,
    ) -> Self {
        Self {
            guard,
            retrieval,
            composer,
            sessions,
            offers,
        }
    }

    /// Shared session store (read access for transports and health checks).
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Handle one raw inbound payload on a session.
    ///
    /// Control events bypass the whole pipeline; everything else flows
    /// guard rails → retrieval → composition. The returned stream always
    /// terminates and never carries an error.
    pub async fn handle_message(
        &self,
        session_id: Uuid,
        raw: &str,
        identity: &str,
    ) -> SessionReply {
        let payload = InboundPayload::parse(raw);

        if let Some(event) = payload.event {
            info!(session = %session_id, ?event, "session control event");
            let (tx, rx) = mpsc::channel(1);
            let _ = tx.try_send(SESSION_SEPARATOR.to_string());
            let nudge = match event {
                ControlEvent::Clear => NudgeDirective::Enable,
                ControlEvent::End => NudgeDirective::Disable,
            };
            return SessionReply { chunks: rx, nudge };
        }

        let nudge = if contains_closing_phrase(&payload.message) {
            NudgeDirective::Disable
        } else {
            NudgeDirective::Enable
        };

        let chunks = self
            .answer_flow(session_id, &payload.message, payload.offer_id, identity)
            .await;

        match chunks {
            Flow::Rejected(rx) => SessionReply {
                chunks: rx,
                // A refused message is not a completed response cycle.
                nudge: NudgeDirective::Keep,
            },
            Flow::Answered(rx) => SessionReply { chunks: rx, nudge },
        }
    }

    /// Single-shot entry for the non-persistent request/response boundary:
    /// one message in, one chunk stream out, no control events.
    pub async fn handle_chat(
        &self,
        session_id: Uuid,
        message: &str,
        offer_id: Option<u64>,
        identity: &str,
    ) -> mpsc::Receiver<String> {
        match self.answer_flow(session_id, message, offer_id, identity).await {
            Flow::Rejected(rx) | Flow::Answered(rx) => rx,
        }
    }

    async fn answer_flow(
        &self,
        session_id: Uuid,
        message: &str,
        offer_id: Option<u64>,
        identity: &str,
    ) -> Flow {
        // Priority is queue metadata; it never gates the pipeline.
        let priority = classify(message);
        let sla = assign_sla(priority);
        info!(
            session = %session_id,
            priority = priority.as_str(),
            first_response_minutes = sla.first_response_minutes,
            resolution_hours = sla.resolution_hours,
            "message classified"
        );

        if let GuardDecision::Reject { reason, message: reply } =
            self.guard.evaluate(message, identity)
        {
            debug!(session = %session_id, ?reason, "message refused by guard rails");
            let (tx, rx) = mpsc::channel(1);
            let _ = tx.try_send(reply);
            return Flow::Rejected(rx);
        }

        if let Some(offer_id) = offer_id {
            self.sessions.remember_offer(session_id, offer_id);
        }
        let offer = self
            .sessions
            .current_offer(session_id)
            .and_then(|id| self.offers.get(id));

        let snippets = self.retrieval.search(message, offer.as_ref()).await;

        // History excludes the turn being answered.
        let history = self.sessions.history_text(session_id);
        self.sessions.push_turn(session_id, Turn::user(message));

        let answer = self.composer.respond(message, &snippets, &history, priority);

        // Forward chunks while accumulating the bot turn for the transcript.
        let (tx, rx) = mpsc::channel(16);
        let sessions = Arc::clone(&self.sessions);
        tokio::spawn(async move {
            let mut answer = answer;
            let mut full = String::new();
            while let Some(chunk) = answer.recv().await {
                full.push_str(&chunk);
                if tx.send(chunk).await.is_err() {
                    break;
                }
            }
            sessions.push_turn(session_id, Turn::bot(full));
        });

        Flow::Answered(rx)
    }
}

enum Flow {
    Rejected(mpsc::Receiver<String>),
    Answered(mpsc::Receiver<String>),
}

/// True when the message reads as a conversation closer.
fn contains_closing_phrase(message: &str) -> bool {
    let message = message.to_lowercase();
    CLOSING_PHRASES.iter().any(|phrase| message.contains(phrase))
}
