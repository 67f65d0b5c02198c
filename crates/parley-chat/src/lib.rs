//! Conversational core of the Parley gateway.
//!
//! Composes guard rails, retrieval, and the generation collaborator into
//! the per-session dialogue flow: streamed answers with post-hoc filter
//! corrections, bounded transcripts, and nudge-eligibility control.

pub mod composer;
pub mod error;
pub mod generate;
pub mod orchestrator;
pub mod session;

pub use composer::{AnswerComposer, GENERATION_TROUBLE_REPLY, HUMAN_HANDOFF_REPLY};
pub use error::ChatError;
pub use generate::{GenerationBackend, OllamaClient, ScriptedGeneration};
pub use orchestrator::{
    ControlEvent, InboundPayload, NudgeDirective, SessionOrchestrator, SessionReply,
    SESSION_SEPARATOR,
};
pub use session::SessionStore;
