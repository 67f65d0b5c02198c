//! Streamed answer composition with a post-hoc filter pass.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use parley_core::types::Priority;
use parley_guard::ContentFilter;

use crate::generate::GenerationBackend;

/// Reply when no grounding context exists for a question.
pub const HUMAN_HANDOFF_REPLY: &str =
    "I'm not sure about this. Let me connect you to a human agent.";

/// Reply when the generation collaborator cannot be reached.
pub const GENERATION_TROUBLE_REPLY: &str =
    "Sorry, I'm having trouble generating a response right now. Please try again in a moment.";

const SYSTEM_INSTRUCTIONS: &str = "You are a helpful support assistant. \
Use the following context to answer the user's question. \
If the answer is not in the context, say you don't know. \
Keep the answer concise and helpful. Stay on support topics.";

/// Builds generation requests and streams the answer back chunk by chunk.
///
/// Fragments are forwarded as soon as they arrive and simultaneously
/// accumulated; once the stream ends, the full text runs through the
/// content filter and a single correction chunk is appended if the
/// filtered text differs. Delivered bytes cannot be unsent, so the
/// correction is appended, never substituted.
pub struct AnswerComposer {
    backend: Arc<dyn GenerationBackend>,
    filter: Arc<ContentFilter>,
}

impl AnswerComposer {
    pub fn new(backend: Arc<dyn GenerationBackend>, filter: Arc<ContentFilter>) -> Self {
        Self { backend, filter }
    }

    /// Assemble the single instruction block sent to the generation backend.
    fn build_prompt(
        message: &str,
        snippets: &[String],
        history: &str,
        priority: Priority,
    ) -> String {
        let context = snippets.join("\n\n");
        let mut prompt = format!("{SYSTEM_INSTRUCTIONS}\n\nContext:\n{context}\n");
        if !history.is_empty() {
            prompt.push_str(&format!("\nConversation so far:\n{history}\n"));
        }
        prompt.push_str(&format!(
            "\nPriority: {}\n\nUser Question: {message}\nAnswer:",
            priority.as_str()
        ));
        prompt
    }

    /// Produce the chunk stream answering `message`.
    ///
    /// With no snippets the stream is exactly one human-handoff chunk and
    /// the generation backend is never contacted: no grounding context
    /// means no generated answer. The returned stream always terminates,
    /// whatever the collaborator does.
    pub fn respond(
        &self,
        message: &str,
        snippets: &[String],
        history: &str,
        priority: Priority,
    ) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(16);

        if snippets.is_empty() {
            debug!("no grounding context; handing off to a human agent");
            let _ = tx.try_send(HUMAN_HANDOFF_REPLY.to_string());
            return rx;
        }

        let prompt = Self::build_prompt(message, snippets, history, priority);
        let backend = Arc::clone(&self.backend);
        let filter = Arc::clone(&self.filter);

        tokio::spawn(async move {
            let mut fragments = match backend.stream(&prompt).await {
                Ok(fragments) => fragments,
                Err(e) => {
                    warn!(error = %e, "generation collaborator unavailable");
                    let _ = tx.send(GENERATION_TROUBLE_REPLY.to_string()).await;
                    return;
                }
            };

            let mut full = String::new();
            while let Some(fragment) = fragments.recv().await {
                full.push_str(&fragment);
                if tx.send(fragment).await.is_err() {
                    // Caller disconnected; abandon the in-flight stream.
                    return;
                }
            }

            let filtered = filter.filter_response(&full);
            if filtered != full {
                debug!("post-hoc filter amended the delivered answer");
                let _ = tx.send(format!("\n\n{filtered}")).await;
            }
        });

        rx
    }
}
