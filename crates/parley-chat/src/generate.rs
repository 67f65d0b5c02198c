//! Generation collaborator contract and implementations.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::warn;

use crate::error::ChatError;

/// Black-box text-generation collaborator.
///
/// `stream` returns a finite, non-restartable sequence of incremental text
/// fragments; the channel closing is the end-of-stream signal. An `Err`
/// means the collaborator could not be contacted at all.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn stream(&self, prompt: &str) -> Result<mpsc::Receiver<String>, ChatError>;
}

/// Streaming client for an Ollama-compatible generation service.
///
/// Sends `{model, prompt, stream: true}` to `/api/generate` and forwards
/// each NDJSON line's `response` field as one fragment. The stream ends on
/// the service's `done` marker or on connection close; a mid-stream
/// transport error truncates the stream cleanly rather than surfacing.
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl GenerationBackend for OllamaClient {
    async fn stream(&self, prompt: &str) -> Result<mpsc::Receiver<String>, ChatError> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&serde_json::json!({
                "model": self.model,
                "prompt": prompt,
                "stream": true,
            }))
            .send()
            .await
            .map_err(|e| ChatError::Generation(e.to_string()))?
            .error_for_status()
            .map_err(|e| ChatError::Generation(e.to_string()))?;

        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let stream = response.bytes_stream();
            tokio::pin!(stream);

            let mut buffer = String::new();
            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        warn!(error = %e, "generation stream interrupted");
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                // NDJSON: one JSON object per line; partial lines stay buffered.
                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim().to_string();
                    buffer.drain(..=pos);
                    if line.is_empty() {
                        continue;
                    }

                    let value: serde_json::Value = match serde_json::from_str(&line) {
                        Ok(value) => value,
                        Err(e) => {
                            warn!(error = %e, "skipping malformed generation line");
                            continue;
                        }
                    };

                    if let Some(fragment) = value.get("response").and_then(|r| r.as_str()) {
                        if !fragment.is_empty() && tx.send(fragment.to_string()).await.is_err() {
                            // Consumer went away; abandon the stream.
                            return;
                        }
                    }

                    if value.get("done").and_then(|d| d.as_bool()).unwrap_or(false) {
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }
}

/// Test double yielding a fixed fragment script.
///
/// Records how many times it was invoked so tests can assert the backend
/// was (or was not) contacted.
pub struct ScriptedGeneration {
    fragments: Vec<String>,
    fail: bool,
    calls: AtomicUsize,
}

impl ScriptedGeneration {
    pub fn new(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// A backend whose every call fails as unreachable.
    pub fn failing() -> Self {
        Self {
            fragments: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `stream` invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationBackend for ScriptedGeneration {
    async fn stream(&self, _prompt: &str) -> Result<mpsc::Receiver<String>, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(ChatError::Generation("backend unreachable".to_string()));
        }

        let (tx, rx) = mpsc::channel(32);
        let fragments = self.fragments.clone();
        tokio::spawn(async move {
            for fragment in fragments {
                if tx.send(fragment).await.is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }
}
