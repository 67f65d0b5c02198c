//! Error types for the conversational core.

use parley_core::error::ParleyError;

/// Errors from the chat layer.
///
/// Only the generation collaborator can fail here, and even that failure
/// never reaches a caller as an error: the composer converts it into a
/// diagnostic chunk. The type exists so the collaborator boundary stays
/// honest about what can go wrong.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("generation error: {0}")]
    Generation(String),
    #[error("session error: {0}")]
    Session(String),
}

impl From<ParleyError> for ChatError {
    fn from(err: ParleyError) -> Self {
        match err {
            ParleyError::Generation(msg) => ChatError::Generation(msg),
            other => ChatError::Session(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        let err = ChatError::Generation("model not loaded".to_string());
        assert_eq!(err.to_string(), "generation error: model not loaded");

        let err = ChatError::Session("transcript unavailable".to_string());
        assert_eq!(err.to_string(), "session error: transcript unavailable");
    }

    #[test]
    fn test_chat_error_from_generation_variant() {
        let err: ChatError = ParleyError::Generation("connection refused".to_string()).into();
        assert!(matches!(err, ChatError::Generation(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_chat_error_from_other_variants_map_to_session() {
        let err: ChatError = ParleyError::Retrieval("index corrupt".to_string()).into();
        assert!(matches!(err, ChatError::Session(_)));
        assert!(err.to_string().contains("index corrupt"));

        let err: ChatError = ParleyError::Config("bad key".to_string()).into();
        assert!(matches!(err, ChatError::Session(_)));
    }

    #[test]
    fn test_chat_error_empty_inner_message() {
        let err = ChatError::Generation(String::new());
        assert_eq!(err.to_string(), "generation error: ");
    }

    #[test]
    fn test_errors_implement_debug() {
        let err = ChatError::Generation("x".to_string());
        let dbg = format!("{:?}", err);
        assert!(dbg.contains("Generation"));
    }
}
