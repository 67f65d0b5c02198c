//! Topic-scope checking.
//!
//! The gateway only answers questions inside its support domain. The rule
//! set behind that judgment is a collaborator concern; the pipeline consumes
//! it through the `DomainGuard` trait as an opaque predicate.

/// Opaque topic-scope predicate consumed by the guard pipeline.
pub trait DomainGuard: Send + Sync {
    /// True when the message is outside the gateway's support domain.
    fn is_out_of_scope(&self, text: &str) -> bool;
}

/// Keyword-list scope guard: a message mentioning any configured off-topic
/// keyword (case-folded substring) is out of scope.
pub struct TopicScopeGuard {
    off_topic: Vec<String>,
}

impl TopicScopeGuard {
    pub fn new(off_topic: Vec<String>) -> Self {
        Self {
            off_topic: off_topic.into_iter().map(|t| t.to_lowercase()).collect(),
        }
    }
}

impl DomainGuard for TopicScopeGuard {
    fn is_out_of_scope(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.off_topic.iter().any(|topic| text.contains(topic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> TopicScopeGuard {
        TopicScopeGuard::new(vec!["weather".to_string(), "sports".to_string()])
    }

    #[test]
    fn test_on_topic_message_in_scope() {
        assert!(!guard().is_out_of_scope("when will my reward arrive"));
    }

    #[test]
    fn test_off_topic_keyword_out_of_scope() {
        assert!(guard().is_out_of_scope("what's the weather tomorrow"));
        assert!(guard().is_out_of_scope("any sports news?"));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert!(guard().is_out_of_scope("WEATHER forecast please"));
        let g = TopicScopeGuard::new(vec!["Weather".to_string()]);
        assert!(g.is_out_of_scope("weather?"));
    }

    #[test]
    fn test_empty_keyword_list_everything_in_scope() {
        let g = TopicScopeGuard::new(vec![]);
        assert!(!g.is_out_of_scope("anything at all"));
    }
}
