//! Stateless syntactic checks on a single inbound message.

use parley_core::config::GuardConfig;

/// Result of validating one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub message: String,
}

impl Validation {
    fn ok() -> Self {
        Self {
            valid: true,
            message: String::new(),
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// Pure syntactic validator. Rules are evaluated in order; first match wins.
#[derive(Debug, Clone)]
pub struct InputValidator {
    min_length: usize,
    max_length: usize,
    max_repeated_word: usize,
}

impl InputValidator {
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            min_length: config.min_message_len,
            max_length: config.max_message_len,
            max_repeated_word: config.max_repeated_word,
        }
    }

    /// Validate a message: emptiness, length bounds, then repetition.
    ///
    /// Lengths are measured in characters, not bytes.
    pub fn validate(&self, text: &str) -> Validation {
        if text.trim().is_empty() {
            return Validation::invalid("Please provide a message.");
        }

        let len = text.chars().count();
        if len < self.min_length {
            return Validation::invalid("Message is too short.");
        }

        if len > self.max_length {
            return Validation::invalid(format!(
                "Message is too long. Please keep it under {} characters.",
                self.max_length
            ));
        }

        if self.has_excessive_repetition(text) {
            return Validation::invalid("Message contains excessive repetition.");
        }

        Validation::ok()
    }

    /// A message is excessively repetitive when it has more than ten words
    /// and any single word occurs more than `max_repeated_word` times.
    fn has_excessive_repetition(&self, text: &str) -> bool {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.len() <= 10 {
            return false;
        }

        let mut counts: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
        for word in words {
            let count = counts.entry(word).or_insert(0);
            *count += 1;
            if *count > self.max_repeated_word {
                return true;
            }
        }

        false
    }
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new(&GuardConfig::default())
    }
}
