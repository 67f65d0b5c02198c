//! Pattern-based content classification and response rewriting.

use regex::RegexSet;

/// Fixed refusal substituted for a response carrying blocked content.
pub const REFUSAL_REPLY: &str =
    "I'm sorry, I cannot provide information on that topic. Please contact support for assistance.";

/// Reminder appended to responses touching sensitive subjects.
pub const PRIVACY_REMINDER: &str = "\n\nNote: For security reasons, please avoid sharing sensitive personal information in this chat.";

const BLOCKED_PATTERNS: &[&str] = &[
    r"(?i)credit\s*card|bank\s*account|social\s*security|ssn|password|login",
    r"(?i)hack|exploit|vulnerability|attack|malware|virus",
    r"(?i)illegal|fraud|scam|phishing|spam",
    r"(?i)violence|threat|harm|kill|hurt",
    r"(?i)sex|porn|explicit|nude|adult",
];

const WARNING_PATTERNS: &[&str] = &[
    r"(?i)personal\s*information|private\s*data|confidential",
    r"(?i)financial|money|payment|transaction",
    r"(?i)security\s*breach|data\s*leak",
];

/// Classifies text into blocked / warned / clean and rewrites responses.
///
/// Patterns are compiled once at construction. `filter_response` is
/// idempotent: the refusal text matches no category, and the privacy
/// reminder is never appended twice.
pub struct ContentFilter {
    blocked: RegexSet,
    warning: RegexSet,
}

impl ContentFilter {
    pub fn new() -> Self {
        // Static pattern lists; compilation only fails on a typo in this file.
        Self {
            blocked: RegexSet::new(BLOCKED_PATTERNS).expect("built-in blocked patterns compile"),
            warning: RegexSet::new(WARNING_PATTERNS).expect("built-in warning patterns compile"),
        }
    }

    /// True if the text matches any blocked category.
    pub fn contains_blocked(&self, text: &str) -> bool {
        self.blocked.is_match(text)
    }

    /// True if the text matches any warning category.
    pub fn contains_warning(&self, text: &str) -> bool {
        self.warning.is_match(text)
    }

    /// Rewrite a response for delivery.
    ///
    /// Blocked content is replaced wholesale with a fixed refusal; warned
    /// content gets a privacy reminder appended; clean text passes through.
    pub fn filter_response(&self, response: &str) -> String {
        if self.contains_blocked(response) {
            return REFUSAL_REPLY.to_string();
        }

        if self.contains_warning(response) && !response.ends_with(PRIVACY_REMINDER) {
            return format!("{response}{PRIVACY_REMINDER}");
        }

        response.to_string()
    }
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new()
    }
}
