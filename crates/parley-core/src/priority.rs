//! Keyword-based priority classification and SLA assignment.
//!
//! Priority is recorded alongside each handled message for support-queue
//! metadata. It never blocks or reroutes the answer pipeline.

use chrono::{Duration, Utc};

use crate::types::{Priority, SlaTarget};

/// Keywords that escalate a message to HIGH priority.
const HIGH_KEYWORDS: &[&str] = &["payment", "money", "charged", "deducted", "failed transaction"];

/// Keywords that mark a message as MEDIUM priority.
const MEDIUM_KEYWORDS: &[&str] = &[
    "login",
    "error",
    "crash",
    "not working",
    "issue",
    "bug",
    "refund",
];

/// Classify a user message into a support priority.
///
/// Case-folded substring scan; HIGH keywords are checked before MEDIUM, so a
/// message containing both classifies HIGH. Anything else is LOW.
pub fn classify(message: &str) -> Priority {
    let message = message.to_lowercase();

    for word in HIGH_KEYWORDS {
        if message.contains(word) {
            return Priority::High;
        }
    }

    for word in MEDIUM_KEYWORDS {
        if message.contains(word) {
            return Priority::Medium;
        }
    }

    Priority::Low
}

/// Derive SLA response targets from a priority level.
pub fn assign_sla(priority: Priority) -> SlaTarget {
    let now = Utc::now();

    let (first_response_minutes, resolution_hours) = match priority {
        Priority::High => (5, 2),
        Priority::Medium => (30, 6),
        Priority::Low => (120, 24),
    };

    SlaTarget {
        first_response_minutes,
        resolution_hours,
        first_response_due: now + Duration::minutes(first_response_minutes),
        resolution_due: now + Duration::hours(resolution_hours),
    }
}
