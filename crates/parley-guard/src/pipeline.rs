//! Ordered, short-circuiting composition of the admission checks.

use std::sync::Arc;

use tracing::debug;

use crate::content::ContentFilter;
use crate::domain::DomainGuard;
use crate::rate::RateLimiter;
use crate::validator::InputValidator;

/// Reply sent when a message trips the content filter.
pub const SECURITY_POLICY_REPLY: &str =
    "I'm sorry, I can't help with that request. Please contact our support team for assistance.";

/// Reply sent when a caller exceeds the rate window.
pub const RATE_LIMIT_REPLY: &str =
    "You're sending messages too quickly. Please wait a moment and try again.";

/// Reply sent for messages outside the support domain.
pub const SCOPE_REDIRECT_REPLY: &str =
    "I can only help with questions about our offers and services. Is there something else I can help you with?";

/// Why a message was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InvalidInput,
    BlockedContent,
    RateLimited,
    OutOfScope,
}

/// Outcome of running one message through the pipeline.
///
/// Consumed once per message; not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Reject {
        reason: RejectReason,
        message: String,
    },
}

impl GuardDecision {
    fn reject(reason: RejectReason, message: impl Into<String>) -> Self {
        GuardDecision::Reject {
            reason,
            message: message.into(),
        }
    }
}

/// The four admission checks in fixed order, each a short-circuit gate.
///
/// Syntactic validation runs first because it is cheapest. The content
/// filter runs before the rate limiter so a refused message never consumes
/// rate budget; the rate limiter runs before the scope check so a caller
/// over quota never reaches it.
pub struct GuardRailPipeline {
    validator: InputValidator,
    filter: Arc<ContentFilter>,
    limiter: RateLimiter,
    domain: Arc<dyn DomainGuard>,
}

impl GuardRailPipeline {
    pub fn new(
        validator: InputValidator,
        filter: Arc<ContentFilter>,
        limiter: RateLimiter,
        domain: Arc<dyn DomainGuard>,
    ) -> Self {
        Self {
            validator,
            filter,
            limiter,
            domain,
        }
    }

    /// Run every stage against one message.
    pub fn evaluate(&self, message: &str, identity: &str) -> GuardDecision {
        let validation = self.validator.validate(message);
        if !validation.valid {
            debug!(identity, "message failed input validation");
            return GuardDecision::reject(RejectReason::InvalidInput, validation.message);
        }

        if self.filter.contains_blocked(message) {
            debug!(identity, "message blocked by content filter");
            return GuardDecision::reject(RejectReason::BlockedContent, SECURITY_POLICY_REPLY);
        }

        if self.limiter.is_rate_limited(identity) {
            debug!(identity, "caller over rate limit");
            return GuardDecision::reject(RejectReason::RateLimited, RATE_LIMIT_REPLY);
        }

        if self.domain.is_out_of_scope(message) {
            debug!(identity, "message out of support scope");
            return GuardDecision::reject(RejectReason::OutOfScope, SCOPE_REDIRECT_REPLY);
        }

        GuardDecision::Allow
    }
}
