//! Guard rails for the Parley gateway.
//!
//! Four independent admission checks composed into one ordered,
//! short-circuiting pipeline: syntactic validation, content filtering,
//! rate limiting, and topic-scope checking. Any stage may veto a message
//! with a short user-facing reply.

pub mod content;
pub mod domain;
pub mod pipeline;
pub mod rate;
pub mod validator;

pub use content::ContentFilter;
pub use domain::{DomainGuard, TopicScopeGuard};
pub use pipeline::{GuardDecision, GuardRailPipeline, RejectReason};
pub use rate::RateLimiter;
pub use validator::{InputValidator, Validation};
