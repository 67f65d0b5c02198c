//! Core types, configuration, and error taxonomy for the Parley gateway.
//!
//! Everything here is runtime-free: plain data, pure functions, and the
//! shared error type the other crates bridge into.

pub mod config;
pub mod error;
pub mod priority;
pub mod types;

pub use config::ParleyConfig;
pub use error::{ParleyError, Result};
pub use priority::{assign_sla, classify};
pub use types::{OfferRecord, OfferStatus, Priority, Role, SlaTarget, Turn, VerificationStatus};
