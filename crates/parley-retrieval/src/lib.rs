//! Retrieval layer for the Parley gateway.
//!
//! Wraps a black-box search collaborator behind a narrow trait, applies the
//! relevance-threshold and result-count policy, and biases queries with
//! offer-catalog context.

pub mod adapter;
pub mod backend;
pub mod offer;

pub use adapter::RetrievalAdapter;
pub use backend::{MemoryIndex, ScoredSnippet, SearchBackend};
pub use offer::{faq_query, InMemoryOfferStore, OfferStore};
