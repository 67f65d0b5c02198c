//! Search collaborator contract and the default in-process index.

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;

use parley_core::error::Result;

/// A retrieved text fragment with its dissimilarity score.
///
/// Lower distance means more relevant. Backends return results sorted
/// ascending by distance.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSnippet {
    pub text: String,
    pub distance: f64,
}

/// Black-box context search collaborator.
///
/// Implementations may fail; the adapter above this trait converts every
/// failure into an empty result set.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Return up to `limit` candidate snippets, sorted ascending by distance.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ScoredSnippet>>;
}

/// In-process index over a FAQ corpus, scored by token overlap.
///
/// The corpus is a text file of entries separated by blank lines. Distance
/// is `1 - |query ∩ doc| / |query|` over lowercased word sets — crude, but
/// deterministic and dependency-free, which is what the default wiring and
/// the test suite need. Production deployments substitute a real vector
/// backend through the `SearchBackend` seam.
pub struct MemoryIndex {
    docs: Vec<String>,
}

impl MemoryIndex {
    /// Empty index; every search returns no candidates.
    pub fn new() -> Self {
        Self { docs: Vec::new() }
    }

    /// Build an index from corpus text, one entry per blank-line-separated block.
    pub fn from_text(text: &str) -> Self {
        let docs = text
            .split("\n\n")
            .map(str::trim)
            .filter(|chunk| !chunk.is_empty())
            .map(str::to_string)
            .collect();
        Self { docs }
    }

    /// Load a corpus file from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_text(&text))
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    fn tokens(text: &str) -> HashSet<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect()
    }

    fn distance(query_tokens: &HashSet<String>, doc: &str) -> f64 {
        if query_tokens.is_empty() {
            return 1.0;
        }
        let doc_tokens = Self::tokens(doc);
        let overlap = query_tokens.intersection(&doc_tokens).count();
        1.0 - overlap as f64 / query_tokens.len() as f64
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchBackend for MemoryIndex {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ScoredSnippet>> {
        let query_tokens = Self::tokens(query);

        let mut scored: Vec<ScoredSnippet> = self
            .docs
            .iter()
            .map(|doc| ScoredSnippet {
                text: doc.clone(),
                distance: Self::distance(&query_tokens, doc),
            })
            .collect();

        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(limit);
        Ok(scored)
    }
}
