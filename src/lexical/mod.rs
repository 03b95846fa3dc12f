//! Lexical (BM25) indexing and search
//!
//! The index is a read-only derivation of one corpus snapshot: inverted
//! postings plus the per-term and per-document statistics BM25 needs. It is
//! rebuilt in batch and persisted as a single artifact (see `store`).

mod bm25;
mod store;

pub use bm25::{Bm25Index, Bm25Params};
pub use store::{IndexStore, LexicalSnapshot, StoreError, ARTIFACT_VERSION};

/// Tokenize query or passage text: lowercase + whitespace split
///
/// Intentionally simple - no stemming, no stopwords. Query and corpus must
/// go through the same function or postings lookups silently miss.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|t| t.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_lowercases_and_splits() {
        assert_eq!(
            tokenize("The Quick\tBrown  FOX\n"),
            vec!["the", "quick", "brown", "fox"]
        );
    }

    #[test]
    fn tokenize_empty_is_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \n\t ").is_empty());
    }
}
