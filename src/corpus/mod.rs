//! Passage corpus: the unit of retrieval and the identity space for ranking
//!
//! A `Corpus` is an ordered snapshot of passages. The ordinal position of a
//! passage doubles as its identity for all rank bookkeeping (fusion join
//! keys, lexical postings, persisted artifacts).

use serde::{Deserialize, Serialize};

/// A bounded span of source text, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Corpus-assigned ordinal; the stable join key across modalities
    pub id: u32,

    /// Passage text
    pub text: String,

    /// Source identifier (file path, document name)
    pub source: String,

    /// Page or offset within the source, when the loader knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl Passage {
    /// Get a short preview of the text (first N characters)
    pub fn preview(&self, max_chars: usize) -> String {
        if self.text.len() <= max_chars {
            self.text.clone()
        } else {
            let mut end = max_chars;
            while !self.text.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &self.text[..end])
        }
    }
}

/// Ordered, immutable-after-build sequence of passages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Corpus {
    passages: Vec<Passage>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a corpus from already-numbered passages (artifact load path)
    pub fn from_passages(passages: Vec<Passage>) -> Self {
        Self { passages }
    }

    /// Append a passage, assigning the next ordinal
    pub fn push(&mut self, text: impl Into<String>, source: impl Into<String>, page: Option<u32>) {
        let id = self.passages.len() as u32;
        self.passages.push(Passage {
            id,
            text: text.into(),
            source: source.into(),
            page,
        });
    }

    /// Look up a passage by ordinal
    pub fn get(&self, id: u32) -> Option<&Passage> {
        self.passages.get(id as usize).filter(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Passage> {
        self.passages.iter()
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    /// BLAKE3 fingerprint over passage content and metadata
    ///
    /// Persisted alongside the lexical index so a stale or tampered artifact
    /// is detected on load. Length-prefixed fields keep the hash unambiguous.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(self.passages.len() as u64).to_le_bytes());
        for p in &self.passages {
            hasher.update(&p.id.to_le_bytes());
            hasher.update(&(p.text.len() as u64).to_le_bytes());
            hasher.update(p.text.as_bytes());
            hasher.update(&(p.source.len() as u64).to_le_bytes());
            hasher.update(p.source.as_bytes());
            hasher.update(&p.page.unwrap_or(u32::MAX).to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}
