//! Integration tests for the lexical index artifact
//!
//! Round-trip fidelity plus the degraded paths: missing, corrupt, stale and
//! version-mismatched artifacts must all load as "no index".

use std::fs;

use tempfile::TempDir;

use rankfuse::corpus::Corpus;
use rankfuse::lexical::{tokenize, Bm25Index, Bm25Params, IndexStore, ARTIFACT_VERSION};

fn corpus() -> Corpus {
    let mut corpus = Corpus::new();
    corpus.push(
        "reciprocal rank fusion merges ranked lists",
        "fusion.pdf",
        Some(1),
    );
    corpus.push(
        "bm25 scores term frequency against document frequency",
        "lexical.pdf",
        Some(3),
    );
    corpus.push(
        "cross encoders score query passage pairs jointly",
        "rerank.pdf",
        Some(7),
    );
    corpus.push("an unrelated passage about gardening", "hobby.docx", None);
    corpus
}

#[test]
fn round_trip_produces_identical_scores() {
    let temp = TempDir::new().unwrap();
    let store = IndexStore::new(temp.path().join("lexical.idx"));

    let corpus = corpus();
    let index = Bm25Index::build(&corpus, Bm25Params::default());

    let queries = [
        "rank fusion",
        "bm25 document frequency",
        "gardening",
        "no overlap whatsoever zzz",
    ];
    let before: Vec<Vec<f32>> = queries
        .iter()
        .map(|q| index.scores(&tokenize(q)))
        .collect();

    store.save(index, corpus).unwrap();
    let loaded = store.load().expect("artifact should load");

    for (query, expected) in queries.iter().zip(&before) {
        let after = loaded.index.scores(&tokenize(query));
        assert_eq!(&after, expected, "scores diverged for query {query:?}");
    }
}

#[test]
fn round_trip_preserves_top_k_ordering() {
    let temp = TempDir::new().unwrap();
    let store = IndexStore::new(temp.path().join("lexical.idx"));

    let corpus = corpus();
    let index = Bm25Index::build(&corpus, Bm25Params::default());
    let terms = tokenize("score frequency passage");
    let before = index.top_k(&terms, 4);

    store.save(index, corpus).unwrap();
    let loaded = store.load().unwrap();

    assert_eq!(loaded.index.top_k(&terms, 4), before);
}

#[test]
fn save_overwrites_previous_artifact() {
    let temp = TempDir::new().unwrap();
    let store = IndexStore::new(temp.path().join("lexical.idx"));

    let first = corpus();
    store
        .save(Bm25Index::build(&first, Bm25Params::default()), first)
        .unwrap();

    let mut second = Corpus::new();
    second.push("replacement corpus with one passage", "new.pdf", None);
    let fingerprint = second.fingerprint();
    store
        .save(Bm25Index::build(&second, Bm25Params::default()), second)
        .unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.corpus.len(), 1);
    assert_eq!(loaded.fingerprint(), fingerprint);
}

#[test]
fn version_mismatch_is_treated_as_absent() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("lexical.idx");

    // A structurally valid artifact from a future layout version.
    let artifact = serde_json::json!({
        "version": ARTIFACT_VERSION + 1,
        "corpus_fingerprint": "",
        "stats": {
            "params": {"k1": 1.2, "b": 0.75},
            "postings": {},
            "doc_len": [],
            "avg_doc_len": 0.0,
        },
        "passages": [],
    });
    let json = serde_json::to_vec(&artifact).unwrap();
    fs::write(&path, zstd::encode_all(&json[..], 3).unwrap()).unwrap();

    assert!(IndexStore::new(path).load().is_none());
}

#[test]
fn tampered_passages_fail_fingerprint_check() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("lexical.idx");
    let store = IndexStore::new(&path);

    let corpus = corpus();
    store
        .save(Bm25Index::build(&corpus, Bm25Params::default()), corpus)
        .unwrap();

    // Flip one passage's text behind the store's back.
    let compressed = fs::read(&path).unwrap();
    let json = zstd::decode_all(&compressed[..]).unwrap();
    let mut artifact: serde_json::Value = serde_json::from_slice(&json).unwrap();
    artifact["passages"][0]["text"] = serde_json::Value::String("tampered".to_string());
    let json = serde_json::to_vec(&artifact).unwrap();
    fs::write(&path, zstd::encode_all(&json[..], 3).unwrap()).unwrap();

    assert!(store.load().is_none());
}

#[test]
fn truncated_artifact_is_treated_as_absent() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("lexical.idx");
    let store = IndexStore::new(&path);

    let corpus = corpus();
    store
        .save(Bm25Index::build(&corpus, Bm25Params::default()), corpus)
        .unwrap();

    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    assert!(store.load().is_none());
}

#[test]
fn empty_corpus_round_trips() {
    let temp = TempDir::new().unwrap();
    let store = IndexStore::new(temp.path().join("lexical.idx"));

    let corpus = Corpus::new();
    store
        .save(Bm25Index::build(&corpus, Bm25Params::default()), corpus)
        .unwrap();

    let loaded = store.load().unwrap();
    assert!(loaded.corpus.is_empty());
    assert!(loaded.index.is_empty());
    assert!(loaded.index.top_k(&tokenize("anything"), 5).is_empty());
}
