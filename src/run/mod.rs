//! Run Store: TREC-style ranked result lists and relevance judgments.
//!
//! A [`Run`] maps each query id to its ranked entries. Runs are immutable
//! once loaded; fusion and expansion always build new structures.

use std::collections::BTreeMap;

use serde::Serialize;

pub mod qrels;
pub mod trec;

pub use qrels::{Qrels, load_qrels, read_qrels, write_qrels};
pub use trec::{load_run, read_run, write_run};

/// Literal placeholder written in the second column of run and qrels files.
pub const RUN_PLACEHOLDER: &str = "Q0";

/// A document with a retrieval-system-specific score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDocument {
    pub doc_id: String,
    pub score: f64,
}

impl ScoredDocument {
    pub fn new(doc_id: impl Into<String>, score: f64) -> Self {
        Self {
            doc_id: doc_id.into(),
            score,
        }
    }
}

/// One ranked line of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunEntry {
    pub doc_id: String,
    pub rank: u32,
    pub score: f64,
}

impl RunEntry {
    pub fn new(doc_id: impl Into<String>, rank: u32, score: f64) -> Self {
        Self {
            doc_id: doc_id.into(),
            rank,
            score,
        }
    }
}

/// A `(query_id, doc_id, score)` row handed to [`write_run`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub query_id: String,
    pub doc_id: String,
    pub score: f64,
}

impl RunResult {
    pub fn new(query_id: impl Into<String>, doc_id: impl Into<String>, score: f64) -> Self {
        Self {
            query_id: query_id.into(),
            doc_id: doc_id.into(),
            score,
        }
    }
}

/// Ranked lists keyed by query id, iterated in lexicographic query order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    queries: BTreeMap<String, Vec<RunEntry>>,
}

impl Run {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a run from per-query entries, sorting each list by rank.
    ///
    /// The sort is stable, so entries sharing a rank keep their given order.
    pub fn from_entries(queries: BTreeMap<String, Vec<RunEntry>>) -> Self {
        let mut queries = queries;
        for entries in queries.values_mut() {
            entries.sort_by_key(|entry| entry.rank);
        }
        Self { queries }
    }

    pub fn get(&self, query_id: &str) -> Option<&[RunEntry]> {
        self.queries.get(query_id).map(Vec::as_slice)
    }

    pub fn contains_query(&self, query_id: &str) -> bool {
        self.queries.contains_key(query_id)
    }

    pub fn query_ids(&self) -> impl Iterator<Item = &str> {
        self.queries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RunEntry])> {
        self.queries
            .iter()
            .map(|(qid, entries)| (qid.as_str(), entries.as_slice()))
    }

    /// Number of query ids.
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Total entries across all queries.
    pub fn entry_count(&self) -> usize {
        self.queries.values().map(Vec::len).sum()
    }

    /// Doc ids of the first `k` entries for a query, in rank order.
    pub fn feedback_doc_ids(&self, query_id: &str, k: usize) -> Vec<String> {
        self.get(query_id)
            .map(|entries| {
                entries
                    .iter()
                    .take(k)
                    .map(|entry| entry.doc_id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Parsed file contents along with malformed-line diagnostics.
#[derive(Debug, Clone)]
pub struct Parsed<T> {
    pub value: T,
    pub lines_read: usize,
    pub skipped_lines: usize,
}
