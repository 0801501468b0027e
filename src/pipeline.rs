//! Batch drivers: expand every topic, optionally retrieve with the expanded
//! query, one worker per query.
//!
//! A query that cannot be processed never aborts the batch. Completed
//! queries are kept in [`BatchOutcome::completed`] and failures are
//! collected alongside; callers that need all-or-nothing semantics call
//! [`BatchOutcome::ensure_complete`].

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{RankfuseError, Result};
use crate::expansion::QueryExpander;
use crate::run::{Run, RunResult, ScoredDocument};
use crate::topics::Topic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionOptions {
    /// Feedback documents taken from the top of the base run.
    pub fb_docs: usize,
    /// Expansion terms requested from the expander.
    pub fb_terms: usize,
    pub use_desc: bool,
    pub use_narr: bool,
}

impl Default for ExpansionOptions {
    fn default() -> Self {
        Self {
            fb_docs: crate::expansion::DEFAULT_FB_DOCS,
            fb_terms: crate::expansion::DEFAULT_FB_TERMS,
            use_desc: false,
            use_narr: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpandedQuery {
    pub original: String,
    pub expanded: String,
    pub feedback_docs: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryFailure {
    pub query_id: String,
    pub message: String,
}

/// Per-query results of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome<T> {
    pub completed: BTreeMap<String, T>,
    /// Topics absent from the base run.
    pub skipped: Vec<String>,
    pub failures: Vec<QueryFailure>,
}

impl<T> Default for BatchOutcome<T> {
    fn default() -> Self {
        Self {
            completed: BTreeMap::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> BatchOutcome<T> {
    pub fn total(&self) -> usize {
        self.completed.len() + self.skipped.len() + self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fail with [`RankfuseError::PartialBatch`] when any query failed.
    pub fn ensure_complete(self) -> Result<Self> {
        if self.failures.is_empty() {
            return Ok(self);
        }
        let first = &self.failures[0];
        Err(RankfuseError::PartialBatch {
            failed: self.failures.len(),
            total: self.total(),
            first: format!("{}: {}", first.query_id, first.message),
        })
    }
}

impl BatchOutcome<Vec<ScoredDocument>> {
    /// Flatten completed queries into writable rows, query ids ascending.
    pub fn to_results(&self) -> Vec<RunResult> {
        self.completed
            .iter()
            .flat_map(|(qid, docs)| {
                docs.iter()
                    .map(move |doc| RunResult::new(qid.as_str(), doc.doc_id.as_str(), doc.score))
            })
            .collect()
    }
}

/// External search engine consuming expanded queries.
pub trait Retriever: Send + Sync {
    fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>>;
}

enum Step<T> {
    Done(String, T),
    Skipped(String),
    Failed(QueryFailure),
}

fn collect<T>(steps: Vec<Step<T>>) -> BatchOutcome<T> {
    let mut outcome = BatchOutcome::default();
    for step in steps {
        match step {
            Step::Done(qid, value) => {
                outcome.completed.insert(qid, value);
            }
            Step::Skipped(qid) => outcome.skipped.push(qid),
            Step::Failed(failure) => outcome.failures.push(failure),
        }
    }
    outcome
}

fn expand_one(
    topic: &Topic,
    base_run: &Run,
    expander: &dyn QueryExpander,
    options: &ExpansionOptions,
) -> Option<ExpandedQuery> {
    if !base_run.contains_query(&topic.id) {
        warn!(query_id = %topic.id, "topic missing from base run, skipping");
        return None;
    }
    let original = topic.query_text(options.use_desc, options.use_narr);
    let feedback = base_run.feedback_doc_ids(&topic.id, options.fb_docs);
    let expanded = expander.expand(&original, &feedback, options.fb_terms);
    Some(ExpandedQuery {
        original,
        expanded,
        feedback_docs: feedback.len(),
    })
}

/// Expand every topic using the top `fb_docs` documents of `base_run`.
pub fn expand_topics(
    topics: &[Topic],
    base_run: &Run,
    expander: &dyn QueryExpander,
    options: &ExpansionOptions,
) -> BatchOutcome<ExpandedQuery> {
    let steps: Vec<Step<ExpandedQuery>> = topics
        .par_iter()
        .map(|topic| match expand_one(topic, base_run, expander, options) {
            Some(expanded) => Step::Done(topic.id.clone(), expanded),
            None => Step::Skipped(topic.id.clone()),
        })
        .collect();
    let outcome = collect(steps);
    info!(
        method = %expander.method(),
        expanded = outcome.completed.len(),
        skipped = outcome.skipped.len(),
        "expanded topics"
    );
    outcome
}

/// Expand each topic and search with the expanded query, keeping `top_k`.
pub fn expand_and_retrieve(
    topics: &[Topic],
    base_run: &Run,
    expander: &dyn QueryExpander,
    retriever: &dyn Retriever,
    options: &ExpansionOptions,
    top_k: usize,
) -> BatchOutcome<Vec<ScoredDocument>> {
    let steps: Vec<Step<Vec<ScoredDocument>>> = topics
        .par_iter()
        .map(|topic| {
            let Some(query) = expand_one(topic, base_run, expander, options) else {
                return Step::Skipped(topic.id.clone());
            };
            match retriever.search(&query.expanded, top_k) {
                Ok(mut hits) => {
                    hits.truncate(top_k);
                    Step::Done(topic.id.clone(), hits)
                }
                Err(err) => {
                    warn!(query_id = %topic.id, error = %err, "retrieval failed");
                    Step::Failed(QueryFailure {
                        query_id: topic.id.clone(),
                        message: err.to_string(),
                    })
                }
            }
        })
        .collect();
    let outcome = collect(steps);
    info!(
        completed = outcome.completed.len(),
        skipped = outcome.skipped.len(),
        failed = outcome.failures.len(),
        "expanded retrieval finished"
    );
    outcome
}
