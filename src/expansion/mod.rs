//! Query Expansion Engine.
//!
//! Both expanders read only the feedback documents handed to them. No
//! collection-wide statistics are consulted, so "idf" in [`prf`] is idf over
//! the feedback set and RM3 is an averaged per-document term frequency rather
//! than a full generative relevance model.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::warn;

use crate::error::{RankfuseError, Result};

pub mod analyzer;
pub mod corpus;
pub mod prf;
pub mod rm3;

pub use analyzer::{Analyzer, AnalyzerCache, StandardAnalyzer, WhitespaceAnalyzer};
pub use corpus::{InMemoryDocuments, JsonlCorpus};
pub use prf::PrfExpander;
pub use rm3::Rm3Expander;

pub const DEFAULT_FB_DOCS: usize = 10;
pub const DEFAULT_FB_TERMS: usize = 10;
pub const DEFAULT_ORIGINAL_QUERY_WEIGHT: f64 = 0.5;

/// Resolves a document id to its raw text.
///
/// `Ok(None)` means the id is unknown; `Err` means the lookup itself failed.
/// Expanders treat both the same way: warn and skip the document.
pub trait DocumentSource: Send + Sync {
    fn document_text(&self, doc_id: &str) -> Result<Option<String>>;
}

/// Rewrites a query using pseudo-relevant feedback documents.
pub trait QueryExpander: Send + Sync {
    fn expand(&self, query: &str, feedback_doc_ids: &[String], num_terms: usize) -> String;

    fn method(&self) -> ExpansionMethod;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpansionMethod {
    #[default]
    Rm3,
    Prf,
}

impl ExpansionMethod {
    pub const NAMES: [&'static str; 2] = ["rm3", "prf"];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Rm3 => "rm3",
            Self::Prf => "prf",
        }
    }
}

impl fmt::Display for ExpansionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExpansionMethod {
    type Err = RankfuseError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "rm3" => Ok(Self::Rm3),
            "prf" => Ok(Self::Prf),
            _ => Err(RankfuseError::UnknownMethod {
                kind: "expansion method",
                value: value.to_string(),
            }),
        }
    }
}

/// Build the expander selected by `method`.
///
/// `original_query_weight` is only consulted by RM3.
pub fn build_expander(
    method: ExpansionMethod,
    analyzer: Arc<dyn Analyzer>,
    documents: Arc<dyn DocumentSource>,
    original_query_weight: f64,
) -> Result<Box<dyn QueryExpander>> {
    let expander: Box<dyn QueryExpander> = match method {
        ExpansionMethod::Rm3 => Box::new(Rm3Expander::new(
            analyzer,
            documents,
            original_query_weight,
        )?),
        ExpansionMethod::Prf => Box::new(PrfExpander::new(analyzer, documents)),
    };
    Ok(expander)
}

/// Analyzed tokens of every feedback document that resolves, in input order.
pub(crate) fn feedback_tokens(
    documents: &dyn DocumentSource,
    analyzer: &dyn Analyzer,
    feedback_doc_ids: &[String],
) -> Vec<Vec<String>> {
    feedback_doc_ids
        .iter()
        .filter_map(|doc_id| match documents.document_text(doc_id) {
            Ok(Some(text)) => Some(analyzer.analyze(&text)),
            Ok(None) => {
                warn!(doc_id = %doc_id, "feedback document not found, skipping");
                None
            }
            Err(err) => {
                warn!(doc_id = %doc_id, error = %err, "failed to load feedback document, skipping");
                None
            }
        })
        .collect()
}

/// Per-term scores that remember the order terms were first seen.
#[derive(Debug, Default)]
pub(crate) struct TermScores {
    index: HashMap<String, usize>,
    scores: Vec<(String, f64)>,
}

impl TermScores {
    pub(crate) fn add(&mut self, term: &str, value: f64) {
        match self.index.get(term) {
            Some(&slot) => self.scores[slot].1 += value,
            None => {
                self.index.insert(term.to_string(), self.scores.len());
                self.scores.push((term.to_string(), value));
            }
        }
    }

    /// The `n` highest-scoring terms; ties keep first-seen order.
    pub(crate) fn top(mut self, n: usize) -> Vec<(String, f64)> {
        self.scores.sort_by(|a, b| b.1.total_cmp(&a.1));
        self.scores.truncate(n);
        self.scores
    }

    pub(crate) fn into_vec(self) -> Vec<(String, f64)> {
        self.scores
    }
}

/// Render a boost weight the way query strings have always carried it:
/// whole numbers keep one decimal (`1.0`), others print in shortest form.
#[allow(clippy::float_cmp)]
pub(crate) fn format_weight(weight: f64) -> String {
    if weight.fract() == 0.0 && weight.is_finite() {
        format!("{weight:.1}")
    } else {
        weight.to_string()
    }
}
