//! tf-idf pseudo-relevance feedback over the feedback set.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use super::{Analyzer, DocumentSource, ExpansionMethod, QueryExpander, TermScores, feedback_tokens};

/// Appends the top tf-idf feedback terms, unweighted, to the query tokens.
///
/// `tf` is the total count across feedback documents, `df` the number of
/// feedback documents containing the term and `idf = ln(n / df)` with `n`
/// the number of requested ids. A term in every document scores zero.
pub struct PrfExpander {
    analyzer: Arc<dyn Analyzer>,
    documents: Arc<dyn DocumentSource>,
}

impl PrfExpander {
    pub fn new(analyzer: Arc<dyn Analyzer>, documents: Arc<dyn DocumentSource>) -> Self {
        Self {
            analyzer,
            documents,
        }
    }

    /// tf-idf score per term in first-seen order.
    pub fn term_weights(&self, feedback_doc_ids: &[String]) -> Vec<(String, f64)> {
        self.term_scores(feedback_doc_ids).into_vec()
    }

    fn term_scores(&self, feedback_doc_ids: &[String]) -> TermScores {
        let mut order: Vec<String> = Vec::new();
        // term -> (total count, document frequency)
        let mut stats: HashMap<String, (usize, usize)> = HashMap::new();

        for tokens in feedback_tokens(self.documents.as_ref(), self.analyzer.as_ref(), feedback_doc_ids) {
            let mut seen: HashSet<&str> = HashSet::new();
            for token in &tokens {
                let entry = stats.entry(token.clone()).or_insert_with(|| {
                    order.push(token.clone());
                    (0, 0)
                });
                entry.0 += 1;
                if seen.insert(token) {
                    entry.1 += 1;
                }
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let num_docs = feedback_doc_ids.len() as f64;
        let mut scores = TermScores::default();
        for term in &order {
            let (tf, df) = stats[term];
            #[allow(clippy::cast_precision_loss)]
            let idf = if df > 0 {
                (num_docs / df as f64).ln()
            } else {
                0.0
            };
            #[allow(clippy::cast_precision_loss)]
            scores.add(term, tf as f64 * idf);
        }
        scores
    }
}

impl QueryExpander for PrfExpander {
    fn expand(&self, query: &str, feedback_doc_ids: &[String], num_terms: usize) -> String {
        let expansion_terms = self.term_scores(feedback_doc_ids).top(num_terms);
        let mut parts = self.analyzer.analyze(query);
        let before = parts.len();
        for (term, _) in expansion_terms {
            if !parts[..before].contains(&term) {
                parts.push(term);
            }
        }
        debug!(
            query = %query,
            feedback_docs = feedback_doc_ids.len(),
            added_terms = parts.len() - before,
            "prf expansion"
        );
        parts.join(" ")
    }

    fn method(&self) -> ExpansionMethod {
        ExpansionMethod::Prf
    }
}
