//! RM3-style expansion.
//!
//! The relevance model here is the mean relative term frequency over the
//! feedback documents. Query-likelihood weighting of each document is not
//! applied.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::{
    Analyzer, DocumentSource, ExpansionMethod, QueryExpander, TermScores, feedback_tokens,
    format_weight,
};
use crate::error::{RankfuseError, Result};

/// Interpolates the original query (weight `λ`) with feedback terms
/// (weight `score · (1 − λ)`).
///
/// Output is a space-joined sequence of `term^weight` tokens. The `^` boost
/// operator is Lucene query syntax; any other engine consuming the expanded
/// query must interpret `^` as a per-term boost or the weights are lost.
pub struct Rm3Expander {
    analyzer: Arc<dyn Analyzer>,
    documents: Arc<dyn DocumentSource>,
    original_query_weight: f64,
}

impl Rm3Expander {
    pub fn new(
        analyzer: Arc<dyn Analyzer>,
        documents: Arc<dyn DocumentSource>,
        original_query_weight: f64,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&original_query_weight) {
            return Err(RankfuseError::InvalidParameter {
                name: "original_query_weight",
                value: original_query_weight.to_string(),
                reason: "must be within [0, 1]".to_string(),
            });
        }
        Ok(Self {
            analyzer,
            documents,
            original_query_weight,
        })
    }

    pub const fn original_query_weight(&self) -> f64 {
        self.original_query_weight
    }

    /// Term scores over the feedback set, in first-seen order.
    ///
    /// Each resolved document adds `count / doc_len / n` per term, where `n`
    /// is the number of ids requested. Unresolved documents contribute
    /// nothing but still count toward `n`.
    pub fn relevance_model(&self, feedback_doc_ids: &[String]) -> Vec<(String, f64)> {
        self.term_scores(feedback_doc_ids).into_vec()
    }

    fn term_scores(&self, feedback_doc_ids: &[String]) -> TermScores {
        let mut scores = TermScores::default();
        if feedback_doc_ids.is_empty() {
            return scores;
        }
        #[allow(clippy::cast_precision_loss)]
        let total_docs = feedback_doc_ids.len() as f64;

        for tokens in feedback_tokens(self.documents.as_ref(), self.analyzer.as_ref(), feedback_doc_ids) {
            if tokens.is_empty() {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let doc_len = tokens.len() as f64;
            let mut order: Vec<&str> = Vec::new();
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for token in &tokens {
                let count = counts.entry(token.as_str()).or_insert(0);
                if *count == 0 {
                    order.push(token);
                }
                *count += 1;
            }
            for term in order {
                #[allow(clippy::cast_precision_loss)]
                let relative_tf = counts[term] as f64 / doc_len;
                scores.add(term, relative_tf / total_docs);
            }
        }
        scores
    }
}

impl QueryExpander for Rm3Expander {
    fn expand(&self, query: &str, feedback_doc_ids: &[String], num_terms: usize) -> String {
        let expansion_terms = self.term_scores(feedback_doc_ids).top(num_terms);
        let original_tokens = self.analyzer.analyze(query);

        let original_weight = format_weight(self.original_query_weight);
        let feedback_weight = 1.0 - self.original_query_weight;

        let mut parts: Vec<String> = original_tokens
            .iter()
            .map(|token| format!("{token}^{original_weight}"))
            .collect();
        let before = parts.len();
        parts.extend(
            expansion_terms
                .into_iter()
                .filter(|(term, _)| !original_tokens.contains(term))
                .map(|(term, score)| format!("{term}^{:.4}", score * feedback_weight)),
        );
        debug!(
            query = %query,
            feedback_docs = feedback_doc_ids.len(),
            added_terms = parts.len() - before,
            "rm3 expansion"
        );
        parts.join(" ")
    }

    fn method(&self) -> ExpansionMethod {
        ExpansionMethod::Rm3
    }
}

#[cfg(test)]
mod tests {
    use super::super::WhitespaceAnalyzer;
    use super::super::tests::{docs, ids};
    use super::*;

    fn expander(pairs: &[(&str, &str)], weight: f64) -> Rm3Expander {
        Rm3Expander::new(Arc::new(WhitespaceAnalyzer), docs(pairs), weight).unwrap()
    }

    #[test]
    fn interpolates_original_and_feedback_terms() {
        let rm3 = expander(&[("d1", "neural ranking models"), ("d2", "neural retrieval")], 0.5);
        let expanded = rm3.expand("retrieval", &ids(&["d1", "d2"]), 3);
        // Top 3: neural (1/3 + 1/2) / 2, retrieval 1/4, ranking 1/6. Ranking
        // ties with models and was seen first; retrieval is already queried.
        assert_eq!(expanded, "retrieval^0.5 neural^0.2083 ranking^0.0833");
    }

    #[test]
    fn query_terms_are_selected_then_filtered() {
        let rm3 = expander(&[("d1", "neural neural ranking")], 0.5);
        // neural fills the single slot and is then dropped as a query term.
        assert_eq!(rm3.expand("neural", &ids(&["d1"]), 1), "neural^0.5");
    }

    #[test]
    fn empty_feedback_returns_weighted_original() {
        let rm3 = expander(&[], 1.0);
        assert_eq!(rm3.expand("Dense Retrieval", &[], 10), "dense^1.0 retrieval^1.0");
        assert_eq!(rm3.expand("dense", &ids(&["missing"]), 10), "dense^1.0");
    }

    #[test]
    fn divides_by_requested_feedback_count() {
        let rm3 = expander(&[("d1", "alpha")], 0.5);
        let model = rm3.relevance_model(&ids(&["d1", "missing"]));
        assert_eq!(model, vec![("alpha".to_string(), 0.5)]);
    }

    #[test]
    fn mass_sums_to_one_when_all_documents_resolve() {
        let rm3 = expander(
            &[("d1", "a b c a"), ("d2", "b b d"), ("d3", "e")],
            0.5,
        );
        let model = rm3.relevance_model(&ids(&["d1", "d2", "d3"]));
        let total: f64 = model.iter().map(|(_, score)| score).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_weight_outside_unit_interval() {
        for weight in [-0.1, 1.1, f64::NAN] {
            let result = Rm3Expander::new(Arc::new(WhitespaceAnalyzer), docs(&[]), weight);
            assert!(matches!(result, Err(RankfuseError::InvalidParameter { .. })));
        }
    }
}
