use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;

use rankfuse::expansion::{
    InMemoryDocuments, PrfExpander, QueryExpander, Rm3Expander, WhitespaceAnalyzer,
};

const VOCAB: &[&str] = &["alpha", "beta", "gamma", "delta", "eps", "zeta", "eta", "theta"];

fn arb_text(min_words: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(VOCAB), min_words..10).prop_map(|words| words.join(" "))
}

fn arb_docs() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_text(1), 1..6)
}

fn corpus(texts: &[String]) -> (Arc<InMemoryDocuments>, Vec<String>) {
    let ids: Vec<String> = (0..texts.len()).map(|i| format!("d{i}")).collect();
    let docs: InMemoryDocuments = ids.iter().cloned().zip(texts.iter().cloned()).collect();
    (Arc::new(docs), ids)
}

proptest! {
    #[test]
    fn rm3_relevance_model_is_a_distribution(texts in arb_docs()) {
        let (docs, ids) = corpus(&texts);
        let rm3 = Rm3Expander::new(Arc::new(WhitespaceAnalyzer), docs, 0.5).unwrap();
        let model = rm3.relevance_model(&ids);
        let mass: f64 = model.iter().map(|(_, weight)| weight).sum();
        prop_assert!((mass - 1.0).abs() < 1e-9, "mass {}", mass);
        let terms: HashSet<&str> = model.iter().map(|(term, _)| term.as_str()).collect();
        prop_assert_eq!(terms.len(), model.len());
    }

    #[test]
    fn rm3_keeps_original_terms_first(texts in arb_docs(), query in arb_text(1), num_terms in 0usize..6) {
        let (docs, ids) = corpus(&texts);
        let rm3 = Rm3Expander::new(Arc::new(WhitespaceAnalyzer), docs, 0.7).unwrap();
        let expanded = rm3.expand(&query, &ids, num_terms);
        let tokens: Vec<&str> = expanded.split(' ').collect();
        let query_tokens: Vec<&str> = query.split_whitespace().collect();

        prop_assert!(tokens.len() <= query_tokens.len() + num_terms);
        for (token, original) in tokens.iter().zip(&query_tokens) {
            prop_assert_eq!(*token, format!("{original}^0.7"));
        }
        for token in &tokens[query_tokens.len()..] {
            let (term, _) = token.split_once('^').unwrap();
            prop_assert!(!query_tokens.contains(&term));
        }
    }

    #[test]
    fn prf_appends_only_new_terms(texts in arb_docs(), query in arb_text(1), num_terms in 0usize..6) {
        let (docs, ids) = corpus(&texts);
        let prf = PrfExpander::new(Arc::new(WhitespaceAnalyzer), docs);
        let expanded = prf.expand(&query, &ids, num_terms);
        let query_tokens: Vec<&str> = query.split_whitespace().collect();
        let tokens: Vec<&str> = expanded.split_whitespace().collect();

        prop_assert_eq!(&tokens[..query_tokens.len()], query_tokens.as_slice());
        let added = &tokens[query_tokens.len()..];
        prop_assert!(added.len() <= num_terms);
        let unique: HashSet<&&str> = added.iter().collect();
        prop_assert_eq!(unique.len(), added.len());
        prop_assert!(added.iter().all(|term| !query_tokens.contains(term)));
    }
}
