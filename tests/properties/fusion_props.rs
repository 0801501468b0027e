use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;

use rankfuse::fusion::{FusionMethod, fuse, normalize_min_max, to_results};
use rankfuse::run::{Run, RunEntry, read_run, write_run};

/// Up to three queries, each a ranked list of distinct doc ids with scores.
fn arb_run() -> impl Strategy<Value = Run> {
    prop::collection::btree_map(
        "q[0-2]",
        prop::collection::btree_map("d[0-9]{1,2}", -100.0f64..100.0, 1..12),
        1..3,
    )
    .prop_map(|queries| {
        let queries: BTreeMap<String, Vec<RunEntry>> = queries
            .into_iter()
            .map(|(qid, docs)| {
                let mut docs: Vec<(String, f64)> = docs.into_iter().collect();
                docs.sort_by(|a, b| b.1.total_cmp(&a.1));
                let entries = docs
                    .into_iter()
                    .zip(1u32..)
                    .map(|((doc, score), rank)| RunEntry::new(doc, rank, score))
                    .collect();
                (qid, entries)
            })
            .collect();
        Run::from_entries(queries)
    })
}

/// Same ranks, scores replaced by an arbitrary decreasing sequence.
fn rescored(run: &Run, offset: f64) -> Run {
    let queries = run
        .iter()
        .map(|(qid, entries)| {
            let entries = entries
                .iter()
                .map(|entry| RunEntry::new(entry.doc_id.clone(), entry.rank, offset - f64::from(entry.rank)))
                .collect();
            (qid.to_string(), entries)
        })
        .collect();
    Run::from_entries(queries)
}

fn doc_sets(run: &Run) -> BTreeMap<String, BTreeSet<String>> {
    run.iter()
        .map(|(qid, entries)| {
            (qid.to_string(), entries.iter().map(|e| e.doc_id.clone()).collect())
        })
        .collect()
}

proptest! {
    #[test]
    fn rrf_ignores_scores(a in arb_run(), b in arb_run(), offset in -50.0f64..50.0) {
        let method = FusionMethod::Rrf { k: 60.0 };
        let original = fuse(&[a.clone(), b.clone()], &method).unwrap();
        let rescored = fuse(&[rescored(&a, offset), rescored(&b, -offset)], &method).unwrap();
        prop_assert_eq!(original, rescored);
    }

    #[test]
    fn every_method_is_total(a in arb_run(), b in arb_run()) {
        let mut expected = doc_sets(&a);
        for (qid, docs) in doc_sets(&b) {
            expected.entry(qid).or_default().extend(docs);
        }
        for method in [
            FusionMethod::Rrf { k: 60.0 },
            FusionMethod::Linear { weights: None },
            FusionMethod::Weighted { alpha: 0.3 },
            FusionMethod::CombSum,
            FusionMethod::CombMnz,
        ] {
            let fused = fuse(&[a.clone(), b.clone()], &method).unwrap();
            let actual: BTreeMap<String, BTreeSet<String>> = fused
                .iter()
                .map(|(qid, docs)| (qid.clone(), docs.iter().map(|d| d.doc_id.clone()).collect()))
                .collect();
            prop_assert_eq!(&actual, &expected, "method {}", method.name());
            for docs in fused.values() {
                prop_assert!(docs.windows(2).all(|pair| pair[0].score >= pair[1].score));
            }
        }
    }

    #[test]
    fn normalized_scores_stay_in_unit_interval(run in arb_run()) {
        for (_, entries) in run.iter() {
            let normalized = normalize_min_max(entries);
            prop_assert_eq!(normalized.len(), entries.len());
            prop_assert!(normalized.iter().all(|(_, value)| (0.0..=1.0).contains(value)));
            prop_assert!(normalized.iter().any(|(_, value)| (*value - 1.0).abs() < 1e-12));
        }
    }

    #[test]
    fn combmnz_never_scores_below_combsum(a in arb_run(), b in arb_run(), c in arb_run()) {
        let runs = [a, b, c];
        let sum = fuse(&runs, &FusionMethod::CombSum).unwrap();
        let mnz = fuse(&runs, &FusionMethod::CombMnz).unwrap();
        for (qid, docs) in &sum {
            for doc in docs {
                let boosted = mnz[qid].iter().find(|d| d.doc_id == doc.doc_id).unwrap();
                prop_assert!(boosted.score >= doc.score - 1e-12);
            }
        }
    }

    #[test]
    fn written_runs_read_back_ranked_from_one(a in arb_run(), b in arb_run(), top_k in 1usize..8) {
        let fused = fuse(&[a, b], &FusionMethod::Rrf { k: 60.0 }).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fused.run");
        write_run(&to_results(&fused, top_k), &path, "fused", top_k).unwrap();

        let back = read_run(&path).unwrap();
        prop_assert_eq!(back.len(), fused.len());
        for (qid, entries) in back.iter() {
            let expected: Vec<&str> = fused[qid].iter().take(top_k).map(|d| d.doc_id.as_str()).collect();
            let actual: Vec<&str> = entries.iter().map(|e| e.doc_id.as_str()).collect();
            prop_assert_eq!(actual, expected);
            let ranks: Vec<u32> = entries.iter().map(|e| e.rank).collect();
            let expected_ranks: Vec<u32> = (1..=u32::try_from(entries.len()).unwrap()).collect();
            prop_assert_eq!(ranks, expected_ranks);
        }
    }
}
