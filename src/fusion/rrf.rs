//! Reciprocal Rank Fusion.

use super::Accumulator;
use crate::run::{Run, ScoredDocument};

/// RRF for one query: each entry adds `1 / (k + rank)`; raw scores are ignored.
pub(crate) fn fuse_query(runs: &[Run], query_id: &str, k: f64) -> Vec<ScoredDocument> {
    let mut acc = Accumulator::default();
    for entries in runs.iter().filter_map(|run| run.get(query_id)) {
        for entry in entries {
            acc.add(&entry.doc_id, 1.0 / (k + f64::from(entry.rank)));
        }
    }
    acc.into_ranked()
}
