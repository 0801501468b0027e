//! Score-based fusion: min-max normalization and weighted sums.
//!
//! Linear, Weighted, CombSUM and CombMNZ share one mechanism and differ only
//! in the per-run weights and whether the sum is multiplied by the number of
//! runs that retrieved the document. CombSUM/CombMNZ use weight 1 per run,
//! not `1/N`.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use super::Accumulator;
use crate::run::{Run, RunEntry, ScoredDocument};

/// Min-max normalize one ranked list into `[0, 1]`.
///
/// When every score is identical (including a single entry) each doc gets
/// `1.0`. A doc id repeated in the list keeps its first position and the
/// value of its last occurrence. An empty list yields an empty vector.
pub fn normalize_min_max(entries: &[RunEntry]) -> Vec<(&str, f64)> {
    if entries.is_empty() {
        return Vec::new();
    }
    let (min, max) = entries
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), entry| {
            (lo.min(entry.score), hi.max(entry.score))
        });
    let range = max - min;

    let mut index: HashMap<&str, usize> = HashMap::with_capacity(entries.len());
    let mut normalized: Vec<(&str, f64)> = Vec::with_capacity(entries.len());
    for entry in entries {
        #[allow(clippy::float_cmp)]
        let value = if range == 0.0 {
            1.0
        } else {
            (entry.score - min) / range
        };
        match index.entry(entry.doc_id.as_str()) {
            Entry::Occupied(slot) => normalized[*slot.get()].1 = value,
            Entry::Vacant(slot) => {
                slot.insert(normalized.len());
                normalized.push((entry.doc_id.as_str(), value));
            }
        }
    }
    normalized
}

/// Weighted sum of normalized scores for one query.
pub(crate) fn fuse_query(
    runs: &[Run],
    query_id: &str,
    weights: &[f64],
    presence_multiplier: bool,
) -> Vec<ScoredDocument> {
    let mut acc = Accumulator::default();
    for (run, weight) in runs.iter().zip(weights) {
        let Some(entries) = run.get(query_id) else {
            continue;
        };
        for (doc_id, value) in normalize_min_max(entries) {
            acc.add(doc_id, weight * value);
        }
    }
    if presence_multiplier {
        acc.scale_by_presence();
    }
    acc.into_ranked()
}
