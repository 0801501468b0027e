//! Fusion Engine: combine ranked lists from several retrieval systems.
//!
//! Every strategy works on one query id at a time, independently of all
//! others, and is total: each doc id that appears in any input run for a
//! query appears in the fused list for that query.
//!
//! Output lists are sorted by fused score descending. Equal scores keep the
//! order in which doc ids were first met while walking the runs in the
//! order they were passed. Reordering the input runs can therefore reorder
//! ties; membership and scores do not change, tie order does.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use rayon::prelude::*;
use tracing::info;

use crate::error::{RankfuseError, Result};
use crate::run::{Run, RunResult, ScoredDocument};

pub mod rrf;
pub mod score;

pub use score::normalize_min_max;

/// query id -> fused list, sorted by score descending.
pub type FusionResult = BTreeMap<String, Vec<ScoredDocument>>;

pub const DEFAULT_RRF_K: f64 = 60.0;
pub const DEFAULT_ALPHA: f64 = 0.5;

/// Allowed drift of a weight vector's sum away from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Selectable fusion strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum FusionMethod {
    /// Reciprocal Rank Fusion: sum of `1 / (k + rank)`; scores are ignored.
    Rrf { k: f64 },
    /// Weighted sum of min-max normalized scores. `None` means uniform `1/N`.
    Linear { weights: Option<Vec<f64>> },
    /// Two-run linear combination with weights `[alpha, 1 - alpha]`.
    Weighted { alpha: f64 },
    /// Unweighted sum of normalized scores.
    CombSum,
    /// CombSUM multiplied by the number of runs retrieving the document.
    CombMnz,
}

/// Raw knobs from configuration or the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionParams {
    pub rrf_k: f64,
    pub alpha: f64,
    pub weights: Option<Vec<f64>>,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            rrf_k: DEFAULT_RRF_K,
            alpha: DEFAULT_ALPHA,
            weights: None,
        }
    }
}

impl FusionMethod {
    pub const NAMES: [&'static str; 5] = ["rrf", "linear", "weighted", "combsum", "combmnz"];

    /// Build a method from its selector name.
    pub fn from_name(name: &str, params: &FusionParams) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "rrf" => Ok(Self::Rrf { k: params.rrf_k }),
            "linear" => Ok(Self::Linear {
                weights: params.weights.clone(),
            }),
            "weighted" => Ok(Self::Weighted {
                alpha: params.alpha,
            }),
            "combsum" => Ok(Self::CombSum),
            "combmnz" => Ok(Self::CombMnz),
            _ => Err(RankfuseError::UnknownMethod {
                kind: "fusion method",
                value: name.to_string(),
            }),
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Rrf { .. } => "rrf",
            Self::Linear { .. } => "linear",
            Self::Weighted { .. } => "weighted",
            Self::CombSum => "combsum",
            Self::CombMnz => "combmnz",
        }
    }

    /// Suffix appended to input run names to label the fused run.
    pub fn run_label_suffix(&self) -> String {
        match self {
            Self::Rrf { k } => format!("_hybrid_rrf_k{k}"),
            Self::Linear { .. } => "_hybrid_linear".to_string(),
            Self::Weighted { alpha } => format!("_hybrid_w{alpha:.2}"),
            Self::CombSum => "_hybrid_combsum".to_string(),
            Self::CombMnz => "_hybrid_combmnz".to_string(),
        }
    }

    /// Check parameters that do not depend on how many runs are fused.
    fn check_parameters(&self) -> Result<()> {
        match self {
            Self::Rrf { k } if !k.is_finite() || *k < 0.0 => Err(RankfuseError::InvalidParameter {
                name: "rrf_k",
                value: k.to_string(),
                reason: "must be a finite, non-negative number".to_string(),
            }),
            Self::Weighted { alpha } if !(0.0..=1.0).contains(alpha) => {
                Err(RankfuseError::InvalidParameter {
                    name: "alpha",
                    value: alpha.to_string(),
                    reason: "must be within [0, 1]".to_string(),
                })
            }
            Self::Linear {
                weights: Some(weights),
            } => check_weight_sum(weights),
            _ => Ok(()),
        }
    }

    /// Resolve the method into a per-query plan for `run_count` runs.
    fn plan(&self, run_count: usize) -> Result<Plan> {
        match self {
            Self::Rrf { k } => Ok(Plan::Rrf { k: *k }),
            Self::Linear { weights } => {
                let weights = match weights {
                    Some(weights) => weights.clone(),
                    None => uniform_weights(run_count),
                };
                check_weight_count(&weights, run_count)?;
                check_weight_sum(&weights)?;
                Ok(Plan::Score {
                    weights,
                    presence_multiplier: false,
                })
            }
            Self::Weighted { alpha } => {
                let weights = vec![*alpha, 1.0 - alpha];
                check_weight_count(&weights, run_count)?;
                Ok(Plan::Score {
                    weights,
                    presence_multiplier: false,
                })
            }
            Self::CombSum => Ok(Plan::Score {
                weights: vec![1.0; run_count],
                presence_multiplier: false,
            }),
            Self::CombMnz => Ok(Plan::Score {
                weights: vec![1.0; run_count],
                presence_multiplier: true,
            }),
        }
    }
}

#[derive(Debug, Clone)]
enum Plan {
    Rrf { k: f64 },
    Score {
        weights: Vec<f64>,
        presence_multiplier: bool,
    },
}

/// Fuse `runs` with `method`, one query id at a time.
///
/// An empty `runs` slice yields an empty result. Weight-vector and
/// parameter violations are returned before any query is processed.
pub fn fuse(runs: &[Run], method: &FusionMethod) -> Result<FusionResult> {
    method.check_parameters()?;
    if runs.is_empty() {
        return Ok(FusionResult::new());
    }
    let plan = method.plan(runs.len())?;

    let query_ids: BTreeSet<&str> = runs.iter().flat_map(Run::query_ids).collect();
    let fused: FusionResult = query_ids
        .into_par_iter()
        .map(|qid| {
            let ranked = match &plan {
                Plan::Rrf { k } => rrf::fuse_query(runs, qid, *k),
                Plan::Score {
                    weights,
                    presence_multiplier,
                } => score::fuse_query(runs, qid, weights, *presence_multiplier),
            };
            (qid.to_string(), ranked)
        })
        .collect();

    info!(
        method = method.name(),
        runs = runs.len(),
        queries = fused.len(),
        "fused runs"
    );
    Ok(fused)
}

/// Flatten a fusion result into writable rows, keeping the top `top_k` per query.
pub fn to_results(fused: &FusionResult, top_k: usize) -> Vec<RunResult> {
    fused
        .iter()
        .flat_map(|(qid, docs)| {
            docs.iter()
                .take(top_k)
                .map(move |doc| RunResult::new(qid.as_str(), doc.doc_id.as_str(), doc.score))
        })
        .collect()
}

/// Label for a fused run: input file stems joined by `_`, plus the method suffix.
pub fn fused_run_label<P: AsRef<Path>>(inputs: &[P], method: &FusionMethod) -> String {
    let stems: Vec<String> = inputs
        .iter()
        .map(|path| {
            path.as_ref()
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "run".to_string())
        })
        .collect();
    format!("{}{}", stems.join("_"), method.run_label_suffix())
}

fn uniform_weights(run_count: usize) -> Vec<f64> {
    #[allow(clippy::cast_precision_loss)]
    let weight = 1.0 / run_count as f64;
    vec![weight; run_count]
}

fn check_weight_count(weights: &[f64], run_count: usize) -> Result<()> {
    if weights.len() == run_count {
        Ok(())
    } else {
        Err(RankfuseError::InvalidWeights(format!(
            "{} weights {weights:?} given for {run_count} runs",
            weights.len()
        )))
    }
}

fn check_weight_sum(weights: &[f64]) -> Result<()> {
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() <= WEIGHT_SUM_TOLERANCE {
        Ok(())
    } else {
        Err(RankfuseError::InvalidWeights(format!(
            "weights {weights:?} sum to {sum}, expected 1.0"
        )))
    }
}

/// Per-query score accumulator that remembers first-encounter order.
#[derive(Default)]
pub(crate) struct Accumulator<'a> {
    index: HashMap<&'a str, usize>,
    docs: Vec<(&'a str, f64, u32)>,
}

impl<'a> Accumulator<'a> {
    pub(crate) fn add(&mut self, doc_id: &'a str, contribution: f64) {
        if let Some(&slot) = self.index.get(doc_id) {
            let entry = &mut self.docs[slot];
            entry.1 += contribution;
            entry.2 += 1;
        } else {
            self.index.insert(doc_id, self.docs.len());
            self.docs.push((doc_id, contribution, 1));
        }
    }

    /// Multiply each score by how many times the doc was added.
    pub(crate) fn scale_by_presence(&mut self) {
        for (_, score, count) in &mut self.docs {
            *score *= f64::from(*count);
        }
    }

    /// Stable sort by score descending.
    pub(crate) fn into_ranked(self) -> Vec<ScoredDocument> {
        let mut ranked: Vec<ScoredDocument> = self
            .docs
            .into_iter()
            .map(|(doc_id, score, _)| ScoredDocument::new(doc_id, score))
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }
}
