//! rankfuse inspect - Summarize a run file, optionally against qrels

use std::path::PathBuf;

use clap::Args;
use itertools::{Itertools, MinMaxResult};
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{self, HumanLayout};
use crate::error::Result;
use crate::run::{Qrels, Run, load_run, read_qrels};

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Run file to summarize
    pub path: PathBuf,

    /// Qrels file; adds judged and relevant-retrieved counts
    #[arg(long, value_name = "PATH")]
    pub qrels: Option<PathBuf>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RunSummary {
    pub queries: usize,
    pub entries: usize,
    pub lines_read: usize,
    pub skipped_lines: usize,
    pub max_depth: usize,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub judgments: Option<JudgmentSummary>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct JudgmentSummary {
    /// Run queries that have at least one judgment.
    pub judged_queries: usize,
    /// Retrieved documents judged relevant (grade > 0).
    pub relevant_retrieved: usize,
    /// Relevant judgments over the run's queries.
    pub relevant_total: usize,
}

pub fn run(ctx: &AppContext, args: &InspectArgs) -> Result<()> {
    let parsed = load_run(&args.path)?;
    let mut summary = summarize(&parsed.value);
    summary.lines_read = parsed.lines_read;
    summary.skipped_lines = parsed.skipped_lines;
    if let Some(path) = &args.qrels {
        summary.judgments = Some(judge(&parsed.value, &read_qrels(path)?));
    }

    let mut warnings = Vec::new();
    if summary.skipped_lines > 0 {
        warnings.push(format!("{} malformed lines skipped", summary.skipped_lines));
    }

    if ctx.robot_mode {
        return output::emit_robot(&output::robot_ok(&summary).with_warnings(warnings));
    }

    let score_range = match (summary.min_score, summary.max_score) {
        (Some(min), Some(max)) => format!("{min:.6} .. {max:.6}"),
        _ => "-".to_string(),
    };
    let mut layout = HumanLayout::new();
    layout
        .title(&format!("Run {}", args.path.display()))
        .kv("queries", &summary.queries.to_string())
        .kv("entries", &summary.entries.to_string())
        .kv("max depth", &summary.max_depth.to_string())
        .kv("score range", &score_range);
    if let Some(judgments) = &summary.judgments {
        layout
            .blank()
            .section("Judgments")
            .kv("judged queries", &judgments.judged_queries.to_string())
            .kv(
                "relevant found",
                &format!("{} / {}", judgments.relevant_retrieved, judgments.relevant_total),
            );
    }
    for warning in &warnings {
        layout.warning(warning);
    }
    output::emit_human(&layout);
    Ok(())
}

pub fn summarize(run: &Run) -> RunSummary {
    let scores = run.iter().flat_map(|(_, entries)| entries.iter().map(|entry| entry.score));
    let (min_score, max_score) = match scores.minmax_by(f64::total_cmp) {
        MinMaxResult::NoElements => (None, None),
        MinMaxResult::OneElement(score) => (Some(score), Some(score)),
        MinMaxResult::MinMax(min, max) => (Some(min), Some(max)),
    };
    RunSummary {
        queries: run.len(),
        entries: run.entry_count(),
        lines_read: 0,
        skipped_lines: 0,
        max_depth: run.iter().map(|(_, entries)| entries.len()).max().unwrap_or(0),
        min_score,
        max_score,
        judgments: None,
    }
}

pub fn judge(run: &Run, qrels: &Qrels) -> JudgmentSummary {
    let mut summary = JudgmentSummary {
        judged_queries: 0,
        relevant_retrieved: 0,
        relevant_total: 0,
    };
    for (query_id, entries) in run.iter() {
        let Some(judgments) = qrels.get(query_id) else {
            continue;
        };
        summary.judged_queries += 1;
        summary.relevant_total += judgments.values().filter(|grade| **grade > 0).count();
        summary.relevant_retrieved += entries
            .iter()
            .filter(|entry| judgments.get(&entry.doc_id).is_some_and(|grade| *grade > 0))
            .count();
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::qrels::parse_qrels;
    use crate::run::trec::parse_run;

    const RUN: &str = "q1 Q0 d1 1 3.5 bm25\nq1 Q0 d2 2 1.25 bm25\nq2 Q0 d9 1 -0.5 bm25\n";

    #[test]
    fn summary_counts_depth_and_score_range() {
        let run = parse_run(RUN.as_bytes()).unwrap().value;
        let summary = summarize(&run);
        assert_eq!(summary.queries, 2);
        assert_eq!(summary.entries, 3);
        assert_eq!(summary.max_depth, 2);
        assert_eq!(summary.min_score, Some(-0.5));
        assert_eq!(summary.max_score, Some(3.5));
    }

    #[test]
    fn empty_run_has_no_score_range() {
        let summary = summarize(&Run::new());
        assert_eq!(summary.max_depth, 0);
        assert_eq!(summary.min_score, None);
    }

    #[test]
    fn judgments_only_count_relevant_grades() {
        let run = parse_run(RUN.as_bytes()).unwrap().value;
        let qrels = parse_qrels("q1 0 d1 2\nq1 0 d2 0\nq1 0 d5 1\nq3 0 d1 1\n".as_bytes())
            .unwrap()
            .value;
        assert_eq!(
            judge(&run, &qrels),
            JudgmentSummary {
                judged_queries: 1,
                relevant_retrieved: 1,
                relevant_total: 2,
            }
        );
    }
}
