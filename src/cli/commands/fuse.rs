//! rankfuse fuse - Combine run files with RRF or score fusion

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{self, HumanLayout};
use crate::error::{RankfuseError, Result};
use crate::fusion::{self, FusionMethod};
use crate::run::{Run, read_run, write_run};

#[derive(Args, Debug)]
pub struct FuseArgs {
    /// Run file to fuse; repeat for each input, order matters for ties
    #[arg(long = "run", value_name = "PATH")]
    pub runs: Vec<PathBuf>,

    /// Glob adding run files after the explicit ones, sorted by path
    #[arg(long, value_name = "PATTERN")]
    pub run_glob: Option<String>,

    /// Fusion method: rrf, linear, weighted, combsum, combmnz
    #[arg(long)]
    pub method: Option<String>,

    /// RRF constant k
    #[arg(long)]
    pub rrf_k: Option<f64>,

    /// Weight of the first run for weighted fusion
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Comma-separated per-run weights for linear fusion
    #[arg(long, value_delimiter = ',')]
    pub weights: Option<Vec<f64>>,

    /// Results kept per query
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Run label; defaults to input stems plus a method suffix
    #[arg(long)]
    pub run_id: Option<String>,

    /// Output path; defaults to `<runs_dir>/<run_id>.run`
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct FuseReport {
    method: &'static str,
    run_id: String,
    inputs: Vec<String>,
    output: String,
    queries: usize,
    results: usize,
}

pub fn run(ctx: &AppContext, args: &FuseArgs) -> Result<()> {
    let inputs = collect_inputs(&args.runs, args.run_glob.as_deref())?;
    let method = resolve_method(ctx, args)?;
    let top_k = args.top_k.unwrap_or(ctx.config.fusion.top_k);

    let runs = inputs
        .iter()
        .map(|path| read_run(path))
        .collect::<Result<Vec<Run>>>()?;
    let fused = fusion::fuse(&runs, &method)?;

    let run_id = args
        .run_id
        .clone()
        .unwrap_or_else(|| fusion::fused_run_label(&inputs, &method));
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| ctx.config.output.runs_dir.join(format!("{run_id}.run")));

    let results = fusion::to_results(&fused, top_k);
    write_run(&results, &output_path, &run_id, top_k)?;

    let report = FuseReport {
        method: method.name(),
        run_id,
        inputs: inputs.iter().map(|path| path.display().to_string()).collect(),
        output: output_path.display().to_string(),
        queries: fused.len(),
        results: results.len(),
    };

    if ctx.robot_mode {
        return output::emit_robot(&output::robot_ok(report));
    }

    let mut layout = HumanLayout::new();
    layout
        .title("Fused run")
        .kv("method", report.method)
        .kv("run id", &report.run_id)
        .kv("queries", &report.queries.to_string())
        .kv("results", &report.results.to_string())
        .kv("output", &report.output)
        .blank()
        .section("Inputs");
    for input in &report.inputs {
        layout.bullet(input);
    }
    output::emit_human(&layout);
    Ok(())
}

/// Explicit paths first, then sorted glob matches not already listed.
fn collect_inputs(explicit: &[PathBuf], pattern: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut inputs = explicit.to_vec();
    if let Some(pattern) = pattern {
        let mut matched: Vec<PathBuf> = glob::glob(pattern)
            .map_err(|err| RankfuseError::InvalidParameter {
                name: "run_glob",
                value: pattern.to_string(),
                reason: err.to_string(),
            })?
            .filter_map(std::result::Result::ok)
            .collect();
        matched.sort();
        for path in matched {
            if !inputs.contains(&path) {
                inputs.push(path);
            }
        }
    }
    if inputs.is_empty() {
        return Err(RankfuseError::InvalidParameter {
            name: "run",
            value: String::new(),
            reason: "at least one run file is required (--run or --run-glob)".to_string(),
        });
    }
    Ok(inputs)
}

fn resolve_method(ctx: &AppContext, args: &FuseArgs) -> Result<FusionMethod> {
    let mut params = ctx.config.fusion_params();
    if let Some(k) = args.rrf_k {
        params.rrf_k = k;
    }
    if let Some(alpha) = args.alpha {
        params.alpha = alpha;
    }
    if let Some(weights) = &args.weights {
        params.weights = Some(weights.clone());
    }
    let name = args.method.as_deref().unwrap_or(&ctx.config.fusion.method);
    FusionMethod::from_name(name, &params)
}
