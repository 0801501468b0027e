//! rankfuse expand - Rewrite topic queries from pseudo-relevant feedback

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{self, HumanLayout};
use crate::error::Result;
use crate::expansion::{DocumentSource, ExpansionMethod, JsonlCorpus, build_expander};
use crate::pipeline::{ExpandedQuery, ExpansionOptions, expand_topics};
use crate::run::read_run;
use crate::topics::{TopicFormat, read_topics, write_topics};

#[derive(Args, Debug)]
pub struct ExpandArgs {
    /// Run whose top documents are the feedback set
    #[arg(long, value_name = "PATH")]
    pub base_run: PathBuf,

    /// Topics file (tagged `<top>` blocks or `id query` lines)
    #[arg(long, value_name = "PATH")]
    pub topics: PathBuf,

    /// JSONL corpus file or directory (`<dir>/<language>/*.jsonl`)
    #[arg(long, value_name = "PATH")]
    pub corpus: PathBuf,

    /// Expansion method: rm3, prf
    #[arg(long)]
    pub method: Option<ExpansionMethod>,

    /// Feedback documents per query
    #[arg(long)]
    pub fb_docs: Option<usize>,

    /// Expansion terms per query
    #[arg(long)]
    pub fb_terms: Option<usize>,

    /// RM3 weight of the original query terms
    #[arg(long)]
    pub original_query_weight: Option<f64>,

    /// Analyzer language code
    #[arg(long)]
    pub language: Option<String>,

    /// Append topic descriptions to the query
    #[arg(long)]
    pub use_desc: bool,

    /// Append topic narratives to the query
    #[arg(long)]
    pub use_narr: bool,

    /// Write expanded queries here as `id<TAB>query` lines
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct ExpandReport<'a> {
    method: &'static str,
    language: &'a str,
    output: Option<String>,
    queries: &'a BTreeMap<String, ExpandedQuery>,
    skipped: &'a [String],
}

pub fn run(ctx: &AppContext, args: &ExpandArgs) -> Result<()> {
    let config = &ctx.config;
    let method = match args.method {
        Some(method) => method,
        None => config.expansion_method()?,
    };
    let language = args.language.as_deref().unwrap_or(&config.expansion.language);
    let options = ExpansionOptions {
        fb_docs: args.fb_docs.unwrap_or(config.expansion.fb_docs),
        fb_terms: args.fb_terms.unwrap_or(config.expansion.fb_terms),
        use_desc: args.use_desc || config.topics.use_desc,
        use_narr: args.use_narr || config.topics.use_narr,
    };
    let original_query_weight = args
        .original_query_weight
        .unwrap_or(config.expansion.original_query_weight);

    let base_run = read_run(&args.base_run)?;
    let topics = read_topics(&args.topics)?;
    let corpus: Arc<dyn DocumentSource> = Arc::new(JsonlCorpus::open(&args.corpus, Some(language))?);
    let expander = build_expander(method, ctx.analyzers.get(language), corpus, original_query_weight)?;

    let outcome = expand_topics(&topics, &base_run, expander.as_ref(), &options);

    if let Some(path) = &args.output {
        let queries: BTreeMap<String, String> = outcome
            .completed
            .iter()
            .map(|(id, query)| (id.clone(), query.expanded.clone()))
            .collect();
        write_topics(&queries, path, TopicFormat::Simple)?;
    }

    let warnings: Vec<String> = outcome
        .skipped
        .iter()
        .map(|id| format!("topic {id} not in base run"))
        .collect();

    if ctx.robot_mode {
        let report = ExpandReport {
            method: method.name(),
            language,
            output: args.output.as_ref().map(|path| path.display().to_string()),
            queries: &outcome.completed,
            skipped: &outcome.skipped,
        };
        return output::emit_robot(&output::robot_ok(report).with_warnings(warnings));
    }

    if args.output.is_none() {
        for (id, query) in &outcome.completed {
            println!("{id}\t{}", query.expanded);
        }
        return Ok(());
    }

    let mut layout = HumanLayout::new();
    layout
        .title("Expanded queries")
        .kv("method", method.name())
        .kv("language", language)
        .kv("expanded", &outcome.completed.len().to_string())
        .kv("skipped", &outcome.skipped.len().to_string());
    if let Some(path) = &args.output {
        layout.kv("output", &path.display().to_string());
    }
    for warning in &warnings {
        layout.warning(warning);
    }
    output::emit_human(&layout);
    Ok(())
}
