//! rankfuse topics - Show or convert topic files

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{self, HumanLayout};
use crate::error::Result;
use crate::topics::{Topic, TopicFormat, read_topics, topic_queries, write_topics};

#[derive(Args, Debug)]
pub struct TopicsArgs {
    #[command(subcommand)]
    pub command: TopicsCommand,
}

#[derive(Subcommand, Debug)]
pub enum TopicsCommand {
    /// Print each topic id with its query text
    Show {
        /// Topics file
        path: PathBuf,

        /// Append descriptions
        #[arg(long)]
        use_desc: bool,

        /// Append narratives
        #[arg(long)]
        use_narr: bool,
    },

    /// Rewrite a topics file as `id<TAB>query` lines or `<top>` blocks
    Convert {
        /// Topics file to read
        path: PathBuf,

        /// Output path
        #[arg(short, long)]
        output: PathBuf,

        /// Output format: simple, xml (defaults to output.topic_format)
        #[arg(long)]
        format: Option<TopicFormat>,

        /// Append descriptions
        #[arg(long)]
        use_desc: bool,

        /// Append narratives
        #[arg(long)]
        use_narr: bool,
    },
}

#[derive(Serialize)]
struct ShownTopic<'a> {
    #[serde(flatten)]
    topic: &'a Topic,
    query: String,
}

pub fn run(ctx: &AppContext, args: &TopicsArgs) -> Result<()> {
    match &args.command {
        TopicsCommand::Show {
            path,
            use_desc,
            use_narr,
        } => show(
            ctx,
            path,
            *use_desc || ctx.config.topics.use_desc,
            *use_narr || ctx.config.topics.use_narr,
        ),
        TopicsCommand::Convert {
            path,
            output,
            format,
            use_desc,
            use_narr,
        } => {
            let format = match format {
                Some(format) => *format,
                None => ctx.config.topic_format()?,
            };
            convert(
                ctx,
                path,
                output,
                format,
                *use_desc || ctx.config.topics.use_desc,
                *use_narr || ctx.config.topics.use_narr,
            )
        }
    }
}

fn show(ctx: &AppContext, path: &Path, use_desc: bool, use_narr: bool) -> Result<()> {
    let topics = read_topics(path)?;

    if ctx.robot_mode {
        let shown: Vec<ShownTopic<'_>> = topics
            .iter()
            .map(|topic| ShownTopic {
                topic,
                query: topic.query_text(use_desc, use_narr),
            })
            .collect();
        return output::emit_robot(&output::robot_ok(shown));
    }

    for topic in &topics {
        println!("{}\t{}", topic.id, topic.query_text(use_desc, use_narr));
    }
    Ok(())
}

fn convert(
    ctx: &AppContext,
    path: &Path,
    output_path: &Path,
    format: TopicFormat,
    use_desc: bool,
    use_narr: bool,
) -> Result<()> {
    let topics = read_topics(path)?;
    let queries = topic_queries(&topics, use_desc, use_narr);
    write_topics(&queries, output_path, format)?;

    if ctx.robot_mode {
        return output::emit_robot(&output::robot_ok(serde_json::json!({
            "input": path.display().to_string(),
            "output": output_path.display().to_string(),
            "format": format.name(),
            "topics": queries.len(),
        })));
    }

    let mut layout = HumanLayout::new();
    layout
        .title("Converted topics")
        .kv("input", &path.display().to_string())
        .kv("output", &output_path.display().to_string())
        .kv("format", format.name())
        .kv("topics", &queries.len().to_string());
    output::emit_human(&layout);
    Ok(())
}
