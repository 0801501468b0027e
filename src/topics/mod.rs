//! Topic Store: benchmark query records.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{RankfuseError, Result};
use crate::run::trec::ensure_parent_dir;

pub mod parser;

pub use parser::parse_topics;

/// A benchmark topic. `id` joins topics, runs and qrels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topic {
    pub id: String,
    pub title: String,
    pub desc: String,
    pub narr: String,
}

impl Topic {
    pub fn new(
        id: impl Into<String>,
        title: impl AsRef<str>,
        desc: impl AsRef<str>,
        narr: impl AsRef<str>,
    ) -> Self {
        Self {
            id: id.into(),
            title: collapse_whitespace(title.as_ref()),
            desc: collapse_whitespace(desc.as_ref()),
            narr: collapse_whitespace(narr.as_ref()),
        }
    }

    /// Retrieval text: the title, plus description/narrative when requested
    /// and non-empty.
    pub fn query_text(&self, use_desc: bool, use_narr: bool) -> String {
        let mut parts = vec![self.title.as_str()];
        if use_desc && !self.desc.is_empty() {
            parts.push(&self.desc);
        }
        if use_narr && !self.narr.is_empty() {
            parts.push(&self.narr);
        }
        parts.join(" ")
    }
}

/// Fields may span lines in tagged files; written queries must not.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// On-disk layout for [`write_topics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopicFormat {
    #[default]
    Simple,
    Xml,
}

impl TopicFormat {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Xml => "xml",
        }
    }
}

impl FromStr for TopicFormat {
    type Err = RankfuseError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "xml" => Ok(Self::Xml),
            _ => Err(RankfuseError::UnknownMethod {
                kind: "topic format",
                value: value.to_string(),
            }),
        }
    }
}

pub fn read_topics(path: &Path) -> Result<Vec<Topic>> {
    if !path.exists() {
        return Err(RankfuseError::NotFound {
            kind: "topics file",
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|err| RankfuseError::io(path, err))?;
    let topics = parse_topics(&content);
    debug!(path = %path.display(), topics = topics.len(), "loaded topics");
    Ok(topics)
}

/// Map topic id to query text. A repeated id keeps its last occurrence.
pub fn topic_queries(topics: &[Topic], use_desc: bool, use_narr: bool) -> BTreeMap<String, String> {
    topics
        .iter()
        .map(|topic| (topic.id.clone(), topic.query_text(use_desc, use_narr)))
        .collect()
}

/// Write id -> query pairs, sorted by id.
pub fn write_topics(
    queries: &BTreeMap<String, String>,
    path: &Path,
    format: TopicFormat,
) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|err| RankfuseError::io(path, err))?;
    let mut writer = BufWriter::new(file);
    let io_err = |err| RankfuseError::io(path, err);

    for (id, query) in queries {
        match format {
            TopicFormat::Simple => writeln!(writer, "{id}\t{query}").map_err(io_err)?,
            TopicFormat::Xml => {
                write!(writer, "<top>\n<num> Number: {id}\n<title> {query}\n</top>\n\n")
                    .map_err(io_err)?;
            }
        }
    }
    writer.flush().map_err(io_err)?;
    info!(path = %path.display(), topics = queries.len(), ?format, "wrote topics");
    Ok(())
}
