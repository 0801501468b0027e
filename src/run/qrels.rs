//! Relevance judgments (`qid 0 doc_id grade`).
//!
//! The crate never computes metrics from qrels; they are loaded and written
//! so they can be handed to an external evaluation tool unchanged.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{info, warn};

use super::Parsed;
use super::trec::ensure_parent_dir;
use crate::error::{RankfuseError, Result};

/// query id -> doc id -> relevance grade (0 = not relevant).
pub type Qrels = BTreeMap<String, BTreeMap<String, i32>>;

pub fn read_qrels(path: &Path) -> Result<Qrels> {
    let parsed = load_qrels(path)?;
    if parsed.skipped_lines > 0 {
        warn!(
            path = %path.display(),
            skipped = parsed.skipped_lines,
            "skipped malformed qrels lines"
        );
    }
    Ok(parsed.value)
}

pub fn load_qrels(path: &Path) -> Result<Parsed<Qrels>> {
    if !path.exists() {
        return Err(RankfuseError::NotFound {
            kind: "qrels file",
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|err| RankfuseError::io(path, err))?;
    parse_qrels(BufReader::new(file)).map_err(|err| RankfuseError::io(path, err))
}

pub fn parse_qrels(reader: impl BufRead) -> std::io::Result<Parsed<Qrels>> {
    let mut qrels = Qrels::new();
    let mut lines_read = 0;
    let mut skipped_lines = 0;

    for line in reader.lines() {
        let line = line?;
        lines_read += 1;
        let parts: Vec<&str> = line.split_whitespace().collect();
        let grade = if parts.len() >= 4 {
            parts[3].parse::<i32>().ok()
        } else {
            None
        };
        match grade {
            Some(grade) => {
                qrels
                    .entry(parts[0].to_string())
                    .or_default()
                    .insert(parts[2].to_string(), grade);
            }
            None => skipped_lines += 1,
        }
    }

    Ok(Parsed {
        value: qrels,
        lines_read,
        skipped_lines,
    })
}

/// Write qrels sorted by query id then doc id.
pub fn write_qrels(qrels: &Qrels, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|err| RankfuseError::io(path, err))?;
    let mut writer = BufWriter::new(file);
    for (qid, judgments) in qrels {
        for (doc_id, grade) in judgments {
            writeln!(writer, "{qid} 0 {doc_id} {grade}").map_err(|err| RankfuseError::io(path, err))?;
        }
    }
    writer.flush().map_err(|err| RankfuseError::io(path, err))?;
    info!(path = %path.display(), queries = qrels.len(), "wrote qrels");
    Ok(())
}
