//! Line-oriented run file codec.
//!
//! Format, one result per line:
//!
//! ```text
//! query_id Q0 doc_id rank score run_label
//! ```
//!
//! Scores are written with six fractional digits. On read, any line with
//! fewer than six whitespace-separated fields (or an unparsable rank/score)
//! is skipped and counted rather than rejected.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use super::{Parsed, RUN_PLACEHOLDER, Run, RunEntry, RunResult};
use crate::error::{RankfuseError, Result};

/// Write results as a ranked run file.
///
/// Results are grouped per query id, stably sorted by score descending,
/// truncated to `max_rank`, and ranked from 1. Query blocks are emitted in
/// lexicographic order.
pub fn write_run(
    results: &[RunResult],
    output: &Path,
    run_label: &str,
    max_rank: usize,
) -> Result<()> {
    let mut grouped: BTreeMap<&str, Vec<(&str, f64)>> = BTreeMap::new();
    for result in results {
        grouped
            .entry(result.query_id.as_str())
            .or_default()
            .push((result.doc_id.as_str(), result.score));
    }

    ensure_parent_dir(output)?;
    let file = File::create(output).map_err(|err| RankfuseError::io(output, err))?;
    let mut writer = BufWriter::new(file);

    let mut written = 0usize;
    for (qid, mut docs) in grouped {
        docs.sort_by(|a, b| b.1.total_cmp(&a.1));
        for (rank, (doc_id, score)) in docs.into_iter().take(max_rank).enumerate() {
            writeln!(
                writer,
                "{qid} {RUN_PLACEHOLDER} {doc_id} {} {score:.6} {run_label}",
                rank + 1
            )
            .map_err(|err| RankfuseError::io(output, err))?;
            written += 1;
        }
    }
    writer
        .flush()
        .map_err(|err| RankfuseError::io(output, err))?;

    info!(path = %output.display(), run_label, lines = written, "wrote run");
    Ok(())
}

/// Read a run file, logging a warning when malformed lines were dropped.
pub fn read_run(path: &Path) -> Result<Run> {
    let parsed = load_run(path)?;
    if parsed.skipped_lines > 0 {
        warn!(
            path = %path.display(),
            skipped = parsed.skipped_lines,
            "skipped malformed run lines"
        );
    }
    Ok(parsed.value)
}

/// Read a run file and report how many lines were skipped.
pub fn load_run(path: &Path) -> Result<Parsed<Run>> {
    if !path.exists() {
        return Err(RankfuseError::NotFound {
            kind: "run file",
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|err| RankfuseError::io(path, err))?;
    let parsed = parse_run(BufReader::new(file)).map_err(|err| RankfuseError::io(path, err))?;
    debug!(
        path = %path.display(),
        queries = parsed.value.len(),
        entries = parsed.value.entry_count(),
        "loaded run"
    );
    Ok(parsed)
}

/// Parse run lines from any buffered reader.
pub fn parse_run(reader: impl BufRead) -> std::io::Result<Parsed<Run>> {
    let mut queries: BTreeMap<String, Vec<RunEntry>> = BTreeMap::new();
    let mut lines_read = 0;
    let mut skipped_lines = 0;

    for line in reader.lines() {
        let line = line?;
        lines_read += 1;
        match parse_line(&line) {
            Some((qid, entry)) => queries.entry(qid.to_string()).or_default().push(entry),
            None => skipped_lines += 1,
        }
    }

    Ok(Parsed {
        value: Run::from_entries(queries),
        lines_read,
        skipped_lines,
    })
}

fn parse_line(line: &str) -> Option<(&str, RunEntry)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 6 {
        return None;
    }
    let rank = parts[3].parse::<u32>().ok()?;
    let score = parts[4].parse::<f64>().ok()?;
    Some((parts[0], RunEntry::new(parts[2], rank, score)))
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|err| RankfuseError::io(parent, err))
        }
        _ => Ok(()),
    }
}
