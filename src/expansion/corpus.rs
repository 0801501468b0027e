//! Document sources backed by JSONL corpora or in-memory maps.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use super::DocumentSource;
use crate::error::{RankfuseError, Result};

#[derive(Debug, Deserialize)]
struct CorpusRecord {
    #[serde(alias = "docid", alias = "_id")]
    id: String,
    #[serde(default, alias = "text")]
    contents: String,
    #[serde(default)]
    title: Option<String>,
}

impl CorpusRecord {
    fn into_text(self) -> (String, String) {
        let text = match self.title {
            Some(title) if !title.trim().is_empty() => format!("{} {}", title.trim(), self.contents),
            _ => self.contents,
        };
        (self.id, text)
    }
}

/// A JSONL corpus loaded fully into memory.
///
/// Each line is an object with `id` (or `docid`/`_id`), `contents` (or
/// `text`) and an optional `title` that is prepended to the contents. Blank
/// lines are ignored. A repeated id keeps its last record.
#[derive(Debug, Clone, Default)]
pub struct JsonlCorpus {
    documents: HashMap<String, String>,
    files: Vec<PathBuf>,
}

impl JsonlCorpus {
    /// Load `path`. A file is read directly. A directory is searched for
    /// `<path>/<language>/*.jsonl` first, then `<path>/*.jsonl`, files in
    /// lexicographic order.
    pub fn open(path: &Path, language: Option<&str>) -> Result<Self> {
        if path.is_file() {
            return Self::from_files(vec![path.to_path_buf()]);
        }
        if !path.is_dir() {
            return Err(RankfuseError::NotFound {
                kind: "corpus",
                path: path.to_path_buf(),
            });
        }

        let language_dir = language.map(|lang| path.join(lang));
        let search_dir = match language_dir {
            Some(dir) if dir.is_dir() => dir,
            _ => path.to_path_buf(),
        };
        let files = jsonl_files(&search_dir)?;
        if files.is_empty() {
            return Err(RankfuseError::NotFound {
                kind: "JSONL files in corpus directory",
                path: search_dir,
            });
        }
        Self::from_files(files)
    }

    fn from_files(files: Vec<PathBuf>) -> Result<Self> {
        let mut documents = HashMap::new();
        for file in &files {
            let count = load_file(file, &mut documents)?;
            debug!(path = %file.display(), documents = count, "read corpus file");
        }
        info!(files = files.len(), documents = documents.len(), "loaded corpus");
        Ok(Self { documents, files })
    }

    pub fn get(&self, doc_id: &str) -> Option<&str> {
        self.documents.get(doc_id).map(String::as_str)
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentSource for JsonlCorpus {
    fn document_text(&self, doc_id: &str) -> Result<Option<String>> {
        Ok(self.get(doc_id).map(str::to_string))
    }
}

fn jsonl_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = dir.join("*.jsonl");
    let pattern = pattern.to_string_lossy();
    let entries = glob::glob(&pattern)
        .map_err(|err| RankfuseError::Config(format!("invalid corpus pattern {pattern}: {err}")))?;
    let mut files: Vec<PathBuf> = entries.filter_map(std::result::Result::ok).collect();
    files.sort();
    Ok(files)
}

fn load_file(path: &Path, documents: &mut HashMap<String, String>) -> Result<usize> {
    let file = File::open(path).map_err(|err| RankfuseError::io(path, err))?;
    let mut count = 0;
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|err| RankfuseError::io(path, err))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: CorpusRecord = serde_json::from_str(line).map_err(|err| {
            RankfuseError::Serialization(format!("{}:{}: {err}", path.display(), index + 1))
        })?;
        let (id, text) = record.into_text();
        documents.insert(id, text);
        count += 1;
    }
    Ok(count)
}

/// Documents held in a map; useful for tests and small feedback sets.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocuments {
    documents: HashMap<String, String>,
}

impl InMemoryDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, doc_id: impl Into<String>, text: impl Into<String>) {
        self.documents.insert(doc_id.into(), text.into());
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl FromIterator<(String, String)> for InMemoryDocuments {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            documents: iter.into_iter().collect(),
        }
    }
}

impl DocumentSource for InMemoryDocuments {
    fn document_text(&self, doc_id: &str) -> Result<Option<String>> {
        Ok(self.documents.get(doc_id).cloned())
    }
}
