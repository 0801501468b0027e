//! Temporary workspaces populated with runs, topics, qrels and corpora.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// `(query_id, doc_id, rank, score)`
pub type RunRow<'a> = (&'a str, &'a str, u32, f64);

/// Isolated directory that disappears with the fixture.
pub struct Workspace {
    pub temp_dir: TempDir,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    #[must_use]
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `content` to `relative_path`, creating parent directories.
    #[must_use]
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.path().join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    /// Write a six-column run file, rows in the order given.
    #[must_use]
    pub fn create_run(&self, relative_path: &str, label: &str, rows: &[RunRow<'_>]) -> PathBuf {
        let mut content = String::new();
        for (qid, doc, rank, score) in rows {
            let _ = writeln!(content, "{qid} Q0 {doc} {rank} {score:.6} {label}");
        }
        self.create_file(relative_path, &content)
    }

    /// Write `<top>` blocks carrying `(id, title, desc)`.
    #[must_use]
    pub fn create_topics(&self, relative_path: &str, topics: &[(&str, &str, &str)]) -> PathBuf {
        let mut content = String::new();
        for (id, title, desc) in topics {
            let _ = write!(
                content,
                "<top>\n<num> Number: {id}\n<title> {title}\n<desc> Description:\n{desc}\n</top>\n\n"
            );
        }
        self.create_file(relative_path, &content)
    }

    /// Write a JSONL corpus of `(id, contents)` records.
    #[must_use]
    pub fn create_corpus(&self, relative_path: &str, docs: &[(&str, &str)]) -> PathBuf {
        let mut content = String::new();
        for (id, text) in docs {
            let record = serde_json::json!({ "id": id, "contents": text });
            let _ = writeln!(content, "{record}");
        }
        self.create_file(relative_path, &content)
    }
}
