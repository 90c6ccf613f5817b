// Corpus Writer
//
// Persists formatted records as newline-delimited JSON. A writer returns a
// receipt only after every line is written and flushed; a failed write may
// leave a partial file behind.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Receipt of one written corpus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenCorpus {
    pub path: PathBuf,

    pub records: usize,

    /// Lowercase hex SHA-256 of the exact bytes written
    pub sha256: String,
}

/// Destination for formatted JSONL records
pub trait CorpusWriter {
    /// Write `lines` (one JSON object each, no trailing newline) as one corpus
    fn write_corpus(&mut self, file_name: &str, lines: &[String])
        -> Result<WrittenCorpus, WriterError>;
}

/// Hash of `lines` joined as the writer emits them
pub fn jsonl_digest(lines: &[String]) -> String {
    let mut hasher = Sha256::new();
    for line in lines {
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// FILESYSTEM
// ============================================================================

fn io_at(path: &Path) -> impl FnOnce(io::Error) -> WriterError {
    let path = path.to_path_buf();
    move |source| WriterError::Io { path, source }
}

/// Writes `<dir>/<file_name>`, replacing any existing file
#[derive(Debug, Clone)]
pub struct JsonlFileWriter {
    dir: PathBuf,
}

impl JsonlFileWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl CorpusWriter for JsonlFileWriter {
    fn write_corpus(
        &mut self,
        file_name: &str,
        lines: &[String],
    ) -> Result<WrittenCorpus, WriterError> {
        fs::create_dir_all(&self.dir).map_err(io_at(&self.dir))?;
        let path = self.dir.join(file_name);
        let file = File::create(&path).map_err(io_at(&path))?;
        let mut out = BufWriter::new(file);

        let mut hasher = Sha256::new();
        for line in lines {
            out.write_all(line.as_bytes()).map_err(io_at(&path))?;
            out.write_all(b"\n").map_err(io_at(&path))?;
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }
        out.flush().map_err(io_at(&path))?;

        let written = WrittenCorpus {
            path,
            records: lines.len(),
            sha256: format!("{:x}", hasher.finalize()),
        };
        info!(
            path = %written.path.display(),
            records = written.records,
            sha256 = %written.sha256,
            "corpus written"
        );
        Ok(written)
    }
}

// ============================================================================
// IN-MEMORY
// ============================================================================

/// Keeps every corpus in memory, keyed by file name
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    corpora: BTreeMap<String, Vec<String>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self, file_name: &str) -> Option<&[String]> {
        self.corpora.get(file_name).map(|v| v.as_slice())
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.corpora
    }
}

impl CorpusWriter for MemoryWriter {
    fn write_corpus(
        &mut self,
        file_name: &str,
        lines: &[String],
    ) -> Result<WrittenCorpus, WriterError> {
        self.corpora.insert(file_name.to_string(), lines.to_vec());
        Ok(WrittenCorpus {
            path: PathBuf::from(file_name),
            records: lines.len(),
            sha256: jsonl_digest(lines),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines() -> Vec<String> {
        vec![r#"{"a": 1}"#.to_string(), r#"{"b": 2}"#.to_string()]
    }

    #[test]
    fn test_file_writer_writes_lines_and_digest() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = JsonlFileWriter::new(dir.path());
        let written = writer.write_corpus("out.jsonl", &lines()).unwrap();

        let bytes = fs::read(dir.path().join("out.jsonl")).unwrap();
        assert_eq!(bytes, b"{\"a\": 1}\n{\"b\": 2}\n");
        assert_eq!(written.records, 2);
        assert_eq!(written.sha256, jsonl_digest(&lines()));

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        assert_eq!(written.sha256, format!("{:x}", hasher.finalize()));
    }

    #[test]
    fn test_file_writer_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let mut writer = JsonlFileWriter::new(&nested);
        writer.write_corpus("x.jsonl", &lines()).unwrap();
        assert!(nested.join("x.jsonl").exists());
    }

    #[test]
    fn test_file_writer_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"x").unwrap();
        let mut writer = JsonlFileWriter::new(&blocker);
        assert!(matches!(
            writer.write_corpus("x.jsonl", &lines()),
            Err(WriterError::Io { .. })
        ));
    }

    #[test]
    fn test_memory_writer_matches_file_digest() {
        let dir = tempfile::tempdir().unwrap();
        let on_disk = JsonlFileWriter::new(dir.path())
            .write_corpus("x.jsonl", &lines())
            .unwrap();
        let mut memory = MemoryWriter::new();
        let in_memory = memory.write_corpus("x.jsonl", &lines()).unwrap();
        assert_eq!(on_disk.sha256, in_memory.sha256);
        assert_eq!(memory.lines("x.jsonl").unwrap().len(), 2);
    }
}
