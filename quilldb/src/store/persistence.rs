use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{
    collection::{Document, DocumentId},
    common::{validate_document, TEMP_FILE_SUFFIX},
    errors::{ErrorKind, QuillError, QuillResult},
};

use super::DocumentIndex;

/// Outcome of loading a log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    loaded: usize,
    corrupted_lines: Vec<String>,
}

impl LoadReport {
    /// Number of records restored into the index.
    pub fn loaded(&self) -> usize {
        self.loaded
    }

    /// Raw text of every line skipped as corrupt, in file order.
    pub fn corrupted_lines(&self) -> &[String] {
        &self.corrupted_lines
    }

    pub fn is_clean(&self) -> bool {
        self.corrupted_lines.is_empty()
    }
}

/// The durable form of a datastore: a UTF-8 text file holding one JSON
/// document per line.
///
/// An empty file is a valid empty database. [PersistenceLog::persist] writes
/// the whole index at once, through a temporary sibling file that is renamed
/// over the log, so readers never observe a half-written log.
#[derive(Debug, Clone)]
pub struct PersistenceLog {
    path: PathBuf,
}

impl PersistenceLog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        PersistenceLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the log into `index`.
    ///
    /// If the file does not exist it is created empty, together with its
    /// parent directories, and `index` is left as is. Otherwise every
    /// non-empty line is parsed into a document and validated; a line that
    /// fails is a corrupt record. Under `strict` the first corrupt record is
    /// returned as a `CorruptRecord` error and `index` is not touched. When
    /// not strict, corrupt lines are skipped and reported in the returned
    /// [LoadReport].
    ///
    /// On success `index` is replaced by the content of the log. A later line
    /// with the same `_id` as an earlier one replaces it in place.
    pub fn load(&self, index: &mut DocumentIndex, strict: bool) -> QuillResult<LoadReport> {
        if !self.path.exists() {
            self.create_empty()?;
            log::debug!("Created empty log at {}", self.path.display());
            return Ok(LoadReport::default());
        }

        let content = fs::read(&self.path)?;
        let mut staging = DocumentIndex::new();
        let mut report = LoadReport::default();

        for (line_number, line) in content.split(|byte| *byte == b'\n').enumerate() {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            match parse_line(line) {
                Ok((id, document)) => staging.restore(id, document),
                Err(e) if strict => {
                    log::error!(
                        "Corrupt record at line {} of {}: {}",
                        line_number + 1,
                        self.path.display(),
                        e
                    );
                    return Err(QuillError::new_with_cause(
                        &format!(
                            "Corrupt record at line {} of {}",
                            line_number + 1,
                            self.path.display()
                        ),
                        ErrorKind::CorruptRecord,
                        e,
                    ));
                }
                Err(e) => {
                    log::warn!(
                        "Skipping corrupt record at line {} of {}: {}",
                        line_number + 1,
                        self.path.display(),
                        e
                    );
                    report
                        .corrupted_lines
                        .push(String::from_utf8_lossy(line).into_owned());
                }
            }
        }

        report.loaded = staging.len();
        *index = staging;
        log::debug!(
            "Loaded {} records from {} ({} corrupt lines skipped)",
            report.loaded,
            self.path.display(),
            report.corrupted_lines.len()
        );
        Ok(report)
    }

    /// Writes every live record of `index` to the log, in index order.
    ///
    /// Tombstoned records are purged from `index` once the log is written.
    /// A record that fails to serialize (for instance one holding a
    /// non-finite number) is, under `strict`, a `CorruptRecord` error that
    /// leaves both `index` and the log unchanged; otherwise it is left out of
    /// the log and purged from `index` as well.
    pub fn persist(&self, index: &mut DocumentIndex, strict: bool) -> QuillResult<()> {
        let mut buffer = String::new();
        let mut unserializable = HashSet::new();

        for (id, record) in index.iter() {
            if record.is_deleted() {
                continue;
            }

            match serde_json::to_string(record.document()) {
                Ok(line) => {
                    buffer.push_str(&line);
                    buffer.push('\n');
                }
                Err(e) if strict => {
                    log::error!("Failed to serialize record {}: {}", id, e);
                    return Err(QuillError::new_with_cause(
                        &format!("Failed to serialize record {}", id),
                        ErrorKind::CorruptRecord,
                        e.into(),
                    ));
                }
                Err(e) => {
                    log::warn!("Dropping record {} that cannot be serialized: {}", id, e);
                    unserializable.insert(id.clone());
                }
            }
        }

        self.write_atomic(buffer.as_bytes())?;

        let purged = index.purge(|id, record| record.is_deleted() || unserializable.contains(id));
        log::debug!(
            "Persisted {} records to {} ({} purged)",
            index.len(),
            self.path.display(),
            purged
        );
        Ok(())
    }

    fn create_empty(&self) -> QuillResult<()> {
        self.ensure_parent()?;
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        Ok(())
    }

    fn ensure_parent(&self) -> QuillResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp: OsString = self.path.clone().into_os_string();
        temp.push(".");
        temp.push(TEMP_FILE_SUFFIX);
        PathBuf::from(temp)
    }

    // write, fsync, rename
    fn write_atomic(&self, bytes: &[u8]) -> QuillResult<()> {
        self.ensure_parent()?;
        let temp_path = self.temp_path();

        if let Err(e) = write_synced(&temp_path, bytes) {
            log::error!("Failed to write {}: {}", temp_path.display(), e);
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            log::error!(
                "Failed to replace {} with {}: {}",
                self.path.display(),
                temp_path.display(),
                e
            );
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        self.sync_parent()
    }

    #[cfg(unix)]
    fn sync_parent(&self) -> QuillResult<()> {
        if let Some(parent) = self.path.parent() {
            if parent.exists() {
                File::open(parent)?.sync_all()?;
            }
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_parent(&self) -> QuillResult<()> {
        Ok(())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> QuillResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

fn parse_line(line: &[u8]) -> QuillResult<(DocumentId, Document)> {
    let line = std::str::from_utf8(line).map_err(|e| {
        QuillError::new(
            &format!("Record is not valid UTF-8: {}", e),
            ErrorKind::EncodingError,
        )
    })?;
    let document: Document = serde_json::from_str(line)?;
    let id = validate_document(&document)?;
    Ok((id, document))
}
