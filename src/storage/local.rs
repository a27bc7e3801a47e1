//! Local filesystem storage.
//!
//! Inventories are stored as JSON Lines: one record per line, in file order.
//! Whole-file writes go through a temporary file and a rename so a reader
//! never sees a half-written inventory.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};

use crate::error::{AppError, Result};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    pub fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.path(key).is_file()
    }

    /// Ensure parent directory exists.
    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    pub fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path(key);
        self.ensure_dir(&path)?;

        let tmp = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.flush()?;
        drop(file);

        fs::rename(&tmp, &path)?;
        Ok(path)
    }

    /// Write pretty-printed JSON.
    pub fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<PathBuf> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes)
    }

    /// Read bytes, returning None if file doesn't exist.
    pub fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    pub fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Replace a JSON Lines file with the given records.
    pub fn write_jsonl<T: Serialize>(&self, key: &str, records: &[T]) -> Result<PathBuf> {
        let mut buf = Vec::new();
        for record in records {
            serde_json::to_writer(&mut buf, record)?;
            buf.push(b'\n');
        }
        let path = self.write_bytes(key, &buf)?;
        log::debug!("Wrote {} records to {}", records.len(), path.display());
        Ok(path)
    }

    /// Append records to a JSON Lines file, creating it if needed.
    pub fn append_jsonl<T: Serialize>(&self, key: &str, records: &[T]) -> Result<PathBuf> {
        let path = self.path(key);
        self.ensure_dir(&path)?;

        let mut buf = Vec::new();
        for record in records {
            serde_json::to_writer(&mut buf, record)?;
            buf.push(b'\n');
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(&buf)?;
        file.flush()?;
        log::debug!("Appended {} records to {}", records.len(), path.display());
        Ok(path)
    }

    /// Read every non-blank line of a JSON Lines file as `T`.
    ///
    /// Returns `None` if the file doesn't exist. The first malformed line
    /// fails the whole read with its 1-based record number.
    pub fn read_jsonl<T: DeserializeOwned>(&self, key: &str) -> Result<Option<Vec<T>>> {
        read_jsonl_file(&self.path(key))
    }
}

/// Read a JSON Lines file at an arbitrary path.
pub fn read_jsonl_file<T: DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(AppError::Io(e)),
    };

    let mut records = Vec::new();
    for (index, line) in non_blank_lines(BufReader::new(file)).enumerate() {
        let line = line?;
        let record = serde_json::from_str(&line).map_err(|e| {
            AppError::storage(format!(
                "{}: record {}: {}",
                path.display(),
                index + 1,
                e
            ))
        })?;
        records.push(record);
    }
    Ok(Some(records))
}

/// Lines of a reader with blank lines removed.
pub fn non_blank_lines<R: BufRead>(reader: R) -> impl Iterator<Item = std::io::Result<String>> {
    reader.lines().filter(|line| match line {
        Ok(text) => !text.trim().is_empty(),
        Err(_) => true,
    })
}
