//! File reading utilities for the dev harness.
//!
//! The engine itself never touches the filesystem directly (artifacts
//! arrive as in-memory byte attachments); this module exists for the
//! `retrieval-core-dev` binary, which loads local files to build those
//! attachments.

use crate::error::{IoError, Result};
use std::fs::File;
use std::io::{Read, Write as _};
use std::path::Path;

/// Maximum file size to read into memory (1GB).
const MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

/// A local file opened for reading, with size validated up front.
pub struct FileReader {
    file: File,
    size: u64,
    path: String,
}

impl FileReader {
    /// Opens a file for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist, can't be opened, or
    /// exceeds [`MAX_FILE_SIZE`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let path_str = path_ref.to_string_lossy().to_string();

        if !path_ref.exists() {
            return Err(IoError::FileNotFound { path: path_str }.into());
        }

        let file = File::open(path_ref).map_err(|e| IoError::ReadFailed {
            path: path_str.clone(),
            reason: e.to_string(),
        })?;

        let metadata = file.metadata().map_err(|e| IoError::ReadFailed {
            path: path_str.clone(),
            reason: e.to_string(),
        })?;

        let size = metadata.len();
        if size > MAX_FILE_SIZE {
            return Err(IoError::ReadFailed {
                path: path_str,
                reason: format!("file too large: {size} bytes (max: {MAX_FILE_SIZE} bytes)"),
            }
            .into());
        }

        Ok(Self {
            file,
            size,
            path: path_str,
        })
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Returns the path this reader was opened from.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Reads the entire file into a byte vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails partway through.
    pub fn read_to_bytes(mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.size as usize);
        self.file
            .read_to_end(&mut buf)
            .map_err(|e| IoError::ReadFailed {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        Ok(buf)
    }

    /// Reads the entire file as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is not valid UTF-8 or the read fails.
    pub fn read_to_string(self) -> Result<String> {
        let path = self.path.clone();
        let bytes = self.read_to_bytes()?;
        String::from_utf8(bytes).map_err(|e| {
            IoError::ReadFailed {
                path,
                reason: e.to_string(),
            }
            .into()
        })
    }
}

/// Reads a file's contents as bytes.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    FileReader::open(path)?.read_to_bytes()
}

/// Writes bytes to a file, creating parent directories if needed.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the
/// write fails.
pub fn write_file<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path_ref = path.as_ref();
    let path_str = path_ref.to_string_lossy().to_string();

    if let Some(parent) = path_ref.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| IoError::DirectoryFailed {
                path: parent.to_string_lossy().to_string(),
                reason: e.to_string(),
            })?;
        }
    }

    let mut file = File::create(path_ref).map_err(|e| IoError::WriteFailed {
        path: path_str.clone(),
        reason: e.to_string(),
    })?;
    file.write_all(content).map_err(|e| IoError::WriteFailed {
        path: path_str,
        reason: e.to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_write_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_file(&path, b"hello").unwrap();
        let content = read_file(&path).unwrap();
        assert_eq!(content, b"hello");
    }

    #[test]
    fn test_open_missing_file() {
        let result = FileReader::open("/nonexistent/path/file.txt");
        assert!(result.is_err());
    }

    #[test]
    fn test_file_reader_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sized.txt");
        write_file(&path, b"12345").unwrap();
        let reader = FileReader::open(&path).unwrap();
        assert_eq!(reader.size(), 5);
    }
}
