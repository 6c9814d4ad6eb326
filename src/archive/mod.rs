//! Repository archive extraction (spec.md §4.6 step 1-2).
//!
//! Unpacks a zip archive into its non-directory, non-dotfile entries, then
//! narrows that list to the repository-indexable extension set the
//! Indexer chunks. Kept as a thin wrapper over the `zip` crate rather than
//! folded into the indexer module so the extraction step stays testable
//! independent of the store.

use crate::chunking::REPO_INDEX_EXTS;
use crate::error::{IndexError, IoError};
use crate::Result;
use std::io::{Cursor, Read};
use std::path::Path;

/// One file extracted from a repository archive, before extension
/// filtering.
#[derive(Debug, Clone)]
pub struct ExtractedFile {
    /// Path within the archive, exactly as stored (forward-slash separated).
    pub path: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

/// Opens `archive_bytes` as a zip archive and returns every non-directory,
/// non-dotfile entry.
///
/// # Errors
///
/// Returns [`IndexError::Archive`] if the bytes are not a valid zip
/// archive or an entry cannot be read.
pub fn extract_files(archive_bytes: &[u8]) -> Result<Vec<ExtractedFile>> {
    let cursor = Cursor::new(archive_bytes);
    let mut archive = zip::ZipArchive::new(cursor)
        .map_err(|e| IndexError::Archive(format!("failed to open archive: {e}")))?;

    let mut files = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| IndexError::Archive(format!("failed to read entry {i}: {e}")))?;

        if entry.is_dir() {
            continue;
        }
        let path = entry.name().to_string();
        if is_dotfile(&path) {
            continue;
        }

        let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry.read_to_end(&mut bytes).map_err(|e| {
            IoError::ReadFailed {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;
        files.push(ExtractedFile { path, bytes });
    }
    Ok(files)
}

/// Narrows `files` down to the repository-indexable extension set
/// (spec.md §4.6 step 2), matching `Dockerfile` by filename instead of
/// extension.
#[must_use]
pub fn filter_indexable(files: Vec<ExtractedFile>) -> Vec<ExtractedFile> {
    files.into_iter().filter(|f| is_indexable(&f.path)).collect()
}

fn is_dotfile(path: &str) -> bool {
    basename(path).starts_with('.')
}

fn is_indexable(path: &str) -> bool {
    let name = basename(path);
    if name.eq_ignore_ascii_case("dockerfile") {
        return true;
    }
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| REPO_INDEX_EXTS.contains(&ext.to_lowercase().as_str()))
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let cursor = Cursor::new(&mut buf);
            let mut writer = zip::ZipWriter::new(cursor);
            let options = SimpleFileOptions::default();
            for (name, content) in entries {
                writer.start_file(*name, options).unwrap();
                writer.write_all(content).unwrap();
            }
            writer.finish().unwrap();
        }
        buf
    }

    #[test]
    fn test_extract_files_skips_dotfiles() {
        let bytes = build_zip(&[("README.md", b"hi"), (".gitignore", b"*.log")]);
        let files = extract_files(&bytes).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "README.md");
    }

    #[test]
    fn test_filter_indexable_keeps_known_extensions() {
        let bytes = build_zip(&[("src/a.py", b"x"), ("image.png", b"x"), ("Dockerfile", b"FROM scratch")]);
        let files = filter_indexable(extract_files(&bytes).unwrap());
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert!(paths.contains(&"src/a.py"));
        assert!(paths.contains(&"Dockerfile"));
        assert!(!paths.contains(&"image.png"));
    }

    #[test]
    fn test_is_indexable_case_insensitive_dockerfile() {
        assert!(is_indexable("docker/Dockerfile"));
        assert!(!is_indexable("docker/Dockerfile.bak"));
    }
}
