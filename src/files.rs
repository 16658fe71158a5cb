//! File selection: the command-line stand-in for the page's file picker.
//!
//! Explicit paths are taken as given. Directories are walked and only
//! `.pdf` files are kept, which is what the picker's `accept` filter does.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Content type sent for PDF parts.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Content type sent for anything the picker could not identify.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Errors raised while building a selection.
#[derive(Error, Debug)]
pub enum PickError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("{0} has no file name")]
    NoFileName(PathBuf),
}

/// One file chosen for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// File name sent in the multipart part (no directory components)
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    /// Build a selected file from in-memory content.
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its content type from the extension.
    pub fn from_path(path: &Path) -> Result<Self, PickError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PickError::NoFileName(path.to_path_buf()))?
            .to_string();

        let bytes = fs::read(path).map_err(|source| PickError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            content_type: content_type_for(path).to_string(),
            name,
            bytes,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Content type reported for a path.
pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => PDF_CONTENT_TYPE,
        _ => FALLBACK_CONTENT_TYPE,
    }
}

fn is_pdf(path: &Path) -> bool {
    content_type_for(path) == PDF_CONTENT_TYPE
}

/// Expand the given paths into the list of files to select.
///
/// Files keep their argument order; each directory contributes its PDFs
/// sorted by path. Hidden directories are skipped.
pub fn collect_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>, PickError> {
    let mut out = Vec::new();

    for root in paths {
        let metadata = fs::metadata(root).map_err(|source| PickError::Read {
            path: root.clone(),
            source,
        })?;

        if !metadata.is_dir() {
            out.push(root.clone());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| {
                let name = e.file_name().to_string_lossy();
                !(e.depth() > 0 && e.file_type().is_dir() && name.starts_with('.'))
            })
        {
            let entry = entry.map_err(|source| PickError::Walk {
                path: root.clone(),
                source,
            })?;
            if entry.file_type().is_file() && is_pdf(entry.path()) {
                found.push(entry.path().to_path_buf());
            }
        }
        found.sort();
        out.extend(found);
    }

    Ok(out)
}

/// Build a selection from command-line paths.
pub fn pick(paths: &[PathBuf]) -> Result<Vec<SelectedFile>, PickError> {
    let selected = collect_paths(paths)?
        .iter()
        .map(|p| SelectedFile::from_path(p))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(count = selected.len(), "picked files");
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("a.pdf")), PDF_CONTENT_TYPE);
        assert_eq!(content_type_for(Path::new("B.PDF")), PDF_CONTENT_TYPE);
        assert_eq!(content_type_for(Path::new("notes.txt")), FALLBACK_CONTENT_TYPE);
        assert_eq!(content_type_for(Path::new("README")), FALLBACK_CONTENT_TYPE);
    }

    #[test]
    fn test_from_path_reads_bytes() {
        let temp = TempDir::new().unwrap();
        let path = create_file(temp.path(), "report.pdf", b"%PDF-1.4 body");

        let file = SelectedFile::from_path(&path).unwrap();
        assert_eq!(file.name, "report.pdf");
        assert_eq!(file.content_type, PDF_CONTENT_TYPE);
        assert_eq!(file.bytes, b"%PDF-1.4 body");
        assert_eq!(file.len(), 13);
    }

    #[test]
    fn test_from_path_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = SelectedFile::from_path(&temp.path().join("nope.pdf")).unwrap_err();
        assert!(matches!(err, PickError::Read { .. }));
    }

    #[test]
    fn test_directory_keeps_only_pdfs_sorted() {
        let temp = TempDir::new().unwrap();
        create_file(temp.path(), "b.pdf", b"b");
        create_file(temp.path(), "a.pdf", b"a");
        create_file(temp.path(), "notes.txt", b"x");
        create_file(temp.path(), "nested/c.pdf", b"c");
        create_file(temp.path(), ".hidden/d.pdf", b"d");

        let paths = collect_paths(&[temp.path().to_path_buf()]).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.strip_prefix(temp.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();

        assert_eq!(names, vec!["a.pdf", "b.pdf", "nested/c.pdf"]);
    }

    #[test]
    fn test_explicit_file_kept_regardless_of_extension() {
        let temp = TempDir::new().unwrap();
        let txt = create_file(temp.path(), "notes.txt", b"x");
        let pdf = create_file(temp.path(), "z.pdf", b"z");

        let selected = pick(&[txt, pdf]).unwrap();
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].name, "notes.txt");
        assert_eq!(selected[0].content_type, FALLBACK_CONTENT_TYPE);
        assert_eq!(selected[1].name, "z.pdf");
    }

    #[test]
    fn test_empty_directory_yields_empty_selection() {
        let temp = TempDir::new().unwrap();
        let selected = pick(&[temp.path().to_path_buf()]).unwrap();
        assert!(selected.is_empty());
    }
}
