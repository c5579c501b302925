//! Document text extraction and discovery.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::traits::TextExtractor;

const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "txt", "md"];

/// Extracts PDFs with `pdf-extract` and reads everything else as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileExtractor;

impl FileExtractor {
    pub fn new() -> Self { Self }

    fn extract_pdf(&self, path: &Path) -> Result<String> {
        let mut text = pdf_extract::extract_text(path).map_err(|e| Error::extraction(path, e))?;
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Ok(text)
    }

    fn extract_plain(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).map_err(|e| Error::extraction(path, e))?;
        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(e) => Ok(String::from_utf8_lossy(e.as_bytes()).into_owned()),
        }
    }
}

impl TextExtractor for FileExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        let is_pdf = path.extension().and_then(|s| s.to_str()).is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        let text = if is_pdf { self.extract_pdf(path)? } else { self.extract_plain(path)? };
        debug!(path = %path.display(), chars = text.chars().count(), "extracted document text");
        Ok(text)
    }
}

/// Expands `inputs` into a sorted list of ingestible files. Directories are
/// walked recursively and filtered to pdf/txt/md; plain file paths are kept
/// as given.
pub fn discover_documents(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = walkdir::WalkDir::new(input)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| is_document(p))
                .collect();
            found.sort();
            files.extend(found);
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            return Err(Error::extraction(input, "no such file or directory"));
        }
    }
    Ok(files)
}

/// The name a document is stored under: its file name, without directories.
pub fn source_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| DOCUMENT_EXTENSIONS.iter().any(|d| ext.eq_ignore_ascii_case(d)))
}
