//! Document extraction: format-specific readers normalizing PDF and DOCX
//! sources into the shared [`SourceDocument`] model.

mod docx;
mod pdf;

pub use docx::DocxExtractor;
pub use pdf::PdfExtractor;

use std::path::{Path, PathBuf};

use crate::detect::{detect_format, DocFormat};
use crate::error::Result;
use crate::model::SourceDocument;

/// Options for document extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Directory for extracted image artifacts; the session directory
    /// when unset
    pub temp_dir: Option<PathBuf>,
    /// Whether to compose the page-1 header-region snapshot (PDF only)
    pub header_snapshot: bool,
}

impl ExtractOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self {
            temp_dir: None,
            header_snapshot: true,
        }
    }

    /// Override the artifact directory.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Enable or disable the header snapshot artifact.
    pub fn with_header_snapshot(mut self, enabled: bool) -> Self {
        self.header_snapshot = enabled;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract a source document, dispatching on its format.
///
/// # Errors
///
/// `UnsupportedFormat` for unknown extensions, `FileNotFound` when the
/// path does not resolve, `CorruptDocument` when the underlying parser
/// cannot open the file or it yields no content.
pub fn extract<P: AsRef<Path>>(path: P) -> Result<SourceDocument> {
    extract_with_options(path, &ExtractOptions::new())
}

/// Extract with explicit options.
pub fn extract_with_options<P: AsRef<Path>>(
    path: P,
    options: &ExtractOptions,
) -> Result<SourceDocument> {
    let path = path.as_ref();
    match detect_format(path)? {
        DocFormat::Pdf => PdfExtractor::open(path, options.clone())?.extract(),
        DocFormat::Docx => DocxExtractor::open(path, options.clone())?.extract(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_options_builder() {
        let options = ExtractOptions::new()
            .with_temp_dir("/tmp/examforge-test")
            .with_header_snapshot(false);
        assert_eq!(options.temp_dir.as_deref(), Some(Path::new("/tmp/examforge-test")));
        assert!(!options.header_snapshot);
    }

    #[test]
    fn test_missing_file_is_surfaced() {
        let err = extract("/definitely/not/here.pdf").unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn test_unknown_extension_is_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();
        let err = extract(&path).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }
}
