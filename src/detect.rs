//! Input format detection and validation.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Supported source document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    /// Portable Document Format
    Pdf,
    /// Office Open XML word processing document
    Docx,
}

impl std::fmt::Display for DocFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocFormat::Pdf => write!(f, "PDF"),
            DocFormat::Docx => write!(f, "DOCX"),
        }
    }
}

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
/// ZIP local-file-header magic, the container of every DOCX.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Determine the document format for a path.
///
/// The extension decides the format; the file's magic bytes are then
/// checked so a mislabeled file fails as `CorruptDocument` instead of
/// deep inside a parser.
///
/// # Errors
///
/// * `FileNotFound` if the path does not resolve
/// * `UnsupportedFormat` for extensions other than `.pdf`/`.docx`/`.doc`
/// * `CorruptDocument` if the magic bytes contradict the extension
pub fn detect_format<P: AsRef<Path>>(path: P) -> Result<DocFormat> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let format = format_from_extension(path)?;

    let mut header = [0u8; 8];
    let mut file = File::open(path)?;
    let read = file.read(&mut header)?;

    let magic_ok = match format {
        DocFormat::Pdf => read >= PDF_MAGIC.len() && header.starts_with(PDF_MAGIC),
        DocFormat::Docx => read >= ZIP_MAGIC.len() && header.starts_with(ZIP_MAGIC),
    };

    if !magic_ok {
        return Err(Error::CorruptDocument(format!(
            "{} does not look like a {} file",
            path.display(),
            format
        )));
    }

    Ok(format)
}

/// Map a file extension to a format, without touching the file.
pub fn format_from_extension(path: &Path) -> Result<DocFormat> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => Ok(DocFormat::Pdf),
        "docx" | "doc" => Ok(DocFormat::Docx),
        _ => Err(Error::UnsupportedFormat(if ext.is_empty() {
            "(no extension)".to_string()
        } else {
            format!(".{ext}")
        })),
    }
}

/// Check whether bytes start a valid PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    data.starts_with(PDF_MAGIC)
}

/// Check whether bytes start a ZIP container (DOCX carrier).
pub fn is_zip_bytes(data: &[u8]) -> bool {
    data.starts_with(ZIP_MAGIC)
}
