//! Error types for the examforge library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for examforge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading, analyzing, or generating exams.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input extension is not one of the supported formats.
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// The source file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// The source document could not be opened or has no content.
    #[error("Corrupt document: {0}")]
    CorruptDocument(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// Error parsing the DOCX container or its XML parts.
    #[error("DOCX parsing error: {0}")]
    DocxParse(String),

    /// A single page failed to extract. Recovered locally: the page is
    /// skipped and extraction continues.
    #[error("Failed to extract page {page}: {reason}")]
    PageExtraction { page: u32, reason: String },

    /// The preserved header could not be drawn. Recovered locally: body
    /// rendering proceeds without it.
    #[error("Header rendering failed: {0}")]
    HeaderRender(String),

    /// Error extracting or re-encoding an embedded image.
    #[error("Image handling error: {0}")]
    ImageHandling(String),

    /// Error while laying out or writing the output document.
    #[error("Rendering error: {0}")]
    Render(String),

    /// An external collaborator (rewrite service, QR encoder, answer key
    /// writer) failed or returned an unexpected shape.
    #[error("External service failure: {0}")]
    ExternalService(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            _ => Error::CorruptDocument(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::DocxParse(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageHandling(err.to_string())
    }
}

impl From<oxidize_pdf::PdfError> for Error {
    fn from(err: oxidize_pdf::PdfError) -> Self {
        Error::Render(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnsupportedFormat(".txt".to_string());
        assert_eq!(err.to_string(), "Unsupported document format: .txt");

        let err = Error::PageExtraction {
            page: 3,
            reason: "bad content stream".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to extract page 3: bad content stream"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
