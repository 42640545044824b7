//! Extraction output: the full source-document record.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{ImagePlacement, StyleFlags, TableStructure, TextBlock};

/// Original header content, decided once at extraction time.
///
/// The renderer switches on this tag; it never probes for field presence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeaderContent {
    /// No preserved header content
    #[default]
    None,
    /// Individually positioned text runs (PDF, exact origins known)
    PositionedRuns(Vec<PositionedRun>),
    /// Structured block/line/span content (PDF fallback)
    PdfBlocks(Vec<TextBlock>),
    /// Paragraph/run content without positions (DOCX)
    DocxParagraphs(Vec<HeaderParagraph>),
}

impl HeaderContent {
    /// Whether any drawable text content is present.
    pub fn is_empty(&self) -> bool {
        match self {
            HeaderContent::None => true,
            HeaderContent::PositionedRuns(runs) => runs.is_empty(),
            HeaderContent::PdfBlocks(blocks) => blocks.is_empty(),
            HeaderContent::DocxParagraphs(paras) => paras.is_empty(),
        }
    }
}

/// A text run with an exact source position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionedRun {
    /// Run text
    pub text: String,
    /// X origin in source coordinates
    pub x: f32,
    /// Y origin in source coordinates (Y-down)
    pub y: f32,
    /// Font family name
    pub font: String,
    /// Size in points
    pub size: f32,
    /// Style flags
    pub flags: StyleFlags,
    /// Packed RGB color
    pub color: u32,
}

/// One header paragraph from a DOCX section header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderParagraph {
    /// Full paragraph text
    pub text: String,
    /// Styled runs of the paragraph
    pub runs: Vec<HeaderRun>,
}

/// A styled run inside a DOCX header paragraph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderRun {
    /// Run text
    pub text: String,
    /// Style flags
    pub flags: StyleFlags,
    /// Font family, when the run specifies one
    pub font: Option<String>,
    /// Size in points, when the run specifies one
    pub size: Option<f32>,
    /// Packed RGB color, when the run specifies one
    pub color: Option<u32>,
}

/// User-supplied header fields merged into the document before rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeaderOverrides {
    /// Institution name shown as the header title
    pub school_name: Option<String>,
    /// Teacher name
    pub teacher: Option<String>,
    /// Subject / discipline line
    pub subject: Option<String>,
    /// Block or class label
    pub block_label: Option<String>,
    /// Evaluation type line
    pub evaluation_type: Option<String>,
    /// Free-form footer text
    pub footer_text: Option<String>,
    /// An additional header image chosen by the user
    pub extra_image: Option<PathBuf>,
}

impl HeaderOverrides {
    /// Whether any override is set.
    pub fn is_empty(&self) -> bool {
        self.school_name.is_none()
            && self.teacher.is_none()
            && self.subject.is_none()
            && self.block_label.is_none()
            && self.evaluation_type.is_none()
            && self.footer_text.is_none()
            && self.extra_image.is_none()
    }

    /// The override lines to print beneath the preserved header, in order.
    pub fn lines(&self) -> Vec<&str> {
        [
            self.subject.as_deref(),
            self.teacher.as_deref(),
            self.block_label.as_deref(),
            self.evaluation_type.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .collect()
    }
}

/// Everything extracted from one source document.
///
/// Created once per load and read-only thereafter, except for the
/// `overrides` enrichment applied before rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    /// The source file this was extracted from
    pub source_path: PathBuf,
    /// Page size of the first page, in points
    pub page_size: (f32, f32),
    /// Block texts joined with blank lines, in reading order
    pub full_text: String,
    /// Ordered text blocks
    pub blocks: Vec<TextBlock>,
    /// Decomposed records for the table-classified blocks
    pub tables: Vec<TableStructure>,
    /// Images whose placement falls in the header region
    pub header_images: Vec<ImagePlacement>,
    /// Every extracted image
    pub all_images: Vec<ImagePlacement>,
    /// Whether the original header should be reproduced
    pub preserve_original_header: bool,
    /// Original header content for re-rendering
    pub header: HeaderContent,
    /// Raster snapshot of the header region, when one could be composed
    pub header_snapshot: Option<PathBuf>,
    /// User-supplied header enrichment
    pub overrides: HeaderOverrides,
}

impl SourceDocument {
    /// Create an empty document record for a source path.
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            page_size: (crate::geometry::A4_WIDTH_PT, crate::geometry::A4_HEIGHT_PT),
            full_text: String::new(),
            blocks: Vec::new(),
            tables: Vec::new(),
            header_images: Vec::new(),
            all_images: Vec::new(),
            preserve_original_header: false,
            header: HeaderContent::None,
            header_snapshot: None,
            overrides: HeaderOverrides::default(),
        }
    }

    /// Find the decomposed table for a block id.
    pub fn table_for_block(&self, block_id: usize) -> Option<&TableStructure> {
        self.tables.iter().find(|t| t.block_id == block_id)
    }

    /// Find the block whose text contains the given statement text.
    pub fn block_containing(&self, text: &str) -> Option<&TextBlock> {
        self.blocks.iter().find(|b| text.contains(b.text.as_str()) || b.text.contains(text))
    }

    /// Merge user-supplied header fields into the record.
    pub fn apply_overrides(&mut self, overrides: HeaderOverrides) {
        if let Some(img) = overrides.extra_image.as_ref() {
            log::debug!("header override image: {}", img.display());
        }
        self.overrides = overrides;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_content_tag() {
        assert!(HeaderContent::None.is_empty());
        assert!(HeaderContent::PdfBlocks(Vec::new()).is_empty());
        let paras = HeaderContent::DocxParagraphs(vec![HeaderParagraph {
            text: "Escola".into(),
            runs: Vec::new(),
        }]);
        assert!(!paras.is_empty());
    }

    #[test]
    fn test_overrides_lines_order() {
        let overrides = HeaderOverrides {
            teacher: Some("Prof. Silva".into()),
            subject: Some("História".into()),
            ..Default::default()
        };
        assert_eq!(overrides.lines(), vec!["História", "Prof. Silva"]);
        assert!(!overrides.is_empty());
    }

    #[test]
    fn test_table_for_block() {
        let mut doc = SourceDocument::new("exam.pdf");
        doc.tables.push(TableStructure {
            block_id: 4,
            rows: vec![vec!["a".into()]],
            has_header_row: false,
            raw_text: "a".into(),
        });
        assert!(doc.table_for_block(4).is_some());
        assert!(doc.table_for_block(5).is_none());
    }
}
