//! Styled text blocks: the extraction unit of the pipeline.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Independent style flags for a text run. Bold, italic, and underline can
/// be combined freely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleFlags {
    /// Bold text
    pub bold: bool,
    /// Italic text
    pub italic: bool,
    /// Underlined text
    pub underline: bool,
}

impl StyleFlags {
    /// Decode packed span flags as emitted by PDF extractors
    /// (bit 0 bold, bit 1 italic, bit 2 underline).
    pub fn from_pdf_flags(flags: u32) -> Self {
        Self {
            bold: flags & 1 != 0,
            italic: flags & 2 != 0,
            underline: flags & 4 != 0,
        }
    }

    /// Infer bold/italic from a font name (e.g. "Helvetica-BoldOblique").
    pub fn from_font_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        Self {
            bold: lower.contains("bold") || lower.contains("black") || lower.contains("heavy"),
            italic: lower.contains("italic") || lower.contains("oblique"),
            underline: false,
        }
    }

    /// Whether any flag is set.
    pub fn any(&self) -> bool {
        self.bold || self.italic || self.underline
    }
}

/// A minimal styled text run, immutable once extracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// Font family name
    pub font: String,
    /// Font size in points
    pub size: f32,
    /// Style flags
    pub flags: StyleFlags,
    /// 24-bit packed RGB color
    pub color: u32,
    /// Origin point (baseline start) in page coordinates
    pub origin: (f32, f32),
    /// Bounding box in page coordinates
    pub bbox: Rect,
}

impl TextSpan {
    /// Create a span with style flags inferred from the font name.
    pub fn new(text: impl Into<String>, font: impl Into<String>, size: f32) -> Self {
        let font = font.into();
        let flags = StyleFlags::from_font_name(&font);
        Self {
            text: text.into(),
            font,
            size,
            flags,
            color: 0,
            origin: (0.0, 0.0),
            bbox: Rect::default(),
        }
    }

    /// Set the origin and derive an approximate bounding box from it.
    pub fn at(mut self, x: f32, y: f32, width: f32) -> Self {
        self.origin = (x, y);
        self.bbox = Rect::new(x, y - self.size, x + width, y);
        self
    }
}

/// An ordered sequence of spans on one baseline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextLine {
    /// Spans in left-to-right order
    pub spans: Vec<TextSpan>,
}

impl TextLine {
    /// Create a line from spans.
    pub fn new(spans: Vec<TextSpan>) -> Self {
        Self { spans }
    }

    /// Concatenated text of all spans.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Baseline Y of the line (first span's origin).
    pub fn y(&self) -> f32 {
        self.spans.first().map(|s| s.origin.1).unwrap_or(0.0)
    }

    /// Check if the line has no printable content.
    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(|s| s.text.trim().is_empty())
    }
}

/// A contiguous extracted block of text in reading order.
///
/// Block order is semantically meaningful: it is the only signal used for
/// question/alternative adjacency, and no component except the explicit
/// shuffle step may reorder content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBlock {
    /// Stable identifier assigned at extraction time
    pub id: usize,
    /// Lines in top-to-bottom order
    pub lines: Vec<TextLine>,
    /// Newline-joined plain-text rendering
    pub text: String,
    /// Aggregate bounding box
    pub bbox: Rect,
    /// Whether the table heuristic classified this block as tabular
    pub is_table: bool,
}

impl TextBlock {
    /// Build a block from its lines, computing the aggregate text and bbox.
    pub fn from_lines(id: usize, lines: Vec<TextLine>) -> Self {
        let text = lines
            .iter()
            .map(|l| l.text())
            .filter(|t| !t.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        let bbox = lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .map(|s| s.bbox)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default();

        Self {
            id,
            lines,
            text,
            bbox,
            is_table: false,
        }
    }

    /// Build a block directly from text, for sources without positional
    /// data (DOCX paragraphs).
    pub fn from_text(id: usize, text: impl Into<String>, spans: Vec<TextSpan>) -> Self {
        let text = text.into();
        let lines = if spans.is_empty() {
            Vec::new()
        } else {
            vec![TextLine::new(spans)]
        };
        Self {
            id,
            lines,
            text,
            bbox: Rect::default(),
            is_table: false,
        }
    }

    /// The first styled span of the block, if any.
    pub fn first_span(&self) -> Option<&TextSpan> {
        self.lines.iter().flat_map(|l| l.spans.iter()).next()
    }

    /// Iterate over all font names used in the block.
    pub fn font_names(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .map(|s| s.font.as_str())
    }

    /// Check if the block has no printable content.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_flags_from_pdf_flags() {
        let flags = StyleFlags::from_pdf_flags(0b101);
        assert!(flags.bold);
        assert!(!flags.italic);
        assert!(flags.underline);
        assert!(!StyleFlags::from_pdf_flags(0).any());
    }

    #[test]
    fn test_style_flags_from_font_name() {
        let flags = StyleFlags::from_font_name("Helvetica-BoldOblique");
        assert!(flags.bold);
        assert!(flags.italic);
        assert!(!StyleFlags::from_font_name("Courier").any());
    }

    #[test]
    fn test_block_from_lines() {
        let lines = vec![
            TextLine::new(vec![TextSpan::new("Nome", "Helvetica", 12.0).at(10.0, 100.0, 30.0)]),
            TextLine::new(vec![TextSpan::new("Ana", "Helvetica", 12.0).at(10.0, 85.0, 24.0)]),
        ];
        let block = TextBlock::from_lines(7, lines);
        assert_eq!(block.id, 7);
        assert_eq!(block.text, "Nome\nAna");
        assert!(!block.is_table);
        assert_eq!(block.bbox.x0, 10.0);
        assert!(block.bbox.height() > 0.0);
    }

    #[test]
    fn test_line_text_concatenates_spans() {
        let line = TextLine::new(vec![
            TextSpan::new("Questão ", "Helvetica", 12.0),
            TextSpan::new("1", "Helvetica-Bold", 12.0),
        ]);
        assert_eq!(line.text(), "Questão 1");
    }
}
