//! Layout-preserving exam rendering.
//!
//! Lays the (possibly shuffled) question model onto fresh A4 pages:
//! preserved header, instruction block, word-wrapped questions and
//! alternatives, bordered table grids, and per-page QR imagery. Header
//! fidelity is best effort; producing a complete document is mandatory.

mod header;
mod wrap;

pub use wrap::{wrap_line, wrap_text};

use std::path::{Path, PathBuf};

use oxidize_pdf::{measure_text, Color, Document, Font, Image, Page};

use crate::error::{Error, Result};
use crate::geometry::{A4_HEIGHT_PT, A4_WIDTH_PT};
use crate::model::{Question, SourceDocument, TableStructure};
use crate::tables;

/// Page margin in points.
const MARGIN: f64 = 50.0;
/// Vertical step per text line.
const LINE_STEP: f64 = 15.0;
/// Below this cursor height a new page starts.
const FOOTER_THRESHOLD: f64 = 100.0;
/// Table row height in points.
const TABLE_ROW_HEIGHT: f64 = 20.0;
/// QR artifact side length and its margin from the page corner.
const QR_SIZE: f64 = 50.0;
const QR_MARGIN: f64 = 20.0;

/// Rendering configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Document title metadata
    pub title: String,
    /// Title line of the fallback header
    pub default_header_title: String,
    /// Instruction lines printed after the header
    pub instructions: Vec<String>,
    /// Pre-rendered QR image drawn on every page footer
    pub qr_image: Option<PathBuf>,
}

impl RenderConfig {
    /// Create a configuration with the stock title and instructions.
    pub fn new() -> Self {
        Self {
            title: "Prova".to_string(),
            default_header_title: "AVALIAÇÃO DE CONHECIMENTOS".to_string(),
            instructions: vec![
                "1. Leia todas as questões atentamente.".to_string(),
                "2. Cada questão tem apenas uma resposta correta.".to_string(),
                "3. Não é permitido consultar materiais externos durante a prova.".to_string(),
            ],
            qr_image: None,
        }
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the QR image drawn on page footers.
    pub fn with_qr_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.qr_image = Some(path.into());
        self
    }

    /// Replace the instruction lines.
    pub fn with_instructions(mut self, instructions: Vec<String>) -> Self {
        self.instructions = instructions;
        self
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders a question list onto a new document.
pub struct ExamRenderer {
    config: RenderConfig,
}

impl ExamRenderer {
    /// Create a renderer with the given configuration.
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render the exam to `output`, reproducing the source document's
    /// header when it is preserved.
    pub fn render(
        &self,
        questions: &[Question],
        source: &SourceDocument,
        output: &Path,
    ) -> Result<PathBuf> {
        log::info!(
            "rendering {} questions to {}",
            questions.len(),
            output.display()
        );

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut canvas = Canvas::new(&self.config.title, self.config.qr_image.clone());
        canvas.footer_text = source.overrides.footer_text.clone();

        if source.preserve_original_header {
            // Header fidelity is best effort: a failure here is logged and
            // body rendering proceeds.
            if let Err(e) = header::draw_preserved(&mut canvas, source) {
                log::error!("{}", Error::HeaderRender(e.to_string()));
                canvas.reset_fill_color();
            }
            canvas.y = canvas.page_height - 150.0;
            header::draw_override_lines(&mut canvas, source)?;
        } else {
            header::draw_default(&mut canvas, source, &self.config)?;
        }

        self.draw_instructions(&mut canvas)?;

        for question in questions {
            self.draw_question(&mut canvas, question, source)?;

            if canvas.y < FOOTER_THRESHOLD {
                canvas.new_page()?;
            } else {
                canvas.y -= 20.0;
            }
        }

        canvas.finish(output)
    }

    /// Horizontal rule, the fixed instruction list, another rule.
    fn draw_instructions(&self, canvas: &mut Canvas) -> Result<()> {
        canvas.hline()?;
        canvas.y -= 20.0;

        canvas.draw_text("INSTRUÇÕES:", MARGIN, Font::Helvetica, 11.0)?;
        canvas.y -= LINE_STEP;

        for instruction in &self.config.instructions {
            canvas.draw_text(instruction, MARGIN + 10.0, Font::Helvetica, 10.0)?;
            canvas.y -= LINE_STEP;
        }

        canvas.y -= 10.0;
        canvas.hline()?;
        canvas.y -= 20.0;
        Ok(())
    }

    /// One question: statement (text or grid), then its alternatives.
    fn draw_question(
        &self,
        canvas: &mut Canvas,
        question: &Question,
        source: &SourceDocument,
    ) -> Result<()> {
        let table_source = source
            .blocks
            .iter()
            .find(|b| b.is_table && question.statement.contains(b.text.as_str()))
            .and_then(|b| source.table_for_block(b.id));

        if let Some(table) = table_source {
            // The question block itself is a table.
            draw_table(canvas, table)?;
        } else {
            self.draw_statement(canvas, question, source)?;
        }

        canvas.y -= 5.0;

        for alternative in &question.alternatives {
            let mut first_line = true;
            for alt_line in alternative.split('\n') {
                let indent = if first_line {
                    MARGIN + 20.0
                } else {
                    MARGIN + 30.0
                };
                let available = canvas.page_width - indent - MARGIN;
                let wrapped = wrap_line(alt_line, available, &|s| {
                    measure_text(s, Font::Helvetica, 10.0)
                });
                for (i, line) in wrapped.iter().enumerate() {
                    let x = if first_line && i == 0 {
                        MARGIN + 20.0
                    } else {
                        MARGIN + 30.0
                    };
                    canvas.draw_text(line, x, Font::Helvetica, 10.0)?;
                    canvas.y -= LINE_STEP;
                }
                first_line = false;
            }
        }

        Ok(())
    }

    /// Statement text with greedy wrapping; inline table fragments are
    /// re-rendered as grids.
    fn draw_statement(
        &self,
        canvas: &mut Canvas,
        question: &Question,
        source: &SourceDocument,
    ) -> Result<()> {
        let (text_part, inline_tables) = split_inline_tables(&question.statement, source);

        // Use the source block's leading style where one matches.
        let (font, size) = source
            .block_containing(text_part.trim())
            .and_then(|b| b.first_span())
            .map(|s| {
                (
                    header::builtin_font(&s.font, s.flags.bold, s.flags.italic),
                    10.0,
                )
            })
            .unwrap_or((Font::Helvetica, 10.0));

        let available = canvas.page_width - 2.0 * MARGIN;
        for line in text_part.lines() {
            for wrapped in wrap_line(line, available, &|s| measure_text(s, font.clone(), size)) {
                canvas.draw_text(&wrapped, MARGIN, font.clone(), size)?;
                canvas.y -= LINE_STEP;
            }
        }

        for table in inline_tables {
            draw_table(canvas, table)?;
        }

        Ok(())
    }
}

/// Split a statement into its plain-text part and the decomposed tables
/// whose inline fragments were folded into it.
fn split_inline_tables<'a>(
    statement: &'a str,
    source: &'a SourceDocument,
) -> (&'a str, Vec<&'a TableStructure>) {
    let Some(idx) = statement.find("<table") else {
        return (statement, Vec::new());
    };

    let matched = source
        .tables
        .iter()
        .filter(|t| statement.contains(tables::to_html(t).as_str()))
        .collect();

    (statement[..idx].trim_end_matches('\n'), matched)
}

/// Draw a bordered grid: equal column widths across the text area,
/// centered cell text, bold header row when detected.
fn draw_table(canvas: &mut Canvas, table: &TableStructure) -> Result<()> {
    let columns = table.column_count().max(1);
    let col_width = (canvas.page_width - 2.0 * MARGIN) / columns as f64;

    for (row_idx, row) in table.rows.iter().enumerate() {
        let is_header = table.has_header_row && row_idx == 0;
        let font = if is_header {
            Font::HelveticaBold
        } else {
            Font::Helvetica
        };

        for (col_idx, cell) in row.iter().enumerate().take(columns) {
            let x = MARGIN + col_idx as f64 * col_width;
            canvas.cell_border(x, col_width, TABLE_ROW_HEIGHT)?;

            let text_width = measure_text(cell, font.clone(), 10.0);
            let text_x = x + (col_width - text_width) / 2.0;
            let text_y = canvas.y - TABLE_ROW_HEIGHT / 2.0 - 5.0;
            canvas.draw_text_at(cell, text_x, text_y, font.clone(), 10.0)?;
        }

        canvas.y -= TABLE_ROW_HEIGHT;
    }

    canvas.y -= 20.0;
    Ok(())
}

/// A running page with a vertical cursor, accumulating into the output
/// document.
pub(crate) struct Canvas {
    doc: Document,
    page: Page,
    /// Current vertical cursor (Y-up)
    pub(crate) y: f64,
    pub(crate) page_width: f64,
    pub(crate) page_height: f64,
    qr_image: Option<PathBuf>,
    footer_text: Option<String>,
    image_counter: usize,
}

impl Canvas {
    fn new(title: &str, qr_image: Option<PathBuf>) -> Self {
        let mut doc = Document::new();
        doc.set_title(title);

        Self {
            doc,
            page: Page::a4(),
            y: A4_HEIGHT_PT as f64 - MARGIN,
            page_width: A4_WIDTH_PT as f64,
            page_height: A4_HEIGHT_PT as f64,
            qr_image,
            footer_text: None,
            image_counter: 0,
        }
    }

    /// Draw text at the cursor height.
    pub(crate) fn draw_text(&mut self, text: &str, x: f64, font: Font, size: f64) -> Result<()> {
        self.draw_text_at(text, x, self.y, font, size)
    }

    /// Draw text at an explicit position.
    pub(crate) fn draw_text_at(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        font: Font,
        size: f64,
    ) -> Result<()> {
        self.page.text().set_font(font, size).at(x, y).write(text)?;
        Ok(())
    }

    /// Set the text fill color.
    pub(crate) fn set_fill_color(&mut self, color: Color) {
        self.page.text().set_fill_color(color);
    }

    /// Restore the default black fill.
    pub(crate) fn reset_fill_color(&mut self) {
        self.set_fill_color(Color::rgb(0.0, 0.0, 0.0));
    }

    /// Horizontal rule across the text area at the cursor height.
    pub(crate) fn hline(&mut self) -> Result<()> {
        self.page
            .graphics()
            .move_to(MARGIN, self.y)
            .line_to(self.page_width - MARGIN, self.y)
            .stroke();
        Ok(())
    }

    /// A straight line between two points (underline rules).
    pub(crate) fn line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> Result<()> {
        self.page
            .graphics()
            .move_to(x0, y0)
            .line_to(x1, y1)
            .stroke();
        Ok(())
    }

    /// One table cell border at the cursor height.
    fn cell_border(&mut self, x: f64, width: f64, height: f64) -> Result<()> {
        self.page
            .graphics()
            .rect(x, self.y - height, width, height)
            .stroke();
        Ok(())
    }

    /// Draw an image file at the given position and size (points).
    pub(crate) fn draw_image_file(
        &mut self,
        path: &Path,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        let image = embed_image(path)?;
        let name = format!("img{}", self.image_counter);
        self.image_counter += 1;
        self.page.add_image(&name, image);
        self.page.draw_image(&name, x, y, width, height)?;
        Ok(())
    }

    /// Finish the current page and start a fresh one.
    fn new_page(&mut self) -> Result<()> {
        self.draw_footer()?;
        let finished = std::mem::replace(&mut self.page, Page::a4());
        self.doc.add_page(finished);
        self.y = self.page_height - MARGIN;
        Ok(())
    }

    /// Footer pass: optional footer text at the left, QR artifact at the
    /// bottom-right.
    fn draw_footer(&mut self) -> Result<()> {
        if let Some(footer) = self.footer_text.clone() {
            self.draw_text_at(&footer, MARGIN, QR_MARGIN, Font::Helvetica, 8.0)?;
        }

        let Some(qr) = self.qr_image.clone() else {
            return Ok(());
        };
        let x = self.page_width - QR_SIZE - QR_MARGIN;
        if let Err(e) = self.draw_image_file(&qr, x, QR_MARGIN, QR_SIZE, QR_SIZE) {
            log::error!("QR artifact could not be drawn: {e}");
        }
        Ok(())
    }

    /// Close the document and write it out.
    fn finish(mut self, output: &Path) -> Result<PathBuf> {
        self.draw_footer()?;
        let finished = std::mem::replace(&mut self.page, Page::a4());
        self.doc.add_page(finished);
        self.doc.save(output)?;
        log::info!("exam written: {}", output.display());
        Ok(output.to_path_buf())
    }
}

/// Load a raster for embedding. JPEG passes through; anything else is
/// decoded and re-encoded.
fn embed_image(path: &Path) -> Result<Image> {
    let data = std::fs::read(path)?;

    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Ok(Image::from_jpeg_data(data)?);
    }

    let decoded = image::load_from_memory(&data)?;
    let mut jpeg = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, 90);
    decoded.write_with_encoder(encoder)?;
    Ok(Image::from_jpeg_data(jpeg)?)
}
