//! Preserved-header drawing.
//!
//! The renderer switches on the extraction-time [`HeaderContent`] tag.
//! Images are drawn from their stored millimeter geometry independently of
//! which text branch fires. The default fill color is restored after the
//! header pass so no style state leaks into the body.

use oxidize_pdf::{measure_text, Color, Font};

use crate::error::Result;
use crate::geometry::{mm_to_pt, px_to_mm, rgb_components};
use crate::model::{HeaderContent, SourceDocument, StyleFlags};

use super::{Canvas, RenderConfig, LINE_STEP, MARGIN};

/// Vertical step between DOCX header paragraphs.
const PARAGRAPH_STEP: f64 = 15.0;

/// Draw the original header with best-effort fidelity.
pub(crate) fn draw_preserved(canvas: &mut Canvas, source: &SourceDocument) -> Result<()> {
    draw_header_images(canvas, source);

    match &source.header {
        HeaderContent::None => {}
        HeaderContent::PositionedRuns(runs) => {
            for run in runs {
                let font = builtin_font(&run.font, run.flags.bold, run.flags.italic);
                let y = canvas.page_height - run.y as f64;
                apply_color(canvas, run.color);
                canvas.draw_text_at(&run.text, run.x as f64, y, font.clone(), run.size as f64)?;
                if run.flags.underline {
                    underline(canvas, &run.text, run.x as f64, y, font, run.size as f64)?;
                }
            }
        }
        HeaderContent::PdfBlocks(blocks) => {
            for block in blocks {
                for line in &block.lines {
                    for span in &line.spans {
                        let text = span.text.trim();
                        if text.is_empty() {
                            continue;
                        }
                        let font = builtin_font(&span.font, span.flags.bold, span.flags.italic);
                        let y = canvas.page_height - span.origin.1 as f64;
                        apply_color(canvas, span.color);
                        canvas.draw_text_at(text, span.origin.0 as f64, y, font.clone(), span.size as f64)?;
                        if span.flags.underline {
                            underline(canvas, text, span.origin.0 as f64, y, font, span.size as f64)?;
                        }
                    }
                }
            }
        }
        HeaderContent::DocxParagraphs(paragraphs) => {
            let mut y = canvas.page_height - 30.0;
            for paragraph in paragraphs {
                let text = paragraph.text.trim();
                if text.is_empty() {
                    continue;
                }

                if paragraph.runs.is_empty() {
                    // Plain centered paragraph.
                    canvas.reset_fill_color();
                    let width = measure_text(text, Font::Helvetica, 12.0);
                    let x = (canvas.page_width - width) / 2.0;
                    canvas.draw_text_at(text, x, y, Font::Helvetica, 12.0)?;
                } else {
                    let total_width: f64 = paragraph
                        .runs
                        .iter()
                        .map(|run| {
                            let font = run_font(run.font.as_deref(), run.flags);
                            measure_text(&run.text, font, run.size.unwrap_or(12.0) as f64)
                        })
                        .sum();
                    let mut x = (canvas.page_width - total_width) / 2.0;

                    for run in &paragraph.runs {
                        let font = run_font(run.font.as_deref(), run.flags);
                        let size = run.size.unwrap_or(12.0) as f64;
                        match run.color {
                            Some(color) => apply_color(canvas, color),
                            None => canvas.reset_fill_color(),
                        }
                        canvas.draw_text_at(&run.text, x, y, font.clone(), size)?;
                        if run.flags.underline {
                            underline(canvas, &run.text, x, y, font.clone(), size)?;
                        }
                        x += measure_text(&run.text, font, size);
                    }
                }

                y -= PARAGRAPH_STEP;
            }
        }
    }

    canvas.reset_fill_color();
    Ok(())
}

/// Print the user-supplied header lines beneath the preserved header.
pub(crate) fn draw_override_lines(canvas: &mut Canvas, source: &SourceDocument) -> Result<()> {
    for line in source.overrides.lines() {
        canvas.draw_text(line, MARGIN, Font::Helvetica, 10.0)?;
        canvas.y -= LINE_STEP;
    }
    Ok(())
}

/// The minimal fallback header: title line plus current date.
pub(crate) fn draw_default(
    canvas: &mut Canvas,
    source: &SourceDocument,
    config: &RenderConfig,
) -> Result<()> {
    let title = source
        .overrides
        .school_name
        .as_deref()
        .unwrap_or(&config.default_header_title);

    let top = canvas.page_height - MARGIN;
    canvas.draw_text_at(title, MARGIN, top, Font::Helvetica, 12.0)?;

    let date_line = format!("Data: {}", chrono::Local::now().format("%d/%m/%Y"));
    canvas.draw_text_at(&date_line, MARGIN, top - 20.0, Font::Helvetica, 12.0)?;

    canvas.y = top - 50.0;
    draw_override_lines(canvas, source)?;
    Ok(())
}

/// Header imagery: always drawn from the stored millimeter geometry,
/// independent of the text branch. A bad raster never aborts the header.
fn draw_header_images(canvas: &mut Canvas, source: &SourceDocument) {
    for placement in &source.header_images {
        let result = canvas.draw_image_file(
            &placement.path,
            mm_to_pt(placement.position.x) as f64,
            mm_to_pt(placement.position.y) as f64,
            mm_to_pt(placement.position.width) as f64,
            mm_to_pt(placement.position.height) as f64,
        );
        if let Err(e) = result {
            log::error!("header image {} skipped: {e}", placement.path.display());
        }
    }

    if let Some(extra) = &source.overrides.extra_image {
        match image::open(extra) {
            Ok(img) => {
                let width_mm = px_to_mm(img.width() as f32);
                let height_mm = px_to_mm(img.height() as f32);
                let x_mm = 105.0 - width_mm / 2.0;
                let y_mm = 297.0 - 20.0 - height_mm;
                if let Err(e) = canvas.draw_image_file(
                    extra,
                    mm_to_pt(x_mm) as f64,
                    mm_to_pt(y_mm) as f64,
                    mm_to_pt(width_mm) as f64,
                    mm_to_pt(height_mm) as f64,
                ) {
                    log::error!("override header image skipped: {e}");
                }
            }
            Err(e) => log::error!("override header image unreadable: {e}"),
        }
    }
}

fn apply_color(canvas: &mut Canvas, color: u32) {
    let (r, g, b) = rgb_components(color);
    canvas.set_fill_color(Color::rgb(r, g, b));
}

/// Manual underline rule beneath a drawn run.
fn underline(
    canvas: &mut Canvas,
    text: &str,
    x: f64,
    y: f64,
    font: Font,
    size: f64,
) -> Result<()> {
    let width = measure_text(text, font, size);
    canvas.line(x, y - 2.0, x + width, y - 2.0)
}

fn run_font(name: Option<&str>, flags: StyleFlags) -> Font {
    builtin_font(name.unwrap_or("Helvetica"), flags.bold, flags.italic)
}

/// Map an extracted font name onto the closest built-in family.
pub(crate) fn builtin_font(name: &str, bold: bool, italic: bool) -> Font {
    let lower = name.to_lowercase();
    let bold = bold || lower.contains("bold") || lower.contains("black");
    let italic = italic || lower.contains("italic") || lower.contains("oblique");

    if crate::tables::is_monospace_font(name) || lower.contains("mono") {
        match (bold, italic) {
            (true, true) => Font::CourierBoldOblique,
            (true, false) => Font::CourierBold,
            (false, true) => Font::CourierOblique,
            (false, false) => Font::Courier,
        }
    } else if lower.contains("times") || lower.contains("serif") {
        match (bold, italic) {
            (true, true) => Font::TimesBoldItalic,
            (true, false) => Font::TimesBold,
            (false, true) => Font::TimesItalic,
            (false, false) => Font::TimesRoman,
        }
    } else {
        match (bold, italic) {
            (true, true) => Font::HelveticaBoldOblique,
            (true, false) => Font::HelveticaBold,
            (false, true) => Font::HelveticaOblique,
            (false, false) => Font::Helvetica,
        }
    }
}
