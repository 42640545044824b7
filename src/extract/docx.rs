//! DOCX extraction: manual ZIP + streaming XML.
//!
//! A DOCX file is a ZIP archive; `word/document.xml` holds the body,
//! `word/header*.xml` the section headers, and each header's
//! `_rels/*.rels` part maps its embedded images into `word/media/`.
//! Reading the container directly keeps run-level formatting that
//! higher-level readers drop.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::geometry::{mm_to_pt, px_to_mm, MmBox, Rect, A4_WIDTH_MM};
use crate::model::{
    HeaderContent, HeaderParagraph, HeaderRun, ImagePlacement, SourceDocument, StyleFlags,
    TextBlock, TextSpan,
};
use crate::tables;
use crate::workdir;

use super::ExtractOptions;

/// Estimated top offset for header images, in millimeters. DOCX carries
/// no positional metadata for them.
const HEADER_IMAGE_TOP_MM: f32 = 20.0;
/// A4 height in millimeters, for flipping the estimate to the Y-up canvas.
const A4_HEIGHT_MM: f32 = 297.0;

/// DOCX document extractor.
pub struct DocxExtractor {
    archive: ZipArchive<File>,
    options: ExtractOptions,
    source: PathBuf,
}

impl DocxExtractor {
    /// Open a DOCX file for extraction.
    pub fn open(path: &Path, options: ExtractOptions) -> Result<Self> {
        let file = File::open(path)?;
        let archive = ZipArchive::new(file)
            .map_err(|e| Error::CorruptDocument(format!("{}: {e}", path.display())))?;

        Ok(Self {
            archive,
            options,
            source: path.to_path_buf(),
        })
    }

    /// Extract the full document model.
    pub fn extract(&mut self) -> Result<SourceDocument> {
        let mut result = SourceDocument::new(&self.source);
        result.preserve_original_header = true;

        let artifact_dir = workdir::resolve_dir(self.options.temp_dir.as_deref())?;

        let document_xml = self.read_entry("word/document.xml").map_err(|_| {
            Error::CorruptDocument(format!(
                "{}: missing word/document.xml",
                self.source.display()
            ))
        })?;

        let mut next_block_id = 0usize;
        for item in parse_body(&document_xml)? {
            match item {
                BodyItem::Paragraph(para) => {
                    if para.text.trim().is_empty() {
                        continue;
                    }
                    let spans = para.runs.iter().map(run_to_span).collect();
                    let block = TextBlock::from_text(next_block_id, &para.text, spans);
                    next_block_id += 1;
                    result.blocks.push(block);
                }
                BodyItem::Table(rows) => {
                    let text = table_text(&rows);
                    if text.trim().is_empty() {
                        continue;
                    }
                    let mut block = TextBlock::from_text(next_block_id, &text, Vec::new());
                    block.is_table = true;
                    result.tables.push(tables::structure_for(block.id, &text));
                    next_block_id += 1;
                    result.blocks.push(block);
                }
            }
        }

        result.full_text = result
            .blocks
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let header_parts = self.header_part_names();
        let mut header_paragraphs = Vec::new();
        for part in &header_parts {
            match self.read_entry(part) {
                Ok(xml) => match parse_paragraphs(&xml) {
                    Ok(paras) => header_paragraphs.extend(
                        paras
                            .into_iter()
                            .filter(|p| !p.text.trim().is_empty())
                            .map(|p| HeaderParagraph {
                                text: p.text,
                                runs: p.runs.into_iter().map(run_to_header_run).collect(),
                            }),
                    ),
                    Err(e) => log::warn!("{part}: header parse failed: {e}"),
                },
                Err(e) => log::warn!("{part}: unreadable header part: {e}"),
            }
        }
        if !header_paragraphs.is_empty() {
            result.header = HeaderContent::DocxParagraphs(header_paragraphs);
        }

        for part in &header_parts {
            match self.extract_header_images(part, &artifact_dir) {
                Ok(images) => {
                    result.header_images.extend(images.iter().cloned());
                    result.all_images.extend(images);
                }
                Err(e) => log::warn!("{part}: header image extraction failed: {e}"),
            }
        }

        Ok(result)
    }

    /// Read one ZIP entry to a string.
    fn read_entry(&mut self, name: &str) -> Result<String> {
        let mut entry = self.archive.by_name(name)?;
        let mut content = String::new();
        entry.read_to_string(&mut content)?;
        Ok(content)
    }

    /// Read one ZIP entry to raw bytes.
    fn read_entry_bytes(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut entry = self.archive.by_name(name)?;
        let mut content = Vec::new();
        entry.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Names of the section header parts present in the archive.
    fn header_part_names(&self) -> Vec<String> {
        self.archive
            .file_names()
            .filter(|name| {
                name.starts_with("word/header")
                    && name.ends_with(".xml")
                    && !name.contains("_rels")
            })
            .map(str::to_string)
            .collect()
    }

    /// Extract a header part's related images with an estimated centered
    /// placement.
    fn extract_header_images(
        &mut self,
        header_part: &str,
        artifact_dir: &Path,
    ) -> Result<Vec<ImagePlacement>> {
        let part_file = header_part.rsplit('/').next().unwrap_or(header_part);
        let rels_name = format!("word/_rels/{part_file}.rels");

        let rels_xml = match self.read_entry(&rels_name) {
            Ok(xml) => xml,
            // No relationships part means no images for this header.
            Err(_) => return Ok(Vec::new()),
        };

        let mut images = Vec::new();
        for target in parse_image_relationships(&rels_xml)? {
            let zip_path = if let Some(absolute) = target.strip_prefix('/') {
                absolute.to_string()
            } else {
                format!("word/{target}")
            };

            let data = match self.read_entry_bytes(&zip_path) {
                Ok(data) => data,
                Err(e) => {
                    log::warn!("{zip_path}: unreadable header image: {e}");
                    continue;
                }
            };

            let filename = zip_path.rsplit('/').next().unwrap_or("image.bin");
            let out_path = artifact_dir.join(format!("docx_header_{filename}"));
            std::fs::write(&out_path, &data)?;

            let (width_px, height_px) = match image::load_from_memory(&data) {
                Ok(img) => (img.width(), img.height()),
                Err(e) => {
                    log::warn!("{zip_path}: undecodable header image: {e}");
                    continue;
                }
            };

            let width_mm = px_to_mm(width_px as f32);
            let height_mm = px_to_mm(height_px as f32);
            // Centered on A4, fixed top offset; Y stored bottom-up for the
            // output canvas.
            let position = MmBox {
                x: A4_WIDTH_MM / 2.0 - width_mm / 2.0,
                y: A4_HEIGHT_MM - HEADER_IMAGE_TOP_MM - height_mm,
                width: width_mm,
                height: height_mm,
            };
            let bbox = Rect::new(
                mm_to_pt(position.x),
                mm_to_pt(HEADER_IMAGE_TOP_MM),
                mm_to_pt(position.x + width_mm),
                mm_to_pt(HEADER_IMAGE_TOP_MM + height_mm),
            );

            images.push(ImagePlacement {
                path: out_path,
                width_px,
                height_px,
                bbox,
                position,
            });
        }

        Ok(images)
    }
}

/// A parsed run with its formatting.
#[derive(Debug, Clone, Default)]
struct ParsedRun {
    text: String,
    flags: StyleFlags,
    font: Option<String>,
    size: Option<f32>,
    color: Option<u32>,
}

/// A parsed paragraph.
#[derive(Debug, Clone, Default)]
struct ParsedParagraph {
    text: String,
    runs: Vec<ParsedRun>,
}

/// One ordered item of the document body.
enum BodyItem {
    Paragraph(ParsedParagraph),
    Table(Vec<Vec<String>>),
}

fn run_to_span(run: &ParsedRun) -> TextSpan {
    let mut span = TextSpan::new(
        run.text.clone(),
        run.font.clone().unwrap_or_else(|| "Arial".to_string()),
        run.size.unwrap_or(12.0),
    );
    span.flags = run.flags;
    span.color = run.color.unwrap_or(0);
    span
}

fn run_to_header_run(run: ParsedRun) -> HeaderRun {
    HeaderRun {
        text: run.text,
        flags: run.flags,
        font: run.font,
        size: run.size,
        color: run.color,
    }
}

/// Join native table cells the way hand-typed tables look, so the same
/// decomposition path serves both.
fn table_text(rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| row.join(" | "))
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract an attribute value by key from an element.
fn get_attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

/// Whether a toggle property is explicitly switched off (w:val="0"/"false").
fn val_off(e: &BytesStart) -> bool {
    get_attr(e, b"w:val")
        .map(|v| v == "0" || v == "false" || v == "none")
        .unwrap_or(false)
}

/// Parse paragraphs (with runs) from a document or header part,
/// ignoring tables.
fn parse_paragraphs(xml: &str) -> Result<Vec<ParsedParagraph>> {
    let items = parse_body(xml)?;
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            BodyItem::Paragraph(p) => Some(p),
            BodyItem::Table(_) => None,
        })
        .collect())
}

/// Parse the ordered body items of a WordprocessingML part.
fn parse_body(xml: &str) -> Result<Vec<BodyItem>> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    let mut buf = Vec::new();

    let mut items = Vec::new();

    let mut table_depth = 0usize;
    let mut table_rows: Vec<Vec<String>> = Vec::new();
    let mut current_row: Vec<String> = Vec::new();
    let mut current_cell = String::new();

    let mut paragraph: Option<ParsedParagraph> = None;
    let mut run: Option<ParsedRun> = None;
    let mut in_run_props = false;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:tbl" => {
                    table_depth += 1;
                    if table_depth == 1 {
                        table_rows.clear();
                    }
                }
                b"w:tr" if table_depth > 0 => current_row.clear(),
                b"w:tc" if table_depth > 0 => current_cell.clear(),
                b"w:p" if table_depth == 0 => paragraph = Some(ParsedParagraph::default()),
                b"w:r" if table_depth == 0 && paragraph.is_some() => {
                    run = Some(ParsedRun::default())
                }
                b"w:rPr" => in_run_props = true,
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if in_run_props {
                    if let Some(r) = run.as_mut() {
                        apply_run_property(r, &e);
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if in_text {
                    let text = e.unescape()?.into_owned();
                    if table_depth > 0 {
                        current_cell.push_str(&text);
                    } else if let Some(r) = run.as_mut() {
                        r.text.push_str(&text);
                    }
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:tbl" => {
                    table_depth = table_depth.saturating_sub(1);
                    if table_depth == 0 && !table_rows.is_empty() {
                        items.push(BodyItem::Table(std::mem::take(&mut table_rows)));
                    }
                }
                b"w:tr" if table_depth > 0 => {
                    table_rows.push(std::mem::take(&mut current_row));
                }
                b"w:tc" if table_depth > 0 => {
                    current_row.push(current_cell.trim().to_string());
                }
                b"w:p" if table_depth == 0 => {
                    if let Some(p) = paragraph.take() {
                        items.push(BodyItem::Paragraph(p));
                    }
                }
                b"w:r" if table_depth == 0 => {
                    if let (Some(p), Some(r)) = (paragraph.as_mut(), run.take()) {
                        if !r.text.is_empty() {
                            p.text.push_str(&r.text);
                            if !r.text.trim().is_empty() {
                                p.runs.push(r);
                            }
                        }
                    }
                }
                b"w:rPr" => in_run_props = false,
                b"w:t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(Error::DocxParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(items)
}

/// Apply one run-property element (inside w:rPr).
fn apply_run_property(run: &mut ParsedRun, e: &BytesStart) {
    match e.name().as_ref() {
        b"w:b" => run.flags.bold = !val_off(e),
        b"w:i" => run.flags.italic = !val_off(e),
        b"w:u" => run.flags.underline = !val_off(e),
        b"w:rFonts" => {
            if let Some(font) = get_attr(e, b"w:ascii") {
                run.font = Some(font);
            }
        }
        b"w:sz" => {
            // Half-points.
            if let Some(v) = get_attr(e, b"w:val").and_then(|v| v.parse::<f32>().ok()) {
                run.size = Some(v / 2.0);
            }
        }
        b"w:color" => {
            if let Some(v) = get_attr(e, b"w:val") {
                if v != "auto" {
                    if let Ok(rgb) = u32::from_str_radix(&v, 16) {
                        run.color = Some(rgb);
                    }
                }
            }
        }
        _ => {}
    }
}

/// Image relationship targets from a `.rels` part.
fn parse_image_relationships(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    let mut buf = Vec::new();
    let mut targets = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"Relationship" {
                    let is_image = get_attr(&e, b"Type")
                        .map(|t| t.contains("image"))
                        .unwrap_or(false);
                    if is_image {
                        if let Some(target) = get_attr(&e, b"Target") {
                            targets.push(target);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(Error::DocxParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p>
      <w:r><w:rPr><w:b/><w:sz w:val="24"/></w:rPr><w:t>1. Qual a capital?</w:t></w:r>
    </w:p>
    <w:p>
      <w:r><w:t>(A) Brasília</w:t></w:r>
    </w:p>
    <w:tbl>
      <w:tr>
        <w:tc><w:p><w:r><w:t>Nome</w:t></w:r></w:p></w:tc>
        <w:tc><w:p><w:r><w:t>Idade</w:t></w:r></w:p></w:tc>
      </w:tr>
      <w:tr>
        <w:tc><w:p><w:r><w:t>Ana</w:t></w:r></w:p></w:tc>
        <w:tc><w:p><w:r><w:t>20</w:t></w:r></w:p></w:tc>
      </w:tr>
    </w:tbl>
  </w:body>
</w:document>"#;

    #[test]
    fn test_parse_body_paragraphs_and_table() {
        let items = parse_body(BODY).unwrap();
        assert_eq!(items.len(), 3);

        match &items[0] {
            BodyItem::Paragraph(p) => {
                assert_eq!(p.text, "1. Qual a capital?");
                assert_eq!(p.runs.len(), 1);
                assert!(p.runs[0].flags.bold);
                assert_eq!(p.runs[0].size, Some(12.0));
            }
            BodyItem::Table(_) => panic!("expected paragraph"),
        }

        match &items[2] {
            BodyItem::Table(rows) => {
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0], vec!["Nome", "Idade"]);
                assert_eq!(rows[1], vec!["Ana", "20"]);
            }
            BodyItem::Paragraph(_) => panic!("expected table"),
        }
    }

    #[test]
    fn test_table_text_joins_cells() {
        let rows = vec![
            vec!["Nome".to_string(), "Idade".to_string()],
            vec!["Ana".to_string(), "20".to_string()],
        ];
        assert_eq!(table_text(&rows), "Nome | Idade\nAna | 20");
    }

    #[test]
    fn test_run_property_toggles() {
        let xml = r#"<w:document xmlns:w="http://example"><w:body>
            <w:p><w:r><w:rPr><w:b w:val="false"/><w:i/><w:color w:val="FF0000"/></w:rPr>
            <w:t>colorido</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let items = parse_body(xml).unwrap();
        match &items[0] {
            BodyItem::Paragraph(p) => {
                let run = &p.runs[0];
                assert!(!run.flags.bold);
                assert!(run.flags.italic);
                assert_eq!(run.color, Some(0xFF0000));
            }
            _ => panic!("expected paragraph"),
        }
    }

    #[test]
    fn test_parse_image_relationships() {
        let xml = r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;
        let targets = parse_image_relationships(xml).unwrap();
        assert_eq!(targets, vec!["media/image1.png"]);
    }
}
