//! PDF extraction built on lopdf.
//!
//! Walks each page's content stream tracking the text matrix (for span
//! positions), the graphics matrix (for image placements), and the fill
//! color, then groups spans into lines and lines into blocks. A failing
//! page is logged and skipped; extraction always yields whatever the rest
//! of the document provides.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use lopdf::{Document as LopdfDocument, Object, ObjectId};
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::geometry::{header_height, pt_to_mm, MmBox, Rect};
use crate::model::{
    HeaderContent, ImagePlacement, SourceDocument, TextBlock, TextLine, TextSpan,
};
use crate::tables;
use crate::workdir;

use super::ExtractOptions;

/// PDF document extractor.
pub struct PdfExtractor {
    doc: LopdfDocument,
    options: ExtractOptions,
    source: PathBuf,
}

impl PdfExtractor {
    /// Open a PDF file for extraction.
    pub fn open(path: &Path, options: ExtractOptions) -> Result<Self> {
        let doc = LopdfDocument::load(path)?;

        if doc.get_pages().is_empty() {
            return Err(Error::CorruptDocument(format!(
                "{}: document has no pages",
                path.display()
            )));
        }

        Ok(Self {
            doc,
            options,
            source: path.to_path_buf(),
        })
    }

    /// Extract the full document model.
    pub fn extract(&self) -> Result<SourceDocument> {
        let mut result = SourceDocument::new(&self.source);
        result.preserve_original_header = true;

        let artifact_dir = workdir::resolve_dir(self.options.temp_dir.as_deref())?;
        let pages = self.doc.get_pages();

        let first_page_id = *pages.values().next().expect("page count checked at open");
        result.page_size = self.page_dimensions(first_page_id);
        let page_height = result.page_size.1;

        let mut next_block_id = 0usize;

        for (page_num, page_id) in pages.iter() {
            match self.extract_page(*page_num, *page_id, &mut next_block_id, &artifact_dir) {
                Ok(page) => {
                    let PageExtraction {
                        blocks,
                        tables,
                        images,
                    } = page;

                    if *page_num == 1 {
                        let header_limit = header_height(page_height);
                        let header_blocks: Vec<TextBlock> = blocks
                            .iter()
                            .filter(|b| b.bbox.starts_above(header_limit))
                            .cloned()
                            .collect();
                        if !header_blocks.is_empty() {
                            result.header = HeaderContent::PdfBlocks(header_blocks);
                        }

                        result.header_images = images
                            .iter()
                            .filter(|img| img.in_header(page_height))
                            .cloned()
                            .collect();
                    }

                    result.blocks.extend(blocks);
                    result.tables.extend(tables);
                    result.all_images.extend(images);
                }
                Err(e) => {
                    // Partial-result policy: one bad page never aborts the
                    // document.
                    log::warn!(
                        "{}: skipping page {page_num}: {e}",
                        self.source.display()
                    );
                }
            }
        }

        result.full_text = result
            .blocks
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        if self.options.header_snapshot {
            result.header_snapshot =
                self.compose_header_snapshot(&result, page_height, &artifact_dir);
        }

        Ok(result)
    }

    /// Page dimensions from the MediaBox, defaulting to A4.
    fn page_dimensions(&self, page_id: ObjectId) -> (f32, f32) {
        if let Ok(page_dict) = self.doc.get_dictionary(page_id) {
            if let Ok(media_box) = page_dict.get(b"MediaBox") {
                if let Ok(array) = media_box.as_array() {
                    if array.len() >= 4 {
                        let width = array[2].as_float().unwrap_or(crate::geometry::A4_WIDTH_PT);
                        let height = array[3].as_float().unwrap_or(crate::geometry::A4_HEIGHT_PT);
                        return (width, height);
                    }
                }
            }
        }
        (crate::geometry::A4_WIDTH_PT, crate::geometry::A4_HEIGHT_PT)
    }

    /// Extract one page: blocks, table records, image placements.
    fn extract_page(
        &self,
        page_num: u32,
        page_id: ObjectId,
        next_block_id: &mut usize,
        artifact_dir: &Path,
    ) -> Result<PageExtraction> {
        let (_, page_height) = self.page_dimensions(page_id);

        let fonts = self.page_font_names(page_id);
        let content = self.page_content(page_id).map_err(|e| Error::PageExtraction {
            page: page_num,
            reason: e.to_string(),
        })?;

        let walk = self
            .walk_content(&content, &fonts, page_id, page_height)
            .map_err(|e| Error::PageExtraction {
                page: page_num,
                reason: e.to_string(),
            })?;

        let lines = group_spans_into_lines(walk.spans);
        let mut blocks = Vec::new();
        let mut table_records = Vec::new();

        for line_group in group_lines_into_blocks(lines) {
            let mut block = TextBlock::from_lines(*next_block_id, line_group);
            *next_block_id += 1;

            if block.is_empty() {
                continue;
            }

            block.is_table =
                tables::classify_with_fonts(&block.text, block.font_names());
            if block.is_table {
                table_records.push(tables::structure_for(block.id, &block.text));
            }

            blocks.push(block);
        }

        let images = self.extract_images(page_num, page_id, &walk.image_placements, artifact_dir);

        Ok(PageExtraction {
            blocks,
            tables: table_records,
            images,
        })
    }

    /// BaseFont names for the page's font resources.
    fn page_font_names(&self, page_id: ObjectId) -> HashMap<Vec<u8>, String> {
        let mut names = HashMap::new();
        if let Ok(fonts) = self.doc.get_page_fonts(page_id) {
            for (resource_name, font) in fonts {
                let base = font
                    .get(b"BaseFont")
                    .ok()
                    .and_then(|o| o.as_name().ok())
                    .map(|n| String::from_utf8_lossy(n).to_string())
                    .unwrap_or_else(|| "Helvetica".to_string());
                // Strip any subset prefix ("ABCDEF+Arial-Bold").
                let base = base.split('+').next_back().unwrap_or(&base).to_string();
                names.insert(resource_name, base);
            }
        }
        names
    }

    /// The page's (possibly concatenated) content stream.
    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self.doc.get_dictionary(page_id)?;
        let contents = page_dict
            .get(b"Contents")
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        match contents {
            Object::Reference(r) => {
                if let Ok(Object::Stream(s)) = self.doc.get_object(*r) {
                    return s
                        .decompressed_content()
                        .map_err(|e| Error::PdfParse(e.to_string()));
                }
                Err(Error::PdfParse("invalid content stream".to_string()))
            }
            Object::Array(arr) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Object::Reference(r) = obj {
                        if let Ok(Object::Stream(s)) = self.doc.get_object(*r) {
                            if let Ok(data) = s.decompressed_content() {
                                content.extend_from_slice(&data);
                                content.push(b' ');
                            }
                        }
                    }
                }
                Ok(content)
            }
            _ => Err(Error::PdfParse("invalid content stream".to_string())),
        }
    }

    /// Walk the content stream, producing positioned spans and raw image
    /// placements. All Y coordinates are flipped to Y-down so the model's
    /// header threshold applies uniformly.
    fn walk_content(
        &self,
        content: &[u8],
        fonts: &HashMap<Vec<u8>, String>,
        page_id: ObjectId,
        page_height: f32,
    ) -> Result<ContentWalk> {
        let content = lopdf::content::Content::decode(content)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let lopdf_fonts = self.doc.get_page_fonts(page_id).unwrap_or_default();

        let mut walk = ContentWalk::default();
        let mut current_font_resource: Vec<u8> = Vec::new();
        let mut current_font = String::from("Helvetica");
        let mut current_size: f32 = 12.0;
        let mut current_color: u32 = 0;
        let mut text_matrix = TextMatrix::default();
        let mut graphics = GraphicsState::default();
        let mut in_text = false;

        for op in content.operations {
            match op.operator.as_str() {
                "BT" => {
                    in_text = true;
                    text_matrix = TextMatrix::default();
                }
                "ET" => in_text = false,
                "q" => graphics.push(),
                "Q" => graphics.pop(),
                "cm" => {
                    if op.operands.len() >= 6 {
                        graphics.concat(
                            number(&op.operands[0]).unwrap_or(1.0),
                            number(&op.operands[1]).unwrap_or(0.0),
                            number(&op.operands[2]).unwrap_or(0.0),
                            number(&op.operands[3]).unwrap_or(1.0),
                            number(&op.operands[4]).unwrap_or(0.0),
                            number(&op.operands[5]).unwrap_or(0.0),
                        );
                    }
                }
                "Do" => {
                    if let Some(Object::Name(name)) = op.operands.first() {
                        let (x, y_up, w, h) = graphics.placement();
                        walk.image_placements.push(RawPlacement {
                            name: name.clone(),
                            bbox: Rect::new(
                                x,
                                page_height - y_up - h,
                                x + w,
                                page_height - y_up,
                            ),
                        });
                    }
                }
                "Tf" => {
                    if op.operands.len() >= 2 {
                        if let Object::Name(font_name) = &op.operands[0] {
                            current_font_resource = font_name.clone();
                            current_font = fonts
                                .get(font_name.as_slice())
                                .cloned()
                                .unwrap_or_else(|| {
                                    String::from_utf8_lossy(font_name).to_string()
                                });
                        }
                        current_size = number(&op.operands[1]).unwrap_or(12.0);
                    }
                }
                "Td" | "TD" => {
                    if op.operands.len() >= 2 {
                        text_matrix.translate(
                            number(&op.operands[0]).unwrap_or(0.0),
                            number(&op.operands[1]).unwrap_or(0.0),
                        );
                    }
                }
                "Tm" => {
                    if op.operands.len() >= 6 {
                        text_matrix.set(
                            number(&op.operands[0]).unwrap_or(1.0),
                            number(&op.operands[1]).unwrap_or(0.0),
                            number(&op.operands[2]).unwrap_or(0.0),
                            number(&op.operands[3]).unwrap_or(1.0),
                            number(&op.operands[4]).unwrap_or(0.0),
                            number(&op.operands[5]).unwrap_or(0.0),
                        );
                    }
                }
                "T*" => text_matrix.next_line(),
                "rg" => {
                    if op.operands.len() >= 3 {
                        current_color = pack_rgb(
                            number(&op.operands[0]).unwrap_or(0.0),
                            number(&op.operands[1]).unwrap_or(0.0),
                            number(&op.operands[2]).unwrap_or(0.0),
                        );
                    }
                }
                "g" => {
                    if let Some(v) = op.operands.first().and_then(number) {
                        current_color = pack_rgb(v, v, v);
                    }
                }
                "sc" | "scn" => {
                    let nums: Vec<f32> = op.operands.iter().filter_map(number).collect();
                    match nums.as_slice() {
                        [v] => current_color = pack_rgb(*v, *v, *v),
                        [r, g, b] => current_color = pack_rgb(*r, *g, *b),
                        _ => {}
                    }
                }
                "Tj" | "TJ" => {
                    if in_text {
                        let encoding = lopdf_fonts
                            .get(&current_font_resource)
                            .and_then(|f| f.get_font_encoding(&self.doc).ok());

                        let text = if op.operator == "TJ" {
                            decode_tj_array(&op.operands, encoding.as_ref())
                        } else if let Some(Object::String(bytes, _)) = op.operands.first() {
                            decode_string(bytes, encoding.as_ref())
                        } else {
                            String::new()
                        };

                        if !text.trim().is_empty() {
                            let (x, y_up) = text_matrix.position();
                            let size = current_size * text_matrix.scale();
                            walk.spans.push(make_span(
                                text,
                                &current_font,
                                size,
                                current_color,
                                x,
                                page_height - y_up,
                            ));
                        }
                    }
                }
                "'" | "\"" => {
                    text_matrix.next_line();
                    if in_text {
                        let text_idx = if op.operator == "\"" { 2 } else { 0 };
                        if let Some(Object::String(bytes, _)) = op.operands.get(text_idx) {
                            let encoding = lopdf_fonts
                                .get(&current_font_resource)
                                .and_then(|f| f.get_font_encoding(&self.doc).ok());
                            let text = decode_string(bytes, encoding.as_ref());
                            if !text.trim().is_empty() {
                                let (x, y_up) = text_matrix.position();
                                let size = current_size * text_matrix.scale();
                                walk.spans.push(make_span(
                                    text,
                                    &current_font,
                                    size,
                                    current_color,
                                    x,
                                    page_height - y_up,
                                ));
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(walk)
    }

    /// Extract the page's placed image XObjects to the artifact directory.
    fn extract_images(
        &self,
        page_num: u32,
        page_id: ObjectId,
        placements: &[RawPlacement],
        artifact_dir: &Path,
    ) -> Vec<ImagePlacement> {
        let mut result = Vec::new();
        if placements.is_empty() {
            return result;
        }

        let Some(xobjects) = self.page_xobjects(page_id) else {
            return result;
        };

        for (index, placement) in placements.iter().enumerate() {
            let Some(object) = xobjects.get(&placement.name) else {
                continue;
            };
            let Object::Stream(stream) = object else {
                continue;
            };

            let subtype = stream
                .dict
                .get(b"Subtype")
                .ok()
                .and_then(|o| o.as_name().ok());
            if subtype != Some(b"Image".as_slice()) {
                continue;
            }

            let width_px = stream
                .dict
                .get(b"Width")
                .ok()
                .and_then(|o| o.as_i64().ok())
                .unwrap_or(0) as u32;
            let height_px = stream
                .dict
                .get(b"Height")
                .ok()
                .and_then(|o| o.as_i64().ok())
                .unwrap_or(0) as u32;
            if width_px == 0 || height_px == 0 {
                continue;
            }

            match self.save_image_stream(stream, width_px, height_px, page_num, index, artifact_dir)
            {
                Ok(path) => {
                    let bbox = placement.bbox;
                    result.push(ImagePlacement {
                        path,
                        width_px,
                        height_px,
                        bbox,
                        // Position measured from the bottom-left of the
                        // output page, ready for the Y-up canvas.
                        position: MmBox {
                            x: pt_to_mm(bbox.x0),
                            y: pt_to_mm(self.page_dimensions(page_id).1 - bbox.y1),
                            width: pt_to_mm(bbox.width()),
                            height: pt_to_mm(bbox.height()),
                        },
                    });
                }
                Err(e) => {
                    log::debug!("page {page_num}: unsupported image skipped: {e}");
                }
            }
        }

        result
    }

    /// The page's XObject dictionary resolved to concrete objects.
    fn page_xobjects(&self, page_id: ObjectId) -> Option<HashMap<Vec<u8>, &Object>> {
        let page_dict = self.doc.get_dictionary(page_id).ok()?;
        let resources = match page_dict.get(b"Resources").ok()? {
            Object::Reference(r) => self.doc.get_object(*r).ok()?.as_dict().ok()?,
            Object::Dictionary(d) => d,
            _ => return None,
        };
        let xobjects = match resources.get(b"XObject").ok()? {
            Object::Reference(r) => self.doc.get_object(*r).ok()?.as_dict().ok()?,
            Object::Dictionary(d) => d,
            _ => return None,
        };

        let mut map = HashMap::new();
        for (name, obj) in xobjects.iter() {
            let resolved = match obj {
                Object::Reference(r) => self.doc.get_object(*r).ok(),
                other => Some(other),
            };
            if let Some(resolved) = resolved {
                map.insert(name.clone(), resolved);
            }
        }
        Some(map)
    }

    /// Write an image XObject's raster data to disk.
    fn save_image_stream(
        &self,
        stream: &lopdf::Stream,
        width_px: u32,
        height_px: u32,
        page_num: u32,
        index: usize,
        artifact_dir: &Path,
    ) -> Result<PathBuf> {
        let filter = stream
            .dict
            .get(b"Filter")
            .ok()
            .and_then(|o| o.as_name().ok().map(|n| n.to_vec()));

        if filter.as_deref() == Some(b"DCTDecode") {
            // JPEG data passes through untouched.
            let path = artifact_dir.join(format!("pdf_image_p{page_num}_{index}.jpg"));
            std::fs::write(&path, &stream.content)?;
            return Ok(path);
        }

        let data = stream
            .decompressed_content()
            .map_err(|e| Error::ImageHandling(e.to_string()))?;

        let expected_rgb = (width_px * height_px * 3) as usize;
        let expected_gray = (width_px * height_px) as usize;

        let raster = if data.len() >= expected_rgb {
            image::RgbImage::from_raw(width_px, height_px, data[..expected_rgb].to_vec())
                .map(image::DynamicImage::ImageRgb8)
        } else if data.len() >= expected_gray {
            image::GrayImage::from_raw(width_px, height_px, data[..expected_gray].to_vec())
                .map(image::DynamicImage::ImageLuma8)
        } else {
            None
        };

        let raster = raster.ok_or_else(|| {
            Error::ImageHandling(format!(
                "unexpected raster payload ({} bytes for {width_px}x{height_px})",
                data.len()
            ))
        })?;

        let path = artifact_dir.join(format!("pdf_image_p{page_num}_{index}.png"));
        raster.save(&path)?;
        Ok(path)
    }

    /// Compose the page-1 header region into a raster artifact at
    /// 300 DPI-equivalent scale. Best effort: text is carried
    /// structurally, only imagery is blitted.
    fn compose_header_snapshot(
        &self,
        result: &SourceDocument,
        page_height: f32,
        artifact_dir: &Path,
    ) -> Option<PathBuf> {
        const SCALE: f32 = 300.0 / 72.0;

        let (page_width, _) = result.page_size;
        let header_h = header_height(page_height);
        let canvas_w = (page_width * SCALE).round() as u32;
        let canvas_h = (header_h * SCALE).round() as u32;
        if canvas_w == 0 || canvas_h == 0 {
            return None;
        }

        let mut canvas =
            image::RgbImage::from_pixel(canvas_w, canvas_h, image::Rgb([255, 255, 255]));

        for placement in &result.header_images {
            let loaded = match image::open(&placement.path) {
                Ok(img) => img,
                Err(e) => {
                    log::error!(
                        "header snapshot: cannot reload {}: {e}",
                        placement.path.display()
                    );
                    continue;
                }
            };

            let target_w = (placement.bbox.width() * SCALE).round().max(1.0) as u32;
            let target_h = (placement.bbox.height() * SCALE).round().max(1.0) as u32;
            let resized = loaded
                .resize_exact(target_w, target_h, image::imageops::FilterType::Triangle)
                .to_rgb8();

            let x = (placement.bbox.x0 * SCALE).round().max(0.0) as i64;
            let y = (placement.bbox.y0 * SCALE).round().max(0.0) as i64;
            image::imageops::overlay(&mut canvas, &resized, x, y);
        }

        let path = artifact_dir.join("header_snapshot.png");
        match canvas.save(&path) {
            Ok(()) => Some(path),
            Err(e) => {
                log::error!("header snapshot: save failed: {e}");
                None
            }
        }
    }
}

/// Everything a single page yields.
struct PageExtraction {
    blocks: Vec<TextBlock>,
    tables: Vec<crate::model::TableStructure>,
    images: Vec<ImagePlacement>,
}

/// Output of one content-stream walk.
#[derive(Default)]
struct ContentWalk {
    spans: Vec<TextSpan>,
    image_placements: Vec<RawPlacement>,
}

/// An image placement recorded at its `Do` operator.
struct RawPlacement {
    name: Vec<u8>,
    bbox: Rect,
}

fn make_span(text: String, font: &str, size: f32, color: u32, x: f32, y_down: f32) -> TextSpan {
    let text: String = text.nfc().collect();
    let width = text.chars().count() as f32 * size * 0.5;
    let mut span = TextSpan::new(text, font, size).at(x, y_down, width);
    span.color = color;
    span
}

fn pack_rgb(r: f32, g: f32, b: f32) -> u32 {
    let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
    (to_byte(r) << 16) | (to_byte(g) << 8) | to_byte(b)
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

fn decode_string(bytes: &[u8], encoding: Option<&lopdf::Encoding>) -> String {
    if let Some(enc) = encoding {
        if let Ok(decoded) = LopdfDocument::decode_text(enc, bytes) {
            return decoded;
        }
    }
    decode_text_simple(bytes)
}

/// TJ: array of strings and kerning adjustments. Large negative
/// adjustments (beyond 200/1000 em) are treated as word spaces.
fn decode_tj_array(operands: &[Object], encoding: Option<&lopdf::Encoding>) -> String {
    const SPACE_THRESHOLD: f32 = 200.0;

    let Some(Object::Array(arr)) = operands.first() else {
        return String::new();
    };

    let mut combined = String::new();
    for item in arr {
        match item {
            Object::String(bytes, _) => combined.push_str(&decode_string(bytes, encoding)),
            Object::Integer(n) => {
                if -(*n as f32) > SPACE_THRESHOLD && !combined.is_empty() && !combined.ends_with(' ')
                {
                    combined.push(' ');
                }
            }
            Object::Real(n) => {
                if -n > SPACE_THRESHOLD && !combined.is_empty() && !combined.ends_with(' ') {
                    combined.push(' ');
                }
            }
            _ => {}
        }
    }
    combined
}

/// Simple text decoding fallback when no encoding is available.
fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|c| {
                if c.len() == 2 {
                    Some(u16::from_be_bytes([c[0], c[1]]))
                } else {
                    None
                }
            })
            .collect();
        return String::from_utf16(&utf16).unwrap_or_default();
    }

    if let Ok(s) = String::from_utf8(bytes.to_vec()) {
        return s;
    }

    bytes.iter().map(|&b| b as char).collect()
}

/// Group spans into lines by Y position (Y-down, so ascending sort reads
/// top to bottom). Spans on one baseline are merged left to right, with a
/// space inserted across visible gaps.
fn group_spans_into_lines(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    if spans.is_empty() {
        return Vec::new();
    }

    spans.sort_by(|a, b| {
        let y_cmp = a
            .origin
            .1
            .partial_cmp(&b.origin.1)
            .unwrap_or(std::cmp::Ordering::Equal);
        if y_cmp == std::cmp::Ordering::Equal {
            a.origin
                .0
                .partial_cmp(&b.origin.0)
                .unwrap_or(std::cmp::Ordering::Equal)
        } else {
            y_cmp
        }
    });

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in spans {
        let tolerance = span.size * 0.3;
        match current_y {
            Some(y) if (span.origin.1 - y).abs() <= tolerance => current.push(span),
            _ => {
                if !current.is_empty() {
                    lines.push(assemble_line(std::mem::take(&mut current)));
                }
                current_y = Some(span.origin.1);
                current.push(span);
            }
        }
    }
    if !current.is_empty() {
        lines.push(assemble_line(current));
    }

    lines
}

/// Sort a line's spans by X and insert spaces where the glyph gap is wide
/// enough to have been a word break.
fn assemble_line(mut spans: Vec<TextSpan>) -> TextLine {
    spans.sort_by(|a, b| {
        a.origin
            .0
            .partial_cmp(&b.origin.0)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for i in 1..spans.len() {
        let prev_end = spans[i - 1].origin.0 + spans[i - 1].bbox.width();
        let gap = spans[i].origin.0 - prev_end;
        let char_count = spans[i].text.chars().count().max(1);
        let avg_char_width = spans[i].bbox.width() / char_count as f32;

        let needs_space = gap > avg_char_width * 0.2
            && !spans[i - 1].text.ends_with(' ')
            && !spans[i].text.starts_with(' ');
        if needs_space {
            spans[i].text.insert(0, ' ');
        }
    }

    TextLine::new(spans)
}

/// Group lines into blocks based on vertical spacing, font-size jumps,
/// and indentation changes.
fn group_lines_into_blocks(lines: Vec<TextLine>) -> Vec<Vec<TextLine>> {
    if lines.is_empty() {
        return Vec::new();
    }

    let spacings: Vec<f32> = lines
        .windows(2)
        .map(|w| (w[1].y() - w[0].y()).abs())
        .filter(|s| *s > 0.1)
        .collect();
    let avg_spacing = if spacings.is_empty() {
        12.0
    } else {
        spacings.iter().sum::<f32>() / spacings.len() as f32
    };

    let mut blocks: Vec<Vec<TextLine>> = Vec::new();
    let mut current: Vec<TextLine> = Vec::new();

    for line in lines {
        if let Some(prev) = current.last() {
            if should_break_block(prev, &line, avg_spacing) {
                blocks.push(std::mem::take(&mut current));
            }
        }
        current.push(line);
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

fn should_break_block(prev: &TextLine, curr: &TextLine, avg_spacing: f32) -> bool {
    let spacing = (curr.y() - prev.y()).abs();
    if spacing > avg_spacing * 1.5 {
        return true;
    }

    let prev_size = prev.spans.first().map(|s| s.size).unwrap_or(12.0);
    let curr_size = curr.spans.first().map(|s| s.size).unwrap_or(12.0);
    if (prev_size - curr_size).abs() > 1.0 {
        return true;
    }

    let prev_x = prev.spans.first().map(|s| s.origin.0).unwrap_or(0.0);
    let curr_x = curr.spans.first().map(|s| s.origin.0).unwrap_or(0.0);
    (prev_x - curr_x).abs() > 20.0
}

/// Text matrix tracking for span positions.
#[derive(Debug, Clone)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.e = e;
        self.f = f;
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.e += tx * self.a + ty * self.c;
        self.f += tx * self.b + ty * self.d;
    }

    fn next_line(&mut self) {
        self.f -= 12.0 * self.d;
    }

    fn position(&self) -> (f32, f32) {
        (self.e, self.f)
    }

    fn scale(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }
}

/// Graphics (CTM) state with a q/Q stack, tracked for image placement.
#[derive(Debug, Clone)]
struct GraphicsState {
    matrix: [f32; 6],
    stack: Vec<[f32; 6]>,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            matrix: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            stack: Vec::new(),
        }
    }
}

impl GraphicsState {
    fn push(&mut self) {
        self.stack.push(self.matrix);
    }

    fn pop(&mut self) {
        if let Some(m) = self.stack.pop() {
            self.matrix = m;
        }
    }

    fn concat(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        let [ma, mb, mc, md, me, mf] = self.matrix;
        self.matrix = [
            a * ma + b * mc,
            a * mb + b * md,
            c * ma + d * mc,
            c * mb + d * md,
            e * ma + f * mc + me,
            e * mb + f * md + mf,
        ];
    }

    /// Placement of the unit square under the current matrix:
    /// (x, y, width, height), ignoring rotation.
    fn placement(&self) -> (f32, f32, f32, f32) {
        let [a, _, _, d, e, f] = self.matrix;
        (e, f, a.abs(), d.abs())
    }
}
