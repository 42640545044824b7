//! Table detection over a block's internal line structure.
//!
//! Hand-typed exam documents carry ASCII-art or space-aligned tables far
//! more often than native table objects, so classification works on the
//! text itself. Several independent signals are combined; any one of them
//! is sufficient. Worst case a table degrades to an unstructured
//! multi-line paragraph — never an error.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::TableStructure;

/// Characters whose vertical alignment across lines suggests columns.
const ALIGNMENT_DELIMITERS: &[char] = &[':', '|', '.', '-', '+'];

/// Unicode box-drawing glyphs.
const BOX_CHARS: &[char] = &['┌', '┐', '└', '┘', '├', '┤', '┬', '┴', '┼', '│', '─'];

/// ASCII grid patterns.
const GRID_PATTERNS: &[&str] = &["+-+", "+--+", "|--|"];

/// Known monospace font family substrings.
const MONOSPACE_FONTS: &[&str] = &["Courier", "Consolas", "Monaco", "Menlo", "MonoSpace"];

fn multi_space() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s{2,}").expect("valid regex"))
}

/// Classify a block's text as tabular or prose.
pub fn classify(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().collect();

    if alignment_signal(&lines) {
        log::debug!("table signal: vertical alignment");
        return true;
    }

    if grid_signal(text) {
        log::debug!("table signal: grid glyphs");
        return true;
    }

    if separator_consistency_signal(text, &lines) {
        log::debug!("table signal: separator consistency");
        return true;
    }

    false
}

/// Classify with the additional monospace-font signal from the block's
/// span fonts.
pub fn classify_with_fonts<'a>(text: &str, mut fonts: impl Iterator<Item = &'a str>) -> bool {
    if classify(text) {
        return true;
    }
    if fonts.any(is_monospace_font) {
        log::debug!("table signal: monospace font");
        return true;
    }
    false
}

/// Whether a font name belongs to a known monospace family.
pub fn is_monospace_font(name: &str) -> bool {
    MONOSPACE_FONTS.iter().any(|mono| name.contains(mono))
}

/// Vertical alignment scoring: collect delimiter character positions per
/// line; a position shared by more than half the delimiter-carrying lines
/// scores one point; two points classify as table.
fn alignment_signal(lines: &[&str]) -> bool {
    if lines.len() < 2 {
        return false;
    }

    let char_positions: Vec<Vec<usize>> = lines
        .iter()
        .map(|line| {
            line.chars()
                .enumerate()
                .filter(|(_, c)| ALIGNMENT_DELIMITERS.contains(c))
                .map(|(i, _)| i)
                .collect::<Vec<_>>()
        })
        .filter(|positions| !positions.is_empty())
        .collect();

    if char_positions.len() < 2 {
        return false;
    }

    let mut all_positions: Vec<usize> = char_positions.iter().flatten().copied().collect();
    all_positions.sort_unstable();
    all_positions.dedup();

    let mut alignment_score = 0usize;
    for pos in all_positions {
        let aligned = char_positions.iter().filter(|p| p.contains(&pos)).count();
        if aligned > char_positions.len() / 2 {
            alignment_score += 1;
        }
    }

    alignment_score >= 2
}

/// Box-drawing glyphs or ASCII grid patterns anywhere in the text.
fn grid_signal(text: &str) -> bool {
    text.chars().any(|c| BOX_CHARS.contains(&c))
        || GRID_PATTERNS.iter().any(|pattern| text.contains(pattern))
}

/// Separator-consistency: pipes, tabs, or double-spacing present in a
/// multi-line block, with per-line separator totals taking at most two
/// distinct values (tolerates a header row without a trailing separator).
fn separator_consistency_signal(text: &str, lines: &[&str]) -> bool {
    if lines.len() < 2 {
        return false;
    }
    if !(text.contains('\t') || text.contains('|') || text.contains("  ")) {
        return false;
    }

    let mut counts: Vec<usize> = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.matches('|').count() + line.matches('\t').count() + line.matches("  ").count()
        })
        .collect();

    if counts.is_empty() {
        return false;
    }

    counts.sort_unstable();
    counts.dedup();
    counts.len() <= 2
}

/// Result of decomposing a tabular block into rows and cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDecomposition {
    /// Data rows (separator rows removed)
    pub rows: Vec<Vec<String>>,
    /// Whether the second raw line was a header/body divider
    pub has_header_row: bool,
}

/// Decompose a block's text into rows and best-effort columns.
///
/// Cell split uses the first present delimiter among pipe, tab, and runs
/// of two or more spaces, in that priority order per row.
pub fn decompose(text: &str) -> TableDecomposition {
    let raw_lines: Vec<&str> = text.lines().collect();

    let has_header_row = raw_lines.len() > 1 && is_separator_row(raw_lines[1]);

    let rows = raw_lines
        .iter()
        .filter(|line| !line.trim().is_empty() && !is_separator_row(line))
        .map(|line| split_row(line))
        .collect();

    TableDecomposition {
        rows,
        has_header_row,
    }
}

/// Decompose a block and wrap the result as a `TableStructure` owned by
/// the given block id.
pub fn structure_for(block_id: usize, text: &str) -> TableStructure {
    let decomposition = decompose(text);
    TableStructure {
        block_id,
        rows: decomposition.rows,
        has_header_row: decomposition.has_header_row,
        raw_text: text.to_string(),
    }
}

/// A row made entirely of separator/fill characters.
fn is_separator_row(line: &str) -> bool {
    let printable: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
    !printable.is_empty() && printable.iter().all(|c| matches!(c, '-' | '+' | '=' | '|'))
}

/// Split one row into cells: pipe, then tab, then multi-space.
fn split_row(line: &str) -> Vec<String> {
    if line.contains('|') {
        let mut cells: Vec<String> = line.split('|').map(|c| c.trim().to_string()).collect();
        // Leading/trailing pipes produce empty edge cells.
        if cells.first().is_some_and(|c| c.is_empty()) {
            cells.remove(0);
        }
        if cells.last().is_some_and(|c| c.is_empty()) {
            cells.pop();
        }
        cells
    } else if line.contains('\t') {
        line.split('\t').map(|c| c.trim().to_string()).collect()
    } else if multi_space().is_match(line.trim()) {
        multi_space()
            .split(line.trim())
            .map(|c| c.trim().to_string())
            .collect()
    } else {
        vec![line.trim().to_string()]
    }
}

/// Render a decomposed table as an inline HTML fragment for embedding in
/// a question statement.
pub fn to_html(table: &TableStructure) -> String {
    let mut html =
        String::from("<table style='border-collapse: collapse; width: 100%; margin: 10px 0;'>");

    for (i, row) in table.rows.iter().enumerate() {
        let is_header = table.has_header_row && i == 0;
        let (tag, style) = if is_header {
            (
                "th",
                "border: 1px solid #ddd; padding: 8px; text-align: left; \
                 background-color: #f2f2f2; font-weight: bold;",
            )
        } else {
            ("td", "border: 1px solid #ddd; padding: 8px; text-align: left;")
        };

        html.push_str("<tr>");
        for cell in row {
            if cell.trim().is_empty() {
                continue;
            }
            html.push_str(&format!("<{tag} style='{style}'>{cell}</{tag}>"));
        }
        html.push_str("</tr>");
    }

    html.push_str("</table>");
    html
}
