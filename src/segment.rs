//! Question segmentation over the ordered block stream.
//!
//! A single pass groups blocks into (statement, alternatives) pairs.
//! Block order is the only adjacency signal: a question opens at a
//! numbered statement block, collects alternative blocks, and closes when
//! the next question opens or the stream ends. Tables classified inside an
//! open question are folded into its statement as an inline fragment.

use crate::model::{Question, SegmentSignals, SourceDocument, TableStructure, TextBlock};
use crate::tables;

/// Letters accepted as alternative markers.
const ALTERNATIVE_LETTERS: &[char] = &['A', 'B', 'C', 'D', 'E', 'a', 'b', 'c', 'd', 'e'];

/// Result of segmenting a document's blocks.
#[derive(Debug, Clone, Default)]
pub struct Segmentation {
    /// Questions in document order
    pub questions: Vec<Question>,
    /// Format signals for the renderer
    pub signals: SegmentSignals,
}

/// Segment an extracted document into questions.
pub fn segment_document(doc: &SourceDocument) -> Segmentation {
    segment(&doc.blocks, &doc.tables)
}

/// Segment an ordered block stream into questions.
///
/// `tables` supplies the decomposed records for table-classified blocks,
/// looked up by block id.
pub fn segment(blocks: &[TextBlock], tables: &[TableStructure]) -> Segmentation {
    let mut questions: Vec<Question> = Vec::new();
    let mut current: Option<String> = None;
    let mut alternatives: Vec<String> = Vec::new();
    let mut signals = SegmentSignals::default();

    for block in blocks {
        let text = block.text.trim();
        if text.is_empty() {
            continue;
        }

        // Format signals come from the first question-start block only.
        if current.is_none() {
            if starts_with_question_word(text) {
                signals.uses_question_word = true;
            }
            if starts_with_numbering(text) {
                signals.own_numbering = true;
            }
        }

        if is_question_start(text) {
            if let Some(statement) = current.take() {
                close_question(&mut questions, statement, &mut alternatives);
            }
            current = Some(text.to_string());
        } else if let Some(marker) = alternative_marker(text) {
            let normalized = normalize_alternative(text, &marker);
            if current.is_some() {
                alternatives.push(normalized);
            } else {
                log::debug!("alternative outside any question discarded: {normalized}");
            }
        } else if block.is_table {
            if let Some(statement) = current.as_mut() {
                let structure = tables
                    .iter()
                    .find(|t| t.block_id == block.id)
                    .cloned()
                    .unwrap_or_else(|| tables::structure_for(block.id, &block.text));
                statement.push('\n');
                statement.push_str(&tables::to_html(&structure));
            }
        }
        // Any other block (instructions, section titles, free prose) is
        // not captured as structured data.
    }

    if let Some(statement) = current.take() {
        close_question(&mut questions, statement, &mut alternatives);
    }

    Segmentation { questions, signals }
}

/// Close an open question, emitting it only when at least one alternative
/// was collected.
fn close_question(questions: &mut Vec<Question>, statement: String, alternatives: &mut Vec<String>) {
    if alternatives.is_empty() {
        log::warn!(
            "dropping question without alternatives: {:?}",
            statement.chars().take(40).collect::<String>()
        );
        return;
    }
    questions.push(Question {
        statement,
        alternatives: std::mem::take(alternatives),
    });
}

/// Whether a block opens a new question: `"<n>."`, `"<n>)"`, or
/// `"Questão <n>"` for n in 1–99.
pub fn is_question_start(text: &str) -> bool {
    starts_with_numbering(text) || starts_with_question_word(text)
}

fn starts_with_numbering(text: &str) -> bool {
    let bytes = text.as_bytes();
    for digits in 1..=2usize {
        if bytes.len() <= digits {
            break;
        }
        if !bytes[..digits].iter().all(u8::is_ascii_digit) {
            break;
        }
        if bytes[0] == b'0' {
            break;
        }
        if bytes[digits] == b'.' || bytes[digits] == b')' {
            return true;
        }
    }
    false
}

fn starts_with_question_word(text: &str) -> bool {
    text.strip_prefix("Questão ")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_digit() && c != '0')
}

/// The alternative marker a block starts with, if any: `"(L)"` or `"L)"`
/// for L in A–E/a–e.
pub fn alternative_marker(text: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().take(3).collect();
    match chars.as_slice() {
        ['(', letter, ')', ..] if ALTERNATIVE_LETTERS.contains(letter) => {
            Some(format!("({letter})"))
        }
        [letter, ')', ..] if ALTERNATIVE_LETTERS.contains(letter) => Some(format!("{letter})")),
        _ => None,
    }
}

/// Rebuild an alternative as `marker + remainder`, collapsing a marker
/// that the source format duplicated.
fn normalize_alternative(text: &str, marker: &str) -> String {
    let mut rest = text;
    while let Some(stripped) = rest.strip_prefix(marker) {
        rest = stripped.trim_start();
    }
    if rest.is_empty() {
        marker.to_string()
    } else {
        format!("{marker} {rest}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks_from(texts: &[&str]) -> Vec<TextBlock> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| TextBlock::from_text(i, *t, Vec::new()))
            .collect()
    }

    #[test]
    fn test_two_well_formed_questions() {
        let blocks = blocks_from(&[
            "1. What is X?",
            "(A) foo",
            "(B) bar",
            "2. What is Y?",
            "(A) baz",
            "(B) qux",
        ]);
        let result = segment(&blocks, &[]);

        assert_eq!(result.questions.len(), 2);
        assert_eq!(result.questions[0].statement, "1. What is X?");
        assert_eq!(result.questions[0].alternatives, vec!["(A) foo", "(B) bar"]);
        assert_eq!(result.questions[1].statement, "2. What is Y?");
        assert_eq!(result.questions[1].alternatives, vec!["(A) baz", "(B) qux"]);
    }

    #[test]
    fn test_trailing_question_without_alternatives_dropped() {
        let blocks = blocks_from(&["1. Complete?", "(A) sim", "2. Trailing statement"]);
        let result = segment(&blocks, &[]);
        assert_eq!(result.questions.len(), 1);
        assert_eq!(result.questions[0].statement, "1. Complete?");
    }

    #[test]
    fn test_trailing_question_with_one_alternative_kept() {
        let blocks = blocks_from(&["1. Complete?", "(A) sim", "2. Last one", "(A) único"]);
        let result = segment(&blocks, &[]);
        assert_eq!(result.questions.len(), 2);
        assert_eq!(result.questions[1].alternatives, vec!["(A) único"]);
    }

    #[test]
    fn test_duplicated_marker_normalizes() {
        let blocks = blocks_from(&["1. Q?", "(A)(A) Texto", "(B) outro"]);
        let result = segment(&blocks, &[]);
        assert_eq!(result.questions[0].alternatives[0], "(A) Texto");
    }

    #[test]
    fn test_alternative_before_any_question_discarded() {
        let blocks = blocks_from(&["(A) órfã", "1. Q?", "(A) sim", "(B) não"]);
        let result = segment(&blocks, &[]);
        assert_eq!(result.questions.len(), 1);
        assert_eq!(result.questions[0].alternatives, vec!["(A) sim", "(B) não"]);
    }

    #[test]
    fn test_table_folds_into_open_statement() {
        let mut blocks = blocks_from(&["1. Observe a tabela:", "Nome | Nota\nAna | 9"]);
        blocks[1].is_table = true;
        let table = tables::structure_for(1, &blocks[1].text);
        let mut blocks_and_alt = blocks;
        blocks_and_alt.push(TextBlock::from_text(2, "(A) Ana", Vec::new()));
        blocks_and_alt.push(TextBlock::from_text(3, "(B) ninguém", Vec::new()));

        let result = segment(&blocks_and_alt, &[table]);
        assert_eq!(result.questions.len(), 1);
        assert!(result.questions[0].statement.starts_with("1. Observe a tabela:"));
        assert!(result.questions[0].statement.contains("<table"));
        assert!(result.questions[0].statement.contains("Ana"));
    }

    #[test]
    fn test_table_between_questions_ignored() {
        let mut blocks = blocks_from(&["Nome | Nota\nAna | 9", "1. Q?", "(A) sim", "(B) não"]);
        blocks[0].is_table = true;
        let result = segment(&blocks, &[]);
        assert_eq!(result.questions.len(), 1);
        assert!(!result.questions[0].statement.contains("<table"));
    }

    #[test]
    fn test_prose_between_questions_ignored() {
        let blocks = blocks_from(&[
            "INSTRUÇÕES GERAIS",
            "1. Q?",
            "(A) sim",
            "(B) não",
            "Boa prova a todos!",
            "2. Q2?",
            "(a) talvez",
            "(b) nunca",
        ]);
        let result = segment(&blocks, &[]);
        assert_eq!(result.questions.len(), 2);
        assert_eq!(result.questions[1].alternatives, vec!["(a) talvez", "(b) nunca"]);
    }

    #[test]
    fn test_question_start_forms() {
        assert!(is_question_start("1. texto"));
        assert!(is_question_start("12) texto"));
        assert!(is_question_start("99. texto"));
        assert!(is_question_start("Questão 3 — enunciado"));
        assert!(!is_question_start("0. texto"));
        assert!(!is_question_start("100. texto"));
        assert!(!is_question_start("Questão extra"));
        assert!(!is_question_start("texto comum"));
    }

    #[test]
    fn test_alternative_marker_forms() {
        assert_eq!(alternative_marker("(A) foo").as_deref(), Some("(A)"));
        assert_eq!(alternative_marker("b) bar").as_deref(), Some("b)"));
        assert_eq!(alternative_marker("(F) fora do conjunto"), None);
        assert_eq!(alternative_marker("texto"), None);
    }

    #[test]
    fn test_signals_from_first_question_block() {
        let result = segment(
            &blocks_from(&["Questão 1 sobre X", "(A) a", "(B) b"]),
            &[],
        );
        assert!(result.signals.uses_question_word);
        assert!(!result.signals.own_numbering);

        let result = segment(&blocks_from(&["3) sobre Y", "(A) a", "(B) b"]), &[]);
        assert!(result.signals.own_numbering);
        assert!(!result.signals.uses_question_word);
    }
}
