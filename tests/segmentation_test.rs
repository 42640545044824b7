//! Integration tests for question segmentation over block streams.

use examforge::model::TextBlock;
use examforge::{segment, tables};

fn blocks(texts: &[&str]) -> Vec<TextBlock> {
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| TextBlock::from_text(i, *t, Vec::new()))
        .collect()
}

#[test]
fn well_formed_input_yields_exact_questions() {
    let stream = blocks(&[
        "1. What is X?",
        "(A) foo",
        "(B) bar",
        "2. What is Y?",
        "(A) baz",
        "(B) qux",
    ]);
    let result = segment(&stream, &[]);

    assert_eq!(result.questions.len(), 2);
    assert_eq!(result.questions[0].statement, "1. What is X?");
    assert_eq!(result.questions[0].alternatives, vec!["(A) foo", "(B) bar"]);
    assert_eq!(result.questions[1].statement, "2. What is Y?");
    assert_eq!(result.questions[1].alternatives, vec!["(A) baz", "(B) qux"]);
}

#[test]
fn segmentation_is_deterministic() {
    let stream = blocks(&["1. Q?", "(A) a", "(B) b", "2. R?", "(C) c", "(D) d"]);
    let first = segment(&stream, &[]);
    let second = segment(&stream, &[]);
    assert_eq!(first.questions, second.questions);
}

#[test]
fn statement_at_end_of_stream_is_dropped() {
    let stream = blocks(&["1. Kept?", "(A) sim", "(B) não", "2. Dropped at EOF"]);
    let result = segment(&stream, &[]);
    assert_eq!(result.questions.len(), 1);
    assert_eq!(result.questions[0].statement, "1. Kept?");
}

#[test]
fn statement_followed_by_one_alternative_is_kept() {
    let stream = blocks(&["1. Kept?", "(A) sim", "(B) não", "2. Also kept?", "(A) só uma"]);
    let result = segment(&stream, &[]);
    assert_eq!(result.questions.len(), 2);
    assert_eq!(result.questions[1].alternatives, vec!["(A) só uma"]);
}

#[test]
fn duplicated_alternative_marker_is_collapsed() {
    let stream = blocks(&["1. Q?", "(A)(A) Texto", "(B) outro"]);
    let result = segment(&stream, &[]);
    assert_eq!(result.questions[0].alternatives[0], "(A) Texto");
}

#[test]
fn question_word_and_numbering_variants_are_recognized() {
    let stream = blocks(&[
        "Questão 1 — primeira",
        "(A) a",
        "(B) b",
        "2) segunda",
        "(a) minúscula",
        "(b) também",
    ]);
    let result = segment(&stream, &[]);
    assert_eq!(result.questions.len(), 2);
    assert!(result.signals.uses_question_word);
}

#[test]
fn embedded_table_is_folded_into_the_statement() {
    let mut stream = blocks(&[
        "1. Com base na tabela abaixo, quem é mais velho?",
        "Nome | Idade\n---|---\nAna | 20\nJoão | 25",
        "(A) Ana",
        "(B) João",
    ]);
    stream[1].is_table = true;
    let table = tables::structure_for(1, &stream[1].text);

    let result = segment(&stream, &[table]);
    assert_eq!(result.questions.len(), 1);

    let statement = &result.questions[0].statement;
    assert!(statement.starts_with("1. Com base na tabela"));
    assert!(statement.contains("<table"));
    assert!(statement.contains("João"));
    assert_eq!(result.questions[0].alternatives, vec!["(A) Ana", "(B) João"]);
}

#[test]
fn unclassified_prose_contributes_nothing() {
    let stream = blocks(&[
        "ESCOLA ESTADUAL EXEMPLO",
        "Leia com atenção antes de começar.",
        "1. Pergunta real?",
        "(A) sim",
        "(B) não",
        "Rascunho livre",
    ]);
    let result = segment(&stream, &[]);
    assert_eq!(result.questions.len(), 1);
    assert!(!result.questions[0].statement.contains("ESCOLA"));
}
