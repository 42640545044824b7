//! End-to-end pipeline tests over a synthesized DOCX source.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use examforge::model::HeaderContent;
use examforge::{extract, segment_document, ExamSession, ExtractOptions, ShuffleMode};

const DOCUMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>1. Qual a capital do Brasil?</w:t></w:r></w:p>
    <w:p><w:r><w:t>(A) Brasília</w:t></w:r></w:p>
    <w:p><w:r><w:t>(B) Rio de Janeiro</w:t></w:r></w:p>
    <w:p><w:r><w:t>2. Quem tem a maior nota na tabela?</w:t></w:r></w:p>
    <w:tbl>
      <w:tr>
        <w:tc><w:p><w:r><w:t>Nome</w:t></w:r></w:p></w:tc>
        <w:tc><w:p><w:r><w:t>Nota</w:t></w:r></w:p></w:tc>
      </w:tr>
      <w:tr>
        <w:tc><w:p><w:r><w:t>Ana</w:t></w:r></w:p></w:tc>
        <w:tc><w:p><w:r><w:t>9</w:t></w:r></w:p></w:tc>
      </w:tr>
      <w:tr>
        <w:tc><w:p><w:r><w:t>Bia</w:t></w:r></w:p></w:tc>
        <w:tc><w:p><w:r><w:t>7</w:t></w:r></w:p></w:tc>
      </w:tr>
    </w:tbl>
    <w:p><w:r><w:t>(A) Ana</w:t></w:r></w:p>
    <w:p><w:r><w:t>(B) Bia</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

const HEADER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:hdr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:p>
    <w:r><w:rPr><w:b/><w:sz w:val="28"/></w:rPr><w:t>ESCOLA ESTADUAL EXEMPLO</w:t></w:r>
  </w:p>
  <w:p>
    <w:r><w:t>Avaliação Bimestral de História</w:t></w:r>
  </w:p>
</w:hdr>"#;

fn write_docx(path: &Path) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();

    zip.start_file("word/document.xml", options).unwrap();
    zip.write_all(DOCUMENT_XML.as_bytes()).unwrap();

    zip.start_file("word/header1.xml", options).unwrap();
    zip.write_all(HEADER_XML.as_bytes()).unwrap();

    zip.finish().unwrap();
}

#[test]
fn docx_extraction_builds_the_full_model() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("prova.docx");
    write_docx(&source);

    let options = ExtractOptions::new().with_temp_dir(dir.path().join("artifacts"));
    let doc = examforge::extract_with_options(&source, &options).unwrap();

    assert_eq!(doc.blocks.len(), 7);
    assert!(doc.preserve_original_header);

    // Block order is preserved: the full text is exactly the ordered
    // blocks joined with blank lines.
    let joined = doc
        .blocks
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    assert_eq!(doc.full_text, joined);

    let table_block = doc.blocks.iter().find(|b| b.is_table).unwrap();
    assert_eq!(table_block.text, "Nome | Nota\nAna | 9\nBia | 7");
    let table = doc.table_for_block(table_block.id).unwrap();
    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.rows[0], vec!["Nome", "Nota"]);

    match &doc.header {
        HeaderContent::DocxParagraphs(paras) => {
            assert_eq!(paras.len(), 2);
            assert_eq!(paras[0].text, "ESCOLA ESTADUAL EXEMPLO");
            assert!(paras[0].runs[0].flags.bold);
            assert_eq!(paras[0].runs[0].size, Some(14.0));
        }
        other => panic!("expected DOCX header paragraphs, got {other:?}"),
    }
}

#[test]
fn docx_segmentation_finds_questions_and_inlines_the_table() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("prova.docx");
    write_docx(&source);

    let doc = extract(&source).unwrap();
    let segmentation = segment_document(&doc);

    assert_eq!(segmentation.questions.len(), 2);
    assert!(segmentation.signals.own_numbering);

    let first = &segmentation.questions[0];
    assert_eq!(first.statement, "1. Qual a capital do Brasil?");
    assert_eq!(first.alternatives, vec!["(A) Brasília", "(B) Rio de Janeiro"]);

    let second = &segmentation.questions[1];
    assert!(second.statement.starts_with("2. Quem tem a maior nota"));
    assert!(second.statement.contains("<table"));
    assert_eq!(second.alternatives, vec!["(A) Ana", "(B) Bia"]);
}

#[test]
fn session_generates_exam_and_answer_key() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("prova.docx");
    write_docx(&source);
    let output = dir.path().join("saida").join("prova_gerada.pdf");

    let generated = ExamSession::new()
        .with_shuffle(ShuffleMode::All)
        .with_seed(2024)
        .generate(&source, &output)
        .unwrap();

    assert!(generated.exam_path.exists());
    let bytes = std::fs::read(&generated.exam_path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));

    let key = generated.answer_key_path.unwrap();
    let key_text = std::fs::read_to_string(&key).unwrap();
    assert!(key_text.contains("GABARITO"));
    assert!(key_text.contains("(A) Ana") || key_text.contains("(B) Bia"));
}

#[test]
fn generated_exam_is_itself_extractable() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("prova.docx");
    write_docx(&source);
    let output = dir.path().join("prova_gerada.pdf");

    let generated = ExamSession::new()
        .with_seed(1)
        .generate(&source, &output)
        .unwrap();

    let reread = extract(&generated.exam_path).unwrap();
    assert!(!reread.blocks.is_empty());
    assert!(reread.full_text.contains("capital"));
}

#[test]
fn same_seed_generates_identical_question_order() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("prova.docx");
    write_docx(&source);

    let doc = extract(&source).unwrap();
    let questions = segment_document(&doc).questions;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    let a = ShuffleMode::All.apply(&mut StdRng::seed_from_u64(42), &questions);
    let b = ShuffleMode::All.apply(&mut StdRng::seed_from_u64(42), &questions);
    assert_eq!(a, b);
}
