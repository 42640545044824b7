//! Integration tests for the table detection heuristic.

use examforge::tables;

#[test]
fn markdown_style_table_classifies_and_decomposes() {
    let text = "Nome | Idade\n---|---\nAna | 20\nJoão | 25";
    assert!(tables::classify(text));

    let table = tables::decompose(text);
    assert!(table.has_header_row);
    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.rows[0], vec!["Nome", "Idade"]);
    assert_eq!(table.rows[1].len(), 2);
    assert_eq!(table.rows[2].len(), 2);
}

#[test]
fn plain_prose_never_classifies() {
    let text = "O período colonial brasileiro estendeu a economia açucareira\n\
                pelas capitanias do nordeste durante quase dois séculos\n\
                com engenhos movidos a trabalho escravizado";
    assert!(!tables::classify(text));
}

#[test]
fn single_line_never_classifies() {
    assert!(!tables::classify("Nome | Idade"));
    assert!(!tables::classify("texto com  espaços  duplos em uma linha só"));
}

#[test]
fn box_drawing_and_grid_patterns_classify() {
    assert!(tables::classify("┌────┬────┐\n│ ab │ cd │\n└────┴────┘"));
    assert!(tables::classify("+--+--+\n|ab|cd|\n+--+--+"));
}

#[test]
fn tab_separated_values_classify() {
    assert!(tables::classify("Nome\tIdade\tCidade\nAna\t20\tNatal"));
}

#[test]
fn delimiter_priority_pipe_over_tab_over_spaces() {
    // Pipes win even when tabs are present.
    let mixed = tables::decompose("a|b\tc\nd|e\tf");
    assert_eq!(mixed.rows[0], vec!["a", "b\tc"]);

    // Tabs win over multi-space runs.
    let tabbed = tables::decompose("a\tb  c\nd\te  f");
    assert_eq!(tabbed.rows[0], vec!["a", "b  c"]);

    let spaced = tables::decompose("a  b\nc  d");
    assert_eq!(spaced.rows[0], vec!["a", "b"]);
}

#[test]
fn separator_rows_are_excluded_from_data() {
    let table = tables::decompose("col1 | col2\n-----|-----\nv1 | v2\n=====|=====\nv3 | v4");
    assert_eq!(table.rows.len(), 3);
    assert!(table.has_header_row);
}

#[test]
fn monospace_font_alone_is_sufficient() {
    let prose = "duas linhas de texto\nsem qualquer delimitador";
    assert!(!tables::classify(prose));
    assert!(tables::classify_with_fonts(prose, ["Menlo"].into_iter()));
}

#[test]
fn html_fragment_reflects_structure() {
    let table = tables::structure_for(3, "Nome | Nota\n---|---\nAna | 9\nBia | 7");
    let html = tables::to_html(&table);

    assert_eq!(html.matches("<tr>").count(), 3);
    assert_eq!(html.matches("<th").count(), 2);
    assert_eq!(html.matches("<td").count(), 4);
    assert!(html.contains("border-collapse"));
}
