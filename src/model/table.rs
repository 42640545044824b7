//! Decomposed table records.

use serde::{Deserialize, Serialize};

/// A table-classified block decomposed into rows and cells.
///
/// Linked to its owning block by id, so two blocks with identical text
/// never collide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableStructure {
    /// Id of the `TextBlock` this table was decomposed from
    pub block_id: usize,
    /// Data rows (separator/fill rows already removed)
    pub rows: Vec<Vec<String>>,
    /// Whether a separator as the second raw line marked the first row as
    /// a header
    pub has_header_row: bool,
    /// The block's raw text, kept for fallback rendering
    pub raw_text: String,
}

impl TableStructure {
    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Widest row's cell count.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    /// Check if the decomposition yielded no usable rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let table = TableStructure {
            block_id: 0,
            rows: vec![
                vec!["Nome".into(), "Idade".into()],
                vec!["Ana".into(), "20".into(), "extra".into()],
            ],
            has_header_row: true,
            raw_text: String::new(),
        };
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 3);
        assert!(!table.is_empty());
    }
}
