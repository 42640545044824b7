//! Logical question model produced by segmentation.

use serde::{Deserialize, Serialize};

/// A question: a statement plus its ordered answer alternatives.
///
/// Questions carry no identity beyond their position in the list —
/// reordering them is exactly what the shuffle step does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Statement text; may contain an inline table fragment
    pub statement: String,
    /// Answer alternatives, each with its letter marker
    pub alternatives: Vec<String>,
}

impl Question {
    /// Create a question from a statement and alternatives.
    pub fn new(
        statement: impl Into<String>,
        alternatives: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            statement: statement.into(),
            alternatives: alternatives.into_iter().map(Into::into).collect(),
        }
    }
}

/// Format signals observed from the first question-start block of a
/// document, used by the renderer to decide whether to inject numbering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentSignals {
    /// The document numbers its questions itself ("1.", "2)", …)
    pub own_numbering: bool,
    /// The document uses the literal word "Questão"
    pub uses_question_word: bool,
}
