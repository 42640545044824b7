//! Order randomization over the question model.
//!
//! All operations return new sequences; nothing mutates its input. The
//! randomness source is injected, so callers needing reproducibility pass
//! a seeded generator.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::Question;

/// Which parts of the exam to shuffle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShuffleMode {
    /// Keep the original order
    #[default]
    None,
    /// Shuffle the question order only
    Questions,
    /// Shuffle each question's alternatives only
    Alternatives,
    /// Shuffle alternatives within every question, then the question order
    All,
}

impl ShuffleMode {
    /// Apply the mode to a question list.
    pub fn apply<R: Rng + ?Sized>(self, rng: &mut R, questions: &[Question]) -> Vec<Question> {
        match self {
            ShuffleMode::None => questions.to_vec(),
            ShuffleMode::Questions => shuffle_questions(rng, questions),
            ShuffleMode::Alternatives => questions
                .iter()
                .map(|q| shuffle_alternatives(rng, q))
                .collect(),
            ShuffleMode::All => shuffle_all(rng, questions),
        }
    }
}

impl std::str::FromStr for ShuffleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(ShuffleMode::None),
            "questions" | "questoes" => Ok(ShuffleMode::Questions),
            "alternatives" | "alternativas" => Ok(ShuffleMode::Alternatives),
            "all" | "tudo" => Ok(ShuffleMode::All),
            other => Err(format!("unknown shuffle mode: {other}")),
        }
    }
}

/// Uniform random permutation of the question list.
pub fn shuffle_questions<R: Rng + ?Sized>(rng: &mut R, questions: &[Question]) -> Vec<Question> {
    let mut shuffled = questions.to_vec();
    shuffled.shuffle(rng);
    shuffled
}

/// Uniform random permutation of one question's alternatives; the
/// statement is unchanged.
pub fn shuffle_alternatives<R: Rng + ?Sized>(rng: &mut R, question: &Question) -> Question {
    let mut alternatives = question.alternatives.clone();
    alternatives.shuffle(rng);
    Question {
        statement: question.statement.clone(),
        alternatives,
    }
}

/// Shuffle every question's alternatives independently, then the question
/// order.
pub fn shuffle_all<R: Rng + ?Sized>(rng: &mut R, questions: &[Question]) -> Vec<Question> {
    let shuffled: Vec<Question> = questions
        .iter()
        .map(|q| shuffle_alternatives(rng, q))
        .collect();
    shuffle_questions(rng, &shuffled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_questions(n: usize) -> Vec<Question> {
        (1..=n)
            .map(|i| {
                Question::new(
                    format!("{i}. Pergunta {i}"),
                    ["(A) um", "(B) dois", "(C) três", "(D) quatro"],
                )
            })
            .collect()
    }

    fn sorted_statements(questions: &[Question]) -> Vec<String> {
        let mut statements: Vec<String> =
            questions.iter().map(|q| q.statement.clone()).collect();
        statements.sort();
        statements
    }

    #[test]
    fn test_shuffle_questions_is_permutation() {
        let questions = sample_questions(12);
        let mut rng = StdRng::seed_from_u64(7);
        let shuffled = shuffle_questions(&mut rng, &questions);

        assert_eq!(shuffled.len(), questions.len());
        assert_eq!(sorted_statements(&shuffled), sorted_statements(&questions));
    }

    #[test]
    fn test_shuffle_short_lists_unchanged() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(shuffle_questions(&mut rng, &[]).is_empty());

        let one = sample_questions(1);
        assert_eq!(shuffle_questions(&mut rng, &one), one);
    }

    #[test]
    fn test_shuffle_alternatives_keeps_statement() {
        let question = Question::new("1. Q?", ["(A) a", "(B) b", "(C) c"]);
        let mut rng = StdRng::seed_from_u64(3);
        let shuffled = shuffle_alternatives(&mut rng, &question);

        assert_eq!(shuffled.statement, question.statement);
        let mut original = question.alternatives.clone();
        let mut result = shuffled.alternatives.clone();
        original.sort();
        result.sort();
        assert_eq!(original, result);
    }

    #[test]
    fn test_shuffle_all_permutes_both_levels() {
        let questions = sample_questions(8);
        let mut rng = StdRng::seed_from_u64(11);
        let shuffled = shuffle_all(&mut rng, &questions);

        assert_eq!(sorted_statements(&shuffled), sorted_statements(&questions));
        for q in &shuffled {
            assert_eq!(q.alternatives.len(), 4);
        }
    }

    #[test]
    fn test_inputs_not_mutated() {
        let questions = sample_questions(5);
        let snapshot = questions.clone();
        let mut rng = StdRng::seed_from_u64(42);
        let _ = shuffle_all(&mut rng, &questions);
        assert_eq!(questions, snapshot);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let questions = sample_questions(10);
        let a = shuffle_questions(&mut StdRng::seed_from_u64(99), &questions);
        let b = shuffle_questions(&mut StdRng::seed_from_u64(99), &questions);
        assert_eq!(a, b);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("all".parse::<ShuffleMode>().unwrap(), ShuffleMode::All);
        assert_eq!(
            "Questions".parse::<ShuffleMode>().unwrap(),
            ShuffleMode::Questions
        );
        assert!("invalid".parse::<ShuffleMode>().is_err());
    }

    #[test]
    fn test_mode_none_is_identity() {
        let questions = sample_questions(4);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(ShuffleMode::None.apply(&mut rng, &questions), questions);
    }
}
