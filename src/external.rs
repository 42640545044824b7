//! Narrow interfaces for external collaborators.
//!
//! QR bitmap generation, the AI text-rewrite service, answer-key
//! production, and printing are consumed through these traits; the core
//! never talks to a network or an OS shell itself.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::Question;
use crate::shuffle::ShuffleMode;

/// The structured payload encoded into the per-page QR artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrPayload {
    /// Exam title
    pub title: String,
    /// Shuffle mode used for this variant
    pub shuffle_mode: ShuffleMode,
    /// Whether the rewrite service was applied
    pub rewrite_used: bool,
}

/// An opaque QR encoder: payload in, image file out.
pub trait QrEncoder {
    /// Encode the payload into an image file under `dir`.
    fn encode(&self, payload: &QrPayload, dir: &Path) -> Result<PathBuf>;
}

/// A QR "encoder" that hands back an already-rendered image, for callers
/// that generate the bitmap elsewhere.
#[derive(Debug, Clone)]
pub struct PreRenderedQr {
    image: PathBuf,
}

impl PreRenderedQr {
    /// Wrap an existing image file.
    pub fn new(image: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
        }
    }
}

impl QrEncoder for PreRenderedQr {
    fn encode(&self, _payload: &QrPayload, _dir: &Path) -> Result<PathBuf> {
        if !self.image.exists() {
            return Err(Error::ExternalService(format!(
                "QR image not found: {}",
                self.image.display()
            )));
        }
        Ok(self.image.clone())
    }
}

/// The opaque text-rewrite service (network-bound; retries and timeouts
/// are the implementor's concern).
pub trait RewriteService {
    /// Rewrite a statement, preserving its meaning.
    fn rewrite(&self, text: &str) -> Result<String>;
}

/// What to do when a rewrite call fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RewritePolicy {
    /// Propagate the failure to the caller (default).
    #[default]
    Surface,
    /// Log the failure and keep the original statement.
    KeepOriginal,
}

/// Run every question's statement through the rewrite service, one
/// blocking call per question. Alternatives are left untouched.
pub fn rewrite_questions(
    questions: &[Question],
    service: &dyn RewriteService,
    policy: RewritePolicy,
) -> Result<Vec<Question>> {
    let mut rewritten = Vec::with_capacity(questions.len());

    for question in questions {
        let statement = match service.rewrite(&question.statement) {
            Ok(text) => text,
            Err(e) => match policy {
                RewritePolicy::Surface => {
                    return Err(Error::ExternalService(format!(
                        "rewrite failed for {:?}: {e}",
                        question.statement.chars().take(32).collect::<String>()
                    )))
                }
                RewritePolicy::KeepOriginal => {
                    log::warn!("rewrite failed, keeping original statement: {e}");
                    question.statement.clone()
                }
            },
        };
        rewritten.push(Question {
            statement,
            alternatives: question.alternatives.clone(),
        });
    }

    Ok(rewritten)
}

/// Produces the answer-key artifact for a generated exam.
pub trait AnswerKeyWriter {
    /// Write the key for the ordered question list, returning its path.
    fn write(&self, questions: &[Question], dir: &Path) -> Result<PathBuf>;
}

/// A plain-text answer key: one entry per question with its alternatives
/// in final order, for manual marking.
#[derive(Debug, Clone, Default)]
pub struct TextAnswerKey;

impl AnswerKeyWriter for TextAnswerKey {
    fn write(&self, questions: &[Question], dir: &Path) -> Result<PathBuf> {
        let path = dir.join("gabarito.txt");
        let mut out = String::from("GABARITO\n\n");

        for (i, question) in questions.iter().enumerate() {
            let first_line = question.statement.lines().next().unwrap_or_default();
            out.push_str(&format!("{}. {}\n", i + 1, first_line));
            for alternative in &question.alternatives {
                out.push_str(&format!("   {alternative}\n"));
            }
            out.push('\n');
        }

        std::fs::write(&path, out)?;
        Ok(path)
    }
}

/// OS-level print dispatch, out of core scope.
pub trait PrintDispatcher {
    /// Send a file to the printer.
    fn print(&self, file: &Path) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UpcaseRewrite;
    impl RewriteService for UpcaseRewrite {
        fn rewrite(&self, text: &str) -> Result<String> {
            Ok(text.to_uppercase())
        }
    }

    struct FailingRewrite;
    impl RewriteService for FailingRewrite {
        fn rewrite(&self, _text: &str) -> Result<String> {
            Err(Error::ExternalService("service unavailable".into()))
        }
    }

    fn questions() -> Vec<Question> {
        vec![Question::new("1. pergunta?", ["(A) a", "(B) b"])]
    }

    #[test]
    fn test_rewrite_maps_statements() {
        let out = rewrite_questions(&questions(), &UpcaseRewrite, RewritePolicy::Surface).unwrap();
        assert_eq!(out[0].statement, "1. PERGUNTA?");
        assert_eq!(out[0].alternatives, vec!["(A) a", "(B) b"]);
    }

    #[test]
    fn test_rewrite_failure_surfaces_by_default() {
        let err = rewrite_questions(&questions(), &FailingRewrite, RewritePolicy::default())
            .unwrap_err();
        assert!(matches!(err, Error::ExternalService(_)));
    }

    #[test]
    fn test_rewrite_failure_keeps_original_when_configured() {
        let out =
            rewrite_questions(&questions(), &FailingRewrite, RewritePolicy::KeepOriginal).unwrap();
        assert_eq!(out[0].statement, "1. pergunta?");
    }

    #[test]
    fn test_text_answer_key_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = TextAnswerKey.write(&questions(), dir.path()).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("GABARITO"));
        assert!(contents.contains("1. 1. pergunta?"));
        assert!(contents.contains("(A) a"));
    }

    #[test]
    fn test_pre_rendered_qr_requires_existing_file() {
        let payload = QrPayload {
            title: "Prova".into(),
            shuffle_mode: ShuffleMode::All,
            rewrite_used: false,
        };
        let missing = PreRenderedQr::new("/nonexistent/qr.png");
        assert!(missing.encode(&payload, Path::new("/tmp")).is_err());
    }
}
