//! # examforge
//!
//! Structural inference over exam documents, and shuffled-variant
//! generation.
//!
//! The library ingests an exam (PDF or DOCX), reconstructs its logical
//! model — questions, answer alternatives, embedded tables — from loosely
//! structured text blocks, then re-renders a shuffled variant as a new
//! document while preserving the original header's imagery and text
//! styling.
//!
//! ## Quick Start
//!
//! ```no_run
//! use examforge::{extract, segment_document, ShuffleMode};
//! use rand::SeedableRng;
//!
//! fn main() -> examforge::Result<()> {
//!     let doc = extract("prova.pdf")?;
//!     let segmentation = segment_document(&doc);
//!
//!     let mut rng = rand::rngs::StdRng::seed_from_u64(2024);
//!     let shuffled = ShuffleMode::All.apply(&mut rng, &segmentation.questions);
//!     println!("{} questões", shuffled.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! Extraction → table detection → segmentation → shuffling → rendering,
//! strictly in that order, single-threaded per document. Block order is
//! preserved end to end; only the shuffle step reorders anything, and only
//! at question granularity.

pub mod detect;
pub mod error;
pub mod external;
pub mod extract;
pub mod geometry;
pub mod model;
pub mod render;
pub mod segment;
pub mod shuffle;
pub mod tables;
pub mod workdir;

// Re-export commonly used types
pub use detect::{detect_format, DocFormat};
pub use error::{Error, Result};
pub use extract::{extract, extract_with_options, ExtractOptions};
pub use external::{
    AnswerKeyWriter, PreRenderedQr, PrintDispatcher, QrEncoder, QrPayload, RewritePolicy,
    RewriteService, TextAnswerKey,
};
pub use model::{
    HeaderContent, HeaderOverrides, ImagePlacement, Question, SegmentSignals, SourceDocument,
    StyleFlags, TableStructure, TextBlock, TextLine, TextSpan,
};
pub use render::{ExamRenderer, RenderConfig};
pub use segment::{segment, segment_document, Segmentation};
pub use shuffle::{shuffle_all, shuffle_alternatives, shuffle_questions, ShuffleMode};

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Extract a document and segment it into questions in one call.
pub fn load_exam<P: AsRef<Path>>(path: P) -> Result<(SourceDocument, Segmentation)> {
    let doc = extract(path)?;
    let segmentation = segment_document(&doc);
    Ok((doc, segmentation))
}

/// The artifacts produced by a generation run.
#[derive(Debug, Clone)]
pub struct GeneratedExam {
    /// The rendered exam document
    pub exam_path: PathBuf,
    /// The answer key, when a writer was configured
    pub answer_key_path: Option<PathBuf>,
}

/// Builder running the whole pipeline: extract, segment, shuffle,
/// optionally rewrite, render, and produce the answer key.
///
/// ```no_run
/// use examforge::{ExamSession, ShuffleMode};
///
/// let generated = ExamSession::new()
///     .with_shuffle(ShuffleMode::All)
///     .with_seed(7)
///     .generate("prova.docx", "saida/prova_gerada.pdf")?;
/// println!("prova: {}", generated.exam_path.display());
/// # Ok::<(), examforge::Error>(())
/// ```
pub struct ExamSession {
    extract_options: ExtractOptions,
    render_config: RenderConfig,
    shuffle_mode: ShuffleMode,
    seed: Option<u64>,
    overrides: HeaderOverrides,
    rewrite: Option<Box<dyn RewriteService>>,
    rewrite_policy: RewritePolicy,
    qr_encoder: Option<Box<dyn QrEncoder>>,
    answer_key: Option<Box<dyn AnswerKeyWriter>>,
}

impl ExamSession {
    /// Create a session with defaults: no shuffling, no rewrite, a text
    /// answer key.
    pub fn new() -> Self {
        Self {
            extract_options: ExtractOptions::new(),
            render_config: RenderConfig::new(),
            shuffle_mode: ShuffleMode::None,
            seed: None,
            overrides: HeaderOverrides::default(),
            rewrite: None,
            rewrite_policy: RewritePolicy::Surface,
            qr_encoder: None,
            answer_key: Some(Box::new(TextAnswerKey)),
        }
    }

    /// Set the shuffle mode.
    pub fn with_shuffle(mut self, mode: ShuffleMode) -> Self {
        self.shuffle_mode = mode;
        self
    }

    /// Seed the shuffle RNG for reproducible variants.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set extraction options.
    pub fn with_extract_options(mut self, options: ExtractOptions) -> Self {
        self.extract_options = options;
        self
    }

    /// Set the render configuration.
    pub fn with_render_config(mut self, config: RenderConfig) -> Self {
        self.render_config = config;
        self
    }

    /// Supply user header overrides.
    pub fn with_overrides(mut self, overrides: HeaderOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Enable statement rewriting through an external service.
    pub fn with_rewrite(mut self, service: Box<dyn RewriteService>, policy: RewritePolicy) -> Self {
        self.rewrite = Some(service);
        self.rewrite_policy = policy;
        self
    }

    /// Set the QR encoder producing the footer artifact.
    pub fn with_qr_encoder(mut self, encoder: Box<dyn QrEncoder>) -> Self {
        self.qr_encoder = Some(encoder);
        self
    }

    /// Replace the answer-key writer (`None` skips the key).
    pub fn with_answer_key(mut self, writer: Option<Box<dyn AnswerKeyWriter>>) -> Self {
        self.answer_key = writer;
        self
    }

    /// Run the pipeline end to end.
    pub fn generate<P: AsRef<Path>, Q: AsRef<Path>>(
        mut self,
        input: P,
        output: Q,
    ) -> Result<GeneratedExam> {
        let output = output.as_ref();

        let mut doc = extract_with_options(input.as_ref(), &self.extract_options)?;
        doc.apply_overrides(self.overrides.clone());

        let segmentation = segment_document(&doc);
        log::info!(
            "segmented {} questions (own numbering: {})",
            segmentation.questions.len(),
            segmentation.signals.own_numbering
        );

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut questions = self.shuffle_mode.apply(&mut rng, &segmentation.questions);

        if let Some(service) = self.rewrite.as_deref() {
            questions = external::rewrite_questions(&questions, service, self.rewrite_policy)?;
        }

        if let Some(encoder) = self.qr_encoder.as_deref() {
            let payload = QrPayload {
                title: self.render_config.title.clone(),
                shuffle_mode: self.shuffle_mode,
                rewrite_used: self.rewrite.is_some(),
            };
            let dir = workdir::resolve_dir(self.extract_options.temp_dir.as_deref())?;
            match encoder.encode(&payload, &dir) {
                Ok(qr_path) => {
                    self.render_config.qr_image = Some(qr_path);
                }
                Err(e) => log::error!("QR encoding failed, pages will carry no QR: {e}"),
            }
        }

        let renderer = ExamRenderer::new(self.render_config.clone());
        let exam_path = renderer.render(&questions, &doc, output)?;

        let answer_key_path = match self.answer_key.as_deref() {
            Some(writer) => {
                let dir = output
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                Some(writer.write(&questions, &dir)?)
            }
            None => None,
        };

        Ok(GeneratedExam {
            exam_path,
            answer_key_path,
        })
    }
}

impl Default for ExamSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_builder() {
        let session = ExamSession::new()
            .with_shuffle(ShuffleMode::Questions)
            .with_seed(9);
        assert_eq!(session.shuffle_mode, ShuffleMode::Questions);
        assert_eq!(session.seed, Some(9));
        assert!(session.answer_key.is_some());
    }

    #[test]
    fn test_load_exam_missing_file() {
        let result = load_exam("/no/such/prova.pdf");
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }
}
