//! examforge CLI - exam inspection and shuffled-variant generation.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

use examforge::{
    load_exam, ExamSession, ExtractOptions, HeaderContent, HeaderOverrides, PreRenderedQr,
    RenderConfig, ShuffleMode,
};

#[derive(Parser)]
#[command(name = "examforge")]
#[command(version)]
#[command(about = "Inspect exam documents and generate shuffled variants", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show an extraction summary for a document
    Info {
        /// Input PDF or DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// List the segmented questions
    Questions {
        /// Input PDF or DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Emit JSON instead of readable text
        #[arg(long)]
        json: bool,
    },

    /// Generate a shuffled exam variant (and its answer key)
    Generate {
        /// Input PDF or DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output PDF path
        #[arg(short, long, value_name = "FILE", default_value = "prova_gerada.pdf")]
        output: PathBuf,

        /// What to shuffle
        #[arg(long, default_value = "all")]
        shuffle: ShuffleMode,

        /// RNG seed for reproducible variants
        #[arg(long)]
        seed: Option<u64>,

        /// Document title
        #[arg(long)]
        title: Option<String>,

        /// School name for the header
        #[arg(long)]
        school: Option<String>,

        /// Teacher name for the header
        #[arg(long)]
        teacher: Option<String>,

        /// Subject line for the header
        #[arg(long)]
        subject: Option<String>,

        /// Block/class label for the header
        #[arg(long)]
        block: Option<String>,

        /// Evaluation type line for the header
        #[arg(long)]
        evaluation: Option<String>,

        /// Pre-rendered QR image to stamp on page footers
        #[arg(long, value_name = "IMAGE")]
        qr_image: Option<PathBuf>,

        /// Skip the answer key
        #[arg(long)]
        no_answer_key: bool,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Info { input } => cmd_info(input),
        Commands::Questions { input, json } => cmd_questions(input, json),
        Commands::Generate {
            input,
            output,
            shuffle,
            seed,
            title,
            school,
            teacher,
            subject,
            block,
            evaluation,
            qr_image,
            no_answer_key,
        } => cmd_generate(GenerateArgs {
            input,
            output,
            shuffle,
            seed,
            title,
            school,
            teacher,
            subject,
            block,
            evaluation,
            qr_image,
            no_answer_key,
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn cmd_info(input: PathBuf) -> examforge::Result<()> {
    let (doc, segmentation) = load_exam(&input)?;

    println!("{} {}", "file:".bold(), input.display());
    println!(
        "{} {:.0} x {:.0} pt",
        "page size:".bold(),
        doc.page_size.0,
        doc.page_size.1
    );
    println!("{} {}", "blocks:".bold(), doc.blocks.len());
    println!("{} {}", "tables:".bold(), doc.tables.len());
    println!(
        "{} {} ({} in header)",
        "images:".bold(),
        doc.all_images.len(),
        doc.header_images.len()
    );
    let header_kind = match &doc.header {
        HeaderContent::None => "none",
        HeaderContent::PositionedRuns(_) => "positioned runs",
        HeaderContent::PdfBlocks(_) => "pdf blocks",
        HeaderContent::DocxParagraphs(_) => "docx paragraphs",
    };
    println!("{} {header_kind}", "header content:".bold());
    if let Some(snapshot) = &doc.header_snapshot {
        println!("{} {}", "header snapshot:".bold(), snapshot.display());
    }
    println!("{} {}", "questions:".bold(), segmentation.questions.len());
    println!(
        "{} numbering={} question-word={}",
        "signals:".bold(),
        segmentation.signals.own_numbering,
        segmentation.signals.uses_question_word
    );

    Ok(())
}

fn cmd_questions(input: PathBuf, json: bool) -> examforge::Result<()> {
    let (_, segmentation) = load_exam(&input)?;

    if json {
        let rendered = serde_json::to_string_pretty(&segmentation.questions)
            .map_err(|e| examforge::Error::Other(e.to_string()))?;
        println!("{rendered}");
        return Ok(());
    }

    if segmentation.questions.is_empty() {
        println!("{}", "no questions recognized".yellow());
        return Ok(());
    }

    for (i, question) in segmentation.questions.iter().enumerate() {
        println!(
            "{} {}",
            format!("[{}]", i + 1).green().bold(),
            question.statement.lines().next().unwrap_or_default()
        );
        for alternative in &question.alternatives {
            println!("    {alternative}");
        }
    }

    Ok(())
}

struct GenerateArgs {
    input: PathBuf,
    output: PathBuf,
    shuffle: ShuffleMode,
    seed: Option<u64>,
    title: Option<String>,
    school: Option<String>,
    teacher: Option<String>,
    subject: Option<String>,
    block: Option<String>,
    evaluation: Option<String>,
    qr_image: Option<PathBuf>,
    no_answer_key: bool,
}

fn cmd_generate(args: GenerateArgs) -> examforge::Result<()> {
    let mut config = RenderConfig::new();
    if let Some(title) = args.title {
        config = config.with_title(title);
    }

    let overrides = HeaderOverrides {
        school_name: args.school,
        teacher: args.teacher,
        subject: args.subject,
        block_label: args.block,
        evaluation_type: args.evaluation,
        footer_text: None,
        extra_image: None,
    };

    let mut session = ExamSession::new()
        .with_shuffle(args.shuffle)
        .with_extract_options(ExtractOptions::new())
        .with_render_config(config)
        .with_overrides(overrides);

    if let Some(seed) = args.seed {
        session = session.with_seed(seed);
    }
    if let Some(qr) = args.qr_image {
        session = session.with_qr_encoder(Box::new(PreRenderedQr::new(qr)));
    }
    if args.no_answer_key {
        session = session.with_answer_key(None);
    }

    let generated = session.generate(&args.input, &args.output)?;

    println!(
        "{} {}",
        "exam generated:".green().bold(),
        generated.exam_path.display()
    );
    if let Some(key) = generated.answer_key_path {
        println!("{} {}", "answer key:".green().bold(), key.display());
    }

    Ok(())
}
