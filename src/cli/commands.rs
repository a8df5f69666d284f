use crate::batch::{run_batch, AnswerSource, BatchConfig, Draft, RetryPolicy, SourceError};
use crate::config::ScanConfig;
use crate::error::{IntakeError, IntakeResult};
use crate::grid::column_letter;
use crate::review::ReviewQueue;
use crate::session::{LoadOptions, Session};
use crate::types::{Confidence, HeaderMap, QuestionRecord, SheetOutcome};
use async_trait::async_trait;
use colored::Colorize;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

fn load_options(
    sheets: Vec<String>,
    config: Option<PathBuf>,
    work_dir: Option<PathBuf>,
) -> IntakeResult<LoadOptions> {
    let scan = match config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };
    Ok(LoadOptions {
        sheets,
        work_dir,
        scan,
    })
}

fn print_outcomes(session: &Session) {
    for outcome in &session.report().outcomes {
        match outcome {
            SheetOutcome::Loaded {
                sheet,
                format,
                header_row,
                strategy,
                questions,
            } => {
                let via = strategy
                    .map(|s| format!(", {}", s.as_str()))
                    .unwrap_or_default();
                println!(
                    "   ✅ {}: {}, header row {}{}, {} question(s)",
                    sheet.bright_blue().bold(),
                    format,
                    header_row,
                    via,
                    questions
                );
            }
            SheetOutcome::Skipped { sheet, reason } => {
                println!(
                    "   ⏭️  {}: {}",
                    sheet.bright_blue().bold(),
                    format!("skipped ({reason})").yellow()
                );
            }
        }
    }
}

/// Execute the inspect command
pub fn inspect(
    file: PathBuf,
    sheets: Vec<String>,
    config: Option<PathBuf>,
    work_dir: Option<PathBuf>,
    verbose: bool,
    json: bool,
) -> IntakeResult<()> {
    if !json {
        println!("{}", "🔍 Intake - Inspect workbook".bold().green());
        println!("   File: {}", file.display());
        println!();
    }

    let options = load_options(sheets, config, work_dir)?;
    let session = Session::open(&file, &options)?;

    if json {
        let report = serde_json::json!({
            "outcomes": &session.report().outcomes,
            "layouts": session.layouts(),
            "clean_copy": session.workbook_path(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_outcomes(&session);
    println!();

    if verbose {
        println!("{}", "📋 Resolved layouts:".bold().cyan());
        for (name, map) in session.layouts() {
            match map {
                HeaderMap::RowBased(layout) => {
                    let guidance = layout
                        .guidance_col
                        .map(|col| format!(", guidance {}", column_letter(col)))
                        .unwrap_or_default();
                    println!(
                        "   {}: questions {}{}, answers {}, confidence {}, provenance {}",
                        name.bright_blue(),
                        column_letter(layout.question_col),
                        guidance,
                        column_letter(layout.answer_col),
                        column_letter(layout.confidence_col),
                        column_letter(layout.provenance_col)
                    );
                }
                HeaderMap::ColumnBased(layout) => {
                    println!(
                        "   {}: answers row {}, confidence row {}, provenance row {}",
                        name.bright_blue(),
                        layout.answer_row,
                        layout.confidence_row,
                        layout.provenance_row
                    );
                }
            }
        }
        println!();
    }

    println!("   Clean copy: {}", session.workbook_path().display());
    println!("{}", format!("✅ {}", session.report().summary()).bold().green());
    Ok(())
}

/// Execute the questions command
pub fn questions(
    file: PathBuf,
    sheets: Vec<String>,
    config: Option<PathBuf>,
    work_dir: Option<PathBuf>,
    output: Option<PathBuf>,
) -> IntakeResult<()> {
    println!("{}", "📖 Intake - Extract questions".bold().green());
    println!("   File: {}", file.display());
    println!();

    let options = load_options(sheets, config, work_dir)?;
    let session = Session::open(&file, &options)?;

    print_outcomes(&session);
    println!();

    let json = serde_json::to_string_pretty(session.questions())?;
    match output {
        Some(path) => {
            fs::write(&path, &json)?;
            println!(
                "{}",
                format!("✅ Wrote {} question(s) to {}", session.questions().len(), path.display())
                    .bold()
                    .green()
            );
        }
        None => {
            println!("{json}");
        }
    }
    Ok(())
}

/// Execute the apply command
pub fn apply(
    file: PathBuf,
    updates: PathBuf,
    sheets: Vec<String>,
    config: Option<PathBuf>,
    work_dir: Option<PathBuf>,
    strict: bool,
) -> IntakeResult<()> {
    println!("{}", "🔥 Intake - Apply answers".bold().green());
    println!("   File: {}", file.display());
    println!("   Updates: {}", updates.display());
    println!();

    let raw = fs::read_to_string(&updates)?;
    let parsed: Vec<crate::types::AnswerUpdate> = serde_json::from_str(&raw)?;

    let options = load_options(sheets, config, work_dir)?;
    let mut session = Session::open(&file, &options)?;
    let report = session.persist(&parsed)?;

    println!("{}", format!("✅ {}", report.summary()).bold().green());
    if !report.fully_applied() {
        println!("{}", format!("⚠️  {} update(s) skipped:", report.skipped.len()).yellow());
        for skip in &report.skipped {
            println!(
                "   - {} row {} col {}: {}",
                skip.sheet_name, skip.row_index, skip.column_index, skip.reason
            );
        }
        if strict {
            return Err(IntakeError::PartialApply(report.skipped.len()));
        }
    }
    println!("   Saved to: {}", session.workbook_path().display());
    Ok(())
}

/// Offline answer source backed by a question-to-answer JSON bank
struct LookupSource {
    label: String,
    answers: HashMap<String, String>,
}

impl LookupSource {
    fn from_file(path: &PathBuf) -> IntakeResult<Self> {
        let raw = fs::read_to_string(path)?;
        let bank: HashMap<String, String> = serde_json::from_str(&raw)?;
        let answers = bank
            .into_iter()
            .map(|(question, answer)| (normalize(&question), answer))
            .collect();
        let label = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("answer-bank")
            .to_string();
        Ok(Self { label, answers })
    }
}

fn normalize(question: &str) -> String {
    question.trim().to_lowercase()
}

#[async_trait]
impl AnswerSource for LookupSource {
    async fn draft(&self, question: &QuestionRecord) -> Result<Draft, SourceError> {
        match self.answers.get(&normalize(&question.question_text)) {
            Some(answer) => Ok(Draft {
                answer: answer.clone(),
                confidence: Confidence::from_score(None, Some(answer)),
                provenance: self.label.clone(),
            }),
            None => Ok(Draft {
                answer: String::new(),
                confidence: Confidence::Unknown,
                provenance: String::new(),
            }),
        }
    }
}

/// Execute the fill command
#[allow(clippy::too_many_arguments)]
pub fn fill(
    file: PathBuf,
    answers: PathBuf,
    sheets: Vec<String>,
    config: Option<PathBuf>,
    work_dir: Option<PathBuf>,
    review: Option<PathBuf>,
    concurrency: usize,
    chunk_size: usize,
    pause_ms: u64,
    timeout_secs: u64,
    dry_run: bool,
) -> IntakeResult<()> {
    println!("{}", "🔥 Intake - Fill answers".bold().green());
    println!("   File: {}", file.display());
    println!("   Answer bank: {}", answers.display());
    println!();

    let options = load_options(sheets, config, work_dir)?;
    let mut session = Session::open(&file, &options)?;
    print_outcomes(&session);
    println!();

    if session.questions().is_empty() {
        println!("{}", "⚠️  No questions to fill".yellow());
        return Ok(());
    }

    let source = Arc::new(LookupSource::from_file(&answers)?);
    let batch_config = BatchConfig {
        concurrency,
        chunk_size,
        chunk_pause_ms: pause_ms,
        unit_timeout_secs: timeout_secs,
        retry: RetryPolicy::default(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let proposals = runtime.block_on(run_batch(
        source,
        session.questions(),
        &batch_config,
    ));

    let mut queue = ReviewQueue::new();
    queue.extend(proposals);
    let unanswered = queue.unanswered().len();
    println!(
        "   Drafted {} proposal(s), {} unanswered",
        queue.len(),
        unanswered
    );

    if let Some(path) = &review {
        fs::write(path, queue.render_markdown())?;
        println!("   Review table: {}", path.display());
    }

    if dry_run {
        println!();
        println!("{}", "📋 Dry run - workbook not modified".yellow());
        return Ok(());
    }

    let report = session.persist(&queue.to_updates())?;
    println!();
    println!("{}", format!("✅ {}", report.summary()).bold().green());
    if !report.fully_applied() {
        println!(
            "{}",
            format!("⚠️  {} update(s) skipped", report.skipped.len()).yellow()
        );
    }
    println!("   Saved to: {}", session.workbook_path().display());
    Ok(())
}
