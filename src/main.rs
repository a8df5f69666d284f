use clap::{Parser, Subcommand};
use intake::cli;
use intake::error::IntakeResult;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "Questionnaire intake: find headers, extract questions, write answers back.")]
#[command(long_about = "Intake - Excel questionnaire loading and answer persistence

Detects header layouts in questionnaire workbooks (row-based and
column-based), creates the answer/confidence/provenance columns when they
are missing, and writes answers back without corrupting merged cells.
The original file is never touched; all writes go to a clean working copy.

COMMANDS:
  inspect    - Show detected formats, header rows and resolved layouts
  questions  - Extract questions as JSON
  apply      - Write answers from an updates JSON file
  fill       - Draft answers from an answer bank, then write them back

EXAMPLES:
  intake inspect vendor_questionnaire.xlsx --verbose
  intake questions vendor_questionnaire.xlsx -o questions.json
  intake apply vendor_questionnaire.xlsx --updates answers.json --strict
  intake fill vendor_questionnaire.xlsx --answers bank.json --review review.md")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Inspect a workbook without extracting anything.

Opens the workbook, detects each sheet's format and header position, and
resolves (creating if necessary) the answer, confidence and provenance
columns. Prints one line per sheet plus the load summary.

Sheets where no header strategy matches and the fallback position holds
no questions are reported as skipped.

EXAMPLES:
  intake inspect q.xlsx
  intake inspect q.xlsx --sheets Security,Inventory --verbose
  intake inspect q.xlsx --json")]
    /// Show detected formats, header rows and resolved layouts
    Inspect {
        /// Path to the questionnaire workbook (.xlsx)
        file: PathBuf,

        /// Comma-separated sheet names to load (default: all sheets)
        #[arg(short, long, value_delimiter = ',')]
        sheets: Vec<String>,

        /// Scan thresholds YAML file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory for the clean working copy (default: system temp)
        #[arg(long)]
        work_dir: Option<PathBuf>,

        /// Also print resolved column/row positions per sheet
        #[arg(short, long)]
        verbose: bool,

        /// Print outcomes and layouts as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    #[command(long_about = "Extract questions as JSON.

Loads the selected sheets and prints every extracted question in the
exchange format (SheetName, RowIndex, ColumnIndex, Question, Guidance).
Row-based questions carry ColumnIndex 0; column-based questions address
the shared answer row.

EXAMPLES:
  intake questions q.xlsx
  intake questions q.xlsx --sheets Security -o questions.json")]
    /// Extract questions as JSON
    Questions {
        /// Path to the questionnaire workbook (.xlsx)
        file: PathBuf,

        /// Comma-separated sheet names to load (default: all sheets)
        #[arg(short, long, value_delimiter = ',')]
        sheets: Vec<String>,

        /// Scan thresholds YAML file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory for the clean working copy (default: system temp)
        #[arg(long)]
        work_dir: Option<PathBuf>,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    #[command(long_about = "Write answers from an updates JSON file.

The updates file is an array of objects with SheetName, RowIndex,
ColumnIndex (optional), Question (optional), Answer, Confidence and
Provenance. Column-based updates without a ColumnIndex are matched by
exact question text.

Bad updates are skipped and reported, never fatal; --strict turns any
skip into a non-zero exit.

EXAMPLES:
  intake apply q.xlsx --updates answers.json
  intake apply q.xlsx --updates answers.json --strict")]
    /// Write answers from an updates JSON file
    Apply {
        /// Path to the questionnaire workbook (.xlsx)
        file: PathBuf,

        /// JSON file with the answers to write
        #[arg(short, long)]
        updates: PathBuf,

        /// Comma-separated sheet names to load (default: all sheets)
        #[arg(short, long, value_delimiter = ',')]
        sheets: Vec<String>,

        /// Scan thresholds YAML file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory for the clean working copy (default: system temp)
        #[arg(long)]
        work_dir: Option<PathBuf>,

        /// Fail if any update was skipped
        #[arg(long)]
        strict: bool,
    },

    #[command(long_about = "Draft answers from an answer bank, then write them back.

Runs every extracted question through a bounded worker pool against the
answer bank (a JSON object mapping question text to answer text).
Questions with no bank entry produce blank proposals so a reviewer can
fill them in later; source failures and timeouts never abort the batch.

EXAMPLES:
  intake fill q.xlsx --answers bank.json
  intake fill q.xlsx --answers bank.json --review review.md --dry-run
  intake fill q.xlsx --answers bank.json --concurrency 2 --chunk-size 10")]
    /// Draft answers from an answer bank, then write them back
    Fill {
        /// Path to the questionnaire workbook (.xlsx)
        file: PathBuf,

        /// JSON object mapping question text to answer text
        #[arg(short, long)]
        answers: PathBuf,

        /// Comma-separated sheet names to load (default: all sheets)
        #[arg(short, long, value_delimiter = ',')]
        sheets: Vec<String>,

        /// Scan thresholds YAML file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory for the clean working copy (default: system temp)
        #[arg(long)]
        work_dir: Option<PathBuf>,

        /// Write a markdown review table here
        #[arg(short, long)]
        review: Option<PathBuf>,

        /// Drafting units in flight at once
        #[arg(long, default_value = "3")]
        concurrency: usize,

        /// Questions per chunk
        #[arg(long, default_value = "5")]
        chunk_size: usize,

        /// Pause between chunks in milliseconds
        #[arg(long, default_value = "2000")]
        pause_ms: u64,

        /// Hard ceiling per question in seconds, retries included
        #[arg(long, default_value = "60")]
        timeout_secs: u64,

        /// Draft and report without modifying the workbook
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
}

fn main() -> IntakeResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "intake=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect {
            file,
            sheets,
            config,
            work_dir,
            verbose,
            json,
        } => cli::inspect(file, sheets, config, work_dir, verbose, json),

        Commands::Questions {
            file,
            sheets,
            config,
            work_dir,
            output,
        } => cli::questions(file, sheets, config, work_dir, output),

        Commands::Apply {
            file,
            updates,
            sheets,
            config,
            work_dir,
            strict,
        } => cli::apply(file, updates, sheets, config, work_dir, strict),

        Commands::Fill {
            file,
            answers,
            sheets,
            config,
            work_dir,
            review,
            concurrency,
            chunk_size,
            pause_ms,
            timeout_secs,
            dry_run,
        } => cli::fill(
            file,
            answers,
            sheets,
            config,
            work_dir,
            review,
            concurrency,
            chunk_size,
            pause_ms,
            timeout_secs,
            dry_run,
        ),
    }
}
