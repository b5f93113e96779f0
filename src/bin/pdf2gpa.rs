//! CLI binary for pdf2gpa.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `GpaConfig` and prints the transcript.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2gpa::{
    compute, compute_to_file, inspect, ExtractionFailure, GpaConfig, GpaOutput,
    GpaProgressCallback, GradingScheme, MarksPolicy, Pdf2GpaError, ProgressCallback,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit status when the documents were read but no transcript could be built.
const EXIT_EXTRACTION_FAILURE: i32 = 2;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over the batch's documents plus a log
/// line per document.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Reading");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl GpaProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Grading {total_documents} documents…"))
        ));
    }

    fn on_document_start(&self, _index: usize, _total: usize, source: &str) {
        self.bar.set_message(source.to_string());
    }

    fn on_document_complete(&self, index: usize, total: usize, pages: usize, attempts: usize) {
        self.bar.println(format!(
            "  {} Document {:>2}/{:<2}  {}  {}",
            green("✓"),
            index,
            total,
            dim(&format!("{pages:>3} pages")),
            dim(&format!("{attempts:>3} results")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Document {:>2}/{:<2}  {}",
            red("✗"),
            index,
            total,
            red(&msg)
        ));
        self.bar.finish_and_clear();
    }

    fn on_batch_complete(&self, total_documents: usize, subjects: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} subjects graded from {} documents",
            green("✔"),
            bold(&subjects.to_string()),
            total_documents
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Grade every semester's result sheet
  pdf2gpa sem1.pdf sem2.pdf sem3.pdf

  # Re-sat subjects: later sheets simply join the batch
  pdf2gpa sem3.pdf sem3-supplementary.pdf

  # Pre-extracted text (pdftotext output, pages separated by form feeds)
  pdf2gpa transcript.txt

  # Custom credit table and grade ladder
  pdf2gpa --scheme my-university.json sem*.pdf

  # Sheets printing internal and external marks without a total
  pdf2gpa --marks-policy columnar sem5.pdf

  # Machine-readable output
  pdf2gpa --json sem*.pdf > transcript.json

  # Check what a document contains without grading it
  pdf2gpa --inspect-only sem3.pdf

EXIT STATUS:
  0  transcript computed
  1  an input could not be read or the configuration is invalid
  2  identity conflict, or no subject results were found

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to libpdfium (file or directory); default: system library
  RUST_LOG          Tracing filter, overrides -v / -q
"#;

/// Compute SGPA and CGPA from university result PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2gpa",
    version,
    about = "Compute SGPA and CGPA from university result PDFs",
    long_about = "Read one or more result documents belonging to one student, keep the best \
attempt per subject, weight grade points by credits, and print per-semester SGPA and overall \
CGPA. Inputs may be local PDFs, .txt text dumps, or HTTP/HTTPS URLs.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF / .txt paths or HTTP/HTTPS URLs, in batch order.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Write JSON output to this file.
    #[arg(short, long, env = "PDF2GPA_OUTPUT")]
    output: Option<PathBuf>,

    /// Grading scheme JSON file (credit table, rules, grade ladder).
    #[arg(long, env = "PDF2GPA_SCHEME", conflicts_with = "scheme_name")]
    scheme: Option<PathBuf>,

    /// Built-in grading scheme.
    #[arg(long, env = "PDF2GPA_SCHEME_NAME", default_value = "vtu-2022")]
    scheme_name: String,

    /// How the total is chosen when a line prints several numbers.
    #[arg(long, env = "PDF2GPA_MARKS_POLICY", value_enum, default_value = "maximum")]
    marks_policy: MarksPolicyArg,

    /// Reject documents with more pages than this.
    #[arg(long, env = "PDF2GPA_MAX_PAGES", default_value_t = 500)]
    max_pages: usize,

    /// Documents whose text is extracted concurrently.
    #[arg(short, long, env = "PDF2GPA_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2GPA_PASSWORD")]
    password: Option<String>,

    /// Output structured JSON instead of the table.
    #[arg(long, env = "PDF2GPA_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2GPA_NO_PROGRESS")]
    no_progress: bool,

    /// Print page count and identifier of each input, no grading.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2GPA_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2GPA_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2GPA_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum MarksPolicyArg {
    Maximum,
    Columnar,
}

impl From<MarksPolicyArg> for MarksPolicy {
    fn from(v: MarksPolicyArg) -> Self {
        match v {
            MarksPolicyArg::Maximum => MarksPolicy::Maximum,
            MarksPolicyArg::Columnar => MarksPolicy::Columnar,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn GpaProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        for input in &cli.inputs {
            let report = inspect(input, &config)
                .await
                .with_context(|| format!("Failed to inspect {input}"))?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("Failed to serialise report")?
                );
            } else {
                println!("File:         {}", report.source);
                println!("Kind:         {:?}", report.kind);
                println!("Pages:        {}", report.pages);
                println!("Results:      {}", report.attempts);
                match report.identifier {
                    Some(ref id) => println!("Identifier:   {id}"),
                    None => println!("Identifier:   (none found)"),
                }
                for e in &report.page_errors {
                    println!("Warning:      {e}");
                }
                println!();
            }
        }
        return Ok(());
    }

    // ── Run the batch ────────────────────────────────────────────────────
    let result = match cli.output {
        Some(ref path) => compute_to_file(&cli.inputs, path, &config).await,
        None => compute(&cli.inputs, &config).await,
    };

    let output = match result {
        Ok(output) => output,
        Err(Pdf2GpaError::Extraction(failure)) => {
            report_failure(&failure, cli.json)?;
            std::process::exit(EXIT_EXTRACTION_FAILURE);
        }
        Err(e) => return Err(e).context("Grading failed"),
    };

    if let Some(ref path) = cli.output {
        if !cli.quiet {
            eprintln!(
                "{}  CGPA {:.2}  {}ms  →  {}",
                green("✔"),
                output.transcript.cgpa,
                output.stats.total_duration_ms,
                bold(&path.display().to_string()),
            );
        }
    } else if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        print_transcript(&output);
        if !cli.quiet && !show_progress {
            eprintln!(
                "Graded {} subjects from {} pages in {}ms",
                output.stats.subjects, output.stats.pages, output.stats.total_duration_ms
            );
        }
    }

    Ok(())
}

/// Map CLI args to `GpaConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GpaConfig> {
    let scheme = match cli.scheme {
        Some(ref path) => GradingScheme::from_json_file(path)
            .with_context(|| format!("Failed to load scheme from {}", path.display()))?,
        None => GradingScheme::builtin(&cli.scheme_name).with_context(|| {
            format!(
                "Unknown scheme '{}' (built-in: {})",
                cli.scheme_name,
                GradingScheme::builtin_names().join(", ")
            )
        })?,
    };

    let mut builder = GpaConfig::builder()
        .scheme(scheme)
        .marks_policy(cli.marks_policy.clone().into())
        .max_pages_per_document(cli.max_pages)
        .concurrency(cli.concurrency)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Print an extraction failure: JSON on stdout in `--json` mode, a message
/// on stderr otherwise.
fn report_failure(failure: &ExtractionFailure, json: bool) -> Result<()> {
    if json {
        let body = serde_json::json!({ "error": failure });
        println!(
            "{}",
            serde_json::to_string_pretty(&body).context("Failed to serialise failure")?
        );
    } else {
        eprintln!("{} {}", red("✘"), failure);
    }
    Ok(())
}

/// Per-semester table; fallback-credited subjects are starred.
fn print_transcript(output: &GpaOutput) {
    let t = &output.transcript;

    if let Some(ref id) = output.identifier {
        println!("{}  {}", bold("Student"), id);
    }
    println!("{}  {}", bold("Scheme "), output.scheme);

    for sem in &t.semesters {
        println!();
        println!(
            "{}",
            bold(&format!(
                "Semester {}   SGPA {:.2}   ({} credits)",
                sem.semester, sem.sgpa, sem.total_credits
            ))
        );
        println!(
            "  {:<10} {:>7}  {:<4} {:>5}  {:>7}  {:>6}",
            "Code", "Marks", "P/F", "Grade", "Credits", "Points"
        );
        for s in &sem.subjects {
            let credits = if s.credit_source.is_fallback() {
                format!("{}*", s.credits)
            } else {
                format!("{} ", s.credits)
            };
            let verdict = format!("{:<4}", s.pass_fail.to_string());
            let verdict = if s.pass_fail.is_pass() {
                green(&verdict)
            } else {
                red(&verdict)
            };
            println!(
                "  {:<10} {:>7}  {} {:>5}  {:>7}  {:>6}",
                s.code.as_str(),
                s.marks.to_string(),
                verdict,
                s.letter_grade,
                credits,
                s.earned_points()
            );
        }
    }

    println!();
    println!(
        "{}",
        bold(&format!(
            "CGPA {:.2}   ({} credits, {} grade points)",
            t.cgpa, t.total_credits, t.earned_grade_points
        ))
    );

    let fallback = t.fallback_codes();
    if !fallback.is_empty() {
        println!(
            "{}",
            dim(&format!(
                "* credits inferred by rule for {} subjects not in the scheme's table",
                fallback.len()
            ))
        );
    }
}
