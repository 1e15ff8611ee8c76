//! CLI binary for creditsheet.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalysisConfig` and writes the resulting workbook.

use anyhow::{Context, Result};
use clap::Parser;
use creditsheet::{analyze, AnalysisConfig};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic analysis; workbook written as {date}_{company}.xlsx in the cwd
  creditsheet statements_fy24.pdf --company "Acme Corp"

  # Explicit output path
  creditsheet statements_fy24.pdf --company "Acme Corp" -o acme.xlsx

  # Analyse a statement hosted at a URL
  creditsheet https://example.com/ir/fy24.pdf --company "Acme Corp"

  # Print extracted figures and ratios as JSON instead of writing a workbook
  creditsheet statements_fy24.pdf --company "Acme Corp" --json

  # Use a specific model
  creditsheet --model gemini-2.5-pro statements_fy24.pdf --company "Acme Corp"

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY            Gemini API key (required)
  CREDITSHEET_MODEL         Override model ID
  CREDITSHEET_OUTPUT        Default output path

SETUP:
  1. Set API key:   export GEMINI_API_KEY=...
  2. Analyse:       creditsheet statements.pdf --company "Acme Corp"
"#;

/// Analyse financial-statement PDFs into credit-underwriting ratio workbooks.
#[derive(Parser, Debug)]
#[command(
    name = "creditsheet",
    version,
    about = "Turn financial-statement PDFs into credit-underwriting ratio workbooks",
    long_about = "Extract structured figures from a financial-statement PDF (local file or URL) \
via the Gemini API, compute the standard underwriting ratio set, and write a five-sheet \
xlsx report (Summary, Income Statement, Balance Sheet, Cash Flow, Notes).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Company name for the report (≤ 100 characters).
    #[arg(short = 'c', long, env = "CREDITSHEET_COMPANY")]
    company: String,

    /// Write the workbook to this path instead of {date}_{company}.xlsx.
    #[arg(short, long, env = "CREDITSHEET_OUTPUT")]
    output: Option<PathBuf>,

    /// Gemini model ID.
    #[arg(long, env = "CREDITSHEET_MODEL", default_value = creditsheet::DEFAULT_MODEL)]
    model: String,

    /// Print the extracted record and ratios as JSON instead of writing a workbook.
    #[arg(long, env = "CREDITSHEET_JSON")]
    json: bool,

    /// Retries on a transient extraction-API failure.
    #[arg(long, env = "CREDITSHEET_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Max tokens the model may generate.
    #[arg(long, env = "CREDITSHEET_MAX_OUTPUT_TOKENS", default_value_t = 8192)]
    max_output_tokens: usize,

    /// HTTP download timeout in seconds (URL inputs).
    #[arg(long, env = "CREDITSHEET_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Extraction API call timeout in seconds.
    #[arg(long, env = "CREDITSHEET_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CREDITSHEET_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CREDITSHEET_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let config = AnalysisConfig::builder()
        .model(&cli.model)
        .max_retries(cli.max_retries)
        .max_output_tokens(cli.max_output_tokens)
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout)
        .build()
        .context("Invalid configuration")?;

    // ── Run analysis ─────────────────────────────────────────────────────
    let output = analyze(&cli.input, &cli.company, &config)
        .await
        .context("Analysis failed")?;

    if cli.json {
        // Record + ratios on stdout; no workbook file.
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(json.as_bytes())
            .and_then(|()| handle.write_all(b"\n"))
            .context("Failed to write to stdout")?;
        return Ok(());
    }

    let path = cli
        .output
        .unwrap_or_else(|| PathBuf::from(&output.filename));
    tokio::fs::write(&path, &output.workbook)
        .await
        .with_context(|| format!("Failed to write workbook to {}", path.display()))?;

    if !cli.quiet {
        eprintln!(
            "{} {}  →  {}",
            green("✔"),
            bold(&output.company_name),
            bold(&path.display().to_string()),
        );
        eprintln!(
            "   {} income / {} balance / {} cash-flow items, {} notes  {}",
            output.record.income_statement.len(),
            output.record.balance_sheet.len(),
            output.record.cash_flow.len(),
            output.record.notes.len(),
            dim(&format!("{}ms", output.stats.total_duration_ms)),
        );
        eprintln!(
            "   {} tokens in  /  {} tokens out",
            dim(&output.stats.input_tokens.to_string()),
            dim(&output.stats.output_tokens.to_string()),
        );
    }

    Ok(())
}
