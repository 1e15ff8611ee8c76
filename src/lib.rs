//! # creditsheet
//!
//! Turn financial-statement PDFs into credit-underwriting ratio workbooks.
//!
//! ## Why this crate?
//!
//! Credit analysts spend hours re-keying figures from statement PDFs into
//! spreadsheet templates before they can look at a single ratio. This crate
//! sends the PDF to a Gemini model, parses the structured figures out of the
//! response, computes the standard underwriting ratio set, and hands back a
//! ready-to-file five-sheet `.xlsx` workbook.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    resolve local file or download from URL, validate %PDF + size
//!  ├─ 2. Extract  one generateContent call with the PDF inline (retry/backoff)
//!  ├─ 3. Ratios   pure computation of the 14 underwriting ratios
//!  └─ 4. Report   five-sheet xlsx (Summary / statements / Notes)
//! ```
//!
//! The ratio engine is the semantic core and deliberately infallible: any
//! line item the extraction missed reads as zero, and every division is
//! guarded against zero denominators and non-finite operands, so a report
//! always renders fully even from partial extraction data.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use creditsheet::{analyze, AnalysisConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key read from GEMINI_API_KEY
//!     let config = AnalysisConfig::default();
//!     let output = analyze("statements_fy24.pdf", "Acme Corp", &config).await?;
//!     std::fs::write(&output.filename, &output.workbook)?;
//!     println!("current ratio: {}", output.ratios.liquidity.current_ratio);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `creditsheet` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! creditsheet = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod ratios;
pub mod record;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze, analyze_from_bytes, analyze_sync, analyze_to_file};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, DEFAULT_MODEL};
pub use error::CreditsheetError;
pub use output::{AnalysisOutput, AnalysisStats};
pub use pipeline::extract::{Extraction, Extractor, GeminiExtractor};
pub use pipeline::report::report_filename;
pub use ratios::{compute, safe_divide, RatioReport, ASSUMED_DEBT_INTEREST_RATE};
pub use record::{FinancialRecord, LineItems};
