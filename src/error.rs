//! Error types for the creditsheet library.
//!
//! One fatal error type covers the whole pipeline: if anything in
//! [`CreditsheetError`] fires, the analysis of that document cannot proceed
//! and the caller gets `Err` from the top-level `analyze*` functions.
//!
//! The ratio engine deliberately has no error type of its own — missing line
//! items read as zero and every division is guarded, so ratio computation
//! cannot fail for well-typed input. The variants below therefore split into
//! the three user-facing categories the report flow distinguishes: input
//! validation, extraction failures, and configuration problems.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the creditsheet library.
#[derive(Debug, Error)]
pub enum CreditsheetError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The PDF exceeds the configured size cap.
    #[error("PDF is {size} bytes, exceeding the {limit}-byte limit.\nSplit the document or raise max_pdf_bytes.")]
    PdfTooLarge { size: u64, limit: u64 },

    /// Company name was empty after trimming.
    #[error("Company name is required and must be non-empty.")]
    CompanyNameRequired,

    /// Company name exceeds the 100-character limit.
    #[error("Company name is {len} characters, exceeding the {limit}-character limit.")]
    CompanyNameTooLong { len: usize, limit: usize },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The model API returned a non-retryable error, or retries were exhausted.
    #[error("Extraction failed: {message}\nThe PDF may be corrupted, password-protected, or contain no readable financial statements.")]
    ExtractionFailed { message: String },

    /// The model responded but no parsable JSON record could be located.
    #[error("Could not parse financial data from the model response: {detail}\nThe document may not contain standard financial statements.")]
    MalformedResponse { detail: String },

    /// Model API returned HTTP 429 — caller should back off.
    #[error("Rate limit exceeded for model '{model}'")]
    RateLimitExceeded {
        model: String,
        retry_after_secs: Option<u64>,
    },

    /// Model API call timed out after all retries.
    #[error("Extraction API call timed out after {elapsed_ms}ms")]
    ApiTimeout { elapsed_ms: u64 },

    /// Model API returned an authentication error (401/403) — retry unlikely to help.
    #[error("Authentication error from the model API: {detail}\nCheck GEMINI_API_KEY.")]
    AuthError { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// No API key available from config or environment.
    #[error("No Gemini API key configured.\nSet GEMINI_API_KEY or pass one via AnalysisConfig::builder().api_key(...).")]
    ApiKeyMissing,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output workbook file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Workbook serialisation failed.
    #[error("Failed to build the xlsx workbook: {0}")]
    WorkbookFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<rust_xlsxwriter::XlsxError> for CreditsheetError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        Self::WorkbookFailed(e.to_string())
    }
}
