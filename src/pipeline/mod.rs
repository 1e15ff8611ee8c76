//! Pipeline stages for financial-statement analysis.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different extraction backend) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ ratios ──▶ report
//! (URL/path) (Gemini)   (pure)     (xlsx)
//! ```
//!
//! 1. [`input`]   — canonicalise the user-supplied path or URL to local PDF
//!    bytes, validating magic bytes and the size cap
//! 2. [`extract`] — send the PDF to the Gemini API with retry/backoff and
//!    parse the response into a [`crate::record::FinancialRecord`]; the only
//!    stage with network I/O
//! 3. [`crate::ratios`] — the pure ratio engine (lives at the crate root
//!    because it is the semantic core, usable without the pipeline)
//! 4. [`report`]  — serialise record + ratios into the five-sheet workbook

pub mod extract;
pub mod input;
pub mod report;
