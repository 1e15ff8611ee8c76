//! Analysis entry points: resolve input, extract, compute, render.
//!
//! These functions wire the pipeline stages together and are the primary
//! library API. Each call is independent — no state is shared between
//! invocations, so concurrent analyses need no coordination. The only
//! suspending step is the extraction API call; everything on either side of
//! it is synchronous and fast.

use crate::config::{AnalysisConfig, MAX_COMPANY_NAME_CHARS};
use crate::error::CreditsheetError;
use crate::output::{AnalysisOutput, AnalysisStats};
use crate::pipeline::extract::{Extraction, Extractor, GeminiExtractor};
use crate::pipeline::{input, report};
use crate::ratios;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Analyse a financial-statement PDF (local path or HTTP/HTTPS URL).
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str` — Local file path or HTTP/HTTPS URL to a PDF
/// * `company_name` — Non-empty after trimming, at most 100 characters
/// * `config` — Analysis configuration
///
/// # Errors
/// Returns `Err(CreditsheetError)` for input-validation, extraction,
/// configuration, and I/O failures. Ratio computation itself never fails:
/// missing line items read as zero and every division is guarded.
pub async fn analyze(
    input_str: impl AsRef<str>,
    company_name: &str,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, CreditsheetError> {
    let input_str = input_str.as_ref();
    let company = validate_company_name(company_name)?;
    info!("Starting analysis of {} for '{}'", input_str, company);

    let resolved = input::resolve_input(input_str, config).await?;
    let pdf = input::read_pdf_bytes(&resolved, config.max_pdf_bytes).await?;

    run_pipeline(&pdf, company, config).await
}

/// Analyse PDF bytes already in memory.
///
/// The recommended API when the document comes from a network stream or
/// in-memory buffer rather than a file on disk.
pub async fn analyze_from_bytes(
    pdf: &[u8],
    company_name: &str,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, CreditsheetError> {
    let company = validate_company_name(company_name)?;
    input::validate_pdf_bytes(pdf, Path::new("<memory>"), config.max_pdf_bytes)?;
    run_pipeline(pdf, company, config).await
}

/// Analyse a PDF and write the workbook directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn analyze_to_file(
    input_str: impl AsRef<str>,
    company_name: &str,
    output_path: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, CreditsheetError> {
    let output = analyze(input_str, company_name, config).await?;
    let path = output_path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CreditsheetError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("xlsx.tmp");
    tokio::fs::write(&tmp_path, &output.workbook)
        .await
        .map_err(|e| CreditsheetError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| CreditsheetError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(output)
}

/// Synchronous wrapper around [`analyze`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync(
    input_str: impl AsRef<str>,
    company_name: &str,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, CreditsheetError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CreditsheetError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(analyze(input_str, company_name, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Trim and bound the company name per the upload contract.
fn validate_company_name(name: &str) -> Result<&str, CreditsheetError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CreditsheetError::CompanyNameRequired);
    }
    let len = trimmed.chars().count();
    if len > MAX_COMPANY_NAME_CHARS {
        return Err(CreditsheetError::CompanyNameTooLong {
            len,
            limit: MAX_COMPANY_NAME_CHARS,
        });
    }
    Ok(trimmed)
}

/// Resolve the extractor: a pre-built one from the config takes precedence,
/// otherwise construct the Gemini extractor (which reads `GEMINI_API_KEY`
/// when no key is configured).
fn resolve_extractor(config: &AnalysisConfig) -> Result<Arc<dyn Extractor>, CreditsheetError> {
    if let Some(ref extractor) = config.extractor {
        return Ok(Arc::clone(extractor));
    }
    Ok(Arc::new(GeminiExtractor::from_config(config)?))
}

/// Extract → compute → render, with timing.
async fn run_pipeline(
    pdf: &[u8],
    company: &str,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, CreditsheetError> {
    let total_start = Instant::now();
    let extractor = resolve_extractor(config)?;

    let extract_start = Instant::now();
    let Extraction {
        record,
        input_tokens,
        output_tokens,
    } = extractor.extract(pdf).await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    debug!(
        "Extracted {} income, {} balance, {} cash-flow items, {} notes",
        record.income_statement.len(),
        record.balance_sheet.len(),
        record.cash_flow.len(),
        record.notes.len()
    );

    let ratios = ratios::compute(&record);

    let date = chrono::Local::now().date_naive();
    let render_start = Instant::now();
    let workbook = report::render_workbook(&record, &ratios, company, date)?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    let stats = AnalysisStats {
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        extract_duration_ms,
        render_duration_ms,
        input_tokens,
        output_tokens,
    };

    info!(
        "Analysis complete for '{}': {} workbook bytes in {}ms",
        company,
        workbook.len(),
        stats.total_duration_ms
    );

    Ok(AnalysisOutput {
        company_name: company.to_string(),
        filename: report::report_filename(date, company),
        record,
        ratios,
        workbook,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_name_is_trimmed() {
        assert_eq!(validate_company_name("  Acme Corp  ").unwrap(), "Acme Corp");
    }

    #[test]
    fn empty_company_name_rejected() {
        assert!(matches!(
            validate_company_name("   ").unwrap_err(),
            CreditsheetError::CompanyNameRequired
        ));
    }

    #[test]
    fn overlong_company_name_rejected() {
        let name = "x".repeat(101);
        assert!(matches!(
            validate_company_name(&name).unwrap_err(),
            CreditsheetError::CompanyNameTooLong { len: 101, limit: 100 }
        ));
        // Exactly at the limit is fine.
        assert!(validate_company_name(&"x".repeat(100)).is_ok());
    }
}
