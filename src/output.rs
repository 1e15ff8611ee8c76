//! Output types returned by the `analyze*` entry points.

use crate::ratios::RatioReport;
use crate::record::FinancialRecord;
use serde::{Deserialize, Serialize};

/// Timing and token accounting for one analysis run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Wall-clock duration of the whole run in milliseconds.
    pub total_duration_ms: u64,
    /// Time spent in the extraction API call (including retries).
    pub extract_duration_ms: u64,
    /// Time spent rendering the workbook.
    pub render_duration_ms: u64,
    /// Prompt tokens consumed by the extraction call (0 when unreported).
    pub input_tokens: u64,
    /// Completion tokens generated by the extraction call (0 when unreported).
    pub output_tokens: u64,
}

/// The complete result of analysing one financial-statement PDF.
///
/// `workbook` holds the rendered xlsx bytes; `record` and `ratios` are the
/// intermediate values for callers that want the data without the
/// spreadsheet (e.g. `--json` mode).
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutput {
    /// Trimmed company name the report was generated for.
    pub company_name: String,
    /// Structured data extracted from the PDF.
    pub record: FinancialRecord,
    /// The fourteen computed ratios.
    pub ratios: RatioReport,
    /// The rendered five-sheet xlsx workbook.
    #[serde(skip)]
    pub workbook: Vec<u8>,
    /// Suggested output filename (`{date}_{company}.xlsx` convention).
    pub filename: String,
    /// Timing and token stats.
    pub stats: AnalysisStats,
}
