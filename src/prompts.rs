//! Extraction prompt for the Gemini model.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing what the model is asked to pull
//!    out of a statement requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the prompt directly without
//!    a live API call, so prompt regressions (a dropped key, a renamed
//!    section) are caught cheaply.
//!
//! Callers can override the default via
//! [`crate::config::AnalysisConfig::extraction_prompt`]; the constant here
//! is used only when no override is provided.

/// Default prompt asking the model to extract structured financial data.
///
/// The JSON shape it requests matches [`crate::record::FinancialRecord`]
/// exactly. Key instructions: actual numbers not percentages, `0` for
/// anything unavailable, and notes collected into an array. The response
/// may wrap the JSON in prose; the extractor locates the first balanced
/// `{…}` span before parsing.
pub const EXTRACTION_PROMPT: &str = r#"Analyze this financial statement PDF and extract all key financial data.

Please provide a comprehensive analysis including:

1. Income Statement data (Revenue, Cost of Goods Sold, Gross Profit, Operating Expenses, Operating Income, Interest Expense, Net Income, etc.)
2. Balance Sheet data (Cash, Accounts Receivable, Inventory, Total Current Assets, Property Plant & Equipment, Total Assets, Accounts Payable, Short-term Debt, Long-term Debt, Total Liabilities, Shareholders' Equity, etc.)
3. Cash Flow Statement data (Operating Cash Flow, Investing Cash Flow, Financing Cash Flow, Net Cash Flow, etc.)
4. Any important notes or disclosures

Return the data in the following JSON format:
{
  "incomeStatement": {
    "Revenue": number,
    "CostOfGoodsSold": number,
    "GrossProfit": number,
    "OperatingExpenses": number,
    "OperatingIncome": number,
    "InterestExpense": number,
    "NetIncome": number,
    "EBITDA": number
  },
  "balanceSheet": {
    "Cash": number,
    "AccountsReceivable": number,
    "Inventory": number,
    "TotalCurrentAssets": number,
    "PropertyPlantEquipment": number,
    "TotalAssets": number,
    "AccountsPayable": number,
    "ShortTermDebt": number,
    "LongTermDebt": number,
    "TotalLiabilities": number,
    "ShareholdersEquity": number,
    "TotalEquity": number
  },
  "cashFlow": {
    "OperatingCashFlow": number,
    "InvestingCashFlow": number,
    "FinancingCashFlow": number,
    "NetCashFlow": number,
    "CapitalExpenditures": number
  },
  "notes": ["note1", "note2", "note3"]
}

Important:
- Extract actual numerical values, not percentages
- If a value is not available, use 0
- Ensure all numbers are in the same currency unit
- Include any significant notes or disclosures in the notes array
- Be thorough in extracting all available financial data"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::keys;

    #[test]
    fn prompt_requests_every_key_the_engine_reads() {
        for key in [
            keys::REVENUE,
            keys::COST_OF_GOODS_SOLD,
            keys::GROSS_PROFIT,
            keys::OPERATING_INCOME,
            keys::INTEREST_EXPENSE,
            keys::NET_INCOME,
            keys::CASH,
            keys::ACCOUNTS_RECEIVABLE,
            keys::INVENTORY,
            keys::TOTAL_CURRENT_ASSETS,
            keys::TOTAL_ASSETS,
            keys::ACCOUNTS_PAYABLE,
            keys::SHORT_TERM_DEBT,
            keys::LONG_TERM_DEBT,
            keys::SHAREHOLDERS_EQUITY,
            keys::TOTAL_EQUITY,
        ] {
            assert!(
                EXTRACTION_PROMPT.contains(&format!("\"{key}\"")),
                "prompt missing key {key}"
            );
        }
    }

    #[test]
    fn prompt_pins_the_defaults_to_zero_rule() {
        assert!(EXTRACTION_PROMPT.contains("use 0"));
    }
}
