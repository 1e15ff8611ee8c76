//! The extraction result: three flat statements plus free-text notes.
//!
//! ## Why a flat map per statement?
//!
//! Financial statements vary wildly between issuers — different charts of
//! accounts, different granularity, different labels. Modelling each
//! statement as a flat `name → amount` map means the extractor can return
//! whatever line items it found without the record type constraining it,
//! and the ratio engine reads only the handful of keys it cares about.
//!
//! The single most important rule lives here: **an absent line item is the
//! value `0.0`, never a missing-data error**. Every lookup goes through
//! [`LineItems::amount`] so the rule cannot be forgotten for one field.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Line-item names the ratio engine reads.
///
/// The extraction prompt asks the model for exactly these keys, but the
/// record tolerates any subset — an absent key reads as `0.0`.
pub mod keys {
    // Income statement
    pub const REVENUE: &str = "Revenue";
    pub const COST_OF_GOODS_SOLD: &str = "CostOfGoodsSold";
    pub const GROSS_PROFIT: &str = "GrossProfit";
    pub const OPERATING_INCOME: &str = "OperatingIncome";
    pub const INTEREST_EXPENSE: &str = "InterestExpense";
    pub const NET_INCOME: &str = "NetIncome";

    // Balance sheet
    pub const CASH: &str = "Cash";
    pub const ACCOUNTS_RECEIVABLE: &str = "AccountsReceivable";
    pub const INVENTORY: &str = "Inventory";
    pub const TOTAL_CURRENT_ASSETS: &str = "TotalCurrentAssets";
    pub const TOTAL_ASSETS: &str = "TotalAssets";
    pub const ACCOUNTS_PAYABLE: &str = "AccountsPayable";
    pub const SHORT_TERM_DEBT: &str = "ShortTermDebt";
    pub const LONG_TERM_DEBT: &str = "LongTermDebt";
    pub const SHAREHOLDERS_EQUITY: &str = "ShareholdersEquity";
    pub const TOTAL_EQUITY: &str = "TotalEquity";
}

/// One statement's worth of extracted figures: line-item name → amount.
///
/// A `BTreeMap` rather than `HashMap` so iteration order (and therefore the
/// rendered workbook) is deterministic for identical input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItems(pub BTreeMap<String, f64>);

impl LineItems {
    /// Look up a line item, defaulting to `0.0` when absent.
    ///
    /// This is the only sanctioned way to read a figure out of a statement.
    pub fn amount(&self, key: &str) -> f64 {
        self.0.get(key).copied().unwrap_or(0.0)
    }

    /// Number of line items present.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the statement came back empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate line items in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<const N: usize> From<[(&str, f64); N]> for LineItems {
    fn from(items: [(&str, f64); N]) -> Self {
        Self(items.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

/// Everything the extraction model pulled out of one financial-statement PDF.
///
/// Field names follow the wire shape the model is asked to produce
/// (`incomeStatement`, `balanceSheet`, `cashFlow`, `notes`); every field is
/// `#[serde(default)]` so a response missing a whole section still parses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialRecord {
    /// Income statement figures (Revenue, NetIncome, …).
    #[serde(default)]
    pub income_statement: LineItems,

    /// Balance sheet figures (Cash, TotalAssets, …).
    #[serde(default)]
    pub balance_sheet: LineItems,

    /// Cash flow figures (OperatingCashFlow, CapitalExpenditures, …).
    #[serde(default)]
    pub cash_flow: LineItems,

    /// Free-text notes and disclosures, in document order. May be empty.
    #[serde(default)]
    pub notes: Vec<String>,
}
