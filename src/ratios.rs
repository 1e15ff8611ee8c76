//! The ratio engine: a pure transform from a [`FinancialRecord`] to the
//! fourteen credit-underwriting ratios.
//!
//! ## Design
//!
//! This is straight-line arithmetic with exactly one correctness rule:
//! **every** division goes through [`safe_divide`], which degrades division
//! by zero and non-finite operands to `0.0`. Combined with the
//! absent-key-reads-as-zero rule in [`crate::record`], the engine can never
//! fail — a report always renders fully even when extraction found only a
//! fraction of the statements. Completeness over flagging gaps is a
//! deliberate policy choice for underwriting reports.
//!
//! No state, no I/O, no allocation beyond the returned value. Calling
//! [`compute`] twice with the same record yields bitwise-identical output.

use crate::record::{keys, FinancialRecord, LineItems};
use serde::{Deserialize, Serialize};

/// Assumed average interest rate applied to total debt when estimating debt
/// service in [`Coverage::debt_service_coverage`].
///
/// No real amortisation schedule is available from a single statement, so
/// the denominator approximates annual debt service as
/// `InterestExpense + ASSUMED_DEBT_INTEREST_RATE × (ShortTermDebt + LongTermDebt)`.
pub const ASSUMED_DEBT_INTEREST_RATE: f64 = 0.1;

/// Divide, degrading unfavourable arithmetic to `0.0`.
///
/// Returns `0.0` when the denominator is zero or either operand is not a
/// finite real number (NaN, ±∞). Every ratio in the report is produced
/// through this guard, so the report never carries NaN or infinity.
pub fn safe_divide(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !numerator.is_finite() || !denominator.is_finite() {
        return 0.0;
    }
    numerator / denominator
}

/// Liquidity: can current obligations be met from current assets?
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Liquidity {
    /// TotalCurrentAssets / (AccountsPayable + ShortTermDebt)
    pub current_ratio: f64,
    /// (TotalCurrentAssets − Inventory) / (AccountsPayable + ShortTermDebt)
    pub quick_ratio: f64,
    /// Cash / (AccountsPayable + ShortTermDebt)
    pub cash_ratio: f64,
}

/// Leverage: how indebted is the balance sheet?
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leverage {
    /// (ShortTermDebt + LongTermDebt) / equity
    pub debt_to_equity: f64,
    /// (ShortTermDebt + LongTermDebt) / TotalAssets
    pub debt_to_assets: f64,
    /// OperatingIncome / InterestExpense
    pub interest_coverage: f64,
}

/// Profitability, expressed as percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profitability {
    /// Return on equity: NetIncome / equity × 100
    pub roe: f64,
    /// Return on assets: NetIncome / TotalAssets × 100
    pub roa: f64,
    /// NetIncome / Revenue × 100
    pub net_profit_margin: f64,
    /// GrossProfit / Revenue × 100
    pub gross_profit_margin: f64,
}

/// Efficiency: how hard are assets working?
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Efficiency {
    /// Revenue / TotalAssets
    pub asset_turnover: f64,
    /// CostOfGoodsSold / Inventory
    pub inventory_turnover: f64,
    /// Revenue / AccountsReceivable
    pub receivables_turnover: f64,
}

/// Coverage: can operating income service the debt load?
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coverage {
    /// OperatingIncome / InterestExpense.
    ///
    /// Currently identical to [`Leverage::interest_coverage`]; kept as a
    /// separate field for report compatibility. A future revision may move
    /// this to an EBIT basis.
    pub times_interest_earned: f64,
    /// (OperatingIncome + InterestExpense) /
    /// (InterestExpense + [`ASSUMED_DEBT_INTEREST_RATE`] × total debt)
    pub debt_service_coverage: f64,
}

/// The complete ratio report: five categories, fourteen fields, all always
/// present. A single-use value — constructed once per [`compute`] call and
/// never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatioReport {
    pub liquidity: Liquidity,
    pub leverage: Leverage,
    pub profitability: Profitability,
    pub efficiency: Efficiency,
    pub coverage: Coverage,
}

/// Equity for denominator purposes: `TotalEquity` when nonzero, otherwise
/// `ShareholdersEquity`. Statements label this line either way; some carry
/// both with `TotalEquity` zeroed out.
fn resolve_equity(balance_sheet: &LineItems) -> f64 {
    let total = balance_sheet.amount(keys::TOTAL_EQUITY);
    if total != 0.0 {
        total
    } else {
        balance_sheet.amount(keys::SHAREHOLDERS_EQUITY)
    }
}

/// Compute all fourteen ratios from an extracted record.
///
/// Pure and infallible: absent line items read as zero, and every division
/// is guarded by [`safe_divide`], so any well-typed record yields a complete
/// report.
pub fn compute(record: &FinancialRecord) -> RatioReport {
    let income = &record.income_statement;
    let balance = &record.balance_sheet;

    let current_assets = balance.amount(keys::TOTAL_CURRENT_ASSETS);
    let current_liabilities =
        balance.amount(keys::ACCOUNTS_PAYABLE) + balance.amount(keys::SHORT_TERM_DEBT);
    let cash = balance.amount(keys::CASH);
    let receivables = balance.amount(keys::ACCOUNTS_RECEIVABLE);
    let inventory = balance.amount(keys::INVENTORY);

    let total_debt = balance.amount(keys::SHORT_TERM_DEBT) + balance.amount(keys::LONG_TERM_DEBT);
    let equity = resolve_equity(balance);
    let total_assets = balance.amount(keys::TOTAL_ASSETS);

    let revenue = income.amount(keys::REVENUE);
    let net_income = income.amount(keys::NET_INCOME);
    let gross_profit = income.amount(keys::GROSS_PROFIT);
    let operating_income = income.amount(keys::OPERATING_INCOME);
    let interest_expense = income.amount(keys::INTEREST_EXPENSE);

    RatioReport {
        liquidity: Liquidity {
            current_ratio: safe_divide(current_assets, current_liabilities),
            quick_ratio: safe_divide(current_assets - inventory, current_liabilities),
            cash_ratio: safe_divide(cash, current_liabilities),
        },
        leverage: Leverage {
            debt_to_equity: safe_divide(total_debt, equity),
            debt_to_assets: safe_divide(total_debt, total_assets),
            interest_coverage: safe_divide(operating_income, interest_expense),
        },
        profitability: Profitability {
            roe: safe_divide(net_income, equity) * 100.0,
            roa: safe_divide(net_income, total_assets) * 100.0,
            net_profit_margin: safe_divide(net_income, revenue) * 100.0,
            gross_profit_margin: safe_divide(gross_profit, revenue) * 100.0,
        },
        efficiency: Efficiency {
            asset_turnover: safe_divide(revenue, total_assets),
            inventory_turnover: safe_divide(income.amount(keys::COST_OF_GOODS_SOLD), inventory),
            receivables_turnover: safe_divide(revenue, receivables),
        },
        coverage: Coverage {
            times_interest_earned: safe_divide(operating_income, interest_expense),
            debt_service_coverage: safe_divide(
                operating_income + interest_expense,
                interest_expense + total_debt * ASSUMED_DEBT_INTEREST_RATE,
            ),
        },
    }
}
