//! Report rendering: serialise record + ratios into the five-sheet workbook.
//!
//! Sheet order and cell layout are part of the external contract — the
//! workbook shape is what downstream underwriting tooling ingests — so the
//! row layout is built by pure functions ([`summary_rows`],
//! [`statement_rows`], [`notes_rows`]) that tests can assert on without
//! decoding xlsx bytes. The `rust_xlsxwriter` calls at the end are a thin
//! serialisation shim over those rows.

use crate::error::CreditsheetError;
use crate::ratios::RatioReport;
use crate::record::{FinancialRecord, LineItems};
use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

/// One cell of the report layout.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }
}

/// A row: label column plus value column.
pub type Row = (Cell, Cell);

/// Build the report filename: ISO date with hyphens replaced by underscores,
/// then the company name, e.g. `2026_08_30_Acme Corp.xlsx`.
pub fn report_filename(date: NaiveDate, company_name: &str) -> String {
    format!(
        "{}_{}.xlsx",
        date.format("%Y_%m_%d"),
        company_name.trim()
    )
}

/// Summary sheet rows: company header, then the fourteen ratios grouped
/// under their category headers.
///
/// Percentage ratios are rendered as text with a trailing `%`, matching the
/// report shape the underwriting side already consumes.
pub fn summary_rows(ratios: &RatioReport, company_name: &str, date: NaiveDate) -> Vec<Row> {
    let pct = |v: f64| Cell::text(format!("{v}%"));
    vec![
        (Cell::text("Financial Analysis Summary"), Cell::Empty),
        (Cell::text("Company Name"), Cell::text(company_name)),
        (
            Cell::text("Analysis Date"),
            Cell::text(date.format("%Y-%m-%d").to_string()),
        ),
        (Cell::Empty, Cell::Empty),
        (Cell::text("LIQUIDITY RATIOS"), Cell::Empty),
        (Cell::text("Current Ratio"), Cell::Number(ratios.liquidity.current_ratio)),
        (Cell::text("Quick Ratio"), Cell::Number(ratios.liquidity.quick_ratio)),
        (Cell::text("Cash Ratio"), Cell::Number(ratios.liquidity.cash_ratio)),
        (Cell::Empty, Cell::Empty),
        (Cell::text("LEVERAGE RATIOS"), Cell::Empty),
        (Cell::text("Debt-to-Equity"), Cell::Number(ratios.leverage.debt_to_equity)),
        (Cell::text("Debt-to-Assets"), Cell::Number(ratios.leverage.debt_to_assets)),
        (Cell::text("Interest Coverage"), Cell::Number(ratios.leverage.interest_coverage)),
        (Cell::Empty, Cell::Empty),
        (Cell::text("PROFITABILITY RATIOS"), Cell::Empty),
        (Cell::text("Return on Equity (ROE)"), pct(ratios.profitability.roe)),
        (Cell::text("Return on Assets (ROA)"), pct(ratios.profitability.roa)),
        (Cell::text("Net Profit Margin"), pct(ratios.profitability.net_profit_margin)),
        (Cell::text("Gross Profit Margin"), pct(ratios.profitability.gross_profit_margin)),
        (Cell::Empty, Cell::Empty),
        (Cell::text("EFFICIENCY RATIOS"), Cell::Empty),
        (Cell::text("Asset Turnover"), Cell::Number(ratios.efficiency.asset_turnover)),
        (Cell::text("Inventory Turnover"), Cell::Number(ratios.efficiency.inventory_turnover)),
        (Cell::text("Receivables Turnover"), Cell::Number(ratios.efficiency.receivables_turnover)),
        (Cell::Empty, Cell::Empty),
        (Cell::text("COVERAGE RATIOS"), Cell::Empty),
        (Cell::text("Times Interest Earned"), Cell::Number(ratios.coverage.times_interest_earned)),
        (Cell::text("Debt Service Coverage"), Cell::Number(ratios.coverage.debt_service_coverage)),
    ]
}

/// Two-column item/amount rows for one statement sheet.
pub fn statement_rows(title: &str, items: &LineItems) -> Vec<Row> {
    let mut rows = vec![
        (Cell::text(title), Cell::Empty),
        (Cell::text("Item"), Cell::text("Amount")),
    ];
    rows.extend(
        items
            .iter()
            .map(|(name, amount)| (Cell::text(name), Cell::Number(amount))),
    );
    rows
}

/// Numbered note rows for the Notes sheet.
pub fn notes_rows(notes: &[String]) -> Vec<Row> {
    let mut rows = vec![
        (Cell::text("Notes and Disclosures"), Cell::Empty),
        (Cell::text("Note"), Cell::text("Description")),
    ];
    rows.extend(
        notes
            .iter()
            .enumerate()
            .map(|(i, note)| (Cell::text(format!("Note {}", i + 1)), Cell::text(note))),
    );
    rows
}

/// Render the full five-sheet workbook to xlsx bytes.
///
/// Sheet order is fixed: Summary, Income Statement, Balance Sheet,
/// Cash Flow, Notes.
pub fn render_workbook(
    record: &FinancialRecord,
    ratios: &RatioReport,
    company_name: &str,
    date: NaiveDate,
) -> Result<Vec<u8>, CreditsheetError> {
    let mut workbook = Workbook::new();

    write_sheet(
        workbook.add_worksheet(),
        "Summary",
        &summary_rows(ratios, company_name, date),
    )?;
    write_sheet(
        workbook.add_worksheet(),
        "Income Statement",
        &statement_rows("Income Statement", &record.income_statement),
    )?;
    write_sheet(
        workbook.add_worksheet(),
        "Balance Sheet",
        &statement_rows("Balance Sheet", &record.balance_sheet),
    )?;
    write_sheet(
        workbook.add_worksheet(),
        "Cash Flow",
        &statement_rows("Cash Flow Statement", &record.cash_flow),
    )?;
    write_sheet(workbook.add_worksheet(), "Notes", &notes_rows(&record.notes))?;

    Ok(workbook.save_to_buffer()?)
}

fn write_sheet(
    worksheet: &mut Worksheet,
    name: &str,
    rows: &[Row],
) -> Result<(), CreditsheetError> {
    worksheet.set_name(name)?;
    let bold = Format::new().set_bold();

    for (r, (label, value)) in rows.iter().enumerate() {
        let r = r as u32;
        // Title and header rows read better bold; data rows stay plain.
        let format = if r < 2 { Some(&bold) } else { None };
        write_cell(worksheet, r, 0, label, format)?;
        write_cell(worksheet, r, 1, value, format)?;
    }

    // Wide label column so ratio names and note text stay readable.
    worksheet.set_column_width(0, 28)?;
    worksheet.set_column_width(1, 40)?;
    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    format: Option<&Format>,
) -> Result<(), CreditsheetError> {
    match (cell, format) {
        (Cell::Empty, _) => {}
        (Cell::Text(s), Some(f)) => {
            worksheet.write_string_with_format(row, col, s, f)?;
        }
        (Cell::Text(s), None) => {
            worksheet.write_string(row, col, s)?;
        }
        (Cell::Number(n), Some(f)) => {
            worksheet.write_number_with_format(row, col, *n, f)?;
        }
        (Cell::Number(n), None) => {
            worksheet.write_number(row, col, *n)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratios::compute;
    use crate::record::LineItems;

    fn sample_record() -> FinancialRecord {
        FinancialRecord {
            income_statement: LineItems::from([("Revenue", 800.0), ("NetIncome", 80.0)]),
            balance_sheet: LineItems::from([("Cash", 150.0), ("TotalAssets", 5000.0)]),
            cash_flow: LineItems::from([("OperatingCashFlow", 95.0)]),
            notes: vec!["Audited figures".into(), "FY ends in June".into()],
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 30).unwrap()
    }

    #[test]
    fn filename_convention() {
        assert_eq!(
            report_filename(date(), "Acme Corp"),
            "2026_08_30_Acme Corp.xlsx"
        );
        assert_eq!(
            report_filename(date(), "  Trimmed Inc  "),
            "2026_08_30_Trimmed Inc.xlsx"
        );
    }

    #[test]
    fn summary_has_all_fourteen_ratios_under_category_headers() {
        let rows = summary_rows(&compute(&sample_record()), "Acme Corp", date());

        let labels: Vec<&str> = rows
            .iter()
            .filter_map(|(l, _)| match l {
                Cell::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();

        for header in [
            "LIQUIDITY RATIOS",
            "LEVERAGE RATIOS",
            "PROFITABILITY RATIOS",
            "EFFICIENCY RATIOS",
            "COVERAGE RATIOS",
        ] {
            assert!(labels.contains(&header), "missing header {header}");
        }
        // 14 ratio rows: labels minus 5 headers, title, company, date.
        assert_eq!(labels.len() - 5 - 3, 14);
        assert_eq!(rows[1].1, Cell::text("Acme Corp"));
        assert_eq!(rows[2].1, Cell::text("2026-08-30"));
    }

    #[test]
    fn summary_percentages_render_with_suffix() {
        let rows = summary_rows(&compute(&sample_record()), "Acme", date());
        let roe = rows
            .iter()
            .find(|(l, _)| matches!(l, Cell::Text(s) if s == "Return on Equity (ROE)"))
            .unwrap();
        assert!(matches!(&roe.1, Cell::Text(s) if s.ends_with('%')));
    }

    #[test]
    fn statement_rows_carry_items_in_order() {
        let record = sample_record();
        let rows = statement_rows("Income Statement", &record.income_statement);
        assert_eq!(rows[0].0, Cell::text("Income Statement"));
        assert_eq!(rows[1], (Cell::text("Item"), Cell::text("Amount")));
        assert_eq!(rows[2], (Cell::text("NetIncome"), Cell::Number(80.0)));
        assert_eq!(rows[3], (Cell::text("Revenue"), Cell::Number(800.0)));
    }

    #[test]
    fn notes_rows_are_numbered_from_one() {
        let rows = notes_rows(&["alpha".into(), "beta".into()]);
        assert_eq!(rows[2].0, Cell::text("Note 1"));
        assert_eq!(rows[2].1, Cell::text("alpha"));
        assert_eq!(rows[3].0, Cell::text("Note 2"));
    }

    #[test]
    fn empty_record_still_renders_a_workbook() {
        let record = FinancialRecord::default();
        let ratios = compute(&record);
        let bytes = render_workbook(&record, &ratios, "Empty Co", date()).unwrap();
        // xlsx is a zip container
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn workbook_bytes_look_like_xlsx() {
        let record = sample_record();
        let ratios = compute(&record);
        let bytes = render_workbook(&record, &ratios, "Acme Corp", date()).unwrap();
        assert_eq!(&bytes[..2], b"PK");
        assert!(bytes.len() > 1000, "workbook suspiciously small");
    }
}
