//! Bank statement ingestion: PDF text extraction, line parsing, CSV
//! import/export and amount correction.
//!
//! Parsing is deliberately schema-free. A statement line is any line whose
//! first whitespace token is a date and which has at least three tokens:
//!
//! ```text
//! 2024-01-01  Payroll deposit  1,250.00
//! 01/15/2024  Card payment     -42.10
//! ```
//!
//! The last token is the amount, everything between is the description.

use crate::db::models::{DbTransaction, NewTransaction, TransactionKind};
use crate::error::BridgeError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::Read;
use tracing::{debug, warn};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// A statement line as found in the source; the amount is still text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawStatement {
    pub date: NaiveDate,
    pub description: String,
    pub amount: String,
}

/// A statement line after discrepancy correction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub transaction_type: TransactionKind,
}

impl Statement {
    pub fn into_new_transaction(self, ai_verified: bool) -> NewTransaction {
        NewTransaction {
            date: self.date,
            description: self.description,
            amount: self.amount,
            ai_verified,
        }
    }
}

/// Extract the text layer of a PDF. Runs on the blocking pool; the
/// extractor panics on some malformed inputs, which surfaces as an error.
pub async fn extract_pdf_text(bytes: Vec<u8>) -> Result<String, BridgeError> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| BridgeError::Statement(format!("PDF extraction aborted: {e}")))?
        .map_err(|e| BridgeError::Statement(e.to_string()))
}

pub fn parse_date(token: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(token, fmt).ok())
}

/// Split extracted text into statement lines. Non-matching lines are skipped.
pub fn parse_statement_text(text: &str) -> Vec<RawStatement> {
    text.lines()
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 3 {
                return None;
            }
            let date = parse_date(tokens[0])?;
            let (amount, middle) = tokens[1..].split_last()?;
            Some(RawStatement {
                date,
                description: middle.join(" "),
                amount: (*amount).to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct CsvStatementRow {
    date: String,
    description: String,
    amount: String,
}

/// Read a `date,description,amount` CSV. Rows with an unreadable date are skipped.
pub fn parse_statement_csv<R: Read>(reader: R) -> Result<Vec<RawStatement>, BridgeError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut out = Vec::new();
    for (idx, row) in rdr.deserialize::<CsvStatementRow>().enumerate() {
        let row = row?;
        let Some(date) = parse_date(&row.date) else {
            warn!(row = idx + 1, date = %row.date, "skipping CSV row with unreadable date");
            continue;
        };
        out.push(RawStatement {
            date,
            description: row.description,
            amount: row.amount,
        });
    }
    Ok(out)
}

/// Parse a money token: drops `$`, `,` and spaces; `(12.50)` reads as -12.50.
pub fn clean_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let (negative, body) = match trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };
    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// Unreadable amounts become 0.00; the transaction type follows the sign.
pub fn correct_discrepancies(raw: Vec<RawStatement>) -> Vec<Statement> {
    raw.into_iter()
        .map(|r| {
            let amount = clean_amount(&r.amount).unwrap_or_else(|| {
                debug!(amount = %r.amount, date = %r.date, "correcting unreadable amount to 0.00");
                0.0
            });
            Statement {
                date: r.date,
                description: r.description,
                amount,
                transaction_type: TransactionKind::from_amount(amount),
            }
        })
        .collect()
}

pub fn net_change(statements: &[Statement]) -> f64 {
    statements.iter().map(|s| s.amount).sum()
}

#[derive(Serialize)]
struct CsvExportRow<'a> {
    date: String,
    description: &'a str,
    amount: String,
    transaction_type: TransactionKind,
}

/// Render transactions as CSV with a header row.
pub fn write_statements_csv(rows: &[DbTransaction]) -> Result<Vec<u8>, BridgeError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in rows {
        wtr.serialize(CsvExportRow {
            date: row.date.format("%Y-%m-%d").to_string(),
            description: &row.description,
            amount: format!("{:.2}", row.amount),
            transaction_type: row.transaction_type,
        })?;
    }
    wtr.into_inner().map_err(|e| BridgeError::Io(e.into_error()))
}
