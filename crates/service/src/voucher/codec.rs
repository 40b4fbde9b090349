//! Plain comma-separated codec for voucher import/export.
//!
//! Fields are never quoted, so a code containing a comma does not survive a
//! round trip. Import splits on raw commas for the same reason.
use std::collections::HashSet;

use chrono::NaiveDate;
use thiserror::Error;

use models::voucher::{parse_expiry_date, validate_discount_percent};

use super::domain::Voucher;

pub const HEADER: &str = "voucher_code,discount_percent,expiry_date";
const COLUMNS: usize = 3;

/// Why a single data row was skipped. `Display` is the reason reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("empty row")]
    Empty,
    #[error("invalid column count")]
    ColumnCount,
    #[error("voucher_code required")]
    CodeRequired,
    #[error("duplicate voucher_code in file")]
    DuplicateInFile,
    #[error("discount_percent must be integer between 1 and 100")]
    Percent,
    #[error("expiry_date must be YYYY-MM-DD")]
    ExpiryDate,
    #[error("voucher_code already exists")]
    AlreadyExists,
    #[error("failed to insert voucher")]
    InsertFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub voucher_code: String,
    pub discount_percent: i32,
    pub expiry_date: NaiveDate,
}

pub fn is_header(line: &str) -> bool { line.trim().eq_ignore_ascii_case(HEADER) }

/// File-local checks for one data line, in order. `seen` holds lower-cased codes
/// already imported from this file.
pub fn parse_row(line: &str, seen: &HashSet<String>) -> Result<CsvRow, RowError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(RowError::Empty);
    }
    let cols: Vec<&str> = line.split(',').map(str::trim).collect();
    if cols.len() != COLUMNS {
        return Err(RowError::ColumnCount);
    }
    let code = cols[0];
    if code.is_empty() {
        return Err(RowError::CodeRequired);
    }
    if seen.contains(&code.to_lowercase()) {
        return Err(RowError::DuplicateInFile);
    }
    let discount_percent = cols[1]
        .parse::<i32>()
        .ok()
        .and_then(|p| validate_discount_percent(p).ok())
        .ok_or(RowError::Percent)?;
    let expiry_date = parse_expiry_date(cols[2]).map_err(|_| RowError::ExpiryDate)?;
    Ok(CsvRow { voucher_code: code.to_string(), discount_percent, expiry_date })
}

/// Header plus one unquoted line per voucher.
pub fn write_export(vouchers: &[Voucher]) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());
    wtr.write_record(HEADER.split(','))?;
    for v in vouchers {
        let percent = v.discount_percent.to_string();
        let expiry = v.expiry_date.format(models::voucher::DATE_FORMAT).to_string();
        wtr.write_record([v.voucher_code.as_str(), percent.as_str(), expiry.as_str()])?;
    }
    wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))
}
