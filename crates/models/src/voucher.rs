//! `vouchers` entity and the field rules shared by single writes and CSV import.
use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const MIN_DISCOUNT_PERCENT: i32 = 1;
pub const MAX_DISCOUNT_PERCENT: i32 = 100;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vouchers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub voucher_code: String,
    pub discount_percent: i32,
    pub expiry_date: Date,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Trimmed code, or a validation error when nothing is left.
pub fn validate_code(code: &str) -> Result<String, ModelError> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Err(ModelError::EmptyCode);
    }
    Ok(trimmed.to_string())
}

pub fn validate_discount_percent(percent: i32) -> Result<i32, ModelError> {
    if !(MIN_DISCOUNT_PERCENT..=MAX_DISCOUNT_PERCENT).contains(&percent) {
        return Err(ModelError::DiscountOutOfRange(percent));
    }
    Ok(percent)
}

/// Strict `YYYY-MM-DD`. chrono accepts signed years and unpadded fields, so the
/// shape is checked byte by byte before parsing.
pub fn parse_expiry_date(raw: &str) -> Result<NaiveDate, ModelError> {
    let raw = raw.trim();
    if !is_iso_date_shape(raw.as_bytes()) {
        return Err(ModelError::BadExpiryDate);
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| ModelError::BadExpiryDate)
}

fn is_iso_date_shape(b: &[u8]) -> bool {
    b.len() == 10
        && b.iter().enumerate().all(|(i, c)| match i {
            4 | 7 => *c == b'-',
            _ => c.is_ascii_digit(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_trimmed() {
        assert_eq!(validate_code("  SAVE10 ").unwrap(), "SAVE10");
        assert_eq!(validate_code("   "), Err(ModelError::EmptyCode));
    }

    #[test]
    fn percent_bounds_are_inclusive() {
        assert!(validate_discount_percent(1).is_ok());
        assert!(validate_discount_percent(100).is_ok());
        assert!(validate_discount_percent(0).is_err());
        assert_eq!(validate_discount_percent(101), Err(ModelError::DiscountOutOfRange(101)));
    }

    #[test]
    fn expiry_date_requires_zero_padded_iso_date() {
        assert_eq!(
            parse_expiry_date("2025-01-31").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
        );
        assert!(parse_expiry_date("2025-1-31").is_err());
        assert!(parse_expiry_date("2025-02-30").is_err());
        assert!(parse_expiry_date("31/01/2025").is_err());
        assert!(parse_expiry_date("").is_err());
        assert!(parse_expiry_date("+999-01-01").is_err());
        assert!(parse_expiry_date("-999-01-01").is_err());
        assert!(parse_expiry_date("+0999-1-01").is_err());
        assert!(parse_expiry_date("2025-01-3a").is_err());
        assert_eq!(parse_expiry_date(" 0999-01-01 ").unwrap(), NaiveDate::from_ymd_opt(999, 1, 1).unwrap());
    }
}
