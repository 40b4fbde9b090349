use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::pagination::PaginationMeta;

/// Voucher as exposed to callers. Dates render as `YYYY-MM-DD`, timestamps as
/// second-precision UTC with a `Z` suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    pub id: i64,
    pub voucher_code: String,
    pub discount_percent: i32,
    pub expiry_date: NaiveDate,
    #[serde(with = "utc_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "utc_seconds")]
    pub updated_at: DateTime<Utc>,
}

impl From<models::voucher::Model> for Voucher {
    fn from(m: models::voucher::Model) -> Self {
        Self {
            id: m.id,
            voucher_code: m.voucher_code,
            discount_percent: m.discount_percent,
            expiry_date: m.expiry_date,
            created_at: m.created_at.with_timezone(&Utc),
            updated_at: m.updated_at.with_timezone(&Utc),
        }
    }
}

/// Validated write payload handed to the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVoucher {
    pub voucher_code: String,
    pub discount_percent: i32,
    pub expiry_date: NaiveDate,
}

/// Create payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVoucherInput {
    pub voucher_code: String,
    pub discount_percent: i32,
    pub expiry_date: String,
}

/// Update payload (full replace)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateVoucherInput {
    pub voucher_code: String,
    pub discount_percent: i32,
    pub expiry_date: String,
}

/// Sortable columns. Anything outside the allow-list resolves to `ExpiryDate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortColumn {
    #[default]
    ExpiryDate,
    DiscountPercent,
}

impl SortColumn {
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("discount_percent") => Self::DiscountPercent,
            _ => Self::ExpiryDate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExpiryDate => "expiry_date",
            Self::DiscountPercent => "discount_percent",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            Some(v) if v.trim().eq_ignore_ascii_case("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub search: String,
    pub sort_by: SortColumn,
    pub order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub data: Vec<Voucher>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvImportResult {
    pub total_rows: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub failures: Vec<CsvImportStatus>,
}

impl CsvImportResult {
    pub(crate) fn fail(&mut self, row: usize, reason: impl ToString) {
        self.failure_count += 1;
        self.failures.push(CsvImportStatus { row, reason: reason.to_string() });
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvImportStatus {
    pub row: usize,
    pub reason: String,
}

mod utc_seconds {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&dt.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sort_column_uses_allow_list() {
        assert_eq!(SortColumn::from_param(Some("discount_percent")), SortColumn::DiscountPercent);
        assert_eq!(SortColumn::from_param(Some("expiry_date")), SortColumn::ExpiryDate);
        assert_eq!(SortColumn::from_param(Some("id; DROP TABLE vouchers")), SortColumn::ExpiryDate);
        assert_eq!(SortColumn::from_param(None), SortColumn::ExpiryDate);
    }

    #[test]
    fn sort_order_is_case_insensitive() {
        assert_eq!(SortOrder::from_param(Some("DESC")), SortOrder::Desc);
        assert_eq!(SortOrder::from_param(Some("desc")), SortOrder::Desc);
        assert_eq!(SortOrder::from_param(Some("sideways")), SortOrder::Asc);
        assert_eq!(SortOrder::from_param(None), SortOrder::Asc);
    }

    #[test]
    fn voucher_renders_dates_and_timestamps() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        let v = Voucher {
            id: 7,
            voucher_code: "SPRING".into(),
            discount_percent: 20,
            expiry_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            created_at: ts,
            updated_at: ts,
        };
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["expiry_date"], "2024-06-30");
        assert_eq!(json["created_at"], "2024-03-01T08:30:00Z");
        let back: Voucher = serde_json::from_value(json).unwrap();
        assert_eq!(back, v);
    }
}
