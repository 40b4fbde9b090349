use thiserror::Error;

/// Field rule violations for a voucher row. Display text is what clients see.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("voucher_code required")]
    EmptyCode,
    #[error("discount_percent must be integer between 1 and 100")]
    DiscountOutOfRange(i32),
    #[error("expiry_date must be YYYY-MM-DD")]
    BadExpiryDate,
}
