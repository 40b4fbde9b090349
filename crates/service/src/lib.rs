//! Service layer providing the voucher business rules on top of models.
//! - Separates business logic from data access behind `VoucherRepository`.
//! - Reuses field validation and entity definitions from the `models` crate.
//! - Translates store failures into a small set of service error kinds.

pub mod errors;
pub mod auth;
pub mod pagination;
pub mod voucher;
#[cfg(test)]
pub mod test_support;
