//! Voucher lifecycle: domain types, repository seam, CSV codec and the service
//! that ties validation, uniqueness and pagination together.

pub mod codec;
pub mod domain;
pub mod repo;
pub mod repository;
pub mod service;

pub use service::VoucherService;
