//! Migrator for the voucher schema.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_vouchers;
mod m20240101_000002_add_voucher_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_vouchers::Migration),
            // Indexes should always be applied last
            Box::new(m20240101_000002_add_voucher_indexes::Migration),
        ]
    }
}
