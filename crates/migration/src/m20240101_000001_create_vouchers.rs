//! Create `vouchers` table.
//!
//! Discount percent is constrained to 1..=100 at the database level as well.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vouchers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Vouchers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(string_len(Vouchers::VoucherCode, 255).not_null())
                    .col(
                        integer(Vouchers::DiscountPercent)
                            .not_null()
                            .check(Expr::col(Vouchers::DiscountPercent).between(1, 100)),
                    )
                    .col(date(Vouchers::ExpiryDate).not_null())
                    .col(
                        timestamp_with_time_zone(Vouchers::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Vouchers::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Vouchers::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Vouchers { Table, Id, VoucherCode, DiscountPercent, ExpiryDate, CreatedAt, UpdatedAt }
