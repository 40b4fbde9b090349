use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Codes are unique regardless of letter case; the query builder has no
        // expression-index support so this one is raw SQL.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS uniq_vouchers_code_lower ON vouchers (LOWER(voucher_code))",
            )
            .await?;

        // Default list ordering
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_vouchers_expiry_date")
                    .table(Vouchers::Table)
                    .col(Vouchers::ExpiryDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().if_exists().name("idx_vouchers_expiry_date").table(Vouchers::Table).to_owned())
            .await?;
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS uniq_vouchers_code_lower")
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Vouchers { Table, ExpiryDate }
