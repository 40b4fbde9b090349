use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
};

use models::voucher::{self, Column, Entity};

use crate::errors::StoreError;
use crate::voucher::domain::{ListParams, NewVoucher, SortColumn, SortOrder, Voucher};
use crate::voucher::repository::VoucherRepository;

pub struct SeaOrmVoucherRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmVoucherRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

fn code_lower_eq(code: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col(Column::VoucherCode))).eq(code.trim().to_lowercase())
}

fn filtered(params: &ListParams) -> Select<Entity> {
    let mut query = Entity::find();
    let search = params.search.trim();
    if !search.is_empty() {
        let pattern = format!("%{}%", search.to_lowercase());
        query = query.filter(Expr::expr(Func::lower(Expr::col(Column::VoucherCode))).like(pattern));
    }
    query
}

fn sort_column(col: SortColumn) -> Column {
    match col {
        SortColumn::ExpiryDate => Column::ExpiryDate,
        SortColumn::DiscountPercent => Column::DiscountPercent,
    }
}

#[async_trait::async_trait]
impl VoucherRepository for SeaOrmVoucherRepository {
    async fn list(&self, params: &ListParams) -> Result<(Vec<Voucher>, u64), StoreError> {
        let order = match params.order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };
        let rows = filtered(params)
            .order_by(sort_column(params.sort_by), order)
            .order_by(Column::Id, Order::Asc)
            .limit(params.limit.max(0) as u64)
            .offset(params.offset.max(0) as u64)
            .all(&self.db)
            .await?;
        let total = filtered(params).count(&self.db).await?;
        Ok((rows.into_iter().map(Voucher::from).collect(), total))
    }

    async fn get_by_id(&self, id: i64) -> Result<Voucher, StoreError> {
        Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Voucher::from)
            .ok_or(StoreError::NotFound)
    }

    // Timestamps are left to the column defaults and read back via RETURNING
    async fn create(&self, input: NewVoucher) -> Result<Voucher, StoreError> {
        let created = voucher::ActiveModel {
            voucher_code: Set(input.voucher_code),
            discount_percent: Set(input.discount_percent),
            expiry_date: Set(input.expiry_date),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(created.into())
    }

    async fn update(&self, id: i64, input: NewVoucher) -> Result<Voucher, StoreError> {
        let mut rows = Entity::update_many()
            .col_expr(Column::VoucherCode, Expr::value(input.voucher_code))
            .col_expr(Column::DiscountPercent, Expr::value(input.discount_percent))
            .col_expr(Column::ExpiryDate, Expr::value(input.expiry_date))
            .col_expr(Column::UpdatedAt, Expr::current_timestamp().into())
            .filter(Column::Id.eq(id))
            .exec_with_returning(&self.db)
            .await?;
        rows.pop().map(Voucher::from).ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let res = Entity::delete_by_id(id).exec(&self.db).await?;
        if res.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn exists_by_code(&self, code: &str, exclude_id: Option<i64>) -> Result<bool, StoreError> {
        let mut query = Entity::find().filter(code_lower_eq(code));
        if let Some(id) = exclude_id {
            query = query.filter(Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    async fn get_all(&self) -> Result<Vec<Voucher>, StoreError> {
        let rows = Entity::find().order_by_asc(Column::Id).all(&self.db).await?;
        Ok(rows.into_iter().map(Voucher::from).collect())
    }
}
