use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, error, info, instrument};

use models::voucher::{parse_expiry_date, validate_code, validate_discount_percent};

use super::codec::{self, RowError};
use super::domain::{
    CreateVoucherInput, CsvImportResult, ListParams, ListResponse, NewVoucher, UpdateVoucherInput, Voucher,
};
use super::repository::VoucherRepository;
use crate::errors::{ServiceError, StoreError};
use crate::pagination::{Pagination, PaginationMeta};

/// Voucher service configuration
#[derive(Clone, Debug)]
pub struct VoucherConfig {
    /// Deadline for a single operation. CSV import and export get twice this.
    pub query_timeout: Duration,
    pub csv_max_bytes: u64,
}

impl Default for VoucherConfig {
    fn default() -> Self {
        Self { query_timeout: Duration::from_secs(5), csv_max_bytes: 5 * 1024 * 1024 }
    }
}

/// Voucher business service independent of web framework
pub struct VoucherService<R: VoucherRepository + ?Sized> {
    repo: Arc<R>,
    cfg: VoucherConfig,
}

impl<R: VoucherRepository + ?Sized> VoucherService<R> {
    pub fn new(repo: Arc<R>, cfg: VoucherConfig) -> Self { Self { repo, cfg } }

    pub fn config(&self) -> &VoucherConfig { &self.cfg }

    fn csv_timeout(&self) -> Duration { self.cfg.query_timeout * 2 }

    /// Run `fut` under `limit`; an elapsed deadline drops the in-flight query.
    async fn deadline<T, F>(&self, limit: Duration, what: &'static str, fut: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        match tokio::time::timeout(limit, fut).await {
            Ok(res) => res,
            Err(_) => {
                error!(operation = what, timeout_ms = limit.as_millis() as u64, "deadline_exceeded");
                Err(ServiceError::internal(what, "deadline exceeded"))
            }
        }
    }

    fn validate(code: &str, percent: i32, expiry: &str) -> Result<NewVoucher, ServiceError> {
        let expiry_date = parse_expiry_date(expiry)
            .map_err(|_| ServiceError::Validation("expiry_date must be in YYYY-MM-DD format".into()))?;
        let voucher_code = validate_code(code)?;
        let discount_percent = validate_discount_percent(percent)?;
        Ok(NewVoucher { voucher_code, discount_percent, expiry_date })
    }

    fn check_id(id: i64) -> Result<(), ServiceError> {
        if id <= 0 {
            return Err(ServiceError::Validation("invalid voucher id".into()));
        }
        Ok(())
    }

    /// Filtered, sorted page of vouchers with pagination metadata.
    #[instrument(skip(self, params), fields(limit = params.limit, offset = params.offset))]
    pub async fn list(&self, params: ListParams) -> Result<ListResponse, ServiceError> {
        let (limit, offset) = Pagination { limit: params.limit, offset: params.offset }.normalize();
        let params = ListParams { limit: limit as i64, offset: offset as i64, ..params };

        let (data, total) = self
            .deadline(self.cfg.query_timeout, "failed to list vouchers", async {
                self.repo
                    .list(&params)
                    .await
                    .map_err(|e| ServiceError::internal("failed to list vouchers", e))
            })
            .await?;

        debug!(total, returned = data.len(), "vouchers_listed");
        Ok(ListResponse { data, pagination: PaginationMeta::new(limit, offset, total) })
    }

    /// Create a voucher after validation and a case-insensitive uniqueness check.
    ///
    /// # Examples
    /// ```
    /// use service::voucher::{VoucherService, service::VoucherConfig, repository::mock::MockVoucherRepository};
    /// use service::voucher::domain::CreateVoucherInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockVoucherRepository::default());
    /// let svc = VoucherService::new(repo, VoucherConfig::default());
    /// let input = CreateVoucherInput { voucher_code: " SAVE10 ".into(), discount_percent: 10, expiry_date: "2030-01-01".into() };
    /// let v = tokio_test::block_on(svc.create(input)).unwrap();
    /// assert_eq!(v.voucher_code, "SAVE10");
    /// ```
    #[instrument(skip(self, input), fields(code = %input.voucher_code))]
    pub async fn create(&self, input: CreateVoucherInput) -> Result<Voucher, ServiceError> {
        let new = Self::validate(&input.voucher_code, input.discount_percent, &input.expiry_date)?;

        let created = self
            .deadline(self.cfg.query_timeout, "failed to create voucher", async {
                let exists = self
                    .repo
                    .exists_by_code(&new.voucher_code, None)
                    .await
                    .map_err(|e| ServiceError::internal("failed to validate voucher code", e))?;
                if exists {
                    return Err(ServiceError::Conflict("voucher_code already exists".into()));
                }
                self.repo.create(new).await.map_err(ServiceError::from_write)
            })
            .await?;

        info!(id = created.id, code = %created.voucher_code, "voucher_created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Voucher, ServiceError> {
        Self::check_id(id)?;
        self.deadline(self.cfg.query_timeout, "failed to fetch voucher", async {
            self.repo.get_by_id(id).await.map_err(|e| match e {
                StoreError::NotFound => ServiceError::not_found("voucher"),
                other => ServiceError::internal("failed to fetch voucher", other),
            })
        })
        .await
    }

    /// Full replace of code, percent and expiry. The record's own code does not
    /// count as a conflict.
    #[instrument(skip(self, input), fields(code = %input.voucher_code))]
    pub async fn update(&self, id: i64, input: UpdateVoucherInput) -> Result<Voucher, ServiceError> {
        Self::check_id(id)?;
        let new = Self::validate(&input.voucher_code, input.discount_percent, &input.expiry_date)?;

        let updated = self
            .deadline(self.cfg.query_timeout, "failed to update voucher", async {
                let exists = self
                    .repo
                    .exists_by_code(&new.voucher_code, Some(id))
                    .await
                    .map_err(|e| ServiceError::internal("failed to validate voucher code", e))?;
                if exists {
                    return Err(ServiceError::Conflict("voucher_code already exists".into()));
                }
                self.repo.update(id, new).await.map_err(ServiceError::from_write)
            })
            .await?;

        info!(id = updated.id, code = %updated.voucher_code, "voucher_updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        Self::check_id(id)?;
        self.deadline(self.cfg.query_timeout, "failed to delete voucher", async {
            self.repo.delete(id).await.map_err(|e| match e {
                StoreError::NotFound => ServiceError::not_found("voucher"),
                other => ServiceError::internal("failed to delete voucher", other),
            })
        })
        .await?;
        info!(id, "voucher_deleted");
        Ok(())
    }

    /// Best-effort bulk import. Request-level problems (size, encoding, header)
    /// reject the whole upload; row problems are reported in the result and the
    /// import moves on. Rows already inserted stay inserted.
    ///
    /// `declared_size` is the size the caller claims before any byte is read.
    #[instrument(skip(self, reader))]
    pub async fn import_csv<Rd>(&self, declared_size: u64, reader: Rd) -> Result<CsvImportResult, ServiceError>
    where
        Rd: AsyncRead + Unpin + Send,
    {
        let max = self.cfg.csv_max_bytes;
        if declared_size > max {
            return Err(ServiceError::Validation("file size exceeds limit".into()));
        }

        let mut buf = Vec::new();
        reader
            .take(max + 1)
            .read_to_end(&mut buf)
            .await
            .map_err(|_| ServiceError::Validation("failed to read file".into()))?;
        if buf.len() as u64 > max {
            return Err(ServiceError::Validation("file size exceeds limit".into()));
        }

        let content =
            String::from_utf8(buf).map_err(|_| ServiceError::Validation("file must be UTF-8 text".into()))?;
        let content = content.trim();
        if content.is_empty() {
            return Err(ServiceError::Validation("empty file".into()));
        }

        let mut lines = content.split('\n');
        if !lines.next().is_some_and(codec::is_header) {
            return Err(ServiceError::Validation("invalid CSV header".into()));
        }
        let rows: Vec<&str> = lines.collect();

        let result = self
            .deadline(self.csv_timeout(), "failed to import vouchers", async {
                let mut result = CsvImportResult { total_rows: rows.len(), ..Default::default() };
                let mut seen: HashSet<String> = HashSet::new();

                for (idx, line) in rows.iter().enumerate() {
                    let row_no = idx + 1;
                    let row = match codec::parse_row(line, &seen) {
                        Ok(row) => row,
                        Err(reason) => {
                            result.fail(row_no, reason);
                            continue;
                        }
                    };

                    let exists = self
                        .repo
                        .exists_by_code(&row.voucher_code, None)
                        .await
                        .map_err(|e| ServiceError::internal("failed to check voucher code", e))?;
                    if exists {
                        result.fail(row_no, RowError::AlreadyExists);
                        continue;
                    }

                    let key = row.voucher_code.to_lowercase();
                    let new = NewVoucher {
                        voucher_code: row.voucher_code,
                        discount_percent: row.discount_percent,
                        expiry_date: row.expiry_date,
                    };
                    match self.repo.create(new).await {
                        Ok(_) => {
                            seen.insert(key);
                            result.success_count += 1;
                        }
                        Err(e) => {
                            error!(row = row_no, error = %e, "csv_row_insert_failed");
                            result.fail(row_no, RowError::InsertFailed);
                        }
                    }
                }
                Ok(result)
            })
            .await?;

        info!(
            total_rows = result.total_rows,
            success_count = result.success_count,
            failure_count = result.failure_count,
            "csv_import_finished"
        );
        Ok(result)
    }

    /// All vouchers as CSV text, ordered by id.
    #[instrument(skip(self))]
    pub async fn export(&self) -> Result<Vec<u8>, ServiceError> {
        let vouchers = self
            .deadline(self.csv_timeout(), "failed to export vouchers", async {
                self.repo
                    .get_all()
                    .await
                    .map_err(|e| ServiceError::internal("failed to export vouchers", e))
            })
            .await?;
        let body = codec::write_export(&vouchers).map_err(|e| ServiceError::internal("failed to export vouchers", e))?;
        info!(count = vouchers.len(), bytes = body.len(), "vouchers_exported");
        Ok(body)
    }
}
