use async_trait::async_trait;

use super::domain::{ListParams, NewVoucher, Voucher};
use crate::errors::StoreError;

/// Repository abstraction for voucher persistence.
#[async_trait]
pub trait VoucherRepository: Send + Sync {
    /// Page of vouchers matching `params` plus the unpaged match count.
    async fn list(&self, params: &ListParams) -> Result<(Vec<Voucher>, u64), StoreError>;
    async fn get_by_id(&self, id: i64) -> Result<Voucher, StoreError>;
    async fn create(&self, input: NewVoucher) -> Result<Voucher, StoreError>;
    async fn update(&self, id: i64, input: NewVoucher) -> Result<Voucher, StoreError>;
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
    /// Case-insensitive code lookup, optionally ignoring one record.
    async fn exists_by_code(&self, code: &str, exclude_id: Option<i64>) -> Result<bool, StoreError>;
    /// Every voucher ordered by id ascending.
    async fn get_all(&self) -> Result<Vec<Voucher>, StoreError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use crate::voucher::domain::{SortColumn, SortOrder};
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    pub struct MockVoucherRepository {
        rows: Mutex<Vec<Voucher>>,
        next_id: Mutex<i64>,
        fail_exists: AtomicBool,
        fail_insert_for: Mutex<Option<String>>,
        race_insert: AtomicBool,
        delay: Mutex<Option<Duration>>,
        calls: AtomicUsize,
    }

    impl MockVoucherRepository {
        /// Make every `exists_by_code` call fail with a database error.
        pub fn fail_exists_checks(&self) { self.fail_exists.store(true, Ordering::SeqCst); }

        /// Make inserts of this code (case-insensitive) fail with a database error.
        pub fn fail_insert_of(&self, code: &str) {
            *self.fail_insert_for.lock().unwrap() = Some(code.to_lowercase());
        }

        /// Skip the unique check in `exists_by_code` so inserts hit the store constraint.
        pub fn simulate_insert_race(&self) { self.race_insert.store(true, Ordering::SeqCst); }

        /// Sleep before answering any call.
        pub fn set_delay(&self, delay: Duration) { *self.delay.lock().unwrap() = Some(delay); }

        /// Number of repository calls so far.
        pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

        pub fn len(&self) -> usize { self.rows.lock().unwrap().len() }

        pub fn is_empty(&self) -> bool { self.len() == 0 }

        async fn enter(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = *self.delay.lock().unwrap();
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
        }

        fn code_taken(rows: &[Voucher], code: &str, exclude_id: Option<i64>) -> bool {
            rows.iter().any(|v| v.voucher_code.eq_ignore_ascii_case(code) && Some(v.id) != exclude_id)
        }
    }

    #[async_trait]
    impl VoucherRepository for MockVoucherRepository {
        async fn list(&self, params: &ListParams) -> Result<(Vec<Voucher>, u64), StoreError> {
            self.enter().await;
            let needle = params.search.to_lowercase();
            let mut matched: Vec<Voucher> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|v| needle.is_empty() || v.voucher_code.to_lowercase().contains(&needle))
                .cloned()
                .collect();
            matched.sort_by(|a, b| {
                let primary = match params.sort_by {
                    SortColumn::ExpiryDate => a.expiry_date.cmp(&b.expiry_date),
                    SortColumn::DiscountPercent => a.discount_percent.cmp(&b.discount_percent),
                };
                let primary = match params.order {
                    SortOrder::Asc => primary,
                    SortOrder::Desc => primary.reverse(),
                };
                primary.then(a.id.cmp(&b.id))
            });
            let total = matched.len() as u64;
            let page = matched
                .into_iter()
                .skip(params.offset.max(0) as usize)
                .take(params.limit.max(0) as usize)
                .collect();
            Ok((page, total))
        }

        async fn get_by_id(&self, id: i64) -> Result<Voucher, StoreError> {
            self.enter().await;
            let rows = self.rows.lock().unwrap();
            rows.iter().find(|v| v.id == id).cloned().ok_or(StoreError::NotFound)
        }

        async fn create(&self, input: NewVoucher) -> Result<Voucher, StoreError> {
            self.enter().await;
            if self.fail_insert_for.lock().unwrap().as_deref() == Some(input.voucher_code.to_lowercase().as_str()) {
                return Err(StoreError::Database("insert failed".into()));
            }
            let mut rows = self.rows.lock().unwrap();
            if Self::code_taken(&rows, &input.voucher_code, None) {
                return Err(StoreError::UniqueViolation("uniq_vouchers_code_lower".into()));
            }
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            let now = Utc::now();
            let v = Voucher {
                id: *next_id,
                voucher_code: input.voucher_code,
                discount_percent: input.discount_percent,
                expiry_date: input.expiry_date,
                created_at: now,
                updated_at: now,
            };
            rows.push(v.clone());
            Ok(v)
        }

        async fn update(&self, id: i64, input: NewVoucher) -> Result<Voucher, StoreError> {
            self.enter().await;
            let mut rows = self.rows.lock().unwrap();
            if Self::code_taken(&rows, &input.voucher_code, Some(id)) {
                return Err(StoreError::UniqueViolation("uniq_vouchers_code_lower".into()));
            }
            let v = rows.iter_mut().find(|v| v.id == id).ok_or(StoreError::NotFound)?;
            v.voucher_code = input.voucher_code;
            v.discount_percent = input.discount_percent;
            v.expiry_date = input.expiry_date;
            v.updated_at = Utc::now();
            Ok(v.clone())
        }

        async fn delete(&self, id: i64) -> Result<(), StoreError> {
            self.enter().await;
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|v| v.id != id);
            if rows.len() == before {
                return Err(StoreError::NotFound);
            }
            Ok(())
        }

        async fn exists_by_code(&self, code: &str, exclude_id: Option<i64>) -> Result<bool, StoreError> {
            self.enter().await;
            if self.fail_exists.load(Ordering::SeqCst) {
                return Err(StoreError::Database("connection refused".into()));
            }
            if self.race_insert.load(Ordering::SeqCst) {
                return Ok(false);
            }
            let rows = self.rows.lock().unwrap();
            Ok(Self::code_taken(&rows, code, exclude_id))
        }

        async fn get_all(&self) -> Result<Vec<Voucher>, StoreError> {
            self.enter().await;
            let mut all = self.rows.lock().unwrap().clone();
            all.sort_by_key(|v| v.id);
            Ok(all)
        }
    }
}
