use std::sync::Arc;

use service::auth::TokenAuth;
use service::voucher::{repository::VoucherRepository, VoucherService};

/// Shared handler state. Everything inside is immutable after startup.
#[derive(Clone)]
pub struct ServerState {
    pub vouchers: Arc<VoucherService<dyn VoucherRepository>>,
    pub auth: Arc<TokenAuth>,
}

impl ServerState {
    pub fn new(vouchers: VoucherService<dyn VoucherRepository>, auth: TokenAuth) -> Self {
        Self { vouchers: Arc::new(vouchers), auth: Arc::new(auth) }
    }
}
