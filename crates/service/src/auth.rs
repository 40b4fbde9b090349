//! Shared-secret bearer token check.
//!
//! There is a single configured token. `/login` hands it out to anyone who
//! supplies an email and a password; every protected route compares against it.
use tracing::{debug, info};

use crate::errors::ServiceError;

#[derive(Clone)]
pub struct TokenAuth {
    token: String,
}

impl std::fmt::Debug for TokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuth").field("token", &"<redacted>").finish()
    }
}

impl TokenAuth {
    pub fn new(token: impl Into<String>) -> Self { Self { token: token.into() } }

    /// Returns the configured token when both fields are present.
    ///
    /// # Examples
    /// ```
    /// use service::auth::TokenAuth;
    /// let auth = TokenAuth::new("s3cret");
    /// assert_eq!(auth.login("a@b.c", "pw").unwrap(), "s3cret");
    /// assert!(auth.login("", "pw").is_err());
    /// ```
    pub fn login(&self, email: &str, password: &str) -> Result<String, ServiceError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ServiceError::Validation("invalid request payload".into()));
        }
        info!(email = %email.trim(), "login_token_issued");
        Ok(self.token.clone())
    }

    /// Constant-time comparison against the configured secret.
    pub fn validate(&self, presented: &str) -> bool {
        let ok = constant_time_compare(presented, &self.token);
        if !ok {
            debug!("bearer_token_mismatch");
        }
        ok
    }
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
