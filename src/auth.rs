//! Bearer-token seam for authenticated HTTP transports
//!
//! OAuth flows, token refresh, and credential storage are out of scope for
//! this crate; the SSE transport only needs a value to put in the
//! `Authorization` header. [`TokenSource`] is that seam: the transport asks
//! it for a token before every POST, so rotating sources stay current
//! without transport involvement.

use crate::error::Result;

/// Supplies the bearer token attached to outbound HTTP requests.
///
/// Implementations may return a static secret, read a keychain, or drive a
/// full OAuth refresh dance; the transport neither knows nor cares. Returning
/// `Ok(None)` means "send the request unauthenticated".
///
/// # Examples
///
/// ```
/// use xzmcp::auth::{StaticTokenSource, TokenSource};
///
/// # #[tokio::main]
/// # async fn main() {
/// let source = StaticTokenSource::new("s3cr3t");
/// assert_eq!(source.bearer_token().await.unwrap(), Some("s3cr3t".to_string()));
/// # }
/// ```
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync + std::fmt::Debug {
    /// The current bearer token, or `None` for unauthenticated requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be obtained (e.g. a refresh
    /// failed); the transport surfaces this to the caller of `send`.
    async fn bearer_token(&self) -> Result<Option<String>>;
}

/// A [`TokenSource`] that always returns the same token.
#[derive(Clone)]
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    /// Wrap a fixed token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The token itself stays out of debug output.
        f.debug_struct("StaticTokenSource").finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl TokenSource for StaticTokenSource {
    async fn bearer_token(&self) -> Result<Option<String>> {
        Ok(Some(self.token.clone()))
    }
}
