//! Bearer credential attachment
//!
//! Acquiring and refreshing tokens happens outside this crate. The client only
//! needs something that can stamp a credential onto each outgoing request.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::RequestBuilder;
use tokio::sync::RwLock;

/// Refresh is suggested once less than this many seconds remain
const REFRESH_MARGIN_SECS: i64 = 300;

/// Attaches credentials to every catalog request
#[async_trait]
pub trait RequestAuthorizer: Send + Sync {
    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder;
}

#[derive(Clone)]
pub struct BearerToken {
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl BearerToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Token that expires `lifetime` from now, the shape issuers usually report
    pub fn expiring_in(access_token: impl Into<String>, lifetime: Duration) -> Self {
        Self::new(access_token).with_expiry(Utc::now() + lifetime)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| exp <= Utc::now())
    }

    pub fn needs_refresh(&self) -> bool {
        if let Some(exp) = self.expires_at {
            let remaining = exp - Utc::now();
            remaining.num_seconds() < REFRESH_MARGIN_SECS
        } else {
            false
        }
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[async_trait]
impl RequestAuthorizer for BearerToken {
    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if self.is_expired() {
            // Still sent; the catalog answers 401 and the caller re-authenticates.
            tracing::warn!(expires_at = ?self.expires_at, "Attaching expired access token");
        }
        request.bearer_auth(&self.access_token)
    }
}

/// Token that an external refresher can replace while clients hold it
#[derive(Clone, Debug)]
pub struct SharedToken {
    inner: Arc<RwLock<BearerToken>>,
}

impl SharedToken {
    pub fn new(token: BearerToken) -> Self {
        Self {
            inner: Arc::new(RwLock::new(token)),
        }
    }

    pub async fn replace(&self, token: BearerToken) {
        *self.inner.write().await = token;
        tracing::info!("Access token replaced");
    }

    pub async fn needs_refresh(&self) -> bool {
        self.inner.read().await.needs_refresh()
    }

    pub async fn current(&self) -> BearerToken {
        self.inner.read().await.clone()
    }
}

#[async_trait]
impl RequestAuthorizer for SharedToken {
    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.inner.read().await;
        token.authorize(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_without_expiry_never_needs_refresh() {
        let token = BearerToken::new("abc");
        assert!(!token.needs_refresh());
        assert!(!token.is_expired());
    }

    #[test]
    fn token_close_to_expiry_needs_refresh() {
        let token = BearerToken::expiring_in("abc", Duration::seconds(120));
        assert!(token.needs_refresh());
        assert!(!token.is_expired());

        let fresh = BearerToken::expiring_in("abc", Duration::seconds(3600));
        assert!(!fresh.needs_refresh());
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let token = BearerToken::new("super-secret");
        assert!(!format!("{:?}", token).contains("super-secret"));
    }

    #[tokio::test]
    async fn shared_token_is_replaced_in_place() {
        let shared = SharedToken::new(BearerToken::expiring_in("old", Duration::seconds(10)));
        let held = shared.clone();
        assert!(held.needs_refresh().await);

        shared
            .replace(BearerToken::expiring_in("new", Duration::seconds(3600)))
            .await;
        assert!(!held.needs_refresh().await);
        assert!(held.current().await.expires_at().is_some());
    }

    #[tokio::test]
    async fn authorize_sets_bearer_header() {
        let client = reqwest::Client::new();
        let request = BearerToken::new("abc")
            .authorize(client.get("http://localhost/v1/me"))
            .await
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get(reqwest::header::AUTHORIZATION).unwrap(),
            "Bearer abc"
        );
    }
}
