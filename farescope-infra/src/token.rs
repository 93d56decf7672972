use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use farescope_core::{CoreError, CoreResult};
use serde::Deserialize;
use tokio::sync::RwLock;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Token as issued by the authorization server.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: i64,
}

#[async_trait]
pub trait CredentialExchange: Send + Sync {
    async fn exchange(&self) -> CoreResult<IssuedToken>;
}

/// OAuth2 client-credentials grant against the upstream token endpoint.
pub struct ClientCredentials {
    http: reqwest::Client,
    auth_url: String,
    client_id: String,
    client_secret: String,
}

impl ClientCredentials {
    pub fn new(
        http: reqwest::Client,
        auth_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            auth_url: auth_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

#[async_trait]
impl CredentialExchange for ClientCredentials {
    async fn exchange(&self) -> CoreResult<IssuedToken> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(&self.auth_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Token request failed: {}", e);
                CoreError::AuthenticationError("token endpoint unreachable".into())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Token request rejected with status {}", status);
            return Err(CoreError::AuthenticationError(
                "Please check your API credentials".into(),
            ));
        }

        response.json::<IssuedToken>().await.map_err(|e| {
            tracing::error!("Token response unreadable: {}", e);
            CoreError::AuthenticationError("malformed token response".into())
        })
    }
}

/// Holds at most one access token and refreshes it on demand.
///
/// Concurrent callers that all see an expired token will each run the
/// exchange; the last one to finish wins the slot.
pub struct TokenCache {
    exchange: Arc<dyn CredentialExchange>,
    clock: Arc<dyn Clock>,
    safety_margin: Duration,
    current: RwLock<Option<AccessToken>>,
}

impl TokenCache {
    pub fn new(
        exchange: Arc<dyn CredentialExchange>,
        clock: Arc<dyn Clock>,
        safety_margin_seconds: u64,
    ) -> Self {
        Self {
            exchange,
            clock,
            safety_margin: i64::try_from(safety_margin_seconds)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
            current: RwLock::new(None),
        }
    }

    /// Returns a token valid right now, exchanging credentials if needed.
    pub async fn get(&self) -> CoreResult<String> {
        if let Some(token) = self.cached().await {
            return Ok(token);
        }

        let issued = self.exchange.exchange().await?;
        let expires_at = Duration::try_seconds(issued.expires_in)
            .and_then(|ttl| self.clock.now().checked_add_signed(ttl))
            .and_then(|at| at.checked_sub_signed(self.safety_margin))
            .ok_or_else(|| {
                tracing::error!("Token lifetime out of range: {}", issued.expires_in);
                CoreError::AuthenticationError("malformed token response".into())
            })?;
        tracing::debug!("Refreshed access token, valid until {}", expires_at);

        let mut slot = self.current.write().await;
        *slot = Some(AccessToken {
            value: issued.access_token.clone(),
            expires_at,
        });
        Ok(issued.access_token)
    }

    pub async fn cached(&self) -> Option<String> {
        let now = self.clock.now();
        self.current
            .read()
            .await
            .as_ref()
            .filter(|token| token.is_valid_at(now))
            .map(|token| token.value.clone())
    }

    pub async fn invalidate(&self) {
        *self.current.write().await = None;
    }
}
