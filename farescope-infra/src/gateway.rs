use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use farescope_core::{
    CoreError, CoreResult, FlightProvider, FlightSearchRequest, FlightSearchResponse, Location,
    LocationQuery,
};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::app_config::UpstreamConfig;
use crate::token::{ClientCredentials, SystemClock, TokenCache};

const LOCATION_SUB_TYPES: &str = "AIRPORT,CITY";

/// Error body the upstream API returns on non-2xx responses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocationPage {
    #[serde(default)]
    data: Vec<Location>,
}

#[derive(Debug)]
enum UpstreamFailure {
    Token(CoreError),
    Unauthorized,
    Status {
        status: StatusCode,
        detail: Option<String>,
    },
    Transport(reqwest::Error),
}

/// Authenticated client for the upstream flight-offers and locations APIs.
pub struct UpstreamGateway {
    http: reqwest::Client,
    tokens: Arc<TokenCache>,
    flights_url: String,
    locations_url: String,
    search_timeout: Duration,
    location_timeout: Duration,
    location_page_limit: u32,
}

impl UpstreamGateway {
    pub fn new(http: reqwest::Client, config: &UpstreamConfig, tokens: Arc<TokenCache>) -> Self {
        Self {
            http,
            tokens,
            flights_url: config.flights_url.clone(),
            locations_url: config.locations_url.clone(),
            search_timeout: Duration::from_secs(config.search_timeout_seconds),
            location_timeout: Duration::from_secs(config.location_timeout_seconds),
            location_page_limit: config.location_page_limit,
        }
    }

    /// Wires the client-credentials exchange and a wall-clock token cache.
    pub fn from_config(config: &UpstreamConfig) -> Self {
        let http = reqwest::Client::new();
        let exchange = ClientCredentials::new(
            http.clone(),
            config.auth_url.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
        );
        let tokens = TokenCache::new(
            Arc::new(exchange),
            Arc::new(SystemClock),
            config.token_safety_margin_seconds,
        );
        Self::new(http, config, Arc::new(tokens))
    }

    /// GET with a bearer token. A 401 drops the cached token and the request
    /// is replayed once with a fresh one.
    async fn authorized_get(
        &self,
        url: &str,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Result<reqwest::Response, UpstreamFailure> {
        let mut retried = false;
        loop {
            let token = self.tokens.get().await.map_err(UpstreamFailure::Token)?;
            let response = self
                .http
                .get(url)
                .bearer_auth(&token)
                .query(params)
                .timeout(timeout)
                .send()
                .await
                .map_err(UpstreamFailure::Transport)?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED {
                self.tokens.invalidate().await;
                if retried {
                    tracing::warn!("Upstream rejected a freshly issued token");
                    return Err(UpstreamFailure::Unauthorized);
                }
                tracing::info!("Upstream returned 401, retrying with a new token");
                retried = true;
                continue;
            }

            if !status.is_success() {
                let body = response.json::<ErrorBody>().await.unwrap_or_default();
                let detail = body.errors.into_iter().find_map(|e| e.detail);
                return Err(UpstreamFailure::Status { status, detail });
            }

            return Ok(response);
        }
    }
}

#[async_trait]
impl FlightProvider for UpstreamGateway {
    async fn search_flights(&self, request: &FlightSearchRequest) -> CoreResult<FlightSearchResponse> {
        tracing::info!(
            "Searching flights {} -> {} on {}",
            request.origin(),
            request.destination(),
            request.departure_date()
        );

        let params = request.upstream_params();
        let response = self
            .authorized_get(&self.flights_url, &params, self.search_timeout)
            .await
            .map_err(|failure| match failure {
                UpstreamFailure::Token(e) => e,
                UpstreamFailure::Unauthorized => {
                    CoreError::AuthenticationError("upstream rejected credentials".into())
                }
                UpstreamFailure::Status { status, detail } if status == StatusCode::BAD_REQUEST => {
                    tracing::warn!("Flight search rejected: {:?}", detail);
                    CoreError::InvalidSearchError(
                        detail.unwrap_or_else(|| "Invalid search parameters".into()),
                    )
                }
                UpstreamFailure::Status { status, detail } => {
                    tracing::error!(status = status.as_u16(), "Flight search failed");
                    CoreError::SearchFailedError(
                        detail.unwrap_or_else(|| "Failed to search flights".into()),
                    )
                }
                UpstreamFailure::Transport(e) if e.is_timeout() => {
                    tracing::error!("Flight search timed out: {}", e);
                    CoreError::SearchFailedError("Flight search timed out".into())
                }
                UpstreamFailure::Transport(e) => {
                    tracing::error!("Flight search transport error: {}", e);
                    CoreError::SearchFailedError("Failed to search flights".into())
                }
            })?;

        let results = response.json::<FlightSearchResponse>().await.map_err(|e| {
            if e.is_timeout() {
                tracing::error!("Flight search timed out reading body: {}", e);
                return CoreError::SearchFailedError("Flight search timed out".into());
            }
            tracing::error!("Flight search response unreadable: {}", e);
            CoreError::SearchFailedError("Unexpected response from flight search".into())
        })?;

        tracing::info!(count = results.data.len(), "Flight search returned offers");
        Ok(results)
    }

    async fn search_locations(&self, query: &LocationQuery) -> CoreResult<Vec<Location>> {
        let params = [
            ("keyword", query.keyword().to_string()),
            ("subType", LOCATION_SUB_TYPES.to_string()),
            ("page[limit]", self.location_page_limit.to_string()),
        ];

        let response = match self
            .authorized_get(&self.locations_url, &params, self.location_timeout)
            .await
        {
            Ok(response) => response,
            Err(UpstreamFailure::Token(e)) => return Err(e),
            Err(UpstreamFailure::Unauthorized) => {
                return Err(CoreError::AuthenticationError(
                    "upstream rejected credentials".into(),
                ))
            }
            Err(UpstreamFailure::Status { status, .. }) => {
                tracing::warn!(status = status.as_u16(), "Location lookup failed");
                return Ok(Vec::new());
            }
            Err(UpstreamFailure::Transport(e)) => {
                tracing::warn!("Location lookup transport error: {}", e);
                return Ok(Vec::new());
            }
        };

        match response.json::<LocationPage>().await {
            Ok(page) => {
                tracing::debug!(keyword = query.keyword(), count = page.data.len(), "Location lookup matched");
                Ok(page.data)
            }
            Err(e) => {
                tracing::warn!("Location response unreadable: {}", e);
                Ok(Vec::new())
            }
        }
    }
}
