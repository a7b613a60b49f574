//! API client for the remote conversion rate service.
//!
//! This module provides the `ApiClient` struct for fetching the currency
//! list and pairwise conversion rates, and the `RateService` trait the
//! sync coordinator depends on.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::models::{CountriesResponse, ConversionRate, ConvertResponse, Currency};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Default base URL for the rate service.
pub const DEFAULT_API_URL: &str = "https://free.currencyconverterapi.com";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Network boundary for currency metadata and conversion rates.
///
/// The coordinator holds this as a trait object so tests can substitute
/// a double for the real client.
#[async_trait]
pub trait RateService: Send + Sync {
    /// Fetch the full currency list.
    async fn fetch_currencies(&self) -> Result<Vec<Currency>>;

    /// Fetch the conversion rate for one directional pair identifier.
    async fn fetch_rate(&self, pair_id: &str) -> Result<ConversionRate>;
}

/// Rate service client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client against the given base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path_and_query);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ApiError::Network)
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body).into());
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }
}

#[async_trait]
impl RateService for ApiClient {
    async fn fetch_currencies(&self) -> Result<Vec<Currency>> {
        debug!("Fetching currency list");
        let response: CountriesResponse = self.get("/api/v5/countries").await?;
        Ok(response.into_currencies())
    }

    async fn fetch_rate(&self, pair_id: &str) -> Result<ConversionRate> {
        debug!(pair = pair_id, "Fetching conversion rate");
        let mut response: ConvertResponse =
            self.get(&format!("/api/v5/convert?q={}", pair_id)).await?;

        response.results.remove(pair_id).ok_or_else(|| {
            ApiError::InvalidResponse(format!("no result for pair {}", pair_id)).into()
        })
    }
}
