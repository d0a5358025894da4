use std::collections::HashMap;
use std::{fmt, time};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::domain::{CrossRate, RateSample};
use crate::utils::error_chain_fmt;

/// Source of exchange-rate samples
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetch a fresh sample. Never retries.
    async fn fetch(&self) -> Result<RateSample, RateError>;
}

/// Rate fetch error type
#[derive(thiserror::Error)]
pub enum RateError {
    #[error("Failed to reach the exchange-rate provider")]
    Fetch(#[source] reqwest::Error),
    #[error("Malformed exchange-rate payload: {0}")]
    Parse(String),
    #[error("Invalid exchange rate: {0}")]
    InvalidRate(String),
}

impl fmt::Debug for RateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Body of the `latest` endpoint, e.g. `{"data": {"MXN": 17.12}}`
#[derive(serde::Deserialize)]
struct LatestRates {
    data: HashMap<String, serde_json::Value>,
}

/// FreeCurrencyAPI client
pub struct RateClient {
    http_client: Client,
    endpoint: Url,
    api_key: SecretString,
    base_currency: String,
    quote_currency: String,
    cross_rate: CrossRate,
}

impl RateClient {
    pub fn new(
        base_url: &Url,
        api_key: SecretString,
        base_currency: String,
        quote_currency: String,
        cross_rate: CrossRate,
        timeout: time::Duration,
    ) -> anyhow::Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        let endpoint = base_url.join("/v1/latest")?;
        Ok(Self {
            http_client,
            endpoint,
            api_key,
            base_currency,
            quote_currency,
            cross_rate,
        })
    }

    /// Pull the quote currency out of the provider payload
    fn extract_quote(&self, body: &str) -> Result<f64, RateError> {
        let rates: LatestRates =
            serde_json::from_str(body).map_err(|e| RateError::Parse(e.to_string()))?;
        let value = rates.data.get(&self.quote_currency).ok_or_else(|| {
            RateError::Parse(format!("no `{}` rate in response", self.quote_currency))
        })?;
        value
            .as_f64()
            .ok_or_else(|| RateError::Parse(format!("`{value}` is not a number")))
    }
}

#[async_trait]
impl RateSource for RateClient {
    #[tracing::instrument(name = "Fetch exchange rate", skip(self))]
    async fn fetch(&self) -> Result<RateSample, RateError> {
        let body = self
            .http_client
            .get(self.endpoint.clone())
            .query(&[
                ("base_currency", self.base_currency.as_str()),
                ("currencies", self.quote_currency.as_str()),
                ("apikey", self.api_key.expose_secret()),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(RateError::Fetch)?
            .text()
            .await
            .map_err(RateError::Fetch)?;

        let quote = self.extract_quote(&body)?;
        let sample = RateSample::parse(self.cross_rate.apply(quote), Utc::now())
            .map_err(RateError::InvalidRate)?;
        tracing::info!(
            base_currency = %self.base_currency,
            quote_currency = %self.quote_currency,
            quote,
            rate = sample.value(),
            "Exchange rate fetched"
        );

        Ok(sample)
    }
}
