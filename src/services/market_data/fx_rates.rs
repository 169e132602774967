use std::{collections::HashMap, str::FromStr, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Number, Value};
use thiserror::Error;
use tracing::{debug, trace};

use crate::services::{
    currencies::Currency,
    shared::env::{get_env_variable, get_env_variable_or},
};

pub const DEFAULT_API_URL: &str = "https://v6.exchangerate-api.com/v6";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum LookupFailure {
    /// Carries no URL: the API key is part of the request path.
    #[error("rate API request failed: {0}")]
    Request(reqwest::Error),
    #[error("rate API returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("rate API reported an error: {0}")]
    Api(String),
    #[error("rate API payload is malformed: {0}")]
    Malformed(String),
    #[error("no usable {target} rate for base {base}")]
    MissingRate { base: Currency, target: Currency },
}

impl LookupFailure {
    fn request(error: reqwest::Error) -> Self {
        LookupFailure::Request(error.without_url())
    }
}

/// Rates for one base currency, units of target per 1 unit of base.
#[derive(Debug, Clone)]
pub struct RateTable {
    pub base: Currency,
    pub rates: HashMap<Currency, Decimal>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl RateTable {
    pub fn rate_for(&self, target: Currency) -> Result<Decimal, LookupFailure> {
        match self.rates.get(&target) {
            Some(rate) if *rate > Decimal::ZERO => Ok(*rate),
            _ => Err(LookupFailure::MissingRate {
                base: self.base,
                target,
            }),
        }
    }
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_rates(&self, base: Currency) -> Result<RateTable, LookupFailure>;
}

#[derive(Deserialize, Debug)]
struct LatestRatesResponse {
    result: String,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    time_last_update_unix: Option<i64>,
    conversion_rates: Option<HashMap<String, Value>>,
}

pub struct ExchangeRateApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ExchangeRateApiClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(ExchangeRateApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = get_env_variable("EXCHANGERATE_API_KEY")
            .ok_or_else(|| anyhow::anyhow!("EXCHANGERATE_API_KEY is not set"))?;
        let base_url =
            get_env_variable("EXCHANGERATE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let timeout = get_env_variable_or("EXCHANGERATE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);
        Self::new(&base_url, &api_key, Duration::from_secs(timeout))
    }
}

#[async_trait]
impl RateProvider for ExchangeRateApiClient {
    async fn fetch_rates(&self, base: Currency) -> Result<RateTable, LookupFailure> {
        debug!("Fetching latest rates for {}", base);
        let res = self
            .client
            .get(format!("{}/{}/latest/{}", self.base_url, self.api_key, base))
            .send()
            .await
            .map_err(LookupFailure::request)?;

        let status = res.status();
        let body = res.text().await.map_err(LookupFailure::request)?;

        if !status.is_success() {
            return Err(LookupFailure::Status { status, body });
        }

        parse_latest_rates(base, &body)
    }
}

fn parse_latest_rates(base: Currency, body: &str) -> Result<RateTable, LookupFailure> {
    let data = serde_json::from_str::<LatestRatesResponse>(body)
        .map_err(|e| LookupFailure::Malformed(e.to_string()))?;

    if data.result != "success" {
        return Err(LookupFailure::Api(
            data.error_type.unwrap_or_else(|| data.result.clone()),
        ));
    }

    let conversion_rates = data
        .conversion_rates
        .ok_or_else(|| LookupFailure::Malformed("conversion_rates missing".to_string()))?;

    let mut rates = HashMap::new();
    for (code, value) in &conversion_rates {
        let Some(currency) = Currency::from_code(code) else {
            trace!("Ignoring unsupported currency {}", code);
            continue;
        };
        let rate = match value {
            Value::Number(number) => parse_number(number),
            _ => None,
        }
        .ok_or_else(|| {
            LookupFailure::Malformed(format!("rate for {} is not a number: {}", currency, value))
        })?;
        rates.insert(currency, rate);
    }

    Ok(RateTable {
        base,
        rates,
        updated_at: data
            .time_last_update_unix
            .and_then(|timestamp| DateTime::from_timestamp(timestamp, 0)),
    })
}

fn parse_number(number: &Number) -> Option<Decimal> {
    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}
