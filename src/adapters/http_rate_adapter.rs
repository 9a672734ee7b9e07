//! Live exchange rates over HTTP.
//!
//! Expects a Frankfurter-style response: `{"base": "USD", "rates": {"EUR": 0.92, ...}}`.

use crate::domain::error::TradelensError;
use crate::ports::rate_port::RateSource;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_RATES_URL: &str = "https://api.frankfurter.app/latest";

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: BTreeMap<String, f64>,
}

pub struct HttpRateAdapter {
    client: Client,
    url: String,
}

impl HttpRateAdapter {
    pub fn new(url: impl Into<String>) -> Result<Self, TradelensError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TradelensError::RateFetch {
                reason: format!("failed to build http client: {e}"),
            })?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl RateSource for HttpRateAdapter {
    fn fetch_quotes(
        &self,
        base: &str,
        symbols: &[&str],
    ) -> Result<BTreeMap<String, f64>, TradelensError> {
        info!(url = %self.url, base, "fetching exchange rates");

        let to = symbols.join(",");
        let response = self
            .client
            .get(&self.url)
            .query(&[("from", base), ("to", to.as_str())])
            .send()
            .map_err(|e| TradelensError::RateFetch {
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(TradelensError::RateFetch {
                reason: format!("rate source returned status {}", response.status()),
            });
        }

        let body: LatestRatesResponse = response.json().map_err(|e| TradelensError::RateFetch {
            reason: format!("unreadable rate response: {e}"),
        })?;

        Ok(body
            .rates
            .into_iter()
            .filter(|(code, _)| symbols.contains(&code.as_str()))
            .collect())
    }
}
