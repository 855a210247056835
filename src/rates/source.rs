use std::{collections::HashMap, time::Duration};

use futures::future::BoxFuture;
use reqwest::Url;

use super::{Error, Rate, RateSource};
use crate::config::endpoint;

/// A rate source backed by a JSON HTTP endpoint whose body holds a mapping from currency codes
/// to rates, e.g. `{"rates": {"UAH": 38.5}}`.
#[derive(Clone, Debug)]
pub struct HttpRateSource {
    name: &'static str,
    http_client: reqwest::Client,
    url: Url,
    rates_field: &'static str,
    code: &'static str,
    timeout: Duration,
}

impl HttpRateSource {
    /// BTC → EUR from abstractapi.com.
    pub fn abstract_api(
        http_client: reqwest::Client,
        base_url: &Url,
        api_key: &str,
        timeout: Duration,
    ) -> Self {
        let mut url = endpoint(base_url, "v1/live/");
        url.query_pairs_mut()
            .clear()
            .append_pair("api_key", api_key)
            .append_pair("base", "BTC")
            .append_pair("target", "EUR");

        Self {
            name: "abstractapi",
            http_client,
            url,
            rates_field: "exchange_rates",
            code: "EUR",
            timeout,
        }
    }

    /// EUR → UAH from exchangeratesapi.io.
    pub fn exchange_rates_api(
        http_client: reqwest::Client,
        base_url: &Url,
        access_key: &str,
        timeout: Duration,
    ) -> Self {
        let mut url = endpoint(base_url, "v1/latest");
        url.query_pairs_mut()
            .clear()
            .append_pair("access_key", access_key);

        Self {
            name: "exchangeratesapi",
            http_client,
            url,
            rates_field: "rates",
            code: "UAH",
            timeout,
        }
    }

    #[tracing::instrument(skip(self), fields(provider = self.name))]
    async fn fetch_rate(&self) -> Result<Rate, Error> {
        let transport = |error| Error::Transport {
            provider: self.name.to_string(),
            error,
        };

        let body = self
            .http_client
            .get(self.url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(transport)?
            .bytes()
            .await
            .map_err(transport)?;

        let rate = self.extract(&body)?;
        tracing::debug!(rate = rate.value(), "fetched rate");
        Ok(rate)
    }

    fn extract(&self, body: &[u8]) -> Result<Rate, Error> {
        let parse_error = |reason: String| Error::Parse {
            provider: self.name.to_string(),
            reason,
        };

        let mut body: HashMap<String, serde_json::Value> =
            serde_json::from_slice(body).map_err(|error| parse_error(error.to_string()))?;

        let rates = body
            .remove(self.rates_field)
            .ok_or_else(|| parse_error(format!("missing `{}` object", self.rates_field)))?;
        let rates: HashMap<String, f64> = serde_json::from_value(rates)
            .map_err(|error| parse_error(format!("invalid `{}`: {}", self.rates_field, error)))?;

        let value = rates.get(self.code).ok_or_else(|| Error::MissingField {
            provider: self.name.to_string(),
            field: self.code.to_string(),
        })?;

        Rate::new(self.name, *value)
    }
}

impl RateSource for HttpRateSource {
    fn name(&self) -> &str {
        self.name
    }

    fn fetch(&self) -> BoxFuture<'_, Result<Rate, Error>> {
        Box::pin(self.fetch_rate())
    }
}
