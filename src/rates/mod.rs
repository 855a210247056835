//! Exchange rates fetched from upstream providers and their aggregation.

mod aggregator;
mod source;

use std::fmt;

use futures::future::BoxFuture;

pub use self::{aggregator::RateAggregator, source::HttpRateSource};

/// A provider of a single exchange rate.
pub trait RateSource: Send + Sync {
    /// The identity that tags every [`Rate`] this source produces.
    fn name(&self) -> &str;

    fn fetch(&self) -> BoxFuture<'_, Result<Rate, Error>>;
}

/// A positive unit-price ratio reported by one source.
#[derive(Clone, Debug, PartialEq)]
pub struct Rate {
    provider: String,
    value: f64,
}

impl Rate {
    pub fn new(provider: impl Into<String>, value: f64) -> Result<Self, Error> {
        let provider = provider.into();
        if value.is_finite() && value > 0.0 {
            Ok(Self { provider, value })
        } else {
            Err(Error::Parse {
                reason: format!("rate {} is not a positive number", value),
                provider,
            })
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// The product of two rates retrieved from distinct sources.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregatedRate {
    providers: [String; 2],
    value: f64,
}

impl AggregatedRate {
    pub(crate) fn combine(first: Rate, second: Rate) -> Self {
        debug_assert_ne!(first.provider, second.provider);
        Self {
            value: first.value * second.value,
            providers: [first.provider, second.provider],
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn providers(&self) -> &[String; 2] {
        &self.providers
    }
}

impl fmt::Display for AggregatedRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[derive(Debug)]
pub enum Error {
    /// The upstream could not be reached or answered with a non-success status.
    Transport {
        provider: String,
        error: reqwest::Error,
    },
    /// The upstream body was not the expected shape.
    Parse { provider: String, reason: String },
    /// The rates mapping did not contain the requested code.
    MissingField { provider: String, field: String },
    /// A fetch stopped before reporting any result.
    Interrupted,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { provider, .. } => write!(f, "failed to fetch rate from {}", provider),
            Self::Parse { provider, reason } => {
                write!(f, "unexpected response from {}: {}", provider, reason)
            }
            Self::MissingField { provider, field } => {
                write!(f, "rate {} not found in response from {}", field, provider)
            }
            Self::Interrupted => write!(f, "rate fetch stopped before producing a result"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport { error, .. } => Some(error),
            _ => None,
        }
    }
}
