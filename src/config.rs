use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use reqwest::Url;

const DEFAULT_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_SUBSCRIBERS_FILE: &str = "subscribers.txt";
const DEFAULT_ABSTRACT_API_URL: &str = "https://exchange-rates.abstractapi.com";
const DEFAULT_EXCHANGE_RATES_API_URL: &str = "http://api.exchangeratesapi.io";
const DEFAULT_EMAIL_API_URL: &str = "https://gmail.googleapis.com";
const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_EMAIL_SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Config {
    pub address: SocketAddr,
    pub subscribers_file: PathBuf,
    pub abstract_api_url: Url,
    pub abstract_api_key: String,
    pub exchange_rates_api_url: Url,
    pub exchange_rates_api_key: String,
    pub email_api_url: Url,
    pub email_access_token: String,
    pub upstream_timeout: Duration,
    pub email_send_timeout: Duration,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Collects configuration from code and the environment.
///
/// Environment variables are named after the fields, upper-cased (e.g. `ABSTRACT_API_KEY`).
#[derive(Default, serde::Deserialize)]
#[serde(default)]
pub struct ConfigBuilder {
    #[serde(deserialize_with = "ip_addr_from_str")]
    address: Option<IpAddr>,
    port: Option<u16>,
    subscribers_file: Option<PathBuf>,
    #[serde(deserialize_with = "url_from_str")]
    abstract_api_url: Option<Url>,
    abstract_api_key: Option<String>,
    #[serde(deserialize_with = "url_from_str")]
    exchange_rates_api_url: Option<Url>,
    exchange_rates_api_key: Option<String>,
    #[serde(deserialize_with = "url_from_str")]
    email_api_url: Option<Url>,
    #[serde(rename = "access_token")]
    email_access_token: Option<String>,
    upstream_timeout_ms: Option<u64>,
    email_send_timeout_ms: Option<u64>,
}

impl ConfigBuilder {
    pub fn address(mut self, address: SocketAddr) -> Self {
        self.address = Some(address.ip());
        self.port = Some(address.port());
        self
    }

    pub fn subscribers_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.subscribers_file = Some(path.into());
        self
    }

    pub fn abstract_api(mut self, url: Url, api_key: impl Into<String>) -> Self {
        self.abstract_api_url = Some(url);
        self.abstract_api_key = Some(api_key.into());
        self
    }

    pub fn exchange_rates_api(mut self, url: Url, access_key: impl Into<String>) -> Self {
        self.exchange_rates_api_url = Some(url);
        self.exchange_rates_api_key = Some(access_key.into());
        self
    }

    pub fn email_api(mut self, url: Url, access_token: impl Into<String>) -> Self {
        self.email_api_url = Some(url);
        self.email_access_token = Some(access_token.into());
        self
    }

    pub fn upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout_ms = Some(duration_ms(timeout));
        self
    }

    pub fn email_send_timeout(mut self, timeout: Duration) -> Self {
        self.email_send_timeout_ms = Some(duration_ms(timeout));
        self
    }

    /// Overrides values with any that are set in the environment.
    pub fn merge_env(self) -> Result<Self, envy::Error> {
        let env: Self = envy::from_env()?;
        Ok(self.merge(env))
    }

    fn merge(self, other: Self) -> Self {
        Self {
            address: other.address.or(self.address),
            port: other.port.or(self.port),
            subscribers_file: other.subscribers_file.or(self.subscribers_file),
            abstract_api_url: other.abstract_api_url.or(self.abstract_api_url),
            abstract_api_key: other.abstract_api_key.or(self.abstract_api_key),
            exchange_rates_api_url: other.exchange_rates_api_url.or(self.exchange_rates_api_url),
            exchange_rates_api_key: other.exchange_rates_api_key.or(self.exchange_rates_api_key),
            email_api_url: other.email_api_url.or(self.email_api_url),
            email_access_token: other.email_access_token.or(self.email_access_token),
            upstream_timeout_ms: other.upstream_timeout_ms.or(self.upstream_timeout_ms),
            email_send_timeout_ms: other.email_send_timeout_ms.or(self.email_send_timeout_ms),
        }
    }

    pub fn build(self) -> Result<Config, Error> {
        Ok(Config {
            address: SocketAddr::from((
                self.address.unwrap_or(DEFAULT_ADDRESS),
                self.port.unwrap_or(DEFAULT_PORT),
            )),
            subscribers_file: self
                .subscribers_file
                .unwrap_or_else(|| DEFAULT_SUBSCRIBERS_FILE.into()),
            abstract_api_url: or_default_url(self.abstract_api_url, DEFAULT_ABSTRACT_API_URL)?,
            abstract_api_key: required(self.abstract_api_key, "ABSTRACT_API_KEY")?,
            exchange_rates_api_url: or_default_url(
                self.exchange_rates_api_url,
                DEFAULT_EXCHANGE_RATES_API_URL,
            )?,
            exchange_rates_api_key: required(
                self.exchange_rates_api_key,
                "EXCHANGE_RATES_API_KEY",
            )?,
            email_api_url: or_default_url(self.email_api_url, DEFAULT_EMAIL_API_URL)?,
            email_access_token: required(self.email_access_token, "ACCESS_TOKEN")?,
            upstream_timeout: self
                .upstream_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT),
            email_send_timeout: self
                .email_send_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_EMAIL_SEND_TIMEOUT),
        })
    }
}

#[derive(Debug)]
pub enum Error {
    Missing(&'static str),
    InvalidUrl(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(variable) => write!(f, "{} must be set", variable),
            Self::InvalidUrl(error) => write!(f, "invalid URL: {}", error),
        }
    }
}

impl std::error::Error for Error {}

fn required(value: Option<String>, variable: &'static str) -> Result<String, Error> {
    value
        .filter(|value| !value.is_empty())
        .ok_or(Error::Missing(variable))
}

fn or_default_url(url: Option<Url>, default: &str) -> Result<Url, Error> {
    match url {
        Some(url) => Ok(url),
        None => default
            .parse::<Url>()
            .map_err(|error| Error::InvalidUrl(error.to_string())),
    }
}

/// Appends `path` to `base`, keeping any path prefix `base` already has.
pub(crate) fn endpoint(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let prefix = base.path().trim_end_matches('/');
    url.set_path(&format!("{}/{}", prefix, path));
    url
}

fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis().try_into().unwrap_or(u64::MAX)
}

fn ip_addr_from_str<'de, D>(deserializer: D) -> Result<Option<IpAddr>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let ip_addr: Option<String> = serde::Deserialize::deserialize(deserializer)?;
    ip_addr
        .map(|ip_addr| ip_addr.parse().map_err(serde::de::Error::custom))
        .transpose()
}

fn url_from_str<'de, D>(deserializer: D) -> Result<Option<Url>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let url: Option<String> = serde::Deserialize::deserialize(deserializer)?;
    url.map(|url| url.parse().map_err(serde::de::Error::custom))
        .transpose()
}
