//! Chain client configuration.
//!
//! Everything the [`ChainClient`](crate::ChainClient) needs besides its
//! signing key: the node URL, extra request headers, and the gas and
//! receipt-polling policy. Defaults match the values the registry
//! deployments have always been driven with. Override via environment
//! variables or explicit construction.

use std::time::Duration;

use url::Url;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default multiplier applied to the node's gas estimate.
pub const DEFAULT_GAS_LIMIT_MULTIPLIER: f64 = 2.0;
/// Default interval between receipt polls.
pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Default number of receipt polls before giving up.
pub const DEFAULT_RECEIPT_POLL_ATTEMPTS: u32 = 30;

/// Configuration for connecting to a chain node.
///
/// Custom `Debug` implementation redacts header values, which commonly
/// carry bearer tokens for hosted RPC providers.
#[derive(Clone)]
pub struct ChainConfig {
    /// JSON-RPC endpoint of the node.
    pub node_url: Url,
    /// Extra headers sent with every request (e.g. `Authorization`).
    pub headers: Vec<(String, String)>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Gas limit = round(estimate * multiplier).
    pub gas_limit_multiplier: f64,
    /// Gas price in wei. Zero on permissioned networks.
    pub gas_price: u128,
    /// EIP-155 chain id. `None` signs pre-EIP-155 transactions.
    pub chain_id: Option<u64>,
    /// Delay before each receipt poll.
    pub receipt_poll_interval: Duration,
    /// Number of receipt polls before [`ChainError::ReceiptTimeout`](crate::ChainError::ReceiptTimeout).
    pub receipt_poll_attempts: u32,
}

impl std::fmt::Debug for ChainConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header_names: Vec<&str> = self.headers.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("ChainConfig")
            .field("node_url", &self.node_url)
            .field("headers", &header_names)
            .field("timeout_secs", &self.timeout_secs)
            .field("gas_limit_multiplier", &self.gas_limit_multiplier)
            .field("gas_price", &self.gas_price)
            .field("chain_id", &self.chain_id)
            .field("receipt_poll_interval", &self.receipt_poll_interval)
            .field("receipt_poll_attempts", &self.receipt_poll_attempts)
            .finish()
    }
}

impl ChainConfig {
    /// Configuration with defaults for everything except the node URL.
    pub fn new(node_url: Url) -> Self {
        Self {
            node_url,
            headers: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            gas_limit_multiplier: DEFAULT_GAS_LIMIT_MULTIPLIER,
            gas_price: 0,
            chain_id: None,
            receipt_poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
            receipt_poll_attempts: DEFAULT_RECEIPT_POLL_ATTEMPTS,
        }
    }

    /// Add a request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the gas price in wei.
    pub fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = gas_price;
        self
    }

    /// Set the gas limit multiplier.
    pub fn with_gas_limit_multiplier(mut self, multiplier: f64) -> Self {
        self.gas_limit_multiplier = multiplier;
        self
    }

    /// Set the EIP-155 chain id.
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Set the receipt polling policy.
    pub fn with_receipt_polling(mut self, interval: Duration, attempts: u32) -> Self {
        self.receipt_poll_interval = interval;
        self.receipt_poll_attempts = attempts;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `EVP_NODE_URL` (required)
    /// - `EVP_RPC_HEADERS` (optional, `Name: value;Name2: value2`)
    /// - `EVP_TIMEOUT_SECS` (default: 30)
    /// - `EVP_GAS_LIMIT_MULTIPLIER` (default: 2)
    /// - `EVP_GAS_PRICE` (default: 0)
    /// - `EVP_CHAIN_ID` (optional)
    /// - `EVP_RECEIPT_POLL_MS` (default: 1000)
    /// - `EVP_RECEIPT_POLL_ATTEMPTS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url = std::env::var("EVP_NODE_URL").map_err(|_| ConfigError::MissingNodeUrl)?;
        let node_url = Url::parse(&raw_url)
            .map_err(|e| ConfigError::InvalidUrl("EVP_NODE_URL".to_string(), e.to_string()))?;

        let mut config = Self::new(node_url);
        if let Ok(raw) = std::env::var("EVP_RPC_HEADERS") {
            config.headers = parse_headers(&raw)?;
        }
        if let Some(v) = env_parse("EVP_TIMEOUT_SECS")? {
            config.timeout_secs = v;
        }
        if let Some(v) = env_parse("EVP_GAS_LIMIT_MULTIPLIER")? {
            config.gas_limit_multiplier = v;
        }
        if let Some(v) = env_parse("EVP_GAS_PRICE")? {
            config.gas_price = v;
        }
        config.chain_id = env_parse("EVP_CHAIN_ID")?;
        if let Some(ms) = env_parse::<u64>("EVP_RECEIPT_POLL_MS")? {
            config.receipt_poll_interval = Duration::from_millis(ms);
        }
        if let Some(v) = env_parse("EVP_RECEIPT_POLL_ATTEMPTS")? {
            config.receipt_poll_attempts = v;
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject option values the client cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.gas_limit_multiplier.is_finite() && self.gas_limit_multiplier > 0.0) {
            return Err(ConfigError::InvalidValue(
                "gas_limit_multiplier".to_string(),
                self.gas_limit_multiplier.to_string(),
            ));
        }
        if self.receipt_poll_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "receipt_poll_attempts".to_string(),
                "0".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(var.to_string(), raw)),
        Err(_) => Ok(None),
    }
}

/// Parse `Name: value;Name2: value2` into header pairs.
pub fn parse_headers(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (name, value) = pair
                .split_once(':')
                .ok_or_else(|| ConfigError::InvalidHeader(pair.to_string()))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(ConfigError::InvalidHeader(pair.to_string()));
            }
            Ok((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("EVP_NODE_URL environment variable is required")]
    MissingNodeUrl,
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
    #[error("invalid header \"{0}\" (expected Name: value)")]
    InvalidHeader(String),
    #[error("invalid signing key: {0}")]
    InvalidSigningKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("http://127.0.0.1:8545").unwrap()
    }

    #[test]
    fn defaults() {
        let cfg = ChainConfig::new(url());
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.gas_limit_multiplier, 2.0);
        assert_eq!(cfg.gas_price, 0);
        assert_eq!(cfg.chain_id, None);
        assert_eq!(cfg.receipt_poll_interval, Duration::from_secs(1));
        assert_eq!(cfg.receipt_poll_attempts, 30);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn builders_apply() {
        let cfg = ChainConfig::new(url())
            .with_gas_price(95_000_000_000)
            .with_chain_id(80001)
            .with_gas_limit_multiplier(1.5)
            .with_receipt_polling(Duration::from_millis(10), 3)
            .with_header("Authorization", "Bearer t");
        assert_eq!(cfg.gas_price, 95_000_000_000);
        assert_eq!(cfg.chain_id, Some(80001));
        assert_eq!(cfg.gas_limit_multiplier, 1.5);
        assert_eq!(cfg.receipt_poll_attempts, 3);
        assert_eq!(cfg.headers.len(), 1);
    }

    #[test]
    fn debug_redacts_header_values() {
        let cfg = ChainConfig::new(url()).with_header("Authorization", "Bearer secret-token");
        let debug = format!("{cfg:?}");
        assert!(debug.contains("Authorization"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn parse_headers_accepts_pairs() {
        let headers = parse_headers("Authorization: Bearer x; X-Api-Key: k ;").unwrap();
        assert_eq!(
            headers,
            vec![
                ("Authorization".to_string(), "Bearer x".to_string()),
                ("X-Api-Key".to_string(), "k".to_string()),
            ]
        );
        assert!(parse_headers("no-colon").is_err());
        assert!(parse_headers(": value").is_err());
    }

    #[test]
    fn validate_rejects_bad_policy() {
        assert!(ChainConfig::new(url()).with_gas_limit_multiplier(0.0).validate().is_err());
        assert!(ChainConfig::new(url()).with_gas_limit_multiplier(f64::NAN).validate().is_err());
        assert!(ChainConfig::new(url())
            .with_receipt_polling(Duration::from_millis(1), 0)
            .validate()
            .is_err());
    }

    #[test]
    fn env_parse_rejects_garbage() {
        std::env::set_var("EVP_TEST_BAD_NUMBER", "ten");
        let result = env_parse::<u64>("EVP_TEST_BAD_NUMBER");
        std::env::remove_var("EVP_TEST_BAD_NUMBER");
        assert!(result.is_err());
        assert_eq!(env_parse::<u64>("EVP_TEST_ABSENT_12345").unwrap(), None);
    }
}
