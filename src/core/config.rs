use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;

/// Default handshake budget when the environment does not say otherwise.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 1_000;

const DEFAULT_OUTBOUND_BUFFER: usize = 1_024;

#[derive(Debug, Clone)]
pub struct QuoterConfig {
    pub market_maker_id: String,
    pub signing_key: Secret<String>,
    pub key_password: Option<Secret<String>>,
    pub endpoint: String,
    pub connect_timeout_ms: u64,
    pub outbound_buffer: usize,
}

// Custom Serialize implementation - never expose key material in serialization
impl Serialize for QuoterConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("QuoterConfig", 6)?;
        state.serialize_field("market_maker_id", &self.market_maker_id)?;
        state.serialize_field("signing_key", "[REDACTED]")?;
        state.serialize_field(
            "key_password",
            &self.key_password.as_ref().map(|_| "[REDACTED]"),
        )?;
        state.serialize_field("endpoint", &self.endpoint)?;
        state.serialize_field("connect_timeout_ms", &self.connect_timeout_ms)?;
        state.serialize_field("outbound_buffer", &self.outbound_buffer)?;
        state.end()
    }
}

// Custom Deserialize implementation
impl<'de> Deserialize<'de> for QuoterConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct QuoterConfigHelper {
            market_maker_id: String,
            signing_key: String,
            key_password: Option<String>,
            endpoint: String,
            connect_timeout_ms: Option<u64>,
            outbound_buffer: Option<usize>,
        }

        let helper = QuoterConfigHelper::deserialize(deserializer)?;
        Ok(Self {
            market_maker_id: helper.market_maker_id,
            signing_key: Secret::new(helper.signing_key),
            key_password: helper.key_password.map(Secret::new),
            endpoint: helper.endpoint,
            connect_timeout_ms: helper
                .connect_timeout_ms
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS),
            outbound_buffer: helper.outbound_buffer.unwrap_or(DEFAULT_OUTBOUND_BUFFER),
        })
    }
}

impl QuoterConfig {
    /// Create a new configuration for one market maker identity
    #[must_use]
    pub fn new(market_maker_id: String, signing_key: String, endpoint: String) -> Self {
        Self {
            market_maker_id,
            signing_key: Secret::new(signing_key),
            key_password: None,
            endpoint,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `QUOTER_MARKET_MAKER_ID`
    /// - `QUOTER_SIGNING_KEY` (base64 seed or PKCS#8 PEM)
    /// - `QUOTER_ENDPOINT` (ws:// or wss:// URL)
    /// - `QUOTER_KEY_PASSWORD` (optional, for encrypted keyfiles)
    /// - `QUOTER_CONNECT_TIMEOUT_MS` (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        let market_maker_id = env::var("QUOTER_MARKET_MAKER_ID")
            .map_err(|_| ConfigError::MissingEnvironmentVariable("QUOTER_MARKET_MAKER_ID".into()))?;

        let signing_key = env::var("QUOTER_SIGNING_KEY")
            .map_err(|_| ConfigError::MissingEnvironmentVariable("QUOTER_SIGNING_KEY".into()))?;

        let endpoint = env::var("QUOTER_ENDPOINT")
            .map_err(|_| ConfigError::MissingEnvironmentVariable("QUOTER_ENDPOINT".into()))?;

        let key_password = env::var("QUOTER_KEY_PASSWORD").ok();

        let connect_timeout_ms = env::var("QUOTER_CONNECT_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS);

        Ok(Self {
            market_maker_id,
            signing_key: Secret::new(signing_key),
            key_password: key_password.map(Secret::new),
            endpoint,
            connect_timeout_ms,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        })
    }

    /// Create configuration from a .env file and environment variables
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file() -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(".env")
    }

    /// Create configuration from a specific .env file path
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(env_file_path: &str) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(_) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {
                // .env file doesn't exist, continue with system env vars
            }
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env()
    }

    /// Set the handshake timeout in milliseconds
    #[must_use]
    pub const fn connect_timeout(mut self, timeout_ms: u64) -> Self {
        self.connect_timeout_ms = timeout_ms;
        self
    }

    /// Set the password for an encrypted keyfile
    #[must_use]
    pub fn key_password(mut self, password: String) -> Self {
        self.key_password = Some(Secret::new(password));
        self
    }

    /// Set the outbound queue depth
    #[must_use]
    pub const fn outbound_buffer(mut self, depth: usize) -> Self {
        self.outbound_buffer = depth;
        self
    }

    /// Get the signing key material (use carefully - exposes secret)
    pub fn signing_key(&self) -> &str {
        self.signing_key.expose_secret()
    }

    /// Get the keyfile password, if one is configured
    pub fn key_password_secret(&self) -> Option<&str> {
        self.key_password.as_ref().map(|p| p.expose_secret().as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_redacts_key_material() {
        let config = QuoterConfig::new(
            "mm1".to_string(),
            "super-secret-seed".to_string(),
            "wss://quote.example".to_string(),
        )
        .key_password("hunter2".to_string());

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("super-secret-seed"));
        assert!(!json.contains("hunter2"));
        assert!(json.contains("[REDACTED]"));
        assert!(json.contains("mm1"));
    }

    #[test]
    fn builder_defaults() {
        let config = QuoterConfig::new(
            "mm1".to_string(),
            "seed".to_string(),
            "wss://quote.example".to_string(),
        );
        assert_eq!(config.connect_timeout_ms, DEFAULT_CONNECT_TIMEOUT_MS);
        assert!(config.key_password.is_none());

        let config = config.connect_timeout(250).outbound_buffer(16);
        assert_eq!(config.connect_timeout_ms, 250);
        assert_eq!(config.outbound_buffer, 16);
    }
}
