use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

pub use config::ConfigError;

pub const DEFAULT_API_VERSION: &str = "2023-03-31";

pub trait EnvConfig: Sized {
    fn from_env() -> Result<Self, ConfigError>;
    fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError>;
}

impl<D> EnvConfig for D
where
    D: DeserializeOwned,
{
    fn from_env() -> Result<Self, ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::default())
            .build()?
            .try_deserialize()
    }

    fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix(prefix))
            .build()?
            .try_deserialize()
    }
}

/// Settings for talking to Azure Communication Services Email.
///
/// Every field is read from an unprefixed environment variable of the same
/// name, upper-cased. Credentials are optional at this layer so that a missing
/// value surfaces as [`MailError::MissingConfig`](crate::mail::MailError)
/// when a mailer is built rather than as a deserialization error.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    #[serde(rename = "az_email_connection_string", default)]
    pub connection_string: Option<String>,

    #[serde(rename = "az_email_sender_address", default)]
    pub sender_address: Option<String>,

    /// When set, mail is only delivered to this exact address.
    #[serde(rename = "debug_email", default)]
    pub debug_email: Option<String>,

    #[serde(rename = "az_email_api_version", default = "default_api_version")]
    pub api_version: String,

    /// Seconds between operation status polls (default: 5).
    #[serde(rename = "az_email_poll_interval", default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Seconds before polling gives up (default: 300).
    #[serde(rename = "az_email_poll_timeout", default = "default_poll_timeout")]
    pub poll_timeout: u64,

    /// Per-request HTTP timeout in seconds (default: 30).
    #[serde(rename = "az_email_request_timeout", default = "default_request_timeout")]
    pub request_timeout: u64,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_poll_interval() -> u64 {
    5
}

fn default_poll_timeout() -> u64 {
    300
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            connection_string: None,
            sender_address: None,
            debug_email: None,
            api_version: default_api_version(),
            poll_interval: default_poll_interval(),
            poll_timeout: default_poll_timeout(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl EmailSettings {
    /// Load settings from the process environment, reading `.env` first if present.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        <Self as EnvConfig>::from_env()
    }

    /// The debug recipient, treating an empty value as unset.
    pub fn debug_recipient(&self) -> Option<&str> {
        non_empty(self.debug_email.as_deref())
    }

    pub(crate) fn credentials(&self) -> Option<(&str, &str)> {
        let conn = non_empty(self.connection_string.as_deref())?;
        let sender = non_empty(self.sender_address.as_deref())?;
        Some((conn, sender))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
