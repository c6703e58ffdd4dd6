//! Configuration types for icon-hunter

use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Upstream store endpoints and locale settings
///
/// Base URLs are configurable so tests (and mirrors) can point the clients
/// at a local server.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct StoresConfig {
    /// App Store (iTunes Search API) settings
    #[serde(default)]
    pub appstore: AppStoreConfig,

    /// Google Play settings
    #[serde(default)]
    pub googleplay: GooglePlayConfig,
}

/// iTunes Search API settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AppStoreConfig {
    /// Base URL of the iTunes Search API (default: "https://itunes.apple.com")
    #[serde(default = "default_appstore_base_url")]
    pub base_url: String,

    /// Default two-letter country code for searches (default: "us")
    #[serde(default = "default_country")]
    pub country: String,
}

impl Default for AppStoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_appstore_base_url(),
            country: default_country(),
        }
    }
}

/// Google Play settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct GooglePlayConfig {
    /// Base URL of the Play web frontend (default: "https://play.google.com")
    #[serde(default = "default_googleplay_base_url")]
    pub base_url: String,

    /// Default two-letter country code for searches (default: "us")
    #[serde(default = "default_country")]
    pub country: String,

    /// UI language passed as `hl` (default: "en")
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for GooglePlayConfig {
    fn default() -> Self {
        Self {
            base_url: default_googleplay_base_url(),
            country: default_country(),
            language: default_language(),
        }
    }
}

/// Download behavior configuration (output location, concurrency, sizes)
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadConfig {
    /// Directory finished archives are written to (default: "./icons")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Maximum concurrent icon fetches per job (default: 4)
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// Per-request timeout for store and icon HTTP calls (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Icon sizes used when a request does not specify any (default: 64, 128, 256, 512)
    #[serde(default = "default_sizes")]
    pub default_sizes: Vec<u32>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            request_timeout: default_request_timeout(),
            default_sizes: default_sizes(),
        }
    }
}

/// Retry configuration for transient icon-fetch failures
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Client-side polling policy for [`crate::client::HunterClient::wait_for_completion`]
///
/// A finite deadline is the default. Callers that genuinely want to wait
/// forever must opt in with `deadline: None`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PollConfig {
    /// Delay between successive status polls (default: 2 seconds)
    #[serde(default = "default_poll_interval", with = "duration_millis_serde")]
    pub interval: Duration,

    /// Give up after this much total waiting (default: 5 minutes; None = no deadline)
    #[serde(default = "default_poll_deadline", with = "optional_duration_serde")]
    pub deadline: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: default_poll_interval(),
            deadline: default_poll_deadline(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// API server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// Main configuration for [`crate::IconHunter`]
///
/// Every field has a sensible default; `Config::default()` works out of the
/// box against the public store endpoints.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Upstream store endpoints and locale settings
    #[serde(default)]
    pub stores: StoresConfig,

    /// Download behavior (output directory, concurrency, sizes)
    #[serde(default)]
    pub download: DownloadConfig,

    /// Retry policy for transient icon-fetch failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Client-side polling policy
    #[serde(default)]
    pub poll: PollConfig,

    /// API server integration
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Check the configuration for values the engine cannot work with
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.download.max_concurrent_fetches == 0 {
            return Err(crate::error::Error::Config {
                message: "max_concurrent_fetches must be at least 1".to_string(),
                key: Some("download.max_concurrent_fetches".to_string()),
            });
        }
        if self.download.default_sizes.iter().any(|&s| s == 0) {
            return Err(crate::error::Error::Config {
                message: "default_sizes must contain only positive values".to_string(),
                key: Some("download.default_sizes".to_string()),
            });
        }
        if self.download.request_timeout.is_zero() {
            return Err(crate::error::Error::Config {
                message: "request_timeout must be non-zero".to_string(),
                key: Some("download.request_timeout".to_string()),
            });
        }
        Ok(())
    }
}

fn default_appstore_base_url() -> String {
    "https://itunes.apple.com".to_string()
}

fn default_googleplay_base_url() -> String {
    "https://play.google.com".to_string()
}

fn default_country() -> String {
    "us".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./icons")
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_sizes() -> Vec<u32> {
    vec![64, 128, 256, 512]
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_poll_deadline() -> Option<Duration> {
    Some(Duration::from_secs(5 * 60))
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds, for sub-second poll intervals)
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

// Optional Duration serialization helper (whole seconds)
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
