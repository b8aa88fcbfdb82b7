use crate::humanize::HumanDuration;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Credentials and endpoint of the Zenduty account
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// API token. Prefer `ZENDUTY_API_KEY` over writing it to a file.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: HumanDuration,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: HumanDuration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Backoff applied to team creation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(default = "default_initial_interval")]
    pub initial_interval: HumanDuration,
    #[serde(default = "default_max_interval")]
    pub max_interval: HumanDuration,
    #[serde(default = "default_max_elapsed")]
    pub max_elapsed: HumanDuration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_interval: default_initial_interval(),
            max_interval: default_max_interval(),
            max_elapsed: default_max_elapsed(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            initial_interval: self.initial_interval.as_duration(),
            max_interval: self.max_interval.as_duration(),
            max_elapsed: self.max_elapsed.as_duration(),
            ..RetryPolicy::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.zenduty.com".to_string()
}

fn default_connect_timeout() -> HumanDuration {
    HumanDuration::from_secs(10)
}

fn default_request_timeout() -> HumanDuration {
    HumanDuration::from_secs(60)
}

fn default_user_agent() -> String {
    format!("zenduty-provider/{}", env!("CARGO_PKG_VERSION"))
}

fn default_initial_interval() -> HumanDuration {
    HumanDuration::from_millis(500)
}

fn default_max_interval() -> HumanDuration {
    HumanDuration::from_secs(10)
}

fn default_max_elapsed() -> HumanDuration {
    HumanDuration::from_secs(60)
}

fn default_log_filter() -> String {
    "info".to_string()
}
