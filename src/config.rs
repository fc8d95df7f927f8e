//! Configuration options for the Guardian client

use std::path::PathBuf;
use std::time::Duration;

use guardian_rust_sos::PressConfig;

use crate::error::Error;

/// Backend used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// How SOS messages reach the SMS provider
#[derive(Clone, PartialEq, Eq)]
pub enum SmsOptions {
    /// Through the backend's authenticated proxy endpoint
    Proxy,
    /// Straight to a bulk SMS provider with a configured credential
    Direct { endpoint: String, api_token: String },
}

impl Default for SmsOptions {
    fn default() -> Self {
        Self::Proxy
    }
}

impl std::fmt::Debug for SmsOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Proxy => write!(f, "Proxy"),
            Self::Direct { endpoint, .. } => f
                .debug_struct("Direct")
                .field("endpoint", endpoint)
                .field("api_token", &"<redacted>")
                .finish(),
        }
    }
}

/// Configuration options for the Guardian client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the backend
    pub base_url: String,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// File holding the session; `None` keeps it in memory
    pub session_path: Option<PathBuf>,

    /// SMS delivery route for SOS alerts
    pub sms: SmsOptions,

    /// Hardware key pattern that fires an SOS
    pub press: PressConfig,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Some(Duration::from_secs(30)),
            session_path: None,
            sms: SmsOptions::default(),
            press: PressConfig::default(),
        }
    }
}

impl ClientOptions {
    /// Set the backend base URL
    pub fn with_base_url(mut self, value: &str) -> Self {
        self.base_url = value.to_string();
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the session file
    pub fn with_session_path(mut self, value: impl Into<PathBuf>) -> Self {
        self.session_path = Some(value.into());
        self
    }

    /// Set the SMS delivery route
    pub fn with_sms(mut self, value: SmsOptions) -> Self {
        self.sms = value;
        self
    }

    /// Set the hardware key pattern
    pub fn with_press(mut self, value: PressConfig) -> Self {
        self.press = value;
        self
    }

    /// Load options from `GUARDIAN_*` environment variables
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load options through `lookup`, falling back to defaults for unset keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut options = Self::default();

        if let Some(url) = get("GUARDIAN_API_URL") {
            url::Url::parse(&url)?;
            options.base_url = url;
        }

        if let Some(path) = get("GUARDIAN_SESSION_PATH") {
            options.session_path = Some(PathBuf::from(path));
        }

        if let Some(secs) = get("GUARDIAN_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse(&secs, "GUARDIAN_REQUEST_TIMEOUT_SECS")?;
            options.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        options.sms = match (get("GUARDIAN_SMS_ENDPOINT"), get("GUARDIAN_SMS_TOKEN")) {
            (Some(endpoint), Some(api_token)) => {
                url::Url::parse(&endpoint)?;
                SmsOptions::Direct {
                    endpoint,
                    api_token,
                }
            }
            (None, None) => SmsOptions::Proxy,
            _ => {
                return Err(Error::config(
                    "GUARDIAN_SMS_ENDPOINT and GUARDIAN_SMS_TOKEN must be set together",
                ))
            }
        };

        if let Some(count) = get("GUARDIAN_SOS_PRESS_COUNT") {
            let count: usize = parse(&count, "GUARDIAN_SOS_PRESS_COUNT")?;
            if count == 0 {
                return Err(Error::config("GUARDIAN_SOS_PRESS_COUNT must be at least 1"));
            }
            options.press = options.press.with_threshold(count);
        }

        if let Some(ms) = get("GUARDIAN_SOS_PRESS_WINDOW_MS") {
            let ms: u64 = parse(&ms, "GUARDIAN_SOS_PRESS_WINDOW_MS")?;
            options.press = options.press.with_window(Duration::from_millis(ms));
        }

        Ok(options)
    }
}

fn parse<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, Error> {
    value
        .parse()
        .map_err(|_| Error::config(format!("{} has an invalid value: {}", key, value)))
}
