//! Sync and remote store configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::util::normalize_text_option;

/// Identity used when no sign-in flow supplies one.
pub const ANONYMOUS_USER_ID: &str = "anonymous_user";

const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(30);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_SUBSCRIPTION_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Timing and identity settings for the sync engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Remote user whose documents are synchronized
    pub user_id: String,
    /// Delay before a failed write is retried (default: 30 seconds)
    pub retry_delay: Duration,
    /// Connectivity monitor tick (default: 60 seconds)
    pub poll_interval: Duration,
    /// How often polling subscriptions re-fetch documents (default: 5 seconds)
    pub subscription_poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            user_id: ANONYMOUS_USER_ID.to_string(),
            retry_delay: DEFAULT_RETRY_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            subscription_poll_interval: DEFAULT_SUBSCRIPTION_POLL_INTERVAL,
        }
    }
}

impl SyncConfig {
    /// Set the remote user id; blank values fall back to the anonymous user
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = normalize_text_option(Some(user_id.into()))
            .unwrap_or_else(|| ANONYMOUS_USER_ID.to_string());
        self
    }

    /// Set the delay before retrying failed remote writes
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the connectivity monitor tick interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the polling cadence used by HTTP subscriptions
    #[must_use]
    pub const fn with_subscription_poll_interval(mut self, interval: Duration) -> Self {
        self.subscription_poll_interval = interval;
        self
    }
}

/// Location and credentials of the remote document store.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Base URL, e.g. `https://sync.example.com/v1`
    pub base_url: String,
    /// Optional bearer API key
    #[serde(default)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RemoteConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = normalize_text_option(Some(api_key.into()));
        self
    }

    /// Check if a remote is configured
    pub fn is_configured(&self) -> bool {
        normalize_text_option(Some(self.base_url.clone())).is_some()
    }
}
