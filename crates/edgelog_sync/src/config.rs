//! Configuration for publishing.

use std::time::Duration;

/// Broker session and delivery settings.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Broker address, e.g. `tcp://localhost:1883`.
    pub address: String,
    /// Client id presented to the broker.
    pub client_id: String,
    /// Optional user name.
    pub user: Option<String>,
    /// Optional password.
    pub password: Option<String>,
    /// Topic every entry is published to.
    pub topic: String,
    /// Keep-alive interval.
    pub keep_alive: Duration,
    /// Whether the broker should discard previous session state.
    pub clean_session: bool,
    /// How long to wait for each delivery acknowledgment.
    pub delivery_timeout: Duration,
    /// How long to wait for a clean disconnect.
    pub disconnect_timeout: Duration,
    /// Retry configuration for a single delivery.
    pub retry: RetryConfig,
}

impl PublishConfig {
    /// Creates a publish configuration with default timeouts.
    pub fn new(
        address: impl Into<String>,
        client_id: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            client_id: client_id.into(),
            user: None,
            password: None,
            topic: topic.into(),
            keep_alive: Duration::from_secs(20),
            clean_session: true,
            delivery_timeout: Duration::from_secs(10),
            disconnect_timeout: Duration::from_secs(10),
            retry: RetryConfig::no_retry(),
        }
    }

    /// Sets the broker credentials.
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    /// Sets the keep-alive interval.
    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Sets whether to start a clean session.
    pub fn with_clean_session(mut self, clean: bool) -> Self {
        self.clean_session = clean;
        self
    }

    /// Sets the per-delivery acknowledgment deadline.
    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Sets the disconnect deadline.
    pub fn with_disconnect_timeout(mut self, timeout: Duration) -> Self {
        self.disconnect_timeout = timeout;
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Configuration for retrying a failed delivery.
///
/// Only the entry that failed is retried; entries already acknowledged are
/// never sent again.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts per delivery, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Creates a new retry configuration.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }

    /// Creates a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Sets the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculates the delay before a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let delay = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}
