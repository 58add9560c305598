use std::time::Duration;

use serde::Deserialize;

use postbox_core::config::Config;

/// Headroom between the gateway timeout and the stale cutoff, covering the
/// outcome write that follows the gateway call.
const STALE_PROCESSING_MARGIN_SECS: u64 = 30;

/// HTTP API configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Sender used when a creation request omits one. Env var: `DEFAULT_SENDER`.
    #[serde(default)]
    pub default_sender: Option<String>,
    /// TCP port for the HTTP server (default 3120). Env var: `MESSAGES_PORT`.
    #[serde(default = "default_messages_port")]
    pub messages_port: u16,
}

impl Config for ApiConfig {}

impl ApiConfig {
    /// The configured default sender, ignoring blank values.
    pub fn default_sender(&self) -> Option<&str> {
        non_blank(self.default_sender.as_deref())
    }
}

/// Scheduler and worker configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub database_url: String,

    #[serde(default = "default_redis_host")]
    pub redis_host: String,
    #[serde(default = "default_redis_port")]
    pub redis_port: u16,
    #[serde(default)]
    pub redis_db: u32,
    /// Full connection URL; takes precedence over host/port/db when set.
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_redis_queue_key")]
    pub redis_queue_key: String,

    #[serde(default = "default_scheduler_interval_secs")]
    pub scheduler_interval_secs: u64,
    /// Unset disables the stale-PROCESSING sweep.
    #[serde(default)]
    pub stale_processing_after_secs: Option<u64>,
    #[serde(default = "default_worker_pop_timeout_secs")]
    pub worker_pop_timeout_secs: u64,

    #[serde(default)]
    pub twilio_account_sid: Option<String>,
    #[serde(default)]
    pub twilio_auth_token: Option<String>,
    #[serde(default = "default_twilio_api_base")]
    pub twilio_api_base: String,
    #[serde(default = "default_gateway_timeout_secs")]
    pub gateway_timeout_secs: u64,
}

impl Config for PipelineConfig {}

impl PipelineConfig {
    /// Reject values the loops cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.scheduler_interval_secs >= 1,
            "SCHEDULER_INTERVAL_SECS must be at least 1"
        );
        anyhow::ensure!(
            self.worker_pop_timeout_secs >= 1,
            "WORKER_POP_TIMEOUT_SECS must be at least 1"
        );
        anyhow::ensure!(
            self.gateway_timeout_secs >= 1,
            "GATEWAY_TIMEOUT_SECS must be at least 1"
        );
        anyhow::ensure!(
            self.stale_processing_after_secs != Some(0),
            "STALE_PROCESSING_AFTER_SECS must be at least 1 when set"
        );
        if let Some(stale) = self.stale_processing_after_secs {
            let floor = self
                .gateway_timeout_secs
                .saturating_add(STALE_PROCESSING_MARGIN_SECS);
            anyhow::ensure!(
                stale > floor,
                "STALE_PROCESSING_AFTER_SECS must exceed GATEWAY_TIMEOUT_SECS + {STALE_PROCESSING_MARGIN_SECS} ({floor}), \
                 otherwise in-flight deliveries would be failed"
            );
        }
        anyhow::ensure!(
            !self.redis_queue_key.trim().is_empty(),
            "REDIS_QUEUE_KEY must not be blank"
        );
        Ok(())
    }

    pub fn redis_connection_url(&self) -> String {
        match non_blank(self.redis_url.as_deref()) {
            Some(url) => url.to_owned(),
            None => format!(
                "redis://{}:{}/{}",
                self.redis_host, self.redis_port, self.redis_db
            ),
        }
    }

    pub fn scheduler_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler_interval_secs)
    }

    pub fn worker_pop_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_pop_timeout_secs)
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }

    pub fn stale_processing_after(&self) -> Option<Duration> {
        self.stale_processing_after_secs.map(Duration::from_secs)
    }

    /// `(account_sid, auth_token)` when both are present and non-blank.
    pub fn twilio_credentials(&self) -> Option<(&str, &str)> {
        let sid = non_blank(self.twilio_account_sid.as_deref())?;
        let token = non_blank(self.twilio_auth_token.as_deref())?;
        Some((sid, token))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn default_messages_port() -> u16 {
    3120
}

fn default_redis_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_redis_queue_key() -> String {
    "scheduled_messages".to_owned()
}

fn default_scheduler_interval_secs() -> u64 {
    30
}

fn default_worker_pop_timeout_secs() -> u64 {
    5
}

fn default_twilio_api_base() -> String {
    "https://api.twilio.com".to_owned()
}

fn default_gateway_timeout_secs() -> u64 {
    15
}
