use std::net::IpAddr;
use std::time::Duration;

use crate::actions::RetryPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    /// Without a database URL the service runs on the in-memory store.
    pub database_url: Option<String>,
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    pub log_level: String,
    pub worker_count: usize,
    pub queue_capacity: usize,
    /// How often unprocessed submissions are offered to the queue again.
    pub requeue_interval: Duration,
    pub webhook: WebhookSettings,
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone)]
pub struct WebhookSettings {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub timeout: Duration,
}

impl WebhookSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.retry_delay)
    }
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            max_attempts: RetryPolicy::DEFAULT.max_attempts,
            retry_delay: RetryPolicy::DEFAULT.base_delay,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetentionConfig {
    /// Attempt logs older than this are swept.
    pub max_age: chrono::Duration,
    pub sweep_interval: Duration,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age: chrono::Duration::days(30),
            sweep_interval: Duration::from_secs(3600),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let host: IpAddr = env_or("FORMHOOK_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid FORMHOOK_HOST: {e}"))?;

        let port: u16 = env_parse("FORMHOOK_PORT", "3000")?;
        let max_body_size: usize = env_parse("FORMHOOK_MAX_BODY_SIZE", "1048576")?;
        let log_level = env_or("FORMHOOK_LOG_LEVEL", "info");

        let worker_count: usize = env_parse("FORMHOOK_WORKER_COUNT", "4")?;
        if worker_count == 0 {
            return Err("FORMHOOK_WORKER_COUNT must be at least 1".to_string());
        }
        let queue_capacity: usize = env_parse("FORMHOOK_QUEUE_CAPACITY", "1024")?;
        if queue_capacity == 0 {
            return Err("FORMHOOK_QUEUE_CAPACITY must be at least 1".to_string());
        }
        let requeue_interval_secs: u64 = env_parse("FORMHOOK_REQUEUE_INTERVAL_SECS", "30")?;
        if requeue_interval_secs == 0 {
            return Err("FORMHOOK_REQUEUE_INTERVAL_SECS must be at least 1".to_string());
        }

        let max_attempts: u32 = env_parse("FORMHOOK_WEBHOOK_MAX_ATTEMPTS", "3")?;
        if max_attempts == 0 {
            return Err("FORMHOOK_WEBHOOK_MAX_ATTEMPTS must be at least 1".to_string());
        }
        let retry_delay_ms: u64 = env_parse("FORMHOOK_WEBHOOK_RETRY_DELAY_MS", "1000")?;
        let timeout_secs: u64 = env_parse("FORMHOOK_WEBHOOK_TIMEOUT_SECS", "30")?;

        let retention_days: i64 = env_parse("FORMHOOK_RETENTION_DAYS", "30")?;
        let max_age = chrono::Duration::try_days(retention_days)
            .filter(|age| *age > chrono::Duration::zero())
            .ok_or_else(|| format!("Invalid FORMHOOK_RETENTION_DAYS: {retention_days}"))?;
        let sweep_interval_secs: u64 = env_parse("FORMHOOK_SWEEP_INTERVAL_SECS", "3600")?;
        if sweep_interval_secs == 0 {
            return Err("FORMHOOK_SWEEP_INTERVAL_SECS must be at least 1".to_string());
        }

        Ok(Config {
            database_url,
            host,
            port,
            max_body_size,
            log_level,
            worker_count,
            queue_capacity,
            requeue_interval: Duration::from_secs(requeue_interval_secs),
            webhook: WebhookSettings {
                max_attempts,
                retry_delay: Duration::from_millis(retry_delay_ms),
                timeout: Duration::from_secs(timeout_secs),
            },
            retention: RetentionConfig {
                max_age,
                sweep_interval: Duration::from_secs(sweep_interval_secs),
            },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_or(key, default)
        .parse()
        .map_err(|e| format!("Invalid {key}: {e}"))
}
