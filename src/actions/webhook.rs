//! Webhook delivery with bounded retry and exponential backoff.
//!
//! Each attempt posts `{"formData": ..., "metadata": {...}}` to the configured URL and appends
//! one entry to the attempt log, whatever the outcome. Delivery never fails towards the caller:
//! transport faults, non-2xx responses and log write failures all end up in the returned
//! [`ActionResult`] or in the tracing output.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde_json::json;

use super::context::SubmissionContext;
use super::{ActionResult, ActionType};
use crate::models::{NewAttemptLog, WebhookConfig, WebhookMethod};
use crate::store::Store;

pub const WEBHOOK_USER_AGENT: &str = concat!("formhook-webhook/", env!("CARGO_PKG_VERSION"));

/// Attempt budget and backoff base for one webhook action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Never zero.
    pub max_attempts: u32,
    /// Wait after the first failed attempt; doubles after each further failure.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Three attempts, waiting 1s then 2s between them.
    pub const DEFAULT: Self = Self {
        max_attempts: 3,
        base_delay: Duration::from_millis(1000),
    };

    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay before the attempt following `attempt` (1-based), or `None` once the budget
    /// is spent.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        Some(self.base_delay.saturating_mul(factor))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<WebhookMethod> for reqwest::Method {
    fn from(method: WebhookMethod) -> Self {
        match method {
            WebhookMethod::Post => reqwest::Method::POST,
            WebhookMethod::Put => reqwest::Method::PUT,
            WebhookMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

struct AttemptOutcome {
    status: Option<u16>,
    success: bool,
    error: Option<String>,
}

pub struct WebhookDelivery {
    client: reqwest::Client,
    store: Arc<dyn Store>,
    policy: RetryPolicy,
}

impl WebhookDelivery {
    pub fn new(
        store: Arc<dyn Store>,
        policy: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, store, policy))
    }

    pub fn with_client(client: reqwest::Client, store: Arc<dyn Store>, policy: RetryPolicy) -> Self {
        Self {
            client,
            store,
            policy,
        }
    }

    pub async fn deliver(
        &self,
        ctx: &SubmissionContext<'_>,
        webhook: &WebhookConfig,
    ) -> ActionResult {
        let headers = build_headers(webhook.headers.as_ref());
        let mut last = AttemptOutcome {
            status: None,
            success: false,
            error: None,
        };

        for attempt in 1..=self.policy.max_attempts {
            let attempted_at = Utc::now();
            last = self
                .attempt(ctx, webhook, headers.clone(), attempt, attempted_at)
                .await;
            self.record(ctx, webhook, &last, attempted_at).await;

            if last.success {
                tracing::debug!(
                    "Webhook {} {} delivered for submission {} on attempt {attempt}",
                    webhook.method,
                    webhook.url,
                    ctx.submission_id
                );
                break;
            }

            let reason = last.error.as_deref().unwrap_or("unknown error");
            match self.policy.delay_after(attempt) {
                Some(delay) => {
                    tracing::warn!(
                        "Webhook {} attempt {attempt}/{} failed ({reason}), retrying in {}ms",
                        webhook.url,
                        self.policy.max_attempts,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                None => tracing::warn!(
                    "Webhook {} failed after {attempt} attempts for submission {}: {reason}",
                    webhook.url,
                    ctx.submission_id
                ),
            }
        }

        ActionResult {
            kind: ActionType::Webhook,
            success: last.success,
            status: last.status,
            error: last.error,
        }
    }

    async fn attempt(
        &self,
        ctx: &SubmissionContext<'_>,
        webhook: &WebhookConfig,
        headers: HeaderMap,
        attempt: u32,
        attempted_at: DateTime<Utc>,
    ) -> AttemptOutcome {
        let body = json!({
            "formData": ctx.payload,
            "metadata": {
                "formTitle": ctx.title,
                "submissionId": ctx.submission_id,
                "timestamp": attempted_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                "attempt": attempt,
            },
        });

        let result = self
            .client
            .request(webhook.method.into(), &webhook.url)
            .headers(headers)
            .json(&body)
            .send()
            .await;

        match result {
            Ok(resp) => {
                let status = resp.status();
                AttemptOutcome {
                    status: Some(status.as_u16()),
                    success: status.is_success(),
                    error: (!status.is_success())
                        .then(|| format!("HTTP {}", status.as_u16())),
                }
            }
            Err(e) => AttemptOutcome {
                status: None,
                success: false,
                error: Some(format!("Webhook request failed: {e}")),
            },
        }
    }

    async fn record(
        &self,
        ctx: &SubmissionContext<'_>,
        webhook: &WebhookConfig,
        outcome: &AttemptOutcome,
        attempted_at: DateTime<Utc>,
    ) {
        let entry = NewAttemptLog {
            submission_id: ctx.submission_id,
            url: webhook.url.clone(),
            method: webhook.method.as_str().to_string(),
            status: outcome.status,
            success: outcome.success,
            error: outcome.error.clone(),
            attempted_at,
        };

        if let Err(e) = self.store.append_attempt(&entry).await {
            tracing::error!(
                "Failed to record webhook attempt for submission {}: {e}",
                ctx.submission_id
            );
        }
    }
}

/// JSON content type and our user agent first, caller headers layered on top.
fn build_headers(custom: Option<&BTreeMap<String, String>>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, HeaderValue::from_static(WEBHOOK_USER_AGENT));

    for (name, value) in custom.into_iter().flatten() {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!("Ignoring invalid webhook header '{name}'"),
        }
    }

    headers
}
