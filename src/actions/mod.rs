pub mod context;
pub mod router;
pub mod webhook;

use serde::{Deserialize, Serialize};

use crate::models::{MessageConfig, RedirectConfig};

pub use context::SubmissionContext;
pub use router::ActionRouter;
pub use webhook::{RetryPolicy, WebhookDelivery};

/// Outcome of one processed action, in the order the actions were configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub kind: ActionType,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Webhook,
    Redirect,
    Message,
}

impl ActionResult {
    /// Redirects and messages have no server-side effect and always succeed.
    pub fn directive(kind: ActionType) -> Self {
        Self {
            kind,
            success: true,
            status: None,
            error: None,
        }
    }
}

/// Client-facing instruction returned to whoever submitted the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Directive {
    Redirect(RedirectConfig),
    Message(MessageConfig),
}
