//! Configured reactions to a submission.
//!
//! Actions are stored as JSON objects tagged by `type`:
//!
//! ```json
//! { "type": "webhook", "enabled": true, "url": "https://example.com/hook", "method": "PUT" }
//! { "type": "redirect", "redirectUrl": "/thanks", "openInNewTab": false }
//! { "type": "message", "message": "Thanks!", "messageType": "success" }
//! ```
//!
//! Anything that is not one of the known kinds, or a known kind whose fields do not parse,
//! becomes [`ActionKind::Unrecognized`]. Its raw fields are kept so the configuration
//! survives a round trip through storage unchanged.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawAction", into = "RawAction")]
pub struct Action {
    pub enabled: bool,
    pub kind: ActionKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionKind {
    Webhook(WebhookConfig),
    Redirect(RedirectConfig),
    Message(MessageConfig),
    Unrecognized {
        kind: String,
        detail: Option<String>,
        fields: Map<String, Value>,
    },
}

impl ActionKind {
    pub fn name(&self) -> &str {
        match self {
            ActionKind::Webhook(_) => "webhook",
            ActionKind::Redirect(_) => "redirect",
            ActionKind::Message(_) => "message",
            ActionKind::Unrecognized { kind, .. } => kind.as_str(),
        }
    }
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            enabled: true,
            kind,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    #[serde(default)]
    pub method: WebhookMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WebhookMethod {
    #[default]
    Post,
    Put,
    Patch,
}

impl WebhookMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookMethod::Post => "POST",
            WebhookMethod::Put => "PUT",
            WebhookMethod::Patch => "PATCH",
        }
    }
}

impl std::fmt::Display for WebhookMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectConfig {
    pub redirect_url: String,
    #[serde(default)]
    pub open_in_new_tab: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageConfig {
    pub message: String,
    #[serde(default)]
    pub message_type: MessageType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Success,
    Info,
    Warning,
    Error,
}

/// Wire shape of an action: the tag, the enabled flag, and everything else.
#[derive(Serialize, Deserialize)]
struct RawAction {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

fn enabled_by_default() -> bool {
    true
}

impl From<RawAction> for Action {
    fn from(raw: RawAction) -> Self {
        let parsed = match raw.kind.as_str() {
            "webhook" => parse_fields::<WebhookConfig>(&raw.fields).and_then(|cfg| {
                if cfg.url.trim().is_empty() {
                    Err("url is required".to_string())
                } else {
                    Ok(ActionKind::Webhook(cfg))
                }
            }),
            "redirect" => parse_fields(&raw.fields).map(ActionKind::Redirect),
            "message" => parse_fields(&raw.fields).map(ActionKind::Message),
            _ => Err(String::new()),
        };

        let kind = parsed.unwrap_or_else(|detail| ActionKind::Unrecognized {
            kind: raw.kind,
            detail: (!detail.is_empty()).then_some(detail),
            fields: raw.fields,
        });

        Action {
            enabled: raw.enabled,
            kind,
        }
    }
}

impl From<Action> for RawAction {
    fn from(action: Action) -> Self {
        let (kind, fields) = match action.kind {
            ActionKind::Webhook(cfg) => ("webhook".to_string(), to_fields(&cfg)),
            ActionKind::Redirect(cfg) => ("redirect".to_string(), to_fields(&cfg)),
            ActionKind::Message(cfg) => ("message".to_string(), to_fields(&cfg)),
            ActionKind::Unrecognized { kind, fields, .. } => (kind, fields),
        };
        RawAction {
            kind,
            enabled: action.enabled,
            fields,
        }
    }
}

fn parse_fields<T: DeserializeOwned>(fields: &Map<String, Value>) -> Result<T, String> {
    serde_json::from_value(Value::Object(fields.clone())).map_err(|e| e.to_string())
}

fn to_fields<T: Serialize>(config: &T) -> Map<String, Value> {
    match serde_json::to_value(config) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}
