pub mod action;
pub mod attempt_log;
pub mod form;
pub mod submission;

pub use action::{
    Action, ActionKind, MessageConfig, MessageType, RedirectConfig, WebhookConfig, WebhookMethod,
};
pub use attempt_log::{AttemptLog, NewAttemptLog};
pub use form::Form;
pub use submission::Submission;
