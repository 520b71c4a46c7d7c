use crate::models::{Action, ActionKind};

use super::context::SubmissionContext;
use super::webhook::WebhookDelivery;
use super::{ActionResult, ActionType, Directive};

/// Decides what happens to a single configured action.
pub struct ActionRouter {
    webhook: WebhookDelivery,
}

impl ActionRouter {
    pub fn new(webhook: WebhookDelivery) -> Self {
        Self { webhook }
    }

    /// Returns `None` for actions that produce no result: disabled ones and kinds we
    /// don't know how to run.
    pub async fn route(
        &self,
        ctx: &SubmissionContext<'_>,
        action: &Action,
    ) -> Option<ActionResult> {
        if !action.enabled {
            tracing::debug!(
                "Skipping disabled {} action for submission {}",
                action.kind.name(),
                ctx.submission_id
            );
            return None;
        }

        match &action.kind {
            ActionKind::Webhook(config) => Some(self.webhook.deliver(ctx, config).await),
            ActionKind::Redirect(_) => Some(ActionResult::directive(ActionType::Redirect)),
            ActionKind::Message(_) => Some(ActionResult::directive(ActionType::Message)),
            ActionKind::Unrecognized { kind, detail, .. } => {
                match detail {
                    Some(detail) => tracing::warn!(
                        "Skipping unrecognized action '{kind}' for submission {}: {detail}",
                        ctx.submission_id
                    ),
                    None => tracing::warn!(
                        "Skipping unrecognized action '{kind}' for submission {}",
                        ctx.submission_id
                    ),
                }
                None
            }
        }
    }
}

/// The enabled redirect and message actions, in configured order.
pub fn directives(actions: &[Action]) -> Vec<Directive> {
    actions
        .iter()
        .filter(|action| action.enabled)
        .filter_map(|action| match &action.kind {
            ActionKind::Redirect(config) => Some(Directive::Redirect(config.clone())),
            ActionKind::Message(config) => Some(Directive::Message(config.clone())),
            _ => None,
        })
        .collect()
}
