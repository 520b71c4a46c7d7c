mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use formhook::actions::Directive;
use formhook::actions::router::directives;
use formhook::models::{
    Action, ActionKind, MessageType, NewAttemptLog, WebhookMethod,
};
use formhook::retention;
use formhook::store::{MemoryStore, Store};

fn attempt(submission_id: Uuid, age: Duration) -> NewAttemptLog {
    NewAttemptLog {
        submission_id,
        url: "https://example.com/hook".to_string(),
        method: "POST".to_string(),
        status: Some(200),
        success: true,
        error: None,
        attempted_at: Utc::now() - age,
    }
}

// ── Action configuration ────────────────────────────────────────

#[test]
fn parses_each_action_kind_with_defaults() {
    let actions = common::actions(json!([
        { "type": "webhook", "url": "https://example.com/hook" },
        { "type": "redirect", "redirectUrl": "/thanks" },
        { "type": "message", "message": "Thanks!", "enabled": false },
    ]));

    assert!(actions[0].enabled);
    match &actions[0].kind {
        ActionKind::Webhook(cfg) => {
            assert_eq!(cfg.url, "https://example.com/hook");
            assert_eq!(cfg.method, WebhookMethod::Post);
            assert!(cfg.headers.is_none());
        }
        other => panic!("expected webhook, got {other:?}"),
    }

    match &actions[1].kind {
        ActionKind::Redirect(cfg) => {
            assert_eq!(cfg.redirect_url, "/thanks");
            assert!(!cfg.open_in_new_tab);
        }
        other => panic!("expected redirect, got {other:?}"),
    }

    assert!(!actions[2].enabled);
    match &actions[2].kind {
        ActionKind::Message(cfg) => assert_eq!(cfg.message_type, MessageType::Success),
        other => panic!("expected message, got {other:?}"),
    }
}

#[test]
fn patch_method_and_headers_are_accepted() {
    let actions = common::actions(json!([{
        "type": "webhook",
        "url": "https://example.com/hook",
        "method": "PATCH",
        "headers": { "Authorization": "Bearer abc" },
    }]));

    let ActionKind::Webhook(cfg) = &actions[0].kind else {
        panic!("expected webhook");
    };
    assert_eq!(cfg.method, WebhookMethod::Patch);
    assert_eq!(
        cfg.headers.as_ref().unwrap().get("Authorization").map(String::as_str),
        Some("Bearer abc")
    );
}

#[test]
fn unknown_kind_survives_a_round_trip() {
    let raw = json!([{ "type": "slack", "channel": "#forms", "enabled": true }]);
    let actions = common::actions(raw.clone());

    match &actions[0].kind {
        ActionKind::Unrecognized { kind, detail, .. } => {
            assert_eq!(kind, "slack");
            assert!(detail.is_none());
        }
        other => panic!("expected unrecognized, got {other:?}"),
    }
    assert_eq!(serde_json::to_value(&actions).unwrap(), raw);
}

#[test]
fn malformed_known_kinds_become_unrecognized() {
    let actions = common::actions(json!([
        { "type": "webhook", "url": "" },
        { "type": "webhook", "url": "https://example.com", "method": "DELETE" },
        { "type": "message" },
    ]));

    for action in &actions {
        let ActionKind::Unrecognized { detail, .. } = &action.kind else {
            panic!("expected unrecognized, got {:?}", action.kind);
        };
        assert!(detail.is_some());
    }
    assert_eq!(actions[0].kind.name(), "webhook");
}

#[test]
fn directives_keep_enabled_client_actions_in_order() {
    let actions = common::actions(json!([
        { "type": "message", "message": "first", "messageType": "warning" },
        { "type": "webhook", "url": "https://example.com/hook" },
        { "type": "redirect", "redirectUrl": "/skip", "enabled": false },
        { "type": "redirect", "redirectUrl": "/done", "openInNewTab": true },
    ]));

    let out = directives(&actions);
    assert_eq!(out.len(), 2);
    assert!(matches!(&out[0], Directive::Message(m) if m.message == "first"));
    assert!(matches!(&out[1], Directive::Redirect(r) if r.redirect_url == "/done"));

    assert_eq!(
        serde_json::to_value(&out[1]).unwrap(),
        json!({ "type": "redirect", "redirectUrl": "/done", "openInNewTab": true })
    );
}

#[test]
fn action_builders() {
    let action = Action::new(ActionKind::Unrecognized {
        kind: "noop".to_string(),
        detail: None,
        fields: Default::default(),
    })
    .disabled();
    assert!(!action.enabled);
    assert_eq!(
        serde_json::to_value(&action).unwrap(),
        json!({ "type": "noop", "enabled": false })
    );
}

// ── Submissions and the attempt log ─────────────────────────────

#[tokio::test]
async fn deleting_a_submission_cascades_to_its_attempts() {
    let store = MemoryStore::new();
    let doomed = common::seed_submission(&store, &[]).await;
    let kept = common::seed_submission(&store, &[]).await;

    for _ in 0..3 {
        store.append_attempt(&attempt(doomed.id, Duration::zero())).await.unwrap();
    }
    store.append_attempt(&attempt(kept.id, Duration::zero())).await.unwrap();

    assert!(store.delete_submission(doomed.id).await.unwrap());

    assert!(store.find_submission(doomed.id).await.unwrap().is_none());
    assert!(store.list_attempts(doomed.id).await.unwrap().is_empty());
    assert_eq!(store.list_attempts(kept.id).await.unwrap().len(), 1);
    assert!(!store.delete_submission(doomed.id).await.unwrap());
}

#[tokio::test]
async fn attempts_require_an_existing_submission() {
    let store = MemoryStore::new();
    let result = store.append_attempt(&attempt(Uuid::now_v7(), Duration::zero())).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn retention_sweep_only_removes_old_attempts() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let submission = common::seed_submission(store.as_ref(), &[]).await;

    store.append_attempt(&attempt(submission.id, Duration::days(45))).await.unwrap();
    store.append_attempt(&attempt(submission.id, Duration::days(31))).await.unwrap();
    store.append_attempt(&attempt(submission.id, Duration::days(29))).await.unwrap();
    store.append_attempt(&attempt(submission.id, Duration::minutes(5))).await.unwrap();

    let removed = retention::sweep(store.as_ref(), Duration::days(30)).await.unwrap();
    assert_eq!(removed, 2);

    let left = store.list_attempts(submission.id).await.unwrap();
    assert_eq!(left.len(), 2);
    let horizon = Utc::now() - Duration::days(30);
    assert!(left.iter().all(|a| a.attempted_at > horizon));
}

#[tokio::test]
async fn processed_flag_only_moves_forward() {
    let store = MemoryStore::new();
    let submission = common::seed_submission(&store, &[]).await;
    assert!(!submission.processed);

    let pending = store.list_unprocessed().await.unwrap();
    assert_eq!(pending.len(), 1);

    assert!(store.mark_processed(submission.id).await.unwrap());
    assert!(store.mark_processed(submission.id).await.unwrap());
    assert!(store.find_submission(submission.id).await.unwrap().unwrap().processed);
    assert!(store.list_unprocessed().await.unwrap().is_empty());
    assert!(!store.mark_processed(Uuid::now_v7()).await.unwrap());
}

#[tokio::test]
async fn deleting_a_form_removes_its_submissions() {
    let store = MemoryStore::new();
    let submission = common::seed_submission(&store, &[]).await;
    store.append_attempt(&attempt(submission.id, Duration::zero())).await.unwrap();

    assert!(store.delete_form(submission.form_id).await.unwrap());

    assert!(store.find_submission(submission.id).await.unwrap().is_none());
    assert!(store.list_attempts(submission.id).await.unwrap().is_empty());
    assert!(
        store
            .create_submission(submission.form_id, "x", &json!({}))
            .await
            .is_err()
    );
}
