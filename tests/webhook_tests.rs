mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use common::*;
use footy_roster_bot::bot::handlers::router;
use footy_roster_bot::bot::{Coordinator, Intent, Phase};

fn server(
    members: &[&str],
    now: &str,
) -> (TestServer, Arc<RecordingTransport>, Arc<Coordinator>) {
    let transport = Arc::new(RecordingTransport::with_members(members));
    let coordinator = Arc::new(coordinator(transport.clone(), Arc::new(FixedClock::at(now))));
    let server = TestServer::new(router(coordinator.clone())).expect("Failed to create test server");
    (server, transport, coordinator)
}

/// Work behind a webhook runs in a spawned task; give it a moment to land.
async fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

#[tokio::test]
async fn test_url_verification_echoes_challenge() {
    let (server, _, _) = server(&[], MONDAY);

    let response = server
        .post("/slack/events")
        .json(&json!({
            "token": "legacy",
            "challenge": "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P",
            "type": "url_verification"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(
        body["challenge"],
        "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P"
    );
}

#[tokio::test]
async fn test_mention_event_gets_a_reply() {
    let (server, transport, _) = server(&[], MONDAY);

    let response = server
        .post("/slack/events")
        .json(&json!({
            "type": "event_callback",
            "event_id": "Ev1",
            "event": {
                "type": "app_mention",
                "channel": "C1",
                "user": "U1",
                "text": "<@UBOT> help",
                "ts": "1.0"
            }
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(wait_for(|| !transport.posts().is_empty()).await);
    assert_eq!(
        transport.last_post().headline,
        "Supported commands: *help, when, poll, teams*"
    );
}

#[tokio::test]
async fn test_bot_echo_is_not_answered() {
    let (server, transport, _) = server(&[], MONDAY);

    let response = server
        .post("/slack/events")
        .json(&json!({
            "type": "event_callback",
            "event": {
                "type": "message",
                "subtype": "bot_message",
                "bot_id": "B1",
                "channel": "C1",
                "text": "<@UBOT> help"
            }
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_malformed_bodies_still_get_ok() {
    let (server, transport, _) = server(&[], MONDAY);

    let not_json = server.post("/slack/events").text("definitely not json").await;
    assert_eq!(not_json.status_code(), StatusCode::OK);

    let unreadable_event = server
        .post("/slack/events")
        .json(&json!({"type": "event_callback", "event": {"type": "message"}}))
        .await;
    assert_eq!(unreadable_event.status_code(), StatusCode::OK);

    let unsupported = server
        .post("/slack/events")
        .json(&json!({"type": "app_rate_limited"}))
        .await;
    assert_eq!(unsupported.status_code(), StatusCode::OK);

    let bad_action = server
        .post("/slack/action")
        .form(&[("payload", "{not json")])
        .await;
    assert_eq!(bad_action.status_code(), StatusCode::OK);

    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_button_press_is_acknowledged_with_empty_body() {
    let (server, transport, coordinator) = server(&["A", "B"], TUESDAY);
    coordinator
        .on_intent(Intent::Poll, &football_channel())
        .await
        .expect("poll should start");

    let payload = json!({
        "actions": [{"name": "weekly_game_res", "type": "button", "value": "yes"}],
        "callback_id": "weekly_game",
        "user": {"id": "A", "name": "alex"}
    })
    .to_string();
    let response = server
        .post("/slack/action")
        .form(&[("payload", payload.as_str())])
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "");
    assert!(wait_for(|| transport.updates().len() == 1).await);
    assert_eq!(coordinator.status().await.yes, 1);
}

#[tokio::test]
async fn test_unknown_action_is_acknowledged_and_ignored() {
    let (server, transport, coordinator) = server(&["A"], TUESDAY);
    coordinator
        .on_intent(Intent::Poll, &football_channel())
        .await
        .expect("poll should start");
    transport.clear_calls();

    let payload = json!({
        "actions": [{"name": "something_else", "value": "yes"}],
        "user": {"id": "A"}
    })
    .to_string();
    let response = server
        .post("/slack/action")
        .form(&[("payload", payload.as_str())])
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(transport.calls().is_empty());
    assert_eq!(coordinator.status().await.phase, Phase::PollOpen);
    assert_eq!(coordinator.status().await.yes, 0);
}

#[tokio::test]
async fn test_message_and_app_mention_for_one_post_answer_once() {
    let (server, transport, _) = server(&["A", "B"], TUESDAY);

    for event_type in ["message", "app_mention"] {
        let response = server
            .post("/slack/events")
            .json(&json!({
                "type": "event_callback",
                "event": {
                    "type": event_type,
                    "channel": FOOTBALL_CHANNEL,
                    "user": "U1",
                    "text": "<@UBOT> poll",
                    "ts": "1700000000.000200"
                }
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    assert!(wait_for(|| transport.posts().len() == 1).await);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(transport.posts().len(), 1);
    assert_eq!(transport.member_lookups(), 1);
}

#[tokio::test]
async fn test_press_on_foreign_attachment_is_ignored() {
    let (server, transport, coordinator) = server(&["A"], TUESDAY);
    coordinator
        .on_intent(Intent::Poll, &football_channel())
        .await
        .expect("poll should start");
    transport.clear_calls();

    let payload = json!({
        "actions": [{"name": "weekly_game_res", "type": "button", "value": "yes"}],
        "callback_id": "standup_reminder",
        "user": {"id": "A"}
    })
    .to_string();
    let response = server
        .post("/slack/action")
        .form(&[("payload", payload.as_str())])
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(transport.calls().is_empty());
    assert_eq!(coordinator.status().await.yes, 0);
}
