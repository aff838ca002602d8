//! Integration tests for the widget bootstrap endpoint.

mod common;

use axum::http::StatusCode;
use common::*;
use lead_relay::domain::SenderType;
use lead_relay::dtos::SessionDTO;
use lead_relay::store::{ConversationFilter, ConversationStore};

fn ana_payload() -> serde_json::Value {
    serde_json::json!({
        "name": "Ana",
        "email": "ana@x.com",
        "property_ref": "P1"
    })
}

#[tokio::test]
async fn bootstrap_requires_the_shared_key() {
    let server = create_test_server(create_test_state());

    let response = server.post("/widget/session").json(&ana_payload()).await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .post("/widget/session")
        .add_header("x-api-key", "wrong-key")
        .json(&ana_payload())
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn first_contact_creates_a_conversation_with_empty_history() {
    let state = create_test_state();
    let server = create_test_server(state.clone());

    let response = server
        .post("/widget/session")
        .add_header("x-api-key", TEST_WIDGET_KEY)
        .json(&ana_payload())
        .await;

    response.assert_status(StatusCode::OK);
    let session: SessionDTO = response.json();
    assert!(session.history.is_empty());

    let conversation = state
        .store
        .get_conversation(session.conversation_id)
        .await
        .unwrap();
    assert_eq!(conversation.visitor_name, "Ana");
    assert_eq!(conversation.property_ref.as_deref(), Some("P1"));
    assert_eq!(conversation.unread_count, 0);
}

#[tokio::test]
async fn resuming_returns_the_same_conversation_and_its_history() {
    let state = create_test_state();
    let server = create_test_server(state.clone());

    let first: SessionDTO = server
        .post("/widget/session")
        .add_header("x-api-key", TEST_WIDGET_KEY)
        .json(&ana_payload())
        .await
        .json();
    state
        .store
        .append_message(first.conversation_id, SenderType::Visitor, "Olá, tem garagem?")
        .await
        .unwrap();

    let second: SessionDTO = server
        .post("/widget/session")
        .add_header("x-api-key", TEST_WIDGET_KEY)
        .json(&ana_payload())
        .await
        .json();

    // Same open conversation, no duplicate row.
    assert_eq!(first.conversation_id, second.conversation_id);
    assert_eq!(second.history.len(), 1);
    assert_eq!(second.history[0].content, "Olá, tem garagem?");

    let open = state
        .store
        .list_conversations(ConversationFilter::default())
        .await
        .unwrap();
    assert_eq!(open.len(), 1);
}

#[tokio::test]
async fn a_different_property_opens_a_separate_conversation() {
    let server = create_test_server(create_test_state());

    let first: SessionDTO = server
        .post("/widget/session")
        .add_header("x-api-key", TEST_WIDGET_KEY)
        .json(&ana_payload())
        .await
        .json();

    let second: SessionDTO = server
        .post("/widget/session")
        .add_header("x-api-key", TEST_WIDGET_KEY)
        .json(&serde_json::json!({
            "name": "Ana",
            "email": "ana@x.com",
            "property_ref": "P2"
        }))
        .await
        .json();

    assert_ne!(first.conversation_id, second.conversation_id);
}

#[tokio::test]
async fn invalid_identity_is_rejected() {
    let server = create_test_server(create_test_state());

    let response = server
        .post("/widget/session")
        .add_header("x-api-key", TEST_WIDGET_KEY)
        .json(&serde_json::json!({
            "name": "Ana",
            "email": "not-an-email"
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/widget/session")
        .add_header("x-api-key", TEST_WIDGET_KEY)
        .json(&serde_json::json!({
            "name": "",
            "email": "ana@x.com"
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
