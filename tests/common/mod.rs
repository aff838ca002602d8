#![allow(dead_code)]

use axum_test::TestServer;
use lead_relay::core::AppState;
use lead_relay::store::MemoryStore;
use std::sync::Arc;

pub const TEST_JWT_SECRET: &str = "test-session-secret";
pub const TEST_WIDGET_KEY: &str = "test-widget-key";

/// Creates an AppState backed by the in-memory store.
pub fn create_test_state() -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(MemoryStore::new()),
        TEST_JWT_SECRET.to_string(),
        TEST_WIDGET_KEY.to_string(),
    ))
}

/// Creates a TestServer over the full application router.
pub fn create_test_server(state: Arc<AppState>) -> TestServer {
    let app = lead_relay::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Mints an agent session token, the way the external login service
/// would.
pub fn create_test_jwt(agent_id: i32, name: &str) -> String {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Claims {
        id: i32,
        name: String,
        exp: usize,
        iat: usize,
    }

    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::hours(24))
        .expect("valid timestamp")
        .timestamp() as usize;

    let claims = Claims {
        id: agent_id,
        name: name.to_string(),
        exp: expiration,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to create JWT token")
}
