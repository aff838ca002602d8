use crate::core::{AppError, AppState};
use axum::extract::State;
use axum::{body::Body, extract::Request, http, http::Response, middleware::Next};
use jsonwebtoken::{DecodingKey, TokenData, Validation, decode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Contents of an agent session token. Tokens are issued by the login
/// service, which lives outside this crate; here they are only
/// validated.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub exp: usize,
    pub iat: usize,
    pub id: i32,
    pub name: String,
}

/// The authenticated agent, inserted into request extensions by
/// [`agent_auth_middleware`] and read by handlers and the gateway.
#[derive(Debug, Clone)]
pub struct AgentContext {
    pub agent_id: i32,
    pub name: String,
}

#[instrument(skip(jwt_token, secret))]
pub fn decode_jwt(
    jwt_token: &str,
    secret: &str,
) -> Result<TokenData<Claims>, jsonwebtoken::errors::Error> {
    debug!("Decoding session token");
    decode(
        jwt_token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
}

/// Validates the bearer token and inserts an [`AgentContext`] for the
/// downstream handler. Authorization failures refuse the request
/// before any socket upgrade happens.
#[instrument(skip(state, req, next))]
pub async fn agent_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            warn!("Missing authorization header");
            AppError::unauthorized("Please add the session token to the header")
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        warn!("Authorization header is not a bearer token");
        AppError::unauthorized("Expected a bearer token")
    })?;

    let token_data = decode_jwt(token, &state.jwt_secret).map_err(|_| {
        warn!("Failed to decode session token");
        AppError::unauthorized("Unable to decode token")
    })?;

    debug!(agent_id = token_data.claims.id, "Agent authenticated");
    req.extensions_mut().insert(AgentContext {
        agent_id: token_data.claims.id,
        name: token_data.claims.name,
    });
    Ok(next.run(req).await)
}

/// Shared-key check for widget-facing endpoints. Anti-abuse only, not
/// real authentication.
pub fn require_widget_key(provided: Option<&str>, expected: &str) -> Result<(), AppError> {
    match provided {
        Some(key) if key == expected => Ok(()),
        Some(_) => {
            warn!("Invalid widget API key");
            Err(AppError::unauthorized("Invalid widget API key"))
        }
        None => {
            warn!("Missing widget API key");
            Err(AppError::unauthorized("Missing widget API key"))
        }
    }
}
