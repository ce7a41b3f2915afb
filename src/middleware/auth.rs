// Bearer token extraction
//
// Handlers take `RequireSession` when a wallet is needed and `OptionalSession`
// when the pipeline decides for itself (chat and voice).

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use tracing::debug;

use crate::models::AppState;
use crate::session::{verify_token, Session};
use crate::types::AppError;

pub struct RequireSession(pub Session);

pub struct OptionalSession(pub Option<Session>);

fn bearer_token(parts: &Parts) -> Result<Option<&str>, AppError> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AppError::Auth("Authorization header is not valid text".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(|token| Some(token.trim()))
        .ok_or_else(|| AppError::Auth("Expected a Bearer token".to_string()))
}

fn session_from(parts: &Parts, state: &AppState) -> Result<Option<Session>, AppError> {
    let Some(token) = bearer_token(parts)? else {
        return Ok(None);
    };
    let session = verify_token(token, &state.config.auth.secret).map_err(|e| {
        debug!(error = %e, "Rejected session token");
        AppError::Auth("Session expired or invalid, please login again".to_string())
    })?;
    Ok(Some(session))
}

impl FromRequestParts<AppState> for RequireSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        session_from(parts, state)?
            .map(RequireSession)
            .ok_or_else(|| AppError::Auth("Please login first".to_string()))
    }
}

impl FromRequestParts<AppState> for OptionalSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(OptionalSession(session_from(parts, state)?))
    }
}
