use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::info;
use validator::Validate;

use crate::directory::UserStore;
use crate::models::{AppState, AuthResponse, LoginRequest, RegisterRequest};
use crate::session::{issue_token, Session};
use crate::types::{AppError, AppResult};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}

fn auth_response(state: &AppState, session: Session) -> AppResult<AuthResponse> {
    let ttl = state.config.auth.max_jwt_expiration;
    let token = issue_token(&session, &state.config.auth.secret, ttl)?;
    Ok(AuthResponse {
        token,
        username: session.username,
        wallet_id: session.account.wallet_id,
        address: session.account.address,
        expires_in: ttl,
    })
}

/// Create a wallet for a new user, store the user, and log them in
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    request.validate()?;
    // A taken or in-flight name must not provision a wallet
    let reservation = state.users.reserve(&request.username).await?;
    let username = reservation.username().to_string();

    let account = state.services.provisioner.create_wallet(&username).await?;
    reservation.register(&request.password, account.clone()).await?;
    info!(username = %username, wallet_id = %account.wallet_id, "User registered");

    let response = auth_response(&state, Session::new(username, account))?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    request.validate()?;

    let account = state
        .users
        .login(&request.username, &request.password)
        .await?
        .ok_or_else(|| AppError::Auth("Invalid username or password".to_string()))?;

    let username = UserStore::normalize_username(&request.username)?;
    info!(username = %username, "User logged in");
    Ok(Json(auth_response(&state, Session::new(username, account))?))
}
