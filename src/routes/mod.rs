//! API Routes
//!
//! - `/api/auth/register`, `/api/auth/login` - accounts and session tokens
//! - `/api/chat` - text commands through the pipeline
//! - `/api/voice` - spoken commands (multipart audio upload)
//! - `/api/wallet/*` - direct wallet queries and form transfers (bearer token)
//! - `/api/health` - liveness

pub mod auth;
pub mod chat;
pub mod health;
pub mod voice;
pub mod wallet;

use axum::{middleware::from_fn_with_state, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::{cors_layer, rate_limiter_middleware};
use crate::models::AppState;

/// Create the main application router
///
/// Routes that reach the payment or speech services share one rate limit.
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let limited = Router::new()
        .merge(chat::router())
        .merge(voice::router())
        .merge(wallet::transfer_router())
        .route_layer(from_fn_with_state(state.clone(), rate_limiter_middleware));

    Router::new()
        .merge(auth::router())
        .merge(wallet::router())
        .merge(health::router())
        .merge(limited)
        .layer(cors_layer(&state.config.server.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
