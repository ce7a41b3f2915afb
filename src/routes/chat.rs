use axum::{extract::State, routing::post, Json, Router};
use tracing::info;
use validator::Validate;

use crate::middleware::OptionalSession;
use crate::models::{AppState, ChatRequest, ChatResponse};
use crate::routes::voice::synthesize_reply;
use crate::types::AppResult;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/chat", post(post_chat))
}

/// Run one text command through the pipeline
pub async fn post_chat(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    request.validate()?;
    info!(
        message_len = request.message.len(),
        authenticated = session.is_some(),
        "Received chat request"
    );

    let reply = state.agent.process(&request.message, session.as_ref()).await;
    let mut response = ChatResponse::from_reply(reply);
    if request.speak {
        response.audio = synthesize_reply(&state, &response.message).await;
    }

    info!(intent = %response.intent, status = response.status, "Chat response sent");
    Ok(Json(response))
}
