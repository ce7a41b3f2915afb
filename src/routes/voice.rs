use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::{info, warn};

use crate::agent::Outcome;
use crate::intent::IntentKind;
use crate::middleware::OptionalSession;
use crate::models::{AppState, ChatResponse};
use crate::payment::Failure;
use crate::types::{AppError, AppResult};

/// Upper bound for one uploaded voice clip
const MAX_AUDIO_BYTES: usize = 10 * 1024 * 1024;

pub const UNINTELLIGIBLE_REPLY: &str =
    "Sorry, I couldn't understand the audio. Please type your request instead.";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/voice", post(post_voice))
        .layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES))
}

/// Base64 MP3 of `text`; `None` when speech is off or synthesis fails
pub(crate) async fn synthesize_reply(state: &AppState, text: &str) -> Option<String> {
    let speech = state.services.speech.as_ref()?;
    match speech.synthesize(text).await {
        Ok(audio) => Some(BASE64.encode(audio)),
        Err(e) => {
            warn!(error = %e, "Speech synthesis failed, replying with text only");
            None
        }
    }
}

struct VoiceUpload {
    audio: Vec<u8>,
    filename: String,
    mime_type: String,
    speak: bool,
}

async fn read_upload(mut multipart: Multipart) -> AppResult<VoiceUpload> {
    let mut upload: Option<(Vec<u8>, String, String)> = None;
    let mut speak = true;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(e.to_string()))?
    {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("recording.webm").to_string();
                let mime_type = field.content_type().unwrap_or("audio/webm").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidRequest(e.to_string()))?;
                upload = Some((bytes.to_vec(), filename, mime_type));
            }
            Some("speak") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidRequest(e.to_string()))?;
                speak = !matches!(value.trim(), "false" | "0" | "no");
            }
            _ => {}
        }
    }

    let (audio, filename, mime_type) =
        upload.ok_or_else(|| AppError::InvalidRequest("multipart field 'file' is required".to_string()))?;
    if audio.is_empty() {
        return Err(AppError::InvalidRequest("uploaded audio is empty".to_string()));
    }

    Ok(VoiceUpload {
        audio,
        filename,
        mime_type,
        speak,
    })
}

/// Transcribe an uploaded clip, run it through the pipeline, and speak the reply
async fn post_voice(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
    multipart: Multipart,
) -> AppResult<Json<ChatResponse>> {
    let speech = state
        .services
        .speech
        .clone()
        .ok_or_else(|| AppError::InvalidRequest("Voice input is not configured".to_string()))?;

    let upload = read_upload(multipart).await?;
    info!(bytes = upload.audio.len(), mime_type = %upload.mime_type, "Received voice request");

    let transcript = match speech
        .transcribe(upload.audio, &upload.filename, &upload.mime_type)
        .await
    {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Transcription failed");
            let outcome = Outcome::Failed(Failure::UpstreamError { message: e.to_string() });
            return Ok(Json(ChatResponse {
                intent: IntentKind::Unknown,
                message: UNINTELLIGIBLE_REPLY.to_string(),
                status: outcome.status(),
                requires_auth: false,
                reference: None,
                failure: outcome.failure().cloned(),
                outcome,
                transcript: None,
                audio: None,
            }));
        }
    };

    let reply = state.agent.process(&transcript, session.as_ref()).await;
    let mut response = ChatResponse::from_reply(reply);
    response.transcript = Some(transcript);
    if upload.speak {
        response.audio = synthesize_reply(&state, &response.message).await;
    }
    Ok(Json(response))
}
