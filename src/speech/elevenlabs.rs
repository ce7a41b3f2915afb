// ElevenLabs text-to-speech and speech-to-text client
// API Reference: https://elevenlabs.io/docs/api-reference

use crate::config::SpeechConfig;
use crate::speech::{SpeechError, SpeechService};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const STABILITY: f32 = 0.5;
const SIMILARITY_BOOST: f32 = 0.8;

pub struct ElevenLabsClient {
    client: Client,
    api_key: String,
    base_url: String,
    voice_id: String,
    tts_model: String,
    stt_model: String,
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

impl ElevenLabsClient {
    /// `None` when no API key is configured; voice routes are then disabled
    pub fn from_config(config: &SpeechConfig) -> Result<Option<Self>, SpeechError> {
        let Some(api_key) = config.elevenlabs_api_key.clone() else {
            return Ok(None);
        };

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Some(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            voice_id: config.voice_id.clone(),
            tts_model: config.tts_model.clone(),
            stt_model: config.stt_model.clone(),
        }))
    }

    async fn check(response: Response) -> Result<Response, SpeechError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(SpeechError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl SpeechService for ElevenLabsClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let body = SynthesisRequest {
            text,
            model_id: &self.tts_model,
            voice_settings: VoiceSettings {
                stability: STABILITY,
                similarity_boost: SIMILARITY_BOOST,
            },
        };

        debug!(chars = text.len(), voice_id = %self.voice_id, "Synthesizing speech");
        let response = self
            .client
            .post(format!("{}/v1/text-to-speech/{}", self.base_url, self.voice_id))
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&body)
            .send()
            .await?;

        let audio = Self::check(response).await?.bytes().await?;
        info!(bytes = audio.len(), "Synthesized speech");
        Ok(audio.to_vec())
    }

    async fn transcribe(&self, audio: Vec<u8>, filename: &str, mime_type: &str) -> Result<String, SpeechError> {
        let file = Part::bytes(audio)
            .file_name(filename.to_string())
            .mime_str(mime_type)?;
        let form = Form::new()
            .part("file", file)
            .text("model_id", self.stt_model.clone());

        let response = self
            .client
            .post(format!("{}/v1/speech-to-text", self.base_url))
            .header("xi-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await?;

        let transcript: TranscriptionResponse = Self::check(response).await?.json().await?;
        let text = transcript.text.trim().to_string();
        if text.is_empty() {
            return Err(SpeechError::EmptyTranscript);
        }

        info!(chars = text.len(), "Transcribed audio");
        Ok(text)
    }
}
