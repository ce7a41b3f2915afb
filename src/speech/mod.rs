//! Voice input and output
//!
//! Speech is an optional surface around the chat pipeline: audio is transcribed
//! to text before intent resolution, and replies can be synthesized back to audio.

pub mod elevenlabs;

pub use elevenlabs::ElevenLabsClient;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Transcription was empty")]
    EmptyTranscript,

    #[error("Nothing to synthesize")]
    EmptyText,
}

#[async_trait]
pub trait SpeechService: Send + Sync {
    /// MP3 audio for `text`
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError>;

    /// Text spoken in `audio`
    async fn transcribe(&self, audio: Vec<u8>, filename: &str, mime_type: &str) -> Result<String, SpeechError>;
}
