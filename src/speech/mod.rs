// Speech synthesis and recognition provider
//
// Provider outcomes are normalized into one result variant per call at the
// adapter boundary: synthesis completes, is canceled, or ends for an unknown
// reason, and recognition adds a no-match case with the same reason shape.

pub mod azure;

use std::path::Path;
use async_trait::async_trait;

use crate::config::SpeechConfig;
use crate::error::Result;

/// Audio encoding requested from the synthesis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// MP3, 16 kHz, 32 kbit/s, mono
    Mp3Mono16Khz32Kbps,
}

impl AudioFormat {
    pub fn as_output_format(&self) -> &'static str {
        match self {
            Self::Mp3Mono16Khz32Kbps => "audio-16khz-32kbitrate-mono-mp3",
        }
    }
}

/// Normalized outcome of one synthesis call.
#[derive(Debug, Clone)]
pub enum SynthesisResult {
    /// Synthesis completed; audio captured in memory
    Completed { audio: Vec<u8> },
    /// Synthesis was canceled, with the provider's error detail when the
    /// cancellation was caused by an internal error
    Canceled { reason: String, error_detail: Option<String> },
    /// Any other completion reason, carried literally
    Other { reason: String },
}

/// Normalized outcome of one recognition call.
#[derive(Debug, Clone)]
pub enum RecognitionResult {
    Recognized { text: String },
    NoMatch,
    Canceled { reason: String, error_detail: Option<String> },
    Other { reason: String },
}

/// Main trait for speech operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechClient: Send + Sync {
    /// Synthesize text with the given voice into an in-memory byte buffer
    async fn synthesize_to_bytes(
        &self,
        text: &str,
        voice_id: &str,
        format: AudioFormat,
    ) -> Result<SynthesisResult>;

    /// Recognize speech from an audio file in the given locale
    async fn recognize_from_file(&self, path: &Path, locale: &str) -> Result<RecognitionResult>;
}

/// Factory for creating speech client instances
pub struct SpeechClientFactory;

impl SpeechClientFactory {
    pub fn create(config: SpeechConfig) -> Result<Box<dyn SpeechClient>> {
        Ok(Box::new(azure::AzureSpeechClient::new(config)?))
    }
}
