use std::path::Path;
use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::fs;
use tracing::debug;

use crate::config::{resolve_api_key, SpeechConfig};
use crate::error::{Result, VoxlateError};
use super::{AudioFormat, RecognitionResult, SpeechClient, SynthesisResult};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecognitionResponse {
    recognition_status: String,
    #[serde(default)]
    display_text: Option<String>,
}

/// Speech client backed by the Cognitive Services speech REST endpoints.
pub struct AzureSpeechClient {
    client: Client,
    config: SpeechConfig,
    api_key: String,
}

impl AzureSpeechClient {
    pub fn new(config: SpeechConfig) -> Result<Self> {
        if config.region.is_empty() {
            return Err(VoxlateError::Config(
                "Speech service region is not configured".to_string(),
            ));
        }

        let api_key = resolve_api_key(config.api_key.as_deref(), "AZURE_SPEECH_KEY")?;

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| VoxlateError::Speech(format!("HTTP client creation failed: {}", e)))?;

        Ok(Self { client, config, api_key })
    }

    fn synthesis_url(&self) -> String {
        format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            self.config.region
        )
    }

    fn recognition_url(&self, locale: &str) -> String {
        format!(
            "https://{}.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1?language={}&format=simple",
            self.config.region, locale
        )
    }
}

#[async_trait]
impl SpeechClient for AzureSpeechClient {
    async fn synthesize_to_bytes(
        &self,
        text: &str,
        voice_id: &str,
        format: AudioFormat,
    ) -> Result<SynthesisResult> {
        let url = self.synthesis_url();
        let ssml = build_ssml(text, voice_id);

        debug!("Sending synthesis request to: {}", url);

        let response = self.client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", format.as_output_format())
            .header("User-Agent", "voxlate")
            .body(ssml)
            .send()
            .await
            .map_err(|e| VoxlateError::Speech(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            // Service-level failures surface as a canceled synthesis with the
            // response body as the error detail, matching the SDK's
            // cancellation reporting.
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Ok(SynthesisResult::Canceled {
                reason: "Error".to_string(),
                error_detail: Some(format!("{}: {}", status, error_text)),
            });
        }

        let audio = response.bytes().await
            .map_err(|e| VoxlateError::Speech(format!("Failed to read audio body: {}", e)))?;

        Ok(SynthesisResult::Completed { audio: audio.to_vec() })
    }

    async fn recognize_from_file(&self, path: &Path, locale: &str) -> Result<RecognitionResult> {
        if !path.exists() {
            return Err(VoxlateError::FileNotFound(path.display().to_string()));
        }

        let audio = fs::read(path).await?;
        let url = self.recognition_url(locale);

        debug!("Sending recognition request to: {}", url);

        let response = self.client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("Content-Type", "audio/wav; codecs=audio/pcm; samplerate=16000")
            .body(audio)
            .send()
            .await
            .map_err(|e| VoxlateError::Speech(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Ok(RecognitionResult::Canceled {
                reason: "Error".to_string(),
                error_detail: Some(format!("{}: {}", status, error_text)),
            });
        }

        let recognition: RecognitionResponse = response.json().await
            .map_err(|e| VoxlateError::Speech(format!("Failed to parse response: {}", e)))?;

        Ok(match recognition.recognition_status.as_str() {
            "Success" => RecognitionResult::Recognized {
                text: recognition.display_text.unwrap_or_default(),
            },
            "NoMatch" => RecognitionResult::NoMatch,
            other => RecognitionResult::Other { reason: other.to_string() },
        })
    }
}

/// Build the SSML document for one synthesis request. The document locale is
/// derived from the voice identifier prefix (e.g. "es-ES-AlvaroNeural").
fn build_ssml(text: &str, voice_id: &str) -> String {
    format!(
        "<speak version='1.0' xml:lang='{lang}'><voice name='{voice}'>{text}</voice></speak>",
        lang = voice_locale(voice_id),
        voice = voice_id,
        text = escape_xml(text),
    )
}

fn voice_locale(voice_id: &str) -> String {
    voice_id.splitn(3, '-').take(2).collect::<Vec<_>>().join("-")
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&apos;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_locale_from_voice_id() {
        assert_eq!(voice_locale("es-ES-AlvaroNeural"), "es-ES");
        assert_eq!(voice_locale("ja-JP-KeitaNeural"), "ja-JP");
    }

    #[test]
    fn test_xml_escaping() {
        assert_eq!(escape_xml("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_xml("it's \"quoted\""), "it&apos;s &quot;quoted&quot;");
    }

    #[test]
    fn test_ssml_document() {
        let ssml = build_ssml("¿cómo estás?", "es-ES-AlvaroNeural");
        assert!(ssml.contains("xml:lang='es-ES'"));
        assert!(ssml.contains("<voice name='es-ES-AlvaroNeural'>¿cómo estás?</voice>"));
    }

    #[tokio::test]
    async fn test_recognize_missing_file() {
        let client = AzureSpeechClient::new(SpeechConfig {
            region: "eastus".to_string(),
            api_key: Some("test-key".to_string()),
        })
        .unwrap();

        let result = client
            .recognize_from_file(Path::new("/nonexistent/audio.wav"), "es-ES")
            .await;

        assert!(matches!(result, Err(VoxlateError::FileNotFound(_))));
    }

    #[test]
    fn test_recognition_response_decoding() {
        let payload = r#"{"RecognitionStatus":"Success","DisplayText":"Hello there.","Offset":0,"Duration":12000000}"#;
        let decoded: RecognitionResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(decoded.recognition_status, "Success");
        assert_eq!(decoded.display_text.as_deref(), Some("Hello there."));

        let payload = r#"{"RecognitionStatus":"NoMatch"}"#;
        let decoded: RecognitionResponse = serde_json::from_str(payload).unwrap();
        assert!(decoded.display_text.is_none());
    }
}
