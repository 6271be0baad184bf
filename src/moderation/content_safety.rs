use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{resolve_api_key, ModerationConfig};
use crate::error::{Result, VoxlateError};
use super::{CategorySeverity, ModerationAnalysis, Moderator};

#[derive(Debug, Clone, Serialize)]
struct AnalyzeTextRequest {
    text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeTextResponse {
    #[serde(default)]
    categories_analysis: Vec<CategoryAnalysis>,
}

#[derive(Debug, Clone, Deserialize)]
struct CategoryAnalysis {
    category: String,
    #[serde(default)]
    severity: u8,
}

/// Moderator backed by a Content Safety text-analysis REST endpoint.
pub struct ContentSafetyModerator {
    client: Client,
    config: ModerationConfig,
    api_key: String,
}

impl ContentSafetyModerator {
    pub fn new(config: ModerationConfig) -> Result<Self> {
        if config.endpoint.is_empty() {
            return Err(VoxlateError::Config(
                "Moderation endpoint is not configured".to_string(),
            ));
        }

        let api_key = resolve_api_key(config.api_key.as_deref(), "AZURE_CONTENT_SAFETY_KEY")?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| VoxlateError::Moderation(format!("HTTP client creation failed: {}", e)))?;

        Ok(Self { client, config, api_key })
    }
}

#[async_trait]
impl Moderator for ContentSafetyModerator {
    async fn analyze_text(&self, text: &str) -> Result<ModerationAnalysis> {
        let url = format!(
            "{}/contentsafety/text:analyze?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.api_version
        );

        debug!("Sending moderation request to: {}", url);

        let response = self.client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .json(&AnalyzeTextRequest { text: text.to_string() })
            .send()
            .await
            .map_err(|e| VoxlateError::Moderation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VoxlateError::Moderation(format!(
                "Moderation API error {}: {}", status, error_text
            )));
        }

        let analysis: AnalyzeTextResponse = response.json().await
            .map_err(|e| VoxlateError::Moderation(format!("Failed to parse response: {}", e)))?;

        Ok(ModerationAnalysis {
            categories: analysis
                .categories_analysis
                .into_iter()
                .map(|c| CategorySeverity { name: c.category, severity: c.severity })
                .collect(),
        })
    }
}
