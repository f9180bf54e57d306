use super::client::GeminiHttpClient;
use super::types::GenerateContentRequest;
use crate::ai::DetectionBackend;
use crate::media::{EncodedMedia, MediaType};
use crate::models::{ApiKey, Config};
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Calls Gemini directly with a credential available to this process.
pub struct GeminiDetectionClient {
    http: GeminiHttpClient,
}

impl GeminiDetectionClient {
    pub fn new(api_key: ApiKey, model: String) -> Self {
        Self::new_with_client(api_key, model, Duration::from_secs(60), reqwest::Client::new())
    }

    pub fn new_with_client(
        api_key: ApiKey,
        model: String,
        timeout: Duration,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(api_key, model, timeout, client),
        }
    }

    /// Build from configuration; fails when no credential is configured.
    pub fn from_config(config: &Config, client: reqwest::Client) -> Result<Self> {
        let api_key = config.require_api_key()?.clone();
        let http = GeminiHttpClient::new_with_client(
            api_key,
            config.gemini_model.clone(),
            config.request_timeout,
            client,
        )
        .with_base_url(config.gemini_base_url.clone());
        Ok(Self { http })
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl DetectionBackend for GeminiDetectionClient {
    async fn generate_reply(&self, media: &EncodedMedia, media_type: MediaType) -> Result<String> {
        tracing::debug!(
            "Requesting {} analysis from Gemini ({}, {} base64 chars)",
            media_type,
            media.mime_type,
            media.data.len()
        );

        let request = GenerateContentRequest::with_inline_media(
            prompts::analysis_prompt(media_type),
            media.mime_type.clone(),
            media.data.clone(),
        );

        let response = self.http.generate_content(&request).await?;

        response.reply_text().ok_or(Error::EmptyResponse)
    }
}
