use super::gemini::types::GenerateContentResponse;
use super::DetectionBackend;
use crate::media::{EncodedMedia, MediaType};
use crate::models::DetectRequest;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const DETECT_PATH: &str = "/api/detect";

/// Calls the detect proxy, which holds the provider credential.
///
/// The proxy uses its own fixed prompt and MIME type, so `media_type` and
/// the file's MIME type only affect logging here.
pub struct ProxyDetectionClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl ProxyDetectionClient {
    pub fn new(proxy_url: &str) -> Self {
        Self::new_with_client(proxy_url, Duration::from_secs(60), Client::new())
    }

    pub fn new_with_client(proxy_url: &str, timeout: Duration, client: Client) -> Self {
        Self {
            client,
            endpoint: format!("{}{}", proxy_url.trim_end_matches('/'), DETECT_PATH),
            timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Best-effort error text from a proxy failure body.
    fn error_message(body: &str) -> String {
        let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let from_json = parsed.as_ref().and_then(|v| {
            let error = v.get("error")?;
            error
                .as_str()
                .or_else(|| error.get("message").and_then(|m| m.as_str()))
                .map(str::to_string)
        });
        from_json.unwrap_or_else(|| body.trim().to_string())
    }
}

#[async_trait]
impl DetectionBackend for ProxyDetectionClient {
    async fn generate_reply(&self, media: &EncodedMedia, media_type: MediaType) -> Result<String> {
        tracing::debug!(
            "Requesting {} analysis via proxy {} ({})",
            media_type,
            self.endpoint,
            media.mime_type
        );

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&DetectRequest::new(media.data.clone()))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach detect proxy: {}", e);
                e
            })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = Self::error_message(&body);
            tracing::error!("Detect proxy error (status {}): {}", status, message);
            return Err(Error::Upstream(format!(
                "Proxy error (status {}): {}",
                status, message
            )));
        }

        let response: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            Error::Upstream(format!("Failed to parse proxy response: {}", e))
        })?;

        response.reply_text().ok_or(Error::EmptyResponse)
    }
}
