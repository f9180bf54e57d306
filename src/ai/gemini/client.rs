use super::types::{GenerateContentRequest, GenerateContentResponse};
use crate::models::{ApiKey, DEFAULT_BASE_URL};
use crate::{Error, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Raw provider outcome relayed by the proxy without interpretation.
#[derive(Debug)]
pub struct ProviderReply {
    pub status: StatusCode,
    pub body: serde_json::Value,
}

/// Lightweight Gemini REST client for the `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiHttpClient {
    client: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiHttpClient {
    /// Construct a Gemini client.
    ///
    /// `model` should be the bare model ID (for example `gemini-2.5-flash`),
    /// not a `models/...`-prefixed path segment.
    pub fn new(api_key: ApiKey, model: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, model, timeout, Client::new())
    }

    pub fn new_with_client(
        api_key: ApiKey,
        model: String,
        timeout: Duration,
        client: Client,
    ) -> Self {
        let model = model.strip_prefix("models/").unwrap_or(&model).to_string();

        Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Returns the configured model ID without the `models/` prefix.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    async fn send(&self, request: &GenerateContentRequest) -> Result<reqwest::Response> {
        tracing::debug!("Sending generateContent request to Gemini ({})", self.model);

        let response = self
            .client
            .post(self.endpoint())
            .timeout(self.timeout)
            .header("x-goog-api-key", self.api_key.expose())
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Gemini: {}", e);
                e
            })?;

        Ok(response)
    }

    /// Calls `generateContent` and decodes the reply; non-success is an upstream error.
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let response = self.send(request).await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("Gemini API error (status {}): {}", status, error_text);
            return Err(Error::Upstream(format!(
                "Gemini API error (status {}): {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}\nBody: {}", e, body);
            Error::Upstream(format!("Failed to parse Gemini response: {}", e))
        })
    }

    /// Calls `generateContent` and returns the provider's status and JSON body as-is.
    pub async fn forward_generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<ProviderReply> {
        let response = self.send(request).await?;
        let status = response.status();
        let body = response.text().await?;

        let body = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                "Gemini returned a non-JSON body (status {}): {}",
                status,
                body
            );
            Error::Upstream(format!(
                "Failed to parse Gemini response (status {}): {}",
                status, e
            ))
        })?;

        if !status.is_success() {
            tracing::warn!("Gemini API returned status {}", status);
        }

        Ok(ProviderReply { status, body })
    }
}
