use super::DetectionBackend;
use crate::media::{EncodedMedia, MediaType};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Canned-reply backend for tests and local harnesses.
pub struct MockDetectionClient {
    responses: Arc<Mutex<Vec<String>>>,
    seen: Arc<Mutex<Vec<(EncodedMedia, MediaType)>>>,
    fail_with: Option<String>,
}

impl MockDetectionClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            seen: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push(response.into());
        self
    }

    /// Every call fails with an upstream error carrying `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<(EncodedMedia, MediaType)> {
        self.seen.lock().unwrap().last().cloned()
    }
}

impl Default for MockDetectionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DetectionBackend for MockDetectionClient {
    async fn generate_reply(&self, media: &EncodedMedia, media_type: MediaType) -> Result<String> {
        let count = {
            let mut seen = self.seen.lock().unwrap();
            seen.push((media.clone(), media_type));
            seen.len()
        };

        if let Some(message) = &self.fail_with {
            return Err(Error::Upstream(message.clone()));
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok("Verdict: Inconclusive\nReasoning: Mock analysis.".to_string())
        } else {
            let index = (count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media() -> EncodedMedia {
        EncodedMedia {
            mime_type: "image/png".to_string(),
            data: "iVBO".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_cycles_custom_responses() {
        let client = MockDetectionClient::new()
            .with_response("Verdict: Real")
            .with_response("Verdict: AI-Generated");

        assert_eq!(
            client.generate_reply(&media(), MediaType::Image).await.unwrap(),
            "Verdict: Real"
        );
        assert_eq!(
            client.generate_reply(&media(), MediaType::Image).await.unwrap(),
            "Verdict: AI-Generated"
        );
        // Should cycle back
        assert_eq!(
            client.generate_reply(&media(), MediaType::Image).await.unwrap(),
            "Verdict: Real"
        );
        assert_eq!(client.get_call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_records_requests_and_failures() {
        let client = MockDetectionClient::new().failing("provider down");

        let err = client
            .generate_reply(&media(), MediaType::Video)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));

        let (seen, media_type) = client.last_request().unwrap();
        assert_eq!(seen.data, "iVBO");
        assert_eq!(media_type, MediaType::Video);
    }
}
