//! Model backends that turn encoded media into a raw verdict reply.
//!
//! Two deployment shapes share one contract: a direct Gemini call using a
//! credential held by this process, or a call through the detect proxy
//! which holds the credential server-side.

pub mod gemini;
pub mod mock;
pub mod proxy;

pub use gemini::GeminiDetectionClient;
pub use mock::MockDetectionClient;
pub use proxy::ProxyDetectionClient;

use crate::media::{EncodedMedia, MediaType};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait DetectionBackend: Send + Sync {
    /// Submit the media and return the model's reply text (never empty).
    async fn generate_reply(&self, media: &EncodedMedia, media_type: MediaType) -> Result<String>;
}

#[async_trait]
impl<T: DetectionBackend + ?Sized> DetectionBackend for std::sync::Arc<T> {
    async fn generate_reply(&self, media: &EncodedMedia, media_type: MediaType) -> Result<String> {
        (**self).generate_reply(media, media_type).await
    }
}
