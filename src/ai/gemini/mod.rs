pub mod client;
pub mod detect;
pub mod types;

pub use client::{GeminiHttpClient, ProviderReply};
pub use detect::GeminiDetectionClient;
