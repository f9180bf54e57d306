//! Deepfake detector - asks a hosted multimodal model whether media is AI-generated
//!
//! Encodes an image or video as base64, sends it to Gemini (directly or
//! through a credential-hiding proxy) and parses the free-text reply into a
//! verdict with reasoning.

pub mod ai;
pub mod analysis;
pub mod error;
pub mod media;
pub mod models;
pub mod parser;
pub mod prompts;
pub mod server;

pub use error::{Error, Result};
