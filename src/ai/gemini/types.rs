//! Gemini `generateContent` payload types shared by the direct client and the proxy.

use serde::{Deserialize, Serialize};

/// Top-level `generateContent` request body.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// One user turn carrying the prompt followed by the inline media.
    pub fn with_inline_media(prompt: String, mime_type: String, data: String) -> Self {
        Self {
            contents: vec![Content {
                role: None,
                parts: vec![
                    Part::Text {
                        text: prompt,
                        thought: None,
                    },
                    Part::InlineData {
                        inline_data: InlineData { mime_type, data },
                    },
                ],
            }],
        }
    }
}

/// Gemini content container used in both requests and responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Untagged union of text and inline media content parts.
///
/// Variant order matters for `#[serde(untagged)]` decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thought: Option<bool>,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Other(serde_json::Value),
}

/// Base64 inline payload used for image/video requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Top-level `generateContent` response envelope.
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Text of the first candidate with content: every non-thought text part
    /// joined in order. `None` when that text is blank.
    pub fn reply_text(&self) -> Option<String> {
        let content = self.candidates.iter().find_map(|c| c.content.as_ref())?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text, thought } if *thought != Some(true) => Some(text.as_str()),
                _ => None,
            })
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Candidate completion item returned by Gemini.
#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}
