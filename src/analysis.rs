//! End-to-end analysis flow: encode the media, ask the backend, parse the reply.

use crate::ai::DetectionBackend;
use crate::media::{self, MediaFile, MediaType};
use crate::parser::{parse_analysis_response, AnalysisResult};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Serializable summary printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub file: String,
    pub media_type: MediaType,
    #[serde(flatten)]
    pub result: AnalysisResult,
    pub analyzed_at: DateTime<Utc>,
}

pub struct Analyzer {
    backend: Box<dyn DetectionBackend>,
}

impl Analyzer {
    pub fn new(backend: Box<dyn DetectionBackend>) -> Self {
        Self { backend }
    }

    /// Read a file from disk and analyze it.
    pub async fn analyze_file(
        &self,
        path: impl AsRef<Path>,
        media_type: Option<MediaType>,
    ) -> Result<AnalysisResult> {
        let file = MediaFile::read(path).await.map_err(Self::wrap)?;
        self.analyze(&file, media_type).await
    }

    /// Analyze an in-memory file. The media type defaults to one inferred from its MIME type.
    pub async fn analyze(
        &self,
        file: &MediaFile,
        media_type: Option<MediaType>,
    ) -> Result<AnalysisResult> {
        if file.bytes.is_empty() {
            return Err(Self::wrap(Error::Validation(format!(
                "{} is empty",
                file.file_name
            ))));
        }

        let media_type = media_type.unwrap_or_else(|| MediaType::from_mime(&file.mime_type));
        if !media_type.accepts(&file.mime_type) {
            tracing::warn!(
                "{} has MIME type {} which does not match the {} filter",
                file.file_name,
                file.mime_type,
                media_type.accept_filter()
            );
        }

        tracing::info!(
            "Analyzing {} as {} ({} bytes)",
            file.file_name,
            media_type,
            file.bytes.len()
        );

        let encoded = media::encode_base64(file);
        let reply = self
            .backend
            .generate_reply(&encoded, media_type)
            .await
            .map_err(Self::wrap)?;

        let result = parse_analysis_response(&reply);
        tracing::info!("Analysis of {} finished: {}", file.file_name, result.verdict());
        Ok(result)
    }

    /// Analyze a file and attach file, media type and timestamp.
    pub async fn report_file(
        &self,
        path: impl AsRef<Path>,
        media_type: Option<MediaType>,
    ) -> Result<AnalysisReport> {
        let path = path.as_ref();
        let file = MediaFile::read(path).await.map_err(Self::wrap)?;
        let resolved = media_type.unwrap_or_else(|| MediaType::from_mime(&file.mime_type));
        let result = self.analyze(&file, Some(resolved)).await?;

        Ok(AnalysisReport {
            file: path.display().to_string(),
            media_type: resolved,
            result,
            analyzed_at: Utc::now(),
        })
    }

    fn wrap(error: Error) -> Error {
        tracing::error!("Error analyzing media: {}", error);
        match error {
            Error::Analysis(_) => error,
            other => Error::Analysis(other.to_string()),
        }
    }
}
