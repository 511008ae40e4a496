use reqwest::multipart::{Form, Part};
use reqwest::Body;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;

use super::types::AnalysisResult;
use super::AnalysisService;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::media::VideoFile;

/// Multipart field the service reads the upload from
const VIDEO_FIELD: &str = "video";

/// HTTP client for the remote analysis service
#[derive(Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    base_url: String,
}

impl AnalysisClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.service.base_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload a video and wait for the analysis, or for `cancel` to fire
    pub async fn submit_for_analysis(
        &self,
        file: &VideoFile,
        cancel: CancellationToken,
    ) -> Result<AnalysisResult, AnalysisError> {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Analysis of {} cancelled", file.name);
                Err(AnalysisError::Cancelled)
            }
            result = self.post_analyze(file) => result,
        }
    }

    async fn post_analyze(&self, file: &VideoFile) -> Result<AnalysisResult, AnalysisError> {
        let url = format!("{}/analyze", self.base_url);

        let read_error = |e: std::io::Error| {
            AnalysisError::FileRead(format!("{}: {}", file.path.display(), e))
        };
        let handle = file.open().await.map_err(read_error)?;
        let length = handle.metadata().await.map_err(read_error)?.len();

        // Streamed from disk; the video is never held in memory whole.
        let body = Body::wrap_stream(ReaderStream::new(handle));
        let part = Part::stream_with_length(body, length)
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| AnalysisError::FileRead(format!("bad media type {}: {}", file.mime_type, e)))?;
        let form = Form::new().part(VIDEO_FIELD, part);

        tracing::debug!("Uploading {} ({}) to {}", file.name, file.display_size(), url);

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AnalysisError::Transport(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::trace!("Error body: {}", body);
            return Err(AnalysisError::Http {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AnalysisError::Transport(format!("reading response: {}", e)))?;
        tracing::trace!("Analysis response: {}", String::from_utf8_lossy(&body));

        let result: AnalysisResult =
            serde_json::from_slice(&body).map_err(|e| AnalysisError::Decode(e.to_string()))?;
        result.validate().map_err(AnalysisError::Decode)
    }

    /// Best-effort health check; never fails
    pub async fn check_health(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!("Health check returned {}", response.status());
                false
            }
            Err(e) => {
                tracing::warn!("Health check failed: {}", e);
                false
            }
        }
    }
}

impl AnalysisService for AnalysisClient {
    async fn analyze(
        &self,
        file: &VideoFile,
        cancel: CancellationToken,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.submit_for_analysis(file, cancel).await
    }
}
