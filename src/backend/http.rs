use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, error};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, header};
use std::time::Duration;

use crate::app_config::BackendConfig;
use crate::errors::TransportError;
use crate::file_utils::FileManager;

use super::{
    JobResponse, JobSubmission, PipelineApi, SummariesResponse, VideoPayload,
    error_message_from_body, subtitle_track_path, summaries_path, video_path,
};

/// REST client for the pipeline service
#[derive(Debug, Clone)]
pub struct HttpPipelineClient {
    /// Base URL without trailing slash
    base_url: String,
    /// HTTP client for making requests
    client: Client,
}

impl HttpPipelineClient {
    /// Create a client for `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        url::Url::parse(&base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { base_url, client })
    }

    /// Create a client from the backend section of the configuration
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        Self::new(&config.base_url, config.timeout(), config.connect_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> Result<Response, TransportError> {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;
        Self::check_status(response).await
    }

    /// Turn a non-success response into `TransportError::Status`
    async fn check_status(response: Response) -> Result<Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message_from_body(status.as_u16(), &body);
        error!("Pipeline API error ({}): {}", status, message);
        Err(TransportError::Status {
            status_code: status.as_u16(),
            message,
        })
    }

    fn header_value(response: &Response, name: header::HeaderName) -> Option<String> {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    }
}

#[async_trait]
impl PipelineApi for HttpPipelineClient {
    async fn submit_job(&self, submission: &JobSubmission) -> Result<JobResponse, TransportError> {
        let data = FileManager::read_bytes(&submission.video_path)
            .await
            .map_err(|e| TransportError::RequestFailed(format!("{:#}", e)))?;

        let video = Part::bytes(data)
            .file_name(FileManager::file_name(&submission.video_path))
            .mime_str(FileManager::video_mime_type(&submission.video_path))
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

        let mut form = Form::new()
            .part("video", video)
            .text("input_language", submission.input_language.clone());
        for language in &submission.target_languages {
            form = form.text("target_languages", language.clone());
        }
        form = form.text("asr_model_size", submission.asr_model_size.as_str());

        let url = self.url("/api/pipeline/process");
        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;
        let response = Self::check_status(response).await?;

        let text = response
            .text()
            .await
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;
        serde_json::from_str::<JobResponse>(&text).map_err(|e| {
            error!(
                "Failed to parse job response: {}. Raw response (first 500 chars): {}",
                e,
                text.chars().take(500).collect::<String>()
            );
            TransportError::ParseError(e.to_string())
        })
    }

    async fn fetch_video(&self, job_id: &str) -> Result<VideoPayload, TransportError> {
        let response = self.get(&video_path(job_id)).await?;
        let content_type = Self::header_value(&response, header::CONTENT_TYPE);
        let content_disposition = Self::header_value(&response, header::CONTENT_DISPOSITION);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

        Ok(VideoPayload {
            bytes,
            content_type,
            content_disposition,
        })
    }

    async fn fetch_subtitles(&self, job_id: &str, language_code: &str) -> Result<String, TransportError> {
        let response = self.get(&subtitle_track_path(job_id, language_code)).await?;
        response
            .text()
            .await
            .map_err(|e| TransportError::RequestFailed(e.to_string()))
    }

    async fn fetch_summaries(&self, job_id: &str) -> Result<SummariesResponse, TransportError> {
        let response = self.get(&summaries_path(job_id)).await?;
        response
            .json::<SummariesResponse>()
            .await
            .map_err(|e| TransportError::ParseError(e.to_string()))
    }
}
