/*!
 * Client implementations for the transcription/translation pipeline backend.
 *
 * This module contains:
 * - `PipelineApi`: the interface every backend client implements
 * - `http`: the reqwest-based client for the real REST service
 * - `mock`: an in-process backend with call counters, used by tests
 */

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::PathBuf;

use crate::errors::TransportError;
use crate::session::Job;

pub mod http;
pub mod mock;

/// Speech recognition model size requested from the pipeline
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AsrModelSize {
    /// Fastest processing, basic accuracy
    Tiny,
    /// Good balance of speed and accuracy
    Base,
    /// Better accuracy, moderate speed
    #[default]
    Small,
    /// High accuracy, slower processing
    Medium,
    /// Highest accuracy, slowest processing
    Large,
}

impl AsrModelSize {
    /// Value sent in the `asr_model_size` form field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tiny => "tiny",
            Self::Base => "base",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl std::fmt::Display for AsrModelSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A video upload waiting to be submitted to the pipeline
#[derive(Debug, Clone)]
pub struct JobSubmission {
    /// Local video file to upload
    pub video_path: PathBuf,
    /// Language spoken in the video
    pub input_language: String,
    /// Languages to produce subtitles for, in display order
    pub target_languages: Vec<String>,
    /// ASR model size
    pub asr_model_size: AsrModelSize,
}

/// Response of `POST /api/pipeline/process`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobResponse {
    pub job_id: String,
    #[serde(default, alias = "targetLanguages")]
    pub target_languages: Vec<String>,
    #[serde(default, alias = "inputLanguage")]
    pub input_language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_video_url: Option<String>,
}

impl From<JobResponse> for Job {
    fn from(response: JobResponse) -> Self {
        Job::new(response.job_id, response.input_language, response.target_languages)
    }
}

/// Binary payload of the processed video together with its response headers
#[derive(Debug, Clone)]
pub struct VideoPayload {
    /// Raw bytes of the video
    pub bytes: Bytes,
    /// `Content-Type` header, if any
    pub content_type: Option<String>,
    /// `Content-Disposition` header, if any
    pub content_disposition: Option<String>,
}

/// One summary produced by the pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub summary_id: String,
    pub job_id: String,
    pub text_content: String,
    pub language: String,
}

/// Response of `GET /api/downloads/summaries/{jobId}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummariesResponse {
    pub job_id: String,
    #[serde(default)]
    pub summaries: Vec<Summary>,
}

/// Common trait for pipeline backends
///
/// Every method is a single network round trip. Implementations map non-2xx
/// responses to `TransportError::Status` using [`error_message_from_body`].
#[async_trait]
pub trait PipelineApi: Send + Sync + Debug {
    /// Upload a video and start processing it
    async fn submit_job(&self, submission: &JobSubmission) -> Result<JobResponse, TransportError>;

    /// Fetch the processed video
    async fn fetch_video(&self, job_id: &str) -> Result<VideoPayload, TransportError>;

    /// Fetch the VTT subtitle file for one language
    async fn fetch_subtitles(&self, job_id: &str, language_code: &str) -> Result<String, TransportError>;

    /// Fetch the summaries generated for a job
    async fn fetch_summaries(&self, job_id: &str) -> Result<SummariesResponse, TransportError>;
}

/// Path of the subtitle file for a job and language
pub fn subtitle_track_path(job_id: &str, language_code: &str) -> String {
    format!("/api/downloads/download_subtitles/{}/{}", job_id, language_code)
}

/// Path of the processed video for a job
pub fn video_path(job_id: &str) -> String {
    format!("/api/downloads/download_video/{}", job_id)
}

/// Path of the summaries for a job
pub fn summaries_path(job_id: &str) -> String {
    format!("/api/downloads/summaries/{}", job_id)
}

/// Derive an error message from a failed response body
///
/// Uses the JSON `detail` field when present, then the raw body text,
/// then a generic `HTTP {status}` string.
pub fn error_message_from_body(status_code: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(detail) = value.get("detail") {
            match detail {
                serde_json::Value::String(text) if !text.trim().is_empty() => return text.clone(),
                serde_json::Value::Null => {}
                other => return other.to_string(),
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status_code)
    } else {
        trimmed.to_string()
    }
}
