/*!
 * In-process pipeline backend for testing.
 *
 * This module provides a backend that simulates different behaviors:
 * - `MockBackend::working()` - Always succeeds
 * - `MockBackend::failing(status, body)` - Always answers with an error status
 * - `MockBackend::fail_first(n)` - Fails the first `n` requests, then succeeds
 * - `MockBackend::unreachable()` - Every request fails before reaching the server
 *
 * Every endpoint counts its calls so tests can assert how many network
 * fetches an operation performed.
 */

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::TransportError;

use super::{
    JobResponse, JobSubmission, PipelineApi, SummariesResponse, Summary, VideoPayload,
    error_message_from_body,
};

/// Behavior mode for the mock backend
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Always answers with the given status and body
    Failing { status_code: u16, body: String },
    /// Fails the first `failures` requests with a 503, then succeeds
    FailFirst { failures: usize },
    /// Requests never reach the server
    Unreachable,
}

/// Mock pipeline backend
#[derive(Debug)]
pub struct MockBackend {
    behavior: MockBehavior,
    /// Simulated latency for every request
    delay: Option<Duration>,
    video: Bytes,
    content_type: Option<String>,
    content_disposition: Option<String>,
    subtitles: HashMap<String, String>,
    /// Total request counter, drives `FailFirst`
    request_count: Arc<AtomicUsize>,
    submit_calls: AtomicUsize,
    video_calls: AtomicUsize,
    summary_calls: AtomicUsize,
    subtitle_calls: Mutex<HashMap<String, usize>>,
}

impl MockBackend {
    /// Create a new mock backend with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            delay: None,
            video: Bytes::from_static(b"\x1a\x45\xdf\xa3mock-matroska-payload"),
            content_type: Some("video/x-matroska".to_string()),
            content_disposition: None,
            subtitles: HashMap::new(),
            request_count: Arc::new(AtomicUsize::new(0)),
            submit_calls: AtomicUsize::new(0),
            video_calls: AtomicUsize::new(0),
            summary_calls: AtomicUsize::new(0),
            subtitle_calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing(status_code: u16, body: impl Into<String>) -> Self {
        Self::new(MockBehavior::Failing {
            status_code,
            body: body.into(),
        })
    }

    pub fn fail_first(failures: usize) -> Self {
        Self::new(MockBehavior::FailFirst { failures })
    }

    pub fn unreachable() -> Self {
        Self::new(MockBehavior::Unreachable)
    }

    /// Delay every response
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Serve this video payload
    pub fn with_video(mut self, bytes: impl Into<Bytes>, content_type: Option<&str>) -> Self {
        self.video = bytes.into();
        self.content_type = content_type.map(|ct| ct.to_string());
        self
    }

    /// Send this `Content-Disposition` header with the video
    pub fn with_content_disposition(mut self, value: impl Into<String>) -> Self {
        self.content_disposition = Some(value.into());
        self
    }

    /// Serve a subtitle file for a language
    pub fn with_subtitle(mut self, language_code: &str, vtt: impl Into<String>) -> Self {
        self.subtitles.insert(language_code.to_string(), vtt.into());
        self
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn video_fetches(&self) -> usize {
        self.video_calls.load(Ordering::SeqCst)
    }

    pub fn summary_fetches(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    /// Subtitle fetches for one language
    pub fn subtitle_fetches(&self, language_code: &str) -> usize {
        self.subtitle_calls.lock().get(language_code).copied().unwrap_or(0)
    }

    /// Subtitle fetches across all languages
    pub fn total_subtitle_fetches(&self) -> usize {
        self.subtitle_calls.lock().values().sum()
    }

    /// Wait out the latency, then decide whether this request fails
    async fn respond(&self) -> Result<(), TransportError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            MockBehavior::Working => Ok(()),
            MockBehavior::Failing { status_code, body } => Err(TransportError::Status {
                status_code: *status_code,
                message: error_message_from_body(*status_code, body),
            }),
            MockBehavior::FailFirst { failures } => {
                if count <= *failures {
                    Err(TransportError::Status {
                        status_code: 503,
                        message: error_message_from_body(503, ""),
                    })
                } else {
                    Ok(())
                }
            }
            MockBehavior::Unreachable => Err(TransportError::RequestFailed(
                "error trying to connect: Connection refused".to_string(),
            )),
        }
    }
}

#[async_trait]
impl PipelineApi for MockBackend {
    async fn submit_job(&self, submission: &JobSubmission) -> Result<JobResponse, TransportError> {
        let call = self.submit_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.respond().await?;
        Ok(JobResponse {
            job_id: format!("mock-job-{}", call),
            target_languages: submission.target_languages.clone(),
            input_language: submission.input_language.clone(),
            processed_video_url: None,
        })
    }

    async fn fetch_video(&self, _job_id: &str) -> Result<VideoPayload, TransportError> {
        self.video_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await?;
        Ok(VideoPayload {
            bytes: self.video.clone(),
            content_type: self.content_type.clone(),
            content_disposition: self.content_disposition.clone(),
        })
    }

    async fn fetch_subtitles(&self, job_id: &str, language_code: &str) -> Result<String, TransportError> {
        *self
            .subtitle_calls
            .lock()
            .entry(language_code.to_string())
            .or_insert(0) += 1;
        self.respond().await?;

        match self.subtitles.get(language_code) {
            Some(vtt) => Ok(vtt.clone()),
            None => Err(TransportError::Status {
                status_code: 404,
                message: format!("No subtitles for {} in job {}", language_code, job_id),
            }),
        }
    }

    async fn fetch_summaries(&self, job_id: &str) -> Result<SummariesResponse, TransportError> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await?;

        let summaries = self
            .subtitles
            .keys()
            .enumerate()
            .map(|(i, language)| Summary {
                summary_id: format!("summary-{}", i + 1),
                job_id: job_id.to_string(),
                text_content: format!("Summary of {} in {}", job_id, language),
                language: language.clone(),
            })
            .collect();

        Ok(SummariesResponse {
            job_id: job_id.to_string(),
            summaries,
        })
    }
}
