use anyhow::{Result, Context, anyhow};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use indicatif::{ProgressBar, ProgressStyle};

use crate::app_config::Config;
use crate::backend::http::HttpPipelineClient;
use crate::backend::{AsrModelSize, JobSubmission, PipelineApi, Summary};
use crate::errors::PreviewError;
use crate::file_utils::FileManager;
use crate::preview::{BlobRegistry, DirectorySave, DownloadOutcome, SyncOutcome};
use crate::session::{Job, MediaState, PreviewSession, SubtitleTextState};

// @module: Application controller for the CLI commands

/// What a preview run observed
#[derive(Debug, Clone)]
pub struct PreviewReport {
    /// Final state of the processed video
    pub media: MediaState,
    /// Language codes of the active tracks after settling
    pub active_tracks: Vec<String>,
    /// Last synchronization outcome
    pub sync: Option<SyncOutcome>,
    /// Subtitle text for the selection, if any
    pub subtitle_text: SubtitleTextState,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Pipeline backend
    api: Arc<dyn PipelineApi>,
    // @field: Local handle registry shared by all sessions
    registry: BlobRegistry,
}

impl Controller {
    // @method: Create a new controller talking to the configured backend
    pub fn with_config(config: Config) -> Result<Self> {
        let api = HttpPipelineClient::from_config(&config.backend)
            .context("Failed to create pipeline client")?;
        Ok(Self::with_backend(config, Arc::new(api)))
    }

    // @method: Create a controller around an existing backend
    pub fn with_backend(config: Config, api: Arc<dyn PipelineApi>) -> Self {
        Self {
            config,
            api,
            registry: BlobRegistry::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &BlobRegistry {
        &self.registry
    }

    /// Check a submission the way the upload form does
    pub fn validate_submission(submission: &JobSubmission) -> Result<(), PreviewError> {
        if !FileManager::file_exists(&submission.video_path) {
            return Err(PreviewError::InvalidSubmission(format!(
                "Video file does not exist: {:?}",
                submission.video_path
            )));
        }
        if submission.input_language.trim().is_empty() {
            return Err(PreviewError::InvalidSubmission("Input language is required".to_string()));
        }
        if submission.target_languages.is_empty() {
            return Err(PreviewError::InvalidSubmission(
                "At least one target language is required".to_string(),
            ));
        }
        for (i, language) in submission.target_languages.iter().enumerate() {
            if language == &submission.input_language {
                return Err(PreviewError::InvalidSubmission(format!(
                    "Target language {} is the input language",
                    language
                )));
            }
            if submission.target_languages[..i].contains(language) {
                return Err(PreviewError::InvalidSubmission(format!(
                    "Target language {} is listed twice",
                    language
                )));
            }
        }
        Ok(())
    }

    /// Upload a video and wait for the pipeline to process it
    pub async fn submit(
        &self,
        video_path: PathBuf,
        input_language: String,
        target_languages: Vec<String>,
        asr_model_size: Option<AsrModelSize>,
    ) -> Result<Job> {
        let submission = JobSubmission {
            video_path,
            input_language,
            target_languages,
            asr_model_size: asr_model_size.unwrap_or(self.config.asr_model_size),
        };
        Self::validate_submission(&submission)?;

        info!(
            "Submitting {:?} ({} -> {}) with {} model",
            submission.video_path,
            submission.input_language,
            submission.target_languages.join(", "),
            submission.asr_model_size
        );

        let spinner = Self::spinner("Uploading and processing video");
        let result = self.api.submit_job(&submission).await;
        spinner.finish_and_clear();

        let response = result.context("Processing failed")?;
        info!("Processing complete, job {}", response.job_id);
        Ok(Job::from(response))
    }

    /// Open a preview session for `job`
    pub fn open_session(&self, job: Job) -> PreviewSession {
        let target = Arc::new(DirectorySave::new(self.config.download_dir()));
        PreviewSession::new(job, self.api.clone(), self.registry.clone(), target, &self.config.preview)
    }

    /// Load the processed video, select a language and wait for the tracks to settle
    pub async fn preview(&self, job: Job, selection: Option<String>) -> Result<PreviewReport> {
        let mut session = self.open_session(job);
        if let Some(selection) = selection {
            session.select_language(&selection);
        }

        let spinner = Self::spinner("Loading processed video");
        let media = session.show_processed().await;
        spinner.finish_and_clear();

        if let MediaState::Error(message) = &media {
            warn!("Video load failed: {}", message);
            return Ok(PreviewReport {
                media,
                active_tracks: Vec::new(),
                sync: None,
                subtitle_text: SubtitleTextState::Idle,
            });
        }

        session.attach_tracks();
        tokio::time::sleep(self.config.preview.settle_delay() + Duration::from_millis(20)).await;

        let selected = session.selection().to_string();
        let subtitle_text = session.show_subtitle_text(&selected).await;
        let report = PreviewReport {
            media: session.media_state(),
            active_tracks: session.surface().active_languages(),
            sync: session.last_sync(),
            subtitle_text,
        };
        session.teardown();
        Ok(report)
    }

    /// Download the processed video of a job into `output_dir` (or the configured directory)
    pub async fn download(&self, job_id: &str, output_dir: Option<PathBuf>) -> Result<DownloadOutcome> {
        let dir = output_dir.unwrap_or_else(|| self.config.download_dir());
        FileManager::ensure_dir(&dir)?;

        let job = Job::new(job_id, "", Vec::new());
        let session = PreviewSession::new(
            job,
            self.api.clone(),
            self.registry.clone(),
            Arc::new(DirectorySave::new(dir)),
            &self.config.preview,
        );

        let spinner = Self::spinner("Downloading video with subtitles");
        let result = session.download().await;
        spinner.finish_and_clear();

        result.map_err(|e| anyhow!("Download failed: {}", e))
    }

    /// Fetch the summaries generated for a job
    pub async fn summaries(&self, job_id: &str) -> Result<Vec<Summary>> {
        let response = self
            .api
            .fetch_summaries(job_id)
            .await
            .with_context(|| format!("Failed to fetch summaries for job {}", job_id))?;
        Ok(response.summaries)
    }

    fn spinner(message: &'static str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    }
}
