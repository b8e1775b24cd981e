/*!
 * Preview session for one processed job.
 *
 * The session is the single owner of the preview state: the job, the view
 * mode, the selected language, the video slot and the track surface. It
 * handles:
 * - Loading the processed video when the processed view is shown
 * - Synchronizing subtitle tracks on readiness and on selection changes
 * - Forwarding subtitle text and download requests from the presentation layer
 * - Releasing the video handle on teardown
 */

use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::app_config::PreviewConfig;
use crate::backend::PipelineApi;
use crate::errors::PreviewError;
use crate::language_utils;
use crate::preview::{
    BlobRegistry, DownloadNegotiator, DownloadOutcome, ResourceCache, SaveTarget,
    SubtitleTextCache, SyncOutcome, TrackSurface,
};

use super::models::{Job, MediaState, SubtitleTextState, SubtitleTrack, ViewMode};

/// Preview controller state for one job
#[derive(Debug)]
pub struct PreviewSession {
    job: Job,
    mode: ViewMode,
    selection: String,
    media: ResourceCache,
    subtitles: Arc<SubtitleTextCache>,
    downloads: Arc<DownloadNegotiator>,
    surface: TrackSurface,
    settle_delay: Duration,
    /// Pending delayed re-synchronization
    settle_task: Option<JoinHandle<()>>,
    /// Subtitle text shown to the user
    displayed_text: Option<String>,
    /// Bumped on every subtitle text request; older completions are not displayed
    text_request_seq: u64,
    torn_down: bool,
}

impl PreviewSession {
    /// Create a session with its own caches
    pub fn new(
        job: Job,
        api: Arc<dyn PipelineApi>,
        registry: BlobRegistry,
        save_target: Arc<dyn SaveTarget>,
        config: &PreviewConfig,
    ) -> Self {
        let media = ResourceCache::new(api.clone(), registry.clone());
        let subtitles = Arc::new(SubtitleTextCache::new(api.clone()));
        let downloads = Arc::new(
            DownloadNegotiator::new(api, registry, save_target, config.release_delay())
                .with_default_name(config.default_download_name.clone()),
        );
        Self::with_components(job, media, subtitles, downloads, config.settle_delay())
    }

    /// Create a session around existing components
    ///
    /// The subtitle cache and downloader may be shared between sessions; the
    /// video cache belongs to this session alone.
    pub fn with_components(
        job: Job,
        media: ResourceCache,
        subtitles: Arc<SubtitleTextCache>,
        downloads: Arc<DownloadNegotiator>,
        settle_delay: Duration,
    ) -> Self {
        let selection = job.default_selection();
        debug!("Opening preview for job {} with selection {}", job.id, selection);
        Self {
            job,
            mode: ViewMode::Original,
            selection,
            media,
            subtitles,
            downloads,
            surface: TrackSurface::new(),
            settle_delay,
            settle_task: None,
            displayed_text: None,
            text_request_seq: 0,
            torn_down: false,
        }
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    /// Currently selected language code, or `"none"`
    pub fn selection(&self) -> &str {
        &self.selection
    }

    pub fn media_state(&self) -> MediaState {
        self.media.state()
    }

    /// Track surface of the playback view; clones share the same tracks
    pub fn surface(&self) -> TrackSurface {
        self.surface.clone()
    }

    /// Subtitle text the presentation layer should show
    pub fn displayed_text(&self) -> Option<&str> {
        self.displayed_text.as_deref()
    }

    /// Outcome of the latest synchronization pass
    pub fn last_sync(&self) -> Option<SyncOutcome> {
        self.surface.last_outcome()
    }

    // =========================================================================
    // View mode
    // =========================================================================

    /// Switch to the processed view, loading the video if it is idle
    pub async fn show_processed(&mut self) -> MediaState {
        if self.torn_down {
            return self.media.state();
        }
        self.mode = ViewMode::Processed;

        let state = match self.media.state() {
            MediaState::Idle => self.media.request(&self.job.id).await,
            other => other,
        };

        if state.is_ready() {
            self.on_media_ready();
        }
        state
    }

    /// Switch back to the original upload
    pub fn show_original(&mut self) {
        self.mode = ViewMode::Original;
        self.cancel_settle();
    }

    /// Retry loading the processed video after a failure
    pub async fn retry_media(&mut self) -> Result<MediaState, PreviewError> {
        let state = self.media.retry(&self.job.id).await?;
        if state.is_ready() && self.mode == ViewMode::Processed {
            self.on_media_ready();
        }
        Ok(state)
    }

    // =========================================================================
    // Tracks
    // =========================================================================

    /// Attach the job's subtitle tracks to the surface
    ///
    /// Re-synchronizes when the processed video is showing.
    pub fn attach_tracks(&mut self) -> Option<SyncOutcome> {
        self.surface.register_all(self.job.subtitle_tracks());
        self.surface_attached().then(|| self.sync_now(true))
    }

    /// Register one track, as a playback surface does when it parses a track
    pub fn register_track(&mut self, track: SubtitleTrack) -> Option<SyncOutcome> {
        self.surface.register(track);
        self.surface_attached().then(|| self.sync_now(false))
    }

    /// Change the selected language
    ///
    /// Synchronizes immediately when the processed video is showing and arms
    /// the settle pass again. Otherwise the selection is applied once the
    /// video becomes ready.
    pub fn select_language(&mut self, language_code: &str) -> Option<SyncOutcome> {
        self.selection = language_code.to_string();
        if !self.surface_attached() {
            debug!("Selection {} stored until the video is ready", language_code);
            return None;
        }
        let outcome = self.sync_now(true);
        self.arm_settle();
        Some(outcome)
    }

    fn surface_attached(&self) -> bool {
        !self.torn_down && self.mode == ViewMode::Processed && self.media.state().is_ready()
    }

    fn on_media_ready(&mut self) {
        // Tracks may still be registering; only the settled pass reports misses
        self.sync_now(false);
        self.arm_settle();
    }

    fn sync_now(&self, notify: bool) -> SyncOutcome {
        self.surface.synchronize(&self.selection, notify)
    }

    fn arm_settle(&mut self) {
        self.cancel_settle();
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let surface = self.surface.clone();
        let selection = self.selection.clone();
        let delay = self.settle_delay;
        self.settle_task = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let outcome = surface.synchronize(&selection, true);
            debug!("Settled track synchronization for {}: {:?}", selection, outcome);
        }));
    }

    fn cancel_settle(&mut self) {
        if let Some(task) = self.settle_task.take() {
            task.abort();
        }
    }

    // =========================================================================
    // Forwarded user actions
    // =========================================================================

    /// Load and display the subtitle text for a language
    ///
    /// The displayed text is cleared first. A completion that arrives after a
    /// newer request started is cached but not displayed.
    pub async fn show_subtitle_text(&mut self, language_code: &str) -> SubtitleTextState {
        self.text_request_seq += 1;
        let seq = self.text_request_seq;
        self.displayed_text = None;

        if language_utils::is_no_subtitles(language_code) {
            return SubtitleTextState::Idle;
        }

        let state = self.subtitles.request(&self.job.id, language_code).await;
        if seq == self.text_request_seq {
            self.displayed_text = state.display_text().map(|text| text.to_string());
        }
        state
    }

    /// Download the processed video
    pub async fn download(&self) -> Result<DownloadOutcome, PreviewError> {
        self.downloads.download(&self.job.id).await
    }

    pub fn is_downloading(&self) -> bool {
        self.downloads.is_in_flight(&self.job.id)
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Release the video handle and detach the tracks
    ///
    /// Safe to call more than once; dropping the session calls it too.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.cancel_settle();
        if self.media.release() {
            info!("Released processed video for job {}", self.job.id);
        }
        self.surface.clear();
        self.displayed_text = None;
    }
}

impl Drop for PreviewSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
