/*!
 * Fetch-once cache for the processed video.
 *
 * The cache holds a single slot: the job it was last asked for and that
 * job's [`MediaState`]. A request while `Loading` or `Ready` returns the
 * current state without touching the network. Asking for a different job
 * releases the current handle before loading the new one.
 *
 * Every load captures the slot's epoch before suspending on the fetch. If the
 * epoch moved by the time the fetch completes (release, supersession), the
 * result is discarded and no handle is created. A load whose future is
 * dropped before the fetch completes puts the slot back to `Idle`.
 */

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::backend::PipelineApi;
use crate::errors::PreviewError;
use crate::preview::handles::BlobRegistry;
use crate::session::models::MediaState;

#[derive(Debug)]
struct Slot {
    job_id: Option<String>,
    state: MediaState,
    epoch: u64,
}

/// Single-flight cache for the processed video of one job at a time
#[derive(Debug)]
pub struct ResourceCache {
    api: Arc<dyn PipelineApi>,
    registry: BlobRegistry,
    slot: Mutex<Slot>,
}

impl ResourceCache {
    /// Create an idle cache
    pub fn new(api: Arc<dyn PipelineApi>, registry: BlobRegistry) -> Self {
        Self {
            api,
            registry,
            slot: Mutex::new(Slot {
                job_id: None,
                state: MediaState::Idle,
                epoch: 0,
            }),
        }
    }

    /// Current state of the slot
    pub fn state(&self) -> MediaState {
        self.slot.lock().state.clone()
    }

    /// Job the slot currently belongs to
    pub fn job_id(&self) -> Option<String> {
        self.slot.lock().job_id.clone()
    }

    /// Request the processed video for `job_id`
    ///
    /// Returns the existing state when a load is in flight or the video is
    /// ready. A released slot stays released for its job.
    pub async fn request(&self, job_id: &str) -> MediaState {
        let epoch = {
            let mut slot = self.slot.lock();
            if slot.job_id.as_deref() == Some(job_id) {
                match slot.state {
                    MediaState::Loading | MediaState::Ready(_) | MediaState::Released => {
                        debug!("Video for job {} already {}", job_id, slot.state.name());
                        return slot.state.clone();
                    }
                    MediaState::Idle | MediaState::Error(_) => {}
                }
            } else {
                self.supersede(&mut slot, job_id);
            }
            Self::begin_loading(&mut slot)
        };

        self.load(job_id, epoch).await
    }

    /// Re-enter the loading path after a failure
    pub async fn retry(&self, job_id: &str) -> Result<MediaState, PreviewError> {
        let epoch = {
            let mut slot = self.slot.lock();
            let same_job = slot.job_id.as_deref() == Some(job_id);
            if !same_job || !matches!(slot.state, MediaState::Error(_)) {
                let state = if same_job { slot.state.name() } else { MediaState::Idle.name() };
                return Err(PreviewError::RetryNotAllowed { state });
            }
            debug!("Retrying video load for job {}", job_id);
            Self::begin_loading(&mut slot)
        };

        Ok(self.load(job_id, epoch).await)
    }

    /// Invalidate the handle and move the slot to `Released`
    ///
    /// Returns true when a live handle was revoked. Calling it again is a no-op.
    pub fn release(&self) -> bool {
        let mut slot = self.slot.lock();
        let revoked = match &slot.state {
            MediaState::Ready(handle) => self.registry.revoke(handle),
            _ => false,
        };
        if !matches!(slot.state, MediaState::Released) {
            slot.epoch += 1;
            slot.state = MediaState::Released;
            debug!("Released video slot for job {:?}", slot.job_id);
        }
        revoked
    }

    fn supersede(&self, slot: &mut Slot, job_id: &str) {
        if let MediaState::Ready(handle) = &slot.state {
            debug!("Superseding video of job {:?} with job {}", slot.job_id, job_id);
            self.registry.revoke(handle);
        }
        slot.job_id = Some(job_id.to_string());
        slot.state = MediaState::Idle;
        slot.epoch += 1;
    }

    fn begin_loading(slot: &mut Slot) -> u64 {
        slot.epoch += 1;
        slot.state = MediaState::Loading;
        slot.epoch
    }

    async fn load(&self, job_id: &str, epoch: u64) -> MediaState {
        debug!("Fetching processed video for job {}", job_id);
        let guard = PendingLoad { slot: &self.slot, epoch };
        let result = self.api.fetch_video(job_id).await;
        std::mem::forget(guard);

        let mut slot = self.slot.lock();
        if slot.epoch != epoch || slot.job_id.as_deref() != Some(job_id) {
            debug!("Discarding stale video result for job {}", job_id);
            return slot.state.clone();
        }

        slot.state = match result {
            Ok(payload) => {
                let is_video = payload
                    .content_type
                    .as_deref()
                    .is_some_and(|ct| ct.trim().to_lowercase().starts_with("video/"));
                if !is_video {
                    warn!(
                        "Processed video for job {} has content type {:?}",
                        job_id, payload.content_type
                    );
                }
                let handle = self.registry.create(payload.bytes, payload.content_type);
                info!("Processed video loaded for job {} ({} bytes)", job_id, handle.size);
                MediaState::Ready(handle)
            }
            Err(e) => {
                error!("Failed to load processed video for job {}: {}", job_id, e);
                MediaState::Error(format!("Failed to load processed video: {}", e.user_message()))
            }
        };
        slot.state.clone()
    }
}

/// Resets an abandoned load back to `Idle` when dropped
struct PendingLoad<'a> {
    slot: &'a Mutex<Slot>,
    epoch: u64,
}

impl Drop for PendingLoad<'_> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock();
        if slot.epoch == self.epoch && matches!(slot.state, MediaState::Loading) {
            debug!("Video load for job {:?} abandoned", slot.job_id);
            slot.state = MediaState::Idle;
        }
    }
}
