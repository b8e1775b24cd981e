/*!
 * Subtitle track activation.
 *
 * [`synchronize`] reconciles a selected language against the tracks
 * registered on a playback surface. It is a pure function over its inputs:
 * every track is deactivated first, then at most one is activated, so
 * repeated calls with the same inputs give the same activation set.
 *
 * [`TrackSurface`] is the shared track list of a playback surface. Tracks
 * may be registered at any time, including after the video became ready.
 */

use log::{debug, warn};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::language_utils;
use crate::session::models::SubtitleTrack;

/// Result of a synchronization pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Language code of the activated track
    pub activated: Option<String>,
    /// The selection matched no track by code or label
    pub not_found: bool,
}

/// Activate the track matching `selection`, deactivating all others
///
/// Matching is by language code first, then by display label, in
/// registration order. `"none"` leaves every track inactive.
pub fn synchronize(selection: &str, tracks: &mut [SubtitleTrack]) -> SyncOutcome {
    for track in tracks.iter_mut() {
        track.active = false;
    }

    if language_utils::is_no_subtitles(selection) {
        return SyncOutcome::default();
    }

    let index = tracks
        .iter()
        .position(|track| track.language_code == selection)
        .or_else(|| {
            let label = language_utils::get_language_name(selection);
            tracks
                .iter()
                .position(|track| track.label == label || track.label == selection)
        });

    match index {
        Some(i) => {
            tracks[i].active = true;
            SyncOutcome {
                activated: Some(tracks[i].language_code.clone()),
                not_found: false,
            }
        }
        None => SyncOutcome {
            activated: None,
            not_found: true,
        },
    }
}

#[derive(Debug, Default)]
struct SurfaceState {
    tracks: Vec<SubtitleTrack>,
    last_outcome: Option<SyncOutcome>,
}

/// Track list attached to a playback surface
///
/// Clones share the same list, so a presentation layer can register tracks
/// while the session synchronizes them.
#[derive(Debug, Clone, Default)]
pub struct TrackSurface {
    inner: Arc<Mutex<SurfaceState>>,
}

impl TrackSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a track; it starts inactive
    pub fn register(&self, mut track: SubtitleTrack) {
        track.active = false;
        debug!("Registered subtitle track {} ({})", track.language_code, track.label);
        self.inner.lock().tracks.push(track);
    }

    /// Register several tracks in order
    pub fn register_all(&self, tracks: impl IntoIterator<Item = SubtitleTrack>) {
        for track in tracks {
            self.register(track);
        }
    }

    /// Run [`synchronize`] over the registered tracks
    ///
    /// When `notify` is set, an unmatched selection is reported as a warning.
    pub fn synchronize(&self, selection: &str, notify: bool) -> SyncOutcome {
        let mut state = self.inner.lock();
        let outcome = synchronize(selection, &mut state.tracks);
        if outcome.not_found {
            if notify {
                warn!(
                    "Subtitle track not found for {}. Ensure the backend provides the .vtt file for this language.",
                    language_utils::get_language_name(selection)
                );
            } else {
                debug!("No track for {} yet ({} registered)", selection, state.tracks.len());
            }
        }
        state.last_outcome = Some(outcome.clone());
        outcome
    }

    /// Copy of the registered tracks
    pub fn tracks(&self) -> Vec<SubtitleTrack> {
        self.inner.lock().tracks.clone()
    }

    /// Language codes of the active tracks
    pub fn active_languages(&self) -> Vec<String> {
        self.inner
            .lock()
            .tracks
            .iter()
            .filter(|track| track.active)
            .map(|track| track.language_code.clone())
            .collect()
    }

    /// Outcome of the most recent synchronization
    pub fn last_outcome(&self) -> Option<SyncOutcome> {
        self.inner.lock().last_outcome.clone()
    }

    /// Detach every track
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state.tracks.clear();
        state.last_outcome = None;
    }

    pub fn len(&self) -> usize {
        self.inner.lock().tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().tracks.is_empty()
    }
}
