/*!
 * Fetch-once-per-language cache for subtitle text.
 *
 * Entries are keyed by `(job_id, language_code)` and evolve independently.
 * The cache creates no local handles, so there is nothing to release;
 * `clear` drops all entries and makes in-flight fetches stale.
 */

use log::{debug, error};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::PipelineApi;
use crate::language_utils;
use crate::session::models::SubtitleTextState;

/// Cache key combining job and language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    job_id: String,
    language_code: String,
}

impl CacheKey {
    fn new(job_id: &str, language_code: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            language_code: language_code.to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct Entries {
    states: HashMap<CacheKey, SubtitleTextState>,
    generation: u64,
}

/// Subtitle text cache
#[derive(Debug)]
pub struct SubtitleTextCache {
    api: Arc<dyn PipelineApi>,
    entries: Mutex<Entries>,
}

impl SubtitleTextCache {
    pub fn new(api: Arc<dyn PipelineApi>) -> Self {
        Self {
            api,
            entries: Mutex::new(Entries::default()),
        }
    }

    /// Current state for a key, `Idle` if never requested
    pub fn state(&self, job_id: &str, language_code: &str) -> SubtitleTextState {
        self.entries
            .lock()
            .states
            .get(&CacheKey::new(job_id, language_code))
            .cloned()
            .unwrap_or(SubtitleTextState::Idle)
    }

    /// Request the subtitle text for one language
    ///
    /// `"none"` never fetches and yields `Idle`, which displays nothing.
    pub async fn request(&self, job_id: &str, language_code: &str) -> SubtitleTextState {
        if language_utils::is_no_subtitles(language_code) {
            return SubtitleTextState::Idle;
        }

        let key = CacheKey::new(job_id, language_code);
        let generation = {
            let mut entries = self.entries.lock();
            match entries.states.get(&key) {
                Some(state @ (SubtitleTextState::Loading | SubtitleTextState::Ready(_))) => {
                    return state.clone();
                }
                _ => {}
            }
            entries.states.insert(key.clone(), SubtitleTextState::Loading);
            entries.generation
        };

        debug!("Fetching {} subtitles for job {}", language_code, job_id);
        let guard = PendingFetch { entries: &self.entries, key: &key, generation };
        let result = self.api.fetch_subtitles(job_id, language_code).await;
        std::mem::forget(guard);

        let mut entries = self.entries.lock();
        if entries.generation != generation {
            debug!("Discarding stale {} subtitles for job {}", language_code, job_id);
            return SubtitleTextState::Idle;
        }

        let state = match result {
            Ok(text) => SubtitleTextState::Ready(text),
            Err(e) => {
                error!("Failed to fetch {} subtitles for job {}: {}", language_code, job_id, e);
                SubtitleTextState::Error(e.user_message())
            }
        };
        entries.states.insert(key, state.clone());
        state
    }

    /// Drop every entry; fetches still in flight will not be stored
    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        entries.states.clear();
        entries.generation += 1;
        debug!("Subtitle text cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.lock().states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().states.is_empty()
    }
}

/// Forgets an entry whose fetch was abandoned mid-flight
struct PendingFetch<'a> {
    entries: &'a Mutex<Entries>,
    key: &'a CacheKey,
    generation: u64,
}

impl Drop for PendingFetch<'_> {
    fn drop(&mut self) {
        let mut entries = self.entries.lock();
        if entries.generation == self.generation
            && entries.states.get(self.key) == Some(&SubtitleTextState::Loading)
        {
            entries.states.remove(self.key);
        }
    }
}
