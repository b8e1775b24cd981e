/*!
 * Preview session models.
 *
 * Value types shared by the preview components: the job being previewed,
 * the view mode, the state machines of the cached resources and the
 * subtitle tracks attached to the playback surface.
 */

use serde::{Deserialize, Serialize};

use crate::language_utils;
use crate::preview::handles::MediaHandle;

/// A processed job, as returned by the upload step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Job identifier assigned by the pipeline
    pub id: String,
    /// Language spoken in the source video
    pub input_language: String,
    /// Languages subtitles were generated for, in display order
    pub target_languages: Vec<String>,
}

impl Job {
    /// Create a new job descriptor
    pub fn new(
        id: impl Into<String>,
        input_language: impl Into<String>,
        target_languages: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            input_language: input_language.into(),
            target_languages,
        }
    }

    /// Language selected when a preview opens
    pub fn default_selection(&self) -> String {
        self.target_languages
            .first()
            .cloned()
            .unwrap_or_else(|| language_utils::NO_SUBTITLES.to_string())
    }

    /// Build the track set a playback surface attaches for this job
    ///
    /// The input-language track comes first, followed by one track per
    /// target language. All tracks start inactive.
    pub fn subtitle_tracks(&self) -> Vec<SubtitleTrack> {
        let mut tracks = Vec::with_capacity(self.target_languages.len() + 1);
        if !self.input_language.is_empty() {
            tracks.push(SubtitleTrack::new(
                self.input_language.clone(),
                language_utils::original_track_label(&self.input_language),
            ));
        }
        for code in &self.target_languages {
            tracks.push(SubtitleTrack::new(
                code.clone(),
                language_utils::get_language_name(code),
            ));
        }
        tracks
    }
}

/// Which video the preview is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// The locally uploaded source video
    #[default]
    Original,
    /// The processed video with subtitle tracks
    Processed,
}

/// State of the processed-video resource
#[derive(Debug, Clone, PartialEq)]
pub enum MediaState {
    /// Nothing requested yet
    Idle,
    /// A fetch is in flight
    Loading,
    /// The video is available through a local handle
    Ready(MediaHandle),
    /// The last fetch failed
    Error(String),
    /// The handle was released on teardown
    Released,
}

impl MediaState {
    /// Short state name for logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready(_) => "ready",
            Self::Error(_) => "error",
            Self::Released => "released",
        }
    }

    /// The handle, when ready
    pub fn handle(&self) -> Option<&MediaHandle> {
        match self {
            Self::Ready(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// State of one cached subtitle text entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtitleTextState {
    Idle,
    Loading,
    Ready(String),
    Error(String),
}

impl SubtitleTextState {
    /// Text the presentation layer should display for this state
    pub fn display_text(&self) -> Option<&str> {
        match self {
            Self::Ready(text) => Some(text),
            Self::Error(_) => Some("Failed to load subtitle file."),
            Self::Idle | Self::Loading => None,
        }
    }
}

/// A subtitle track registered on the playback surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    /// Language code the track was registered with
    pub language_code: String,
    /// Display label
    pub label: String,
    /// Whether the track is currently showing
    pub active: bool,
}

impl SubtitleTrack {
    /// Create an inactive track
    pub fn new(language_code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            language_code: language_code.into(),
            label: label.into(),
            active: false,
        }
    }
}
