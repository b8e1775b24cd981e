/*!
 * Preview session module.
 *
 * This module provides:
 * - The job, view mode and resource state models
 * - The preview session that owns them and drives the preview components
 */

pub mod manager;
pub mod models;

// Re-export main types
pub use manager::PreviewSession;
pub use models::{Job, MediaState, SubtitleTextState, SubtitleTrack, ViewMode};
