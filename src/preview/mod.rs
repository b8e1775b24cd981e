/*!
 * Result-preview components.
 *
 * This module contains the pieces the preview session wires together:
 * - `handles`: local handles over fetched bytes, with creation/revocation counts
 * - `media_cache`: fetch-once cache for the processed video
 * - `subtitle_cache`: fetch-once-per-language cache for subtitle text
 * - `tracks`: subtitle track activation and the shared track surface
 * - `download`: one-shot download with filename negotiation
 *
 * None of these depend on each other; the session drives them.
 */

pub mod download;
pub mod handles;
pub mod media_cache;
pub mod subtitle_cache;
pub mod tracks;

pub use download::{DirectorySave, DownloadNegotiator, DownloadOutcome, SaveTarget};
pub use handles::{BlobRegistry, MediaHandle};
pub use media_cache::ResourceCache;
pub use subtitle_cache::SubtitleTextCache;
pub use tracks::{SyncOutcome, TrackSurface, synchronize};
