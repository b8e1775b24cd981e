/*!
 * # vidsub - Subtitle pipeline preview client
 *
 * A Rust client for a remote transcription/translation pipeline: it uploads
 * a video, then previews and downloads the processed result.
 *
 * ## Features
 *
 * - Submit a video with input and target languages to the pipeline
 * - Load the processed video once and keep it behind a local handle
 * - Keep exactly one subtitle track active for the selected language
 * - Cache subtitle text per language for display
 * - Download the processed video under the server-suggested filename
 * - Fetch per-language summaries
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `backend`: Pipeline API clients:
 *   - `backend::http`: reqwest client for the REST service
 *   - `backend::mock`: in-process backend for tests
 * - `preview`: Preview components:
 *   - `preview::media_cache`: fetch-once video cache
 *   - `preview::subtitle_cache`: per-language subtitle text cache
 *   - `preview::tracks`: subtitle track synchronization
 *   - `preview::download`: download with filename negotiation
 *   - `preview::handles`: local handle registry
 * - `session`: The preview session tying the components together
 * - `app_controller`: Main application controller
 * - `language_utils`: Language display names
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod backend;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod preview;
pub mod session;

// Re-export main types for easier usage
pub use app_config::Config;
pub use backend::{PipelineApi, http::HttpPipelineClient};
pub use preview::{synchronize, SyncOutcome};
pub use session::{Job, MediaState, PreviewSession, SubtitleTrack, ViewMode};
pub use language_utils::get_language_name;
pub use errors::{AppError, PreviewError, TransportError};
