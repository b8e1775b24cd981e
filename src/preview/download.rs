/*!
 * Download of the processed video with server-suggested filenames.
 *
 * A download fetches the video independently of the preview cache, resolves
 * a filename from `Content-Disposition`, hands a temporary local handle to a
 * [`SaveTarget`] and revokes that handle after a short delay.
 */

use async_trait::async_trait;
use log::{debug, error, info};
use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashSet;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::PipelineApi;
use crate::errors::PreviewError;
use crate::file_utils::FileManager;
use crate::preview::handles::{BlobRegistry, MediaHandle};

/// Name used when the server suggests none
pub const DEFAULT_DOWNLOAD_NAME: &str = "processed_video.mkv";

static FILENAME_PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)filename(\*)?\s*=\s*(?:"([^"]*)"|'([^']*)'|([^;\n]*))"#)
        .expect("filename pattern is valid")
});

/// Extract the filename from a `Content-Disposition` header value
///
/// Accepts quoted (`filename="x"`) and bare (`filename=x`) parameters, plus
/// the RFC 5987 form `filename*=UTF-8''x` whose value is percent-decoded.
/// The extended form wins when both are present. Returns `None` when the
/// header has no usable filename.
pub fn parse_content_disposition(header: &str) -> Option<String> {
    let mut plain = None;
    for captures in FILENAME_PARAM.captures_iter(header) {
        let extended = captures.get(1).is_some();
        let Some(raw) = captures
            .get(2)
            .or_else(|| captures.get(3))
            .or_else(|| captures.get(4))
            .map(|m| m.as_str().trim())
        else {
            continue;
        };

        if extended {
            if let Some(name) = decode_extended_value(raw).and_then(non_empty_file_name) {
                return Some(name);
            }
        } else if plain.is_none() {
            plain = non_empty_file_name(raw.to_string());
        }
    }
    plain
}

// charset'language'percent-encoded-value
fn decode_extended_value(raw: &str) -> Option<String> {
    let (_, encoded) = raw.split_once('\'')?;
    let (_, encoded) = encoded.split_once('\'')?;
    Some(percent_decode_str(encoded).decode_utf8_lossy().into_owned())
}

fn non_empty_file_name(name: String) -> Option<String> {
    let sanitized = FileManager::sanitize_filename(&name);
    if sanitized.is_empty() { None } else { Some(sanitized) }
}

/// Resolve the filename for a download, falling back to `default_name`
pub fn resolve_filename(header: Option<&str>, default_name: &str) -> String {
    header
        .and_then(parse_content_disposition)
        .unwrap_or_else(|| default_name.to_string())
}

/// Destination for a completed download
#[async_trait]
pub trait SaveTarget: Send + Sync + Debug {
    /// Save the data behind `handle` under `filename`
    ///
    /// The data must be captured from the registry before the call returns;
    /// the handle is revoked shortly afterwards.
    async fn save(
        &self,
        registry: &BlobRegistry,
        handle: &MediaHandle,
        filename: &str,
    ) -> Result<PathBuf, PreviewError>;
}

/// Saves downloads into a directory
#[derive(Debug, Clone)]
pub struct DirectorySave {
    dir: PathBuf,
}

impl DirectorySave {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SaveTarget for DirectorySave {
    async fn save(
        &self,
        registry: &BlobRegistry,
        handle: &MediaHandle,
        filename: &str,
    ) -> Result<PathBuf, PreviewError> {
        let bytes = registry
            .resolve(handle)
            .ok_or_else(|| PreviewError::Save(format!("Handle {} is no longer live", handle.url)))?;
        let path = self.dir.join(filename);
        FileManager::write_bytes(&path, &bytes)
            .await
            .map_err(|e| PreviewError::Save(format!("{:#}", e)))?;
        Ok(path)
    }
}

/// Result of a successful download
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOutcome {
    pub job_id: String,
    /// Resolved filename
    pub filename: String,
    /// Where the save target put the file
    pub saved_to: PathBuf,
    /// Size in bytes
    pub size: usize,
}

/// Marks a job's download as in flight until dropped
struct DownloadAttempt<'a> {
    job_id: String,
    in_flight: &'a Mutex<HashSet<String>>,
}

impl<'a> DownloadAttempt<'a> {
    fn begin(job_id: &str, in_flight: &'a Mutex<HashSet<String>>) -> Option<Self> {
        if !in_flight.lock().insert(job_id.to_string()) {
            return None;
        }
        Some(Self {
            job_id: job_id.to_string(),
            in_flight,
        })
    }
}

impl Drop for DownloadAttempt<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.job_id);
    }
}

/// One-shot downloader
#[derive(Debug)]
pub struct DownloadNegotiator {
    api: Arc<dyn PipelineApi>,
    registry: BlobRegistry,
    target: Arc<dyn SaveTarget>,
    release_delay: Duration,
    default_name: String,
    in_flight: Mutex<HashSet<String>>,
}

impl DownloadNegotiator {
    pub fn new(
        api: Arc<dyn PipelineApi>,
        registry: BlobRegistry,
        target: Arc<dyn SaveTarget>,
        release_delay: Duration,
    ) -> Self {
        Self {
            api,
            registry,
            target,
            release_delay,
            default_name: DEFAULT_DOWNLOAD_NAME.to_string(),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Use a different fallback filename
    pub fn with_default_name(mut self, name: impl Into<String>) -> Self {
        self.default_name = name.into();
        self
    }

    /// Whether a download for `job_id` is running
    pub fn is_in_flight(&self, job_id: &str) -> bool {
        self.in_flight.lock().contains(job_id)
    }

    /// Fetch the processed video and save it
    ///
    /// Failures are returned to the caller; nothing is retried automatically.
    pub async fn download(&self, job_id: &str) -> Result<DownloadOutcome, PreviewError> {
        let _attempt = DownloadAttempt::begin(job_id, &self.in_flight)
            .ok_or_else(|| PreviewError::DownloadInProgress(job_id.to_string()))?;

        debug!("Downloading processed video for job {}", job_id);
        let payload = self.api.fetch_video(job_id).await.map_err(|e| {
            error!("Download failed for job {}: {}", job_id, e);
            PreviewError::from(e)
        })?;

        let filename = resolve_filename(payload.content_disposition.as_deref(), &self.default_name);
        let handle = self.registry.create(payload.bytes, payload.content_type);
        let saved = self.target.save(&self.registry, &handle, &filename).await;
        self.schedule_release(handle.clone());

        let saved_to = saved?;
        info!("{} has been downloaded to {:?}", filename, saved_to);
        Ok(DownloadOutcome {
            job_id: job_id.to_string(),
            filename,
            saved_to,
            size: handle.size,
        })
    }

    fn schedule_release(&self, handle: MediaHandle) {
        let registry = self.registry.clone();
        let delay = self.release_delay;
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    registry.revoke(&handle);
                });
            }
            Err(_) => {
                registry.revoke(&handle);
            }
        }
    }
}
