/*!
 * Common test utilities for the vidsub test suite
 */

use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use vidsub::app_config::PreviewConfig;
use vidsub::backend::mock::MockBackend;
use vidsub::preview::{BlobRegistry, DirectorySave};
use vidsub::session::{Job, PreviewSession};

pub const FRENCH_VTT: &str = "WEBVTT\n\n00:00:01.000 --> 00:00:04.000\nBonjour tout le monde.\n";
pub const ARABIC_VTT: &str = "WEBVTT\n\n00:00:01.000 --> 00:00:04.000\nمرحبا بالجميع.\n";
pub const ENGLISH_VTT: &str = "WEBVTT\n\n00:00:01.000 --> 00:00:04.000\nHello everyone.\n";

/// Route log output through the test harness; safe to call from every test
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// The job used across the scenario tests
pub fn sample_job() -> Job {
    Job::new(
        "job-42",
        "english",
        vec!["arabic".to_string(), "french".to_string()],
    )
}

/// A backend serving the three subtitle files of [`sample_job`]
pub fn sample_backend() -> MockBackend {
    MockBackend::working()
        .with_subtitle("english", ENGLISH_VTT)
        .with_subtitle("arabic", ARABIC_VTT)
        .with_subtitle("french", FRENCH_VTT)
}

/// Preview settings with short delays
pub fn fast_preview_config() -> PreviewConfig {
    PreviewConfig {
        settle_delay_ms: 30,
        release_delay_ms: 10,
        ..PreviewConfig::default()
    }
}

/// Everything a session test needs to inspect afterwards
pub struct SessionFixture {
    pub backend: Arc<MockBackend>,
    pub registry: BlobRegistry,
    pub dir: TempDir,
    pub session: PreviewSession,
}

/// Build a session over `backend` saving downloads into a temp dir
pub fn session_with(backend: MockBackend, job: Job) -> Result<SessionFixture> {
    init_logging();
    let backend = Arc::new(backend);
    let registry = BlobRegistry::new();
    let dir = create_temp_dir()?;
    let session = PreviewSession::new(
        job,
        backend.clone(),
        registry.clone(),
        Arc::new(DirectorySave::new(dir.path())),
        &fast_preview_config(),
    );
    Ok(SessionFixture { backend, registry, dir, session })
}

/// Poll `condition` until it holds or `timeout` elapses
pub async fn eventually<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Run `future` after `delay` on the current runtime
pub fn spawn_after<F>(delay: Duration, future: F) -> tokio::task::JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        future.await
    })
}
