/*!
 * Tests for the download negotiator
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use vidsub::backend::mock::MockBackend;
use vidsub::errors::PreviewError;
use vidsub::preview::{BlobRegistry, DirectorySave, DownloadNegotiator, MediaHandle, SaveTarget};

use crate::common;

/// Records every save request and the handle it was given
#[derive(Debug, Default)]
struct RecordingSave {
    saves: Mutex<Vec<(String, MediaHandle, usize)>>,
    fail: bool,
}

#[async_trait]
impl SaveTarget for RecordingSave {
    async fn save(
        &self,
        registry: &BlobRegistry,
        handle: &MediaHandle,
        filename: &str,
    ) -> Result<PathBuf, PreviewError> {
        let size = registry.resolve(handle).map(|b| b.len()).unwrap_or(0);
        self.saves.lock().push((filename.to_string(), handle.clone(), size));
        if self.fail {
            return Err(PreviewError::Save("disk full".to_string()));
        }
        Ok(PathBuf::from("/downloads").join(filename))
    }
}

fn negotiator(
    backend: MockBackend,
    target: Arc<dyn SaveTarget>,
    release_delay: Duration,
) -> (Arc<MockBackend>, BlobRegistry, DownloadNegotiator) {
    common::init_logging();
    let backend = Arc::new(backend);
    let registry = BlobRegistry::new();
    let downloads = DownloadNegotiator::new(backend.clone(), registry.clone(), target, release_delay);
    (backend, registry, downloads)
}

#[tokio::test]
async fn test_download_withQuotedFilename_shouldSaveUnderThatName() {
    let target = Arc::new(RecordingSave::default());
    let (_backend, _registry, downloads) = negotiator(
        MockBackend::working().with_content_disposition(r#"attachment; filename="talk_subtitled.mkv""#),
        target.clone(),
        Duration::from_millis(10),
    );

    let outcome = downloads.download("job-42").await.unwrap();

    assert_eq!(outcome.filename, "talk_subtitled.mkv");
    assert_eq!(outcome.saved_to, PathBuf::from("/downloads/talk_subtitled.mkv"));
    let saves = target.saves.lock();
    assert_eq!(saves.len(), 1);
    // The data was resolvable while saving
    assert_eq!(saves[0].2, outcome.size);
}

#[tokio::test]
async fn test_download_withoutHeader_shouldUseDefaultName() {
    let target = Arc::new(RecordingSave::default());
    let (_backend, _registry, downloads) =
        negotiator(MockBackend::working(), target.clone(), Duration::from_millis(10));

    let outcome = downloads.download("job-42").await.unwrap();

    assert_eq!(outcome.filename, "processed_video.mkv");
}

#[tokio::test]
async fn test_download_withCustomDefaultName_shouldUseIt() {
    let target = Arc::new(RecordingSave::default());
    let (_backend, _registry, downloads) =
        negotiator(MockBackend::working(), target.clone(), Duration::from_millis(10));
    let downloads = downloads.with_default_name("result.mkv");

    let outcome = downloads.download("job-42").await.unwrap();

    assert_eq!(outcome.filename, "result.mkv");
}

#[tokio::test]
async fn test_download_afterSave_shouldReleaseHandleAfterDelay() {
    let target = Arc::new(RecordingSave::default());
    let (_backend, registry, downloads) =
        negotiator(MockBackend::working(), target.clone(), Duration::from_millis(40));

    downloads.download("job-42").await.unwrap();
    let handle = target.saves.lock()[0].1.clone();

    // Still live right after the save
    assert!(registry.is_live(&handle));
    assert!(common::eventually(Duration::from_secs(1), || !registry.is_live(&handle)).await);
    assert_eq!(registry.created_count(), 1);
    assert_eq!(registry.revoked_count(), 1);
}

#[tokio::test]
async fn test_download_withServerError_shouldNotSave() {
    let target = Arc::new(RecordingSave::default());
    let (_backend, registry, downloads) = negotiator(
        MockBackend::failing(500, r#"{"detail": "Processed video missing"}"#),
        target.clone(),
        Duration::from_millis(10),
    );

    let result = downloads.download("job-42").await;

    match result {
        Err(PreviewError::Transport(e)) => assert_eq!(e.user_message(), "Processed video missing"),
        other => panic!("expected transport error, got {:?}", other),
    }
    assert!(target.saves.lock().is_empty());
    assert_eq!(registry.created_count(), 0);
    assert!(!downloads.is_in_flight("job-42"));
}

#[tokio::test]
async fn test_download_withFailingSave_shouldStillReleaseHandle() {
    let target = Arc::new(RecordingSave { fail: true, ..Default::default() });
    let (_backend, registry, downloads) =
        negotiator(MockBackend::working(), target.clone(), Duration::from_millis(5));

    let result = downloads.download("job-42").await;

    assert!(matches!(result, Err(PreviewError::Save(_))));
    assert!(common::eventually(Duration::from_secs(1), || registry.live_count() == 0).await);
    assert_eq!(registry.revoked_count(), 1);
}

#[tokio::test]
async fn test_download_whileInFlight_shouldRejectSecondAttempt() {
    let target = Arc::new(RecordingSave::default());
    let (backend, _registry, downloads) = negotiator(
        MockBackend::working().with_delay(Duration::from_millis(20)),
        target.clone(),
        Duration::from_millis(5),
    );

    let (first, second) = tokio::join!(downloads.download("job-42"), async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(downloads.is_in_flight("job-42"));
        downloads.download("job-42").await
    });

    assert!(first.is_ok());
    assert!(matches!(second, Err(PreviewError::DownloadInProgress(ref id)) if id == "job-42"));
    assert_eq!(backend.video_fetches(), 1);
    assert!(!downloads.is_in_flight("job-42"));
}

#[tokio::test]
async fn test_download_calledAgainAfterCompletion_shouldFetchAgain() {
    let target = Arc::new(RecordingSave::default());
    let (backend, _registry, downloads) =
        negotiator(MockBackend::working(), target.clone(), Duration::from_millis(5));

    downloads.download("job-42").await.unwrap();
    downloads.download("job-42").await.unwrap();

    assert_eq!(backend.video_fetches(), 2);
    assert_eq!(target.saves.lock().len(), 2);
}

#[tokio::test]
async fn test_directorySave_shouldWriteFile() {
    let dir = common::create_temp_dir().unwrap();
    let (_backend, _registry, downloads) = negotiator(
        MockBackend::working()
            .with_video(&b"video-bytes"[..], Some("video/mp4"))
            .with_content_disposition("attachment; filename=clip.mp4"),
        Arc::new(DirectorySave::new(dir.path())),
        Duration::from_millis(5),
    );

    let outcome = downloads.download("job-42").await.unwrap();

    assert_eq!(outcome.saved_to, dir.path().join("clip.mp4"));
    assert_eq!(std::fs::read(&outcome.saved_to).unwrap(), b"video-bytes");
    assert_eq!(outcome.size, 11);
}

#[test]
fn test_directorySave_withRevokedHandle_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    let registry = BlobRegistry::new();
    let handle = registry.create(bytes::Bytes::from_static(b"abc"), None);
    registry.revoke(&handle);

    let target = DirectorySave::new(dir.path());
    let result = tokio_test::block_on(target.save(&registry, &handle, "clip.mkv"));

    assert!(matches!(result, Err(PreviewError::Save(_))));
    assert!(!dir.path().join("clip.mkv").exists());
}
