/*!
 * Integration tests for the application controller over a mock backend
 */

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use vidsub::app_config::Config;
use vidsub::app_controller::Controller;
use vidsub::backend::mock::MockBackend;
use vidsub::backend::{AsrModelSize, JobSubmission};
use vidsub::errors::PreviewError;
use vidsub::session::{MediaState, SubtitleTextState};

use crate::common::{self, FRENCH_VTT};

fn controller_over(backend: MockBackend, download_dir: &Path) -> (Arc<MockBackend>, Controller) {
    common::init_logging();
    let backend = Arc::new(backend);
    let config = Config {
        preview: common::fast_preview_config(),
        download_dir: Some(download_dir.to_path_buf()),
        ..Config::default()
    };
    let controller = Controller::with_backend(config, backend.clone());
    (backend, controller)
}

fn write_video(dir: &Path) -> Result<PathBuf> {
    let path = dir.join("talk.mp4");
    std::fs::write(&path, b"fake mp4 data")?;
    Ok(path)
}

fn submission(video_path: PathBuf, input: &str, targets: &[&str]) -> JobSubmission {
    JobSubmission {
        video_path,
        input_language: input.to_string(),
        target_languages: targets.iter().map(|t| t.to_string()).collect(),
        asr_model_size: AsrModelSize::default(),
    }
}

#[tokio::test]
async fn test_submit_withValidVideo_shouldReturnJob() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let (backend, controller) = controller_over(common::sample_backend(), dir.path());
    let video = write_video(dir.path())?;

    let job = controller
        .submit(video, "english".to_string(), vec!["arabic".to_string(), "french".to_string()], None)
        .await?;

    assert_eq!(job.id, "mock-job-1");
    assert_eq!(job.input_language, "english");
    assert_eq!(job.target_languages, vec!["arabic".to_string(), "french".to_string()]);
    assert_eq!(job.default_selection(), "arabic");
    assert_eq!(backend.submit_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_submit_withBackendFailure_shouldReportDetail() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let (_backend, controller) = controller_over(
        MockBackend::failing(422, r#"{"detail": "Unsupported video format"}"#),
        dir.path(),
    );
    let video = write_video(dir.path())?;

    let result = controller
        .submit(video, "english".to_string(), vec!["french".to_string()], Some(AsrModelSize::Tiny))
        .await;

    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("Unsupported video format"), "{}", message);
    Ok(())
}

#[tokio::test]
async fn test_submit_withInvalidSubmission_shouldNotCallBackend() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let (backend, controller) = controller_over(common::sample_backend(), dir.path());

    let result = controller
        .submit(dir.path().join("missing.mp4"), "english".to_string(), vec!["french".to_string()], None)
        .await;

    assert!(result.is_err());
    assert_eq!(backend.submit_calls(), 0);
    Ok(())
}

#[test]
fn test_validate_submission_shouldRejectBadLanguageSets() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let video = write_video(dir.path())?;

    let ok = submission(video.clone(), "english", &["arabic", "french"]);
    assert!(Controller::validate_submission(&ok).is_ok());

    let cases = [
        submission(video.clone(), "", &["french"]),
        submission(video.clone(), "english", &[]),
        submission(video.clone(), "english", &["english"]),
        submission(video.clone(), "english", &["french", "french"]),
        submission(dir.path().join("nope.mp4"), "english", &["french"]),
    ];
    for case in &cases {
        assert!(
            matches!(Controller::validate_submission(case), Err(PreviewError::InvalidSubmission(_))),
            "{:?} should be rejected",
            case
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_preview_withSelection_shouldActivateTrackAndLoadText() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let (backend, controller) = controller_over(common::sample_backend(), dir.path());

    let report = controller
        .preview(common::sample_job(), Some("french".to_string()))
        .await?;

    assert!(report.media.is_ready());
    assert_eq!(report.active_tracks, vec!["french".to_string()]);
    assert_eq!(report.subtitle_text, SubtitleTextState::Ready(FRENCH_VTT.to_string()));
    assert_eq!(backend.video_fetches(), 1);
    // The session released its handle when the preview ended
    assert_eq!(controller.registry().live_count(), 0);
    assert_eq!(controller.registry().created_count(), controller.registry().revoked_count());
    Ok(())
}

#[tokio::test]
async fn test_preview_withNone_shouldActivateNothing() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let (backend, controller) = controller_over(common::sample_backend(), dir.path());

    let report = controller
        .preview(common::sample_job(), Some("none".to_string()))
        .await?;

    assert!(report.active_tracks.is_empty());
    assert_eq!(report.subtitle_text, SubtitleTextState::Idle);
    assert_eq!(backend.total_subtitle_fetches(), 0);
    Ok(())
}

#[tokio::test]
async fn test_preview_withFailingBackend_shouldReportError() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let (_backend, controller) = controller_over(MockBackend::failing(404, r#"{"detail": "Job not found"}"#), dir.path());

    let report = controller.preview(common::sample_job(), None).await?;

    match &report.media {
        MediaState::Error(message) => assert_eq!(message, "Failed to load processed video: Job not found"),
        other => panic!("expected error, got {:?}", other),
    }
    assert!(report.active_tracks.is_empty());
    assert_eq!(controller.registry().created_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_download_withOutputDir_shouldSaveThere() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let out = dir.path().join("out");
    let (_backend, controller) = controller_over(
        common::sample_backend().with_content_disposition("attachment; filename=talk_subtitled.mkv"),
        dir.path(),
    );

    let outcome = controller.download("job-42", Some(out.clone())).await?;

    assert_eq!(outcome.filename, "talk_subtitled.mkv");
    assert_eq!(outcome.saved_to, out.join("talk_subtitled.mkv"));
    assert!(outcome.saved_to.exists());
    Ok(())
}

#[tokio::test]
async fn test_download_withoutOutputDir_shouldUseConfiguredDir() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let (_backend, controller) = controller_over(common::sample_backend(), dir.path());

    let outcome = controller.download("job-42", None).await?;

    assert_eq!(outcome.saved_to, dir.path().join("processed_video.mkv"));
    Ok(())
}

#[tokio::test]
async fn test_summaries_shouldReturnOnePerLanguage() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let (backend, controller) = controller_over(common::sample_backend(), dir.path());

    let summaries = controller.summaries("job-42").await?;

    assert_eq!(summaries.len(), 3);
    assert!(summaries.iter().all(|s| s.job_id == "job-42"));
    assert!(summaries.iter().any(|s| s.language == "french"));
    assert_eq!(backend.summary_fetches(), 1);
    Ok(())
}
