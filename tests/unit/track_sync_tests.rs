/*!
 * Tests for subtitle track synchronization
 */

use vidsub::preview::{SyncOutcome, TrackSurface, synchronize};
use vidsub::session::SubtitleTrack;

use crate::common;

fn active_codes(tracks: &[SubtitleTrack]) -> Vec<&str> {
    tracks
        .iter()
        .filter(|t| t.active)
        .map(|t| t.language_code.as_str())
        .collect()
}

#[test]
fn test_synchronize_calledTwice_shouldGiveSameActivation() {
    let mut tracks = common::sample_job().subtitle_tracks();

    let first = synchronize("arabic", &mut tracks);
    let after_first = tracks.clone();
    let second = synchronize("arabic", &mut tracks);

    assert_eq!(first, second);
    assert_eq!(tracks, after_first);
    assert_eq!(active_codes(&tracks), vec!["arabic"]);
}

#[test]
fn test_synchronize_withInputLanguage_shouldActivateOriginalTrack() {
    let mut tracks = common::sample_job().subtitle_tracks();

    let outcome = synchronize("english", &mut tracks);

    assert_eq!(outcome.activated.as_deref(), Some("english"));
    assert_eq!(tracks[0].label, "English (Original)");
    assert!(tracks[0].active);
    assert_eq!(active_codes(&tracks).len(), 1);
}

#[test]
fn test_synchronize_withDisplayLabel_shouldMatchByLabel() {
    let mut tracks = vec![
        SubtitleTrack::new("ar", "Arabic"),
        SubtitleTrack::new("fr", "French"),
    ];

    let outcome = synchronize("French", &mut tracks);

    assert_eq!(outcome.activated.as_deref(), Some("fr"));
    assert_eq!(active_codes(&tracks), vec!["fr"]);
}

#[test]
fn test_synchronize_withIsoCodeAgainstNamedTrack_shouldMatchByLabel() {
    let mut tracks = vec![SubtitleTrack::new("german", "German")];
    let outcome = synchronize("de", &mut tracks);
    assert_eq!(outcome.activated.as_deref(), Some("german"));
}

#[test]
fn test_synchronize_withUnknownSelection_shouldLeaveAllInactive() {
    let mut tracks = common::sample_job().subtitle_tracks();
    tracks[1].active = true;

    let outcome = synchronize("ja", &mut tracks);

    assert!(outcome.not_found);
    assert!(active_codes(&tracks).is_empty());
}

#[test]
fn test_synchronize_withEmptySelection_shouldBehaveLikeNone() {
    let mut tracks = common::sample_job().subtitle_tracks();
    tracks[2].active = true;

    let outcome = synchronize("", &mut tracks);

    assert_eq!(outcome, SyncOutcome::default());
    assert!(active_codes(&tracks).is_empty());
}

#[test]
fn test_surface_register_shouldStartInactive() {
    let surface = TrackSurface::new();
    let mut track = SubtitleTrack::new("french", "French");
    track.active = true;

    surface.register(track);

    assert_eq!(surface.len(), 1);
    assert!(surface.active_languages().is_empty());
}

#[test]
fn test_surface_clones_shouldShareTracks() {
    let surface = TrackSurface::new();
    let view = surface.clone();

    view.register_all(common::sample_job().subtitle_tracks());
    let outcome = surface.synchronize("french", true);

    assert_eq!(outcome.activated.as_deref(), Some("french"));
    assert_eq!(view.active_languages(), vec!["french".to_string()]);
    assert_eq!(view.last_outcome(), Some(outcome));
}

#[test]
fn test_surface_lateRegistration_shouldMatchOnNextPass() {
    let surface = TrackSurface::new();
    surface.register(SubtitleTrack::new("english", "English (Original)"));

    let early = surface.synchronize("french", false);
    surface.register(SubtitleTrack::new("french", "French"));
    let late = surface.synchronize("french", true);

    assert!(early.not_found);
    assert_eq!(late.activated.as_deref(), Some("french"));
    assert_eq!(surface.active_languages(), vec!["french".to_string()]);
}

#[test]
fn test_surface_clear_shouldDetachEverything() {
    let surface = TrackSurface::new();
    surface.register_all(common::sample_job().subtitle_tracks());
    surface.synchronize("arabic", true);

    surface.clear();

    assert!(surface.is_empty());
    assert!(surface.last_outcome().is_none());
}
