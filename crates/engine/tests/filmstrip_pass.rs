use std::collections::VecDeque;

use engine::filmstrip::frame_timestamps;
use engine::{
    FilmstripAction, FilmstripPhase, HeroPlayer, MediaSnapshot, PlayerAction, PlayerEvent,
    ProbeEvent, SiteConfig, SurfaceSize,
};

const FRAME_COUNT: usize = 20;

/// Host double that answers probe actions immediately and records them.
#[derive(Default)]
struct FakeProbeHost {
    seeks: Vec<f64>,
    drawn: Vec<u32>,
    released: Vec<u64>,
    retries: usize,
    fail_draw_at: Option<u32>,
    fail_seek_at: Option<u32>,
    clock_step_ms: f64,
}

impl FakeProbeHost {
    /// Performs `actions` and every follow-up until the player goes quiet.
    fn run(&mut self, player: &mut HeroPlayer, actions: Vec<PlayerAction>, start: f64) -> f64 {
        let mut now = start;
        let mut queue: VecDeque<PlayerAction> = actions.into();
        while let Some(action) = queue.pop_front() {
            let PlayerAction::Filmstrip(action) = action else {
                continue;
            };
            let reply = match action {
                FilmstripAction::LoadProbe { pass, .. } => {
                    Some(ProbeEvent::MetadataLoaded { pass })
                }
                FilmstripAction::SeekProbe {
                    pass,
                    index,
                    at_seconds,
                } => {
                    self.seeks.push(at_seconds);
                    if self.fail_seek_at == Some(index) {
                        Some(ProbeEvent::Error { pass })
                    } else {
                        Some(ProbeEvent::Seeked { pass })
                    }
                }
                FilmstripAction::DrawFrame { pass, index, .. } => {
                    if self.fail_draw_at == Some(index) {
                        Some(ProbeEvent::FrameFailed {
                            pass,
                            index,
                            reason: String::from("InvalidStateError"),
                        })
                    } else {
                        self.drawn.push(index);
                        Some(ProbeEvent::FrameDrawn { pass, index })
                    }
                }
                FilmstripAction::ReleaseProbe { pass } => {
                    self.released.push(pass);
                    None
                }
                FilmstripAction::ScheduleRetry { .. } => {
                    self.retries += 1;
                    None
                }
                FilmstripAction::ClearSurface | FilmstripAction::ArmTimeout { .. } => None,
            };
            if let Some(event) = reply {
                now += self.clock_step_ms;
                queue.extend(player.handle(PlayerEvent::Probe(event), now));
            }
        }
        now
    }
}

fn started_player() -> HeroPlayer {
    let mut player = HeroPlayer::new(&SiteConfig::default()).expect("default config is valid");
    player.handle(
        PlayerEvent::Started {
            surface: SurfaceSize::new(1_000, 56),
        },
        0.0,
    );
    player
}

fn media(duration: f64) -> MediaSnapshot {
    MediaSnapshot {
        source: String::from("videos/lyla.mp4"),
        duration,
        current_time: 0.0,
        ready_state: 1,
        paused: false,
    }
}

#[test]
fn full_pass_seeks_every_evenly_spaced_timestamp_once() {
    for duration in [0.5, 7.0, 93.37, 3_600.0] {
        let mut player = started_player();
        let mut host = FakeProbeHost::default();

        let actions = player.handle(
            PlayerEvent::MetadataLoaded {
                media: media(duration),
            },
            0.0,
        );
        host.run(&mut player, actions, 0.0);

        assert_eq!(host.seeks.len(), FRAME_COUNT);
        assert_eq!(host.seeks, frame_timestamps(duration, FRAME_COUNT as u32));
        for (index, at_seconds) in host.seeks.iter().enumerate() {
            let expected = (index as f64 / FRAME_COUNT as f64) * duration;
            assert!((at_seconds - expected).abs() < 1e-9);
        }
        assert_eq!(player.filmstrip().phase(), FilmstripPhase::Done);
        assert_eq!(player.filmstrip().captured(), FRAME_COUNT as u32);
        assert_eq!(host.released, vec![1]);
    }
}

#[test]
fn failed_draw_skips_only_that_frame() {
    for fail_at in [0, 7, 19] {
        let mut player = started_player();
        let mut host = FakeProbeHost {
            fail_draw_at: Some(fail_at),
            ..FakeProbeHost::default()
        };

        let actions = player.handle(PlayerEvent::MetadataLoaded { media: media(40.0) }, 0.0);
        host.run(&mut player, actions, 0.0);

        assert_eq!(host.seeks.len(), FRAME_COUNT);
        assert_eq!(host.drawn.len(), FRAME_COUNT - 1);
        assert!(!host.drawn.contains(&fail_at));
        assert_eq!(player.filmstrip().captured(), FRAME_COUNT as u32 - 1);
        assert_eq!(player.filmstrip().skipped(), 1);
        assert_eq!(player.filmstrip().phase(), FilmstripPhase::Done);
    }
}

#[test]
fn failed_seek_skips_only_that_frame() {
    let mut player = started_player();
    let mut host = FakeProbeHost {
        fail_seek_at: Some(3),
        ..FakeProbeHost::default()
    };

    let actions = player.handle(PlayerEvent::MetadataLoaded { media: media(40.0) }, 0.0);
    host.run(&mut player, actions, 0.0);

    assert_eq!(host.seeks.len(), FRAME_COUNT);
    assert_eq!(host.drawn.len(), FRAME_COUNT - 1);
    assert!(!host.drawn.contains(&3));
}

#[test]
fn invalid_duration_issues_no_seeks_until_a_retry_sees_a_valid_one() {
    let mut player = started_player();
    let mut host = FakeProbeHost::default();

    for duration in [f64::NAN, 0.0, -1.0] {
        let actions = player.handle(
            PlayerEvent::MetadataLoaded {
                media: media(duration),
            },
            0.0,
        );
        host.run(&mut player, actions, 0.0);
    }
    let actions = player.handle(
        PlayerEvent::FilmstripRetryElapsed {
            media: media(f64::NAN),
        },
        500.0,
    );
    host.run(&mut player, actions, 500.0);

    assert!(host.seeks.is_empty());
    assert_eq!(host.retries, 4);
    assert_eq!(player.filmstrip().phase(), FilmstripPhase::Deferred);

    let actions = player.handle(
        PlayerEvent::FilmstripRetryElapsed {
            media: media(12.0),
        },
        1_000.0,
    );
    host.run(&mut player, actions, 1_000.0);

    assert_eq!(host.seeks.len(), FRAME_COUNT);
    assert_eq!(player.filmstrip().phase(), FilmstripPhase::Done);
}

#[test]
fn slow_pass_is_abandoned_with_frames_captured_so_far() {
    let mut player = started_player();
    let mut host = FakeProbeHost {
        clock_step_ms: 1_000.0,
        ..FakeProbeHost::default()
    };

    let actions = player.handle(PlayerEvent::MetadataLoaded { media: media(40.0) }, 0.0);
    host.run(&mut player, actions, 0.0);

    assert_eq!(player.filmstrip().phase(), FilmstripPhase::TimedOut);
    assert!(host.seeks.len() < FRAME_COUNT);
    assert_eq!(host.drawn.len() as u32, player.filmstrip().captured());
    assert!(!host.drawn.is_empty());
    assert_eq!(host.released, vec![1]);
}
