use tracing::{debug, info};

use crate::config::SiteConfig;
use crate::error::Result;
use crate::filmstrip::{FilmstripAction, FilmstripGenerator, FilmstripPhase, PassId, SurfaceSize};
use crate::playlist::{Playlist, PlaylistEntry};
use crate::recovery::MediaRecovery;
use crate::scrubber::{ScrubberController, TrackBounds, progress_percent};
use crate::time::Millis;

/// Live readings of the primary video taken by the host when an event fires.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaSnapshot {
    pub source: String,
    pub duration: f64,
    pub current_time: f64,
    pub ready_state: u16,
    pub paused: bool,
}

impl MediaSnapshot {
    pub fn has_metadata(&self) -> bool {
        self.ready_state > 0
    }
}

/// Events raised by the detached probe video or by timers armed for it.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeEvent {
    MetadataLoaded { pass: PassId },
    Seeked { pass: PassId },
    Error { pass: PassId },
    FrameDrawn { pass: PassId, index: u32 },
    FrameFailed {
        pass: PassId,
        index: u32,
        reason: String,
    },
    TimeoutElapsed { pass: PassId },
}

/// Events observed on the primary video, its scrub track and the window.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Started { surface: SurfaceSize },
    MetadataLoaded { media: MediaSnapshot },
    TimeUpdate { current_time: f64, duration: f64 },
    Ended,
    MediaError { reason: String },
    /// The delay scheduled by `ScheduleReload` elapsed.
    ReloadElapsed,
    Resized {
        surface: SurfaceSize,
        media: MediaSnapshot,
    },
    /// The delay scheduled by a deferred filmstrip elapsed.
    FilmstripRetryElapsed { media: MediaSnapshot },
    Probe(ProbeEvent),
    PointerPressed {
        x: f64,
        track: TrackBounds,
        duration: f64,
    },
    PointerMoved {
        x: f64,
        track: TrackBounds,
        duration: f64,
    },
    PointerReleased,
    TrackClicked {
        x: f64,
        track: TrackBounds,
        duration: f64,
    },
    VideoClicked { paused: bool },
}

/// Work the host performs on the page.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerAction {
    /// Point the primary video at `src` and reload it.
    LoadSource { src: String },
    Play,
    Pause,
    UpdateLink { href: String, text: String },
    /// Reload the primary video from its current source.
    Reload,
    ScheduleReload { after_ms: u64 },
    SeekTo { seconds: f64 },
    /// Place the scrub indicator at `percent` of the track width.
    MoveIndicator { percent: f64 },
    ResizeSurface { surface: SurfaceSize },
    Filmstrip(FilmstripAction),
}

/// Rotating hero video with its filmstrip and scrubber.
///
/// Owns all transient state of the hero area for one page session; the host
/// feeds it [`PlayerEvent`]s and performs the returned [`PlayerAction`]s.
///
/// # Example
/// ```
/// use engine::filmstrip::SurfaceSize;
/// use engine::{HeroPlayer, PlayerAction, PlayerEvent, SiteConfig};
///
/// let mut player = HeroPlayer::new(&SiteConfig::default()).expect("valid config");
/// let actions = player.handle(
///     PlayerEvent::Started {
///         surface: SurfaceSize::new(800, 60),
///     },
///     0.0,
/// );
///
/// assert!(actions.contains(&PlayerAction::LoadSource {
///     src: String::from("videos/lyla.mp4"),
/// }));
/// ```
#[derive(Debug)]
pub struct HeroPlayer {
    playlist: Playlist,
    filmstrip: FilmstripGenerator,
    scrubber: ScrubberController,
    recovery: MediaRecovery,
    surface: SurfaceSize,
}

impl HeroPlayer {
    pub fn new(config: &SiteConfig) -> Result<Self> {
        Ok(Self {
            playlist: Playlist::new(config.playlist.clone())?,
            filmstrip: FilmstripGenerator::new(config.filmstrip.clone()),
            scrubber: ScrubberController::new(),
            recovery: MediaRecovery::new(config.media_retry),
            surface: SurfaceSize::default(),
        })
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn filmstrip(&self) -> &FilmstripGenerator {
        &self.filmstrip
    }

    pub fn scrubber(&self) -> &ScrubberController {
        &self.scrubber
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    /// Applies one event and returns the actions the host must perform, in
    /// order.
    pub fn handle(&mut self, event: PlayerEvent, now: Millis) -> Vec<PlayerAction> {
        match event {
            PlayerEvent::Started { surface } => self.start(surface),
            PlayerEvent::MetadataLoaded { media } => {
                self.recovery.on_recovered();
                self.regenerate(&media, now)
            }
            PlayerEvent::TimeUpdate {
                current_time,
                duration,
            } => progress_percent(current_time, duration)
                .map(|percent| vec![PlayerAction::MoveIndicator { percent }])
                .unwrap_or_default(),
            PlayerEvent::Ended => {
                let entry = self.playlist.advance().clone();
                load_entry(&entry)
            }
            PlayerEvent::MediaError { reason } => match self.recovery.on_error(&reason) {
                Ok(after_ms) => vec![PlayerAction::ScheduleReload { after_ms }],
                Err(_) => Vec::new(),
            },
            PlayerEvent::ReloadElapsed => vec![PlayerAction::Reload],
            PlayerEvent::Resized { surface, media } => self.resize(surface, &media, now),
            PlayerEvent::FilmstripRetryElapsed { media } => {
                if self.filmstrip.phase() == FilmstripPhase::Deferred {
                    self.regenerate(&media, now)
                } else {
                    debug!(phase = ?self.filmstrip.phase(), "filmstrip retry no longer needed");
                    Vec::new()
                }
            }
            PlayerEvent::Probe(probe) => self.probe(probe, now),
            PlayerEvent::PointerPressed { x, track, duration } => {
                seek_to(self.scrubber.on_press(x, track, duration))
            }
            PlayerEvent::PointerMoved { x, track, duration } => {
                seek_to(self.scrubber.on_move(x, track, duration))
            }
            PlayerEvent::PointerReleased => {
                self.scrubber.on_release();
                Vec::new()
            }
            PlayerEvent::TrackClicked { x, track, duration } => {
                seek_to(self.scrubber.on_click(x, track, duration))
            }
            PlayerEvent::VideoClicked { paused } => {
                if paused {
                    vec![PlayerAction::Play]
                } else {
                    vec![PlayerAction::Pause]
                }
            }
        }
    }

    fn start(&mut self, surface: SurfaceSize) -> Vec<PlayerAction> {
        self.surface = surface;
        let entry = self.playlist.current().clone();
        info!(
            src = %entry.src,
            entries = self.playlist.len(),
            width = surface.width,
            height = surface.height,
            "hero player started"
        );

        let mut actions = vec![
            PlayerAction::ResizeSurface { surface },
            PlayerAction::Filmstrip(FilmstripAction::ClearSurface),
        ];
        actions.extend(load_entry(&entry));
        actions
    }

    fn resize(
        &mut self,
        surface: SurfaceSize,
        media: &MediaSnapshot,
        now: Millis,
    ) -> Vec<PlayerAction> {
        self.surface = surface;
        let mut actions = vec![PlayerAction::ResizeSurface { surface }];
        if media.has_metadata() {
            actions.extend(self.regenerate(media, now));
        } else {
            actions.push(PlayerAction::Filmstrip(FilmstripAction::ClearSurface));
        }
        actions
    }

    fn regenerate(&mut self, media: &MediaSnapshot, now: Millis) -> Vec<PlayerAction> {
        let actions = self
            .filmstrip
            .regenerate(&media.source, media.duration, self.surface, now);
        wrap_filmstrip(actions)
    }

    fn probe(&mut self, event: ProbeEvent, now: Millis) -> Vec<PlayerAction> {
        let actions = match event {
            ProbeEvent::MetadataLoaded { pass } => self.filmstrip.on_probe_metadata(pass, now),
            ProbeEvent::Seeked { pass } => self.filmstrip.on_probe_seeked(pass),
            ProbeEvent::Error { pass } => self.filmstrip.on_probe_error(pass, now),
            ProbeEvent::FrameDrawn { pass, index } => {
                self.filmstrip.on_frame_drawn(pass, index, now)
            }
            ProbeEvent::FrameFailed {
                pass,
                index,
                reason,
            } => self.filmstrip.on_frame_failed(pass, index, &reason, now),
            ProbeEvent::TimeoutElapsed { pass } => self.filmstrip.on_timeout(pass, now),
        };
        wrap_filmstrip(actions)
    }
}

fn load_entry(entry: &PlaylistEntry) -> Vec<PlayerAction> {
    vec![
        PlayerAction::LoadSource {
            src: entry.src.clone(),
        },
        PlayerAction::Play,
        PlayerAction::UpdateLink {
            href: entry.link_href.clone(),
            text: entry.link_text.clone(),
        },
    ]
}

fn seek_to(target: Option<f64>) -> Vec<PlayerAction> {
    target
        .map(|seconds| vec![PlayerAction::SeekTo { seconds }])
        .unwrap_or_default()
}

fn wrap_filmstrip(actions: Vec<FilmstripAction>) -> Vec<PlayerAction> {
    actions.into_iter().map(PlayerAction::Filmstrip).collect()
}
