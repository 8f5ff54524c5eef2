//! Filmstrip generation: a strictly sequential seek-and-capture pass driven
//! by a detached probe video.
//!
//! The generator never touches media itself. The host feeds it probe events
//! and performs the [`FilmstripAction`]s it returns; each action that waits on
//! the probe (`LoadProbe`, `SeekProbe`, `DrawFrame`) is answered by exactly one
//! event before the generator issues the next one, so seeks never overlap.

use tracing::{debug, error, info, warn};

use crate::config::FilmstripSettings;
use crate::error::EngineError;
use crate::time::{Deadline, Millis, ensure_usable_duration};

/// Identifies one generation pass. Newer passes have larger ids.
pub type PassId = u64;

/// Pixel size of the drawing surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn has_area(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Horizontal slot a captured frame is drawn into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSlot {
    pub x: f64,
    pub width: f64,
    pub height: f64,
}

/// Where a generation pass currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilmstripPhase {
    Idle,
    /// Duration was not usable; a retry is scheduled.
    Deferred,
    /// Waiting for the probe's metadata.
    Loading,
    Seeking(u32),
    Drawing(u32),
    Done,
    TimedOut,
    /// The probe failed before any frame could be requested.
    Failed,
}

impl FilmstripPhase {
    fn is_in_flight(self) -> bool {
        matches!(self, Self::Loading | Self::Seeking(_) | Self::Drawing(_))
    }
}

/// Work the host performs on behalf of the generator.
#[derive(Debug, Clone, PartialEq)]
pub enum FilmstripAction {
    /// Fill the whole surface with the background colour.
    ClearSurface,
    /// Call back after `after_ms` so generation can be retried.
    ScheduleRetry { after_ms: u64 },
    /// Create a fresh detached video pointed at `src`.
    LoadProbe { pass: PassId, src: String },
    /// Report a timeout for `pass` after `after_ms`.
    ArmTimeout { pass: PassId, after_ms: u64 },
    SeekProbe {
        pass: PassId,
        index: u32,
        at_seconds: f64,
    },
    /// Draw the probe's current frame into `slot`, then report the outcome.
    DrawFrame {
        pass: PassId,
        index: u32,
        slot: FrameSlot,
    },
    /// Drop the probe and everything listening on it.
    ReleaseProbe { pass: PassId },
}

#[derive(Debug, Clone, Copy)]
struct Pass {
    id: PassId,
    duration: f64,
    surface: SurfaceSize,
    deadline: Deadline,
}

/// Returns the `frame_count` evenly spaced capture times `(i / n) * duration`.
///
/// # Example
/// ```
/// use engine::filmstrip::frame_timestamps;
///
/// assert_eq!(frame_timestamps(10.0, 4), vec![0.0, 2.5, 5.0, 7.5]);
/// ```
pub fn frame_timestamps(duration: f64, frame_count: u32) -> Vec<f64> {
    (0..frame_count)
        .map(|index| frame_timestamp(duration, frame_count, index))
        .collect()
}

fn frame_timestamp(duration: f64, frame_count: u32, index: u32) -> f64 {
    (f64::from(index) / f64::from(frame_count)) * duration
}

/// Returns the slot for frame `index` when `frame_count` frames share the
/// surface width.
pub fn frame_slot(surface: SurfaceSize, frame_count: u32, index: u32) -> FrameSlot {
    let width = f64::from(surface.width) / f64::from(frame_count.max(1));
    FrameSlot {
        x: f64::from(index) * width,
        width,
        height: f64::from(surface.height),
    }
}

/// Appends a cache-defeating query parameter so the probe always reloads.
///
/// # Example
/// ```
/// use engine::filmstrip::cache_busted_source;
///
/// assert_eq!(
///     cache_busted_source("videos/max.mp4", "cachebuster", 1_700.0),
///     "videos/max.mp4?cachebuster=1700"
/// );
/// assert_eq!(
///     cache_busted_source("clip.mp4?v=2", "cachebuster", 5.0),
///     "clip.mp4?v=2&cachebuster=5"
/// );
/// ```
pub fn cache_busted_source(src: &str, param: &str, now: Millis) -> String {
    let separator = if src.contains('?') { '&' } else { '?' };
    format!("{src}{separator}{param}={}", now.max(0.0).trunc() as u64)
}

/// Sequential filmstrip generator.
#[derive(Debug)]
pub struct FilmstripGenerator {
    settings: FilmstripSettings,
    phase: FilmstripPhase,
    pass: Option<Pass>,
    next_pass_id: PassId,
    captured: u32,
    skipped: u32,
}

impl FilmstripGenerator {
    pub fn new(settings: FilmstripSettings) -> Self {
        Self {
            settings,
            phase: FilmstripPhase::Idle,
            pass: None,
            next_pass_id: 1,
            captured: 0,
            skipped: 0,
        }
    }

    pub fn phase(&self) -> FilmstripPhase {
        self.phase
    }

    /// Id of the most recent pass, if one was ever started.
    pub fn current_pass(&self) -> Option<PassId> {
        self.pass.map(|pass| pass.id)
    }

    /// Frames drawn successfully in the current pass.
    pub fn captured(&self) -> u32 {
        self.captured
    }

    /// Frames skipped after a seek or draw failure in the current pass.
    pub fn skipped(&self) -> u32 {
        self.skipped
    }

    /// Starts a new pass over `source`, superseding any pass in flight.
    ///
    /// An unusable `duration` defers the pass: the surface is still cleared and
    /// a retry is scheduled, but no probe is created.
    pub fn regenerate(
        &mut self,
        source: &str,
        duration: f64,
        surface: SurfaceSize,
        now: Millis,
    ) -> Vec<FilmstripAction> {
        let mut actions = Vec::new();
        if let Some(previous) = self.pass
            && self.phase.is_in_flight()
        {
            debug!(pass = previous.id, "superseding filmstrip pass");
            actions.push(FilmstripAction::ReleaseProbe { pass: previous.id });
        }
        actions.push(FilmstripAction::ClearSurface);
        self.captured = 0;
        self.skipped = 0;

        let duration = match ensure_usable_duration(duration) {
            Ok(duration) => duration,
            Err(error) => {
                warn!(
                    %error,
                    retry_in_ms = self.settings.retry_delay_ms,
                    "filmstrip deferred"
                );
                self.phase = FilmstripPhase::Deferred;
                actions.push(FilmstripAction::ScheduleRetry {
                    after_ms: self.settings.retry_delay_ms,
                });
                return actions;
            }
        };

        if !surface.has_area() {
            let error = EngineError::InvalidSurface {
                width: surface.width,
                height: surface.height,
            };
            warn!(%error, "filmstrip skipped until the surface is resized");
            self.phase = FilmstripPhase::Idle;
            return actions;
        }

        let id = self.next_pass_id;
        self.next_pass_id += 1;
        self.pass = Some(Pass {
            id,
            duration,
            surface,
            deadline: Deadline::new(now, self.settings.timeout_ms),
        });
        self.phase = FilmstripPhase::Loading;

        info!(
            pass = id,
            duration,
            width = surface.width,
            height = surface.height,
            frame_count = self.settings.frame_count,
            "generating filmstrip"
        );
        actions.push(FilmstripAction::LoadProbe {
            pass: id,
            src: cache_busted_source(source, &self.settings.cache_bust_param, now),
        });
        actions.push(FilmstripAction::ArmTimeout {
            pass: id,
            after_ms: self.settings.timeout_ms,
        });
        actions
    }

    /// The probe reported its metadata; the first seek can be issued.
    pub fn on_probe_metadata(&mut self, pass: PassId, now: Millis) -> Vec<FilmstripAction> {
        if !self.accepts(pass, "metadata") || self.phase != FilmstripPhase::Loading {
            return Vec::new();
        }
        self.advance(0, now)
    }

    /// The probe finished seeking; its current frame can be drawn.
    pub fn on_probe_seeked(&mut self, pass: PassId) -> Vec<FilmstripAction> {
        if !self.accepts(pass, "seeked") {
            return Vec::new();
        }
        let (FilmstripPhase::Seeking(index), Some(current)) = (self.phase, self.pass) else {
            return Vec::new();
        };

        self.phase = FilmstripPhase::Drawing(index);
        vec![FilmstripAction::DrawFrame {
            pass,
            index,
            slot: frame_slot(current.surface, self.settings.frame_count, index),
        }]
    }

    /// The probe raised an error. A failed seek skips its frame; a failed load
    /// ends the pass.
    pub fn on_probe_error(&mut self, pass: PassId, now: Millis) -> Vec<FilmstripAction> {
        if !self.accepts(pass, "error") {
            return Vec::new();
        }
        match self.phase {
            FilmstripPhase::Seeking(index) | FilmstripPhase::Drawing(index) => {
                let at_seconds = self.timestamp_of(index);
                warn!(pass, index, at_seconds, "error seeking filmstrip probe, skipping frame");
                self.skipped += 1;
                self.advance(index + 1, now)
            }
            FilmstripPhase::Loading => {
                error!(pass, "filmstrip probe failed to load");
                self.phase = FilmstripPhase::Failed;
                vec![FilmstripAction::ReleaseProbe { pass }]
            }
            _ => Vec::new(),
        }
    }

    /// The frame requested by `DrawFrame` landed on the surface.
    pub fn on_frame_drawn(&mut self, pass: PassId, index: u32, now: Millis) -> Vec<FilmstripAction> {
        if !self.accepts(pass, "drawn") || self.phase != FilmstripPhase::Drawing(index) {
            return Vec::new();
        }
        self.captured += 1;
        self.advance(index + 1, now)
    }

    /// Drawing the frame requested by `DrawFrame` failed; the slot stays blank.
    pub fn on_frame_failed(
        &mut self,
        pass: PassId,
        index: u32,
        reason: &str,
        now: Millis,
    ) -> Vec<FilmstripAction> {
        if !self.accepts(pass, "draw failed") || self.phase != FilmstripPhase::Drawing(index) {
            return Vec::new();
        }
        warn!(pass, index, reason, "error drawing filmstrip frame, skipping");
        self.skipped += 1;
        self.advance(index + 1, now)
    }

    /// The pass budget armed by `ArmTimeout` ran out.
    pub fn on_timeout(&mut self, pass: PassId, now: Millis) -> Vec<FilmstripAction> {
        if !self.accepts(pass, "timeout") || !self.phase.is_in_flight() {
            return Vec::new();
        }
        self.time_out(pass, now)
    }

    fn advance(&mut self, index: u32, now: Millis) -> Vec<FilmstripAction> {
        let Some(current) = self.pass else {
            return Vec::new();
        };

        if index >= self.settings.frame_count {
            self.phase = FilmstripPhase::Done;
            info!(
                pass = current.id,
                captured = self.captured,
                skipped = self.skipped,
                elapsed_ms = current.deadline.elapsed(now),
                "filmstrip generation complete"
            );
            return vec![FilmstripAction::ReleaseProbe { pass: current.id }];
        }

        if current.deadline.is_expired(now) {
            return self.time_out(current.id, now);
        }

        let at_seconds = frame_timestamp(current.duration, self.settings.frame_count, index);
        self.phase = FilmstripPhase::Seeking(index);
        debug!(pass = current.id, index, at_seconds, "seeking filmstrip probe");
        vec![FilmstripAction::SeekProbe {
            pass: current.id,
            index,
            at_seconds,
        }]
    }

    fn time_out(&mut self, pass: PassId, now: Millis) -> Vec<FilmstripAction> {
        let elapsed_ms = self.pass.map(|current| current.deadline.elapsed(now));
        error!(
            pass,
            captured = self.captured,
            skipped = self.skipped,
            elapsed_ms = ?elapsed_ms,
            "filmstrip generation timeout"
        );
        self.phase = FilmstripPhase::TimedOut;
        vec![FilmstripAction::ReleaseProbe { pass }]
    }

    fn accepts(&self, pass: PassId, event: &'static str) -> bool {
        let current = self.current_pass();
        if current == Some(pass) {
            return true;
        }
        debug!(pass, current = ?current, event, "ignoring stale filmstrip event");
        false
    }

    fn timestamp_of(&self, index: u32) -> f64 {
        self.pass
            .map(|current| frame_timestamp(current.duration, self.settings.frame_count, index))
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        FilmstripAction, FilmstripGenerator, FilmstripPhase, FrameSlot, SurfaceSize, frame_slot,
        frame_timestamps,
    };
    use crate::config::FilmstripSettings;

    fn generator() -> FilmstripGenerator {
        FilmstripGenerator::new(FilmstripSettings::default())
    }

    fn surface() -> SurfaceSize {
        SurfaceSize::new(800, 60)
    }

    fn started(generator: &mut FilmstripGenerator) -> u64 {
        let actions = generator.regenerate("videos/lyla.mp4", 40.0, surface(), 0.0);
        let Some(FilmstripAction::LoadProbe { pass, .. }) = actions.get(1) else {
            panic!("expected LoadProbe after ClearSurface, got {actions:?}");
        };
        *pass
    }

    #[test]
    fn timestamps_are_evenly_spaced_from_zero() {
        let timestamps = frame_timestamps(40.0, 20);
        assert_eq!(timestamps.len(), 20);
        assert_eq!(timestamps[0], 0.0);
        assert_eq!(timestamps[1], 2.0);
        assert_eq!(timestamps[19], 38.0);
    }

    #[test]
    fn slot_width_is_surface_width_over_frame_count() {
        let slot = frame_slot(SurfaceSize::new(800, 60), 20, 3);
        assert_eq!(
            slot,
            FrameSlot {
                x: 120.0,
                width: 40.0,
                height: 60.0
            }
        );
    }

    #[test]
    fn regenerate_clears_then_loads_cache_busted_probe_and_arms_timeout() {
        let mut generator = generator();

        let actions = generator.regenerate("videos/lyla.mp4", 40.0, surface(), 1_234.0);

        assert_eq!(
            actions,
            vec![
                FilmstripAction::ClearSurface,
                FilmstripAction::LoadProbe {
                    pass: 1,
                    src: String::from("videos/lyla.mp4?cachebuster=1234"),
                },
                FilmstripAction::ArmTimeout {
                    pass: 1,
                    after_ms: 15_000,
                },
            ]
        );
        assert_eq!(generator.phase(), FilmstripPhase::Loading);
    }

    #[test]
    fn nan_duration_defers_with_retry_and_no_probe() {
        let mut generator = generator();

        let actions = generator.regenerate("videos/lyla.mp4", f64::NAN, surface(), 0.0);

        assert_eq!(
            actions,
            vec![
                FilmstripAction::ClearSurface,
                FilmstripAction::ScheduleRetry { after_ms: 500 },
            ]
        );
        assert_eq!(generator.phase(), FilmstripPhase::Deferred);
        assert_eq!(generator.current_pass(), None);
    }

    #[test]
    fn zero_width_surface_does_not_start_a_pass() {
        let mut generator = generator();

        let actions = generator.regenerate("videos/lyla.mp4", 40.0, SurfaceSize::new(0, 60), 0.0);

        assert_eq!(actions, vec![FilmstripAction::ClearSurface]);
        assert_eq!(generator.phase(), FilmstripPhase::Idle);
    }

    #[test]
    fn seek_is_only_issued_after_previous_frame_settles() {
        let mut generator = generator();
        let pass = started(&mut generator);

        let first = generator.on_probe_metadata(pass, 10.0);
        assert!(matches!(
            first.as_slice(),
            [FilmstripAction::SeekProbe { index: 0, .. }]
        ));

        // A duplicate seeked/metadata event must not issue a second seek.
        assert!(generator.on_probe_metadata(pass, 11.0).is_empty());
        let draw = generator.on_probe_seeked(pass);
        assert!(matches!(
            draw.as_slice(),
            [FilmstripAction::DrawFrame { index: 0, .. }]
        ));
        assert!(generator.on_probe_seeked(pass).is_empty());

        let next = generator.on_frame_drawn(pass, 0, 20.0);
        assert!(matches!(
            next.as_slice(),
            [FilmstripAction::SeekProbe { index: 1, .. }]
        ));
        assert_eq!(generator.captured(), 1);
    }

    #[test]
    fn load_error_fails_the_pass_and_releases_the_probe() {
        let mut generator = generator();
        let pass = started(&mut generator);

        let actions = generator.on_probe_error(pass, 5.0);

        assert_eq!(actions, vec![FilmstripAction::ReleaseProbe { pass }]);
        assert_eq!(generator.phase(), FilmstripPhase::Failed);
    }

    #[test]
    fn step_after_budget_times_out_instead_of_seeking() {
        let mut generator = generator();
        let pass = started(&mut generator);
        generator.on_probe_metadata(pass, 0.0);
        generator.on_probe_seeked(pass);

        let actions = generator.on_frame_drawn(pass, 0, 15_001.0);

        assert_eq!(actions, vec![FilmstripAction::ReleaseProbe { pass }]);
        assert_eq!(generator.phase(), FilmstripPhase::TimedOut);
        assert_eq!(generator.captured(), 1);
    }

    #[test]
    fn armed_timeout_ends_a_stalled_seek() {
        let mut generator = generator();
        let pass = started(&mut generator);
        generator.on_probe_metadata(pass, 0.0);

        let actions = generator.on_timeout(pass, 15_000.0);

        assert_eq!(actions, vec![FilmstripAction::ReleaseProbe { pass }]);
        assert_eq!(generator.phase(), FilmstripPhase::TimedOut);
        assert!(generator.on_probe_seeked(pass).is_empty());
    }

    #[test]
    fn timeout_after_completion_is_ignored() {
        let mut generator = FilmstripGenerator::new(FilmstripSettings {
            frame_count: 1,
            ..FilmstripSettings::default()
        });
        let pass = started(&mut generator);
        generator.on_probe_metadata(pass, 0.0);
        generator.on_probe_seeked(pass);
        generator.on_frame_drawn(pass, 0, 1.0);
        assert_eq!(generator.phase(), FilmstripPhase::Done);

        assert!(generator.on_timeout(pass, 15_000.0).is_empty());
        assert_eq!(generator.phase(), FilmstripPhase::Done);
    }

    #[test]
    fn regenerate_supersedes_in_flight_pass_and_ignores_its_events() {
        let mut generator = generator();
        let old = started(&mut generator);
        generator.on_probe_metadata(old, 0.0);

        let actions = generator.regenerate("videos/max.mp4", 12.0, surface(), 100.0);
        assert_eq!(actions[0], FilmstripAction::ReleaseProbe { pass: old });
        assert_eq!(actions[1], FilmstripAction::ClearSurface);
        let new = generator.current_pass().expect("new pass");
        assert!(new > old);

        assert!(generator.on_probe_seeked(old).is_empty());
        assert!(generator.on_frame_drawn(old, 0, 101.0).is_empty());
        assert_eq!(generator.phase(), FilmstripPhase::Loading);
    }
}
