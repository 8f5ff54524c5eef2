use tracing::debug;

use crate::time::is_usable_duration;

/// Horizontal extent of the scrub track in client coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrackBounds {
    pub left: f64,
    pub width: f64,
}

impl TrackBounds {
    pub fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }
}

/// Converts a pointer x coordinate into a fraction of the track.
///
/// Positions outside the track are clamped to `[0, 1]`; a track without width
/// maps everything to `0`.
///
/// # Example
///
/// ```
/// use engine::scrubber::{TrackBounds, pointer_fraction};
///
/// let track = TrackBounds::new(100.0, 200.0);
/// assert_eq!(pointer_fraction(200.0, track), 0.5);
/// assert_eq!(pointer_fraction(20.0, track), 0.0);
/// assert_eq!(pointer_fraction(900.0, track), 1.0);
/// ```
pub fn pointer_fraction(x: f64, track: TrackBounds) -> f64 {
    if track.width <= 0.0 || !track.width.is_finite() || !x.is_finite() {
        return 0.0;
    }
    ((x - track.left) / track.width).clamp(0.0, 1.0)
}

/// Playback progress as a percentage of `duration`, for the indicator's
/// `left` offset. `None` until the duration is known.
pub fn progress_percent(current_time: f64, duration: f64) -> Option<f64> {
    if !is_usable_duration(duration) || !current_time.is_finite() {
        return None;
    }
    Some((current_time / duration) * 100.0)
}

/// Pointer-to-playback binding with a page-wide drag.
///
/// A press on the track starts a drag that keeps following the pointer
/// anywhere on the page until release.
#[derive(Debug, Default)]
pub struct ScrubberController {
    dragging: bool,
}

impl ScrubberController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Starts a drag and returns the seek target under the pointer.
    pub fn on_press(&mut self, x: f64, track: TrackBounds, duration: f64) -> Option<f64> {
        self.dragging = true;
        seek_target(x, track, duration)
    }

    /// Follows the pointer while dragging.
    pub fn on_move(&mut self, x: f64, track: TrackBounds, duration: f64) -> Option<f64> {
        if !self.dragging {
            return None;
        }
        seek_target(x, track, duration)
    }

    /// Ends the drag. Returns true if a drag was active.
    pub fn on_release(&mut self) -> bool {
        let was_dragging = self.dragging;
        self.dragging = false;
        was_dragging
    }

    /// A completed click on the track seeks regardless of drag state.
    pub fn on_click(&self, x: f64, track: TrackBounds, duration: f64) -> Option<f64> {
        seek_target(x, track, duration)
    }
}

fn seek_target(x: f64, track: TrackBounds, duration: f64) -> Option<f64> {
    if !is_usable_duration(duration) {
        return None;
    }
    let fraction = pointer_fraction(x, track);
    let seconds = fraction * duration;
    debug!(x, fraction, seconds, "scrub");
    Some(seconds)
}
