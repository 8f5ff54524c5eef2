use crate::error::{EngineError, Result};

/// Wall clock reading in milliseconds, as reported by the host.
pub type Millis = f64;

/// Returns true when `duration` can drive seeking: finite and positive.
pub fn is_usable_duration(duration: f64) -> bool {
    duration.is_finite() && duration > 0.0
}

/// Validates a reported media duration.
///
/// # Example
/// ```
/// use engine::time::ensure_usable_duration;
///
/// assert!(ensure_usable_duration(f64::NAN).is_err());
/// assert_eq!(ensure_usable_duration(12.5).expect("usable"), 12.5);
/// ```
pub fn ensure_usable_duration(duration: f64) -> Result<f64> {
    if is_usable_duration(duration) {
        Ok(duration)
    } else {
        Err(EngineError::InvalidDuration(duration))
    }
}

/// Fixed wall clock budget measured from a start instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deadline {
    started_at: Millis,
    budget_ms: u64,
}

impl Deadline {
    pub fn new(started_at: Millis, budget_ms: u64) -> Self {
        Self {
            started_at,
            budget_ms,
        }
    }

    /// Milliseconds spent since the deadline started.
    pub fn elapsed(&self, now: Millis) -> Millis {
        (now - self.started_at).max(0.0)
    }

    /// Returns true once strictly more than the budget has elapsed.
    pub fn is_expired(&self, now: Millis) -> bool {
        self.elapsed(now) > self.budget_ms as f64
    }
}
