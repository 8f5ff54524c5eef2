use tracing::{error, warn};

pub use crate::config::RetryPolicy;
use crate::error::{EngineError, Result};

/// Tracks primary media load failures against a [`RetryPolicy`].
///
/// With the default policy every failure schedules another full setup after a
/// fixed delay, forever. Setting `max_attempts` caps it.
#[derive(Debug)]
pub struct MediaRecovery {
    policy: RetryPolicy,
    attempts: u32,
}

impl MediaRecovery {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
        }
    }

    /// Consecutive failures since the last successful load.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Records a failure and returns the delay before the next setup.
    pub fn on_error(&mut self, reason: &str) -> Result<u64> {
        if let Some(max_attempts) = self.policy.max_attempts
            && self.attempts >= max_attempts
        {
            error!(attempts = self.attempts, reason, "main video error, giving up");
            return Err(EngineError::RetriesExhausted {
                attempts: self.attempts,
            });
        }

        self.attempts += 1;
        warn!(
            attempt = self.attempts,
            retry_in_ms = self.policy.delay_ms,
            reason,
            "main video error"
        );
        Ok(self.policy.delay_ms)
    }

    /// A load succeeded; the failure streak is over.
    pub fn on_recovered(&mut self) {
        self.attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::{MediaRecovery, RetryPolicy};
    use crate::error::EngineError;

    #[test]
    fn default_policy_retries_without_limit() {
        let mut recovery = MediaRecovery::new(RetryPolicy::default());

        for _ in 0..1_000 {
            assert_eq!(recovery.on_error("network").expect("unbounded"), 1_000);
        }
        assert_eq!(recovery.attempts(), 1_000);
    }

    #[test]
    fn capped_policy_gives_up_after_max_attempts() {
        let mut recovery = MediaRecovery::new(RetryPolicy {
            delay_ms: 250,
            max_attempts: Some(2),
        });

        assert_eq!(recovery.on_error("decode").expect("first retry"), 250);
        assert_eq!(recovery.on_error("decode").expect("second retry"), 250);
        assert!(matches!(
            recovery.on_error("decode"),
            Err(EngineError::RetriesExhausted { attempts: 2 })
        ));
    }

    #[test]
    fn recovery_resets_the_failure_streak() {
        let mut recovery = MediaRecovery::new(RetryPolicy {
            delay_ms: 10,
            max_attempts: Some(1),
        });
        recovery.on_error("network").expect("first retry");

        recovery.on_recovered();

        assert_eq!(recovery.attempts(), 0);
        assert!(recovery.on_error("network").is_ok());
    }
}
