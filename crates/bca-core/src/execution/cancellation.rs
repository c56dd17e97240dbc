//! Cooperative cancellation for long-running batches

use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared cancellation flag with an optional deadline
///
/// Clones share the same flag, so a caller can keep one handle and cancel
/// an analysis running on worker threads. Estimator calls are never
/// interrupted mid-flight; the flag is polled between calls.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancellationToken {
    /// Create a token that is not cancelled and has no deadline
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a token that trips once `limit` has elapsed from now
    pub fn with_time_limit(limit: Duration) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + limit),
        }
    }

    /// Keep the shared flag and additionally trip once `limit` has elapsed
    /// from now; an earlier existing deadline wins
    pub fn limited_to(mut self, limit: Duration) -> Self {
        let deadline = Instant::now() + limit;
        self.deadline = Some(self.deadline.map_or(deadline, |d| d.min(deadline)));
        self
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested or the deadline has passed
    pub fn is_cancelled(&self) -> bool {
        if self.cancelled.load(Ordering::Relaxed) {
            return true;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.cancel();
                true
            }
            _ => false,
        }
    }

    /// Return `Error::Cancelled` if the token has tripped
    pub fn check(&self, context: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled(format!("{context} was cancelled")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let token = CancellationToken::new();
        let handle = token.clone();
        assert!(!token.is_cancelled());
        assert!(token.check("replicates").is_ok());

        handle.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check("replicates"), Err(Error::Cancelled(_))));
    }

    #[test]
    fn test_deadline_trips() {
        let token = CancellationToken::with_time_limit(Duration::ZERO);
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_limited_to_keeps_shared_flag() {
        let token = CancellationToken::new();
        let limited = token.clone().limited_to(Duration::from_secs(3600));
        assert!(!limited.is_cancelled());
        token.cancel();
        assert!(limited.is_cancelled());

        let expired = CancellationToken::new().limited_to(Duration::ZERO);
        assert!(expired.is_cancelled());
        let still_expired = expired.limited_to(Duration::from_secs(3600));
        assert!(still_expired.is_cancelled());
    }
}
