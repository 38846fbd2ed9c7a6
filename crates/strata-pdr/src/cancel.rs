//! Cooperative cancellation for long-running frame operations.
//!
//! A [`CancellationToken`] is polled between discrete units of work. It can be
//! cancelled explicitly from any thread, or carry a wall-clock deadline after
//! which it reports itself cancelled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Returned by [`CancellationToken::check`] once cancellation was requested.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("analysis interrupted: {reason}")]
pub struct Interrupted {
    pub reason: String,
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    reason: OnceLock<String>,
    deadline: Option<Instant>,
}

#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    state: Arc<CancelState>,
}

pub(crate) fn deadline_exceeded(deadline: Option<Instant>) -> bool {
    match deadline {
        Some(deadline) => Instant::now() >= deadline,
        None => false,
    }
}

impl CancellationToken {
    /// A token that is only cancelled explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            state: Arc::new(CancelState {
                deadline: Some(deadline),
                ..CancelState::default()
            }),
        }
    }

    /// A token that expires `timeout_secs` from now. Zero means no deadline.
    pub fn with_timeout_secs(timeout_secs: u64) -> Self {
        if timeout_secs == 0 {
            return Self::new();
        }
        match Instant::now().checked_add(Duration::from_secs(timeout_secs)) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::new(),
        }
    }

    /// Request cancellation. The first reason given is the one reported.
    pub fn cancel(&self, reason: impl Into<String>) {
        let _ = self.state.reason.set(reason.into());
        self.state.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst) || deadline_exceeded(self.state.deadline)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.state.deadline
    }

    pub fn check(&self) -> Result<(), Interrupted> {
        if self.state.cancelled.load(Ordering::SeqCst) {
            let reason = self
                .state
                .reason
                .get()
                .cloned()
                .unwrap_or_else(|| "cancellation requested".to_string());
            return Err(Interrupted { reason });
        }
        if deadline_exceeded(self.state.deadline) {
            return Err(Interrupted {
                reason: "deadline exceeded".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_not_cancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());
        assert!(token.deadline().is_none());
    }

    #[test]
    fn cancel_is_visible_through_clones() {
        let token = CancellationToken::new();
        let observer = token.clone();
        token.cancel("user abort");
        assert!(observer.is_cancelled());
        assert_eq!(
            observer.check(),
            Err(Interrupted {
                reason: "user abort".to_string()
            })
        );
    }

    #[test]
    fn first_reason_wins() {
        let token = CancellationToken::new();
        token.cancel("first");
        token.cancel("second");
        assert_eq!(token.check().unwrap_err().reason, "first");
    }

    #[test]
    fn past_deadline_reports_cancellation() {
        let past = Instant::now() - Duration::from_secs(1);
        let token = CancellationToken::with_deadline(past);
        assert!(token.is_cancelled());
        assert_eq!(token.check().unwrap_err().reason, "deadline exceeded");
    }

    #[test]
    fn future_deadline_is_not_cancelled() {
        let token = CancellationToken::with_timeout_secs(60);
        assert!(token.deadline().is_some());
        assert!(token.check().is_ok());
    }

    #[test]
    fn zero_timeout_means_no_deadline() {
        assert!(CancellationToken::with_timeout_secs(0).deadline().is_none());
    }

    #[test]
    fn interrupted_display_includes_reason() {
        let err = Interrupted {
            reason: "shutdown".into(),
        };
        assert_eq!(err.to_string(), "analysis interrupted: shutdown");
    }
}
