//! Cooperative cancellation for long-running operations.
//!
//! There is no preemptive concurrency anywhere in this crate; instead a
//! [`CancelToken`] is threaded by reference through every store, selector,
//! and aggregation entry point and checked at loop boundaries. Cancellation
//! surfaces as [`FestError::Cancelled`] and aborts remaining work, but
//! partial in-memory mutations are not rolled back - callers must not
//! persist state after a cancellation error.
//!
//! # Example
//!
//! ```
//! use fest::cancel::CancelToken;
//!
//! let token = CancelToken::new();
//! assert!(token.check("walk").is_ok());
//!
//! token.cancel();
//! assert!(token.check("walk").is_err());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{FestError, Result};

/// Cloneable handle over a shared cancellation flag.
///
/// Clones observe the same flag, so an embedder can keep one handle and
/// hand another to the operation it may want to abort.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a new, not-yet-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Return an error if cancellation has been requested.
    ///
    /// `operation` names the work being aborted and ends up in the error.
    ///
    /// # Errors
    ///
    /// Returns [`FestError::Cancelled`] once [`cancel`](Self::cancel) has
    /// been called.
    pub fn check(&self, operation: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(FestError::cancelled(operation));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_token_not_cancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check("op").is_ok());
    }

    #[test]
    fn test_cancel_surfaces_error() {
        let token = CancelToken::new();
        token.cancel();

        let err = token.check("aggregate").unwrap_err();
        assert!(err.is_cancelled());
        assert!(err.to_string().contains("aggregate"));
    }

    #[test]
    fn test_clones_share_flag() {
        let token = CancelToken::new();
        let observer = token.clone();

        token.cancel();
        assert!(observer.is_cancelled());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let token = CancelToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }
}
