//! Per-call deadline and cancellation state.
//!
//! # Design
//! Each dispatch takes its own context, so time-boxing or cancelling one call
//! never disturbs other calls sharing the client. The deadline maps onto the
//! transport's per-request timeout; the cancel flag is checked at every
//! dispatcher state transition. A synchronous client cannot interrupt a
//! blocked socket read, so the deadline is what bounds one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Deadline and cancellation state for a single call.
///
/// Clones share the cancel flag: cancelling through a [`CancelHandle`] is
/// observed by every clone of the context it came from.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl CallContext {
    /// Context with no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context whose deadline is `timeout` from now. A span too large to
    /// represent as an instant counts as no deadline at all.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
            cancelled: Arc::default(),
        }
    }

    /// Context with an absolute deadline.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: Arc::default(),
        }
    }

    /// Handle for cancelling this context from another thread.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.cancelled))
    }

    /// Whether `cancel` was called on a handle of this context.
    pub fn cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Whether the deadline has passed.
    pub fn expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Time left until the deadline: `None` without one, zero once it passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}

/// Cancels the [`CallContext`] it was created from.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
}
