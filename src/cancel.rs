//! Cooperative cancellation for in-flight catalog requests.
//!
//! A [`Cancellation`] is shared between the caller and every blocking point
//! of a request (rate-limiter admission and the transport call). Triggering it
//! wakes all waiters at once; deadlines are implemented as a timer task that
//! triggers the same flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Shared handle to a cancellation flag.
pub type SharedCancellation = Arc<Cancellation>;

/// Cancellation flag with async notification.
#[derive(Debug, Default)]
pub struct Cancellation {
    is_cancelled: AtomicBool,
    notify: Notify,
}

impl Cancellation {
    /// Create a new, untriggered flag.
    pub fn new() -> Self {
        Self {
            is_cancelled: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Create a new shared flag wrapped in [`Arc`].
    pub fn shared() -> SharedCancellation {
        Arc::new(Self::new())
    }

    /// Create a shared flag that triggers itself once `timeout` elapses.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_deadline(timeout: Duration) -> SharedCancellation {
        let handle = Self::shared();
        let timer = Arc::downgrade(&handle);
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(handle) = timer.upgrade() {
                handle.cancel();
            }
        });
        handle
    }

    /// Trigger cancellation. Notifies all registered waiters exactly once.
    pub fn cancel(&self) {
        if !self.is_cancelled.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    /// Whether cancellation has been triggered.
    pub fn is_cancelled(&self) -> bool {
        self.is_cancelled.load(Ordering::SeqCst)
    }

    /// Wait until cancellation is triggered. Returns immediately if already set.
    pub async fn cancelled(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent cancel() is not lost.
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}
