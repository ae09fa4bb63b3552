//! Cancellation capability for an in-flight submission.
//!
//! A [`CancelHandle`] is created per submission and carries two things: the
//! abort flag that settles the pending request, and the slot for the
//! server-issued job id, captured if/when a response reveals one.  The
//! coordinator exposes the handle while the submission is active so a cancel
//! affordance can trigger it.

use std::sync::Mutex;

use tokio::sync::watch;

// ---------------------------------------------------------------------------
// CancelHandle
// ---------------------------------------------------------------------------

/// The cancellation capability for one submission.
///
/// Shared as `Arc<CancelHandle>` between the coordinator, the API call in
/// flight, and whoever holds the cancel affordance.
#[derive(Debug)]
pub struct CancelHandle {
    flag: watch::Sender<bool>,
    job_id: Mutex<Option<String>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            flag,
            job_id: Mutex::new(None),
        }
    }

    /// Trigger the local abort.
    ///
    /// Returns `true` only for the call that flips the flag; later calls are
    /// no-ops and return `false`.  The caller uses the return value to issue
    /// the best-effort server notification at most once.
    pub fn cancel(&self) -> bool {
        !self.flag.send_replace(true)
    }

    /// Whether the abort has been triggered.
    pub fn is_cancelled(&self) -> bool {
        *self.flag.borrow()
    }

    /// Resolves once the abort is triggered.
    ///
    /// Safe against the signal racing ahead of the wait: the current flag
    /// value is checked before suspending.
    pub async fn cancelled(&self) {
        let mut rx = self.flag.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Record the server-issued job id, first capture wins.
    pub fn set_job_id(&self, id: impl Into<String>) {
        let mut slot = self.job_id.lock().unwrap();
        if slot.is_none() {
            *slot = Some(id.into());
        }
    }

    /// The captured job id, if any.
    pub fn job_id(&self) -> Option<String> {
        self.job_id.lock().unwrap().clone()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
