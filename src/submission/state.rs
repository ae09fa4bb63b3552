//! Submission state machine.
//!
//! [`SubmissionState`] tracks a single transcription submission through the
//! coordinator.  A UI reads it to disable the submit affordance while a
//! request is in flight and to show the cancel affordance only then.

// ---------------------------------------------------------------------------
// SubmissionState
// ---------------------------------------------------------------------------

/// States of a single transcription submission.
///
/// The state machine transitions are:
///
/// ```text
/// Idle ──submit()──▶ Submitting ──success payload──▶ Succeeded
///                               ──non-2xx / transport / bad payload──▶ Failed
///                               ──cancel() or environment abort──▶ Cancelled
/// ```
///
/// The three terminal states are absorbing for that submission; a new
/// `submit()` call starts over from `Submitting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    /// No submission has started yet.
    Idle,

    /// The request is in flight; the only state in which cancellation has
    /// an effect.
    Submitting,

    /// The server returned a well-formed result set.
    Succeeded,

    /// The server returned a non-success status, the transport failed, or a
    /// success response carried a malformed payload.
    Failed,

    /// The user (or the environment) aborted the request before it settled.
    /// Not a failure: no error is surfaced for this state.
    Cancelled,
}

impl SubmissionState {
    /// Returns `true` while the request is in flight.
    ///
    /// The UI uses this to disable the submit affordance and show the cancel
    /// affordance.
    ///
    /// ```
    /// use transcribe_client::submission::SubmissionState;
    ///
    /// assert!(!SubmissionState::Idle.is_submitting());
    /// assert!(SubmissionState::Submitting.is_submitting());
    /// assert!(!SubmissionState::Cancelled.is_submitting());
    /// ```
    pub fn is_submitting(&self) -> bool {
        matches!(self, SubmissionState::Submitting)
    }

    /// Returns `true` once the submission has settled, one way or another.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionState::Succeeded | SubmissionState::Failed | SubmissionState::Cancelled
        )
    }

    /// A short human-readable label suitable for a status line.
    pub fn label(&self) -> &'static str {
        match self {
            SubmissionState::Idle => "Idle",
            SubmissionState::Submitting => "Transcribing",
            SubmissionState::Succeeded => "Done",
            SubmissionState::Failed => "Failed",
            SubmissionState::Cancelled => "Cancelled",
        }
    }
}

impl Default for SubmissionState {
    fn default() -> Self {
        SubmissionState::Idle
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_submitting_is_submitting() {
        assert!(!SubmissionState::Idle.is_submitting());
        assert!(SubmissionState::Submitting.is_submitting());
        assert!(!SubmissionState::Succeeded.is_submitting());
        assert!(!SubmissionState::Failed.is_submitting());
        assert!(!SubmissionState::Cancelled.is_submitting());
    }

    #[test]
    fn terminal_states() {
        assert!(!SubmissionState::Idle.is_terminal());
        assert!(!SubmissionState::Submitting.is_terminal());
        assert!(SubmissionState::Succeeded.is_terminal());
        assert!(SubmissionState::Failed.is_terminal());
        assert!(SubmissionState::Cancelled.is_terminal());
    }

    #[test]
    fn labels() {
        assert_eq!(SubmissionState::Idle.label(), "Idle");
        assert_eq!(SubmissionState::Submitting.label(), "Transcribing");
        assert_eq!(SubmissionState::Succeeded.label(), "Done");
        assert_eq!(SubmissionState::Failed.label(), "Failed");
        assert_eq!(SubmissionState::Cancelled.label(), "Cancelled");
    }

    #[test]
    fn default_is_idle() {
        assert_eq!(SubmissionState::default(), SubmissionState::Idle);
    }
}
