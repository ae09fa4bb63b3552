//! Submission coordinator — owns the lifecycle of one transcription request.
//!
//! [`Coordinator::submit`] validates the input, publishes a fresh
//! [`CancelHandle`], issues exactly one API call and races it against the
//! local abort.  [`Coordinator::cancel`] triggers that abort and then sends
//! the best-effort server notification when a job id is known.
//!
//! Cancellation is two independent, ordered effects: the local abort is the
//! authoritative one (it settles `submit` promptly and makes any
//! later-arriving response stale), the server notification merely frees
//! backend resources and its failure is swallowed.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::api::{ApiError, TranscriptionApi, TranscriptionResult};
use crate::session::Session;
use crate::submission::{CancelHandle, InputError, SubmissionInput, SubmissionState};

// ---------------------------------------------------------------------------
// SubmitError
// ---------------------------------------------------------------------------

/// Failure modes of a submission.
///
/// Cancellation is deliberately absent: a cancelled submission settles as
/// [`SubmissionOutcome::Cancelled`], a normal terminal state rather than an
/// error.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The input failed local validation; no I/O was performed.
    #[error(transparent)]
    Invalid(#[from] InputError),

    /// Another submission is still in flight on this coordinator.
    #[error("a submission is already in flight")]
    AlreadyActive,

    /// Transport-level failure unrelated to cancellation.
    #[error("network failure: {0}")]
    Network(String),

    /// The server answered `/transcribe` with a non-success status.
    #[error("transcription failed with status {status}")]
    Transcription { status: u16 },

    /// The server rejected the bearer token; the caller should invalidate
    /// the session and re-authenticate.
    #[error("not authorized")]
    Auth,

    /// A success status whose payload could not be parsed.
    #[error("malformed transcription response: {0}")]
    MalformedResponse(String),
}

impl From<ApiError> for SubmitError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Network(msg) => SubmitError::Network(msg),
            ApiError::Status(status) => SubmitError::Transcription { status },
            ApiError::Auth => SubmitError::Auth,
            ApiError::Malformed(msg) => SubmitError::MalformedResponse(msg),
        }
    }
}

// ---------------------------------------------------------------------------
// SubmissionOutcome
// ---------------------------------------------------------------------------

/// How a submission settled, when it settled at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The server produced one result per input, in submission order.
    Completed {
        results: Vec<TranscriptionResult>,
        /// Server-issued job identifier, when the backend reported one.
        job_id: Option<String>,
    },

    /// The submission was aborted before the server's answer was accepted.
    Cancelled,
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Drives a single transcription submission at a time.
///
/// At most one [`CancelHandle`] is live per coordinator; a second `submit`
/// while one is active is rejected with [`SubmitError::AlreadyActive`].  The
/// session is read per request and never mutated here.
pub struct Coordinator<A: TranscriptionApi> {
    api: Arc<A>,
    active: Mutex<Option<Arc<CancelHandle>>>,
    state: Mutex<SubmissionState>,
}

impl<A: TranscriptionApi> Coordinator<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            active: Mutex::new(None),
            state: Mutex::new(SubmissionState::Idle),
        }
    }

    /// Current state of the most recent submission.
    pub fn state(&self) -> SubmissionState {
        *self.state.lock().unwrap()
    }

    /// The cancellation capability of the in-flight submission, if any.
    ///
    /// Present exactly for the duration of a `submit` call.
    pub fn active_cancel_handle(&self) -> Option<Arc<CancelHandle>> {
        self.active.lock().unwrap().clone()
    }

    fn set_state(&self, next: SubmissionState) {
        *self.state.lock().unwrap() = next;
    }

    /// Submit `input` for transcription and wait until it settles.
    ///
    /// Invalid input is rejected before any I/O and leaves the state
    /// machine untouched.  Otherwise the state moves to `Submitting`, the
    /// API call races the local abort, and the submission settles as
    /// `Succeeded`, `Failed` or `Cancelled`.  A response that arrives after
    /// the abort was triggered is discarded, never surfaced.
    pub async fn submit(
        &self,
        input: SubmissionInput,
        session: Option<&Session>,
    ) -> Result<SubmissionOutcome, SubmitError> {
        input.validate()?;

        let handle = {
            let mut active = self.active.lock().unwrap();
            if active.is_some() {
                return Err(SubmitError::AlreadyActive);
            }
            let handle = Arc::new(CancelHandle::new());
            *active = Some(Arc::clone(&handle));
            handle
        };
        self.set_state(SubmissionState::Submitting);

        log::info!(
            "submitting {} file(s){} (language={}, model={})",
            input.files.len(),
            if input.effective_url().is_some() {
                " + url"
            } else {
                ""
            },
            input.language,
            input.model_size
        );

        let outcome = tokio::select! {
            // Cancellation wins a tie with a simultaneously-ready response.
            biased;
            _ = handle.cancelled() => Ok(SubmissionOutcome::Cancelled),
            result = self.api.transcribe(&input, session, &handle) => {
                result
                    .map(|response| SubmissionOutcome::Completed {
                        results: response.results,
                        job_id: response.job_id,
                    })
                    .map_err(SubmitError::from)
            }
        };

        // A response that raced past the select after cancel() is stale.
        let outcome = if handle.is_cancelled() {
            Ok(SubmissionOutcome::Cancelled)
        } else {
            outcome
        };

        *self.active.lock().unwrap() = None;
        match &outcome {
            Ok(SubmissionOutcome::Completed { results, job_id }) => {
                log::info!(
                    "transcription finished: {} result(s), job id {:?}",
                    results.len(),
                    job_id
                );
                self.set_state(SubmissionState::Succeeded);
            }
            Ok(SubmissionOutcome::Cancelled) => {
                log::info!("transcription cancelled");
                self.set_state(SubmissionState::Cancelled);
            }
            Err(e) => {
                log::warn!("transcription failed: {e}");
                self.set_state(SubmissionState::Failed);
            }
        }

        outcome
    }

    /// Cancel the in-flight submission, if any.
    ///
    /// First the local abort is triggered, which settles the pending
    /// `submit` as `Cancelled`.  Then, if a job id was captured, exactly one
    /// stop notification is sent to the server; its outcome is logged and
    /// swallowed.  Calling this with nothing in flight, or a second time,
    /// has no effect.
    pub async fn cancel(&self) {
        let handle = self.active.lock().unwrap().clone();
        let Some(handle) = handle else {
            return;
        };

        if !handle.cancel() {
            return;
        }

        if let Some(job_id) = handle.job_id() {
            log::info!("notifying server to stop job {job_id}");
            if let Err(e) = self.api.cancel_job(&job_id).await {
                log::debug!("stop notification for job {job_id} failed (ignored): {e}");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::api::TranscribeResponse;
    use crate::submission::MediaFile;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    fn result(name: &str) -> TranscriptionResult {
        TranscriptionResult {
            filename: name.into(),
            transcription: format!("transcript of {name}"),
            download_url: None,
        }
    }

    fn two_file_input() -> SubmissionInput {
        SubmissionInput {
            files: vec![
                MediaFile::new("a.mp3", vec![1, 2, 3]),
                MediaFile::new("b.mp3", vec![4, 5, 6]),
            ],
            url: None,
            language: crate::submission::Language::French,
            model_size: crate::submission::ModelSize::Small,
        }
    }

    /// Immediately answers with the scripted results; counts calls.
    struct Responds {
        results: Vec<TranscriptionResult>,
        job_id: Option<String>,
        transcribe_calls: AtomicUsize,
        cancel_calls: AtomicUsize,
    }

    impl Responds {
        fn new(results: Vec<TranscriptionResult>, job_id: Option<&str>) -> Self {
            Self {
                results,
                job_id: job_id.map(str::to_string),
                transcribe_calls: AtomicUsize::new(0),
                cancel_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TranscriptionApi for Responds {
        async fn transcribe(
            &self,
            _input: &SubmissionInput,
            _session: Option<&Session>,
            in_flight: &CancelHandle,
        ) -> Result<TranscribeResponse, ApiError> {
            self.transcribe_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = &self.job_id {
                in_flight.set_job_id(id.clone());
            }
            Ok(TranscribeResponse {
                results: self.results.clone(),
                job_id: self.job_id.clone(),
            })
        }

        async fn cancel_job(&self, _job_id: &str) -> Result<(), ApiError> {
            self.cancel_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Always fails `transcribe` with the scripted error.
    struct AlwaysFails(fn() -> ApiError);

    #[async_trait]
    impl TranscriptionApi for AlwaysFails {
        async fn transcribe(
            &self,
            _input: &SubmissionInput,
            _session: Option<&Session>,
            _in_flight: &CancelHandle,
        ) -> Result<TranscribeResponse, ApiError> {
            Err((self.0)())
        }

        async fn cancel_job(&self, _job_id: &str) -> Result<(), ApiError> {
            Ok(())
        }
    }

    /// Optionally reports a job id, then never answers — the request only
    /// settles through cancellation.  Records stop notifications.
    struct NeverResponds {
        job_id: Option<String>,
        fail_cancel: bool,
        cancel_calls: AtomicUsize,
        cancelled_jobs: Mutex<Vec<String>>,
    }

    impl NeverResponds {
        fn new(job_id: Option<&str>) -> Self {
            Self {
                job_id: job_id.map(str::to_string),
                fail_cancel: false,
                cancel_calls: AtomicUsize::new(0),
                cancelled_jobs: Mutex::new(Vec::new()),
            }
        }

        fn with_failing_cancel(job_id: &str) -> Self {
            Self {
                fail_cancel: true,
                ..Self::new(Some(job_id))
            }
        }
    }

    #[async_trait]
    impl TranscriptionApi for NeverResponds {
        async fn transcribe(
            &self,
            _input: &SubmissionInput,
            _session: Option<&Session>,
            in_flight: &CancelHandle,
        ) -> Result<TranscribeResponse, ApiError> {
            if let Some(id) = &self.job_id {
                in_flight.set_job_id(id.clone());
            }
            std::future::pending::<()>().await;
            unreachable!("pending future never resolves");
        }

        async fn cancel_job(&self, job_id: &str) -> Result<(), ApiError> {
            self.cancel_calls.fetch_add(1, Ordering::SeqCst);
            self.cancelled_jobs.lock().unwrap().push(job_id.to_string());
            if self.fail_cancel {
                Err(ApiError::Network("connection refused".into()))
            } else {
                Ok(())
            }
        }
    }

    /// Produces a response only after cancellation has been triggered,
    /// modelling a server answer that arrives late.
    struct RespondsAfterCancel;

    #[async_trait]
    impl TranscriptionApi for RespondsAfterCancel {
        async fn transcribe(
            &self,
            _input: &SubmissionInput,
            _session: Option<&Session>,
            in_flight: &CancelHandle,
        ) -> Result<TranscribeResponse, ApiError> {
            in_flight.cancelled().await;
            Ok(TranscribeResponse {
                results: vec![result("stale.mp3")],
                job_id: Some("stale".into()),
            })
        }

        async fn cancel_job(&self, _job_id: &str) -> Result<(), ApiError> {
            Ok(())
        }
    }

    /// Spawn `submit` on its own task and wait until the coordinator has
    /// published the cancel handle.
    async fn spawn_submit<T>(
        coord: &Arc<Coordinator<T>>,
        input: SubmissionInput,
    ) -> tokio::task::JoinHandle<Result<SubmissionOutcome, SubmitError>>
    where
        T: TranscriptionApi + 'static,
    {
        let task = {
            let coord = Arc::clone(coord);
            tokio::spawn(async move { coord.submit(input, None).await })
        };
        while coord.active_cancel_handle().is_none() {
            tokio::task::yield_now().await;
        }
        task
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn empty_input_is_rejected_without_io() {
        let api = Arc::new(Responds::new(vec![], None));
        let coord = Coordinator::new(Arc::clone(&api));

        let outcome = coord.submit(SubmissionInput::default(), None).await;

        assert!(matches!(
            outcome,
            Err(SubmitError::Invalid(InputError::Empty))
        ));
        assert_eq!(api.transcribe_calls.load(Ordering::SeqCst), 0);
        assert_eq!(coord.state(), SubmissionState::Idle);
        assert!(coord.active_cancel_handle().is_none());
    }

    // -----------------------------------------------------------------------
    // Success path
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn success_preserves_result_order_and_job_id() {
        let api = Arc::new(Responds::new(
            vec![result("a.mp3"), result("b.mp3")],
            Some("42"),
        ));
        let coord = Coordinator::new(Arc::clone(&api));

        let outcome = coord
            .submit(two_file_input(), None)
            .await
            .expect("submit succeeds");

        match outcome {
            SubmissionOutcome::Completed { results, job_id } => {
                let names: Vec<_> = results.iter().map(|r| r.filename.as_str()).collect();
                assert_eq!(names, vec!["a.mp3", "b.mp3"]);
                assert_eq!(job_id.as_deref(), Some("42"));
            }
            other => panic!("expected Completed, got {other:?}"),
        }
        assert_eq!(coord.state(), SubmissionState::Succeeded);
        assert!(coord.active_cancel_handle().is_none());
        assert_eq!(api.transcribe_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handle_is_exposed_only_while_submitting() {
        let api = Arc::new(NeverResponds::new(None));
        let coord = Arc::new(Coordinator::new(Arc::clone(&api)));

        assert!(coord.active_cancel_handle().is_none());
        let task = spawn_submit(&coord, two_file_input()).await;
        assert!(coord.active_cancel_handle().is_some());
        assert_eq!(coord.state(), SubmissionState::Submitting);

        coord.cancel().await;
        task.await.expect("join").expect("cancelled is Ok");
        assert!(coord.active_cancel_handle().is_none());
    }

    // -----------------------------------------------------------------------
    // Failure paths
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn server_error_becomes_failed() {
        let api = Arc::new(AlwaysFails(|| ApiError::Status(500)));
        let coord = Coordinator::new(api);

        let outcome = coord.submit(two_file_input(), None).await;

        assert!(matches!(
            outcome,
            Err(SubmitError::Transcription { status: 500 })
        ));
        assert_eq!(coord.state(), SubmissionState::Failed);
    }

    #[tokio::test]
    async fn transport_error_becomes_failed() {
        let api = Arc::new(AlwaysFails(|| ApiError::Network("dns failure".into())));
        let coord = Coordinator::new(api);

        let outcome = coord.submit(two_file_input(), None).await;

        assert!(matches!(outcome, Err(SubmitError::Network(_))));
        assert_eq!(coord.state(), SubmissionState::Failed);
    }

    #[tokio::test]
    async fn auth_rejection_is_distinguished() {
        let api = Arc::new(AlwaysFails(|| ApiError::Auth));
        let coord = Coordinator::new(api);

        let outcome = coord.submit(two_file_input(), None).await;

        assert!(matches!(outcome, Err(SubmitError::Auth)));
        assert_eq!(coord.state(), SubmissionState::Failed);
    }

    #[tokio::test]
    async fn malformed_success_payload_becomes_failed() {
        let api = Arc::new(AlwaysFails(|| ApiError::Malformed("missing results".into())));
        let coord = Coordinator::new(api);

        let outcome = coord.submit(two_file_input(), None).await;

        assert!(matches!(outcome, Err(SubmitError::MalformedResponse(_))));
        assert_eq!(coord.state(), SubmissionState::Failed);
    }

    // -----------------------------------------------------------------------
    // Cancellation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn cancel_settles_pending_submit_as_cancelled() {
        let api = Arc::new(NeverResponds::new(Some("42")));
        let coord = Arc::new(Coordinator::new(Arc::clone(&api)));

        let task = spawn_submit(&coord, two_file_input()).await;
        coord.cancel().await;

        let outcome = task.await.expect("join");
        assert!(matches!(outcome, Ok(SubmissionOutcome::Cancelled)));
        assert_eq!(coord.state(), SubmissionState::Cancelled);
    }

    #[tokio::test]
    async fn captured_job_id_triggers_exactly_one_stop_notification() {
        let api = Arc::new(NeverResponds::new(Some("42")));
        let coord = Arc::new(Coordinator::new(Arc::clone(&api)));

        let task = spawn_submit(&coord, two_file_input()).await;
        coord.cancel().await;
        task.await.expect("join").expect("cancelled is Ok");

        assert_eq!(api.cancel_calls.load(Ordering::SeqCst), 1);
        assert_eq!(*api.cancelled_jobs.lock().unwrap(), vec!["42".to_string()]);
    }

    #[tokio::test]
    async fn no_job_id_means_no_stop_notification() {
        let api = Arc::new(NeverResponds::new(None));
        let coord = Arc::new(Coordinator::new(Arc::clone(&api)));

        let task = spawn_submit(&coord, two_file_input()).await;
        coord.cancel().await;
        task.await.expect("join").expect("cancelled is Ok");

        assert_eq!(api.cancel_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn double_cancel_sends_no_duplicate_notification() {
        let api = Arc::new(NeverResponds::new(Some("42")));
        let coord = Arc::new(Coordinator::new(Arc::clone(&api)));

        let task = spawn_submit(&coord, two_file_input()).await;
        coord.cancel().await;
        coord.cancel().await;
        task.await.expect("join").expect("cancelled is Ok");
        coord.cancel().await; // after settle: no-op

        assert_eq!(api.cancel_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_stop_notification_is_swallowed() {
        let api = Arc::new(NeverResponds::with_failing_cancel("42"));
        let coord = Arc::new(Coordinator::new(Arc::clone(&api)));

        let task = spawn_submit(&coord, two_file_input()).await;
        coord.cancel().await; // must not panic or propagate the error

        let outcome = task.await.expect("join");
        assert!(matches!(outcome, Ok(SubmissionOutcome::Cancelled)));
        assert_eq!(coord.state(), SubmissionState::Cancelled);
        assert_eq!(api.cancel_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancel_with_nothing_in_flight_is_a_no_op() {
        let api = Arc::new(Responds::new(vec![result("a.mp3")], None));
        let coord = Coordinator::new(Arc::clone(&api));

        coord.cancel().await;

        assert_eq!(api.cancel_calls.load(Ordering::SeqCst), 0);
        assert_eq!(coord.state(), SubmissionState::Idle);
    }

    #[tokio::test]
    async fn late_response_after_cancel_is_discarded() {
        let api = Arc::new(RespondsAfterCancel);
        let coord = Arc::new(Coordinator::new(api));

        let task = spawn_submit(&coord, two_file_input()).await;
        coord.cancel().await;

        // The double produces a full success response once cancellation is
        // triggered; it must still settle as Cancelled, never Succeeded.
        let outcome = task.await.expect("join");
        assert!(matches!(outcome, Ok(SubmissionOutcome::Cancelled)));
        assert_eq!(coord.state(), SubmissionState::Cancelled);
    }

    // -----------------------------------------------------------------------
    // Single-flight
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn second_submit_while_active_is_rejected() {
        let api = Arc::new(NeverResponds::new(None));
        let coord = Arc::new(Coordinator::new(Arc::clone(&api)));

        let task = spawn_submit(&coord, two_file_input()).await;

        let second = coord.submit(two_file_input(), None).await;
        assert!(matches!(second, Err(SubmitError::AlreadyActive)));
        // The in-flight submission is unaffected by the rejection.
        assert_eq!(coord.state(), SubmissionState::Submitting);

        coord.cancel().await;
        task.await.expect("join").expect("cancelled is Ok");
    }

    #[tokio::test]
    async fn new_submit_after_settle_starts_over() {
        let api = Arc::new(Responds::new(vec![result("a.mp3")], None));
        let coord = Coordinator::new(Arc::clone(&api));

        coord
            .submit(two_file_input(), None)
            .await
            .expect("first submit");
        assert_eq!(coord.state(), SubmissionState::Succeeded);

        coord
            .submit(two_file_input(), None)
            .await
            .expect("second submit");
        assert_eq!(coord.state(), SubmissionState::Succeeded);
        assert_eq!(api.transcribe_calls.load(Ordering::SeqCst), 2);
    }
}
