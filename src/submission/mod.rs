//! Submission module — the transcription request lifecycle.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                 Coordinator<A: TranscriptionApi>           │
//! │                                                            │
//! │  SubmissionInput ──▶ submit() ──▶ select! ──▶ Outcome      │
//! │                         │            ▲                     │
//! │                         ▼            │                     │
//! │                   CancelHandle ◀── cancel()                │
//! │                    │        │                              │
//! │                    │        └─ job id ─▶ POST /cancel/{id} │
//! │                    └─ abort ─▶ settles submit() promptly   │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! This module provides:
//! * [`SubmissionInput`] / [`MediaFile`] — what the user selected.
//! * [`Language`] / [`ModelSize`] — per-submission parameters.
//! * [`SubmissionState`] — `Idle → Submitting → {Succeeded, Failed, Cancelled}`.
//! * [`CancelHandle`] — the cancellation capability + job-id slot.
//! * [`Coordinator`] — single-flight submit/cancel orchestration.
//! * [`SubmitError`] / [`SubmissionOutcome`] — how a submission settles.

pub mod cancel;
pub mod coordinator;
pub mod input;
pub mod state;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use cancel::CancelHandle;
pub use coordinator::{Coordinator, SubmissionOutcome, SubmitError};
pub use input::{InputError, Language, MediaFile, ModelSize, SubmissionInput, MAX_FILES};
pub use state::SubmissionState;
