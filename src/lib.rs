//! Client for a Whisper transcription backend.
//!
//! Submits local media files or a remote URL for transcription, tracks the
//! in-flight request, cancels it on demand (local abort plus a best-effort
//! server stop notification), and lists previously exported transcripts.
//!
//! # Module map
//!
//! * [`config`] — `settings.toml` persistence and app paths.
//! * [`session`] — the authenticated identity and its on-disk mirror.
//! * [`api`] — wire types and the `reqwest` HTTP client behind the
//!   [`api::TranscriptionApi`] seam.
//! * [`submission`] — the request lifecycle: input validation, the
//!   `Idle → Submitting → {Succeeded, Failed, Cancelled}` state machine,
//!   the cancellation capability, and the coordinator that ties them
//!   together.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use transcribe_client::api::HttpApi;
//! use transcribe_client::config::AppConfig;
//! use transcribe_client::submission::{Coordinator, MediaFile, SubmissionInput};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let api = Arc::new(HttpApi::from_config(&config.server));
//!     let coordinator = Coordinator::new(api);
//!
//!     let input = SubmissionInput {
//!         files: vec![MediaFile::new("a.mp3", std::fs::read("a.mp3").unwrap())],
//!         ..Default::default()
//!     };
//!
//!     // coordinator.cancel().await from another task aborts this.
//!     let outcome = coordinator.submit(input, None).await;
//!     println!("{outcome:?}");
//! }
//! ```

pub mod api;
pub mod config;
pub mod session;
pub mod submission;
