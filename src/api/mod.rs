//! Backend API module: wire types and the HTTP client.
//!
//! [`TranscriptionApi`] is the async seam the submission coordinator is
//! written against; [`HttpApi`] is its `reqwest`-backed production
//! implementation, which additionally exposes the `login` and
//! `exported-files` calls that sit outside the submission lifecycle.

pub mod client;
pub mod types;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use client::{ApiError, HttpApi, TranscriptionApi};
pub use types::{
    ExportedFile, ExportedFilesResponse, LoginResponse, TranscribeResponse, TranscriptionResult,
};
