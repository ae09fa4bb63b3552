//! Wire types for the transcription backend's JSON responses.
//!
//! Field names match the backend exactly; optional fields are optional on
//! the wire too.  `TranscribeResponse::results` is deliberately mandatory:
//! a 2xx body without it does not deserialise and the submission is treated
//! as failed rather than silently empty.

use serde::Deserialize;

// ---------------------------------------------------------------------------
// /login
// ---------------------------------------------------------------------------

/// Successful `POST /login` body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent authenticated requests.
    pub access_token: String,
    /// Username echo; absent on older backends, in which case the client
    /// keeps the name the user typed.
    #[serde(default)]
    pub username: Option<String>,
}

// ---------------------------------------------------------------------------
// /transcribe
// ---------------------------------------------------------------------------

/// One per-input transcription, in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TranscriptionResult {
    /// Original file name (or the name derived from a URL download).
    pub filename: String,
    /// The transcript text.
    pub transcription: String,
    /// Server-relative link to the exported `.txt`, when the server wrote
    /// one.
    #[serde(default)]
    pub download_url: Option<String>,
}

/// Successful `POST /transcribe` body.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscribeResponse {
    /// One entry per submitted input, order preserved.
    pub results: Vec<TranscriptionResult>,
    /// Server-issued job identifier, used to target `/cancel/{job_id}`.
    #[serde(default)]
    pub job_id: Option<String>,
}

// ---------------------------------------------------------------------------
// /exported-files
// ---------------------------------------------------------------------------

/// One previously exported transcript file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExportedFile {
    pub filename: String,
    pub download_url: String,
}

/// Successful `GET /exported-files` body.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportedFilesResponse {
    pub files: Vec<ExportedFile>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
