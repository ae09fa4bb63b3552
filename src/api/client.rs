//! Core `TranscriptionApi` trait and `HttpApi` implementation.
//!
//! `HttpApi` talks to the transcription backend over HTTP.  All connection
//! details come from [`ServerConfig`]; nothing is hardcoded.  The trait is
//! the seam the submission coordinator is written against, so tests can
//! substitute scripted backends.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::api::types::{
    ExportedFile, ExportedFilesResponse, LoginResponse, TranscribeResponse,
};
use crate::config::ServerConfig;
use crate::session::Session;
use crate::submission::{CancelHandle, SubmissionInput};

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Errors that can occur talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport or connection error (DNS, refused, offline).
    #[error("request failed: {0}")]
    Network(String),

    /// The server responded with a non-success status.
    #[error("server returned status {0}")]
    Status(u16),

    /// The server rejected the credentials or the bearer token.
    #[error("not authorized")]
    Auth,

    /// A success response whose body could not be parsed.
    #[error("failed to parse server response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Malformed(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// TranscriptionApi trait
// ---------------------------------------------------------------------------

/// Async trait for the two backend calls the submission coordinator makes.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (e.g. wrapped in `Arc<dyn TranscriptionApi>`).
#[async_trait]
pub trait TranscriptionApi: Send + Sync {
    /// Submit `input` for transcription and wait for the result set.
    ///
    /// Implementations record the server-issued job id on `in_flight` as
    /// soon as they observe one, so a concurrent cancellation can target
    /// the job server-side.
    async fn transcribe(
        &self,
        input: &SubmissionInput,
        session: Option<&Session>,
        in_flight: &CancelHandle,
    ) -> Result<TranscribeResponse, ApiError>;

    /// Best-effort notification that the job should stop.
    ///
    /// The response is advisory; callers ignore it either way.
    async fn cancel_job(&self, job_id: &str) -> Result<(), ApiError>;
}

// ---------------------------------------------------------------------------
// HttpApi
// ---------------------------------------------------------------------------

/// Talks to the transcription backend over HTTP via `reqwest`.
///
/// # No request deadline
/// The client carries only a connect timeout.  A transcription can run for
/// minutes, so the request stays open until the server answers or the user
/// cancels; the coordinator's abort is what settles a stuck request.
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    /// Build an `HttpApi` from the server section of the application config.
    ///
    /// A default client is used as a last-resort fallback if the builder
    /// fails (should never happen in practice).
    pub fn from_config(config: &ServerConfig) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Join a server-relative download link (e.g. `/export/a.txt`) to the
    /// configured base URL.  Already-absolute links pass through unchanged.
    pub fn absolute_url(&self, link: &str) -> String {
        if link.starts_with("http://") || link.starts_with("https://") {
            link.to_string()
        } else {
            format!("{}/{}", self.base_url, link.trim_start_matches('/'))
        }
    }

    /// `POST /login` with form-encoded credentials.
    ///
    /// Any non-success status is treated as invalid credentials.  On
    /// success the returned [`Session`] keeps the typed username when the
    /// server does not echo one.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ApiError> {
        let params = [("username", username), ("password", password)];
        let response = self
            .client
            .post(self.endpoint("/login"))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Auth);
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Malformed(e.to_string()))?;

        Ok(Session {
            username: body.username.unwrap_or_else(|| username.to_string()),
            token: body.access_token,
        })
    }

    /// `GET /exported-files` with the session's bearer token.
    ///
    /// Any non-success status is treated as not authorized, which the
    /// caller turns into a re-authentication flow.
    pub async fn exported_files(&self, session: &Session) -> Result<Vec<ExportedFile>, ApiError> {
        let response = self
            .client
            .get(self.endpoint("/exported-files"))
            .bearer_auth(&session.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Auth);
        }

        let body: ExportedFilesResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Malformed(e.to_string()))?;

        Ok(body.files)
    }
}

#[async_trait]
impl TranscriptionApi for HttpApi {
    /// `POST /transcribe` as multipart form data.
    ///
    /// Parts are appended in submission order: one `files` part per media
    /// file (original name preserved), then the optional `url`, then the
    /// fixed `task`, `language` and `model_size` fields.  The bearer header
    /// is attached **only** when a session is present.
    async fn transcribe(
        &self,
        input: &SubmissionInput,
        session: Option<&Session>,
        in_flight: &CancelHandle,
    ) -> Result<TranscribeResponse, ApiError> {
        let mut form = reqwest::multipart::Form::new();
        for file in &input.files {
            let part = reqwest::multipart::Part::bytes(file.data.clone())
                .file_name(file.name.clone());
            form = form.part("files", part);
        }
        if let Some(url) = input.effective_url() {
            form = form.text("url", url.to_string());
        }
        form = form
            .text("task", "transcribe")
            .text("language", input.language.as_str())
            .text("model_size", input.model_size.as_str());

        let mut req = self.client.post(self.endpoint("/transcribe")).multipart(form);
        if let Some(session) = session {
            req = req.bearer_auth(&session.token);
        }

        let response = req.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Auth);
        }
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        let body: TranscribeResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Malformed(e.to_string()))?;

        if let Some(job_id) = &body.job_id {
            in_flight.set_job_id(job_id.clone());
        }

        Ok(body)
    }

    /// `POST /cancel/{job_id}`.
    ///
    /// The response status is logged and otherwise ignored: the server may
    /// have already finished or never heard of the job, and either way the
    /// notification counts as sent.
    async fn cancel_job(&self, job_id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.endpoint(&format!("/cancel/{job_id}")))
            .send()
            .await?;
        log::debug!(
            "cancel notification for job {job_id} answered with status {}",
            response.status()
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(base_url: &str) -> ServerConfig {
        ServerConfig {
            base_url: base_url.into(),
            connect_timeout_secs: 5,
        }
    }

    #[test]
    fn from_config_builds_without_panic() {
        let _api = HttpApi::from_config(&make_config("http://localhost:8000"));
    }

    #[test]
    fn endpoint_joins_paths() {
        let api = HttpApi::from_config(&make_config("http://localhost:8000"));
        assert_eq!(api.endpoint("/transcribe"), "http://localhost:8000/transcribe");
        assert_eq!(api.endpoint("/cancel/42"), "http://localhost:8000/cancel/42");
    }

    #[test]
    fn endpoint_tolerates_trailing_slash_in_config() {
        let api = HttpApi::from_config(&make_config("http://localhost:8000/"));
        assert_eq!(api.endpoint("/login"), "http://localhost:8000/login");
    }

    #[test]
    fn absolute_url_joins_relative_links() {
        let api = HttpApi::from_config(&make_config("http://localhost:8000"));
        assert_eq!(
            api.absolute_url("/export/a.txt"),
            "http://localhost:8000/export/a.txt"
        );
        assert_eq!(
            api.absolute_url("export/a.txt"),
            "http://localhost:8000/export/a.txt"
        );
    }

    #[test]
    fn absolute_url_passes_through_absolute_links() {
        let api = HttpApi::from_config(&make_config("http://localhost:8000"));
        assert_eq!(
            api.absolute_url("https://cdn.example.com/a.txt"),
            "https://cdn.example.com/a.txt"
        );
    }

    /// Verify that `HttpApi` is object-safe (usable as `dyn TranscriptionApi`).
    #[test]
    fn api_is_object_safe() {
        let api: Box<dyn TranscriptionApi> =
            Box::new(HttpApi::from_config(&make_config("http://localhost:8000")));
        drop(api);
    }
}
