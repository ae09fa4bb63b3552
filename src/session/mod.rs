//! Session Context — the current authenticated identity.
//!
//! [`Session`] is the in-memory identity (username + bearer token).
//! [`SessionStore`] owns an `Option<Session>` and mirrors every change
//! synchronously to a small TOML file (two scalar keys, `username` and
//! `token`) so the identity survives a restart.
//!
//! The store is the only writer of the session; the submission coordinator
//! and API client receive the session by shared reference and never mutate
//! it.  An unreadable or malformed file is treated as "not logged in", never
//! as an error — re-authenticating recreates it.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::AppPaths;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// An authenticated identity: who is logged in and the token proving it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Login name, echoed back by the server on `/login`.
    pub username: String,
    /// Opaque bearer token attached to authenticated requests.
    pub token: String,
}

impl Session {
    /// The `Authorization` header value for this session.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Owns the current session and its on-disk mirror.
///
/// `set` and `clear` are idempotent and persist synchronously; `load` never
/// fails (storage unavailability means "absent").
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    current: Option<Session>,
}

impl SessionStore {
    /// Load the persisted session from the platform-appropriate
    /// `session.toml`.
    pub fn load() -> Self {
        Self::load_from(&AppPaths::new().session_file)
    }

    /// Load from an explicit path (useful for tests).
    ///
    /// A missing, unreadable or malformed file yields an absent session.
    pub fn load_from(path: &Path) -> Self {
        let current = match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<Session>(&content) {
                Ok(session) => Some(session),
                Err(e) => {
                    log::warn!("ignoring malformed session file: {e}");
                    None
                }
            },
            Err(_) => None,
        };
        Self {
            path: path.to_path_buf(),
            current,
        }
    }

    /// The current session, if logged in.
    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// The `Authorization` header value for the current session, if any.
    pub fn authorization_header(&self) -> Option<String> {
        self.current.as_ref().map(Session::authorization_header)
    }

    /// Store `session` in memory and persist it, creating parent directories
    /// as needed.
    pub fn set(&mut self, session: Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(&session)?;
        std::fs::write(&self.path, content)?;
        self.current = Some(session);
        Ok(())
    }

    /// Forget the current session and remove its on-disk mirror.
    ///
    /// Safe to call when already absent.
    pub fn clear(&mut self) -> Result<()> {
        self.current = None;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
