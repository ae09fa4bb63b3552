//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout (config dir holds `settings.toml` and `session.toml`):
//!   Windows: %APPDATA%\transcribe-client\
//!   macOS:   ~/Library/Application Support/transcribe-client/
//!   Linux:   ~/.config/transcribe-client/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml` and `session.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Full path to `session.toml` (persisted login identity).
    pub session_file: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "transcribe-client";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path (should be extremely rare in practice).
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let session_file = config_dir.join("session.toml");

        Self {
            config_dir,
            settings_file,
            session_file,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
