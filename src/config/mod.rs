//! Configuration module: settings structs, TOML persistence and app paths.

pub mod paths;
pub mod settings;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use paths::AppPaths;
pub use settings::{AppConfig, ServerConfig, SubmitDefaults};
