//! Submission inputs: selected media, target language and model size.
//!
//! A [`SubmissionInput`] is built fresh for every submission and validated
//! locally before any network I/O: at least one file or a non-blank URL must
//! be present, and at most [`MAX_FILES`] files are accepted (the backend
//! enforces the same cap).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of files accepted in a single submission.
pub const MAX_FILES: usize = 10;

// ---------------------------------------------------------------------------
// InputError
// ---------------------------------------------------------------------------

/// Local validation failures, detected before any I/O.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    /// Neither files nor a URL were supplied.
    #[error("nothing to transcribe: supply at least one file or a URL")]
    Empty,

    /// More files than the backend accepts in one request.
    #[error("too many files: {count} selected, maximum is {MAX_FILES}")]
    TooManyFiles { count: usize },
}

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// Target transcription language, as accepted by the `language` form field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    French,
    German,
    Spanish,
    Italian,
    Turkish,
}

impl Language {
    /// The wire value sent to the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::French => "french",
            Language::German => "german",
            Language::Spanish => "spanish",
            Language::Italian => "italian",
            Language::Turkish => "turkish",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "english" => Ok(Language::English),
            "french" => Ok(Language::French),
            "german" => Ok(Language::German),
            "spanish" => Ok(Language::Spanish),
            "italian" => Ok(Language::Italian),
            "turkish" => Ok(Language::Turkish),
            other => Err(format!("unknown language: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// ModelSize
// ---------------------------------------------------------------------------

/// Whisper model size — a speed/quality trade-off chosen per submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    /// Fastest, lowest quality.
    #[default]
    Base,
    /// Balanced.
    Small,
    /// Best quality, slowest.
    Large,
}

impl ModelSize {
    /// The wire value sent to the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSize::Base => "base",
            ModelSize::Small => "small",
            ModelSize::Large => "large",
        }
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base" => Ok(ModelSize::Base),
            "small" => Ok(ModelSize::Small),
            "large" => Ok(ModelSize::Large),
            other => Err(format!("unknown model size: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// MediaFile / SubmissionInput
// ---------------------------------------------------------------------------

/// One selected media blob, identified by its original file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    /// Original file name, echoed back in the matching result.
    pub name: String,
    /// Raw file contents.
    pub data: Vec<u8>,
}

impl MediaFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Everything the user selected for one submission.
///
/// Selection order of `files` is preserved end to end: multipart parts are
/// appended in this order and results come back in the same order.
#[derive(Debug, Clone, Default)]
pub struct SubmissionInput {
    /// Up to [`MAX_FILES`] media files, in selection order.
    pub files: Vec<MediaFile>,
    /// Optional remote media URL.
    pub url: Option<String>,
    /// Target transcription language.
    pub language: Language,
    /// Whisper model size.
    pub model_size: ModelSize,
}

impl SubmissionInput {
    /// The URL trimmed of whitespace, if non-blank.
    pub fn effective_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    /// Check the local invariants; performs no I/O.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.files.is_empty() && self.effective_url().is_none() {
            return Err(InputError::Empty);
        }
        if self.files.len() > MAX_FILES {
            return Err(InputError::TooManyFiles {
                count: self.files.len(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
