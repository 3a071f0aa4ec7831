//! Shared error types for the services crate.

use thiserror::Error;

use quest_core::model::TrackError;

/// Errors a hint backend may report.
///
/// These never escape `HintService::hint`; they only select the fallback
/// path. They stay distinguishable so the backend remains swappable and
/// testable on its own.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HintBackendError {
    #[error("hint backend is not configured")]
    Disabled,
    #[error("hint backend returned an empty response")]
    EmptyResponse,
    #[error("hint request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while loading a track definition at startup.
///
/// All of these are fatal configuration errors and should prevent startup.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrackLoadError {
    #[error("track definition is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Track(#[from] TrackError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
