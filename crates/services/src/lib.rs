#![forbid(unsafe_code)]

pub mod error;
pub mod hint;
pub mod quest_service;
pub mod starter;
pub mod track_loader;

pub use quest_core::Clock;

pub use error::{HintBackendError, TrackLoadError};
pub use hint::{ChatBackend, ChatConfig, DEFAULT_HINT_TIMEOUT, HintBackend, HintService};
pub use quest_service::{QuestService, ReportCard};
pub use starter::starter_track;
pub use track_loader::{load_track_from_path, load_track_from_str};
