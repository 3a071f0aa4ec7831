use std::fs;
use std::path::Path;

use quest_core::model::{Track, TrackDraft};

use crate::error::TrackLoadError;

/// Parses and validates a JSON track definition.
///
/// # Errors
///
/// Returns `TrackLoadError::Parse` for malformed JSON and
/// `TrackLoadError::Track` for definitions that fail validation (missing
/// fallback hints, duplicate ids, a locked non-final module, ...). Both are
/// fatal at startup.
pub fn load_track_from_str(json: &str) -> Result<Track, TrackLoadError> {
    let draft: TrackDraft = serde_json::from_str(json)?;
    Ok(draft.validate()?)
}

/// Reads a track definition from disk.
///
/// # Errors
///
/// Returns `TrackLoadError::Io` when the file cannot be read, plus
/// everything `load_track_from_str` reports.
pub fn load_track_from_path(path: impl AsRef<Path>) -> Result<Track, TrackLoadError> {
    let json = fs::read_to_string(path)?;
    load_track_from_str(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_core::model::{ModuleId, StepId, TrackError};

    #[test]
    fn loads_a_minimal_track() {
        let json = r#"{
            "modules": [
                {
                    "id": 1,
                    "title": "Intro",
                    "steps": [
                        {
                            "id": 1,
                            "kind": "quiz",
                            "prompt": "Pick B.",
                            "checker": { "type": "one_of", "accepted": ["b"] },
                            "badge": "starter",
                            "offers_hints": true,
                            "fallback_hints": ["It is the second letter."]
                        }
                    ]
                }
            ]
        }"#;

        let track = load_track_from_str(json).unwrap();
        assert_eq!(track.module_count(), 1);
        assert_eq!(track.open_step_count(), 1);
        // default_hint was omitted, so the built-in default applies.
        assert_eq!(track.default_hint(), "Keep it short and specific.");
        let (module, step) = track.find_step(StepId::new(1)).unwrap();
        assert_eq!(module.id(), ModuleId::new(1));
        assert!(step.offers_hints());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = load_track_from_str("{not json").unwrap_err();
        assert!(matches!(err, TrackLoadError::Parse(_)));
    }

    #[test]
    fn invalid_definition_is_a_track_error() {
        let json = r#"{
            "modules": [
                {
                    "id": 1,
                    "title": "Broken",
                    "steps": [
                        {
                            "id": 1,
                            "kind": "quiz",
                            "prompt": "No fallback here.",
                            "offers_hints": true
                        }
                    ]
                }
            ]
        }"#;

        let err = load_track_from_str(json).unwrap_err();
        assert!(matches!(
            err,
            TrackLoadError::Track(TrackError::MissingFallbackHint(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_track_from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, TrackLoadError::Io(_)));
    }
}
