use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::StepId;

/// Where a hint's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintSource {
    /// The remote generative model answered in time.
    Remote,
    /// Pre-authored text from the track definition.
    Fallback,
}

impl fmt::Display for HintSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HintSource::Remote => write!(f, "remote"),
            HintSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// A hint request as the presentation surface issues it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintRequest {
    pub step: StepId,
    /// The learner's current draft answer, if they typed anything yet.
    pub draft: Option<String>,
}

/// A usable hint. `hint()` always produces one of these, never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintResult {
    pub text: String,
    pub source: HintSource,
}
