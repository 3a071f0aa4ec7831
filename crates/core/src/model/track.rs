use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{BadgeId, ModuleId, StepId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TrackError {
    #[error("track has no modules")]
    Empty,

    #[error("module {0} has no steps")]
    EmptyModule(ModuleId),

    #[error("duplicate module id {0}")]
    DuplicateModuleId(ModuleId),

    #[error("duplicate step id {0}")]
    DuplicateStepId(StepId),

    #[error("step {0} has an empty prompt")]
    EmptyPrompt(StepId),

    #[error("module {0} is locked but is not the final module")]
    LockedBeforeEnd(ModuleId),

    #[error("the first module cannot be locked")]
    FirstModuleLocked,

    #[error("step {0} offers hints but has no fallback hint text")]
    MissingFallbackHint(StepId),

    #[error("step {0} has a checker with nothing to accept")]
    EmptyChecker(StepId),
}

//
// ─── STEPS ─────────────────────────────────────────────────────────────────────
//

/// What kind of interaction a step asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Content,
    Quiz,
    Exercise,
}

/// Declarative correctness check for a step's answer.
///
/// All variants compare case-insensitively against the trimmed answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerChecker {
    /// The answer must equal `expected`.
    Exact { expected: String },
    /// The answer must equal one of `accepted` (e.g. a multiple-choice letter).
    OneOf { accepted: Vec<String> },
    /// The answer must contain at least one of `keywords` as a substring.
    KeywordAny { keywords: Vec<String> },
}

impl AnswerChecker {
    /// Evaluates the checker against a raw learner answer.
    #[must_use]
    pub fn accepts(&self, answer: &str) -> bool {
        let normalized = answer.trim().to_lowercase();
        match self {
            AnswerChecker::Exact { expected } => normalized == expected.trim().to_lowercase(),
            AnswerChecker::OneOf { accepted } => accepted
                .iter()
                .any(|candidate| normalized == candidate.trim().to_lowercase()),
            AnswerChecker::KeywordAny { keywords } => keywords
                .iter()
                .any(|keyword| normalized.contains(&keyword.trim().to_lowercase())),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            AnswerChecker::Exact { expected } => expected.trim().is_empty(),
            AnswerChecker::OneOf { accepted } => accepted.is_empty(),
            AnswerChecker::KeywordAny { keywords } => keywords.is_empty(),
        }
    }
}

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

/// Unvalidated step definition as it appears in a track file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDraft {
    pub id: StepId,
    pub kind: StepKind,
    pub prompt: String,
    #[serde(default)]
    pub checker: Option<AnswerChecker>,
    #[serde(default)]
    pub badge: Option<BadgeId>,
    #[serde(default)]
    pub offers_hints: bool,
    #[serde(default)]
    pub fallback_hints: Vec<String>,
}

/// Unvalidated module definition as it appears in a track file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDraft {
    pub id: ModuleId,
    pub title: String,
    #[serde(default)]
    pub locked: bool,
    pub steps: Vec<StepDraft>,
}

/// Unvalidated track. Deserialize this, then call [`TrackDraft::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackDraft {
    pub modules: Vec<ModuleDraft>,
    #[serde(default = "TrackDraft::default_hint")]
    pub default_hint: String,
}

impl TrackDraft {
    fn default_hint() -> String {
        "Keep it short and specific.".to_string()
    }

    /// Validates the draft into an immutable [`Track`].
    ///
    /// This is the load-time configuration gate: every failure here is fatal
    /// and must prevent startup, per the hint-fallback contract.
    ///
    /// # Errors
    ///
    /// Returns `TrackError` for an empty track, empty modules, duplicate
    /// module/step ids, a locked module that is not the final one, a locked
    /// first module, a hint-enabled step without fallback text, or a checker
    /// that can never accept anything.
    pub fn validate(self) -> Result<Track, TrackError> {
        if self.modules.is_empty() {
            return Err(TrackError::Empty);
        }
        if self.modules[0].locked {
            return Err(TrackError::FirstModuleLocked);
        }

        let last = self.modules.len() - 1;
        let mut module_ids = HashSet::new();
        let mut step_ids = HashSet::new();
        let mut open_steps = 0_usize;
        let mut modules = Vec::with_capacity(self.modules.len());

        for (index, module) in self.modules.into_iter().enumerate() {
            if !module_ids.insert(module.id) {
                return Err(TrackError::DuplicateModuleId(module.id));
            }
            if module.steps.is_empty() {
                return Err(TrackError::EmptyModule(module.id));
            }
            if module.locked && index != last {
                return Err(TrackError::LockedBeforeEnd(module.id));
            }

            let mut steps = Vec::with_capacity(module.steps.len());
            for step in module.steps {
                if !step_ids.insert(step.id) {
                    return Err(TrackError::DuplicateStepId(step.id));
                }
                if step.prompt.trim().is_empty() {
                    return Err(TrackError::EmptyPrompt(step.id));
                }
                if step.offers_hints
                    && !step.fallback_hints.iter().any(|hint| !hint.trim().is_empty())
                {
                    return Err(TrackError::MissingFallbackHint(step.id));
                }
                if let Some(checker) = &step.checker {
                    if checker.is_empty() {
                        return Err(TrackError::EmptyChecker(step.id));
                    }
                }

                steps.push(StepDefinition {
                    id: step.id,
                    kind: step.kind,
                    prompt: step.prompt,
                    checker: step.checker,
                    badge: step.badge,
                    offers_hints: step.offers_hints,
                    fallback_hints: step.fallback_hints,
                });
            }

            if !module.locked {
                open_steps += steps.len();
            }

            modules.push(ModuleDefinition {
                id: module.id,
                title: module.title,
                locked: module.locked,
                steps,
            });
        }

        Ok(Track {
            modules,
            default_hint: self.default_hint,
            open_steps,
        })
    }
}

//
// ─── VALIDATED DEFINITIONS ─────────────────────────────────────────────────────
//

/// A single validated step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDefinition {
    id: StepId,
    kind: StepKind,
    prompt: String,
    checker: Option<AnswerChecker>,
    badge: Option<BadgeId>,
    offers_hints: bool,
    fallback_hints: Vec<String>,
}

impl StepDefinition {
    #[must_use]
    pub fn id(&self) -> StepId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> StepKind {
        self.kind
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn checker(&self) -> Option<&AnswerChecker> {
        self.checker.as_ref()
    }

    #[must_use]
    pub fn badge(&self) -> Option<&BadgeId> {
        self.badge.as_ref()
    }

    #[must_use]
    pub fn offers_hints(&self) -> bool {
        self.offers_hints
    }

    /// Pre-authored hint texts used when the remote call is unavailable.
    ///
    /// Guaranteed non-empty when `offers_hints` is true.
    #[must_use]
    pub fn fallback_hints(&self) -> &[String] {
        &self.fallback_hints
    }
}

/// A validated, ordered group of steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDefinition {
    id: ModuleId,
    title: String,
    locked: bool,
    steps: Vec<StepDefinition>,
}

impl ModuleDefinition {
    #[must_use]
    pub fn id(&self) -> ModuleId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// True for the final module that normal progression never unlocks.
    #[must_use]
    pub fn locked(&self) -> bool {
        self.locked
    }

    #[must_use]
    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }
}

/// The immutable course definition: ordered modules of ordered steps.
///
/// Built once at startup via [`TrackDraft::validate`]; never mutated after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    modules: Vec<ModuleDefinition>,
    default_hint: String,
    open_steps: usize,
}

impl Track {
    #[must_use]
    pub fn modules(&self) -> &[ModuleDefinition] {
        &self.modules
    }

    #[must_use]
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn module_at(&self, index: usize) -> Option<&ModuleDefinition> {
        self.modules.get(index)
    }

    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&ModuleDefinition> {
        self.modules.iter().find(|module| module.id == id)
    }

    /// Finds a step anywhere in the track, together with its module.
    #[must_use]
    pub fn find_step(&self, id: StepId) -> Option<(&ModuleDefinition, &StepDefinition)> {
        self.modules.iter().find_map(|module| {
            module
                .steps
                .iter()
                .find(|step| step.id == id)
                .map(|step| (module, step))
        })
    }

    /// Hint returned for steps that do not carry their own fallback text.
    #[must_use]
    pub fn default_hint(&self) -> &str {
        &self.default_hint
    }

    /// Total steps across all non-locked modules.
    ///
    /// This is the fixed denominator for progress math, so the fraction
    /// never decreases when a later module unlocks.
    #[must_use]
    pub fn open_step_count(&self) -> usize {
        self.open_steps
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
