mod hint;
mod ids;
mod session;
mod track;

pub use hint::{HintRequest, HintResult, HintSource};
pub use ids::{BadgeId, ModuleId, ParseIdError, SessionId, StepId};

pub use session::{AdvanceResult, LearnerSession, SessionError, SessionProgress, StepPosition};
pub use track::{
    AnswerChecker, ModuleDefinition, ModuleDraft, StepDefinition, StepDraft, StepKind, Track,
    TrackDraft, TrackError,
};
