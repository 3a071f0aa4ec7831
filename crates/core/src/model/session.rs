use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::model::ids::{BadgeId, ModuleId, SessionId, StepId};
use crate::model::track::{StepDefinition, Track};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors reported back to the presentation surface.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    /// A stale or duplicate UI event named a step that is neither the
    /// current step nor an already-acknowledged one.
    #[error("step {got} is out of sequence (current step is {expected})")]
    OutOfSequence { expected: StepId, got: StepId },

    /// The step belongs to a module the learner has not unlocked, or to the
    /// permanently-locked final module.
    #[error("module {0} is locked")]
    ModuleLocked(ModuleId),

    #[error("session already completed")]
    Completed,
}

//
// ─── RESULT TYPES ──────────────────────────────────────────────────────────────
//

/// Position of a step within the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPosition {
    pub module: ModuleId,
    pub step: StepId,
}

/// Outcome of acknowledging a step via submit or skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceResult {
    /// The step that was acknowledged.
    pub step: StepId,
    /// Checker verdict; `None` for skips and checker-less steps.
    pub correct: Option<bool>,
    /// Badge newly earned by this acknowledgment, if any.
    pub badge_awarded: Option<BadgeId>,
    /// Where the learner stands now; `None` once the track is finished.
    pub next: Option<StepPosition>,
    pub is_complete: bool,
}

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionProgress {
    pub total: usize,
    pub acknowledged: usize,
    pub remaining: usize,
    pub fraction: f64,
    pub is_complete: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Mutable state for one learner's run through a track.
///
/// Owns the learner's position, answers, badges and unlock set. Pure logic,
/// no I/O; every instance is independent, so one process can serve many
/// concurrent learners by giving each its own session.
pub struct LearnerSession {
    id: SessionId,
    track: Arc<Track>,
    current_module: usize,
    current_step: usize,
    answers: HashMap<StepId, String>,
    acknowledged: BTreeSet<StepId>,
    badges: BTreeSet<BadgeId>,
    unlocked: BTreeSet<ModuleId>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl LearnerSession {
    /// Start a fresh session positioned at the first step of the first module.
    ///
    /// `started_at` should come from the services layer clock to keep time
    /// deterministic.
    #[must_use]
    pub fn new(track: Arc<Track>, started_at: DateTime<Utc>) -> Self {
        // Validation guarantees at least one non-locked module.
        let first = track.modules()[0].id();
        let mut unlocked = BTreeSet::new();
        unlocked.insert(first);

        Self {
            id: SessionId::generate(),
            track,
            current_module: 0,
            current_step: 0,
            answers: HashMap::new(),
            acknowledged: BTreeSet::new(),
            badges: BTreeSet::new(),
            unlocked,
            started_at,
            completed_at: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn track(&self) -> &Track {
        &self.track
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Badges earned so far. Grows only; never revoked.
    #[must_use]
    pub fn badges(&self) -> &BTreeSet<BadgeId> {
        &self.badges
    }

    /// Last submitted answer for a step, if any.
    #[must_use]
    pub fn answer(&self, step: StepId) -> Option<&str> {
        self.answers.get(&step).map(String::as_str)
    }

    /// Membership test against the unlocked module set.
    ///
    /// The permanently-locked final module never appears here.
    #[must_use]
    pub fn is_unlocked(&self, module: ModuleId) -> bool {
        self.unlocked.contains(&module)
    }

    /// The step the learner currently faces; `None` once complete.
    #[must_use]
    pub fn current_step(&self) -> Option<&StepDefinition> {
        if self.is_complete() {
            return None;
        }
        self.track
            .module_at(self.current_module)
            .and_then(|module| module.steps().get(self.current_step))
    }

    #[must_use]
    pub fn current_position(&self) -> Option<StepPosition> {
        let module = self.track.module_at(self.current_module)?;
        let step = self.current_step().map(StepDefinition::id)?;
        Some(StepPosition {
            module: module.id(),
            step,
        })
    }

    /// Fraction of acknowledged steps over all steps in non-locked modules.
    ///
    /// Pure and side-effect-free; monotonically non-decreasing across any
    /// sequence of submits and skips because the denominator is fixed at
    /// track load.
    #[must_use]
    pub fn progress_fraction(&self) -> f64 {
        let total = self.track.open_step_count();
        if total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let fraction = self.acknowledged.len() as f64 / total as f64;
        fraction.min(1.0)
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.track.open_step_count();
        let acknowledged = self.acknowledged.len();
        SessionProgress {
            total,
            acknowledged,
            remaining: total.saturating_sub(acknowledged),
            fraction: self.progress_fraction(),
            is_complete: self.is_complete(),
        }
    }

    /// Record an answer for a step and advance past it.
    ///
    /// Correctness is evaluated when the step defines a checker; a correct
    /// answer (or first acknowledgment of a checker-less step) earns the
    /// step's badge. Awarding an already-earned badge is a no-op.
    /// Re-submitting an acknowledged step overwrites the stored answer
    /// without moving the learner's position.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after the track is finished,
    /// `SessionError::ModuleLocked` for steps in locked or not-yet-unlocked
    /// modules, and `SessionError::OutOfSequence` for anything else that is
    /// not the current step.
    pub fn submit_answer(
        &mut self,
        step_id: StepId,
        answer: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<AdvanceResult, SessionError> {
        let track = Arc::clone(&self.track);
        let revisit = self.guard(&track, step_id)?;
        let (_, step) = track.find_step(step_id).ok_or(SessionError::OutOfSequence {
            expected: self.expected_step(),
            got: step_id,
        })?;

        let answer = answer.into();
        let correct = step.checker().map(|checker| checker.accepts(&answer));
        self.answers.insert(step_id, answer);
        self.acknowledged.insert(step_id);

        let badge_awarded = if correct.unwrap_or(true) {
            self.award(step.badge())
        } else {
            None
        };

        if revisit {
            return Ok(AdvanceResult {
                step: step_id,
                correct,
                badge_awarded,
                next: self.current_position(),
                is_complete: false,
            });
        }

        let next = self.advance(now);
        Ok(AdvanceResult {
            step: step_id,
            correct,
            badge_awarded,
            next,
            is_complete: self.is_complete(),
        })
    }

    /// Acknowledge a step without recording an answer.
    ///
    /// Never evaluates correctness and never awards a badge, even if the
    /// step defines one. Used for content-only steps.
    ///
    /// # Errors
    ///
    /// Same contract as [`LearnerSession::submit_answer`].
    pub fn skip_step(
        &mut self,
        step_id: StepId,
        now: DateTime<Utc>,
    ) -> Result<AdvanceResult, SessionError> {
        let track = Arc::clone(&self.track);
        let revisit = self.guard(&track, step_id)?;

        self.acknowledged.insert(step_id);

        if revisit {
            return Ok(AdvanceResult {
                step: step_id,
                correct: None,
                badge_awarded: None,
                next: self.current_position(),
                is_complete: false,
            });
        }

        let next = self.advance(now);
        Ok(AdvanceResult {
            step: step_id,
            correct: None,
            badge_awarded: None,
            next,
            is_complete: self.is_complete(),
        })
    }

    /// Shared sequencing checks. Returns true when the step is an
    /// already-acknowledged revisit rather than the current step.
    fn guard(&self, track: &Track, step_id: StepId) -> Result<bool, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }

        let expected = self.expected_step();
        let Some((module, _)) = track.find_step(step_id) else {
            return Err(SessionError::OutOfSequence {
                expected,
                got: step_id,
            });
        };

        // The locked final module rejects everything, regardless of position.
        if module.locked() || !self.unlocked.contains(&module.id()) {
            return Err(SessionError::ModuleLocked(module.id()));
        }

        if step_id == expected {
            return Ok(false);
        }
        if self.acknowledged.contains(&step_id) {
            return Ok(true);
        }
        Err(SessionError::OutOfSequence {
            expected,
            got: step_id,
        })
    }

    fn expected_step(&self) -> StepId {
        self.track
            .module_at(self.current_module)
            .and_then(|module| module.steps().get(self.current_step))
            .map_or_else(|| StepId::new(0), StepDefinition::id)
    }

    fn award(&mut self, badge: Option<&BadgeId>) -> Option<BadgeId> {
        let badge = badge?.clone();
        // BTreeSet::insert is false for an already-earned badge: idempotent.
        self.badges.insert(badge.clone()).then_some(badge)
    }

    /// Move past the current step; unlock the next module or finish.
    fn advance(&mut self, now: DateTime<Utc>) -> Option<StepPosition> {
        let module_len = self
            .track
            .module_at(self.current_module)
            .map_or(0, |module| module.steps().len());

        self.current_step += 1;
        if self.current_step < module_len {
            return self.current_position();
        }

        // End of module: the next module opens unless it is the locked
        // final one, which is never auto-added.
        let next_index = self.current_module + 1;
        match self.track.module_at(next_index) {
            Some(next) if !next.locked() => {
                self.current_module = next_index;
                self.current_step = 0;
                self.unlocked.insert(next.id());
                self.current_position()
            }
            _ => {
                self.completed_at = Some(now);
                None
            }
        }
    }
}

impl fmt::Debug for LearnerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LearnerSession")
            .field("id", &self.id)
            .field("current_module", &self.current_module)
            .field("current_step", &self.current_step)
            .field("acknowledged", &self.acknowledged.len())
            .field("badges", &self.badges.len())
            .field("unlocked", &self.unlocked)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::track::{AnswerChecker, ModuleDraft, StepDraft, StepKind, TrackDraft};
    use crate::time::fixed_now;

    fn quiz_step(id: u32, accepted: &str, badge: Option<&str>) -> StepDraft {
        StepDraft {
            id: StepId::new(id),
            kind: StepKind::Quiz,
            prompt: format!("Question {id}"),
            checker: Some(AnswerChecker::OneOf {
                accepted: vec![accepted.to_string()],
            }),
            badge: badge.map(BadgeId::new),
            offers_hints: false,
            fallback_hints: Vec::new(),
        }
    }

    fn content_step(id: u32, badge: Option<&str>) -> StepDraft {
        StepDraft {
            id: StepId::new(id),
            kind: StepKind::Content,
            prompt: format!("Read this: {id}"),
            checker: None,
            badge: badge.map(BadgeId::new),
            offers_hints: false,
            fallback_hints: Vec::new(),
        }
    }

    /// Two open modules of two steps each, matching the canonical walkthrough.
    fn two_module_track() -> Arc<Track> {
        let draft = TrackDraft {
            modules: vec![
                ModuleDraft {
                    id: ModuleId::new(1),
                    title: "Module 1".into(),
                    locked: false,
                    steps: vec![quiz_step(1, "b", Some("explorer")), content_step(2, None)],
                },
                ModuleDraft {
                    id: ModuleId::new(2),
                    title: "Module 2".into(),
                    locked: false,
                    steps: vec![quiz_step(3, "a", None), content_step(4, None)],
                },
            ],
            default_hint: "Keep it short.".into(),
        };
        Arc::new(draft.validate().unwrap())
    }

    fn locked_track() -> Arc<Track> {
        let draft = TrackDraft {
            modules: vec![
                ModuleDraft {
                    id: ModuleId::new(1),
                    title: "Open".into(),
                    locked: false,
                    steps: vec![content_step(1, None)],
                },
                ModuleDraft {
                    id: ModuleId::new(9),
                    title: "Applied Playbooks".into(),
                    locked: true,
                    steps: vec![quiz_step(90, "x", Some("locked-badge"))],
                },
            ],
            default_hint: "Keep it short.".into(),
        };
        Arc::new(draft.validate().unwrap())
    }

    #[test]
    fn canonical_walkthrough_matches_expected_progress() {
        let mut session = LearnerSession::new(two_module_track(), fixed_now());

        let res = session
            .submit_answer(StepId::new(1), "B", fixed_now())
            .unwrap();
        assert_eq!(res.correct, Some(true));
        assert_eq!(res.badge_awarded, Some(BadgeId::new("explorer")));
        assert!((session.progress_fraction() - 0.25).abs() < f64::EPSILON);

        let res = session.skip_step(StepId::new(2), fixed_now()).unwrap();
        assert_eq!(res.badge_awarded, None);
        assert!((session.progress_fraction() - 0.5).abs() < f64::EPSILON);
        assert!(session.is_unlocked(ModuleId::new(2)));
        assert_eq!(
            session.current_position().unwrap(),
            StepPosition {
                module: ModuleId::new(2),
                step: StepId::new(3),
            }
        );

        session
            .submit_answer(StepId::new(3), "a", fixed_now())
            .unwrap();
        let last = session
            .submit_answer(StepId::new(4), "done", fixed_now())
            .unwrap();
        assert!(last.is_complete);
        assert!(session.is_complete());
        assert_eq!(session.completed_at(), Some(fixed_now()));
        assert!((session.progress_fraction() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn skip_never_awards_a_badge() {
        let mut session = LearnerSession::new(two_module_track(), fixed_now());
        let res = session.skip_step(StepId::new(1), fixed_now()).unwrap();
        assert_eq!(res.badge_awarded, None);
        assert!(session.badges().is_empty());
    }

    #[test]
    fn wrong_answer_advances_without_badge() {
        let mut session = LearnerSession::new(two_module_track(), fixed_now());
        let res = session
            .submit_answer(StepId::new(1), "c", fixed_now())
            .unwrap();
        assert_eq!(res.correct, Some(false));
        assert_eq!(res.badge_awarded, None);
        assert_eq!(res.next.unwrap().step, StepId::new(2));
    }

    #[test]
    fn checkerless_step_awards_badge_on_submit() {
        let draft = TrackDraft {
            modules: vec![ModuleDraft {
                id: ModuleId::new(1),
                title: "M".into(),
                locked: false,
                steps: vec![content_step(1, Some("reader")), content_step(2, None)],
            }],
            default_hint: "hint".into(),
        };
        let track = Arc::new(draft.validate().unwrap());
        let mut session = LearnerSession::new(track, fixed_now());
        let res = session
            .submit_answer(StepId::new(1), "anything", fixed_now())
            .unwrap();
        assert_eq!(res.correct, None);
        assert_eq!(res.badge_awarded, Some(BadgeId::new("reader")));
    }

    #[test]
    fn out_of_sequence_submission_is_rejected() {
        let mut session = LearnerSession::new(two_module_track(), fixed_now());
        let err = session
            .submit_answer(StepId::new(2), "early", fixed_now())
            .unwrap_err();
        assert_eq!(
            err,
            SessionError::OutOfSequence {
                expected: StepId::new(1),
                got: StepId::new(2),
            }
        );

        let err = session
            .submit_answer(StepId::new(99), "bogus", fixed_now())
            .unwrap_err();
        assert!(matches!(err, SessionError::OutOfSequence { .. }));
    }

    #[test]
    fn not_yet_unlocked_module_is_locked() {
        let mut session = LearnerSession::new(two_module_track(), fixed_now());
        let err = session
            .submit_answer(StepId::new(3), "a", fixed_now())
            .unwrap_err();
        assert_eq!(err, SessionError::ModuleLocked(ModuleId::new(2)));
    }

    #[test]
    fn locked_final_module_always_rejects() {
        let track = locked_track();
        let mut session = LearnerSession::new(Arc::clone(&track), fixed_now());

        let err = session
            .submit_answer(StepId::new(90), "x", fixed_now())
            .unwrap_err();
        assert_eq!(err, SessionError::ModuleLocked(ModuleId::new(9)));
        assert!(!session.is_unlocked(ModuleId::new(9)));

        // Finishing the open modules never auto-unlocks the final one.
        let res = session.skip_step(StepId::new(1), fixed_now()).unwrap();
        assert!(res.is_complete);
        assert!(!session.is_unlocked(ModuleId::new(9)));
    }

    #[test]
    fn resubmission_overwrites_without_moving_or_revoking() {
        let mut session = LearnerSession::new(two_module_track(), fixed_now());
        session
            .submit_answer(StepId::new(1), "b", fixed_now())
            .unwrap();
        assert_eq!(session.badges().len(), 1);

        // Revisit with a now-wrong answer: overwrite, keep badge, stay put.
        let res = session
            .submit_answer(StepId::new(1), "c", fixed_now())
            .unwrap();
        assert_eq!(res.correct, Some(false));
        assert_eq!(res.badge_awarded, None);
        assert_eq!(res.next.unwrap().step, StepId::new(2));
        assert_eq!(session.answer(StepId::new(1)), Some("c"));
        assert_eq!(session.badges().len(), 1);
        assert!((session.progress_fraction() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn badge_award_is_idempotent() {
        let mut session = LearnerSession::new(two_module_track(), fixed_now());
        session
            .submit_answer(StepId::new(1), "b", fixed_now())
            .unwrap();
        let res = session
            .submit_answer(StepId::new(1), "b", fixed_now())
            .unwrap();
        assert_eq!(res.badge_awarded, None);
        assert_eq!(session.badges().len(), 1);
    }

    #[test]
    fn progress_is_monotonic_across_operations() {
        let mut session = LearnerSession::new(two_module_track(), fixed_now());
        let mut last = session.progress_fraction();

        let actions: Vec<(StepId, bool)> = vec![
            (StepId::new(1), true),
            (StepId::new(1), true), // revisit
            (StepId::new(2), false),
            (StepId::new(3), true),
            (StepId::new(4), false),
        ];
        for (step, submit) in actions {
            if submit {
                session.submit_answer(step, "b", fixed_now()).unwrap();
            } else {
                session.skip_step(step, fixed_now()).unwrap();
            }
            let now = session.progress_fraction();
            assert!(now >= last);
            last = now;
        }
        assert!((last - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn completed_session_rejects_further_input() {
        let track = locked_track();
        let mut session = LearnerSession::new(track, fixed_now());
        session.skip_step(StepId::new(1), fixed_now()).unwrap();
        let err = session
            .submit_answer(StepId::new(1), "late", fixed_now())
            .unwrap_err();
        assert_eq!(err, SessionError::Completed);
    }

    #[test]
    fn progress_view_counts_open_steps_only() {
        let mut session = LearnerSession::new(locked_track(), fixed_now());
        let progress = session.progress();
        assert_eq!(progress.total, 1);
        assert_eq!(progress.remaining, 1);
        assert!(!progress.is_complete);

        session.skip_step(StepId::new(1), fixed_now()).unwrap();
        let progress = session.progress();
        assert_eq!(progress.acknowledged, 1);
        assert_eq!(progress.remaining, 0);
        assert!(progress.is_complete);
        assert!((progress.fraction - 1.0).abs() < f64::EPSILON);
    }
}
