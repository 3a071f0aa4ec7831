use std::sync::Arc;

use quest_core::Clock;
use quest_core::model::{
    AdvanceResult, HintRequest, HintResult, HintSource, LearnerSession, ModuleId, SessionError,
    SessionProgress, StepId, StepKind, Track,
};

use crate::hint::HintService;

//
// ─── REPORT CARD ───────────────────────────────────────────────────────────────
//

/// Star ratings (0–5) shown at the end of the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportCard {
    pub concepts: u8,
    pub prompt_craft: u8,
    pub applied_practice: u8,
    pub consistency: u8,
}

impl ReportCard {
    /// Renders a score as a five-star string, e.g. `★★★☆☆`.
    #[must_use]
    pub fn stars(score: u8) -> String {
        let filled = usize::from(score.min(5));
        format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
    }
}

//
// ─── QUEST SERVICE ─────────────────────────────────────────────────────────────
//

/// Orchestrates learner sessions over one track.
///
/// Sessions are caller-owned and passed by handle into every operation, so
/// one service instance can serve many concurrent learners without shared
/// mutable session state.
pub struct QuestService {
    track: Arc<Track>,
    hints: HintService,
    clock: Clock,
}

impl QuestService {
    #[must_use]
    pub fn new(track: Arc<Track>, hints: HintService) -> Self {
        Self {
            track,
            hints,
            clock: Clock::default_clock(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn track(&self) -> &Track {
        &self.track
    }

    /// Starts an independently-owned session at the first step.
    #[must_use]
    pub fn start_session(&self) -> LearnerSession {
        LearnerSession::new(Arc::clone(&self.track), self.clock.now())
    }

    /// Records an answer for the given step and advances the session.
    ///
    /// # Errors
    ///
    /// Propagates `SessionError` from the state machine; the presentation
    /// surface decides how to notify the learner.
    pub fn submit_answer(
        &self,
        session: &mut LearnerSession,
        step: StepId,
        answer: impl Into<String>,
    ) -> Result<AdvanceResult, SessionError> {
        session.submit_answer(step, answer, self.clock.now())
    }

    /// Acknowledges a content-only step without recording an answer.
    ///
    /// # Errors
    ///
    /// Propagates `SessionError` from the state machine.
    pub fn skip_step(
        &self,
        session: &mut LearnerSession,
        step: StepId,
    ) -> Result<AdvanceResult, SessionError> {
        session.skip_step(step, self.clock.now())
    }

    /// Hint for the session's current step. Never fails; a finished session
    /// gets the track's default hint from the fallback path.
    pub async fn hint(&self, session: &LearnerSession, draft: Option<String>) -> HintResult {
        match session.current_position() {
            Some(position) => {
                self.hint_for_step(&HintRequest {
                    step: position.step,
                    draft,
                })
                .await
            }
            None => HintResult {
                text: self.track.default_hint().to_string(),
                source: HintSource::Fallback,
            },
        }
    }

    /// Hint for an explicit step, e.g. when the surface re-requests one.
    pub async fn hint_for_step(&self, request: &HintRequest) -> HintResult {
        self.hints.hint(request).await
    }

    #[must_use]
    pub fn progress(&self, session: &LearnerSession) -> SessionProgress {
        session.progress()
    }

    #[must_use]
    pub fn is_unlocked(&self, session: &LearnerSession, module: ModuleId) -> bool {
        session.is_unlocked(module)
    }

    /// End-of-track report card derived from quiz correctness.
    #[must_use]
    pub fn report_card(&self, session: &LearnerSession) -> ReportCard {
        let quiz_correct = self.quiz_correct(session);
        ReportCard {
            concepts: (3 + quiz_correct).min(5),
            prompt_craft: (2 + quiz_correct).min(5),
            applied_practice: 3,
            consistency: 2,
        }
    }

    /// Number of quiz steps whose stored answer passes their checker.
    fn quiz_correct(&self, session: &LearnerSession) -> u8 {
        let mut correct = 0_u8;
        for module in self.track.modules() {
            for step in module.steps() {
                if step.kind() != StepKind::Quiz {
                    continue;
                }
                let Some(checker) = step.checker() else {
                    continue;
                };
                if session
                    .answer(step.id())
                    .is_some_and(|answer| checker.accepts(answer))
                {
                    correct = correct.saturating_add(1);
                }
            }
        }
        correct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stars_render_and_clamp() {
        assert_eq!(ReportCard::stars(0), "☆☆☆☆☆");
        assert_eq!(ReportCard::stars(3), "★★★☆☆");
        assert_eq!(ReportCard::stars(9), "★★★★★");
    }
}
