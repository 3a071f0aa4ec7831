use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use quest_core::model::{HintRequest, HintResult, HintSource, StepDefinition, Track};

use super::backend::HintBackend;

/// Upper bound on the single remote attempt. A human is waiting
/// synchronously, so responsiveness beats best-effort persistence.
pub const DEFAULT_HINT_TIMEOUT: Duration = Duration::from_secs(4);

/// The hint provider: one bounded remote attempt, then pre-authored fallback.
///
/// `hint` never fails outward. A backend of `None` is the explicit
/// "AI coaching off" configuration; every request then resolves to the
/// step's fallback text.
pub struct HintService {
    track: Arc<Track>,
    backend: Option<Arc<dyn HintBackend>>,
    timeout: Duration,
}

impl HintService {
    #[must_use]
    pub fn new(track: Arc<Track>, backend: Option<Arc<dyn HintBackend>>) -> Self {
        Self {
            track,
            backend,
            timeout: DEFAULT_HINT_TIMEOUT,
        }
    }

    /// A provider with coaching switched off; always answers from fallback.
    #[must_use]
    pub fn disabled(track: Arc<Track>) -> Self {
        Self::new(track, None)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Produce a hint for the requested step.
    ///
    /// Single remote attempt bounded by the configured timeout; any failure
    /// (disabled backend, timeout, transport or HTTP error, empty body)
    /// resolves to the step's pre-authored fallback. No retries. Unknown
    /// step ids resolve to the track's default hint, since the presentation
    /// surface may race a stale id against an advanced session.
    pub async fn hint(&self, request: &HintRequest) -> HintResult {
        let step = self.track.find_step(request.step).map(|(_, step)| step);

        if let (Some(backend), Some(step)) = (self.backend.as_deref(), step) {
            let prompt = build_prompt(step, request.draft.as_deref());
            let attempt = tokio::time::timeout(self.timeout, backend.generate(&prompt)).await;
            if let Ok(Ok(text)) = attempt {
                return HintResult {
                    text,
                    source: HintSource::Remote,
                };
            }
        }

        HintResult {
            text: self.fallback_text(step),
            source: HintSource::Fallback,
        }
    }

    fn fallback_text(&self, step: Option<&StepDefinition>) -> String {
        let candidates: Vec<&String> = step
            .map(StepDefinition::fallback_hints)
            .unwrap_or_default()
            .iter()
            .filter(|hint| !hint.trim().is_empty())
            .collect();

        if candidates.is_empty() {
            return self.track.default_hint().to_string();
        }
        let index = rand::rng().random_range(0..candidates.len());
        candidates[index].clone()
    }
}

fn build_prompt(step: &StepDefinition, draft: Option<&str>) -> String {
    let mut prompt = format!(
        "Give one short hint (<=20 words) to help a beginner with this step:\n{}",
        step.prompt()
    );
    if let Some(draft) = draft.filter(|text| !text.trim().is_empty()) {
        prompt.push_str("\n\nThe learner's draft so far:\n");
        prompt.push_str(draft);
    }
    prompt
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
