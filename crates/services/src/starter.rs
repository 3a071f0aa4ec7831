//! The built-in "AI Starter Quest" track: three open modules plus a locked
//! final level that requires enrollment outside this demo.

use quest_core::model::{
    AnswerChecker, BadgeId, ModuleDraft, ModuleId, StepDraft, StepId, StepKind, Track, TrackDraft,
};

/// Builds the default course content.
///
/// # Panics
///
/// Panics if the built-in definition fails validation, which would be a
/// programming error caught by the `starter_track_is_valid` test.
#[must_use]
pub fn starter_track() -> Track {
    starter_draft()
        .validate()
        .expect("starter track should be valid")
}

fn starter_draft() -> TrackDraft {
    TrackDraft {
        modules: vec![
            ModuleDraft {
                id: ModuleId::new(1),
                title: "What is AI?".into(),
                locked: false,
                steps: vec![
                    StepDraft {
                        id: StepId::new(1),
                        kind: StepKind::Content,
                        prompt: "AI helps computers perform tasks like pattern recognition, \
                                 prediction, and content generation. Type anything (or skip) \
                                 to continue to the checkpoint."
                            .into(),
                        checker: None,
                        badge: Some(BadgeId::new("concept-spark")),
                        offers_hints: false,
                        fallback_hints: Vec::new(),
                    },
                    StepDraft {
                        id: StepId::new(2),
                        kind: StepKind::Quiz,
                        prompt: "Checkpoint: name one everyday example of AI you've used or seen."
                            .into(),
                        checker: Some(AnswerChecker::KeywordAny {
                            keywords: vec![
                                "netflix".into(),
                                "spotify".into(),
                                "recommend".into(),
                                "maps".into(),
                                "autocorrect".into(),
                                "autocomplete".into(),
                                "youtube".into(),
                            ],
                        }),
                        badge: None,
                        offers_hints: true,
                        fallback_hints: vec!["Think of apps that recommend or autocomplete.".into()],
                    },
                    StepDraft {
                        id: StepId::new(3),
                        kind: StepKind::Quiz,
                        prompt: "Mini-quiz: which statement is MOST accurate?\n\
                                 A) AI is one algorithm.\n\
                                 B) AI is a field with many methods, such as machine learning.\n\
                                 C) AI is magic.\n\
                                 Reply with A, B, or C."
                            .into(),
                        checker: Some(AnswerChecker::OneOf {
                            accepted: vec!["b".into()],
                        }),
                        badge: None,
                        offers_hints: true,
                        fallback_hints: vec!["Think of apps that recommend or autocomplete.".into()],
                    },
                ],
            },
            ModuleDraft {
                id: ModuleId::new(2),
                title: "Prompting Basics".into(),
                locked: false,
                steps: vec![
                    StepDraft {
                        id: StepId::new(4),
                        kind: StepKind::Exercise,
                        prompt: "Good prompts are clear, contextual, and goal-oriented.\n\
                                 Task: rewrite this weak prompt to be specific.\n\
                                 Weak: `Write marketing ideas.`\n\
                                 Include audience, tone, and output format."
                            .into(),
                        checker: None,
                        badge: Some(BadgeId::new("prompt-explorer")),
                        offers_hints: true,
                        fallback_hints: vec!["Add audience, tone, and output format.".into()],
                    },
                    StepDraft {
                        id: StepId::new(5),
                        kind: StepKind::Quiz,
                        prompt: "Quick check: which prompt yields structured output?\n\
                                 A) `Write about AI.`\n\
                                 B) `Create a 5-step checklist for starting with AI at a small \
                                 bakery, numbered list.`\n\
                                 Reply with A or B."
                            .into(),
                        checker: Some(AnswerChecker::OneOf {
                            accepted: vec!["b".into()],
                        }),
                        badge: None,
                        offers_hints: true,
                        fallback_hints: vec!["Add audience, tone, and output format.".into()],
                    },
                ],
            },
            ModuleDraft {
                id: ModuleId::new(3),
                title: "Hands-On Practice".into(),
                locked: false,
                steps: vec![
                    StepDraft {
                        id: StepId::new(6),
                        kind: StepKind::Exercise,
                        prompt: "Pick a quick exercise (reply with 1, 2, or 3):\n\
                                 1) Content: 5 product ideas using AI\n\
                                 2) Customer support: empathetic reply to a delay complaint\n\
                                 3) Data: 3 ways AI can save time in spreadsheets"
                            .into(),
                        checker: Some(AnswerChecker::OneOf {
                            accepted: vec!["1".into(), "2".into(), "3".into()],
                        }),
                        badge: Some(BadgeId::new("ai-tinkerer")),
                        offers_hints: true,
                        fallback_hints: vec!["Pick one short task and try it.".into()],
                    },
                    StepDraft {
                        id: StepId::new(7),
                        kind: StepKind::Exercise,
                        prompt: "Try your exercise with any AI assistant. Type `done` when \
                                 finished."
                            .into(),
                        checker: Some(AnswerChecker::Exact {
                            expected: "done".into(),
                        }),
                        badge: None,
                        offers_hints: true,
                        fallback_hints: vec!["Pick one short task and try it.".into()],
                    },
                ],
            },
            ModuleDraft {
                id: ModuleId::new(4),
                title: "Applied AI Playbooks".into(),
                locked: true,
                steps: vec![StepDraft {
                    id: StepId::new(8),
                    kind: StepKind::Content,
                    prompt: "12 advanced prompt frameworks, case studies, templates, and a \
                             certificate. Unlock via the AI Learning Academy."
                        .into(),
                    checker: None,
                    badge: None,
                    offers_hints: false,
                    fallback_hints: Vec::new(),
                }],
            },
        ],
        default_hint: "Keep it short and specific.".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starter_track_is_valid() {
        let track = starter_track();
        assert_eq!(track.module_count(), 4);
        // The locked final module is excluded from progress math.
        assert_eq!(track.open_step_count(), 7);
        assert!(track.modules().last().unwrap().locked());
    }

    #[test]
    fn every_hint_step_has_fallback_text() {
        let track = starter_track();
        for module in track.modules() {
            for step in module.steps() {
                if step.offers_hints() {
                    assert!(!step.fallback_hints().is_empty(), "step {}", step.id());
                }
            }
        }
    }
}
