//! Questionnaire step: one yes/no screening question.

#[cfg(test)]
#[path = "questionnaire_test.rs"]
mod questionnaire_test;

use serde::Serialize;

use super::StepError;

pub const QUESTION: &str = "Do you need immediate emergency assistance?";
pub const YES_LABEL: &str = "Yes, I need immediate help";
pub const NO_LABEL: &str = "No, I'm seeking information only";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireAnswer {
    pub needs_emergency_help: bool,
}

/// Picking never advances; only [`submit`](Self::submit) produces an answer.
#[derive(Debug, Default)]
pub struct QuestionnaireStep {
    choice: Option<bool>,
}

impl QuestionnaireStep {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any earlier pick.
    pub fn choose(&mut self, needs_emergency_help: bool) {
        self.choice = Some(needs_emergency_help);
    }

    #[must_use]
    pub fn choice(&self) -> Option<bool> {
        self.choice
    }

    #[must_use]
    pub fn can_continue(&self) -> bool {
        self.choice.is_some()
    }

    /// # Errors
    ///
    /// Returns [`StepError::NoAnswer`] until a choice has been picked.
    pub fn submit(&self) -> Result<QuestionnaireAnswer, StepError> {
        self.choice
            .map(|needs_emergency_help| QuestionnaireAnswer { needs_emergency_help })
            .ok_or(StepError::NoAnswer)
    }
}
