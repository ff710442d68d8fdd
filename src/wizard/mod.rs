//! Emergency wizard: five fixed steps walked strictly forward.
//!
//! DESIGN
//! ======
//! `StepKind` is the single source of step order and metadata. The
//! `Sequencer` is a cursor over it with two transitions:
//!
//! - `advance(outcome)`: the current step's side effect completed; the
//!   outcome must belong to the current step.
//! - `skip()`: move on without it.
//!
//! Both move to `min(index + 1, last)`. The cursor never decreases and never
//! leaves the five steps. At the last step the cursor stays put; the first
//! action there settles that step's disposition. There is no sixth "done"
//! state.

pub mod process;

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;

use std::fmt;

use crate::error::{ErrorCategory, ErrorCode};
use crate::steps::{AudioClip, HelplineConnected, ImageCapture, LocationRecord, QuestionnaireAnswer};

pub use process::{ActiveStep, EmergencyProcess, StepDeps};

pub const STEP_COUNT: usize = 5;

// =============================================================================
// STEP KIND
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Location,
    Questionnaire,
    VoiceVerification,
    ImageVerification,
    HelplineConnection,
}

impl StepKind {
    pub const ALL: [StepKind; STEP_COUNT] = [
        StepKind::Location,
        StepKind::Questionnaire,
        StepKind::VoiceVerification,
        StepKind::ImageVerification,
        StepKind::HelplineConnection,
    ];

    pub const LAST: StepKind = StepKind::HelplineConnection;

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Location => "Location Selection",
            Self::Questionnaire => "Emergency Verification",
            Self::VoiceVerification => "Voice Recording",
            Self::ImageVerification => "Image Verification",
            Self::HelplineConnection => "Helpline Connection",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Location => "Select your location from the map",
            Self::Questionnaire => "Answer a few quick questions",
            Self::VoiceVerification => "Verify your voice for security",
            Self::ImageVerification => "Additional security verification",
            Self::HelplineConnection => "Connect with our support team",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// The result a step hands back when its side effect succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Location(LocationRecord),
    Questionnaire(QuestionnaireAnswer),
    Voice(AudioClip),
    Image(ImageCapture),
    Helpline(HelplineConnected),
}

impl StepOutcome {
    #[must_use]
    pub fn kind(&self) -> StepKind {
        match self {
            Self::Location(_) => StepKind::Location,
            Self::Questionnaire(_) => StepKind::Questionnaire,
            Self::Voice(_) => StepKind::VoiceVerification,
            Self::Image(_) => StepKind::ImageVerification,
            Self::Helpline(_) => StepKind::HelplineConnection,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disposition {
    #[default]
    Pending,
    Completed,
    Skipped,
}

#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    #[error("{current} step cannot accept a {outcome} result")]
    OutcomeMismatch { current: StepKind, outcome: StepKind },
}

impl ErrorCode for SequenceError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::OutcomeMismatch { .. } => "E_SEQUENCE_OUTCOME_MISMATCH",
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Validation
    }
}

// =============================================================================
// SEQUENCER
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: StepKind,
    pub to: StepKind,
}

impl Transition {
    #[must_use]
    pub fn moved(&self) -> bool {
        self.from != self.to
    }
}

/// One row of the progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEntry {
    pub kind: StepKind,
    pub disposition: Disposition,
    /// The cursor is at or past this step.
    pub reached: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    index: usize,
    dispositions: [Disposition; STEP_COUNT],
}

impl Sequencer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn current(&self) -> StepKind {
        StepKind::ALL[self.index]
    }

    #[must_use]
    pub fn disposition(&self, kind: StepKind) -> Disposition {
        self.dispositions[kind.index()]
    }

    /// Whether the last step has been completed or skipped.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.disposition(StepKind::LAST) != Disposition::Pending
    }

    /// Record the current step's success and move on.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::OutcomeMismatch`] if `outcome` was produced by
    /// a different step; the cursor does not move.
    pub fn advance(&mut self, outcome: &StepOutcome) -> Result<Transition, SequenceError> {
        let current = self.current();
        if outcome.kind() != current {
            return Err(SequenceError::OutcomeMismatch { current, outcome: outcome.kind() });
        }
        Ok(self.settle(Disposition::Completed))
    }

    /// Move on without the current step's side effect.
    pub fn skip(&mut self) -> Transition {
        self.settle(Disposition::Skipped)
    }

    fn settle(&mut self, disposition: Disposition) -> Transition {
        let from = self.current();
        let slot = &mut self.dispositions[self.index];
        if *slot == Disposition::Pending {
            *slot = disposition;
        }
        self.index = (self.index + 1).min(STEP_COUNT - 1);
        Transition { from, to: self.current() }
    }

    #[must_use]
    pub fn progress(&self) -> Vec<ProgressEntry> {
        StepKind::ALL
            .iter()
            .map(|&kind| ProgressEntry {
                kind,
                disposition: self.disposition(kind),
                reached: kind.index() <= self.index,
            })
            .collect()
    }
}
