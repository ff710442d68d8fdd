//! The emergency process screen: sequencer + the mounted step handler.
//!
//! Exactly one step handler is mounted at a time. On every transition that
//! moves the cursor the old handler is unmounted first (camera released,
//! helpline timer cancelled) and the next one mounted. Dropping the process
//! drops the mounted handler, which releases whatever it still holds.

#[cfg(test)]
#[path = "process_test.rs"]
mod process_test;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::{ProgressEntry, SequenceError, Sequencer, StepKind, StepOutcome, Transition};
use crate::backend::{ReverseGeocoder, RowStore};
use crate::device::{Geolocator, MediaDevices};
use crate::steps::{HelplineStep, ImageStep, LocationStep, QuestionnaireStep, VoiceStep};

/// Everything a step handler may need to mount.
#[derive(Clone)]
pub struct StepDeps {
    pub geocoder: Arc<dyn ReverseGeocoder>,
    pub store: Arc<dyn RowStore>,
    pub geolocator: Arc<dyn Geolocator>,
    pub devices: Arc<dyn MediaDevices>,
    pub recording_limit_secs: u32,
    pub helpline_delay: Duration,
}

/// The mounted handler, one variant per step kind.
pub enum ActiveStep {
    Location(LocationStep),
    Questionnaire(QuestionnaireStep),
    Voice(VoiceStep),
    Image(ImageStep),
    Helpline(HelplineStep),
}

impl ActiveStep {
    async fn mount(kind: StepKind, deps: &StepDeps) -> Self {
        match kind {
            StepKind::Location => {
                Self::Location(LocationStep::new(deps.geocoder.clone(), deps.store.clone(), deps.geolocator.clone()))
            }
            StepKind::Questionnaire => Self::Questionnaire(QuestionnaireStep::new()),
            StepKind::VoiceVerification => Self::Voice(VoiceStep::new(deps.devices.clone(), deps.recording_limit_secs)),
            StepKind::ImageVerification => Self::Image(ImageStep::mount(deps.devices.as_ref()).await),
            StepKind::HelplineConnection => Self::Helpline(HelplineStep::mount(deps.helpline_delay)),
        }
    }

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

    fn unmount(&mut self) {
        match self {
            Self::Image(step) => step.unmount(),
            Self::Helpline(step) => step.unmount(),
            Self::Location(_) | Self::Questionnaire(_) | Self::Voice(_) => {}
        }
    }
}

pub struct EmergencyProcess {
    sequencer: Sequencer,
    active: ActiveStep,
    deps: StepDeps,
}

impl EmergencyProcess {
    /// Enter the process at the first step.
    pub async fn start(deps: StepDeps) -> Self {
        let sequencer = Sequencer::new();
        let active = ActiveStep::mount(sequencer.current(), &deps).await;
        info!("emergency process started");
        Self { sequencer, active, deps }
    }

    #[must_use]
    pub fn current(&self) -> StepKind {
        self.sequencer.current()
    }

    #[must_use]
    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    #[must_use]
    pub fn progress(&self) -> Vec<ProgressEntry> {
        self.sequencer.progress()
    }

    #[must_use]
    pub fn active(&self) -> &ActiveStep {
        &self.active
    }

    pub fn active_mut(&mut self) -> &mut ActiveStep {
        &mut self.active
    }

    /// Hand in the current step's result and move on.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::OutcomeMismatch`] for another step's result;
    /// nothing moves and the mounted handler is untouched.
    pub async fn complete(&mut self, outcome: &StepOutcome) -> Result<Transition, SequenceError> {
        let transition = self.sequencer.advance(outcome)?;
        info!(step = %transition.from, "step completed");
        self.follow(transition).await;
        Ok(transition)
    }

    /// Move on without completing the current step.
    pub async fn skip(&mut self) -> Transition {
        let transition = self.sequencer.skip();
        info!(step = %transition.from, "step skipped");
        self.follow(transition).await;
        transition
    }

    async fn follow(&mut self, transition: Transition) {
        if !transition.moved() {
            return;
        }
        self.active.unmount();
        self.active = ActiveStep::mount(transition.to, &self.deps).await;
        info!(from = %transition.from, to = %transition.to, index = self.sequencer.index(), "step mounted");
    }
}
