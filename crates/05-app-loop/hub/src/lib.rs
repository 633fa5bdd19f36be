//! Collaborator hub and shared scheduling primitives.

use anyhow::{anyhow, Result};

pub use sandbox::{
    ArtCmd, ArtRep, Command, Cue, ElementId, FollowUps, HapticCmd, HapticRep, ImageHandle, Intent,
    IntentPriority, IntentReducer, NarrationCmd, NarrationRep, Report, ReportReducer,
    ScheduledIntent, SubmitOutcome, SubmitPolicy,
};

// Re-export Service trait and handle types from service-abi
pub use service_abi::{ArtServiceHandle, HapticServiceHandle, NarrationServiceHandle, Service};

/// Default budget for processing intents per scheduler tick.
pub const DEFAULT_INTENT_BUDGET: usize = 3;
/// Default budget for draining reports per scheduler tick.
pub const DEFAULT_REPORT_BUDGET: usize = 32;

/// Which collaborator a command or report belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collaborator {
    Art,
    Narration,
    Haptics,
}

impl Collaborator {
    /// Collaborator addressed by `cmd`.
    pub fn of(cmd: &Command) -> Self {
        match cmd {
            Command::Art(_) => Collaborator::Art,
            Command::Narration(_) => Collaborator::Narration,
            Command::Haptics(_) => Collaborator::Haptics,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Collaborator::Art => "art",
            Collaborator::Narration => "narration",
            Collaborator::Haptics => "haptics",
        }
    }
}

/// Aggregates collaborator services and routes commands to them.
#[derive(Clone)]
pub struct CollaboratorsHub {
    art: ArtServiceHandle,
    narration: NarrationServiceHandle,
    haptics: HapticServiceHandle,
}

impl CollaboratorsHub {
    /// Creates a new builder for constructing a hub.
    pub fn builder() -> CollaboratorsHubBuilder {
        CollaboratorsHubBuilder::new()
    }

    /// Attempts to submit a command to the collaborator it addresses.
    pub fn try_submit(&self, cmd: &Command) -> SubmitOutcome {
        match cmd {
            Command::Art(inner) => self.art.try_submit(inner),
            Command::Narration(inner) => self.narration.try_submit(inner),
            Command::Haptics(inner) => self.haptics.try_submit(inner),
        }
    }

    /// Drains reports across all collaborators up to the provided budget.
    pub fn drain_reports(&self, budget: usize) -> Vec<Report> {
        if budget == 0 {
            return Vec::new();
        }

        let mut remaining = budget;
        let mut out = Vec::with_capacity(budget.min(16));
        let mut progressed = true;

        while remaining > 0 && progressed {
            progressed = false;

            if remaining > 0 {
                let drained = self.art.drain(remaining);
                if !drained.is_empty() {
                    remaining = remaining.saturating_sub(drained.len());
                    out.extend(drained.into_iter().map(Report::Art));
                    progressed = true;
                }
            }

            if remaining > 0 {
                let drained = self.narration.drain(remaining);
                if !drained.is_empty() {
                    remaining = remaining.saturating_sub(drained.len());
                    out.extend(drained.into_iter().map(Report::Narration));
                    progressed = true;
                }
            }

            if remaining > 0 {
                let drained = self.haptics.drain(remaining);
                if !drained.is_empty() {
                    remaining = remaining.saturating_sub(drained.len());
                    out.extend(drained.into_iter().map(Report::Haptics));
                    progressed = true;
                }
            }
        }

        out
    }
}

/// Builder for assembling a [`CollaboratorsHub`] from individual service handles.
pub struct CollaboratorsHubBuilder {
    art: Option<ArtServiceHandle>,
    narration: Option<NarrationServiceHandle>,
    haptics: Option<HapticServiceHandle>,
}

impl CollaboratorsHubBuilder {
    /// Creates an empty builder with no services attached.
    pub fn new() -> Self {
        Self {
            art: None,
            narration: None,
            haptics: None,
        }
    }

    /// Sets the background-art service handle.
    pub fn art(mut self, svc: ArtServiceHandle) -> Self {
        self.art = Some(svc);
        self
    }

    /// Sets the narration service handle.
    pub fn narration(mut self, svc: NarrationServiceHandle) -> Self {
        self.narration = Some(svc);
        self
    }

    /// Sets the haptics service handle.
    pub fn haptics(mut self, svc: HapticServiceHandle) -> Self {
        self.haptics = Some(svc);
        self
    }

    /// Builds a [`CollaboratorsHub`], returning an error if any service is missing.
    pub fn build(self) -> Result<CollaboratorsHub> {
        Ok(CollaboratorsHub {
            art: self.art.ok_or_else(|| anyhow!("missing art service"))?,
            narration: self
                .narration
                .ok_or_else(|| anyhow!("missing narration service"))?,
            haptics: self
                .haptics
                .ok_or_else(|| anyhow!("missing haptics service"))?,
        })
    }
}

impl Default for CollaboratorsHubBuilder {
    fn default() -> Self {
        Self::new()
    }
}
