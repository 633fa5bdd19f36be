//! Collaborator health tracking.
//!
//! The scheduler records every submission outcome here so the presentation
//! layer can tell when an enhancement (art, narration, haptics) is gone for
//! the rest of the session. Auxiliary collaborators never fail the session.

use hub::{Collaborator, SubmitOutcome, SubmitPolicy};

/// Latch-style health indicators exported to the UI layer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HealthFlags {
    /// The art collaborator closed; the fallback background stays.
    pub art_closed: bool,
    /// The narration collaborator closed; nothing will be spoken.
    pub narration_closed: bool,
    /// The haptics collaborator closed; alerts only shake.
    pub haptics_closed: bool,
}

/// Health flags plus backpressure counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CollaboratorHealth {
    pub flags: HealthFlags,
    /// Best-effort commands dropped by a busy or full collaborator.
    pub dropped: u64,
    /// `Must` commands that hit backpressure and were kept for retry.
    pub deferred: u64,
}

impl CollaboratorHealth {
    /// Folds one submission outcome into the health state.
    pub fn record(
        &mut self,
        collaborator: Collaborator,
        policy: SubmitPolicy,
        outcome: SubmitOutcome,
    ) {
        match outcome {
            SubmitOutcome::Accepted => {}
            SubmitOutcome::Dropped => self.dropped = self.dropped.saturating_add(1),
            SubmitOutcome::WouldBlock => {
                if matches!(policy, SubmitPolicy::Must) {
                    self.deferred = self.deferred.saturating_add(1);
                } else {
                    self.dropped = self.dropped.saturating_add(1);
                }
            }
            SubmitOutcome::Closed => *self.flag_mut(collaborator) = true,
        }
    }

    pub fn is_closed(&self, collaborator: Collaborator) -> bool {
        match collaborator {
            Collaborator::Art => self.flags.art_closed,
            Collaborator::Narration => self.flags.narration_closed,
            Collaborator::Haptics => self.flags.haptics_closed,
        }
    }

    pub fn any_closed(&self) -> bool {
        self.flags.art_closed || self.flags.narration_closed || self.flags.haptics_closed
    }

    fn flag_mut(&mut self, collaborator: Collaborator) -> &mut bool {
        match collaborator {
            Collaborator::Art => &mut self.flags.art_closed,
            Collaborator::Narration => &mut self.flags.narration_closed,
            Collaborator::Haptics => &mut self.flags.haptics_closed,
        }
    }
}
