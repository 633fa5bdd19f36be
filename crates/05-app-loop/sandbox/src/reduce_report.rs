//! Pure report reducer over the sandbox engine.

use crate::engine::{Background, NarrationState, SandboxEngine};
use crate::types::{
    ArtRep, Command, FollowUps, HapticRep, Intent, NarrationCmd, NarrationRep, Report,
};
use log::{debug, warn};

/// Trait for handling collaborator reports and producing follow-up actions.
pub trait ReportReducer {
    /// Applies a report to auxiliary state. Reports never move the step walk.
    fn reduce_report(&mut self, report: Report) -> FollowUps;
}

impl ReportReducer for SandboxEngine {
    fn reduce_report(&mut self, report: Report) -> FollowUps {
        let mut follow_ups = FollowUps::new();

        match report {
            Report::Art(art) => match art {
                ArtRep::Ready { image } => {
                    debug!("background ready ({})", image.media_type);
                    self.set_background(Background::Ready { image });
                }
                ArtRep::Failed { reason } => {
                    warn!("background art failed: {reason}; using fallback");
                    self.set_background(Background::Fallback);
                }
            },
            Report::Narration(narration) => match narration {
                NarrationRep::Started {
                    utterance,
                    duration_ms,
                } => {
                    if self.is_terminal() {
                        follow_ups.push_command(Command::Narration(NarrationCmd::Stop));
                    } else {
                        self.set_narration(NarrationState::Playing { utterance });
                        follow_ups.push_timer(duration_ms, Intent::NarrationElapsed { utterance });
                    }
                }
                NarrationRep::Finished { utterance } | NarrationRep::Stopped { utterance } => {
                    if self.narration() == (NarrationState::Playing { utterance }) {
                        self.set_narration(NarrationState::Idle);
                    }
                }
                NarrationRep::Failed { reason } => {
                    // Nothing started, so the playback state is unchanged.
                    warn!("narration failed: {reason}");
                }
            },
            Report::Haptics(haptics) => match haptics {
                HapticRep::Pulsed { .. } => {}
                HapticRep::Unsupported => {
                    if self.mark_haptics_unsupported() {
                        debug!("host has no haptics; alerts continue without pulses");
                    }
                }
            },
        }

        follow_ups
    }
}
