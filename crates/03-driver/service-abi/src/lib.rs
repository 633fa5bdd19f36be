//! Collaborator ABI shared between services and the session scheduler.
//!
//! This crate defines the protocol boundary between the scheduler (layer 05)
//! and the collaborator adapters (layer 04): the non-blocking [`Service`]
//! trait, submission outcomes and policies, and the command/report pairs of
//! every collaborator the sandbox talks to. It has no app-specific
//! dependencies.

use serde::Serialize;
use smallvec::SmallVec;
use std::sync::Arc;

/// Non-blocking service trait implemented by collaborator adapters.
pub trait Service {
    /// Command type accepted by the service.
    type Cmd: Send + 'static;
    /// Report type produced by the service.
    type Rep: Send + 'static;

    /// Attempts to submit a command without blocking. Defaults to `Accepted`.
    fn try_submit(&self, _cmd: &Self::Cmd) -> SubmitOutcome {
        SubmitOutcome::Accepted
    }

    /// Drains up to `max` reports without blocking. Defaults to empty.
    fn drain(&self, _max: usize) -> SmallVec<[Self::Rep; 8]> {
        SmallVec::new()
    }
}

/// Outcome returned when attempting to submit a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Command entered the queue.
    Accepted,
    /// Command was intentionally dropped per policy.
    Dropped,
    /// Service could not accept without blocking.
    WouldBlock,
    /// Service was shut down and accepts nothing more.
    Closed,
}

/// Policy describing how the scheduler should handle backpressure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitPolicy {
    /// Command must be submitted immediately; failure is surfaced.
    Must,
    /// Drop when queues are congested or the collaborator is busy.
    BestEffort,
}

/// Decoded background illustration, ready to be shown by the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImageHandle {
    /// Media type of the encoded image, e.g. `image/png`.
    pub media_type: String,
    /// `data:` URL carrying the base64 payload.
    pub data_url: String,
}

/// Command directed at the background-art collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArtCmd {
    /// Request a single illustration for the whole session.
    Paint {
        /// Scene description supplied by the simulation.
        prompt: String,
    },
}

impl ArtCmd {
    /// Returns the scheduler policy for this command.
    pub fn submit_policy(&self) -> SubmitPolicy {
        SubmitPolicy::BestEffort
    }
}

/// Background-art report variants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArtRep {
    /// The illustration resolved.
    Ready {
        /// Image to decorate every step with.
        image: ImageHandle,
    },
    /// Generation failed; the presentation falls back to a neutral background.
    Failed {
        /// Human-readable failure reason for logs.
        reason: String,
    },
}

/// Command directed at the narration collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NarrationCmd {
    /// Synthesize and play the given text.
    Speak {
        /// Display text to read aloud.
        text: String,
    },
    /// Playback of the identified utterance reached its end; release its clip.
    Release {
        /// Utterance identifier from [`NarrationRep::Started`].
        utterance: u64,
    },
    /// Abort any active playback and release its clip.
    Stop,
}

impl NarrationCmd {
    /// Returns the scheduler policy for this command.
    pub fn submit_policy(&self) -> SubmitPolicy {
        match self {
            NarrationCmd::Speak { .. } => SubmitPolicy::BestEffort,
            NarrationCmd::Release { .. } | NarrationCmd::Stop => SubmitPolicy::Must,
        }
    }
}

/// Narration report variants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NarrationRep {
    /// Playback began.
    Started {
        /// Identifier used to release this utterance.
        utterance: u64,
        /// Length of the decoded clip.
        duration_ms: u64,
    },
    /// Playback ended and the clip was released.
    Finished {
        /// Utterance that ended.
        utterance: u64,
    },
    /// Playback was aborted by [`NarrationCmd::Stop`].
    Stopped {
        /// Utterance that was aborted.
        utterance: u64,
    },
    /// Synthesis or decoding failed; nothing plays.
    Failed {
        /// Human-readable failure reason for logs.
        reason: String,
    },
}

/// Command directed at the host's haptic actuator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HapticCmd {
    /// Vibrate once.
    Pulse {
        /// Pulse length in milliseconds.
        duration_ms: u32,
    },
}

impl HapticCmd {
    /// Returns the scheduler policy for this command.
    pub fn submit_policy(&self) -> SubmitPolicy {
        SubmitPolicy::BestEffort
    }
}

/// Haptics report variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HapticRep {
    /// The pulse was delivered.
    Pulsed {
        /// Pulse length in milliseconds.
        duration_ms: u32,
    },
    /// The host has no vibration capability.
    Unsupported,
}

/// Handle to the background-art service implementation.
pub type ArtServiceHandle = Arc<dyn Service<Cmd = ArtCmd, Rep = ArtRep> + Send + Sync>;
/// Handle to the narration service implementation.
pub type NarrationServiceHandle =
    Arc<dyn Service<Cmd = NarrationCmd, Rep = NarrationRep> + Send + Sync>;
/// Handle to the haptics service implementation.
pub type HapticServiceHandle = Arc<dyn Service<Cmd = HapticCmd, Rep = HapticRep> + Send + Sync>;
