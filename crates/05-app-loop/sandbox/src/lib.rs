//! Sandbox simulation engine.
//!
//! The `sandbox` crate drives one "spot the trap" session over an immutable
//! [`SimulationModel`]. It stays pure: the engine never talks to collaborators
//! or clocks directly. Every transition returns [`FollowUps`] (collaborator
//! commands, timers to schedule, presentation cues) that the session scheduler
//! routes, and collaborator reports come back through [`ReportReducer`].

/// Engine state container and transitions.
pub mod engine;
/// Tunables for timers, alerts, and narration.
pub mod options;
/// Per-step discovery sets and completion checks.
pub mod progress;
/// Pure intent reducer over the engine.
pub mod reduce_intent;
/// Pure report reducer over the engine.
pub mod reduce_report;
/// Intent, report, command, and cue types.
pub mod types;
/// Read model exposed to the presentation layer.
pub mod view;

pub use crate::engine::{Background, NarrationState, SandboxEngine, SessionPhase};
pub use crate::options::{AlertPolicy, EngineOptions};
pub use crate::progress::ProgressTracker;
pub use crate::reduce_intent::IntentReducer;
pub use crate::reduce_report::ReportReducer;
pub use crate::types::{
    ArtCmd, ArtRep, Command, Cue, FollowUps, HapticCmd, HapticRep, ImageHandle, Intent,
    IntentPriority, NarrationCmd, NarrationRep, Report, ScheduledIntent, SubmitOutcome,
    SubmitPolicy,
};
pub use crate::view::{Revealed, SandboxMode, SandboxView, COMPLETE_MESSAGE};
pub use simulation::{ElementId, SimulationModel};
