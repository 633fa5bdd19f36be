//! Data contracts shared by the analysis gateway, the sandbox engine, and the
//! presentation layer.
//!
//! The crate stays free of any runtime behaviour. It defines the validated
//! simulation model, the judgment returned alongside it, the input guard that
//! runs before any gateway call, and the strict decoder for the gateway's JSON
//! response.

/// Errors raised while validating inputs and decoding gateway responses.
pub mod error;
/// Learner-submitted input and its local guard.
pub mod input;
/// Judgment fields returned next to the simulation.
pub mod judgment;
/// Steps, fields, and verdicts that make up a simulation.
pub mod model;
/// Wire shapes of the gateway response and their validation.
pub mod wire;

pub use crate::error::{DecodeError, InputError};
pub use crate::input::AnalysisInput;
pub use crate::judgment::{AnalysisReport, Finding, Judgment, ScenarioKind, Severity, ThreatLevel};
pub use crate::model::{
    ElementId, FieldKind, SimulationField, SimulationModel, SimulationStep, Verdict,
    URL_ELEMENT_ID,
};
pub use crate::wire::decode_response;
