use crate::model::SimulationModel;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Overall threat tag attached to a judgment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    Safe,
    Warning,
    Danger,
}

/// Severity of a single deceptive-pattern finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
}

/// Scenario family the simulated message belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    Bank,
    Package,
    Lottery,
    Family,
    Generic,
}

/// A named deceptive pattern spotted in the analysed message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub id: String,
    /// Pattern name, e.g. "urgency" or "lookalike domain".
    pub pattern: String,
    pub reason: String,
    pub location: Option<String>,
    pub severity: Severity,
}

/// Classification returned by the gateway next to the simulation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Judgment {
    pub is_scam: bool,
    pub threat_level: ThreatLevel,
    pub summary: String,
    pub findings: Vec<Finding>,
    pub scenario: ScenarioKind,
}

impl Judgment {
    /// Findings flagged with [`Severity::High`].
    pub fn high_severity(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|finding| finding.severity == Severity::High)
    }
}

/// Result of one completed analysis call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub judgment: Judgment,
    /// Shared with the engine; never mutated after decoding.
    pub simulation: Arc<SimulationModel>,
}

impl AnalysisReport {
    pub fn is_scam(&self) -> bool {
        self.judgment.is_scam
    }
}
