//! Gateway response decoding.
//!
//! The analysis model answers with schema-constrained JSON. Nothing downstream
//! trusts that shape: the raw document is deserialized into the private wire
//! structs below, checked, and only then converted into the model types.

use crate::error::DecodeError;
use crate::judgment::{AnalysisReport, Finding, Judgment, ScenarioKind, Severity, ThreatLevel};
use crate::model::{FieldKind, SimulationField, SimulationModel, SimulationStep, Verdict};
use log::{debug, warn};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    is_scam: bool,
    threat_level: ThreatLevel,
    summary: String,
    traps: Vec<WireTrap>,
    simulation_type: ScenarioKind,
    simulation: WireSimulation,
}

#[derive(Deserialize)]
struct WireTrap {
    id: String,
    #[serde(rename = "type")]
    pattern: String,
    reason: String,
    #[serde(default)]
    location: Option<String>,
    severity: Severity,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSimulation {
    brand_name: String,
    visual_vibe_prompt: String,
    steps: Vec<WireStep>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireStep {
    id: String,
    title: String,
    subtitle: String,
    site_url: String,
    #[serde(default)]
    url_is_trap: bool,
    #[serde(default)]
    url_dori_warning: Option<String>,
    #[serde(default)]
    url_safety_reason: Option<String>,
    header_color: String,
    dori_intro: String,
    fields: Vec<WireField>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireField {
    id: String,
    label: String,
    #[serde(default)]
    placeholder: Option<String>,
    #[serde(rename = "type")]
    kind: WireFieldKind,
    is_trap: bool,
    #[serde(default)]
    dori_warning: Option<String>,
    #[serde(default)]
    safety_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum WireFieldKind {
    Text,
    Password,
    Button,
    Info,
}

impl From<WireFieldKind> for FieldKind {
    fn from(kind: WireFieldKind) -> Self {
        match kind {
            WireFieldKind::Text => FieldKind::Text,
            WireFieldKind::Password => FieldKind::Password,
            WireFieldKind::Button => FieldKind::Button,
            WireFieldKind::Info => FieldKind::Info,
        }
    }
}

/// Decodes and validates a raw gateway response.
///
/// Rejects documents with missing keys, unknown enum spellings, no steps,
/// empty ids, or duplicate step/field ids. Blank explanation strings are
/// normalised to `None`.
pub fn decode_response(raw: &str) -> Result<AnalysisReport, DecodeError> {
    let wire: WireResponse = serde_json::from_str(raw)?;
    let simulation = validate_simulation(wire.simulation)?;

    let findings = wire
        .traps
        .into_iter()
        .map(|trap| Finding {
            id: trap.id,
            pattern: trap.pattern,
            reason: trap.reason,
            location: non_blank(trap.location),
            severity: trap.severity,
        })
        .collect();

    let judgment = Judgment {
        is_scam: wire.is_scam,
        threat_level: wire.threat_level,
        summary: wire.summary,
        findings,
        scenario: wire.simulation_type,
    };

    if !judgment.is_scam && simulation.steps.iter().any(has_traps) {
        warn!("safe judgment carries trap elements; keeping them as sent");
    }

    debug!(
        "decoded analysis: scam={} threat={:?} steps={}",
        judgment.is_scam,
        judgment.threat_level,
        simulation.steps.len()
    );

    Ok(AnalysisReport {
        judgment,
        simulation: Arc::new(simulation),
    })
}

fn validate_simulation(wire: WireSimulation) -> Result<SimulationModel, DecodeError> {
    if wire.steps.is_empty() {
        return Err(DecodeError::NoSteps);
    }

    let mut step_ids = HashSet::with_capacity(wire.steps.len());
    let mut steps = Vec::with_capacity(wire.steps.len());
    for (index, step) in wire.steps.into_iter().enumerate() {
        if step.id.trim().is_empty() {
            return Err(DecodeError::empty_id(format!("steps[{index}]")));
        }
        if !step_ids.insert(step.id.clone()) {
            return Err(DecodeError::DuplicateStep(step.id));
        }
        steps.push(validate_step(step)?);
    }

    Ok(SimulationModel {
        subject_name: wire.brand_name,
        art_prompt: wire.visual_vibe_prompt,
        steps,
    })
}

fn validate_step(wire: WireStep) -> Result<SimulationStep, DecodeError> {
    let mut field_ids = HashSet::with_capacity(wire.fields.len());
    let mut fields = Vec::with_capacity(wire.fields.len());
    for (index, field) in wire.fields.into_iter().enumerate() {
        if field.id.trim().is_empty() {
            return Err(DecodeError::empty_id(format!(
                "steps[{}].fields[{index}]",
                wire.id
            )));
        }
        if !field_ids.insert(field.id.clone()) {
            return Err(DecodeError::DuplicateField {
                step: wire.id,
                field: field.id,
            });
        }
        fields.push(SimulationField {
            id: field.id,
            label: field.label,
            placeholder: non_blank(field.placeholder),
            kind: field.kind.into(),
            verdict: Verdict::select(
                field.is_trap,
                non_blank(field.dori_warning),
                non_blank(field.safety_reason),
            ),
        });
    }

    Ok(SimulationStep {
        id: wire.id,
        title: wire.title,
        subtitle: wire.subtitle,
        display_url: wire.site_url,
        url_verdict: Verdict::select(
            wire.url_is_trap,
            non_blank(wire.url_dori_warning),
            non_blank(wire.url_safety_reason),
        ),
        header_theme: wire.header_color,
        fields,
        intro_narration: wire.dori_intro,
    })
}

fn has_traps(step: &SimulationStep) -> bool {
    step.url_is_trap() || step.fields.iter().any(SimulationField::is_trap)
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|value| !value.trim().is_empty())
}
