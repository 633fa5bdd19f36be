use crate::engine::{Background, NarrationState, SandboxEngine, SessionPhase};
use serde::Serialize;
use simulation::{ElementId, SimulationStep};

/// Shown once every required element of a step was inspected.
pub const COMPLETE_MESSAGE: &str =
    "Incredible! You've verified every detail on this page. Move to the next step when you're ready.";

/// Exercise flavour, selected by the judgment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SandboxMode {
    /// Scam judgment: hunt the deceptive elements.
    TrapFinder,
    /// Safe judgment: confirm every safety signal.
    SafetyCheck,
}

impl SandboxMode {
    pub fn from_judgment(is_scam: bool) -> Self {
        if is_scam {
            SandboxMode::TrapFinder
        } else {
            SandboxMode::SafetyCheck
        }
    }

    /// Header title.
    pub fn title(self) -> &'static str {
        match self {
            SandboxMode::TrapFinder => "Trap Finder",
            SandboxMode::SafetyCheck => "Safety Check",
        }
    }

    /// Label of the progress meter.
    pub fn tally_label(self) -> &'static str {
        match self {
            SandboxMode::TrapFinder => "Scams Spotted",
            SandboxMode::SafetyCheck => "Safety Verified",
        }
    }
}

/// Explanation revealed by inspecting one element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Revealed<'a> {
    pub element: &'a ElementId,
    /// Field label, or the displayed address for the address bar.
    pub label: &'a str,
    pub is_trap: bool,
    /// Warning for traps, safety reason otherwise.
    pub explanation: Option<&'a str>,
}

/// Snapshot of everything the presentation layer renders.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SandboxView<'a> {
    pub phase: SessionPhase,
    pub mode: SandboxMode,
    pub subject_name: &'a str,
    pub step_index: usize,
    pub step_count: usize,
    pub step: Option<&'a SimulationStep>,
    pub inspected: &'a [ElementId],
    pub required_count: usize,
    pub complete: bool,
    pub final_step: bool,
    /// Whether the advance affordance should be enabled.
    pub can_advance: bool,
    pub revealed: Vec<Revealed<'a>>,
    pub assistant_message: String,
    pub background: &'a Background,
    pub shaking: bool,
    pub narration: NarrationState,
}

impl<'a> SandboxView<'a> {
    pub(crate) fn of(engine: &'a SandboxEngine) -> Self {
        let step = engine.current_step();
        let inspected = engine.inspected();
        let complete = engine.is_current_step_complete();
        let revealed = step.map_or_else(Vec::new, |step| reveal(step, inspected));
        Self {
            phase: engine.phase(),
            mode: SandboxMode::from_judgment(engine.is_scam()),
            subject_name: &engine.model().subject_name,
            step_index: engine.current_index(),
            step_count: engine.step_count(),
            step,
            inspected,
            required_count: engine.required_count(),
            complete,
            final_step: engine.is_final_step(),
            can_advance: complete && matches!(engine.phase(), SessionPhase::AtStep { .. }),
            revealed,
            assistant_message: engine.assistant_message(),
            background: engine.background(),
            shaking: engine.is_shaking(),
            narration: engine.narration(),
        }
    }

    /// `inspected/required` as shown by the progress meter.
    pub fn tally(&self) -> (usize, usize) {
        (self.inspected.len(), self.required_count)
    }
}

fn reveal<'a>(step: &'a SimulationStep, inspected: &'a [ElementId]) -> Vec<Revealed<'a>> {
    inspected
        .iter()
        .filter_map(|element| {
            let verdict = step.verdict_of(element)?;
            let label = match element {
                ElementId::Url => step.display_url.as_str(),
                ElementId::Field(id) => step
                    .field(id)
                    .map_or(id.as_str(), |field| field.label.as_str()),
            };
            Some(Revealed {
                element,
                label,
                is_trap: verdict.is_trap(),
                explanation: verdict.explanation(),
            })
        })
        .collect()
}

pub(crate) fn assistant_message(
    step: &SimulationStep,
    inspected: usize,
    required: usize,
    complete: bool,
) -> String {
    if inspected == 0 {
        step.intro_narration.clone()
    } else if complete {
        COMPLETE_MESSAGE.to_owned()
    } else {
        format!(
            "Great progress! You've inspected {inspected} out of {required} details. Can you find the rest?"
        )
    }
}
