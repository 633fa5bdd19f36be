//! Session state container and its transitions.

use crate::options::{AlertPolicy, EngineOptions};
use crate::progress::ProgressTracker;
use crate::types::{
    ArtCmd, Command, Cue, FollowUps, HapticCmd, ImageHandle, Intent, NarrationCmd,
};
use crate::view::{self, SandboxView};
use log::{debug, trace, warn};
use serde::Serialize;
use simulation::{ElementId, SimulationModel, SimulationStep};
use std::sync::Arc;

/// Where the session is in its step walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SessionPhase {
    /// The learner is working on step `index`.
    AtStep { index: usize },
    /// Step `from` was completed and the advance window is open.
    Transitioning { from: usize },
    /// The last step was completed.
    Finished,
    /// The learner left early.
    Closed,
}

impl SessionPhase {
    /// `Finished` and `Closed` accept no further intents.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Finished | SessionPhase::Closed)
    }
}

/// State of the single background illustration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Background {
    NotRequested,
    Loading,
    Ready { image: ImageHandle },
    /// Generation failed or was never possible; a neutral background is shown.
    Fallback,
}

/// Narration playback as seen by the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NarrationState {
    #[default]
    Idle,
    Playing { utterance: u64 },
}

/// One learner session over an immutable simulation.
///
/// The engine never reaches out to collaborators or clocks: every operation
/// returns [`FollowUps`] for the scheduler to route.
#[derive(Clone, Debug)]
pub struct SandboxEngine {
    model: Arc<SimulationModel>,
    is_scam: bool,
    options: EngineOptions,
    phase: SessionPhase,
    /// Last step shown; kept after the session ends.
    current: usize,
    progress: ProgressTracker,
    started: bool,
    background: Background,
    shaking: bool,
    alert_seq: u64,
    narration: NarrationState,
    haptics_unsupported: bool,
}

impl SandboxEngine {
    /// Creates an engine positioned on the first step.
    pub fn new(model: Arc<SimulationModel>, is_scam: bool, options: EngineOptions) -> Self {
        let phase = if model.steps.is_empty() {
            warn!("simulation has no steps; session starts finished");
            SessionPhase::Finished
        } else {
            SessionPhase::AtStep { index: 0 }
        };
        Self {
            model,
            is_scam,
            options,
            phase,
            current: 0,
            progress: ProgressTracker::new(),
            started: false,
            background: Background::NotRequested,
            shaking: false,
            alert_seq: 0,
            narration: NarrationState::Idle,
            haptics_unsupported: false,
        }
    }

    /// Requests the background illustration and announces the first step.
    /// Later calls do nothing.
    pub fn start(&mut self) -> FollowUps {
        let mut follow_ups = FollowUps::new();
        if self.started || self.phase.is_terminal() {
            return follow_ups;
        }
        self.started = true;

        let prompt = self.model.art_prompt.trim();
        if prompt.is_empty() {
            debug!("no art prompt; using fallback background");
            self.background = Background::Fallback;
        } else {
            self.background = Background::Loading;
            follow_ups.push_command(Command::Art(ArtCmd::Paint {
                prompt: prompt.to_owned(),
            }));
        }

        follow_ups.push_cue(Cue::StepEntered { index: self.current });
        if self.options.narrate_intros {
            self.narrate_intro(&mut follow_ups);
        }
        follow_ups
    }

    /// Records an inspection on the current step and raises the alert for traps.
    pub fn inspect_element(&mut self, element: ElementId) -> FollowUps {
        let mut follow_ups = FollowUps::new();
        let SessionPhase::AtStep { index } = self.phase else {
            trace!("inspect {element} ignored in {:?}", self.phase);
            return follow_ups;
        };
        let model = Arc::clone(&self.model);
        let Some(step) = model.step(index) else {
            return follow_ups;
        };

        let is_trap = step.is_trap(&element);
        let newly = self.progress.mark_inspected(&step.id, element);
        let alert = match self.options.alert_policy {
            AlertPolicy::EveryTap => is_trap,
            AlertPolicy::FirstDiscovery => is_trap && newly,
        };
        if alert {
            self.raise_alert(&mut follow_ups);
        }
        follow_ups
    }

    /// Moves past a completed step. Incomplete steps make this a no-op.
    pub fn advance(&mut self) -> FollowUps {
        let mut follow_ups = FollowUps::new();
        let SessionPhase::AtStep { index } = self.phase else {
            return follow_ups;
        };
        if !self.is_current_step_complete() {
            trace!("advance ignored: step {index} incomplete");
            return follow_ups;
        }

        if index >= self.model.last_index() {
            debug!("session finished after {} steps", index + 1);
            self.phase = SessionPhase::Finished;
            self.end_session(&mut follow_ups);
            follow_ups.push_cue(Cue::SessionFinished);
        } else {
            self.phase = SessionPhase::Transitioning { from: index };
            follow_ups.push_timer(self.options.transition_delay_ms, Intent::TransitionElapsed);
        }
        follow_ups
    }

    /// Ends the advance window by entering the next step. Stale expirations
    /// (after close or a second delivery) are ignored.
    pub fn complete_transition(&mut self) -> FollowUps {
        let mut follow_ups = FollowUps::new();
        let SessionPhase::Transitioning { from } = self.phase else {
            trace!("stale transition expiry in {:?}", self.phase);
            return follow_ups;
        };
        self.current = from + 1;
        self.phase = SessionPhase::AtStep {
            index: self.current,
        };
        follow_ups.push_cue(Cue::ScrollToTop);
        follow_ups.push_cue(Cue::StepEntered {
            index: self.current,
        });
        if self.options.narrate_intros {
            self.narrate_intro(&mut follow_ups);
        }
        follow_ups
    }

    /// Leaves the session early from any non-terminal phase.
    pub fn close(&mut self) -> FollowUps {
        let mut follow_ups = FollowUps::new();
        if self.phase.is_terminal() {
            return follow_ups;
        }
        debug!("session closed in {:?}", self.phase);
        self.phase = SessionPhase::Closed;
        self.end_session(&mut follow_ups);
        follow_ups.push_cue(Cue::SessionClosed);
        follow_ups
    }

    /// Reads the current assistant message aloud unless narration is busy.
    pub fn speak_assistant(&mut self) -> FollowUps {
        let mut follow_ups = FollowUps::new();
        if self.phase.is_terminal() {
            return follow_ups;
        }
        let text = self.assistant_message();
        self.request_speech(text, &mut follow_ups);
        follow_ups
    }

    /// Clears the shake cue unless a newer alert superseded `alert`.
    pub fn clear_alert(&mut self, alert: u64) -> FollowUps {
        let mut follow_ups = FollowUps::new();
        if alert == self.alert_seq && self.shaking {
            self.shaking = false;
            follow_ups.push_cue(Cue::Shake { on: false });
        }
        follow_ups
    }

    /// The clip of `utterance` reached its end; releases it.
    pub fn narration_elapsed(&mut self, utterance: u64) -> FollowUps {
        let mut follow_ups = FollowUps::new();
        if self.narration == (NarrationState::Playing { utterance }) {
            follow_ups.push_command(Command::Narration(NarrationCmd::Release { utterance }));
        }
        follow_ups
    }

    pub fn model(&self) -> &Arc<SimulationModel> {
        &self.model
    }

    pub fn is_scam(&self) -> bool {
        self.is_scam
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Index of the step on screen; during a transition, the step being left.
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_step(&self) -> Option<&SimulationStep> {
        self.model.step(self.current)
    }

    pub fn step_count(&self) -> usize {
        self.model.step_count()
    }

    pub fn is_final_step(&self) -> bool {
        self.current >= self.model.last_index()
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    /// Elements inspected on the current step, in discovery order.
    pub fn inspected(&self) -> &[ElementId] {
        match self.current_step() {
            Some(step) => self.progress.inspected(&step.id),
            None => &[],
        }
    }

    /// Elements the current step needs before it counts as complete.
    pub fn required_count(&self) -> usize {
        self.current_step()
            .map_or(0, |step| step.required_count(self.is_scam))
    }

    pub fn is_current_step_complete(&self) -> bool {
        self.current_step().is_some_and(|step| {
            self.progress
                .is_step_complete(&step.id, step.required_count(self.is_scam))
        })
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn is_shaking(&self) -> bool {
        self.shaking
    }

    pub fn narration(&self) -> NarrationState {
        self.narration
    }

    /// False once the host reported it cannot vibrate.
    pub fn haptics_supported(&self) -> bool {
        !self.haptics_unsupported
    }

    /// Message shown (and spoken on request) by the assistant for the current step.
    pub fn assistant_message(&self) -> String {
        match self.current_step() {
            Some(step) => view::assistant_message(
                step,
                self.inspected().len(),
                self.required_count(),
                self.is_current_step_complete(),
            ),
            None => String::new(),
        }
    }

    /// Read model for the presentation layer.
    pub fn view(&self) -> SandboxView<'_> {
        SandboxView::of(self)
    }

    pub(crate) fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    pub(crate) fn set_narration(&mut self, narration: NarrationState) {
        self.narration = narration;
    }

    pub(crate) fn mark_haptics_unsupported(&mut self) -> bool {
        let first = !self.haptics_unsupported;
        self.haptics_unsupported = true;
        first
    }

    fn raise_alert(&mut self, follow_ups: &mut FollowUps) {
        self.alert_seq += 1;
        self.shaking = true;
        if !self.haptics_unsupported {
            follow_ups.push_command(Command::Haptics(HapticCmd::Pulse {
                duration_ms: self.options.haptic_pulse_ms,
            }));
        }
        follow_ups.push_cue(Cue::Shake { on: true });
        follow_ups.push_timer(
            self.options.alert_clear_ms,
            Intent::AlertElapsed {
                alert: self.alert_seq,
            },
        );
    }

    fn narrate_intro(&mut self, follow_ups: &mut FollowUps) {
        let Some(intro) = self.current_step().map(|step| step.intro_narration.clone()) else {
            return;
        };
        self.request_speech(intro, follow_ups);
    }

    fn request_speech(&self, text: String, follow_ups: &mut FollowUps) {
        if text.trim().is_empty() {
            return;
        }
        if let NarrationState::Playing { utterance } = self.narration {
            debug!("narration busy with utterance {utterance}; request dropped");
            return;
        }
        follow_ups.push_command(Command::Narration(NarrationCmd::Speak { text }));
    }

    /// Teardown shared by `Finished` and `Closed`: stop any audio, drop the shake.
    fn end_session(&mut self, follow_ups: &mut FollowUps) {
        follow_ups.push_command(Command::Narration(NarrationCmd::Stop));
        if self.shaking {
            self.shaking = false;
            follow_ups.push_cue(Cue::Shake { on: false });
        }
    }
}
