//! Intent, report, command, and cue types shared by the engine and the
//! session scheduler.

use serde::Serialize;
use simulation::ElementId;
use smallvec::SmallVec;

pub use service_abi::{
    ArtCmd, ArtRep, HapticCmd, HapticRep, ImageHandle, NarrationCmd, NarrationRep, SubmitOutcome,
    SubmitPolicy,
};

/// Priority level for intent scheduling (P0 is highest).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntentPriority {
    /// Learner input and session teardown.
    P0,
    /// Timer expiries.
    P1,
    /// Narration requests.
    P2,
}

impl IntentPriority {
    /// Queue index, ordered P0 ≻ P1 ≻ P2.
    pub fn index(self) -> usize {
        match self {
            IntentPriority::P0 => 0,
            IntentPriority::P1 => 1,
            IntentPriority::P2 => 2,
        }
    }
}

/// Intent emitted by the presentation layer or by an expired timer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Begin the session: request the background art and enter step 0.
    Start,
    /// The learner tapped an element of the current step.
    Inspect(ElementId),
    /// The learner pressed "next" (or "finish" on the last step).
    Advance,
    /// The learner exited early.
    Close,
    /// The learner asked the assistant to read its message aloud.
    SpeakAssistant,
    /// The step-advance window ended.
    TransitionElapsed,
    /// The shake cue of the identified alert should clear.
    AlertElapsed { alert: u64 },
    /// The identified narration clip reached its end.
    NarrationElapsed { utterance: u64 },
}

impl Intent {
    /// Returns the scheduler priority for this intent.
    pub fn priority(&self) -> IntentPriority {
        match self {
            Intent::Start
            | Intent::Inspect(_)
            | Intent::Advance
            | Intent::Close => IntentPriority::P0,
            Intent::TransitionElapsed
            | Intent::AlertElapsed { .. }
            | Intent::NarrationElapsed { .. } => IntentPriority::P1,
            Intent::SpeakAssistant => IntentPriority::P2,
        }
    }
}

/// Collaborator command produced by the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Background-art collaborator.
    Art(ArtCmd),
    /// Narration collaborator.
    Narration(NarrationCmd),
    /// Host haptics.
    Haptics(HapticCmd),
}

impl Command {
    /// Default submission policy for this command.
    pub fn default_policy(&self) -> SubmitPolicy {
        match self {
            Command::Art(cmd) => cmd.submit_policy(),
            Command::Narration(cmd) => cmd.submit_policy(),
            Command::Haptics(cmd) => cmd.submit_policy(),
        }
    }
}

/// Report emitted by a collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Report {
    Art(ArtRep),
    Narration(NarrationRep),
    Haptics(HapticRep),
}

/// Presentation-only signal; never part of the step state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "cue", rename_all = "snake_case")]
pub enum Cue {
    /// A step became current.
    StepEntered { index: usize },
    /// Reset the step viewport to the top.
    ScrollToTop,
    /// Turn the alert shake on or off.
    Shake { on: bool },
    /// The learner completed the last step.
    SessionFinished,
    /// The learner exited before finishing.
    SessionClosed,
}

/// Intent to feed back into the engine after a delay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledIntent {
    pub delay_ms: u64,
    pub intent: Intent,
}

/// Everything produced by reducing one intent or report.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FollowUps {
    /// Commands to submit to collaborators right away.
    pub commands: SmallVec<[Command; 4]>,
    /// Intents to enqueue once their delay elapsed.
    pub timers: SmallVec<[ScheduledIntent; 2]>,
    /// Cues for the presentation layer.
    pub cues: SmallVec<[Cue; 4]>,
}

impl FollowUps {
    /// Creates an empty set of follow-ups.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.timers.is_empty() && self.cues.is_empty()
    }

    pub fn push_command(&mut self, cmd: Command) {
        self.commands.push(cmd);
    }

    pub fn push_timer(&mut self, delay_ms: u64, intent: Intent) {
        self.timers.push(ScheduledIntent { delay_ms, intent });
    }

    pub fn push_cue(&mut self, cue: Cue) {
        self.cues.push(cue);
    }
}
