//! Pure intent reducer over the sandbox engine.

use crate::engine::SandboxEngine;
use crate::types::{FollowUps, Intent};

/// Trait for handling intents and producing follow-up work.
pub trait IntentReducer {
    /// Reduces an intent into collaborator commands, timers, and cues.
    fn reduce_intent(&mut self, intent: Intent) -> FollowUps;
}

impl IntentReducer for SandboxEngine {
    fn reduce_intent(&mut self, intent: Intent) -> FollowUps {
        match intent {
            Intent::Start => self.start(),
            Intent::Inspect(element) => self.inspect_element(element),
            Intent::Advance => self.advance(),
            Intent::Close => self.close(),
            Intent::SpeakAssistant => self.speak_assistant(),
            Intent::TransitionElapsed => self.complete_transition(),
            Intent::AlertElapsed { alert } => self.clear_alert(alert),
            Intent::NarrationElapsed { utterance } => {
                if self.is_terminal() {
                    return FollowUps::new();
                }
                self.narration_elapsed(utterance)
            }
        }
    }
}
