use serde::{Deserialize, Serialize};

/// When inspecting a trap raises the alert (haptic pulse plus shake).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPolicy {
    /// Every tap on a trap alerts, including repeats.
    #[default]
    EveryTap,
    /// Only the first inspection of a trap on a step alerts.
    FirstDiscovery,
}

/// Engine tunables. Missing keys in a config file fall back to the defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Length of the step-advance window.
    pub transition_delay_ms: u64,
    /// How long the shake cue stays on after an alert.
    pub alert_clear_ms: u64,
    /// Haptic pulse length per alert.
    pub haptic_pulse_ms: u32,
    pub alert_policy: AlertPolicy,
    /// Read each step's intro aloud on entry.
    pub narrate_intros: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            transition_delay_ms: 800,
            alert_clear_ms: 500,
            haptic_pulse_ms: 200,
            alert_policy: AlertPolicy::EveryTap,
            narrate_intros: false,
        }
    }
}
