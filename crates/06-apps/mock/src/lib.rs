//! Collaborator hub builders with scripted in-memory backends.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hub::{CollaboratorsHub, CollaboratorsHubBuilder};
use services_art::{ArtService, PaintError, Painter, Painting};
use services_haptics::HapticService;
use services_narration::{NarrationService, SpeechSynth, SynthError, SPEECH_SAMPLE_RATE_HZ};
use std::sync::Arc;

/// Smallest valid PNG signature; enough for a data URL.
pub const PNG_STUB: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// How the scripted painter answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtScript {
    Paints,
    Fails,
}

/// How the scripted speech backend answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeechScript {
    /// Silence of the given length for every request.
    Speaks { clip_ms: u64 },
    Fails,
}

/// Behaviour of every scripted collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockScript {
    pub art: ArtScript,
    pub speech: SpeechScript,
    pub haptics_supported: bool,
}

impl Default for MockScript {
    fn default() -> Self {
        Self {
            art: ArtScript::Paints,
            speech: SpeechScript::Speaks { clip_ms: 1_000 },
            haptics_supported: true,
        }
    }
}

/// Hub plus the concrete services behind it, for inspection in tests.
#[derive(Clone)]
pub struct MockCollaborators {
    pub hub: CollaboratorsHub,
    pub art: Arc<ArtService>,
    pub narration: Arc<NarrationService>,
    pub haptics: Arc<HapticService>,
}

/// Creates a mock hub where every collaborator succeeds.
pub fn make_hub() -> CollaboratorsHub {
    make_collaborators(MockScript::default()).hub
}

/// Creates scripted collaborators and the hub routing to them.
pub fn make_collaborators(script: MockScript) -> MockCollaborators {
    make_collaborators_with_capacity(script, 16)
}

/// Like [`make_collaborators`] with an explicit report queue capacity.
pub fn make_collaborators_with_capacity(script: MockScript, capacity: usize) -> MockCollaborators {
    let art = Arc::new(ArtService::new(painter(script.art), capacity));
    let narration = Arc::new(NarrationService::new(synth(script.speech), capacity));
    let haptics = Arc::new(HapticService::new(script.haptics_supported, capacity));
    let hub = CollaboratorsHubBuilder::new()
        .art(art.clone())
        .narration(narration.clone())
        .haptics(haptics.clone())
        .build()
        .expect("mock hub build");
    MockCollaborators {
        hub,
        art,
        narration,
        haptics,
    }
}

/// Base64 PCM16 silence lasting `clip_ms`.
pub fn silence_base64(clip_ms: u64) -> String {
    let samples = clip_ms * u64::from(SPEECH_SAMPLE_RATE_HZ) / 1_000;
    let bytes = vec![0u8; usize::try_from(samples * 2).unwrap_or(0)];
    STANDARD.encode(bytes)
}

fn painter(script: ArtScript) -> Arc<dyn Painter> {
    match script {
        ArtScript::Paints => Arc::new(|_prompt: &str| -> Result<Painting, PaintError> {
            Ok(Painting::png(PNG_STUB))
        }),
        ArtScript::Fails => Arc::new(|_prompt: &str| -> Result<Painting, PaintError> {
            Err(PaintError::Unavailable("scripted failure".to_owned()))
        }),
    }
}

fn synth(script: SpeechScript) -> Arc<dyn SpeechSynth> {
    match script {
        SpeechScript::Speaks { clip_ms } => {
            let encoded = silence_base64(clip_ms);
            Arc::new(move |_text: &str| -> Result<Option<String>, SynthError> {
                Ok(Some(encoded.clone()))
            })
        }
        SpeechScript::Fails => Arc::new(|_text: &str| -> Result<Option<String>, SynthError> {
            Err(SynthError::Unavailable("scripted failure".to_owned()))
        }),
    }
}
