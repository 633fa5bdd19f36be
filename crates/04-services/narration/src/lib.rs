//! Narration service: reads assistant text aloud through a speech backend.
//!
//! One service instance backs one narration widget. At most one playback is
//! active at a time; a `Speak` arriving while a clip is playing is dropped,
//! never queued. Clips are owned by the active playback and released on
//! `Release` or `Stop`.

mod clip;

pub use clip::{NarrationClip, SPEECH_SAMPLE_RATE_HZ};

use log::{debug, warn};
use parking_lot::Mutex;
use service_abi::{
    NarrationCmd, NarrationRep, NarrationServiceHandle, Service, SubmitOutcome,
};
use services_common::{drain_queue, try_submit_queue, LocalQueue};
use smallvec::{smallvec, SmallVec};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

const DEFAULT_CAPACITY: usize = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SynthError {
    #[error("speech backend unavailable: {0}")]
    Unavailable(String),

    #[error("speech payload could not be decoded: {0}")]
    Decode(String),
}

/// Text-to-speech backend returning base64 PCM16 mono audio at 24 kHz.
pub trait SpeechSynth: Send + Sync {
    /// `Ok(None)` means the backend answered without audio.
    fn synthesize(&self, text: &str) -> Result<Option<String>, SynthError>;
}

impl<F> SpeechSynth for F
where
    F: Fn(&str) -> Result<Option<String>, SynthError> + Send + Sync,
{
    fn synthesize(&self, text: &str) -> Result<Option<String>, SynthError> {
        self(text)
    }
}

struct Playback {
    utterance: u64,
    clip: NarrationClip,
}

/// Queue-backed narration service wrapping a [`SpeechSynth`].
pub struct NarrationService {
    reports: LocalQueue<NarrationRep>,
    capacity: usize,
    synth: Arc<dyn SpeechSynth>,
    active: Mutex<Option<Playback>>,
    next_utterance: AtomicU64,
}

impl NarrationService {
    /// Creates a new narration service handle with the specified report capacity.
    pub fn new_handle(synth: Arc<dyn SpeechSynth>, capacity: usize) -> NarrationServiceHandle {
        Arc::new(Self::new(synth, capacity))
    }

    pub fn new(synth: Arc<dyn SpeechSynth>, capacity: usize) -> Self {
        Self {
            reports: LocalQueue::with_capacity(capacity),
            capacity,
            synth,
            active: Mutex::new(None),
            next_utterance: AtomicU64::new(1),
        }
    }

    /// Identifier of the playing utterance, if any.
    pub fn active_utterance(&self) -> Option<u64> {
        self.active.lock().as_ref().map(|playback| playback.utterance)
    }

    /// Clip of the playing utterance, for the host's audio output.
    pub fn active_clip(&self) -> Option<NarrationClip> {
        self.active.lock().as_ref().map(|playback| playback.clip.clone())
    }

    /// The audio output went away: drops the playing clip and refuses every
    /// later command with `Closed`.
    pub fn shutdown(&self) {
        self.reports.close();
        if let Some(playback) = self.active.lock().take() {
            debug!("narration::shutdown dropped utterance={}", playback.utterance);
        }
    }

    fn speak(&self, text: &str) -> NarrationRep {
        let clip = match self.synth.synthesize(text) {
            Ok(Some(encoded)) => NarrationClip::from_base64_pcm16(&encoded),
            Ok(None) => Err(SynthError::Unavailable("no audio returned".to_owned())),
            Err(err) => Err(err),
        };
        let clip = match clip {
            Ok(clip) if !clip.is_empty() => clip,
            Ok(_) => return failed(SynthError::Decode("empty clip".to_owned())),
            Err(err) => return failed(err),
        };

        let utterance = self.next_utterance.fetch_add(1, Ordering::Relaxed);
        let duration_ms = clip.duration_ms();
        *self.active.lock() = Some(Playback { utterance, clip });
        debug!("narration::speak started utterance={utterance} duration_ms={duration_ms}");
        NarrationRep::Started {
            utterance,
            duration_ms,
        }
    }

    fn release(&self, utterance: u64) -> SmallVec<[NarrationRep; 8]> {
        let mut active = self.active.lock();
        match active.as_ref() {
            Some(playback) if playback.utterance == utterance => {
                *active = None;
                smallvec![NarrationRep::Finished { utterance }]
            }
            _ => SmallVec::new(),
        }
    }

    fn stop(&self) -> SmallVec<[NarrationRep; 8]> {
        match self.active.lock().take() {
            Some(playback) => smallvec![NarrationRep::Stopped {
                utterance: playback.utterance
            }],
            None => SmallVec::new(),
        }
    }
}

fn failed(err: SynthError) -> NarrationRep {
    warn!("narration failed: {err}");
    NarrationRep::Failed {
        reason: err.to_string(),
    }
}

impl Service for NarrationService {
    type Cmd = NarrationCmd;
    type Rep = NarrationRep;

    fn try_submit(&self, cmd: &Self::Cmd) -> SubmitOutcome {
        let policy = cmd.submit_policy();
        match cmd {
            NarrationCmd::Speak { .. } if self.reports.is_closed() => SubmitOutcome::Closed,
            NarrationCmd::Speak { text } => {
                if let Some(utterance) = self.active_utterance() {
                    debug!("narration::speak ignored, utterance={utterance} still playing");
                    return SubmitOutcome::Dropped;
                }
                try_submit_queue::<NarrationRep, _>(&self.reports, self.capacity, policy, 1, || {
                    smallvec![self.speak(text)]
                })
            }
            NarrationCmd::Release { utterance } => {
                try_submit_queue::<NarrationRep, _>(&self.reports, self.capacity, policy, 1, || {
                    self.release(*utterance)
                })
            }
            NarrationCmd::Stop => {
                try_submit_queue::<NarrationRep, _>(&self.reports, self.capacity, policy, 1, || {
                    self.stop()
                })
            }
        }
    }

    fn drain(&self, max: usize) -> SmallVec<[Self::Rep; 8]> {
        drain_queue::<NarrationRep>(&self.reports, max)
    }
}

/// Creates a narration service handle with default capacity.
pub fn default_service(synth: Arc<dyn SpeechSynth>) -> NarrationServiceHandle {
    NarrationService::new_handle(synth, DEFAULT_CAPACITY)
}
