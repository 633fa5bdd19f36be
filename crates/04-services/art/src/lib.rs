//! Background-art service: turns the simulation's scene prompt into a single
//! illustration shared by every step.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::{debug, warn};
use service_abi::{ArtCmd, ArtRep, ArtServiceHandle, ImageHandle, Service, SubmitOutcome};
use services_common::{drain_queue, try_submit_queue, LocalQueue};
use smallvec::{smallvec, SmallVec};
use std::sync::Arc;
use thiserror::Error;

const DEFAULT_CAPACITY: usize = 8;

/// Encoded image returned by a [`Painter`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Painting {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl Painting {
    pub fn png(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: "image/png".to_owned(),
        }
    }

    /// Wraps the encoded bytes into a `data:` URL handle.
    pub fn into_handle(self) -> ImageHandle {
        let data_url = format!("data:{};base64,{}", self.media_type, STANDARD.encode(&self.bytes));
        ImageHandle {
            media_type: self.media_type,
            data_url,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaintError {
    #[error("image backend unavailable: {0}")]
    Unavailable(String),

    #[error("image backend returned no image")]
    Empty,
}

/// Image-generation backend.
pub trait Painter: Send + Sync {
    fn paint(&self, prompt: &str) -> Result<Painting, PaintError>;
}

impl<F> Painter for F
where
    F: Fn(&str) -> Result<Painting, PaintError> + Send + Sync,
{
    fn paint(&self, prompt: &str) -> Result<Painting, PaintError> {
        self(prompt)
    }
}

/// Queue-backed art service wrapping a [`Painter`].
pub struct ArtService {
    reports: LocalQueue<ArtRep>,
    capacity: usize,
    painter: Arc<dyn Painter>,
}

impl ArtService {
    /// Creates a new art service handle with the specified report capacity.
    pub fn new_handle(painter: Arc<dyn Painter>, capacity: usize) -> ArtServiceHandle {
        Arc::new(Self::new(painter, capacity))
    }

    pub fn new(painter: Arc<dyn Painter>, capacity: usize) -> Self {
        Self {
            reports: LocalQueue::with_capacity(capacity),
            capacity,
            painter,
        }
    }

    /// The painter backend went away; later requests answer `Closed`.
    pub fn shutdown(&self) {
        debug!("art::shutdown");
        self.reports.close();
    }

    fn paint(&self, prompt: &str) -> ArtRep {
        match self.painter.paint(prompt) {
            Ok(painting) if painting.bytes.is_empty() => failed(PaintError::Empty),
            Ok(painting) => {
                debug!(
                    "art::paint ready media_type={} bytes={}",
                    painting.media_type,
                    painting.bytes.len()
                );
                ArtRep::Ready {
                    image: painting.into_handle(),
                }
            }
            Err(err) => failed(err),
        }
    }
}

fn failed(err: PaintError) -> ArtRep {
    warn!("background art generation failed: {err}");
    ArtRep::Failed {
        reason: err.to_string(),
    }
}

impl Service for ArtService {
    type Cmd = ArtCmd;
    type Rep = ArtRep;

    fn try_submit(&self, cmd: &Self::Cmd) -> SubmitOutcome {
        try_submit_queue::<ArtRep, _>(
            &self.reports,
            self.capacity,
            cmd.submit_policy(),
            1,
            || match cmd {
                ArtCmd::Paint { prompt } => smallvec![self.paint(prompt)],
            },
        )
    }

    fn drain(&self, max: usize) -> SmallVec<[Self::Rep; 8]> {
        drain_queue::<ArtRep>(&self.reports, max)
    }
}

/// Creates an art service handle with default capacity.
pub fn default_service(painter: Arc<dyn Painter>) -> ArtServiceHandle {
    ArtService::new_handle(painter, DEFAULT_CAPACITY)
}
