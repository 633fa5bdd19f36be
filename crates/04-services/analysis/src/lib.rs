//! Analysis gateway: turns a guarded input into a validated [`AnalysisReport`].
//!
//! The model transport is an external collaborator. This crate owns the
//! request shape, the strict decoding of the answer, and the single opaque
//! failure surfaced to the hosting application. No retries happen here.

mod request;

pub use request::{InlineData, ModelRequest, Part};

use futures::future::{self, BoxFuture, FutureExt};
use log::{debug, warn};
use simulation::{decode_response, AnalysisInput, AnalysisReport, DecodeError};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// Failure of one analysis call.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("analysis model unreachable: {0}")]
    Unavailable(String),

    #[error("analysis model returned a malformed response: {0}")]
    Malformed(#[from] DecodeError),
}

/// Contract consumed by the hosting application.
pub trait AnalysisGateway: Send + Sync {
    fn analyze(&self, input: AnalysisInput) -> BoxFuture<'_, Result<AnalysisReport, GatewayError>>;
}

/// Raw transport to the hosted model; answers with the response text.
pub trait ModelTransport: Send + Sync {
    fn generate(&self, request: ModelRequest) -> BoxFuture<'_, Result<String, GatewayError>>;
}

/// Gateway that sends requests through a [`ModelTransport`] and validates the answer.
pub struct ModelGateway<T> {
    transport: T,
}

impl<T: ModelTransport> ModelGateway<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: ModelTransport> AnalysisGateway for ModelGateway<T> {
    fn analyze(&self, input: AnalysisInput) -> BoxFuture<'_, Result<AnalysisReport, GatewayError>> {
        let request = ModelRequest::for_input(&input);
        debug!(
            "analysis::analyze image={} parts={}",
            input.is_image(),
            request.parts.len()
        );
        async move {
            let raw = self.transport.generate(request).await?;
            decode_response(&raw).map_err(|err| {
                warn!("rejecting analysis response: {err}");
                GatewayError::from(err)
            })
        }
        .boxed()
    }
}

/// Transport replaying one recorded response for every request.
pub struct RecordedTransport {
    response: String,
    calls: AtomicUsize,
}

impl RecordedTransport {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of requests served.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl ModelTransport for RecordedTransport {
    fn generate(&self, _request: ModelRequest) -> BoxFuture<'_, Result<String, GatewayError>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        future::ready(Ok(self.response.clone())).boxed()
    }
}

/// Transport that is always unreachable.
pub struct OfflineTransport;

impl ModelTransport for OfflineTransport {
    fn generate(&self, _request: ModelRequest) -> BoxFuture<'_, Result<String, GatewayError>> {
        future::ready(Err(GatewayError::Unavailable("offline".to_owned()))).boxed()
    }
}

/// Gateway replaying one recorded response.
pub type RecordedGateway = ModelGateway<RecordedTransport>;
/// Gateway that always fails with [`GatewayError::Unavailable`].
pub type FailingGateway = ModelGateway<OfflineTransport>;

/// Gateway replaying a recorded response.
pub fn recorded(response: impl Into<String>) -> RecordedGateway {
    ModelGateway::new(RecordedTransport::new(response))
}

/// Gateway whose every call fails.
pub fn offline() -> FailingGateway {
    ModelGateway::new(OfflineTransport)
}
