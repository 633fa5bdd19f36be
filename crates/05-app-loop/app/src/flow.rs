//! Hosting-app analysis flow: input guard, analyzing, result, sandbox, finished.

use log::{debug, warn};
use sandbox::{EngineOptions, SandboxEngine};
use services_analysis::{AnalysisGateway, GatewayError};
use simulation::{AnalysisInput, AnalysisReport, InputError};
use std::fmt;
use thiserror::Error;

/// Retry prompt shown after a failed analysis.
pub const ANALYSIS_FAILED_NOTICE: &str = "Dori could not analyze this message. Try again?";

/// Identifies one analysis call so late answers can be recognised.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Screen the hosting app is on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowPhase {
    /// Waiting for input; `notice` carries the retry prompt after a failure.
    Idle { notice: Option<&'static str> },
    Analyzing { request: RequestId },
    /// Judgment shown; the sandbox can be opened from here.
    Result { report: AnalysisReport },
    Sandbox { report: AnalysisReport },
    Finished { report: AnalysisReport },
}

/// Operation not allowed in the current phase.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("an analysis is already running")]
    Busy,

    #[error("{operation} is not available while {phase}")]
    WrongPhase {
        operation: &'static str,
        phase: &'static str,
    },
}

/// Drives the hosting app between its screens.
#[derive(Debug)]
pub struct AppFlow {
    phase: FlowPhase,
    next_request: u64,
}

impl Default for AppFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl AppFlow {
    pub fn new() -> Self {
        Self {
            phase: FlowPhase::Idle { notice: None },
            next_request: 1,
        }
    }

    pub fn phase(&self) -> &FlowPhase {
        &self.phase
    }

    /// Retry prompt to show on the idle screen, if any.
    pub fn notice(&self) -> Option<&'static str> {
        match self.phase {
            FlowPhase::Idle { notice } => notice,
            _ => None,
        }
    }

    /// Report of the current analysis, once one resolved.
    pub fn report(&self) -> Option<&AnalysisReport> {
        match &self.phase {
            FlowPhase::Result { report }
            | FlowPhase::Sandbox { report }
            | FlowPhase::Finished { report } => Some(report),
            FlowPhase::Idle { .. } | FlowPhase::Analyzing { .. } => None,
        }
    }

    /// Guards pasted text and starts an analysis. Blank text changes nothing.
    pub fn submit_text(&mut self, text: &str) -> Result<(AnalysisInput, RequestId), FlowError> {
        let input = AnalysisInput::text(text)?;
        let request = self.begin()?;
        Ok((input, request))
    }

    /// Starts an analysis of an already guarded input.
    pub fn submit(&mut self, input: &AnalysisInput) -> Result<RequestId, FlowError> {
        debug!("flow::submit image={}", input.is_image());
        self.begin()
    }

    /// Applies the outcome of `request`. Returns `false` when it was stale.
    pub fn resolve(
        &mut self,
        request: RequestId,
        outcome: Result<AnalysisReport, GatewayError>,
    ) -> bool {
        if self.phase != (FlowPhase::Analyzing { request }) {
            debug!("discarding stale analysis result {request}");
            return false;
        }
        self.phase = match outcome {
            Ok(report) => {
                debug!(
                    "analysis {request} resolved: scam={} steps={}",
                    report.is_scam(),
                    report.simulation.step_count()
                );
                FlowPhase::Result { report }
            }
            Err(err) => {
                warn!("analysis {request} failed: {err}");
                FlowPhase::Idle {
                    notice: Some(ANALYSIS_FAILED_NOTICE),
                }
            }
        };
        true
    }

    /// Abandons the running analysis; its result will be discarded.
    pub fn cancel(&mut self) -> bool {
        if let FlowPhase::Analyzing { request } = self.phase {
            debug!("analysis {request} cancelled");
            self.phase = FlowPhase::Idle { notice: None };
            return true;
        }
        false
    }

    /// Builds a fresh engine for the stored report and enters the sandbox.
    pub fn open_sandbox(&mut self, options: EngineOptions) -> Result<SandboxEngine, FlowError> {
        let FlowPhase::Result { report } = &self.phase else {
            return Err(self.wrong_phase("open_sandbox"));
        };
        let report = report.clone();
        let engine = SandboxEngine::new(report.simulation.clone(), report.is_scam(), options);
        self.phase = FlowPhase::Sandbox { report };
        Ok(engine)
    }

    /// Leaves the sandbox early, back to the judgment.
    pub fn close_sandbox(&mut self) -> Result<(), FlowError> {
        self.leave_sandbox("close_sandbox", |report| FlowPhase::Result { report })
    }

    /// The learner completed the sandbox.
    pub fn finish(&mut self) -> Result<(), FlowError> {
        self.leave_sandbox("finish", |report| FlowPhase::Finished { report })
    }

    /// Back to an empty idle screen; any running analysis becomes stale.
    pub fn reset(&mut self) {
        self.phase = FlowPhase::Idle { notice: None };
    }

    /// Guard, call the gateway, and resolve. Returns `true` when a report is ready.
    pub async fn analyze(
        &mut self,
        gateway: &dyn AnalysisGateway,
        input: AnalysisInput,
    ) -> Result<bool, FlowError> {
        let request = self.submit(&input)?;
        let outcome = gateway.analyze(input).await;
        self.resolve(request, outcome);
        Ok(matches!(self.phase, FlowPhase::Result { .. }))
    }

    fn begin(&mut self) -> Result<RequestId, FlowError> {
        match self.phase {
            FlowPhase::Analyzing { .. } => return Err(FlowError::Busy),
            FlowPhase::Sandbox { .. } => return Err(self.wrong_phase("submit")),
            _ => {}
        }
        let request = RequestId(self.next_request);
        self.next_request += 1;
        self.phase = FlowPhase::Analyzing { request };
        Ok(request)
    }

    fn leave_sandbox(
        &mut self,
        operation: &'static str,
        next: impl FnOnce(AnalysisReport) -> FlowPhase,
    ) -> Result<(), FlowError> {
        if !matches!(self.phase, FlowPhase::Sandbox { .. }) {
            return Err(self.wrong_phase(operation));
        }
        let phase = std::mem::replace(&mut self.phase, FlowPhase::Idle { notice: None });
        if let FlowPhase::Sandbox { report } = phase {
            self.phase = next(report);
        }
        Ok(())
    }

    fn wrong_phase(&self, operation: &'static str) -> FlowError {
        let phase = match self.phase {
            FlowPhase::Idle { .. } => "idle",
            FlowPhase::Analyzing { .. } => "analyzing",
            FlowPhase::Result { .. } => "showing a result",
            FlowPhase::Sandbox { .. } => "in the sandbox",
            FlowPhase::Finished { .. } => "finished",
        };
        FlowError::WrongPhase { operation, phase }
    }
}
