//! Haptics service for alert pulses.

use log::{debug, trace};
use service_abi::{HapticCmd, HapticRep, HapticServiceHandle, Service, SubmitOutcome};
use services_common::{drain_queue, try_submit_queue, LocalQueue};
use smallvec::{smallvec, SmallVec};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const DEFAULT_CAPACITY: usize = 32;

/// Host vibration adapter. Devices without an actuator answer `Unsupported`.
pub struct HapticService {
    reports: LocalQueue<HapticRep>,
    capacity: usize,
    supported: bool,
    pulses: AtomicU64,
}

impl HapticService {
    /// Creates a new haptics service handle with the specified report capacity.
    pub fn new_handle(supported: bool, capacity: usize) -> HapticServiceHandle {
        Arc::new(Self::new(supported, capacity))
    }

    pub fn new(supported: bool, capacity: usize) -> Self {
        Self {
            reports: LocalQueue::with_capacity(capacity),
            capacity,
            supported,
            pulses: AtomicU64::new(0),
        }
    }

    /// The host revoked vibration access; later pulses answer `Closed`.
    pub fn shutdown(&self) {
        debug!("haptics::shutdown");
        self.reports.close();
    }

    /// Number of pulses delivered so far.
    pub fn pulses(&self) -> u64 {
        self.pulses.load(Ordering::Relaxed)
    }
}

impl Service for HapticService {
    type Cmd = HapticCmd;
    type Rep = HapticRep;

    fn try_submit(&self, cmd: &Self::Cmd) -> SubmitOutcome {
        try_submit_queue::<HapticRep, _>(
            &self.reports,
            self.capacity,
            cmd.submit_policy(),
            1,
            || match *cmd {
                HapticCmd::Pulse { .. } if !self.supported => smallvec![HapticRep::Unsupported],
                HapticCmd::Pulse { duration_ms } => {
                    self.pulses.fetch_add(1, Ordering::Relaxed);
                    trace!("haptics::pulse duration_ms={duration_ms}");
                    smallvec![HapticRep::Pulsed { duration_ms }]
                }
            },
        )
    }

    fn drain(&self, max: usize) -> SmallVec<[Self::Rep; 8]> {
        drain_queue::<HapticRep>(&self.reports, max)
    }
}

/// Creates a haptics service handle with default capacity.
pub fn default_service(supported: bool) -> HapticServiceHandle {
    HapticService::new_handle(supported, DEFAULT_CAPACITY)
}
