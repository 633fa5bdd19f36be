//! Session scheduler and hosting-app flow.
//!
//! The [`Scheduler`] owns one [`SandboxEngine`] and the collaborator hub. It
//! reduces queued intents by priority, routes the resulting commands, keeps the
//! virtual timers, and feeds collaborator reports back into the engine.

pub mod config;
pub mod flow;
pub mod health;
pub mod priority;
pub mod timers;

pub use config::{ConfigError, SessionConfig};
pub use flow::{AppFlow, FlowError, FlowPhase, RequestId, ANALYSIS_FAILED_NOTICE};
pub use health::{CollaboratorHealth, HealthFlags};

use crate::priority::PQueues;
use crate::timers::TimerQueue;
use hub::{
    ArtRep, Collaborator, CollaboratorsHub, Command, Cue, FollowUps, Intent, IntentPriority,
    IntentReducer, Report, ReportReducer, SubmitOutcome, SubmitPolicy, DEFAULT_INTENT_BUDGET,
    DEFAULT_REPORT_BUDGET,
};
use log::{debug, trace, warn};
use sandbox::{SandboxEngine, SandboxView};
use std::collections::VecDeque;

/// Upper bound on scheduler rounds per `run_until_idle` call.
const MAX_IDLE_ROUNDS: usize = 1024;

/// Drives one sandbox session.
pub struct Scheduler {
    engine: SandboxEngine,
    hub: CollaboratorsHub,
    intents: PQueues<Intent>,
    timers: TimerQueue,
    /// `Must` commands that hit backpressure; resubmitted first each tick.
    retry: VecDeque<Command>,
    cues: Vec<Cue>,
    health: CollaboratorHealth,
    intent_budget: usize,
    report_budget: usize,
}

impl Scheduler {
    pub fn new(engine: SandboxEngine, hub: CollaboratorsHub) -> Self {
        Self::with_budgets(engine, hub, DEFAULT_INTENT_BUDGET, DEFAULT_REPORT_BUDGET)
    }

    pub fn with_config(
        engine: SandboxEngine,
        hub: CollaboratorsHub,
        config: &SessionConfig,
    ) -> Self {
        Self::with_budgets(engine, hub, config.intent_budget, config.report_budget)
    }

    pub fn with_budgets(
        engine: SandboxEngine,
        hub: CollaboratorsHub,
        intent_budget: usize,
        report_budget: usize,
    ) -> Self {
        Self {
            engine,
            hub,
            intents: PQueues::with_capacity(16),
            timers: TimerQueue::new(),
            retry: VecDeque::new(),
            cues: Vec::new(),
            health: CollaboratorHealth::default(),
            intent_budget: intent_budget.max(1),
            report_budget: report_budget.max(1),
        }
    }

    pub fn enqueue_intent(&mut self, priority: IntentPriority, intent: Intent) {
        self.intents.enqueue(priority, intent);
    }

    /// Enqueues `intent` at its natural priority.
    pub fn submit(&mut self, intent: Intent) {
        let priority = intent.priority();
        self.enqueue_intent(priority, intent);
    }

    pub fn pending_intents(&self) -> [usize; 3] {
        self.intents.len_per_priority()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Current virtual time.
    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    pub fn engine(&self) -> &SandboxEngine {
        &self.engine
    }

    pub fn view(&self) -> SandboxView<'_> {
        self.engine.view()
    }

    pub fn health(&self) -> &CollaboratorHealth {
        &self.health
    }

    /// Takes the presentation cues emitted since the last call.
    pub fn drain_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    /// One tick: pending retries, up to the intent budget, then up to the report budget.
    /// Returns whether anything was processed.
    pub fn run_once(&mut self) -> bool {
        let retried = self.process_retries();
        let reduced = self.process_intents();
        let drained = self.process_reports();
        retried + reduced + drained > 0
    }

    /// Ticks until no intent, retry, or report is left.
    pub fn run_until_idle(&mut self) {
        for _ in 0..MAX_IDLE_ROUNDS {
            if !self.run_once() {
                return;
            }
        }
        warn!("scheduler still busy after {MAX_IDLE_ROUNDS} rounds");
    }

    /// Moves virtual time forward, firing due timers in order as P1 intents.
    pub fn advance_clock(&mut self, ms: u64) {
        let target = self.timers.now_ms().saturating_add(ms);
        self.run_until_idle();
        while let Some(intent) = self.timers.pop_due(target) {
            trace!("timer fired at {}ms: {intent:?}", self.timers.now_ms());
            self.enqueue_intent(IntentPriority::P1, intent);
            self.run_until_idle();
        }
        self.timers.advance_to(target);
    }

    fn process_retries(&mut self) -> usize {
        let pending = std::mem::take(&mut self.retry);
        let count = pending.len();
        for cmd in pending {
            self.submit_command(cmd);
        }
        count
    }

    fn process_intents(&mut self) -> usize {
        let mut reduced = 0;
        while reduced < self.intent_budget {
            let Some(intent) = self.intents.pop_next() else {
                break;
            };
            reduced += 1;
            let follow_ups = self.engine.reduce_intent(intent);
            self.apply(follow_ups);
        }
        reduced
    }

    fn process_reports(&mut self) -> usize {
        let reports = self.hub.drain_reports(self.report_budget);
        let count = reports.len();
        for report in reports {
            let follow_ups = self.engine.reduce_report(report);
            self.apply(follow_ups);
        }
        count
    }

    fn apply(&mut self, follow_ups: FollowUps) {
        let FollowUps {
            commands,
            timers,
            cues,
        } = follow_ups;
        for cmd in commands {
            self.submit_command(cmd);
        }
        for timer in timers {
            self.timers.schedule(timer.delay_ms, timer.intent);
        }
        self.cues.extend(cues);

        if self.engine.is_terminal() && !self.timers.is_empty() {
            let dropped = self.timers.clear();
            debug!("session ended; cancelled {dropped} pending timers");
        }
    }

    fn submit_command(&mut self, cmd: Command) {
        let collaborator = Collaborator::of(&cmd);
        let policy = cmd.default_policy();
        if self.health.is_closed(collaborator) && policy != SubmitPolicy::Must {
            trace!("skipping {cmd:?}: {} is closed", collaborator.name());
            self.art_rejected(&cmd, "painter closed");
            return;
        }

        let outcome = self.hub.try_submit(&cmd);
        self.health.record(collaborator, policy, outcome);
        match outcome {
            SubmitOutcome::Accepted => return,
            SubmitOutcome::Dropped => trace!("{} dropped {cmd:?}", collaborator.name()),
            SubmitOutcome::WouldBlock => {
                if policy == SubmitPolicy::Must {
                    self.retry.push_back(cmd.clone());
                }
            }
            SubmitOutcome::Closed => {
                warn!("{} collaborator closed", collaborator.name());
            }
        }
        self.art_rejected(&cmd, &format!("paint request {outcome:?}"));
    }

    /// A paint request that never reaches the painter will never be answered;
    /// the background falls back instead of loading forever.
    fn art_rejected(&mut self, cmd: &Command, reason: &str) {
        if let Command::Art(_) = cmd {
            let follow_ups = self.engine.reduce_report(Report::Art(ArtRep::Failed {
                reason: reason.to_owned(),
            }));
            self.apply(follow_ups);
        }
    }
}
