//! End-to-end suite for Dori sandbox sessions.

#[cfg(test)]
mod session_e2e;

#[cfg(test)]
mod tests {
    use app::Scheduler;
    use hub::{ElementId, Intent, IntentPriority};
    use mock::make_hub;
    use sandbox::{EngineOptions, SandboxEngine, SessionPhase};
    use simulation::decode_response;

    fn scheduler(fixture: &str) -> Scheduler {
        let report = decode_response(testdata::response(fixture)).expect("fixture decodes");
        let engine = SandboxEngine::new(
            report.simulation,
            report.judgment.is_scam,
            EngineOptions::default(),
        );
        Scheduler::new(engine, make_hub())
    }

    #[test]
    fn start_then_inspect_records_progress() {
        let mut scheduler = scheduler(testdata::BANK_ALERT);
        scheduler.enqueue_intent(IntentPriority::P0, Intent::Start);
        scheduler.run_once();
        assert!(scheduler.engine().is_started());

        scheduler.enqueue_intent(
            IntentPriority::P0,
            Intent::Inspect(ElementId::field("card-number")),
        );
        scheduler.run_once();
        assert_eq!(
            scheduler.engine().inspected(),
            &[ElementId::field("card-number")]
        );
    }

    #[test]
    fn close_outranks_queued_narration() {
        let mut scheduler = scheduler(testdata::BANK_ALERT);
        scheduler.enqueue_intent(IntentPriority::P2, Intent::SpeakAssistant);
        scheduler.enqueue_intent(IntentPriority::P0, Intent::Close);
        scheduler.run_once();

        assert_eq!(scheduler.engine().phase(), SessionPhase::Closed);
        assert_eq!(scheduler.pending_intents(), [0, 0, 0]);
    }

    #[test]
    fn every_fixture_decodes_with_its_recorded_shape() {
        for meta in testdata::list() {
            let report = decode_response(testdata::response(meta.name)).expect("fixture decodes");
            assert_eq!(report.simulation.step_count(), meta.steps, "{}", meta.name);
        }
    }

    // Slow tests are #[ignore]d and prefixed with "slow_".
    #[test]
    #[ignore]
    fn slow_stress_many_taps() {
        let mut scheduler = scheduler(testdata::BANK_ALERT);
        scheduler.submit(Intent::Start);
        for _ in 0..1000 {
            scheduler.submit(Intent::Inspect(ElementId::field("pin")));
            scheduler.submit(Intent::Inspect(ElementId::field("help")));
            scheduler.advance_clock(100);
        }
        assert_eq!(scheduler.engine().inspected().len(), 2);
        assert_eq!(scheduler.engine().phase(), SessionPhase::AtStep { index: 0 });
    }
}
