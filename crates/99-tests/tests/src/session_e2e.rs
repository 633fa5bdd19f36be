//! Whole sessions: analysis flow, sandbox walk, and collaborator effects.

use app::{AppFlow, FlowPhase, Scheduler, SessionConfig};
use futures::executor::block_on;
use hub::{Cue, ElementId, Intent};
use mock::{make_collaborators, ArtScript, MockCollaborators, MockScript};
use sandbox::{AlertPolicy, Background, SandboxEngine, SessionPhase};
use services_analysis::recorded;
use simulation::AnalysisInput;

const TRANSITION_MS: u64 = 800;

/// Runs a fixture through the hosting-app flow and opens its sandbox.
fn open(
    fixture: &str,
    script: MockScript,
    config: &SessionConfig,
) -> (AppFlow, Scheduler, MockCollaborators) {
    let gateway = recorded(testdata::response(fixture));
    let mut flow = AppFlow::new();
    let input = AnalysisInput::text("pasted message").expect("non-empty");
    assert!(block_on(flow.analyze(&gateway, input)).expect("flow accepts input"));

    let engine = flow
        .open_sandbox(config.engine.clone())
        .expect("result screen");
    let collaborators = make_collaborators(script);
    let mut scheduler = Scheduler::with_config(engine, collaborators.hub.clone(), config);
    scheduler.submit(Intent::Start);
    scheduler.run_until_idle();
    (flow, scheduler, collaborators)
}

fn tap(scheduler: &mut Scheduler, ids: &[&str]) {
    for id in ids {
        scheduler.submit(Intent::Inspect(id.parse().expect("infallible")));
    }
    scheduler.run_until_idle();
}

fn advance(scheduler: &mut Scheduler) {
    scheduler.submit(Intent::Advance);
    scheduler.run_until_idle();
}

#[test]
fn bank_alert_full_walk() {
    let (mut flow, mut scheduler, collaborators) =
        open(testdata::BANK_ALERT, MockScript::default(), &SessionConfig::default());

    tap(&mut scheduler, &["help"]);
    assert_eq!(scheduler.view().tally(), (1, 2));
    advance(&mut scheduler);
    assert_eq!(scheduler.engine().phase(), SessionPhase::AtStep { index: 0 });
    assert_eq!(collaborators.haptics.pulses(), 0);

    tap(&mut scheduler, &["card-number", "pin"]);
    advance(&mut scheduler);
    scheduler.advance_clock(TRANSITION_MS);
    assert_eq!(scheduler.engine().phase(), SessionPhase::AtStep { index: 1 });
    assert!(scheduler.engine().inspected().is_empty());

    tap(&mut scheduler, &["url-trap", "cancel-now"]);
    assert!(scheduler.view().final_step);
    advance(&mut scheduler);
    assert_eq!(scheduler.engine().phase(), SessionPhase::Finished);

    let cues = scheduler.drain_cues();
    assert_eq!(cues.first(), Some(&Cue::StepEntered { index: 0 }));
    assert!(cues.contains(&Cue::StepEntered { index: 1 }));
    assert_eq!(cues.last(), Some(&Cue::SessionFinished));
    assert_eq!(collaborators.haptics.pulses(), 4);
    assert!(matches!(
        scheduler.engine().background(),
        Background::Ready { .. }
    ));

    flow.finish().expect("sandbox open");
    assert!(matches!(flow.phase(), FlowPhase::Finished { .. }));
}

#[test]
fn parcel_fee_address_bar_counts_on_every_step() {
    let (_, mut scheduler, _) =
        open(testdata::PARCEL_FEE, MockScript::default(), &SessionConfig::default());

    tap(&mut scheduler, &["tracking", "url-trap"]);
    assert!(scheduler.engine().is_current_step_complete());
    advance(&mut scheduler);
    scheduler.advance_clock(TRANSITION_MS);

    tap(&mut scheduler, &["card", "pay"]);
    assert_eq!(scheduler.view().tally(), (2, 3));
    tap(&mut scheduler, &["url-trap"]);
    advance(&mut scheduler);
    scheduler.advance_clock(TRANSITION_MS);

    // The last step has no fields; the address bar alone completes it.
    assert_eq!(scheduler.engine().required_count(), 1);
    tap(&mut scheduler, &["url-trap"]);
    advance(&mut scheduler);
    assert_eq!(scheduler.engine().phase(), SessionPhase::Finished);
}

#[test]
fn close_during_transition_ends_quietly() {
    let (mut flow, mut scheduler, collaborators) =
        open(testdata::BANK_ALERT, MockScript::default(), &SessionConfig::default());
    tap(&mut scheduler, &["card-number", "pin"]);
    scheduler.submit(Intent::SpeakAssistant);
    advance(&mut scheduler);
    scheduler.advance_clock(TRANSITION_MS / 2);
    assert_eq!(
        scheduler.engine().phase(),
        SessionPhase::Transitioning { from: 0 }
    );

    scheduler.submit(Intent::Close);
    scheduler.run_until_idle();
    scheduler.advance_clock(10_000);

    assert_eq!(scheduler.engine().phase(), SessionPhase::Closed);
    assert!(!scheduler.engine().is_shaking());
    assert_eq!(collaborators.narration.active_utterance(), None);
    let cues = scheduler.drain_cues();
    assert!(!cues.contains(&Cue::StepEntered { index: 1 }));
    assert_eq!(cues.last(), Some(&Cue::SessionClosed));

    // Further taps are ignored once closed.
    let before = scheduler.engine().inspected().to_vec();
    tap(&mut scheduler, &["url-trap"]);
    assert_eq!(scheduler.engine().inspected(), before.as_slice());
    assert!(!before.contains(&ElementId::Url));

    flow.close_sandbox().expect("sandbox open");
    assert!(matches!(flow.phase(), FlowPhase::Result { .. }));
}

#[test]
fn safe_message_runs_a_safety_check() {
    let (_, mut scheduler, collaborators) = open(
        testdata::GRANDCHILD_RECIPE,
        MockScript::default(),
        &SessionConfig::default(),
    );
    let view = scheduler.view();
    assert_eq!(view.mode.title(), "Safety Check");
    assert_eq!(view.tally(), (0, 3));

    tap(&mut scheduler, &["greeting", "question", "url-trap"]);
    assert!(scheduler.view().final_step);
    advance(&mut scheduler);

    assert_eq!(scheduler.engine().phase(), SessionPhase::Finished);
    assert_eq!(collaborators.haptics.pulses(), 0);
}

#[test]
fn art_failure_never_blocks_the_walk() {
    let script = MockScript {
        art: ArtScript::Fails,
        ..MockScript::default()
    };
    let (_, mut scheduler, _) = open(testdata::GRANDCHILD_RECIPE, script, &SessionConfig::default());
    assert_eq!(scheduler.engine().background(), &Background::Fallback);

    tap(&mut scheduler, &["greeting", "question", "url-trap"]);
    advance(&mut scheduler);
    assert_eq!(scheduler.engine().phase(), SessionPhase::Finished);
}

#[test]
fn first_discovery_policy_alerts_once_per_trap() {
    let mut config = SessionConfig::default();
    config.engine.alert_policy = AlertPolicy::FirstDiscovery;
    let (_, mut scheduler, collaborators) =
        open(testdata::BANK_ALERT, MockScript::default(), &config);

    tap(&mut scheduler, &["pin", "pin", "pin"]);
    assert_eq!(collaborators.haptics.pulses(), 1);
    assert_eq!(
        scheduler.engine().inspected(),
        &[ElementId::field("pin")]
    );
}

#[test]
fn view_stream_serializes_every_frame() {
    let report = simulation::decode_response(testdata::response(testdata::BANK_ALERT))
        .expect("fixture decodes");
    let engine = SandboxEngine::new(
        report.simulation,
        report.judgment.is_scam,
        SessionConfig::default().engine,
    );
    let mut scheduler = Scheduler::new(engine, mock::make_hub());
    let mut lines = Vec::new();
    for intent in [
        Intent::Start,
        Intent::Inspect(ElementId::field("card-number")),
        Intent::Inspect(ElementId::field("pin")),
        Intent::Advance,
    ] {
        scheduler.submit(intent);
        scheduler.run_until_idle();
        lines.push(serde_json::to_string(&scheduler.view()).expect("view serializes"));
    }

    let last: serde_json::Value = serde_json::from_str(&lines[3]).expect("valid json");
    assert_eq!(last["phase"]["phase"], "transitioning");
    assert_eq!(last["phase"]["from"], 0);
    assert_eq!(last["can_advance"], false);
    assert_eq!(last["mode"], "trap_finder");
}
