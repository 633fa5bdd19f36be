//! Scheduler coverage against the scripted collaborators.

use app::{Scheduler, SessionConfig};
use hub::{Collaborator, Cue, ElementId, Intent};
use mock::{
    make_collaborators, make_collaborators_with_capacity, ArtScript, MockCollaborators,
    MockScript, SpeechScript,
};
use sandbox::{Background, EngineOptions, NarrationState, SandboxEngine, SessionPhase};
use simulation::decode_response;

fn session(fixture: &str, script: MockScript) -> (Scheduler, MockCollaborators) {
    session_with(fixture, make_collaborators(script))
}

fn session_with(fixture: &str, collaborators: MockCollaborators) -> (Scheduler, MockCollaborators) {
    let report = decode_response(testdata::response(fixture)).expect("fixture decodes");
    let engine = SandboxEngine::new(
        report.simulation,
        report.judgment.is_scam,
        EngineOptions::default(),
    );
    let scheduler = Scheduler::new(engine, collaborators.hub.clone());
    (scheduler, collaborators)
}

fn inspect(scheduler: &mut Scheduler, id: &str) {
    scheduler.submit(Intent::Inspect(id.parse().expect("infallible")));
}

fn complete_login(scheduler: &mut Scheduler) {
    inspect(scheduler, "card-number");
    inspect(scheduler, "pin");
    scheduler.run_until_idle();
}

/// Starting paints the background once the art report is drained.
#[test]
fn start_paints_background() {
    let (mut scheduler, _) = session(testdata::BANK_ALERT, MockScript::default());
    scheduler.submit(Intent::Start);
    scheduler.run_until_idle();

    assert!(matches!(
        scheduler.engine().background(),
        Background::Ready { image } if image.data_url.starts_with("data:image/png;base64,")
    ));
    assert_eq!(scheduler.drain_cues(), vec![Cue::StepEntered { index: 0 }]);
}

/// A failing painter leaves the fallback background and a usable session.
#[test]
fn art_failure_uses_fallback() {
    let script = MockScript {
        art: ArtScript::Fails,
        ..MockScript::default()
    };
    let (mut scheduler, _) = session(testdata::BANK_ALERT, script);
    scheduler.submit(Intent::Start);
    complete_login(&mut scheduler);

    assert_eq!(scheduler.engine().background(), &Background::Fallback);
    assert!(scheduler.engine().is_current_step_complete());
}

/// A paint request the painter refuses falls back instead of loading forever.
#[test]
fn dropped_paint_uses_fallback() {
    let collaborators = make_collaborators_with_capacity(MockScript::default(), 0);
    let (mut scheduler, _) = session_with(testdata::BANK_ALERT, collaborators);
    scheduler.submit(Intent::Start);
    scheduler.run_until_idle();
    scheduler.advance_clock(60_000);

    assert_eq!(scheduler.engine().background(), &Background::Fallback);
    assert_eq!(scheduler.health().dropped, 1);
}

/// A painter shut down before the session paints nothing and falls back.
#[test]
fn closed_painter_uses_fallback() {
    let (mut scheduler, collaborators) = session(testdata::BANK_ALERT, MockScript::default());
    collaborators.art.shutdown();
    scheduler.submit(Intent::Start);
    scheduler.run_until_idle();

    assert_eq!(scheduler.engine().background(), &Background::Fallback);
    assert!(scheduler.health().is_closed(Collaborator::Art));
    assert_eq!(scheduler.drain_cues(), vec![Cue::StepEntered { index: 0 }]);
}

/// Once haptics close, later pulses are skipped and alerts only shake.
#[test]
fn closed_haptics_latch_and_skip() {
    let (mut scheduler, collaborators) = session(testdata::BANK_ALERT, MockScript::default());
    collaborators.haptics.shutdown();
    inspect(&mut scheduler, "pin");
    scheduler.run_until_idle();

    assert!(scheduler.health().is_closed(Collaborator::Haptics));
    assert!(scheduler.health().any_closed());
    assert!(scheduler.engine().is_shaking());
    let health = *scheduler.health();

    inspect(&mut scheduler, "card-number");
    scheduler.run_until_idle();
    assert_eq!(*scheduler.health(), health);
    assert_eq!(collaborators.haptics.pulses(), 0);
    assert!(scheduler.engine().is_current_step_complete());
}

/// A closed narrator never starts speaking.
#[test]
fn closed_narration_stays_idle() {
    let (mut scheduler, collaborators) = session(testdata::BANK_ALERT, MockScript::default());
    collaborators.narration.shutdown();
    scheduler.submit(Intent::SpeakAssistant);
    scheduler.run_until_idle();

    assert!(scheduler.health().is_closed(Collaborator::Narration));
    assert_eq!(collaborators.narration.active_utterance(), None);
    assert_eq!(scheduler.engine().narration(), NarrationState::Idle);
}

/// Trap alerts pulse once and the shake clears after its timer.
#[test]
fn alert_pulses_and_clears() {
    let (mut scheduler, collaborators) = session(testdata::BANK_ALERT, MockScript::default());
    inspect(&mut scheduler, "pin");
    scheduler.run_until_idle();

    assert_eq!(collaborators.haptics.pulses(), 1);
    assert!(scheduler.engine().is_shaking());
    assert_eq!(scheduler.drain_cues(), vec![Cue::Shake { on: true }]);

    scheduler.advance_clock(499);
    assert!(scheduler.engine().is_shaking());
    scheduler.advance_clock(1);
    assert!(!scheduler.engine().is_shaking());
    assert_eq!(scheduler.drain_cues(), vec![Cue::Shake { on: false }]);
}

/// The next step is entered exactly when the transition delay elapses.
#[test]
fn transition_fires_after_delay() {
    let (mut scheduler, _) = session(testdata::BANK_ALERT, MockScript::default());
    complete_login(&mut scheduler);
    scheduler.submit(Intent::Advance);
    scheduler.run_until_idle();
    assert_eq!(
        scheduler.engine().phase(),
        SessionPhase::Transitioning { from: 0 }
    );

    scheduler.advance_clock(799);
    assert_eq!(
        scheduler.engine().phase(),
        SessionPhase::Transitioning { from: 0 }
    );
    scheduler.advance_clock(1);
    assert_eq!(scheduler.engine().phase(), SessionPhase::AtStep { index: 1 });

    let cues = scheduler.drain_cues();
    assert!(cues.ends_with(&[Cue::ScrollToTop, Cue::StepEntered { index: 1 }]));
    assert_eq!(scheduler.now_ms(), 800);
}

/// Closing mid-transition cancels the pending step entry for good.
#[test]
fn close_cancels_pending_transition() {
    let (mut scheduler, _) = session(testdata::BANK_ALERT, MockScript::default());
    complete_login(&mut scheduler);
    scheduler.submit(Intent::Advance);
    scheduler.advance_clock(400);

    scheduler.submit(Intent::Close);
    scheduler.run_until_idle();
    assert_eq!(scheduler.pending_timers(), 0);

    scheduler.advance_clock(5_000);
    assert_eq!(scheduler.engine().phase(), SessionPhase::Closed);
    let cues = scheduler.drain_cues();
    assert!(cues.contains(&Cue::SessionClosed));
    assert!(!cues.contains(&Cue::StepEntered { index: 1 }));
}

/// Narration plays for the clip length and is released afterwards.
#[test]
fn narration_plays_and_releases() {
    let (mut scheduler, collaborators) = session(testdata::BANK_ALERT, MockScript::default());
    scheduler.submit(Intent::SpeakAssistant);
    scheduler.run_until_idle();

    let utterance = collaborators
        .narration
        .active_utterance()
        .expect("playing");
    assert_eq!(
        scheduler.engine().narration(),
        NarrationState::Playing { utterance }
    );

    scheduler.advance_clock(1_000);
    assert_eq!(collaborators.narration.active_utterance(), None);
    assert_eq!(scheduler.engine().narration(), NarrationState::Idle);
}

/// A second request while one is in flight is dropped, not queued.
#[test]
fn concurrent_narration_is_dropped() {
    let (mut scheduler, collaborators) = session(testdata::BANK_ALERT, MockScript::default());
    scheduler.submit(Intent::SpeakAssistant);
    scheduler.submit(Intent::SpeakAssistant);
    scheduler.run_until_idle();

    assert_eq!(scheduler.health().dropped, 1);
    assert_eq!(collaborators.narration.active_utterance(), Some(1));

    scheduler.advance_clock(1_000);
    assert_eq!(collaborators.narration.active_utterance(), None);
    assert_eq!(scheduler.engine().narration(), NarrationState::Idle);
}

/// Closing stops audio that is still playing.
#[test]
fn close_stops_narration() {
    let (mut scheduler, collaborators) = session(testdata::BANK_ALERT, MockScript::default());
    scheduler.submit(Intent::SpeakAssistant);
    scheduler.run_until_idle();
    assert!(collaborators.narration.active_utterance().is_some());

    scheduler.submit(Intent::Close);
    scheduler.run_until_idle();
    assert_eq!(collaborators.narration.active_utterance(), None);
    assert_eq!(scheduler.engine().narration(), NarrationState::Idle);
}

/// Failed synthesis leaves the session silent but otherwise unaffected.
#[test]
fn narration_failure_is_silent() {
    let script = MockScript {
        speech: SpeechScript::Fails,
        ..MockScript::default()
    };
    let (mut scheduler, collaborators) = session(testdata::BANK_ALERT, script);
    scheduler.submit(Intent::SpeakAssistant);
    scheduler.run_until_idle();

    assert_eq!(collaborators.narration.active_utterance(), None);
    assert_eq!(scheduler.engine().narration(), NarrationState::Idle);
    assert_eq!(scheduler.engine().phase(), SessionPhase::AtStep { index: 0 });
}

/// Hosts without haptics get one attempt, then alerts only shake.
#[test]
fn unsupported_haptics_are_not_retried() {
    let script = MockScript {
        haptics_supported: false,
        ..MockScript::default()
    };
    let (mut scheduler, collaborators) = session(testdata::BANK_ALERT, script);
    inspect(&mut scheduler, "pin");
    scheduler.run_until_idle();
    assert!(!scheduler.engine().haptics_supported());

    inspect(&mut scheduler, "card-number");
    scheduler.run_until_idle();
    assert_eq!(collaborators.haptics.pulses(), 0);
    assert!(scheduler.engine().is_shaking());
}

/// Budgets from the config bound each tick.
#[test]
fn config_budgets_bound_each_tick() {
    let report = decode_response(testdata::response(testdata::GRANDCHILD_RECIPE)).unwrap();
    let config = SessionConfig {
        intent_budget: 1,
        ..SessionConfig::default()
    };
    let engine = SandboxEngine::new(report.simulation, false, config.engine.clone());
    let collaborators = make_collaborators(MockScript::default());
    let mut scheduler = Scheduler::with_config(engine, collaborators.hub, &config);

    scheduler.submit(Intent::Inspect(ElementId::field("greeting")));
    scheduler.submit(Intent::Inspect(ElementId::field("question")));
    scheduler.run_once();
    assert_eq!(scheduler.pending_intents(), [1, 0, 0]);
    assert_eq!(scheduler.engine().inspected().len(), 1);

    scheduler.run_until_idle();
    assert_eq!(scheduler.pending_intents(), [0, 0, 0]);
    assert_eq!(scheduler.engine().inspected().len(), 2);
}
