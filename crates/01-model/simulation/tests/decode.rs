//! Coverage for gateway response decoding and validation.

use simulation::{
    decode_response, DecodeError, ElementId, FieldKind, ScenarioKind, Severity, ThreatLevel,
    Verdict,
};

fn minimal_response(steps: &str) -> String {
    format!(
        r#"{{
            "isScam": true,
            "threatLevel": "danger",
            "summary": "s",
            "traps": [],
            "simulationType": "generic",
            "simulation": {{ "brandName": "B", "visualVibePrompt": "p", "steps": {steps} }}
        }}"#
    )
}

fn step_json(id: &str, fields: &str) -> String {
    format!(
        r#"{{ "id": "{id}", "title": "t", "subtitle": "st", "siteUrl": "https://x.example",
             "headerColor": "blue", "doriIntro": "hi", "fields": {fields} }}"#
    )
}

/// The recorded bank alert decodes into the model the engine consumes.
#[test]
fn bank_alert_fixture_decodes() {
    let report = decode_response(testdata::response(testdata::BANK_ALERT)).unwrap();

    assert!(report.is_scam());
    assert_eq!(report.judgment.threat_level, ThreatLevel::Danger);
    assert_eq!(report.judgment.scenario, ScenarioKind::Bank);
    assert_eq!(report.judgment.findings.len(), 3);
    assert_eq!(report.judgment.high_severity().count(), 2);
    assert_eq!(
        report.judgment.findings[1].location.as_deref(),
        Some("link")
    );
    assert_eq!(report.judgment.findings[2].severity, Severity::Medium);

    let model = &report.simulation;
    assert_eq!(model.subject_name, "Leumi Secure");
    assert_eq!(model.step_count(), 2);

    let login = &model.steps[0];
    assert_eq!(login.display_url, "https://leumi-secure-cancel.net/login");
    assert!(!login.url_is_trap());
    let ids: Vec<&str> = login.fields.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, ["card-number", "help", "pin"], "wire order is kept");
    assert_eq!(login.fields[2].kind, FieldKind::Password);
    assert_eq!(login.required_count(true), 2);

    let cancel = &model.steps[1];
    assert!(cancel.url_is_trap());
    assert_eq!(
        cancel.verdict_of(&ElementId::Url).and_then(Verdict::explanation),
        Some("The address is not the bank's official domain.")
    );
}

/// Safe fixtures keep the safety reasons as the active explanations.
#[test]
fn safe_fixture_uses_safety_reasons() {
    let report = decode_response(testdata::response(testdata::GRANDCHILD_RECIPE)).unwrap();

    assert!(!report.is_scam());
    let step = &report.simulation.steps[0];
    assert_eq!(step.required_count(false), 3);
    assert!(step.fields.iter().all(|f| !f.is_trap()));
    assert_eq!(
        step.fields[0].verdict.explanation(),
        Some("No urgency, no threats, and no request for money.")
    );
}

/// Every fixture in the pack passes validation.
#[test]
fn all_fixtures_decode() {
    for meta in testdata::list() {
        let report = decode_response(testdata::response(meta.name))
            .unwrap_or_else(|err| panic!("{} failed: {err}", meta.name));
        assert_eq!(report.simulation.step_count(), meta.steps, "{}", meta.name);
    }
}

/// A simulation without steps cannot drive a session.
#[test]
fn empty_steps_are_rejected() {
    let err = decode_response(&minimal_response("[]")).unwrap_err();
    assert!(matches!(err, DecodeError::NoSteps));
}

/// Step ids key the progress map, so duplicates are rejected.
#[test]
fn duplicate_step_ids_are_rejected() {
    let steps = format!("[{}, {}]", step_json("a", "[]"), step_json("a", "[]"));
    let err = decode_response(&minimal_response(&steps)).unwrap_err();
    assert!(matches!(err, DecodeError::DuplicateStep(id) if id == "a"));
}

/// Field ids must be unique within their step.
#[test]
fn duplicate_field_ids_are_rejected() {
    let fields = r#"[
        { "id": "f", "label": "l", "type": "text", "isTrap": true },
        { "id": "f", "label": "l", "type": "button", "isTrap": false }
    ]"#;
    let steps = format!("[{}]", step_json("a", fields));
    let err = decode_response(&minimal_response(&steps)).unwrap_err();
    assert!(matches!(err, DecodeError::DuplicateField { step, field } if step == "a" && field == "f"));
}

/// Blank ids are treated as malformed.
#[test]
fn blank_ids_are_rejected() {
    let steps = format!("[{}]", step_json(" ", "[]"));
    let err = decode_response(&minimal_response(&steps)).unwrap_err();
    assert!(matches!(err, DecodeError::EmptyId(_)));
}

/// Unknown enum spellings fail instead of being guessed.
#[test]
fn unknown_field_kind_is_rejected() {
    let fields = r#"[{ "id": "f", "label": "l", "type": "slider", "isTrap": false }]"#;
    let steps = format!("[{}]", step_json("a", fields));
    let err = decode_response(&minimal_response(&steps)).unwrap_err();
    assert!(matches!(err, DecodeError::Json(_)));
}

/// Missing required keys fail at the boundary.
#[test]
fn missing_simulation_is_rejected() {
    let raw = r#"{ "isScam": false, "threatLevel": "safe", "summary": "", "traps": [], "simulationType": "generic" }"#;
    assert!(matches!(decode_response(raw), Err(DecodeError::Json(_))));
    assert!(matches!(decode_response("not json"), Err(DecodeError::Json(_))));
}

/// Optional wire keys default and blank explanations normalise to `None`.
#[test]
fn optional_keys_default() {
    let fields = r#"[{ "id": "f", "label": "l", "type": "info", "isTrap": true, "doriWarning": "  " }]"#;
    let steps = format!("[{}]", step_json("a", fields));
    let report = decode_response(&minimal_response(&steps)).unwrap();
    let step = &report.simulation.steps[0];

    assert!(!step.url_is_trap());
    assert_eq!(step.fields[0].placeholder, None);
    assert_eq!(step.fields[0].verdict, Verdict::Trap { warning: None });
}

/// A decoded report serializes with its shared simulation inlined.
#[test]
fn report_serializes_with_simulation() {
    let report = decode_response(testdata::response(testdata::BANK_ALERT)).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["judgment"]["is_scam"], true);
    assert_eq!(json["simulation"]["subject_name"], "Leumi Secure");
    assert_eq!(json["simulation"]["steps"][0]["fields"][0]["id"], "card-number");
}
