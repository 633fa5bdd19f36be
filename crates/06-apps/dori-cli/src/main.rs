//! Command-line driver for Dori sandbox sessions.
//!
//! Loads a recorded gateway response, runs it through the hosting-app flow, and
//! plays the resulting sandbox against the scripted collaborators.

use anyhow::{bail, Context, Result};
use app::{AppFlow, Scheduler, SessionConfig, ANALYSIS_FAILED_NOTICE};
use clap::{Parser, Subcommand};
use futures::executor::block_on;
use hub::{ElementId, Intent};
use sandbox::{SandboxView, SessionPhase};
use services_analysis::recorded;
use simulation::{decode_response, AnalysisInput, AnalysisReport};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Text rendering helpers used by the CLI commands.
mod render {
    use sandbox::{Background, NarrationState, SandboxView, SessionPhase};
    use simulation::{AnalysisReport, ElementId, SimulationStep};
    use std::fmt::Write;

    /// Format the judgment and the shape of the simulation.
    pub fn summary(report: &AnalysisReport) -> String {
        let judgment = &report.judgment;
        let model = &report.simulation;
        let mut out = String::new();
        writeln!(
            out,
            "Verdict: {} ({:?}, {:?})",
            if judgment.is_scam { "scam" } else { "safe" },
            judgment.threat_level,
            judgment.scenario
        )
        .expect("write verdict");
        writeln!(out, "Summary: {}", judgment.summary).expect("write summary");
        for finding in &judgment.findings {
            writeln!(
                out,
                "  [{:?}] {}: {}",
                finding.severity, finding.pattern, finding.reason
            )
            .expect("write finding");
        }
        writeln!(
            out,
            "Simulation: {} ({} steps)",
            model.subject_name,
            model.step_count()
        )
        .expect("write simulation");
        for (index, step) in model.steps.iter().enumerate() {
            writeln!(
                out,
                "  {}. {} - {} required",
                index + 1,
                step.title,
                step.required_count(judgment.is_scam)
            )
            .expect("write step");
        }
        out
    }

    /// Format one frame of the sandbox as the learner would see it.
    pub fn view(view: &SandboxView<'_>) -> String {
        let mut out = String::new();
        writeln!(out, "== {}: {} ==", view.mode.title(), view.subject_name)
            .expect("write header");
        match view.phase {
            SessionPhase::Finished => {
                out.push_str("Session finished.\n");
                return out;
            }
            SessionPhase::Closed => {
                out.push_str("Session closed.\n");
                return out;
            }
            SessionPhase::AtStep { .. } | SessionPhase::Transitioning { .. } => {}
        }
        if let Some(step) = view.step {
            writeln!(
                out,
                "Step {}/{}: {}",
                view.step_index + 1,
                view.step_count,
                step.title
            )
            .expect("write step");
            out.push_str(&elements(step, view.inspected));
        }
        let (inspected, required) = view.tally();
        writeln!(
            out,
            "{}: {inspected}/{required}",
            view.mode.tally_label()
        )
        .expect("write tally");
        for revealed in &view.revealed {
            writeln!(
                out,
                "  {} {}: {}",
                if revealed.is_trap { "!" } else { "+" },
                revealed.label,
                revealed.explanation.unwrap_or("-")
            )
            .expect("write revealed");
        }
        writeln!(out, "Dori: {}", view.assistant_message).expect("write assistant");
        writeln!(out, "{}", status(view)).expect("write status");
        out
    }

    fn elements(step: &SimulationStep, inspected: &[ElementId]) -> String {
        let mut out = String::new();
        let mark = |element: &ElementId| if inspected.contains(element) { "x" } else { " " };
        writeln!(
            out,
            "  [{}] url-trap  {}",
            mark(&ElementId::Url),
            step.display_url
        )
        .expect("write url");
        for field in &step.fields {
            writeln!(
                out,
                "  [{}] {}  {}",
                mark(&field.element_id()),
                field.id,
                field.label
            )
            .expect("write field");
        }
        out
    }

    fn status(view: &SandboxView<'_>) -> String {
        let background = match view.background {
            Background::NotRequested => "none",
            Background::Loading => "loading",
            Background::Ready { .. } => "ready",
            Background::Fallback => "fallback",
        };
        let narration = match view.narration {
            NarrationState::Idle => "idle",
            NarrationState::Playing { .. } => "playing",
        };
        let next = if matches!(view.phase, SessionPhase::Transitioning { .. }) {
            "moving on"
        } else if !view.can_advance {
            "locked"
        } else if view.final_step {
            "finish"
        } else {
            "next"
        };
        format!(
            "[advance: {next}] [background: {background}] [narration: {narration}]{}",
            if view.shaking { " [alert]" } else { "" }
        )
    }
}

/// Play Dori sandbox sessions from recorded analysis responses.
#[derive(Parser, Debug)]
#[command(author, version, about = "Drive a Dori sandbox session", long_about = None)]
struct Cli {
    /// Path to a recorded gateway response (JSON).
    #[arg(value_name = "RESPONSE")]
    response: PathBuf,

    /// Session config file (JSON); defaults apply when omitted.
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the judgment and the steps of the simulation.
    Summary,
    /// Apply a comma-separated script of learner actions.
    ///
    /// Tokens: an element id inspects it, `>` advances, `!` closes, `?` reads the
    /// assistant aloud, `+N` lets N milliseconds pass.
    Play {
        #[arg(short, long, default_value = "", value_name = "SCRIPT")]
        script: String,
        /// Emit one JSON view per action instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Inspect every required element of every step until the session finishes.
    Autoplay {
        /// Emit one JSON view per action instead of text.
        #[arg(long)]
        json: bool,
    },
}

/// One learner action from a play script.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Action {
    Inspect(ElementId),
    Advance,
    Close,
    Speak,
    Wait(u64),
}

impl FromStr for Action {
    type Err = String;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            ">" => Ok(Action::Advance),
            "!" => Ok(Action::Close),
            "?" => Ok(Action::Speak),
            _ => {
                if let Some(ms) = token.strip_prefix('+') {
                    return ms
                        .parse::<u64>()
                        .map(Action::Wait)
                        .map_err(|_| format!("invalid wait '{token}'"));
                }
                match token.parse::<ElementId>() {
                    Ok(element) => Ok(Action::Inspect(element)),
                    Err(never) => match never {},
                }
            }
        }
    }
}

fn parse_script(script: &str) -> Result<Vec<Action>> {
    script
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| token.parse::<Action>().map_err(anyhow::Error::msg))
        .collect()
}

/// Upper bound on autoplay actions, in case a step can never complete.
const MAX_AUTOPLAY_ACTIONS: usize = 512;

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SessionConfig::from_path(path)?,
        None => SessionConfig::default(),
    };
    let (mut flow, report) = load_report(&cli.response)?;

    match cli.command {
        Command::Summary => print!("{}", render::summary(&report)),
        Command::Play { script, json } => {
            let actions = parse_script(&script)?;
            let mut scheduler = open_session(&mut flow, &config)?;
            emit(&scheduler.view(), json)?;
            for action in actions {
                apply(&mut scheduler, &action);
                emit(&scheduler.view(), json)?;
            }
            leave_session(&mut flow, scheduler.engine().phase())?;
        }
        Command::Autoplay { json } => {
            let mut scheduler = open_session(&mut flow, &config)?;
            emit(&scheduler.view(), json)?;
            autoplay(&mut scheduler, &config, |view| emit(view, json))?;
            leave_session(&mut flow, scheduler.engine().phase())?;
        }
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Log records from the library crates are forwarded to the same subscriber.
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Runs the recorded response through the hosting-app analysis flow.
fn load_report(path: &Path) -> Result<(AppFlow, AnalysisReport)> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read response {path:?}"))?;
    let (flow, report) =
        report_from_response(&raw).with_context(|| format!("rejected response {path:?}"))?;
    info!(
        "loaded {path:?}: scam={} steps={}",
        report.is_scam(),
        report.simulation.step_count()
    );
    Ok((flow, report))
}

/// Runs a recorded model response through the hosting-app flow.
fn report_from_response(raw: &str) -> Result<(AppFlow, AnalysisReport)> {
    let gateway = recorded(raw);
    let mut flow = AppFlow::new();
    // A replay has no learner message; the recorded text stands in for it so
    // the blank-input guard still applies.
    let input = AnalysisInput::text(raw).context("empty response")?;

    if !block_on(flow.analyze(&gateway, input))? {
        // Decode again locally to surface the precise reason.
        decode_response(raw)?;
        bail!("{}", flow.notice().unwrap_or(ANALYSIS_FAILED_NOTICE));
    }
    let Some(report) = flow.report().cloned() else {
        bail!("analysis finished without a report");
    };
    Ok((flow, report))
}

fn open_session(flow: &mut AppFlow, config: &SessionConfig) -> Result<Scheduler> {
    let engine = flow.open_sandbox(config.engine.clone())?;
    let mut scheduler = Scheduler::with_config(engine, mock::make_hub(), config);
    scheduler.submit(Intent::Start);
    scheduler.run_until_idle();
    Ok(scheduler)
}

fn leave_session(flow: &mut AppFlow, phase: SessionPhase) -> Result<()> {
    match phase {
        SessionPhase::Finished => flow.finish()?,
        SessionPhase::Closed => flow.close_sandbox()?,
        SessionPhase::AtStep { .. } | SessionPhase::Transitioning { .. } => {}
    }
    debug!("flow after session: {:?}", flow.phase());
    Ok(())
}

fn apply(scheduler: &mut Scheduler, action: &Action) {
    match action {
        Action::Inspect(element) => scheduler.submit(Intent::Inspect(element.clone())),
        Action::Advance => scheduler.submit(Intent::Advance),
        Action::Close => scheduler.submit(Intent::Close),
        Action::Speak => scheduler.submit(Intent::SpeakAssistant),
        Action::Wait(ms) => scheduler.advance_clock(*ms),
    }
    scheduler.run_until_idle();
    let cues = scheduler.drain_cues();
    if !cues.is_empty() {
        debug!("cues after {action:?}: {cues:?}");
    }
}

/// Completes every step in order, calling `on_frame` after each action.
fn autoplay(
    scheduler: &mut Scheduler,
    config: &SessionConfig,
    mut on_frame: impl FnMut(&SandboxView<'_>) -> Result<()>,
) -> Result<()> {
    let mut actions = 0;
    while !scheduler.engine().is_terminal() {
        let engine = scheduler.engine();
        let next = match engine.current_step() {
            Some(step) if !engine.is_current_step_complete() => step
                .required_elements(engine.is_scam())
                .into_iter()
                .find(|element| !engine.inspected().contains(element))
                .map(Action::Inspect),
            Some(_) => Some(Action::Advance),
            None => None,
        };
        let Some(action) = next else {
            bail!("step {} cannot be completed", engine.current_index() + 1);
        };

        apply(scheduler, &action);
        if action == Action::Advance && !scheduler.engine().is_terminal() {
            apply(scheduler, &Action::Wait(config.engine.transition_delay_ms));
        }
        on_frame(&scheduler.view())?;

        actions += 1;
        if actions >= MAX_AUTOPLAY_ACTIONS {
            bail!("autoplay gave up after {actions} actions");
        }
    }
    Ok(())
}

fn emit(view: &SandboxView<'_>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(view)?);
    } else {
        println!("{}", render::view(view));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandbox::{EngineOptions, SandboxEngine};

    fn report(fixture: &str) -> AnalysisReport {
        decode_response(testdata::response(fixture)).expect("fixture decodes")
    }

    fn scheduler(fixture: &str) -> Scheduler {
        let report = report(fixture);
        let engine = SandboxEngine::new(
            report.simulation,
            report.judgment.is_scam,
            EngineOptions::default(),
        );
        let mut scheduler = Scheduler::new(engine, mock::make_hub());
        scheduler.submit(Intent::Start);
        scheduler.run_until_idle();
        scheduler
    }

    #[test]
    fn script_tokens_parse() {
        let actions = parse_script("url-trap, pin ,>,+800,?,!").expect("script parses");
        assert_eq!(
            actions,
            vec![
                Action::Inspect(ElementId::Url),
                Action::Inspect(ElementId::field("pin")),
                Action::Advance,
                Action::Wait(800),
                Action::Speak,
                Action::Close,
            ]
        );
        assert!(parse_script("").expect("empty script").is_empty());
        assert!(parse_script("+soon").is_err());
    }

    #[test]
    fn recorded_response_opens_result_screen() {
        let (flow, report) =
            report_from_response(testdata::response(testdata::PARCEL_FEE)).expect("loads");
        assert!(report.is_scam());
        assert_eq!(flow.report(), Some(&report));

        let err = report_from_response("  \n").expect_err("blank response");
        assert!(format!("{err:#}").contains("empty response"));
        assert!(report_from_response("{\"judgment\": 1}").is_err());
    }

    #[test]
    fn summary_lists_steps() {
        let text = render::summary(&report(testdata::BANK_ALERT));
        assert!(text.starts_with("Verdict: scam"));
        assert!(text.contains("(2 steps)"));
        assert!(text.contains("  1. "));
    }

    #[test]
    fn view_render_marks_inspected_elements() {
        let mut scheduler = scheduler(testdata::BANK_ALERT);
        apply(&mut scheduler, &Action::Inspect(ElementId::field("pin")));

        let text = render::view(&scheduler.view());
        assert!(text.starts_with("== Trap Finder: "));
        assert!(text.contains("Step 1/2: "));
        assert!(text.contains("  [x] pin  "));
        assert!(text.contains("  [ ] card-number  "));
        assert!(text.contains("Scams Spotted: 1/2"));
        assert!(text.contains("[advance: locked]"));
        assert!(text.contains("[alert]"));
    }

    #[test]
    fn autoplay_finishes_every_fixture() {
        for fixture in [
            testdata::BANK_ALERT,
            testdata::PARCEL_FEE,
            testdata::GRANDCHILD_RECIPE,
        ] {
            let mut scheduler = scheduler(fixture);
            let mut frames = 0;
            autoplay(&mut scheduler, &SessionConfig::default(), |_| {
                frames += 1;
                Ok(())
            })
            .expect("autoplay completes");
            assert_eq!(scheduler.engine().phase(), SessionPhase::Finished);
            assert!(frames > 0);
            assert!(render::view(&scheduler.view()).contains("Session finished."));
        }
    }

    #[test]
    fn closing_script_ends_session() {
        let mut scheduler = scheduler(testdata::BANK_ALERT);
        for action in parse_script("card-number,pin,>,+400,!").expect("script parses") {
            apply(&mut scheduler, &action);
        }
        assert_eq!(scheduler.engine().phase(), SessionPhase::Closed);
        assert_eq!(scheduler.pending_timers(), 0);
    }
}
