// Keysense Scenario Replay CLI
// Drives an engine with a scripted event stream and prints what happens

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;

use keysense_core::{
    Engine, EngineConfig, KeyLocation, RawKey, RawModifiers, SequenceDefinition,
};

/// Replay a scripted key scenario against the matching engine
#[derive(Parser, Debug)]
#[command(name = "keysense")]
#[command(about = "Replay scripted key scenarios against the matching engine", long_about = None)]
struct Args {
    /// TOML scenario file (definitions plus a timed event script)
    scenario: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Validate the scenario and exit
    #[arg(long)]
    check: bool,
}

/// One scripted step. Exactly one of down/up/tick/recover per step.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct Step {
    /// Timestamp in milliseconds
    at: u64,
    #[serde(default)]
    down: Option<String>,
    #[serde(default)]
    up: Option<String>,
    #[serde(default)]
    tick: bool,
    #[serde(default)]
    recover: bool,
    /// Location for the down/up raw key
    #[serde(default)]
    location: KeyLocation,
    /// Raw modifier snapshot delivered with the event
    #[serde(default)]
    modifiers: RawModifiers,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Scenario {
    #[serde(default)]
    config: EngineConfig,
    #[serde(default)]
    sequences: Vec<SequenceDefinition>,
    #[serde(default)]
    steps: Vec<Step>,
}

impl Scenario {
    fn from_toml_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        let scenario: Scenario = toml::from_str(&content)
            .with_context(|| format!("parsing scenario {}", path.display()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<()> {
        for (index, step) in self.steps.iter().enumerate() {
            let actions = [
                step.down.is_some(),
                step.up.is_some(),
                step.tick,
                step.recover,
            ]
            .iter()
            .filter(|set| **set)
            .count();
            if actions != 1 {
                bail!(
                    "step {} must have exactly one of down/up/tick/recover",
                    index + 1
                );
            }
        }
        Ok(())
    }
}

fn run(scenario: Scenario) -> Result<()> {
    let mut engine = Engine::with_config(scenario.config.clone());
    engine
        .register(scenario.sequences.clone())
        .context("registering sequences")?;

    engine.on_event(|event| {
        let classification = match event.duration {
            Some(_) if event.is_tap => " (tap)",
            Some(_) => " (hold)",
            None => "",
        };
        println!(
            "[{:>6}ms] {} {}{}",
            event.timestamp, event.action, event.key, classification
        );
    });
    engine.on_match(|matched| {
        println!(
            "[{:>6}ms] match {} '{}'",
            matched.timestamp, matched.kind, matched.sequence_id
        );
    });

    let mut steps = scenario.steps;
    steps.sort_by_key(|step| step.at);

    let hold_ids: Vec<String> = engine
        .definitions()
        .filter(|def| matches!(def.kind(), keysense_core::SequenceKind::Hold))
        .map(|def| def.id.to_string())
        .collect();

    for step in steps {
        if let Some(code) = &step.down {
            engine.key_down(
                RawKey::with_location(code, step.location),
                step.at,
                step.modifiers,
            );
        } else if let Some(code) = &step.up {
            engine.key_up(
                RawKey::with_location(code, step.location),
                step.at,
                step.modifiers,
            );
        } else if step.recover {
            println!("[{:>6}ms] recover", step.at);
            engine.recover(step.at);
        } else {
            engine.tick(step.at);
            for id in &hold_ids {
                let state = engine.hold_state(id);
                if state.is_charging || state.just_completed || state.just_cancelled {
                    println!(
                        "[{:>6}ms] hold '{}' progress {:>5.1}% scale {:.2} glow {:.2}{}{}",
                        step.at,
                        id,
                        state.progress,
                        state.scale,
                        state.glow,
                        if state.just_completed { " completed" } else { "" },
                        if state.just_cancelled { " cancelled" } else { "" },
                    );
                }
            }
        }
    }

    let total = engine.match_history().len();
    println!("{} match(es) recorded", total);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    let scenario = Scenario::from_toml_path(&args.scenario)?;
    println!(
        "{} sequence(s), {} step(s)",
        scenario.sequences.len(),
        scenario.steps.len()
    );
    if args.check {
        println!("Scenario is valid");
        return Ok(());
    }
    run(scenario)
}
