use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use varimotion::{
    Document, Engine, EngineOpts, GroupSummary, HostOp, RecordingHost, SignalOutcome, TimerOutcome,
};

#[derive(Parser, Debug)]
#[command(name = "varimotion", version)]
struct Cli {
    /// Log engine decisions to stderr (`RUST_LOG` takes precedence).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print discovered variant groups and their initial variants as JSON.
    Inspect(InspectArgs),
    /// Run switches against a recording host and print the host operations as JSON.
    Simulate(SimulateArgs),
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Input document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Switch to run, as `GROUP=VARIANT` (ids or names). Repeatable; runs in order.
    #[arg(long = "switch", value_parser = parse_switch)]
    switches: Vec<(String, String)>,

    /// Report every started animation as finished right after each switch.
    #[arg(long, default_value_t = false)]
    complete: bool,

    /// After all switches, advance the host clock and deliver due timers.
    #[arg(long)]
    advance_ms: Option<u64>,

    /// Engine options JSON.
    #[arg(long)]
    opts: Option<PathBuf>,
}

#[derive(Serialize)]
struct Step {
    action: String,
    outcome: String,
}

#[derive(Serialize)]
struct Report<'a> {
    steps: Vec<Step>,
    groups: Vec<GroupSummary>,
    ops: &'a [HostOp],
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(args),
        Command::Simulate(args) => cmd_simulate(args),
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "varimotion=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_switch(s: &str) -> Result<(String, String), String> {
    let (group, variant) = s
        .split_once('=')
        .ok_or_else(|| format!("expected GROUP=VARIANT, got '{s}'"))?;
    if group.trim().is_empty() || variant.trim().is_empty() {
        return Err(format!("expected GROUP=VARIANT, got '{s}'"));
    }
    Ok((group.trim().to_owned(), variant.trim().to_owned()))
}

fn load(in_path: &Path) -> anyhow::Result<Document> {
    Document::from_path(in_path)
        .with_context(|| format!("load document '{}'", in_path.display()))
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let doc = load(&args.in_path)?;
    let mut host = RecordingHost::for_document(&doc);
    let engine = Engine::initialize(&doc, EngineOpts::default(), &mut host)?;
    let out = serde_json::to_string_pretty(&engine.groups()).context("serialize groups")?;
    println!("{out}");
    Ok(())
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let doc = load(&args.in_path)?;
    let opts = match &args.opts {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("read opts '{}'", path.display()))?;
            EngineOpts::from_json_str(&raw)?
        }
        None => EngineOpts::default(),
    };

    let mut host = RecordingHost::for_document(&doc);
    let mut engine = Engine::initialize(&doc, opts, &mut host)?;
    let mut steps = Vec::new();

    for (group, variant) in &args.switches {
        let outcome = engine.request_switch(group, variant, &mut host);
        steps.push(Step {
            action: format!("switch {group}={variant}"),
            outcome: outcome.to_string(),
        });
        if args.complete {
            complete_all(&mut engine, &mut host, &mut steps);
        }
    }

    if let Some(ms) = args.advance_ms {
        // Step from one due time to the next so timers scheduled along the way still fire.
        let end = host.now() + Duration::from_millis(ms);
        while let Some(at) = host.next_due().filter(|at| *at <= end) {
            let dt = at.saturating_sub(host.now());
            for token in host.advance(dt) {
                let outcome = match engine.on_timer(token, &mut host) {
                    TimerOutcome::Stale => continue,
                    TimerOutcome::Deadline(switch) => {
                        format!("deadline finalized switch {}", switch.get())
                    }
                    TimerOutcome::Trigger(o) => o.to_string(),
                };
                steps.push(Step {
                    action: format!("timer {}", token.get()),
                    outcome,
                });
                if args.complete {
                    complete_all(&mut engine, &mut host, &mut steps);
                }
            }
        }
        host.advance(end.saturating_sub(host.now()));
    }

    let report = Report {
        steps,
        groups: engine.groups(),
        ops: host.ops(),
    };
    let out = serde_json::to_string_pretty(&report).context("serialize report")?;
    println!("{out}");
    Ok(())
}

fn complete_all(engine: &mut Engine, host: &mut RecordingHost, steps: &mut Vec<Step>) {
    for handle in host.take_running() {
        if let SignalOutcome::Finalized(switch) = engine.on_animation_end(handle, host) {
            steps.push(Step {
                action: "complete".to_owned(),
                outcome: format!("finalized switch {}", switch.get()),
            });
        }
    }
}
