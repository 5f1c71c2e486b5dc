// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `pcalc`: evaluate integer expressions as power circuits.
//!
//! Each invocation builds one circuit, evaluates the given expressions into
//! it, and reports a comparison, circuit statistics, or a Graphviz rendering.

mod eval;
mod expr;

use std::cmp::Ordering;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use power_circuit::{render, snapshot, CircuitConfig, CircuitStats, GraphCircuit, PowerCircuit};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Power circuit calculator")]
struct Args {
    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Run every contract check after each operation
    #[arg(long, global = true, conflicts_with = "unchecked")]
    checked: bool,
    /// Skip contract checks
    #[arg(long, global = true)]
    unchecked: bool,
    /// JSON file with a circuit configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare two expressions and print `<`, `=` or `>`
    Compare {
        /// Left-hand expression
        #[arg(allow_hyphen_values = true)]
        lhs: String,
        /// Right-hand expression
        #[arg(allow_hyphen_values = true)]
        rhs: String,
    },
    /// Print circuit statistics after evaluating an expression
    Stats {
        /// Expression to evaluate
        #[arg(allow_hyphen_values = true)]
        expr: String,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Render the circuit of an expression as Graphviz DOT
    Dot {
        /// Expression to evaluate
        #[arg(allow_hyphen_values = true)]
        expr: String,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct StatsReport {
    stats: CircuitStats,
    reduced_prefix_digest: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let config = load_config(args.config.as_deref(), args.checked, args.unchecked)?;
    debug!(?config, "circuit configuration");
    let mut pc = GraphCircuit::with_config(config);
    let mut out = io::stdout().lock();

    match args.command {
        Command::Compare { lhs, rhs } => {
            let a = evaluate(&mut pc, &lhs)?;
            let b = evaluate(&mut pc, &rhs)?;
            let symbol = match pc.compare(&a, &b)? {
                Ordering::Less => "<",
                Ordering::Equal => "=",
                Ordering::Greater => ">",
            };
            writeln!(out, "{symbol}")?;
        }
        Command::Stats { expr, json } => {
            let _m = evaluate(&mut pc, &expr)?;
            let report = StatsReport {
                stats: pc.stats(),
                reduced_prefix_digest: hex::encode(snapshot::reduced_prefix_digest(&pc)?),
            };
            if json {
                serde_json::to_writer_pretty(&mut out, &report)?;
                writeln!(out)?;
            } else {
                writeln!(out, "{}", report.stats)?;
                writeln!(out, "digest {}", report.reduced_prefix_digest)?;
            }
        }
        Command::Dot { expr, output } => {
            let m = evaluate(&mut pc, &expr)?;
            if let Some(path) = output {
                render::write_dot(&path, &pc, &[&m])
                    .with_context(|| format!("write {}", path.display()))?;
                info!(path = %path.display(), "wrote dot file");
            } else {
                out.write_all(render::to_dot(&pc, &[&m])?.as_bytes())?;
            }
        }
    }
    Ok(())
}

fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("").add_directive(level.parse()?),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn load_config(path: Option<&Path>, checked: bool, unchecked: bool) -> Result<CircuitConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parse config {}", path.display()))?
        }
        None => CircuitConfig::default(),
    };
    if checked {
        config.check_invariants = true;
    }
    if unchecked {
        config.check_invariants = false;
    }
    Ok(config)
}

fn evaluate(pc: &mut GraphCircuit, text: &str) -> Result<power_circuit::Marking> {
    let parsed = expr::parse(text).with_context(|| format!("parse {text:?}"))?;
    let marking = eval::evaluate(pc, &parsed).with_context(|| format!("evaluate {text:?}"))?;
    Ok(marking)
}
