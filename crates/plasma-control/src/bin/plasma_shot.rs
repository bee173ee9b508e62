// ─────────────────────────────────────────────────────────────────────
// SCPN Plasma Guard — Shot CLI
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Run one reference discharge and print its summary as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use plasma_control::scenario::ReferenceScenario;
use plasma_control::shot::run_shot;
use plasma_control::system::PlasmaControlSystem;
use plasma_types::config::MachineConfig;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Zero-dimensional tokamak discharge with disruption guard", long_about = None)]
struct Cli {
    /// Machine configuration (JSON). Built-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Simulated shot length [s].
    #[arg(long, default_value_t = 10.0)]
    duration: f64,
    /// Control step [s].
    #[arg(long, default_value_t = 1.0e-3)]
    dt: f64,
    /// Override the noise seed from the configuration.
    #[arg(long)]
    seed: Option<u64>,
    /// Flat-top plasma current target [MA].
    #[arg(long)]
    target: Option<f64>,
    /// Include the full diagnostic history in the output.
    #[arg(long)]
    history: bool,
    /// Write the summary here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => {
            let path = path.to_string_lossy();
            MachineConfig::from_file(&path)
                .with_context(|| format!("loading machine configuration from {path}"))?
        }
        None => MachineConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.rng_seed = seed;
    }
    info!(machine = %config.machine_name, duration = cli.duration, dt = cli.dt, "starting shot");

    let mut controller = ReferenceScenario::new(&config)?;
    let mut system = PlasmaControlSystem::new(config)?;
    if let Some(target) = cli.target {
        system.set_target(target)?;
    }
    let report = run_shot(&mut system, cli.duration, cli.dt, &mut controller)?;

    let summary = if cli.history {
        serde_json::json!({
            "report": report,
            "history": system.history().samples(),
        })
    } else {
        serde_json::to_value(&report)?
    };
    let text = serde_json::to_string_pretty(&summary)?;
    match &cli.output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("writing summary to {}", path.display()))?,
        None => println!("{text}"),
    }
    Ok(())
}
