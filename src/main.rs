//! Voltaic - interactive electronic-circuit simulator CLI.
//!
//! Parses a netlist, runs the DC operating point, then steps the transient
//! solver for a requested simulated duration, printing each probed node's
//! voltage trace.
//!
//! # Usage
//!
//! ```bash
//! voltaic circuit.net --duration 0.01
//! ```

use std::path::PathBuf;

use clap::Parser;
use voltaic_core::error::Result;
use voltaic_core::{dsl, Simulation};

/// Electronic-circuit simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the netlist file.
    #[arg(value_name = "NETLIST_FILE")]
    netlist_file: PathBuf,

    /// Simulated duration to step through, in seconds.
    #[arg(short, long, default_value_t = 0.01)]
    duration: f64,

    /// Fixed time step in seconds; omit to let the stepper choose one
    /// automatically from the circuit's highest AC frequency.
    #[arg(long)]
    dt: Option<f64>,

    /// Disable adaptive step-size control.
    #[arg(long)]
    no_adaptive: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let netlist = dsl::parse_file(&args.netlist_file)?;
    let built = dsl::to_circuit(&netlist)?;
    let probe_names: Vec<String> = built.probes.iter().map(|(name, _)| name.clone()).collect();
    let probe_ids = built.probes.iter().map(|(_, id)| *id).collect();

    let mut sim = Simulation::new(built.circuit).with_probes(probe_ids);
    sim.set_adaptive(!args.no_adaptive);
    sim.set_time_step(args.dt.unwrap_or_else(|| sim.auto_time_step()));

    sim.dc_analysis()?;
    println!("t=0.000000 {}", format_probes(&probe_names, &sim));

    while sim.time() < args.duration {
        sim.step()?;
        if let Some(warning) = sim.get_error() {
            log::warn!("{}", warning);
        }
        println!("t={:.6} {}", sim.time(), format_probes(&probe_names, &sim));
    }

    Ok(())
}

fn format_probes(names: &[String], sim: &Simulation) -> String {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{name}={:.6}", sim.probe_voltage(i)))
        .collect::<Vec<_>>()
        .join(" ")
}
