//! # Voltaic Core
//!
//! An interactive electronic-circuit simulation core: Modified Nodal
//! Analysis (MNA) over a broad device taxonomy (passives, semiconductors,
//! op-amps, switches, digital logic), Newton-Raphson nonlinear solving,
//! backward-Euler companion models, an adaptive time-stepper, mixed-signal
//! ADC/DAC bridging, and short-circuit/overcurrent diagnostics.
//!
//! ## Architecture
//!
//! - [`topology`] - node/branch identifiers and the union-find topology builder
//! - [`circuit`] - the device/wire graph an external editor places
//! - [`devices`] - the closed device taxonomy (sources, passives, semiconductors,
//!   amplifiers, switches, digital)
//! - [`solver`] - MNA assembly, Gaussian elimination, the shared Newton-Raphson
//!   driver, diagnostics, decimated history, and the mixed-signal bridge
//! - [`simulation`] - the [`Simulation`] lifecycle API: `dc_analysis()`,
//!   `step()`, probing, and history retrieval
//! - [`dsl`] - an ambient SPICE-inspired netlist language for the CLI and tests;
//!   not part of the core's contract
//!
//! ## Usage
//!
//! ```no_run
//! use voltaic_core::{dsl, simulation::Simulation};
//!
//! let netlist = dsl::parse("GND 0\nV1 in 0 DC 10\nR1 in mid 10k\nR2 mid 0 10k\nPROBE mid\n").unwrap();
//! let built = dsl::to_circuit(&netlist).unwrap();
//! let probes: Vec<_> = built.probes.iter().map(|(_, id)| *id).collect();
//! let mut sim = Simulation::new(built.circuit).with_probes(probes);
//! sim.dc_analysis().unwrap();
//! assert!((sim.probe_voltage(0) - 5.0).abs() < 1e-6);
//! ```
//!
//! ## Numerical method
//!
//! Each tick assembles `Ax = b` (see [`solver::matrix`]) from every device's
//! stamp (see [`solver::stamp`]), relinearizing nonlinear devices around the
//! previous Newton iterate until `max|Δx|` falls below `NEWTON_TOL` (see
//! [`solver::newton`]). Reactive elements use backward-Euler companion
//! models rather than trapezoidal integration, trading a little accuracy for
//! unconditional numerical stability across the wide range of step sizes the
//! adaptive stepper proposes.

pub mod circuit;
pub mod devices;
pub mod dsl;
pub mod error;
pub mod simulation;
pub mod solver;
pub mod topology;

pub use circuit::Circuit;
pub use devices::semiconductors::THERMAL_VOLTAGE;
pub use error::{Result, SimError};
pub use simulation::Simulation;

#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmSimulation;
