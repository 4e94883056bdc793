//! Numerical engine for circuit simulation.
//!
//! ## Modified Nodal Analysis
//!
//! MNA assembles a system of equations `Ax = b` where `x` holds node
//! voltages and branch currents. See `matrix.rs` for the dense linear
//! algebra and `stamp.rs` for how each device contributes to `A`/`b`.
//!
//! ```text
//! [ G   B ] [ v ]   [ i ]
//! [ C   D ] [ j ] = [ e ]
//! ```
//!
//! Nonlinear devices (diode, BJT, MOSFET, JFET) are linearized around the
//! previous Newton iterate every pass; `newton.rs` drives that loop to a
//! fixed point for both DC and transient solves. `diagnostics.rs` flags
//! short circuits and excessive current, `history.rs` retains an
//! adaptively decimated trace, and `mixed_signal.rs` bridges the digital
//! device family to the analog solve each step.

pub mod diagnostics;
pub mod history;
pub mod matrix;
pub mod mixed_signal;
pub mod newton;
pub mod stamp;

pub use diagnostics::{check_post_solve_overcurrent, check_pre_solve_shorts, SHORT_I_THRESHOLD};
pub use history::{History, HistorySample, MAX_HISTORY};
pub use matrix::SystemMatrix;
pub use newton::{solve as newton_solve, NewtonResult, MAX_NEWTON_ITERS, NEWTON_TOL};
pub use stamp::{stamp_all, stamp_digital_drives, GMIN, GROUND_G};

/// Relative local-truncation-error tolerance driving adaptive step
/// accept/reject decisions.
pub const ERR_TOL: f64 = 0.05;
/// Shrinks the proposed next step below the estimate that would exactly
/// hit `ERR_TOL`, leaving headroom before the next rejection.
pub const SAFETY_FACTOR: f64 = 0.9;
/// Largest single-step shrink factor.
pub const MIN_FACTOR: f64 = 0.5;
/// Largest single-step growth factor.
pub const MAX_FACTOR: f64 = 2.0;
/// Below this relative change in the solution, the stepper considers the
/// circuit to have reached steady state and stops shrinking further.
pub const STEADY_TOL: f64 = 1e-3;
/// Maximum step-halving retries for one transient step before giving up.
pub const MAX_RETRIES: usize = 10;
/// Smallest step size the adaptive stepper will propose.
pub const MIN_DT: f64 = 1e-9;
/// Largest step size the adaptive stepper will propose.
pub const MAX_DT: f64 = 1e-2;
/// Step size used when adaptive stepping is disabled or at startup.
pub const DEFAULT_DT: f64 = 1e-7;
