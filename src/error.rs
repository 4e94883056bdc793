//! Error types for the circuit simulation core.
//!
//! This module provides a unified error type [`SimError`] that covers every
//! error condition that can occur during netlist parsing, circuit topology
//! construction, and simulation (DC, transient, and mixed-signal).

use thiserror::Error;

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Unified error type for all `voltaic_core` operations.
#[derive(Error, Debug)]
pub enum SimError {
    // ============ Netlist Parsing Errors ============
    /// Error during lexical analysis
    #[error("Lexer error at line {line}, column {column}: {message}")]
    LexerError {
        line: usize,
        column: usize,
        message: String,
    },

    /// Error during parsing
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Invalid device definition
    #[error("Invalid device '{name}' at line {line}: {message}")]
    InvalidDevice {
        name: String,
        line: usize,
        message: String,
    },

    /// Unknown device type
    #[error("Unknown device type '{device_type}' at line {line}")]
    UnknownDeviceType { device_type: String, line: usize },

    /// Invalid parameter value
    #[error("Invalid parameter '{param}' for device '{device}': {message}")]
    InvalidParameter {
        device: String,
        param: String,
        message: String,
    },

    /// Undefined model reference
    #[error("Undefined model '{model}' referenced by device '{device}'")]
    UndefinedModel { model: String, device: String },

    /// Duplicate model name
    #[error("Duplicate model name '{name}'")]
    DuplicateModel { name: String },

    // ============ Topology Errors ============
    /// No ground reference present in the circuit.
    #[error("Circuit has no ground reference")]
    NoGround,

    /// The circuit has no devices at all.
    #[error("Circuit is empty")]
    EmptyCircuit,

    /// Topology build produced zero non-ground nodes.
    #[error("Circuit has no non-ground nodes")]
    NoNodes,

    // ============ Simulation Errors ============
    /// A voltage-defining device's terminals collapsed onto the same node
    /// (pre-solve), or a measured current exceeded the short-circuit
    /// threshold (post-solve).
    #[error("Short circuit detected ({reason}), implicated devices: {device_ids:?}")]
    ShortCircuit {
        device_ids: Vec<usize>,
        reason: String,
    },

    /// Newton-Raphson iteration did not converge within the iteration
    /// budget. Non-fatal: the last iterate is kept by the caller.
    #[error("Newton-Raphson did not converge after {iterations} iterations (max |Δx| = {residual:.3e})")]
    NonConvergence { iterations: usize, residual: f64 },

    /// The solver failed outright (allocation failure, or an adaptive
    /// transient step that could not be completed).
    #[error("Solver failure: {message}")]
    SolverFailure { message: String },

    /// The adaptive stepper exhausted its retry budget for one step.
    #[error("Adaptive time-step retries exceeded ({retries} attempts, dt={dt:.3e})")]
    AdaptiveRetriesExceeded { retries: usize, dt: f64 },

    /// The dense linear solve could not proceed (allocation failure only;
    /// near-singular pivots are clamped rather than rejected).
    #[error("Singular matrix: {message}")]
    SingularMatrix { message: String },

    /// An invalid simulation parameter was supplied (e.g. dt outside the
    /// supported range, or a negative component value).
    #[error("Invalid simulation parameter: {message}")]
    InvalidSimulationParam { message: String },

    // ============ I/O Errors ============
    /// Error reading a netlist file.
    #[error("Failed to read netlist file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ============ WASM Errors ============
    /// WASM-specific error.
    #[cfg(feature = "wasm")]
    #[error("Wasm error: {message}")]
    WasmError { message: String },
}

impl SimError {
    /// Create a lexer error.
    pub fn lexer(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::LexerError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid-device error.
    pub fn invalid_device(name: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::InvalidDevice {
            name: name.into(),
            line,
            message: message.into(),
        }
    }

    /// Create a non-convergence warning.
    pub fn non_convergence(iterations: usize, residual: f64) -> Self {
        Self::NonConvergence {
            iterations,
            residual,
        }
    }

    /// Create a short-circuit error.
    pub fn short_circuit(device_ids: Vec<usize>, reason: impl Into<String>) -> Self {
        Self::ShortCircuit {
            device_ids,
            reason: reason.into(),
        }
    }
}
