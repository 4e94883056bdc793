//! WASM bindings for Voltaic Core.
//!
//! Wraps [`Simulation`] behind a JavaScript-friendly API so a browser-hosted
//! schematic editor can drive DC/transient steps and read back probed node
//! voltages and history without a native build.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmSimulation } from 'voltaic_core';
//!
//! await init();
//!
//! const netlist = `
//!   GND 0
//!   V1 in 0 DC 5
//!   R1 in out 1k
//!   C1 out 0 1u
//!   PROBE out
//! `;
//!
//! const sim = new WasmSimulation(netlist);
//! sim.dc_analysis();
//! for (let i = 0; i < 1000; i++) sim.step();
//! console.log(sim.probe_voltage(0));
//! ```

use wasm_bindgen::prelude::*;

use crate::dsl;
use crate::simulation::Simulation;
use crate::topology::NodeId;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// WASM-compatible circuit simulation: wraps the native [`Simulation`]
/// lifecycle (`dc_analysis`/`step`/probing/history) behind `wasm-bindgen`.
#[wasm_bindgen]
pub struct WasmSimulation {
    sim: Simulation,
    probe_names: Vec<String>,
}

#[wasm_bindgen]
impl WasmSimulation {
    /// Parse a netlist string and build a simulation from it.
    #[wasm_bindgen(constructor)]
    pub fn new(netlist: &str) -> Result<WasmSimulation, JsValue> {
        let ast = dsl::parse(netlist).map_err(js_err)?;
        let built = dsl::to_circuit(&ast).map_err(js_err)?;
        let probe_names = built.probes.iter().map(|(name, _)| name.clone()).collect();
        let probe_ids: Vec<NodeId> = built.probes.iter().map(|(_, id)| *id).collect();
        let sim = Simulation::new(built.circuit).with_probes(probe_ids);
        Ok(WasmSimulation { sim, probe_names })
    }

    /// Run the DC operating-point analysis.
    #[wasm_bindgen(js_name = dcAnalysis)]
    pub fn dc_analysis(&mut self) -> Result<(), JsValue> {
        self.sim.dc_analysis().map_err(js_err)
    }

    /// Advance one transient step.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<(), JsValue> {
        self.sim.step().map_err(js_err)
    }

    /// Clamp and set a fixed time step (seconds).
    #[wasm_bindgen(js_name = setTimeStep)]
    pub fn set_time_step(&mut self, dt: f64) {
        self.sim.set_time_step(dt);
    }

    /// Enable or disable adaptive step-size control.
    #[wasm_bindgen(js_name = setAdaptive)]
    pub fn set_adaptive(&mut self, enabled: bool) {
        self.sim.set_adaptive(enabled);
    }

    /// A step size automatically chosen from the circuit's highest AC
    /// frequency.
    #[wasm_bindgen(js_name = autoTimeStep)]
    pub fn auto_time_step(&self) -> f64 {
        self.sim.auto_time_step()
    }

    /// Zero simulated time and every device's dynamic state.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.sim.reset();
    }

    /// Current simulated time, in seconds.
    #[wasm_bindgen(getter)]
    pub fn time(&self) -> f64 {
        self.sim.time()
    }

    /// Voltage at the `idx`-th `PROBE` statement, in declaration order.
    #[wasm_bindgen(js_name = probeVoltage)]
    pub fn probe_voltage(&self, idx: usize) -> f64 {
        self.sim.probe_voltage(idx)
    }

    /// The names of every `PROBE` statement, in declaration order.
    #[wasm_bindgen(js_name = probeNames)]
    pub fn probe_names(&self) -> Vec<JsValue> {
        self.probe_names.iter().map(|n| JsValue::from_str(n)).collect()
    }

    /// Up to `max_points` most recent `(time, value)` samples for the
    /// `channel`-th probed node.
    #[wasm_bindgen(js_name = history)]
    pub fn history(&self, channel: usize, max_points: usize) -> Vec<f64> {
        let (times, values) = self.sim.get_history(channel, max_points);
        times.into_iter().chain(values).collect()
    }

    /// The most recent non-fatal warning, or `undefined` if none.
    #[wasm_bindgen(js_name = getError)]
    pub fn get_error(&self) -> Option<String> {
        self.sim.get_error().map(str::to_string)
    }
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
