//! The `Simulation` orchestrator: owns a [`Circuit`] plus the Newton
//! iterate, companion-model history, and the lifecycle a host (editor, CLI,
//! or WASM front-end) drives via `dc_analysis()`/`step()`.

use crate::circuit::Circuit;
use crate::devices::sources::Waveform;
use crate::devices::Device;
use crate::error::{Result, SimError};
use crate::solver::{self, diagnostics, history::History, mixed_signal, newton};
use crate::topology::{NodeId, NodeMap};

/// Step size used for the DC operating-point solve: large enough that
/// capacitors behave as open circuits (`Geq = C/dt ≈ 0`) and inductors as
/// short circuits (`Req = L/dt ≈ 0`).
const DC_DT: f64 = 1e9;

fn relative_error(new: &[f64], old: &[f64]) -> f64 {
    new.iter()
        .zip(old.iter())
        .fold(0.0f64, |acc, (n, o)| acc.max((n - o).abs() / n.abs().max(o.abs()).max(1e-6)))
}

fn waveform_freq_hz(w: Waveform) -> Option<f64> {
    match w {
        Waveform::Dc | Waveform::Noise => None,
        Waveform::Sine { freq_hz, .. }
        | Waveform::Square { freq_hz, .. }
        | Waveform::Triangle { freq_hz, .. }
        | Waveform::Sawtooth { freq_hz, .. }
        | Waveform::Pwm { freq_hz, .. }
        | Waveform::Pulse { freq_hz, .. }
        | Waveform::Clock { freq_hz } => Some(freq_hz),
    }
}

/// Owns the circuit, the Newton iterate (`x`, `x_prev`), the adaptive
/// stepper's dynamic step size, the probed-channel history, and the
/// single-line warning surfaced through [`Simulation::get_error`].
#[derive(Debug, Clone)]
pub struct Simulation {
    circuit: Circuit,
    probes: Vec<NodeId>,
    x: Vec<f64>,
    x_prev: Vec<f64>,
    /// Norton-equivalent digital drives computed by the mixed-signal phase
    /// of the previous step, stamped into the *next* analog solve.
    pending_drives: Vec<(NodeId, f64, f64)>,
    t: f64,
    dt: f64,
    adaptive: bool,
    error: Option<String>,
    history: History,
}

impl Simulation {
    /// Build a simulation around a circuit with no probed channels.
    pub fn new(circuit: Circuit) -> Self {
        Self {
            circuit,
            probes: Vec::new(),
            x: Vec::new(),
            x_prev: Vec::new(),
            pending_drives: Vec::new(),
            t: 0.0,
            dt: solver::DEFAULT_DT,
            adaptive: true,
            error: None,
            history: History::new(),
        }
    }

    /// Same as [`Simulation::new`], naming the node ids `probe_voltage`
    /// addresses by index.
    pub fn with_probes(mut self, probes: Vec<NodeId>) -> Self {
        self.probes = probes;
        self
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Zero `t`, drop the last solution, and reset every device's dynamic
    /// state (capacitor voltage, inductor current, fuse blown, sampled
    /// logic levels). Does not forget the circuit topology itself.
    pub fn reset(&mut self) {
        self.t = 0.0;
        self.x.clear();
        self.x_prev.clear();
        self.pending_drives.clear();
        self.dt = solver::DEFAULT_DT;
        self.error = None;
        self.history.reset();
        for device in self.circuit.devices.iter_mut() {
            device.reset_dynamic_state();
        }
    }

    pub fn set_time_step(&mut self, dt: f64) {
        self.dt = dt.clamp(solver::MIN_DT, solver::MAX_DT);
    }

    pub fn set_adaptive(&mut self, enabled: bool) {
        self.adaptive = enabled;
    }

    pub fn time(&self) -> f64 {
        self.t
    }

    /// A step size giving 50-300 samples per cycle of the highest AC
    /// frequency present among the circuit's sources, clamped to
    /// `[MIN_DT, MAX_DT]`. Falls back to `DEFAULT_DT` for a DC-only circuit.
    pub fn auto_time_step(&self) -> f64 {
        let max_freq = self
            .circuit
            .devices
            .iter()
            .filter_map(|d| match d {
                Device::VoltageSource(v) => waveform_freq_hz(v.waveform),
                Device::CurrentSource(c) => waveform_freq_hz(c.waveform),
                _ => None,
            })
            .fold(0.0f64, f64::max);
        if max_freq <= 0.0 {
            return solver::DEFAULT_DT;
        }
        (1.0 / (max_freq * 200.0)).clamp(solver::MIN_DT, solver::MAX_DT)
    }

    pub fn probe_voltage(&self, idx: usize) -> f64 {
        match self.probes.get(idx) {
            Some(&node) => self.node_voltage(node),
            None => 0.0,
        }
    }

    pub fn node_voltage(&self, id: NodeId) -> f64 {
        match self.circuit.node_map().index(id) {
            Some(i) => self.x.get(i).copied().unwrap_or(0.0),
            None => 0.0,
        }
    }

    pub fn get_history(&self, channel: usize, max_points: usize) -> (Vec<f64>, Vec<f64>) {
        self.history.get_channel(channel, max_points)
    }

    /// The most recent non-fatal warning (typically non-convergence),
    /// cleared on the next step that converges cleanly.
    pub fn get_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Run the DC operating-point analysis (§4.4): zeroed Newton iterate,
    /// `Δt` large enough to open capacitors and short inductors, up to
    /// `MAX_NEWTON_ITERS` of stamp/solve, then commit companion-model state
    /// so a following transient run starts from the right initial
    /// condition.
    pub fn dc_analysis(&mut self) -> Result<()> {
        self.circuit.rebuild_topology();
        self.circuit.validate_for_dc()?;

        // Reactive companion state (capacitor v_prev, inductor/transformer
        // i_prev) must start from zero, or Ieq/Veq carry over stale history
        // from a previous run and the DC solve stops being idempotent.
        for device in self.circuit.devices.iter_mut() {
            match device {
                Device::Capacitor(c) => c.reset(),
                Device::Inductor(l) => l.reset(),
                Device::Transformer(t) => {
                    t.primary.reset();
                    t.secondary.reset();
                }
                _ => {}
            }
        }

        let node_map = self.circuit.node_map().clone();
        diagnostics::check_pre_solve_shorts(&self.circuit.devices, &node_map)?;

        let matrix_size = self.circuit.matrix_size();
        let result = newton::solve(&self.circuit.devices, &node_map, matrix_size, 0.0, DC_DT, &[], &[]);

        self.error = if result.converged {
            None
        } else {
            let warning = SimError::non_convergence(result.iterations, result.residual).to_string();
            log::warn!("{}", warning);
            Some(warning)
        };

        self.x = result.x;
        self.x_prev = vec![0.0; matrix_size];
        self.t = 0.0;

        let snapshot = self.x.clone();
        self.commit_companion_state(&node_map, &snapshot, DC_DT, false);

        diagnostics::check_post_solve_overcurrent(&self.circuit.devices, &node_map, &self.x)?;

        Ok(())
    }

    /// Advance one transient step (§4.5): Newton-solve at the current step
    /// size, adaptively accept/reject/grow/shrink when enabled, commit the
    /// accepted iterate, run the thermal and mixed-signal phases, and
    /// append a (possibly decimated) history sample.
    pub fn step(&mut self) -> Result<()> {
        if self.x.is_empty() {
            self.dc_analysis()?;
        }
        self.circuit.rebuild_topology();
        let node_map = self.circuit.node_map().clone();
        let matrix_size = self.circuit.matrix_size();

        let dt_target = self.dt;
        let mut dt = dt_target;
        let mut retries = 0usize;

        let (x_trial, dt_actual, warning) = loop {
            let result = newton::solve(
                &self.circuit.devices,
                &node_map,
                matrix_size,
                self.t,
                dt,
                &self.x,
                &self.pending_drives,
            );
            let warning =
                (!result.converged).then(|| SimError::non_convergence(result.iterations, result.residual).to_string());

            if !self.adaptive {
                break (result.x, dt, warning);
            }

            let e = relative_error(&result.x, &self.x);
            if e > solver::ERR_TOL {
                retries += 1;
                if retries > solver::MAX_RETRIES {
                    return Err(SimError::AdaptiveRetriesExceeded { retries, dt });
                }
                let shrink = (solver::SAFETY_FACTOR * (solver::ERR_TOL / e).sqrt()).max(solver::MIN_FACTOR);
                dt = (dt * shrink).clamp(solver::MIN_DT, solver::MAX_DT);
                continue;
            }

            let grow = if e < solver::STEADY_TOL {
                solver::MAX_FACTOR
            } else if e < solver::ERR_TOL / 2.0 {
                (solver::SAFETY_FACTOR * (solver::ERR_TOL / e).sqrt()).min(solver::MAX_FACTOR)
            } else {
                1.0
            };
            let next_dt = (dt * grow).clamp(solver::MIN_DT, solver::MAX_DT).min(2.0 * solver::MAX_FACTOR * dt_target);
            self.dt = next_dt;
            break (result.x, dt, warning);
        };

        self.x_prev = std::mem::replace(&mut self.x, x_trial);
        self.t += dt_actual;
        self.error = warning.clone();
        if let Some(w) = &warning {
            log::warn!("{}", w);
        }

        let snapshot = self.x.clone();
        self.commit_companion_state(&node_map, &snapshot, dt_actual, true);

        let drives = mixed_signal::step(&mut self.circuit.devices, &node_map, &snapshot);
        self.pending_drives = drives;

        self.history.update_decimation(dt_target);
        let values: Vec<f64> = self.probes.iter().map(|&n| self.node_voltage(n)).collect();
        self.history.record(self.t, values);

        Ok(())
    }

    /// Commit companion-model state (capacitor/inductor/transformer) from
    /// the just-accepted solution, and — for a transient step only —
    /// integrate fuse I²t. Never touched on a rejected adaptive retry,
    /// since this is only called once a step has already been accepted.
    fn commit_companion_state(&mut self, node_map: &NodeMap, x: &[f64], dt: f64, is_transient: bool) {
        let v_at = |node: NodeId| -> f64 {
            match node_map.index(node) {
                Some(i) => x.get(i).copied().unwrap_or(0.0),
                None => 0.0,
            }
        };
        for device in self.circuit.devices.iter_mut() {
            match device {
                Device::Capacitor(c) => {
                    let v = v_at(c.nodes[0]) - v_at(c.nodes[1]);
                    c.update_state(v);
                }
                Device::Inductor(l) => {
                    let row = node_map.num_matrix_nodes + l.branch.0;
                    l.update_state(x.get(row).copied().unwrap_or(0.0));
                }
                Device::Transformer(t) => {
                    let prow = node_map.num_matrix_nodes + t.primary.branch.0;
                    let srow = node_map.num_matrix_nodes + t.secondary.branch.0;
                    t.primary.update_state(x.get(prow).copied().unwrap_or(0.0));
                    t.secondary.update_state(x.get(srow).copied().unwrap_or(0.0));
                }
                Device::Fuse(f) if is_transient => {
                    let current = (v_at(f.nodes[0]) - v_at(f.nodes[1])) * f.conductance();
                    f.integrate(current, dt);
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{Capacitor, Ground, Resistor, VoltageSource};
    use crate::topology::DeviceId;

    fn voltage_divider() -> Simulation {
        let mut circuit = Circuit::new();
        circuit.add_device(Device::Ground(Ground { id: DeviceId(0), name: "GND".into(), node: NodeId::GROUND }));
        let branch = circuit.allocate_branch();
        circuit.add_device(Device::VoltageSource(VoltageSource::new(
            DeviceId(1),
            "V1".into(),
            [NodeId(1), NodeId::GROUND],
            branch,
            Waveform::Dc,
            0.0,
            10.0,
        )));
        circuit.add_device(Device::Resistor(Resistor::new(DeviceId(2), "R1".into(), [NodeId(1), NodeId(2)], 10_000.0)));
        circuit.add_device(Device::Resistor(Resistor::new(
            DeviceId(3),
            "R2".into(),
            [NodeId(2), NodeId::GROUND],
            10_000.0,
        )));
        Simulation::new(circuit).with_probes(vec![NodeId(2)])
    }

    #[test]
    fn dc_analysis_solves_voltage_divider() {
        let mut sim = voltage_divider();
        sim.dc_analysis().unwrap();
        assert!((sim.probe_voltage(0) - 5.0).abs() < 1e-6);
        assert!(sim.get_error().is_none());
    }

    #[test]
    fn dc_analysis_is_idempotent() {
        let mut sim = voltage_divider();
        sim.dc_analysis().unwrap();
        let first = sim.x.clone();
        sim.dc_analysis().unwrap();
        assert_eq!(first, sim.x);
    }

    #[test]
    fn dc_analysis_is_idempotent_with_reactive_devices() {
        // A capacitor reaches a nonzero v_prev on the first DC solve; a
        // second call must reset that history rather than stamp a stale
        // Ieq, or the two solves would disagree.
        let mut circuit = Circuit::new();
        circuit.add_device(Device::Ground(Ground { id: DeviceId(0), name: "GND".into(), node: NodeId::GROUND }));
        let branch = circuit.allocate_branch();
        circuit.add_device(Device::VoltageSource(VoltageSource::new(
            DeviceId(1),
            "V1".into(),
            [NodeId(1), NodeId::GROUND],
            branch,
            Waveform::Dc,
            0.0,
            10.0,
        )));
        circuit.add_device(Device::Resistor(Resistor::new(DeviceId(2), "R1".into(), [NodeId(1), NodeId(2)], 1_000.0)));
        circuit.add_device(Device::Capacitor(Capacitor::new(DeviceId(3), "C1".into(), [NodeId(2), NodeId::GROUND], 1e-6)));

        let mut sim = Simulation::new(circuit).with_probes(vec![NodeId(2)]);
        sim.dc_analysis().unwrap();
        let first = sim.x.clone();
        sim.dc_analysis().unwrap();
        assert_eq!(first, sim.x);
    }

    #[test]
    fn reset_zeroes_time_and_history() {
        let mut sim = voltage_divider();
        sim.dc_analysis().unwrap();
        sim.step().unwrap();
        assert!(sim.time() > 0.0);
        sim.reset();
        assert_eq!(sim.time(), 0.0);
        assert!(sim.get_history(0, 100).0.is_empty());
    }

    #[test]
    fn rc_low_pass_step_response_matches_time_constant() {
        let mut circuit = Circuit::new();
        circuit.add_device(Device::Ground(Ground { id: DeviceId(0), name: "GND".into(), node: NodeId::GROUND }));
        let branch = circuit.allocate_branch();
        circuit.add_device(Device::VoltageSource(VoltageSource::new(
            DeviceId(1),
            "V1".into(),
            [NodeId(1), NodeId::GROUND],
            branch,
            Waveform::Dc,
            0.0,
            5.0,
        )));
        circuit.add_device(Device::Resistor(Resistor::new(DeviceId(2), "R1".into(), [NodeId(1), NodeId(2)], 1_000.0)));
        circuit.add_device(Device::Capacitor(Capacitor::new(DeviceId(3), "C1".into(), [NodeId(2), NodeId::GROUND], 1e-6)));

        let mut sim = Simulation::new(circuit).with_probes(vec![NodeId(2)]);
        sim.set_adaptive(false);
        sim.set_time_step(1e-6);
        sim.circuit.rebuild_topology();
        // Start from a zeroed iterate (capacitor already at v_prev=0) rather
        // than the DC operating point, so the step response begins at 0 V.
        let size = sim.circuit.matrix_size();
        sim.x = vec![0.0; size];
        sim.x_prev = vec![0.0; size];
        for _ in 0..1000 {
            sim.step().unwrap();
        }
        // After ~1ms (one RC time constant) expect roughly 63% of 5V.
        assert!((sim.probe_voltage(0) - 3.16).abs() < 0.2);
    }
}
