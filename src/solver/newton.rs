//! Shared Newton-Raphson driver used by both DC analysis and the
//! transient stepper: stamp, solve, check convergence, repeat.

use crate::devices::Device;
use crate::topology::{NodeId, NodeMap};

use super::matrix::SystemMatrix;
use super::stamp::{stamp_all, stamp_digital_drives};

/// Maximum change in any unknown between iterations for convergence.
pub const NEWTON_TOL: f64 = 1e-9;
/// Iteration budget per solve; non-convergence is reported, not fatal.
pub const MAX_NEWTON_ITERS: usize = 50;

/// The result of one Newton-Raphson solve.
#[derive(Debug, Clone)]
pub struct NewtonResult {
    pub x: Vec<f64>,
    pub converged: bool,
    pub iterations: usize,
    /// `max |Δx|` on the final iteration.
    pub residual: f64,
}

/// Run Newton-Raphson to a fixed point around `x_init`, re-stamping the
/// full device list every iteration at simulation time `t` and step size
/// `dt`, plus the Norton-equivalent `drives` left behind by the previous
/// mixed-signal phase (empty for DC analysis). `matrix_size` is
/// `circuit.matrix_size()` (node count plus branch count). A purely linear
/// circuit solves in exactly one iteration.
pub fn solve(
    devices: &[Device],
    node_map: &NodeMap,
    matrix_size: usize,
    t: f64,
    dt: f64,
    x_init: &[f64],
    drives: &[(NodeId, f64, f64)],
) -> NewtonResult {
    let mut x = if x_init.len() == matrix_size { x_init.to_vec() } else { vec![0.0; matrix_size] };

    let has_nonlinear = devices.iter().any(Device::is_nonlinear);
    let iters = if has_nonlinear { MAX_NEWTON_ITERS } else { 1 };

    let mut converged = false;
    let mut residual = 0.0;
    let mut last_iter = 0;

    for iter in 0..iters {
        let mut matrix = SystemMatrix::new(matrix_size);
        stamp_all(devices, &mut matrix, node_map, t, &x, dt);
        stamp_digital_drives(&mut matrix, node_map, drives);
        let x_new = matrix.solve();

        residual = x_new
            .iter()
            .zip(x.iter())
            .fold(0.0f64, |acc, (new, old)| acc.max((new - old).abs()));

        x = x_new;
        last_iter = iter + 1;

        if residual < NEWTON_TOL {
            converged = true;
            break;
        }
    }

    NewtonResult { x, converged, iterations: last_iter, residual }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::sources::Waveform;
    use crate::devices::{Ground, Resistor, VoltageSource};
    use crate::topology::{build_node_map, BranchId, DeviceId, NodeId};

    #[test]
    fn linear_voltage_divider_converges_in_one_iteration() {
        let nodes = [NodeId::GROUND, NodeId(1), NodeId(2)];
        let node_map = build_node_map(&nodes, &[]);

        let devices = vec![
            Device::Ground(Ground { id: DeviceId(0), name: "GND".into(), node: NodeId::GROUND }),
            Device::VoltageSource(VoltageSource::new(
                DeviceId(1),
                "V1".into(),
                [NodeId(1), NodeId::GROUND],
                BranchId(0),
                Waveform::Dc,
                0.0,
                10.0,
            )),
            Device::Resistor(Resistor::new(DeviceId(2), "R1".into(), [NodeId(1), NodeId(2)], 1000.0)),
            Device::Resistor(Resistor::new(DeviceId(3), "R2".into(), [NodeId(2), NodeId::GROUND], 1000.0)),
        ];

        let result = solve(&devices, &node_map, node_map.num_matrix_nodes + 1, 0.0, 1e-6, &[], &[]);
        assert!(result.converged);
        assert_eq!(result.iterations, 1);
        let mid = result.x[node_map.index(NodeId(2)).unwrap()];
        assert!((mid - 5.0).abs() < 1e-6);
    }
}
