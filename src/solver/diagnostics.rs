//! Pre-solve short-circuit detection and post-solve excessive-current
//! detection.

use crate::devices::Device;
use crate::error::{Result, SimError};
use crate::topology::NodeMap;

/// Any measured current above this threshold (amps) is reported as a
/// short circuit.
pub const SHORT_I_THRESHOLD: f64 = 100.0;

/// Pre-solve check: flag any voltage-defining device whose two terminals
/// map to the same matrix node (including both at ground).
pub fn check_pre_solve_shorts(devices: &[Device], node_map: &NodeMap) -> Result<()> {
    let mut shorted = Vec::new();
    for device in devices {
        let same = match device {
            Device::VoltageSource(vs) => node_map.raw_index(vs.nodes[0]) == node_map.raw_index(vs.nodes[1]),
            Device::OpAmp(op) => node_map.raw_index(op.input_pos()) == node_map.raw_index(op.input_neg())
                && node_map.raw_index(op.output()) == node_map.raw_index(op.input_pos()),
            _ => false,
        };
        if same {
            shorted.push(device.id().0);
        }
    }
    if shorted.is_empty() {
        Ok(())
    } else {
        Err(SimError::short_circuit(shorted, "voltage-source terminals collapsed onto the same node"))
    }
}

/// Post-solve check: scan the solved branch currents belonging to voltage
/// sources and flag any device whose measured current exceeds
/// `SHORT_I_THRESHOLD`.
pub fn check_post_solve_overcurrent(devices: &[Device], node_map: &NodeMap, x: &[f64]) -> Result<()> {
    let mut shorted = Vec::new();
    for device in devices {
        if let Device::VoltageSource(vs) = device {
            let row = node_map.num_matrix_nodes + vs.branch.0;
            if let Some(&current) = x.get(row) {
                if current.abs() > SHORT_I_THRESHOLD {
                    shorted.push(device.id().0);
                }
            }
        }
    }
    if shorted.is_empty() {
        Ok(())
    } else {
        Err(SimError::short_circuit(shorted, "measured current exceeded the short-circuit threshold"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::sources::Waveform;
    use crate::devices::VoltageSource;
    use crate::topology::{build_node_map, BranchId, DeviceId, NodeId, Wire, WireId};

    #[test]
    fn detects_both_terminals_shorted() {
        let nodes = [NodeId::GROUND, NodeId(1)];
        let wires = [Wire { id: WireId(0), a: NodeId::GROUND, b: NodeId(1) }];
        let node_map = build_node_map(&nodes, &wires);
        let devices = vec![Device::VoltageSource(VoltageSource::new(
            DeviceId(0),
            "V1".into(),
            [NodeId::GROUND, NodeId(1)],
            BranchId(0),
            Waveform::Dc,
            0.0,
            5.0,
        ))];
        assert!(check_pre_solve_shorts(&devices, &node_map).is_err());
    }
}
