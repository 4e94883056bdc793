//! Circuit graph: devices, wires, and the lazily rebuilt node map.

use crate::devices::Device;
use crate::error::{Result, SimError};
use crate::topology::{build_node_map, BranchId, DeviceId, NodeId, NodeMap, Wire, WireId};

/// A circuit: the set of devices and wires an external editor has placed,
/// plus the compact topology derived from them.
#[derive(Debug, Clone)]
pub struct Circuit {
    pub devices: Vec<Device>,
    pub wires: Vec<Wire>,
    node_map: NodeMap,
    next_branch: usize,
    dirty: bool,
}

impl Circuit {
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            wires: Vec::new(),
            node_map: NodeMap::default(),
            next_branch: 0,
            dirty: true,
        }
    }

    pub fn add_device(&mut self, device: Device) -> DeviceId {
        let id = device.id();
        self.devices.push(device);
        self.dirty = true;
        id
    }

    pub fn add_wire(&mut self, a: NodeId, b: NodeId) -> WireId {
        let id = WireId(self.wires.len());
        self.wires.push(Wire { id, a, b });
        self.dirty = true;
        id
    }

    /// Allocate the next free branch-current index (used when constructing
    /// a voltage-defining device before adding it to the circuit).
    pub fn allocate_branch(&mut self) -> BranchId {
        let b = BranchId(self.next_branch);
        self.next_branch += 1;
        b
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Every node id referenced by any device terminal or wire endpoint.
    fn all_node_ids(&self) -> Vec<NodeId> {
        let mut nodes = Vec::new();
        for w in &self.wires {
            nodes.push(w.a);
            nodes.push(w.b);
        }
        for d in &self.devices {
            collect_device_nodes(d, &mut nodes);
        }
        nodes.sort();
        nodes.dedup();
        nodes
    }

    /// Rebuild the node map if the topology has changed since the last
    /// build.
    pub fn rebuild_topology(&mut self) {
        if !self.dirty {
            return;
        }
        let nodes = self.all_node_ids();
        self.node_map = build_node_map(&nodes, &self.wires);
        self.dirty = false;
    }

    pub fn node_map(&self) -> &NodeMap {
        &self.node_map
    }

    pub fn num_matrix_nodes(&self) -> usize {
        self.node_map.num_matrix_nodes
    }

    pub fn num_branches(&self) -> usize {
        self.next_branch
    }

    pub fn matrix_size(&self) -> usize {
        self.num_matrix_nodes() + self.num_branches()
    }

    /// Whether at least one [`Device::Ground`] is present.
    pub fn has_ground(&self) -> bool {
        self.devices.iter().any(|d| matches!(d, Device::Ground(_)))
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Validate gross structural preconditions before a DC analysis.
    pub fn validate_for_dc(&self) -> Result<()> {
        if self.is_empty() {
            return Err(SimError::EmptyCircuit);
        }
        if !self.has_ground() {
            return Err(SimError::NoGround);
        }
        if self.num_matrix_nodes() == 0 {
            return Err(SimError::NoNodes);
        }
        Ok(())
    }
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_device_nodes(d: &Device, out: &mut Vec<NodeId>) {
    match d {
        Device::VoltageSource(x) => out.extend_from_slice(&x.nodes),
        Device::CurrentSource(x) => out.extend_from_slice(&x.nodes),
        Device::Ground(x) => out.push(x.node),
        Device::Resistor(x) => out.extend_from_slice(&x.nodes),
        Device::Capacitor(x) => out.extend_from_slice(&x.nodes),
        Device::Inductor(x) => out.extend_from_slice(&x.nodes),
        Device::Transformer(x) => {
            out.extend_from_slice(&x.primary.nodes);
            out.extend_from_slice(&x.secondary.nodes);
        }
        Device::Potentiometer(x) => out.extend_from_slice(&x.nodes),
        Device::EnvironmentResistor(x) => out.extend_from_slice(&x.nodes),
        Device::Fuse(x) => out.extend_from_slice(&x.nodes),
        Device::Diode(x) => out.extend_from_slice(&x.nodes),
        Device::Bjt(x) => out.extend_from_slice(&x.nodes),
        Device::Mosfet(x) => out.extend_from_slice(&x.nodes),
        Device::Jfet(x) => out.extend_from_slice(&x.nodes),
        Device::OpAmp(x) => out.extend_from_slice(&x.nodes),
        Device::Switch(x) => out.extend_from_slice(&x.nodes),
        Device::MultiPoleSwitch(x) => {
            for pole in &x.poles {
                out.push(pole.common);
                out.push(pole.throw_a);
                out.push(pole.throw_b);
            }
        }
        Device::Gate(x) => {
            out.extend_from_slice(&x.inputs);
            out.push(x.output);
        }
        Device::FlipFlop(x) => {
            out.extend_from_slice(&x.data_inputs);
            out.push(x.clock);
            out.push(x.q);
            out.push(x.q_bar);
        }
        Device::SrLatch(x) => {
            out.push(x.s);
            out.push(x.r);
            out.push(x.q);
            out.push(x.q_bar);
        }
        Device::Multiplexer(x) => {
            out.extend_from_slice(&x.data_inputs);
            out.extend_from_slice(&x.select);
            out.push(x.output);
        }
        Device::Decoder(x) => {
            out.extend_from_slice(&x.inputs);
            out.extend_from_slice(&x.outputs);
        }
        Device::LogicIndicator(x) => out.push(x.node),
        Device::SevenSegmentDisplay(x) => {
            out.extend_from_slice(&x.inputs);
            out.extend_from_slice(&x.outputs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::sources::Waveform;
    use crate::devices::{Ground, VoltageSource};

    #[test]
    fn empty_circuit_rejected() {
        let c = Circuit::new();
        assert!(matches!(c.validate_for_dc(), Err(SimError::EmptyCircuit)));
    }

    #[test]
    fn missing_ground_rejected() {
        let mut c = Circuit::new();
        let branch = c.allocate_branch();
        c.add_device(Device::VoltageSource(VoltageSource::new(
            DeviceId(0),
            "V1".into(),
            [NodeId(1), NodeId(2)],
            branch,
            Waveform::Dc,
            0.0,
            5.0,
        )));
        assert!(matches!(c.validate_for_dc(), Err(SimError::NoGround)));
    }

    #[test]
    fn ground_present_passes_structural_check() {
        let mut c = Circuit::new();
        c.add_device(Device::Ground(Ground {
            id: DeviceId(0),
            name: "GND".into(),
            node: NodeId::GROUND,
        }));
        let branch = c.allocate_branch();
        c.add_device(Device::VoltageSource(VoltageSource::new(
            DeviceId(1),
            "V1".into(),
            [NodeId(1), NodeId::GROUND],
            branch,
            Waveform::Dc,
            0.0,
            5.0,
        )));
        c.rebuild_topology();
        assert!(c.validate_for_dc().is_ok());
    }
}
