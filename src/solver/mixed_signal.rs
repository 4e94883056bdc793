//! Mixed-signal bridging between the analog solve and the digital device
//! family: sample each digital input off the just-solved node voltages
//! (honoring each device's [`LogicFamily`](crate::devices::digital::LogicFamily)
//! thresholds, including Schmitt hysteresis), propagate combinational and
//! sequential logic one step, then compute the Norton-equivalent drive
//! each digital output presents back to the next analog stamp.
//!
//! Combinational chains settle over one pass per call, not to a fixed
//! point within a single step; a multi-gate chain reaches its final state
//! over consecutive transient steps rather than instantaneously. This
//! matches how the companion-model analog solve itself only settles
//! across Newton iterations within one step, not across steps.

use crate::devices::digital::LogicLevel;
use crate::devices::Device;
use crate::topology::{NodeId, NodeMap};

fn terminal_voltage(node_map: &NodeMap, x: &[f64], node: NodeId) -> f64 {
    match node_map.index(node) {
        Some(i) => x.get(i).copied().unwrap_or(0.0),
        None => 0.0,
    }
}

/// Sample, propagate, and drive every digital device for one step.
/// Returns the Norton-equivalent drives `(node, v_thevenin, r_out)` to be
/// stamped into the *next* analog solve via
/// `solver::stamp::stamp_digital_drives`.
pub fn step(devices: &mut [Device], node_map: &NodeMap, x: &[f64]) -> Vec<(NodeId, f64, f64)> {
    let mut drives = Vec::new();

    for device in devices.iter_mut() {
        match device {
            Device::Gate(g) => {
                for (i, &node) in g.inputs.iter().enumerate() {
                    let v = terminal_voltage(node_map, x, node);
                    g.input_state[i] = g.family.sample(v, g.input_state[i]);
                }
                let out = g.evaluate();
                drives.push((g.output, g.family.drive_voltage(out), g.family.r_out));
            }
            Device::FlipFlop(ff) => {
                let clock_v = terminal_voltage(node_map, x, ff.clock);
                let new_clock = ff.family.sample(clock_v, ff.clock_state);
                let data: Vec<LogicLevel> = ff
                    .data_inputs
                    .iter()
                    .map(|&n| ff.family.sample(terminal_voltage(node_map, x, n), LogicLevel::Unknown))
                    .collect();
                ff.clock_edge(new_clock, &data);
                drives.push((ff.q, ff.family.drive_voltage(ff.q_state), ff.family.r_out));
                drives.push((ff.q_bar, ff.family.drive_voltage(ff.q_bar_state()), ff.family.r_out));
            }
            Device::SrLatch(latch) => {
                let s = latch.family.sample(terminal_voltage(node_map, x, latch.s), LogicLevel::Unknown);
                let r = latch.family.sample(terminal_voltage(node_map, x, latch.r), LogicLevel::Unknown);
                let (q, q_bar) = latch.update(s, r);
                drives.push((latch.q, latch.family.drive_voltage(q), latch.family.r_out));
                drives.push((latch.q_bar, latch.family.drive_voltage(q_bar), latch.family.r_out));
            }
            Device::Multiplexer(mux) => {
                let select: Vec<LogicLevel> = mux
                    .select
                    .iter()
                    .map(|&n| mux.family.sample(terminal_voltage(node_map, x, n), LogicLevel::Unknown))
                    .collect();
                let data: Vec<LogicLevel> = mux
                    .data_inputs
                    .iter()
                    .map(|&n| mux.family.sample(terminal_voltage(node_map, x, n), LogicLevel::Unknown))
                    .collect();
                let out = mux.evaluate(&select, &data);
                drives.push((mux.output, mux.family.drive_voltage(out), mux.family.r_out));
            }
            Device::Decoder(dec) => {
                let inputs: Vec<LogicLevel> = dec
                    .inputs
                    .iter()
                    .map(|&n| dec.family.sample(terminal_voltage(node_map, x, n), LogicLevel::Unknown))
                    .collect();
                let outs = dec.evaluate(&inputs);
                for (&node, level) in dec.outputs.iter().zip(outs) {
                    drives.push((node, dec.family.drive_voltage(level), dec.family.r_out));
                }
            }
            Device::LogicIndicator(ind) => {
                let v = terminal_voltage(node_map, x, ind.node);
                ind.state = ind.family.sample(v, ind.state);
            }
            Device::SevenSegmentDisplay(disp) => {
                let mut bits = [LogicLevel::Unknown; 4];
                for (i, &node) in disp.inputs.iter().enumerate() {
                    bits[i] = disp.family.sample(terminal_voltage(node_map, x, node), LogicLevel::Unknown);
                }
                let segments = disp.evaluate(bits);
                for (&node, level) in disp.outputs.iter().zip(segments) {
                    drives.push((node, disp.family.drive_voltage(level), disp.family.r_out));
                }
            }
            _ => {}
        }
    }

    drives
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::digital::{Gate, GateKind, LogicFamily};
    use crate::topology::{build_node_map, DeviceId};

    #[test]
    fn gate_samples_and_drives_from_analog_voltage() {
        let nodes = [NodeId::GROUND, NodeId(1), NodeId(2), NodeId(3)];
        let node_map = build_node_map(&nodes, &[]);
        let mut devices = vec![Device::Gate(Gate::new(
            DeviceId(0),
            "G1".into(),
            GateKind::And,
            vec![NodeId(1), NodeId(2)],
            NodeId(3),
            LogicFamily::CMOS_5V,
        ))];
        // Both inputs high.
        let mut x = vec![0.0; node_map.num_matrix_nodes];
        x[node_map.index(NodeId(1)).unwrap()] = 5.0;
        x[node_map.index(NodeId(2)).unwrap()] = 5.0;

        let drives = step(&mut devices, &node_map, &x);
        assert_eq!(drives.len(), 1);
        assert!((drives[0].1 - LogicFamily::CMOS_5V.v_oh).abs() < 1e-9);
    }

    #[test]
    fn seven_segment_display_decodes_sampled_bcd() {
        use crate::devices::SevenSegmentDisplay;

        let bcd_nodes = [NodeId(1), NodeId(2), NodeId(3), NodeId(4)];
        let seg_nodes = [NodeId(5), NodeId(6), NodeId(7), NodeId(8), NodeId(9), NodeId(10), NodeId(11)];
        let mut all_nodes = vec![NodeId::GROUND];
        all_nodes.extend_from_slice(&bcd_nodes);
        all_nodes.extend_from_slice(&seg_nodes);
        let node_map = build_node_map(&all_nodes, &[]);

        let mut devices = vec![Device::SevenSegmentDisplay(SevenSegmentDisplay::new(
            DeviceId(0),
            "DISP1".into(),
            bcd_nodes,
            seg_nodes,
            LogicFamily::CMOS_5V,
        ))];

        // Drive BCD = 0001 (digit "1"): only segments b and c should drive high.
        let mut x = vec![0.0; node_map.num_matrix_nodes];
        x[node_map.index(bcd_nodes[0]).unwrap()] = 5.0;

        let drives = step(&mut devices, &node_map, &x);
        assert_eq!(drives.len(), 7);
        let high = LogicFamily::CMOS_5V.v_oh;
        let low = LogicFamily::CMOS_5V.v_ol;
        let expect_high = [false, true, true, false, false, false, false];
        for (i, &(_, v, _)) in drives.iter().enumerate() {
            if expect_high[i] {
                assert!((v - high).abs() < 1e-9);
            } else {
                assert!((v - low).abs() < 1e-9);
            }
        }
    }
}
