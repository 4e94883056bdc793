//! Netlist language for circuit descriptions.
//!
//! This module provides a SPICE-inspired text-based language for describing
//! circuits. The netlist is line-oriented and human-editable; see
//! `parser.rs` for the concrete syntax of each statement.
//!
//! # Grammar Overview
//!
//! ```text
//! netlist     = { line }
//! line        = comment | statement | empty
//! comment     = ('#' | ';') { any_char }
//! statement   = keyword_stmt | component_stmt
//! keyword_stmt = "GND" node | "W" node node | "PROBE" node
//! component_stmt = prefix name node+ field+
//!
//! prefix      = "R" | "C" | "L" | "XFMR" | "POT" | "PHOTO" | "THERM" | "FUSE"
//!             | "V" | "I" | "D" | "Q" | "M" | "J" | "OP"
//!             | "SW" | "PB" | "ASW" | "SPDT" | "RELAY"
//!             | "GATE" | "DFF" | "TFF" | "JKFF" | "SR"
//! value       = number [unit_suffix]
//! unit_suffix = 'p' | 'n' | 'u' | 'm' | 'k' | 'M' | 'G'
//! ```
//!
//! This is ambient CLI/test tooling built on top of the simulation core; it
//! is not itself part of the core's public surface, which is the
//! [`crate::simulation::Simulation`] lifecycle API. Device kinds with no
//! natural single-line syntax (multiplexer, decoder, BCD-to-seven-segment)
//! are omitted from the grammar and remain library-only types.
//!
//! # Example
//!
//! ```text
//! # RC low-pass filter
//! GND 0
//! V1   in   0    AC 1.0 60
//! R1   in   out  10k
//! C1   out  0    100n
//! PROBE out
//! ```

mod ast;
mod lexer;
mod parser;

pub use ast::*;
pub use lexer::{parse_value, strip_comment};

use std::collections::HashMap;

use crate::circuit::Circuit;
use crate::devices::digital::{FlipFlopKind, GateKind, LogicFamily};
use crate::devices::sources::Waveform;
use crate::devices::switches::SwitchKind;
use crate::devices::{
    semiconductors::{BjtType, DiodeKind, MosfetType},
    Bjt, Capacitor, CurrentSource, Device, Diode, EnvironmentResistor, FlipFlop, Fuse, Gate, Ground, Inductor, Jfet,
    Mosfet, MultiPoleSwitch, OpAmp, Potentiometer, Resistor, SrLatch, Switch, Transformer, VoltageSource,
};
use crate::error::{Result, SimError};
use crate::topology::{DeviceId, NodeId};

/// Parse a netlist source string into an AST.
pub fn parse(input: &str) -> Result<Netlist> {
    parser::parse(input)
}

/// Parse a netlist file.
#[cfg(feature = "cli")]
pub fn parse_file(path: &std::path::Path) -> Result<Netlist> {
    let content = std::fs::read_to_string(path).map_err(|e| SimError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse(&content)
}

/// A built circuit plus the node-name bindings a front-end needs: the
/// probe list in declaration order and the full name -> [`NodeId`] table.
#[derive(Debug, Clone)]
pub struct BuiltCircuit {
    pub circuit: Circuit,
    pub probes: Vec<(String, NodeId)>,
    pub node_names: HashMap<String, NodeId>,
}

/// Resolves netlist node names to compact [`NodeId`]s, treating `0`/`GND`
/// (case-insensitive) as the distinguished ground node.
#[derive(Debug, Default)]
struct NodeTable {
    names: HashMap<String, NodeId>,
    next: usize,
}

impl NodeTable {
    fn new() -> Self {
        Self { names: HashMap::new(), next: 1 }
    }

    fn resolve(&mut self, name: &str) -> NodeId {
        let upper = name.to_ascii_uppercase();
        if upper == "0" || upper == "GND" || upper == "GROUND" {
            return NodeId::GROUND;
        }
        if let Some(&id) = self.names.get(name) {
            return id;
        }
        let id = NodeId(self.next);
        self.next += 1;
        self.names.insert(name.to_string(), id);
        id
    }
}

fn to_waveform(w: WaveformSpec) -> Waveform {
    match w {
        WaveformSpec::Dc => Waveform::Dc,
        WaveformSpec::Sine { freq_hz, phase_deg } => Waveform::Sine { freq_hz, phase_deg },
        WaveformSpec::Square { freq_hz, phase_deg, duty } => Waveform::Square { freq_hz, phase_deg, duty },
        WaveformSpec::Triangle { freq_hz, phase_deg } => Waveform::Triangle { freq_hz, phase_deg },
        WaveformSpec::Sawtooth { freq_hz, phase_deg } => Waveform::Sawtooth { freq_hz, phase_deg },
        WaveformSpec::Pwm { freq_hz, duty } => Waveform::Pwm { freq_hz, duty },
        WaveformSpec::Pulse { freq_hz, rise_delay, width } => Waveform::Pulse { freq_hz, rise_delay, width },
        WaveformSpec::Clock { freq_hz } => Waveform::Clock { freq_hz },
        WaveformSpec::Noise => Waveform::Noise,
    }
}

fn to_family(spec: Option<FamilySpec>) -> LogicFamily {
    match spec {
        None => LogicFamily::CMOS_5V,
        Some(FamilySpec::Ttl) => LogicFamily::TTL,
        Some(FamilySpec::Cmos5v) => LogicFamily::CMOS_5V,
        Some(FamilySpec::Cmos3v3) => LogicFamily::CMOS_3V3,
        Some(FamilySpec::Lvcmos1v8) => LogicFamily::LVCMOS_1V8,
        Some(FamilySpec::Schmitt) => LogicFamily::SCHMITT,
        Some(FamilySpec::Custom { v_il, v_ih, v_ol, v_oh, v_hyst, r_out }) => {
            LogicFamily::custom(v_il, v_ih, v_ol, v_oh, v_hyst, r_out)
        }
    }
}

/// Build a [`Circuit`] from a parsed [`Netlist`], allocating node ids for
/// every distinct node name and branch ids for every voltage-defining
/// device.
pub fn to_circuit(netlist: &Netlist) -> Result<BuiltCircuit> {
    let mut nodes = NodeTable::new();
    let mut circuit = Circuit::new();
    let mut probes = Vec::new();
    let mut next_id = 0usize;
    let mut fresh_id = || {
        let id = DeviceId(next_id);
        next_id += 1;
        id
    };

    for stmt in &netlist.statements {
        match stmt {
            Stmt::Ground { name, node } => {
                let n = nodes.resolve(node);
                circuit.add_device(Device::Ground(Ground { id: fresh_id(), name: name.clone(), node: n }));
            }
            Stmt::Wire { a, b } => {
                let na = nodes.resolve(a);
                let nb = nodes.resolve(b);
                circuit.add_wire(na, nb);
            }
            Stmt::Resistor { name, n1, n2, r } => {
                let nodes2 = [nodes.resolve(n1), nodes.resolve(n2)];
                circuit.add_device(Device::Resistor(Resistor::new(fresh_id(), name.clone(), nodes2, *r)));
            }
            Stmt::Capacitor { name, n1, n2, c, electrolytic_rating } => {
                let nodes2 = [nodes.resolve(n1), nodes.resolve(n2)];
                let device = match electrolytic_rating {
                    Some(rating) => Capacitor::electrolytic(fresh_id(), name.clone(), nodes2, *c, *rating),
                    None => Capacitor::new(fresh_id(), name.clone(), nodes2, *c),
                };
                circuit.add_device(Device::Capacitor(device));
            }
            Stmt::Inductor { name, n1, n2, l } => {
                let nodes2 = [nodes.resolve(n1), nodes.resolve(n2)];
                let branch = circuit.allocate_branch();
                circuit.add_device(Device::Inductor(Inductor::new(fresh_id(), name.clone(), nodes2, *l, branch)));
            }
            Stmt::Transformer { name, p1, p2, s1, s2, lp, ls, k } => {
                let primary_nodes = [nodes.resolve(p1), nodes.resolve(p2)];
                let secondary_nodes = [nodes.resolve(s1), nodes.resolve(s2)];
                let primary_branch = circuit.allocate_branch();
                let secondary_branch = circuit.allocate_branch();
                let primary = Inductor::new(fresh_id(), format!("{}_P", name), primary_nodes, *lp, primary_branch);
                let secondary =
                    Inductor::new(fresh_id(), format!("{}_S", name), secondary_nodes, *ls, secondary_branch);
                circuit.add_device(Device::Transformer(Transformer::new(
                    fresh_id(),
                    name.clone(),
                    primary,
                    secondary,
                    *k,
                )));
            }
            Stmt::Potentiometer { name, n1, wiper, n2, r, position } => {
                let nodes3 = [nodes.resolve(n1), nodes.resolve(wiper), nodes.resolve(n2)];
                circuit.add_device(Device::Potentiometer(Potentiometer::new(
                    fresh_id(),
                    name.clone(),
                    nodes3,
                    *r,
                    *position,
                )));
            }
            Stmt::EnvironmentResistor { name, n1, n2, kind, r_ref } => {
                let nodes2 = [nodes.resolve(n1), nodes.resolve(n2)];
                let kind = match kind {
                    EnvKindSpec::Photoresistor => crate::devices::passives::EnvironmentKind::Photoresistor,
                    EnvKindSpec::Thermistor => crate::devices::passives::EnvironmentKind::Thermistor,
                };
                circuit.add_device(Device::EnvironmentResistor(EnvironmentResistor::new(
                    fresh_id(),
                    name.clone(),
                    nodes2,
                    kind,
                    *r_ref,
                )));
            }
            Stmt::Fuse { name, n1, n2, r_intact, i2t_max } => {
                let nodes2 = [nodes.resolve(n1), nodes.resolve(n2)];
                circuit.add_device(Device::Fuse(Fuse::new(fresh_id(), name.clone(), nodes2, *r_intact, *i2t_max)));
            }
            Stmt::VoltageSource { name, n1, n2, waveform, amplitude, offset, r_series } => {
                let nodes2 = [nodes.resolve(n1), nodes.resolve(n2)];
                let branch = circuit.allocate_branch();
                let mut source = VoltageSource::new(
                    fresh_id(),
                    name.clone(),
                    nodes2,
                    branch,
                    to_waveform(*waveform),
                    *amplitude,
                    *offset,
                );
                if *r_series > 0.0 {
                    source = source.thevenin(*r_series);
                }
                circuit.add_device(Device::VoltageSource(source));
            }
            Stmt::CurrentSource { name, n1, n2, waveform, amplitude, offset } => {
                let nodes2 = [nodes.resolve(n1), nodes.resolve(n2)];
                circuit.add_device(Device::CurrentSource(CurrentSource::new(
                    fresh_id(),
                    name.clone(),
                    nodes2,
                    to_waveform(*waveform),
                    *amplitude,
                    *offset,
                )));
            }
            Stmt::Diode { name, anode, cathode, kind, is, n } => {
                let nodes2 = [nodes.resolve(anode), nodes.resolve(cathode)];
                let kind = match kind {
                    DiodeKindSpec::Silicon => DiodeKind::Silicon,
                    DiodeKindSpec::Germanium => DiodeKind::Germanium,
                    DiodeKindSpec::Zener => DiodeKind::Zener,
                    DiodeKindSpec::Schottky => DiodeKind::Schottky,
                    DiodeKindSpec::Led => DiodeKind::Led,
                };
                let device = match (is, n) {
                    (Some(is), Some(n)) => Diode::from_params(fresh_id(), name.clone(), nodes2, kind, *is, *n),
                    _ => Diode::new(fresh_id(), name.clone(), nodes2, kind),
                };
                circuit.add_device(Device::Diode(device));
            }
            Stmt::Bjt { name, c, b, e, polarity, beta } => {
                let nodes3 = [nodes.resolve(c), nodes.resolve(b), nodes.resolve(e)];
                let bjt_type = match polarity {
                    PolarTypeSpec::N => BjtType::Npn,
                    PolarTypeSpec::P => BjtType::Pnp,
                };
                let mut device = Bjt::new(fresh_id(), name.clone(), nodes3, bjt_type);
                if let Some(beta) = beta {
                    device.beta_f = *beta;
                }
                circuit.add_device(Device::Bjt(device));
            }
            Stmt::Mosfet { name, d, g, s, polarity, v_th, k } => {
                let nodes3 = [nodes.resolve(d), nodes.resolve(g), nodes.resolve(s)];
                let mos_type = match polarity {
                    PolarTypeSpec::N => MosfetType::N,
                    PolarTypeSpec::P => MosfetType::P,
                };
                circuit.add_device(Device::Mosfet(Mosfet::new(fresh_id(), name.clone(), nodes3, mos_type, *v_th, *k)));
            }
            Stmt::Jfet { name, d, g, s, polarity, v_p, idss } => {
                let nodes3 = [nodes.resolve(d), nodes.resolve(g), nodes.resolve(s)];
                let mos_type = match polarity {
                    PolarTypeSpec::N => MosfetType::N,
                    PolarTypeSpec::P => MosfetType::P,
                };
                circuit.add_device(Device::Jfet(Jfet::new(fresh_id(), name.clone(), nodes3, mos_type, *v_p, *idss)));
            }
            Stmt::OpAmp { name, out, pos, neg, gain, rail_pos, rail_neg } => {
                let nodes3 = [nodes.resolve(out), nodes.resolve(pos), nodes.resolve(neg)];
                let branch = circuit.allocate_branch();
                let mut device = OpAmp::new(fresh_id(), name.clone(), nodes3, branch);
                if let Some(gain) = gain {
                    device.gain = *gain;
                }
                if let (Some(pos), Some(neg)) = (rail_pos, rail_neg) {
                    device = device.with_rails(*pos, *neg);
                }
                circuit.add_device(Device::OpAmp(device));
            }
            Stmt::Switch { name, n1, n2, kind, closed } => {
                let nodes2 = [nodes.resolve(n1), nodes.resolve(n2)];
                let kind = match kind {
                    SwitchKindSpec::Spst => SwitchKind::Spst,
                    SwitchKindSpec::PushButton => SwitchKind::PushButton,
                    SwitchKindSpec::AnalogSwitch => SwitchKind::AnalogSwitch,
                };
                circuit.add_device(Device::Switch(Switch::new(fresh_id(), name.clone(), nodes2, kind, *closed)));
            }
            Stmt::Spdt { name, common, throw_a, throw_b, thrown } => {
                let common = nodes.resolve(common);
                let throw_a = nodes.resolve(throw_a);
                let throw_b = nodes.resolve(throw_b);
                let mut device = MultiPoleSwitch::spdt(fresh_id(), name.clone(), common, throw_a, throw_b);
                device.set_thrown(*thrown);
                circuit.add_device(Device::MultiPoleSwitch(device));
            }
            Stmt::Relay { name, common, throw_a, throw_b, thrown } => {
                let common = nodes.resolve(common);
                let throw_a = nodes.resolve(throw_a);
                let throw_b = nodes.resolve(throw_b);
                let pole = crate::devices::switches::Pole { common, throw_a, throw_b };
                let mut device = MultiPoleSwitch::relay(fresh_id(), name.clone(), vec![pole]);
                device.set_thrown(*thrown);
                circuit.add_device(Device::MultiPoleSwitch(device));
            }
            Stmt::Gate { name, kind, output, inputs, family } => {
                let output = nodes.resolve(output);
                let inputs: Vec<NodeId> = inputs.iter().map(|n| nodes.resolve(n)).collect();
                let kind = match kind {
                    GateKindSpec::And => GateKind::And,
                    GateKindSpec::Or => GateKind::Or,
                    GateKindSpec::Not => GateKind::Not,
                    GateKindSpec::Nand => GateKind::Nand,
                    GateKindSpec::Nor => GateKind::Nor,
                    GateKindSpec::Xor => GateKind::Xor,
                    GateKindSpec::Xnor => GateKind::Xnor,
                    GateKindSpec::Buffer => GateKind::Buffer,
                };
                circuit.add_device(Device::Gate(Gate::new(
                    fresh_id(),
                    name.clone(),
                    kind,
                    inputs,
                    output,
                    to_family(*family),
                )));
            }
            Stmt::FlipFlop { name, kind, data_inputs, clock, q, q_bar, family } => {
                let clock = nodes.resolve(clock);
                let q = nodes.resolve(q);
                let q_bar = nodes.resolve(q_bar);
                let data_inputs: Vec<NodeId> = data_inputs.iter().map(|n| nodes.resolve(n)).collect();
                let kind = match kind {
                    FlipFlopKindSpec::D => FlipFlopKind::D,
                    FlipFlopKindSpec::T => FlipFlopKind::T,
                    FlipFlopKindSpec::Jk => FlipFlopKind::Jk,
                };
                circuit.add_device(Device::FlipFlop(FlipFlop::new(
                    fresh_id(),
                    name.clone(),
                    kind,
                    data_inputs,
                    clock,
                    q,
                    q_bar,
                    to_family(*family),
                )));
            }
            Stmt::SrLatch { name, s, r, q, q_bar, family } => {
                let s = nodes.resolve(s);
                let r = nodes.resolve(r);
                let q = nodes.resolve(q);
                let q_bar = nodes.resolve(q_bar);
                circuit.add_device(Device::SrLatch(SrLatch::new(
                    fresh_id(),
                    name.clone(),
                    s,
                    r,
                    q,
                    q_bar,
                    to_family(*family),
                )));
            }
            Stmt::Probe { node } => {
                let id = nodes.resolve(node);
                probes.push((node.clone(), id));
            }
        }
    }

    circuit.rebuild_topology();

    Ok(BuiltCircuit { circuit, probes, node_names: nodes.names })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_voltage_divider() {
        let src = "GND 0\nV1 in 0 DC 10\nR1 in mid 10k\nR2 mid 0 10k\nPROBE mid\n";
        let netlist = parse(src).unwrap();
        let built = to_circuit(&netlist).unwrap();
        assert!(built.circuit.has_ground());
        assert_eq!(built.circuit.devices.len(), 4);
        assert_eq!(built.probes.len(), 1);
        assert!(built.circuit.validate_for_dc().is_ok());
    }

    #[test]
    fn shared_node_names_resolve_to_the_same_id() {
        let src = "GND 0\nR1 a b 1k\nR2 b c 1k\n";
        let netlist = parse(src).unwrap();
        let built = to_circuit(&netlist).unwrap();
        let b1 = built.node_names["b"];
        assert_eq!(b1, built.node_names["b"]);
    }
}
