//! Per-device stamping: each device additively contributes its linearized
//! equations into the shared system matrix. Stamping never fails; GMIN and
//! the ground conductance keep the Jacobian well conditioned even for
//! floating sub-networks.

use crate::devices::Device;
use crate::topology::{NodeId, NodeMap};

use super::matrix::SystemMatrix;

/// Added to every non-ground diagonal entry after all devices are stamped.
pub const GMIN: f64 = 1e-12;
/// Conductance used to clamp a ground node to zero volts.
pub const GROUND_G: f64 = 1e10;

fn idx(node_map: &NodeMap, node: crate::topology::NodeId) -> Option<usize> {
    node_map.index(node)
}

fn branch_row(node_map: &NodeMap, branch: crate::topology::BranchId) -> usize {
    node_map.num_matrix_nodes + branch.0
}

/// Stamp every device in the circuit into `matrix` for the current Newton
/// iterate `x_prev`, simulation time `t`, and step size `dt`. Digital
/// devices are skipped; they participate through `solver::mixed_signal`.
pub fn stamp_all(devices: &[Device], matrix: &mut SystemMatrix, node_map: &NodeMap, t: f64, x_prev: &[f64], dt: f64) {
    for device in devices {
        stamp_one(device, matrix, node_map, t, x_prev, dt);
    }
    for i in 0..node_map.num_matrix_nodes {
        matrix.add(i, i, GMIN);
    }
}

fn terminal_voltage(node_map: &NodeMap, x_prev: &[f64], node: crate::topology::NodeId) -> f64 {
    match idx(node_map, node) {
        Some(i) => x_prev.get(i).copied().unwrap_or(0.0),
        None => 0.0,
    }
}

fn stamp_one(device: &Device, matrix: &mut SystemMatrix, node_map: &NodeMap, t: f64, x_prev: &[f64], dt: f64) {
    use Device::*;
    match device {
        VoltageSource(vs) => {
            let n1 = idx(node_map, vs.nodes[0]);
            let n2 = idx(node_map, vs.nodes[1]);
            let row = branch_row(node_map, vs.branch);
            matrix.stamp_branch_incidence(n1, n2, row, 1.0);
            if vs.r_series != 0.0 {
                matrix.add(row, row, -vs.r_series);
            }
            matrix.add_rhs(row, vs.value_at(t));
        }
        CurrentSource(cs) => {
            let n1 = idx(node_map, cs.nodes[0]);
            let n2 = idx(node_map, cs.nodes[1]);
            matrix.stamp_current_source(n1, n2, cs.value_at(t));
        }
        Ground(g) => {
            if let Some(i) = idx(node_map, g.node) {
                matrix.add(i, i, GROUND_G);
            }
        }
        Resistor(r) => {
            let n1 = idx(node_map, r.nodes[0]);
            let n2 = idx(node_map, r.nodes[1]);
            matrix.stamp_conductance(n1, n2, r.conductance());
        }
        Capacitor(c) => {
            let n1 = idx(node_map, c.nodes[0]);
            let n2 = idx(node_map, c.nodes[1]);
            let geq = c.geq(dt);
            let ieq = c.ieq(dt);
            matrix.stamp_conductance(n1, n2, geq);
            matrix.stamp_current_source(n1, n2, ieq);
        }
        Inductor(l) => {
            let n1 = idx(node_map, l.nodes[0]);
            let n2 = idx(node_map, l.nodes[1]);
            let row = branch_row(node_map, l.branch);
            matrix.stamp_branch_incidence(n1, n2, row, 1.0);
            matrix.add(row, row, -l.req(dt));
            matrix.add_rhs(row, l.veq(dt));
        }
        Transformer(tr) => {
            let p1 = idx(node_map, tr.primary.nodes[0]);
            let p2 = idx(node_map, tr.primary.nodes[1]);
            let s1 = idx(node_map, tr.secondary.nodes[0]);
            let s2 = idx(node_map, tr.secondary.nodes[1]);
            let prow = branch_row(node_map, tr.primary.branch);
            let srow = branch_row(node_map, tr.secondary.branch);
            matrix.stamp_branch_incidence(p1, p2, prow, 1.0);
            matrix.stamp_branch_incidence(s1, s2, srow, 1.0);
            matrix.add(prow, prow, -tr.primary.req(dt));
            matrix.add(srow, srow, -tr.secondary.req(dt));
            let m_over_dt = tr.mutual_req(dt);
            matrix.add(prow, srow, -m_over_dt);
            matrix.add(srow, prow, -m_over_dt);
            let (veq_p, veq_s) = tr.mutual_veq(dt);
            matrix.add_rhs(prow, tr.primary.veq(dt) + veq_p);
            matrix.add_rhs(srow, tr.secondary.veq(dt) + veq_s);
        }
        Potentiometer(p) => {
            let n1 = idx(node_map, p.nodes[0]);
            let wiper = idx(node_map, p.nodes[1]);
            let n2 = idx(node_map, p.nodes[2]);
            matrix.stamp_conductance(n1, wiper, p.g1());
            matrix.stamp_conductance(wiper, n2, p.g2());
        }
        EnvironmentResistor(e) => {
            let n1 = idx(node_map, e.nodes[0]);
            let n2 = idx(node_map, e.nodes[1]);
            matrix.stamp_conductance(n1, n2, e.conductance());
        }
        Fuse(f) => {
            let n1 = idx(node_map, f.nodes[0]);
            let n2 = idx(node_map, f.nodes[1]);
            matrix.stamp_conductance(n1, n2, f.conductance());
        }
        Diode(d) => {
            let n1 = idx(node_map, d.nodes[0]);
            let n2 = idx(node_map, d.nodes[1]);
            let v = terminal_voltage(node_map, x_prev, d.nodes[0]) - terminal_voltage(node_map, x_prev, d.nodes[1]);
            let (g, i_eq) = d.linearize(v);
            matrix.stamp_conductance(n1, n2, g);
            // i_eq defined so that I ≈ g*v - i_eq; current flows anode->cathode.
            matrix.stamp_current_source(n1, n2, -i_eq);
        }
        Bjt(q) => {
            let c = idx(node_map, q.nodes[0]);
            let b = idx(node_map, q.nodes[1]);
            let e = idx(node_map, q.nodes[2]);
            let v_b = terminal_voltage(node_map, x_prev, q.nodes[1]);
            let v_c = terminal_voltage(node_map, x_prev, q.nodes[0]);
            let v_e = terminal_voltage(node_map, x_prev, q.nodes[2]);
            let v_be = v_b - v_e;
            let v_bc = v_b - v_c;
            let (gm, g_be, i_c_eq, i_b_eq) = q.linearize(v_be, v_bc);
            matrix.stamp_conductance(b, e, g_be);
            // Collector current driven by base-emitter voltage (VCCS): I_C = gm * v_be
            matrix.stamp_transconductance(c, e, b, e, gm);
            matrix.stamp_current_source(c, e, -i_c_eq);
            matrix.stamp_current_source(b, e, -i_b_eq);
        }
        Mosfet(m) => {
            let d_n = idx(node_map, m.nodes[0]);
            let g_n = idx(node_map, m.nodes[1]);
            let s_n = idx(node_map, m.nodes[2]);
            let v_g = terminal_voltage(node_map, x_prev, m.nodes[1]);
            let v_d = terminal_voltage(node_map, x_prev, m.nodes[0]);
            let v_s = terminal_voltage(node_map, x_prev, m.nodes[2]);
            let (gm, g_ds, i_eq) = m.linearize(v_g - v_s, v_d - v_s);
            matrix.stamp_transconductance(d_n, s_n, g_n, s_n, gm);
            matrix.stamp_conductance(d_n, s_n, g_ds);
            matrix.stamp_current_source(d_n, s_n, -i_eq);
        }
        Jfet(j) => {
            let d_n = idx(node_map, j.nodes[0]);
            let g_n = idx(node_map, j.nodes[1]);
            let s_n = idx(node_map, j.nodes[2]);
            let v_g = terminal_voltage(node_map, x_prev, j.nodes[1]);
            let v_d = terminal_voltage(node_map, x_prev, j.nodes[0]);
            let v_s = terminal_voltage(node_map, x_prev, j.nodes[2]);
            let (gm, g_ds, i_eq) = j.linearize(v_g - v_s, v_d - v_s);
            matrix.stamp_transconductance(d_n, s_n, g_n, s_n, gm);
            matrix.stamp_conductance(d_n, s_n, g_ds);
            matrix.stamp_current_source(d_n, s_n, -i_eq);
        }
        OpAmp(op) => {
            let out = idx(node_map, op.output());
            let pos = idx(node_map, op.input_pos());
            let neg = idx(node_map, op.input_neg());
            let row = branch_row(node_map, op.branch);
            // A_v*(v+ - v-) - v_out = 0, enforced via the branch row.
            if let Some(o) = out {
                matrix.add(row, o, -1.0);
                matrix.add(o, row, 1.0);
            }
            if let Some(p) = pos {
                matrix.add(row, p, op.gain);
            }
            if let Some(n) = neg {
                matrix.add(row, n, -op.gain);
            }
        }
        Switch(sw) => {
            let n1 = idx(node_map, sw.nodes[0]);
            let n2 = idx(node_map, sw.nodes[1]);
            matrix.stamp_conductance(n1, n2, sw.conductance());
        }
        MultiPoleSwitch(msw) => {
            for pole in &msw.poles {
                for (a, b, g) in pole.stamps(msw.thrown) {
                    matrix.stamp_conductance(idx(node_map, a), idx(node_map, b), g);
                }
            }
        }
        // Digital devices do not stamp into the analog system.
        Gate(_) | FlipFlop(_) | SrLatch(_) | Multiplexer(_) | Decoder(_) | LogicIndicator(_)
        | SevenSegmentDisplay(_) => {}
    }
}

/// Stamp the Norton-equivalent drive of every digital output computed by
/// `solver::mixed_signal`'s DAC phase: a conductance `1/r_out` to ground
/// plus a current source `v_thevenin/r_out`, applied on the next analog
/// stamp so a digital output behaves like any other driven node.
pub fn stamp_digital_drives(matrix: &mut SystemMatrix, node_map: &NodeMap, drives: &[(NodeId, f64, f64)]) {
    for &(node, v_thevenin, r_out) in drives {
        if let Some(i) = idx(node_map, node) {
            let g = 1.0 / r_out;
            matrix.add(i, i, g);
            matrix.add_rhs(i, v_thevenin * g);
        }
    }
}

impl SystemMatrix {
    /// A four-terminal transconductance stamp: adds current `gm * (v_ctrl_pos
    /// - v_ctrl_neg)` flowing into `out_pos` and out of `out_neg`.
    pub fn stamp_transconductance(
        &mut self,
        out_pos: Option<usize>,
        out_neg: Option<usize>,
        ctrl_pos: Option<usize>,
        ctrl_neg: Option<usize>,
        gm: f64,
    ) {
        if let Some(op) = out_pos {
            if let Some(cp) = ctrl_pos {
                self.add(op, cp, gm);
            }
            if let Some(cn) = ctrl_neg {
                self.add(op, cn, -gm);
            }
        }
        if let Some(on) = out_neg {
            if let Some(cp) = ctrl_pos {
                self.add(on, cp, -gm);
            }
            if let Some(cn) = ctrl_neg {
                self.add(on, cn, gm);
            }
        }
    }
}
