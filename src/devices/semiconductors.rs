//! Nonlinear semiconductor devices: diode family, BJT, MOSFET, JFET.
//!
//! Every device here linearizes around a Newton iterate voltage/pair of
//! voltages and returns a `(conductance(s), equivalent current(s))` tuple
//! that the stamping layer adds into the system.

use crate::topology::{DeviceId, NodeId};

/// Thermal voltage at room temperature (~26 mV), matching the teacher's
/// constant.
pub const THERMAL_VOLTAGE: f64 = 0.0258;

/// Minimum conductance added to every nonlinear stamp to keep the Jacobian
/// well conditioned (mirrors `GMIN` from `SPEC_FULL.md` §6, applied
/// per-device as well as globally).
const GMIN_DEVICE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiodeKind {
    Silicon,
    Germanium,
    Zener,
    Schottky,
    Led,
}

/// A diode-family device: standard silicon/germanium diode, Zener, Schottky,
/// or LED. All share the Shockley equation; Zener additionally breaks down
/// in reverse bias past `v_z`.
#[derive(Debug, Clone)]
pub struct Diode {
    pub id: DeviceId,
    pub name: String,
    /// [anode, cathode]
    pub nodes: [NodeId; 2],
    pub kind: DiodeKind,
    pub is: f64,
    pub n: f64,
    /// Zener breakdown voltage (magnitude); unused for other kinds.
    pub v_z: f64,
    /// Rated forward voltage, used only to report a "lit" threshold for LEDs.
    pub rated_vf: f64,
    pub v_op: f64,
}

impl Diode {
    pub fn new(id: DeviceId, name: String, nodes: [NodeId; 2], kind: DiodeKind) -> Self {
        let (is, n, v_z, rated_vf) = match kind {
            DiodeKind::Silicon => (1e-14, 1.0, 0.0, 0.7),
            DiodeKind::Germanium => (1e-6, 1.0, 0.0, 0.3),
            DiodeKind::Zener => (1e-14, 1.0, 5.1, 0.7),
            DiodeKind::Schottky => (1e-10, 1.05, 0.0, 0.3),
            DiodeKind::Led => (1e-18, 2.0, 0.0, 2.0),
        };
        Self {
            id,
            name,
            nodes,
            kind,
            is,
            n,
            v_z,
            rated_vf,
            v_op: 0.0,
        }
    }

    pub fn led_with_vf(id: DeviceId, name: String, nodes: [NodeId; 2], rated_vf: f64) -> Self {
        let mut d = Self::new(id, name, nodes, DiodeKind::Led);
        d.rated_vf = rated_vf;
        d
    }

    pub fn from_params(id: DeviceId, name: String, nodes: [NodeId; 2], kind: DiodeKind, is: f64, n: f64) -> Self {
        let mut d = Self::new(id, name, nodes, kind);
        d.is = is;
        d.n = n;
        d
    }

    fn n_vt(&self) -> f64 {
        self.n * THERMAL_VOLTAGE
    }

    /// Forward-bias current with linear extrapolation above `v_crit` to
    /// keep the exponential from overflowing during Newton iteration.
    fn forward_current(&self, v: f64) -> f64 {
        let n_vt = self.n_vt();
        let v_crit = 0.7;
        if v <= v_crit {
            self.is * ((v / n_vt).exp() - 1.0)
        } else {
            let i_crit = self.is * ((v_crit / n_vt).exp() - 1.0);
            let g_crit = (self.is / n_vt) * (v_crit / n_vt).exp();
            i_crit + g_crit * (v - v_crit)
        }
    }

    fn forward_conductance(&self, v: f64) -> f64 {
        let n_vt = self.n_vt();
        let v_crit = 0.7;
        if v <= v_crit {
            (self.is / n_vt) * (v / n_vt).exp()
        } else {
            (self.is / n_vt) * (v_crit / n_vt).exp()
        }
    }

    pub fn current(&self, v: f64) -> f64 {
        match self.kind {
            DiodeKind::Zener if v < -self.v_z => {
                // Breakdown: steep negative conductance beyond -v_z.
                let over = -self.v_z - v;
                -self.is * 1e6 * over
            }
            _ if v < -5.0 * self.n_vt() => -self.is,
            _ => self.forward_current(v),
        }
    }

    pub fn conductance(&self, v: f64) -> f64 {
        match self.kind {
            DiodeKind::Zener if v < -self.v_z => self.is * 1e6,
            _ if v < -5.0 * self.n_vt() => GMIN_DEVICE,
            _ => self.forward_conductance(v).max(GMIN_DEVICE),
        }
    }

    /// Linearize around `v`: returns `(g, i_eq)` such that the companion
    /// model is `i ≈ g*v_terminal - i_eq` (stamped as `+g` conductance and
    /// `i_eq` current source, per `SPEC_FULL.md` §4.3).
    pub fn linearize(&self, v: f64) -> (f64, f64) {
        let g = self.conductance(v);
        let i = self.current(v);
        (g, i - g * v)
    }

    /// Newton voltage-step damping: limit the per-iteration change so the
    /// exponential does not diverge.
    pub fn limit_voltage_step(&self, v_new: f64, v_old: f64) -> f64 {
        let max_step = self.n_vt() * 4.0;
        if (v_new - v_old).abs() > max_step {
            v_old + max_step.copysign(v_new - v_old)
        } else {
            v_new
        }
    }

    pub fn update_operating_point(&mut self, v: f64) {
        self.v_op = v;
    }

    /// Whether the device's rated forward voltage has been exceeded —
    /// useful for an LED's "lit" indicator.
    pub fn is_lit(&self) -> bool {
        matches!(self.kind, DiodeKind::Led) && self.v_op >= self.rated_vf * 0.9
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BjtType {
    Npn,
    Pnp,
}

/// A simplified Ebers-Moll bipolar junction transistor.
#[derive(Debug, Clone)]
pub struct Bjt {
    pub id: DeviceId,
    pub name: String,
    /// [collector, base, emitter]
    pub nodes: [NodeId; 3],
    pub bjt_type: BjtType,
    pub beta_f: f64,
    pub is_be: f64,
    pub n: f64,
    /// Early voltage.
    pub va: f64,
    pub v_be_op: f64,
    pub v_bc_op: f64,
}

impl Bjt {
    pub fn new(id: DeviceId, name: String, nodes: [NodeId; 3], bjt_type: BjtType) -> Self {
        Self {
            id,
            name,
            nodes,
            bjt_type,
            beta_f: 100.0,
            is_be: 1e-14,
            n: 1.0,
            va: 100.0,
            v_be_op: 0.0,
            v_bc_op: 0.0,
        }
    }

    fn n_vt(&self) -> f64 {
        self.n * THERMAL_VOLTAGE
    }

    fn sign(&self) -> f64 {
        match self.bjt_type {
            BjtType::Npn => 1.0,
            BjtType::Pnp => -1.0,
        }
    }

    /// Linearize around `(v_be, v_bc)`: returns `(gm, g_be, i_c_eq,
    /// i_b_eq)` per `SPEC_FULL.md` §4.3's simplified BJT stamp.
    pub fn linearize(&self, v_be: f64, v_bc: f64) -> (f64, f64, f64, f64) {
        let s = self.sign();
        let n_vt = self.n_vt();
        let vbe_s = s * v_be;
        let i_s = self.is_be * ((vbe_s.min(0.8) / n_vt).exp() - 1.0);
        let gm = (self.is_be / n_vt) * (vbe_s.min(0.8) / n_vt).exp();
        let g_be = (gm / self.beta_f).max(GMIN_DEVICE);

        let i_c = self.beta_f * i_s;
        let g_ds_early = (i_c.abs() / self.va).max(0.0);

        let i_b_eq = s * (i_s / self.beta_f) - g_be * vbe_s;
        let i_c_eq = s * i_c - gm * vbe_s;
        let _ = v_bc; // reserved for a future full Ebers-Moll reverse term
        (gm + g_ds_early, g_be, i_c_eq * s, i_b_eq * s)
    }

    pub fn update_operating_point(&mut self, v_be: f64, v_bc: f64) {
        self.v_be_op = v_be;
        self.v_bc_op = v_bc;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MosfetType {
    N,
    P,
}

/// A simplified square-law MOSFET.
#[derive(Debug, Clone)]
pub struct Mosfet {
    pub id: DeviceId,
    pub name: String,
    /// [drain, gate, source]
    pub nodes: [NodeId; 3],
    pub mos_type: MosfetType,
    pub v_th: f64,
    /// Transconductance parameter `K = 0.5 * µ * Cox * W/L`.
    pub k: f64,
}

impl Mosfet {
    pub fn new(id: DeviceId, name: String, nodes: [NodeId; 3], mos_type: MosfetType, v_th: f64, k: f64) -> Self {
        Self {
            id,
            name,
            nodes,
            mos_type,
            v_th,
            k,
        }
    }

    fn sign(&self) -> f64 {
        match self.mos_type {
            MosfetType::N => 1.0,
            MosfetType::P => -1.0,
        }
    }

    /// Linearize around `(v_gs, v_ds)`. Returns `(gm, g_ds, i_d_eq)`: `gm`
    /// is stamped as the gate-source transconductance into the drain/source
    /// rows, `g_ds` as the drain-source conductance, and `i_d_eq` as the
    /// companion current source so that `I_d ≈ gm*v_gs + g_ds*v_ds - i_d_eq`.
    pub fn linearize(&self, v_gs: f64, v_ds: f64) -> (f64, f64, f64) {
        let s = self.sign();
        let vgs = s * v_gs;
        let vds = s * v_ds;
        let v_ov = vgs - self.v_th;

        let (i_d, gm, g_ds) = if v_ov <= 0.0 {
            (0.0, GMIN_DEVICE, GMIN_DEVICE)
        } else if vds < v_ov {
            // triode
            let i = self.k * (2.0 * v_ov * vds - vds * vds);
            (i, 2.0 * self.k * vds, 2.0 * self.k * (v_ov - vds))
        } else {
            // saturation
            let i = self.k * v_ov * v_ov;
            (i, 2.0 * self.k * v_ov, GMIN_DEVICE)
        };

        let i_eq = s * i - gm * vgs - g_ds * vds;
        (gm, g_ds, i_eq)
    }
}

/// A simplified square-law JFET (depletion-mode): identical stamp shape to
/// the MOSFET but parameterized by a pinch-off voltage rather than a
/// threshold, and with no gate-conductance term.
#[derive(Debug, Clone)]
pub struct Jfet {
    pub id: DeviceId,
    pub name: String,
    /// [drain, gate, source]
    pub nodes: [NodeId; 3],
    pub mos_type: MosfetType,
    /// Pinch-off voltage (negative for N-channel).
    pub v_p: f64,
    pub idss: f64,
}

impl Jfet {
    pub fn new(id: DeviceId, name: String, nodes: [NodeId; 3], mos_type: MosfetType, v_p: f64, idss: f64) -> Self {
        Self {
            id,
            name,
            nodes,
            mos_type,
            v_p,
            idss,
        }
    }

    fn sign(&self) -> f64 {
        match self.mos_type {
            MosfetType::N => 1.0,
            MosfetType::P => -1.0,
        }
    }

    pub fn linearize(&self, v_gs: f64, v_ds: f64) -> (f64, f64, f64) {
        let s = self.sign();
        let vgs = s * v_gs;
        let vds = s * v_ds.abs();
        let vp = self.v_p.abs();

        if vgs <= -vp {
            return (GMIN_DEVICE, GMIN_DEVICE, 0.0);
        }

        let one_minus = (1.0 - vgs / vp).max(0.0);
        let i_dss_sat = self.idss * one_minus * one_minus;
        let gm = -2.0 * self.idss / vp * one_minus;
        let g_ds = GMIN_DEVICE;

        let i = if vds < vp + vgs { i_dss_sat.min(self.idss) } else { i_dss_sat };
        let i_eq = s * i - gm * vgs - g_ds * vds;
        (gm.abs(), g_ds, i_eq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::DeviceId;

    #[test]
    fn diode_forward_bias_matches_shockley() {
        let d = Diode::new(DeviceId(0), "D1".into(), [NodeId(1), NodeId(2)], DiodeKind::Silicon);
        let i = d.current(0.6);
        assert!(i > 0.0);
        assert!(i < 1.0);
    }

    #[test]
    fn diode_reverse_bias_saturates() {
        let d = Diode::new(DeviceId(0), "D1".into(), [NodeId(1), NodeId(2)], DiodeKind::Silicon);
        let i = d.current(-1.0);
        assert!((i + d.is).abs() < 1e-20);
    }

    #[test]
    fn mosfet_cutoff_has_negligible_current() {
        let m = Mosfet::new(DeviceId(0), "M1".into(), [NodeId(1), NodeId(2), NodeId(3)], MosfetType::N, 1.0, 1e-3);
        let (gm, g_ds, i_eq) = m.linearize(0.2, 5.0);
        assert!(gm.abs() < 1e-9);
        assert!(g_ds.abs() < 1e-9);
        assert!(i_eq.abs() < 1e-9);
    }
}
