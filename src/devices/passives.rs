//! Passive devices: resistor, capacitor family, inductor, transformer,
//! potentiometer, photoresistor/thermistor, and fuse.

use crate::topology::{BranchId, DeviceId, NodeId};

/// A linear resistor.
#[derive(Debug, Clone)]
pub struct Resistor {
    pub id: DeviceId,
    pub name: String,
    pub nodes: [NodeId; 2],
    pub resistance: f64,
}

impl Resistor {
    pub fn new(id: DeviceId, name: String, nodes: [NodeId; 2], resistance: f64) -> Self {
        Self { id, name, nodes, resistance }
    }

    pub fn conductance(&self) -> f64 {
        1.0 / self.resistance
    }
}

/// A capacitor using a backward-Euler companion model.
///
/// `Geq = C/dt`, `Ieq = Geq * v_prev`, where `v_prev` is the terminal
/// voltage from the last accepted step.
#[derive(Debug, Clone)]
pub struct Capacitor {
    pub id: DeviceId,
    pub name: String,
    pub nodes: [NodeId; 2],
    pub capacitance: f64,
    pub v_prev: f64,
    /// Rated reverse-voltage tolerance; `None` for a non-polarized part.
    pub rated_reverse_v: Option<f64>,
}

impl Capacitor {
    pub fn new(id: DeviceId, name: String, nodes: [NodeId; 2], capacitance: f64) -> Self {
        Self {
            id,
            name,
            nodes,
            capacitance,
            v_prev: 0.0,
            rated_reverse_v: None,
        }
    }

    /// Build an electrolytic capacitor: identical companion stamp, plus a
    /// rated reverse-voltage used only for diagnostics.
    pub fn electrolytic(id: DeviceId, name: String, nodes: [NodeId; 2], capacitance: f64, rated_reverse_v: f64) -> Self {
        Self {
            id,
            name,
            nodes,
            capacitance,
            v_prev: 0.0,
            rated_reverse_v: Some(rated_reverse_v),
        }
    }

    pub fn geq(&self, dt: f64) -> f64 {
        self.capacitance / dt
    }

    pub fn ieq(&self, dt: f64) -> f64 {
        self.geq(dt) * self.v_prev
    }

    pub fn update_state(&mut self, v_new: f64) {
        self.v_prev = v_new;
    }

    pub fn reset(&mut self) {
        self.v_prev = 0.0;
    }

    /// `true` if the last stored voltage exceeds the electrolytic's rated
    /// reverse-voltage tolerance.
    pub fn reverse_voltage_exceeded(&self) -> bool {
        match self.rated_reverse_v {
            Some(rating) => self.v_prev < -rating,
            None => false,
        }
    }
}

/// An inductor using a backward-Euler companion model.
///
/// `Req = L/dt`, `Veq = Req * i_prev`. Requires a branch-current unknown.
#[derive(Debug, Clone)]
pub struct Inductor {
    pub id: DeviceId,
    pub name: String,
    pub nodes: [NodeId; 2],
    pub inductance: f64,
    pub branch: BranchId,
    pub i_prev: f64,
}

impl Inductor {
    pub fn new(id: DeviceId, name: String, nodes: [NodeId; 2], inductance: f64, branch: BranchId) -> Self {
        Self {
            id,
            name,
            nodes,
            inductance,
            branch,
            i_prev: 0.0,
        }
    }

    pub fn req(&self, dt: f64) -> f64 {
        self.inductance / dt
    }

    pub fn veq(&self, dt: f64) -> f64 {
        self.req(dt) * self.i_prev
    }

    pub fn update_state(&mut self, i_new: f64) {
        self.i_prev = i_new;
    }

    pub fn reset(&mut self) {
        self.i_prev = 0.0;
    }
}

/// Two mutually coupled inductors sharing a coupling coefficient `k`
/// (0..=1). Each winding is its own branch-current unknown; the mutual
/// term couples the two branch rows with `M = k * sqrt(L1 * L2)`.
#[derive(Debug, Clone)]
pub struct Transformer {
    pub id: DeviceId,
    pub name: String,
    pub primary: Inductor,
    pub secondary: Inductor,
    pub coupling: f64,
}

impl Transformer {
    pub fn new(id: DeviceId, name: String, primary: Inductor, secondary: Inductor, coupling: f64) -> Self {
        Self {
            id,
            name,
            primary,
            secondary,
            coupling: coupling.clamp(0.0, 1.0),
        }
    }

    pub fn mutual_inductance(&self) -> f64 {
        self.coupling * (self.primary.inductance * self.secondary.inductance).sqrt()
    }

    /// `M/dt`, the mutual companion coefficient used to couple the two
    /// branch rows.
    pub fn mutual_req(&self, dt: f64) -> f64 {
        self.mutual_inductance() / dt
    }

    /// Mutual contribution to each winding's companion source, computed
    /// from the *other* winding's previous current.
    pub fn mutual_veq(&self, dt: f64) -> (f64, f64) {
        let m_over_dt = self.mutual_req(dt);
        (
            m_over_dt * self.secondary.i_prev,
            m_over_dt * self.primary.i_prev,
        )
    }
}

/// A three-terminal potentiometer: two resistors in series through a
/// wiper node, `position` in `[0, 1]` giving the wiper's fraction toward
/// `n2`.
#[derive(Debug, Clone)]
pub struct Potentiometer {
    pub id: DeviceId,
    pub name: String,
    /// [n1, wiper, n2]
    pub nodes: [NodeId; 3],
    pub total_resistance: f64,
    pub position: f64,
}

impl Potentiometer {
    const MIN_R: f64 = 1e-3;

    pub fn new(id: DeviceId, name: String, nodes: [NodeId; 3], total_resistance: f64, position: f64) -> Self {
        Self {
            id,
            name,
            nodes,
            total_resistance,
            position: position.clamp(0.001, 0.999),
        }
    }

    pub fn set_position(&mut self, position: f64) {
        self.position = position.clamp(0.001, 0.999);
    }

    pub fn r1(&self) -> f64 {
        (self.total_resistance * self.position).max(Self::MIN_R)
    }

    pub fn r2(&self) -> f64 {
        (self.total_resistance * (1.0 - self.position)).max(Self::MIN_R)
    }

    pub fn g1(&self) -> f64 {
        1.0 / self.r1()
    }

    pub fn g2(&self) -> f64 {
        1.0 / self.r2()
    }
}

/// Environment-parameterized resistor: either light-dependent
/// (photoresistor) or temperature-dependent (thermistor). Stamped exactly
/// like a resistor once `conductance()` has been recomputed for the
/// current environment value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnvironmentKind {
    Photoresistor,
    Thermistor,
}

#[derive(Debug, Clone)]
pub struct EnvironmentResistor {
    pub id: DeviceId,
    pub name: String,
    pub nodes: [NodeId; 2],
    pub kind: EnvironmentKind,
    /// Resistance at the reference environment value (dark / 25°C).
    pub r_ref: f64,
    /// Current environment value (illuminance in lux, or temperature in °C).
    pub environment: f64,
}

impl EnvironmentResistor {
    pub fn new(id: DeviceId, name: String, nodes: [NodeId; 2], kind: EnvironmentKind, r_ref: f64) -> Self {
        Self {
            id,
            name,
            nodes,
            kind,
            r_ref,
            environment: match kind {
                EnvironmentKind::Photoresistor => 0.0,
                EnvironmentKind::Thermistor => 25.0,
            },
        }
    }

    pub fn set_environment(&mut self, value: f64) {
        self.environment = value;
    }

    /// A simple monotonic response curve: photoresistor resistance falls
    /// as illuminance rises; thermistor (NTC) resistance falls as
    /// temperature rises.
    pub fn resistance(&self) -> f64 {
        match self.kind {
            EnvironmentKind::Photoresistor => self.r_ref / (1.0 + self.environment / 10.0),
            EnvironmentKind::Thermistor => {
                let beta = 3950.0_f64;
                let t_ref_k = 298.15;
                let t_k = self.environment + 273.15;
                self.r_ref * (beta * (1.0 / t_k - 1.0 / t_ref_k)).exp()
            }
        }
        .max(1.0)
    }

    pub fn conductance(&self) -> f64 {
        1.0 / self.resistance()
    }
}

/// A fuse: models as a resistor using `r_intact` until its accumulated
/// I²t exceeds `i2t_max`, then irreversibly switches to `r_blown`.
#[derive(Debug, Clone)]
pub struct Fuse {
    pub id: DeviceId,
    pub name: String,
    pub nodes: [NodeId; 2],
    pub r_intact: f64,
    pub r_blown: f64,
    pub i2t_max: f64,
    pub i2t_accum: f64,
    pub blown: bool,
}

impl Fuse {
    pub fn new(id: DeviceId, name: String, nodes: [NodeId; 2], r_intact: f64, i2t_max: f64) -> Self {
        Self {
            id,
            name,
            nodes,
            r_intact,
            r_blown: 1e9,
            i2t_max,
            i2t_accum: 0.0,
            blown: false,
        }
    }

    pub fn resistance(&self) -> f64 {
        if self.blown { self.r_blown } else { self.r_intact }
    }

    pub fn conductance(&self) -> f64 {
        1.0 / self.resistance()
    }

    /// Integrate I²·dt from the just-measured branch current and blow the
    /// fuse if the accumulator exceeds its rating.
    pub fn integrate(&mut self, current: f64, dt: f64) {
        if self.blown {
            return;
        }
        self.i2t_accum += current * current * dt;
        if self.i2t_accum >= self.i2t_max {
            self.blown = true;
        }
    }

    pub fn reset(&mut self) {
        self.i2t_accum = 0.0;
        self.blown = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::DeviceId;

    fn id(n: usize) -> DeviceId {
        DeviceId(n)
    }

    #[test]
    fn resistor_conductance() {
        let r = Resistor::new(id(0), "R1".into(), [NodeId(1), NodeId(2)], 1000.0);
        assert!((r.conductance() - 0.001).abs() < 1e-12);
    }

    #[test]
    fn capacitor_companion_model_backward_euler() {
        let mut c = Capacitor::new(id(0), "C1".into(), [NodeId(1), NodeId(2)], 1e-6);
        c.update_state(2.0);
        let dt = 1e-4;
        assert!((c.geq(dt) - 1e-6 / dt).abs() < 1e-15);
        assert!((c.ieq(dt) - c.geq(dt) * 2.0).abs() < 1e-12);
    }

    #[test]
    fn fuse_blows_after_rated_i2t() {
        let mut fuse = Fuse::new(id(0), "F1".into(), [NodeId(1), NodeId(2)], 0.01, 1.0);
        for _ in 0..20 {
            fuse.integrate(10.0, 0.01);
        }
        assert!(fuse.blown);
    }
}
