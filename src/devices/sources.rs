//! Independent sources: DC/AC voltage and current, waveform generators,
//! noise, and the ground reference.

use crate::topology::{BranchId, DeviceId, NodeId};

/// Waveform shape for a settable source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    Dc,
    Sine { freq_hz: f64, phase_deg: f64 },
    Square { freq_hz: f64, phase_deg: f64, duty: f64 },
    Triangle { freq_hz: f64, phase_deg: f64 },
    Sawtooth { freq_hz: f64, phase_deg: f64 },
    Pwm { freq_hz: f64, duty: f64 },
    Pulse { freq_hz: f64, rise_delay: f64, width: f64 },
    Clock { freq_hz: f64 },
    Noise,
}

fn wrapped_phase(t: f64, freq_hz: f64, phase_deg: f64) -> f64 {
    let raw = freq_hz * t + phase_deg / 360.0;
    raw - raw.floor()
}

/// Evaluate a waveform's instantaneous value given amplitude/offset and
/// time. See `SPEC_FULL.md` §6 for the exact formulas.
pub fn waveform_value(shape: Waveform, amplitude: f64, offset: f64, t: f64) -> f64 {
    match shape {
        Waveform::Dc => offset,
        Waveform::Sine { freq_hz, phase_deg } => {
            offset + amplitude * (2.0 * std::f64::consts::PI * freq_hz * t + phase_deg.to_radians()).sin()
        }
        Waveform::Square { freq_hz, phase_deg, duty } => {
            let tau = wrapped_phase(t, freq_hz, phase_deg);
            offset + if tau < duty { amplitude } else { -amplitude }
        }
        Waveform::Triangle { freq_hz, phase_deg } => {
            let tau = wrapped_phase(t, freq_hz, phase_deg);
            let v = if tau < 0.5 { 4.0 * tau - 1.0 } else { 3.0 - 4.0 * tau };
            offset + amplitude * v
        }
        Waveform::Sawtooth { freq_hz, phase_deg } => {
            let tau = wrapped_phase(t, freq_hz, phase_deg);
            offset + amplitude * (2.0 * tau - 1.0)
        }
        Waveform::Pwm { freq_hz, duty } => {
            let tau = wrapped_phase(t, freq_hz, 0.0);
            offset + if tau < duty { amplitude } else { -amplitude }
        }
        Waveform::Pulse { freq_hz, rise_delay, width } => {
            let tau = wrapped_phase(t, freq_hz, 0.0) / freq_hz;
            if tau >= rise_delay && tau < rise_delay + width {
                offset + amplitude
            } else {
                offset - amplitude
            }
        }
        Waveform::Clock { freq_hz } => {
            let tau = wrapped_phase(t, freq_hz, 0.0);
            if tau < 0.5 { offset + amplitude } else { offset }
        }
        Waveform::Noise => {
            offset
                + amplitude
                    * ((12345.68 * t).sin() + (9876.54 * t + 1.234).sin() + (5678.12 * t + 2.345).sin())
                    / 3.0
        }
    }
}

/// A voltage-defining source: ideal or Thevenin (with a series resistance
/// folded into its branch row), DC or any [`Waveform`]. Requires a branch
/// current unknown.
#[derive(Debug, Clone)]
pub struct VoltageSource {
    pub id: DeviceId,
    pub name: String,
    pub nodes: [NodeId; 2],
    pub branch: BranchId,
    pub waveform: Waveform,
    pub amplitude: f64,
    pub offset: f64,
    /// Series (Thevenin) resistance; 0.0 for an ideal source.
    pub r_series: f64,
}

impl VoltageSource {
    pub fn new(
        id: DeviceId,
        name: String,
        nodes: [NodeId; 2],
        branch: BranchId,
        waveform: Waveform,
        amplitude: f64,
        offset: f64,
    ) -> Self {
        Self {
            id,
            name,
            nodes,
            branch,
            waveform,
            amplitude,
            offset,
            r_series: 0.0,
        }
    }

    pub fn thevenin(mut self, r_series: f64) -> Self {
        self.r_series = r_series;
        self
    }

    pub fn value_at(&self, t: f64) -> f64 {
        waveform_value(self.waveform, self.amplitude, self.offset, t)
    }
}

/// An independent current source: DC or any [`Waveform`].
#[derive(Debug, Clone)]
pub struct CurrentSource {
    pub id: DeviceId,
    pub name: String,
    pub nodes: [NodeId; 2],
    pub waveform: Waveform,
    pub amplitude: f64,
    pub offset: f64,
}

impl CurrentSource {
    pub fn new(id: DeviceId, name: String, nodes: [NodeId; 2], waveform: Waveform, amplitude: f64, offset: f64) -> Self {
        Self {
            id,
            name,
            nodes,
            waveform,
            amplitude,
            offset,
        }
    }

    pub fn value_at(&self, t: f64) -> f64 {
        waveform_value(self.waveform, self.amplitude, self.offset, t)
    }
}

/// A ground reference: clamps its node to zero volts via a large
/// conductance (`GROUND_G`).
#[derive(Debug, Clone)]
pub struct Ground {
    pub id: DeviceId,
    pub name: String,
    pub node: NodeId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_matches_formula_at_quarter_period() {
        let v = waveform_value(Waveform::Sine { freq_hz: 1.0, phase_deg: 0.0 }, 2.0, 0.0, 0.25);
        assert!((v - 2.0).abs() < 1e-9);
    }

    #[test]
    fn square_wave_flips_at_duty() {
        let shape = Waveform::Square { freq_hz: 1.0, phase_deg: 0.0, duty: 0.5 };
        assert_eq!(waveform_value(shape, 1.0, 0.0, 0.1), 1.0);
        assert_eq!(waveform_value(shape, 1.0, 0.0, 0.6), -1.0);
    }

    #[test]
    fn noise_is_deterministic_in_time() {
        let a = waveform_value(Waveform::Noise, 1.0, 0.0, 0.123);
        let b = waveform_value(Waveform::Noise, 1.0, 0.0, 0.123);
        assert_eq!(a, b);
    }
}
