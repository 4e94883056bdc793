//! Device models for circuit simulation.
//!
//! Devices are grouped by family (sources, passives, semiconductors,
//! amplifiers, switches, digital); the [`Device`] enum closes the taxonomy
//! over all of them and dispatches stamping through `solver::stamp`.

pub mod amplifier;
pub mod digital;
pub mod passives;
pub mod semiconductors;
pub mod sources;
pub mod switches;

pub use amplifier::OpAmp;
pub use digital::{Decoder, FlipFlop, Gate, LogicIndicator, Multiplexer, SevenSegmentDisplay, SrLatch};
pub use passives::{Capacitor, EnvironmentResistor, Fuse, Inductor, Potentiometer, Resistor, Transformer};
pub use semiconductors::{Bjt, Diode, Jfet, Mosfet};
pub use sources::{CurrentSource, Ground, VoltageSource};
pub use switches::{MultiPoleSwitch, Switch};

use crate::topology::DeviceId;
use digital::LogicLevel;

/// Any device in the taxonomy. Stamping, nonlinearity, and branch-unknown
/// allocation are decided per variant in `solver::stamp`.
#[derive(Debug, Clone)]
pub enum Device {
    VoltageSource(VoltageSource),
    CurrentSource(CurrentSource),
    Ground(Ground),
    Resistor(Resistor),
    Capacitor(Capacitor),
    Inductor(Inductor),
    Transformer(Transformer),
    Potentiometer(Potentiometer),
    EnvironmentResistor(EnvironmentResistor),
    Fuse(Fuse),
    Diode(Diode),
    Bjt(Bjt),
    Mosfet(Mosfet),
    Jfet(Jfet),
    OpAmp(OpAmp),
    Switch(Switch),
    MultiPoleSwitch(MultiPoleSwitch),
    Gate(Gate),
    FlipFlop(FlipFlop),
    SrLatch(SrLatch),
    Multiplexer(Multiplexer),
    Decoder(Decoder),
    LogicIndicator(LogicIndicator),
    SevenSegmentDisplay(SevenSegmentDisplay),
}

impl Device {
    pub fn id(&self) -> DeviceId {
        match self {
            Device::VoltageSource(d) => d.id,
            Device::CurrentSource(d) => d.id,
            Device::Ground(d) => d.id,
            Device::Resistor(d) => d.id,
            Device::Capacitor(d) => d.id,
            Device::Inductor(d) => d.id,
            Device::Transformer(d) => d.id,
            Device::Potentiometer(d) => d.id,
            Device::EnvironmentResistor(d) => d.id,
            Device::Fuse(d) => d.id,
            Device::Diode(d) => d.id,
            Device::Bjt(d) => d.id,
            Device::Mosfet(d) => d.id,
            Device::Jfet(d) => d.id,
            Device::OpAmp(d) => d.id,
            Device::Switch(d) => d.id,
            Device::MultiPoleSwitch(d) => d.id,
            Device::Gate(d) => d.id,
            Device::FlipFlop(d) => d.id,
            Device::SrLatch(d) => d.id,
            Device::Multiplexer(d) => d.id,
            Device::Decoder(d) => d.id,
            Device::LogicIndicator(d) => d.id,
            Device::SevenSegmentDisplay(d) => d.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Device::VoltageSource(d) => &d.name,
            Device::CurrentSource(d) => &d.name,
            Device::Ground(d) => &d.name,
            Device::Resistor(d) => &d.name,
            Device::Capacitor(d) => &d.name,
            Device::Inductor(d) => &d.name,
            Device::Transformer(d) => &d.name,
            Device::Potentiometer(d) => &d.name,
            Device::EnvironmentResistor(d) => &d.name,
            Device::Fuse(d) => &d.name,
            Device::Diode(d) => &d.name,
            Device::Bjt(d) => &d.name,
            Device::Mosfet(d) => &d.name,
            Device::Jfet(d) => &d.name,
            Device::OpAmp(d) => &d.name,
            Device::Switch(d) => &d.name,
            Device::MultiPoleSwitch(d) => &d.name,
            Device::Gate(d) => &d.name,
            Device::FlipFlop(d) => &d.name,
            Device::SrLatch(d) => &d.name,
            Device::Multiplexer(d) => &d.name,
            Device::Decoder(d) => &d.name,
            Device::LogicIndicator(d) => &d.name,
            Device::SevenSegmentDisplay(d) => &d.name,
        }
    }

    /// Requires Newton-Raphson relinearization each iteration.
    pub fn is_nonlinear(&self) -> bool {
        matches!(
            self,
            Device::Diode(_) | Device::Bjt(_) | Device::Mosfet(_) | Device::Jfet(_)
        )
    }

    /// Needs a branch-current unknown allocated in the MNA system.
    pub fn needs_branch_unknown(&self) -> bool {
        matches!(
            self,
            Device::VoltageSource(_) | Device::Inductor(_) | Device::Transformer(_) | Device::OpAmp(_)
        )
    }

    /// Participates in the mixed-signal phase rather than analog stamping.
    pub fn is_digital(&self) -> bool {
        matches!(
            self,
            Device::Gate(_)
                | Device::FlipFlop(_)
                | Device::SrLatch(_)
                | Device::Multiplexer(_)
                | Device::Decoder(_)
                | Device::LogicIndicator(_)
                | Device::SevenSegmentDisplay(_)
        )
    }

    /// Zero a device's accumulated dynamic state (companion-model history,
    /// blown/latched flags, sampled logic levels), as if freshly placed.
    pub fn reset_dynamic_state(&mut self) {
        match self {
            Device::Capacitor(c) => c.reset(),
            Device::Inductor(l) => l.reset(),
            Device::Transformer(t) => {
                t.primary.reset();
                t.secondary.reset();
            }
            Device::Fuse(f) => f.reset(),
            Device::Gate(g) => {
                g.input_state.iter_mut().for_each(|s| *s = LogicLevel::Unknown);
                g.output_state = LogicLevel::Unknown;
            }
            Device::FlipFlop(ff) => {
                ff.clock_state = LogicLevel::Low;
                ff.q_state = LogicLevel::Unknown;
            }
            Device::SrLatch(latch) => latch.q_state = LogicLevel::Unknown,
            Device::LogicIndicator(ind) => ind.state = LogicLevel::Unknown,
            _ => {}
        }
    }
}
