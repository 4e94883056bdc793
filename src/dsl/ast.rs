//! Abstract syntax tree for the netlist description language.
//!
//! The grammar is SPICE-inspired and line-oriented: one statement per line,
//! a component letter prefix selects the device kind, and trailing fields
//! are kind-specific. See `parser.rs` for the concrete syntax of each
//! statement.

#[derive(Debug, Clone, Default)]
pub struct Netlist {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiodeKindSpec {
    Silicon,
    Germanium,
    Zener,
    Schottky,
    Led,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolarTypeSpec {
    N,
    P,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvKindSpec {
    Photoresistor,
    Thermistor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchKindSpec {
    Spst,
    PushButton,
    AnalogSwitch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateKindSpec {
    And,
    Or,
    Not,
    Nand,
    Nor,
    Xor,
    Xnor,
    Buffer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipFlopKindSpec {
    D,
    T,
    Jk,
}

/// A named logic family, or an inline custom threshold set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FamilySpec {
    Ttl,
    Cmos5v,
    Cmos3v3,
    Lvcmos1v8,
    Schmitt,
    Custom { v_il: f64, v_ih: f64, v_ol: f64, v_oh: f64, v_hyst: f64, r_out: f64 },
}

/// A settable source's time-domain shape, with amplitude/offset carried
/// alongside on the owning statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaveformSpec {
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

#[derive(Debug, Clone)]
pub enum Stmt {
    Ground {
        name: String,
        node: String,
    },
    Wire {
        a: String,
        b: String,
    },
    Resistor {
        name: String,
        n1: String,
        n2: String,
        r: f64,
    },
    Capacitor {
        name: String,
        n1: String,
        n2: String,
        c: f64,
        electrolytic_rating: Option<f64>,
    },
    Inductor {
        name: String,
        n1: String,
        n2: String,
        l: f64,
    },
    Transformer {
        name: String,
        p1: String,
        p2: String,
        s1: String,
        s2: String,
        lp: f64,
        ls: f64,
        k: f64,
    },
    Potentiometer {
        name: String,
        n1: String,
        wiper: String,
        n2: String,
        r: f64,
        position: f64,
    },
    EnvironmentResistor {
        name: String,
        n1: String,
        n2: String,
        kind: EnvKindSpec,
        r_ref: f64,
    },
    Fuse {
        name: String,
        n1: String,
        n2: String,
        r_intact: f64,
        i2t_max: f64,
    },
    VoltageSource {
        name: String,
        n1: String,
        n2: String,
        waveform: WaveformSpec,
        amplitude: f64,
        offset: f64,
        r_series: f64,
    },
    CurrentSource {
        name: String,
        n1: String,
        n2: String,
        waveform: WaveformSpec,
        amplitude: f64,
        offset: f64,
    },
    Diode {
        name: String,
        anode: String,
        cathode: String,
        kind: DiodeKindSpec,
        is: Option<f64>,
        n: Option<f64>,
    },
    Bjt {
        name: String,
        c: String,
        b: String,
        e: String,
        polarity: PolarTypeSpec,
        beta: Option<f64>,
    },
    Mosfet {
        name: String,
        d: String,
        g: String,
        s: String,
        polarity: PolarTypeSpec,
        v_th: f64,
        k: f64,
    },
    Jfet {
        name: String,
        d: String,
        g: String,
        s: String,
        polarity: PolarTypeSpec,
        v_p: f64,
        idss: f64,
    },
    OpAmp {
        name: String,
        out: String,
        pos: String,
        neg: String,
        gain: Option<f64>,
        rail_pos: Option<f64>,
        rail_neg: Option<f64>,
    },
    Switch {
        name: String,
        n1: String,
        n2: String,
        kind: SwitchKindSpec,
        closed: bool,
    },
    Spdt {
        name: String,
        common: String,
        throw_a: String,
        throw_b: String,
        thrown: bool,
    },
    Relay {
        name: String,
        common: String,
        throw_a: String,
        throw_b: String,
        thrown: bool,
    },
    Gate {
        name: String,
        kind: GateKindSpec,
        output: String,
        inputs: Vec<String>,
        family: Option<FamilySpec>,
    },
    FlipFlop {
        name: String,
        kind: FlipFlopKindSpec,
        data_inputs: Vec<String>,
        clock: String,
        q: String,
        q_bar: String,
        family: Option<FamilySpec>,
    },
    SrLatch {
        name: String,
        s: String,
        r: String,
        q: String,
        q_bar: String,
        family: Option<FamilySpec>,
    },
    /// Marks a node for readout via `Simulation::probe_voltage`, in
    /// declaration order.
    Probe {
        node: String,
    },
}
