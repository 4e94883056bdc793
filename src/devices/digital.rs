//! Digital devices and three-valued logic, used by the mixed-signal phase
//! (`solver::mixed_signal`) rather than by the analog stamper.

use crate::topology::{DeviceId, NodeId};

/// Three-valued logic: driven Low/High, or indeterminate (`Unknown`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicLevel {
    Low,
    High,
    Unknown,
}

impl LogicLevel {
    pub fn not(self) -> Self {
        match self {
            LogicLevel::Low => LogicLevel::High,
            LogicLevel::High => LogicLevel::Low,
            LogicLevel::Unknown => LogicLevel::Unknown,
        }
    }

    pub fn and(self, other: Self) -> Self {
        use LogicLevel::*;
        match (self, other) {
            (Low, _) | (_, Low) => Low,
            (High, High) => High,
            _ => Unknown,
        }
    }

    pub fn or(self, other: Self) -> Self {
        use LogicLevel::*;
        match (self, other) {
            (High, _) | (_, High) => High,
            (Low, Low) => Low,
            _ => Unknown,
        }
    }

    pub fn xor(self, other: Self) -> Self {
        use LogicLevel::*;
        match (self, other) {
            (Low, Low) | (High, High) => Low,
            (Low, High) | (High, Low) => High,
            _ => Unknown,
        }
    }

    pub fn nand(self, other: Self) -> Self {
        self.and(other).not()
    }

    pub fn nor(self, other: Self) -> Self {
        self.or(other).not()
    }

    pub fn xnor(self, other: Self) -> Self {
        self.xor(other).not()
    }

    pub fn is_high(self) -> bool {
        self == LogicLevel::High
    }
}

/// A named logic family's I/O thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogicFamily {
    pub v_il: f64,
    pub v_ih: f64,
    pub v_ol: f64,
    pub v_oh: f64,
    pub v_hyst: f64,
    pub r_out: f64,
}

impl LogicFamily {
    pub const TTL: Self = Self { v_il: 0.8, v_ih: 2.0, v_ol: 0.2, v_oh: 3.4, v_hyst: 0.0, r_out: 50.0 };
    pub const CMOS_5V: Self = Self { v_il: 1.5, v_ih: 3.5, v_ol: 0.05, v_oh: 4.95, v_hyst: 0.0, r_out: 100.0 };
    pub const CMOS_3V3: Self = Self { v_il: 0.8, v_ih: 2.0, v_ol: 0.1, v_oh: 3.2, v_hyst: 0.0, r_out: 100.0 };
    pub const LVCMOS_1V8: Self = Self { v_il: 0.63, v_ih: 1.17, v_ol: 0.1, v_oh: 1.7, v_hyst: 0.0, r_out: 150.0 };
    pub const SCHMITT: Self = Self { v_il: 1.0, v_ih: 2.0, v_ol: 0.1, v_oh: 3.2, v_hyst: 0.4, r_out: 100.0 };

    pub fn custom(v_il: f64, v_ih: f64, v_ol: f64, v_oh: f64, v_hyst: f64, r_out: f64) -> Self {
        Self { v_il, v_ih, v_ol, v_oh, v_hyst, r_out }
    }

    /// Sample a node voltage into a [`LogicLevel`], honoring hysteresis and
    /// preserving the previous state in the indeterminate band.
    pub fn sample(&self, v: f64, previous: LogicLevel) -> LogicLevel {
        if self.v_hyst > 0.0 {
            match previous {
                LogicLevel::High => {
                    if v < self.v_ih - self.v_hyst { LogicLevel::Low } else { LogicLevel::High }
                }
                LogicLevel::Low | LogicLevel::Unknown => {
                    if v > self.v_il + self.v_hyst { LogicLevel::High } else { LogicLevel::Low }
                }
            }
        } else if v < self.v_il {
            LogicLevel::Low
        } else if v > self.v_ih {
            LogicLevel::High
        } else {
            previous
        }
    }

    /// The Thevenin voltage a driven output presents to the analog solve.
    pub fn drive_voltage(&self, level: LogicLevel) -> f64 {
        match level {
            LogicLevel::High => self.v_oh,
            _ => self.v_ol,
        }
    }
}

/// Combinational logic gate kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateKind {
    And,
    Or,
    Not,
    Nand,
    Nor,
    Xor,
    Xnor,
    Buffer,
}

#[derive(Debug, Clone)]
pub struct Gate {
    pub id: DeviceId,
    pub name: String,
    pub kind: GateKind,
    pub inputs: Vec<NodeId>,
    pub output: NodeId,
    pub family: LogicFamily,
    pub input_state: Vec<LogicLevel>,
    pub output_state: LogicLevel,
}

impl Gate {
    pub fn new(id: DeviceId, name: String, kind: GateKind, inputs: Vec<NodeId>, output: NodeId, family: LogicFamily) -> Self {
        let n = inputs.len();
        Self {
            id,
            name,
            kind,
            inputs,
            output,
            family,
            input_state: vec![LogicLevel::Unknown; n],
            output_state: LogicLevel::Unknown,
        }
    }

    /// Compute the gate's output from its currently sampled inputs.
    pub fn evaluate(&mut self) -> LogicLevel {
        let result = match self.kind {
            GateKind::Not | GateKind::Buffer => {
                let a = self.input_state.first().copied().unwrap_or(LogicLevel::Unknown);
                if self.kind == GateKind::Not { a.not() } else { a }
            }
            GateKind::And => self.input_state.iter().copied().fold(LogicLevel::High, LogicLevel::and),
            GateKind::Or => self.input_state.iter().copied().fold(LogicLevel::Low, LogicLevel::or),
            GateKind::Nand => self.input_state.iter().copied().fold(LogicLevel::High, LogicLevel::and).not(),
            GateKind::Nor => self.input_state.iter().copied().fold(LogicLevel::Low, LogicLevel::or).not(),
            GateKind::Xor => self.input_state.iter().copied().fold(LogicLevel::Low, LogicLevel::xor),
            GateKind::Xnor => self.input_state.iter().copied().fold(LogicLevel::Low, LogicLevel::xor).not(),
        };
        self.output_state = result;
        result
    }
}

/// Edge-triggered flip-flop kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipFlopKind {
    D,
    T,
    Jk,
}

#[derive(Debug, Clone)]
pub struct FlipFlop {
    pub id: DeviceId,
    pub name: String,
    pub kind: FlipFlopKind,
    /// D: [d]; T: [t]; JK: [j, k]
    pub data_inputs: Vec<NodeId>,
    pub clock: NodeId,
    pub q: NodeId,
    pub q_bar: NodeId,
    pub family: LogicFamily,
    pub clock_state: LogicLevel,
    pub q_state: LogicLevel,
}

impl FlipFlop {
    pub fn new(
        id: DeviceId,
        name: String,
        kind: FlipFlopKind,
        data_inputs: Vec<NodeId>,
        clock: NodeId,
        q: NodeId,
        q_bar: NodeId,
        family: LogicFamily,
    ) -> Self {
        Self {
            id,
            name,
            kind,
            data_inputs,
            clock,
            q,
            q_bar,
            family,
            clock_state: LogicLevel::Low,
            q_state: LogicLevel::Unknown,
        }
    }

    /// Called with the freshly sampled clock and data levels; updates `Q`
    /// only on a rising clock edge (`prev low -> new high`).
    pub fn clock_edge(&mut self, new_clock: LogicLevel, data: &[LogicLevel]) {
        let rising = self.clock_state != LogicLevel::High && new_clock == LogicLevel::High;
        if rising {
            self.q_state = match self.kind {
                FlipFlopKind::D => data.first().copied().unwrap_or(LogicLevel::Unknown),
                FlipFlopKind::T => {
                    let t = data.first().copied().unwrap_or(LogicLevel::Low);
                    if t.is_high() { self.q_state.not() } else { self.q_state }
                }
                FlipFlopKind::Jk => {
                    let j = data.first().copied().unwrap_or(LogicLevel::Low);
                    let k = data.get(1).copied().unwrap_or(LogicLevel::Low);
                    match (j, k) {
                        (LogicLevel::Low, LogicLevel::Low) => self.q_state,
                        (LogicLevel::Low, LogicLevel::High) => LogicLevel::Low,
                        (LogicLevel::High, LogicLevel::Low) => LogicLevel::High,
                        (LogicLevel::High, LogicLevel::High) => self.q_state.not(),
                        _ => LogicLevel::Unknown,
                    }
                }
            };
        }
        self.clock_state = new_clock;
    }

    pub fn q_bar_state(&self) -> LogicLevel {
        self.q_state.not()
    }
}

/// A level-sensitive SR latch: `{00: hold, 01: reset, 10: set, 11:
/// invalid -> both outputs Low}`.
#[derive(Debug, Clone)]
pub struct SrLatch {
    pub id: DeviceId,
    pub name: String,
    pub s: NodeId,
    pub r: NodeId,
    pub q: NodeId,
    pub q_bar: NodeId,
    pub family: LogicFamily,
    pub q_state: LogicLevel,
}

impl SrLatch {
    pub fn new(id: DeviceId, name: String, s: NodeId, r: NodeId, q: NodeId, q_bar: NodeId, family: LogicFamily) -> Self {
        Self {
            id,
            name,
            s,
            r,
            q,
            q_bar,
            family,
            q_state: LogicLevel::Unknown,
        }
    }

    /// Returns `(q, q_bar)`; both Low signals the invalid S=R=1 state.
    pub fn update(&mut self, s: LogicLevel, r: LogicLevel) -> (LogicLevel, LogicLevel) {
        match (s, r) {
            (LogicLevel::Low, LogicLevel::Low) => {}
            (LogicLevel::Low, LogicLevel::High) => self.q_state = LogicLevel::Low,
            (LogicLevel::High, LogicLevel::Low) => self.q_state = LogicLevel::High,
            (LogicLevel::High, LogicLevel::High) => {
                return (LogicLevel::Low, LogicLevel::Low);
            }
            _ => self.q_state = LogicLevel::Unknown,
        }
        (self.q_state, self.q_state.not())
    }
}

/// An `n`-select-line multiplexer over `2^n` data inputs.
#[derive(Debug, Clone)]
pub struct Multiplexer {
    pub id: DeviceId,
    pub name: String,
    pub data_inputs: Vec<NodeId>,
    pub select: Vec<NodeId>,
    pub output: NodeId,
    pub family: LogicFamily,
}

impl Multiplexer {
    pub fn new(
        id: DeviceId,
        name: String,
        data_inputs: Vec<NodeId>,
        select: Vec<NodeId>,
        output: NodeId,
        family: LogicFamily,
    ) -> Self {
        Self { id, name, data_inputs, select, output, family }
    }

    /// `select_state` and `data_state` are sampled levels, in index order.
    pub fn evaluate(&self, select_state: &[LogicLevel], data_state: &[LogicLevel]) -> LogicLevel {
        if select_state.iter().any(|&s| s == LogicLevel::Unknown) {
            return LogicLevel::Unknown;
        }
        let mut idx = 0usize;
        for (i, &s) in select_state.iter().enumerate() {
            if s.is_high() {
                idx |= 1 << i;
            }
        }
        data_state.get(idx).copied().unwrap_or(LogicLevel::Unknown)
    }
}

/// An `n`-input decoder driving one of `2^n` outputs High.
#[derive(Debug, Clone)]
pub struct Decoder {
    pub id: DeviceId,
    pub name: String,
    pub inputs: Vec<NodeId>,
    pub outputs: Vec<NodeId>,
    pub family: LogicFamily,
}

impl Decoder {
    pub fn new(id: DeviceId, name: String, inputs: Vec<NodeId>, outputs: Vec<NodeId>, family: LogicFamily) -> Self {
        Self { id, name, inputs, outputs, family }
    }

    /// Returns one level per output, in index order.
    pub fn evaluate(&self, input_state: &[LogicLevel]) -> Vec<LogicLevel> {
        if input_state.iter().any(|&s| s == LogicLevel::Unknown) {
            return vec![LogicLevel::Unknown; self.outputs.len()];
        }
        let mut idx = 0usize;
        for (i, &s) in input_state.iter().enumerate() {
            if s.is_high() {
                idx |= 1 << i;
            }
        }
        (0..self.outputs.len())
            .map(|i| if i == idx { LogicLevel::High } else { LogicLevel::Low })
            .collect()
    }
}

/// Half-adder: `sum = a xor b`, `carry = a and b`.
pub fn half_adder(a: LogicLevel, b: LogicLevel) -> (LogicLevel, LogicLevel) {
    (a.xor(b), a.and(b))
}

/// Full-adder: `sum = a xor b xor cin`, `carry = majority(a, b, cin)`.
pub fn full_adder(a: LogicLevel, b: LogicLevel, cin: LogicLevel) -> (LogicLevel, LogicLevel) {
    if a == LogicLevel::Unknown || b == LogicLevel::Unknown || cin == LogicLevel::Unknown {
        return (LogicLevel::Unknown, LogicLevel::Unknown);
    }
    let sum = a.xor(b).xor(cin);
    let carry = (a.and(b)).or(cin.and(a.xor(b)));
    (sum, carry)
}

/// BCD-to-seven-segment decoder. `bits` is `[b0, b1, b2, b3]` (LSB first).
/// Returns 7 segment levels `[a, b, c, d, e, f, g]`; any `Unknown` input
/// blanks all segments.
pub fn bcd_to_seven_segment(bits: [LogicLevel; 4]) -> [LogicLevel; 7] {
    const TABLE: [[bool; 7]; 10] = [
        [true, true, true, true, true, true, false],    // 0
        [false, true, true, false, false, false, false], // 1
        [true, true, false, true, true, false, true],    // 2
        [true, true, true, true, false, false, true],    // 3
        [false, true, true, false, false, true, true],   // 4
        [true, false, true, true, false, true, true],    // 5
        [true, false, true, true, true, true, true],     // 6
        [true, true, true, false, false, false, false],  // 7
        [true, true, true, true, true, true, true],      // 8
        [true, true, true, true, false, true, true],     // 9
    ];
    if bits.iter().any(|&b| b == LogicLevel::Unknown) {
        return [LogicLevel::Unknown; 7];
    }
    let mut value = 0usize;
    for (i, &b) in bits.iter().enumerate() {
        if b.is_high() {
            value |= 1 << i;
        }
    }
    if value > 9 {
        return [LogicLevel::Unknown; 7];
    }
    let row = TABLE[value];
    let mut out = [LogicLevel::Low; 7];
    for i in 0..7 {
        out[i] = if row[i] { LogicLevel::High } else { LogicLevel::Low };
    }
    out
}

/// A BCD-to-seven-segment display device: samples 4 BCD input nodes and
/// drives 7 segment output nodes (`[a, b, c, d, e, f, g]`) via
/// [`bcd_to_seven_segment`].
#[derive(Debug, Clone)]
pub struct SevenSegmentDisplay {
    pub id: DeviceId,
    pub name: String,
    pub inputs: [NodeId; 4],
    pub outputs: [NodeId; 7],
    pub family: LogicFamily,
}

impl SevenSegmentDisplay {
    pub fn new(id: DeviceId, name: String, inputs: [NodeId; 4], outputs: [NodeId; 7], family: LogicFamily) -> Self {
        Self { id, name, inputs, outputs, family }
    }

    pub fn evaluate(&self, input_state: [LogicLevel; 4]) -> [LogicLevel; 7] {
        bcd_to_seven_segment(input_state)
    }
}

/// A zero-input-impedance probe that records the sampled state of one node
/// for the caller to read back. Never drives its node.
#[derive(Debug, Clone)]
pub struct LogicIndicator {
    pub id: DeviceId,
    pub name: String,
    pub node: NodeId,
    pub family: LogicFamily,
    pub state: LogicLevel,
}

impl LogicIndicator {
    pub fn new(id: DeviceId, name: String, node: NodeId, family: LogicFamily) -> Self {
        Self { id, name, node, family, state: LogicLevel::Unknown }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_valued_and_truth_table() {
        use LogicLevel::*;
        assert_eq!(Low.and(Unknown), Low);
        assert_eq!(High.and(Unknown), Unknown);
        assert_eq!(High.and(High), High);
    }

    #[test]
    fn schmitt_hysteresis_holds_state_inside_band() {
        let level = LogicFamily::SCHMITT.sample(1.5, LogicLevel::High);
        assert_eq!(level, LogicLevel::High);
        let level2 = LogicFamily::SCHMITT.sample(1.5, LogicLevel::Low);
        assert_eq!(level2, LogicLevel::Low);
    }

    #[test]
    fn half_adder_truth_table() {
        use LogicLevel::*;
        assert_eq!(half_adder(High, High), (Low, High));
        assert_eq!(half_adder(High, Low), (High, Low));
    }

    #[test]
    fn full_adder_majority_carry() {
        use LogicLevel::*;
        assert_eq!(full_adder(High, High, High), (High, High));
        assert_eq!(full_adder(Low, Low, High), (High, Low));
    }

    #[test]
    fn bcd_to_seven_segment_decodes_digits() {
        use LogicLevel::*;
        // 0 = 0b0000: all segments lit except g.
        assert_eq!(bcd_to_seven_segment([Low, Low, Low, Low]), [High, High, High, High, High, High, Low]);
        // 1 = 0b0001: only b and c lit.
        assert_eq!(bcd_to_seven_segment([High, Low, Low, Low]), [Low, High, High, Low, Low, Low, Low]);
    }

    #[test]
    fn bcd_to_seven_segment_blanks_out_of_range_and_unknown() {
        use LogicLevel::*;
        // 1010 = 10, out of BCD range.
        assert_eq!(bcd_to_seven_segment([Low, High, Low, High]), [Unknown; 7]);
        assert_eq!(bcd_to_seven_segment([Unknown, Low, Low, Low]), [Unknown; 7]);
    }
}
