//! Parser for the netlist description language.
//!
//! One statement per line: `GND`/`W`/`PROBE` are bare keywords, every other
//! statement is a component-letter prefix immediately followed by an
//! instance name (`R1`, `V_in`, `DFF2`, ...) and then its kind-specific
//! fields, SPICE-style. Numbers accept the SI suffixes handled by
//! [`super::lexer::parse_value`].

use super::ast::*;
use super::lexer::{parse_value, strip_comment};
use crate::error::{Result, SimError};

/// Component-letter prefixes, longest first so that e.g. `SPDT` is matched
/// before the shorter `SW`.
const PREFIXES: &[&str] = &[
    "XFMR", "PHOTO", "THERM", "FUSE", "SPDT", "RELAY", "GATE", "JKFF", "DFF", "TFF", "POT", "ASW", "SW", "PB", "OP",
    "R", "C", "L", "V", "I", "D", "Q", "M", "J", "SR",
];

fn split_prefix(token: &str) -> Option<(&'static str, String)> {
    let upper = token.to_ascii_uppercase();
    for &p in PREFIXES {
        if upper.starts_with(p) {
            let name = token[p.len()..].to_string();
            let name = if name.is_empty() { p.to_string() } else { name };
            return Some((p, name));
        }
    }
    None
}

struct Cursor<'a> {
    tokens: &'a [&'a str],
    pos: usize,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [&'a str], line: usize) -> Self {
        Self { tokens, pos: 0, line }
    }

    fn next(&mut self) -> Result<&'a str> {
        let tok = self
            .tokens
            .get(self.pos)
            .ok_or_else(|| SimError::parse(self.line, "unexpected end of statement"))?;
        self.pos += 1;
        Ok(tok)
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn next_value(&mut self) -> Result<f64> {
        let tok = self.next()?;
        parse_value(tok).ok_or_else(|| SimError::parse(self.line, format!("expected a number, found '{}'", tok)))
    }

    fn opt_value(&mut self) -> Option<f64> {
        let tok = self.peek()?;
        let v = parse_value(tok)?;
        self.pos += 1;
        Some(v)
    }

    fn opt_family(&mut self) -> Option<FamilySpec> {
        let tok = self.peek()?;
        let family = match tok.to_ascii_uppercase().as_str() {
            "TTL" => FamilySpec::Ttl,
            "CMOS5" | "CMOS5V" => FamilySpec::Cmos5v,
            "CMOS33" | "CMOS3V3" => FamilySpec::Cmos3v3,
            "LVCMOS18" | "LVCMOS1V8" => FamilySpec::Lvcmos1v8,
            "SCHMITT" => FamilySpec::Schmitt,
            _ => return None,
        };
        self.pos += 1;
        Some(family)
    }
}

fn waveform_stmt(cursor: &mut Cursor) -> Result<(WaveformSpec, f64, f64)> {
    let kind = cursor.next()?.to_ascii_uppercase();
    match kind.as_str() {
        "DC" => {
            let offset = cursor.next_value()?;
            Ok((WaveformSpec::Dc, 0.0, offset))
        }
        "AC" => {
            let amplitude = cursor.next_value()?;
            let freq_hz = cursor.next_value()?;
            let phase_deg = cursor.opt_value().unwrap_or(0.0);
            let offset = cursor.opt_value().unwrap_or(0.0);
            Ok((WaveformSpec::Sine { freq_hz, phase_deg }, amplitude, offset))
        }
        "SQUARE" => {
            let amplitude = cursor.next_value()?;
            let freq_hz = cursor.next_value()?;
            let phase_deg = cursor.opt_value().unwrap_or(0.0);
            let duty = cursor.opt_value().unwrap_or(0.5);
            let offset = cursor.opt_value().unwrap_or(0.0);
            Ok((WaveformSpec::Square { freq_hz, phase_deg, duty }, amplitude, offset))
        }
        "TRI" => {
            let amplitude = cursor.next_value()?;
            let freq_hz = cursor.next_value()?;
            let phase_deg = cursor.opt_value().unwrap_or(0.0);
            let offset = cursor.opt_value().unwrap_or(0.0);
            Ok((WaveformSpec::Triangle { freq_hz, phase_deg }, amplitude, offset))
        }
        "SAW" => {
            let amplitude = cursor.next_value()?;
            let freq_hz = cursor.next_value()?;
            let phase_deg = cursor.opt_value().unwrap_or(0.0);
            let offset = cursor.opt_value().unwrap_or(0.0);
            Ok((WaveformSpec::Sawtooth { freq_hz, phase_deg }, amplitude, offset))
        }
        "PWM" => {
            let amplitude = cursor.next_value()?;
            let freq_hz = cursor.next_value()?;
            let duty = cursor.next_value()?;
            let offset = cursor.opt_value().unwrap_or(0.0);
            Ok((WaveformSpec::Pwm { freq_hz, duty }, amplitude, offset))
        }
        "PULSE" => {
            let amplitude = cursor.next_value()?;
            let freq_hz = cursor.next_value()?;
            let rise_delay = cursor.next_value()?;
            let width = cursor.next_value()?;
            let offset = cursor.opt_value().unwrap_or(0.0);
            Ok((WaveformSpec::Pulse { freq_hz, rise_delay, width }, amplitude, offset))
        }
        "CLOCK" => {
            let amplitude = cursor.next_value()?;
            let freq_hz = cursor.next_value()?;
            let offset = cursor.opt_value().unwrap_or(0.0);
            Ok((WaveformSpec::Clock { freq_hz }, amplitude, offset))
        }
        "NOISE" => {
            let amplitude = cursor.next_value()?;
            let offset = cursor.opt_value().unwrap_or(0.0);
            Ok((WaveformSpec::Noise, amplitude, offset))
        }
        other => Err(SimError::parse(cursor.line, format!("unknown waveform kind '{}'", other))),
    }
}

/// Parse a complete netlist source string into an AST.
pub fn parse(input: &str) -> Result<Netlist> {
    let mut netlist = Netlist::default();

    for (idx, raw_line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let head = tokens[0];
        let upper = head.to_ascii_uppercase();

        let stmt = if upper == "GND" {
            let mut c = Cursor::new(&tokens[1..], line_no);
            let node = c.next()?.to_string();
            Stmt::Ground { name: format!("GND_{}", node), node }
        } else if upper == "W" {
            let mut c = Cursor::new(&tokens[1..], line_no);
            let a = c.next()?.to_string();
            let b = c.next()?.to_string();
            Stmt::Wire { a, b }
        } else if upper == "PROBE" {
            let mut c = Cursor::new(&tokens[1..], line_no);
            Stmt::Probe { node: c.next()?.to_string() }
        } else {
            let (prefix, name) = split_prefix(head)
                .ok_or_else(|| SimError::parse(line_no, format!("unrecognized statement '{}'", head)))?;
            let mut c = Cursor::new(&tokens[1..], line_no);
            parse_component(prefix, name, &mut c)?
        };

        netlist.statements.push(stmt);
    }

    Ok(netlist)
}

fn parse_component(prefix: &str, name: String, c: &mut Cursor) -> Result<Stmt> {
    let line = c.line;
    match prefix {
        "R" => Ok(Stmt::Resistor { name, n1: c.next()?.into(), n2: c.next()?.into(), r: c.next_value()? }),
        "C" => {
            let n1 = c.next()?.to_string();
            let n2 = c.next()?.to_string();
            let cap = c.next_value()?;
            let electrolytic_rating = if c.peek().map(|t| t.eq_ignore_ascii_case("ELECTRO")).unwrap_or(false) {
                c.pos += 1;
                Some(c.next_value()?)
            } else {
                None
            };
            Ok(Stmt::Capacitor { name, n1, n2, c: cap, electrolytic_rating })
        }
        "L" => Ok(Stmt::Inductor { name, n1: c.next()?.into(), n2: c.next()?.into(), l: c.next_value()? }),
        "XFMR" => Ok(Stmt::Transformer {
            name,
            p1: c.next()?.into(),
            p2: c.next()?.into(),
            s1: c.next()?.into(),
            s2: c.next()?.into(),
            lp: c.next_value()?,
            ls: c.next_value()?,
            k: c.next_value()?,
        }),
        "POT" => Ok(Stmt::Potentiometer {
            name,
            n1: c.next()?.into(),
            wiper: c.next()?.into(),
            n2: c.next()?.into(),
            r: c.next_value()?,
            position: c.next_value()?,
        }),
        "PHOTO" => Ok(Stmt::EnvironmentResistor {
            name,
            n1: c.next()?.into(),
            n2: c.next()?.into(),
            kind: EnvKindSpec::Photoresistor,
            r_ref: c.next_value()?,
        }),
        "THERM" => Ok(Stmt::EnvironmentResistor {
            name,
            n1: c.next()?.into(),
            n2: c.next()?.into(),
            kind: EnvKindSpec::Thermistor,
            r_ref: c.next_value()?,
        }),
        "FUSE" => Ok(Stmt::Fuse {
            name,
            n1: c.next()?.into(),
            n2: c.next()?.into(),
            r_intact: c.next_value()?,
            i2t_max: c.next_value()?,
        }),
        "V" => {
            let n1 = c.next()?.to_string();
            let n2 = c.next()?.to_string();
            let (waveform, amplitude, offset) = waveform_stmt(c)?;
            let r_series = if c.peek().map(|t| t.eq_ignore_ascii_case("SERIES")).unwrap_or(false) {
                c.pos += 1;
                c.next_value()?
            } else {
                0.0
            };
            Ok(Stmt::VoltageSource { name, n1, n2, waveform, amplitude, offset, r_series })
        }
        "I" => {
            let n1 = c.next()?.to_string();
            let n2 = c.next()?.to_string();
            let (waveform, amplitude, offset) = waveform_stmt(c)?;
            Ok(Stmt::CurrentSource { name, n1, n2, waveform, amplitude, offset })
        }
        "D" => {
            let anode = c.next()?.to_string();
            let cathode = c.next()?.to_string();
            let kind = match c.next()?.to_ascii_uppercase().as_str() {
                "SI" => DiodeKindSpec::Silicon,
                "GE" => DiodeKindSpec::Germanium,
                "ZENER" => DiodeKindSpec::Zener,
                "SCHOTTKY" => DiodeKindSpec::Schottky,
                "LED" => DiodeKindSpec::Led,
                other => return Err(SimError::parse(line, format!("unknown diode kind '{}'", other))),
            };
            let is = c.opt_value();
            let n = c.opt_value();
            Ok(Stmt::Diode { name, anode, cathode, kind, is, n })
        }
        "Q" => {
            let cc = c.next()?.to_string();
            let b = c.next()?.to_string();
            let e = c.next()?.to_string();
            let polarity = match c.next()?.to_ascii_uppercase().as_str() {
                "NPN" => PolarTypeSpec::N,
                "PNP" => PolarTypeSpec::P,
                other => return Err(SimError::parse(line, format!("unknown BJT polarity '{}'", other))),
            };
            let beta = c.opt_value();
            Ok(Stmt::Bjt { name, c: cc, b, e, polarity, beta })
        }
        "M" => {
            let d = c.next()?.to_string();
            let g = c.next()?.to_string();
            let s = c.next()?.to_string();
            let polarity = match c.next()?.to_ascii_uppercase().as_str() {
                "N" => PolarTypeSpec::N,
                "P" => PolarTypeSpec::P,
                other => return Err(SimError::parse(line, format!("unknown MOSFET polarity '{}'", other))),
            };
            let v_th = c.next_value()?;
            let k = c.next_value()?;
            Ok(Stmt::Mosfet { name, d, g, s, polarity, v_th, k })
        }
        "J" => {
            let d = c.next()?.to_string();
            let g = c.next()?.to_string();
            let s = c.next()?.to_string();
            let polarity = match c.next()?.to_ascii_uppercase().as_str() {
                "N" => PolarTypeSpec::N,
                "P" => PolarTypeSpec::P,
                other => return Err(SimError::parse(line, format!("unknown JFET polarity '{}'", other))),
            };
            let v_p = c.next_value()?;
            let idss = c.next_value()?;
            Ok(Stmt::Jfet { name, d, g, s, polarity, v_p, idss })
        }
        "OP" => {
            let out = c.next()?.to_string();
            let pos = c.next()?.to_string();
            let neg = c.next()?.to_string();
            let gain = c.opt_value();
            let rail_pos = c.opt_value();
            let rail_neg = c.opt_value();
            Ok(Stmt::OpAmp { name, out, pos, neg, gain, rail_pos, rail_neg })
        }
        "SW" | "PB" | "ASW" => {
            let n1 = c.next()?.to_string();
            let n2 = c.next()?.to_string();
            let closed = match c.next()?.to_ascii_uppercase().as_str() {
                "C" | "CLOSED" => true,
                "O" | "OPEN" => false,
                other => return Err(SimError::parse(line, format!("unknown switch state '{}'", other))),
            };
            let kind = match prefix {
                "SW" => SwitchKindSpec::Spst,
                "PB" => SwitchKindSpec::PushButton,
                _ => SwitchKindSpec::AnalogSwitch,
            };
            Ok(Stmt::Switch { name, n1, n2, kind, closed })
        }
        "SPDT" => {
            let common = c.next()?.to_string();
            let throw_a = c.next()?.to_string();
            let throw_b = c.next()?.to_string();
            let thrown = match c.next()?.to_ascii_uppercase().as_str() {
                "A" => false,
                "B" => true,
                other => return Err(SimError::parse(line, format!("unknown throw position '{}'", other))),
            };
            Ok(Stmt::Spdt { name, common, throw_a, throw_b, thrown })
        }
        "RELAY" => {
            let common = c.next()?.to_string();
            let throw_a = c.next()?.to_string();
            let throw_b = c.next()?.to_string();
            let thrown = match c.next()?.to_ascii_uppercase().as_str() {
                "A" => false,
                "B" => true,
                other => return Err(SimError::parse(line, format!("unknown throw position '{}'", other))),
            };
            Ok(Stmt::Relay { name, common, throw_a, throw_b, thrown })
        }
        "GATE" => {
            let kind = match c.next()?.to_ascii_uppercase().as_str() {
                "AND" => GateKindSpec::And,
                "OR" => GateKindSpec::Or,
                "NOT" => GateKindSpec::Not,
                "NAND" => GateKindSpec::Nand,
                "NOR" => GateKindSpec::Nor,
                "XOR" => GateKindSpec::Xor,
                "XNOR" => GateKindSpec::Xnor,
                "BUF" | "BUFFER" => GateKindSpec::Buffer,
                other => return Err(SimError::parse(line, format!("unknown gate kind '{}'", other))),
            };
            let output = c.next()?.to_string();
            let min_inputs = if matches!(kind, GateKindSpec::Not | GateKindSpec::Buffer) { 1 } else { 2 };
            let mut inputs = Vec::new();
            while inputs.len() < min_inputs {
                inputs.push(c.next()?.to_string());
            }
            // Greedily absorb additional plain node-name inputs (anything
            // that isn't a recognized family keyword).
            while let Some(tok) = c.peek() {
                if super::lexer::parse_value(tok).is_some() {
                    break;
                }
                let is_family = matches!(
                    tok.to_ascii_uppercase().as_str(),
                    "TTL" | "CMOS5" | "CMOS5V" | "CMOS33" | "CMOS3V3" | "LVCMOS18" | "LVCMOS1V8" | "SCHMITT"
                );
                if is_family {
                    break;
                }
                inputs.push(tok.to_string());
                c.pos += 1;
            }
            let family = c.opt_family();
            Ok(Stmt::Gate { name, kind, output, inputs, family })
        }
        "DFF" => {
            let d = c.next()?.to_string();
            let clk = c.next()?.to_string();
            let q = c.next()?.to_string();
            let q_bar = c.next()?.to_string();
            let family = c.opt_family();
            Ok(Stmt::FlipFlop { name, kind: FlipFlopKindSpec::D, data_inputs: vec![d], clock: clk, q, q_bar, family })
        }
        "TFF" => {
            let t = c.next()?.to_string();
            let clk = c.next()?.to_string();
            let q = c.next()?.to_string();
            let q_bar = c.next()?.to_string();
            let family = c.opt_family();
            Ok(Stmt::FlipFlop { name, kind: FlipFlopKindSpec::T, data_inputs: vec![t], clock: clk, q, q_bar, family })
        }
        "JKFF" => {
            let j = c.next()?.to_string();
            let k = c.next()?.to_string();
            let clk = c.next()?.to_string();
            let q = c.next()?.to_string();
            let q_bar = c.next()?.to_string();
            let family = c.opt_family();
            Ok(Stmt::FlipFlop { name, kind: FlipFlopKindSpec::Jk, data_inputs: vec![j, k], clock: clk, q, q_bar, family })
        }
        "SR" => {
            let s = c.next()?.to_string();
            let r = c.next()?.to_string();
            let q = c.next()?.to_string();
            let q_bar = c.next()?.to_string();
            let family = c.opt_family();
            Ok(Stmt::SrLatch { name, s, r, q, q_bar, family })
        }
        other => Err(SimError::parse(line, format!("unhandled component prefix '{}'", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_voltage_divider() {
        let src = "GND 0\nV1 in 0 DC 10\nR1 in mid 10k\nR2 mid 0 10k\nPROBE mid\n";
        let netlist = parse(src).unwrap();
        assert_eq!(netlist.statements.len(), 5);
        assert!(matches!(netlist.statements[0], Stmt::Ground { .. }));
        assert!(matches!(netlist.statements[4], Stmt::Probe { .. }));
    }

    #[test]
    fn parses_an_ac_source_with_phase_and_offset() {
        let src = "V1 a 0 AC 5 60 90 1.0\n";
        let netlist = parse(src).unwrap();
        match &netlist.statements[0] {
            Stmt::VoltageSource { waveform, amplitude, offset, .. } => {
                assert_eq!(*amplitude, 5.0);
                assert_eq!(*offset, 1.0);
                assert!(matches!(waveform, WaveformSpec::Sine { freq_hz, phase_deg } if *freq_hz == 60.0 && *phase_deg == 90.0));
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_statement() {
        assert!(parse("ZZZ a b c\n").is_err());
    }
}
