//! Numeric literal parsing and comment stripping for the netlist language.
//!
//! The netlist is line-oriented and whitespace-separated, so there is no
//! need for a full token stream: [`parser`](super::parser) splits each line
//! on whitespace and leans on [`parse_value`] to turn SPICE-style numeric
//! literals (`10k`, `4.7u`, `1e-9`) into `f64`s.

/// Parse a number with an optional SI unit suffix (`p n u m k M G`).
pub fn parse_value(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let mut chars = text.chars();
    let last = chars.next_back()?;
    let mult = match last {
        'p' => Some(1e-12),
        'n' => Some(1e-9),
        'u' | 'µ' => Some(1e-6),
        'm' => Some(1e-3),
        'k' | 'K' => Some(1e3),
        'M' => Some(1e6),
        'G' => Some(1e9),
        _ => None,
    };

    match mult {
        Some(m) => chars.as_str().parse::<f64>().ok().map(|v| v * m),
        None => text.parse::<f64>().ok(),
    }
}

/// Strip a trailing `#` or `;` comment from a line.
pub fn strip_comment(line: &str) -> &str {
    let end = line.find(['#', ';']).unwrap_or(line.len());
    &line[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Option<f64>, b: Option<f64>) -> bool {
        match (a, b) {
            (Some(x), Some(y)) => (x - y).abs() < x.abs() * 1e-10 + 1e-15,
            (None, None) => true,
            _ => false,
        }
    }

    #[test]
    fn units_scale_correctly() {
        assert!(approx_eq(parse_value("10k"), Some(10_000.0)));
        assert!(approx_eq(parse_value("100n"), Some(100e-9)));
        assert!(approx_eq(parse_value("4.7u"), Some(4.7e-6)));
        assert!(approx_eq(parse_value("1M"), Some(1_000_000.0)));
        assert!(approx_eq(parse_value("2.2"), Some(2.2)));
        assert!(approx_eq(parse_value("1e-9"), Some(1e-9)));
    }

    #[test]
    fn comment_is_stripped() {
        assert_eq!(strip_comment("R1 a b 10k # divider leg").trim(), "R1 a b 10k");
    }
}
