//! Subcircuit definitions and the component-definition line grammar.
//!
//! A subcircuit is a named mini-netlist with two port node names. Each
//! netlist line defines one primitive component in the same string-keyed
//! shape the element factory accepts:
//!
//! ```text
//! R  <name> <n1> <n2> <value>
//! C  <name> <n1> <n2> <value>
//! L  <name> <n1> <n2> <value>
//! D  <name> <n1> <n2> <model>
//! V  <name> <n1> <n2> <value> | SIN(<offset> <amp> <freq>)
//! I  <name> <n1> <n2> <value> | SIN(<offset> <amp> <freq>)
//! AC <name> <n1> <n2>
//! E  <name> <n1> <n2> <ctrl_n1> <ctrl_n2> <gain>
//! G  <name> <n1> <n2> <ctrl_n1> <ctrl_n2> <gain>
//! H  <name> <n1> <n2> <ctrl_component> <gain>
//! F  <name> <n1> <n2> <ctrl_component> <gain>
//! ```
//!
//! Values use SPICE suffix notation (see [`crate::units::parse_value`]).

use crate::error::{Error, Result};
use crate::units::parse_value;

/// A named, two-port mini-netlist expanded inline at instantiation.
#[derive(Debug, Clone)]
pub struct SubcircuitDef {
    pub name: String,
    pub port1: String,
    pub port2: String,
    /// One component definition per line, in instantiation order.
    pub netlist: Vec<String>,
}

/// A parsed component-definition line.
#[derive(Debug, Clone)]
pub struct NetlistLine {
    pub key: String,
    pub name: String,
    pub n1: String,
    pub n2: String,
    pub value: f64,
    pub numeric_params: Vec<f64>,
    pub string_params: Vec<String>,
    pub is_sinusoidal: bool,
}

fn malformed(line: &str) -> Error {
    Error::MalformedNetlistLine(line.to_string())
}

/// Parse one component-definition line.
pub fn parse_line(line: &str) -> Result<NetlistLine> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 4 {
        return Err(malformed(line));
    }
    let (key, name, n1, n2) = (tokens[0], tokens[1], tokens[2], tokens[3]);

    let mut parsed = NetlistLine {
        key: key.to_string(),
        name: name.to_string(),
        n1: n1.to_string(),
        n2: n2.to_string(),
        value: 0.0,
        numeric_params: Vec::new(),
        string_params: Vec::new(),
        is_sinusoidal: false,
    };

    match key {
        "R" | "C" | "L" => {
            let value = tokens.get(4).ok_or_else(|| malformed(line))?;
            parsed.value = parse_value(value)?;
        }
        "D" => {
            let model = tokens.get(4).ok_or_else(|| malformed(line))?;
            if *model != "D" && *model != "Z" {
                return Err(Error::UnknownElementType(model.to_string()));
            }
        }
        "V" | "I" => {
            let first = tokens.get(4).ok_or_else(|| malformed(line))?;
            if let Some(offset) = first.strip_prefix("SIN(") {
                let amp = tokens.get(5).ok_or_else(|| malformed(line))?;
                let freq = tokens
                    .get(6)
                    .and_then(|t| t.strip_suffix(')'))
                    .ok_or_else(|| malformed(line))?;
                parsed.numeric_params =
                    vec![parse_value(offset)?, parse_value(amp)?, parse_value(freq)?];
                parsed.is_sinusoidal = true;
            } else {
                parsed.value = parse_value(first)?;
            }
        }
        "AC" => {}
        "E" | "G" => {
            if tokens.len() < 7 {
                return Err(malformed(line));
            }
            parsed.string_params = vec![tokens[4].to_string(), tokens[5].to_string()];
            parsed.value = parse_value(tokens[6])?;
        }
        "H" | "F" => {
            if tokens.len() < 6 {
                return Err(malformed(line));
            }
            parsed.string_params = vec![tokens[4].to_string()];
            parsed.value = parse_value(tokens[5])?;
        }
        other => return Err(Error::UnknownElementType(other.to_string())),
    }

    Ok(parsed)
}
