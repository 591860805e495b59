//! Projection of stored solutions onto requested variables.
//!
//! Requests are strings of the form `V(node)` or `I(component)`. Voltages
//! of grounded nodes read as 0. Currents prefer the component's
//! branch-current row; passives without one fall back to derived values
//! (resistor `(v1-v2)/R`, capacitor `C*dV/dt` in the time domain and
//! `|dV|*omega*C` in the frequency domain). Variables that cannot be
//! resolved are logged and skipped; everything else comes back as an
//! ascending `(axis, value)` series keyed by the request string.

use indexmap::IndexMap;
use nalgebra::DVector;
use num_complex::Complex;
use ohmic_core::{Circuit, Element, ElementKind, MnaIndex};

use crate::ac::AcResult;
use crate::transient::TransientResult;

/// Per-variable series on a real axis (time or angular frequency).
pub type Series = Vec<(f64, f64)>;

enum Probe<'a> {
    Voltage(&'a str),
    Current(&'a str),
}

fn parse_probe(var: &str) -> Option<Probe<'_>> {
    let inner = var.strip_suffix(')')?;
    if let Some(node) = inner.strip_prefix("V(") {
        (!node.is_empty()).then_some(Probe::Voltage(node))
    } else if let Some(comp) = inner.strip_prefix("I(") {
        (!comp.is_empty()).then_some(Probe::Current(comp))
    } else {
        None
    }
}

/// Voltage row of a named node: `Ok(None)` means grounded (reads 0).
fn voltage_row(circuit: &Circuit, index: &MnaIndex, node: &str) -> Result<Option<usize>, ()> {
    let id = circuit.node_id(node).ok_or(())?;
    if circuit.nodes().is_ground(id) {
        return Ok(None);
    }
    index.node_row(id).map(Some).ok_or(())
}

fn real_at(solution: &DVector<f64>, row: Option<usize>) -> f64 {
    row.map(|r| solution[r]).unwrap_or(0.0)
}

fn complex_at(solution: &DVector<Complex<f64>>, row: Option<usize>) -> Complex<f64> {
    row.map(|r| solution[r]).unwrap_or(Complex::new(0.0, 0.0))
}

fn terminal_rows(index: &MnaIndex, comp: &Element) -> (Option<usize>, Option<usize>) {
    (index.node_row(comp.n1), index.node_row(comp.n2))
}

/// Extract time series for the requested variables from a transient run.
pub fn transient_series(
    circuit: &Circuit,
    result: &TransientResult,
    variables: &[&str],
) -> IndexMap<String, Series> {
    let index = &result.index;
    let mut out = IndexMap::new();

    for &var in variables {
        let Some(probe) = parse_probe(var) else {
            log::warn!("malformed probe variable {var}");
            continue;
        };

        let series: Series = match probe {
            Probe::Voltage(node) => {
                let Ok(row) = voltage_row(circuit, index, node) else {
                    log::warn!("node {node} not found");
                    continue;
                };
                result
                    .points
                    .iter()
                    .map(|p| (p.time, real_at(&p.solution, row)))
                    .collect()
            }
            Probe::Current(name) => {
                if let Some(row) = index.branch_row(name) {
                    result
                        .points
                        .iter()
                        .map(|p| (p.time, p.solution[row]))
                        .collect()
                } else {
                    let Some(comp) = circuit.component(name) else {
                        log::warn!("component {name} not found");
                        continue;
                    };
                    match &comp.kind {
                        ElementKind::Resistor => {
                            let (r1, r2) = terminal_rows(index, comp);
                            result
                                .points
                                .iter()
                                .map(|p| {
                                    let vd =
                                        real_at(&p.solution, r1) - real_at(&p.solution, r2);
                                    (p.time, vd / comp.value)
                                })
                                .collect()
                        }
                        ElementKind::Capacitor { .. } => {
                            let (r1, r2) = terminal_rows(index, comp);
                            // finite difference against the preceding
                            // stored sample; 0 at the first by convention
                            result
                                .points
                                .iter()
                                .enumerate()
                                .map(|(k, p)| {
                                    if k == 0 {
                                        return (p.time, 0.0);
                                    }
                                    let prev = &result.points[k - 1];
                                    let vd_now =
                                        real_at(&p.solution, r1) - real_at(&p.solution, r2);
                                    let vd_prev = real_at(&prev.solution, r1)
                                        - real_at(&prev.solution, r2);
                                    let dt = p.time - prev.time;
                                    let i = if dt > 0.0 {
                                        comp.value * (vd_now - vd_prev) / dt
                                    } else {
                                        0.0
                                    };
                                    (p.time, i)
                                })
                                .collect()
                        }
                        _ => {
                            log::warn!("current for component {name} cannot be derived");
                            continue;
                        }
                    }
                }
            }
        };
        out.insert(var.to_string(), series);
    }
    out
}

/// Extract magnitude series for the requested variables from an AC sweep.
pub fn ac_series(
    circuit: &Circuit,
    result: &AcResult,
    variables: &[&str],
) -> IndexMap<String, Series> {
    let index = &result.index;
    let mut out = IndexMap::new();

    for &var in variables {
        let Some(probe) = parse_probe(var) else {
            log::warn!("malformed probe variable {var}");
            continue;
        };

        let series: Series = match probe {
            Probe::Voltage(node) => {
                let Ok(row) = voltage_row(circuit, index, node) else {
                    log::warn!("node {node} not found");
                    continue;
                };
                result
                    .points
                    .iter()
                    .map(|p| (p.omega, complex_at(&p.solution, row).norm()))
                    .collect()
            }
            Probe::Current(name) => {
                if let Some(row) = index.branch_row(name) {
                    result
                        .points
                        .iter()
                        .map(|p| (p.omega, p.solution[row].norm()))
                        .collect()
                } else {
                    let Some(comp) = circuit.component(name) else {
                        log::warn!("component {name} not found");
                        continue;
                    };
                    match &comp.kind {
                        ElementKind::Resistor => {
                            let (r1, r2) = terminal_rows(index, comp);
                            result
                                .points
                                .iter()
                                .map(|p| {
                                    let vd = complex_at(&p.solution, r1)
                                        - complex_at(&p.solution, r2);
                                    (p.omega, vd.norm() / comp.value)
                                })
                                .collect()
                        }
                        ElementKind::Capacitor { .. } => {
                            let (r1, r2) = terminal_rows(index, comp);
                            result
                                .points
                                .iter()
                                .map(|p| {
                                    let vd = complex_at(&p.solution, r1)
                                        - complex_at(&p.solution, r2);
                                    (p.omega, vd.norm() * p.omega * comp.value)
                                })
                                .collect()
                        }
                        _ => {
                            log::warn!("current for component {name} cannot be derived");
                            continue;
                        }
                    }
                }
            }
        };
        out.insert(var.to_string(), series);
    }
    out
}
