//! The element library: a closed family of lumped circuit elements.
//!
//! Each element is a tagged record: a shared header (name, terminals,
//! primary value) plus a variant arm carrying parameters and transient
//! state. Elements know how to stamp themselves into the time-domain and
//! frequency-domain MNA systems, how to pull their post-step state out of
//! a solution vector, and how to reset that state for a fresh run.
//!
//! Time-domain reactive elements use backward-Euler companion models: a
//! conductance in the matrix plus a history current on the right-hand
//! side. At `h == 0` (the DC operating point) capacitors contribute
//! nothing and inductor branch rows carry no self term, so capacitors read
//! as open circuits and inductors as shorts.

use std::f64::consts::PI;

use nalgebra::DVector;
use num_complex::Complex;

use crate::error::{Error, Result};
use crate::mna::{AcSystem, MnaIndex, MnaSystem};
use crate::node::NodeId;

/// Diode saturation current default (A).
pub const DIODE_IS: f64 = 1e-12;
/// Diode emission coefficient default.
pub const DIODE_ETA: f64 = 1.0;
/// Diode thermal voltage default (V).
pub const DIODE_VT: f64 = 0.026;
/// Diode voltage used to seed Newton-Raphson linearization (V).
pub const DIODE_V_SEED: f64 = 0.7;
/// Shunt conductance added to the diode companion model.
pub const GMIN: f64 = 1e-12;

/// Time dependence of an independent source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Constant level `p1`.
    Dc,
    /// `p1 + p2 * sin(2*pi*p3*t)`.
    Sin,
}

fn source_value(kind: SourceKind, p1: f64, p2: f64, p3: f64, time: f64) -> f64 {
    match kind {
        SourceKind::Dc => p1,
        SourceKind::Sin => p1 + p2 * (2.0 * PI * p3 * time).sin(),
    }
}

/// Variant payload of an element.
#[derive(Debug, Clone)]
pub enum ElementKind {
    Resistor,
    Capacitor {
        /// Terminal voltage at the previously accepted step.
        v_prev: f64,
    },
    Inductor {
        /// Branch current at the previously accepted step.
        i_prev: f64,
    },
    Diode {
        is_sat: f64,
        eta: f64,
        vt: f64,
        /// Linearization point for the Shockley companion model.
        v_prev: f64,
    },
    VoltageSource {
        kind: SourceKind,
        p1: f64,
        p2: f64,
        p3: f64,
    },
    /// Unit-magnitude probe for frequency sweeps; a DC source of the
    /// header value in the time domain.
    AcVoltageSource,
    CurrentSource {
        kind: SourceKind,
        p1: f64,
        p2: f64,
        p3: f64,
    },
    Vcvs {
        ctrl_n1: NodeId,
        ctrl_n2: NodeId,
        gain: f64,
    },
    Vccs {
        ctrl_n1: NodeId,
        ctrl_n2: NodeId,
        gain: f64,
    },
    Ccvs {
        /// Name of the component whose branch current controls this source.
        ctrl: String,
        gain: f64,
    },
    Cccs {
        ctrl: String,
        gain: f64,
    },
}

/// A circuit element: shared header plus variant payload.
#[derive(Debug, Clone)]
pub struct Element {
    /// Unique name across all components in a circuit.
    pub name: String,
    pub n1: NodeId,
    pub n2: NodeId,
    /// Primary value: R, C, or L for passives, 1.0 for the AC probe,
    /// 0.0 otherwise.
    pub value: f64,
    pub kind: ElementKind,
}

impl Element {
    /// Element class label used in user-visible messages.
    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            ElementKind::Resistor => "Resistor",
            ElementKind::Capacitor { .. } => "Capacitor",
            ElementKind::Inductor { .. } => "Inductor",
            ElementKind::Diode { .. } => "Diode",
            ElementKind::VoltageSource { .. } => "Voltage source",
            ElementKind::CurrentSource { .. } => "Current source",
            _ => "Component",
        }
    }

    /// Whether this element introduces a branch-current unknown.
    pub fn needs_branch_current(&self) -> bool {
        matches!(
            self.kind,
            ElementKind::Inductor { .. }
                | ElementKind::VoltageSource { .. }
                | ElementKind::AcVoltageSource
                | ElementKind::Vcvs { .. }
                | ElementKind::Ccvs { .. }
        )
    }

    /// Whether this element must participate in Newton-Raphson.
    pub fn is_nonlinear(&self) -> bool {
        matches!(self.kind, ElementKind::Diode { .. })
    }

    /// Write this element's time-domain stamp into the shared system.
    ///
    /// `h` is the current step; `h == 0` is the DC operating point. `row`
    /// is this element's branch-current row when it has one.
    pub fn stamp_tran(
        &self,
        sys: &mut MnaSystem,
        index: &MnaIndex,
        time: f64,
        h: f64,
        row: Option<usize>,
    ) -> Result<()> {
        let i = index.node_row(self.n1);
        let j = index.node_row(self.n2);

        match &self.kind {
            ElementKind::Resistor => {
                sys.stamp_conductance(i, j, 1.0 / self.value);
            }
            ElementKind::Capacitor { v_prev } => {
                if h != 0.0 {
                    let geq = self.value / h;
                    let ieq = geq * v_prev;
                    sys.stamp_conductance(i, j, geq);
                    // history current charges n1 positive
                    sys.stamp_current(j, i, ieq);
                }
            }
            ElementKind::Inductor { i_prev } => {
                let row = self.require_row(row)?;
                sys.stamp_branch_source(i, j, row, 0.0);
                if h != 0.0 {
                    sys.add(row, row, -(self.value / h));
                    sys.add_rhs(row, -(self.value / h) * i_prev);
                }
            }
            ElementKind::Diode {
                is_sat,
                eta,
                vt,
                v_prev,
            } => {
                let exp_term = (v_prev / (eta * vt)).exp();
                let id = is_sat * (exp_term - 1.0);
                let gd = is_sat / (eta * vt) * exp_term + GMIN;
                let ieq = id - gd * v_prev;
                sys.stamp_conductance(i, j, gd);
                sys.stamp_current(i, j, ieq);
            }
            ElementKind::VoltageSource { kind, p1, p2, p3 } => {
                let row = self.require_row(row)?;
                sys.stamp_branch_source(i, j, row, source_value(*kind, *p1, *p2, *p3, time));
            }
            ElementKind::AcVoltageSource => {
                let row = self.require_row(row)?;
                sys.stamp_branch_source(i, j, row, self.value);
            }
            ElementKind::CurrentSource { kind, p1, p2, p3 } => {
                sys.stamp_current(i, j, source_value(*kind, *p1, *p2, *p3, time));
            }
            ElementKind::Vcvs {
                ctrl_n1,
                ctrl_n2,
                gain,
            } => {
                let row = self.require_row(row)?;
                sys.stamp_branch_source(i, j, row, 0.0);
                // control equation: v(n1) - v(n2) - gain*(v(c1) - v(c2)) = 0
                if let Some(c) = index.node_row(*ctrl_n1) {
                    sys.add(row, c, -gain);
                }
                if let Some(c) = index.node_row(*ctrl_n2) {
                    sys.add(row, c, *gain);
                }
            }
            ElementKind::Vccs {
                ctrl_n1,
                ctrl_n2,
                gain,
            } => {
                let cp = index.node_row(*ctrl_n1);
                let cn = index.node_row(*ctrl_n2);
                if let (Some(i), Some(c)) = (i, cp) {
                    sys.add(i, c, *gain);
                }
                if let (Some(i), Some(c)) = (i, cn) {
                    sys.add(i, c, -gain);
                }
                if let (Some(j), Some(c)) = (j, cp) {
                    sys.add(j, c, -gain);
                }
                if let (Some(j), Some(c)) = (j, cn) {
                    sys.add(j, c, *gain);
                }
            }
            ElementKind::Ccvs { ctrl, gain } => {
                let row = self.require_row(row)?;
                let ctrl_row = self.require_control(index, ctrl)?;
                sys.stamp_branch_source(i, j, row, 0.0);
                sys.add(row, ctrl_row, -gain);
            }
            ElementKind::Cccs { ctrl, gain } => {
                let ctrl_row = self.require_control(index, ctrl)?;
                if let Some(i) = i {
                    sys.add(i, ctrl_row, *gain);
                }
                if let Some(j) = j {
                    sys.add(j, ctrl_row, -gain);
                }
            }
        }
        Ok(())
    }

    /// Write this element's frequency-domain stamp at angular frequency
    /// `omega` into the complex system.
    ///
    /// Independent non-probe sources are quiesced: voltage sources hold
    /// 0 V, current sources are open. The AC probe injects unit magnitude.
    pub fn stamp_ac(
        &self,
        sys: &mut AcSystem,
        index: &MnaIndex,
        omega: f64,
        row: Option<usize>,
    ) -> Result<()> {
        let i = index.node_row(self.n1);
        let j = index.node_row(self.n2);
        let zero = Complex::new(0.0, 0.0);

        match &self.kind {
            ElementKind::Resistor => {
                sys.stamp_conductance(i, j, 1.0 / self.value);
            }
            ElementKind::Capacitor { .. } => {
                sys.stamp_admittance(i, j, Complex::new(0.0, omega * self.value));
            }
            ElementKind::Inductor { .. } => {
                // branch equation: v(n1) - v(n2) - j*omega*L * i_L = 0
                let row = self.require_row(row)?;
                sys.stamp_branch_source(i, j, row, zero);
                sys.add(row, row, Complex::new(0.0, -(omega * self.value)));
            }
            ElementKind::Diode {
                is_sat,
                eta,
                vt,
                v_prev,
            } => {
                // small-signal conductance about the stored operating point
                let gd = is_sat / (eta * vt) * (v_prev / (eta * vt)).exp() + GMIN;
                sys.stamp_conductance(i, j, gd);
            }
            ElementKind::VoltageSource { .. } => {
                let row = self.require_row(row)?;
                sys.stamp_branch_source(i, j, row, zero);
            }
            ElementKind::AcVoltageSource => {
                let row = self.require_row(row)?;
                sys.stamp_branch_source(i, j, row, Complex::new(self.value, 0.0));
            }
            ElementKind::CurrentSource { .. } => {}
            ElementKind::Vcvs {
                ctrl_n1,
                ctrl_n2,
                gain,
            } => {
                let row = self.require_row(row)?;
                sys.stamp_branch_source(i, j, row, zero);
                if let Some(c) = index.node_row(*ctrl_n1) {
                    sys.add(row, c, Complex::new(-gain, 0.0));
                }
                if let Some(c) = index.node_row(*ctrl_n2) {
                    sys.add(row, c, Complex::new(*gain, 0.0));
                }
            }
            ElementKind::Vccs {
                ctrl_n1,
                ctrl_n2,
                gain,
            } => {
                let cp = index.node_row(*ctrl_n1);
                let cn = index.node_row(*ctrl_n2);
                if let (Some(i), Some(c)) = (i, cp) {
                    sys.add(i, c, Complex::new(*gain, 0.0));
                }
                if let (Some(i), Some(c)) = (i, cn) {
                    sys.add(i, c, Complex::new(-gain, 0.0));
                }
                if let (Some(j), Some(c)) = (j, cp) {
                    sys.add(j, c, Complex::new(-gain, 0.0));
                }
                if let (Some(j), Some(c)) = (j, cn) {
                    sys.add(j, c, Complex::new(*gain, 0.0));
                }
            }
            ElementKind::Ccvs { ctrl, gain } => {
                let row = self.require_row(row)?;
                let ctrl_row = self.require_control(index, ctrl)?;
                sys.stamp_branch_source(i, j, row, zero);
                sys.add(row, ctrl_row, Complex::new(-gain, 0.0));
            }
            ElementKind::Cccs { ctrl, gain } => {
                let ctrl_row = self.require_control(index, ctrl)?;
                if let Some(i) = i {
                    sys.add(i, ctrl_row, Complex::new(*gain, 0.0));
                }
                if let Some(j) = j {
                    sys.add(j, ctrl_row, Complex::new(-gain, 0.0));
                }
            }
        }
        Ok(())
    }

    /// Pull this element's post-step state out of an accepted solution.
    pub fn update_state(&mut self, solution: &DVector<f64>, index: &MnaIndex) {
        let v1 = index.node_row(self.n1).map(|r| solution[r]).unwrap_or(0.0);
        let v2 = index.node_row(self.n2).map(|r| solution[r]).unwrap_or(0.0);
        match &mut self.kind {
            ElementKind::Capacitor { v_prev } | ElementKind::Diode { v_prev, .. } => {
                *v_prev = v1 - v2;
            }
            ElementKind::Inductor { i_prev } => {
                if let Some(row) = index.branch_row(&self.name) {
                    *i_prev = solution[row];
                }
            }
            _ => {}
        }
    }

    /// Clear transient state before a new analysis run.
    pub fn reset(&mut self) {
        match &mut self.kind {
            ElementKind::Capacitor { v_prev } => *v_prev = 0.0,
            ElementKind::Inductor { i_prev } => *i_prev = 0.0,
            ElementKind::Diode { v_prev, .. } => *v_prev = DIODE_V_SEED,
            _ => {}
        }
    }

    fn require_row(&self, row: Option<usize>) -> Result<usize> {
        row.ok_or_else(|| Error::MissingBranchRow(self.name.clone()))
    }

    fn require_control(&self, index: &MnaIndex, ctrl: &str) -> Result<usize> {
        index
            .branch_row(ctrl)
            .ok_or_else(|| Error::UnresolvedControl {
                name: self.name.clone(),
                ctrl: ctrl.to_string(),
            })
    }
}
