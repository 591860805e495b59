//! DC operating point.

use nalgebra::DVector;
use ohmic_core::{Circuit, MnaIndex};

use crate::error::{Error, Result};
use crate::linear::solve_dense;
use crate::newton::{solve_newton, NewtonSettings};

/// A solved operating point.
#[derive(Debug, Clone)]
pub struct OpPoint {
    /// Node voltages followed by branch currents, per `index`.
    pub solution: DVector<f64>,
    pub index: MnaIndex,
    /// Newton-Raphson iterations spent (1 for linear circuits).
    pub iterations: usize,
}

/// Solve the DC operating point: a single solve at `(t = 0, h = 0)`,
/// where capacitors are open circuits and inductors shorts. Nonlinear
/// circuits run the Newton-Raphson loop.
pub fn solve_op(circuit: &mut Circuit) -> Result<OpPoint> {
    if !circuit.has_ground() {
        return Err(Error::NoGround);
    }

    circuit.reset_states();
    let index = circuit.mna_index();
    if index.size() == 0 {
        return Err(Error::EmptyCircuit);
    }

    if circuit.has_nonlinear() {
        let nr = solve_newton(circuit, 0.0, 0.0, &NewtonSettings::default())?;
        Ok(OpPoint {
            solution: nr.solution,
            index,
            iterations: nr.iterations,
        })
    } else {
        let (sys, _) = circuit.assemble_tran(0.0, 0.0)?;
        let solution = solve_dense(sys.matrix(), sys.rhs())?;
        Ok(OpPoint {
            solution,
            index,
            iterations: 1,
        })
    }
}
