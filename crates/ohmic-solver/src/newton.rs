//! Newton-Raphson iteration for circuits with nonlinear elements.

use nalgebra::DVector;
use ohmic_core::Circuit;

use crate::error::{Error, Result};
use crate::linear::solve_dense;

/// Iteration limits for the Newton-Raphson loop.
#[derive(Debug, Clone)]
pub struct NewtonSettings {
    /// Maximum iterations before giving up.
    pub max_iterations: usize,
    /// Convergence threshold on the 2-norm of the solution delta.
    pub tolerance: f64,
}

impl Default for NewtonSettings {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

/// Outcome of a converged Newton-Raphson run.
#[derive(Debug, Clone)]
pub struct NrResult {
    pub solution: DVector<f64>,
    /// Iterations spent, including the converging one.
    pub iterations: usize,
}

/// Solve the circuit at `(time, h)` by repeated relinearization.
///
/// Each iteration re-assembles the system around the nonlinear elements'
/// stored state, solves, and compares against the previous iterate.
/// Between iterations only nonlinear element state is updated; linear
/// history is left for the driver to commit on step acceptance.
///
/// A singular iterate surfaces as [`Error::SingularMatrix`] so the caller
/// can react (the transient driver halves its step); running out of
/// iterations surfaces as [`Error::ConvergenceFailed`].
pub fn solve_newton(
    circuit: &mut Circuit,
    time: f64,
    h: f64,
    settings: &NewtonSettings,
) -> Result<NrResult> {
    let mut last: Option<DVector<f64>> = None;

    for iteration in 0..settings.max_iterations {
        let (sys, index) = circuit.assemble_tran(time, h)?;
        let solution = solve_dense(sys.matrix(), sys.rhs())?;

        if let Some(prev) = &last {
            if (&solution - prev).norm() < settings.tolerance {
                return Ok(NrResult {
                    solution,
                    iterations: iteration + 1,
                });
            }
        }

        circuit.update_nonlinear_states(&solution, &index);
        last = Some(solution);
    }

    Err(Error::ConvergenceFailed {
        iterations: settings.max_iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diode_circuit_converges() {
        // V1 -- R1 -- k -- D1 -- gnd
        let mut circuit = Circuit::new();
        circuit
            .add_component("V", "V1", "a", "gnd", 1.0, &[], &[], false)
            .unwrap();
        circuit
            .add_component("R", "R1", "a", "k", 1000.0, &[], &[], false)
            .unwrap();
        circuit
            .add_component("D", "D1", "k", "gnd", 0.0, &[], &[], false)
            .unwrap();
        circuit.add_ground("gnd");
        circuit.reset_states();

        let nr = solve_newton(&mut circuit, 0.0, 0.0, &NewtonSettings::default()).unwrap();

        let index = circuit.mna_index();
        let k = index.node_row(circuit.node_id("k").unwrap()).unwrap();
        let vk = nr.solution[k];
        assert!(
            vk > 0.4 && vk < 0.7,
            "V(k) = {vk} (expected a forward diode drop)"
        );
        assert!(
            nr.iterations < 20,
            "took {} iterations (expected < 20)",
            nr.iterations
        );
    }

    #[test]
    fn test_singular_iterate_is_reported() {
        // a dangling node gives a singular conductance matrix
        let mut circuit = Circuit::new();
        circuit
            .add_component("R", "R1", "a", "b", 1000.0, &[], &[], false)
            .unwrap();
        circuit
            .add_component("D", "D1", "c", "gnd", 0.0, &[], &[], false)
            .unwrap();
        circuit.add_ground("gnd");

        let err = solve_newton(&mut circuit, 0.0, 0.0, &NewtonSettings::default()).unwrap_err();
        assert!(matches!(err, Error::SingularMatrix));
    }
}
