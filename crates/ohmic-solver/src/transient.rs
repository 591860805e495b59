//! Time-domain analysis: backward-Euler stepping with adaptive halving.

use nalgebra::DVector;
use ohmic_core::{Circuit, MnaIndex};

use crate::error::{Error, Result};
use crate::linear::solve_dense;
use crate::newton::{solve_newton, NewtonSettings};

/// Smallest step the driver will attempt before giving up.
pub const H_MIN: f64 = 1e-12;

/// Transient analysis request.
///
/// `h_max == 0` asks the driver to pick `(t_stop - t_start) / 100`.
#[derive(Debug, Clone)]
pub struct TransientParams {
    pub t_start: f64,
    pub t_stop: f64,
    pub h_max: f64,
}

/// A single accepted timepoint.
#[derive(Debug, Clone)]
pub struct TimePoint {
    pub time: f64,
    /// Node voltages followed by branch currents.
    pub solution: DVector<f64>,
}

/// Result of a transient run, timepoints ascending in time.
#[derive(Debug, Clone)]
pub struct TransientResult {
    pub points: Vec<TimePoint>,
    pub index: MnaIndex,
    /// Last good time when the run stopped early on timestep underflow.
    /// The points accumulated up to that time remain valid.
    pub halted_at: Option<f64>,
}

/// Run a transient analysis.
///
/// Each outer step attempts `h = h_max` (clamped to the stop time) and
/// halves on failure (a singular system, or Newton-Raphson running out
/// of iterations) until the step solves or `h` underflows [`H_MIN`].
/// Accepted steps commit every element's state and restore `h_max`.
///
/// The first stored point holds the all-zero initial condition at
/// `t_start`.
pub fn solve_transient(circuit: &mut Circuit, params: &TransientParams) -> Result<TransientResult> {
    if !circuit.has_ground() {
        return Err(Error::NoGround);
    }

    let h_max = if params.h_max == 0.0 {
        (params.t_stop - params.t_start) / 100.0
    } else {
        params.h_max
    };

    circuit.reset_states();
    let index = circuit.mna_index();
    if index.size() == 0 {
        return Err(Error::EmptyCircuit);
    }

    log::info!(
        "transient analysis: t = {:e}..{:e} s, h_max = {:e} s",
        params.t_start,
        params.t_stop,
        h_max
    );

    let size = index.size();
    let mut result = TransientResult {
        points: vec![TimePoint {
            time: params.t_start,
            solution: DVector::zeros(size),
        }],
        index,
        halted_at: None,
    };

    let newton = NewtonSettings::default();
    let mut t = params.t_start;

    while params.t_stop - t > H_MIN {
        let mut h = h_max.min(params.t_stop - t);

        let solution = loop {
            if h < H_MIN {
                log::error!("timestep fell below minimum at t = {t:e} s; stopping");
                result.halted_at = Some(t);
                return Ok(result);
            }

            let attempt = if circuit.has_nonlinear() {
                solve_newton(circuit, t + h, h, &newton).map(|nr| nr.solution)
            } else {
                circuit
                    .assemble_tran(t + h, h)
                    .map_err(Error::from)
                    .and_then(|(sys, _)| solve_dense(sys.matrix(), sys.rhs()))
            };

            match attempt {
                Ok(solution) => break solution,
                Err(Error::SingularMatrix) | Err(Error::ConvergenceFailed { .. }) => {
                    log::debug!("step to t = {:e} s failed; halving h", t + h);
                    h /= 2.0;
                }
                Err(fatal) => return Err(fatal),
            }
        };

        t += h;
        circuit.update_states(&solution, &result.index);
        result.points.push(TimePoint { time: t, solution });
    }

    log::info!(
        "transient analysis complete: {} timepoints stored",
        result.points.len()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_step_substitution() {
        // h_max = 0 requests (t_stop - t_start)/100: 100 steps + initial point
        let mut circuit = Circuit::new();
        circuit
            .add_component("V", "V1", "in", "gnd", 5.0, &[], &[], false)
            .unwrap();
        circuit
            .add_component("R", "R1", "in", "gnd", 1000.0, &[], &[], false)
            .unwrap();
        circuit.add_ground("gnd");

        let result = solve_transient(
            &mut circuit,
            &TransientParams {
                t_start: 0.0,
                t_stop: 1e-3,
                h_max: 0.0,
            },
        )
        .unwrap();

        assert_eq!(result.points.len(), 101);
        assert!(result.halted_at.is_none());
    }

    #[test]
    fn test_steady_circuit_matches_source() {
        let mut circuit = Circuit::new();
        circuit
            .add_component("V", "V1", "in", "gnd", 5.0, &[], &[], false)
            .unwrap();
        circuit
            .add_component("R", "R1", "in", "gnd", 1000.0, &[], &[], false)
            .unwrap();
        circuit.add_ground("gnd");

        let result = solve_transient(
            &mut circuit,
            &TransientParams {
                t_start: 0.0,
                t_stop: 1e-3,
                h_max: 1e-4,
            },
        )
        .unwrap();

        let row = result
            .index
            .node_row(circuit.node_id("in").unwrap())
            .unwrap();
        // the initial point holds the zero initial condition
        assert_eq!(result.points[0].solution[row], 0.0);
        for point in &result.points[1..] {
            assert!((point.solution[row] - 5.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_unsolvable_circuit_halts_with_partial_results() {
        // a current source into a node with no other connection leaves an
        // all-zero matrix row, so the system is singular at every step and
        // halving runs h into the floor
        let mut circuit = Circuit::new();
        circuit
            .add_component("I", "I1", "b", "gnd", 1e-3, &[], &[], false)
            .unwrap();
        circuit.add_ground("gnd");

        let result = solve_transient(
            &mut circuit,
            &TransientParams {
                t_start: 0.0,
                t_stop: 1e-3,
                h_max: 1e-4,
            },
        )
        .unwrap();

        assert_eq!(result.halted_at, Some(0.0));
        assert_eq!(result.points.len(), 1);
    }

    #[test]
    fn test_requires_ground() {
        let mut circuit = Circuit::new();
        circuit
            .add_component("R", "R1", "a", "b", 1.0, &[], &[], false)
            .unwrap();
        let err = solve_transient(
            &mut circuit,
            &TransientParams {
                t_start: 0.0,
                t_stop: 1e-3,
                h_max: 1e-4,
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::NoGround));
    }

    #[test]
    fn test_sin_source_is_sampled_at_step_times() {
        // V = sin(2*pi*250*t) peaks at t = 1 ms with a 250 Hz sine
        let mut circuit = Circuit::new();
        circuit
            .add_component("V", "V1", "in", "gnd", 0.0, &[0.0, 1.0, 250.0], &[], true)
            .unwrap();
        circuit
            .add_component("R", "R1", "in", "gnd", 1000.0, &[], &[], false)
            .unwrap();
        circuit.add_ground("gnd");

        let result = solve_transient(
            &mut circuit,
            &TransientParams {
                t_start: 0.0,
                t_stop: 1e-3,
                h_max: 1e-4,
            },
        )
        .unwrap();

        let row = result
            .index
            .node_row(circuit.node_id("in").unwrap())
            .unwrap();
        let last = result.points.last().unwrap();
        assert!((last.time - 1e-3).abs() < 1e-12);
        assert!(
            (last.solution[row] - 1.0).abs() < 1e-9,
            "V(in) = {} at quarter period (expected 1.0)",
            last.solution[row]
        );
    }
}
