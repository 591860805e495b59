//! Frequency-domain analysis: a linear sweep over angular frequency.
//!
//! Each sweep point assembles the complex MNA system (resistors as real
//! conductance, capacitors as `jωC`, inductors as `jωL` branch rows, the
//! AC probe as a unit-magnitude excitation, other independent sources
//! quiesced) and solves it directly. A singular system at any point fails
//! the whole sweep.

use nalgebra::DVector;
use num_complex::Complex;
use ohmic_core::{Circuit, MnaIndex};

use crate::error::{Error, Result};
use crate::linear::solve_complex;

/// AC sweep request over angular frequency (rad/s).
#[derive(Debug, Clone)]
pub struct AcParams {
    pub omega_start: f64,
    pub omega_stop: f64,
    /// Number of evenly spaced points, at least two.
    pub num_points: usize,
}

/// A single solved frequency point.
#[derive(Debug, Clone)]
pub struct AcPoint {
    /// Angular frequency (rad/s).
    pub omega: f64,
    /// Complex node voltages followed by branch currents.
    pub solution: DVector<Complex<f64>>,
}

/// Result of an AC sweep, points ascending in omega.
#[derive(Debug, Clone)]
pub struct AcResult {
    pub points: Vec<AcPoint>,
    pub index: MnaIndex,
}

/// Run an AC sweep.
///
/// Requires a ground node and at least one AC probe source in the
/// circuit; the sweep steps omega linearly from `omega_start` to
/// `omega_stop` inclusive.
pub fn solve_ac_sweep(circuit: &mut Circuit, params: &AcParams) -> Result<AcResult> {
    if !circuit.has_ground() {
        return Err(Error::NoGround);
    }
    if !circuit.has_ac_source() {
        return Err(Error::NoAcSource);
    }
    if params.num_points < 2 {
        return Err(Error::DegenerateSweep);
    }

    let index = circuit.mna_index();
    if index.size() == 0 {
        return Err(Error::EmptyCircuit);
    }

    let step = (params.omega_stop - params.omega_start) / (params.num_points - 1) as f64;
    let mut result = AcResult {
        points: Vec::with_capacity(params.num_points),
        index,
    };

    for k in 0..params.num_points {
        let omega = params.omega_start + step * k as f64;
        let (sys, _) = circuit.assemble_ac(omega)?;
        let solution = solve_complex(sys.matrix(), sys.rhs())?;
        result.points.push(AcPoint { omega, solution });
    }

    log::info!(
        "AC sweep complete: {} frequency points stored",
        result.points.len()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rc_lowpass() -> Circuit {
        // AC1 -- R (1k) -- out -- C (1u) -- gnd
        let mut circuit = Circuit::new();
        circuit
            .add_component("AC", "AC1", "in", "gnd", 0.0, &[], &[], false)
            .unwrap();
        circuit
            .add_component("R", "R1", "in", "out", 1000.0, &[], &[], false)
            .unwrap();
        circuit
            .add_component("C", "C1", "out", "gnd", 1e-6, &[], &[], false)
            .unwrap();
        circuit.add_ground("gnd");
        circuit
    }

    #[test]
    fn test_rc_corner_magnitude() {
        let mut circuit = rc_lowpass();
        // three points put omega = 1000 rad/s (omega*R*C = 1) in the middle
        let result = solve_ac_sweep(
            &mut circuit,
            &AcParams {
                omega_start: 500.0,
                omega_stop: 1500.0,
                num_points: 3,
            },
        )
        .unwrap();

        let out = result
            .index
            .node_row(circuit.node_id("out").unwrap())
            .unwrap();
        let corner = &result.points[1];
        assert!((corner.omega - 1000.0).abs() < 1e-9);
        let mag = corner.solution[out].norm();
        let expected = 1.0 / 2.0f64.sqrt();
        assert!(
            (mag - expected).abs() < expected * 0.02,
            "|V(out)| = {mag} at the corner (expected {expected})"
        );
    }

    #[test]
    fn test_points_ascend_in_omega() {
        let mut circuit = rc_lowpass();
        let result = solve_ac_sweep(
            &mut circuit,
            &AcParams {
                omega_start: 1.0,
                omega_stop: 1e5,
                num_points: 50,
            },
        )
        .unwrap();

        assert_eq!(result.points.len(), 50);
        assert!((result.points[0].omega - 1.0).abs() < 1e-12);
        assert!((result.points[49].omega - 1e5).abs() < 1e-6);
        for pair in result.points.windows(2) {
            assert!(pair[0].omega < pair[1].omega);
        }
    }

    #[test]
    fn test_requires_ac_source() {
        let mut circuit = Circuit::new();
        circuit
            .add_component("V", "V1", "in", "gnd", 1.0, &[], &[], false)
            .unwrap();
        circuit
            .add_component("R", "R1", "in", "gnd", 1000.0, &[], &[], false)
            .unwrap();
        circuit.add_ground("gnd");

        let err = solve_ac_sweep(
            &mut circuit,
            &AcParams {
                omega_start: 1.0,
                omega_stop: 100.0,
                num_points: 5,
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::NoAcSource));
    }

    #[test]
    fn test_rejects_single_point_sweep() {
        let mut circuit = rc_lowpass();
        let err = solve_ac_sweep(
            &mut circuit,
            &AcParams {
                omega_start: 1.0,
                omega_stop: 100.0,
                num_points: 1,
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::DegenerateSweep));
    }

    #[test]
    fn test_inductor_branch_in_ac() {
        // AC1 -- L (0.1 H) -- out -- R (1k) -- gnd: first-order lowpass
        // with corner at R/L = 10^4 rad/s
        let mut circuit = Circuit::new();
        circuit
            .add_component("AC", "AC1", "in", "gnd", 0.0, &[], &[], false)
            .unwrap();
        circuit
            .add_component("L", "L1", "in", "out", 0.1, &[], &[], false)
            .unwrap();
        circuit
            .add_component("R", "R1", "out", "gnd", 1000.0, &[], &[], false)
            .unwrap();
        circuit.add_ground("gnd");

        let result = solve_ac_sweep(
            &mut circuit,
            &AcParams {
                omega_start: 5000.0,
                omega_stop: 15000.0,
                num_points: 3,
            },
        )
        .unwrap();

        let out = result
            .index
            .node_row(circuit.node_id("out").unwrap())
            .unwrap();
        let corner = &result.points[1];
        let mag = corner.solution[out].norm();
        let expected = 1.0 / 2.0f64.sqrt();
        assert!(
            (mag - expected).abs() < expected * 0.02,
            "|V(out)| = {mag} at omega = R/L (expected {expected})"
        );
    }
}
