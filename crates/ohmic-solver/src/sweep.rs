//! DC sweep: operating points across a range of source levels.

use nalgebra::DVector;
use ohmic_core::{Circuit, ElementKind, MnaIndex, SourceKind};

use crate::dc::solve_op;
use crate::error::{Error, Result};

/// DC sweep request: step an independent DC source from `start` to `stop`.
#[derive(Debug, Clone)]
pub struct DcSweepParams {
    /// Name of the swept voltage or current source.
    pub source: String,
    pub start: f64,
    pub stop: f64,
    /// Positive increment between points.
    pub step: f64,
}

/// One solved sweep point.
#[derive(Debug, Clone)]
pub struct SweepPoint {
    /// The source level this point was solved at.
    pub value: f64,
    pub solution: DVector<f64>,
}

/// Result of a DC sweep, points ascending by swept value.
#[derive(Debug, Clone)]
pub struct DcSweepResult {
    pub points: Vec<SweepPoint>,
    pub index: MnaIndex,
}

fn dc_level(circuit: &Circuit, name: &str) -> Result<f64> {
    let comp = circuit
        .component(name)
        .ok_or_else(|| ohmic_core::Error::UnknownComponent(name.to_string()))?;
    match &comp.kind {
        ElementKind::VoltageSource {
            kind: SourceKind::Dc,
            p1,
            ..
        }
        | ElementKind::CurrentSource {
            kind: SourceKind::Dc,
            p1,
            ..
        } => Ok(*p1),
        _ => Err(ohmic_core::Error::NotADcSource(name.to_string()).into()),
    }
}

/// Run a DC sweep.
///
/// The swept source's level is overwritten per point and restored to its
/// resting value afterwards, whether or not the sweep succeeds.
pub fn solve_dc_sweep(circuit: &mut Circuit, params: &DcSweepParams) -> Result<DcSweepResult> {
    if params.step <= 0.0 {
        return Err(Error::DegenerateSweep);
    }
    let resting = dc_level(circuit, &params.source)?;

    let index = circuit.mna_index();
    if index.size() == 0 {
        return Err(Error::EmptyCircuit);
    }

    let mut run = || -> Result<Vec<SweepPoint>> {
        let mut points = Vec::new();
        let mut value = params.start;
        while value <= params.stop + params.step * 1e-9 {
            circuit.set_source_value(&params.source, value)?;
            let op = solve_op(circuit)?;
            points.push(SweepPoint {
                value,
                solution: op.solution,
            });
            value += params.step;
        }
        Ok(points)
    };

    let outcome = run();
    circuit.set_source_value(&params.source, resting)?;
    let points = outcome?;

    log::info!("DC sweep complete: {} points stored", points.len());
    Ok(DcSweepResult { points, index })
}
