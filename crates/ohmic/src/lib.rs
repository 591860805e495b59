//! # ohmic
//!
//! A small SPICE-style circuit simulation engine built around Modified
//! Nodal Analysis: per-element stamps into a dense system, direct LU
//! solves, backward-Euler transient analysis with adaptive step halving
//! and Newton-Raphson for nonlinear elements, and a complex steady-state
//! frequency sweep.
//!
//! ## Quick start
//!
//! ```rust
//! use ohmic::prelude::*;
//!
//! // RC low-pass driven by a 5 V step
//! let mut circuit = Circuit::new();
//! circuit.add_component("V", "V1", "in", "gnd", 5.0, &[], &[], false).unwrap();
//! circuit.add_component("R", "R1", "in", "out", 1000.0, &[], &[], false).unwrap();
//! circuit.add_component("C", "C1", "out", "gnd", 1e-6, &[], &[], false).unwrap();
//! circuit.add_ground("gnd");
//!
//! let result = solve_transient(
//!     &mut circuit,
//!     &TransientParams { t_start: 0.0, t_stop: 5e-3, h_max: 5e-5 },
//! )
//! .unwrap();
//!
//! let series = transient_series(&circuit, &result, &["V(out)"]);
//! let (_, v_final) = *series["V(out)"].last().unwrap();
//! assert!(v_final > 4.9); // charged to within a few time constants
//! ```

// Re-export the member crates
pub use ohmic_core as core;
pub use ohmic_solver as solver;

pub use ohmic_core::{
    parse_value,
    Circuit,
    Element,
    ElementKind,
    Error as CoreError,
    MnaIndex,
    MnaSystem,
    NodeId,
    NodeRegistry,
    SourceKind,
    SubcircuitDef,
};

pub use ohmic_solver::{
    ac_series,
    solve_ac_sweep,
    solve_dc_sweep,
    solve_newton,
    solve_op,
    solve_transient,
    transient_series,
    AcParams,
    AcResult,
    DcSweepParams,
    DcSweepResult,
    Error as SolverError,
    NewtonSettings,
    OpPoint,
    TransientParams,
    TransientResult,
};

/// Re-export of nalgebra's dynamic vector type.
pub use nalgebra::DVector;

/// Re-export of nalgebra's dynamic matrix type.
pub use nalgebra::DMatrix;

/// Re-export of num_complex's Complex type.
pub use num_complex::Complex;

/// Prelude module containing the commonly used types and entry points.
///
/// ```rust
/// use ohmic::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Circuit, ElementKind, NodeId, SourceKind, SubcircuitDef};

    pub use crate::{parse_value, MnaIndex, MnaSystem};

    pub use crate::{solve_dc_sweep, solve_op, DcSweepParams, OpPoint};

    pub use crate::{solve_transient, TransientParams, TransientResult};

    pub use crate::{solve_ac_sweep, AcParams, AcResult};

    pub use crate::{ac_series, transient_series};

    pub use crate::{Complex, DMatrix, DVector};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_covers_a_dc_solve() {
        let mut circuit = Circuit::new();
        circuit
            .add_component("V", "V1", "in", "gnd", 10.0, &[], &[], false)
            .unwrap();
        circuit
            .add_component("R", "R1", "in", "gnd", 2000.0, &[], &[], false)
            .unwrap();
        circuit.add_ground("gnd");

        let op = solve_op(&mut circuit).unwrap();
        let row = op.index.node_row(circuit.node_id("in").unwrap()).unwrap();
        assert!((op.solution[row] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_value_parser_reexport() {
        assert!((parse_value("4.7k").unwrap() - 4700.0).abs() < 1e-9);
    }
}
