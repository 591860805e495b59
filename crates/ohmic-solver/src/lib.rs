//! Analysis drivers for ohmic.
//!
//! The solvers borrow a [`ohmic_core::Circuit`] mutably for the duration
//! of a run and hand back self-contained result values:
//!
//! - [`solve_op`]: DC operating point (capacitors open, inductors short)
//! - [`solve_dc_sweep`]: operating points across a source-level range
//! - [`solve_transient`]: backward-Euler time stepping with adaptive
//!   step halving and Newton-Raphson for nonlinear elements
//! - [`solve_ac_sweep`]: complex steady-state sweep over angular
//!   frequency
//! - [`transient_series`] / [`ac_series`]: projection of stored
//!   solutions onto `V(node)` / `I(component)` variables

pub mod ac;
pub mod dc;
pub mod error;
pub mod linear;
pub mod newton;
pub mod probe;
pub mod sweep;
pub mod transient;

pub use ac::{solve_ac_sweep, AcParams, AcPoint, AcResult};
pub use dc::{solve_op, OpPoint};
pub use error::{Error, Result};
pub use linear::{solve_complex, solve_dense};
pub use newton::{solve_newton, NewtonSettings, NrResult};
pub use probe::{ac_series, transient_series, Series};
pub use sweep::{solve_dc_sweep, DcSweepParams, DcSweepResult, SweepPoint};
pub use transient::{solve_transient, TimePoint, TransientParams, TransientResult, H_MIN};
