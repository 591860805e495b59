//! Core circuit representation and MNA assembly for ohmic.
//!
//! This crate holds the circuit graph (nodes, components, labels,
//! subcircuits) and knows how to assemble it into a Modified Nodal
//! Analysis system. The analysis drivers live in `ohmic-solver`.
//!
//! # Modified Nodal Analysis
//!
//! The system `A x = b` carries the voltages of all non-ground nodes plus
//! the branch currents of elements whose voltage-current relation cannot
//! be expressed as a conductance (voltage sources, inductors, VCVS, CCVS).
//! Each element contributes a *stamp*: a handful of matrix entries and
//! right-hand-side terms. Ground is a set of node ids: any number of
//! nodes may be marked ground and all read as the 0 V reference.
//!
//! # Example
//!
//! ```rust
//! use ohmic_core::Circuit;
//!
//! // voltage divider: V1 = 10 V across R1 + R2
//! let mut circuit = Circuit::new();
//! circuit.add_component("V", "V1", "in", "gnd", 10.0, &[], &[], false).unwrap();
//! circuit.add_component("R", "R1", "in", "mid", 1000.0, &[], &[], false).unwrap();
//! circuit.add_component("R", "R2", "mid", "gnd", 1000.0, &[], &[], false).unwrap();
//! circuit.add_ground("gnd");
//!
//! let (system, index) = circuit.assemble_tran(0.0, 0.0).unwrap();
//! // two non-ground nodes plus the source's branch current
//! assert_eq!(system.size(), 3);
//! assert_eq!(index.branch_row("V1"), Some(2));
//! ```

pub mod circuit;
pub mod element;
pub mod error;
pub mod mna;
pub mod netlist;
pub mod node;
pub mod units;

pub use circuit::Circuit;
pub use element::{Element, ElementKind, SourceKind};
pub use error::{Error, Result};
pub use mna::{AcSystem, MnaIndex, MnaSystem};
pub use netlist::{NetlistLine, SubcircuitDef};
pub use node::{NodeId, NodeRegistry};
pub use units::parse_value;
