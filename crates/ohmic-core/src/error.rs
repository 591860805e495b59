//! Error types for ohmic-core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Passive element values must be strictly positive.
    #[error("{0} cannot be zero or negative")]
    NonPositiveValue(&'static str),

    #[error("{kind} {name} already exists in the circuit")]
    DuplicateComponent { kind: &'static str, name: String },

    #[error("element {0} not found in library")]
    UnknownElementType(String),

    #[error("node {0} not found")]
    UnknownNode(String),

    #[error("node {0} already exists")]
    DuplicateNode(String),

    #[error("node {0} is not a ground node")]
    NotGround(String),

    #[error("component {0} not found")]
    UnknownComponent(String),

    #[error("component {0} is not a DC source")]
    NotADcSource(String),

    /// Raised at stamp time when a CCVS/CCCS controller is missing or
    /// carries no branch-current unknown.
    #[error("controlling component {ctrl} for {name} not found or has no current")]
    UnresolvedControl { name: String, ctrl: String },

    #[error("{0} was not assigned a branch-current row")]
    MissingBranchRow(String),

    #[error("empty value")]
    EmptyValue,

    #[error("malformed value: {0}")]
    MalformedValue(String),

    #[error("a subcircuit named {0} already exists")]
    DuplicateSubcircuit(String),

    #[error("malformed netlist line: {0}")]
    MalformedNetlistLine(String),
}

pub type Result<T> = std::result::Result<T, Error>;
