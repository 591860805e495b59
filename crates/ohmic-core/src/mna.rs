//! Modified Nodal Analysis: the shared linear system and its row maps.
//!
//! The system `A x = b` carries one row per non-ground node followed by one
//! row per branch-current unknown (voltage sources, inductors, VCVS, CCVS).
//! Elements write into it through the stamp helpers; a `None` node index
//! means ground and the corresponding entries are dropped silently.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use nalgebra::{DMatrix, DVector};
use num_complex::Complex;

use crate::element::Element;
use crate::node::{NodeId, NodeRegistry};

/// Row assignments for one analysis pass.
///
/// Node rows are assigned to live non-ground node ids in ascending id
/// order; branch rows follow in component insertion order. Derived per
/// assembly and never cached across analyses.
#[derive(Debug, Clone, Default)]
pub struct MnaIndex {
    node_rows: BTreeMap<NodeId, usize>,
    branch_rows: IndexMap<String, usize>,
}

impl MnaIndex {
    pub(crate) fn build(nodes: &NodeRegistry, components: &[Element]) -> Self {
        let mut node_rows = BTreeMap::new();
        for id in nodes.live_ids() {
            if !nodes.is_ground(id) {
                let row = node_rows.len();
                node_rows.insert(id, row);
            }
        }

        let mut branch_rows = IndexMap::new();
        let mut next = node_rows.len();
        for comp in components {
            if comp.needs_branch_current() {
                branch_rows.insert(comp.name.clone(), next);
                next += 1;
            }
        }

        Self {
            node_rows,
            branch_rows,
        }
    }

    /// Matrix row of a node, `None` for ground or merged-away ids.
    pub fn node_row(&self, id: NodeId) -> Option<usize> {
        self.node_rows.get(&id).copied()
    }

    /// Matrix row of a component's branch-current unknown.
    pub fn branch_row(&self, name: &str) -> Option<usize> {
        self.branch_rows.get(name).copied()
    }

    pub fn num_nodes(&self) -> usize {
        self.node_rows.len()
    }

    pub fn num_branches(&self) -> usize {
        self.branch_rows.len()
    }

    /// Total system size: node rows plus branch rows.
    pub fn size(&self) -> usize {
        self.node_rows.len() + self.branch_rows.len()
    }
}

/// Real MNA system for DC and transient analysis.
#[derive(Debug, Clone)]
pub struct MnaSystem {
    matrix: DMatrix<f64>,
    rhs: DVector<f64>,
}

impl MnaSystem {
    pub fn new(size: usize) -> Self {
        Self {
            matrix: DMatrix::zeros(size, size),
            rhs: DVector::zeros(size),
        }
    }

    pub fn size(&self) -> usize {
        self.rhs.len()
    }

    pub fn clear(&mut self) {
        self.matrix.fill(0.0);
        self.rhs.fill(0.0);
    }

    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        self.matrix[(row, col)] += value;
    }

    pub fn add_rhs(&mut self, row: usize, value: f64) {
        self.rhs[row] += value;
    }

    /// Stamp a conductance between two nodes.
    ///
    /// Adds `g` on both diagonals and `-g` on the off-diagonals; entries
    /// touching ground (`None`) are dropped.
    pub fn stamp_conductance(&mut self, node_i: Option<usize>, node_j: Option<usize>, g: f64) {
        if let Some(i) = node_i {
            self.matrix[(i, i)] += g;
        }
        if let Some(j) = node_j {
            self.matrix[(j, j)] += g;
        }
        if let (Some(i), Some(j)) = (node_i, node_j) {
            self.matrix[(i, j)] -= g;
            self.matrix[(j, i)] -= g;
        }
    }

    /// Stamp a current flowing from `node_i` to `node_j`.
    pub fn stamp_current(&mut self, node_i: Option<usize>, node_j: Option<usize>, current: f64) {
        if let Some(i) = node_i {
            self.rhs[i] -= current;
        }
        if let Some(j) = node_j {
            self.rhs[j] += current;
        }
    }

    /// Stamp the incidence pattern of a branch-current unknown plus its
    /// right-hand-side value: `±1` links between the terminal rows and the
    /// branch row, `value` added at `b[row]`.
    pub fn stamp_branch_source(
        &mut self,
        node_pos: Option<usize>,
        node_neg: Option<usize>,
        row: usize,
        value: f64,
    ) {
        if let Some(p) = node_pos {
            self.matrix[(p, row)] += 1.0;
            self.matrix[(row, p)] += 1.0;
        }
        if let Some(n) = node_neg {
            self.matrix[(n, row)] -= 1.0;
            self.matrix[(row, n)] -= 1.0;
        }
        self.rhs[row] += value;
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn rhs(&self) -> &DVector<f64> {
        &self.rhs
    }
}

/// Complex MNA system for the frequency domain.
#[derive(Debug, Clone)]
pub struct AcSystem {
    matrix: DMatrix<Complex<f64>>,
    rhs: DVector<Complex<f64>>,
}

impl AcSystem {
    pub fn new(size: usize) -> Self {
        Self {
            matrix: DMatrix::from_element(size, size, Complex::new(0.0, 0.0)),
            rhs: DVector::from_element(size, Complex::new(0.0, 0.0)),
        }
    }

    pub fn size(&self) -> usize {
        self.rhs.len()
    }

    pub fn add(&mut self, row: usize, col: usize, value: Complex<f64>) {
        self.matrix[(row, col)] += value;
    }

    pub fn add_rhs(&mut self, row: usize, value: Complex<f64>) {
        self.rhs[row] += value;
    }

    /// Stamp a complex admittance between two nodes.
    pub fn stamp_admittance(
        &mut self,
        node_i: Option<usize>,
        node_j: Option<usize>,
        y: Complex<f64>,
    ) {
        if let Some(i) = node_i {
            self.matrix[(i, i)] += y;
        }
        if let Some(j) = node_j {
            self.matrix[(j, j)] += y;
        }
        if let (Some(i), Some(j)) = (node_i, node_j) {
            self.matrix[(i, j)] -= y;
            self.matrix[(j, i)] -= y;
        }
    }

    /// Stamp a real conductance between two nodes.
    pub fn stamp_conductance(&mut self, node_i: Option<usize>, node_j: Option<usize>, g: f64) {
        self.stamp_admittance(node_i, node_j, Complex::new(g, 0.0));
    }

    /// Complex counterpart of [`MnaSystem::stamp_branch_source`].
    pub fn stamp_branch_source(
        &mut self,
        node_pos: Option<usize>,
        node_neg: Option<usize>,
        row: usize,
        value: Complex<f64>,
    ) {
        let one = Complex::new(1.0, 0.0);
        if let Some(p) = node_pos {
            self.matrix[(p, row)] += one;
            self.matrix[(row, p)] += one;
        }
        if let Some(n) = node_neg {
            self.matrix[(n, row)] -= one;
            self.matrix[(row, n)] -= one;
        }
        self.rhs[row] += value;
    }

    pub fn matrix(&self) -> &DMatrix<Complex<f64>> {
        &self.matrix
    }

    pub fn rhs(&self) -> &DVector<Complex<f64>> {
        &self.rhs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_conductance() {
        let mut sys = MnaSystem::new(2);
        sys.stamp_conductance(Some(0), Some(1), 1.0);

        assert_eq!(sys.matrix()[(0, 0)], 1.0);
        assert_eq!(sys.matrix()[(1, 1)], 1.0);
        assert_eq!(sys.matrix()[(0, 1)], -1.0);
        assert_eq!(sys.matrix()[(1, 0)], -1.0);
    }

    #[test]
    fn test_stamp_conductance_to_ground() {
        let mut sys = MnaSystem::new(2);
        sys.stamp_conductance(Some(0), None, 1.0);

        assert_eq!(sys.matrix()[(0, 0)], 1.0);
        assert_eq!(sys.matrix()[(1, 1)], 0.0);
    }

    #[test]
    fn test_stamp_current() {
        let mut sys = MnaSystem::new(2);
        sys.stamp_current(None, Some(0), 1e-3);

        assert_eq!(sys.rhs()[0], 1e-3);
        assert_eq!(sys.rhs()[1], 0.0);
    }

    #[test]
    fn test_stamp_branch_source() {
        let mut sys = MnaSystem::new(3);
        sys.stamp_branch_source(Some(0), Some(1), 2, 5.0);

        assert_eq!(sys.matrix()[(0, 2)], 1.0);
        assert_eq!(sys.matrix()[(2, 0)], 1.0);
        assert_eq!(sys.matrix()[(1, 2)], -1.0);
        assert_eq!(sys.matrix()[(2, 1)], -1.0);
        assert_eq!(sys.rhs()[2], 5.0);
    }

    #[test]
    fn test_ac_admittance_stamp() {
        let mut sys = AcSystem::new(2);
        let y = Complex::new(1.0, 2.0);
        sys.stamp_admittance(Some(0), Some(1), y);

        assert_eq!(sys.matrix()[(0, 0)], y);
        assert_eq!(sys.matrix()[(1, 1)], y);
        assert_eq!(sys.matrix()[(0, 1)], -y);
        assert_eq!(sys.matrix()[(1, 0)], -y);
    }

    #[test]
    fn test_clear() {
        let mut sys = MnaSystem::new(2);
        sys.stamp_conductance(Some(0), Some(1), 1.0);
        sys.add_rhs(0, 2.0);
        sys.clear();

        assert_eq!(sys.matrix()[(0, 0)], 0.0);
        assert_eq!(sys.rhs()[0], 0.0);
    }
}
