//! Linear transport problem container pairing a geometry with its marginals.

use nalgebra::{DMatrix, DVector};

use crate::error::{OtError, Result};
use crate::geometry::PointCloud;

/// An entropic-regularized linear optimal transport problem: a ground
/// geometry plus marginal weight vectors `a` (source) and `b` (target).
///
/// Only the lengths of the marginals are validated. Whether the weights are
/// non-negative or sum to one is the caller's responsibility; the solver
/// matches whatever marginals it is handed.
///
/// The cost matrix is materialized once at construction so that solving reads
/// precomputed state instead of touching the geometry. Timed benchmark calls
/// therefore measure only the fixed-point iteration itself.
#[derive(Clone, Debug)]
pub struct LinearProblem {
    geometry: PointCloud,
    a: DVector<f64>,
    b: DVector<f64>,
    cost: DMatrix<f64>,
}

impl LinearProblem {
    /// Pairs a geometry with explicit marginal weights.
    pub fn new(geometry: PointCloud, a: DVector<f64>, b: DVector<f64>) -> Result<Self> {
        if a.len() != geometry.source_count() {
            return Err(OtError::dimension_mismatch(
                "source weights length",
                geometry.source_count(),
                a.len(),
            ));
        }
        if b.len() != geometry.target_count() {
            return Err(OtError::dimension_mismatch(
                "target weights length",
                geometry.target_count(),
                b.len(),
            ));
        }
        let cost = geometry.cost_matrix();
        Ok(Self {
            geometry,
            a,
            b,
            cost,
        })
    }

    /// Pairs a geometry with uniform marginals `1/n` and `1/m`.
    pub fn with_uniform_weights(geometry: PointCloud) -> Self {
        let n = geometry.source_count();
        let m = geometry.target_count();
        let a = DVector::from_element(n, 1.0 / n as f64);
        let b = DVector::from_element(m, 1.0 / m as f64);
        let cost = geometry.cost_matrix();
        Self {
            geometry,
            a,
            b,
            cost,
        }
    }

    /// The ground geometry.
    pub fn geometry(&self) -> &PointCloud {
        &self.geometry
    }

    /// Source marginal weights (`a`).
    pub fn a(&self) -> &DVector<f64> {
        &self.a
    }

    /// Target marginal weights (`b`).
    pub fn b(&self) -> &DVector<f64> {
        &self.b
    }

    /// The precomputed dense cost matrix.
    pub fn cost(&self) -> &DMatrix<f64> {
        &self.cost
    }

    /// Regularization strength, forwarded from the geometry.
    pub fn epsilon(&self) -> f64 {
        self.geometry.epsilon()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, DVector};

    fn line_geometry(epsilon: f64) -> PointCloud {
        let x = DMatrix::from_row_slice(2, 1, &[0.0, 1.0]);
        let y = DMatrix::from_row_slice(2, 1, &[0.0, 1.0]);
        PointCloud::new(x, y, epsilon).unwrap()
    }

    #[test]
    fn marginal_lengths_are_validated() {
        let geometry = line_geometry(0.1);
        let a = DVector::from_vec(vec![0.5, 0.5]);
        let b = DVector::from_vec(vec![1.0]);
        let result = LinearProblem::new(geometry, a, b);
        assert!(matches!(result, Err(OtError::DimensionMismatch { .. })));
    }

    #[test]
    fn weight_sums_are_not_validated() {
        // Normalization is delegated to the caller; arbitrary positive mass
        // is accepted as-is.
        let geometry = line_geometry(0.1);
        let a = DVector::from_vec(vec![2.0, 2.0]);
        let b = DVector::from_vec(vec![3.0, 1.0]);
        assert!(LinearProblem::new(geometry, a, b).is_ok());
    }

    #[test]
    fn uniform_weights_cover_both_marginals() {
        let x = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
        let y = DMatrix::from_row_slice(2, 1, &[0.0, 1.0]);
        let geometry = PointCloud::new(x, y, 0.5).unwrap();
        let problem = LinearProblem::with_uniform_weights(geometry);

        assert_relative_eq!(problem.a().sum(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(problem.b().sum(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(problem.a()[0], 0.25);
        assert_relative_eq!(problem.b()[1], 0.5);
    }

    #[test]
    fn cost_is_materialized_at_construction() {
        let geometry = line_geometry(0.1);
        let problem = LinearProblem::with_uniform_weights(geometry);
        assert_eq!(problem.cost().shape(), (2, 2));
        assert_relative_eq!(problem.cost()[(0, 1)], 1.0);
    }
}
