//! Point-cloud geometry and ground-cost construction.

use nalgebra::DMatrix;

use crate::error::{OtError, Result};

/// A pair of weighted point clouds living in a shared feature space, together
/// with the entropic regularization strength `epsilon` that scales the
/// geometry for the solver.
///
/// The ground cost between a source point `x_i` and a target point `y_j` is
/// the squared Euclidean distance `||x_i - y_j||^2`.
#[derive(Clone, Debug)]
pub struct PointCloud {
    x: DMatrix<f64>,
    y: DMatrix<f64>,
    epsilon: f64,
}

impl PointCloud {
    /// Builds a geometry from source points `x` (n×d), target points `y`
    /// (m×d), and a positive regularization strength.
    pub fn new(x: DMatrix<f64>, y: DMatrix<f64>, epsilon: f64) -> Result<Self> {
        if y.ncols() != x.ncols() {
            return Err(OtError::dimension_mismatch(
                "target feature dimension",
                x.ncols(),
                y.ncols(),
            ));
        }
        if !(epsilon > 0.0) {
            return Err(OtError::NonPositiveRegularization { value: epsilon });
        }
        Ok(Self { x, y, epsilon })
    }

    /// Number of source points (`n`).
    pub fn source_count(&self) -> usize {
        self.x.nrows()
    }

    /// Number of target points (`m`).
    pub fn target_count(&self) -> usize {
        self.y.nrows()
    }

    /// Dimension of the shared feature space.
    pub fn feature_dim(&self) -> usize {
        self.x.ncols()
    }

    /// Entropic regularization strength attached to this geometry.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Returns a read-only view of the source points.
    pub fn x(&self) -> &DMatrix<f64> {
        &self.x
    }

    /// Returns a read-only view of the target points.
    pub fn y(&self) -> &DMatrix<f64> {
        &self.y
    }

    /// Materializes the dense n×m squared-Euclidean cost matrix.
    pub fn cost_matrix(&self) -> DMatrix<f64> {
        let n = self.x.nrows();
        let m = self.y.nrows();
        let mut cost = DMatrix::zeros(n, m);
        for i in 0..n {
            for j in 0..m {
                let mut sq = 0.0;
                for k in 0..self.x.ncols() {
                    let diff = self.x[(i, k)] - self.y[(j, k)];
                    sq += diff * diff;
                }
                cost[(i, j)] = sq;
            }
        }
        cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    #[test]
    fn cost_matrix_is_squared_euclidean() {
        let x = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 1.0, 1.0]);
        let y = DMatrix::from_row_slice(3, 2, &[0.0, 0.0, 2.0, 0.0, 1.0, 1.0]);
        let geometry = PointCloud::new(x, y, 0.1).unwrap();

        let cost = geometry.cost_matrix();
        assert_eq!(cost.shape(), (2, 3));
        assert_relative_eq!(cost[(0, 0)], 0.0);
        assert_relative_eq!(cost[(0, 1)], 4.0);
        assert_relative_eq!(cost[(0, 2)], 2.0);
        assert_relative_eq!(cost[(1, 1)], 2.0);
    }

    #[test]
    fn mismatched_feature_dimensions_are_rejected() {
        let x = DMatrix::from_row_slice(1, 2, &[0.0, 0.0]);
        let y = DMatrix::from_row_slice(1, 3, &[0.0, 0.0, 0.0]);
        let result = PointCloud::new(x, y, 0.1);
        assert!(matches!(result, Err(OtError::DimensionMismatch { .. })));
    }

    #[test]
    fn non_positive_epsilon_is_rejected() {
        let x = DMatrix::from_row_slice(1, 1, &[0.0]);
        let y = x.clone();
        assert!(matches!(
            PointCloud::new(x.clone(), y.clone(), 0.0),
            Err(OtError::NonPositiveRegularization { .. })
        ));
        assert!(matches!(
            PointCloud::new(x, y, f64::NAN),
            Err(OtError::NonPositiveRegularization { .. })
        ));
    }
}
