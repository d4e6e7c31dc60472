//! Sinkhorn fixed-point solver for entropic-regularized transport.
//!
//! Two update modes are provided. Kernel mode works on the Gibbs kernel
//! `K = exp(-C / eps)` directly and is the fast path when `eps` is large
//! relative to the cost scale. Log-domain (`lse_mode`) performs the same
//! updates through log-sum-exp arithmetic, which stays finite at small `eps`
//! where the kernel underflows to zero.

use nalgebra::{DMatrix, DVector};

use crate::error::{OtError, Result};
use crate::problem::LinearProblem;

/// Configuration for the Sinkhorn fixed-point iteration.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Sinkhorn {
    /// L1 marginal-error threshold for early stopping. A threshold of `0.0`
    /// disables the convergence check entirely: the solver always runs its
    /// full iteration budget, making the work performed deterministic.
    pub threshold: f64,
    /// Use log-sum-exp updates instead of kernel-space scaling.
    pub lse_mode: bool,
    /// Maximum number of full (row + column) update sweeps.
    pub max_iterations: usize,
}

impl Default for Sinkhorn {
    fn default() -> Self {
        Self {
            threshold: 1e-3,
            lse_mode: true,
            max_iterations: 2_000,
        }
    }
}

impl Sinkhorn {
    /// Override the early-stopping threshold (`0.0` disables it).
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Select between log-domain and kernel-space updates.
    pub fn with_lse_mode(mut self, lse_mode: bool) -> Self {
        self.lse_mode = lse_mode;
        self
    }

    /// Override the iteration budget.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Runs the fixed-point iteration on `problem`.
    ///
    /// Exhausting the iteration budget is not an error; the achieved marginal
    /// error is reported in the output. The only failure path is non-finite
    /// arithmetic in kernel mode.
    pub fn solve(&self, problem: &LinearProblem) -> Result<SinkhornOutput> {
        if self.lse_mode {
            self.solve_lse(problem)
        } else {
            self.solve_kernel(problem)
        }
    }

    fn solve_lse(&self, problem: &LinearProblem) -> Result<SinkhornOutput> {
        let cost = problem.cost();
        let eps = problem.epsilon();
        let (n, m) = cost.shape();

        let log_a: Vec<f64> = problem.a().iter().map(|w| w.ln()).collect();
        let log_b: Vec<f64> = problem.b().iter().map(|w| w.ln()).collect();

        let mut f = DVector::<f64>::zeros(n);
        let mut g = DVector::<f64>::zeros(m);
        let mut scratch = vec![0.0; n.max(m)];
        let mut iterations = 0usize;

        for iteration in 0..self.max_iterations {
            for i in 0..n {
                for j in 0..m {
                    scratch[j] = (g[j] - cost[(i, j)]) / eps;
                }
                f[i] = eps * log_a[i] - eps * log_sum_exp(&scratch[..m]);
            }
            for j in 0..m {
                for i in 0..n {
                    scratch[i] = (f[i] - cost[(i, j)]) / eps;
                }
                g[j] = eps * log_b[j] - eps * log_sum_exp(&scratch[..n]);
            }
            iterations = iteration + 1;

            if iterations % 100 == 0 {
                log::trace!("sinkhorn lse sweep {iterations}");
            }
            if self.threshold > 0.0 {
                let plan = plan_from_potentials(cost, eps, &f, &g);
                if row_marginal_error(&plan, problem.a()) < self.threshold {
                    break;
                }
            }
        }

        let matrix = plan_from_potentials(cost, eps, &f, &g);
        Ok(self.finish(problem, matrix, f, g, iterations))
    }

    fn solve_kernel(&self, problem: &LinearProblem) -> Result<SinkhornOutput> {
        let cost = problem.cost();
        let eps = problem.epsilon();
        let (n, m) = cost.shape();

        let kernel = cost.map(|c| (-c / eps).exp());
        let mut u = DVector::from_element(n, 1.0 / n as f64);
        let mut v = DVector::from_element(m, 1.0 / m as f64);
        let mut iterations = 0usize;

        for iteration in 0..self.max_iterations {
            let kv = &kernel * &v;
            for i in 0..n {
                u[i] = problem.a()[i] / kv[i];
            }
            let ktu = kernel.transpose() * &u;
            for j in 0..m {
                v[j] = problem.b()[j] / ktu[j];
            }
            if u.iter().chain(v.iter()).any(|s| !s.is_finite()) {
                return Err(OtError::NumericalError {
                    context: "kernel-mode scaling",
                });
            }
            iterations = iteration + 1;

            if self.threshold > 0.0 {
                let plan = plan_from_scalings(&kernel, &u, &v);
                if row_marginal_error(&plan, problem.a()) < self.threshold {
                    break;
                }
            }
        }

        let matrix = plan_from_scalings(&kernel, &u, &v);
        let f = u.map(|s| eps * s.ln());
        let g = v.map(|s| eps * s.ln());
        Ok(self.finish(problem, matrix, f, g, iterations))
    }

    fn finish(
        &self,
        problem: &LinearProblem,
        matrix: DMatrix<f64>,
        f: DVector<f64>,
        g: DVector<f64>,
        iterations: usize,
    ) -> SinkhornOutput {
        // All consumed outputs are materialized here, before the caller sees
        // the result object.
        let marginal_error =
            row_marginal_error(&matrix, problem.a()) + column_marginal_error(&matrix, problem.b());
        let transport_cost = matrix.component_mul(problem.cost()).sum();
        SinkhornOutput {
            matrix,
            f,
            g,
            iterations,
            marginal_error,
            transport_cost,
        }
    }
}

/// Result of a Sinkhorn run: the transport plan, the dual potentials that
/// generate it, and convergence diagnostics.
#[derive(Clone, Debug)]
pub struct SinkhornOutput {
    matrix: DMatrix<f64>,
    f: DVector<f64>,
    g: DVector<f64>,
    iterations: usize,
    marginal_error: f64,
    transport_cost: f64,
}

impl SinkhornOutput {
    /// The dense (n, m) transport plan.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Source dual potential (`f`).
    pub fn f(&self) -> &DVector<f64> {
        &self.f
    }

    /// Target dual potential (`g`).
    pub fn g(&self) -> &DVector<f64> {
        &self.g
    }

    /// Number of full update sweeps performed.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Final L1 deviation of the plan's marginals from `a` and `b`.
    pub fn marginal_error(&self) -> f64 {
        self.marginal_error
    }

    /// Linear transport cost `<P, C>` of the returned plan.
    pub fn transport_cost(&self) -> f64 {
        self.transport_cost
    }
}

/// Numerically stable `log(sum(exp(values)))` via max-shifting.
fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    let sum: f64 = values.iter().map(|v| (v - max).exp()).sum();
    max + sum.ln()
}

fn plan_from_potentials(
    cost: &DMatrix<f64>,
    eps: f64,
    f: &DVector<f64>,
    g: &DVector<f64>,
) -> DMatrix<f64> {
    let (n, m) = cost.shape();
    DMatrix::from_fn(n, m, |i, j| ((f[i] + g[j] - cost[(i, j)]) / eps).exp())
}

fn plan_from_scalings(kernel: &DMatrix<f64>, u: &DVector<f64>, v: &DVector<f64>) -> DMatrix<f64> {
    let (n, m) = kernel.shape();
    DMatrix::from_fn(n, m, |i, j| u[i] * kernel[(i, j)] * v[j])
}

fn row_marginal_error(plan: &DMatrix<f64>, a: &DVector<f64>) -> f64 {
    plan.row_iter()
        .zip(a.iter())
        .map(|(row, weight)| (row.sum() - weight).abs())
        .sum()
}

fn column_marginal_error(plan: &DMatrix<f64>, b: &DVector<f64>) -> f64 {
    plan.column_iter()
        .zip(b.iter())
        .map(|(column, weight)| (column.sum() - weight).abs())
        .sum()
}
