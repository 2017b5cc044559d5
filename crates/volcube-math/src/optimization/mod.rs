//! Optimization framework.
//!
//! Provides cost functions, constraints, end criteria, the
//! [`OptimizationMethod`] interface and three concrete optimizers:
//! Levenberg–Marquardt, conjugate gradient with an Armijo line search, and
//! the Nelder–Mead simplex.

use crate::array::Array;
use volcube_core::{errors::Result, Real};

mod conjugate_gradient;
mod levenberg_marquardt;
mod line_search;
mod simplex;

pub use conjugate_gradient::ConjugateGradient;
pub use levenberg_marquardt::LevenbergMarquardt;
pub use line_search::ArmijoLineSearch;
pub use simplex::Simplex;

// ── Cost function trait ───────────────────────────────────────────────────────

/// A multi-dimensional least-squares cost function.
pub trait CostFunction {
    /// Evaluate the residuals at `x`.
    fn values(&self, x: &Array) -> Array;

    /// Return the scalar cost `0.5 * Σ r²(x)`.
    fn value(&self, x: &Array) -> Real {
        let v = self.values(x);
        0.5 * v.norm_squared()
    }

    /// Jacobian of the residuals, one row per residual.
    ///
    /// Default uses forward finite differences.
    fn jacobian(&self, x: &Array) -> Vec<Array> {
        let n = x.size();
        let f0 = self.values(x);
        let m = f0.size();
        let mut rows = vec![Array::zeros(n); m];
        for j in 0..n {
            let h = 1e-8 * x[j].abs().max(1.0);
            let mut xp = x.clone();
            xp[j] += h;
            let fp = self.values(&xp);
            for (r, row) in rows.iter_mut().enumerate() {
                row[j] = (fp[r] - f0[r]) / h;
            }
        }
        rows
    }

    /// Gradient of the scalar cost `Jᵀ r`.
    fn gradient(&self, x: &Array) -> Array {
        let v = self.values(x);
        let jac = self.jacobian(x);
        let mut grad = Array::zeros(x.size());
        for (r, row) in jac.iter().enumerate() {
            for j in 0..x.size() {
                grad[j] += v[r] * row[j];
            }
        }
        grad
    }
}

// ── Constraints ───────────────────────────────────────────────────────────────

/// A constraint on the parameter space.
pub trait Constraint {
    /// Return `true` if `x` satisfies the constraint.
    fn test(&self, x: &Array) -> bool;
}

/// No constraint: all parameter values are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConstraint;

impl Constraint for NoConstraint {
    fn test(&self, _x: &Array) -> bool {
        true
    }
}

/// Boundary constraint: all parameters must be within `[lo, hi]`.
#[derive(Debug, Clone)]
pub struct BoundaryConstraint {
    /// Lower bound.
    pub lo: Real,
    /// Upper bound.
    pub hi: Real,
}

impl BoundaryConstraint {
    /// Create a boundary constraint.
    pub fn new(lo: Real, hi: Real) -> Self {
        Self { lo, hi }
    }
}

impl Constraint for BoundaryConstraint {
    fn test(&self, x: &Array) -> bool {
        x.iter().all(|&v| v >= self.lo && v <= self.hi)
    }
}

// ── End criteria ──────────────────────────────────────────────────────────────

/// Criteria to stop an optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct EndCriteria {
    /// Maximum number of iterations.
    pub max_iterations: usize,
    /// Maximum number of stationary-state iterations.
    pub max_stationary_state_iterations: usize,
    /// Root epsilon: stop when the cost drops below this.
    pub root_epsilon: Real,
    /// Function epsilon: an iteration changing the cost by less than this
    /// counts as stationary.
    pub function_epsilon: Real,
    /// Gradient norm epsilon: stop when the gradient norm drops below this.
    pub gradient_norm_epsilon: Real,
}

impl EndCriteria {
    /// Create new end criteria.
    pub fn new(
        max_iterations: usize,
        max_stationary_state_iterations: usize,
        root_epsilon: Real,
        function_epsilon: Real,
        gradient_norm_epsilon: Real,
    ) -> Self {
        Self {
            max_iterations,
            max_stationary_state_iterations,
            root_epsilon,
            function_epsilon,
            gradient_norm_epsilon,
        }
    }
}

impl Default for EndCriteria {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            max_stationary_state_iterations: 100,
            root_epsilon: 1e-8,
            function_epsilon: 1e-8,
            gradient_norm_epsilon: 1e-8,
        }
    }
}

/// The reason an optimization terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndCriteriaType {
    /// Maximum iterations reached.
    MaxIterations,
    /// Cost below root epsilon.
    RootEpsilon,
    /// Step or cost change below tolerance.
    FunctionEpsilon,
    /// Gradient norm below gradient norm epsilon.
    GradientNormEpsilon,
    /// Maximum stationary-state iterations reached.
    StationaryPoint,
}

/// Result of an optimization.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Final parameter values.
    pub x: Array,
    /// Final cost value.
    pub value: Real,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Reason for termination.
    pub end_type: EndCriteriaType,
}

impl OptimizationResult {
    pub(crate) fn new(x: Array, value: Real, iterations: usize, end_type: EndCriteriaType) -> Self {
        Self {
            x,
            value,
            iterations,
            end_type,
        }
    }
}

// ── Optimization method ───────────────────────────────────────────────────────

/// A local optimizer minimizing a [`CostFunction`] from an initial guess.
pub trait OptimizationMethod: std::fmt::Debug + Send + Sync {
    /// Minimize `cost_fn` subject to `constraint`, starting from
    /// `initial_values`, until one of `end_criteria` is met.
    fn minimize(
        &self,
        cost_fn: &dyn CostFunction,
        constraint: &dyn Constraint,
        initial_values: &Array,
        end_criteria: &EndCriteria,
    ) -> Result<OptimizationResult>;
}
