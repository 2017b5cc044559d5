//! Levenberg–Marquardt least-squares optimizer.

use nalgebra::{DMatrix, DVector};
use tracing::trace;

use crate::array::Array;
use crate::optimization::{
    Constraint, CostFunction, EndCriteria, EndCriteriaType, OptimizationMethod,
    OptimizationResult,
};
use volcube_core::{errors::Result, Real};

/// Damped Gauss–Newton iteration on the residual vector.
///
/// Each step solves `(JᵀJ + λ·I) δ = −Jᵀr`; λ shrinks after an accepted step
/// and grows after a rejected one. The Jacobian comes from
/// [`CostFunction::jacobian`], so under-determined problems (fewer residuals
/// than parameters) are handled by the damping term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevenbergMarquardt {
    /// Initial damping relative to the largest diagonal entry of `JᵀJ`.
    pub initial_damping: Real,
    /// Relative step-size tolerance.
    pub x_tolerance: Real,
}

impl LevenbergMarquardt {
    /// Create an optimizer.
    pub fn new(initial_damping: Real, x_tolerance: Real) -> Self {
        Self {
            initial_damping,
            x_tolerance,
        }
    }
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self::new(1e-3, 1e-14)
    }
}

const MAX_DAMPING: Real = 1e16;

impl OptimizationMethod for LevenbergMarquardt {
    fn minimize(
        &self,
        cost_fn: &dyn CostFunction,
        constraint: &dyn Constraint,
        initial_values: &Array,
        end_criteria: &EndCriteria,
    ) -> Result<OptimizationResult> {
        volcube_core::ensure!(
            constraint.test(initial_values),
            "initial guess violates the constraint"
        );
        let n = initial_values.size();
        let mut x = initial_values.clone();
        let mut residuals = cost_fn.values(&x);
        let mut cost = 0.5 * residuals.norm_squared();
        let mut lambda: Option<Real> = None;
        let mut stationary = 0;

        for iteration in 0..end_criteria.max_iterations {
            if cost <= end_criteria.root_epsilon {
                return Ok(OptimizationResult::new(x, cost, iteration, EndCriteriaType::RootEpsilon));
            }

            let rows = cost_fn.jacobian(&x);
            let m = rows.len();
            let jac = DMatrix::from_fn(m, n, |i, j| rows[i][j]);
            let r = DVector::from_column_slice(residuals.as_slice());
            let jtj = jac.transpose() * &jac;
            let grad = jac.transpose() * &r;

            if grad.norm() <= end_criteria.gradient_norm_epsilon {
                return Ok(OptimizationResult::new(
                    x,
                    cost,
                    iteration,
                    EndCriteriaType::GradientNormEpsilon,
                ));
            }

            let mut mu = lambda.unwrap_or_else(|| {
                let diag_max = (0..n).map(|i| jtj[(i, i)]).fold(0.0, Real::max);
                self.initial_damping * diag_max.max(1e-12)
            });

            // Grow the damping until a step lowers the cost.
            let accepted = loop {
                if mu > MAX_DAMPING {
                    break None;
                }
                let mut lhs = jtj.clone();
                for i in 0..n {
                    lhs[(i, i)] += mu;
                }
                let Some(step) = lhs.lu().solve(&(-&grad)) else {
                    mu *= 10.0;
                    continue;
                };
                let candidate = &x + &Array::from(step.clone());
                if !candidate.is_finite() || !constraint.test(&candidate) {
                    mu *= 10.0;
                    continue;
                }
                let candidate_residuals = cost_fn.values(&candidate);
                let candidate_cost = 0.5 * candidate_residuals.norm_squared();
                if candidate_cost.is_finite() && candidate_cost < cost {
                    break Some((candidate, candidate_residuals, candidate_cost, step.norm()));
                }
                mu *= 10.0;
            };

            let Some((candidate, candidate_residuals, candidate_cost, step_norm)) = accepted else {
                trace!(iteration, cost, "damping exhausted");
                return Ok(OptimizationResult::new(
                    x,
                    cost,
                    iteration,
                    EndCriteriaType::StationaryPoint,
                ));
            };

            let improvement = cost - candidate_cost;
            x = candidate;
            residuals = candidate_residuals;
            cost = candidate_cost;
            lambda = Some((mu / 10.0).max(1e-20));

            if step_norm <= self.x_tolerance * (x.norm() + self.x_tolerance) {
                return Ok(OptimizationResult::new(
                    x,
                    cost,
                    iteration + 1,
                    EndCriteriaType::FunctionEpsilon,
                ));
            }
            if improvement < end_criteria.function_epsilon {
                stationary += 1;
                if stationary > end_criteria.max_stationary_state_iterations {
                    return Ok(OptimizationResult::new(
                        x,
                        cost,
                        iteration + 1,
                        EndCriteriaType::StationaryPoint,
                    ));
                }
            } else {
                stationary = 0;
            }
        }

        Ok(OptimizationResult::new(
            x,
            cost,
            end_criteria.max_iterations,
            EndCriteriaType::MaxIterations,
        ))
    }
}
