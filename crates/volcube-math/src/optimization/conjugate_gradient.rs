//! Fletcher–Reeves conjugate gradient.

use crate::array::Array;
use crate::optimization::{
    ArmijoLineSearch, Constraint, CostFunction, EndCriteria, EndCriteriaType,
    OptimizationMethod, OptimizationResult,
};
use volcube_core::{errors::Result, Real};

/// Fletcher–Reeves conjugate gradient on the scalar cost, stepping with an
/// [`ArmijoLineSearch`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConjugateGradient {
    line_search: ArmijoLineSearch,
}

impl ConjugateGradient {
    /// Create an optimizer using the given line search.
    pub fn new(line_search: ArmijoLineSearch) -> Self {
        Self { line_search }
    }

    /// The line search used for each step.
    pub fn line_search(&self) -> &ArmijoLineSearch {
        &self.line_search
    }
}

impl OptimizationMethod for ConjugateGradient {
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
        let mut x = initial_values.clone();
        let mut value = cost_fn.value(&x);
        let mut grad = cost_fn.gradient(&x);
        let mut direction = -&grad;
        let mut stationary = 0;

        for iteration in 0..end_criteria.max_iterations {
            if value <= end_criteria.root_epsilon {
                return Ok(OptimizationResult::new(x, value, iteration, EndCriteriaType::RootEpsilon));
            }
            if grad.norm() <= end_criteria.gradient_norm_epsilon {
                return Ok(OptimizationResult::new(
                    x,
                    value,
                    iteration,
                    EndCriteriaType::GradientNormEpsilon,
                ));
            }

            let mut step = self
                .line_search
                .search(cost_fn, constraint, &x, &direction, value, &grad);
            if step.is_none() {
                // restart along steepest descent
                direction = -&grad;
                step = self
                    .line_search
                    .search(cost_fn, constraint, &x, &direction, value, &grad);
            }
            let Some((next, next_value)) = step else {
                return Ok(OptimizationResult::new(
                    x,
                    value,
                    iteration,
                    EndCriteriaType::StationaryPoint,
                ));
            };

            if value - next_value < end_criteria.function_epsilon {
                stationary += 1;
                if stationary > end_criteria.max_stationary_state_iterations {
                    return Ok(OptimizationResult::new(
                        next,
                        next_value,
                        iteration + 1,
                        EndCriteriaType::StationaryPoint,
                    ));
                }
            } else {
                stationary = 0;
            }

            let next_grad = cost_fn.gradient(&next);
            let old_norm_sq = grad.norm_squared();
            let beta: Real = if old_norm_sq > 0.0 {
                next_grad.norm_squared() / old_norm_sq
            } else {
                0.0
            };
            direction = &(-&next_grad) + &(&direction * beta);
            x = next;
            value = next_value;
            grad = next_grad;
        }

        Ok(OptimizationResult::new(
            x,
            value,
            end_criteria.max_iterations,
            EndCriteriaType::MaxIterations,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::test_functions::*;
    use crate::optimization::NoConstraint;
    use approx::assert_abs_diff_eq;

    #[test]
    fn quadratic() {
        let result = ConjugateGradient::default()
            .minimize(
                &SimpleQuadratic,
                &NoConstraint,
                &Array::from_slice(&[10.0]),
                &EndCriteria::new(1000, 100, 1e-14, 1e-16, 1e-10),
            )
            .unwrap();
        assert_abs_diff_eq!(result.x[0], 3.0, epsilon = 1e-5);
    }

    #[test]
    fn rosenbrock_decreases() {
        let x0 = Array::from_slice(&[-1.2, 1.0]);
        let result = ConjugateGradient::default()
            .minimize(&Rosenbrock, &NoConstraint, &x0, &EndCriteria::default())
            .unwrap();
        assert!(result.value < Rosenbrock.value(&x0));
    }

    #[test]
    fn default_line_search_parameters() {
        let ls = *ConjugateGradient::default().line_search();
        assert_eq!(ls, ArmijoLineSearch::new(1e-12, 0.15, 0.55));
    }
}
