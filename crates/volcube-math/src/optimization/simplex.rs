//! Nelder–Mead simplex.

use crate::array::Array;
use crate::optimization::{
    Constraint, CostFunction, EndCriteria, EndCriteriaType, OptimizationMethod,
    OptimizationResult,
};
use volcube_core::{errors::Result, Real};

/// Nelder–Mead simplex optimizer. Derivative free.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simplex {
    lambda: Real,
}

impl Simplex {
    /// Create a simplex optimizer whose initial vertices are offset from the
    /// guess by `lambda` along each axis.
    pub fn new(lambda: Real) -> Self {
        Self { lambda }
    }
}

impl Default for Simplex {
    fn default() -> Self {
        Self::new(0.1)
    }
}

fn penalized(cost_fn: &dyn CostFunction, constraint: &dyn Constraint, x: &Array) -> Real {
    if !constraint.test(x) {
        return Real::MAX;
    }
    let v = cost_fn.value(x);
    if v.is_finite() {
        v
    } else {
        Real::MAX
    }
}

fn midpoint(a: &Array, b: &Array) -> Array {
    &(a + b) * 0.5
}

impl OptimizationMethod for Simplex {
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

        let mut vertices = Vec::with_capacity(n + 1);
        vertices.push(initial_values.clone());
        for i in 0..n {
            let mut v = initial_values.clone();
            v[i] += self.lambda;
            if !constraint.test(&v) {
                v[i] = initial_values[i] - self.lambda;
            }
            vertices.push(v);
        }
        let mut values: Vec<Real> = vertices
            .iter()
            .map(|v| penalized(cost_fn, constraint, v))
            .collect();

        let mut stationary = 0;
        let mut previous_best = Real::MAX;

        for iteration in 0..end_criteria.max_iterations {
            let mut order: Vec<usize> = (0..=n).collect();
            order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
            let (best, worst) = (order[0], order[n]);
            let second_worst = order[n.saturating_sub(1)];

            if values[best] <= end_criteria.root_epsilon {
                return Ok(OptimizationResult::new(
                    vertices[best].clone(),
                    values[best],
                    iteration,
                    EndCriteriaType::RootEpsilon,
                ));
            }
            if (previous_best - values[best]).abs() < end_criteria.function_epsilon {
                stationary += 1;
                if stationary > end_criteria.max_stationary_state_iterations {
                    return Ok(OptimizationResult::new(
                        vertices[best].clone(),
                        values[best],
                        iteration,
                        EndCriteriaType::StationaryPoint,
                    ));
                }
            } else {
                stationary = 0;
            }
            previous_best = values[best];

            let mut centroid = Array::zeros(n);
            for (i, v) in vertices.iter().enumerate() {
                if i != worst {
                    centroid = &centroid + v;
                }
            }
            let centroid = &centroid * (1.0 / n.max(1) as Real);

            let toward = &centroid - &vertices[worst];
            let reflected = &centroid + &toward;
            let f_reflected = penalized(cost_fn, constraint, &reflected);

            if f_reflected < values[best] {
                let expanded = &centroid + &(&toward * 2.0);
                let f_expanded = penalized(cost_fn, constraint, &expanded);
                if f_expanded < f_reflected {
                    vertices[worst] = expanded;
                    values[worst] = f_expanded;
                } else {
                    vertices[worst] = reflected;
                    values[worst] = f_reflected;
                }
            } else if f_reflected < values[second_worst] {
                vertices[worst] = reflected;
                values[worst] = f_reflected;
            } else {
                let contracted = if f_reflected < values[worst] {
                    midpoint(&centroid, &reflected)
                } else {
                    midpoint(&centroid, &vertices[worst])
                };
                let f_contracted = penalized(cost_fn, constraint, &contracted);
                if f_contracted < values[worst].min(f_reflected) {
                    vertices[worst] = contracted;
                    values[worst] = f_contracted;
                } else {
                    let anchor = vertices[best].clone();
                    for i in 0..=n {
                        if i != best {
                            vertices[i] = midpoint(&anchor, &vertices[i]);
                            values[i] = penalized(cost_fn, constraint, &vertices[i]);
                        }
                    }
                }
            }
        }

        let best = (0..=n)
            .min_by(|&a, &b| values[a].total_cmp(&values[b]))
            .unwrap_or(0);
        Ok(OptimizationResult::new(
            vertices[best].clone(),
            values[best],
            end_criteria.max_iterations,
            EndCriteriaType::MaxIterations,
        ))
    }
}
