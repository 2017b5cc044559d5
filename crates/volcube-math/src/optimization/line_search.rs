//! Armijo backtracking line search.

use crate::array::Array;
use crate::optimization::{Constraint, CostFunction};
use volcube_core::Real;

/// Backtracking line search enforcing the Armijo sufficient-decrease
/// condition `f(x + t·d) ≤ f(x) + α·t·∇f·d`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmijoLineSearch {
    /// Smallest step tried before giving up.
    pub eps: Real,
    /// Sufficient-decrease coefficient α.
    pub alpha: Real,
    /// Backtracking factor β applied to the step on each rejection.
    pub beta: Real,
}

impl ArmijoLineSearch {
    /// Create a line search.
    pub fn new(eps: Real, alpha: Real, beta: Real) -> Self {
        Self { eps, alpha, beta }
    }

    /// Search along `direction` from `x` (cost `value`, gradient `gradient`).
    ///
    /// Returns the accepted point and its cost, or `None` when the step
    /// shrank below `eps` without sufficient decrease.
    pub fn search(
        &self,
        cost_fn: &dyn CostFunction,
        constraint: &dyn Constraint,
        x: &Array,
        direction: &Array,
        value: Real,
        gradient: &Array,
    ) -> Option<(Array, Real)> {
        let slope = gradient.dot(direction);
        if slope >= 0.0 {
            return None;
        }
        let mut t = 1.0;
        while t > self.eps {
            let candidate = x + &(direction * t);
            if constraint.test(&candidate) {
                let candidate_value = cost_fn.value(&candidate);
                if candidate_value.is_finite()
                    && candidate_value <= value + self.alpha * t * slope
                {
                    return Some((candidate, candidate_value));
                }
            }
            t *= self.beta;
        }
        None
    }
}

impl Default for ArmijoLineSearch {
    fn default() -> Self {
        Self::new(1e-12, 0.15, 0.55)
    }
}
