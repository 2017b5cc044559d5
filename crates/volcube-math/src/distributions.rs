//! Standard normal distribution functions, delegating to `statrs`.

use statrs::distribution::{Continuous, ContinuousCDF, Normal};
use volcube_core::Real;

fn standard_normal() -> Normal {
    Normal::standard()
}

/// The standard normal probability density function φ(x).
pub fn normal_pdf(x: Real) -> Real {
    standard_normal().pdf(x)
}

/// The standard normal cumulative distribution function Φ(x).
pub fn normal_cdf(x: Real) -> Real {
    standard_normal().cdf(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn known_values() {
        assert_abs_diff_eq!(normal_cdf(0.0), 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(normal_cdf(1.96), 0.975_002_104_851_78, epsilon = 1e-9);
        assert_abs_diff_eq!(
            normal_pdf(0.0),
            1.0 / (2.0 * std::f64::consts::PI).sqrt(),
            epsilon = 1e-15
        );
    }

    #[test]
    fn symmetry() {
        for &x in &[0.3, 1.1, 2.5] {
            assert_abs_diff_eq!(normal_cdf(x) + normal_cdf(-x), 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(normal_pdf(x), normal_pdf(-x), epsilon = 1e-15);
        }
    }
}
