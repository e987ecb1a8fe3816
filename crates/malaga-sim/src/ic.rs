//! Information coefficient of daily scores.
//!
//! The IC is the Spearman rank correlation between the scores used to pick
//! a day's portfolio and the single-period returns realized that day.

use malaga_traits::stats::{average_ranks, moments, pearson};

/// Spearman rank correlation between `scores` and `returns`.
///
/// Pairs where either side is non-finite are ignored. Returns NaN when the
/// lengths differ, fewer than two pairs remain, or either side is constant.
///
/// # Examples
///
/// ```
/// use malaga_sim::calculate_ic;
///
/// let ic = calculate_ic(&[1.5, 0.3, -0.8, 2.1], &[0.02, 0.01, -0.01, 0.03]);
/// assert!((ic - 1.0).abs() < 1e-12);
/// ```
pub fn calculate_ic(scores: &[f64], returns: &[f64]) -> f64 {
    if scores.len() != returns.len() {
        return f64::NAN;
    }

    let (s, r): (Vec<f64>, Vec<f64>) = scores
        .iter()
        .zip(returns)
        .filter(|(s, r)| s.is_finite() && r.is_finite())
        .map(|(s, r)| (*s, *r))
        .unzip();

    if s.len() < 2 {
        return f64::NAN;
    }
    pearson(&average_ranks(&s), &average_ranks(&r))
}

/// Mean of the finite entries of an IC series, NaN when there are none.
pub fn mean_ic(ics: &[f64]) -> f64 {
    moments(ics).mean
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_perfect_correlation() {
        let ic = calculate_ic(&[1.0, 2.0, 3.0, 4.0, 5.0], &[0.01, 0.02, 0.03, 0.04, 0.05]);
        assert_abs_diff_eq!(ic, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_negative_correlation() {
        let ic = calculate_ic(&[5.0, 4.0, 3.0, 2.0, 1.0], &[0.01, 0.02, 0.03, 0.04, 0.05]);
        assert_abs_diff_eq!(ic, -1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_rank_based_not_linear() {
        // Monotone but non-linear relationship still scores 1.
        let ic = calculate_ic(&[1.0, 2.0, 3.0, 4.0], &[0.001, 0.002, 0.5, 9.0]);
        assert_abs_diff_eq!(ic, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_non_finite_pairs_ignored() {
        let ic = calculate_ic(&[1.0, 2.0, f64::NAN, 4.0], &[0.01, 0.02, 0.03, 0.04]);
        assert_abs_diff_eq!(ic, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_undefined_cases() {
        assert!(calculate_ic(&[1.0], &[0.01]).is_nan());
        assert!(calculate_ic(&[1.0, 2.0], &[0.01]).is_nan());
        assert!(calculate_ic(&[1.0, 1.0, 1.0], &[0.01, 0.02, 0.03]).is_nan());
    }

    #[test]
    fn test_mean_ic_skips_nan() {
        assert_abs_diff_eq!(mean_ic(&[0.2, f64::NAN, 0.4]), 0.3, epsilon = 1e-12);
        assert!(mean_ic(&[]).is_nan());
    }
}
