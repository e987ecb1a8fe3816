//! Statistical helpers shared by the scorers and the simulation summary.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Minimum threshold for standard deviation to avoid division by zero.
/// Values below this threshold are treated as zero variance.
pub const MIN_STD_THRESHOLD: f64 = 1e-10;

/// Mean and sample standard deviation of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    /// Arithmetic mean of the finite values.
    pub mean: f64,
    /// Sample standard deviation (N-1 denominator) of the finite values.
    pub std: f64,
    /// Number of finite values used.
    pub n: usize,
}

/// Computes mean and sample standard deviation, ignoring non-finite values.
///
/// # Edge Cases
///
/// - No finite values: mean and std are NaN
/// - Single value: std is 0
///
/// # Examples
///
/// ```
/// use malaga_traits::stats::moments;
///
/// let m = moments(&[1.0, 2.0, 3.0, f64::NAN]);
/// assert_eq!(m.n, 3);
/// assert!((m.mean - 2.0).abs() < 1e-12);
/// assert!((m.std - 1.0).abs() < 1e-12);
/// ```
pub fn moments(values: &[f64]) -> Moments {
    let finite: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    let n = finite.len();
    if n == 0 {
        return Moments {
            mean: f64::NAN,
            std: f64::NAN,
            n,
        };
    }

    let mean = finite.iter().sum::<f64>() / n as f64;
    // Sample variance with N-1 denominator (Bessel's correction)
    let variance = if n > 1 {
        finite.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
    } else {
        0.0
    };

    Moments {
        mean,
        std: variance.sqrt(),
        n,
    }
}

/// Per-column z-score transform learned from a training matrix.
///
/// Columns whose standard deviation falls below [`MIN_STD_THRESHOLD`] are
/// centered but not scaled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl ColumnScaler {
    /// Learns column means and sample standard deviations.
    pub fn fit(values: &Array2<f64>) -> Self {
        let n = values.nrows();
        let means: Vec<f64> = if n == 0 {
            vec![0.0; values.ncols()]
        } else {
            values
                .mean_axis(Axis(0))
                .map(|m| m.to_vec())
                .unwrap_or_else(|| vec![0.0; values.ncols()])
        };
        let stds = if n > 1 {
            values.std_axis(Axis(0), 1.0).to_vec()
        } else {
            vec![0.0; values.ncols()]
        };
        Self { means, stds }
    }

    /// Applies the learned transform to a matrix with the same columns.
    pub fn transform(&self, values: &Array2<f64>) -> Array2<f64> {
        let mut out = values.clone();
        for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let mean = self.means[j];
            let std = self.stds[j];
            if std > MIN_STD_THRESHOLD {
                column.mapv_inplace(|x| (x - mean) / std);
            } else {
                column.mapv_inplace(|x| x - mean);
            }
        }
        out
    }

    /// Learned column means.
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Learned column standard deviations.
    pub fn stds(&self) -> &[f64] {
        &self.stds
    }
}

/// Ranks of values (0-based), averaging tied ranks.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j < n && indexed[j].1 == indexed[i].1 {
            j += 1;
        }
        let avg_rank = (i + j - 1) as f64 / 2.0;
        for item in &indexed[i..j] {
            ranks[item.0] = avg_rank;
        }
        i = j;
    }
    ranks
}

/// Pearson correlation of two equally long series. NaN when undefined.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    if n < 2 || n != y.len() {
        return f64::NAN;
    }
    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}
