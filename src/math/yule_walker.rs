//! Yule-Walker AR estimation.
//!
//! Used for series too short to support a least squares fit with `p` lags.
//! The Toeplitz system built from sample autocovariances is solved with the
//! Levinson-Durbin recursion, which always yields a stationary AR polynomial
//! for a positive-definite autocovariance sequence.
//!
//! The models here carry no trend term, so the process mean is taken as zero
//! and the series is not demeaned.

/// Biased sample autocovariances `γ(0..=max_lag)` around a zero mean.
pub fn autocovariance(series: &[f64], max_lag: usize) -> Vec<f64> {
    let n = series.len();
    if n == 0 {
        return vec![0.0; max_lag + 1];
    }
    (0..=max_lag)
        .map(|k| {
            if k >= n {
                return 0.0;
            }
            let sum: f64 = (k..n).map(|i| series[i] * series[i - k]).sum();
            sum / n as f64
        })
        .collect()
}

/// Solve for AR(`p`) coefficients from autocovariances `acov[0..=p]`.
///
/// Returns the coefficients and the innovation variance, or `None` if
/// `acov[0]` is (numerically) zero or the recursion degenerates.
pub fn levinson_durbin(acov: &[f64], p: usize) -> Option<(Vec<f64>, f64)> {
    if acov.len() <= p || acov[0].abs() < 1e-12 {
        return None;
    }

    let mut phi = vec![0.0; p];
    let mut err = acov[0];

    for k in 0..p {
        let mut acc = acov[k + 1];
        for j in 0..k {
            acc -= phi[j] * acov[k - j];
        }
        let reflection = acc / err;
        if !reflection.is_finite() {
            return None;
        }

        let prev = phi.clone();
        phi[k] = reflection;
        for j in 0..k {
            phi[j] = prev[j] - reflection * prev[k - 1 - j];
        }

        err *= 1.0 - reflection * reflection;
        if err <= 0.0 {
            // Perfectly predictable series; keep what we have.
            err = 0.0;
            break;
        }
    }

    Some((phi, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autocovariance_of_zero_series_is_zero() {
        let acov = autocovariance(&[0.0; 8], 2);
        assert!(acov.iter().all(|v| v.abs() < 1e-12));
        assert!(levinson_durbin(&acov, 2).is_none());
    }

    #[test]
    fn ar1_recovers_lag_one_correlation() {
        // acov of an AR(1) with phi = 0.6: γ(k) = 0.6^k γ(0)
        let acov = [1.0, 0.6, 0.36, 0.216];
        let (phi, var) = levinson_durbin(&acov, 3).unwrap();
        assert!((phi[0] - 0.6).abs() < 1e-12);
        assert!(phi[1].abs() < 1e-12);
        assert!(phi[2].abs() < 1e-12);
        assert!((var - 0.64).abs() < 1e-12);
    }

    #[test]
    fn autocovariance_lags_beyond_length_are_zero() {
        let acov = autocovariance(&[1.0, 2.0], 4);
        assert_eq!(acov.len(), 5);
        assert!((acov[0] - 2.5).abs() < 1e-12);
        assert!((acov[1] - 1.0).abs() < 1e-12);
        assert_eq!(acov[3], 0.0);
    }
}
