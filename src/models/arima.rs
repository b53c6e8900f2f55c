//! ARIMA(p, d, 0) fitting and point forecasts.
//!
//! The model is fit on the `d`-times differenced series `w` with no trend term:
//!
//! ```text
//! w_t = φ_1 w_{t-1} + … + φ_p w_{t-p} + ε_t
//! ```
//!
//! Forecasts of `w` are produced recursively and integrated back onto the last
//! observed levels. Moving-average terms are not supported.

use serde::Serialize;
use tracing::debug;

use crate::domain::{ArimaOrder, Estimation};
use crate::error::ForecastError;
use crate::math::{autocovariance, lagged_design, levinson_durbin, solve_least_squares};

/// Minimum number of observations required to fit a model.
pub const MIN_OBSERVATIONS: usize = 10;

/// Mean square below which the differenced series is treated as flat.
const FLAT_MEAN_SQUARE: f64 = 1e-18;

/// A fitted ARIMA model, ready to forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FittedArima {
    pub order: ArimaOrder,
    pub estimation: Estimation,
    /// AR coefficients `φ_1..φ_p` (most recent lag first).
    pub ar: Vec<f64>,
    /// Innovation variance estimate.
    pub sigma2: f64,
    /// Number of observations the model was fit on.
    pub n_obs: usize,
    /// Last `p` values of the differenced series.
    #[serde(skip)]
    recent_diffs: Vec<f64>,
    /// Last value of each differencing level `0..d` (level 0 is the price).
    #[serde(skip)]
    last_levels: Vec<f64>,
}

/// Fit an ARIMA model of the given order.
pub fn fit(series: &[f64], order: ArimaOrder) -> Result<FittedArima, ForecastError> {
    let ArimaOrder { p, d, q } = order;
    if q > 0 {
        return Err(ForecastError::UnsupportedOrder { p, d, q });
    }

    let required = MIN_OBSERVATIONS.max(p + d + 1);
    if series.len() < required {
        return Err(ForecastError::InsufficientData {
            required,
            actual: series.len(),
        });
    }
    if series.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::Fit("series contains non-finite values".to_string()));
    }

    let mut last_levels = Vec::with_capacity(d);
    let mut diffs = series.to_vec();
    for _ in 0..d {
        if let Some(&last) = diffs.last() {
            last_levels.push(last);
        }
        diffs = difference(&diffs);
    }

    let (estimation, ar, sigma2) = estimate_ar(&diffs, p)?;
    if ar.iter().any(|c| !c.is_finite()) || !sigma2.is_finite() {
        return Err(ForecastError::Fit("estimated coefficients are not finite".to_string()));
    }

    debug!(
        order = %order.display_name(),
        method = estimation.display_name(),
        ?ar,
        sigma = sigma2.sqrt(),
        n_obs = series.len(),
        "fitted model"
    );

    let recent_diffs = diffs[diffs.len().saturating_sub(p)..].to_vec();
    Ok(FittedArima {
        order,
        estimation,
        ar,
        sigma2,
        n_obs: series.len(),
        recent_diffs,
        last_levels,
    })
}

impl FittedArima {
    /// Point forecast for the next `steps` periods, on the price scale.
    pub fn forecast(&self, steps: usize) -> Result<Vec<f64>, ForecastError> {
        let p = self.ar.len();
        let mut history = self.recent_diffs.clone();
        let mut levels = self.last_levels.clone();
        let mut out = Vec::with_capacity(steps);

        for step in 1..=steps {
            let n = history.len();
            let next_diff: f64 = (0..p.min(n)).map(|i| self.ar[i] * history[n - 1 - i]).sum();
            history.push(next_diff);

            // Integrate from the highest differencing level down to prices.
            let mut value = next_diff;
            for level in levels.iter_mut().rev() {
                value += *level;
                *level = value;
            }

            if !value.is_finite() {
                return Err(ForecastError::NonFinite { step });
            }
            out.push(value);
        }

        Ok(out)
    }

    /// Residual standard deviation of the differenced series.
    pub fn sigma(&self) -> f64 {
        self.sigma2.sqrt()
    }
}

fn difference(series: &[f64]) -> Vec<f64> {
    series.windows(2).map(|w| w[1] - w[0]).collect()
}

fn estimate_ar(diffs: &[f64], p: usize) -> Result<(Estimation, Vec<f64>, f64), ForecastError> {
    let n = diffs.len();
    let acov = autocovariance(diffs, p);
    if p == 0 {
        return Ok((Estimation::ConditionalLeastSquares, Vec::new(), acov[0]));
    }
    if acov[0] < FLAT_MEAN_SQUARE {
        // Prices never move: nothing to regress on.
        return Ok((Estimation::ConditionalLeastSquares, vec![0.0; p], 0.0));
    }

    let rows = n.saturating_sub(p);
    if rows > p {
        let (x, y) = lagged_design(diffs, p)
            .ok_or_else(|| ForecastError::Fit("series too short for lagged regression".to_string()))?;
        let beta = solve_least_squares(&x, &y)
            .ok_or_else(|| ForecastError::Fit("least squares did not converge".to_string()))?;
        let resid = &y - &x * &beta;
        let sigma2 = resid.norm_squared() / rows as f64;
        return Ok((Estimation::ConditionalLeastSquares, beta.iter().copied().collect(), sigma2));
    }

    let (phi, sigma2) = levinson_durbin(&acov, p)
        .ok_or_else(|| ForecastError::Fit("Yule-Walker recursion degenerated".to_string()))?;
    Ok((Estimation::YuleWalker, phi, sigma2))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER: ArimaOrder = ArimaOrder::DASHBOARD;

    fn wavy(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 1800.0 + 2.0 * i as f64 + 15.0 * (i as f64 * 0.7).sin())
            .collect()
    }

    #[test]
    fn rejects_short_series() {
        let err = fit(&wavy(9), ORDER).unwrap_err();
        assert_eq!(err, ForecastError::InsufficientData { required: 10, actual: 9 });
    }

    #[test]
    fn rejects_moving_average_terms() {
        let err = fit(&wavy(30), ArimaOrder { p: 1, d: 1, q: 1 }).unwrap_err();
        assert!(matches!(err, ForecastError::UnsupportedOrder { q: 1, .. }));
    }

    #[test]
    fn rejects_non_finite_values() {
        let mut series = wavy(20);
        series[4] = f64::NAN;
        assert!(matches!(fit(&series, ORDER), Err(ForecastError::Fit(_))));
    }

    #[test]
    fn minimum_length_series_uses_yule_walker() {
        let model = fit(&wavy(10), ORDER).unwrap();
        assert_eq!(model.estimation, Estimation::YuleWalker);
        assert_eq!(model.ar.len(), 5);

        let fc = model.forecast(7).unwrap();
        assert_eq!(fc.len(), 7);
        assert!(fc.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn longer_series_uses_least_squares() {
        let model = fit(&wavy(60), ORDER).unwrap();
        assert_eq!(model.estimation, Estimation::ConditionalLeastSquares);
        assert_eq!(model.n_obs, 60);
        assert!(model.sigma().is_finite());
    }

    #[test]
    fn linear_trend_is_extrapolated() {
        // Constant first differences: the forecast keeps climbing by the same step.
        let series: Vec<f64> = (0..20).map(|i| 100.0 + 0.5 * i as f64).collect();
        let fc = fit(&series, ORDER).unwrap().forecast(3).unwrap();
        assert!((fc[0] - 110.0).abs() < 1e-9, "got {fc:?}");
        assert!((fc[2] - 111.0).abs() < 1e-9, "got {fc:?}");
    }

    #[test]
    fn flat_series_forecasts_flat() {
        let fc = fit(&[42.0; 12], ORDER).unwrap().forecast(4).unwrap();
        assert!(fc.iter().all(|v| (v - 42.0).abs() < 1e-12));
    }

    #[test]
    fn recovers_ar1_on_differences() {
        // Differences follow w_t = 0.5 w_{t-1} + e_t with LCG noise in [-0.5, 0.5).
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut noise = move || {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5
        };
        let mut w = vec![1.0];
        for i in 1..500 {
            w.push(0.5 * w[i - 1] + noise());
        }
        let mut series = vec![500.0];
        for dw in &w {
            series.push(series.last().unwrap() + dw);
        }

        let model = fit(&series, ArimaOrder { p: 1, d: 1, q: 0 }).unwrap();
        assert!((model.ar[0] - 0.5).abs() < 0.15, "phi = {}", model.ar[0]);
    }
}
