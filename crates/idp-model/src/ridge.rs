// Weighted ridge regression with an unpenalized intercept.
//
// The weighted, penalized problem
//   min  sum_i w_i (y_i - x_i.b - c)^2 + alpha * |b|^2
// is rewritten as ordinary least squares on an augmented design: every
// example row and its label are scaled by sqrt(w_i), the intercept becomes
// an explicit column holding sqrt(w_i), and one extra row per feature holds
// sqrt(alpha) on that feature's diagonal with a zero target. The intercept
// column never receives a penalty row.

use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};
use tracing::debug;

use crate::{check_weighted_rows, ModelError, Predictor, RegressionTrainer};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RidgeTrainer {
    pub alpha: f64,
}

impl RidgeTrainer {
    pub fn new(alpha: f64) -> Self {
        RidgeTrainer { alpha }
    }
}

impl Default for RidgeTrainer {
    fn default() -> Self {
        RidgeTrainer { alpha: 1.0 }
    }
}

impl RegressionTrainer for RidgeTrainer {
    type Model = FittedRidge;

    fn fit(
        &self,
        features: ArrayView2<'_, f64>,
        labels: ArrayView1<'_, f64>,
        weights: ArrayView1<'_, f64>,
    ) -> Result<FittedRidge, ModelError> {
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(ModelError::InvalidAlpha(self.alpha));
        }
        let total_weight = check_weighted_rows(features.nrows(), labels, weights)?;

        let (rows, width) = features.dim();
        let penalty_rows = if self.alpha > 0.0 { width } else { 0 };
        let mut design = Array2::<f64>::zeros((rows + penalty_rows, width + 1));
        let mut target = Array1::<f64>::zeros(rows + penalty_rows);

        for (i, row) in features.outer_iter().enumerate() {
            let scale = weights[i].sqrt();
            design
                .slice_mut(s![i, ..width])
                .assign(&row.mapv(|x| x * scale));
            design[[i, width]] = scale;
            target[i] = labels[i] * scale;
        }
        let ridge = self.alpha.sqrt();
        for j in 0..penalty_rows {
            design[[rows + j, j]] = ridge;
        }

        let dataset = Dataset::new(design, target);
        let fitted = LinearRegression::new()
            .with_intercept(false)
            .fit(&dataset)
            .map_err(|e| ModelError::Solver(e.to_string()))?;

        let params = fitted.params();
        let coefficients = params.slice(s![..width]).to_owned();
        let intercept = params[width];
        debug!(
            "fitted ridge: {rows} rows x {width} columns, alpha {}, total weight {total_weight:.3}, intercept {intercept:.4}",
            self.alpha
        );

        Ok(FittedRidge {
            coefficients,
            intercept,
        })
    }
}

// ---------------------------------------------------------------------------
// Fitted model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct FittedRidge {
    coefficients: Array1<f64>,
    intercept: f64,
}

impl FittedRidge {
    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Pair each coefficient with its column name, largest magnitude first.
    /// Names beyond the coefficient count are ignored.
    pub fn ranked_coefficients(&self, names: &[String]) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = names
            .iter()
            .zip(self.coefficients.iter())
            .map(|(name, &c)| (name.clone(), c))
            .collect();
        ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        ranked
    }
}

impl Predictor for FittedRidge {
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        if features.ncols() != self.coefficients.len() {
            return Err(ModelError::WidthMismatch {
                expected: self.coefficients.len(),
                found: features.ncols(),
            });
        }
        Ok(features.dot(&self.coefficients) + self.intercept)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
