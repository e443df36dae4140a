// Library root: the regression trainer boundary used by the forecasting
// pipeline, a weighted ridge implementation of it, and holdout metrics.

pub mod metrics;
pub mod ridge;

use ndarray::{Array1, ArrayView1, ArrayView2};
use thiserror::Error;

pub use metrics::{evaluate, EvaluationReport};
pub use ridge::{FittedRidge, RidgeTrainer};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("cannot fit a model on an empty training set")]
    EmptyTrainingSet,

    #[error("shape mismatch: {rows} feature rows, {labels} labels, {weights} weights")]
    ShapeMismatch {
        rows: usize,
        labels: usize,
        weights: usize,
    },

    #[error("feature width mismatch: model expects {expected} columns, got {found}")]
    WidthMismatch { expected: usize, found: usize },

    #[error("weight at row {row} must be finite and non-negative, got {value}")]
    InvalidWeight { row: usize, value: f64 },

    #[error("training weights sum to zero")]
    ZeroTotalWeight,

    #[error("ridge alpha must be finite and non-negative, got {0}")]
    InvalidAlpha(f64),

    #[error("least squares solver failed: {0}")]
    Solver(String),
}

// ---------------------------------------------------------------------------
// Trainer boundary
// ---------------------------------------------------------------------------

/// Fits a model from a feature matrix, labels and per-row importance weights.
pub trait RegressionTrainer {
    type Model: Predictor;

    fn fit(
        &self,
        features: ArrayView2<'_, f64>,
        labels: ArrayView1<'_, f64>,
        weights: ArrayView1<'_, f64>,
    ) -> Result<Self::Model, ModelError>;
}

/// A fitted model producing one prediction per feature row.
pub trait Predictor {
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError>;
}

/// Reject training inputs whose lengths disagree or whose weights cannot be
/// used. Shared by every trainer and by [`metrics::evaluate`].
pub(crate) fn check_weighted_rows(
    rows: usize,
    labels: ArrayView1<'_, f64>,
    weights: ArrayView1<'_, f64>,
) -> Result<f64, ModelError> {
    if rows != labels.len() || rows != weights.len() {
        return Err(ModelError::ShapeMismatch {
            rows,
            labels: labels.len(),
            weights: weights.len(),
        });
    }
    if rows == 0 {
        return Err(ModelError::EmptyTrainingSet);
    }
    if let Some((row, &value)) = weights
        .iter()
        .enumerate()
        .find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        return Err(ModelError::InvalidWeight { row, value });
    }
    let total = weights.sum();
    if total <= 0.0 {
        return Err(ModelError::ZeroTotalWeight);
    }
    Ok(total)
}
