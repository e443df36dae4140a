// Weighted error metrics for holdout evaluation.

use ndarray::ArrayView1;
use serde::Serialize;

use crate::{check_weighted_rows, ModelError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub rows: usize,
    pub total_weight: f64,
    pub rmse: f64,
    pub mae: f64,
    /// `None` when the labels have no weighted variance.
    pub r_squared: Option<f64>,
}

/// Compare predictions against labels, weighting every row's error.
pub fn evaluate(
    predictions: ArrayView1<'_, f64>,
    labels: ArrayView1<'_, f64>,
    weights: ArrayView1<'_, f64>,
) -> Result<EvaluationReport, ModelError> {
    let total_weight = check_weighted_rows(predictions.len(), labels, weights)?;

    let mean = labels
        .iter()
        .zip(weights.iter())
        .map(|(y, w)| y * w)
        .sum::<f64>()
        / total_weight;

    let mut squared = 0.0;
    let mut absolute = 0.0;
    let mut variance = 0.0;
    for ((p, y), w) in predictions.iter().zip(labels.iter()).zip(weights.iter()) {
        let err = y - p;
        squared += w * err * err;
        absolute += w * err.abs();
        variance += w * (y - mean) * (y - mean);
    }

    Ok(EvaluationReport {
        rows: predictions.len(),
        total_weight,
        rmse: (squared / total_weight).sqrt(),
        mae: absolute / total_weight,
        r_squared: (variance > 0.0).then(|| 1.0 - squared / variance),
    })
}
