// Labelled example sets: the feature matrix handed to the regression
// trainer, with its player IDs, labels and per-example weights.
//
// Every transform returns a new set; nothing is mutated in place.

use ndarray::{concatenate, Array1, Array2, Axis};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Hash buckets used by [`LabelledExamples::split`].
pub const SPLIT_BUCKETS: u64 = 1_000_000;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("shape mismatch: {player_ids} player IDs, {rows} feature rows, {labels} labels, {weights} weights")]
    ShapeMismatch {
        player_ids: usize,
        rows: usize,
        labels: usize,
        weights: usize,
    },

    #[error("feature width mismatch: expected {expected} columns, found {found}")]
    WidthMismatch { expected: usize, found: usize },

    #[error("seasons were built under different stat catalogs ({first} vs {second} season columns)")]
    LayoutMismatch { first: usize, second: usize },

    #[error("weight scale must be finite and non-negative, got {0}")]
    InvalidWeightScale(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelledExamples {
    player_ids: Vec<String>,
    features: Array2<f64>,
    labels: Array1<f64>,
    weights: Array1<f64>,
}

impl LabelledExamples {
    /// Build a set, checking that every collection has one entry per row.
    pub fn new(
        player_ids: Vec<String>,
        features: Array2<f64>,
        labels: Array1<f64>,
        weights: Array1<f64>,
    ) -> Result<Self, DatasetError> {
        let n = player_ids.len();
        if features.nrows() != n || labels.len() != n || weights.len() != n {
            return Err(DatasetError::ShapeMismatch {
                player_ids: n,
                rows: features.nrows(),
                labels: labels.len(),
                weights: weights.len(),
            });
        }
        Ok(LabelledExamples {
            player_ids,
            features,
            labels,
            weights,
        })
    }

    pub fn player_ids(&self) -> &[String] {
        &self.player_ids
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn labels(&self) -> &Array1<f64> {
        &self.labels
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.player_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.player_ids.is_empty()
    }

    /// Number of feature columns.
    pub fn width(&self) -> usize {
        self.features.ncols()
    }

    /// Partition rows by a salted hash of the player ID. A row goes left when
    /// its bucket is at most `fraction * 1_000_000`, right otherwise, so a
    /// player lands on the same side for a given salt no matter what else is
    /// in the set.
    pub fn split(&self, salt: &str, fraction: f64) -> (Self, Self) {
        let threshold = fraction * SPLIT_BUCKETS as f64;
        let (left, right): (Vec<usize>, Vec<usize>) = (0..self.len())
            .partition(|&i| split_bucket(salt, &self.player_ids[i]) as f64 <= threshold);
        debug!(
            "split {} rows with salt {salt:?} at {fraction}: {} left, {} right",
            self.len(),
            left.len(),
            right.len()
        );
        (self.select(&left), self.select(&right))
    }

    /// Concatenate two sets, scaling every weight of `second` by
    /// `second_weight_scale`.
    pub fn merge(
        first: &Self,
        second: &Self,
        second_weight_scale: f64,
    ) -> Result<Self, DatasetError> {
        if !second_weight_scale.is_finite() || second_weight_scale < 0.0 {
            return Err(DatasetError::InvalidWeightScale(second_weight_scale));
        }
        if first.width() != second.width() {
            return Err(DatasetError::WidthMismatch {
                expected: first.width(),
                found: second.width(),
            });
        }
        let player_ids = first
            .player_ids
            .iter()
            .chain(second.player_ids.iter())
            .cloned()
            .collect();
        let features = concatenate(Axis(0), &[first.features.view(), second.features.view()])
            .map_err(|_| DatasetError::WidthMismatch {
                expected: first.width(),
                found: second.width(),
            })?;
        let labels = concatenate(Axis(0), &[first.labels.view(), second.labels.view()]).map_err(
            |_| DatasetError::ShapeMismatch {
                player_ids: first.len() + second.len(),
                rows: first.features.nrows() + second.features.nrows(),
                labels: first.labels.len() + second.labels.len(),
                weights: first.weights.len() + second.weights.len(),
            },
        )?;
        let scaled = &second.weights * second_weight_scale;
        let weights = first
            .weights
            .iter()
            .chain(scaled.iter())
            .copied()
            .collect::<Array1<f64>>();
        Self::new(player_ids, features, labels, weights)
    }

    fn select(&self, rows: &[usize]) -> Self {
        LabelledExamples {
            player_ids: rows.iter().map(|&i| self.player_ids[i].clone()).collect(),
            features: self.features.select(Axis(0), rows),
            labels: self.labels.select(Axis(0), rows),
            weights: self.weights.select(Axis(0), rows),
        }
    }
}

/// SHA-256 of `salt + player_id`, read as a big-endian integer, modulo
/// [`SPLIT_BUCKETS`].
pub fn split_bucket(salt: &str, player_id: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(player_id.as_bytes());
    hasher
        .finalize()
        .iter()
        .fold(0u64, |acc, &b| (acc * 256 + u64::from(b)) % SPLIT_BUCKETS)
}
