// Feature assembly: joins roster snapshots and season aggregates into the
// fixed-width rows of a labelled example set.
//
// Row layout:
//   [next roster (8)] [prev roster (8), zeros if absent]
//   [prev season: stats, games per unit per team, position weights; zeros if absent]

use std::ops::Range;
use std::sync::Arc;

use ndarray::{Array1, Array2};
use tracing::info;

use crate::catalog::StatCatalog;
use crate::dataset::{DatasetError, LabelledExamples};
use crate::roster::{WeekOneRoster, ROSTER_FEATURES, ROSTER_FEATURE_COUNT};
use crate::season::{SeasonStats, Unit};

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureLayout {
    season_width: usize,
}

impl FeatureLayout {
    pub fn new(catalog: &StatCatalog) -> Self {
        FeatureLayout {
            season_width: catalog.season_width(),
        }
    }

    pub fn next_roster(&self) -> Range<usize> {
        0..ROSTER_FEATURE_COUNT
    }

    pub fn prev_roster(&self) -> Range<usize> {
        ROSTER_FEATURE_COUNT..2 * ROSTER_FEATURE_COUNT
    }

    pub fn prev_season(&self) -> Range<usize> {
        2 * ROSTER_FEATURE_COUNT..self.width()
    }

    /// Total feature count.
    pub fn width(&self) -> usize {
        2 * ROSTER_FEATURE_COUNT + self.season_width
    }
}

/// Human-readable name of every column, in layout order.
pub fn column_names(catalog: &StatCatalog) -> Vec<String> {
    let mut names = Vec::with_capacity(FeatureLayout::new(catalog).width());
    for block in ["next_roster", "prev_roster"] {
        names.extend(ROSTER_FEATURES.iter().map(|f| format!("{block}.{f}")));
    }
    names.extend(catalog.features().iter().map(|s| format!("prev_season.{s}")));
    for unit in Unit::ALL {
        names.extend(
            catalog
                .teams()
                .iter()
                .map(|t| format!("prev_season.{}.{t}", unit.game_column())),
        );
    }
    names.extend(
        catalog
            .positions()
            .iter()
            .map(|p| format!("prev_season.position.{p}")),
    );
    names
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Training examples for predicting `next_season` from the season before.
///
/// Only players with a `next_season` stat line who are also on the
/// `next_roster` week-1 roster become examples. Label is the next-season IDP
/// score, weight its importance weight.
pub fn build_labelled(
    prev_roster: &WeekOneRoster,
    prev_season: &SeasonStats,
    next_roster: &WeekOneRoster,
    next_season: &SeasonStats,
) -> Result<LabelledExamples, DatasetError> {
    let layout = shared_layout(prev_season, next_season)?;
    let mut rows = RowBuilder::new(layout);
    for player in next_season.players() {
        let pid = player.player_id();
        if !next_roster.contains(pid) {
            continue;
        }
        rows.push(pid, prev_roster, prev_season, next_roster);
        rows.labels.push(player.idp_score());
        rows.weights.push(player.importance_weight());
    }
    let examples = rows.finish()?;
    info!(
        "Built {} labelled examples ({} players in next season)",
        examples.len(),
        next_season.len()
    );
    Ok(examples)
}

/// Feature rows for every player on `next_roster`, for a season whose
/// results are unknown. Labels and weights are 0 placeholders.
pub fn build_unlabelled(
    prev_roster: &WeekOneRoster,
    prev_season: &SeasonStats,
    next_roster: &WeekOneRoster,
) -> Result<LabelledExamples, DatasetError> {
    let layout = FeatureLayout::new(prev_season.catalog());
    let mut rows = RowBuilder::new(layout);
    for pid in next_roster.player_ids() {
        rows.push(pid, prev_roster, prev_season, next_roster);
        rows.labels.push(0.0);
        rows.weights.push(0.0);
    }
    let examples = rows.finish()?;
    info!("Built {} unlabelled examples", examples.len());
    Ok(examples)
}

fn shared_layout(
    prev_season: &SeasonStats,
    next_season: &SeasonStats,
) -> Result<FeatureLayout, DatasetError> {
    let (a, b) = (prev_season.catalog(), next_season.catalog());
    let prev = FeatureLayout::new(a);
    let next = FeatureLayout::new(b);
    // Equal widths can still name different columns.
    if !Arc::ptr_eq(a, b) && **a != **b {
        return Err(DatasetError::LayoutMismatch {
            first: prev.season_width,
            second: next.season_width,
        });
    }
    Ok(next)
}

struct RowBuilder {
    layout: FeatureLayout,
    player_ids: Vec<String>,
    data: Vec<f64>,
    labels: Vec<f64>,
    weights: Vec<f64>,
}

impl RowBuilder {
    fn new(layout: FeatureLayout) -> Self {
        RowBuilder {
            layout,
            player_ids: Vec::new(),
            data: Vec::new(),
            labels: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// Append the feature row for `pid`, which must be on `next_roster`.
    fn push(
        &mut self,
        pid: &str,
        prev_roster: &WeekOneRoster,
        prev_season: &SeasonStats,
        next_roster: &WeekOneRoster,
    ) {
        let start = self.data.len();
        self.data.resize(start + self.layout.width(), 0.0);
        let row = &mut self.data[start..];

        if let Some(entry) = next_roster.get(pid) {
            row[self.layout.next_roster()].copy_from_slice(&entry.features());
        }
        if let Some(entry) = prev_roster.get(pid) {
            row[self.layout.prev_roster()].copy_from_slice(&entry.features());
        }
        if let Ok(season) = prev_season.get(pid) {
            row[self.layout.prev_season()].copy_from_slice(&season.features());
        }
        self.player_ids.push(pid.to_string());
    }

    fn finish(self) -> Result<LabelledExamples, DatasetError> {
        let n = self.player_ids.len();
        let width = self.layout.width();
        let rows = self.data.len() / width.max(1);
        let features = Array2::from_shape_vec((n, width), self.data).map_err(|_| {
            DatasetError::ShapeMismatch {
                player_ids: n,
                rows,
                labels: self.labels.len(),
                weights: self.weights.len(),
            }
        })?;
        LabelledExamples::new(
            self.player_ids,
            features,
            Array1::from(self.labels),
            Array1::from(self.weights),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
