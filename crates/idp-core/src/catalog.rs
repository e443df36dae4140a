// Statistic catalog: fantasy-point weights, predictor-only columns, and the
// fixed team/position enumerations that define the feature-vector layout.
//
// The catalog is an immutable value shared (via `Arc`) by every loader and
// player aggregate built from it. Changing it changes the feature layout, so
// feature matrices built under different catalogs must never be mixed.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use thiserror::Error;

// ---------------------------------------------------------------------------
// Standard league scoring
// ---------------------------------------------------------------------------

/// CSV column name -> IDP points per unit of the stat.
const STANDARD_FANTASY_POINTS: &[(&str, f64)] = &[
    // Passing
    ("passing_yards", 0.04),
    ("passing_tds", 4.0),
    ("passing_2pt_conversions", 2.0),
    ("interceptions", -2.0),
    // Rushing
    ("rushing_yards", 0.1),
    ("rushing_tds", 6.0),
    ("rushing_2pt_conversions", 2.0),
    // Receiving
    ("receptions", 1.0),
    ("receiving_yards", 0.1),
    ("receiving_tds", 6.0),
    ("receiving_2pt_conversions", 2.0),
    // Kicking
    ("fg_made_distance", 0.1),
    ("pat_made", 1.0),
    ("fg_missed", -1.0),
    ("pat_missed", -1.0),
    // Special teams
    ("special_teams_tds", 6.0),
    // Ball security
    ("receiving_fumbles_lost", -2.0),
    ("sack_fumbles_lost", -2.0),
    // IDP
    ("def_tds", 6.0),
    ("def_sacks", 4.0),
    ("def_tackles_for_loss", 2.0),
    ("def_interceptions", 5.0),
    ("def_fumble_recovery_opp", 2.0),
    ("def_fumble_recovery_own", 2.0),
    ("def_fumbles_forced", 2.0),
    ("def_safety", 2.0),
    ("def_tackles_with_assist", 0.75),
    ("def_tackles_solo", 1.5),
    ("def_pass_defended", 1.5),
];

/// Stats worth zero points that are still kept as model inputs.
const STANDARD_PREDICTORS: &[&str] = &[
    "air_yards_share",
    "attempts",
    "carries",
    "completions",
    "dakota",
    "fantasy_points",
    "fantasy_points_ppr",
    "games",
    "pacr",
    "passing_air_yards",
    "passing_epa",
    "passing_first_downs",
    "passing_yards_after_catch",
    "racr",
    "receiving_air_yards",
    "receiving_epa",
    "receiving_first_downs",
    "receiving_fumbles",
    "receiving_yards_after_catch",
    "rushing_epa",
    "rushing_first_downs",
    "rushing_fumbles",
    "rushing_fumbles_lost",
    "sack_fumbles",
    "sack_yards",
    "sacks",
    "target_share",
    "targets",
    "wopr",
    "def_fumble_recovery_yards_opp",
    "def_fumble_recovery_yards_own",
    "def_fumbles",
    "def_interception_yards",
    "def_penalty",
    "def_penalty_yards",
    "def_qb_hits",
    "def_sack_yards",
    "def_tackle_assists",
    "def_tackles",
    "def_tackles_for_loss_yards",
    "def_games",
    "fg_att",
    "fg_blocked",
    "fg_blocked_distance",
    "fg_long",
    "fg_made",
    "fg_made_0_19",
    "fg_made_20_29",
    "fg_made_30_39",
    "fg_made_40_49",
    "fg_made_50_59",
    "fg_made_60_",
    "fg_missed_0_19",
    "fg_missed_20_29",
    "fg_missed_30_39",
    "fg_missed_40_49",
    "fg_missed_50_59",
    "fg_missed_60_",
    "fg_missed_distance",
    "fg_pct",
    "kck_games",
    "gwfg_att",
    "gwfg_blocked",
    "gwfg_made",
    "gwfg_missed",
    "pat_att",
    "pat_blocked",
    "pat_pct",
];

/// The thirty-two team codes, in feature-slot order.
pub const STANDARD_TEAMS: [&str; 32] = [
    "ARI", "ATL", "BAL", "BUF", "CAR", "CHI", "CIN", "CLE", "DAL", "DEN", "DET", "GB", "HOU",
    "IND", "JAX", "KC", "LA", "LAC", "LV", "MIA", "MIN", "NE", "NO", "NYG", "NYJ", "PHI", "PIT",
    "SEA", "SF", "TB", "TEN", "WAS",
];

/// The twenty-six roster position codes, in feature-slot order.
pub const STANDARD_POSITIONS: [&str; 26] = [
    "C", "CB", "DB", "DE", "DL", "DT", "FB", "FS", "G", "ILB", "K", "LB", "LS", "MLB", "NT", "OG",
    "OL", "OLB", "OT", "P", "QB", "RB", "SS", "T", "TE", "WR",
];

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("fantasy point value for `{stat}` must be finite, got {value}")]
    NonFinitePoints { stat: String, value: f64 },

    #[error("catalog has no {0}")]
    Empty(&'static str),

    #[error("duplicate {kind} code `{code}`")]
    DuplicateCode { kind: &'static str, code: String },
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct StatCatalog {
    fantasy_points: BTreeMap<String, f64>,
    predictors: BTreeSet<String>,
    /// Sorted union of scored and predictor stats.
    features: Vec<String>,
    feature_index: HashMap<String, usize>,
    /// (feature index, points) for every scored stat.
    scoring: Vec<(usize, f64)>,
    teams: Vec<String>,
    positions: Vec<String>,
}

impl StatCatalog {
    /// The league's standard IDP scoring rule.
    pub fn standard() -> Self {
        let points = STANDARD_FANTASY_POINTS
            .iter()
            .map(|(stat, pts)| (stat.to_string(), *pts))
            .collect();
        let predictors = STANDARD_PREDICTORS.iter().map(|s| s.to_string()).collect();
        Self::assemble(
            points,
            predictors,
            STANDARD_TEAMS.iter().map(|s| s.to_string()).collect(),
            STANDARD_POSITIONS.iter().map(|s| s.to_string()).collect(),
        )
    }

    /// Build an alternate catalog. Team and position order is preserved and
    /// defines the per-team and per-position feature slots.
    pub fn new(
        fantasy_points: BTreeMap<String, f64>,
        predictors: BTreeSet<String>,
        teams: Vec<String>,
        positions: Vec<String>,
    ) -> Result<Self, CatalogError> {
        if let Some((stat, value)) = fantasy_points.iter().find(|(_, v)| !v.is_finite()) {
            return Err(CatalogError::NonFinitePoints {
                stat: stat.clone(),
                value: *value,
            });
        }
        if fantasy_points.is_empty() && predictors.is_empty() {
            return Err(CatalogError::Empty("statistics"));
        }
        check_codes("team", &teams)?;
        check_codes("position", &positions)?;
        Ok(Self::assemble(fantasy_points, predictors, teams, positions))
    }

    fn assemble(
        fantasy_points: BTreeMap<String, f64>,
        predictors: BTreeSet<String>,
        teams: Vec<String>,
        positions: Vec<String>,
    ) -> Self {
        let features: Vec<String> = fantasy_points
            .keys()
            .chain(predictors.iter())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let feature_index: HashMap<String, usize> = features
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        let scoring = fantasy_points
            .iter()
            .map(|(stat, pts)| (feature_index[stat], *pts))
            .collect();
        StatCatalog {
            fantasy_points,
            predictors,
            features,
            feature_index,
            scoring,
            teams,
            positions,
        }
    }

    pub fn fantasy_points(&self) -> &BTreeMap<String, f64> {
        &self.fantasy_points
    }

    pub fn predictors(&self) -> &BTreeSet<String> {
        &self.predictors
    }

    /// Canonical, sorted feature names. Position in this slice is the
    /// feature's dense index.
    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn feature_index(&self, stat: &str) -> Option<usize> {
        self.feature_index.get(stat).copied()
    }

    pub(crate) fn scoring(&self) -> &[(usize, f64)] {
        &self.scoring
    }

    pub fn teams(&self) -> &[String] {
        &self.teams
    }

    pub fn positions(&self) -> &[String] {
        &self.positions
    }

    /// Width of one player's season block: stat totals, per-unit per-team
    /// game counts, per-position weights.
    pub fn season_width(&self) -> usize {
        self.features.len() + 3 * self.teams.len() + self.positions.len()
    }
}

fn check_codes(kind: &'static str, codes: &[String]) -> Result<(), CatalogError> {
    if codes.is_empty() {
        return Err(CatalogError::Empty(kind));
    }
    let mut seen = HashSet::new();
    for code in codes {
        if !seen.insert(code.as_str()) {
            return Err(CatalogError::DuplicateCode {
                kind,
                code: code.clone(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_sizes() {
        let catalog = StatCatalog::standard();
        assert_eq!(catalog.fantasy_points().len(), 29);
        assert_eq!(catalog.predictors().len(), 68);
        assert_eq!(catalog.features().len(), 97);
        assert_eq!(catalog.teams().len(), 32);
        assert_eq!(catalog.positions().len(), 26);
        assert_eq!(catalog.season_width(), 97 + 96 + 26);
    }

    #[test]
    fn features_are_sorted_and_indexed() {
        let catalog = StatCatalog::standard();
        let features = catalog.features();
        assert!(features.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(catalog.feature_index("air_yards_share"), Some(0));
        let idx = catalog.feature_index("receptions").unwrap();
        assert_eq!(features[idx], "receptions");
        assert_eq!(catalog.feature_index("not_a_stat"), None);
    }

    #[test]
    fn scoring_points_to_weighted_stats() {
        let catalog = StatCatalog::standard();
        let sacks = catalog.feature_index("def_sacks").unwrap();
        assert!(catalog
            .scoring()
            .iter()
            .any(|&(i, pts)| i == sacks && (pts - 4.0).abs() < f64::EPSILON));
        assert_eq!(catalog.scoring().len(), 29);
    }

    #[test]
    fn alternate_catalog_keeps_team_order() {
        let points = BTreeMap::from([("receptions".to_string(), 0.5)]);
        let predictors = BTreeSet::from(["targets".to_string()]);
        let catalog = StatCatalog::new(
            points,
            predictors,
            vec!["NYJ".into(), "BUF".into()],
            vec!["WR".into()],
        )
        .unwrap();
        assert_eq!(catalog.features(), ["receptions", "targets"]);
        assert_eq!(catalog.teams(), ["NYJ", "BUF"]);
        assert_eq!(catalog.season_width(), 2 + 6 + 1);
    }

    #[test]
    fn rejects_duplicate_team() {
        let err = StatCatalog::new(
            BTreeMap::from([("receptions".to_string(), 1.0)]),
            BTreeSet::new(),
            vec!["BUF".into(), "BUF".into()],
            vec!["WR".into()],
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateCode { kind: "team", .. }));
    }

    #[test]
    fn rejects_non_finite_points() {
        let err = StatCatalog::new(
            BTreeMap::from([("receptions".to_string(), f64::NAN)]),
            BTreeSet::new(),
            vec!["BUF".into()],
            vec!["WR".into()],
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::NonFinitePoints { .. }));
    }
}
