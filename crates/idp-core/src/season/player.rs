// One player's aggregated statistics for one season.

use std::collections::BTreeMap;
use std::sync::Arc;

use csv::StringRecord;

use super::schema::UnitSchema;
use super::{SeasonError, Unit};
use crate::catalog::StatCatalog;
use crate::parse::empty_float;

/// IDP points at which a player starts carrying more than unit weight in
/// training. Roughly the score of the last drafted player in a 12-team,
/// 19-slot league.
pub const IMPORTANCE_POINTS: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct PlayerSeason {
    catalog: Arc<StatCatalog>,
    player_id: String,
    display_name: String,
    /// Per unit: position code -> games played at that position.
    unit_positions: [BTreeMap<String, f64>; 3],
    /// Position weights combined across units in `Unit::ALL` order.
    position_weight: BTreeMap<String, f64>,
    /// Per unit (indexed by `Unit::index`): team code -> games.
    games_by_team: [BTreeMap<String, f64>; 3],
    /// Per unit partial totals, indexed by catalog feature index.
    unit_totals: [Vec<f64>; 3],
    /// Partials combined in `Unit::ALL` order, so the result is bit-identical
    /// whatever order the unit files arrive in.
    stat_totals: Vec<f64>,
}

impl PlayerSeason {
    pub fn new(catalog: Arc<StatCatalog>, player_id: &str, display_name: &str) -> Self {
        let width = catalog.features().len();
        PlayerSeason {
            catalog,
            player_id: player_id.to_string(),
            display_name: display_name.to_string(),
            unit_positions: Default::default(),
            position_weight: BTreeMap::new(),
            games_by_team: Default::default(),
            unit_totals: std::array::from_fn(|_| vec![0.0; width]),
            stat_totals: vec![0.0; width],
        }
    }

    /// Ingest one row of a unit stat file for this player.
    ///
    /// Fails if this player already has a row for the same unit and team,
    /// or if any stat field is a non-empty non-number. On error the
    /// aggregate is left unchanged.
    pub fn add_row(&mut self, schema: &UnitSchema, row: &StringRecord) -> Result<(), SeasonError> {
        let unit = schema.unit;
        let team = row.get(schema.team).unwrap_or("").trim();
        if self.games_by_team[unit.index()].contains_key(team) {
            return Err(SeasonError::DuplicateInsertion {
                player_id: self.player_id.clone(),
                unit,
                team: team.to_string(),
            });
        }

        let games = self.parse_field(schema, row, schema.games)?;
        let mut parsed = Vec::with_capacity(schema.stats.len());
        for &(col, feature) in &schema.stats {
            parsed.push((feature, self.parse_field(schema, row, col)?));
        }

        let u = unit.index();
        let position = row.get(schema.position).unwrap_or("").trim();
        *self.unit_positions[u]
            .entry(position.to_string())
            .or_insert(0.0) += games;
        self.games_by_team[u].insert(team.to_string(), games);
        for &(feature, value) in &parsed {
            self.unit_totals[u][feature] += value;
        }

        let combined = Unit::ALL
            .iter()
            .map(|other| {
                self.unit_positions[other.index()]
                    .get(position)
                    .copied()
                    .unwrap_or(0.0)
            })
            .fold(0.0, |acc, g| acc + g);
        self.position_weight.insert(position.to_string(), combined);
        for (feature, _) in parsed {
            let total = self.combined_total(feature);
            self.stat_totals[feature] = total;
        }
        Ok(())
    }

    fn combined_total(&self, feature: usize) -> f64 {
        Unit::ALL
            .iter()
            .fold(0.0, |acc, unit| acc + self.unit_totals[unit.index()][feature])
    }

    fn parse_field(
        &self,
        schema: &UnitSchema,
        row: &StringRecord,
        col: usize,
    ) -> Result<f64, SeasonError> {
        empty_float(row.get(col).unwrap_or("")).map_err(|source| SeasonError::MalformedNumber {
            player_id: self.player_id.clone(),
            column: schema.column_name(col).to_string(),
            source,
        })
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn catalog(&self) -> &Arc<StatCatalog> {
        &self.catalog
    }

    /// Season total for a catalog stat. Stats outside the catalog are 0.
    pub fn stat(&self, name: &str) -> f64 {
        self.catalog
            .feature_index(name)
            .map_or(0.0, |i| self.stat_totals[i])
    }

    pub fn stat_totals(&self) -> &[f64] {
        &self.stat_totals
    }

    pub fn games(&self, unit: Unit, team: &str) -> Option<f64> {
        self.games_by_team[unit.index()].get(team).copied()
    }

    pub fn games_by_team(&self, unit: Unit) -> &BTreeMap<String, f64> {
        &self.games_by_team[unit.index()]
    }

    pub fn position_weight(&self, position: &str) -> f64 {
        self.position_weight.get(position).copied().unwrap_or(0.0)
    }

    /// Points earned over the season under the catalog's scoring rule.
    pub fn idp_score(&self) -> f64 {
        self.catalog
            .scoring()
            .iter()
            .map(|&(i, pts)| pts * self.stat_totals[i])
            .sum()
    }

    /// Positions played, most games first, joined with `/`.
    pub fn roles(&self) -> String {
        let mut roles: Vec<(&str, f64)> = self
            .position_weight
            .iter()
            .map(|(pos, w)| (pos.as_str(), *w))
            .collect();
        roles.sort_by(|a, b| b.1.total_cmp(&a.1));
        roles
            .into_iter()
            .map(|(pos, _)| pos)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Training weight for this player's label: score / 100, floored at 1.
    pub fn importance_weight(&self) -> f64 {
        (self.idp_score() / IMPORTANCE_POINTS).max(1.0)
    }

    /// Dense season block: stat totals in catalog order, then games per team
    /// for offense, defense and kicking in catalog team order, then position
    /// weights in catalog position order.
    pub fn features(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.catalog.season_width());
        out.extend_from_slice(&self.stat_totals);
        for unit in Unit::ALL {
            let games = &self.games_by_team[unit.index()];
            out.extend(
                self.catalog
                    .teams()
                    .iter()
                    .map(|team| games.get(team).copied().unwrap_or(0.0)),
            );
        }
        out.extend(
            self.catalog
                .positions()
                .iter()
                .map(|pos| self.position_weight(pos)),
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFENSE_HEADER: &str = "player_id,player_display_name,position,season_type,recent_team,games,receptions,receiving_yards,receiving_tds";
    const DEFENSE_HEADER: &str =
        "player_id,player_display_name,position,season_type,team,def_games,def_sacks,def_tackles_solo";

    fn record(line: &str) -> StringRecord {
        StringRecord::from(line.split(',').collect::<Vec<_>>())
    }

    fn schema(catalog: &StatCatalog, header: &str) -> UnitSchema {
        UnitSchema::from_headers(catalog, &record(header), "test.csv").unwrap()
    }

    fn player(catalog: &Arc<StatCatalog>) -> PlayerSeason {
        PlayerSeason::new(Arc::clone(catalog), "00-0001", "A.Receiver")
    }

    #[test]
    fn idp_score_for_receiver() {
        let catalog = Arc::new(StatCatalog::standard());
        let off = schema(&catalog, OFFENSE_HEADER);
        let mut p = player(&catalog);
        p.add_row(&off, &record("00-0001,A.Receiver,WR,REG,BUF,17,10,120,1"))
            .unwrap();
        assert!((p.stat("receptions") - 10.0).abs() < 1e-12);
        assert!((p.idp_score() - 28.0).abs() < 1e-9);
        assert!((p.importance_weight() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn importance_weight_scales_above_threshold() {
        let catalog = Arc::new(StatCatalog::standard());
        let off = schema(&catalog, OFFENSE_HEADER);
        let mut p = player(&catalog);
        // 100 + 1500 * 0.1 + 5 * 6 = 280 points
        p.add_row(&off, &record("00-0001,A.Receiver,WR,REG,BUF,17,100,1500,5"))
            .unwrap();
        assert!((p.idp_score() - 280.0).abs() < 1e-9);
        assert!((p.importance_weight() - 2.8).abs() < 1e-12);
    }

    #[test]
    fn empty_fields_count_as_zero() {
        let catalog = Arc::new(StatCatalog::standard());
        let off = schema(&catalog, OFFENSE_HEADER);
        let mut p = player(&catalog);
        p.add_row(&off, &record("00-0001,A.Receiver,WR,REG,BUF,,,,"))
            .unwrap();
        assert_eq!(p.idp_score(), 0.0);
        assert_eq!(p.games(Unit::Offense, "BUF"), Some(0.0));
    }

    #[test]
    fn duplicate_unit_and_team_is_rejected() {
        let catalog = Arc::new(StatCatalog::standard());
        let off = schema(&catalog, OFFENSE_HEADER);
        let mut p = player(&catalog);
        p.add_row(&off, &record("00-0001,A.Receiver,WR,REG,BUF,9,10,120,1"))
            .unwrap();
        let err = p
            .add_row(&off, &record("00-0001,A.Receiver,WR,REG,BUF,8,5,60,0"))
            .unwrap_err();
        assert!(matches!(
            err,
            SeasonError::DuplicateInsertion { unit: Unit::Offense, ref team, .. } if team == "BUF"
        ));
        // The rejected row left the totals untouched.
        assert!((p.stat("receptions") - 10.0).abs() < 1e-12);
    }

    #[test]
    fn same_unit_different_team_accumulates() {
        let catalog = Arc::new(StatCatalog::standard());
        let off = schema(&catalog, OFFENSE_HEADER);
        let mut p = player(&catalog);
        p.add_row(&off, &record("00-0001,A.Receiver,WR,REG,BUF,9,10,120,1"))
            .unwrap();
        p.add_row(&off, &record("00-0001,A.Receiver,WR,REG,MIA,8,5,60,0"))
            .unwrap();
        assert!((p.stat("receptions") - 15.0).abs() < 1e-12);
        assert_eq!(p.games(Unit::Offense, "MIA"), Some(8.0));
        assert!((p.position_weight("WR") - 17.0).abs() < 1e-12);
    }

    #[test]
    fn fractional_totals_ignore_unit_order() {
        let catalog = Arc::new(StatCatalog::standard());
        let off = schema(
            &catalog,
            "player_id,player_display_name,position,season_type,recent_team,games,fantasy_points",
        );
        let def = schema(
            &catalog,
            "player_id,player_display_name,position,season_type,team,def_games,fantasy_points",
        );
        let buf = record("00-0001,A.Receiver,WR,REG,BUF,0.1,0.1");
        let mia = record("00-0001,A.Receiver,WR,REG,MIA,0.1,0.1");
        let chi = record("00-0001,A.Receiver,WR,REG,CHI,0.4,0.4");

        let mut offense_first = player(&catalog);
        offense_first.add_row(&off, &buf).unwrap();
        offense_first.add_row(&off, &mia).unwrap();
        offense_first.add_row(&def, &chi).unwrap();

        let mut defense_first = player(&catalog);
        defense_first.add_row(&def, &chi).unwrap();
        defense_first.add_row(&off, &buf).unwrap();
        defense_first.add_row(&off, &mia).unwrap();

        let bits = |p: &PlayerSeason| {
            p.features()
                .iter()
                .map(|v| v.to_bits())
                .collect::<Vec<_>>()
        };
        assert_eq!(bits(&offense_first), bits(&defense_first));
        assert_eq!(
            offense_first.stat("fantasy_points").to_bits(),
            defense_first.stat("fantasy_points").to_bits()
        );
        assert!((offense_first.stat("fantasy_points") - 0.6).abs() < 1e-12);
        assert!((offense_first.position_weight("WR") - 0.6).abs() < 1e-12);
    }

    #[test]
    fn same_team_different_unit_is_allowed() {
        let catalog = Arc::new(StatCatalog::standard());
        let off = schema(&catalog, OFFENSE_HEADER);
        let def = schema(&catalog, DEFENSE_HEADER);
        let mut p = player(&catalog);
        p.add_row(&off, &record("00-0001,A.Receiver,WR,REG,BUF,17,10,120,1"))
            .unwrap();
        p.add_row(&def, &record("00-0001,A.Receiver,CB,REG,BUF,4,1,3"))
            .unwrap();
        assert_eq!(p.games(Unit::Defense, "BUF"), Some(4.0));
        assert_eq!(p.roles(), "WR/CB");
        // 28 + 1 * 4 + 3 * 1.5
        assert!((p.idp_score() - 36.5).abs() < 1e-9);
    }

    #[test]
    fn malformed_stat_names_player_and_column() {
        let catalog = Arc::new(StatCatalog::standard());
        let off = schema(&catalog, OFFENSE_HEADER);
        let mut p = player(&catalog);
        let err = p
            .add_row(&off, &record("00-0001,A.Receiver,WR,REG,BUF,17,ten,120,1"))
            .unwrap_err();
        match err {
            SeasonError::MalformedNumber {
                player_id, column, ..
            } => {
                assert_eq!(player_id, "00-0001");
                assert_eq!(column, "receptions");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(p.games_by_team(Unit::Offense).is_empty());
    }

    #[test]
    fn feature_block_layout() {
        let catalog = Arc::new(StatCatalog::standard());
        let def = schema(&catalog, DEFENSE_HEADER);
        let mut p = player(&catalog);
        p.add_row(&def, &record("00-0001,A.Backer,LB,REG,CHI,16,7,60"))
            .unwrap();
        let features = p.features();
        assert_eq!(features.len(), catalog.season_width());

        let stats = catalog.features().len();
        let teams = catalog.teams().len();
        let sacks = catalog.feature_index("def_sacks").unwrap();
        assert_eq!(features[sacks], 7.0);

        let chi = catalog.teams().iter().position(|t| t == "CHI").unwrap();
        assert_eq!(features[stats + chi], 0.0); // offense block
        assert_eq!(features[stats + teams + chi], 16.0); // defense block
        assert_eq!(features[stats + 2 * teams + chi], 0.0); // kicking block

        let lb = catalog.positions().iter().position(|p| p == "LB").unwrap();
        assert_eq!(features[stats + 3 * teams + lb], 16.0);
    }
}
