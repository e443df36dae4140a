// Per-file column resolution for season stat CSVs.
//
// Every stat file is homogeneous: one unit, one team column. The header row
// is resolved once into a `UnitSchema` so rows never re-sniff which columns
// they carry.

use csv::StringRecord;

use super::{SeasonError, Unit};
use crate::catalog::StatCatalog;

pub const PID_COLUMN: &str = "player_id";
pub const NAME_COLUMN: &str = "player_display_name";
pub const POSITION_COLUMN: &str = "position";
pub const SEASON_TYPE_COLUMN: &str = "season_type";

/// Team columns in order of preference.
const TEAM_COLUMNS: [&str; 2] = ["recent_team", "team"];

#[derive(Debug, Clone)]
pub struct UnitSchema {
    pub(crate) unit: Unit,
    pub(crate) player_id: usize,
    pub(crate) name: usize,
    pub(crate) position: usize,
    pub(crate) season_type: usize,
    pub(crate) team: usize,
    pub(crate) games: usize,
    /// (CSV column index, catalog feature index) for every catalog stat
    /// present in the header.
    pub(crate) stats: Vec<(usize, usize)>,
    pub(crate) headers: StringRecord,
}

impl UnitSchema {
    /// Resolve a header row. `source_name` (usually the file path) is only
    /// used to make errors locatable.
    pub fn from_headers(
        catalog: &StatCatalog,
        headers: &StringRecord,
        source_name: &str,
    ) -> Result<Self, SeasonError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| SeasonError::MissingColumn {
                source_name: source_name.to_string(),
                column: name.to_string(),
            })
        };

        let player_id = require(PID_COLUMN)?;
        let name = require(NAME_COLUMN)?;
        let position = require(POSITION_COLUMN)?;
        let season_type = require(SEASON_TYPE_COLUMN)?;

        let team = TEAM_COLUMNS
            .iter()
            .find_map(|&col| find(col))
            .ok_or_else(|| SeasonError::MissingTeam {
                source_name: source_name.to_string(),
            })?;

        let present: Vec<(Unit, usize)> = Unit::ALL
            .iter()
            .filter_map(|&unit| find(unit.game_column()).map(|idx| (unit, idx)))
            .collect();
        let (unit, games) = match present.as_slice() {
            [] => {
                return Err(SeasonError::MissingUnit {
                    source_name: source_name.to_string(),
                })
            }
            [only] => *only,
            many => {
                return Err(SeasonError::AmbiguousUnit {
                    source_name: source_name.to_string(),
                    columns: many.iter().map(|(u, _)| u.game_column()).collect(),
                })
            }
        };

        let stats = headers
            .iter()
            .enumerate()
            .filter_map(|(col, header)| catalog.feature_index(header.trim()).map(|f| (col, f)))
            .collect();

        Ok(UnitSchema {
            unit,
            player_id,
            name,
            position,
            season_type,
            team,
            games,
            stats,
            headers: headers.clone(),
        })
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Name of the CSV column at `idx`, for error messages.
    pub(crate) fn column_name(&self, idx: usize) -> &str {
        self.headers.get(idx).unwrap_or("?")
    }
}
