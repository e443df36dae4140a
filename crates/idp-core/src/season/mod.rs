// Season-long player statistics: per-unit CSV schemas, per-player
// aggregation across offense/defense/kicking files, and the loaded season.

pub mod loader;
pub mod player;
pub mod schema;

use std::fmt;

use crate::parse::MalformedNumber;

pub use loader::{SeasonFiles, SeasonLoader, SeasonStats};
pub use player::PlayerSeason;
pub use schema::UnitSchema;

// ---------------------------------------------------------------------------
// Unit
// ---------------------------------------------------------------------------

/// The statistical unit a stat file describes. Each unit has its own
/// game-count column, which is how a file's unit is recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Unit {
    Offense,
    Defense,
    Kicking,
}

impl Unit {
    /// All units in feature-block order.
    pub const ALL: [Unit; 3] = [Unit::Offense, Unit::Defense, Unit::Kicking];

    pub fn game_column(self) -> &'static str {
        match self {
            Unit::Offense => "games",
            Unit::Defense => "def_games",
            Unit::Kicking => "kck_games",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Unit::Offense => 0,
            Unit::Defense => 1,
            Unit::Kicking => 2,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Unit::Offense => "offense",
            Unit::Defense => "defense",
            Unit::Kicking => "kicking",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SeasonError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {source_name}: {source}")]
    Csv {
        source_name: String,
        source: csv::Error,
    },

    #[error("{source_name}: missing required column `{column}`")]
    MissingColumn { source_name: String, column: String },

    #[error("{source_name}: no `recent_team` or `team` column")]
    MissingTeam { source_name: String },

    #[error("{source_name}: no unit game-count column (games, def_games, kck_games)")]
    MissingUnit { source_name: String },

    #[error("{source_name}: more than one unit game-count column: {columns:?}")]
    AmbiguousUnit {
        source_name: String,
        columns: Vec<&'static str>,
    },

    #[error("multiple insertion for player {player_id}: {unit}, team {team}")]
    DuplicateInsertion {
        player_id: String,
        unit: Unit,
        team: String,
    },

    #[error("player {player_id}, column `{column}`: {source}")]
    MalformedNumber {
        player_id: String,
        column: String,
        source: MalformedNumber,
    },

    #[error("no season stats for player {0}")]
    NotFound(String),
}
