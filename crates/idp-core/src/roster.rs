// Week-1 roster snapshots: biographical and draft features for every player
// rostered when a season kicks off.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use crate::parse::{empty_float, empty_float_or, MalformedNumber};

/// Number of roster features per snapshot.
pub const ROSTER_FEATURE_COUNT: usize = 8;

/// Roster feature names, in vector order.
pub const ROSTER_FEATURES: [&str; ROSTER_FEATURE_COUNT] = [
    "active",
    "age",
    "height",
    "weight",
    "years_exp",
    "years_since_entry",
    "years_since_rookie",
    "draft_number",
];

/// Draft number assigned to undrafted players: worse than any real pick.
pub const UNDRAFTED_PICK: f64 = 400.0;

const ACTIVE_STATUS: &str = "ACT";
const DATE_FORMAT: &str = "%Y-%m-%d";
const DAYS_PER_YEAR: f64 = 365.0;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
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

    #[error("player {player_id}, column `{column}`: {source}")]
    MalformedNumber {
        player_id: String,
        column: &'static str,
        source: MalformedNumber,
    },

    #[error("player {player_id}, column `{column}`: invalid date {value:?}")]
    MalformedDate {
        player_id: String,
        column: &'static str,
        value: String,
    },
}

// ---------------------------------------------------------------------------
// Raw CSV row (private)
// ---------------------------------------------------------------------------

/// Weekly roster CSV row. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct RawRosterRow {
    gsis_id: String,
    week: String,
    birth_date: String,
    entry_year: String,
    rookie_year: String,
    status: String,
    height: String,
    weight: String,
    years_exp: String,
    draft_number: String,
    full_name: String,
    first_name: String,
    last_name: String,
    team: String,
    position: String,
}

// ---------------------------------------------------------------------------
// Roster entry
// ---------------------------------------------------------------------------

/// One player as rostered just before a season's week-1 kickoff.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub player_id: String,
    pub name: String,
    pub short_name: String,
    pub team: String,
    pub position: String,
    pub active: bool,
    pub age: f64,
    pub height: f64,
    pub weight: f64,
    pub years_exp: f64,
    pub years_since_entry: f64,
    pub years_since_rookie: f64,
    pub draft_number: f64,
}

impl RosterEntry {
    pub fn features(&self) -> [f64; ROSTER_FEATURE_COUNT] {
        [
            if self.active { 1.0 } else { 0.0 },
            self.age,
            self.height,
            self.weight,
            self.years_exp,
            self.years_since_entry,
            self.years_since_rookie,
            self.draft_number,
        ]
    }

    /// Convert a raw row, or `None` for rows that do not describe a week-1
    /// rostered player with a known birth date.
    fn from_raw(raw: RawRosterRow, as_of: NaiveDate) -> Result<Option<Self>, RosterError> {
        let player_id = raw.gsis_id.trim().to_string();
        if player_id.is_empty() {
            return Ok(None);
        }
        let week = parse_int(&raw.week, &player_id, "week")?;
        if week != 1 {
            return Ok(None);
        }
        let birth_text = raw.birth_date.trim();
        if birth_text.is_empty() {
            return Ok(None);
        }

        let birth_date = NaiveDate::parse_from_str(birth_text, DATE_FORMAT).map_err(|_| {
            RosterError::MalformedDate {
                player_id: player_id.clone(),
                column: "birth_date",
                value: raw.birth_date.clone(),
            }
        })?;
        let entry_date = season_start(&raw.entry_year, &player_id, "entry_year")?;
        let rookie_date = season_start(&raw.rookie_year, &player_id, "rookie_year")?;

        let number = |value: &str, column: &'static str| {
            empty_float(value).map_err(|source| RosterError::MalformedNumber {
                player_id: player_id.clone(),
                column,
                source,
            })
        };
        let height = number(&raw.height, "height")?;
        let weight = number(&raw.weight, "weight")?;
        let years_exp = number(&raw.years_exp, "years_exp")?;
        let draft_number = empty_float_or(&raw.draft_number, UNDRAFTED_PICK).map_err(|source| {
            RosterError::MalformedNumber {
                player_id: player_id.clone(),
                column: "draft_number",
                source,
            }
        })?;

        Ok(Some(RosterEntry {
            short_name: short_name(&raw.first_name, &raw.last_name),
            name: raw.full_name.trim().to_string(),
            team: raw.team.trim().to_string(),
            position: raw.position.trim().to_string(),
            active: raw.status.trim() == ACTIVE_STATUS,
            age: years_between(birth_date, as_of),
            height,
            weight,
            years_exp,
            years_since_entry: years_between(entry_date, as_of),
            years_since_rookie: years_between(rookie_date, as_of),
            draft_number,
            player_id,
        }))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Whole days elapsed, in 365-day years.
fn years_between(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64 / DAYS_PER_YEAR
}

fn parse_int(value: &str, player_id: &str, column: &'static str) -> Result<i32, RosterError> {
    value
        .trim()
        .parse::<i32>()
        .map_err(|_| RosterError::MalformedNumber {
            player_id: player_id.to_string(),
            column,
            source: MalformedNumber {
                value: value.to_string(),
            },
        })
}

/// September 1 of the given season year.
fn season_start(
    year: &str,
    player_id: &str,
    column: &'static str,
) -> Result<NaiveDate, RosterError> {
    let y = parse_int(year, player_id, column)?;
    NaiveDate::from_ymd_opt(y, 9, 1).ok_or_else(|| RosterError::MalformedDate {
        player_id: player_id.to_string(),
        column,
        value: year.to_string(),
    })
}

/// "Josh" + "Allen" -> "J.Allen".
fn short_name(first: &str, last: &str) -> String {
    let last = last.trim();
    match first.trim().chars().next() {
        Some(initial) => format!("{initial}.{last}"),
        None => last.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// All week-1 rostered players of one season, keyed by player ID.
#[derive(Debug, Clone, Default)]
pub struct WeekOneRoster {
    entries: BTreeMap<String, RosterEntry>,
}

impl WeekOneRoster {
    /// Parse a weekly roster CSV, keeping week-1 rows. Ages and tenures are
    /// measured at `as_of`.
    pub fn from_reader<R: Read>(
        rdr: R,
        source_name: &str,
        as_of: NaiveDate,
    ) -> Result<Self, RosterError> {
        let mut reader = csv::Reader::from_reader(rdr);
        let mut entries = BTreeMap::new();
        for result in reader.deserialize::<RawRosterRow>() {
            let raw = result.map_err(|e| RosterError::Csv {
                source_name: source_name.to_string(),
                source: e,
            })?;
            let Some(entry) = RosterEntry::from_raw(raw, as_of)? else {
                continue;
            };
            if entries.contains_key(&entry.player_id) {
                warn!(
                    "{source_name}: duplicate week-1 entry for {}, using latest",
                    entry.player_id
                );
            }
            entries.insert(entry.player_id.clone(), entry);
        }
        Ok(WeekOneRoster { entries })
    }

    /// Load a weekly roster CSV file.
    pub fn load(path: &Path, as_of: NaiveDate) -> Result<Self, RosterError> {
        let file = std::fs::File::open(path).map_err(|e| RosterError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let roster = Self::from_reader(file, &path.display().to_string(), as_of)?;
        info!(
            "Loaded {} week-1 players from {} (as of {as_of})",
            roster.len(),
            path.display()
        );
        Ok(roster)
    }

    pub fn get(&self, player_id: &str) -> Option<&RosterEntry> {
        self.entries.get(player_id)
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.entries.contains_key(player_id)
    }

    /// Player IDs in ascending order.
    pub fn player_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = &RosterEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
