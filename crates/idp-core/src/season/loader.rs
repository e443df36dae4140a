// Loading a season's offense/defense/kicking stat files into per-player
// aggregates.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use super::player::PlayerSeason;
use super::schema::UnitSchema;
use super::SeasonError;
use crate::catalog::StatCatalog;

/// Paths to the three unit stat files describing one season.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonFiles {
    pub offense: PathBuf,
    pub defense: PathBuf,
    pub kicking: PathBuf,
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Accumulates rows from any number of unit stat sources. Only rows whose
/// `season_type` exactly equals the filter are ingested.
#[derive(Debug)]
pub struct SeasonLoader {
    catalog: Arc<StatCatalog>,
    season_type: String,
    players: BTreeMap<String, PlayerSeason>,
}

impl SeasonLoader {
    pub fn new(catalog: Arc<StatCatalog>, season_type: &str) -> Self {
        SeasonLoader {
            catalog,
            season_type: season_type.to_string(),
            players: BTreeMap::new(),
        }
    }

    /// Ingest one unit stat CSV from a reader. `source_name` labels errors.
    pub fn add_reader<R: Read>(&mut self, rdr: R, source_name: &str) -> Result<(), SeasonError> {
        let csv_err = |source| SeasonError::Csv {
            source_name: source_name.to_string(),
            source,
        };
        let mut reader = csv::Reader::from_reader(rdr);
        let headers = reader.headers().map_err(csv_err)?.clone();
        let schema = UnitSchema::from_headers(&self.catalog, &headers, source_name)?;

        let mut kept = 0usize;
        let mut skipped = 0usize;
        for result in reader.records() {
            let row = result.map_err(csv_err)?;
            if row.get(schema.season_type) != Some(self.season_type.as_str()) {
                skipped += 1;
                continue;
            }
            let pid = row.get(schema.player_id).unwrap_or("").trim();
            let player = match self.players.entry(pid.to_string()) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => {
                    let name = row.get(schema.name).unwrap_or("").trim();
                    e.insert(PlayerSeason::new(Arc::clone(&self.catalog), pid, name))
                }
            };
            player.add_row(&schema, &row)?;
            kept += 1;
        }

        debug!(
            "{source_name}: {} unit, {kept} rows kept, {skipped} rows outside season type {}",
            schema.unit(),
            self.season_type
        );
        Ok(())
    }

    /// Ingest one unit stat CSV file.
    pub fn add_file(&mut self, path: &Path) -> Result<(), SeasonError> {
        let file = std::fs::File::open(path).map_err(|e| SeasonError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        self.add_reader(file, &path.display().to_string())
    }

    /// Freeze the accumulated players.
    pub fn finish(self) -> SeasonStats {
        SeasonStats {
            catalog: self.catalog,
            season_type: self.season_type,
            players: self.players,
        }
    }
}

// ---------------------------------------------------------------------------
// Loaded season
// ---------------------------------------------------------------------------

/// Every player's aggregate for one season. Read-only once built.
#[derive(Debug, Clone)]
pub struct SeasonStats {
    catalog: Arc<StatCatalog>,
    season_type: String,
    players: BTreeMap<String, PlayerSeason>,
}

impl SeasonStats {
    /// Load the offense, defense and kicking files of a season. Any bad row
    /// fails the whole load.
    pub fn load(
        catalog: Arc<StatCatalog>,
        files: &SeasonFiles,
        season_type: &str,
    ) -> Result<Self, SeasonError> {
        let mut loader = SeasonLoader::new(catalog, season_type);
        loader.add_file(&files.offense)?;
        loader.add_file(&files.defense)?;
        loader.add_file(&files.kicking)?;
        let season = loader.finish();
        info!(
            "Loaded {} {} players from {}",
            season.len(),
            season_type,
            files.offense.display()
        );
        Ok(season)
    }

    pub fn catalog(&self) -> &Arc<StatCatalog> {
        &self.catalog
    }

    pub fn season_type(&self) -> &str {
        &self.season_type
    }

    /// Look up one player's season.
    pub fn get(&self, player_id: &str) -> Result<&PlayerSeason, SeasonError> {
        self.players
            .get(player_id)
            .ok_or_else(|| SeasonError::NotFound(player_id.to_string()))
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.players.contains_key(player_id)
    }

    /// Player IDs in ascending order.
    pub fn player_ids(&self) -> impl Iterator<Item = &str> {
        self.players.keys().map(String::as_str)
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerSeason> {
        self.players.values()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
