// Configuration loading and parsing (config/pipeline.toml).

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

use idp_core::catalog::{CatalogError, StatCatalog, STANDARD_POSITIONS, STANDARD_TEAMS};
use idp_core::season::SeasonFiles;

/// Config file name under `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "pipeline.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },

    #[error("invalid scoring catalog: {0}")]
    Catalog(#[from] CatalogError),
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory that relative paths in the config resolve against.
    pub base_dir: PathBuf,
    pub pipeline: PipelineConfig,
    pub seasons: Vec<SeasonSource>,
    pub training: TrainingConfig,
    pub prediction: PredictionConfig,
    pub evaluation: Option<EvaluationConfig>,
    pub scoring: Option<ScoringConfig>,
}

// ---------------------------------------------------------------------------
// pipeline.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire pipeline.toml file.
#[derive(Debug, Clone, Deserialize)]
struct PipelineFile {
    pipeline: PipelineConfig,
    #[serde(default)]
    seasons: Vec<SeasonSource>,
    training: TrainingConfig,
    prediction: PredictionConfig,
    #[serde(default)]
    evaluation: Option<EvaluationConfig>,
    #[serde(default)]
    scoring: Option<ScoringConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Exact `season_type` value rows must carry (REG, POST, REG+POST).
    pub season_type: String,
    /// Prediction CSV path.
    pub output: String,
    /// Optional JSON run report path.
    #[serde(default)]
    pub report: Option<String>,
    /// Reference date for roster ages, written as a "YYYY-MM-DD" string.
    /// Defaults to today.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

/// One season's input files. Stat files are absent for the season being
/// predicted.
#[derive(Debug, Clone, Deserialize)]
pub struct SeasonSource {
    pub year: u16,
    #[serde(default)]
    pub offense: Option<String>,
    #[serde(default)]
    pub defense: Option<String>,
    #[serde(default)]
    pub kicking: Option<String>,
    #[serde(default)]
    pub roster: Option<String>,
}

impl SeasonSource {
    pub fn has_stats(&self) -> bool {
        self.offense.is_some() && self.defense.is_some() && self.kicking.is_some()
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct SeasonPair {
    pub prev: u16,
    pub next: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    /// Training pairs, newest first.
    pub pairs: Vec<SeasonPair>,
    /// Weight multiplier applied once per step back from the newest pair.
    #[serde(default = "default_older_pair_weight_scale")]
    pub older_pair_weight_scale: f64,
    #[serde(default = "default_ridge_alpha")]
    pub ridge_alpha: f64,
}

fn default_older_pair_weight_scale() -> f64 {
    0.9
}

fn default_ridge_alpha() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PredictionConfig {
    pub prev_season: u16,
    pub target_season: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default)]
    pub salt: String,
    #[serde(default = "default_fraction")]
    pub fraction: f64,
}

fn default_fraction() -> f64 {
    0.8
}

/// Alternate scoring rule. Teams and positions stay the league standard.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    pub fantasy_points: BTreeMap<String, f64>,
    #[serde(default)]
    pub predictors: Vec<String>,
}

impl Config {
    /// Resolve a config path against the base directory.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.base_dir.join(path)
    }

    pub fn season(&self, year: u16) -> Option<&SeasonSource> {
        self.seasons.iter().find(|s| s.year == year)
    }

    /// The three stat files of a season, if it has them.
    pub fn season_files(&self, year: u16) -> Option<SeasonFiles> {
        let season = self.season(year)?;
        Some(SeasonFiles {
            offense: self.resolve(season.offense.as_deref()?),
            defense: self.resolve(season.defense.as_deref()?),
            kicking: self.resolve(season.kicking.as_deref()?),
        })
    }

    pub fn roster_path(&self, year: u16) -> Option<PathBuf> {
        let roster = self.season(year)?.roster.as_deref()?;
        Some(self.resolve(roster))
    }

    /// Stat catalog for this run: the `[scoring]` override or the standard
    /// league rule.
    pub fn catalog(&self) -> Result<StatCatalog, ConfigError> {
        match &self.scoring {
            None => Ok(StatCatalog::standard()),
            Some(scoring) => Ok(StatCatalog::new(
                scoring.fantasy_points.clone(),
                scoring.predictors.iter().cloned().collect::<BTreeSet<_>>(),
                STANDARD_TEAMS.iter().map(|s| s.to_string()).collect(),
                STANDARD_POSITIONS.iter().map(|s| s.to_string()).collect(),
            )?),
        }
    }

    /// Every season year the run reads, in ascending order.
    pub fn years_used(&self) -> BTreeSet<u16> {
        let mut years: BTreeSet<u16> = self
            .training
            .pairs
            .iter()
            .flat_map(|p| [p.prev, p.next])
            .collect();
        years.insert(self.prediction.prev_season);
        years.insert(self.prediction.target_season);
        years
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/pipeline.toml` relative to
/// the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let file: PipelineFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let config = Config {
        base_dir: base_dir.to_path_buf(),
        pipeline: file.pipeline,
        seasons: file.seasons,
        training: file.training,
        prediction: file.prediction,
        evaluation: file.evaluation,
        scoring: file.scoring,
    };

    validate(&config)?;

    Ok(config)
}

/// Copy `defaults/pipeline.toml` to `config/pipeline.toml` unless the latter
/// already exists. Returns the copied path, if any.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }
    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.is_file() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "neither config/{CONFIG_FILE} nor defaults/{CONFIG_FILE} found in {}",
                base_dir.display()
            ),
        });
    }

    let copy_err = |e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {}: {e}", source.display()),
    };
    if let Some(dir) = target.parent() {
        std::fs::create_dir_all(dir).map_err(copy_err)?;
    }
    std::fs::copy(&source, &target).map_err(copy_err)?;
    Ok(Some(target))
}

/// Loads config relative to `base_dir`, copying default config files first.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_file(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.pipeline.season_type.trim().is_empty() {
        return Err(invalid("pipeline.season_type", "must not be empty"));
    }
    if config.pipeline.output.trim().is_empty() {
        return Err(invalid("pipeline.output", "must not be empty"));
    }

    // Seasons
    let mut years = BTreeSet::new();
    for season in &config.seasons {
        if !years.insert(season.year) {
            return Err(invalid(
                "seasons.year",
                format!("season {} is listed more than once", season.year),
            ));
        }
        let given = [&season.offense, &season.defense, &season.kicking]
            .iter()
            .filter(|p| p.is_some())
            .count();
        if given != 0 && given != 3 {
            return Err(invalid(
                format!("seasons.{}", season.year),
                "offense, defense and kicking must be given together",
            ));
        }
    }

    let require = |year: u16, field: &str, stats: bool| -> Result<(), ConfigError> {
        let Some(season) = config.season(year) else {
            return Err(invalid(field, format!("season {year} is not configured")));
        };
        if season.roster.is_none() {
            return Err(invalid(field, format!("season {year} has no roster file")));
        }
        if stats && !season.has_stats() {
            return Err(invalid(field, format!("season {year} has no stat files")));
        }
        Ok(())
    };

    // Training
    let training = &config.training;
    if training.pairs.is_empty() {
        return Err(invalid("training.pairs", "at least one pair is required"));
    }
    for pair in &training.pairs {
        if pair.prev == pair.next {
            return Err(invalid(
                "training.pairs",
                format!("pair {}..{} uses the same season twice", pair.prev, pair.next),
            ));
        }
        require(pair.prev, "training.pairs.prev", true)?;
        require(pair.next, "training.pairs.next", true)?;
    }
    let scale = training.older_pair_weight_scale;
    if !scale.is_finite() || scale < 0.0 {
        return Err(invalid(
            "training.older_pair_weight_scale",
            format!("must be finite and >= 0, got {scale}"),
        ));
    }
    let alpha = training.ridge_alpha;
    if !alpha.is_finite() || alpha < 0.0 {
        return Err(invalid(
            "training.ridge_alpha",
            format!("must be finite and >= 0, got {alpha}"),
        ));
    }

    // Prediction
    require(config.prediction.prev_season, "prediction.prev_season", true)?;
    require(config.prediction.target_season, "prediction.target_season", false)?;

    // Evaluation
    if let Some(eval) = &config.evaluation {
        if !(0.0..=1.0).contains(&eval.fraction) {
            return Err(invalid(
                "evaluation.fraction",
                format!("must be between 0.0 and 1.0 inclusive, got {}", eval.fraction),
            ));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
