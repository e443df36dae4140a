// Result writers: the prediction CSV and the JSON run report.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use idp_model::EvaluationReport;

/// Prediction CSV columns, in order.
pub const PREDICTION_HEADER: [&str; 7] = [
    "pid",
    "full_name",
    "position",
    "team",
    "predicted_idp",
    "drafted",
    "short_name",
];

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write CSV {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("failed to write JSON {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Predictions
// ---------------------------------------------------------------------------

/// One predicted player. `drafted` is always written blank, for draft-day
/// bookkeeping in a spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRow {
    pub pid: String,
    pub full_name: String,
    pub position: String,
    pub team: String,
    pub predicted_idp: f64,
    pub short_name: String,
}

/// Write the header and one record per row, scores to three decimals.
pub fn write_predictions<W: Write>(writer: W, rows: &[PredictionRow]) -> csv::Result<()> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(PREDICTION_HEADER)?;
    for row in rows {
        w.write_record([
            row.pid.as_str(),
            row.full_name.as_str(),
            row.position.as_str(),
            row.team.as_str(),
            format!("{:.3}", row.predicted_idp).as_str(),
            "",
            row.short_name.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_predictions_file(path: &Path, rows: &[PredictionRow]) -> Result<(), OutputError> {
    let file = create(path)?;
    write_predictions(file, rows).map_err(|e| OutputError::Csv {
        path: path.to_path_buf(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub season_type: String,
    pub as_of: NaiveDate,
    pub training_sets: Vec<TrainingSetSummary>,
    pub training_rows: usize,
    pub feature_width: usize,
    pub ridge_alpha: f64,
    pub holdout: Option<HoldoutSummary>,
    pub intercept: f64,
    pub top_coefficients: Vec<CoefficientSummary>,
    pub target_season: u16,
    pub prediction_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingSetSummary {
    pub prev_season: u16,
    pub next_season: u16,
    pub rows: usize,
    pub weight_scale: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HoldoutSummary {
    pub salt: String,
    pub fraction: f64,
    pub train_rows: usize,
    pub test_rows: usize,
    pub metrics: EvaluationReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoefficientSummary {
    pub column: String,
    pub value: f64,
}

pub fn write_report(path: &Path, report: &RunReport) -> Result<(), OutputError> {
    let mut writer = BufWriter::new(create(path)?);
    serde_json::to_writer_pretty(&mut writer, report).map_err(|e| OutputError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    writer.flush().map_err(|e| OutputError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Create `path`, making any missing parent directories.
fn create(path: &Path) -> Result<File, OutputError> {
    let io_err = |e| OutputError::Io {
        path: path.to_path_buf(),
        source: e,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    File::create(path).map_err(io_err)
}
