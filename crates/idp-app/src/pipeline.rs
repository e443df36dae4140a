// End-to-end forecasting run.
//
// Sequence:
// 1. Build the stat catalog (standard or [scoring] override)
// 2. Load every needed season's stats and week-1 roster once
// 3. Build labelled examples for each training pair
// 4. Merge pairs newest first, decaying older pair weights
// 5. Optional holdout: split, fit on the left side, evaluate on the right
// 6. Fit on everything and predict the target season's roster
// 7. Collect prediction rows and the run report

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use idp_core::catalog::StatCatalog;
use idp_core::dataset::LabelledExamples;
use idp_core::features::{build_labelled, build_unlabelled, column_names};
use idp_core::roster::WeekOneRoster;
use idp_core::season::SeasonStats;
use idp_model::{evaluate, EvaluationReport, Predictor, RegressionTrainer, RidgeTrainer};

use crate::config::{Config, EvaluationConfig};
use crate::output::{
    self, CoefficientSummary, HoldoutSummary, PredictionRow, RunReport, TrainingSetSummary,
};

/// Coefficients listed in the run report.
pub const TOP_COEFFICIENTS: usize = 20;

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub predictions: Vec<PredictionRow>,
    pub report: RunReport,
}

/// Run the pipeline and write the prediction CSV (and report, if configured).
pub fn run_and_write(config: &Config) -> anyhow::Result<PipelineOutcome> {
    let outcome = run(config)?;

    let output_path = config.resolve(&config.pipeline.output);
    output::write_predictions_file(&output_path, &outcome.predictions)
        .context("failed to write predictions")?;
    info!(
        "Wrote {} predictions to {}",
        outcome.predictions.len(),
        output_path.display()
    );

    if let Some(report) = &config.pipeline.report {
        let report_path = config.resolve(report);
        output::write_report(&report_path, &outcome.report)
            .context("failed to write run report")?;
        info!("Wrote run report to {}", report_path.display());
    }

    Ok(outcome)
}

/// Run the pipeline without writing anything.
pub fn run(config: &Config) -> anyhow::Result<PipelineOutcome> {
    let catalog = Arc::new(config.catalog().context("failed to build stat catalog")?);
    let as_of = config
        .pipeline
        .as_of
        .unwrap_or_else(|| Local::now().date_naive());
    let season_type = config.pipeline.season_type.as_str();
    info!(
        "Catalog: {} features, {} scored; season type {season_type}, ages as of {as_of}",
        catalog.features().len(),
        catalog.fantasy_points().len()
    );

    // --- inputs ---
    let seasons = load_seasons(config, &catalog)?;
    let rosters = load_rosters(config, as_of)?;

    // --- training set ---
    let scale = config.training.older_pair_weight_scale;
    let mut summaries = Vec::new();
    let mut train: Option<LabelledExamples> = None;
    for (k, pair) in config.training.pairs.iter().enumerate() {
        let examples = build_labelled(
            roster(&rosters, pair.prev)?,
            season(&seasons, pair.prev)?,
            roster(&rosters, pair.next)?,
            season(&seasons, pair.next)?,
        )
        .with_context(|| format!("failed to build examples for {}->{}", pair.prev, pair.next))?;

        let weight_scale = scale.powi(k as i32);
        summaries.push(TrainingSetSummary {
            prev_season: pair.prev,
            next_season: pair.next,
            rows: examples.len(),
            weight_scale,
        });
        train = Some(match train {
            None => examples,
            Some(acc) => LabelledExamples::merge(&acc, &examples, weight_scale)
                .context("failed to merge training sets")?,
        });
    }
    let Some(train) = train else {
        bail!("no training pairs configured");
    };
    info!(
        "Training set: {} rows x {} columns from {} season pairs",
        train.len(),
        train.width(),
        summaries.len()
    );

    let trainer = RidgeTrainer::new(config.training.ridge_alpha);

    // --- holdout ---
    let holdout = match &config.evaluation {
        Some(eval) => holdout(&trainer, &train, eval)?,
        None => None,
    };

    // --- final fit and prediction ---
    let model = trainer
        .fit(
            train.features().view(),
            train.labels().view(),
            train.weights().view(),
        )
        .context("failed to fit model on the full training set")?;

    let target = config.prediction.target_season;
    let target_roster = roster(&rosters, target)?;
    let unlabelled = build_unlabelled(
        roster(&rosters, config.prediction.prev_season)?,
        season(&seasons, config.prediction.prev_season)?,
        target_roster,
    )
    .context("failed to build prediction examples")?;
    let predicted = model
        .predict(unlabelled.features().view())
        .context("failed to predict target season")?;

    let mut predictions = Vec::with_capacity(unlabelled.len());
    for (pid, &score) in unlabelled.player_ids().iter().zip(predicted.iter()) {
        let Some(entry) = target_roster.get(pid) else {
            bail!("predicted player {pid} is missing from the {target} roster");
        };
        predictions.push(PredictionRow {
            pid: pid.clone(),
            full_name: entry.name.clone(),
            position: entry.position.clone(),
            team: entry.team.clone(),
            predicted_idp: score,
            short_name: entry.short_name.clone(),
        });
    }
    info!("Predicted {} players for {target}", predictions.len());

    let names = column_names(&catalog);
    let top_coefficients = model
        .ranked_coefficients(&names)
        .into_iter()
        .take(TOP_COEFFICIENTS)
        .map(|(column, value)| CoefficientSummary { column, value })
        .collect();

    let report = RunReport {
        season_type: season_type.to_string(),
        as_of,
        training_sets: summaries,
        training_rows: train.len(),
        feature_width: train.width(),
        ridge_alpha: trainer.alpha,
        holdout,
        intercept: model.intercept(),
        top_coefficients,
        target_season: target,
        prediction_rows: predictions.len(),
    };

    Ok(PipelineOutcome {
        predictions,
        report,
    })
}

/// Fit on the left side of a salted split and score the right side.
/// Skipped with a warning when either side is empty.
pub fn holdout<T: RegressionTrainer>(
    trainer: &T,
    examples: &LabelledExamples,
    eval: &EvaluationConfig,
) -> anyhow::Result<Option<HoldoutSummary>> {
    let (fit_set, test_set) = examples.split(&eval.salt, eval.fraction);
    if fit_set.is_empty() || test_set.is_empty() {
        warn!(
            "Holdout skipped: split at {} left {} fitting rows and {} test rows",
            eval.fraction,
            fit_set.len(),
            test_set.len()
        );
        return Ok(None);
    }

    let model = trainer
        .fit(
            fit_set.features().view(),
            fit_set.labels().view(),
            fit_set.weights().view(),
        )
        .context("failed to fit holdout model")?;
    let predicted = model
        .predict(test_set.features().view())
        .context("failed to predict holdout rows")?;
    let metrics: EvaluationReport = evaluate(
        predicted.view(),
        test_set.labels().view(),
        test_set.weights().view(),
    )
    .context("failed to evaluate holdout predictions")?;

    info!(
        "Holdout ({} fit / {} test): rmse {:.3}, mae {:.3}, r2 {}",
        fit_set.len(),
        test_set.len(),
        metrics.rmse,
        metrics.mae,
        metrics
            .r_squared
            .map_or_else(|| "n/a".to_string(), |r| format!("{r:.3}"))
    );

    Ok(Some(HoldoutSummary {
        salt: eval.salt.clone(),
        fraction: eval.fraction,
        train_rows: fit_set.len(),
        test_rows: test_set.len(),
        metrics,
    }))
}

// ---------------------------------------------------------------------------
// Input loading
// ---------------------------------------------------------------------------

fn load_seasons(
    config: &Config,
    catalog: &Arc<StatCatalog>,
) -> anyhow::Result<BTreeMap<u16, SeasonStats>> {
    let mut years: Vec<u16> = config
        .training
        .pairs
        .iter()
        .flat_map(|p| [p.prev, p.next])
        .collect();
    years.push(config.prediction.prev_season);
    years.sort_unstable();
    years.dedup();

    let mut seasons = BTreeMap::new();
    for year in years {
        let Some(files) = config.season_files(year) else {
            bail!("season {year} has no stat files configured");
        };
        let stats = SeasonStats::load(Arc::clone(catalog), &files, &config.pipeline.season_type)
            .with_context(|| format!("failed to load {year} season stats"))?;
        seasons.insert(year, stats);
    }
    Ok(seasons)
}

fn load_rosters(
    config: &Config,
    as_of: NaiveDate,
) -> anyhow::Result<BTreeMap<u16, WeekOneRoster>> {
    let mut rosters = BTreeMap::new();
    for year in config.years_used() {
        let Some(path) = config.roster_path(year) else {
            bail!("season {year} has no roster file configured");
        };
        let roster = WeekOneRoster::load(&path, as_of)
            .with_context(|| format!("failed to load {year} week-1 roster"))?;
        info!("Loaded {} week-1 players for {year}", roster.len());
        rosters.insert(year, roster);
    }
    Ok(rosters)
}

fn season(seasons: &BTreeMap<u16, SeasonStats>, year: u16) -> anyhow::Result<&SeasonStats> {
    seasons
        .get(&year)
        .with_context(|| format!("season {year} stats were not loaded"))
}

fn roster(rosters: &BTreeMap<u16, WeekOneRoster>, year: u16) -> anyhow::Result<&WeekOneRoster> {
    rosters
        .get(&year)
        .with_context(|| format!("season {year} roster was not loaded"))
}
