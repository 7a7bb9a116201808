// ============================================================
// Layer 2: TrainUseCase
// ============================================================
// Trains one registered model on one dataset variant:
//
//   Step 1: Look up the model in the registry     (Layer 6 - infra)
//   Step 2: Load train/test splits                (Layer 4 - data)
//   Step 3: Grid search, if tuning is enabled     (Layer 5 - ml)
//   Step 4: Fit on the full training split        (Layer 5 - ml)
//   Step 5: RMSE on the test split                (Layer 3 - domain)
//   Step 6: Save artifacts under a new run dir    (Layer 6 - infra)
//   Step 7: Update `best` if this run is better   (Layer 6 - infra)
//   Step 8: Append to the run log                 (Layer 6 - infra)
//
// Reference: Rust Book §13 (Iterators and Closures)

use anyhow::{Context, Result};
use chrono::Local;
use serde_yaml::Value;
use std::path::PathBuf;

use crate::data::{
    dataset::RegressionData,
    loader::{check_paths_exist, CsvLoader},
};
use crate::domain::traits::{Regressor, TableSource};
use crate::infra::{
    checkpoint::{ArtifactMeta, CheckpointManager},
    config::{DataConfig, DatasetVariant},
    metrics::{RunLogger, RunRecord},
    registry::{BestRecord, ModelRegistry},
};
use crate::ml::{model::Model, tuning::grid_search};

pub const METRIC: &str = "rmse";

// ─── Training Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Registry key of the model to train
    pub name:          String,
    pub data_config:   DataConfig,
    pub registry:      PathBuf,
    pub variant:       DatasetVariant,
    /// Run directories go to `<artifacts_dir>/<name>/<run_id>`
    pub artifacts_dir: PathBuf,
}

/// Outcome of one training run.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub run_id:     String,
    pub rmse:       f64,
    pub improved:   bool,
    pub artifact:   PathBuf,
    pub parameters: Value,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainReport> {
        let cfg    = &self.config;
        let target = &cfg.data_config.features.target;

        // ── Step 1: Registry entry ───────────────────────────────────────────
        let registry = ModelRegistry::open(&cfg.registry)?;
        let entry    = registry.get(&cfg.name)?;
        let kind     = entry.kind()?;
        tracing::info!("Training '{}' ({}) on the {} data", cfg.name, kind, cfg.variant);

        // ── Step 2: Data ─────────────────────────────────────────────────────
        let train_path = cfg.data_config.train_data_path(cfg.variant);
        let test_path  = cfg.data_config.test_data_path(cfg.variant);
        check_paths_exist(&[&train_path, &test_path])?;

        let train = RegressionData::from_table(&CsvLoader::new(&train_path).load()?, target)?;
        let test  = RegressionData::with_features(
            &CsvLoader::new(&test_path).load()?,
            target,
            train.features(),
        )?;
        tracing::info!(
            "{} train rows, {} test rows, {} features",
            train.len(),
            test.len(),
            train.features().len()
        );

        // ── Step 3: Tuning ───────────────────────────────────────────────────
        let params = if entry.tuning.enabled {
            let outcome = grid_search(kind, &entry.best.parameters, &entry.tuning, &train)?;
            tracing::info!("Best cross-validated rmse: {:.4}", outcome.best_score);
            outcome.best_params
        } else {
            entry.best.parameters.clone()
        };

        // ── Step 4: Fit ──────────────────────────────────────────────────────
        let mut model = Model::build(kind, &params)?;
        model.fit(train.x(), train.y())?;

        // ── Step 5: Evaluate ─────────────────────────────────────────────────
        let rmse = model.evaluate_rmse(test.x(), test.y())?;
        tracing::info!("Test {} = {:.4}", METRIC, rmse);

        // ── Step 6: Artifacts ────────────────────────────────────────────────
        let now        = Local::now();
        let run_id     = now.format("%Y%m%dT%H%M%S%3f").to_string();
        let trained_at = now.to_rfc3339();
        let model_dir  = cfg.artifacts_dir.join(&cfg.name);
        let run_dir    = model_dir.join(&run_id);
        let parameters = model.params()?;

        model.save(&run_dir)?;
        CheckpointManager::create(&run_dir)?.save_meta(&ArtifactMeta {
            model_name: cfg.name.clone(),
            model_type: kind.to_string(),
            variant:    cfg.variant.to_string(),
            target:     target.clone(),
            features:   train.features().to_vec(),
            parameters: serde_json::to_value(&parameters)?,
            metric:     METRIC.to_string(),
            value:      rmse,
            run_id:     run_id.clone(),
            trained_at: trained_at.clone(),
        })?;
        tracing::info!("Artifacts saved to '{}'", run_dir.display());

        // ── Step 7: Registry ─────────────────────────────────────────────────
        // Re-read so edits made while training are not clobbered.
        let mut registry = ModelRegistry::open(&cfg.registry)?;
        let variant      = cfg.variant.to_string();
        let previous     = registry.get(&cfg.name)?.best;
        let improved     = previous.is_improved_by(rmse, &variant);
        if improved {
            registry
                .update_best(&cfg.name, BestRecord {
                    path:       run_dir.display().to_string(),
                    parameters: parameters.clone(),
                    metric:     METRIC.to_string(),
                    value:      Some(rmse),
                    variant:    Some(variant.clone()),
                    trained_at,
                })
                .with_context(|| format!("Cannot record best run for '{}'", cfg.name))?;
            tracing::info!("New best for '{}' ({:.4})", cfg.name, rmse);
        } else if let Some(best) = previous.value {
            tracing::info!("Kept previous best for '{}' ({:.4} <= {:.4})", cfg.name, best, rmse);
        }

        // ── Step 8: Run log ──────────────────────────────────────────────────
        RunLogger::new(&model_dir)?.log(&RunRecord {
            run_id:     run_id.clone(),
            variant,
            model_type: kind.to_string(),
            metric:     METRIC.to_string(),
            value:      rmse,
            improved,
            parameters: serde_json::to_string(&parameters)?,
        })?;

        Ok(TrainReport { run_id, rmse, improved, artifact: run_dir, parameters })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::application::{
        features_use_case::{tests::config_with_raw, FeaturesUseCase},
        split_use_case::SplitUseCase,
    };
    use crate::data::splitter::SplitFractions;
    use crate::ml::model::ModelKind;
    use std::path::Path;

    /// Raw → processed → split, plus a registry with `name` registered.
    pub(crate) fn prepared(root: &Path, name: &str, kind: ModelKind) -> TrainConfig {
        let data = config_with_raw(root, 60);
        FeaturesUseCase::new(data.clone()).execute().unwrap();
        SplitUseCase::new(data.clone(), SplitFractions::default()).execute().unwrap();

        let registry = root.join("configs/models.yaml");
        ModelRegistry::open(&registry)
            .unwrap()
            .register(name, kind, None, None, false)
            .unwrap();

        TrainConfig {
            name:          name.to_string(),
            data_config:   data,
            registry,
            variant:       DatasetVariant::Daily,
            artifacts_dir: root.join("artifacts"),
        }
    }

    #[test]
    fn test_first_run_becomes_best() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = prepared(dir.path(), "svr_baseline", ModelKind::Svr);

        let report = TrainUseCase::new(cfg.clone()).execute().unwrap();
        assert!(report.improved);
        assert!(report.rmse.is_finite());
        assert!(report.artifact.join("svr.json").exists());
        assert!(report.artifact.join("artifact.json").exists());

        let registry = ModelRegistry::open(&cfg.registry).unwrap();
        let best     = registry.get("svr_baseline").unwrap().best;
        assert_eq!(best.value, Some(report.rmse));
        assert_eq!(best.variant.as_deref(), Some("daily"));
        assert_eq!(best.path, report.artifact.display().to_string());
        assert_eq!(best.parameters["c"].as_f64(), Some(1.0));

        let runs = RunLogger::new(cfg.artifacts_dir.join("svr_baseline"))
            .unwrap()
            .read_all()
            .unwrap();
        assert_eq!(runs.len(), 1);
        assert!(runs[0].improved);
    }

    #[test]
    fn test_worse_run_keeps_best() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = prepared(dir.path(), "svr_baseline", ModelKind::Svr);

        let mut registry = ModelRegistry::open(&cfg.registry).unwrap();
        let unbeatable   = BestRecord {
            path:       "artifacts/svr_baseline/legend".into(),
            parameters: serde_yaml::from_str("c: 3.0").unwrap(),
            metric:     METRIC.into(),
            value:      Some(0.0),
            variant:    Some("daily".into()),
            trained_at: "2026-01-01T00:00:00+00:00".into(),
        };
        registry.update_best("svr_baseline", unbeatable.clone()).unwrap();

        let report = TrainUseCase::new(cfg.clone()).execute().unwrap();
        assert!(!report.improved);
        // best.parameters are the starting point of the next run
        assert_eq!(report.parameters["c"].as_f64(), Some(3.0));

        let registry = ModelRegistry::open(&cfg.registry).unwrap();
        assert_eq!(registry.get("svr_baseline").unwrap().best, unbeatable);
    }

    #[test]
    fn test_best_from_other_variant_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = prepared(dir.path(), "svr_baseline", ModelKind::Svr);

        let hourly = TrainUseCase::new(TrainConfig { variant: DatasetVariant::Hourly, ..cfg.clone() })
            .execute()
            .unwrap();
        assert!(hourly.improved);

        let daily = TrainUseCase::new(cfg.clone()).execute().unwrap();
        assert!(daily.improved);

        let registry = ModelRegistry::open(&cfg.registry).unwrap();
        let best     = registry.get("svr_baseline").unwrap().best;
        assert_eq!(best.path, daily.artifact.display().to_string());
        assert_eq!(best.variant.as_deref(), Some("daily"));
    }

    #[test]
    fn test_unknown_model() {
        let dir     = tempfile::tempdir().unwrap();
        let mut cfg = prepared(dir.path(), "svr_baseline", ModelKind::Svr);
        cfg.name    = "ghost".into();
        assert!(TrainUseCase::new(cfg).execute().is_err());
    }
}
