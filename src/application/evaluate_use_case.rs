// ============================================================
// Layer 2: EvaluateUseCase
// ============================================================
// Scores the registry's best run for a model against the test
// split, without retraining:
//
//   Step 1: Read `best.path` from the registry   (Layer 6 - infra)
//   Step 2: Read artifact.json from that run     (Layer 6 - infra)
//   Step 3: Lay out the test split the way the
//           model saw its training data          (Layer 4 - data)
//   Step 4: Restore the model, compute RMSE      (Layer 5 - ml)

use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::data::{
    dataset::RegressionData,
    loader::{check_paths_exist, CsvLoader},
};
use crate::domain::traits::{Regressor, TableSource};
use crate::infra::{
    checkpoint::CheckpointManager,
    config::{DataConfig, DatasetVariant},
    registry::ModelRegistry,
};
use crate::ml::model::{Model, ModelKind};

#[derive(Debug, Clone)]
pub struct EvaluateConfig {
    pub name:        String,
    pub data_config: DataConfig,
    pub registry:    PathBuf,
    pub variant:     DatasetVariant,
}

#[derive(Debug, Clone)]
pub struct EvaluateReport {
    pub artifact: PathBuf,
    pub rows:     usize,
    pub rmse:     f64,
    /// RMSE stored in the registry when the run was recorded
    pub recorded: Option<f64>,
}

pub struct EvaluateUseCase {
    config: EvaluateConfig,
}

impl EvaluateUseCase {
    pub fn new(config: EvaluateConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<EvaluateReport> {
        let cfg = &self.config;

        // ── Step 1: Best run ─────────────────────────────────────────────────
        let registry = ModelRegistry::open(&cfg.registry)?;
        let best     = registry.get(&cfg.name)?.best;
        if best.is_empty() {
            bail!("model '{}' has no recorded best run; run 'train' first", cfg.name);
        }
        let artifact = PathBuf::from(&best.path);

        // ── Step 2: Run metadata ─────────────────────────────────────────────
        let meta = CheckpointManager::open(&artifact)?.load_meta()?;
        if meta.variant != cfg.variant.to_string() {
            bail!(
                "best run of '{}' was trained on the {} data, not {}",
                cfg.name,
                meta.variant,
                cfg.variant
            );
        }
        let kind: ModelKind = meta.model_type.parse()?;

        // ── Step 3: Test split ───────────────────────────────────────────────
        let test_path = cfg.data_config.test_data_path(cfg.variant);
        check_paths_exist(&[&test_path])?;
        let test = RegressionData::with_features(
            &CsvLoader::new(&test_path).load()?,
            &meta.target,
            &meta.features,
        )?;

        // ── Step 4: Score ────────────────────────────────────────────────────
        let model = Model::load(kind, &artifact)?;
        let rmse  = model.evaluate_rmse(test.x(), test.y())?;

        tracing::info!(
            "'{}' ({}) on {} test rows: {} = {:.4}",
            cfg.name,
            kind,
            test.len(),
            meta.metric,
            rmse
        );
        Ok(EvaluateReport { artifact, rows: test.len(), rmse, recorded: best.value })
    }
}
