// ============================================================
// Layer 6: Checkpoint Manager
// ============================================================
// Saves and restores everything a trained model needs, inside
// one run directory per training run:
//
//   artifacts/<model name>/<run id>/
//     artifact.json          ← ArtifactMeta (type, features, score)
//     svr.json               ← fitted linfa SVR (svr variant)
//     linear.mpk.gz          ← burn weights (linear variant)
//     linear_meta.json       ← feature/target scaling (linear variant)
//
// artifact.json is what evaluation reads first: the model
// type picks the variant to restore, and the feature list
// fixes the column order of the test matrix.
//
// Burn's NamedMpkGzFileRecorder (full precision):
//   - Serialises module parameters to MessagePack
//   - Compresses with gzip
//   - Loading fails if the architecture does not match
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::ml::linear::{InferBackend, LinearModel, LinearModelConfig};

const META_FILE: &str = "artifact.json";
const LINEAR_WEIGHTS: &str = "linear";

type WeightsRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

/// Describes one saved training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub model_name: String,
    pub model_type: String,
    pub variant:    String,
    pub target:     String,
    /// Column order of the training matrix
    pub features:   Vec<String>,
    pub parameters: serde_json::Value,
    pub metric:     String,
    pub value:      f64,
    pub run_id:     String,
    pub trained_at: String,
}

/// Reads and writes files under a single directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create the manager and its directory (like `mkdir -p`).
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Open an existing directory for reading.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            anyhow::bail!(
                "Checkpoint dir '{}' does not exist. Have you run 'train' first?",
                dir.display()
            );
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // ── JSON documents ────────────────────────────────────────────────────────

    pub fn save_json<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.dir.join(file);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Saved '{}'", path.display());
        Ok(())
    }

    pub fn load_json<T: DeserializeOwned>(&self, file: &str) -> Result<T> {
        let path = self.dir.join(file);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed checkpoint file '{}'", path.display()))
    }

    pub fn save_meta(&self, meta: &ArtifactMeta) -> Result<()> {
        self.save_json(META_FILE, meta)
    }

    pub fn load_meta(&self) -> Result<ArtifactMeta> {
        self.load_json(META_FILE)
    }

    // ── Burn records ──────────────────────────────────────────────────────────

    /// Save linear-model weights (the recorder appends `.mpk.gz`).
    pub fn save_linear(&self, model: &LinearModel<InferBackend>) -> Result<()> {
        let path = self.dir.join(LINEAR_WEIGHTS);
        WeightsRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save weights to '{}'", path.display()))?;
        Ok(())
    }

    /// Rebuild a linear model with `n_features` inputs and load its weights.
    pub fn load_linear(
        &self,
        n_features: usize,
        device:     &<InferBackend as Backend>::Device,
    ) -> Result<LinearModel<InferBackend>> {
        let path   = self.dir.join(LINEAR_WEIGHTS);
        let record = WeightsRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load weights '{}'", path.display()))?;

        let model = LinearModelConfig::new(n_features).init::<InferBackend>(device);
        Ok(model.load_record(record))
    }
}
