// ============================================================
// Layer 6: Model Registry (configs/models.yaml)
// ============================================================
// A flat, ordered mapping from model name to everything the
// pipeline knows about that model:
//
//   svr_baseline:
//     model_type: svr
//     class_path: bikeshare::ml::svr::SvrRegressor
//     code_path:  src/ml/svr.rs
//     best:       { path, parameters, metric, value, variant, trained_at }
//     tuning:     { enabled, method, cv, param_grid }
//
// Entries are held as raw YAML values and only parsed into a
// ModelEntry when asked for. Keys the pipeline does not know
// about survive every write, and `update_best` replaces the
// `best` key of one entry and nothing else.
//
// The whole file is written back on every mutation. Writes go
// to a sibling temp file that is then renamed over the registry,
// so a crash never leaves a half-written YAML. Two processes
// updating the registry at once can still lose one update;
// nothing here locks.
//
// IndexMap keeps the key order of the file on round trips.
//
// Reference: Rust Book §8 (HashMaps), serde_yaml docs

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::errors::PipelineError;
use crate::ml::model::ModelKind;

const BEST_KEY: &str = "best";

// ─── Entry types ──────────────────────────────────────────────────────────────

/// The best training outcome recorded for a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BestRecord {
    /// Artifact directory of the run
    pub path:       String,
    pub parameters: Value,
    pub metric:     String,
    pub value:      Option<f64>,
    /// Dataset variant the run was trained and scored on
    pub variant:    Option<String>,
    pub trained_at: String,
}

impl Default for BestRecord {
    fn default() -> Self {
        Self {
            path:       String::new(),
            parameters: Value::Mapping(Mapping::new()),
            metric:     "rmse".to_string(),
            value:      None,
            variant:    None,
            trained_at: String::new(),
        }
    }
}

impl BestRecord {
    /// No run has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.value.is_none() || self.path.is_empty()
    }

    /// RMSE is an error metric: lower wins. Scores from different
    /// variants are not comparable, so a run on another variant
    /// (or a record without one) always takes over.
    pub fn is_improved_by(&self, value: f64, variant: &str) -> bool {
        if self.variant.as_deref() != Some(variant) {
            return true;
        }
        match self.value {
            None       => true,
            Some(best) => value < best || self.path.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    pub enabled:    bool,
    pub method:     String,
    /// Number of contiguous folds
    pub cv:         usize,
    pub param_grid: IndexMap<String, Vec<Value>>,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            enabled:    false,
            method:     "grid".to_string(),
            cv:         5,
            param_grid: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub model_type: String,
    pub class_path: String,
    pub code_path:  String,
    #[serde(default)]
    pub best:       BestRecord,
    #[serde(default)]
    pub tuning:     TuningConfig,
}

impl ModelEntry {
    pub fn kind(&self) -> Result<ModelKind> {
        Ok(self.model_type.parse::<ModelKind>()?)
    }
}

// ─── ModelRegistry ────────────────────────────────────────────────────────────

pub struct ModelRegistry {
    path:   PathBuf,
    models: IndexMap<String, Value>,
}

impl ModelRegistry {
    /// Read the registry. A missing or empty file is an empty registry.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let models = if path.exists() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Cannot read registry '{}'", path.display()))?;
            if text.trim().is_empty() {
                IndexMap::new()
            } else {
                serde_yaml::from_str(&text)
                    .with_context(|| format!("Malformed registry '{}'", path.display()))?
            }
        } else {
            IndexMap::new()
        };

        tracing::debug!("Registry '{}': {} model(s)", path.display(), models.len());
        Ok(Self { path, models })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// The entry exactly as stored, including keys ModelEntry ignores.
    pub fn raw(&self, name: &str) -> Result<&Value> {
        self.models.get(name).ok_or_else(|| self.not_found(name))
    }

    pub fn get(&self, name: &str) -> Result<ModelEntry> {
        let raw = self.raw(name)?;
        serde_yaml::from_value(raw.clone()).with_context(|| {
            format!("Malformed entry '{}' in registry '{}'", name, self.path.display())
        })
    }

    /// Add a model with an empty best record and tuning disabled.
    pub fn register(
        &mut self,
        name:       &str,
        kind:       ModelKind,
        class_path: Option<&str>,
        code_path:  Option<&str>,
        overwrite:  bool,
    ) -> Result<ModelEntry> {
        if self.models.contains_key(name) && !overwrite {
            return Err(PipelineError::ModelExists {
                name:     name.to_string(),
                registry: self.path.clone(),
            }
            .into());
        }

        let entry = ModelEntry {
            model_type: kind.to_string(),
            class_path: class_path.unwrap_or(kind.default_class_path()).to_string(),
            code_path:  code_path.unwrap_or(kind.default_code_path()).to_string(),
            best:       BestRecord::default(),
            tuning:     TuningConfig::default(),
        };
        // insert() on an existing key keeps its position
        self.models.insert(name.to_string(), serde_yaml::to_value(&entry)?);
        self.save()?;

        tracing::info!("Registered model '{}' ({})", name, kind);
        Ok(entry)
    }

    /// Replace exactly `name`'s best record and persist.
    pub fn update_best(&mut self, name: &str, best: BestRecord) -> Result<()> {
        let record = serde_yaml::to_value(&best)?;
        let path   = self.path.clone();
        let entry  = self.models.get_mut(name).ok_or_else(|| PipelineError::ModelNotFound {
            name:     name.to_string(),
            registry: path.clone(),
        })?;
        let mapping = entry.as_mapping_mut().with_context(|| {
            format!("Entry '{}' in registry '{}' is not a mapping", name, path.display())
        })?;
        mapping.insert(Value::String(BEST_KEY.to_string()), record);
        self.save()
    }

    fn not_found(&self, name: &str) -> anyhow::Error {
        PipelineError::ModelNotFound {
            name:     name.to_string(),
            registry: self.path.clone(),
        }
        .into()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }

        let yaml = serde_yaml::to_string(&self.models)?;
        let tmp  = tmp_path(&self.path);
        fs::write(&tmp, yaml)
            .with_context(|| format!("Cannot write '{}'", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Cannot replace registry '{}'", self.path.display()))?;

        tracing::debug!("Saved registry '{}'", self.path.display());
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "models.yaml".into());
    name.push(".tmp");
    path.with_file_name(name)
}
