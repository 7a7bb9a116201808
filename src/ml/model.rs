// ============================================================
// Layer 5: Model Variants
// ============================================================
// The registry names a model by a `model_type` string. That
// string is parsed once into ModelKind, a closed set, and
// every later decision is a match on it:
//
//   "svr"     → SvrRegressor     (linfa-svm)
//   "linear"  → LinearRegressor  (burn, Adam on MSE)
//
// Model wraps the fitted variant so use cases can build,
// train, predict, evaluate, save and restore without caring
// which library sits underneath.
//
// Hyperparameters travel as serde_yaml::Value because that is
// how the registry stores them (`best.parameters`, tuning
// grids). Each variant deserialises its own typed params and
// rejects keys it does not know.
//
// Reference: Rust Book §6 (Enums and Pattern Matching)
//            Rust Book §17 (Trait Objects vs Enums)

use anyhow::{Context, Result};
use ndarray::{Array1, Array2};
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use std::{fmt, path::Path, str::FromStr};

use crate::domain::errors::PipelineError;
use crate::domain::traits::{Persistable, Regressor};
use crate::ml::linear::{LinearParams, LinearRegressor};
use crate::ml::svr::{SvrParams, SvrRegressor};

// ─── ModelKind ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Svr,
    Linear,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::Svr, ModelKind::Linear];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Svr    => "svr",
            ModelKind::Linear => "linear",
        }
    }

    /// Rust path of the implementing type, recorded in the registry.
    pub fn default_class_path(&self) -> &'static str {
        match self {
            ModelKind::Svr    => "bikeshare::ml::svr::SvrRegressor",
            ModelKind::Linear => "bikeshare::ml::linear::LinearRegressor",
        }
    }

    pub fn default_code_path(&self) -> &'static str {
        match self {
            ModelKind::Svr    => "src/ml/svr.rs",
            ModelKind::Linear => "src/ml/linear.rs",
        }
    }
}

impl FromStr for ModelKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svr"    => Ok(ModelKind::Svr),
            "linear" => Ok(ModelKind::Linear),
            _        => Err(PipelineError::UnknownModelType(s.to_string())),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Model ────────────────────────────────────────────────────────────────────
pub enum Model {
    Svr(SvrRegressor),
    Linear(LinearRegressor),
}

impl Model {
    /// Build an unfitted model from registry parameters.
    /// `Null` or an empty mapping means "all defaults".
    pub fn build(kind: ModelKind, params: &Value) -> Result<Self> {
        Ok(match kind {
            ModelKind::Svr    => Model::Svr(SvrRegressor::new(parse_params::<SvrParams>(kind, params)?)),
            ModelKind::Linear => Model::Linear(LinearRegressor::new(parse_params::<LinearParams>(kind, params)?)),
        })
    }

    /// Restore a fitted model from an artifact directory.
    pub fn load(kind: ModelKind, dir: &Path) -> Result<Self> {
        let model = match kind {
            ModelKind::Svr    => Model::Svr(SvrRegressor::load(dir)?),
            ModelKind::Linear => Model::Linear(LinearRegressor::load(dir)?),
        };
        tracing::debug!("Restored {} model from '{}'", kind, dir.display());
        Ok(model)
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Model::Svr(_)    => ModelKind::Svr,
            Model::Linear(_) => ModelKind::Linear,
        }
    }

    /// The full parameter set, defaults filled in.
    pub fn params(&self) -> Result<Value> {
        let value = match self {
            Model::Svr(m)    => serde_yaml::to_value(m.params())?,
            Model::Linear(m) => serde_yaml::to_value(m.params())?,
        };
        Ok(value)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        match self {
            Model::Svr(m)    => m.save(dir),
            Model::Linear(m) => m.save(dir),
        }
    }
}

impl Regressor for Model {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            Model::Svr(m)    => m.fit(x, y),
            Model::Linear(m) => m.fit(x, y),
        }
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Model::Svr(m)    => m.predict(x),
            Model::Linear(m) => m.predict(x),
        }
    }
}

fn parse_params<T: DeserializeOwned + Default>(kind: ModelKind, params: &Value) -> Result<T> {
    match params {
        Value::Null => Ok(T::default()),
        Value::Mapping(m) if m.is_empty() => Ok(T::default()),
        other => serde_yaml::from_value(other.clone())
            .with_context(|| format!("Invalid parameters for {} model", kind)),
    }
}
