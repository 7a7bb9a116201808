// ============================================================
// Layer 5: Support Vector Regressor (linfa-svm)
// ============================================================
// Epsilon-insensitive SVR:
//
//   minimise   ½‖w‖² + C · Σ max(0, |yᵢ − f(xᵢ)| − ε)
//
// Two kernels are offered:
//
//   rbf     k(a, b) = exp(−‖a − b‖² / η)
//   linear  k(a, b) = a · b
//
// linfa parameterises the gaussian kernel by its width η,
// i.e. η = 1 / gamma. When gamma is not given the "scale"
// heuristic is used: gamma = 1 / (n_features · var(X)).
//
// A fitted model keeps its support vectors, so the JSON file
// grows with the training set.
//
// Reference: Smola & Schölkopf (2004) A Tutorial on SVR
//            linfa-svm crate docs

use anyhow::{anyhow, bail, Context, Result};
use linfa::prelude::*;
use linfa_svm::Svm;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::domain::traits::{Persistable, Regressor};

const MODEL_FILE: &str = "svr.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SvrKernel {
    Rbf,
    Linear,
}

/// Hyperparameters, as they appear under `best.parameters`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SvrParams {
    pub c:       f64,
    pub epsilon: f64,
    pub kernel:  SvrKernel,
    /// RBF only; `None` means the "scale" heuristic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gamma:   Option<f64>,
}

impl Default for SvrParams {
    fn default() -> Self {
        Self { c: 1.0, epsilon: 0.1, kernel: SvrKernel::Rbf, gamma: None }
    }
}

impl SvrParams {
    fn validate(&self) -> Result<()> {
        if !(self.c > 0.0) {
            bail!("svr: c must be positive, got {}", self.c);
        }
        if !(self.epsilon >= 0.0) {
            bail!("svr: epsilon must be non-negative, got {}", self.epsilon);
        }
        if let Some(g) = self.gamma {
            if !(g > 0.0) {
                bail!("svr: gamma must be positive, got {}", g);
            }
        }
        Ok(())
    }
}

/// Gaussian kernel width for `x`: 1/gamma, or n_features · var(X).
pub fn kernel_width(x: &Array2<f64>, gamma: Option<f64>) -> f64 {
    if let Some(g) = gamma {
        return 1.0 / g;
    }
    let n     = x.len() as f64;
    let mean  = x.sum() / n;
    let var   = x.mapv(|v| (v - mean).powi(2)).sum() / n;
    let width = x.ncols() as f64 * var;
    if width > 0.0 && width.is_finite() { width } else { 1.0 }
}

pub struct SvrRegressor {
    params: SvrParams,
    fitted: Option<Svm<f64, f64>>,
}

impl SvrRegressor {
    pub fn new(params: SvrParams) -> Self {
        Self { params, fitted: None }
    }

    pub fn params(&self) -> &SvrParams {
        &self.params
    }
}

impl Regressor for SvrRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.params.validate()?;
        if x.nrows() != y.len() {
            bail!("x has {} rows but y has {}", x.nrows(), y.len());
        }
        if x.nrows() == 0 {
            bail!("cannot fit on an empty training set");
        }

        let builder = Svm::<f64, f64>::params().c_svr(self.params.c, Some(self.params.epsilon));
        let builder = match self.params.kernel {
            SvrKernel::Rbf    => builder.gaussian_kernel(kernel_width(x, self.params.gamma)),
            SvrKernel::Linear => builder.linear_kernel(),
        };

        tracing::debug!(
            "Fitting SVR on {}x{} (c={}, epsilon={}, kernel={:?})",
            x.nrows(),
            x.ncols(),
            self.params.c,
            self.params.epsilon,
            self.params.kernel
        );

        let dataset = Dataset::new(x.clone(), y.clone());
        let model   = builder.fit(&dataset).context("SVR training failed")?;
        self.fitted = Some(model);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let model = self
            .fitted
            .as_ref()
            .ok_or_else(|| anyhow!("SVR has not been fitted"))?;
        Ok(model.predict(x))
    }
}

#[derive(Serialize)]
struct SvrFileRef<'a> {
    params: &'a SvrParams,
    model:  &'a Svm<f64, f64>,
}

#[derive(Deserialize)]
struct SvrFile {
    params: SvrParams,
    model:  Svm<f64, f64>,
}

impl Persistable for SvrRegressor {
    /// Writes `svr.json` into `dir`.
    fn save(&self, dir: &Path) -> Result<()> {
        let model = self
            .fitted
            .as_ref()
            .ok_or_else(|| anyhow!("cannot save an unfitted SVR"))?;

        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        let path = dir.join(MODEL_FILE);
        let file = fs::File::create(&path)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;

        serde_json::to_writer(
            std::io::BufWriter::new(file),
            &SvrFileRef { params: &self.params, model },
        )?;
        tracing::debug!("Saved SVR to '{}'", path.display());
        Ok(())
    }

    fn load(dir: &Path) -> Result<Self> {
        let path  = dir.join(MODEL_FILE);
        let file  = fs::File::open(&path)
            .with_context(|| format!("Cannot open '{}'", path.display()))?;
        let saved: SvrFile = serde_json::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("Malformed SVR file '{}'", path.display()))?;

        Ok(Self { params: saved.params, fitted: Some(saved.model) })
    }
}
