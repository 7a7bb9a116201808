// ============================================================
// Layer 5: Linear Regressor (burn)
// ============================================================
// One dense layer, y = x·W + b, trained with MSE:
//
//   x, y standardised   → (v − mean) / std per column
//   fit                 → full-batch Adam, see trainer.rs
//   predict             → ŷ · std_y + mean_y
//
// The burn record holds the layer weights; the column means
// and standard deviations go to linear_meta.json beside it.
//
// Reference: Burn Book §3 (Building Blocks)

use anyhow::{anyhow, bail, Context, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    nn::{
        loss::{MseLoss, Reduction},
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::traits::{Persistable, Regressor};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::trainer::run_training;

pub type TrainBackend = Autodiff<NdArray>;
pub type InferBackend = NdArray;

const SCALING_FILE: &str = "linear_meta.json";

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally. Do not add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct LinearModelConfig {
    pub n_features: usize,
}

impl LinearModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> LinearModel<B> {
        LinearModel {
            head: LinearConfig::new(self.n_features, 1).init(device),
        }
    }
}

/// y = x·w + b, one output.
#[derive(Module, Debug)]
pub struct LinearModel<B: Backend> {
    pub head: Linear<B>,
}

impl<B: Backend> LinearModel<B> {
    /// x: [batch, n_features] → [batch, 1]
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        self.head.forward(x)
    }

    pub fn forward_loss(&self, x: Tensor<B, 2>, y: Tensor<B, 2>) -> Tensor<B, 1>
    where
        B: AutodiffBackend,
    {
        MseLoss::new().forward(self.forward(x), y, Reduction::Mean)
    }
}

// ─── Hyperparameters ──────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinearParams {
    /// Full-batch Adam steps
    pub epochs:        usize,
    pub learning_rate: f64,
}

impl Default for LinearParams {
    fn default() -> Self {
        Self { epochs: 300, learning_rate: 0.05 }
    }
}

// ─── Standardisation ──────────────────────────────────────────────────────────
// Raw targets run into the thousands (daily counts); Adam on
// unscaled data with a fixed learning rate barely moves. Both
// sides are z-scored for training and predictions are mapped
// back with the stored statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaling {
    pub x_mean: Vec<f64>,
    pub x_std:  Vec<f64>,
    pub y_mean: f64,
    pub y_std:  f64,
}

impl Scaling {
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>) -> Result<Self> {
        if x.nrows() == 0 {
            bail!("cannot fit on an empty training set");
        }
        let x_mean = x.mean_axis(Axis(0)).context("empty feature matrix")?;
        let x_std  = x.std_axis(Axis(0), 0.0);
        let y_mean = y.mean().context("empty target")?;
        let y_std  = y.std(0.0);

        Ok(Self {
            x_mean: x_mean.to_vec(),
            x_std:  x_std.iter().map(|&s| non_zero(s)).collect(),
            y_mean,
            y_std:  non_zero(y_std),
        })
    }

    pub fn n_features(&self) -> usize {
        self.x_mean.len()
    }

    pub fn scale_x(&self, x: &Array2<f64>) -> Array2<f64> {
        let mean = Array1::from(self.x_mean.clone());
        let std  = Array1::from(self.x_std.clone());
        (x - &mean) / &std
    }

    pub fn scale_y(&self, y: &Array1<f64>) -> Array1<f64> {
        (y - self.y_mean) / self.y_std
    }

    pub fn unscale_y(&self, y: Array1<f64>) -> Array1<f64> {
        y * self.y_std + self.y_mean
    }
}

fn non_zero(s: f64) -> f64 {
    if s > 0.0 { s } else { 1.0 }
}

// ─── LinearRegressor ──────────────────────────────────────────────────────────
struct FittedLinear {
    model:   LinearModel<InferBackend>,
    scaling: Scaling,
}

/// Linear regression trained by gradient descent with burn.
pub struct LinearRegressor {
    params: LinearParams,
    fitted: Option<FittedLinear>,
    device: NdArrayDevice,
}

impl LinearRegressor {
    pub fn new(params: LinearParams) -> Self {
        Self { params, fitted: None, device: NdArrayDevice::default() }
    }

    pub fn params(&self) -> &LinearParams {
        &self.params
    }
}

impl Regressor for LinearRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() != y.len() {
            bail!("x has {} rows but y has {}", x.nrows(), y.len());
        }
        let scaling = Scaling::fit(x, y)?;
        let model   = run_training(
            &scaling.scale_x(x),
            &scaling.scale_y(y),
            &self.params,
            &self.device,
        )?;
        self.fitted = Some(FittedLinear { model, scaling });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or_else(|| anyhow!("linear model has not been fitted"))?;

        if x.ncols() != fitted.scaling.n_features() {
            bail!(
                "model expects {} features, got {}",
                fitted.scaling.n_features(),
                x.ncols()
            );
        }

        let scaled = fitted.scaling.scale_x(x);
        let input  = to_tensor::<InferBackend>(&scaled, &self.device);
        let output = fitted.model.forward(input);

        let values: Vec<f32> = output
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("cannot read predictions: {e:?}"))?;

        let preds = Array1::from(values.into_iter().map(f64::from).collect::<Vec<_>>());
        Ok(fitted.scaling.unscale_y(preds))
    }
}

impl Persistable for LinearRegressor {
    /// Writes `linear.mpk.gz` and `linear_meta.json` into `dir`.
    fn save(&self, dir: &Path) -> Result<()> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or_else(|| anyhow!("cannot save an unfitted linear model"))?;

        let ckpt = CheckpointManager::create(dir)?;
        ckpt.save_linear(&fitted.model)?;
        ckpt.save_json(SCALING_FILE, &SavedLinear {
            params:  self.params.clone(),
            scaling: fitted.scaling.clone(),
        })
    }

    fn load(dir: &Path) -> Result<Self> {
        let ckpt  = CheckpointManager::open(dir)?;
        let saved: SavedLinear = ckpt.load_json(SCALING_FILE)?;

        let device = NdArrayDevice::default();
        let model  = ckpt.load_linear(saved.scaling.n_features(), &device)?;

        Ok(Self {
            params: saved.params,
            fitted: Some(FittedLinear { model, scaling: saved.scaling }),
            device,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct SavedLinear {
    params:  LinearParams,
    scaling: Scaling,
}

/// Row-major copy of an f64 matrix into an f32 tensor.
pub fn to_tensor<B: Backend>(x: &Array2<f64>, device: &B::Device) -> Tensor<B, 2> {
    let (rows, cols) = x.dim();
    let flat: Vec<f32> = x.iter().map(|&v| v as f32).collect();
    Tensor::<B, 2>::from_data(TensorData::new(flat, [rows, cols]), device)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn line_data() -> (Array2<f64>, Array1<f64>) {
        // y = 3·a − 2·b + 100
        let x = Array2::from_shape_fn((40, 2), |(i, j)| {
            if j == 0 { i as f64 } else { ((i * 7) % 11) as f64 }
        });
        let y = x.rows().into_iter().map(|r| 3.0 * r[0] - 2.0 * r[1] + 100.0).collect();
        (x, y)
    }

    #[test]
    fn test_scaling_inverts() {
        let (x, y) = line_data();
        let s      = Scaling::fit(&x, &y).unwrap();
        let back   = s.unscale_y(s.scale_y(&y));
        for (a, b) in back.iter().zip(y.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_constant_column_does_not_divide_by_zero() {
        let x = array![[1.0, 5.0], [2.0, 5.0]];
        let y = array![1.0, 2.0];
        let s = Scaling::fit(&x, &y).unwrap();
        assert_eq!(s.x_std[1], 1.0);
        assert!(s.scale_x(&x).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_learns_a_line() {
        let (x, y) = line_data();
        let mut m  = LinearRegressor::new(LinearParams { epochs: 400, learning_rate: 0.05 });
        m.fit(&x, &y).unwrap();
        // Well under the spread of the target (std ≈ 35).
        let rmse = m.evaluate_rmse(&x, &y).unwrap();
        assert!(rmse < 0.1 * y.std(0.0), "rmse = {rmse}");
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let m = LinearRegressor::new(LinearParams::default());
        assert!(m.predict(&array![[1.0]]).is_err());
    }

    #[test]
    fn test_save_and_restore() {
        let dir    = tempfile::tempdir().unwrap();
        let (x, y) = line_data();
        let mut m  = LinearRegressor::new(LinearParams { epochs: 50, learning_rate: 0.05 });
        m.fit(&x, &y).unwrap();
        m.save(dir.path()).unwrap();

        let restored = LinearRegressor::load(dir.path()).unwrap();
        let before   = m.predict(&x).unwrap();
        let after    = restored.predict(&x).unwrap();
        for (a, b) in before.iter().zip(after.iter()) {
            assert!((a - b).abs() < 1e-6 * a.abs().max(1.0));
        }
        assert_eq!(restored.params().epochs, 50);
    }
}
