// ============================================================
// Layer 5: Training Loop (burn)
// ============================================================
// Full-batch gradient descent for the linear variant.
//
// The bike sharing tables are small (at most ~17k rows and a
// few dozen features), so every step uses the whole training
// matrix; no DataLoader or batching is needed.
//
//   - Training runs on TrainBackend (Autodiff<NdArray>)
//   - model.valid() returns the same weights on InferBackend
//     (NdArray) with the autodiff graph stripped
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{bail, Result};
use burn::{
    backend::ndarray::NdArrayDevice,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};
use ndarray::{Array1, Array2};

use crate::ml::linear::{
    to_tensor, InferBackend, LinearModel, LinearModelConfig, LinearParams, TrainBackend,
};

pub fn run_training(
    x:      &Array2<f64>,
    y:      &Array1<f64>,
    params: &LinearParams,
    device: &NdArrayDevice,
) -> Result<LinearModel<InferBackend>> {
    if params.epochs == 0 {
        bail!("linear model needs at least one epoch");
    }
    if !(params.learning_rate > 0.0) {
        bail!("learning_rate must be positive, got {}", params.learning_rate);
    }

    let (rows, cols) = x.dim();

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: LinearModel<TrainBackend> = LinearModelConfig::new(cols).init(device);
    tracing::info!(
        "Linear model ready: {} features, {} rows, {} epochs",
        cols,
        rows,
        params.epochs
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    let inputs  = to_tensor::<TrainBackend>(x, device);
    let targets = Tensor::<TrainBackend, 1>::from_data(
        TensorData::new(y.iter().map(|&v| v as f32).collect::<Vec<f32>>(), [rows]),
        device,
    )
    .reshape([rows, 1]);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=params.epochs {
        let loss = model.forward_loss(inputs.clone(), targets.clone());

        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
        if !loss_val.is_finite() {
            bail!("training diverged at epoch {} (loss = {})", epoch, loss_val);
        }
        if epoch == 1 || epoch % 50 == 0 || epoch == params.epochs {
            tracing::debug!("epoch {:>4}/{} | mse={:.6}", epoch, params.epochs, loss_val);
        }

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model = optim.step(params.learning_rate, model, grads);
    }

    Ok(model.valid())
}
