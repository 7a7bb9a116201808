// ============================================================
// Layer 3: Core Traits (Abstractions)
// ============================================================
// The seams between layers:
//
//   TableSource  anything that yields a Table
//                (CsvLoader today)
//   Regressor    fit / predict / evaluate over ndarray
//                matrices; implemented by every model
//                variant and by the Model enum that
//                dispatches to them
//   Persistable  save to and restore from a path on disk
//                (model variants, the fitted one-hot
//                encoder)
//
// Programming against these keeps the use cases ignorant
// of whether a model comes from linfa or burn.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)
//            Rust Book §17 (Object Oriented Patterns)

use anyhow::Result;
use ndarray::{Array1, Array2};
use std::path::Path;

use crate::domain::scoring::rmse;
use crate::domain::table::Table;

// ─── TableSource ──────────────────────────────────────────────────────────────
/// Any component that can produce a table.
pub trait TableSource {
    fn load(&self) -> Result<Table>;
}

// ─── Regressor ────────────────────────────────────────────────────────────────
/// A trainable single-target regression model.
///
/// `x` is `[n_samples, n_features]`, `y` is `[n_samples]`.
pub trait Regressor {
    /// Fit on the given samples, replacing any previous fit.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict one value per row of `x`. Fails if not fitted.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Root mean squared error of `predict(x)` against `y`.
    fn evaluate_rmse(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let preds = self.predict(x)?;
        rmse(y, &preds)
    }
}

// ─── Persistable ──────────────────────────────────────────────────────────────
/// Any component whose state can be saved and restored from disk.
///
/// Implementations:
///   - SvrRegressor    → `svr.json` inside the given directory
///   - LinearRegressor → burn record + `linear_meta.json`
///   - OneHotEncoder   → a single JSON file at the given path
pub trait Persistable: Sized {
    fn save(&self, path: &Path) -> Result<()>;

    fn load(path: &Path) -> Result<Self>;
}
