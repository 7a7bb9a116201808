// ============================================================
// Layer 5: Hyperparameter Grid Search
// ============================================================
// Enabled per model through the registry's `tuning` block:
//
//   tuning:
//     enabled: true
//     method: grid
//     cv: 5
//     param_grid: { c: [0.1, 1.0, 10.0], epsilon: [0.1, 1.0] }
//
// Every combination of the grid (cartesian product, keys in
// file order) is laid over the base parameters and scored by
// mean RMSE across `cv` contiguous folds of the training
// split:
//
//   fold k:  rows [k·f, (k+1)·f) held out, the rest fitted
//            (the last fold also takes the remainder)
//
// Folds are not shuffled, matching the train/test split.
// The lowest mean RMSE wins; ties keep the earlier combination.
//
// Reference: Bergstra & Bengio (2012) Random Search for
//            Hyper-Parameter Optimization (grid baseline)

use anyhow::{bail, Result};
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use std::ops::Range;

use crate::data::dataset::RegressionData;
use crate::domain::traits::Regressor;
use crate::infra::registry::TuningConfig;
use crate::ml::model::{Model, ModelKind};

#[derive(Debug, Clone)]
pub struct TuningOutcome {
    pub best_params: Value,
    pub best_score:  f64,
    /// (parameters, mean rmse) for every combination, grid order
    pub scores:      Vec<(Value, f64)>,
}

/// Cartesian product of the grid. An empty grid yields one empty combination.
pub fn expand_grid(grid: &IndexMap<String, Vec<Value>>) -> Vec<Mapping> {
    let mut combos = vec![Mapping::new()];

    for (key, values) in grid {
        let mut next = Vec::with_capacity(combos.len() * values.len());
        for combo in &combos {
            for value in values {
                let mut c = combo.clone();
                c.insert(Value::String(key.clone()), value.clone());
                next.push(c);
            }
        }
        combos = next;
    }

    combos
}

/// `base` with every key of `combo` set on top.
pub fn merge_params(base: &Value, combo: &Mapping) -> Value {
    let mut merged = match base {
        Value::Mapping(m) => m.clone(),
        _                 => Mapping::new(),
    };
    for (k, v) in combo {
        merged.insert(k.clone(), v.clone());
    }
    Value::Mapping(merged)
}

/// Held-out row range of each of `k` contiguous folds over `len` rows.
pub fn kfold_ranges(len: usize, k: usize) -> Result<Vec<Range<usize>>> {
    if k < 2 {
        bail!("cross-validation needs at least 2 folds, got {}", k);
    }
    if len < k {
        bail!("cannot make {} folds from {} rows", k, len);
    }

    let fold = len / k;
    Ok((0..k)
        .map(|i| {
            let end = if i == k - 1 { len } else { (i + 1) * fold };
            i * fold..end
        })
        .collect())
}

/// Mean RMSE of `params` across the folds.
pub fn cross_validate(
    kind:   ModelKind,
    params: &Value,
    data:   &RegressionData,
    folds:  &[Range<usize>],
) -> Result<f64> {
    let mut total = 0.0;
    for fold in folds {
        let train = data.rows_except(fold.clone());
        let valid = data.rows(fold.clone());

        let mut model = Model::build(kind, params)?;
        model.fit(train.x(), train.y())?;
        total += model.evaluate_rmse(valid.x(), valid.y())?;
    }
    Ok(total / folds.len() as f64)
}

pub fn grid_search(
    kind:   ModelKind,
    base:   &Value,
    tuning: &TuningConfig,
    data:   &RegressionData,
) -> Result<TuningOutcome> {
    if tuning.method != "grid" {
        bail!("unsupported tuning method '{}' (only 'grid' is available)", tuning.method);
    }

    let folds  = kfold_ranges(data.len(), tuning.cv)?;
    let combos = expand_grid(&tuning.param_grid);
    tracing::info!(
        "Grid search: {} combination(s) x {} folds",
        combos.len(),
        folds.len()
    );

    let mut scores: Vec<(Value, f64)> = Vec::with_capacity(combos.len());
    for (i, combo) in combos.iter().enumerate() {
        let params = merge_params(base, combo);
        let score  = cross_validate(kind, &params, data, &folds)?;
        tracing::info!(
            "  [{}/{}] {} → rmse={:.4}",
            i + 1,
            combos.len(),
            serde_json::to_string(&params).unwrap_or_default(),
            score
        );
        scores.push((params, score));
    }

    let (best_params, best_score) = scores
        .iter()
        .fold(None::<&(Value, f64)>, |best, cur| match best {
            Some(b) if b.1 <= cur.1 => Some(b),
            _                       => Some(cur),
        })
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("grid search produced no candidates"))?;

    Ok(TuningOutcome { best_params, best_score, scores })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    fn grid(yaml: &str) -> IndexMap<String, Vec<Value>> {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_expand_grid_size_and_order() {
        let combos = expand_grid(&grid("c: [0.1, 1.0, 10.0]\nepsilon: [0.1, 1.0]"));
        assert_eq!(combos.len(), 6);
        assert_eq!(combos[0].get("c").and_then(Value::as_f64), Some(0.1));
        assert_eq!(combos[1].get("epsilon").and_then(Value::as_f64), Some(1.0));
        assert_eq!(combos[5].get("c").and_then(Value::as_f64), Some(10.0));
    }

    #[test]
    fn test_empty_grid_is_one_combination() {
        assert_eq!(expand_grid(&IndexMap::new()).len(), 1);
    }

    #[test]
    fn test_merge_overrides_base() {
        let base: Value = serde_yaml::from_str("c: 1.0\nkernel: linear").unwrap();
        let combo       = &expand_grid(&grid("c: [5.0]"))[0];
        let merged      = merge_params(&base, combo);
        assert_eq!(merged["c"].as_f64(), Some(5.0));
        assert_eq!(merged["kernel"].as_str(), Some("linear"));
    }

    #[test]
    fn test_kfold_ranges_cover_everything() {
        let folds = kfold_ranges(11, 3).unwrap();
        assert_eq!(folds, vec![0..3, 3..6, 6..11]);
        assert!(kfold_ranges(10, 1).is_err());
        assert!(kfold_ranges(2, 3).is_err());
    }

    #[test]
    fn test_grid_search_prefers_linear_fit() {
        let x    = Array2::from_shape_fn((40, 1), |(i, _)| i as f64 / 39.0);
        let y: Array1<f64> = x.column(0).mapv(|a| 3.0 * a + 1.0);
        let data = RegressionData::from_arrays(vec!["a".into()], x, y).unwrap();

        let tuning = TuningConfig {
            enabled:    true,
            method:     "grid".into(),
            cv:         4,
            param_grid: grid("c: [0.001, 10.0]"),
        };
        let base: Value = serde_yaml::from_str("kernel: linear\nepsilon: 0.01").unwrap();

        let out = grid_search(ModelKind::Svr, &base, &tuning, &data).unwrap();
        assert_eq!(out.scores.len(), 2);
        assert_eq!(out.best_params["c"].as_f64(), Some(10.0));
        assert!(out.best_score <= out.scores[0].1);
    }

    #[test]
    fn test_unknown_method_rejected() {
        let data = RegressionData::from_arrays(
            vec!["a".into()],
            Array2::zeros((10, 1)),
            Array1::zeros(10),
        )
        .unwrap();
        let tuning = TuningConfig { method: "bayes".into(), ..TuningConfig::default() };
        assert!(grid_search(ModelKind::Svr, &Value::Null, &tuning, &data).is_err());
    }
}
