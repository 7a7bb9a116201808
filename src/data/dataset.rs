// ============================================================
// Layer 4: Regression Data
// ============================================================
// A processed table turned into what the models consume:
//
//   x  [rows, features]  every column but the target, as f64
//   y  [rows]            the target column
//
// The feature order is recorded so a test split, or a later
// evaluation, can lay its columns out exactly like training did.
//
// Reference: ndarray docs (Array2, slicing with s![])

use anyhow::{bail, Context, Result};
use ndarray::{s, Array1, Array2};
use std::ops::Range;

use crate::domain::table::Table;

/// Numeric feature matrix plus target vector, built from a Table.
#[derive(Debug, Clone)]
pub struct RegressionData {
    features: Vec<String>,
    x:        Array2<f64>,
    y:        Array1<f64>,
}

impl RegressionData {
    /// Every column except `target` becomes a feature, in table order.
    pub fn from_table(table: &Table, target: &str) -> Result<Self> {
        let features: Vec<String> = table
            .columns()
            .iter()
            .filter(|c| c.as_str() != target)
            .cloned()
            .collect();
        Self::with_features(table, target, &features)
    }

    /// Use exactly `features`, in that order. Lets a test table be laid
    /// out the way the model saw its training table.
    pub fn with_features(table: &Table, target: &str, features: &[String]) -> Result<Self> {
        if features.is_empty() {
            bail!("no feature columns left besides target '{}'", target);
        }

        let y = Array1::from(
            table
                .numeric_column(target)
                .with_context(|| format!("Target column '{}'", target))?,
        );

        let mut x = Array2::<f64>::zeros((table.len(), features.len()));
        for (j, name) in features.iter().enumerate() {
            let col = table.numeric_column(name)?;
            for (i, v) in col.into_iter().enumerate() {
                x[(i, j)] = v;
            }
        }

        Ok(Self { features: features.to_vec(), x, y })
    }

    pub fn from_arrays(features: Vec<String>, x: Array2<f64>, y: Array1<f64>) -> Result<Self> {
        if x.nrows() != y.len() || x.ncols() != features.len() {
            bail!(
                "shape mismatch: x is {:?}, y has {}, {} feature names",
                x.dim(),
                y.len(),
                features.len()
            );
        }
        Ok(Self { features, x, y })
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn x(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Contiguous row block.
    pub fn rows(&self, range: Range<usize>) -> RegressionData {
        RegressionData {
            features: self.features.clone(),
            x:        self.x.slice(s![range.clone(), ..]).to_owned(),
            y:        self.y.slice(s![range]).to_owned(),
        }
    }

    /// Every row outside `range`, order preserved.
    pub fn rows_except(&self, range: Range<usize>) -> RegressionData {
        let keep: Vec<usize> = (0..self.len()).filter(|i| !range.contains(i)).collect();
        RegressionData {
            features: self.features.clone(),
            x:        self.x.select(ndarray::Axis(0), &keep),
            y:        self.y.select(ndarray::Axis(0), &keep),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(
            vec!["temp".into(), "cnt".into(), "hum".into()],
            vec![
                vec!["0.1".into(), "10".into(), "0.5".into()],
                vec!["0.2".into(), "20".into(), "0.6".into()],
                vec!["0.3".into(), "30".into(), "0.7".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_target_is_separated() {
        let d = RegressionData::from_table(&table(), "cnt").unwrap();
        assert_eq!(d.features(), &["temp", "hum"].map(String::from));
        assert_eq!(d.x().dim(), (3, 2));
        assert_eq!(d.y().to_vec(), vec![10.0, 20.0, 30.0]);
        assert_eq!(d.x()[(1, 1)], 0.6);
    }

    #[test]
    fn test_feature_order_is_respected() {
        let order = ["hum".to_string(), "temp".to_string()];
        let d     = RegressionData::with_features(&table(), "cnt", &order).unwrap();
        assert_eq!(d.x()[(0, 0)], 0.5);
    }

    #[test]
    fn test_missing_target_fails() {
        assert!(RegressionData::from_table(&table(), "registered").is_err());
    }

    #[test]
    fn test_row_blocks() {
        let d = RegressionData::from_table(&table(), "cnt").unwrap();
        assert_eq!(d.rows(1..3).y().to_vec(), vec![20.0, 30.0]);
        assert_eq!(d.rows_except(1..2).y().to_vec(), vec![10.0, 30.0]);
    }
}
