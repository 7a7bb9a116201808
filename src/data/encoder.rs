// ============================================================
// Layer 4: One-Hot Encoder
// ============================================================
// Replaces each categorical column with one 0/1 indicator
// column per observed category:
//
//   weathersit          weathersit_1  weathersit_2  weathersit_3
//   ──────────    ──►   ────────────  ────────────  ────────────
//       2                    0             1             0
//       1                    1             0             0
//
// Categories are learnt by `fit` and sorted numerically when
// every value parses as a number ("2" < "10"), lexically
// otherwise. Source columns are dropped and the indicators are
// appended at the right edge, in (column, category) order.
//
// At transform time a category that was never seen during fit
// produces an all-zero indicator row instead of an error, so
// the fitted encoder can be reapplied to new data safely.
//
// Reference: Rust Book §8 (Collections)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fs, path::Path};

use crate::domain::table::Table;
use crate::domain::traits::Persistable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// Source columns, in the order they were given to `fit`
    columns: Vec<String>,

    /// Sorted categories for each source column
    categories: Vec<Vec<String>>,
}

impl OneHotEncoder {
    /// Learn the category set of every listed column.
    pub fn fit(table: &Table, columns: &[String]) -> Result<Self> {
        let mut categories = Vec::with_capacity(columns.len());

        for col in columns {
            let mut seen: Vec<String> = table
                .column(col)?
                .into_iter()
                .map(|v| v.trim().to_string())
                .collect();
            seen.sort_by(|a, b| compare_categories(a, b));
            seen.dedup();
            categories.push(seen);
        }

        Ok(Self { columns: columns.to_vec(), categories })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.categories[i].as_slice())
    }

    /// Indicator column names in output order, e.g. `season_1`.
    pub fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(&self.categories)
            .flat_map(|(col, cats)| cats.iter().map(move |c| format!("{col}_{c}")))
            .collect()
    }

    /// Apply the fitted encoding to a table with the same source columns.
    pub fn transform(&self, table: &Table) -> Result<Table> {
        let mut out = table.drop_columns(&self.columns)?;

        for (col, cats) in self.columns.iter().zip(&self.categories) {
            let values = table.column(col)?;

            for cat in cats {
                let indicator: Vec<String> = values
                    .iter()
                    .map(|v| if v.trim() == cat { "1" } else { "0" }.to_string())
                    .collect();
                out.push_column(format!("{col}_{cat}"), indicator)?;
            }

            let unknown = values
                .iter()
                .filter(|v| !cats.iter().any(|c| c == v.trim()))
                .count();
            if unknown > 0 {
                tracing::debug!(
                    "Column '{}': {} rows with unseen categories encoded as all zeros",
                    col,
                    unknown
                );
            }
        }

        Ok(out)
    }
}

impl Persistable for OneHotEncoder {
    fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Cannot write encoder to '{}'", path.display()))
    }

    fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read encoder from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Fit on `table` and transform it in one go.
pub fn one_hot_encode(table: &Table, columns: &[String]) -> Result<(Table, OneHotEncoder)> {
    let encoder = OneHotEncoder::fit(table, columns)?;
    let encoded = encoder.transform(table)?;
    Ok((encoded, encoder))
}

fn compare_categories(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
