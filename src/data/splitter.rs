// ============================================================
// Layer 4: Train/Test Splitter
// ============================================================
// Cuts an ordered sequence into a training head and a test
// tail. Nothing is shuffled: the bike sharing records are in
// time order, and testing on the most recent rows is the point.
//
//   rows:   [0 ............ split_at) [split_at ...... len)
//            └── train ───────────┘   └── test ─────────┘
//
//   split_at = floor(len * train_fraction)
//
// Reproducibility therefore depends only on the input order.
//
// Reference: Rust Book §8 (Vectors), Vec::split_off

use anyhow::Result;

use crate::domain::errors::PipelineError;
use crate::domain::table::Table;

/// Allowed gap between `train + test` and 1.0
pub const SUM_TOLERANCE: f64 = 1e-9;

/// A validated (train, test) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitFractions {
    train: f64,
    test:  f64,
}

impl SplitFractions {
    /// Both fractions must lie in [0, 1] and add up to 1.
    pub fn new(train: f64, test: f64) -> std::result::Result<Self, PipelineError> {
        let sum = train + test;
        let in_range = |f: f64| (0.0..=1.0).contains(&f);

        if !in_range(train) || !in_range(test) || (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(PipelineError::InvalidSplits { train, test, sum });
        }
        Ok(Self { train, test })
    }

    pub fn train(&self) -> f64 {
        self.train
    }

    pub fn test(&self) -> f64 {
        self.test
    }

    /// Index of the first test row for a sequence of `len` items.
    pub fn split_index(&self, len: usize) -> usize {
        ((len as f64 * self.train).floor() as usize).min(len)
    }
}

impl Default for SplitFractions {
    fn default() -> Self {
        Self { train: 0.85, test: 0.15 }
    }
}

/// Split `items` at `floor(len * train_fraction)`, keeping order.
pub fn split_contiguous<T>(mut items: Vec<T>, fractions: SplitFractions) -> (Vec<T>, Vec<T>) {
    let total    = items.len();
    let split_at = fractions.split_index(total);

    // split_off(n) leaves [0..n) in place and returns [n..total)
    let test = items.split_off(split_at);

    tracing::debug!(
        "Split {} rows: {} train, {} test",
        total,
        items.len(),
        test.len()
    );

    (items, test)
}

/// Split a table's rows; both halves keep the full header.
pub fn split_table(table: &Table, fractions: SplitFractions) -> Result<(Table, Table)> {
    let (train, test) = split_contiguous(table.rows().to_vec(), fractions);
    Ok((
        Table::new(table.columns().to_vec(), train)?,
        Table::new(table.columns().to_vec(), test)?,
    ))
}
