// ============================================================
// Layer 2: SplitUseCase
// ============================================================
// Cuts each processed table into a training head and a test
// tail, in file order:
//
//   Step 1: Check the processed CSVs exist     (Layer 4 - data)
//   Step 2: Split at floor(len · train)        (Layer 4 - data)
//   Step 3: Write train_<csv> and test_<csv>   (Layer 4 - data)

use anyhow::Result;

use crate::data::{
    loader::{check_paths_exist, write_csv, CsvLoader},
    splitter::{split_table, SplitFractions},
};
use crate::domain::traits::TableSource;
use crate::infra::config::{DataConfig, DatasetVariant};

pub struct SplitUseCase {
    config:    DataConfig,
    fractions: SplitFractions,
}

impl SplitUseCase {
    pub fn new(config: DataConfig, fractions: SplitFractions) -> Self {
        Self { config, fractions }
    }

    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Inputs ───────────────────────────────────────────────────
        let inputs: Vec<_> = DatasetVariant::ALL
            .iter()
            .map(|v| cfg.processed_data_path(*v))
            .collect();
        check_paths_exist(&inputs)?;
        cfg.ensure_dirs()?;

        for variant in DatasetVariant::ALL {
            let table = CsvLoader::new(cfg.processed_data_path(variant)).load()?;

            // ── Step 2: Split ────────────────────────────────────────────────
            let (train, test) = split_table(&table, self.fractions)?;

            // ── Step 3: Persist ──────────────────────────────────────────────
            write_csv(&train, &cfg.train_data_path(variant))?;
            write_csv(&test, &cfg.test_data_path(variant))?;

            tracing::info!(
                "{}: {} train / {} test rows ({:.2}/{:.2})",
                variant,
                train.len(),
                test.len(),
                self.fractions.train(),
                self.fractions.test()
            );
        }
        Ok(())
    }
}
