// ============================================================
// Layer 2: FeaturesUseCase
// ============================================================
// Turns the raw hourly and daily tables into model-ready
// feature tables:
//
//   Step 1: Check the raw CSVs exist       (Layer 4 - data)
//   Step 2: Drop unused columns            (dteday, casual, registered)
//   Step 3: One-hot encode categoricals    (weathersit, season)
//   Step 4: Rename indicator columns       (weathersit_1 → very_good_weather, ...)
//   Step 5: Cyclic-encode periodic columns (hr, weekday, mnth)
//   Step 6: Write processed CSV + encoder  (Layer 4 - data)
//
// `casual` and `registered` add up to `cnt`, so keeping them
// would leak the target.

use anyhow::{Context, Result};

use crate::data::{
    cyclic::cyclic_encode,
    encoder::{one_hot_encode, OneHotEncoder},
    loader::{check_paths_exist, write_csv, CsvLoader},
};
use crate::domain::table::Table;
use crate::domain::traits::{Persistable, TableSource};
use crate::infra::config::{DataConfig, DatasetVariant, FeatureConfig};

/// Steps 2–5 on one table. Pure; no file access.
pub fn extract_features(
    table:    &Table,
    features: &FeatureConfig,
    variant:  DatasetVariant,
) -> Result<(Table, OneHotEncoder)> {
    let dropped = table.drop_columns(&features.drop_columns)?;

    let (mut encoded, encoder) = one_hot_encode(&dropped, &features.categorical)?;
    tracing::debug!("{}: indicator columns {:?}", variant, encoder.feature_names());
    encoded.rename_columns(&features.rename)?;

    let processed = cyclic_encode(
        &encoded,
        features.cyclic.periods(variant),
        &features.offsets,
        features.drop_cyclic_sources,
    )?;

    Ok((processed, encoder))
}

pub struct FeaturesUseCase {
    config: DataConfig,
}

impl FeaturesUseCase {
    pub fn new(config: DataConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Inputs ───────────────────────────────────────────────────
        let inputs: Vec<_> = DatasetVariant::ALL.iter().map(|v| cfg.raw_data_path(*v)).collect();
        check_paths_exist(&inputs)?;
        cfg.ensure_dirs()?;

        for variant in DatasetVariant::ALL {
            let src   = cfg.raw_data_path(variant);
            let table = CsvLoader::new(&src).load()?;

            // ── Steps 2–5 ────────────────────────────────────────────────────
            let (processed, encoder) = extract_features(&table, &cfg.features, variant)
                .with_context(|| format!("Feature extraction failed for '{}'", src.display()))?;

            // ── Step 6: Persist ──────────────────────────────────────────────
            let dst = cfg.processed_data_path(variant);
            write_csv(&processed, &dst)?;
            encoder.save(&cfg.encoder_path(variant))?;

            tracing::info!(
                "{}: {} rows, {} → {} columns, written to '{}'",
                variant,
                processed.len(),
                table.columns().len(),
                processed.columns().len(),
                dst.display()
            );
        }
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::errors::PipelineError;
    use crate::infra::config::tests::yaml_for;
    use std::{fs, path::Path};

    /// Synthetic raw table shaped like the UCI files. `cnt` follows
    /// temperature so models have something to learn.
    pub(crate) fn raw_csv(variant: DatasetVariant, rows: usize) -> String {
        let hourly = variant == DatasetVariant::Hourly;
        let mut out = String::from("instant,dteday,season,yr,mnth,");
        if hourly {
            out.push_str("hr,");
        }
        out.push_str("holiday,weekday,workingday,weathersit,temp,atemp,hum,windspeed,casual,registered,cnt\n");

        for i in 0..rows {
            let mnth       = i % 12 + 1;
            let season     = (mnth - 1) / 3 + 1;
            let weekday    = i % 7;
            let weathersit = i % 3 + 1;
            let temp       = 0.2 + 0.6 * ((i * 37) % 100) as f64 / 100.0;
            let hum        = 0.3 + 0.4 * ((i * 13) % 50) as f64 / 50.0;
            let cnt        = (1000.0 * temp + 50.0 * (3 - weathersit) as f64).round() as i64;
            let casual     = cnt / 5;

            out.push_str(&format!("{},2011-01-{:02},{},0,{},", i + 1, i % 28 + 1, season, mnth));
            if hourly {
                out.push_str(&format!("{},", i % 24));
            }
            out.push_str(&format!(
                "0,{},{},{},{:.3},{:.3},{:.3},0.1,{},{},{}\n",
                weekday,
                u8::from(weekday != 0 && weekday != 6),
                weathersit,
                temp,
                temp,
                hum,
                casual,
                cnt - casual,
                cnt
            ));
        }
        out
    }

    /// Config rooted at `root` with raw CSVs already extracted.
    pub(crate) fn config_with_raw(root: &Path, rows: usize) -> DataConfig {
        let cfg = DataConfig::from_yaml_str(&yaml_for(root)).unwrap();
        fs::create_dir_all(cfg.extracted_path()).unwrap();
        for variant in DatasetVariant::ALL {
            fs::write(cfg.raw_data_path(variant), raw_csv(variant, rows)).unwrap();
        }
        cfg
    }

    #[test]
    fn test_extract_features_columns() {
        let dir   = tempfile::tempdir().unwrap();
        let cfg   = config_with_raw(dir.path(), 24);
        let table = CsvLoader::new(cfg.raw_data_path(DatasetVariant::Hourly)).load().unwrap();

        let (out, encoder) = extract_features(&table, &cfg.features, DatasetVariant::Hourly).unwrap();
        let cols = out.columns();

        for gone in ["dteday", "casual", "registered", "weathersit", "season", "hr", "mnth"] {
            assert!(!out.has_column(gone), "{gone} should be gone");
        }
        for kept in ["cnt", "temp", "very_good_weather", "winter", "hr_sin", "mnth_cos"] {
            assert!(cols.iter().any(|c| c == kept), "{kept} missing");
        }
        assert_eq!(encoder.columns(), &["weathersit".to_string(), "season".to_string()]);
        assert_eq!(out.len(), 24);
    }

    #[test]
    fn test_daily_has_no_hour_encoding() {
        let dir   = tempfile::tempdir().unwrap();
        let cfg   = config_with_raw(dir.path(), 14);
        let table = CsvLoader::new(cfg.raw_data_path(DatasetVariant::Daily)).load().unwrap();

        let (out, _) = extract_features(&table, &cfg.features, DatasetVariant::Daily).unwrap();
        assert!(!out.has_column("hr_sin"));
        assert!(out.has_column("weekday_sin"));
    }

    #[test]
    fn test_cyclic_sources_can_be_kept() {
        let dir     = tempfile::tempdir().unwrap();
        let mut cfg = config_with_raw(dir.path(), 14);
        cfg.features.drop_cyclic_sources = false;
        let table = CsvLoader::new(cfg.raw_data_path(DatasetVariant::Daily)).load().unwrap();

        let (out, _) = extract_features(&table, &cfg.features, DatasetVariant::Daily).unwrap();
        assert!(out.has_column("mnth"));
        assert!(out.has_column("mnth_sin"));
    }

    #[test]
    fn test_rename_onto_existing_column_fails() {
        let dir     = tempfile::tempdir().unwrap();
        let mut cfg = config_with_raw(dir.path(), 14);
        cfg.features.rename.insert("season_1".into(), "temp".into());
        let table = CsvLoader::new(cfg.raw_data_path(DatasetVariant::Daily)).load().unwrap();

        assert!(extract_features(&table, &cfg.features, DatasetVariant::Daily).is_err());
    }

    #[test]
    fn test_execute_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_with_raw(dir.path(), 30);

        FeaturesUseCase::new(cfg.clone()).execute().unwrap();

        for variant in DatasetVariant::ALL {
            assert!(cfg.processed_data_path(variant).exists());
            let enc = OneHotEncoder::load(&cfg.encoder_path(variant)).unwrap();
            assert_eq!(enc.categories("weathersit").unwrap(), &["1", "2", "3"].map(String::from));
        }
    }

    #[test]
    fn test_execute_without_raw_data() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = DataConfig::from_yaml_str(&yaml_for(dir.path())).unwrap();

        let err = FeaturesUseCase::new(cfg).execute().unwrap_err();
        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::MissingPaths { paths }) => assert_eq!(paths.len(), 2),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
