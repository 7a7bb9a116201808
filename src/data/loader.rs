// ============================================================
// Layer 4: CSV Table Loader / Writer
// ============================================================
// Reads and writes Tables as comma separated files using the
// csv crate. The first record is always the header.
//
// Every stage boundary in the pipeline is one of these files:
//
//   raw/hour.csv ──► processed/hour.csv ──► splits/train_hour.csv
//                                       └─► splits/test_hour.csv
//
// Before a stage reads anything it calls `check_paths_exist`
// with every input at once, so a user who skipped a stage sees
// the full list of missing files rather than only the first.
//
// Reference: csv crate documentation (Reader, Writer)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::errors::PipelineError;
use crate::domain::table::Table;
use crate::domain::traits::TableSource;

/// Loads a single CSV file as a Table.
pub struct CsvLoader {
    path: PathBuf,
}

impl CsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TableSource for CsvLoader {
    fn load(&self) -> Result<Table> {
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Cannot open CSV '{}'", self.path.display()))?;

        let columns: Vec<String> = reader
            .headers()
            .with_context(|| format!("Cannot read header of '{}'", self.path.display()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record
                .with_context(|| format!("Malformed record in '{}'", self.path.display()))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        let table = Table::new(columns, rows)
            .with_context(|| format!("Inconsistent table in '{}'", self.path.display()))?;

        tracing::debug!(
            "Loaded '{}' ({} rows, {} columns)",
            self.path.display(),
            table.len(),
            table.columns().len()
        );
        Ok(table)
    }
}

/// Write a table with its header, creating parent directories.
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create directory '{}'", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot create CSV '{}'", path.display()))?;

    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row)?;
    }
    writer.flush()?;

    tracing::debug!("Wrote '{}' ({} rows)", path.display(), table.len());
    Ok(())
}

/// Fail with every missing path listed, or do nothing.
pub fn check_paths_exist<P: AsRef<Path>>(paths: &[P]) -> Result<()> {
    let missing: Vec<PathBuf> = paths
        .iter()
        .map(|p| p.as_ref())
        .filter(|p| !p.exists())
        .map(Path::to_path_buf)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::MissingPaths { paths: missing }.into())
    }
}
