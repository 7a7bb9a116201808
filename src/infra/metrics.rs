// ============================================================
// Layer 6: Run Log
// ============================================================
// Appends one row per training run to a CSV file so the
// history of a model survives even when `best` in the
// registry is left unchanged:
//
//   artifacts/<model name>/runs.csv
//
//   run_id,variant,model_type,metric,value,improved,parameters
//   20261019T101500,daily,svr,rmse,812.4,true,"{""c"":1.0,...}"
//   20261019T103012,daily,svr,rmse,840.9,false,"{""c"":0.1,...}"
//
// The header is written only when the file is created, so
// later runs append to the same log.
//
// Reference: Rust Book §12 (I/O), csv crate docs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

const RUNS_FILE: &str = "runs.csv";

/// One training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id:     String,
    pub variant:    String,
    pub model_type: String,
    pub metric:     String,
    pub value:      f64,
    /// True when this run replaced the registry's best record
    pub improved:   bool,
    /// Parameters as compact JSON
    pub parameters: String,
}

pub struct RunLogger {
    csv_path: PathBuf,
}

impl RunLogger {
    /// Log into `dir/runs.csv`, creating `dir` if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        Ok(Self { csv_path: dir.join(RUNS_FILE) })
    }

    pub fn log(&self, record: &RunRecord) -> Result<()> {
        let is_new = !self.csv_path.exists();
        let file   = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;

        tracing::debug!(
            "Logged run {} ({}={:.4}) to '{}'",
            record.run_id,
            record.metric,
            record.value,
            self.csv_path.display()
        );
        Ok(())
    }

    /// Every logged run, oldest first.
    pub fn read_all(&self) -> Result<Vec<RunRecord>> {
        if !self.csv_path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.csv_path)
            .with_context(|| format!("Cannot read '{}'", self.csv_path.display()))?;
        let records = reader.deserialize().collect::<Result<Vec<RunRecord>, _>>()?;
        Ok(records)
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn record(run_id: &str, value: f64, improved: bool) -> RunRecord {
        RunRecord {
            run_id:     run_id.into(),
            variant:    "daily".into(),
            model_type: "svr".into(),
            metric:     "rmse".into(),
            value,
            improved,
            parameters: r#"{"c":1.0,"epsilon":0.1}"#.into(),
        }
    }

    #[test]
    fn test_appends_with_single_header() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = RunLogger::new(dir.path().join("svr_baseline")).unwrap();
        logger.log(&record("r1", 10.0, true)).unwrap();
        logger.log(&record("r2", 12.5, false)).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text.matches("run_id").count(), 1);

        let runs = logger.read_all().unwrap();
        assert_eq!(runs, vec![record("r1", 10.0, true), record("r2", 12.5, false)]);
    }

    #[test]
    fn test_no_log_yet() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = RunLogger::new(dir.path()).unwrap();
        assert!(logger.read_all().unwrap().is_empty());
    }
}
