// ============================================================
// Layer 2: DownloadUseCase
// ============================================================
// Gets the raw dataset onto disk:
//
//   Step 1: Create the configured directories   (Layer 6 - infra)
//   Step 2: Download the archive if absent       (Layer 6 - infra)
//   Step 3: Verify its SHA-256                   (Layer 6 - infra)
//   Step 4: Extract via a temp dir               (Layer 6 - infra)
//   Step 5: Check both CSV files are present     (Layer 6 - infra)
//
// Every step is idempotent, so re-running after a failure
// picks up where the last run stopped.

use anyhow::Result;
use std::fs;

use crate::infra::{
    archive::{check_extracted_files, ensure_extracted, Extracted},
    config::DataConfig,
    fetch::{ensure_downloaded, verify_checksum, Fetched},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub fetched:   Fetched,
    pub extracted: Extracted,
    pub sha256:    String,
}

pub struct DownloadUseCase {
    config: DataConfig,
}

impl DownloadUseCase {
    pub fn new(config: DataConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<DownloadReport> {
        let cfg = &self.config;

        // ── Step 1: Directories ──────────────────────────────────────────────
        cfg.ensure_dirs()?;

        // ── Step 2: Download ─────────────────────────────────────────────────
        let fetched = ensure_downloaded(cfg)?;

        // ── Step 3: Integrity ────────────────────────────────────────────────
        // A corrupt fresh download is removed so the next run fetches
        // again. A pre-existing archive is left for the user to inspect.
        let sha256 = match verify_checksum(cfg) {
            Ok(digest) => digest,
            Err(e) => {
                if fetched == Fetched::Downloaded {
                    tracing::warn!("Removing corrupt download '{}'", cfg.zip_path().display());
                    fs::remove_file(cfg.zip_path())?;
                }
                return Err(e);
            }
        };

        // ── Step 4: Extract ──────────────────────────────────────────────────
        let extracted = ensure_extracted(cfg)?;

        // ── Step 5: Check expected files ─────────────────────────────────────
        check_extracted_files(cfg)?;

        tracing::info!(
            "Dataset '{}' ready in '{}'",
            cfg.name,
            cfg.extracted_path().display()
        );
        Ok(DownloadReport { fetched, extracted, sha256 })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::PipelineError;
    use crate::infra::archive::tests::write_zip;
    use crate::infra::config::tests::yaml_for;

    fn config(root: &std::path::Path) -> DataConfig {
        DataConfig::from_yaml_str(&yaml_for(root)).unwrap()
    }

    #[test]
    fn test_pre_placed_archive_is_extracted_once() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        cfg.ensure_dirs().unwrap();
        write_zip(&cfg.zip_path(), &[("hour.csv", "hr,cnt\n0,1\n"), ("day.csv", "cnt\n5\n")]);

        let first = DownloadUseCase::new(cfg.clone()).execute().unwrap();
        assert_eq!(first.fetched, Fetched::AlreadyPresent);
        assert_eq!(first.extracted, Extracted::Extracted);
        assert!(cfg.raw_data_path(crate::infra::config::DatasetVariant::Daily).exists());

        let second = DownloadUseCase::new(cfg).execute().unwrap();
        assert_eq!(second.extracted, Extracted::AlreadyPresent);
        assert_eq!(second.sha256, first.sha256);
    }

    #[test]
    fn test_archive_without_expected_csv() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        cfg.ensure_dirs().unwrap();
        write_zip(&cfg.zip_path(), &[("hour.csv", "hr,cnt\n0,1\n")]);

        let err = DownloadUseCase::new(cfg).execute().unwrap_err();
        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::MissingData { missing, .. }) => {
                assert_eq!(missing, &vec!["day.csv".to_string()])
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_checksum_mismatch_keeps_pre_placed_archive() {
        let dir  = tempfile::tempdir().unwrap();
        let yaml = yaml_for(dir.path()).replace(
            "sha256: \"\"",
            &format!("sha256: \"{}\"", "0".repeat(64)),
        );
        let cfg = DataConfig::from_yaml_str(&yaml).unwrap();
        cfg.ensure_dirs().unwrap();
        write_zip(&cfg.zip_path(), &[("hour.csv", "a\n1\n"), ("day.csv", "a\n1\n")]);

        let err = DownloadUseCase::new(cfg.clone()).execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::ChecksumMismatch { .. })
        ));
        assert!(cfg.zip_path().exists());
        assert!(!cfg.extracted_path().exists());
    }
}
