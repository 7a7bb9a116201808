// ============================================================
// Layer 6: Archive Extraction
// ============================================================
// Unpacks the downloaded zip into raw_dir/dataset_dirname.
//
// Extraction happens in a sibling `<dataset_dirname>_tmp`
// directory which is renamed into place only after every
// entry is written. If the process dies half way, only the
// temp directory is left behind; it is wiped on the next run.
//
// The presence of the final directory is the "done" marker,
// so calling `ensure_extracted` again is a no-op.
//
// Reference: zip crate documentation (ZipArchive::extract)

use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    path::Path,
};

use crate::domain::errors::PipelineError;
use crate::infra::config::{DataConfig, DatasetVariant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extracted {
    AlreadyPresent,
    Extracted,
}

/// Extract every entry of `zip_path` under `out_dir`.
pub fn extract_zip(zip_path: &Path, out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Cannot create '{}'", out_dir.display()))?;

    let file = File::open(zip_path)
        .with_context(|| format!("Cannot open archive '{}'", zip_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)?;

    tracing::debug!(
        "Extracting {} entries from '{}'",
        archive.len(),
        zip_path.display()
    );
    archive.extract(out_dir)?;
    Ok(())
}

/// Extract the configured archive once, via a temp directory.
pub fn ensure_extracted(cfg: &DataConfig) -> Result<Extracted> {
    let target = cfg.extracted_path();
    if target.exists() {
        tracing::info!("Dataset already extracted at '{}'", target.display());
        return Ok(Extracted::AlreadyPresent);
    }

    let tmp = cfg.extract_tmp_path();
    if tmp.exists() {
        tracing::warn!("Removing stale extraction directory '{}'", tmp.display());
        fs::remove_dir_all(&tmp)
            .with_context(|| format!("Cannot remove '{}'", tmp.display()))?;
    }

    extract_zip(&cfg.zip_path(), &tmp)?;

    fs::rename(&tmp, &target).with_context(|| {
        format!("Cannot rename '{}' to '{}'", tmp.display(), target.display())
    })?;

    tracing::info!("Extracted dataset to '{}'", target.display());
    Ok(Extracted::Extracted)
}

/// Both raw CSV files must exist after extraction.
pub fn check_extracted_files(cfg: &DataConfig) -> Result<()> {
    let missing: Vec<String> = DatasetVariant::ALL
        .iter()
        .filter(|v| !cfg.raw_data_path(**v).exists())
        .map(|v| cfg.csv_name(*v).to_string())
        .collect();

    if !missing.is_empty() {
        return Err(PipelineError::MissingData {
            dir: cfg.extracted_path(),
            missing,
        }
        .into());
    }
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::infra::config::tests::yaml_for;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    /// Write a zip holding the given (name, contents) entries.
    pub(crate) fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file       = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, body) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    fn setup(entries: &[(&str, &str)]) -> (tempfile::TempDir, DataConfig) {
        let dir = tempfile::tempdir().unwrap();
        let cfg = DataConfig::from_yaml_str(&yaml_for(dir.path())).unwrap();
        cfg.ensure_dirs().unwrap();
        write_zip(&cfg.zip_path(), entries);
        (dir, cfg)
    }

    #[test]
    fn test_extracts_into_final_directory() {
        let (_dir, cfg) = setup(&[("hour.csv", "a\n1\n"), ("day.csv", "a\n2\n")]);

        assert_eq!(ensure_extracted(&cfg).unwrap(), Extracted::Extracted);
        assert!(!cfg.extract_tmp_path().exists());
        assert_eq!(
            fs::read_to_string(cfg.raw_data_path(DatasetVariant::Daily)).unwrap(),
            "a\n2\n"
        );
        check_extracted_files(&cfg).unwrap();
    }

    #[test]
    fn test_second_extraction_is_noop() {
        let (_dir, cfg) = setup(&[("hour.csv", "a\n1\n"), ("day.csv", "a\n2\n")]);
        ensure_extracted(&cfg).unwrap();

        // Changes inside the extracted dir must survive a second call.
        fs::write(cfg.raw_data_path(DatasetVariant::Hourly), "edited").unwrap();
        assert_eq!(ensure_extracted(&cfg).unwrap(), Extracted::AlreadyPresent);
        assert_eq!(
            fs::read_to_string(cfg.raw_data_path(DatasetVariant::Hourly)).unwrap(),
            "edited"
        );
    }

    #[test]
    fn test_stale_temp_dir_is_replaced() {
        let (_dir, cfg) = setup(&[("hour.csv", "h"), ("day.csv", "d")]);
        fs::create_dir_all(cfg.extract_tmp_path()).unwrap();
        fs::write(cfg.extract_tmp_path().join("junk.txt"), "x").unwrap();

        ensure_extracted(&cfg).unwrap();
        assert!(!cfg.extracted_path().join("junk.txt").exists());
    }

    #[test]
    fn test_missing_csv_is_reported() {
        let (_dir, cfg) = setup(&[("hour.csv", "h"), ("Readme.txt", "r")]);
        ensure_extracted(&cfg).unwrap();

        let err = check_extracted_files(&cfg).unwrap_err();
        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::MissingData { missing, .. }) => {
                assert_eq!(missing, &vec!["day.csv".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
