// ============================================================
// Layer 6: Archive Download + Integrity
// ============================================================
// Fetches the dataset archive over HTTP and checks its SHA-256.
//
//   ensure_downloaded   GET only when the archive is absent
//   sha256_file         hex digest, read in 1 MiB chunks
//   verify_checksum     compare against dataset.sha256
//
// The request uses a fixed 60 second timeout and no retries.
// A non-2xx status is an error. Network failures surface as
// reqwest errors with the URL attached as context.
//
// Reference: reqwest::blocking documentation
//            RustCrypto sha2 documentation

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::{
    fs::{self, File},
    io::{BufWriter, Read, Write},
    path::Path,
    time::Duration,
};

use crate::domain::errors::PipelineError;
use crate::infra::config::DataConfig;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const CHUNK_SIZE: usize = 1024 * 1024;

/// What `ensure_downloaded` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetched {
    AlreadyPresent,
    Downloaded,
}

/// Download `cfg.source_url` to `cfg.zip_path()` unless it already exists.
pub fn ensure_downloaded(cfg: &DataConfig) -> Result<Fetched> {
    let dst = cfg.zip_path();
    if dst.exists() {
        tracing::info!("Archive already present at '{}'", dst.display());
        return Ok(Fetched::AlreadyPresent);
    }

    download_file(&cfg.source_url, &dst)?;
    Ok(Fetched::Downloaded)
}

/// Stream `url` into `dst`, creating the parent directory if needed.
///
/// The body goes to a `.part` file first so an interrupted transfer
/// never leaves something at `dst` that `ensure_downloaded` would
/// mistake for a finished archive.
pub fn download_file(url: &str, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create directory '{}'", parent.display()))?;
    }

    tracing::info!("Downloading '{}'", url);

    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    let mut response = client
        .get(url)
        .send()
        .with_context(|| format!("Request to '{}' failed", url))?
        .error_for_status()
        .with_context(|| format!("Server rejected request to '{}'", url))?;

    let part = dst.with_extension("part");
    {
        let file = File::create(&part)
            .with_context(|| format!("Cannot create '{}'", part.display()))?;
        let mut writer = BufWriter::new(file);
        let bytes = response
            .copy_to(&mut writer)
            .with_context(|| format!("Download of '{}' interrupted", url))?;
        writer.flush()?;
        tracing::debug!("Received {} bytes", bytes);
    }

    fs::rename(&part, dst)
        .with_context(|| format!("Cannot move '{}' into place", part.display()))?;

    tracing::info!("Saved archive to '{}'", dst.display());
    Ok(())
}

/// Lowercase hex SHA-256 of a file's contents.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("Cannot open '{}'", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf    = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Check the archive against `cfg.sha256`.
///
/// With no pinned digest the check is skipped (with a warning that
/// prints the actual digest so it can be pinned). Returns the digest.
pub fn verify_checksum(cfg: &DataConfig) -> Result<String> {
    let path   = cfg.zip_path();
    let actual = sha256_file(&path)?;

    if cfg.sha256.is_empty() {
        tracing::warn!(
            "No sha256 configured for '{}'; skipping integrity check (actual: {})",
            cfg.name,
            actual
        );
        return Ok(actual);
    }

    if actual != cfg.sha256 {
        return Err(PipelineError::ChecksumMismatch {
            path,
            expected: cfg.sha256.clone(),
            actual,
        }
        .into());
    }

    tracing::info!("Checksum OK ({})", actual);
    Ok(actual)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::config::{tests::yaml_for, DataConfig};

    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn test_sha256_known_value() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.txt");
        fs::write(&path, b"abc").unwrap();
        assert_eq!(sha256_file(&path).unwrap(), ABC_SHA256);
    }

    #[test]
    fn test_existing_archive_is_not_downloaded() {
        // The URL points nowhere; reaching the network would fail.
        let dir = tempfile::tempdir().unwrap();
        let cfg = DataConfig::from_yaml_str(&yaml_for(dir.path())).unwrap();
        cfg.ensure_dirs().unwrap();
        fs::write(cfg.zip_path(), b"abc").unwrap();

        assert_eq!(ensure_downloaded(&cfg).unwrap(), Fetched::AlreadyPresent);
    }

    #[test]
    fn test_verify_checksum() {
        let dir  = tempfile::tempdir().unwrap();
        let yaml = yaml_for(dir.path());

        let unpinned = DataConfig::from_yaml_str(&yaml).unwrap();
        unpinned.ensure_dirs().unwrap();
        fs::write(unpinned.zip_path(), b"abc").unwrap();
        assert_eq!(verify_checksum(&unpinned).unwrap(), ABC_SHA256);

        let pinned =
            DataConfig::from_yaml_str(&yaml.replace("sha256: \"\"", &format!("sha256: \"{ABC_SHA256}\"")))
                .unwrap();
        assert!(verify_checksum(&pinned).is_ok());

        let wrong = DataConfig::from_yaml_str(
            &yaml.replace("sha256: \"\"", &format!("sha256: \"{}\"", "0".repeat(64))),
        )
        .unwrap();
        let err = verify_checksum(&wrong).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::ChecksumMismatch { actual, .. }) if actual == ABC_SHA256
        ));
    }
}
