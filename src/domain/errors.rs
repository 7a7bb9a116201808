// ============================================================
// Layer 3: Pipeline Errors
// ============================================================
// The pipeline only raises a few errors of its own. Network,
// archive, CSV, YAML and model-fitting failures are passed
// through untouched by the layers that hit them.
//
// These are wrapped into anyhow::Error at the call sites, so
// callers (and tests) can still recover the exact kind with
// `err.downcast_ref::<PipelineError>()`.
//
// Reference: Rust Book §9 (Error Handling)

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The extracted archive does not contain the expected CSV files
    #[error("expected files not found in '{}': missing {}", .dir.display(), .missing.join(", "))]
    MissingData { dir: PathBuf, missing: Vec<String> },

    /// A stage was started before the stage producing its inputs ran
    #[error("expected paths not found: {}", display_paths(.paths))]
    MissingPaths { paths: Vec<PathBuf> },

    #[error("the sum of all splits should equal 1, got {train} + {test} = {sum}")]
    InvalidSplits { train: f64, test: f64, sum: f64 },

    #[error("checksum mismatch for '{}': expected {expected}, got {actual}", .path.display())]
    ChecksumMismatch {
        path:     PathBuf,
        expected: String,
        actual:   String,
    },

    #[error("column '{0}' not found in table")]
    MissingColumn(String),

    #[error("model '{name}' not found in {}", .registry.display())]
    ModelNotFound { name: String, registry: PathBuf },

    #[error("model '{name}' already exists in {}; pass --overwrite to replace it", .registry.display())]
    ModelExists { name: String, registry: PathBuf },

    #[error("unknown model type '{0}' (expected one of: svr, linear)")]
    UnknownModelType(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_paths_lists_every_path() {
        let err = PipelineError::MissingPaths {
            paths: vec![PathBuf::from("a/hour.csv"), PathBuf::from("a/day.csv")],
        };
        let msg = err.to_string();
        assert!(msg.contains("a/hour.csv"));
        assert!(msg.contains("a/day.csv"));
    }

    #[test]
    fn test_missing_data_names_files() {
        let err = PipelineError::MissingData {
            dir:     PathBuf::from("raw/bike"),
            missing: vec!["day.csv".to_string()],
        };
        assert!(err.to_string().contains("day.csv"));
    }
}
