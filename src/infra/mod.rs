// ============================================================
// Layer 6: Infrastructure Layer
// ============================================================
// Everything that touches the outside world on behalf of the
// other layers:
//
//   config.rs      configs/data.yaml → validated DataConfig,
//                  plus every derived path
//
//   fetch.rs       HTTP download and SHA-256 check
//
//   archive.rs     zip extraction through a temp directory
//
//   registry.rs    configs/models.yaml: model entries and their
//                  best recorded run
//
//   checkpoint.rs  per-run artifact directories (metadata JSON,
//                  burn records)
//
//   metrics.rs     runs.csv, one row per training run
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Dataset configuration and derived paths
pub mod config;

/// Archive download and integrity check
pub mod fetch;

/// Archive extraction
pub mod archive;

/// YAML model registry
pub mod registry;

/// Run artifact saving and loading
pub mod checkpoint;

/// Training run CSV log
pub mod metrics;
