// ============================================================
// Layer 2: Application / Use Cases
// ============================================================
// One use case per pipeline stage. Each one takes its config,
// tells the data, ml and infra layers what to do in order,
// and returns a small report for the CLI to print.
//
//   download  ──►  features  ──►  split  ──►  train  ──►  evaluate
//
// Stages talk to each other only through files on disk, so
// any of them can be re-run on its own.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

pub mod download_use_case;
pub mod evaluate_use_case;
pub mod features_use_case;
pub mod registry_use_case;
pub mod split_use_case;
pub mod train_use_case;
