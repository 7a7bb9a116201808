// ============================================================
// Layer 3: Domain Layer
// ============================================================
// Plain Rust types that every other layer agrees on:
//
//   table.rs    the in-memory tabular record set passed
//               between pipeline stages
//   errors.rs   the handful of failures the pipeline raises
//               itself (everything else comes from the
//               library that failed)
//   traits.rs   the seams other layers implement:
//               TableSource, Regressor, Persistable
//   scoring.rs  RMSE, the single evaluation metric
//
// Rules for this layer:
//   - NO linfa or burn types (ndarray arrays are allowed,
//     they are the lingua franca of the model layer)
//   - NO file I/O or network calls
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

pub mod errors;
pub mod scoring;
pub mod table;
pub mod traits;
