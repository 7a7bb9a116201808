// ============================================================
// Layer 4: Data Pipeline
// ============================================================
// Everything between a CSV file on disk and the ndarray
// matrices the models consume:
//
//   hour.csv / day.csv
//       │
//       ▼
//   CsvLoader         → reads a file into a Table
//       │
//       ▼
//   OneHotEncoder     → weathersit, season → indicator columns
//       │
//       ▼
//   cyclic_encode     → hr, weekday, mnth → sin/cos pairs
//       │
//       ▼
//   split_table       → contiguous train head / test tail
//       │
//       ▼
//   RegressionData    → x: [rows, features], y: [rows]
//
// Each module does one step and is tested on its own.
//
// Reference: Rust Book §8 (Collections)
//            Rust Book §13 (Iterators and Closures)

/// CSV reading/writing and input path checks
pub mod loader;

/// One-hot encoding of categorical columns
pub mod encoder;

/// Sine/cosine encoding of periodic columns
pub mod cyclic;

/// Order-preserving train/test split
pub mod splitter;

/// Table → feature matrix + target vector
pub mod dataset;
