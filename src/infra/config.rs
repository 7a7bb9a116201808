// ============================================================
// Layer 6: Data Configuration
// ============================================================
// Parses configs/data.yaml into an immutable DataConfig.
//
// Every path a stage reads or writes is derived from the
// handful of fields in this file:
//
//   raw_dir/zip_filename                 downloaded archive
//   raw_dir/dataset_dirname              extracted archive
//   processed_dir/dataset_dirname/...    encoded tables
//   splitted_dir/dataset_dirname/...     train_/test_ tables
//
// Computing a path never touches the filesystem. Directories
// are created once, explicitly, by `ensure_dirs()`.
//
// Example file:
//
//   dataset:
//     name: bike_sharing
//     source_url: https://archive.ics.uci.edu/.../bike+sharing+dataset.zip
//     sha256: ""
//     raw_dir: data/raw
//     processed_dir: data/processed
//     splitted_dir: data/splits
//     zip_filename: bike_sharing_dataset.zip
//     dataset_dirname: bike_sharing
//   files:
//     hourly_csv: hour.csv
//     daily_csv: day.csv
//
// An optional `features:` section overrides FeatureConfig.
//
// Reference: serde_yaml documentation
//            Rust Book §9 (Error Handling)

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

// ─── Dataset Variant ──────────────────────────────────────────────────────────
/// The two tables shipped in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DatasetVariant {
    Hourly,
    Daily,
}

impl DatasetVariant {
    pub const ALL: [DatasetVariant; 2] = [DatasetVariant::Hourly, DatasetVariant::Daily];
}

impl fmt::Display for DatasetVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetVariant::Hourly => write!(f, "hourly"),
            DatasetVariant::Daily  => write!(f, "daily"),
        }
    }
}

// ─── Feature Configuration ────────────────────────────────────────────────────
/// Which columns the feature stage drops, expands and wraps.
/// Defaults describe the UCI bike sharing tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Column the models predict
    pub target: String,

    /// Removed before encoding (date string, and the two
    /// columns that sum to the target)
    pub drop_columns: Vec<String>,

    /// One-hot encoded
    pub categorical: Vec<String>,

    /// Indicator column → readable name, applied after one-hot
    pub rename: IndexMap<String, String>,

    /// Cyclic periods per variant
    pub cyclic: CyclicConfig,

    /// Subtracted before wrapping, e.g. mnth is 1..=12
    pub offsets: IndexMap<String, i64>,

    /// Remove hr/weekday/mnth once their sin/cos pair exists
    pub drop_cyclic_sources: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CyclicConfig {
    pub hourly: IndexMap<String, u32>,
    pub daily:  IndexMap<String, u32>,
}

impl CyclicConfig {
    pub fn periods(&self, variant: DatasetVariant) -> &IndexMap<String, u32> {
        match variant {
            DatasetVariant::Hourly => &self.hourly,
            DatasetVariant::Daily  => &self.daily,
        }
    }
}

impl Default for CyclicConfig {
    fn default() -> Self {
        let daily: IndexMap<String, u32> =
            [("weekday".to_string(), 7), ("mnth".to_string(), 12)].into_iter().collect();
        let hourly: IndexMap<String, u32> = [
            ("hr".to_string(), 24),
            ("weekday".to_string(), 7),
            ("mnth".to_string(), 12),
        ]
        .into_iter()
        .collect();
        Self { hourly, daily }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        let weather = ["very_good_weather", "good_weather", "bad_weather", "very_bad_weather"];
        let season  = ["spring", "summer", "fall", "winter"];

        let mut rename = IndexMap::new();
        for (i, name) in weather.iter().enumerate() {
            rename.insert(format!("weathersit_{}", i + 1), name.to_string());
        }
        for (i, name) in season.iter().enumerate() {
            rename.insert(format!("season_{}", i + 1), name.to_string());
        }

        Self {
            target:       "cnt".to_string(),
            drop_columns: vec!["dteday".into(), "casual".into(), "registered".into()],
            categorical:  vec!["weathersit".into(), "season".into()],
            rename,
            cyclic:       CyclicConfig::default(),
            offsets:      [("mnth".to_string(), 1)].into_iter().collect(),
            drop_cyclic_sources: true,
        }
    }
}

// ─── Raw YAML Shape ───────────────────────────────────────────────────────────
#[derive(Debug, Deserialize)]
struct RawDataConfig {
    dataset:  RawDataset,
    files:    RawFiles,
    #[serde(default)]
    features: FeatureConfig,
}

#[derive(Debug, Deserialize)]
struct RawDataset {
    name:            String,
    source_url:      String,
    #[serde(default)]
    sha256:          String,
    raw_dir:         PathBuf,
    processed_dir:   PathBuf,
    splitted_dir:    PathBuf,
    zip_filename:    String,
    dataset_dirname: String,
}

#[derive(Debug, Deserialize)]
struct RawFiles {
    hourly_csv: String,
    daily_csv:  String,
}

// ─── DataConfig ───────────────────────────────────────────────────────────────
/// Validated dataset configuration. Construct with `load` or `from_yaml_str`.
#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub name:            String,
    pub source_url:      String,
    /// Lowercase hex digest, or empty when not pinned
    pub sha256:          String,
    pub raw_dir:         PathBuf,
    pub processed_dir:   PathBuf,
    pub splitted_dir:    PathBuf,
    pub zip_filename:    String,
    pub dataset_dirname: String,
    pub hourly_csv:      String,
    pub daily_csv:       String,
    pub features:        FeatureConfig,
}

impl DataConfig {
    /// Read and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read data config '{}'", path.display()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("Invalid data config '{}'", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let raw: RawDataConfig = serde_yaml::from_str(text)?;
        let d = raw.dataset;
        let f = raw.files;

        let cfg = Self {
            name:            d.name,
            source_url:      d.source_url,
            sha256:          d.sha256.trim().to_lowercase(),
            raw_dir:         d.raw_dir,
            processed_dir:   d.processed_dir,
            splitted_dir:    d.splitted_dir,
            zip_filename:    d.zip_filename,
            dataset_dirname: d.dataset_dirname,
            hourly_csv:      f.hourly_csv,
            daily_csv:       f.daily_csv,
            features:        raw.features,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        let required = [
            ("dataset.name", &self.name),
            ("dataset.source_url", &self.source_url),
            ("dataset.zip_filename", &self.zip_filename),
            ("dataset.dataset_dirname", &self.dataset_dirname),
            ("files.hourly_csv", &self.hourly_csv),
            ("files.daily_csv", &self.daily_csv),
            ("features.target", &self.features.target),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                bail!("'{}' must not be empty", key);
            }
        }

        if self.hourly_csv == self.daily_csv {
            bail!("files.hourly_csv and files.daily_csv must differ");
        }

        if !self.sha256.is_empty()
            && (self.sha256.len() != 64 || !self.sha256.chars().all(|c| c.is_ascii_hexdigit()))
        {
            bail!("dataset.sha256 must be empty or a 64 character hex digest");
        }

        for variant in DatasetVariant::ALL {
            for (col, period) in self.features.cyclic.periods(variant) {
                if *period == 0 {
                    bail!("cyclic period for '{}' ({}) must be positive", col, variant);
                }
            }
        }
        Ok(())
    }

    /// Create every directory the pipeline writes into.
    /// The extraction directory is not created here: its existence
    /// marks extraction as done.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.raw_dir, &self.processed_path(), &self.splitted_path()] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create directory '{}'", dir.display()))?;
        }
        Ok(())
    }

    // ── Raw ───────────────────────────────────────────────────────────────────

    pub fn zip_path(&self) -> PathBuf {
        self.raw_dir.join(&self.zip_filename)
    }

    pub fn extracted_path(&self) -> PathBuf {
        self.raw_dir.join(&self.dataset_dirname)
    }

    /// Sibling of `extracted_path` used while unpacking
    pub fn extract_tmp_path(&self) -> PathBuf {
        self.raw_dir.join(format!("{}_tmp", self.dataset_dirname))
    }

    pub fn csv_name(&self, variant: DatasetVariant) -> &str {
        match variant {
            DatasetVariant::Hourly => &self.hourly_csv,
            DatasetVariant::Daily  => &self.daily_csv,
        }
    }

    pub fn raw_data_path(&self, variant: DatasetVariant) -> PathBuf {
        self.extracted_path().join(self.csv_name(variant))
    }

    // ── Processed ─────────────────────────────────────────────────────────────

    pub fn processed_path(&self) -> PathBuf {
        self.processed_dir.join(&self.dataset_dirname)
    }

    pub fn processed_data_path(&self, variant: DatasetVariant) -> PathBuf {
        self.processed_path().join(self.csv_name(variant))
    }

    /// Fitted one-hot encoder for a variant, e.g. `hour_onehot.json`
    pub fn encoder_path(&self, variant: DatasetVariant) -> PathBuf {
        let stem = Path::new(self.csv_name(variant))
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("table");
        self.processed_path().join(format!("{stem}_onehot.json"))
    }

    // ── Splits ────────────────────────────────────────────────────────────────

    pub fn splitted_path(&self) -> PathBuf {
        self.splitted_dir.join(&self.dataset_dirname)
    }

    pub fn train_data_path(&self, variant: DatasetVariant) -> PathBuf {
        self.splitted_path().join(format!("train_{}", self.csv_name(variant)))
    }

    pub fn test_data_path(&self, variant: DatasetVariant) -> PathBuf {
        self.splitted_path().join(format!("test_{}", self.csv_name(variant)))
    }
}
