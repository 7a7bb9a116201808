// ============================================================
// Layer 1: CLI Commands and Arguments
// ============================================================
// One subcommand per pipeline stage plus two registry
// helpers. Flag defaults match the repository layout
// (configs/data.yaml, configs/models.yaml, artifacts/).
//
// clap's derive macros generate help text, missing-argument
// errors and string → number/enum conversion.
//
// Reference: Rust Book §12 (Building a CLI Program)

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::{
    evaluate_use_case::EvaluateConfig,
    registry_use_case::RegisterRequest,
    train_use_case::TrainConfig,
};
use crate::data::splitter::SplitFractions;
use crate::infra::config::{DataConfig, DatasetVariant};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download, verify and extract the dataset archive
    Download(ConfigArgs),

    /// Build feature tables from the raw CSV files
    Features(ConfigArgs),

    /// Split the feature tables into train and test sets
    Split(SplitArgs),

    /// Run `features` then `split`
    Preprocess(SplitArgs),

    /// Add a model to the registry
    Register(RegisterArgs),

    /// Print a registry entry (or list all names)
    Show(ShowArgs),

    /// Train a registered model and record the best run
    Train(TrainArgs),

    /// Score a model's best run on the test split
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Dataset config YAML
    #[arg(long, default_value = "configs/data.yaml")]
    pub config_path: PathBuf,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<DataConfig> {
        DataConfig::load(&self.config_path)
    }
}

#[derive(Args, Debug)]
pub struct SplitArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Train and test fractions, must sum to 1
    #[arg(
        long,
        num_args = 2,
        value_names = ["TRAIN", "TEST"],
        default_values_t = [0.85, 0.15],
        allow_negative_numbers = true
    )]
    pub splits: Vec<f64>,
}

impl SplitArgs {
    pub fn fractions(&self) -> Result<SplitFractions> {
        match self.splits.as_slice() {
            [train, test] => Ok(SplitFractions::new(*train, *test)?),
            other => bail!("--splits takes exactly two values, got {}", other.len()),
        }
    }
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Registry key, e.g. svr_baseline
    #[arg(long)]
    pub name: String,

    /// svr | linear
    #[arg(long)]
    pub model_type: String,

    #[arg(long)]
    pub class_path: Option<String>,

    #[arg(long)]
    pub code_path: Option<String>,

    #[arg(long, default_value = "configs/models.yaml")]
    pub registry: PathBuf,

    /// Replace an existing entry with the same name
    #[arg(long)]
    pub overwrite: bool,
}

impl From<RegisterArgs> for RegisterRequest {
    fn from(a: RegisterArgs) -> Self {
        RegisterRequest {
            name:       a.name,
            model_type: a.model_type,
            class_path: a.class_path,
            code_path:  a.code_path,
            overwrite:  a.overwrite,
        }
    }
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Entry to print; all names are listed when omitted
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, default_value = "configs/models.yaml")]
    pub registry: PathBuf,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    #[arg(long)]
    pub name: String,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[arg(long, default_value = "configs/models.yaml")]
    pub registry: PathBuf,

    /// Which table to train on
    #[arg(long, value_enum, default_value_t = DatasetVariant::Daily)]
    pub variant: DatasetVariant,

    #[arg(long, default_value = "artifacts")]
    pub artifacts_dir: PathBuf,
}

/// The application layer never sees clap types; the data
/// config is loaded and validated here, at the boundary.
impl TryFrom<TrainArgs> for TrainConfig {
    type Error = anyhow::Error;

    fn try_from(a: TrainArgs) -> Result<Self> {
        Ok(TrainConfig {
            name:          a.name,
            data_config:   a.config.load()?,
            registry:      a.registry,
            variant:       a.variant,
            artifacts_dir: a.artifacts_dir,
        })
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[arg(long)]
    pub name: String,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[arg(long, default_value = "configs/models.yaml")]
    pub registry: PathBuf,

    #[arg(long, value_enum, default_value_t = DatasetVariant::Daily)]
    pub variant: DatasetVariant,
}

impl TryFrom<EvaluateArgs> for EvaluateConfig {
    type Error = anyhow::Error;

    fn try_from(a: EvaluateArgs) -> Result<Self> {
        Ok(EvaluateConfig {
            name:        a.name,
            data_config: a.config.load()?,
            registry:    a.registry,
            variant:     a.variant,
        })
    }
}
