// ============================================================
// Layer 1: CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap, hands them to a Layer 2 use case and prints the
// outcome. Nothing here computes anything.
//
//   bikeshare download   --config-path configs/data.yaml
//   bikeshare preprocess --splits 0.85 0.15
//   bikeshare register   --name svr_baseline --model-type svr
//   bikeshare train      --name svr_baseline --variant daily
//   bikeshare evaluate   --name svr_baseline --variant daily
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, ConfigArgs, EvaluateArgs, RegisterArgs, ShowArgs, SplitArgs, TrainArgs};

use crate::application::{
    download_use_case::DownloadUseCase,
    evaluate_use_case::EvaluateUseCase,
    features_use_case::FeaturesUseCase,
    registry_use_case::RegistryUseCase,
    split_use_case::SplitUseCase,
    train_use_case::TrainUseCase,
};

#[derive(Parser, Debug)]
#[command(
    name = "bikeshare",
    version,
    about = "Bike sharing demand pipeline: download, features, split, train, evaluate."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Download(args)   => run_download(args),
            Commands::Features(args)   => run_features(args),
            Commands::Split(args)      => run_split(args),
            Commands::Preprocess(args) => run_preprocess(args),
            Commands::Register(args)   => run_register(args),
            Commands::Show(args)       => run_show(args),
            Commands::Train(args)      => run_train(args),
            Commands::Evaluate(args)   => run_evaluate(args),
        }
    }
}

fn run_download(args: ConfigArgs) -> Result<()> {
    let report = DownloadUseCase::new(args.load()?).execute()?;
    println!("Archive sha256: {}", report.sha256);
    println!("Dataset ready ({:?}, {:?}).", report.fetched, report.extracted);
    Ok(())
}

fn run_features(args: ConfigArgs) -> Result<()> {
    FeaturesUseCase::new(args.load()?).execute()?;
    println!("Feature tables written.");
    Ok(())
}

fn run_split(args: SplitArgs) -> Result<()> {
    // Validate fractions before touching any file
    let fractions = args.fractions()?;
    SplitUseCase::new(args.config.load()?, fractions).execute()?;
    println!("Train/test splits written.");
    Ok(())
}

fn run_preprocess(args: SplitArgs) -> Result<()> {
    let fractions = args.fractions()?;
    let config    = args.config.load()?;

    FeaturesUseCase::new(config.clone()).execute()?;
    SplitUseCase::new(config, fractions).execute()?;
    println!("Preprocessing complete.");
    Ok(())
}

fn run_register(args: RegisterArgs) -> Result<()> {
    let use_case = RegistryUseCase::new(&args.registry);
    let name     = args.name.clone();
    let entry    = use_case.register(&args.into())?;
    println!("Registered '{}' ({}).", name, entry.model_type);
    Ok(())
}

fn run_show(args: ShowArgs) -> Result<()> {
    let use_case = RegistryUseCase::new(&args.registry);
    match args.name {
        Some(name) => print!("{}:\n{}", name, indent(&use_case.show(&name)?)),
        None => {
            for name in use_case.list()? {
                println!("{}", name);
            }
        }
    }
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    let report = TrainUseCase::new(args.try_into()?).execute()?;
    println!("Run {}: rmse = {:.4}", report.run_id, report.rmse);
    if report.improved {
        println!("New best, saved to '{}'.", report.artifact.display());
    } else {
        println!("Not better than the recorded best; registry unchanged.");
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    let report = EvaluateUseCase::new(args.try_into()?).execute()?;
    println!(
        "rmse = {:.4} on {} test rows ({})",
        report.rmse,
        report.rows,
        report.artifact.display()
    );
    if let Some(recorded) = report.recorded {
        println!("recorded at training time: {:.4}", recorded);
    }
    Ok(())
}

fn indent(text: &str) -> String {
    text.lines().map(|l| format!("  {}\n", l)).collect()
}
