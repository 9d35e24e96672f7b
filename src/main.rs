use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, LevelFilter};
use simplelog::{ColorChoice, Config as LogConfig, TermLogger, TerminalMode};

use pose_batch::check::check_engine;
use pose_batch::config::{CheckConfig, NormalizeConfig};
use pose_batch::{normalize_directory, BatchProcessor, Cli, Command, OpenPoseEngine, ProcessConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let outcome = match cli.command {
        Command::Normalize(config) => normalize(&config),
        Command::Process(config) => process(&config),
        Command::Check(config) => check(&config),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => LevelFilter::Warn,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };
    if TermLogger::init(
        level,
        LogConfig::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .is_err()
    {
        eprintln!("Logger already initialised");
    }
}

/// Always succeeds; a missing directory is only reported.
fn normalize(config: &NormalizeConfig) -> Result<ExitCode> {
    if let Err(e) = normalize_directory(&config.input_dir) {
        error!("{}", e);
    }
    Ok(ExitCode::SUCCESS)
}

fn process(config: &ProcessConfig) -> Result<ExitCode> {
    let model_folder = config.resolve_model_folder()?;
    info!("Using OpenPose models from: {}", model_folder.display());

    let engine = OpenPoseEngine::new(
        &config.openpose_bin,
        &model_folder,
        &config.json_dir(),
        config.engine.clone(),
    );
    let processor = BatchProcessor::new(engine, &config.output_dir, config.sidecar.clone());
    processor
        .process_directory(&config.input_dir)
        .with_context(|| format!("Failed to process {}", config.input_dir.display()))?;

    Ok(ExitCode::SUCCESS)
}

fn check(config: &CheckConfig) -> Result<ExitCode> {
    let engine = OpenPoseEngine::probe(&config.openpose_bin);
    Ok(match check_engine(&engine) {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    })
}
