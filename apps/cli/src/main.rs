mod args;
mod config;
mod dirs;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use supply_chain_app::{
    Logging, PipelineServices, Result, TrainingPipeline, ensure_project_dirs,
    load_ingestion_config,
};
use tracing::error;

use crate::args::{CliArgs, Command};
use crate::dirs::ProjectResolution;

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match run(args) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err);
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> Result<ExitCode> {
    let project = dirs::resolve_project(args.root, args.config)?;
    Logging::init(&project.paths.logs_dir)?;

    match args.command {
        Command::Run => run_pipeline(project),
        Command::Check => check(&project),
        Command::Init => init(&project),
        Command::Profile { csv } => profile(&project, &csv),
    }
}

fn run_pipeline(project: ProjectResolution) -> Result<ExitCode> {
    ensure_project_dirs(&project.paths)?;
    let mut pipeline = TrainingPipeline::with_config_file(project.paths, project.config_file);
    pipeline.run_pipeline()?;
    if let Some(artifact) = pipeline.data_ingestion_artifact() {
        println!("{}", artifact.status_message());
    }
    Ok(ExitCode::SUCCESS)
}

fn check(project: &ProjectResolution) -> Result<ExitCode> {
    let config = load_ingestion_config(&project.paths, &project.config_file)?;
    let services = PipelineServices::new(config);
    let missing = services.ingest.missing_files();
    if missing.is_empty() {
        println!(
            "All {} raw files found in {}.",
            services.ingest.config().raw_files.len(),
            project.paths.raw_data_dir.display()
        );
        return Ok(ExitCode::SUCCESS);
    }
    for name in &missing {
        let path = services
            .ingest
            .config()
            .raw_file(name)
            .map(|spec| spec.path().display().to_string())
            .unwrap_or_default();
        println!("missing: {} ({})", name, path);
    }
    Ok(ExitCode::FAILURE)
}

fn init(project: &ProjectResolution) -> Result<ExitCode> {
    ensure_project_dirs(&project.paths)?;
    let load = config::load_or_create(&project.config_file)?;
    if load.created {
        println!("Created config at {}.", load.file.display());
    } else {
        println!("Config already present at {}.", load.file.display());
    }
    let settings = load.settings;
    println!(
        "Save format: {}, raw files: {}",
        settings.save_format,
        settings.raw_file_entries().len()
    );
    Ok(ExitCode::SUCCESS)
}

fn profile(project: &ProjectResolution, csv: &Path) -> Result<ExitCode> {
    let config = load_ingestion_config(&project.paths, &project.config_file)?;
    let services = PipelineServices::new(config);
    let profile = services.ingest.profile(csv)?;
    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(ExitCode::SUCCESS)
}
