mod cli;
mod config;
mod errors;
mod processing;

use clap::Parser;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::{
    Config,
    InputConfig,
};

#[cfg(target_os = "windows")]
use mimalloc::MiMalloc;

#[cfg(target_os = "windows")]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> std::result::Result<(), errors::CliError> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        ) // This uses RUST_LOG environment variable
        .init();

    // Parse command line arguments
    let args = Cli::parse();

    // Load and parse configuration
    let mut config = match &args.config {
        Some(path) => {
            let file = match std::fs::File::open(path) {
                Ok(x) => x,
                Err(e) => {
                    return Err(errors::CliError::Io {
                        source: e.to_string(),
                        path: Some(path.to_string_lossy().to_string()),
                    });
                }
            };
            let parsed: Result<Config, _> = serde_json::from_reader(file);
            match parsed {
                Ok(x) => x,
                Err(e) => {
                    return Err(errors::CliError::ParseError { msg: e.to_string() });
                }
            }
        }
        None => Config::default(),
    };

    // Override config with command line arguments if provided
    config.apply_cli_args(&args)?;
    info!("Parsed configuration: {:#?}", config);

    let records = match config.input.as_ref().expect("validated by apply_cli_args") {
        InputConfig::Formula { formula } => {
            vec![processing::process_formula(formula, &config.analysis)?]
        }
        InputConfig::Fasta {
            sequence,
            add_water,
        } => {
            vec![processing::process_fasta(
                sequence,
                *add_water,
                &config.analysis,
            )?]
        }
        InputConfig::FormulaFile { path } => {
            processing::process_formula_file(path, &config.analysis)?
        }
    };

    processing::write_records(&records, &config.output)?;
    Ok(())
}
