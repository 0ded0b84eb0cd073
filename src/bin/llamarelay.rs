//! Llamarelay Binary
//!
//! Loads the configuration, sets up logging and either runs the bot or
//! reports on the configuration.

use anyhow::Context;
use clap::Parser;
use llamarelay::cli::{CheckReport, Cli, Commands};
use llamarelay::config::{ConfigLoader, RelayConfig};
use llamarelay::logging::{init_logging, LoggingConfig};
use llamarelay::telegram;
use std::process;
use std::sync::Arc;
use tracing::{error, info, warn};

fn main() {
    let cli = Cli::parse();

    let loaded = ConfigLoader::load(cli.config.as_deref());

    // Logging comes up before config errors are reported so they get logged too
    let logging_config = build_logging_config(&cli, loaded.as_ref().ok());
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    match cli.command() {
        Commands::Check { format } => match check(&config, &format) {
            Ok((output, valid)) => {
                println!("{}", output);
                if !valid {
                    process::exit(1);
                }
            }
            Err(e) => {
                eprintln!("{:#}", e);
                process::exit(1);
            }
        },
        Commands::Run => {
            if let Err(errors) = config.validate() {
                for e in &errors {
                    error!(error = %e, "Invalid configuration");
                    eprintln!("{}", e);
                }
                process::exit(1);
            }
            for misconfiguration in config.misconfigured_models() {
                warn!(%misconfiguration, "Model will answer with a misconfiguration error");
            }

            info!("Llamarelay starting");
            if let Err(e) = run_bot(config) {
                error!(error = %e, "Llamarelay stopped with an error");
                eprintln!("{:#}", e);
                process::exit(1);
            }
            info!("Llamarelay stopped");
        }
    }
}

fn run_bot(config: RelayConfig) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime
        .block_on(telegram::run(Arc::new(config)))
        .context("Telegram relay failed")
}

fn check(config: &RelayConfig, format: &str) -> anyhow::Result<(String, bool)> {
    let report = CheckReport::new(config);
    let output = match format {
        "text" => report.to_text(),
        "json" => report.to_json().context("Failed to serialize check report")?,
        other => anyhow::bail!("Unknown output format '{}': expected text or json", other),
    };
    Ok((output, report.valid))
}

/// Build logging configuration from CLI args and the loaded config.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli, config: Option<&RelayConfig>) -> LoggingConfig {
    let mut logging = config.map(|c| c.logging.clone()).unwrap_or_default();

    if cli.quiet {
        logging.enabled = false;
    }
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        logging.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        logging.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        logging.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        logging.file = Some(file.clone());
    }

    logging
}
