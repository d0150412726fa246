//! Coffee Carousel binary
//!
//! `carousel` spins the carousel against the test tables; `carousel --deploy`
//! uses the production tables and sends real notifications.

use anyhow::{Context, Result};
use carousel::{build_notifier, build_store, Carousel};
use cli::{Cli, Commands};
use config::{
    generate_default_config, load_config, save_config, validate_config, validate_deploy_config,
    CarouselConfig, ValidationReport,
};
use observability::{init_logging, init_metrics, LogFormat};
use std::path::Path;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command() {
        Commands::Spin => spin_command(&cli).await,
        Commands::Validate => {
            init_logging(LogFormat::Pretty, cli.log_level("warn"))?;
            validate_command(&cli.config, cli.deploy)
        }
        Commands::Init { output, force } => {
            init_logging(LogFormat::Pretty, cli.log_level("info"))?;
            init_command(&output, force)
        }
    }
}

async fn spin_command(cli: &Cli) -> Result<()> {
    let config = load_config(&cli.config)?;

    let format = LogFormat::parse(&config.logging.format).unwrap_or_default();
    init_logging(format, cli.log_level(&config.logging.level))?;
    debug!(?cli, "CLI arguments parsed");

    let mode = cli.run_mode();
    check_config(&config, mode.sends_notifications())?;

    if let Some(port) = config.monitoring.prometheus_port {
        init_metrics(port)?;
    }

    info!(carousel = %config.carousel.name, %mode, "Coffee Carousel starting");

    let store = build_store(&config)?;
    let notifier = build_notifier(&config, mode)?;
    let carousel = Carousel::new(&config, mode, store, notifier);

    let report = carousel.spin().await.map_err(|e| {
        if e.is_data_shape() {
            error!(error = %e, "Table data is malformed, nothing was paired or written");
        } else {
            error!(error = %e, "Carousel run failed");
        }
        e
    })?;

    for failure in &report.notifications.failures {
        warn!(to = %failure.recipient, error = %failure.error, "Undelivered notification");
    }
    println!("{}", report.summary());
    Ok(())
}

/// Deploy runs also need resolved mail credentials
fn validation_report(config: &CarouselConfig, deploy: bool) -> ValidationReport {
    if deploy {
        validate_deploy_config(config)
    } else {
        validate_config(config)
    }
}

/// Log warnings and refuse to run with an invalid config
fn check_config(config: &CarouselConfig, deploy: bool) -> Result<()> {
    let report = validation_report(config, deploy);

    for warning in &report.warnings {
        warn!(field = %warning.field, message = %warning.message, "Configuration warning");
    }

    if !report.is_valid() {
        error!(
            error_count = report.errors.len(),
            "Configuration validation failed"
        );
        for err in &report.errors {
            error!("{}", err);
        }
        anyhow::bail!("Cannot spin the carousel due to configuration errors");
    }

    Ok(())
}

fn validate_command(config_path: &Path, deploy: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let report = validation_report(&config, deploy);

    println!("Validating {:?}", config_path);
    println!();

    if !report.defaults_applied.is_empty() {
        println!("Defaults Applied ({}):", report.defaults_applied.len());
        for default in &report.defaults_applied {
            println!("  [info] {} = {}", default.field, default.value);
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  [warn] [{}] {}", warning.field, warning.message);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  [error] {}", err);
        }
        println!();
        anyhow::bail!("Configuration validation failed");
    }

    println!("[ok] Configuration is valid!");
    println!();
    println!("Carousel: {}", config.carousel.name);
    println!(
        "Tables: {} / {} (test suffix '{}')",
        config.sheet.subscribers_table, config.sheet.history_table, config.sheet.test_suffix
    );
    println!(
        "Matching: tie_break={}, periodic={}, availability={}",
        config.matching.tie_break, config.matching.periodic, config.matching.availability
    );

    Ok(())
}

fn init_command(output_path: &Path, force: bool) -> Result<()> {
    info!(?output_path, "Initializing new configuration file");

    if output_path.exists() && !force {
        anyhow::bail!(
            "{:?} already exists, pass --force to overwrite it",
            output_path
        );
    }

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    save_config(&generate_default_config(), output_path)?;

    println!("[ok] Configuration file created successfully!");
    println!();
    println!("Location: {:?}", output_path);
    println!();
    println!("Next steps:");
    println!("  1. Set CAROUSEL_SPREADSHEET_ID, CAROUSEL_SHEETS_TOKEN,");
    println!("     CAROUSEL_MAIL_ENDPOINT and CAROUSEL_MAIL_API_KEY");
    println!(
        "  2. Run 'carousel validate --config {:?}' to check configuration",
        output_path
    );
    println!(
        "  3. Run 'carousel --config {:?}' for a test run, add --deploy for the real one",
        output_path
    );

    Ok(())
}
