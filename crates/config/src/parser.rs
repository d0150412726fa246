use crate::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

#[instrument(skip(path))]
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CarouselConfig> {
    let path = path.as_ref();
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    debug!("Config file content length: {} bytes", content.len());

    parse_config(&content)
}

/// Parse configuration text, substituting environment variables first
pub fn parse_config(content: &str) -> Result<CarouselConfig> {
    let substituted = substitution::substitute_env_vars(content)?;
    debug!("Environment variable substitution completed");

    let config: CarouselConfig = serde_yaml::from_str(&substituted)
        .with_context(|| "Failed to parse YAML configuration")?;

    info!("Configuration loaded successfully");
    Ok(config)
}

#[instrument]
pub fn generate_default_config() -> CarouselConfig {
    use defaults::*;

    CarouselConfig {
        carousel: CarouselSection {
            name: "The Coffee Carousel".to_string(),
            description: "Weekly one-on-one coffee pairings".to_string(),
        },
        sheet: SheetConfig {
            spreadsheet_id: "${CAROUSEL_SPREADSHEET_ID}".to_string(),
            api_base_url: default_sheets_api_base_url(),
            access_token: "${CAROUSEL_SHEETS_TOKEN}".to_string(),
            subscribers_table: default_subscribers_table(),
            history_table: default_history_table(),
            test_suffix: default_test_suffix(),
            request_timeout_seconds: default_request_timeout_seconds(),
        },
        matching: MatchingConfig::default(),
        notifications: NotificationsConfig {
            endpoint: "${CAROUSEL_MAIL_ENDPOINT}".to_string(),
            api_key: "${CAROUSEL_MAIL_API_KEY}".to_string(),
            from_address: "carousel@example.com".to_string(),
            from_name: Some("The Coffee Carousel".to_string()),
            subject: default_subject(),
            max_concurrent_sends: default_max_concurrent_sends(),
            send_timeout_seconds: default_send_timeout_seconds(),
        },
        logging: LoggingConfig::default(),
        monitoring: MonitoringConfig::default(),
    }
}

#[instrument]
pub fn save_config<P: AsRef<Path> + std::fmt::Debug>(config: &CarouselConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    info!("Saving configuration to: {:?}", path);

    let yaml = serde_yaml::to_string(config)
        .with_context(|| "Failed to serialize configuration to YAML")?;

    fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    info!("Configuration saved successfully");
    Ok(())
}
