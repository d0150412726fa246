use serde::{Deserialize, Serialize};

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CarouselSection {
    /// Shown as the signature of every notification
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SheetConfig {
    #[serde(rename = "spreadsheet_id")]
    pub spreadsheet_id: String,
    #[serde(rename = "api_base_url")]
    #[serde(default = "default_sheets_api_base_url")]
    pub api_base_url: String,
    #[serde(rename = "access_token")]
    pub access_token: String,
    #[serde(rename = "subscribers_table")]
    #[serde(default = "default_subscribers_table")]
    pub subscribers_table: String,
    #[serde(rename = "history_table")]
    #[serde(default = "default_history_table")]
    pub history_table: String,
    /// Appended to every table name in test mode
    #[serde(rename = "test_suffix")]
    #[serde(default = "default_test_suffix")]
    pub test_suffix: String,
    #[serde(rename = "request_timeout_seconds")]
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchingConfig {
    /// `ordered` or `random`
    #[serde(rename = "tie_break")]
    #[serde(default = "default_tie_break")]
    pub tie_break: String,
    /// Seed for the `random` tie-break; drawn from entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Read `days`/`exclusive` columns and prefer shared days on ties
    #[serde(default)]
    pub availability: bool,
    /// Read the `interval` column and skip subscribers outside their week
    #[serde(default = "default_enabled")]
    pub periodic: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            tie_break: default_tie_break(),
            seed: None,
            availability: false,
            periodic: default_enabled(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationsConfig {
    /// HTTP endpoint of the transactional mail relay
    pub endpoint: String,
    #[serde(rename = "api_key")]
    pub api_key: String,
    #[serde(rename = "from_address")]
    pub from_address: String,
    #[serde(rename = "from_name")]
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default = "default_subject")]
    pub subject: String,
    #[serde(rename = "max_concurrent_sends")]
    #[serde(default = "default_max_concurrent_sends")]
    pub max_concurrent_sends: usize,
    #[serde(rename = "send_timeout_seconds")]
    #[serde(default = "default_send_timeout_seconds")]
    pub send_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `pretty`, `json` or `compact`
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MonitoringConfig {
    /// Expose Prometheus metrics on this port while the run is in progress
    #[serde(rename = "prometheus_port")]
    #[serde(default)]
    pub prometheus_port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CarouselConfig {
    pub carousel: CarouselSection,
    pub sheet: SheetConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
carousel:
  name: Union St Coffee Carousel
sheet:
  spreadsheet_id: abc123
  access_token: token
notifications:
  endpoint: https://mail.example.com/send
  api_key: key
  from_address: carousel@example.com
"#;

    #[test]
    fn test_parse_minimal_config_applies_defaults() {
        let cfg: CarouselConfig = serde_yaml::from_str(MINIMAL).unwrap();

        assert_eq!(cfg.carousel.name, "Union St Coffee Carousel");
        assert_eq!(cfg.sheet.subscribers_table, "subscribers");
        assert_eq!(cfg.sheet.history_table, "history");
        assert_eq!(cfg.sheet.test_suffix, "_TEST");
        assert_eq!(cfg.sheet.api_base_url, "https://sheets.googleapis.com/v4");

        assert_eq!(cfg.matching.tie_break, "ordered");
        assert!(cfg.matching.periodic);
        assert!(!cfg.matching.availability);
        assert!(cfg.matching.seed.is_none());

        assert_eq!(cfg.notifications.subject, "Coffee Time");
        assert_eq!(cfg.notifications.max_concurrent_sends, 5);
        assert_eq!(cfg.notifications.send_timeout_seconds, 30);

        assert_eq!(cfg.logging.format, "pretty");
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.monitoring.prometheus_port.is_none());
    }

    #[test]
    fn test_parse_matching_overrides() {
        let yaml = format!(
            "{}matching:\n  tie_break: random\n  seed: 42\n  availability: true\n  periodic: false\n",
            MINIMAL
        );
        let cfg: CarouselConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(cfg.matching.tie_break, "random");
        assert_eq!(cfg.matching.seed, Some(42));
        assert!(cfg.matching.availability);
        assert!(!cfg.matching.periodic);
    }

    #[test]
    fn test_missing_section_fails() {
        let yaml = "carousel:\n  name: x\n";
        assert!(serde_yaml::from_str::<CarouselConfig>(yaml).is_err());
    }
}
