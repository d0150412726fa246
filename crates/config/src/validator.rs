use crate::*;
use regex::Regex;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    #[error("Carousel name is required")]
    MissingCarouselName,

    #[error("sheet.spreadsheet_id is required")]
    MissingSpreadsheetId,

    #[error("{field} must not be empty")]
    EmptyTableName { field: String },

    #[error("subscribers_table and history_table must differ, both are '{0}'")]
    TableNamesCollide(String),

    #[error("{field} is not a valid http(s) URL: {value}")]
    InvalidUrl { field: String, value: String },

    #[error("Invalid tie_break: {0}. Must be one of: ordered, random")]
    InvalidTieBreak(String),

    #[error("Invalid sender address: {0}")]
    InvalidSenderAddress(String),

    #[error("{field} must be a positive integer")]
    InvalidPositiveInteger { field: String },

    #[error("Invalid log format: {0}. Must be one of: pretty, json, compact")]
    InvalidLogFormat(String),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Environment variable placeholder left unresolved in {field}")]
    UnresolvedEnvVar { field: String },
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct DefaultApplied {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    pub defaults_applied: Vec<DefaultApplied>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            defaults_applied: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_default(&mut self, field: &str, value: &str) {
        self.defaults_applied.push(DefaultApplied {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

pub fn validate_config(config: &CarouselConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_carousel(&config.carousel, &mut report);
    validate_sheet(&config.sheet, &mut report);
    validate_matching(&config.matching, &mut report);
    validate_notifications(&config.notifications, &mut report);
    validate_logging(&config.logging, &mut report);

    report
}

/// Everything `validate_config` checks, plus the mail credentials a
/// deploy run sends with
pub fn validate_deploy_config(config: &CarouselConfig) -> ValidationReport {
    let mut report = validate_config(config);
    check_resolved("notifications.endpoint", &config.notifications.endpoint, &mut report);
    check_resolved("notifications.api_key", &config.notifications.api_key, &mut report);
    report
}

fn validate_carousel(carousel: &CarouselSection, report: &mut ValidationReport) {
    if carousel.name.trim().is_empty() {
        report.add_error(ValidationError::MissingCarouselName);
    }
}

fn validate_sheet(sheet: &SheetConfig, report: &mut ValidationReport) {
    if sheet.spreadsheet_id.trim().is_empty() {
        report.add_error(ValidationError::MissingSpreadsheetId);
    }

    check_resolved("sheet.spreadsheet_id", &sheet.spreadsheet_id, report);
    check_resolved("sheet.access_token", &sheet.access_token, report);
    check_url("sheet.api_base_url", &sheet.api_base_url, report);

    if sheet.subscribers_table.trim().is_empty() {
        report.add_error(ValidationError::EmptyTableName {
            field: "sheet.subscribers_table".to_string(),
        });
    }
    if sheet.history_table.trim().is_empty() {
        report.add_error(ValidationError::EmptyTableName {
            field: "sheet.history_table".to_string(),
        });
    }
    if sheet.subscribers_table == sheet.history_table {
        report.add_error(ValidationError::TableNamesCollide(sheet.history_table.clone()));
    }

    if sheet.test_suffix.is_empty() {
        report.add_warning(
            "sheet.test_suffix",
            "Empty test suffix: test runs will read and write the production tables",
        );
    }

    if sheet.request_timeout_seconds == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "sheet.request_timeout_seconds".to_string(),
        });
    }
}

fn validate_matching(matching: &MatchingConfig, report: &mut ValidationReport) {
    match matching.tie_break.as_str() {
        "ordered" => {
            if matching.seed.is_some() {
                report.add_warning(
                    "matching.seed",
                    "A seed has no effect with the ordered tie-break",
                );
            }
        }
        "random" => {
            if matching.seed.is_none() {
                report.add_default("matching.seed", "drawn from entropy");
            }
        }
        other => report.add_error(ValidationError::InvalidTieBreak(other.to_string())),
    }

    if !matching.periodic && !matching.availability {
        report.add_warning(
            "matching",
            "Neither periodic nor availability modelling is enabled: every subscriber is paired every run",
        );
    }
}

fn validate_notifications(notifications: &NotificationsConfig, report: &mut ValidationReport) {
    // Test runs only log notifications, so unresolved mail credentials are
    // an error for deploy runs alone
    for (field, value) in [
        ("notifications.endpoint", &notifications.endpoint),
        ("notifications.api_key", &notifications.api_key),
    ] {
        if has_unresolved_env_vars(value) {
            report.add_warning(field, "Environment variable unresolved, required for deploy runs");
        }
    }
    if !has_unresolved_env_vars(&notifications.endpoint) {
        check_url("notifications.endpoint", &notifications.endpoint, report);
    }

    let email_regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex");
    if !email_regex.is_match(&notifications.from_address) {
        report.add_error(ValidationError::InvalidSenderAddress(
            notifications.from_address.clone(),
        ));
    }

    if notifications.max_concurrent_sends == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "notifications.max_concurrent_sends".to_string(),
        });
    }
    if notifications.send_timeout_seconds == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "notifications.send_timeout_seconds".to_string(),
        });
    }

    if notifications.from_name.is_none() {
        report.add_default("notifications.from_name", "carousel.name");
    }
}

fn validate_logging(logging: &LoggingConfig, report: &mut ValidationReport) {
    let valid_formats = ["pretty", "json", "compact"];
    if !valid_formats.contains(&logging.format.to_lowercase().as_str()) {
        report.add_error(ValidationError::InvalidLogFormat(logging.format.clone()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&logging.level.to_lowercase().as_str()) {
        report.add_error(ValidationError::InvalidLogLevel(logging.level.clone()));
    }
}

fn check_resolved(field: &str, value: &str, report: &mut ValidationReport) {
    if has_unresolved_env_vars(value) {
        report.add_error(ValidationError::UnresolvedEnvVar {
            field: field.to_string(),
        });
    }
}

fn check_url(field: &str, value: &str, report: &mut ValidationReport) {
    let valid = Url::parse(value)
        .map(|u| u.scheme() == "http" || u.scheme() == "https")
        .unwrap_or(false);
    if !valid {
        report.add_error(ValidationError::InvalidUrl {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}
