use anyhow::{Context, Result};
use regex::Regex;
use std::env;
use tracing::{debug, warn};

const ENV_VAR_PATTERN: &str = r"\$\{(\w+)\}|\$(\w+)";

/// Substitute environment variables in the format ${VAR_NAME} or $VAR_NAME
///
/// Unset variables keep their placeholder; the validator reports them.
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(ENV_VAR_PATTERN).context("Invalid env var pattern")?;
    let mut missing_vars = Vec::new();

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let placeholder = &caps[0];
        let var_name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();

        match env::var(var_name) {
            Ok(value) => {
                debug!("Substituting environment variable: {}", var_name);
                value
            }
            Err(_) => {
                warn!("Environment variable '{}' not set", var_name);
                missing_vars.push(var_name.to_string());
                placeholder.to_string()
            }
        }
    });
    let result = result.into_owned();

    if !missing_vars.is_empty() {
        debug!(
            "Environment variables not set (may fail validation): {:?}",
            missing_vars
        );
    }

    Ok(result)
}

/// Check if a string contains unresolved environment variable placeholders
pub fn has_unresolved_env_vars(content: &str) -> bool {
    Regex::new(ENV_VAR_PATTERN)
        .map(|re| re.is_match(content))
        .unwrap_or(false)
}
