use crate::config::{Config, ID_PLACEHOLDER, MonitoringConfig, ResourceTemplate, RuntimeConfig, TemplateCatalog};
use crate::error::{Error, Result};

/// Validates a single resource template
pub fn validate_template(template: &ResourceTemplate) -> Result<()> {
    if !template.name_pattern.contains(ID_PLACEHOLDER) {
        return Err(Error::ConfigInvalid(format!(
            "Template '{}' name pattern '{}' has no {} placeholder",
            template.type_name, template.name_pattern, ID_PLACEHOLDER
        )));
    }

    if template.image.trim().is_empty() {
        return Err(Error::ConfigInvalid(format!(
            "Template '{}' has empty image",
            template.type_name
        )));
    }

    Ok(())
}

/// Validates the resource type catalog
pub fn validate_catalog(catalog: &TemplateCatalog) -> Result<()> {
    if catalog.is_empty() {
        return Err(Error::ConfigInvalid("No resource templates configured".to_string()));
    }

    for template in catalog.templates() {
        validate_template(template)?;
    }

    Ok(())
}

/// Validates thresholds and sampling settings
pub fn validate_monitoring(config: &MonitoringConfig) -> Result<()> {
    for (metric, ceiling) in config.thresholds.iter() {
        if !ceiling.is_finite() || !(0.0..=100.0).contains(&ceiling) {
            return Err(Error::ConfigInvalid(format!(
                "Threshold for {} must be a percentage, got {}",
                metric, ceiling
            )));
        }
    }

    if config.alert_log_capacity == Some(0) {
        return Err(Error::ConfigInvalid("Alert log capacity must be positive".to_string()));
    }

    Ok(())
}

/// Validates runtime backend settings
pub fn validate_runtime(config: &RuntimeConfig) -> Result<()> {
    if config.binary.trim().is_empty() {
        return Err(Error::ConfigInvalid("Runtime binary is empty".to_string()));
    }

    // Stops must stay bounded
    if config.stop_timeout_secs == 0 {
        return Err(Error::ConfigInvalid("Stop timeout must be at least one second".to_string()));
    }

    Ok(())
}

/// Full configuration validation
pub fn validate_config(config: &Config) -> Result<()> {
    validate_catalog(&config.templates)?;
    validate_monitoring(&config.monitoring)?;
    validate_runtime(&config.runtime)?;

    if let Some(api) = &config.api {
        if api.port == 0 {
            return Err(Error::ConfigInvalid("API port must be non-zero".to_string()));
        }
    }

    Ok(())
}
