//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Browser names accepted in `styles.browsers`
pub const KNOWN_BROWSERS: &[&str] = &[
    "android", "chrome", "edge", "firefox", "ff", "ie", "ios", "opera", "safari", "samsung",
];

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_paths(config)?;
    validate_styles(config)?;
    validate_images(config)?;
    validate_serve(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> crate::error::AssetlineError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
    .into()
}

fn validate_paths(config: &Config) -> Result<()> {
    let paths = &config.paths;
    let sources = [
        ("paths.source.css", &paths.source.css),
        ("paths.source.js", &paths.source.js),
        ("paths.source.html", &paths.source.html),
        ("paths.source.img", &paths.source.img),
        ("paths.source.fonts", &paths.source.fonts),
    ];
    for (field, value) in sources {
        if value.trim().is_empty() {
            return Err(invalid(field, "source directory cannot be empty"));
        }
    }

    if paths.development_root.trim().is_empty() {
        return Err(invalid("paths.development_root", "cannot be empty"));
    }
    if paths.production_root.trim().is_empty() {
        return Err(invalid("paths.production_root", "cannot be empty"));
    }
    if paths.development_root.trim_end_matches('/') == paths.production_root.trim_end_matches('/') {
        return Err(invalid(
            "paths.production_root",
            "must differ from paths.development_root",
        ));
    }

    if paths
        .production_html_root
        .as_deref()
        .is_some_and(|root| root.trim().is_empty())
    {
        return Err(invalid("paths.production_html_root", "cannot be empty"));
    }

    if !paths.asset_path.starts_with('/') {
        return Err(invalid("paths.asset_path", "must start with '/'"));
    }

    Ok(())
}

fn validate_styles(config: &Config) -> Result<()> {
    if config.styles.browsers.is_empty() {
        return Err(invalid("styles.browsers", "at least one target is required"));
    }

    for target in &config.styles.browsers {
        let Some((name, version)) = target.split_once(">=") else {
            return Err(invalid(
                "styles.browsers",
                format!("'{}' is not of the form '<browser> >= <version>'", target),
            ));
        };
        let name = name.trim().to_lowercase();
        if !KNOWN_BROWSERS.contains(&name.as_str()) {
            return Err(invalid(
                "styles.browsers",
                format!("unknown browser '{}'", name),
            ));
        }
        if version.trim().split('.').any(|p| p.parse::<u32>().is_err()) {
            return Err(invalid(
                "styles.browsers",
                format!("invalid version in '{}'", target),
            ));
        }
    }

    if config.styles.extension.trim().is_empty() {
        return Err(invalid("styles.extension", "cannot be empty"));
    }

    let root = config.styles.root_font_size;
    if !root.is_finite() || root <= 0.0 {
        return Err(invalid("styles.root_font_size", "must be a positive number"));
    }

    Ok(())
}

fn validate_images(config: &Config) -> Result<()> {
    if !(1..=100).contains(&config.images.jpeg_quality) {
        return Err(invalid("images.jpeg_quality", "must be between 1 and 100"));
    }
    Ok(())
}

fn validate_serve(config: &Config) -> Result<()> {
    if config.serve.port == 0 {
        return Err(invalid("serve.port", "must not be 0"));
    }
    if config.serve.host.trim().is_empty() {
        return Err(invalid("serve.host", "cannot be empty"));
    }
    Ok(())
}
