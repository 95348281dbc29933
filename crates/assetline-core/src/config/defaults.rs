//! Default configuration values

use super::types::Config;

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "assetline.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "assetline.yaml";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".assetline.toml",
        ".assetline.yaml",
    ]
}

/// Generate default configuration TOML
pub fn default_config_toml() -> String {
    toml::to_string_pretty(&Config::default()).unwrap_or_else(|_| DEFAULT_CONFIG_TEMPLATE.to_string())
}

/// Default configuration template
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Assetline Configuration

[project]
name = "site"
version = "0.1.0"

[paths]
development_root = "build"
production_root = "deploy"
asset_path = "/static"

[paths.source]
css = "src/scss"
js = "src/js"
html = "src/templates"
img = "src/img"
fonts = "src/fonts"

[serve]
host = "127.0.0.1"
port = 3000
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.paths.development_root, "build");
        assert_eq!(config.serve.port, 3000);
    }

    #[test]
    fn test_default_config_round_trips() {
        let rendered = default_config_toml();
        let config: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(config.scripts.entry, "app.js");
    }
}
