//! `assetline.toml` / `assetline.yaml` loading, defaults and validation

pub mod defaults;
mod loader;
mod types;
pub mod validation;

pub use defaults::{
    config_file_names, default_config_toml, DEFAULT_CONFIG_TEMPLATE, DEFAULT_CONFIG_TOML,
    DEFAULT_CONFIG_YAML,
};
pub use loader::{find_config, load_config, load_config_or_default};
pub use types::{
    ArtefactsConfig, CommandSpec, Config, ImagesConfig, PathsConfig, ProjectConfig, ScriptsConfig,
    ServeConfig, SourcePaths, StylesConfig, TemplatesConfig,
};
pub use validation::{validate_config, KNOWN_BROWSERS};
