//! Configuration types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Main configuration for Assetline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project metadata, used in banners and templates
    pub project: ProjectConfig,

    /// Source and destination layout
    pub paths: PathsConfig,

    /// Stylesheet pipeline
    pub styles: StylesConfig,

    /// Script pipeline
    pub scripts: ScriptsConfig,

    /// HTML template pipeline
    pub templates: TemplatesConfig,

    /// Image pipeline
    pub images: ImagesConfig,

    /// Development server and watcher
    pub serve: ServeConfig,

    /// Deployment artefacts (integrity manifest and archive)
    pub artefacts: ArtefactsConfig,
}

/// Project metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,
    /// One-line description
    pub description: String,
    /// Version string
    pub version: String,
    /// Author
    pub author: String,
    /// License identifier
    pub license: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "site".to_string(),
            description: String::new(),
            version: "0.1.0".to_string(),
            author: String::new(),
            license: "UNLICENSED".to_string(),
        }
    }
}

/// Filesystem layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Source directory per asset category
    pub source: SourcePaths,

    /// Output root for development builds (also the served webroot)
    pub development_root: String,

    /// Output root for production builds (externally-owned deployment tree)
    pub production_root: String,

    /// Where production pages and service workers go; defaults to the
    /// development root, which is always the served webroot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_html_root: Option<String>,

    /// Asset subpath below the output root (e.g. "/static")
    pub asset_path: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: SourcePaths::default(),
            development_root: "build".to_string(),
            production_root: "deploy".to_string(),
            production_html_root: None,
            asset_path: "/static".to_string(),
        }
    }
}

/// Source directories, relative to the project root
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcePaths {
    pub css: String,
    pub js: String,
    pub html: String,
    pub img: String,
    pub fonts: String,
}

impl Default for SourcePaths {
    fn default() -> Self {
        Self {
            css: "src/scss".to_string(),
            js: "src/js".to_string(),
            html: "src/templates".to_string(),
            img: "src/img".to_string(),
            fonts: "src/fonts".to_string(),
        }
    }
}

/// An external program invocation.
///
/// Arguments may contain the placeholders `{entry}`, `{file}` and
/// `{source_dir}`. When none of `{entry}`/`{file}` is present the input is fed
/// on stdin. The payload is always read from stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program to spawn
    pub program: String,
    /// Arguments (with placeholders)
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Create a command spec
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Whether the input is passed as a path argument rather than on stdin
    pub fn takes_path_argument(&self) -> bool {
        self.args
            .iter()
            .any(|a| a.contains("{entry}") || a.contains("{file}"))
    }

    /// Human-readable command line
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Stylesheet pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StylesConfig {
    /// Style compiler (e.g. sass); `None` treats sources as plain CSS
    pub compiler: Option<CommandSpec>,

    /// Source file extension picked up by the css task
    pub extension: String,

    /// Globs (relative to the style source dir) that are never compiled
    pub exclude: Vec<String>,

    /// Browser targets for vendor prefixing, as "<browser> >= <version>"
    pub browsers: Vec<String>,

    /// Prepend the project banner comment
    pub banner: bool,

    /// Emit a `px` fallback before every declaration using `rem`
    pub rem_fallback: bool,

    /// Root font size in pixels the `rem` fallbacks are computed from
    pub root_font_size: f32,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            compiler: Some(CommandSpec::new(
                "npx",
                &[
                    "sass",
                    "--stdin",
                    "--embed-source-map",
                    "--load-path={source_dir}",
                ],
            )),
            extension: "scss".to_string(),
            exclude: vec![
                "**/_*".to_string(),
                "fonts/**".to_string(),
                "kss/**".to_string(),
            ],
            browsers: vec![
                "ie >= 9".to_string(),
                "firefox >= 20".to_string(),
                "chrome >= 4".to_string(),
                "safari >= 7".to_string(),
                "opera >= 23".to_string(),
                "ios >= 7".to_string(),
                "android >= 4.4".to_string(),
            ],
            banner: true,
            rem_fallback: true,
            root_font_size: 16.0,
        }
    }
}

/// Script pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// Main entry point, relative to the script source dir
    pub entry: String,

    /// Polyfill bundle entry point
    pub polyfills_entry: String,

    /// Directory of independently minified scripts
    pub async_dir: String,

    /// Directory of service-worker files copied to the html root
    pub service_worker_dir: String,

    /// Bundler/transpiler producing a single payload on stdout
    pub bundler: CommandSpec,

    /// Minifier reading stdin, writing stdout; `None` disables minification
    pub minifier: Option<CommandSpec>,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            entry: "app.js".to_string(),
            polyfills_entry: "polyfills/index.js".to_string(),
            async_dir: "async".to_string(),
            service_worker_dir: "sw".to_string(),
            bundler: CommandSpec::new(
                "npx",
                &[
                    "esbuild",
                    "{entry}",
                    "--bundle",
                    "--sourcemap=inline",
                    "--target=es2015,safari7",
                ],
            ),
            minifier: Some(CommandSpec::new("npx", &["esbuild", "--minify"])),
        }
    }
}

/// HTML template configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Directory of page templates, relative to the template source dir
    pub views: String,

    /// Extra values available to every page
    pub data: BTreeMap<String, serde_json::Value>,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            views: "views".to_string(),
            data: BTreeMap::new(),
        }
    }
}

/// Image pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// Recompress PNG, JPEG and GIF files and minify SVGs; when false images
    /// are copied verbatim
    pub optimize: bool,

    /// JPEG re-encoding quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            optimize: true,
            jpeg_quality: 85,
        }
    }
}

/// Development server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Inject the live-reload script into served HTML
    pub live_reload: bool,
    /// Filesystem event debounce window
    pub debounce_ms: u64,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            live_reload: true,
            debounce_ms: 200,
        }
    }
}

/// Deployment artefact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtefactsConfig {
    /// Output directory, relative to the project root
    pub dir: String,
    /// Integrity manifest file name
    pub manifest: String,
    /// Archive file name
    pub archive: String,
}

impl Default for ArtefactsConfig {
    fn default() -> Self {
        Self {
            dir: "artefacts".to_string(),
            manifest: "sri.json".to_string(),
            archive: "build.zip".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_stdin_detection() {
        let sass = CommandSpec::new("sass", &["--stdin"]);
        assert!(!sass.takes_path_argument());

        let esbuild = CommandSpec::new("esbuild", &["{entry}", "--bundle"]);
        assert!(esbuild.takes_path_argument());
        assert_eq!(esbuild.display(), "esbuild {entry} --bundle");
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str("[project]\nname = \"conventions\"\n").unwrap();
        assert_eq!(config.project.name, "conventions");
        assert_eq!(config.project.version, "0.1.0");
        assert_eq!(config.paths.asset_path, "/static");
        assert_eq!(config.serve.port, 3000);
    }

    #[test]
    fn test_plain_css_config() {
        let yaml = "styles:\n  compiler: null\n  banner: false\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.styles.compiler.is_none());
        assert!(!config.styles.banner);
        assert_eq!(config.styles.extension, "scss");
    }
}
