//! Build mode and asset categories

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which flavour of output a run produces.
///
/// Chosen once per process and passed explicitly to every task; it selects the
/// destination tree and whether minification runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Local build served from the static output tree
    #[default]
    Development,
    /// Minified build written to the deployment tree
    Production,
}

impl BuildMode {
    /// Get the mode name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    /// Whether minification and source-map stripping are active
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown build mode '{}'", other)),
        }
    }
}

/// Asset category handled by one asset task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Css,
    Js,
    Html,
    Img,
    Fonts,
}

impl AssetCategory {
    /// Get all categories in declaration order
    pub fn all() -> &'static [AssetCategory] {
        &[Self::Css, Self::Js, Self::Html, Self::Img, Self::Fonts]
    }

    /// Get the category name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Js => "js",
            Self::Html => "html",
            Self::Img => "img",
            Self::Fonts => "fonts",
        }
    }

    /// Subdirectory of the asset path this category is written to.
    ///
    /// HTML is rendered at the output root and has none.
    pub fn asset_dir(&self) -> Option<&'static str> {
        match self {
            Self::Html => None,
            other => Some(other.as_str()),
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
