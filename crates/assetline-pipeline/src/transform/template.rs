//! Page templating
//!
//! The built-in renderer understands three constructs:
//!
//! - `{{ name }}` and `{{ dotted.path }}` substitution (unknown values render empty)
//! - `{% include "partial.html" %}` resolved against the templates root
//! - `{# comment #}` removal

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::trace;

use assetline_core::TaskError;

/// Maximum nesting of includes before rendering is refused
pub const MAX_INCLUDE_DEPTH: usize = 16;

/// Renders a page body with its data
pub trait TemplateRenderer: Send + Sync {
    /// Render `source` (read from `file`) against `data`
    fn render(&self, source: &str, file: &Path, data: &Value) -> Result<String, TaskError>;
}

/// Renderer for the `{{ }}` / `{% include %}` / `{# #}` syntax
#[derive(Debug, Clone)]
pub struct BuiltinRenderer {
    root: PathBuf,
    max_depth: usize,
}

impl BuiltinRenderer {
    /// Renderer resolving includes against `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_depth: MAX_INCLUDE_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    fn render_at(
        &self,
        source: &str,
        file: &Path,
        data: &Value,
        depth: usize,
    ) -> Result<String, TaskError> {
        let mut out = String::with_capacity(source.len());
        let mut rest = source;

        while let Some(start) = rest.find('{') {
            let (open, close) = match rest[start..].get(..2) {
                Some("{{") => ("{{", "}}"),
                Some("{%") => ("{%", "%}"),
                Some("{#") => ("{#", "#}"),
                _ => {
                    out.push_str(&rest[..=start]);
                    rest = &rest[start + 1..];
                    continue;
                }
            };

            out.push_str(&rest[..start]);
            let inner_start = start + open.len();
            let inner_len = rest[inner_start..].find(close).ok_or_else(|| {
                TaskError::syntax(file, format!("unclosed '{}' tag", open))
            })?;
            let inner = rest[inner_start..inner_start + inner_len].trim();
            rest = &rest[inner_start + inner_len + close.len()..];

            match open {
                "{{" => out.push_str(&render_value(lookup(data, inner))),
                "{%" => out.push_str(&self.render_tag(inner, file, data, depth)?),
                _ => {}
            }
        }

        out.push_str(rest);
        Ok(out)
    }

    fn render_tag(
        &self,
        tag: &str,
        file: &Path,
        data: &Value,
        depth: usize,
    ) -> Result<String, TaskError> {
        let Some(arg) = tag.strip_prefix("include") else {
            return Err(TaskError::syntax(file, format!("unsupported tag '{}'", tag)));
        };
        let name = arg
            .trim()
            .strip_prefix('"')
            .and_then(|a| a.strip_suffix('"'))
            .ok_or_else(|| TaskError::syntax(file, format!("malformed include '{}'", tag)))?;

        if depth >= self.max_depth {
            return Err(TaskError::syntax(
                file,
                format!("include depth exceeded at '{}'", name),
            ));
        }

        let path = self.root.join(name);
        trace!(include = %path.display(), depth, "including");
        let source = fs::read_to_string(&path).map_err(|e| {
            TaskError::syntax(file, format!("cannot include '{}': {}", name, e))
        })?;
        self.render_at(&source, &path, data, depth + 1)
    }
}

impl TemplateRenderer for BuiltinRenderer {
    fn render(&self, source: &str, file: &Path, data: &Value) -> Result<String, TaskError> {
        self.render_at(source, file, data, 0)
    }
}

fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(data, |value, key| value.as_object()?.get(key.trim()))
}

fn render_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_substitution() {
        let renderer = BuiltinRenderer::new("/unused");
        let data = json!({"title": "Home", "site": {"asset_path": "/static"}, "count": 3});
        let out = renderer
            .render(
                "<h1>{{ title }}</h1><link href=\"{{site.asset_path}}/css/main.css\">{{ count }}",
                Path::new("index.html"),
                &data,
            )
            .unwrap();
        assert_eq!(
            out,
            "<h1>Home</h1><link href=\"/static/css/main.css\">3"
        );
    }

    #[test]
    fn test_unknown_value_renders_empty() {
        let renderer = BuiltinRenderer::new("/unused");
        let out = renderer
            .render("[{{ missing.value }}]", Path::new("a.html"), &json!({}))
            .unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_comments_removed_and_braces_kept() {
        let renderer = BuiltinRenderer::new("/unused");
        let out = renderer
            .render(
                "<style>a { color: red }</style>{# note #}",
                Path::new("a.html"),
                &json!({}),
            )
            .unwrap();
        assert_eq!(out, "<style>a { color: red }</style>");
    }

    #[test]
    fn test_include_resolves_against_root() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("partials")).unwrap();
        fs::write(
            temp.path().join("partials/header.html"),
            "<header>{{ title }}</header>",
        )
        .unwrap();

        let renderer = BuiltinRenderer::new(temp.path());
        let out = renderer
            .render(
                "{% include \"partials/header.html\" %}<main></main>",
                Path::new("views/index.html"),
                &json!({"title": "Home"}),
            )
            .unwrap();
        assert_eq!(out, "<header>Home</header><main></main>");
    }

    #[test]
    fn test_missing_include_is_syntax_error() {
        let temp = TempDir::new().unwrap();
        let renderer = BuiltinRenderer::new(temp.path());
        let err = renderer
            .render("{% include \"nope.html\" %}", Path::new("index.html"), &json!({}))
            .unwrap_err();
        match err {
            TaskError::SourceSyntax { file, message } => {
                assert_eq!(file, Path::new("index.html"));
                assert!(message.contains("nope.html"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_recursive_include_is_bounded() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("loop.html"), "{% include \"loop.html\" %}").unwrap();

        let renderer = BuiltinRenderer::new(temp.path()).with_max_depth(4);
        let err = renderer
            .render("{% include \"loop.html\" %}", Path::new("index.html"), &json!({}))
            .unwrap_err();
        assert!(err.to_string().contains("depth"));
    }

    #[test]
    fn test_unclosed_tag() {
        let renderer = BuiltinRenderer::new("/unused");
        let err = renderer
            .render("{{ title", Path::new("a.html"), &json!({}))
            .unwrap_err();
        assert!(err.to_string().contains("unclosed"));
    }
}
