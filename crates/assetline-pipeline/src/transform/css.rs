//! Vendor prefixing and minification with lightningcss

use std::path::Path;
use std::sync::LazyLock;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use regex::Regex;

use assetline_core::TaskError;

use super::sourcemap::split_source_map;

/// Build lightningcss targets from `"<browser> >= <version>"` queries
pub fn parse_targets(queries: &[String]) -> Result<Targets, TaskError> {
    let mut browsers = Browsers::default();
    for query in queries {
        let (name, version) = query
            .split_once(">=")
            .map(|(n, v)| (n.trim().to_ascii_lowercase(), v.trim()))
            .ok_or_else(|| invalid_target(query))?;
        let version = encode_version(version).ok_or_else(|| invalid_target(query))?;
        let slot = match name.as_str() {
            "android" => &mut browsers.android,
            "chrome" => &mut browsers.chrome,
            "edge" => &mut browsers.edge,
            "firefox" | "ff" => &mut browsers.firefox,
            "ie" => &mut browsers.ie,
            "ios" => &mut browsers.ios_saf,
            "opera" => &mut browsers.opera,
            "safari" => &mut browsers.safari,
            "samsung" => &mut browsers.samsung,
            _ => return Err(invalid_target(query)),
        };
        *slot = Some(slot.map_or(version, |v| v.min(version)));
    }
    Ok(Targets::from(browsers))
}

/// lightningcss packs versions as `major << 16 | minor << 8 | patch`
fn encode_version(version: &str) -> Option<u32> {
    let mut parts = version.split('.');
    let major: u32 = parts.next()?.parse().ok()?;
    let minor: u32 = parts.next().map_or(Some(0), |m| m.parse().ok())?;
    Some((major << 16) | (minor << 8))
}

fn invalid_target(query: &str) -> TaskError {
    TaskError::Aborted(format!("invalid browser target '{}'", query))
}

/// `prop: value` up to the next `;`, `{` or `}`
static DECLARATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(-?[A-Za-z][A-Za-z0-9-]*)(\s*:\s*)([^;{}]*)").expect("Invalid regex")
});

static REM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d*\.?\d+)rem\b").expect("Invalid regex"));

/// Add the vendor prefixes `targets` need, keeping readable output.
///
/// Input carrying an inline source map is returned untouched: rewriting it
/// would leave the map pointing at the wrong lines.
pub fn prefix(css: &str, file: &Path, targets: Targets) -> Result<String, TaskError> {
    if split_source_map(css).1.is_some() {
        return Ok(css.to_string());
    }
    process(css, file, targets, false)
}

/// Insert a `px` fallback before each declaration whose value uses `rem`.
///
/// Works on both readable and minified output; at-rule preludes and
/// selectors are left alone.
pub fn rem_fallback(css: &str, root_px: f32) -> String {
    let mut out = String::with_capacity(css.len() + css.len() / 8);
    let mut last = 0;

    for caps in DECLARATION_REGEX.captures_iter(css) {
        let (Some(whole), Some(property), Some(separator), Some(value)) =
            (caps.get(0), caps.get(1), caps.get(2), caps.get(3))
        else {
            continue;
        };
        if !REM_REGEX.is_match(value.as_str()) {
            continue;
        }
        let before = css[..whole.start()].trim_end();
        if !before.ends_with(['{', ';']) || !css[whole.end()..].starts_with([';', '}']) {
            continue;
        }

        let indent = &css[before.len()..whole.start()];
        let px = REM_REGEX.replace_all(value.as_str().trim_end(), |rem: &regex::Captures| {
            let amount: f64 = rem[1].parse().unwrap_or(0.0);
            let px = (amount * f64::from(root_px) * 1000.0).round() / 1000.0;
            format!("{}px", px)
        });

        out.push_str(&css[last..whole.start()]);
        out.push_str(property.as_str());
        out.push_str(separator.as_str());
        out.push_str(&px);
        out.push(';');
        out.push_str(indent);
        last = whole.start();
    }

    out.push_str(&css[last..]);
    out
}

/// Minify for production; source map comments are dropped
pub fn minify(css: &str, file: &Path, targets: Targets) -> Result<String, TaskError> {
    let (body, _) = split_source_map(css);
    process(body, file, targets, true)
}

fn process(css: &str, file: &Path, targets: Targets, compact: bool) -> Result<String, TaskError> {
    let filename = file.to_string_lossy().into_owned();
    let mut sheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename,
            ..ParserOptions::default()
        },
    )
    .map_err(|e| TaskError::syntax(file, e.to_string()))?;

    sheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| TaskError::syntax(file, e.to_string()))?;

    let result = sheet
        .to_css(PrinterOptions {
            minify: compact,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| TaskError::syntax(file, e.to_string()))?;

    Ok(result.code)
}
