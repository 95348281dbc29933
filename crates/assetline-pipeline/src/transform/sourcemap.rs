//! Inline source map handling

use std::sync::LazyLock;

use regex::Regex;

/// Matches `/*# sourceMappingURL=... */` and `//# sourceMappingURL=...`
static SOURCE_MAP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(/\*[#@]\s*sourceMappingURL=[^*]*\*/|^//[#@]\s*sourceMappingURL=\S*)\s*")
        .expect("Invalid regex")
});

/// Remove every `sourceMappingURL` comment, CSS or JS style
pub fn strip_source_map(code: &str) -> String {
    SOURCE_MAP_REGEX.replace_all(code, "").trim_end().to_string() + "\n"
}

/// Split a trailing source map comment off the code
pub fn split_source_map(code: &str) -> (&str, Option<&str>) {
    let trimmed = code.trim_end();
    match SOURCE_MAP_REGEX.find_iter(trimmed).last() {
        Some(m) if trimmed[m.end()..].trim().is_empty() => {
            (&trimmed[..m.start()], Some(m.as_str().trim_end()))
        }
        _ => (code, None),
    }
}
