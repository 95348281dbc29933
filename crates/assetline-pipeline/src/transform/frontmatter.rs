//! YAML front matter extraction

use std::path::Path;

use assetline_core::TaskError;

/// Page data parsed from the front matter fence, plus the remaining body
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter<'a> {
    pub data: serde_json::Map<String, serde_json::Value>,
    pub body: &'a str,
}

/// Split `---` fenced YAML off the top of a page.
///
/// Pages without a fence return empty data and the whole input as body.
pub fn split_front_matter<'a>(source: &'a str, file: &Path) -> Result<FrontMatter<'a>, TaskError> {
    let Some(rest) = source
        .strip_prefix("---\n")
        .or_else(|| source.strip_prefix("---\r\n"))
    else {
        return Ok(FrontMatter {
            data: serde_json::Map::new(),
            body: source,
        });
    };

    let (yaml, body) = find_closing_fence(rest)
        .ok_or_else(|| TaskError::syntax(file, "front matter is missing its closing '---'"))?;

    let data = if yaml.trim().is_empty() {
        serde_json::Map::new()
    } else {
        let value: serde_json::Value = serde_yaml::from_str(yaml)
            .map_err(|e| TaskError::syntax(file, format!("invalid front matter: {}", e)))?;
        match value {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => serde_json::Map::new(),
            _ => return Err(TaskError::syntax(file, "front matter must be a mapping")),
        }
    };

    Ok(FrontMatter { data, body })
}

fn find_closing_fence(rest: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}
