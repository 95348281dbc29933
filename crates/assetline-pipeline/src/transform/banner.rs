//! Stylesheet banner

use chrono::{DateTime, Utc};

use assetline_core::config::ProjectConfig;

/// Banner naming the project, version, author and build time.
///
/// Written as a `/*!` comment so production minification keeps it.
pub fn banner(project: &ProjectConfig, built_at: DateTime<Utc>) -> String {
    let name = if project.description.is_empty() {
        project.name.clone()
    } else {
        format!("{}: {}", project.name, project.description)
    };
    format!(
        "/*!\n * @name {}\n * @version {}: {}\n * @author {}\n * @license {}\n */\n",
        name,
        project.version,
        built_at.to_rfc2822(),
        project.author,
        project.license
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_banner_fields() {
        let project = ProjectConfig {
            name: "conventions".to_string(),
            description: "Front-end conventions".to_string(),
            author: "Web Team".to_string(),
            ..ProjectConfig::default()
        };
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let text = banner(&project, at);

        assert!(text.starts_with("/*!\n"));
        assert!(text.contains("@name conventions: Front-end conventions"));
        assert!(text.contains("@version 0.1.0: Wed, 1 May 2024 12:00:00 +0000"));
        assert!(text.contains("@license UNLICENSED"));
        assert!(text.ends_with(" */\n"));
    }
}
