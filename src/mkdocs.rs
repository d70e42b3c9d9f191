//! Reads the extension's options from an `mkdocs.yml`.
//!
//! MkDocs lists extensions under `markdown_extensions`, either as bare names
//! or as single-key mappings carrying options:
//!
//! ```yaml
//! markdown_extensions:
//!   - toc
//!   - preserve_blank_lines:
//!       height_per_blank: 1
//!       unit: em
//!       max_blanks: 50
//! ```

use crate::markdown::BlankLineOptions;
use anyhow::{Context, Result};
use serde_yaml::Value;
use std::path::Path;

pub const EXTENSION_NAME: &str = "preserve_blank_lines";

pub fn load_extension_options(path: &Path) -> Result<Option<BlankLineOptions>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read mkdocs config: {:?}", path))?;
    extension_options(&content).with_context(|| format!("Failed to parse mkdocs config: {:?}", path))
}

/// Options of the `preserve_blank_lines` entry, `None` when it is not enabled.
pub fn extension_options(yaml: &str) -> Result<Option<BlankLineOptions>> {
    let doc: Value = serde_yaml::from_str(yaml).context("Invalid YAML")?;

    let Some(extensions) = doc.get("markdown_extensions") else {
        return Ok(None);
    };

    match extensions {
        Value::Sequence(entries) => {
            for entry in entries {
                match entry {
                    Value::String(name) if is_extension_name(name) => {
                        return Ok(Some(BlankLineOptions::default()));
                    }
                    Value::Mapping(map) => {
                        if let Some(options) = find_in_mapping(map) {
                            return Ok(Some(options));
                        }
                    }
                    _ => {}
                }
            }
            Ok(None)
        }
        Value::Mapping(map) => Ok(find_in_mapping(map)),
        _ => Ok(None),
    }
}

fn is_extension_name(name: &str) -> bool {
    name == EXTENSION_NAME || name.ends_with(&format!(".{}", EXTENSION_NAME))
}

fn find_in_mapping(map: &serde_yaml::Mapping) -> Option<BlankLineOptions> {
    map.iter()
        .find(|(key, _)| key.as_str().is_some_and(is_extension_name))
        .map(|(_, value)| options_from_value(value))
}

fn options_from_value(value: &Value) -> BlankLineOptions {
    match value {
        Value::Null => BlankLineOptions::default(),
        Value::Mapping(_) => BlankLineOptions {
            height_per_blank: field(value, "height_per_blank"),
            unit: field(value, "unit"),
            max_blanks: field(value, "max_blanks"),
        },
        other => {
            tracing::warn!(
                "Ignoring non-mapping options for {}: {:?}",
                EXTENSION_NAME,
                other
            );
            BlankLineOptions::default()
        }
    }
}

// Unconvertible values are dropped here and defaulted later
fn field(options: &Value, key: &str) -> Option<serde_json::Value> {
    let raw = options.get(key)?;
    serde_json::to_value(raw)
        .inspect_err(|e| tracing::warn!("Ignoring {} option {}: {}", EXTENSION_NAME, key, e))
        .ok()
        .filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::BlankLineSettings;
    use serde_json::json;

    #[test]
    fn test_options_from_mapping_entry() {
        let yaml = r#"
site_name: Docs
markdown_extensions:
  - toc:
      permalink: true
  - preserve_blank_lines:
      height_per_blank: 0.5
      unit: rem
      max_blanks: 10
"#;
        let options = extension_options(yaml).unwrap().unwrap();
        assert_eq!(options.height_per_blank, Some(json!(0.5)));
        assert_eq!(options.unit, Some(json!("rem")));
        assert_eq!(options.max_blanks, Some(json!(10)));
    }

    #[test]
    fn test_bare_entry_uses_defaults() {
        let yaml = "markdown_extensions:\n  - admonition\n  - preserve_blank_lines\n";
        let options = extension_options(yaml).unwrap().unwrap();
        assert!(options.is_empty());
    }

    #[test]
    fn test_null_options_use_defaults() {
        let yaml = "markdown_extensions:\n  - preserve_blank_lines:\n";
        let options = extension_options(yaml).unwrap().unwrap();
        assert!(options.is_empty());
    }

    #[test]
    fn test_dotted_module_path() {
        let yaml = "markdown_extensions:\n  - extensions.preserve_blank_lines:\n      unit: px\n";
        let options = extension_options(yaml).unwrap().unwrap();
        assert_eq!(options.unit, Some(json!("px")));
    }

    #[test]
    fn test_mapping_form() {
        let yaml = "markdown_extensions:\n  preserve_blank_lines:\n    max_blanks: 3\n";
        let options = extension_options(yaml).unwrap().unwrap();
        assert_eq!(options.max_blanks, Some(json!(3)));
    }

    #[test]
    fn test_not_enabled() {
        assert!(extension_options("site_name: Docs\n").unwrap().is_none());
        assert!(
            extension_options("markdown_extensions:\n  - toc\n")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_python_tags_do_not_break_parsing() {
        let yaml = r#"
markdown_extensions:
  - pymdownx.emoji:
      emoji_index: !!python/name:material.extensions.emoji.twemoji
  - preserve_blank_lines:
      unit: px
"#;
        let options = extension_options(yaml).unwrap().unwrap();
        assert_eq!(options.unit, Some(json!("px")));
    }

    #[test]
    fn test_bad_values_coerce_to_defaults() {
        let yaml = "markdown_extensions:\n  - preserve_blank_lines:\n      height_per_blank: lots\n      max_blanks: [1, 2]\n";
        let options = extension_options(yaml).unwrap().unwrap();
        let settings = BlankLineSettings::from_options(&options);
        assert_eq!(settings, BlankLineSettings::default());
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        assert!(extension_options("markdown_extensions: [unclosed").is_err());
    }
}
