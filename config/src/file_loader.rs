//! # Settings File Loading
//!
//! Loads framework [`Settings`] from TOML or YAML files.
//!
//! Supports automatic format detection based on file extension.

use crate::settings::Settings;
use hotconf_errors::LoadError;
use std::path::Path;
use validator::Validate;

fn read(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|_e| LoadError::FileNotFound {
        path: path.display().to_string(),
    })
}

/// Load settings from a TOML file.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Parses settings from TOML. Missing sections and fields take defaults.
///
/// ## Usage
/// ```rust,no_run
/// use hotconf::load_settings_toml;
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let settings = load_settings_toml(Path::new("hotconf.toml"))?;
///     println!("compact limit: {}", settings.generator.compact_max_length);
///     Ok(())
/// }
/// ```
///
/// ## Error Handling
/// Returns `LoadError` for:
/// - File not found
/// - Invalid TOML syntax
pub fn load_settings_toml(path: &Path) -> Result<Settings, LoadError> {
    let contents = read(path)?;
    toml::from_str(&contents).map_err(|e| LoadError::TomlParse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Load settings from a YAML file.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Parses settings from YAML. Missing sections and fields take defaults.
///
/// ## Error Handling
/// Returns `LoadError` for:
/// - File not found
/// - Invalid YAML syntax
pub fn load_settings_yaml(path: &Path) -> Result<Settings, LoadError> {
    let contents = read(path)?;
    serde_yaml::from_str(&contents).map_err(|e| LoadError::YamlParse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Load and validate settings with format auto-detection.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Loads settings from file, detecting the format from the extension, then
/// runs `validator` checks.
///
/// ## Supported Formats
/// - `.toml`: TOML format
/// - `.yaml`: YAML format
/// - `.yml`: YAML format
///
/// ## Usage
/// ```rust,no_run
/// use hotconf::load_settings;
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let settings = load_settings(Path::new("hotconf.yaml"))?;
///     println!("{:?}", settings.codec);
///     Ok(())
/// }
/// ```
///
/// ## Error Handling
/// Returns `LoadError` for:
/// - File not found
/// - Missing or unsupported extension
/// - Parse errors for detected format
/// - Values outside their validated ranges (`InvalidSettings`)
pub fn load_settings(path: &Path) -> Result<Settings, LoadError> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| LoadError::NoExtension {
            path: path.display().to_string(),
        })?;

    let settings = match extension.to_lowercase().as_str() {
        "toml" => load_settings_toml(path)?,
        "yaml" | "yml" => load_settings_yaml(path)?,
        other => {
            return Err(LoadError::UnsupportedFormat {
                extension: other.to_string(),
            });
        }
    };

    settings.validate().map_err(|e| LoadError::InvalidSettings {
        reason: e.to_string(),
    })?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_settings_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hotconf.toml");

        let toml_content = r#"
[codec]
max_map_search_depth = 4
skip_updating_with_invalid_items = false

[generator]
readable_map_format = false
compact_max_length = 80
preferred_codec_orders = ["secret", "aes"]

[keys]
encrypt_key = "00112233445566778899aabbccddeeff"
"#;
        fs::write(&path, toml_content).unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.codec.max_map_search_depth, 4);
        assert!(!settings.codec.skip_updating_with_invalid_items);
        assert!(!settings.generator.readable_map_format);
        assert_eq!(settings.generator.compact_max_length, 80);
        assert_eq!(settings.generator.preferred_codec_orders, vec!["secret", "aes"]);
        assert_eq!(
            settings.keys.encrypt_key.as_deref(),
            Some("00112233445566778899aabbccddeeff")
        );
    }

    #[test]
    fn test_load_settings_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hotconf.yml");

        let yaml_content = r#"
codec:
  max_map_search_depth: 12
generator:
  sorted_map_format: false
  starting_index: 1
"#;
        fs::write(&path, yaml_content).unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.codec.max_map_search_depth, 12);
        assert!(!settings.generator.sorted_map_format);
        assert_eq!(settings.generator.starting_index, 1);
        assert!(settings.generator.readable_list_format);
    }

    #[test]
    fn test_load_settings_rejects_invalid_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hotconf.toml");
        fs::write(&path, "[codec]\nmax_map_search_depth = 50\n").unwrap();

        let result = load_settings(&path);
        assert!(matches!(result, Err(LoadError::InvalidSettings { .. })));
    }

    #[test]
    fn test_load_settings_unsupported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hotconf.json");
        fs::write(&path, "{}").unwrap();

        let result = load_settings(&path);
        assert!(matches!(result, Err(LoadError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_load_settings_no_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hotconf");
        fs::write(&path, "").unwrap();

        let result = load_settings(&path);
        assert!(matches!(result, Err(LoadError::NoExtension { .. })));
    }

    #[test]
    fn test_load_settings_toml_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hotconf.toml");
        fs::write(&path, "[invalid\n").unwrap();

        let result = load_settings_toml(&path);
        assert!(matches!(result, Err(LoadError::TomlParse { .. })));
    }

    #[test]
    fn test_load_settings_yaml_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hotconf.yaml");
        fs::write(&path, "codec: [unmatched\n").unwrap();

        let result = load_settings_yaml(&path);
        assert!(matches!(result, Err(LoadError::YamlParse { .. })));
    }

    #[test]
    fn test_load_settings_not_found() {
        let path = Path::new("/nonexistent/path/hotconf.toml");
        let result = load_settings(path);
        assert!(matches!(result, Err(LoadError::FileNotFound { .. })));
    }
}
