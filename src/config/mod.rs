//! Configuration layer for stig-consolidate.
//!
//! ## Layers
//! - `types`: Configuration type definitions
//! - `loading`: File loading logic
//! - `severity`: Severity inference policy

mod error;
mod loading;
mod severity;
mod types;

pub use error::ConfigError;
pub use severity::SeverityPolicy;
pub use types::{Config, DiscoveryConfig, MergeConfig, OutputConfig, SelectorConfig};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolTier;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.severity.high_weight_min, 10.0);
        assert!(config.severity.medium_weight_min.is_none());
        assert!(config.selector.enhanced_keywords.contains(&"consolidated".to_string()));
        assert!(config.discovery.extensions.contains(&"ckl".to_string()));
        assert!(config.output.pretty_json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_yaml_config() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(".stig-consolidate.yaml");
        fs::write(
            &config_path,
            r#"
merge:
  tool_tiers:
    ACAS: scap
    Internal Review: manual
severity:
  medium_weight_min: 5.0
"#,
        )
        .unwrap();

        let config = Config::from_file(&config_path).unwrap();
        assert_eq!(config.merge.tool_tiers.get("ACAS"), Some(&ToolTier::Scap));
        assert_eq!(config.severity.medium_weight_min, Some(5.0));

        let precedence = config.merge.precedence();
        assert_eq!(precedence.tier_of("internal review"), ToolTier::Manual);
    }

    #[test]
    fn test_load_json_config() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(".stig-consolidate.json");
        fs::write(
            &config_path,
            r#"{"output": {"directory": "out", "pretty_json": false}}"#,
        )
        .unwrap();

        let config = Config::from_file(&config_path).unwrap();
        assert_eq!(config.output.directory, std::path::PathBuf::from("out"));
        assert!(!config.output.pretty_json);
    }

    #[test]
    fn test_load_toml_config() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(".stig-consolidate.toml");
        fs::write(
            &config_path,
            r#"
[selector]
vendor_markers = ["acme"]

[discovery]
extensions = ["ckl"]
max_depth = 2
"#,
        )
        .unwrap();

        let config = Config::from_file(&config_path).unwrap();
        assert_eq!(config.selector.vendor_markers, vec!["acme".to_string()]);
        // Unset fields keep their defaults
        assert_eq!(config.selector.enhanced_keywords.len(), 3);
        assert_eq!(config.discovery.max_depth, Some(2));
    }

    #[test]
    fn test_load_with_project_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(".stig-consolidate.yaml"),
            "severity:\n  high_weight_min: 8.0\n",
        )
        .unwrap();

        let config = Config::load(Some(dir.path()));
        assert_eq!(config.severity.high_weight_min, 8.0);
    }

    #[test]
    fn test_load_skips_invalid_project_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(".stig-consolidate.yaml"),
            "severity:\n  high_weight_min: 5.0\n  medium_weight_min: 7.0\n",
        )
        .unwrap();

        let config = Config::load(Some(dir.path()));
        assert!(config.severity.medium_weight_min.is_none());
    }

    #[test]
    fn test_unsupported_format_error() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(".stig-consolidate.xml");
        fs::write(&config_path, "<config></config>").unwrap();

        let result = Config::from_file(&config_path);
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_, _))));
    }

    #[test]
    fn test_inverted_weight_band_rejected() {
        let mut config = Config::default();
        config.severity.medium_weight_min = Some(12.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_empty_extensions_rejected() {
        let mut config = Config::default();
        config.discovery.extensions.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_yaml_error() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(".stig-consolidate.yaml");
        fs::write(&config_path, "merge: [unclosed").unwrap();

        let result = Config::from_file(&config_path);
        assert!(matches!(result, Err(ConfigError::ParseYaml { .. })));
    }

    #[test]
    fn test_config_error_read_file() {
        let result = Config::from_file(std::path::Path::new("/nonexistent/.stig-consolidate.yaml"));
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }
}
