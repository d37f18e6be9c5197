//! Profile parsing.
//!
//! Supports TOML (primary) and JSON (secondary) formats.

use contracts::{ScanError, ScanProfile};

/// Profile file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format (recommended)
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Infer format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse a TOML profile
pub fn parse_toml(content: &str) -> Result<ScanProfile, ScanError> {
    toml::from_str(content)
        .map_err(|e| ScanError::configuration(format!("TOML parse error: {e}")))
}

/// Parse a JSON profile
pub fn parse_json(content: &str) -> Result<ScanProfile, ScanError> {
    serde_json::from_str(content)
        .map_err(|e| ScanError::configuration(format!("JSON parse error: {e}")))
}

/// Parse a profile in the given format
pub fn parse(content: &str, format: ConfigFormat) -> Result<ScanProfile, ScanError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[tracker]
mock = true

[scan]
used_sensors = [1, 2]
reference_sensor = 3
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let profile = result.unwrap();
        assert_eq!(profile.scan.used_sensors, vec![1, 2]);
        assert_eq!(profile.scan.reference_sensor, Some(3));
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "tracker": { "mock": true, "mock_seed": 7 },
            "scan": {
                "used_sensors": [1, 2, 3],
                "reference_sensor": 4
            },
            "exports": [
                { "kind": "point_cloud", "buffer": "raw", "path": "out/raw.ply" }
            ]
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        assert_eq!(result.unwrap().tracker.mock_seed, 7);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ScanError::Configuration { .. }));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let content = r#"
[tracker]
mok = true
"#;
        assert!(parse_toml(content).is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
