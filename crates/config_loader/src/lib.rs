//! # Config Loader
//!
//! Scan profile loading and parsing.
//!
//! Responsibilities:
//! - Parse TOML/JSON profile files
//! - Validate profile legality
//! - Produce a [`ScanProfile`]
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let profile = ConfigLoader::load_from_path(Path::new("profile.toml")).unwrap();
//! println!("mock mode: {}", profile.tracker.mock);
//! ```

mod parser;
mod validator;

pub use contracts::ScanProfile;
pub use parser::ConfigFormat;

use contracts::ScanError;
use std::path::Path;

/// Profile loader
///
/// Provides static methods to load a scan profile from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a profile from a file path.
    ///
    /// Automatically detects format from the file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<ScanProfile, ScanError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load a profile from a string.
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<ScanProfile, ScanError> {
        let profile = parser::parse(content, format)?;
        validator::validate(&profile)?;
        Ok(profile)
    }

    /// Serialize a profile to a TOML string.
    pub fn to_toml(profile: &ScanProfile) -> Result<String, ScanError> {
        toml::to_string_pretty(profile)
            .map_err(|e| ScanError::configuration(format!("TOML serialize error: {e}")))
    }

    /// Serialize a profile to a JSON string.
    pub fn to_json(profile: &ScanProfile) -> Result<String, ScanError> {
        serde_json::to_string_pretty(profile)
            .map_err(|e| ScanError::configuration(format!("JSON serialize error: {e}")))
    }

    /// Infer profile format from the file extension.
    fn detect_format(path: &Path) -> Result<ConfigFormat, ScanError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ScanError::configuration("cannot determine profile format from extension")
        })?;

        ConfigFormat::from_extension(ext)
            .ok_or_else(|| ScanError::configuration(format!("unsupported profile format: .{ext}")))
    }
}
