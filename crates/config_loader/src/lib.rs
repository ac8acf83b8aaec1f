//! # Config Loader
//!
//! Dataset configuration loading.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Produce a `DatasetConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("spd.toml")).unwrap();
//! println!("padding: {}s", config.load.padding_s);
//! ```

mod parser;
mod validator;

pub use contracts::DatasetConfig;
pub use parser::ConfigFormat;

use contracts::DatasetError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<DatasetConfig, DatasetError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<DatasetConfig, DatasetError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate a configuration built in code
    pub fn validate(config: &DatasetConfig) -> Result<(), DatasetError> {
        validator::validate(config)
    }

    /// Serialize DatasetConfig to TOML string
    pub fn to_toml(config: &DatasetConfig) -> Result<String, DatasetError> {
        toml::to_string_pretty(config)
            .map_err(|e| DatasetError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize DatasetConfig to JSON string
    pub fn to_json(config: &DatasetConfig) -> Result<String, DatasetError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| DatasetError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, DatasetError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            DatasetError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            DatasetError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, DatasetError> {
        std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DatasetError::not_found("config file", path),
            _ => DatasetError::Io(e),
        })
    }

    /// Parse and validate configuration content
    fn parse_and_validate(content: &str, format: ConfigFormat) -> Result<DatasetConfig, DatasetError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}
