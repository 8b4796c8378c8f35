//! # Config Loader
//!
//! Turns a TOML or JSON document into a validated `OdometryBlueprint`:
//! pipeline settings, stop settings and one entry per sensor type with its
//! clear interval, acquisition timeout, calibration and rig backend.
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("odometry.toml")).unwrap();
//! println!("Driving sensor: {}", blueprint.pipeline.driving_sensor);
//! ```

mod parser;
mod validator;

pub use contracts::OdometryBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Stateless entry point; every method returns a fully validated blueprint.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Read `path`, choosing the parser from its `.toml` / `.json` extension.
    ///
    /// # Errors
    /// [`ContractError::Io`] when the file cannot be read,
    /// [`ContractError::ConfigParse`] for an unknown extension or bad syntax,
    /// [`ContractError::ConfigValidation`] when a value is out of range.
    pub fn load_from_path(path: &Path) -> Result<OdometryBlueprint, ContractError> {
        let format = Self::format_of(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Parse and validate an in-memory document
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<OdometryBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Validate an already built blueprint (e.g. after CLI overrides)
    pub fn validate(blueprint: &OdometryBlueprint) -> Result<(), ContractError> {
        validator::validate(blueprint)
    }

    pub fn to_toml(blueprint: &OdometryBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    pub fn to_json(blueprint: &OdometryBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    fn format_of(path: &Path) -> Result<ConfigFormat, ContractError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ConfigFormat::from_extension(ext).ok_or_else(|| {
                ContractError::config_parse(format!("unsupported config format: .{ext}"))
            }),
            None => Err(ContractError::config_parse(format!(
                "no extension on '{}', expected .toml or .json",
                path.display()
            ))),
        }
    }
}
