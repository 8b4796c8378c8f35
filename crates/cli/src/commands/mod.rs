//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_pipeline;
pub use validate::run_validate;

use std::path::Path;

use config_loader::ConfigLoader;
use contracts::OdometryBlueprint;

use crate::error::CliError;

/// Load and validate the configuration at `path`
fn load_config(path: &Path) -> Result<OdometryBlueprint, CliError> {
    if !path.exists() {
        return Err(CliError::config_not_found(path));
    }
    ConfigLoader::load_from_path(path).map_err(|e| CliError::config_invalid(path, e))
}
