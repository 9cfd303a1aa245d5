use config::load_config;
use config::shared::ConfigLayer;
use tracing::debug;

use crate::error::{GeneratorError, GeneratorResult};

/// Loads and validates the client configuration layer.
///
/// Reads `configuration/base` and the environment file through [`config::load_config`],
/// including the `APP_`-prefixed environment overrides, and checks the document's structure
/// before anything is resolved.
pub fn load_client_config() -> GeneratorResult<ConfigLayer> {
    let client = load_config::<ConfigLayer>().map_err(GeneratorError::config)?;
    client.validate().map_err(GeneratorError::config)?;

    debug!(
        advanced = client.properties.is_some(),
        backfill = ?client.backfill,
        "loaded client configuration"
    );

    Ok(client)
}
