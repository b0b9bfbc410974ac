pub mod decide;
pub mod inbox;
pub mod new;
pub mod pull;
pub mod sync;
pub mod week;

use anyhow::{Context, Result};
use hemcal_core::config::HemcalConfig;
use hemcal_core::store::EventStore;

/// Load config and the persisted event set. A store that fails to load is
/// fatal to the whole command.
pub fn load() -> Result<(HemcalConfig, EventStore)> {
    let config = HemcalConfig::load().context("Failed to load configuration")?;
    let store =
        EventStore::load(&config.data_path()).context("Failed to load the persisted event set")?;
    Ok((config, store))
}
