use std::sync::Arc;

use anyhow::anyhow;
use asset_manager_core::units::UnitConverter;
use asset_manager_core::SnapshotCoordinator;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{Config, LogFormat};
use crate::fixture::{Fixture, FixtureStore};

pub struct AppState {
    pub coordinator: Arc<SnapshotCoordinator>,
    pub asset_id: String,
    pub caller: String,
}

/// Default filter when `RUST_LOG` is unset: engine progress at debug, the rest at info.
const DEFAULT_LOG_FILTER: &str = "info,asset_manager_core=debug";

/// Installs the tracing subscriber on stderr. Core `log` records are
/// forwarded through the subscriber's log bridge.
pub fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let layer = fmt::layer().with_writer(std::io::stderr);

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(layer.json().flatten_event(true))
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(layer.with_target(false).compact())
            .init(),
    }
}

pub fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let fixture = Fixture::load(&config.fixture_path)?;
    let store = Arc::new(FixtureStore::new(fixture));

    let asset_id = match &config.asset_id {
        Some(id) => id.clone(),
        None => store
            .first_asset()
            .map(|a| a.asset_id.clone())
            .ok_or_else(|| anyhow!("Fixture has no assets and AM_ASSET_ID is not set"))?,
    };
    let caller = match &config.caller {
        Some(caller) => caller.clone(),
        None => store
            .asset(&asset_id)
            .map(|a| a.asset_manager.clone())
            .ok_or_else(|| anyhow!("AM_CALLER is not set and asset {} is unknown", asset_id))?,
    };

    let converter = UnitConverter::new(config.base_unit_decimals)?;
    let coordinator = Arc::new(SnapshotCoordinator::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store,
        converter,
    ));

    Ok(AppState {
        coordinator,
        asset_id,
        caller,
    })
}
