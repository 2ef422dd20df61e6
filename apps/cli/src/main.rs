mod config;
mod fixture;
mod main_lib;

use asset_manager_core::{SnapshotCoordinatorTrait, SnapshotOutcome};
use config::Config;
use main_lib::{build_state, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    init_tracing(config.log_format);
    let state = build_state(&config)?;

    tracing::info!(
        asset_id = %state.asset_id,
        caller = %state.caller,
        fixture = %config.fixture_path.display(),
        "Building manage-asset snapshot"
    );

    match state
        .coordinator
        .build_snapshot(&state.asset_id, &state.caller)
        .await
    {
        SnapshotOutcome::Ready(snapshot) => {
            println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);
        }
        SnapshotOutcome::Ineligible(reason) => {
            println!("{}", serde_json::json!({ "ineligible": reason }));
        }
        SnapshotOutcome::Failed(err) => {
            anyhow::bail!("Snapshot failed for {}: {}", state.asset_id, err);
        }
        other => {
            tracing::warn!("Snapshot not built: {:?}", other);
        }
    }
    Ok(())
}
