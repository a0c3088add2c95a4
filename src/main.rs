use color_eyre::{eyre::eyre, Result};
use flightbridge::bridge::BridgeHandle;
use flightbridge::input::{CollectorSettings, StickCollector};
use flightbridge::output::{spawn_dispatcher, DryRunDispatcher};
use flightbridge::profile::Profile;
use tokio::sync::oneshot;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let profile_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "profile.toml".to_string());
    let profile =
        Profile::load(&profile_path).map_err(|e| eyre!("Failed to load profile: {}", e))?;
    let cycle_period = profile.cycle_period();

    // Bridge engine in its own task
    let mut bridge = BridgeHandle::new("flightbridge");
    let (snapshot_tx, command_rx) = bridge
        .start(profile.bindings.clone(), cycle_period)
        .map_err(|e| eyre!("Failed to start bridge: {}", e))?;

    // Output dispatcher; dry-run until a hardware backend is plugged in
    let dispatcher = spawn_dispatcher(Box::new(DryRunDispatcher::default()), command_rx);

    // Input collector; a missing controller backend is not fatal, the
    // bridge just keeps evaluating empty snapshots.
    let mut collector_shutdown = None;
    let mut collector_task = None;
    match StickCollector::create(Some(CollectorSettings::default()), snapshot_tx) {
        Ok(collector) => match collector.initialize() {
            Ok(collecting) => {
                let (shutdown_tx, shutdown_rx) = oneshot::channel();
                collector_shutdown = Some(shutdown_tx);
                collector_task = Some(tokio::spawn(
                    collecting.collect_until_shutdown(shutdown_rx, cycle_period),
                ));
            }
            Err(e) => warn!("Input collector unavailable: {}", e),
        },
        Err(e) => warn!("Input collector unavailable: {}", e),
    }

    info!("flightbridge running — press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    if let Some(tx) = collector_shutdown.take() {
        let _ = tx.send(());
    }
    if let Some(task) = collector_task.take() {
        let _ = task.await;
    }

    // Release-all runs inside the bridge shutdown; the dispatcher drains
    // it before its channel closes.
    bridge
        .shutdown()
        .await
        .map_err(|e| eyre!("Bridge shutdown failed: {}", e))?;
    dispatcher.await?;

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
