#![deny(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::must_use_candidate)]

use std::sync::Arc;

use shutterpost::{config::Config, logging, providers::console_registry};
use shutterpost_delivery::AutomationService;
use shutterpost_store::{AutomationSettings, MemoryRecordStore, RecordStore};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let mut config = Config::load()?;

    // The demo binary runs against the in-memory backend; production
    // deployments wire a persistent RecordStore implementation here.
    let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());

    let settings = AutomationSettings::load(store.as_ref()).await?;
    settings.save(store.as_ref()).await?;
    config.apply_settings(&settings);

    let service = AutomationService::new(
        Arc::clone(&store),
        Arc::new(console_registry()),
        Arc::new(shutterpost_delivery::StaticContactDirectory::new()),
        config.engine,
    );

    if settings.enable_automation {
        service.schedule_log_cleanup();
        if settings.auto_start_on_load {
            service.start_automation();
        } else {
            info!("Automation enabled but not auto-started; waiting for an explicit start");
        }
    } else {
        info!("Automation disabled by settings");
    }

    info!("shutterpost running, press Ctrl-C to stop");
    shutdown_signal().await?;

    service.shutdown();
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        let mut term = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = term.recv() => {}
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(())
    }
}
