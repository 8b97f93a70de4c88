use std::sync::Arc;
use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use crate::config::Settings;
use crate::facility::Facility;
use crate::utils::logging;

pub struct AppContext {
    pub settings: Arc<Settings>,
    pub facility: Arc<Facility>,
    /// Flushes the file log when dropped
    pub log_guard: Option<WorkerGuard>,
}

/// Loads the settings, starts logging, and builds the facility with its configured fleet.
///
/// Must be called from within a tokio runtime.
pub async fn initialize() -> Result<AppContext> {
    let settings = Settings::new()?;
    let log_guard = logging::init_logger(&settings.logging)?;

    let facility = Facility::new(settings.clone())
        .map_err(|e| anyhow::anyhow!("Failed to create Facility: {}", e))?;
    facility.setup(settings.fleet.unit_count, settings.fleet.capacity)?;

    Ok(AppContext {
        settings: Arc::new(settings),
        facility: Arc::new(facility),
        log_guard,
    })
}
