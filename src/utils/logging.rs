use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tracing_subscriber::filter::Directive;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_appender::non_blocking::WorkerGuard;
use crate::config::LoggingSettings;

/// Builds the filter described by the logging settings: the base `level` followed by each
/// per-target directive, e.g. `elevator_sim::monitoring=warn`.
///
/// # Returns
///
/// * `Err(anyhow::Error)` naming the first level or directive that does not parse
pub fn build_filter(settings: &LoggingSettings) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(&settings.level)
        .with_context(|| format!("Invalid logging level {:?}", settings.level))?;
    for directive in &settings.directives {
        let directive = directive.parse::<Directive>()
            .with_context(|| format!("Invalid logging directive {:?}", directive))?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

/// Initializes the logging system for the application
///
/// Always logs to the console. When `settings.path` is set, a non-blocking file layer also writes
/// `elevator-sim_{current_date}.log` in that directory.
/// `RUST_LOG` replaces the configured filter when it is set.
///
/// # Returns
///
/// * `Ok(Some(WorkerGuard))`: If logging is initialized with a file appender. Keep the guard alive
/// * `Ok(None)`: If logging is initialized console only
/// * `Err(anyhow::Error)`: If the filter does not parse, the log directory cannot be created, or a
///   global subscriber is already installed
pub fn init_logger(settings: &LoggingSettings) -> Result<Option<WorkerGuard>> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(settings)?,
    };

    let format = fmt::format()
        .with_timer(fmt::time::LocalTime::rfc_3339())
        .compact()
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let (file_layer, guard) = match &settings.path {
        Some(path) => {
            std::fs::create_dir_all(path)
                .with_context(|| format!("Could not create log directory {}", path.display()))?;
            let file_name = format!("elevator-sim_{}.log", chrono::Local::now().format("%Y-%m-%d"));
            let (non_blocking, guard) = tracing_appender::non_blocking(
                RollingFileAppender::new(Rotation::NEVER, path, file_name),
            );
            let layer = fmt::Layer::default()
                .event_format(format.clone().with_ansi(false))
                .with_writer(non_blocking);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let console_layer = fmt::Layer::default()
        .event_format(format.with_ansi(true))
        .with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    match &settings.path {
        Some(path) => tracing::info!("Logging initialized, writing to {}", path.display()),
        None => tracing::info!("Logging initialized (console only)"),
    }
    Ok(guard)
}
