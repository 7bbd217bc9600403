use crate::{env_parse, ConfigError, Environment, FromEnv};
use tracing::level_filters::LevelFilter;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{prelude::*, EnvFilter, Layer, Registry};

/// Log verbosity and timestamp layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogConfig {
    /// Default level when `RUST_LOG` is not set.
    pub level: LevelFilter,
    /// strftime pattern for record timestamps. `None` keeps the subscriber default.
    pub time_format: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            time_format: None,
        }
    }
}

impl FromEnv for LogConfig {
    /// Reads `LOG_LEVEL` (default `info`) and `LOG_TIME_FORMAT` (optional).
    fn from_env() -> Result<Self, ConfigError> {
        let level = env_parse("LOG_LEVEL", "info")?;
        let time_format = std::env::var("LOG_TIME_FORMAT")
            .ok()
            .filter(|f| !f.trim().is_empty());

        Ok(Self { level, time_format })
    }
}

/// Install color-eyre with a project-standard configuration.
///
/// Call this early in the main() before any fallible operations to ensure
/// colored error output. Safe to call multiple times.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// ERROR records go to stderr, everything else to stdout.
fn split_writer() -> impl for<'w> MakeWriter<'w> + Send + Sync + 'static {
    std::io::stderr
        .with_max_level(Level::ERROR)
        .or_else(std::io::stdout)
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

fn fmt_layer(is_production: bool, time_format: Option<&str>) -> BoxedLayer {
    let base = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(split_writer());

    match (is_production, time_format) {
        (true, Some(format)) => base
            .json()
            .flatten_event(true)
            .with_timer(ChronoUtc::new(format.to_string()))
            .boxed(),
        (true, None) => base.json().flatten_event(true).boxed(),
        (false, Some(format)) => base
            .pretty()
            .with_file(false)
            .with_line_number(false)
            .with_timer(ChronoUtc::new(format.to_string()))
            .boxed(),
        (false, None) => base
            .pretty()
            .with_file(false)
            .with_line_number(false)
            .boxed(),
    }
}

/// Initialize tracing with environment-aware configuration and error span capture.
///
/// - **Production** (`APP_ENV=production`): flattened JSON records.
/// - **Development** (default): pretty-printed records.
///
/// `RUST_LOG` overrides the level from [`LogConfig`]. An
/// [`tracing_error::ErrorLayer`] is installed so color-eyre reports carry span
/// traces.
///
/// Safe to call more than once: later calls are no-ops (common in tests).
pub fn init_tracing(environment: &Environment, log: &LogConfig) {
    let filter = EnvFilter::builder()
        .with_default_directive(log.level.into())
        .from_env_lossy();

    let result = tracing_subscriber::registry()
        .with(fmt_layer(
            environment.is_production(),
            log.time_format.as_deref(),
        ))
        .with(tracing_error::ErrorLayer::default())
        .with(filter)
        .try_init();

    match result {
        Ok(_) => {
            info!(environment = ?environment, level = %log.level, "Tracing initialized");
            if log.time_format.is_none() {
                warn!("LOG_TIME_FORMAT is not set, using the default timestamp format");
            }
        }
        Err(_) => {
            debug!("Tracing already initialized, skipping re-initialization");
        }
    }
}
