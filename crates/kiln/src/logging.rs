//! Tracing subscriber setup.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Log verbosity options for the CLI.
#[derive(Debug, Clone, clap::ValueEnum)]
pub enum LogLevel {
    /// Show all logs (trace level).
    Trace,
    /// Show debug and above.
    Debug,
    /// Show info and above (default).
    Info,
    /// Show warnings and above.
    Warn,
    /// Show errors only.
    Error,
}

impl From<&LogLevel> for Level {
    fn from(level: &LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Log output format options.
#[derive(Debug, Clone, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact single-line format (default).
    Compact,
    /// Pretty-printed human-readable format.
    Pretty,
    /// Structured JSON format.
    Json,
}

/// Initialise the global subscriber.
///
/// `RUST_LOG` takes precedence over the CLI level when set.
pub fn init(level: &LogLevel, format: &LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::from(level).to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}
