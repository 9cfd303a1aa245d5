use std::io;
use std::sync::Once;

use config::environment::Environment;
use thiserror::Error;
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

/// Workspace crates whose events are shown by default.
const DEFAULT_TARGETS: [&str; 2] = ["planner", "config"];

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to redirect `log` records to tracing: {0}")]
    LogTracer(#[from] tracing_log::log::SetLoggerError),

    #[error("failed to install the global tracing subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

/// Installs the global subscriber of `app_name`.
///
/// The filter is read from `RUST_LOG`, defaulting to `info` for the application and the
/// workspace crates. Output goes to stderr so stdout only carries the run's result.
/// Production runs log JSON lines, every other environment logs human-readable text.
pub fn init_tracing(app_name: &str, environment: Environment) -> Result<(), TracingError> {
    LogTracer::init()?;

    let registry = tracing_subscriber::registry().with(env_filter(app_name));

    if environment.is_prod() {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_writer(io::stderr))
            .try_init()?;
    }

    Ok(())
}

/// Installs a subscriber writing through the test harness, once per test binary.
///
/// Silent unless `RUST_LOG` is set, so test output stays readable.
pub fn init_test_tracing() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let Ok(filter) = EnvFilter::try_from_default_env() else {
            return;
        };

        // Another subscriber may already be installed by the test harness.
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_test_writer())
            .try_init();
    });
}

fn env_filter(app_name: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives = std::iter::once(app_name)
            .chain(DEFAULT_TARGETS)
            .map(|target| format!("{target}=info"))
            .collect::<Vec<_>>()
            .join(",");

        EnvFilter::new(directives)
    })
}
