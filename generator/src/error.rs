use std::error::Error;
use std::fmt::Write as _;
use std::io;

use planner::error::PlannerError;
use thiserror::Error;

/// Result type for generator operations.
pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// Failure of a generator run.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error(transparent)]
    Planner(#[from] PlannerError),

    /// The environment, tracing or configuration files could not be set up.
    #[error("configuration error: {0}")]
    Config(#[source] Box<dyn Error + Send + Sync>),

    #[error("cannot render the generation plan: {0}")]
    Output(#[from] serde_json::Error),

    #[error("cannot write the generation plan: {0}")]
    Io(#[from] io::Error),
}

impl GeneratorError {
    /// Wraps a setup failure.
    pub fn config<E: Error + Send + Sync + 'static>(err: E) -> Self {
        GeneratorError::Config(Box::new(err))
    }

    /// Short label printed ahead of the message, telling operators where to look.
    pub fn category(&self) -> &'static str {
        match self {
            GeneratorError::Planner(err) if !err.is_configuration_error() => "generation error",
            GeneratorError::Planner(_) | GeneratorError::Config(_) => "configuration error",
            GeneratorError::Output(_) => "output error",
            GeneratorError::Io(_) => "i/o error",
        }
    }

    /// Builds the text printed on stderr when a run fails.
    ///
    /// Aggregated planner errors already list every offender, so their causes are not
    /// repeated. The planner backtrace is appended when `RUST_BACKTRACE` asks for one.
    pub fn render_report(&self) -> String {
        let mut report = format!(
            "generator failed\ncategory: {}\nerror: {self}\n",
            self.category()
        );

        let aggregated = matches!(self, GeneratorError::Planner(err) if err.errors().is_some());
        if !aggregated {
            let causes = std::iter::successors(self.source(), |&err| err.source());
            for (depth, cause) in causes.enumerate() {
                let _ = writeln!(report, "cause {}: {cause}", depth + 1);
            }
        }

        if backtrace_requested()
            && let GeneratorError::Planner(err) = self
            && let Some(backtrace) = err.backtrace()
        {
            let _ = writeln!(report, "backtrace:\n{}", backtrace.to_string().trim_end());
        }

        report
    }
}

fn backtrace_requested() -> bool {
    std::env::var("RUST_BACKTRACE").is_ok_and(|value| value == "1" || value == "full")
}
