use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Variable naming the environment whose configuration file is stacked on the base file.
pub const ENVIRONMENT_VAR: &str = "APP_ENVIRONMENT";

/// Deployment a generation run belongs to.
///
/// Picks the `configuration/{environment}` file and the log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Dev,
    Prod,
}

/// `APP_ENVIRONMENT` named a deployment that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown environment `{0}`, expected `dev` or `prod`")]
pub struct UnknownEnvironment(pub String);

impl Environment {
    /// Reads [`ENVIRONMENT_VAR`]. An unset variable means [`Environment::Dev`].
    pub fn load() -> Result<Environment, UnknownEnvironment> {
        match std::env::var(ENVIRONMENT_VAR) {
            Ok(value) => value.parse(),
            Err(_) => Ok(Environment::default()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        }
    }

    /// Production runs log JSON lines.
    pub fn is_prod(&self) -> bool {
        *self == Environment::Prod
    }
}

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        [Environment::Dev, Environment::Prod]
            .into_iter()
            .find(|environment| value.trim().eq_ignore_ascii_case(environment.as_str()))
            .ok_or_else(|| UnknownEnvironment(value.to_owned()))
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
