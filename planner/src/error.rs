//! Error types and result definitions for generation planning.
//!
//! Every failure the planner can raise is a build-time configuration problem: nothing here is
//! retried and nothing is produced once an error exists. [`PlannerError`] carries a kind, a
//! static description, optional dynamic detail naming the offending parameter, array or
//! property, the call-site location and a backtrace. Several errors found in one validation pass
//! are aggregated into a single [`PlannerError`] so an operator can fix them all at once.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use config::shared::ValidationError;

/// Result type for planner operations.
pub type PlannerResult<T> = Result<T, PlannerError>;

/// Payload stored for single [`PlannerError`] instances.
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Main error type of the planner.
#[derive(Debug, Clone)]
pub struct PlannerError {
    repr: ErrorRepr,
}

#[derive(Debug, Clone)]
enum ErrorRepr {
    Single(ErrorPayload),
    /// Aggregated errors, used when a validation pass reports every offender.
    Many {
        errors: Vec<PlannerError>,
        location: &'static Location<'static>,
    },
}

/// Classification of planner failures.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Catalog errors
    UnsupportedParameterType,
    DuplicateParameterName,
    InvalidIdentifier,

    // Settings errors
    UnknownProperty,
    MissingConfiguration,
    InvalidConfiguration,
    InvalidDate,
    InvalidRefreshWindow,

    Unknown,
}

impl ErrorKind {
    /// Returns `true` for kinds that describe a problem in the declared configuration.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, ErrorKind::Unknown)
    }
}

impl PlannerError {
    /// Returns the [`ErrorKind`] of this error, or of the first aggregated error.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.kind,
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.kind())
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns every [`ErrorKind`] contained in this error.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self.repr {
            ErrorRepr::Single(ref payload) => vec![payload.kind],
            ErrorRepr::Many { ref errors, .. } => errors.iter().flat_map(|err| err.kinds()).collect(),
        }
    }

    /// Returns `true` when every contained error is a configuration error.
    pub fn is_configuration_error(&self) -> bool {
        self.kinds()
            .iter()
            .all(|kind| kind.is_configuration_error())
    }

    /// Returns the dynamic detail, or the first one found among aggregated errors.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.detail.as_deref(),
            ErrorRepr::Many { ref errors, .. } => errors.iter().find_map(|e| e.detail()),
        }
    }

    /// Returns the aggregated errors, if this error is an aggregate.
    pub fn errors(&self) -> Option<&[PlannerError]> {
        match self.repr {
            ErrorRepr::Single(_) => None,
            ErrorRepr::Many { ref errors, .. } => Some(errors),
        }
    }

    /// Returns the captured backtrace for single errors.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self.repr {
            ErrorRepr::Single(ref payload) => Some(payload.backtrace.as_ref()),
            ErrorRepr::Many { .. } => None,
        }
    }

    /// Returns the call site that created this error.
    pub fn location(&self) -> &'static Location<'static> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.location,
            ErrorRepr::Many { location, .. } => location,
        }
    }

    /// Attaches an originating error. No effect on aggregates.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let ErrorRepr::Single(ref mut payload) = self.repr {
            payload.source = Some(Arc::new(source));
        }
        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
    ) -> Self {
        PlannerError {
            repr: ErrorRepr::Single(ErrorPayload {
                kind,
                description,
                detail,
                source: None,
                location: Location::caller(),
                backtrace: Arc::new(Backtrace::capture()),
            }),
        }
    }
}

impl PartialEq for PlannerError {
    fn eq(&self, other: &PlannerError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::Single(a), ErrorRepr::Single(b)) => a.kind == b.kind,
            (ErrorRepr::Many { errors: a, .. }, ErrorRepr::Many { errors: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            ErrorRepr::Single(payload) => {
                write!(f, "[{:?}] {}", payload.kind, payload.description)?;
                if let Some(detail) = payload.detail.as_deref() {
                    write!(f, ": {detail}")?;
                }

                Ok(())
            }
            ErrorRepr::Many { errors, .. } => {
                let count = errors.len();
                write!(
                    f,
                    "[Many] {} error{} aggregated",
                    count,
                    if count == 1 { "" } else { "s" }
                )?;

                for (index, error) in errors.iter().enumerate() {
                    write!(f, "\n  {}. {error}", index + 1)?;
                }

                Ok(())
            }
        }
    }
}

impl error::Error for PlannerError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload
                .source
                .as_ref()
                .map(|source| source as &(dyn error::Error + 'static)),
            ErrorRepr::Many { errors, .. } => errors
                .first()
                .map(|error| error as &(dyn error::Error + 'static)),
        }
    }
}

impl From<(ErrorKind, &'static str)> for PlannerError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> PlannerError {
        PlannerError::from_components(kind, Cow::Borrowed(desc), None)
    }
}

impl<D> From<(ErrorKind, &'static str, D)> for PlannerError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> PlannerError {
        PlannerError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()))
    }
}

/// Aggregates errors; a single error is returned as is.
impl<E> From<Vec<E>> for PlannerError
where
    E: Into<PlannerError>,
{
    #[track_caller]
    fn from(errors: Vec<E>) -> PlannerError {
        let location = Location::caller();
        let mut errors: Vec<PlannerError> = errors.into_iter().map(Into::into).collect();

        if errors.len() == 1
            && let Some(error) = errors.pop()
        {
            return error;
        }

        PlannerError {
            repr: ErrorRepr::Many { errors, location },
        }
    }
}

impl From<ValidationError> for PlannerError {
    #[track_caller]
    fn from(err: ValidationError) -> PlannerError {
        let detail = err.to_string();
        PlannerError::from_components(
            ErrorKind::InvalidConfiguration,
            Cow::Borrowed("Configuration document is invalid"),
            Some(Cow::Owned(detail)),
        )
        .with_source(err)
    }
}
