//! Error types and result definitions for the ingestion pipeline.
//!
//! [`SeedError`] carries an [`ErrorKind`] classification, a static description,
//! optional dynamic detail, and captured callsite/backtrace metadata. An
//! aggregated variant collects the failures of multiple workers into one error.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Convenient result type for pipeline operations using [`SeedError`] as the error type.
pub type SeedResult<T> = Result<T, SeedError>;

/// Detailed payload stored for single [`SeedError`] instances.
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Main error type for pipeline operations.
#[derive(Debug, Clone)]
pub struct SeedError {
    repr: ErrorRepr,
}

/// Internal representation of error data.
#[derive(Debug, Clone)]
enum ErrorRepr {
    /// Single error payload holding rich metadata.
    Single(ErrorPayload),
    /// Multiple aggregated errors, mainly from concurrent worker failures.
    Many {
        errors: Vec<SeedError>,
        location: &'static Location<'static>,
    },
}

/// Categories of failures that can occur while generating and persisting records.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Storage errors
    DestinationConnectionFailed,
    DestinationQueryFailed,
    DestinationIoError,
    PoolExhausted,

    // Record errors
    InvalidRecord,
    UniquenessExhausted,

    // Pipeline lifecycle errors
    QueueClosed,
    CircuitBreakerOpen,
    ShutdownTimeout,
    WorkerPanic,

    // Startup errors
    ConfigError,
    HostIntrospectionFailed,

    // Unknown / uncategorized
    Unknown,
}

impl ErrorKind {
    /// Whether a write failing with this kind should be retried with backoff.
    ///
    /// Pool exhaustion and connection/query/io failures are treated as
    /// transient; malformed records are not, they are dropped immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorKind::DestinationConnectionFailed
                | ErrorKind::DestinationQueryFailed
                | ErrorKind::DestinationIoError
                | ErrorKind::PoolExhausted
        )
    }
}

impl SeedError {
    /// Returns the [`ErrorKind`] of this error.
    ///
    /// For aggregated errors, returns the kind of the first error or
    /// [`ErrorKind::Unknown`] if the error list is empty.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.kind,
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.kind())
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns all [`ErrorKind`]s present in this error, flattened.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self.repr {
            ErrorRepr::Single(ref payload) => vec![payload.kind],
            ErrorRepr::Many { ref errors, .. } => {
                errors.iter().flat_map(|err| err.kinds()).collect()
            }
        }
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.detail.as_deref(),
            ErrorRepr::Many { ref errors, .. } => errors.iter().find_map(|e| e.detail()),
        }
    }

    /// Returns the captured backtrace for this error.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self.repr {
            ErrorRepr::Single(ref payload) => Some(payload.backtrace.as_ref()),
            ErrorRepr::Many { .. } => None,
        }
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.location,
            ErrorRepr::Many { location, .. } => location,
        }
    }

    /// Attaches an originating [`error::Error`] to this error and returns the
    /// modified instance. Has no effect on aggregated errors.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let ErrorRepr::Single(ref mut payload) = self.repr {
            payload.source = Some(Arc::new(source));
        }
        self
    }

    /// Creates a [`SeedError`] from its components.
    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        SeedError {
            repr: ErrorRepr::Single(ErrorPayload {
                kind,
                description,
                detail,
                source,
                location: Location::caller(),
                backtrace: Arc::new(Backtrace::capture()),
            }),
        }
    }
}

impl PartialEq for SeedError {
    fn eq(&self, other: &SeedError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::Single(a), ErrorRepr::Single(b)) => a.kind == b.kind,
            (
                ErrorRepr::Many {
                    errors: errors_a, ..
                },
                ErrorRepr::Many {
                    errors: errors_b, ..
                },
            ) => {
                errors_a.len() == errors_b.len()
                    && errors_a.iter().zip(errors_b.iter()).all(|(a, b)| a == b)
            }
            _ => false,
        }
    }
}

impl fmt::Display for SeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match &self.repr {
            ErrorRepr::Single(payload) => {
                let location = payload.location;
                write!(
                    f,
                    "[{:?}] {} @ {}:{}:{}",
                    payload.kind,
                    payload.description,
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                if let Some(detail) = payload.detail.as_deref() {
                    write!(f, "\n  Detail: {detail}")?;
                }

                Ok(())
            }
            ErrorRepr::Many { errors, location } => {
                let count = errors.len();
                write!(
                    f,
                    "[Many] {} error{} aggregated @ {}:{}:{}",
                    count,
                    if count == 1 { "" } else { "s" },
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                for (index, error) in errors.iter().enumerate() {
                    let rendered = format!("{error}");
                    for (line_index, line) in rendered.lines().enumerate() {
                        if line_index == 0 {
                            write!(f, "\n  {}. {}", index + 1, line)?;
                        } else {
                            write!(f, "\n     {line}")?;
                        }
                    }
                }

                Ok(())
            }
        }
    }
}

impl error::Error for SeedError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload
                .source
                .as_ref()
                .map(|source| source as &(dyn error::Error + 'static)),
            // For aggregated errors, we forward the first contained error as the source.
            ErrorRepr::Many { errors, .. } => errors
                .first()
                .map(|error| error as &(dyn error::Error + 'static)),
        }
    }
}

/// Creates a [`SeedError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for SeedError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> SeedError {
        SeedError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates a [`SeedError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for SeedError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> SeedError {
        SeedError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Creates a [`SeedError`] from a vector of errors for aggregation.
///
/// If the vector contains exactly one error, returns that error directly
/// without wrapping it.
impl<E> From<Vec<E>> for SeedError
where
    E: Into<SeedError>,
{
    #[track_caller]
    fn from(errors: Vec<E>) -> SeedError {
        let location = Location::caller();

        let mut errors: Vec<SeedError> = errors.into_iter().map(Into::into).collect();

        if errors.len() == 1 {
            return errors.pop().expect("just checked length is 1");
        }

        SeedError {
            repr: ErrorRepr::Many { errors, location },
        }
    }
}

/// Converts [`std::io::Error`] to [`SeedError`] with [`ErrorKind::DestinationIoError`].
impl From<std::io::Error> for SeedError {
    #[track_caller]
    fn from(err: std::io::Error) -> SeedError {
        let detail = err.to_string();
        let source = Arc::new(err);
        SeedError::from_components(
            ErrorKind::DestinationIoError,
            Cow::Borrowed("I/O operation failed"),
            Some(Cow::Owned(detail)),
            Some(source),
        )
    }
}

/// Converts [`sqlx::Error`] to [`SeedError`] with an appropriate error kind.
///
/// Pool acquire timeouts map to [`ErrorKind::PoolExhausted`], connection-level
/// failures to [`ErrorKind::DestinationConnectionFailed`], and statement
/// failures to [`ErrorKind::DestinationQueryFailed`].
impl From<sqlx::Error> for SeedError {
    #[track_caller]
    fn from(err: sqlx::Error) -> SeedError {
        let (kind, description) = match &err {
            sqlx::Error::PoolTimedOut => (
                ErrorKind::PoolExhausted,
                "timed out acquiring a connection from the pool",
            ),
            sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => (
                ErrorKind::DestinationConnectionFailed,
                "connection pool is no longer usable",
            ),
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::Protocol(_) => (
                ErrorKind::DestinationIoError,
                "destination connection failed",
            ),
            sqlx::Error::Configuration(_) => {
                (ErrorKind::ConfigError, "invalid destination configuration")
            }
            _ => (ErrorKind::DestinationQueryFailed, "destination query failed"),
        };

        let detail = err.to_string();
        let source = Arc::new(err);
        SeedError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(source),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed_error;

    #[test]
    fn single_error_exposes_kind_and_detail() {
        let err = seed_error!(
            ErrorKind::InvalidRecord,
            "record rejected",
            "missing field `full_name`"
        );
        assert_eq!(err.kind(), ErrorKind::InvalidRecord);
        assert_eq!(err.detail(), Some("missing field `full_name`"));
    }

    #[test]
    fn aggregation_flattens_kinds() {
        let errors = vec![
            seed_error!(ErrorKind::PoolExhausted, "a"),
            seed_error!(ErrorKind::CircuitBreakerOpen, "b"),
        ];
        let combined = SeedError::from(errors);
        assert_eq!(
            combined.kinds(),
            vec![ErrorKind::PoolExhausted, ErrorKind::CircuitBreakerOpen]
        );
    }

    #[test]
    fn single_element_aggregation_unwraps() {
        let errors = vec![seed_error!(ErrorKind::QueueClosed, "only one")];
        let combined = SeedError::from(errors);
        assert_eq!(combined.kind(), ErrorKind::QueueClosed);
    }

    #[test]
    fn transient_kinds_are_retryable() {
        assert!(ErrorKind::PoolExhausted.is_transient());
        assert!(ErrorKind::DestinationQueryFailed.is_transient());
        assert!(!ErrorKind::InvalidRecord.is_transient());
        assert!(!ErrorKind::CircuitBreakerOpen.is_transient());
    }
}
