use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::ops::Deref;

pub type BroodResult<T> = Result<T, BroodError>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidConfig,
    InvalidParameter,
    Breed,
    Fitness,
    Codec,
    Protocol,
    Evaluation,
    Io,
    Multiple,
}

/// A cheap error-message string. Most messages are static; formatted ones
/// allocate once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrString(Cow<'static, str>);

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<T: Into<Cow<'static, str>>> From<T> for ErrString {
    fn from(v: T) -> Self {
        Self(v.into())
    }
}

#[derive(Debug)]
pub enum BroodError {
    /// A setup-time configuration error. The message names the parameter path
    /// that failed to validate.
    InvalidConfig { message: ErrString },
    /// A malformed or missing parameter value.
    InvalidParameter { message: ErrString },
    /// A breeding invariant was violated (wrong production count, bad species,
    /// selector discipline broken). These abort the generation.
    Breed { message: ErrString },
    /// Fitness values that cannot legally be compared or assigned.
    Fitness { message: ErrString },
    /// Individual or genome serialization failure.
    Codec { message: ErrString },
    /// A malformed message on the master/slave wire.
    Protocol { message: ErrString },
    /// Evaluation failed.
    Evaluation { message: ErrString },
    Io { source: std::io::Error },
    Multiple(Vec<BroodError>),
}

impl BroodError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            Self::InvalidParameter { .. } => ErrorCode::InvalidParameter,
            Self::Breed { .. } => ErrorCode::Breed,
            Self::Fitness { .. } => ErrorCode::Fitness,
            Self::Codec { .. } => ErrorCode::Codec,
            Self::Protocol { .. } => ErrorCode::Protocol,
            Self::Evaluation { .. } => ErrorCode::Evaluation,
            Self::Io { .. } => ErrorCode::Io,
            Self::Multiple(_) => ErrorCode::Multiple,
        }
    }

    /// True when the error is a socket-level failure, which the slave treats
    /// as a reconnect signal rather than a fatal condition.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

impl Display for BroodError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { message } => write!(f, "Invalid configuration: {}", message),
            Self::InvalidParameter { message } => write!(f, "Invalid parameter: {}", message),
            Self::Breed { message } => write!(f, "Breeding error: {}", message),
            Self::Fitness { message } => write!(f, "Fitness error: {}", message),
            Self::Codec { message } => write!(f, "Codec error: {}", message),
            Self::Protocol { message } => write!(f, "Protocol error: {}", message),
            Self::Evaluation { message } => write!(f, "Evaluation error: {}", message),
            Self::Io { source } => write!(f, "I/O error: {}", source),
            Self::Multiple(errors) => {
                writeln!(f, "Multiple errors:")?;
                for error in errors {
                    writeln!(f, "  {}", error)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for BroodError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BroodError {
    fn from(source: std::io::Error) -> Self {
        BroodError::Io { source }
    }
}

/// Accumulates setup-time errors so that a misconfigured run reports every
/// problem at once instead of stopping at the first. Runtime errors do not go
/// through the sink; they propagate as `Result`s.
#[derive(Debug, Default)]
pub struct ErrorSink {
    errors: Vec<BroodError>,
}

impl ErrorSink {
    pub fn new() -> Self {
        ErrorSink { errors: Vec::new() }
    }

    pub fn push(&mut self, error: BroodError) {
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Flush the sink. Returns `Err` with everything collected so far, or
    /// `Ok(())` when setup was clean. Callers at the binary boundary map the
    /// `Err` to a non-zero exit.
    pub fn exit_if_errors(&mut self) -> BroodResult<()> {
        if self.errors.is_empty() {
            return Ok(());
        }

        let errors = std::mem::take(&mut self.errors);
        if errors.len() == 1 {
            Err(errors.into_iter().next().unwrap())
        } else {
            Err(BroodError::Multiple(errors))
        }
    }
}

#[doc(hidden)]
pub mod __private {
    #[doc(hidden)]
    #[inline]
    #[cold]
    #[must_use]
    pub fn must_use<E>(error: E) -> E {
        error
    }
}

#[macro_export]
macro_rules! brood_err {
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use(
            $crate::BroodError::$variant { message: format!($fmt, $($arg),*).into() }
        )
    };
    ($variant:ident: $err:expr $(,)?) => {
        $crate::__private::must_use(
            $crate::BroodError::$variant { message: $err.into() }
        )
    };
}

#[macro_export]
macro_rules! brood_bail {
    ($($tt:tt)+) => {
        return Err($crate::brood_err!($($tt)+))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_err_macro_formats() {
        let err = brood_err!(InvalidParameter: "no value for {}", "es.mu.0");
        assert_eq!(err.code(), ErrorCode::InvalidParameter);
        assert!(err.to_string().contains("es.mu.0"));
    }

    #[test]
    fn test_sink_flushes_once() {
        let mut sink = ErrorSink::new();
        assert!(sink.exit_if_errors().is_ok());

        sink.push(brood_err!(InvalidConfig: "es.lambda.0 must be >= 1"));
        sink.push(brood_err!(InvalidConfig: "es.mu.1 must be >= 1"));
        assert!(sink.has_errors());

        let flushed = sink.exit_if_errors().unwrap_err();
        assert_eq!(flushed.code(), ErrorCode::Multiple);
        assert!(sink.exit_if_errors().is_ok());
    }

    #[test]
    fn test_io_errors_are_reconnectable() {
        let err = BroodError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "peer went away",
        ));
        assert!(err.is_io());
        assert_eq!(err.code(), ErrorCode::Io);
    }
}
