use thiserror::Error;

/// Boxed cause carried by acquisition and delegated errors.
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse classification of a [`BuildError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Two or more user inputs are mutually exclusive
    Conflict,
    /// A value does not match its expected shape
    MalformedInput,
    /// Download, filesystem or discovery failure
    Acquisition,
    /// Failure reported by a collaborator, wrapped with context
    Delegated,
}

/// Build configuration errors.
///
/// Every error is terminal for a resolution attempt.
#[derive(Error, Debug)]
pub enum BuildError {
    /// Mutually exclusive inputs
    #[error("{0}")]
    Conflict(String),

    /// Value did not match `key=value` or a similar shape
    #[error("{message}: {value:?}")]
    MalformedInput { message: String, value: String },

    /// Network, filesystem or discovery failure
    #[error("{message}{}", cause_suffix(.source))]
    Acquisition {
        message: String,
        #[source]
        source: Option<Cause>,
    },

    /// Error returned by a collaborator
    #[error("{context}: {source}")]
    Delegated {
        context: String,
        #[source]
        source: Cause,
    },
}

fn cause_suffix(source: &Option<Cause>) -> String {
    match source {
        Some(cause) => format!(": {cause}"),
        None => String::new(),
    }
}

impl BuildError {
    pub fn conflict(message: impl Into<String>) -> Self {
        BuildError::Conflict(message.into())
    }

    pub fn malformed(message: impl Into<String>, value: impl Into<String>) -> Self {
        BuildError::MalformedInput {
            message: message.into(),
            value: value.into(),
        }
    }

    /// Acquisition failure wrapping an underlying cause.
    pub fn acquisition(message: impl Into<String>, source: impl Into<Cause>) -> Self {
        BuildError::Acquisition {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Acquisition failure with no underlying cause.
    pub fn acquisition_msg(message: impl Into<String>) -> Self {
        BuildError::Acquisition {
            message: message.into(),
            source: None,
        }
    }

    pub fn delegated(context: impl Into<String>, source: impl Into<Cause>) -> Self {
        BuildError::Delegated {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BuildError::Conflict(_) => ErrorKind::Conflict,
            BuildError::MalformedInput { .. } => ErrorKind::MalformedInput,
            BuildError::Acquisition { .. } => ErrorKind::Acquisition,
            BuildError::Delegated { .. } => ErrorKind::Delegated,
        }
    }
}

impl From<serde_json::Error> for BuildError {
    fn from(err: serde_json::Error) -> Self {
        BuildError::delegated("invalid JSON configuration", err)
    }
}

impl From<serde_yaml::Error> for BuildError {
    fn from(err: serde_yaml::Error) -> Self {
        BuildError::delegated("invalid YAML configuration", err)
    }
}

/// Result type alias for build configuration operations
pub type Result<T> = std::result::Result<T, BuildError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_display() {
        let error = BuildError::conflict("cannot use --logsplit without --logfile");
        assert_eq!(error.to_string(), "cannot use --logsplit without --logfile");
        assert_eq!(error.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_malformed_display_includes_value() {
        let error = BuildError::malformed("expected key=value", "NOEQUALS");
        assert_eq!(error.to_string(), "expected key=value: \"NOEQUALS\"");
        assert_eq!(error.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn test_acquisition_with_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let error = BuildError::acquisition("evaluating symlinks in build context path", io);
        assert_eq!(
            error.to_string(),
            "evaluating symlinks in build context path: no such file"
        );
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_acquisition_without_cause() {
        let error = BuildError::acquisition_msg("no contents in \"http://example.com\"");
        assert_eq!(error.to_string(), "no contents in \"http://example.com\"");
        assert!(std::error::Error::source(&error).is_none());
        assert_eq!(error.kind(), ErrorKind::Acquisition);
    }

    #[test]
    fn test_delegated_wraps_inner_error() {
        let inner = BuildError::malformed("unrecognized isolation type", "vm");
        let error = BuildError::delegated("building system context", inner);
        assert_eq!(
            error.to_string(),
            "building system context: unrecognized isolation type: \"vm\""
        );
        assert_eq!(error.kind(), ErrorKind::Delegated);
    }

    #[test]
    fn test_serde_yaml_error_conversion() {
        let result: std::result::Result<serde_yaml::Value, _> =
            serde_yaml::from_str("invalid: yaml: content:");
        let error: BuildError = result.unwrap_err().into();
        assert_eq!(error.kind(), ErrorKind::Delegated);
    }

    #[test]
    fn test_error_is_debug() {
        let error = BuildError::conflict("x");
        assert!(format!("{:?}", error).contains("Conflict"));
    }
}
