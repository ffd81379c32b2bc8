//! CLI failures and process exit codes.

use solr_multisub_infra::InfraError;
use solr_multisub_shared::ErrorKind;
use std::fmt;

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ok = 0,
    /// Broken invariant, or output that could not be rendered.
    Internal = 1,
    /// Config, descriptor or credential input was rejected.
    InvalidInput = 2,
    /// Descriptor files or the terminal could not be read or written.
    Io = 3,
}

impl ExitCode {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Exit code for a backend error, keyed by its envelope kind.
    #[must_use]
    pub const fn for_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Expected => Self::InvalidInput,
            ErrorKind::Invariant => Self::Internal,
            ErrorKind::Unexpected => Self::Io,
        }
    }
}

#[derive(Debug)]
pub enum CliError {
    /// Resolve, settings or refresh failed in the backend.
    Backend(InfraError),
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl CliError {
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::Backend(error) => ExitCode::for_kind(error.kind),
            Self::Io(_) => ExitCode::Io,
            Self::Serialization(_) => ExitCode::Internal,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(error) => write!(formatter, "{}: {}", error.code, error.message),
            Self::Io(error) => write!(formatter, "io error: {error}"),
            Self::Serialization(error) => write!(formatter, "serialization error: {error}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Backend(_) => None,
            Self::Io(error) => Some(error),
            Self::Serialization(error) => Some(error),
        }
    }
}

impl From<InfraError> for CliError {
    fn from(error: InfraError) -> Self {
        Self::Backend(error)
    }
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solr_multisub_shared::{ErrorClass, ErrorCode};

    #[test]
    fn backend_errors_exit_by_kind() {
        let rejected: CliError = InfraError::expected(
            ErrorCode::new("subscription", "identifier_mismatch"),
            "wrong descriptor",
        )
        .into();
        assert_eq!(rejected.exit_code(), ExitCode::InvalidInput);
        assert_eq!(
            rejected.to_string(),
            "subscription:identifier_mismatch: wrong descriptor"
        );

        let unreadable: CliError = InfraError::unexpected(
            ErrorCode::new("snapshot_store", "read_failed"),
            "disk gone",
            ErrorClass::NonRetriable,
        )
        .into();
        assert_eq!(unreadable.exit_code(), ExitCode::Io);
    }
}
