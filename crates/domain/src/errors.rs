//! Typed failures for subscription parsing and credential handling.

use solr_multisub_shared::{ErrorCode, ErrorEnvelope};
use std::fmt;

/// The cached subscription descriptor is missing required structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedSubscriptionError {
    /// The descriptor text is not valid JSON.
    InvalidJson {
        /// Parser message.
        message: String,
    },
    /// The descriptor root is not a JSON object.
    NotAnObject,
    /// A required field is absent or null.
    MissingField {
        /// Dotted path of the missing field.
        field: &'static str,
    },
    /// A required field is present but has the wrong shape.
    WrongType {
        /// Dotted path of the field.
        field: &'static str,
        /// Shape the field was expected to have.
        expected: &'static str,
    },
    /// A required string field is empty after trimming.
    EmptyField {
        /// Dotted path of the field.
        field: &'static str,
    },
    /// A core entry is not usable.
    InvalidCoreEntry {
        /// Position of the entry in `search_cores`.
        index: usize,
        /// Field within the entry that failed.
        field: &'static str,
    },
    /// Two core entries share the same id.
    DuplicateCoreId {
        /// Repeated core id.
        core_id: String,
    },
    /// The descriptor belongs to a different subscription than requested.
    IdentifierMismatch {
        /// Identifier that was asked for.
        expected: String,
        /// Identifier the descriptor carries.
        actual: String,
    },
}

impl MalformedSubscriptionError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidJson { .. }
            | Self::NotAnObject
            | Self::MissingField { .. }
            | Self::WrongType { .. }
            | Self::EmptyField { .. } => ErrorCode::new("subscription", "malformed_subscription"),
            Self::InvalidCoreEntry { .. } => ErrorCode::new("subscription", "invalid_core_entry"),
            Self::DuplicateCoreId { .. } => ErrorCode::new("subscription", "duplicate_core_id"),
            Self::IdentifierMismatch { .. } => {
                ErrorCode::new("subscription", "identifier_mismatch")
            },
        }
    }
}

impl fmt::Display for MalformedSubscriptionError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson { message } => {
                write!(formatter, "subscription descriptor is not valid JSON: {message}")
            },
            Self::NotAnObject => formatter.write_str("subscription descriptor must be an object"),
            Self::MissingField { field } => {
                write!(formatter, "subscription descriptor is missing `{field}`")
            },
            Self::WrongType { field, expected } => {
                write!(formatter, "subscription field `{field}` must be {expected}")
            },
            Self::EmptyField { field } => {
                write!(formatter, "subscription field `{field}` must be non-empty")
            },
            Self::InvalidCoreEntry { index, field } => {
                write!(formatter, "search core #{index} has an invalid `{field}`")
            },
            Self::DuplicateCoreId { core_id } => {
                write!(formatter, "search core id `{core_id}` appears more than once")
            },
            Self::IdentifierMismatch { expected, actual } => write!(
                formatter,
                "descriptor for `{actual}` was found where `{expected}` was expected"
            ),
        }
    }
}

impl std::error::Error for MalformedSubscriptionError {}

impl From<MalformedSubscriptionError> for ErrorEnvelope {
    fn from(error: MalformedSubscriptionError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            MalformedSubscriptionError::InvalidJson { .. }
            | MalformedSubscriptionError::NotAnObject => envelope,
            MalformedSubscriptionError::MissingField { field }
            | MalformedSubscriptionError::EmptyField { field } => {
                envelope.with_metadata("field", field)
            },
            MalformedSubscriptionError::WrongType { field, expected } => envelope
                .with_metadata("field", field)
                .with_metadata("expected", expected),
            MalformedSubscriptionError::InvalidCoreEntry { index, field } => envelope
                .with_metadata("index", index.to_string())
                .with_metadata("field", field),
            MalformedSubscriptionError::DuplicateCoreId { core_id } => {
                envelope.with_metadata("core_id", core_id)
            },
            MalformedSubscriptionError::IdentifierMismatch { expected, actual } => envelope
                .with_metadata("expected", expected)
                .with_metadata("actual", actual),
        }
    }
}

/// Credentials are missing or incomplete, so no derived key may be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidCredentialError {
    /// Derived-key salt is empty.
    EmptySalt,
    /// Core name is empty.
    EmptyCoreName,
    /// Subscription key is empty.
    EmptySubscriptionKey,
    /// The signing primitive refused the subscription key.
    UnusableSubscriptionKey,
    /// Manual override was requested but the triple is incomplete.
    IncompleteManualOverride {
        /// Names of the missing manual fields, in declaration order.
        missing: Vec<&'static str>,
    },
    /// No snapshot is available for the manual subscription identifier.
    UnknownSubscription {
        /// Identifier the override pointed at.
        identifier: String,
    },
}

impl InvalidCredentialError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptySalt | Self::EmptyCoreName | Self::EmptySubscriptionKey => {
                ErrorCode::new("credential", "empty_derivation_input")
            },
            Self::UnusableSubscriptionKey => ErrorCode::new("credential", "unusable_key"),
            Self::IncompleteManualOverride { .. } => {
                ErrorCode::new("credential", "incomplete_manual_override")
            },
            Self::UnknownSubscription { .. } => {
                ErrorCode::new("credential", "unknown_subscription")
            },
        }
    }
}

impl fmt::Display for InvalidCredentialError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySalt => formatter.write_str("derived key salt must be non-empty"),
            Self::EmptyCoreName => formatter.write_str("core name must be non-empty"),
            Self::EmptySubscriptionKey => formatter.write_str("subscription key must be non-empty"),
            Self::UnusableSubscriptionKey => {
                formatter.write_str("subscription key cannot be used for signing")
            },
            Self::IncompleteManualOverride { missing } => write!(
                formatter,
                "manual override is incomplete; missing {}",
                missing.join(", ")
            ),
            Self::UnknownSubscription { identifier } => write!(
                formatter,
                "no cached subscription found for identifier `{identifier}`"
            ),
        }
    }
}

impl std::error::Error for InvalidCredentialError {}

impl From<InvalidCredentialError> for ErrorEnvelope {
    fn from(error: InvalidCredentialError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            InvalidCredentialError::EmptySalt => envelope.with_metadata("input", "salt"),
            InvalidCredentialError::EmptyCoreName => envelope.with_metadata("input", "core_name"),
            InvalidCredentialError::EmptySubscriptionKey
            | InvalidCredentialError::UnusableSubscriptionKey => {
                envelope.with_metadata("input", "subscription_key")
            },
            InvalidCredentialError::IncompleteManualOverride { missing } => {
                envelope.with_metadata("missing", missing.join(","))
            },
            InvalidCredentialError::UnknownSubscription { identifier } => {
                envelope.with_metadata("identifier", identifier)
            },
        }
    }
}

/// Any failure that stops a resolution call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Snapshot structure is unusable.
    Subscription(MalformedSubscriptionError),
    /// Credentials are unusable.
    Credential(InvalidCredentialError),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subscription(error) => error.fmt(formatter),
            Self::Credential(error) => error.fmt(formatter),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Subscription(error) => Some(error),
            Self::Credential(error) => Some(error),
        }
    }
}

impl From<MalformedSubscriptionError> for ResolveError {
    fn from(error: MalformedSubscriptionError) -> Self {
        Self::Subscription(error)
    }
}

impl From<InvalidCredentialError> for ResolveError {
    fn from(error: InvalidCredentialError) -> Self {
        Self::Credential(error)
    }
}

impl From<ResolveError> for ErrorEnvelope {
    fn from(error: ResolveError) -> Self {
        match error {
            ResolveError::Subscription(error) => error.into(),
            ResolveError::Credential(error) => error.into(),
        }
    }
}
