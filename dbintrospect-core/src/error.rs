//! Error types for introspection operations.
//!
//! Every failure an operation can produce maps onto one of four classes:
//! a rejected identifier, missing configuration, a failed connection, or a
//! failed catalog query. None of them is ever converted into an empty
//! result by this crate.
//!
//! Error contexts name the operation and the target object. They never
//! carry passwords; connection targets are rendered through the config
//! `Display` impls, which omit credentials.

use thiserror::Error;

/// Boxed driver error used as the source of connection and query failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for dbintrospect operations.
#[derive(Debug, Error)]
pub enum IntrospectError {
    /// Caller-supplied name failed the identifier check; never reaches the network
    #[error("Invalid {kind}: {value}")]
    InvalidIdentifier { kind: String, value: String },

    /// Required connection parameter absent
    #[error("Missing configuration: {message}")]
    MissingConfiguration { message: String },

    /// Transport or authentication failure while opening a session
    #[error("Database connection failed: {context}: {source}")]
    ConnectionFailed {
        context: String,
        #[source]
        source: BoxError,
    },

    /// A validated, connected query still failed at the server or while
    /// decoding its rows
    #[error("Query execution failed: {context}: {source}")]
    BackendQueryFailed {
        context: String,
        #[source]
        source: BoxError,
    },

    /// Serialization of an operation result failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Logging could not be initialized
    #[error("Logging setup failed: {message}")]
    Logging { message: String },
}

/// Convenience type alias for Results with IntrospectError
pub type Result<T> = std::result::Result<T, IntrospectError>;

impl IntrospectError {
    /// Creates an identifier rejection error
    pub fn invalid_identifier(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            kind: kind.into(),
            value: value.into(),
        }
    }

    /// Creates a missing configuration error
    pub fn missing_configuration(message: impl Into<String>) -> Self {
        Self::MissingConfiguration {
            message: message.into(),
        }
    }

    /// Creates a connection error with sanitized context
    pub fn connection_failed(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::ConnectionFailed {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Creates a query execution error
    pub fn query_failed(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::BackendQueryFailed {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Creates a parsing error for a catalog row field
    ///
    /// Decoding failures are reported as query failures: the query ran, but
    /// the backend returned something the normalizer cannot use.
    ///
    /// # Arguments
    /// * `field_name` - Name of the field being parsed
    /// * `operation` - Operation that produced the row
    /// * `reason` - What was wrong with the value
    pub fn parse_field(field_name: &str, operation: &str, reason: impl Into<String>) -> Self {
        Self::BackendQueryFailed {
            context: format!("Failed to parse field '{field_name}' returned by {operation}"),
            source: reason.into().into(),
        }
    }

    /// Creates a serialization error with context
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Whether the failure happened before any network interaction.
    pub const fn is_pre_network(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentifier { .. } | Self::MissingConfiguration { .. }
        )
    }
}
