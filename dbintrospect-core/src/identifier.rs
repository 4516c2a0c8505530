//! Identifier validation for caller-supplied schema, keyspace and table names.
//!
//! Catalog queries in this crate bind names as parameters wherever the
//! driver allows it, but the names still flow into query text on some
//! backends and into log lines everywhere. This check is the gate every
//! name passes before any of that happens.
//!
//! # Rules
//! - Non-empty
//! - ASCII letters, digits and underscores only
//! - No length cap and no leading-character restriction

use crate::Result;
use crate::error::IntrospectError;

/// Label used for schema names in rejection messages.
pub const SCHEMA_NAME: &str = "schema name";
/// Label used for keyspace names in rejection messages.
pub const KEYSPACE_NAME: &str = "keyspace name";
/// Label used for table names in rejection messages.
pub const TABLE_NAME: &str = "table name";

/// Returns true when `name` is a non-empty run of `[A-Za-z0-9_]`.
pub fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Validates a caller-supplied identifier.
///
/// # Arguments
/// * `name` - The raw name supplied by the caller
/// * `kind` - Human label embedded in the error, e.g. `"schema name"`
///
/// # Errors
/// Returns `IntrospectError::InvalidIdentifier` with the message
/// `Invalid <kind>: <name>` when the name does not match `^[A-Za-z0-9_]+$`.
///
/// # Example
/// ```rust
/// use dbintrospect_core::identifier::validate_identifier;
///
/// assert!(validate_identifier("user_profiles", "table name").is_ok());
///
/// let err = validate_identifier("users; DROP TABLE x", "table name").unwrap_err();
/// assert_eq!(err.to_string(), "Invalid table name: users; DROP TABLE x");
/// ```
pub fn validate_identifier(name: &str, kind: &str) -> Result<()> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(IntrospectError::invalid_identifier(kind, name))
    }
}

/// Validates an identifier on behalf of an operation, logging rejections.
pub(crate) fn require_identifier(name: &str, kind: &str) -> Result<()> {
    validate_identifier(name, kind)
        .inspect_err(|e| tracing::warn!(error = %e, "Rejected identifier"))
}
