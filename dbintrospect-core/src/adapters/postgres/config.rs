//! PostgreSQL connection configuration.

use crate::Result;
use crate::credentials::Credentials;
use crate::error::IntrospectError;

/// Host used when none is configured.
pub const DEFAULT_HOST: &str = "localhost";

/// PostgreSQL default port.
pub const DEFAULT_PORT: u16 = 5432;

/// Connection settings for one PostgreSQL database.
///
/// User, password and database are mandatory; construction fails before
/// any connection attempt when one of them is absent or empty.
///
/// # Security
/// The password lives in a zeroizing container and is omitted from both
/// `Debug` and `Display` output.
///
/// # Example
/// ```rust
/// use dbintrospect_core::adapters::postgres::PostgresConfig;
///
/// let config = PostgresConfig::new(None, None, Some("app"), Some("secret"), Some("appdb")).unwrap();
/// assert_eq!(config.host(), "localhost");
/// assert_eq!(config.port(), 5432);
/// assert_eq!(config.to_string(), "postgres://localhost:5432/appdb");
///
/// assert!(PostgresConfig::new(None, None, Some("app"), None, Some("appdb")).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    host: String,
    port: u16,
    database: String,
    credentials: Credentials,
}

impl PostgresConfig {
    /// Builds a configuration, applying host and port defaults.
    ///
    /// # Errors
    /// Returns `IntrospectError::MissingConfiguration` naming every
    /// mandatory parameter that is absent or empty.
    pub fn new(
        host: Option<&str>,
        port: Option<u16>,
        user: Option<&str>,
        password: Option<&str>,
        database: Option<&str>,
    ) -> Result<Self> {
        fn present(value: Option<&str>) -> Option<&str> {
            value.filter(|v| !v.is_empty())
        }

        let missing: Vec<&str> = [("user", user), ("password", password), ("database", database)]
            .into_iter()
            .filter(|(_, value)| present(*value).is_none())
            .map(|(name, _)| name)
            .collect();

        match (present(user), present(password), present(database)) {
            (Some(user), Some(password), Some(database)) => Ok(Self {
                host: present(host).unwrap_or(DEFAULT_HOST).to_string(),
                port: port.unwrap_or(DEFAULT_PORT),
                database: database.to_string(),
                credentials: Credentials::new(user, password),
            }),
            _ => {
                let missing = missing.join(", ");
                tracing::error!(%missing, "PostgreSQL configuration is incomplete");
                Err(IntrospectError::missing_configuration(format!(
                    "PostgreSQL user, password and database are required (missing: {missing})"
                )))
            }
        }
    }

    /// Server host name or address.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Server port.
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Target database name.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Login credentials.
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl std::fmt::Display for PostgresConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never include credentials
        write!(f, "postgres://{}:{}/{}", self.host, self.port, self.database)
    }
}
