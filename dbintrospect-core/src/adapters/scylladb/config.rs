//! ScyllaDB connection configuration.

use crate::credentials::Credentials;

/// Host used when none is configured.
pub const DEFAULT_HOST: &str = "localhost";

/// CQL native protocol default port.
pub const DEFAULT_PORT: u16 = 9042;

/// Contact point and optional credentials for a ScyllaDB/Cassandra cluster.
///
/// Authentication is enabled only when both user and password are given;
/// if either is missing the driver connects without authenticating.
/// Construction never fails.
///
/// # Example
/// ```rust
/// use dbintrospect_core::adapters::scylladb::ScyllaConfig;
///
/// let config = ScyllaConfig::new(Some("scylla-1"), None, Some("cassandra"), None);
/// assert_eq!(config.known_node(), "scylla-1:9042");
/// assert!(config.credentials().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct ScyllaConfig {
    host: String,
    port: u16,
    credentials: Option<Credentials>,
}

impl ScyllaConfig {
    /// Builds a configuration, applying host and port defaults.
    pub fn new(
        host: Option<&str>,
        port: Option<u16>,
        user: Option<&str>,
        password: Option<&str>,
    ) -> Self {
        Self {
            host: host
                .filter(|h| !h.is_empty())
                .unwrap_or(DEFAULT_HOST)
                .to_string(),
            port: port.unwrap_or(DEFAULT_PORT),
            credentials: Credentials::from_optional(user, password),
        }
    }

    /// Contact point host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Contact point port.
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Credentials, when authentication is enabled.
    pub const fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// `host:port` string handed to the driver as the known node.
    pub fn known_node(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Display for ScyllaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "scylla://{}:{}", self.host, self.port)
    }
}
