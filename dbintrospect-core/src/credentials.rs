//! Secure credential container with automatic memory zeroing.
//!
//! # Security
//! - Username and password live in `Zeroizing<String>` containers
//! - Memory is cleared when the credentials go out of scope
//! - `Debug` output never includes the password

use zeroize::Zeroizing;

/// Username/password pair that zeroes its memory on drop.
///
/// # Example
///
/// ```rust
/// use dbintrospect_core::credentials::Credentials;
///
/// let creds = Credentials::new("admin", "secret");
/// assert_eq!(creds.username(), "admin");
/// assert!(!format!("{creds:?}").contains("secret"));
/// ```
#[derive(Clone)]
pub struct Credentials {
    username: Zeroizing<String>,
    password: Zeroizing<String>,
}

impl Credentials {
    /// Creates new credentials with automatic memory zeroing.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Zeroizing::new(username.into()),
            password: Zeroizing::new(password.into()),
        }
    }

    /// Builds credentials only when both parts are present and non-empty.
    ///
    /// Returns `None` when either part is missing, which callers treat as
    /// "authentication disabled".
    pub fn from_optional(username: Option<&str>, password: Option<&str>) -> Option<Self> {
        match (username, password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some(Self::new(u, p)),
            _ => None,
        }
    }

    /// Gets the username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Gets the password. Never log the returned value.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username.as_str())
            .field("password", &"****")
            .finish()
    }
}
