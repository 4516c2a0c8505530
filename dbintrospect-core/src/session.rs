//! Lazy single-session lifecycle management.
//!
//! A [`SessionManager`] owns at most one live backend session. The session
//! is opened on first use, replaced when it reports itself unusable, and
//! released by [`SessionManager::close`], which may be called any number of
//! times.
//!
//! The manager is not internally synchronized. Every operation takes
//! `&mut self`; hosts that share one manager between tasks must wrap it in
//! a mutex themselves.

use crate::Result;
use crate::catalog::{CatalogRow, CatalogSession, Connector};
use crate::error::IntrospectError;
use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::Span;

/// Owns the connector configuration and the single optional live session.
pub struct SessionManager<C: Connector> {
    connector: C,
    session: Option<C::Session>,
    span: Span,
}

impl<C: Connector> std::fmt::Debug for SessionManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("target", &self.connector.target())
            .field("connected", &self.session.is_some())
            .finish()
    }
}

impl<C: Connector> SessionManager<C> {
    /// Creates a manager without opening a session.
    pub fn new(connector: C) -> Self {
        let span = tracing::info_span!("session", target = %connector.target());
        Self {
            connector,
            session: None,
            span,
        }
    }

    /// Replaces the span that parents every event this manager emits.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Span parenting this manager's events.
    pub const fn span(&self) -> &Span {
        &self.span
    }

    /// The connector this manager opens sessions with.
    pub const fn connector(&self) -> &C {
        &self.connector
    }

    /// Whether a session is currently held.
    pub const fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Returns the live session, opening one if needed.
    ///
    /// An existing session that reports itself unusable is closed before a
    /// replacement is opened, so at most one handle is ever held.
    ///
    /// # Errors
    /// Returns `IntrospectError::ConnectionFailed` if a new session could
    /// not be opened. No retry is attempted.
    pub async fn ensure_connected(&mut self) -> Result<&mut C::Session> {
        let session = match self.session.take() {
            Some(session) if session.is_usable() => session,
            Some(stale) => {
                tracing::warn!("Session is no longer usable, reconnecting");
                if let Err(e) = stale.close().await {
                    tracing::warn!(error = %e, "Failed to close stale session");
                }
                Self::open(&self.connector).await?
            }
            None => Self::open(&self.connector).await?,
        };
        Ok(self.session.insert(session))
    }

    async fn open(connector: &C) -> Result<C::Session> {
        let target = connector.target();
        tracing::debug!(%target, "Opening session");
        match connector.connect().await {
            Ok(session) => {
                tracing::info!(%target, "Session opened");
                Ok(session)
            }
            Err(e) => {
                tracing::error!(%target, error = %e, "Connection failed");
                Err(IntrospectError::connection_failed(
                    format!("Failed to connect to {target}"),
                    e,
                ))
            }
        }
    }

    /// Ensures a session and runs one catalog query on it.
    ///
    /// # Arguments
    /// * `operation` - Operation name for logs and error context
    /// * `object` - Target object description for logs and error context
    /// * `query` - Catalog query text
    /// * `params` - Positional parameters, already validated
    ///
    /// # Errors
    /// `ConnectionFailed` if no session could be opened,
    /// `BackendQueryFailed` if the query itself failed.
    pub async fn query(
        &mut self,
        operation: &str,
        object: &str,
        query: &str,
        params: &[&str],
    ) -> Result<Vec<CatalogRow>> {
        let session = self.ensure_connected().await?;
        tracing::debug!(operation, object, "Executing catalog query");
        match session.execute(query, params).await {
            Ok(rows) => {
                tracing::debug!(operation, object, rows = rows.len(), "Catalog query completed");
                Ok(rows)
            }
            Err(e) => {
                tracing::error!(operation, object, error = %e, "Catalog query failed");
                Err(IntrospectError::query_failed(
                    format!("{operation} failed for {object}"),
                    e,
                ))
            }
        }
    }

    /// Releases the session if one is held.
    ///
    /// Safe to call when no session was ever opened and safe to call
    /// repeatedly. A driver error during shutdown is logged; the handle is
    /// dropped regardless.
    pub async fn close(&mut self) {
        if let Some(session) = self.session.take() {
            match session.close().await {
                Ok(()) => tracing::info!("Session closed"),
                Err(e) => tracing::warn!(error = %e, "Session close reported an error"),
            }
        }
    }
}

/// Resources whose session must be released at the end of a scope.
#[async_trait]
pub trait Closeable: Send {
    /// Releases any held session. Must be idempotent.
    async fn close(&mut self);
}

#[async_trait]
impl<C: Connector> Closeable for SessionManager<C> {
    async fn close(&mut self) {
        Self::close(self).await;
    }
}

/// Runs `f` against `resource`, then closes it on every exit path.
///
/// The resource is consumed: its session is closed exactly once after `f`
/// resolves, whether `f` succeeded or failed, and `f`'s outcome is
/// returned unchanged.
///
/// # Example
/// ```rust,no_run
/// use dbintrospect_core::adapters::postgres::{PostgresConfig, PostgresIntrospector};
/// use dbintrospect_core::session::with_scoped;
///
/// # async fn example() -> dbintrospect_core::Result<()> {
/// let config = PostgresConfig::new(None, None, Some("app"), Some("secret"), Some("appdb"))?;
/// let schemas = with_scoped(PostgresIntrospector::new(config), |db| {
///     Box::pin(async move { db.list_schemas().await })
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
/// Returns whatever `f` returned.
pub async fn with_scoped<R, T, F>(mut resource: R, f: F) -> Result<T>
where
    R: Closeable,
    F: for<'a> FnOnce(&'a mut R) -> BoxFuture<'a, Result<T>>,
{
    let outcome = f(&mut resource).await;
    resource.close().await;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counters {
        connects: AtomicUsize,
        closes: AtomicUsize,
        fail_connect: AtomicBool,
        poison_after_query: AtomicBool,
    }

    struct FakeSession {
        counters: Arc<Counters>,
        usable: bool,
    }

    #[async_trait]
    impl CatalogSession for FakeSession {
        async fn execute(
            &mut self,
            query: &str,
            _params: &[&str],
        ) -> std::result::Result<Vec<CatalogRow>, BoxError> {
            if self.counters.poison_after_query.load(Ordering::SeqCst) {
                self.usable = false;
            }
            if query == "FAIL" {
                return Err("relation does not exist".into());
            }
            Ok(Vec::new())
        }

        fn is_usable(&self) -> bool {
            self.usable
        }

        async fn close(self) -> std::result::Result<(), BoxError> {
            self.counters.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FakeConnector {
        counters: Arc<Counters>,
    }

    #[async_trait]
    impl Connector for FakeConnector {
        type Session = FakeSession;

        fn target(&self) -> String {
            "fake://localhost".to_string()
        }

        async fn connect(&self) -> std::result::Result<FakeSession, BoxError> {
            self.counters.connects.fetch_add(1, Ordering::SeqCst);
            if self.counters.fail_connect.load(Ordering::SeqCst) {
                return Err("authentication failed".into());
            }
            Ok(FakeSession {
                counters: Arc::clone(&self.counters),
                usable: true,
            })
        }
    }

    fn manager() -> (SessionManager<FakeConnector>, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let connector = FakeConnector {
            counters: Arc::clone(&counters),
        };
        (SessionManager::new(connector), counters)
    }

    fn assert_send<T: Send>(_: &T) {}

    // Compiles only if the futures are Send for any connector.
    fn manager_futures_are_send<C: Connector>(manager: &mut SessionManager<C>) {
        assert_send(&manager.ensure_connected());
        assert_send(&manager.query("op", "obj", "SELECT 1", &[]));
        assert_send(&manager.close());
    }

    #[test]
    fn test_futures_are_send_for_generic_connectors() {
        let (mut manager, counters) = manager();
        manager_futures_are_send(&mut manager);
        assert_eq!(counters.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_connects_lazily_and_once() {
        let (mut manager, counters) = manager();
        assert!(!manager.is_connected());
        assert_eq!(counters.connects.load(Ordering::SeqCst), 0);

        manager.query("op", "obj", "SELECT 1", &[]).await.unwrap();
        manager.query("op", "obj", "SELECT 1", &[]).await.unwrap();

        assert!(manager.is_connected());
        assert_eq!(counters.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (mut manager, counters) = manager();
        manager.close().await;
        manager.close().await;
        assert_eq!(counters.closes.load(Ordering::SeqCst), 0);

        manager.ensure_connected().await.unwrap();
        manager.close().await;
        manager.close().await;
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
        assert!(!manager.is_connected());
    }

    #[tokio::test]
    async fn test_reopens_after_close() {
        let (mut manager, counters) = manager();
        manager.ensure_connected().await.unwrap();
        manager.close().await;
        manager.ensure_connected().await.unwrap();

        assert_eq!(counters.connects.load(Ordering::SeqCst), 2);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unusable_session_is_closed_then_replaced() {
        let (mut manager, counters) = manager();
        counters.poison_after_query.store(true, Ordering::SeqCst);
        manager.query("op", "obj", "SELECT 1", &[]).await.unwrap();

        counters.poison_after_query.store(false, Ordering::SeqCst);
        manager.query("op", "obj", "SELECT 1", &[]).await.unwrap();

        assert_eq!(counters.connects.load(Ordering::SeqCst), 2);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_is_connection_failed() {
        let (mut manager, counters) = manager();
        counters.fail_connect.store(true, Ordering::SeqCst);

        let err = manager.query("op", "obj", "SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(err, IntrospectError::ConnectionFailed { .. }));
        assert!(err.to_string().contains("authentication failed"));
        assert!(err.to_string().contains("fake://localhost"));
        assert!(!manager.is_connected());
    }

    #[tokio::test]
    async fn test_query_failure_is_backend_query_failed() {
        let (mut manager, _counters) = manager();
        let err = manager
            .query("list_tables", "schema 'public'", "FAIL", &[])
            .await
            .unwrap_err();

        assert!(matches!(err, IntrospectError::BackendQueryFailed { .. }));
        let message = err.to_string();
        assert!(message.contains("list_tables"));
        assert!(message.contains("schema 'public'"));
        assert!(message.contains("relation does not exist"));
    }

    #[tokio::test]
    async fn test_with_scoped_closes_on_success_and_failure() {
        let (manager, counters) = manager();
        let rows = with_scoped(manager, |m| {
            Box::pin(async move { m.query("op", "obj", "SELECT 1", &[]).await })
        })
        .await
        .unwrap();
        assert!(rows.is_empty());
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);

        let (manager, counters) = super::tests::manager();
        let result = with_scoped(manager, |m| {
            Box::pin(async move { m.query("op", "obj", "FAIL", &[]).await })
        })
        .await;
        assert!(result.is_err());
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }
}
