//! Database connection acquisition
//!
//! [`ConnectionCache`] hands out one shared connection per owner. The first
//! `acquire()` opens it; callers that arrive while that attempt is running
//! await the same attempt instead of opening their own.
//!
//! State machine: `Unconnected -> Connecting -> Connected`, back to
//! `Unconnected` on failure, `Closed` after [`ConnectionCache::close`].

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::config::DatabaseConfig;
use crate::error::{StoreError, StoreResult};

/// Live handle to the backing database.
///
/// Cheap to clone; clones share the underlying pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close every pooled connection. Later queries fail immediately.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Opens connections for a [`ConnectionCache`].
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Connection: Clone + Send + Sync + 'static;

    async fn connect(&self) -> Result<Self::Connection, sqlx::Error>;

    /// Release a connection the cache is giving up.
    async fn disconnect(&self, _conn: Self::Connection) {}
}

/// Connects to PostgreSQL using a [`DatabaseConfig`].
///
/// The pool is opened eagerly: `connect` only returns once the server has
/// answered, so nothing can be queued against a connection that does not
/// exist yet.
#[derive(Debug, Clone)]
pub struct PgConnector {
    config: DatabaseConfig,
}

impl PgConnector {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Connection = Database;

    async fn connect(&self) -> Result<Database, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(self.config.max_connections)
            .acquire_timeout(self.config.acquire_timeout)
            .connect(&self.config.database_url)
            .await?;
        Ok(Database::new(pool))
    }

    async fn disconnect(&self, conn: Database) {
        conn.close().await;
    }
}

/// Why an attempt did not produce a connection. Cloned out to every waiter.
#[derive(Debug, Clone)]
enum AttemptError {
    Failed(Arc<sqlx::Error>),
    Closed,
}

type AttemptResult<T> = Result<T, AttemptError>;
type PendingConnection<T> = Shared<BoxFuture<'static, AttemptResult<T>>>;

enum State<T> {
    Unconnected,
    Connecting(PendingConnection<T>),
    Connected(T),
    Closed,
}

struct Inner<C: Connector> {
    connector: Arc<C>,
    state: Mutex<State<C::Connection>>,
}

impl<C: Connector> Inner<C> {
    /// Record an attempt's outcome. Runs inside the attempt task, so the
    /// state leaves `Connecting` even if every waiter has gone away.
    async fn settle(
        &self,
        result: Result<C::Connection, sqlx::Error>,
    ) -> AttemptResult<C::Connection> {
        let mut state = self.state.lock().await;

        if matches!(&*state, State::Closed) {
            drop(state);
            if let Ok(conn) = result {
                tracing::info!("closing database connection opened after close");
                self.connector.disconnect(conn).await;
            }
            return Err(AttemptError::Closed);
        }

        match result {
            Ok(conn) => {
                tracing::info!("database connection established");
                *state = State::Connected(conn.clone());
                Ok(conn)
            }
            Err(err) => {
                tracing::error!(error = %err, "database connection failed");
                *state = State::Unconnected;
                Err(AttemptError::Failed(Arc::new(err)))
            }
        }
    }
}

/// Memoizes a single connection and deduplicates concurrent attempts.
///
/// Owned by the application's startup routine and passed to whoever needs a
/// connection. Clones share state.
pub struct ConnectionCache<C: Connector> {
    inner: Arc<Inner<C>>,
}

impl<C: Connector> Clone for ConnectionCache<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ConnectionCache<PgConnector> {
    /// Cache backed by PostgreSQL.
    pub fn postgres(config: DatabaseConfig) -> Self {
        Self::new(PgConnector::new(config))
    }
}

impl<C: Connector> ConnectionCache<C> {
    pub fn new(connector: C) -> Self {
        Self {
            inner: Arc::new(Inner {
                connector: Arc::new(connector),
                state: Mutex::new(State::Unconnected),
            }),
        }
    }

    /// Return the cached connection, opening it if needed.
    ///
    /// All callers that overlap with one connection attempt observe its
    /// single outcome. A failed attempt leaves the cache unconnected so the
    /// next call starts over. Dropping the returned future (a caller-side
    /// timeout, say) does not stop the attempt; it still settles the cache.
    ///
    /// # Errors
    ///
    /// [`StoreError::Connection`] when the attempt fails (the same cause for
    /// every waiter), [`StoreError::ConnectionClosed`] after `close()`.
    pub async fn acquire(&self) -> StoreResult<C::Connection> {
        let pending = {
            let mut state = self.inner.state.lock().await;
            let in_flight = match &*state {
                State::Connected(conn) => return Ok(conn.clone()),
                State::Closed => return Err(StoreError::ConnectionClosed),
                State::Connecting(pending) => Some(pending.clone()),
                State::Unconnected => None,
            };

            match in_flight {
                Some(pending) => pending,
                None => {
                    let pending = self.start_attempt();
                    *state = State::Connecting(pending.clone());
                    pending
                }
            }
        };

        pending.await.map_err(|err| match err {
            AttemptError::Failed(source) => StoreError::Connection { source },
            AttemptError::Closed => StoreError::ConnectionClosed,
        })
    }

    /// Spawn one connection attempt. The task owns connect-and-settle, so no
    /// waiter can be cancelled between the outcome and the state change.
    fn start_attempt(&self) -> PendingConnection<C::Connection> {
        tracing::debug!("opening database connection");
        let connector = Arc::clone(&self.inner.connector);
        let cache = Arc::downgrade(&self.inner);

        let task = tokio::spawn({
            let cache = cache.clone();
            async move {
                let result = connector.connect().await;
                match cache.upgrade() {
                    Some(inner) => inner.settle(result).await,
                    None => {
                        if let Ok(conn) = result {
                            connector.disconnect(conn).await;
                        }
                        Err(AttemptError::Closed)
                    }
                }
            }
        });

        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    tracing::error!(error = %join_err, "connection attempt aborted");
                    match cache.upgrade() {
                        Some(inner) => inner.settle(Err(sqlx::Error::WorkerCrashed)).await,
                        None => Err(AttemptError::Closed),
                    }
                }
            }
        }
        .boxed()
        .shared()
    }

    /// True once a connection has been established and not closed.
    pub async fn is_connected(&self) -> bool {
        matches!(&*self.inner.state.lock().await, State::Connected(_))
    }

    /// Shut the cache down, releasing the cached connection if any.
    ///
    /// Subsequent `acquire()` calls fail with [`StoreError::ConnectionClosed`].
    /// An attempt still in flight is disconnected as soon as it finishes and
    /// its waiters get `ConnectionClosed`.
    pub async fn close(&self) {
        let previous = {
            let mut state = self.inner.state.lock().await;
            std::mem::replace(&mut *state, State::Closed)
        };

        if let State::Connected(conn) = previous {
            tracing::info!("closing database connection");
            self.inner.connector.disconnect(conn).await;
        }
    }
}
