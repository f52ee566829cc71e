use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::postgres::PgConnectOptions;
use sqlx::PgPool;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

use super::connector::Connector;
use super::error::DatabaseError;
use super::rows::rows_to_json;

/// `uninitialized -> initialized -> destroyed`, with destroy idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleState {
    Uninitialized,
    Initialized,
    Destroyed,
}

/// Who owns a handle and therefore who may destroy it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Cached per host and shared across requests; never destroyed per request
    Shared,
    /// Opened for one request and destroyed when its response ends
    RequestScoped,
}

/// A database connection pool for one tenant host with an explicit lifecycle
pub struct ConnectionHandle {
    id: Uuid,
    host: String,
    lifecycle: Lifecycle,
    options: PgConnectOptions,
    pool: Mutex<Option<PgPool>>,
    state: watch::Sender<HandleState>,
}

impl ConnectionHandle {
    pub fn new(host: impl Into<String>, lifecycle: Lifecycle, options: PgConnectOptions) -> Self {
        let (state, _) = watch::channel(HandleState::Uninitialized);
        Self {
            id: Uuid::new_v4(),
            host: host.into(),
            lifecycle,
            options,
            pool: Mutex::new(None),
            state,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn state(&self) -> HandleState {
        *self.state.borrow()
    }

    /// Open the underlying pool if that has not happened yet.
    ///
    /// Callers racing on the same handle queue on the pool lock, so only
    /// the first one connects. A failed attempt leaves the handle
    /// uninitialized and the next caller tries again.
    pub async fn initialize(&self, connector: &dyn Connector) -> Result<(), DatabaseError> {
        let mut pool = self.pool.lock().await;
        match self.state() {
            HandleState::Initialized => return Ok(()),
            HandleState::Destroyed => return Err(self.invalid_state()),
            HandleState::Uninitialized => {}
        }

        let opened = connector
            .connect(&self.options)
            .await
            .map_err(|source| DatabaseError::Connection {
                host: self.host.clone(),
                source,
            })?;

        *pool = Some(opened);
        self.state.send_replace(HandleState::Initialized);
        info!("Opened {:?} connection {} to {}", self.lifecycle, self.id, self.host);
        Ok(())
    }

    /// Close the pool. Safe to call any number of times.
    pub async fn destroy(&self) {
        let mut pool = self.pool.lock().await;
        if self.state() == HandleState::Destroyed {
            debug!("Connection {} to {} already destroyed", self.id, self.host);
            return;
        }

        self.state.send_replace(HandleState::Destroyed);
        if let Some(pool) = pool.take() {
            pool.close().await;
            info!("Closed {:?} connection {} to {}", self.lifecycle, self.id, self.host);
        }
    }

    /// Resolves once the handle has been destroyed
    pub async fn closed(&self) {
        let mut receiver = self.state.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here
        let _ = receiver.wait_for(|state| *state == HandleState::Destroyed).await;
    }

    /// The live pool. Fails without touching the network unless initialized.
    pub async fn pool(&self) -> Result<PgPool, DatabaseError> {
        let pool = self.pool.lock().await;
        match (self.state(), pool.as_ref()) {
            (HandleState::Initialized, Some(pool)) => Ok(pool.clone()),
            _ => Err(self.invalid_state()),
        }
    }

    pub async fn ping(&self) -> Result<(), DatabaseError> {
        let pool = self.pool().await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }

    /// Run a read query and return rows as JSON objects
    pub async fn fetch_json(&self, sql: &str) -> Result<Vec<Map<String, Value>>, DatabaseError> {
        let pool = self.pool().await?;
        let rows = sqlx::query(sql).fetch_all(&pool).await?;
        Ok(rows_to_json(rows))
    }

    fn invalid_state(&self) -> DatabaseError {
        DatabaseError::InvalidState {
            host: self.host.clone(),
            state: self.state(),
        }
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("host", &self.host)
            .field("lifecycle", &self.lifecycle)
            .field("state", &self.state())
            .finish()
    }
}
