use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use super::connector::Connector;
use super::error::DatabaseError;
use super::handle::{ConnectionHandle, HandleState, Lifecycle};
use super::options::ConnectionTemplate;

/// Per-host connection handles, owned by the application's composition root
pub struct ConnectionCache {
    template: ConnectionTemplate,
    connector: Arc<dyn Connector>,
    handles: RwLock<HashMap<String, Arc<ConnectionHandle>>>,
}

impl ConnectionCache {
    pub fn new(template: ConnectionTemplate, connector: Arc<dyn Connector>) -> Self {
        Self {
            template,
            connector,
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Shared handle for `host`, created and initialized on first use.
    ///
    /// The slot is claimed under the write lock before any I/O happens and
    /// initialization is serialized inside the handle, so concurrent first
    /// requests for a host end up with one handle and one pool.
    pub async fn get_or_create(&self, host: &str) -> Result<Arc<ConnectionHandle>, DatabaseError> {
        let handle = match self.cached(host).await {
            Some(handle) => handle,
            None => self.claim_slot(host).await,
        };
        self.ready(host, handle).await
    }

    // An uninitialized slot can be evicted between lookup and initialize;
    // take a fresh slot instead of failing the request
    async fn ready(
        &self,
        host: &str,
        mut handle: Arc<ConnectionHandle>,
    ) -> Result<Arc<ConnectionHandle>, DatabaseError> {
        loop {
            if handle.state() == HandleState::Initialized {
                return Ok(handle);
            }
            match handle.initialize(self.connector.as_ref()).await {
                Ok(()) => return Ok(handle),
                Err(DatabaseError::InvalidState {
                    state: HandleState::Destroyed,
                    ..
                }) => {
                    debug!("Connection slot for {} was destroyed before opening, claiming a new one", host);
                    handle = self.claim_slot(host).await;
                }
                Err(e) => {
                    error!("Failed to open connection to {}: {}", host, e);
                    return Err(e);
                }
            }
        }
    }

    /// A fresh handle that belongs to a single request and is never cached
    pub async fn open_scoped(&self, host: &str) -> Result<Arc<ConnectionHandle>, DatabaseError> {
        let handle = Arc::new(ConnectionHandle::new(
            host,
            Lifecycle::RequestScoped,
            self.template.options_for(host),
        ));
        handle.initialize(self.connector.as_ref()).await.map_err(|e| {
            error!("Failed to open request connection to {}: {}", host, e);
            e
        })?;
        Ok(handle)
    }

    // Fast path: read lock only
    async fn cached(&self, host: &str) -> Option<Arc<ConnectionHandle>> {
        let handles = self.handles.read().await;
        handles
            .get(host)
            .filter(|handle| handle.state() != HandleState::Destroyed)
            .cloned()
    }

    async fn claim_slot(&self, host: &str) -> Arc<ConnectionHandle> {
        let mut handles = self.handles.write().await;
        if let Some(existing) = handles.get(host) {
            if existing.state() != HandleState::Destroyed {
                return existing.clone();
            }
        }

        let handle = Arc::new(ConnectionHandle::new(
            host,
            Lifecycle::Shared,
            self.template.options_for(host),
        ));
        handles.insert(host.to_string(), handle.clone());
        handle
    }

    /// Drop and destroy the cached handle for `host`
    pub async fn evict(&self, host: &str) -> bool {
        let removed = self.handles.write().await.remove(host);
        match removed {
            Some(handle) => {
                handle.destroy().await;
                info!("Evicted connection for {}", host);
                true
            }
            None => false,
        }
    }

    /// Close and remove all handles (e.g., on shutdown)
    pub async fn close_all(&self) {
        let drained: Vec<_> = self.handles.write().await.drain().collect();
        for (host, handle) in drained {
            handle.destroy().await;
            info!("Closed cached connection for {}", host);
        }
    }

    pub async fn snapshot(&self) -> BTreeMap<String, HandleState> {
        let handles = self.handles.read().await;
        handles
            .iter()
            .map(|(host, handle)| (host.clone(), handle.state()))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.handles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.handles.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{options, template, FailingConnector, LazyConnector};
    use std::time::Duration;

    fn cache(connector: Arc<dyn Connector>) -> ConnectionCache {
        ConnectionCache::new(template(), connector)
    }

    #[tokio::test]
    async fn returns_the_same_handle_per_host() {
        let connector = Arc::new(LazyConnector::new());
        let cache = cache(connector.clone());

        let first = cache.get_or_create("10.0.0.1").await.unwrap();
        let second = cache.get_or_create("10.0.0.1").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.lifecycle(), Lifecycle::Shared);
        assert_eq!(connector.opened(), 1);

        let other = cache.get_or_create("10.0.0.2").await.unwrap();
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(connector.opened(), 2);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn concurrent_first_requests_open_one_connection() {
        let connector = Arc::new(LazyConnector::with_delay(Duration::from_millis(25)));
        let cache = Arc::new(cache(connector.clone()));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_or_create("10.0.0.1").await })
            })
            .collect();

        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap().unwrap());
        }

        assert_eq!(connector.opened(), 1);
        assert!(handles.iter().all(|h| Arc::ptr_eq(h, &handles[0])));
        assert_eq!(handles[0].state(), HandleState::Initialized);
    }

    #[tokio::test]
    async fn scoped_handles_are_never_cached() {
        let connector = Arc::new(LazyConnector::new());
        let cache = cache(connector.clone());

        let first = cache.open_scoped("10.0.0.1").await.unwrap();
        let second = cache.open_scoped("10.0.0.1").await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.lifecycle(), Lifecycle::RequestScoped);
        assert_eq!(connector.opened(), 2);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn connection_failures_propagate_and_retry() {
        let cache = cache(Arc::new(FailingConnector));
        let err = cache.get_or_create("10.0.0.1").await.unwrap_err();
        assert!(matches!(err, DatabaseError::Connection { .. }));

        // Slot stays, so the next request re-attempts rather than failing fast
        let snapshot = cache.snapshot().await;
        assert_eq!(snapshot.get("10.0.0.1"), Some(&HandleState::Uninitialized));
        assert!(cache.get_or_create("10.0.0.1").await.is_err());

        assert!(matches!(
            cache.open_scoped("10.0.0.1").await,
            Err(DatabaseError::Connection { .. })
        ));
    }

    #[tokio::test]
    async fn destroyed_handles_are_replaced() {
        let connector = Arc::new(LazyConnector::new());
        let cache = cache(connector.clone());

        let first = cache.get_or_create("10.0.0.1").await.unwrap();
        first.destroy().await;

        let second = cache.get_or_create("10.0.0.1").await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.state(), HandleState::Initialized);
        assert_eq!(connector.opened(), 2);
    }

    #[tokio::test]
    async fn slot_destroyed_before_opening_is_reclaimed() {
        let connector = Arc::new(LazyConnector::new());
        let cache = cache(connector.clone());

        // Looked up while uninitialized, then evicted by someone else
        let stale = Arc::new(ConnectionHandle::new("10.0.0.1", Lifecycle::Shared, options("10.0.0.1")));
        stale.destroy().await;

        let fresh = cache.ready("10.0.0.1", stale.clone()).await.unwrap();
        assert!(!Arc::ptr_eq(&stale, &fresh));
        assert_eq!(fresh.state(), HandleState::Initialized);
        assert_eq!(connector.opened(), 1);

        let cached = cache.get_or_create("10.0.0.1").await.unwrap();
        assert!(Arc::ptr_eq(&fresh, &cached));
    }

    #[tokio::test]
    async fn evict_and_close_all_destroy_handles() {
        let cache = cache(Arc::new(LazyConnector::new()));
        let a = cache.get_or_create("10.0.0.1").await.unwrap();
        let b = cache.get_or_create("10.0.0.2").await.unwrap();

        assert!(cache.evict("10.0.0.1").await);
        assert!(!cache.evict("10.0.0.1").await);
        assert_eq!(a.state(), HandleState::Destroyed);

        cache.close_all().await;
        assert_eq!(b.state(), HandleState::Destroyed);
        assert!(cache.is_empty().await);
    }
}
