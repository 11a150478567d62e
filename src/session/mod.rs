//! Authenticated-session store
//!
//! Maps a user identity to its live portal session. The store is an explicit
//! value owned by the serving layer and passed into request handlers, not a
//! process-wide global, so tests can run against their own isolated stores.
//!
//! Two guarantees the rest of the crate leans on:
//!
//! - **At most one login in flight per identity.** The per-identity slot is
//!   an async mutex; `lease` runs its initializer only while holding it, so
//!   concurrent first requests for the same identity queue instead of racing
//!   two browsers through the login form.
//! - **Exclusive use of a session.** The same slot lock is held for the
//!   lifetime of the returned [`SessionLease`], so two requests can never
//!   interleave navigations on one underlying browser. Requests for
//!   different identities proceed fully in parallel.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use crate::error::Result;

type Slot<S> = Arc<AsyncMutex<Option<S>>>;

/// Concurrency-safe identity → session map.
///
/// Generic over the session payload so tests can exercise the locking
/// behavior without launching browsers. Production code uses
/// `SessionStore<PortalSession>`.
pub struct SessionStore<S> {
    slots: Mutex<HashMap<String, Slot<S>>>,
}

impl<S> Default for SessionStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> SessionStore<S> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Whether a live session is currently stored for `identity`.
    ///
    /// Advisory only: the answer can change the moment the map lock is
    /// released. Callers that need the session must go through [`lease`].
    ///
    /// [`lease`]: SessionStore::lease
    pub fn contains(&self, identity: &str) -> bool {
        match self.slots.lock().get(identity) {
            Some(slot) => slot
                .try_lock()
                .map(|guard| guard.is_some())
                // Slot busy means somebody holds a lease, which implies a
                // session exists or is being created right now.
                .unwrap_or(true),
            None => false,
        }
    }

    /// Store a session for `identity`, returning the one it replaced.
    ///
    /// The caller decides what to do with a displaced session (normally a
    /// best-effort close).
    pub async fn put(&self, identity: &str, session: S) -> Option<S> {
        let slot = self.slot(identity);
        let mut guard = slot.lock().await;
        guard.replace(session)
    }

    /// Exclusive lease on an existing session, or `None` if nothing is
    /// stored for `identity`. Unlike [`lease`], never creates a session.
    ///
    /// [`lease`]: SessionStore::lease
    pub async fn get(&self, identity: &str) -> Option<SessionLease<S>> {
        let slot = {
            let slots = self.slots.lock();
            slots.get(identity)?.clone()
        };
        let guard = slot.lock_owned().await;
        if guard.is_some() {
            Some(SessionLease { guard })
        } else {
            None
        }
    }

    /// Remove and return the session for `identity`, if any.
    ///
    /// Waits for any outstanding lease first. The slot itself stays in the
    /// map so tasks already queued on it and later leases keep serializing
    /// on the same lock; only the payload is taken out.
    pub async fn remove(&self, identity: &str) -> Option<S> {
        let slot = {
            let slots = self.slots.lock();
            slots.get(identity)?.clone()
        };
        let mut guard = slot.lock().await;
        guard.take()
    }

    /// Acquire an exclusive lease on the session for `identity`, creating it
    /// with `init` if the slot is empty.
    ///
    /// `init` runs at most once per empty slot; if it fails, the slot stays
    /// empty and the error propagates, so nothing unauthenticated is ever
    /// stored. Callers queued on the same identity observe the committed
    /// session once the lease drops.
    pub async fn lease<F, Fut>(&self, identity: &str, init: F) -> Result<SessionLease<S>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<S>>,
    {
        let slot = self.slot(identity);
        let mut guard = slot.lock_owned().await;

        if guard.is_none() {
            debug!(identity, "No stored session, initializing");
            let session = init().await?;
            *guard = Some(session);
        } else {
            debug!(identity, "Reusing stored session");
        }

        Ok(SessionLease { guard })
    }

    fn slot(&self, identity: &str) -> Slot<S> {
        let mut slots = self.slots.lock();
        slots
            .entry(identity.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(None)))
            .clone()
    }
}

impl<S> std::fmt::Debug for SessionStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("identities", &self.slots.lock().len())
            .finish()
    }
}

/// Exclusive handle on one identity's session.
///
/// Holding the lease blocks every other request for the same identity;
/// dropping it releases the slot. The payload stays in the store.
pub struct SessionLease<S> {
    guard: OwnedMutexGuard<Option<S>>,
}

impl<S> SessionLease<S> {
    /// The leased session.
    pub fn session(&self) -> &S {
        // A lease is only handed out after the slot was filled.
        self.guard.as_ref().expect("lease always holds a session")
    }

    /// Drop the session from the store and return it, consuming the lease.
    ///
    /// Used to surrender a session that is known broken so the next request
    /// triggers a fresh login.
    pub fn surrender(mut self) -> S {
        self.guard.take().expect("lease always holds a session")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_lease_initializes_once_then_reuses() {
        let store: SessionStore<u32> = SessionStore::new();
        let logins = AtomicU32::new(0);

        let lease = store
            .lease("alice", || async {
                logins.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            })
            .await
            .unwrap();
        assert_eq!(*lease.session(), 7);
        drop(lease);

        let lease = store
            .lease("alice", || async {
                logins.fetch_add(1, Ordering::SeqCst);
                Ok(99)
            })
            .await
            .unwrap();
        assert_eq!(*lease.session(), 7, "second lease must reuse, not re-init");
        assert_eq!(logins.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_init_leaves_slot_empty() {
        let store: SessionStore<u32> = SessionStore::new();

        let err = store
            .lease("bob", || async { Err::<u32, _>(Error::generic("login failed")) })
            .await;
        assert!(err.is_err());
        assert!(!store.contains("bob"));

        // A later attempt gets to try again.
        let lease = store.lease("bob", || async { Ok(1) }).await.unwrap();
        assert_eq!(*lease.session(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_leases_single_init() {
        let store = Arc::new(SessionStore::<u32>::new());
        let logins = Arc::new(AtomicU32::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let logins = logins.clone();
            tasks.push(tokio::spawn(async move {
                let lease = store
                    .lease("carol", || async {
                        logins.fetch_add(1, Ordering::SeqCst);
                        // Give the other tasks time to pile up on the slot.
                        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        Ok(42)
                    })
                    .await
                    .unwrap();
                *lease.session()
            }));
        }

        for task in tasks {
            assert_eq!(task.await.unwrap(), 42);
        }
        assert_eq!(logins.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_identities_do_not_block() {
        let store = Arc::new(SessionStore::<&'static str>::new());

        let lease_a = store.lease("a", || async { Ok("a") }).await.unwrap();
        // With "a" still leased, "b" must proceed immediately.
        let lease_b = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            store.lease("b", || async { Ok("b") }),
        )
        .await
        .expect("lease for a different identity must not block")
        .unwrap();

        assert_eq!(*lease_a.session(), "a");
        assert_eq!(*lease_b.session(), "b");
    }

    #[tokio::test]
    async fn test_put_returns_displaced_session() {
        let store: SessionStore<u32> = SessionStore::new();
        assert_eq!(store.put("dave", 1).await, None);
        assert_eq!(store.put("dave", 2).await, Some(1));
        assert!(store.contains("dave"));
    }

    #[tokio::test]
    async fn test_remove() {
        let store: SessionStore<u32> = SessionStore::new();
        store.put("erin", 5).await;
        assert_eq!(store.remove("erin").await, Some(5));
        assert!(!store.contains("erin"));
        assert_eq!(store.remove("erin").await, None);
    }

    #[tokio::test]
    async fn test_get_returns_lease_only_when_stored() {
        let store: SessionStore<u32> = SessionStore::new();
        assert!(store.get("gus").await.is_none());

        store.put("gus", 11).await;
        let lease = store.get("gus").await.unwrap();
        assert_eq!(*lease.session(), 11);
        drop(lease);

        store.remove("gus").await;
        assert!(store.get("gus").await.is_none());
    }

    #[tokio::test]
    async fn test_get_never_creates_a_session() {
        let store: SessionStore<u32> = SessionStore::new();
        assert!(store.get("hana").await.is_none());
        // The lookup must not have materialized anything for the identity.
        assert!(!store.contains("hana"));
        let logins = AtomicU32::new(0);
        let lease = store
            .lease("hana", || async {
                logins.fetch_add(1, Ordering::SeqCst);
                Ok(4)
            })
            .await
            .unwrap();
        assert_eq!(*lease.session(), 4);
        assert_eq!(logins.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_remove_waits_for_lease_and_keeps_slot() {
        let store = Arc::new(SessionStore::<u32>::new());
        store.put("iris", 1).await;

        let lease = store.lease("iris", || async { Ok(0) }).await.unwrap();
        assert_eq!(*lease.session(), 1);

        let remover = {
            let store = store.clone();
            tokio::spawn(async move { store.remove("iris").await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!remover.is_finished(), "remove must wait for the lease");

        drop(lease);
        assert_eq!(remover.await.unwrap(), Some(1));
        assert!(!store.contains("iris"));

        // The same slot keeps serializing: a later lease re-initializes
        // exactly once, there is never a second live session on the side.
        let lease = store.lease("iris", || async { Ok(2) }).await.unwrap();
        assert_eq!(*lease.session(), 2);
    }

    #[tokio::test]
    async fn test_surrender_empties_slot() {
        let store: SessionStore<u32> = SessionStore::new();
        let lease = store.lease("faye", || async { Ok(3) }).await.unwrap();
        assert_eq!(lease.surrender(), 3);
        assert!(!store.contains("faye"));
    }
}
