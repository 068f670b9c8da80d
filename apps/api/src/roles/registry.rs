use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::session::Session;
use crate::roles::store::{RoleDeps, RoleStore};

/// Stores untouched for this long are dropped and remounted on next use.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(15 * 60);

struct Mounted {
    store: Arc<RoleStore>,
    last_seen: Instant,
}

impl Mounted {
    fn new(store: Arc<RoleStore>) -> Self {
        Self {
            store,
            last_seen: Instant::now(),
        }
    }

    fn is_idle(&self, ttl: Duration) -> bool {
        self.last_seen.elapsed() >= ttl
    }

    /// Still valid for `session`: same explicit role and not idle.
    fn serves(&self, session: &Session, ttl: Duration) -> bool {
        self.store.explicit_role() == session.explicit_role() && !self.is_idle(ttl)
    }

    fn touch(&mut self, session: &Session) -> Arc<RoleStore> {
        self.last_seen = Instant::now();
        self.store.refresh_session(session);
        Arc::clone(&self.store)
    }
}

/// One mounted `RoleStore` per signed-in user, shared across their requests.
///
/// Anonymous callers get a fresh store per request; nothing is kept for them.
/// Stores idle past the TTL are swept whenever a new store is mounted, so a
/// returning user gets a fresh detection.
#[derive(Clone)]
pub struct RoleRegistry {
    deps: RoleDeps,
    idle_ttl: Duration,
    stores: Arc<Mutex<HashMap<Uuid, Mounted>>>,
}

impl RoleRegistry {
    pub fn new(deps: RoleDeps) -> Self {
        Self {
            deps,
            idle_ttl: DEFAULT_IDLE_TTL,
            stores: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    /// Returns the user's store, mounting it on first use.
    ///
    /// A store is remounted when the identity provider reports a different
    /// explicit role than the one it was mounted with. Other identity changes
    /// are applied to the existing store.
    pub async fn store_for(&self, session: &Session) -> Arc<RoleStore> {
        let Some(user_id) = session.user_id() else {
            return Arc::new(RoleStore::mount(Session::Unauthenticated, self.deps.clone()).await);
        };

        {
            let mut stores = self.stores.lock().await;
            if let Some(mounted) = stores.get_mut(&user_id) {
                if mounted.serves(session, self.idle_ttl) {
                    return mounted.touch(session);
                }
                debug!("Role store for {user_id} is stale, remounting");
            }
        }

        // Mounting reads the cache; the map stays unlocked meanwhile.
        let store = Arc::new(RoleStore::mount(session.clone(), self.deps.clone()).await);

        let mut stores = self.stores.lock().await;
        self.evict_idle(&mut stores);
        if let Some(mounted) = stores.get_mut(&user_id) {
            // A concurrent request mounted first; ours is dropped.
            if mounted.serves(session, self.idle_ttl) {
                return mounted.touch(session);
            }
        }
        stores.insert(user_id, Mounted::new(Arc::clone(&store)));
        store
    }

    /// Clears the user's cached role and forgets their store.
    ///
    /// The store stays registered until its cache entry is gone, so a request
    /// racing the logout cannot remount from the stale entry.
    pub async fn logout(&self, session: &Session) {
        let Some(user_id) = session.user_id() else {
            return;
        };

        let store = self
            .stores
            .lock()
            .await
            .get(&user_id)
            .map(|m| Arc::clone(&m.store));

        match store {
            Some(store) => {
                store.clear().await;
                let mut stores = self.stores.lock().await;
                if stores
                    .get(&user_id)
                    .is_some_and(|m| Arc::ptr_eq(&m.store, &store))
                {
                    stores.remove(&user_id);
                }
            }
            None => {
                if let Err(e) = self.deps.cache.remove(user_id).await {
                    warn!("Failed to clear cached role for {user_id}: {e}");
                }
            }
        }
        info!("Logged out {user_id}");
    }

    /// Number of signed-in users with a live store.
    pub async fn mounted(&self) -> usize {
        self.stores.lock().await.len()
    }

    fn evict_idle(&self, stores: &mut HashMap<Uuid, Mounted>) {
        let before = stores.len();
        stores.retain(|_, m| !m.is_idle(self.idle_ttl));
        let evicted = before - stores.len();
        if evicted > 0 {
            debug!("Evicted {evicted} idle role stores");
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::models::session::{test_user, User};
    use crate::roles::backend::StubRoleBackend;
    use crate::roles::cache::{InMemoryRoleCache, RoleCache};
    use crate::roles::detector::fakes::FakeSignals;
    use crate::roles::permissions::Role;
    use crate::roles::RoleError;

    fn registry(cache: Arc<dyn RoleCache>) -> RoleRegistry {
        RoleRegistry::new(RoleDeps {
            cache,
            backend: Arc::new(StubRoleBackend),
            signals: Arc::new(FakeSignals::answering(true, false)),
        })
    }

    /// In-memory cache that can hold one user's reads, or every removal, on a gate.
    #[derive(Default)]
    struct GatedCache {
        inner: InMemoryRoleCache,
        hold_load: Option<(Uuid, Arc<Notify>)>,
        hold_remove: Option<Arc<Notify>>,
        removing: Notify,
    }

    #[async_trait]
    impl RoleCache for GatedCache {
        async fn load(&self, user_id: Uuid) -> Result<Option<String>, RoleError> {
            if let Some((held, gate)) = &self.hold_load {
                if *held == user_id {
                    gate.notified().await;
                }
            }
            self.inner.load(user_id).await
        }

        async fn store(&self, user_id: Uuid, role: Role) -> Result<(), RoleError> {
            self.inner.store(user_id, role).await
        }

        async fn remove(&self, user_id: Uuid) -> Result<(), RoleError> {
            self.removing.notify_one();
            if let Some(gate) = &self.hold_remove {
                gate.notified().await;
            }
            self.inner.remove(user_id).await
        }
    }

    #[tokio::test]
    async fn test_same_user_reuses_store() {
        let registry = registry(Arc::new(InMemoryRoleCache::new()));
        let session = Session::new(test_user(), None);

        let first = registry.store_for(&session).await;
        let second = registry.store_for(&session).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.mounted().await, 1);
    }

    #[tokio::test]
    async fn test_anonymous_sessions_are_not_kept() {
        let registry = registry(Arc::new(InMemoryRoleCache::new()));
        let store = registry.store_for(&Session::Unauthenticated).await;

        assert_eq!(store.role(), Role::JobSeeker);
        assert_eq!(registry.mounted().await, 0);
    }

    #[tokio::test]
    async fn test_explicit_role_change_remounts() {
        let registry = registry(Arc::new(InMemoryRoleCache::new()));
        let user = test_user();

        let first = registry.store_for(&Session::new(user.clone(), None)).await;
        let second = registry
            .store_for(&Session::new(user, Some(Role::Dual)))
            .await;

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.settled().await.role, Role::Dual);
    }

    #[tokio::test]
    async fn test_identity_change_keeps_explicit_update() {
        let registry = registry(Arc::new(InMemoryRoleCache::new()));
        let user = test_user();

        let store = registry.store_for(&Session::new(user.clone(), None)).await;
        store.settled().await;
        store.update_user_role(Role::Dual, None).await;

        let unverified = User {
            email_verified: false,
            display_name: None,
            ..user
        };
        let again = registry
            .store_for(&Session::new(unverified.clone(), None))
            .await;

        assert!(Arc::ptr_eq(&store, &again));
        assert_eq!(again.settled().await.role, Role::Dual);
        assert_eq!(again.session(), Session::new(unverified, None));
    }

    #[tokio::test]
    async fn test_slow_mount_does_not_block_other_users() {
        let gate = Arc::new(Notify::new());
        let slow = test_user();
        let registry = registry(Arc::new(GatedCache {
            hold_load: Some((slow.id, gate.clone())),
            ..Default::default()
        }));

        let pending = tokio::spawn({
            let registry = registry.clone();
            let session = Session::new(slow, None);
            async move { registry.store_for(&session).await }
        });
        tokio::task::yield_now().await;

        let other = Session::new(test_user(), None);
        let store = tokio::time::timeout(Duration::from_millis(500), registry.store_for(&other))
            .await
            .expect("mount for another user held the registry");
        assert_eq!(store.session().user_id(), other.user_id());

        gate.notify_one();
        pending.await.unwrap();
        assert_eq!(registry.mounted().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_stores_are_swept_on_mount() {
        let registry =
            registry(Arc::new(InMemoryRoleCache::new())).with_idle_ttl(Duration::from_secs(60));
        let active = Session::new(test_user(), None);
        let idle = Session::new(test_user(), None);

        registry.store_for(&active).await;
        registry.store_for(&idle).await;

        tokio::time::advance(Duration::from_secs(40)).await;
        registry.store_for(&active).await;
        tokio::time::advance(Duration::from_secs(30)).await;
        registry.store_for(&Session::new(test_user(), None)).await;

        assert_eq!(registry.mounted().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_store_is_remounted_on_return() {
        let registry =
            registry(Arc::new(InMemoryRoleCache::new())).with_idle_ttl(Duration::from_secs(60));
        let session = Session::new(test_user(), None);

        let first = registry.store_for(&session).await;
        tokio::time::advance(Duration::from_secs(61)).await;
        let second = registry.store_for(&session).await;

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(registry.mounted().await, 1);
    }

    #[tokio::test]
    async fn test_logout_forgets_store_and_cache() {
        let cache = Arc::new(InMemoryRoleCache::new());
        let registry = registry(cache.clone());
        let user = test_user();
        let session = Session::new(user.clone(), None);

        let store = registry.store_for(&session).await;
        assert_eq!(store.settled().await.role, Role::Employer);
        assert_eq!(cache.load(user.id).await.unwrap().as_deref(), Some("employer"));

        registry.logout(&session).await;

        assert_eq!(registry.mounted().await, 0);
        assert_eq!(cache.load(user.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_request_during_logout_does_not_remount() {
        let release = Arc::new(Notify::new());
        let cache = Arc::new(GatedCache {
            hold_remove: Some(release.clone()),
            ..Default::default()
        });
        let registry = registry(cache.clone());
        let user = test_user();
        let session = Session::new(user.clone(), None);

        let store = registry.store_for(&session).await;
        assert_eq!(store.settled().await.role, Role::Employer);

        let logout = tokio::spawn({
            let registry = registry.clone();
            let session = session.clone();
            async move { registry.logout(&session).await }
        });
        cache.removing.notified().await;

        let during = registry.store_for(&session).await;
        assert!(Arc::ptr_eq(&store, &during));

        release.notify_one();
        logout.await.unwrap();

        assert_eq!(during.role(), Role::JobSeeker);
        assert_eq!(registry.mounted().await, 0);
        assert_eq!(cache.load(user.id).await.unwrap(), None);
    }
}
