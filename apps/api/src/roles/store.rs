//! Role Store — the resolved role of one session and its lifecycle.
//!
//! Mounting follows stale-while-revalidate: a valid cached role is published
//! at once, then the detector runs exactly once and its answer overwrites it.
//!
//! Writers are serialized through `writer`. Every explicit write (role update,
//! logout) bumps `revision`; the detection task captures the revision it
//! started from and drops its result if an explicit write landed meanwhile.
//! Dropping the store aborts a detection still in flight.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::session::Session;
use crate::roles::backend::RoleBackend;
use crate::roles::cache::RoleCache;
use crate::roles::detector::{detect_role, ActivitySignals};
use crate::roles::permissions::{get_permissions, Capability, Permissions, Role};
use crate::roles::RoleError;

/// Collaborators a store needs. Cheap to clone.
#[derive(Clone)]
pub struct RoleDeps {
    pub cache: Arc<dyn RoleCache>,
    pub backend: Arc<dyn RoleBackend>,
    pub signals: Arc<dyn ActivitySignals>,
}

/// What consumers see: a role, its permissions, and an optional error string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleState {
    pub role: Role,
    pub permissions: Permissions,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Count of explicit writes (updates, logout) applied to this store.
    pub revision: u64,
    /// Detection still running.
    pub revalidating: bool,
    /// When `role` was last published.
    pub updated_at: DateTime<Utc>,
}

impl RoleState {
    fn initial(is_loading: bool, revalidating: bool) -> Self {
        let role = Role::default();
        Self {
            role,
            permissions: get_permissions(role),
            is_loading,
            error: None,
            revision: 0,
            revalidating,
            updated_at: Utc::now(),
        }
    }

    fn apply_role(&mut self, role: Role) {
        self.role = role;
        self.permissions = get_permissions(role);
        self.updated_at = Utc::now();
    }
}

struct Shared {
    state: watch::Sender<RoleState>,
    writer: Mutex<()>,
    cache: Arc<dyn RoleCache>,
}

impl Shared {
    async fn write_cache(&self, user_id: Uuid, role: Role) {
        if let Err(e) = self.cache.store(user_id, role).await {
            warn!("Failed to cache role {role} for {user_id}: {e}");
        }
    }
}

pub struct RoleStore {
    session: watch::Sender<Session>,
    shared: Arc<Shared>,
    backend: Arc<dyn RoleBackend>,
    detection: Option<JoinHandle<()>>,
}

impl RoleStore {
    /// Resolves the initial state for `session`.
    ///
    /// Returns once the cached role (if any) is published; detection keeps
    /// running in the background. Use `settled` or `subscribe` to observe it.
    pub async fn mount(session: Session, deps: RoleDeps) -> Self {
        let Some(user_id) = session.user_id() else {
            let (state, _) = watch::channel(RoleState::initial(false, false));
            return Self {
                session: watch::channel(session).0,
                shared: Arc::new(Shared {
                    state,
                    writer: Mutex::new(()),
                    cache: deps.cache,
                }),
                backend: deps.backend,
                detection: None,
            };
        };

        let (state, _) = watch::channel(RoleState::initial(true, true));
        let shared = Arc::new(Shared {
            state,
            writer: Mutex::new(()),
            cache: deps.cache,
        });

        if let Some(role) = read_cached_role(shared.cache.as_ref(), user_id).await {
            debug!("Publishing cached role {role} for {user_id}");
            shared.state.send_modify(|s| {
                s.apply_role(role);
                s.is_loading = false;
            });
        }

        let base_revision = shared.state.borrow().revision;
        let detection = tokio::spawn(revalidate(
            Arc::clone(&shared),
            session.clone(),
            deps.signals,
            user_id,
            base_revision,
        ));

        Self {
            session: watch::channel(session).0,
            shared,
            backend: deps.backend,
            detection: Some(detection),
        }
    }

    pub fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    /// The account role the store was mounted with, if any.
    pub fn explicit_role(&self) -> Option<Role> {
        self.session.borrow().explicit_role()
    }

    fn user_id(&self) -> Option<Uuid> {
        self.session.borrow().user_id()
    }

    /// Takes newer identity details (email, display name, verification) for
    /// the same user. Sessions for another user or another explicit role are
    /// ignored; those need a fresh mount.
    pub fn refresh_session(&self, session: &Session) {
        self.session.send_if_modified(|current| {
            let same_identity = current.user_id() == session.user_id()
                && current.explicit_role() == session.explicit_role();
            if !same_identity || *current == *session {
                return false;
            }
            *current = session.clone();
            true
        });
    }

    pub fn snapshot(&self) -> RoleState {
        self.shared.state.borrow().clone()
    }

    pub fn role(&self) -> Role {
        self.shared.state.borrow().role
    }

    pub fn permissions(&self) -> Permissions {
        self.shared.state.borrow().permissions
    }

    pub fn is_loading(&self) -> bool {
        self.shared.state.borrow().is_loading
    }

    /// Synchronous read of the current permission record.
    pub fn can_access_feature(&self, capability: Capability) -> bool {
        self.shared.state.borrow().permissions.allows(capability)
    }

    /// Receives every publish from now on.
    pub fn subscribe(&self) -> watch::Receiver<RoleState> {
        self.shared.state.subscribe()
    }

    /// Waits until no detection is running and returns the state at that point.
    pub async fn settled(&self) -> RoleState {
        let mut rx = self.shared.state.subscribe();
        let settled = rx.wait_for(|s| !s.revalidating).await.map(|s| s.clone());
        settled.unwrap_or_else(|_| self.snapshot())
    }

    /// Explicit role switch.
    ///
    /// On backend failure the previous role and permissions stay in place and
    /// `error` carries the message. `is_loading` is cleared either way.
    pub async fn update_user_role(&self, role: Role, preferences: Option<Value>) -> RoleState {
        let Some(user_id) = self.user_id() else {
            let err = RoleError::Unauthenticated;
            warn!("Rejected role update to {role}: {err}");
            self.shared.state.send_modify(|s| s.error = Some(err.to_string()));
            return self.snapshot();
        };

        let _guard = self.shared.writer.lock().await;
        self.shared.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        match self
            .backend
            .update_role(user_id, role, preferences.as_ref())
            .await
        {
            Ok(()) => {
                self.shared.state.send_modify(|s| {
                    s.apply_role(role);
                    s.revision += 1;
                    s.is_loading = false;
                });
                self.shared.write_cache(user_id, role).await;
                info!("Role for {user_id} updated to {role}");
            }
            Err(e) => {
                warn!("Role update to {role} failed for {user_id}: {e}");
                self.shared.state.send_modify(|s| {
                    s.error = Some(e.to_string());
                    s.is_loading = false;
                });
            }
        }

        self.snapshot()
    }

    /// Logout: drops the cache entry and resets to the default role.
    pub async fn clear(&self) {
        if let Some(detection) = &self.detection {
            detection.abort();
        }

        let _guard = self.shared.writer.lock().await;
        self.shared.state.send_modify(|s| {
            s.apply_role(Role::default());
            s.revision += 1;
            s.is_loading = false;
            s.error = None;
            s.revalidating = false;
        });

        if let Some(user_id) = self.user_id() {
            if let Err(e) = self.shared.cache.remove(user_id).await {
                warn!("Failed to clear cached role for {user_id}: {e}");
            }
            info!("Cleared role state for {user_id}");
        }
    }
}

impl Drop for RoleStore {
    fn drop(&mut self) {
        if let Some(detection) = self.detection.take() {
            detection.abort();
        }
    }
}

async fn read_cached_role(cache: &dyn RoleCache, user_id: Uuid) -> Option<Role> {
    match cache.load(user_id).await {
        Ok(Some(raw)) => match raw.parse::<Role>() {
            Ok(role) => Some(role),
            Err(e) => {
                warn!("Ignoring cached role for {user_id}: {e}");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!("Role cache read failed for {user_id}: {e}");
            None
        }
    }
}

/// The single authoritative refresh per mount. Applied only if no explicit
/// write happened after `base_revision`.
async fn revalidate(
    shared: Arc<Shared>,
    session: Session,
    signals: Arc<dyn ActivitySignals>,
    user_id: Uuid,
    base_revision: u64,
) {
    let role = detect_role(&session, signals.as_ref()).await;

    let _guard = shared.writer.lock().await;
    let mut applied = false;
    shared.state.send_modify(|s| {
        s.revalidating = false;
        if s.revision == base_revision {
            s.apply_role(role);
            s.is_loading = false;
            applied = true;
        }
    });

    if applied {
        shared.write_cache(user_id, role).await;
    } else {
        info!("Discarding detected role {role} for {user_id}: superseded by an explicit update");
    }
}
