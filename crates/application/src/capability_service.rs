use std::sync::{Arc, PoisonError, RwLock};

use campusdesk_core::{AppResult, UserIdentity};
use campusdesk_domain::SessionCapabilitySet;
use tracing::info;

use crate::permission_ports::PermissionBackend;

/// Holder of the signed-in actor's capability set.
///
/// The set is swapped as a whole; readers keep the snapshot they took.
#[derive(Debug, Default)]
pub struct SessionCapabilityStore {
    current: RwLock<Arc<SessionCapabilitySet>>,
}

impl SessionCapabilityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current capability set.
    #[must_use]
    pub fn snapshot(&self) -> Arc<SessionCapabilitySet> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the current capability set.
    pub fn replace(&self, capabilities: SessionCapabilitySet) -> Arc<SessionCapabilitySet> {
        let capabilities = Arc::new(capabilities);
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::clone(&capabilities);
        capabilities
    }

    /// Drops the current capability set, e.g. on sign-out.
    pub fn clear(&self) {
        self.replace(SessionCapabilitySet::default());
    }
}

/// Application service keeping the session capability set in sync with the
/// backend.
#[derive(Clone)]
pub struct SessionCapabilityService {
    backend: Arc<dyn PermissionBackend>,
    store: Arc<SessionCapabilityStore>,
}

impl SessionCapabilityService {
    /// Creates a new service writing into `store`.
    #[must_use]
    pub fn new(backend: Arc<dyn PermissionBackend>, store: Arc<SessionCapabilityStore>) -> Self {
        Self { backend, store }
    }

    /// Returns the store read by the query facade.
    #[must_use]
    pub fn store(&self) -> Arc<SessionCapabilityStore> {
        Arc::clone(&self.store)
    }

    /// Reloads the actor's capabilities and swaps them in.
    ///
    /// A failed load keeps the previous set.
    pub async fn refresh(&self, actor: &UserIdentity) -> AppResult<Arc<SessionCapabilitySet>> {
        let capabilities = self.backend.load_session_capabilities(actor).await?;
        let module_count = capabilities.modules().len();
        let snapshot = self.store.replace(capabilities);

        info!(
            actor = actor.user_id(),
            tenant_id = %actor.tenant_id(),
            module_count,
            "refreshed session capabilities"
        );

        Ok(snapshot)
    }
}
