use async_trait::async_trait;

use campusdesk_core::{AppError, AppResult, TenantId, UserIdentity};
use campusdesk_domain::{
    CapabilityFlags, EffectivePermission, Permission, PermissionGrant, PermissionId, Principal,
    SessionCapabilitySet,
};

/// One flattened grant row sent in a bulk assignment write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRecord {
    /// Principal receiving the grant.
    pub principal: Principal,
    /// Granted permission.
    pub permission_id: PermissionId,
    /// Dotted permission key.
    pub permission_key: Option<String>,
    /// Permission display label.
    pub permission_name: Option<String>,
    /// Owning module.
    pub module_name: Option<String>,
    /// Owning sub-module.
    pub sub_module_name: Option<String>,
    /// Whether any capability is granted.
    pub is_assigned: bool,
    /// All four capability bits for the permission.
    pub flags: CapabilityFlags,
}

impl AssignmentRecord {
    /// Returns the grant this record writes.
    #[must_use]
    pub fn grant(&self) -> PermissionGrant {
        PermissionGrant {
            permission_id: self.permission_id,
            flags: self.flags,
        }
    }

    /// Reinterprets the record as a ceiling entry holding the record's bits.
    pub fn effective_permission(&self) -> AppResult<EffectivePermission> {
        let permission_key = self.permission_key.as_deref().ok_or_else(|| {
            AppError::Validation(format!(
                "assignment record for permission {} has no key",
                self.permission_id
            ))
        })?;
        let module_name = self.module_name.as_deref().unwrap_or_default();

        Ok(EffectivePermission {
            permission: Permission::new(
                self.permission_id,
                permission_key,
                self.permission_name.as_deref().unwrap_or(permission_key),
                module_name,
                self.sub_module_name.as_deref(),
            )?,
            flags: self.flags,
        })
    }
}

/// Backend answer to a bulk assignment write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveAcknowledgement {
    /// The backend confirmed the write.
    Confirmed,
    /// The transport and payload disagree about the outcome.
    Unconfirmed {
        /// Message returned by the backend, if any.
        message: String,
    },
}

/// Port for the REST backend owning permissions and grants.
#[async_trait]
pub trait PermissionBackend: Send + Sync {
    /// Lists every permission defined for the tenant.
    async fn list_permission_catalog(&self, tenant_id: TenantId) -> AppResult<Vec<Permission>>;

    /// Lists the permissions the actor holds, with the actor's bits.
    async fn list_effective_permissions(
        &self,
        actor: &UserIdentity,
    ) -> AppResult<Vec<EffectivePermission>>;

    /// Lists the current grants of a user or role.
    async fn list_principal_grants(
        &self,
        tenant_id: TenantId,
        principal: Principal,
    ) -> AppResult<Vec<PermissionGrant>>;

    /// Replaces the grants of a principal in one bulk write.
    async fn save_principal_grants(
        &self,
        tenant_id: TenantId,
        principal: Principal,
        records: &[AssignmentRecord],
    ) -> AppResult<SaveAcknowledgement>;

    /// Loads the resolved capability hierarchy of the signed-in actor.
    async fn load_session_capabilities(
        &self,
        actor: &UserIdentity,
    ) -> AppResult<SessionCapabilitySet>;
}
